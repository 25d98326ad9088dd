use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alert_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub alert_code: String,
    pub rule_id: String,
    pub rule_name: String,
    pub rule_type: String,
    pub target_type: String,
    pub target_id: String,
    pub target_name: String,
    pub level: String,
    pub message: String,
    pub payload_json: Option<String>,
    pub task_instance_id: Option<String>,
    pub task_created: bool,
    pub status: String,
    pub notify_status: String,
    pub notify_time: Option<DateTimeWithTimeZone>,
    pub recover_time: Option<DateTimeWithTimeZone>,
    pub duration_minutes: Option<i64>,
    pub remark: Option<String>,
    pub deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
