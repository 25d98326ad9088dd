use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alert_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub rule_type: String,
    pub target_type: String,
    pub conditions_json: String,
    pub level: String,
    pub message_template: String,
    pub scheme_id: Option<String>,
    pub channels_json: String,
    pub recipient_users_json: String,
    pub recipient_depts_json: String,
    pub enabled: bool,
    pub quiet_minutes: i64,
    pub deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
