use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alert_notify_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub alert_id: String,
    pub episode: String,
    pub channel_type: String,
    pub user_id: String,
    pub user_name: String,
    pub target: String,
    pub content: String,
    pub status: String,
    pub send_time: Option<DateTimeWithTimeZone>,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
