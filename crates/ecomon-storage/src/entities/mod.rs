pub mod alert_notify_log;
pub mod alert_record;
pub mod alert_rule;
pub mod device;
pub mod factor_reading;
pub mod maint_task;
pub mod user;
