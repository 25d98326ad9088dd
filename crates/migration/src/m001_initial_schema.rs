use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按依赖顺序建表
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

const UP_SQL: &str = "
CREATE TABLE IF NOT EXISTS alert_rules (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    rule_type TEXT NOT NULL,
    target_type TEXT NOT NULL,
    conditions_json TEXT NOT NULL DEFAULT '[]',
    level TEXT NOT NULL,
    message_template TEXT NOT NULL,
    scheme_id TEXT,
    channels_json TEXT NOT NULL DEFAULT '[]',
    recipient_users_json TEXT NOT NULL DEFAULT '[]',
    recipient_depts_json TEXT NOT NULL DEFAULT '[]',
    enabled INTEGER NOT NULL DEFAULT 1,
    quiet_minutes INTEGER NOT NULL DEFAULT 30,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alert_rules_enabled ON alert_rules(enabled, deleted);
CREATE INDEX IF NOT EXISTS idx_alert_rules_rule_type ON alert_rules(rule_type);

CREATE TABLE IF NOT EXISTS alert_records (
    id TEXT PRIMARY KEY NOT NULL,
    alert_code TEXT NOT NULL UNIQUE,
    rule_id TEXT NOT NULL,
    rule_name TEXT NOT NULL,
    rule_type TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    target_name TEXT NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL,
    payload_json TEXT,
    task_instance_id TEXT,
    task_created INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    notify_status TEXT NOT NULL,
    notify_time TEXT,
    recover_time TEXT,
    duration_minutes INTEGER,
    remark TEXT,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alert_records_rule_target ON alert_records(rule_id, target_type, target_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_alert_records_status ON alert_records(status, deleted);
CREATE INDEX IF NOT EXISTS idx_alert_records_created_at ON alert_records(created_at DESC);

CREATE TABLE IF NOT EXISTS alert_notify_logs (
    id TEXT PRIMARY KEY NOT NULL,
    alert_id TEXT NOT NULL,
    episode TEXT NOT NULL,
    channel_type TEXT NOT NULL,
    user_id TEXT NOT NULL,
    user_name TEXT NOT NULL,
    target TEXT NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL,
    send_time TEXT,
    error_message TEXT,
    retry_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notify_logs_alert ON alert_notify_logs(alert_id, episode, status);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    department_id TEXT,
    phone TEXT,
    email TEXT,
    push_token TEXT,
    wechat_openid TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_department ON users(department_id);

CREATE TABLE IF NOT EXISTS devices (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    site_id TEXT NOT NULL,
    site_name TEXT NOT NULL,
    last_heartbeat TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_devices_site ON devices(site_id);
CREATE INDEX IF NOT EXISTS idx_devices_heartbeat ON devices(last_heartbeat);

CREATE TABLE IF NOT EXISTS factor_readings (
    id TEXT PRIMARY KEY NOT NULL,
    site_id TEXT NOT NULL,
    site_name TEXT NOT NULL,
    factor TEXT NOT NULL,
    value REAL NOT NULL,
    reading_time TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(site_id, factor)
);
CREATE INDEX IF NOT EXISTS idx_factor_readings_factor ON factor_readings(factor);

CREATE TABLE IF NOT EXISTS maint_tasks (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    target_name TEXT NOT NULL,
    deadline TEXT NOT NULL,
    state TEXT NOT NULL,
    scheme_id TEXT,
    alert_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_maint_tasks_state ON maint_tasks(state, deadline);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS maint_tasks;
DROP TABLE IF EXISTS factor_readings;
DROP TABLE IF EXISTS devices;
DROP TABLE IF EXISTS users;
DROP TABLE IF EXISTS alert_notify_logs;
DROP TABLE IF EXISTS alert_records;
DROP TABLE IF EXISTS alert_rules;
";
