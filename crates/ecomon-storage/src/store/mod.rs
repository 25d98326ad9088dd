use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

pub mod alert;
pub mod monitor;
pub mod notify_log;
pub mod rule;
pub mod user;

/// 管理数据库的统一访问层。
///
/// 所有方法均为 `async fn`，底层使用 SeaORM + SQLite。
pub struct Store {
    pub(crate) db: DatabaseConnection,
}

impl Store {
    /// 连接并初始化管理数据库。
    ///
    /// - `db_url`：完整的数据库连接 URL，由调用方（服务器配置）提供。
    ///   SQLite 示例：`sqlite:///data/ecomon.db?mode=rwc`
    ///
    /// 自动运行 `sea-orm-migration` 迁移，确保 Schema 最新。
    pub async fn new(db_url: &str) -> Result<Self> {
        let db = Database::connect(db_url).await?;

        // WAL 模式仅对 SQLite 有效
        if db_url.starts_with("sqlite:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        // 运行所有待执行迁移
        Migrator::up(&db, None).await?;

        tracing::info!(db_url = %db_url, "Initialized store (SeaORM)");

        Ok(Self { db })
    }

    /// 返回底层数据库连接引用（供子模块使用）。
    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
