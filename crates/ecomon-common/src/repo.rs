//! Collaborator interfaces consumed by the evaluation engine, recovery
//! monitor and notification dispatcher.
//!
//! Persistence, organizational data and task management live outside the
//! core; these traits are the only surface the core sees. The storage crate
//! provides the SeaORM-backed implementations; tests substitute in-memory
//! fakes.

use crate::types::{
    AlertNotifyLog, AlertRecord, AlertRule, MaintTask, NotifyEpisode, TargetType, User,
};
use anyhow::Result;
use async_trait::async_trait;

/// Read access to alert rules.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// All enabled, non-deleted rules. Disabled rules are never evaluated.
    async fn find_all_enabled(&self) -> Result<Vec<AlertRule>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRule>>;
}

/// Persistence of alert records.
#[async_trait]
pub trait AlertRecordRepository: Send + Sync {
    /// Inserts `record` unless quiet-period suppression applies to its
    /// (rule, target) pair: an existing PENDING/IN_PROGRESS alert, or a most
    /// recent alert younger than `quiet_minutes`. The check and the insert
    /// are atomic at the persistence boundary, so concurrent sweep workers
    /// cannot double-create. Returns `None` when suppressed.
    async fn insert_if_quiet(
        &self,
        record: &AlertRecord,
        quiet_minutes: i64,
    ) -> Result<Option<AlertRecord>>;

    /// Writes back a mutated record (lifecycle or notify-axis changes).
    async fn update(&self, record: &AlertRecord) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRecord>>;

    /// All PENDING/IN_PROGRESS, non-deleted records.
    async fn find_active(&self) -> Result<Vec<AlertRecord>>;

    /// Records for one (rule, target) pair, newest first.
    async fn find_by_rule_target(
        &self,
        rule_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<Vec<AlertRecord>>;
}

/// Persistence of per-recipient notify log rows.
#[async_trait]
pub trait AlertNotifyLogRepository: Send + Sync {
    async fn insert(&self, log: &AlertNotifyLog) -> Result<()>;

    async fn batch_insert(&self, logs: &[AlertNotifyLog]) -> Result<()>;

    async fn update(&self, log: &AlertNotifyLog) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertNotifyLog>>;

    /// Log rows of one alert, optionally restricted to a single episode.
    async fn find_by_alert(
        &self,
        alert_id: &str,
        episode: Option<NotifyEpisode>,
    ) -> Result<Vec<AlertNotifyLog>>;

    async fn count_success(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64>;

    async fn count_failed(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64>;
}

/// Resolves a rule's configured users plus department membership into the
/// concrete recipient list. Organizational data is external to the core.
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    async fn alert_recipients(&self, rule: &AlertRule) -> Result<Vec<User>>;
}

/// Task management collaborator. The expiring/overdue boundary is owned by
/// the task lifecycle behind this trait; collectors consume the filtered
/// sets without re-deriving expiry arithmetic.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Open tasks approaching their deadline.
    async fn find_expiring(&self) -> Result<Vec<MaintTask>>;

    /// Open tasks past their deadline.
    async fn find_overdue(&self) -> Result<Vec<MaintTask>>;

    /// Creates a remediation task for an alert from the rule's scheme.
    async fn create_remediation_task(
        &self,
        scheme_id: &str,
        record: &AlertRecord,
    ) -> Result<MaintTask>;
}
