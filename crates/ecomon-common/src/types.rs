use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric name emitted by the device status collector for offline devices.
pub const METRIC_DEVICE_OFFLINE_MINUTES: &str = "device.offline_minutes";
/// Metric name emitted by the task lifecycle collector for tasks about to expire.
pub const METRIC_TASK_EXPIRING: &str = "task.expiring";
/// Metric name emitted by the task lifecycle collector for overdue tasks.
pub const METRIC_TASK_OVERDUE: &str = "task.overdue";

/// Alert level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use ecomon_common::types::AlertLevel;
///
/// let level: AlertLevel = "warning".parse().unwrap();
/// assert_eq!(level, AlertLevel::Warning);
/// assert_eq!(level.to_string(), "warning");
/// assert!(AlertLevel::Critical > AlertLevel::Notice);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Notice,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Notice => write!(f, "notice"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "notice" => Ok(AlertLevel::Notice),
            "warning" => Ok(AlertLevel::Warning),
            "critical" => Ok(AlertLevel::Critical),
            _ => Err(format!("unknown alert level: {s}")),
        }
    }
}

/// The category of thing an alert rule watches and an alert concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Site,
    Device,
    Task,
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetType::Site => write!(f, "site"),
            TargetType::Device => write!(f, "device"),
            TargetType::Task => write!(f, "task"),
        }
    }
}

impl std::str::FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "site" => Ok(TargetType::Site),
            "device" => Ok(TargetType::Device),
            "task" => Ok(TargetType::Task),
            _ => Err(format!("unknown target type: {s}")),
        }
    }
}

/// Rule family. Factor threshold rules carry explicit conditions; device and
/// task rules trigger on the presence of targets in their collector's
/// state-filtered set and never require condition configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    FactorThreshold,
    DeviceOffline,
    TaskExpiring,
    TaskOverdue,
}

impl RuleType {
    /// Whether rules of this type must carry at least one condition.
    pub fn need_condition_config(&self) -> bool {
        matches!(self, RuleType::FactorThreshold)
    }

    /// The metric a condition-less rule type is evaluated against.
    pub fn implicit_metric(&self) -> Option<&'static str> {
        match self {
            RuleType::FactorThreshold => None,
            RuleType::DeviceOffline => Some(METRIC_DEVICE_OFFLINE_MINUTES),
            RuleType::TaskExpiring => Some(METRIC_TASK_EXPIRING),
            RuleType::TaskOverdue => Some(METRIC_TASK_OVERDUE),
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleType::FactorThreshold => write!(f, "factor_threshold"),
            RuleType::DeviceOffline => write!(f, "device_offline"),
            RuleType::TaskExpiring => write!(f, "task_expiring"),
            RuleType::TaskOverdue => write!(f, "task_overdue"),
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "factor_threshold" => Ok(RuleType::FactorThreshold),
            "device_offline" => Ok(RuleType::DeviceOffline),
            "task_expiring" => Ok(RuleType::TaskExpiring),
            "task_overdue" => Ok(RuleType::TaskOverdue),
            _ => Err(format!("unknown rule type: {s}")),
        }
    }
}

/// Comparison operator of a single rule condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    Between,
    NotBetween,
}

impl CompareOp {
    /// Range operators require a (min, max) pair instead of a single threshold.
    pub fn is_range(&self) -> bool {
        matches!(self, CompareOp::Between | CompareOp::NotBetween)
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
            CompareOp::Eq => "eq",
            CompareOp::Neq => "neq",
            CompareOp::Between => "between",
            CompareOp::NotBetween => "not_between",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(CompareOp::Gt),
            "gte" => Ok(CompareOp::Gte),
            "lt" => Ok(CompareOp::Lt),
            "lte" => Ok(CompareOp::Lte),
            "eq" => Ok(CompareOp::Eq),
            "neq" => Ok(CompareOp::Neq),
            "between" => Ok(CompareOp::Between),
            "not_between" => Ok(CompareOp::NotBetween),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

/// One condition clause of an alert rule.
///
/// Range operators (`between` / `not_between`) use `min`/`max`; every other
/// operator uses `threshold`. A rule triggers only when ALL of its conditions
/// hold for the same target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub metric: String,
    pub op: CompareOp,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl RuleCondition {
    /// Syntactic validity per operator shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ecomon_common::types::{CompareOp, RuleCondition};
    ///
    /// let c = RuleCondition {
    ///     metric: "ph".into(),
    ///     op: CompareOp::Between,
    ///     threshold: None,
    ///     min: Some(9.0),
    ///     max: Some(6.0),
    /// };
    /// assert!(!c.is_valid());
    /// ```
    pub fn is_valid(&self) -> bool {
        if self.metric.is_empty() {
            return false;
        }
        if self.op.is_range() {
            match (self.min, self.max) {
                (Some(min), Some(max)) => min <= max,
                _ => false,
            }
        } else {
            self.threshold.is_some()
        }
    }
}

/// 告警规则（标准检测策略）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// 唯一标识
    pub id: String,
    /// 规则名称
    pub name: String,
    /// 规则类型
    pub rule_type: RuleType,
    /// 监控对象类型
    pub target_type: TargetType,
    /// 条件列表（AND 语义）
    pub conditions: Vec<RuleCondition>,
    /// 告警级别
    pub level: AlertLevel,
    /// 告警消息模板（支持 {target} {metric} {value} 占位符）
    pub message_template: String,
    /// 关联处置方案 ID（可选，用于自动创建运维任务）
    pub scheme_id: Option<String>,
    /// 通知渠道列表
    pub channels: Vec<NotifyChannelType>,
    /// 接收人用户 ID 列表
    pub recipient_users: Vec<String>,
    /// 接收人部门 ID 列表
    pub recipient_depts: Vec<String>,
    /// 是否启用
    pub enabled: bool,
    /// 静默期（分钟）
    pub quiet_minutes: i64,
    /// 软删除标记
    pub deleted: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    /// Whether the stored condition configuration satisfies the rule-type
    /// invariant: condition-requiring types need at least one syntactically
    /// valid condition; device/task types always pass.
    pub fn validate_condition_configs(&self) -> bool {
        if !self.rule_type.need_condition_config() {
            return true;
        }
        !self.conditions.is_empty() && self.conditions.iter().all(RuleCondition::is_valid)
    }

    /// Distinct metric names referenced by this rule, in condition order.
    /// Condition-less rule types resolve to their implicit metric.
    pub fn metric_names(&self) -> Vec<String> {
        if self.conditions.is_empty() {
            return self
                .rule_type
                .implicit_metric()
                .map(|m| vec![m.to_string()])
                .unwrap_or_default();
        }
        let mut names = Vec::new();
        for c in &self.conditions {
            if !names.contains(&c.metric) {
                names.push(c.metric.clone());
            }
        }
        names
    }
}

/// One measurement produced on demand by a metric collector. Ephemeral:
/// consumed within the sweep that collected it, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub target_type: TargetType,
    pub target_id: String,
    pub target_name: String,
    pub value: f64,
    pub collected_at: DateTime<Utc>,
}

/// Alert lifecycle status.
///
/// PENDING → IN_PROGRESS → {RESOLVED, IGNORED}; PENDING or IN_PROGRESS may
/// also move to RECOVERED. RESOLVED and IGNORED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    InProgress,
    Resolved,
    Ignored,
    Recovered,
}

impl AlertStatus {
    /// Active statuses still participate in processing and recovery checks.
    pub fn is_active(&self) -> bool {
        matches!(self, AlertStatus::Pending | AlertStatus::InProgress)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertStatus::Pending => "pending",
            AlertStatus::InProgress => "in_progress",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Ignored => "ignored",
            AlertStatus::Recovered => "recovered",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AlertStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AlertStatus::Pending),
            "in_progress" => Ok(AlertStatus::InProgress),
            "resolved" => Ok(AlertStatus::Resolved),
            "ignored" => Ok(AlertStatus::Ignored),
            "recovered" => Ok(AlertStatus::Recovered),
            _ => Err(format!("unknown alert status: {s}")),
        }
    }
}

/// Aggregate / per-row notification delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyStatus {
    Pending,
    Success,
    Failed,
}

impl std::fmt::Display for NotifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotifyStatus::Pending => "pending",
            NotifyStatus::Success => "success",
            NotifyStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotifyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NotifyStatus::Pending),
            "success" => Ok(NotifyStatus::Success),
            "failed" => Ok(NotifyStatus::Failed),
            _ => Err(format!("unknown notify status: {s}")),
        }
    }
}

/// Notification channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannelType {
    Sms,
    Email,
    Push,
    Wechat,
}

impl std::fmt::Display for NotifyChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotifyChannelType::Sms => "sms",
            NotifyChannelType::Email => "email",
            NotifyChannelType::Push => "push",
            NotifyChannelType::Wechat => "wechat",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotifyChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sms" => Ok(NotifyChannelType::Sms),
            "email" => Ok(NotifyChannelType::Email),
            "push" => Ok(NotifyChannelType::Push),
            "wechat" => Ok(NotifyChannelType::Wechat),
            _ => Err(format!("unknown notify channel: {s}")),
        }
    }
}

/// Which fan-out pass produced a notify log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyEpisode {
    Alert,
    Recover,
}

impl std::fmt::Display for NotifyEpisode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyEpisode::Alert => write!(f, "alert"),
            NotifyEpisode::Recover => write!(f, "recover"),
        }
    }
}

impl std::str::FromStr for NotifyEpisode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(NotifyEpisode::Alert),
            "recover" => Ok(NotifyEpisode::Recover),
            _ => Err(format!("unknown notify episode: {s}")),
        }
    }
}

/// Rejected state machine operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StateError {
    /// The requested alert lifecycle transition is not permitted.
    #[error("invalid alert state transition: {from} -> {to}")]
    InvalidTransition { from: AlertStatus, to: AlertStatus },

    /// Retrying a notify log is only permitted while FAILED with fewer than
    /// three prior retries.
    #[error("notify retry not allowed (status={status}, retry_count={retry_count})")]
    RetryNotAllowed {
        status: NotifyStatus,
        retry_count: i32,
    },
}

/// 告警记录（一次检测到的事件）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// 唯一标识
    pub id: String,
    /// 告警编号（全局唯一）
    pub alert_code: String,
    /// 触发规则 ID
    pub rule_id: String,
    /// 规则名称快照（规则后续编辑不影响历史记录）
    pub rule_name: String,
    /// 规则类型快照
    pub rule_type: RuleType,
    /// 监控对象类型
    pub target_type: TargetType,
    /// 监控对象 ID
    pub target_id: String,
    /// 监控对象名称
    pub target_name: String,
    /// 告警级别
    pub level: AlertLevel,
    /// 告警消息
    pub message: String,
    /// 触发指标快照（JSON）
    pub payload_json: Option<String>,
    /// 关联运维任务 ID（可选）
    pub task_instance_id: Option<String>,
    /// true = 本告警新建了处置任务；false = 关联任务即触发本告警的任务
    pub task_created: bool,
    /// 生命周期状态
    pub status: AlertStatus,
    /// 通知聚合状态
    pub notify_status: NotifyStatus,
    /// 通知时间
    pub notify_time: Option<DateTime<Utc>>,
    /// 恢复时间
    pub recover_time: Option<DateTime<Utc>>,
    /// 持续时长（分钟，关闭时一次性计算）
    pub duration_minutes: Option<i64>,
    /// 处理备注
    pub remark: Option<String>,
    /// 软删除标记
    pub deleted: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl AlertRecord {
    fn close_duration(&self, end: DateTime<Utc>) -> i64 {
        (end - self.created_at).num_minutes()
    }

    /// PENDING → IN_PROGRESS.
    pub fn start_process(&mut self) -> Result<(), StateError> {
        if self.status != AlertStatus::Pending {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: AlertStatus::InProgress,
            });
        }
        self.status = AlertStatus::InProgress;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// {PENDING, IN_PROGRESS} → RESOLVED; duration is fixed at close time.
    pub fn resolve(&mut self, remark: &str) -> Result<(), StateError> {
        if !self.status.is_active() {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: AlertStatus::Resolved,
            });
        }
        let now = Utc::now();
        self.status = AlertStatus::Resolved;
        self.remark = Some(remark.to_string());
        self.duration_minutes = Some(self.close_duration(now));
        self.updated_at = now;
        Ok(())
    }

    /// {PENDING, IN_PROGRESS} → IGNORED; duration is fixed at close time.
    pub fn ignore(&mut self, remark: &str) -> Result<(), StateError> {
        if !self.status.is_active() {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: AlertStatus::Ignored,
            });
        }
        let now = Utc::now();
        self.status = AlertStatus::Ignored;
        self.remark = Some(remark.to_string());
        self.duration_minutes = Some(self.close_duration(now));
        self.updated_at = now;
        Ok(())
    }

    /// {PENDING, IN_PROGRESS} → RECOVERED. Recovering an already resolved or
    /// ignored alert is rejected.
    pub fn recover(&mut self) -> Result<(), StateError> {
        if !self.status.is_active() {
            return Err(StateError::InvalidTransition {
                from: self.status,
                to: AlertStatus::Recovered,
            });
        }
        let now = Utc::now();
        self.status = AlertStatus::Recovered;
        self.recover_time = Some(now);
        self.duration_minutes = Some(self.close_duration(now));
        self.updated_at = now;
        Ok(())
    }

    /// Marks the notify axis SUCCESS. Does not touch lifecycle status.
    pub fn notify_success(&mut self) {
        let now = Utc::now();
        self.notify_status = NotifyStatus::Success;
        self.notify_time = Some(now);
        self.updated_at = now;
    }

    /// Marks the notify axis FAILED. Does not touch lifecycle status.
    pub fn notify_failed(&mut self) {
        let now = Utc::now();
        self.notify_status = NotifyStatus::Failed;
        self.notify_time = Some(now);
        self.updated_at = now;
    }
}

/// Maximum retry attempts for a failed notify log row.
pub const MAX_NOTIFY_RETRIES: i32 = 3;

/// 告警通知日志（单次投递记录，按 告警 × 渠道 × 接收人 维度）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotifyLog {
    /// 唯一标识
    pub id: String,
    /// 关联告警 ID
    pub alert_id: String,
    /// 通知批次（首报 / 恢复）
    pub episode: NotifyEpisode,
    /// 通知渠道
    pub channel_type: NotifyChannelType,
    /// 接收人用户 ID
    pub user_id: String,
    /// 接收人姓名
    pub user_name: String,
    /// 投递地址（手机号 / 邮箱 / push token / 微信 openid）
    pub target: String,
    /// 通知内容
    pub content: String,
    /// 投递状态
    pub status: NotifyStatus,
    /// 发送时间
    pub send_time: Option<DateTime<Utc>>,
    /// 失败原因
    pub error_message: Option<String>,
    /// 重试次数
    pub retry_count: i32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl AlertNotifyLog {
    /// Retry is permitted only while FAILED with fewer than
    /// [`MAX_NOTIFY_RETRIES`] prior attempts.
    pub fn can_retry(&self) -> bool {
        self.status == NotifyStatus::Failed && self.retry_count < MAX_NOTIFY_RETRIES
    }

    /// Guard for the explicit retry operation; counts the attempt.
    pub fn begin_retry(&mut self) -> Result<(), StateError> {
        if !self.can_retry() {
            return Err(StateError::RetryNotAllowed {
                status: self.status,
                retry_count: self.retry_count,
            });
        }
        self.retry_count += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the delivery SUCCESS, clearing any prior error and stamping the
    /// send time.
    pub fn mark_success(&mut self) {
        let now = Utc::now();
        self.status = NotifyStatus::Success;
        self.error_message = None;
        self.send_time = Some(now);
        self.updated_at = now;
    }

    /// Marks the delivery FAILED with the captured error text.
    pub fn mark_failed(&mut self, error: &str) {
        self.status = NotifyStatus::Failed;
        self.error_message = Some(error.to_string());
        self.updated_at = Utc::now();
    }
}

/// 用户（通知接收人）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// 唯一标识
    pub id: String,
    /// 姓名
    pub name: String,
    /// 所属部门 ID
    pub department_id: Option<String>,
    /// 手机号
    pub phone: Option<String>,
    /// 邮箱
    pub email: Option<String>,
    /// 推送 token
    pub push_token: Option<String>,
    /// 微信 openid
    pub wechat_openid: Option<String>,
    /// 是否启用
    pub enabled: bool,
}

impl User {
    /// The delivery address for a channel, or `None` when unconfigured.
    pub fn notify_target(&self, channel: NotifyChannelType) -> Option<&str> {
        let target = match channel {
            NotifyChannelType::Sms => self.phone.as_deref(),
            NotifyChannelType::Email => self.email.as_deref(),
            NotifyChannelType::Push => self.push_token.as_deref(),
            NotifyChannelType::Wechat => self.wechat_openid.as_deref(),
        };
        target.filter(|t| !t.is_empty())
    }
}

/// 运维任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Open,
    Done,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Open => write!(f, "open"),
            TaskState::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskState::Open),
            "done" => Ok(TaskState::Done),
            _ => Err(format!("unknown task state: {s}")),
        }
    }
}

/// 运维任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintTask {
    /// 唯一标识
    pub id: String,
    /// 任务名称
    pub name: String,
    /// 作业对象类型
    pub target_type: TargetType,
    /// 作业对象 ID
    pub target_id: String,
    /// 作业对象名称
    pub target_name: String,
    /// 截止时间
    pub deadline: DateTime<Utc>,
    /// 任务状态
    pub state: TaskState,
}

/// Signal emitted by the evaluation engine and recovery monitor, consumed by
/// the notification dispatcher. Carries the full record snapshot at signal
/// time.
#[derive(Debug, Clone)]
pub enum AlertSignal {
    Created(AlertRecord),
    Recovered(AlertRecord),
}

impl AlertSignal {
    pub fn record(&self) -> &AlertRecord {
        match self {
            AlertSignal::Created(r) | AlertSignal::Recovered(r) => r,
        }
    }
}
