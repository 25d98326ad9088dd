use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 完整数据库连接 URL（SQLite 示例：`sqlite://data/ecomon.db?mode=rwc`）
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// 评估扫描周期（秒）
    #[serde(default = "default_evaluation_interval_secs")]
    pub evaluation_interval_secs: u64,
    /// 恢复扫描周期（秒）
    #[serde(default = "default_recovery_interval_secs")]
    pub recovery_interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: default_evaluation_interval_secs(),
            recovery_interval_secs: default_recovery_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 设备心跳超时阈值（分钟），超过视为离线
    #[serde(default = "default_device_offline_minutes")]
    pub device_offline_minutes: i64,
    /// 任务"即将到期"窗口（分钟）
    #[serde(default = "default_task_expiring_window_minutes")]
    pub task_expiring_window_minutes: i64,
    /// 自动创建处置任务的默认时限（小时）
    #[serde(default = "default_remediation_deadline_hours")]
    pub remediation_deadline_hours: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_offline_minutes: default_device_offline_minutes(),
            task_expiring_window_minutes: default_task_expiring_window_minutes(),
            remediation_deadline_hours: default_remediation_deadline_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// 单次通知批次内的最大并发投递数
    #[serde(default = "default_notify_max_concurrent")]
    pub max_concurrent: usize,
    /// 渠道实例配置
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_notify_max_concurrent(),
            channels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// 渠道类型（sms / email / push / wechat）
    pub channel_type: String,
    #[serde(default = "default_channel_enabled")]
    pub enabled: bool,
    /// 渠道配置（结构随渠道类型，由对应插件校验）
    pub config: toml::Value,
}

fn default_db_url() -> String {
    "sqlite://data/ecomon.db?mode=rwc".to_string()
}

fn default_evaluation_interval_secs() -> u64 {
    60
}

fn default_recovery_interval_secs() -> u64 {
    120
}

fn default_device_offline_minutes() -> i64 {
    15
}

fn default_task_expiring_window_minutes() -> i64 {
    60
}

fn default_remediation_deadline_hours() -> i64 {
    24
}

fn default_notify_max_concurrent() -> usize {
    8
}

fn default_channel_enabled() -> bool {
    true
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}
