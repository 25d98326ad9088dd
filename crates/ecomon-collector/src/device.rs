use crate::MetricCollector;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ecomon_common::types::{Metric, TargetType, METRIC_DEVICE_OFFLINE_MINUTES};
use std::sync::Arc;

/// 离线设备（含离线时长）
#[derive(Debug, Clone)]
pub struct OfflineDevice {
    pub device_id: String,
    pub device_name: String,
    pub offline_minutes: i64,
}

/// Where the set of currently-offline devices comes from. The offline
/// threshold is applied by the source, not re-derived here.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    async fn offline_devices(&self) -> Result<Vec<OfflineDevice>>;
}

/// Collector for device status. Emits one metric per offline device; devices
/// that are online simply do not appear, which is what lets condition-less
/// device rules trigger on presence and recover on absence.
pub struct DeviceStatusCollector {
    source: Arc<dyn DeviceSource>,
}

impl DeviceStatusCollector {
    pub fn new(source: Arc<dyn DeviceSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MetricCollector for DeviceStatusCollector {
    fn name(&self) -> &str {
        "device"
    }

    fn supports(&self, metric: &str) -> bool {
        metric == METRIC_DEVICE_OFFLINE_MINUTES
    }

    async fn collect_all(&self, metric: &str) -> Result<Vec<Metric>> {
        if metric != METRIC_DEVICE_OFFLINE_MINUTES {
            return Ok(Vec::new());
        }
        let now = Utc::now();
        let devices = self.source.offline_devices().await?;
        Ok(devices
            .into_iter()
            .map(|d| Metric {
                name: metric.to_string(),
                target_type: TargetType::Device,
                target_id: d.device_id,
                target_name: d.device_name,
                value: d.offline_minutes as f64,
                collected_at: now,
            })
            .collect())
    }
}
