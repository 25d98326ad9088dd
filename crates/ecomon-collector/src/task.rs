use crate::MetricCollector;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use ecomon_common::repo::TaskGateway;
use ecomon_common::types::{Metric, TargetType, METRIC_TASK_EXPIRING, METRIC_TASK_OVERDUE};
use std::sync::Arc;

/// Collector for maintenance task lifecycle metrics.
///
/// Answers "tasks about to expire" and "tasks already overdue" by querying
/// the state-filtered sets owned by the task gateway; the expiry/overdue
/// boundary is consumed, not recomputed, here.
pub struct TaskLifecycleCollector {
    gateway: Arc<dyn TaskGateway>,
}

impl TaskLifecycleCollector {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl MetricCollector for TaskLifecycleCollector {
    fn name(&self) -> &str {
        "task"
    }

    fn supports(&self, metric: &str) -> bool {
        metric == METRIC_TASK_EXPIRING || metric == METRIC_TASK_OVERDUE
    }

    async fn collect_all(&self, metric: &str) -> Result<Vec<Metric>> {
        let now = Utc::now();
        let tasks = match metric {
            METRIC_TASK_EXPIRING => self.gateway.find_expiring().await?,
            METRIC_TASK_OVERDUE => self.gateway.find_overdue().await?,
            _ => return Ok(Vec::new()),
        };
        Ok(tasks
            .into_iter()
            .map(|t| {
                // expiring: minutes until deadline; overdue: minutes past it
                let minutes = (t.deadline - now).num_minutes().abs();
                Metric {
                    name: metric.to_string(),
                    target_type: TargetType::Task,
                    target_id: t.id,
                    target_name: t.name,
                    value: minutes as f64,
                    collected_at: now,
                }
            })
            .collect())
    }
}
