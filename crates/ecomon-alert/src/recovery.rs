use anyhow::Result;
use ecomon_collector::CollectorRegistry;
use ecomon_common::repo::{AlertRecordRepository, RuleRepository};
use ecomon_common::types::{AlertRecord, AlertSignal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::condition;

/// Counters for one recovery sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoverySummary {
    pub checked: usize,
    pub recovered: usize,
    pub failed: usize,
}

/// Re-evaluates open alerts against current metrics and recovers those whose
/// condition set no longer holds. Runs on its own cadence, independent of
/// the evaluation sweep. Collector calls are idempotent, so re-collecting
/// for the same target is safe.
pub struct RecoveryMonitor {
    rules: Arc<dyn RuleRepository>,
    records: Arc<dyn AlertRecordRepository>,
    registry: Arc<CollectorRegistry>,
    signals: mpsc::UnboundedSender<AlertSignal>,
}

impl RecoveryMonitor {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        records: Arc<dyn AlertRecordRepository>,
        registry: Arc<CollectorRegistry>,
        signals: mpsc::UnboundedSender<AlertSignal>,
    ) -> Self {
        Self {
            rules,
            records,
            registry,
            signals,
        }
    }

    /// One recovery sweep over all PENDING/IN_PROGRESS alerts. A failure on
    /// one alert is logged with its id and never aborts the rest.
    pub async fn run_sweep(&self) -> Result<RecoverySummary> {
        let active = self.records.find_active().await?;
        let mut summary = RecoverySummary::default();

        for record in active {
            summary.checked += 1;
            let alert_id = record.id.clone();
            match self.check_record(record).await {
                Ok(true) => summary.recovered += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(alert_id = %alert_id, error = %e, "Recovery check failed");
                }
            }
        }

        if summary.checked > 0 {
            tracing::info!(
                checked = summary.checked,
                recovered = summary.recovered,
                failed = summary.failed,
                "Recovery sweep finished"
            );
        }
        Ok(summary)
    }

    async fn check_record(&self, mut record: AlertRecord) -> Result<bool> {
        let Some(rule) = self.rules.find_by_id(&record.rule_id).await? else {
            tracing::warn!(
                alert_id = %record.id,
                rule_id = %record.rule_id,
                "Rule of open alert no longer exists, skipping recovery check"
            );
            return Ok(false);
        };

        // Re-collect through the same registry used at creation time, scoped
        // to this alert's target.
        let mut values: HashMap<String, f64> = HashMap::new();
        let mut target_present = false;
        for name in rule.metric_names() {
            for metric in self.registry.collect_all(&name).await? {
                if metric.target_type == record.target_type && metric.target_id == record.target_id
                {
                    values.insert(metric.name, metric.value);
                    target_present = true;
                }
            }
        }

        let still_triggered = if rule.conditions.is_empty() {
            // presence-triggered rules recover once the target leaves the
            // collector's filtered set
            target_present
        } else {
            let mut all = true;
            for cond in &rule.conditions {
                if !condition::evaluate(cond, values.get(&cond.metric).copied())? {
                    all = false;
                    break;
                }
            }
            all
        };

        if still_triggered {
            return Ok(false);
        }

        record
            .recover()
            .map_err(|e| anyhow::anyhow!("recover rejected for alert {}: {e}", record.id))?;
        self.records.update(&record).await?;

        tracing::info!(
            alert_id = %record.id,
            rule_id = %record.rule_id,
            target_id = %record.target_id,
            duration_minutes = ?record.duration_minutes,
            "Alert recovered"
        );

        let _ = self.signals.send(AlertSignal::Recovered(record));
        Ok(true)
    }
}
