use anyhow::Result;
use chrono::Utc;
use ecomon_collector::CollectorRegistry;
use ecomon_common::repo::{AlertRecordRepository, RuleRepository, TaskGateway};
use ecomon_common::types::{
    AlertRecord, AlertRule, AlertSignal, AlertStatus, Metric, NotifyStatus, TargetType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::condition;

/// Measurements gathered for one concrete target within a sweep.
struct TargetMeasurements {
    target_name: String,
    values: HashMap<String, f64>,
    metrics: Vec<Metric>,
}

/// Counters for one evaluation sweep, logged by the scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepSummary {
    pub rules_evaluated: usize,
    pub rules_failed: usize,
    pub alerts_created: usize,
}

/// Per-sweep rule evaluation engine. Holds no state between sweeps; all
/// suppression decisions live at the persistence boundary.
pub struct RuleEngine {
    rules: Arc<dyn RuleRepository>,
    records: Arc<dyn AlertRecordRepository>,
    registry: Arc<CollectorRegistry>,
    tasks: Arc<dyn TaskGateway>,
    signals: mpsc::UnboundedSender<AlertSignal>,
}

impl RuleEngine {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        records: Arc<dyn AlertRecordRepository>,
        registry: Arc<CollectorRegistry>,
        tasks: Arc<dyn TaskGateway>,
        signals: mpsc::UnboundedSender<AlertSignal>,
    ) -> Self {
        Self {
            rules,
            records,
            registry,
            tasks,
            signals,
        }
    }

    /// One evaluation sweep over all enabled rules. A failure in one rule is
    /// logged with its id and never aborts the remaining rules.
    pub async fn run_sweep(&self) -> Result<SweepSummary> {
        let rules = self.rules.find_all_enabled().await?;
        let mut summary = SweepSummary::default();

        for rule in rules {
            summary.rules_evaluated += 1;
            match self.evaluate_rule(&rule).await {
                Ok(created) => summary.alerts_created += created,
                Err(e) => {
                    summary.rules_failed += 1;
                    tracing::error!(rule_id = %rule.id, error = %e, "Rule evaluation failed");
                }
            }
        }

        tracing::info!(
            rules = summary.rules_evaluated,
            failed = summary.rules_failed,
            created = summary.alerts_created,
            "Evaluation sweep finished"
        );
        Ok(summary)
    }

    async fn evaluate_rule(&self, rule: &AlertRule) -> Result<usize> {
        // Stored conditions are validated at save time; a violation here is
        // fatal to this rule's evaluation, not silently skipped.
        if !rule.validate_condition_configs() {
            anyhow::bail!("rule '{}' has invalid condition configuration", rule.name);
        }

        let metric_names = rule.metric_names();
        if metric_names.is_empty() {
            return Ok(0);
        }

        let mut by_target: HashMap<(TargetType, String), TargetMeasurements> = HashMap::new();
        for name in &metric_names {
            for metric in self.registry.collect_all(name).await? {
                let entry = by_target
                    .entry((metric.target_type, metric.target_id.clone()))
                    .or_insert_with(|| TargetMeasurements {
                        target_name: metric.target_name.clone(),
                        values: HashMap::new(),
                        metrics: Vec::new(),
                    });
                entry.values.insert(metric.name.clone(), metric.value);
                entry.metrics.push(metric);
            }
        }

        let mut created = 0;
        for ((target_type, target_id), measures) in by_target {
            if target_type != rule.target_type {
                continue;
            }
            if !self.rule_triggers(rule, &measures)? {
                continue;
            }
            if self
                .open_alert(rule, target_type, &target_id, &measures)
                .await?
            {
                created += 1;
            }
        }
        Ok(created)
    }

    /// AND semantics across conditions; partial matches never trigger.
    /// Condition-less rule types trigger on target presence, since their
    /// collectors emit only violating targets.
    fn rule_triggers(&self, rule: &AlertRule, measures: &TargetMeasurements) -> Result<bool> {
        if rule.conditions.is_empty() {
            return Ok(true);
        }
        for cond in &rule.conditions {
            let measured = measures.values.get(&cond.metric).copied();
            if !condition::evaluate(cond, measured)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn open_alert(
        &self,
        rule: &AlertRule,
        target_type: TargetType,
        target_id: &str,
        measures: &TargetMeasurements,
    ) -> Result<bool> {
        let now = Utc::now();
        let id = ecomon_common::id::next_id();
        let mut record = AlertRecord {
            alert_code: format!("AL{id}"),
            id,
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            rule_type: rule.rule_type,
            target_type,
            target_id: target_id.to_string(),
            target_name: measures.target_name.clone(),
            level: rule.level,
            message: render_message(&rule.message_template, &measures.target_name, measures),
            payload_json: Some(serde_json::to_string(&measures.metrics)?),
            task_instance_id: None,
            task_created: false,
            status: AlertStatus::Pending,
            notify_status: NotifyStatus::Pending,
            notify_time: None,
            recover_time: None,
            duration_minutes: None,
            remark: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        // Self-task case: a task-target alert links the task that raised it
        // and must not spawn a remediation task for itself.
        if rule.scheme_id.is_some() && target_type == TargetType::Task {
            record.task_instance_id = Some(target_id.to_string());
            record.task_created = false;
        }

        let Some(mut inserted) = self
            .records
            .insert_if_quiet(&record, rule.quiet_minutes)
            .await?
        else {
            tracing::debug!(
                rule_id = %rule.id,
                target_id,
                "Alert suppressed (open alert or quiet period)"
            );
            return Ok(false);
        };

        if let Some(scheme_id) = rule.scheme_id.as_deref() {
            if target_type != TargetType::Task {
                match self.tasks.create_remediation_task(scheme_id, &inserted).await {
                    Ok(task) => {
                        inserted.task_instance_id = Some(task.id);
                        inserted.task_created = true;
                        inserted.updated_at = Utc::now();
                        self.records.update(&inserted).await?;
                    }
                    Err(e) => {
                        // collaborator failure: the alert stands without a task
                        tracing::warn!(
                            alert_id = %inserted.id,
                            scheme_id,
                            error = %e,
                            "Remediation task creation failed"
                        );
                    }
                }
            }
        }

        tracing::info!(
            alert_id = %inserted.id,
            rule_id = %rule.id,
            target_id,
            level = %inserted.level,
            "Alert created"
        );

        // Fire-and-continue hand-off: a dispatcher failure downstream never
        // rolls back the record.
        let _ = self.signals.send(AlertSignal::Created(inserted));
        Ok(true)
    }
}

/// Renders the rule's message template. Supported placeholders: `{target}`,
/// `{metric}`, `{value}` (first triggering measurement).
fn render_message(template: &str, target_name: &str, measures: &TargetMeasurements) -> String {
    let mut message = template.replace("{target}", target_name);
    if let Some(first) = measures.metrics.first() {
        message = message
            .replace("{metric}", &first.name)
            .replace("{value}", &format!("{:.2}", first.value));
    }
    message
}
