use anyhow::Result;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use ecomon_common::repo::{
    AlertNotifyLogRepository, AlertRecordRepository, RecipientResolver, RuleRepository,
};
use ecomon_common::types::{
    AlertNotifyLog, AlertRecord, AlertSignal, NotifyChannelType, NotifyEpisode, NotifyStatus,
};

use crate::error::NotifyError;
use crate::DeliveryChannel;

/// One (channel, recipient) delivery unit within an episode.
struct DeliveryPair {
    channel_type: NotifyChannelType,
    user_id: String,
    user_name: String,
    target: String,
}

/// Fans alerts out to (channel, recipient) pairs, owns the notify log state
/// machine and aggregates the per-alert notify status.
///
/// Deliveries within one episode run concurrently under a semaphore-bounded
/// worker pool; the aggregate is written only after every pair has finished
/// (join barrier). Different alerts' episodes are independent.
pub struct Dispatcher {
    rules: Arc<dyn RuleRepository>,
    records: Arc<dyn AlertRecordRepository>,
    logs: Arc<dyn AlertNotifyLogRepository>,
    resolver: Arc<dyn RecipientResolver>,
    channels: HashMap<NotifyChannelType, Arc<dyn DeliveryChannel>>,
    max_concurrent: usize,
}

impl Dispatcher {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        records: Arc<dyn AlertRecordRepository>,
        logs: Arc<dyn AlertNotifyLogRepository>,
        resolver: Arc<dyn RecipientResolver>,
        channels: HashMap<NotifyChannelType, Arc<dyn DeliveryChannel>>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            rules,
            records,
            logs,
            resolver,
            channels,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Consumes alert signals until the channel closes. A failed episode
    /// forces the alert's notify status to FAILED rather than leaving it
    /// stale, and never takes the dispatcher down.
    pub async fn run(self: Arc<Self>, mut signals: mpsc::UnboundedReceiver<AlertSignal>) {
        tracing::info!(
            max_concurrent = self.max_concurrent,
            "Notification dispatcher started"
        );
        while let Some(signal) = signals.recv().await {
            let alert_id = signal.record().id.clone();
            if let Err(e) = self.handle_signal(&signal).await {
                tracing::error!(alert_id = %alert_id, error = %e, "Notification episode failed");
                self.force_notify_failed(&alert_id).await;
            }
        }
        tracing::info!("Notification dispatcher stopped (signal channel closed)");
    }

    pub async fn handle_signal(&self, signal: &AlertSignal) -> Result<()> {
        match signal {
            AlertSignal::Created(record) => self.notify_created(record).await,
            AlertSignal::Recovered(record) => self.notify_recovered(record).await,
        }
    }

    /// Creation episode: the rule's configured channels × resolved
    /// recipients. A recipient without an address for a channel is a
    /// configuration gap, skipped with a warning, not a delivery failure.
    async fn notify_created(&self, record: &AlertRecord) -> Result<()> {
        let Some(rule) = self.rules.find_by_id(&record.rule_id).await? else {
            tracing::warn!(
                alert_id = %record.id,
                rule_id = %record.rule_id,
                "Rule of alert no longer exists, skipping notification"
            );
            return Ok(());
        };

        let recipients = self.resolver.alert_recipients(&rule).await?;
        if recipients.is_empty() {
            tracing::warn!(
                alert_id = %record.id,
                rule_id = %rule.id,
                "Rule resolves to no recipients"
            );
            return Ok(());
        }

        let mut pairs = Vec::new();
        for channel_type in &rule.channels {
            for user in &recipients {
                match user.notify_target(*channel_type) {
                    Some(target) => pairs.push(DeliveryPair {
                        channel_type: *channel_type,
                        user_id: user.id.clone(),
                        user_name: user.name.clone(),
                        target: target.to_string(),
                    }),
                    None => {
                        tracing::warn!(
                            alert_id = %record.id,
                            user_id = %user.id,
                            channel = %channel_type,
                            "Recipient has no address for channel, skipping"
                        );
                    }
                }
            }
        }

        let content = render_alert_content(record);
        self.run_episode(record, NotifyEpisode::Alert, &content, pairs)
            .await
    }

    /// Recovery episode: exactly the recipients whose creation-episode
    /// delivery succeeded — people who were actually told.
    async fn notify_recovered(&self, record: &AlertRecord) -> Result<()> {
        let prior = self
            .logs
            .find_by_alert(&record.id, Some(NotifyEpisode::Alert))
            .await?;

        let mut seen = HashSet::new();
        let pairs: Vec<DeliveryPair> = prior
            .into_iter()
            .filter(|log| log.status == NotifyStatus::Success)
            .filter(|log| seen.insert((log.channel_type, log.user_id.clone())))
            .map(|log| DeliveryPair {
                channel_type: log.channel_type,
                user_id: log.user_id,
                user_name: log.user_name,
                target: log.target,
            })
            .collect();

        if pairs.is_empty() {
            tracing::debug!(
                alert_id = %record.id,
                "No successfully notified recipients, skipping recovery notification"
            );
            return Ok(());
        }

        let content = render_recovery_content(record);
        self.run_episode(record, NotifyEpisode::Recover, &content, pairs)
            .await
    }

    async fn run_episode(
        &self,
        record: &AlertRecord,
        episode: NotifyEpisode,
        content: &str,
        pairs: Vec<DeliveryPair>,
    ) -> Result<()> {
        if pairs.is_empty() {
            // nothing dispatched; the aggregate stays PENDING
            return Ok(());
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::new();

        for pair in pairs {
            let now = Utc::now();
            let log = AlertNotifyLog {
                id: ecomon_common::id::next_id(),
                alert_id: record.id.clone(),
                episode,
                channel_type: pair.channel_type,
                user_id: pair.user_id,
                user_name: pair.user_name,
                target: pair.target,
                content: content.to_string(),
                status: NotifyStatus::Pending,
                send_time: None,
                error_message: None,
                retry_count: 0,
                created_at: now,
                updated_at: now,
            };
            self.logs.insert(&log).await?;

            let permit = semaphore.clone().acquire_owned().await?;
            let channel = self.channels.get(&pair.channel_type).cloned();
            let logs = Arc::clone(&self.logs);

            handles.push(tokio::spawn(async move {
                let mut log = log;
                match channel {
                    Some(channel) => match channel.deliver(&log.target, &log.content).await {
                        Ok(()) => log.mark_success(),
                        Err(e) => {
                            tracing::warn!(
                                log_id = %log.id,
                                channel = %log.channel_type,
                                target = %log.target,
                                error = %e,
                                "Delivery failed"
                            );
                            log.mark_failed(&e.to_string());
                        }
                    },
                    None => {
                        let err = NotifyError::ChannelUnavailable(log.channel_type);
                        tracing::warn!(log_id = %log.id, error = %err, "Delivery failed");
                        log.mark_failed(&err.to_string());
                    }
                }
                if let Err(e) = logs.update(&log).await {
                    tracing::error!(log_id = %log.id, error = %e, "Failed to persist notify log");
                }
                drop(permit);
                log.status
            }));
        }

        // barrier: the per-alert aggregate waits for every pair of this episode
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(status) => statuses.push(status),
                Err(e) => {
                    tracing::error!(alert_id = %record.id, error = %e, "Delivery task panicked");
                    statuses.push(NotifyStatus::Failed);
                }
            }
        }

        self.write_aggregate(&record.id, &statuses).await
    }

    /// SUCCESS iff every row of the episode is SUCCESS; FAILED iff any is
    /// FAILED; otherwise the record is left PENDING.
    async fn write_aggregate(&self, alert_id: &str, statuses: &[NotifyStatus]) -> Result<()> {
        let Some(mut record) = self.records.find_by_id(alert_id).await? else {
            tracing::warn!(alert_id, "Alert vanished before notify aggregation");
            return Ok(());
        };
        if statuses.iter().any(|s| *s == NotifyStatus::Failed) {
            record.notify_failed();
        } else if !statuses.is_empty() && statuses.iter().all(|s| *s == NotifyStatus::Success) {
            record.notify_success();
        } else {
            return Ok(());
        }
        self.records.update(&record).await
    }

    async fn force_notify_failed(&self, alert_id: &str) {
        match self.records.find_by_id(alert_id).await {
            Ok(Some(mut record)) => {
                record.notify_failed();
                if let Err(e) = self.records.update(&record).await {
                    tracing::error!(alert_id, error = %e, "Failed to force notify status");
                }
            }
            Ok(None) => {}
            Err(e) => tracing::error!(alert_id, error = %e, "Failed to load alert for notify status"),
        }
    }

    /// Explicit bounded retry of one failed log row. Rejected unless
    /// `can_retry()`; a successful retry clears the error and stamps the
    /// send time, and the alert's aggregate is recomputed either way.
    pub async fn retry(&self, log_id: &str) -> crate::error::Result<AlertNotifyLog> {
        let mut log = self
            .logs
            .find_by_id(log_id)
            .await
            .map_err(|e| NotifyError::Other(e.to_string()))?
            .ok_or_else(|| NotifyError::LogNotFound(log_id.to_string()))?;

        log.begin_retry()?;

        let channel = self
            .channels
            .get(&log.channel_type)
            .ok_or(NotifyError::ChannelUnavailable(log.channel_type))?;

        match channel.deliver(&log.target, &log.content).await {
            Ok(()) => log.mark_success(),
            Err(e) => log.mark_failed(&e.to_string()),
        }

        self.logs
            .update(&log)
            .await
            .map_err(|e| NotifyError::Other(e.to_string()))?;

        if let Err(e) = self.reaggregate(&log.alert_id, log.episode).await {
            tracing::error!(alert_id = %log.alert_id, error = %e, "Re-aggregation after retry failed");
        }
        Ok(log)
    }

    async fn reaggregate(&self, alert_id: &str, episode: NotifyEpisode) -> Result<()> {
        let logs = self.logs.find_by_alert(alert_id, Some(episode)).await?;
        let statuses: Vec<NotifyStatus> = logs.iter().map(|l| l.status).collect();
        self.write_aggregate(alert_id, &statuses).await
    }
}

fn render_alert_content(record: &AlertRecord) -> String {
    format!(
        "[告警][{level}] {rule}\n对象: {target}\n内容: {message}\n时间: {time}",
        level = record.level,
        rule = record.rule_name,
        target = record.target_name,
        message = record.message,
        time = record.created_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn render_recovery_content(record: &AlertRecord) -> String {
    let recover_time = record
        .recover_time
        .unwrap_or(record.updated_at)
        .format("%Y-%m-%d %H:%M:%S");
    format!(
        "[恢复][{level}] {rule}\n对象: {target}\n告警已解除\n恢复时间: {time}",
        level = record.level,
        rule = record.rule_name,
        target = record.target_name,
        time = recover_time,
    )
}
