use crate::dispatcher::Dispatcher;
use crate::error::NotifyError;
use crate::DeliveryChannel;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ecomon_common::repo::{
    AlertNotifyLogRepository, AlertRecordRepository, RecipientResolver, RuleRepository,
};
use ecomon_common::types::{
    AlertLevel, AlertNotifyLog, AlertRecord, AlertRule, AlertSignal, AlertStatus, NotifyChannelType,
    NotifyEpisode, NotifyStatus, RuleCondition, RuleType, TargetType, User,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ---- in-memory fakes ----

struct MemRules(Vec<AlertRule>);

#[async_trait]
impl RuleRepository for MemRules {
    async fn find_all_enabled(&self) -> Result<Vec<AlertRule>> {
        Ok(self.0.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRule>> {
        Ok(self.0.iter().find(|r| r.id == id).cloned())
    }
}

#[derive(Default)]
struct MemRecords(Mutex<Vec<AlertRecord>>);

#[async_trait]
impl AlertRecordRepository for MemRecords {
    async fn insert_if_quiet(
        &self,
        record: &AlertRecord,
        _quiet_minutes: i64,
    ) -> Result<Option<AlertRecord>> {
        self.0.lock().unwrap().push(record.clone());
        Ok(Some(record.clone()))
    }

    async fn update(&self, record: &AlertRecord) -> Result<()> {
        let mut inner = self.0.lock().unwrap();
        let slot = inner
            .iter_mut()
            .find(|r| r.id == record.id)
            .expect("update of unknown record");
        *slot = record.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRecord>> {
        Ok(self.0.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn find_active(&self) -> Result<Vec<AlertRecord>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status.is_active())
            .cloned()
            .collect())
    }

    async fn find_by_rule_target(
        &self,
        _rule_id: &str,
        _target_type: TargetType,
        _target_id: &str,
    ) -> Result<Vec<AlertRecord>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct MemLogs(Mutex<Vec<AlertNotifyLog>>);

#[async_trait]
impl AlertNotifyLogRepository for MemLogs {
    async fn insert(&self, log: &AlertNotifyLog) -> Result<()> {
        self.0.lock().unwrap().push(log.clone());
        Ok(())
    }

    async fn batch_insert(&self, logs: &[AlertNotifyLog]) -> Result<()> {
        self.0.lock().unwrap().extend_from_slice(logs);
        Ok(())
    }

    async fn update(&self, log: &AlertNotifyLog) -> Result<()> {
        let mut inner = self.0.lock().unwrap();
        let slot = inner
            .iter_mut()
            .find(|l| l.id == log.id)
            .expect("update of unknown log");
        *slot = log.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertNotifyLog>> {
        Ok(self.0.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }

    async fn find_by_alert(
        &self,
        alert_id: &str,
        episode: Option<NotifyEpisode>,
    ) -> Result<Vec<AlertNotifyLog>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.alert_id == alert_id && episode.map_or(true, |e| l.episode == e))
            .cloned()
            .collect())
    }

    async fn count_success(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64> {
        Ok(self
            .find_by_alert(alert_id, Some(episode))
            .await?
            .iter()
            .filter(|l| l.status == NotifyStatus::Success)
            .count() as u64)
    }

    async fn count_failed(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64> {
        Ok(self
            .find_by_alert(alert_id, Some(episode))
            .await?
            .iter()
            .filter(|l| l.status == NotifyStatus::Failed)
            .count() as u64)
    }
}

struct MemResolver(Vec<User>);

#[async_trait]
impl RecipientResolver for MemResolver {
    async fn alert_recipients(&self, _rule: &AlertRule) -> Result<Vec<User>> {
        Ok(self.0.clone())
    }
}

/// Channel that records sends and fails for configured targets.
struct FakeChannel {
    kind: NotifyChannelType,
    fail_targets: HashSet<String>,
    sent: Mutex<Vec<String>>,
}

impl FakeChannel {
    fn new(kind: NotifyChannelType) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail_targets: HashSet::new(),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn failing(kind: NotifyChannelType, targets: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            kind,
            fail_targets: targets.iter().map(|t| t.to_string()).collect(),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DeliveryChannel for FakeChannel {
    async fn deliver(&self, target: &str, _content: &str) -> Result<()> {
        if self.fail_targets.contains(target) {
            anyhow::bail!("gateway rejected {target}");
        }
        self.sent.lock().unwrap().push(target.to_string());
        Ok(())
    }

    fn channel_type(&self) -> NotifyChannelType {
        self.kind
    }
}

// ---- fixtures ----

fn user(id: &str, name: &str, phone: Option<&str>, email: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        department_id: None,
        phone: phone.map(str::to_string),
        email: email.map(str::to_string),
        push_token: None,
        wechat_openid: None,
        enabled: true,
    }
}

fn rule_with_channels(channels: Vec<NotifyChannelType>) -> AlertRule {
    let now = Utc::now();
    AlertRule {
        id: "r-ph".into(),
        name: "pH 过低".into(),
        rule_type: RuleType::FactorThreshold,
        target_type: TargetType::Site,
        conditions: vec![RuleCondition {
            metric: "factor.ph".into(),
            op: ecomon_common::types::CompareOp::Lt,
            threshold: Some(6.0),
            min: None,
            max: None,
        }],
        level: AlertLevel::Warning,
        message_template: "{target} pH 超标".into(),
        scheme_id: None,
        channels,
        recipient_users: vec!["u-a".into(), "u-b".into()],
        recipient_depts: Vec::new(),
        enabled: true,
        quiet_minutes: 30,
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn pending_record() -> AlertRecord {
    let now = Utc::now();
    AlertRecord {
        id: ecomon_common::id::next_id(),
        alert_code: "AL-1".into(),
        rule_id: "r-ph".into(),
        rule_name: "pH 过低".into(),
        rule_type: RuleType::FactorThreshold,
        target_type: TargetType::Site,
        target_id: "site-17".into(),
        target_name: "十七号站".into(),
        level: AlertLevel::Warning,
        message: "十七号站 pH 超标".into(),
        payload_json: None,
        task_instance_id: None,
        task_created: false,
        status: AlertStatus::Pending,
        notify_status: NotifyStatus::Pending,
        notify_time: None,
        recover_time: None,
        duration_minutes: None,
        remark: None,
        deleted: false,
        created_at: now - Duration::minutes(5),
        updated_at: now,
    }
}

struct Harness {
    dispatcher: Dispatcher,
    records: Arc<MemRecords>,
    logs: Arc<MemLogs>,
}

fn harness(
    rule: AlertRule,
    users: Vec<User>,
    channels: Vec<Arc<FakeChannel>>,
) -> Harness {
    let records = Arc::new(MemRecords::default());
    let logs = Arc::new(MemLogs::default());
    let mut map: HashMap<NotifyChannelType, Arc<dyn DeliveryChannel>> = HashMap::new();
    for channel in channels {
        map.insert(channel.kind, channel);
    }
    let dispatcher = Dispatcher::new(
        Arc::new(MemRules(vec![rule])),
        records.clone(),
        logs.clone(),
        Arc::new(MemResolver(users)),
        map,
        4,
    );
    Harness {
        dispatcher,
        records,
        logs,
    }
}

// ---- tests ----

#[tokio::test]
async fn dispatch_creates_one_log_per_channel_recipient_pair() {
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let email = FakeChannel::new(NotifyChannelType::Email);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms, NotifyChannelType::Email]),
        vec![
            user("u-a", "张工", Some("13800000001"), Some("a@example.com")),
            user("u-b", "李工", Some("13800000002"), Some("b@example.com")),
        ],
        vec![sms.clone(), email.clone()],
    );

    let record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    h.dispatcher
        .handle_signal(&AlertSignal::Created(record.clone()))
        .await
        .unwrap();

    let logs = h.logs.find_by_alert(&record.id, None).await.unwrap();
    assert_eq!(logs.len(), 4);
    assert!(logs.iter().all(|l| l.status == NotifyStatus::Success));
    assert!(logs.iter().all(|l| l.send_time.is_some()));
    assert_eq!(sms.sent.lock().unwrap().len(), 2);
    assert_eq!(email.sent.lock().unwrap().len(), 2);

    let updated = h.records.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(updated.notify_status, NotifyStatus::Success);
    assert!(updated.notify_time.is_some());
    // notify axis never touches lifecycle status
    assert_eq!(updated.status, AlertStatus::Pending);
}

#[tokio::test]
async fn missing_address_is_skipped_not_failed() {
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms]),
        vec![
            user("u-a", "张工", Some("13800000001"), None),
            user("u-b", "李工", None, Some("b@example.com")), // no phone
        ],
        vec![sms.clone()],
    );

    let record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    h.dispatcher
        .handle_signal(&AlertSignal::Created(record.clone()))
        .await
        .unwrap();

    // only the addressable pair produced a log row
    let logs = h.logs.find_by_alert(&record.id, None).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].user_id, "u-a");
    assert_eq!(logs[0].status, NotifyStatus::Success);

    // the skipped pair is a configuration gap: aggregate is still SUCCESS
    let updated = h.records.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(updated.notify_status, NotifyStatus::Success);
}

#[tokio::test]
async fn any_failed_delivery_marks_aggregate_failed() {
    let sms = FakeChannel::failing(NotifyChannelType::Sms, &["13800000002"]);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms]),
        vec![
            user("u-a", "张工", Some("13800000001"), None),
            user("u-b", "李工", Some("13800000002"), None),
        ],
        vec![sms],
    );

    let record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    h.dispatcher
        .handle_signal(&AlertSignal::Created(record.clone()))
        .await
        .unwrap();

    let logs = h.logs.find_by_alert(&record.id, None).await.unwrap();
    assert_eq!(logs.len(), 2);
    let failed: Vec<_> = logs
        .iter()
        .filter(|l| l.status == NotifyStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].error_message.as_deref().unwrap().contains("rejected"));
    assert_eq!(failed[0].retry_count, 0);

    let updated = h.records.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(updated.notify_status, NotifyStatus::Failed);
}

#[tokio::test]
async fn unconfigured_channel_marks_pair_failed() {
    // the rule lists email, but only the sms capability is wired
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Email]),
        vec![user("u-a", "张工", None, Some("a@example.com"))],
        vec![sms],
    );

    let record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    h.dispatcher
        .handle_signal(&AlertSignal::Created(record.clone()))
        .await
        .unwrap();

    let logs = h.logs.find_by_alert(&record.id, None).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, NotifyStatus::Failed);

    let updated = h.records.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(updated.notify_status, NotifyStatus::Failed);
}

#[tokio::test]
async fn recovery_notifies_only_previously_successful_recipients() {
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let email = FakeChannel::new(NotifyChannelType::Email);
    // three configured recipients, but only A (sms) and B (email) were told
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms, NotifyChannelType::Email]),
        vec![
            user("u-a", "张工", Some("13800000001"), None),
            user("u-b", "李工", None, Some("b@example.com")),
            user("u-c", "王工", Some("13800000003"), None),
        ],
        vec![sms.clone(), email.clone()],
    );

    let mut record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    let now = Utc::now();
    let creation_logs = [
        ("u-a", "张工", NotifyChannelType::Sms, "13800000001", NotifyStatus::Success),
        ("u-b", "李工", NotifyChannelType::Email, "b@example.com", NotifyStatus::Success),
        ("u-c", "王工", NotifyChannelType::Sms, "13800000003", NotifyStatus::Failed),
    ];
    for (user_id, user_name, channel, target, status) in creation_logs {
        h.logs
            .insert(&AlertNotifyLog {
                id: ecomon_common::id::next_id(),
                alert_id: record.id.clone(),
                episode: NotifyEpisode::Alert,
                channel_type: channel,
                user_id: user_id.into(),
                user_name: user_name.into(),
                target: target.into(),
                content: "告警".into(),
                status,
                send_time: Some(now),
                error_message: None,
                retry_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    record.recover().unwrap();
    h.records.update(&record).await.unwrap();

    h.dispatcher
        .handle_signal(&AlertSignal::Recovered(record.clone()))
        .await
        .unwrap();

    let recover_logs = h
        .logs
        .find_by_alert(&record.id, Some(NotifyEpisode::Recover))
        .await
        .unwrap();
    assert_eq!(recover_logs.len(), 2);
    let recipients: HashSet<&str> = recover_logs.iter().map(|l| l.user_id.as_str()).collect();
    assert!(recipients.contains("u-a"));
    assert!(recipients.contains("u-b"));
    assert!(!recipients.contains("u-c"));
    assert!(recover_logs.iter().all(|l| l.content.contains("恢复")));
}

#[tokio::test]
async fn retry_succeeds_and_reaggregates() {
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms]),
        vec![user("u-a", "张工", Some("13800000001"), None)],
        vec![sms],
    );

    let mut record = pending_record();
    record.notify_status = NotifyStatus::Failed;
    h.records.0.lock().unwrap().push(record.clone());

    let now = Utc::now();
    let log = AlertNotifyLog {
        id: ecomon_common::id::next_id(),
        alert_id: record.id.clone(),
        episode: NotifyEpisode::Alert,
        channel_type: NotifyChannelType::Sms,
        user_id: "u-a".into(),
        user_name: "张工".into(),
        target: "13800000001".into(),
        content: "告警".into(),
        status: NotifyStatus::Failed,
        send_time: None,
        error_message: Some("gateway timeout".into()),
        retry_count: 1,
        created_at: now,
        updated_at: now,
    };
    h.logs.insert(&log).await.unwrap();

    let retried = h.dispatcher.retry(&log.id).await.unwrap();
    assert_eq!(retried.status, NotifyStatus::Success);
    assert_eq!(retried.retry_count, 2);
    assert!(retried.error_message.is_none());
    assert!(retried.send_time.is_some());

    let updated = h.records.find_by_id(&record.id).await.unwrap().unwrap();
    assert_eq!(updated.notify_status, NotifyStatus::Success);
}

#[tokio::test]
async fn retry_rejected_when_not_allowed() {
    let sms = FakeChannel::new(NotifyChannelType::Sms);
    let h = harness(
        rule_with_channels(vec![NotifyChannelType::Sms]),
        vec![user("u-a", "张工", Some("13800000001"), None)],
        vec![sms],
    );

    let record = pending_record();
    h.records.0.lock().unwrap().push(record.clone());

    let now = Utc::now();
    let exhausted = AlertNotifyLog {
        id: ecomon_common::id::next_id(),
        alert_id: record.id.clone(),
        episode: NotifyEpisode::Alert,
        channel_type: NotifyChannelType::Sms,
        user_id: "u-a".into(),
        user_name: "张工".into(),
        target: "13800000001".into(),
        content: "告警".into(),
        status: NotifyStatus::Failed,
        send_time: None,
        error_message: Some("gateway timeout".into()),
        retry_count: 3,
        created_at: now,
        updated_at: now,
    };
    h.logs.insert(&exhausted).await.unwrap();

    let err = h.dispatcher.retry(&exhausted.id).await.unwrap_err();
    assert!(matches!(err, NotifyError::RetryRejected(_)));

    let err = h.dispatcher.retry("no-such-log").await.unwrap_err();
    assert!(matches!(err, NotifyError::LogNotFound(_)));
}
