use crate::store::monitor::{DeviceRow, FactorReadingRow};
use crate::store::rule::AlertRuleFilter;
use crate::Store;
use chrono::{Duration, Utc};
use ecomon_common::types::{
    AlertLevel, AlertNotifyLog, AlertRecord, AlertRule, AlertStatus, CompareOp, MaintTask,
    NotifyChannelType, NotifyEpisode, NotifyStatus, RuleCondition, RuleType, TargetType, TaskState,
    User,
};

/// Each test gets its own file-backed SQLite database; the tempdir guard
/// keeps it alive for the test body.
async fn temp_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ecomon-test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let store = Store::new(&url).await.expect("store init");
    (store, dir)
}

fn ph_rule(name: &str) -> AlertRule {
    let now = Utc::now();
    AlertRule {
        id: ecomon_common::id::next_id(),
        name: name.to_string(),
        rule_type: RuleType::FactorThreshold,
        target_type: TargetType::Site,
        conditions: vec![RuleCondition {
            metric: "factor.ph".into(),
            op: CompareOp::Lt,
            threshold: Some(6.0),
            min: None,
            max: None,
        }],
        level: AlertLevel::Warning,
        message_template: "{target} pH 当前值 {value}".into(),
        scheme_id: None,
        channels: vec![NotifyChannelType::Sms, NotifyChannelType::Email],
        recipient_users: vec!["u-1".into()],
        recipient_depts: vec!["d-1".into()],
        enabled: true,
        quiet_minutes: 30,
        deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn record_for(rule: &AlertRule, target_id: &str, created_minutes_ago: i64) -> AlertRecord {
    let created = Utc::now() - Duration::minutes(created_minutes_ago);
    let id = ecomon_common::id::next_id();
    AlertRecord {
        alert_code: format!("AL{id}"),
        id,
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        rule_type: rule.rule_type,
        target_type: rule.target_type,
        target_id: target_id.to_string(),
        target_name: format!("{target_id} 站"),
        level: rule.level,
        message: "pH 超标".into(),
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
        created_at: created,
        updated_at: created,
    }
}

#[tokio::test]
async fn rule_round_trip_preserves_conditions_and_channels() {
    let (store, _dir) = temp_store().await;
    let rule = ph_rule("pH 过低");
    let inserted = store.insert_alert_rule(&rule).await.unwrap();
    assert_eq!(inserted.conditions.len(), 1);
    assert_eq!(inserted.conditions[0].op, CompareOp::Lt);

    let loaded = store.get_alert_rule_by_id(&rule.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "pH 过低");
    assert_eq!(loaded.rule_type, RuleType::FactorThreshold);
    assert_eq!(loaded.channels, rule.channels);
    assert_eq!(loaded.recipient_users, rule.recipient_users);
    assert_eq!(loaded.quiet_minutes, 30);
}

#[tokio::test]
async fn rule_insert_rejects_missing_conditions_for_requiring_type() {
    let (store, _dir) = temp_store().await;
    let mut rule = ph_rule("无条件规则");
    rule.conditions.clear();
    assert!(store.insert_alert_rule(&rule).await.is_err());

    // malformed range condition is rejected too
    let mut rule = ph_rule("min>max");
    rule.conditions = vec![RuleCondition {
        metric: "factor.ph".into(),
        op: CompareOp::Between,
        threshold: None,
        min: Some(9.0),
        max: Some(6.0),
    }];
    assert!(store.insert_alert_rule(&rule).await.is_err());
}

#[tokio::test]
async fn soft_deleted_rules_leave_enabled_listing() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();
    assert_eq!(store.list_enabled_alert_rules().await.unwrap().len(), 1);

    assert!(store.delete_alert_rule(&rule.id).await.unwrap());
    assert!(store.list_enabled_alert_rules().await.unwrap().is_empty());
    assert!(store.get_alert_rule_by_id(&rule.id).await.unwrap().is_none());

    let filter = AlertRuleFilter::default();
    assert_eq!(store.count_alert_rules(&filter).await.unwrap(), 0);
}

#[tokio::test]
async fn insert_if_quiet_suppresses_open_alert_for_same_pair() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();

    let first = record_for(&rule, "site-17", 0);
    assert!(store
        .insert_alert_if_quiet(&first, rule.quiet_minutes)
        .await
        .unwrap()
        .is_some());

    // open alert for the pair: suppressed regardless of quiet period
    let dup = record_for(&rule, "site-17", 0);
    assert!(store
        .insert_alert_if_quiet(&dup, rule.quiet_minutes)
        .await
        .unwrap()
        .is_none());

    // a different target is unaffected
    let other = record_for(&rule, "site-18", 0);
    assert!(store
        .insert_alert_if_quiet(&other, rule.quiet_minutes)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn insert_if_quiet_honors_quiet_window_after_close() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();

    // closed alert from 10 minutes ago: still inside the 30 minute window
    let mut recent = record_for(&rule, "site-17", 10);
    recent.status = AlertStatus::Recovered;
    assert!(store
        .insert_alert_if_quiet(&recent, 0)
        .await
        .unwrap()
        .is_some());

    let attempt = record_for(&rule, "site-17", 0);
    assert!(store
        .insert_alert_if_quiet(&attempt, 30)
        .await
        .unwrap()
        .is_none());

    // but a 45-minutes-old closed alert is outside the window
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();
    let mut old = record_for(&rule, "site-17", 45);
    old.status = AlertStatus::Recovered;
    assert!(store.insert_alert_if_quiet(&old, 0).await.unwrap().is_some());

    let attempt = record_for(&rule, "site-17", 0);
    assert!(store
        .insert_alert_if_quiet(&attempt, 30)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn alert_record_update_round_trips_lifecycle_fields() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();
    let mut record = store
        .insert_alert_if_quiet(&record_for(&rule, "site-17", 40), 0)
        .await
        .unwrap()
        .unwrap();

    record.recover().unwrap();
    store.update_alert_record(&record).await.unwrap();

    let loaded = store
        .get_alert_record_by_id(&record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.status, AlertStatus::Recovered);
    assert!(loaded.recover_time.is_some());
    assert_eq!(loaded.duration_minutes, Some(40));
    assert!(store.list_active_alert_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn lifecycle_operations_are_guarded() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();
    let record = store
        .insert_alert_if_quiet(&record_for(&rule, "site-17", 5), 0)
        .await
        .unwrap()
        .unwrap();

    let record = store.start_process_alert(&record.id).await.unwrap();
    assert_eq!(record.status, AlertStatus::InProgress);
    // starting twice is a rejected transition, not a silent no-op
    assert!(store.start_process_alert(&record.id).await.is_err());

    let record = store.resolve_alert(&record.id, "已排查处理").await.unwrap();
    assert_eq!(record.status, AlertStatus::Resolved);
    assert!(record.duration_minutes.is_some());
    // recovering a resolved alert is rejected
    assert!(store.ignore_alert(&record.id, "x").await.is_err());
}

#[tokio::test]
async fn notify_log_counts_by_episode_and_status() {
    let (store, _dir) = temp_store().await;
    let rule = store.insert_alert_rule(&ph_rule("pH 过低")).await.unwrap();
    let record = store
        .insert_alert_if_quiet(&record_for(&rule, "site-17", 0), 0)
        .await
        .unwrap()
        .unwrap();

    let now = Utc::now();
    let mut logs = Vec::new();
    for (user_id, status) in [
        ("u-1", NotifyStatus::Success),
        ("u-2", NotifyStatus::Failed),
        ("u-3", NotifyStatus::Success),
    ] {
        logs.push(AlertNotifyLog {
            id: ecomon_common::id::next_id(),
            alert_id: record.id.clone(),
            episode: NotifyEpisode::Alert,
            channel_type: NotifyChannelType::Sms,
            user_id: user_id.into(),
            user_name: user_id.into(),
            target: format!("{user_id}@example.com"),
            content: "告警".into(),
            status,
            send_time: Some(now),
            error_message: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        });
    }
    store.batch_insert_notify_logs(&logs).await.unwrap();

    assert_eq!(
        store
            .count_notify_logs_by_status(&record.id, NotifyEpisode::Alert, NotifyStatus::Success)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        store
            .count_notify_logs_by_status(&record.id, NotifyEpisode::Alert, NotifyStatus::Failed)
            .await
            .unwrap(),
        1
    );
    assert!(store
        .list_notify_logs_by_alert(&record.id, Some(NotifyEpisode::Recover))
        .await
        .unwrap()
        .is_empty());

    // update one row in place
    let mut failed = logs.remove(1);
    failed.begin_retry().unwrap();
    failed.mark_success();
    store.update_notify_log(&failed).await.unwrap();
    assert_eq!(
        store
            .count_notify_logs_by_status(&record.id, NotifyEpisode::Alert, NotifyStatus::Failed)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn recipients_resolve_users_and_departments() {
    let (store, _dir) = temp_store().await;
    for (id, dept, enabled) in [
        ("u-1", Some("d-ops"), true),
        ("u-2", Some("d-ops"), true),
        ("u-3", Some("d-lab"), true),
        ("u-4", Some("d-ops"), false),
    ] {
        store
            .upsert_user(&User {
                id: id.into(),
                name: format!("用户 {id}"),
                department_id: dept.map(str::to_string),
                phone: Some("13800000000".into()),
                email: None,
                push_token: None,
                wechat_openid: None,
                enabled,
            })
            .await
            .unwrap();
    }

    let recipients = store
        .list_recipients(&["u-3".to_string()], &["d-ops".to_string()])
        .await
        .unwrap();
    let mut ids: Vec<&str> = recipients.iter().map(|u| u.id.as_str()).collect();
    ids.sort();
    // u-4 is disabled and excluded; u-3 via ids, u-1/u-2 via department
    assert_eq!(ids, vec!["u-1", "u-2", "u-3"]);

    assert!(store
        .list_recipients(&[], &[])
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn factor_reading_upsert_keeps_one_row_per_site_factor() {
    let (store, _dir) = temp_store().await;
    let row = FactorReadingRow {
        site_id: "site-17".into(),
        site_name: "十七号站".into(),
        factor: "ph".into(),
        value: 5.2,
        reading_time: Utc::now(),
    };
    store.upsert_factor_reading(&row).await.unwrap();
    store
        .upsert_factor_reading(&FactorReadingRow {
            value: 7.0,
            reading_time: Utc::now(),
            ..row.clone()
        })
        .await
        .unwrap();

    let readings = store.list_factor_readings("ph").await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, 7.0);
    assert!(store.has_factor("ph").await.unwrap());
    assert!(!store.has_factor("cod").await.unwrap());
}

#[tokio::test]
async fn offline_devices_filtered_by_heartbeat() {
    let (store, _dir) = temp_store().await;
    let now = Utc::now();
    for (id, heartbeat) in [
        ("dev-1", Some(now - Duration::minutes(2))),
        ("dev-2", Some(now - Duration::minutes(30))),
        ("dev-3", None),
    ] {
        store
            .upsert_device(&DeviceRow {
                id: id.into(),
                name: format!("设备 {id}"),
                site_id: "site-17".into(),
                site_name: "十七号站".into(),
                last_heartbeat: heartbeat,
            })
            .await
            .unwrap();
    }

    let offline = store.list_offline_devices(15).await.unwrap();
    let mut ids: Vec<&str> = offline.iter().map(|d| d.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["dev-2", "dev-3"]);

    // heartbeat brings a device back
    assert!(store.touch_device_heartbeat("dev-2", now).await.unwrap());
    assert_eq!(store.list_offline_devices(15).await.unwrap().len(), 1);
}

#[tokio::test]
async fn task_queries_split_expiring_and_overdue() {
    let (store, _dir) = temp_store().await;
    let now = Utc::now();
    let mk = |id: &str, deadline_offset: i64, state: TaskState| MaintTask {
        id: id.to_string(),
        name: format!("任务 {id}"),
        target_type: TargetType::Site,
        target_id: "site-17".into(),
        target_name: "十七号站".into(),
        deadline: now + Duration::minutes(deadline_offset),
        state,
    };
    store
        .insert_maint_task(&mk("t-soon", 30, TaskState::Open), None, None)
        .await
        .unwrap();
    store
        .insert_maint_task(&mk("t-late", -30, TaskState::Open), None, None)
        .await
        .unwrap();
    store
        .insert_maint_task(&mk("t-far", 600, TaskState::Open), None, None)
        .await
        .unwrap();
    store
        .insert_maint_task(&mk("t-done", -60, TaskState::Done), None, None)
        .await
        .unwrap();

    let expiring = store.list_expiring_tasks(60).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].id, "t-soon");

    let overdue = store.list_overdue_tasks().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, "t-late");

    assert!(store
        .set_maint_task_state("t-late", TaskState::Done)
        .await
        .unwrap());
    assert!(store.list_overdue_tasks().await.unwrap().is_empty());
}
