use crate::device::{DeviceSource, DeviceStatusCollector, OfflineDevice};
use crate::factor::{factor_code, FactorCollector, FactorReading, FactorReadingSource};
use crate::task::TaskLifecycleCollector;
use crate::{CollectorRegistry, MetricCollector};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ecomon_common::repo::TaskGateway;
use ecomon_common::types::{
    AlertRecord, MaintTask, Metric, TargetType, TaskState, METRIC_DEVICE_OFFLINE_MINUTES,
    METRIC_TASK_EXPIRING, METRIC_TASK_OVERDUE,
};
use std::sync::Arc;

struct FixedReadings(Vec<FactorReading>);

#[async_trait]
impl FactorReadingSource for FixedReadings {
    async fn latest_readings(&self, factor: &str) -> Result<Vec<FactorReading>> {
        assert_eq!(factor, "ph");
        Ok(self.0.clone())
    }
}

struct FixedOffline(Vec<OfflineDevice>);

#[async_trait]
impl DeviceSource for FixedOffline {
    async fn offline_devices(&self) -> Result<Vec<OfflineDevice>> {
        Ok(self.0.clone())
    }
}

struct FixedTasks {
    expiring: Vec<MaintTask>,
    overdue: Vec<MaintTask>,
}

#[async_trait]
impl TaskGateway for FixedTasks {
    async fn find_expiring(&self) -> Result<Vec<MaintTask>> {
        Ok(self.expiring.clone())
    }

    async fn find_overdue(&self) -> Result<Vec<MaintTask>> {
        Ok(self.overdue.clone())
    }

    async fn create_remediation_task(
        &self,
        _scheme_id: &str,
        _record: &AlertRecord,
    ) -> Result<MaintTask> {
        unimplemented!("not used by the collector")
    }
}

fn make_task(id: &str, deadline_offset_minutes: i64) -> MaintTask {
    MaintTask {
        id: id.to_string(),
        name: format!("巡检任务 {id}"),
        target_type: TargetType::Site,
        target_id: "site-1".to_string(),
        target_name: "一号站".to_string(),
        deadline: Utc::now() + Duration::minutes(deadline_offset_minutes),
        state: TaskState::Open,
    }
}

#[test]
fn factor_code_requires_prefix() {
    assert_eq!(factor_code("factor.ph"), Some("ph"));
    assert_eq!(factor_code("factor."), None);
    assert_eq!(factor_code("ph"), None);
    assert_eq!(factor_code("device.offline_minutes"), None);
}

#[tokio::test]
async fn factor_collector_emits_one_metric_per_site() {
    let source = Arc::new(FixedReadings(vec![
        FactorReading {
            site_id: "site-17".into(),
            site_name: "十七号站".into(),
            value: 5.2,
            reading_time: Utc::now(),
        },
        FactorReading {
            site_id: "site-18".into(),
            site_name: "十八号站".into(),
            value: 7.1,
            reading_time: Utc::now(),
        },
    ]));
    let collector = FactorCollector::new(source);
    assert!(collector.supports("factor.ph"));
    assert!(!collector.supports(METRIC_TASK_OVERDUE));

    let metrics = collector.collect_all("factor.ph").await.unwrap();
    assert_eq!(metrics.len(), 2);
    assert!(metrics
        .iter()
        .all(|m| m.target_type == TargetType::Site && m.name == "factor.ph"));
    let site17: &Metric = metrics.iter().find(|m| m.target_id == "site-17").unwrap();
    assert_eq!(site17.value, 5.2);
}

#[tokio::test]
async fn device_collector_emits_only_offline_devices() {
    let source = Arc::new(FixedOffline(vec![OfflineDevice {
        device_id: "dev-3".into(),
        device_name: "pH 传感器".into(),
        offline_minutes: 42,
    }]));
    let collector = DeviceStatusCollector::new(source);

    let metrics = collector
        .collect_all(METRIC_DEVICE_OFFLINE_MINUTES)
        .await
        .unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].target_type, TargetType::Device);
    assert_eq!(metrics[0].value, 42.0);
}

#[tokio::test]
async fn task_collector_routes_by_metric_name() {
    let gateway = Arc::new(FixedTasks {
        expiring: vec![make_task("t-1", 30)],
        overdue: vec![make_task("t-2", -90), make_task("t-3", -10)],
    });
    let collector = TaskLifecycleCollector::new(gateway);

    let expiring = collector.collect_all(METRIC_TASK_EXPIRING).await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].target_id, "t-1");
    assert_eq!(expiring[0].target_type, TargetType::Task);

    let overdue = collector.collect_all(METRIC_TASK_OVERDUE).await.unwrap();
    assert_eq!(overdue.len(), 2);
    assert!(overdue.iter().any(|m| m.target_id == "t-2" && m.value >= 89.0));
}

#[tokio::test]
async fn registry_returns_empty_for_unrecognized_metric() {
    let mut registry = CollectorRegistry::new();
    registry.register(Box::new(DeviceStatusCollector::new(Arc::new(
        FixedOffline(Vec::new()),
    ))));

    assert!(!registry.supports("factor.ph"));
    let metrics = registry.collect_all("factor.ph").await.unwrap();
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn registry_dispatches_to_supporting_collector() {
    let mut registry = CollectorRegistry::new();
    registry.register(Box::new(DeviceStatusCollector::new(Arc::new(
        FixedOffline(vec![OfflineDevice {
            device_id: "dev-9".into(),
            device_name: "流量计".into(),
            offline_minutes: 5,
        }]),
    ))));
    registry.register(Box::new(FactorCollector::new(Arc::new(FixedReadings(
        Vec::new(),
    )))));

    let metrics = registry
        .collect_all(METRIC_DEVICE_OFFLINE_MINUTES)
        .await
        .unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0].target_id, "dev-9");
}
