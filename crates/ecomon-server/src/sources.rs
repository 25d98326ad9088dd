//! Store-backed adapters behind the collector source traits and the task
//! gateway. The core crates only see the traits; this module is where the
//! composition root binds them to the management database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;

use ecomon_collector::device::{DeviceSource, OfflineDevice};
use ecomon_collector::factor::{FactorReading, FactorReadingSource};
use ecomon_common::repo::TaskGateway;
use ecomon_common::types::{AlertRecord, MaintTask, TaskState};
use ecomon_storage::Store;

pub struct StoreFactorSource {
    store: Arc<Store>,
}

impl StoreFactorSource {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FactorReadingSource for StoreFactorSource {
    async fn latest_readings(&self, factor: &str) -> Result<Vec<FactorReading>> {
        let rows = self.store.list_factor_readings(factor).await?;
        Ok(rows
            .into_iter()
            .map(|r| FactorReading {
                site_id: r.site_id,
                site_name: r.site_name,
                value: r.value,
                reading_time: r.reading_time,
            })
            .collect())
    }
}

pub struct StoreDeviceSource {
    store: Arc<Store>,
    offline_minutes: i64,
}

impl StoreDeviceSource {
    pub fn new(store: Arc<Store>, offline_minutes: i64) -> Self {
        Self {
            store,
            offline_minutes,
        }
    }
}

#[async_trait]
impl DeviceSource for StoreDeviceSource {
    async fn offline_devices(&self) -> Result<Vec<OfflineDevice>> {
        let now = Utc::now();
        let rows = self.store.list_offline_devices(self.offline_minutes).await?;
        Ok(rows
            .into_iter()
            .map(|d| OfflineDevice {
                device_id: d.id,
                device_name: d.name,
                // a device that never reported counts as offline since the
                // threshold boundary
                offline_minutes: d
                    .last_heartbeat
                    .map(|hb| (now - hb).num_minutes())
                    .unwrap_or(self.offline_minutes),
            })
            .collect())
    }
}

pub struct StoreTaskGateway {
    store: Arc<Store>,
    expiring_window_minutes: i64,
    remediation_deadline_hours: i64,
}

impl StoreTaskGateway {
    pub fn new(
        store: Arc<Store>,
        expiring_window_minutes: i64,
        remediation_deadline_hours: i64,
    ) -> Self {
        Self {
            store,
            expiring_window_minutes,
            remediation_deadline_hours,
        }
    }
}

#[async_trait]
impl TaskGateway for StoreTaskGateway {
    async fn find_expiring(&self) -> Result<Vec<MaintTask>> {
        self.store
            .list_expiring_tasks(self.expiring_window_minutes)
            .await
    }

    async fn find_overdue(&self) -> Result<Vec<MaintTask>> {
        self.store.list_overdue_tasks().await
    }

    async fn create_remediation_task(
        &self,
        scheme_id: &str,
        record: &AlertRecord,
    ) -> Result<MaintTask> {
        let task = MaintTask {
            id: ecomon_common::id::next_id(),
            name: format!("{} 处置任务", record.rule_name),
            target_type: record.target_type,
            target_id: record.target_id.clone(),
            target_name: record.target_name.clone(),
            deadline: Utc::now() + Duration::hours(self.remediation_deadline_hours),
            state: TaskState::Open,
        };
        self.store
            .insert_maint_task(&task, Some(scheme_id), Some(&record.id))
            .await
    }
}
