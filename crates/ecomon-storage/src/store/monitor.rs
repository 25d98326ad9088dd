use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter,
};

use ecomon_common::types::{MaintTask, TaskState};

use crate::entities::device::{self, Column as DeviceCol, Entity as DeviceEntity};
use crate::entities::factor_reading::{self, Column as ReadingCol, Entity as ReadingEntity};
use crate::entities::maint_task::{self, Column as TaskCol, Entity as TaskEntity};
use crate::error::StorageError;
use crate::store::Store;

/// 监测因子最新读数（每个 站点 × 因子 保留一行）
#[derive(Debug, Clone)]
pub struct FactorReadingRow {
    pub site_id: String,
    pub site_name: String,
    pub factor: String,
    pub value: f64,
    pub reading_time: DateTime<Utc>,
}

/// 监测设备
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub id: String,
    pub name: String,
    pub site_id: String,
    pub site_name: String,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

fn reading_to_row(m: factor_reading::Model) -> FactorReadingRow {
    FactorReadingRow {
        site_id: m.site_id,
        site_name: m.site_name,
        factor: m.factor,
        value: m.value,
        reading_time: m.reading_time.with_timezone(&Utc),
    }
}

fn device_to_row(m: device::Model) -> DeviceRow {
    DeviceRow {
        id: m.id,
        name: m.name,
        site_id: m.site_id,
        site_name: m.site_name,
        last_heartbeat: m.last_heartbeat.map(|t| t.with_timezone(&Utc)),
    }
}

fn task_to_domain(m: maint_task::Model) -> Result<MaintTask> {
    Ok(MaintTask {
        id: m.id,
        name: m.name,
        target_type: m
            .target_type
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "target_type",
                detail: e,
            })?,
        target_id: m.target_id,
        target_name: m.target_name,
        deadline: m.deadline.with_timezone(&Utc),
        state: m.state.parse().map_err(|e: String| StorageError::Corrupt {
            column: "state",
            detail: e,
        })?,
    })
}

impl Store {
    /// 写入或更新某站点某因子的最新读数。
    pub async fn upsert_factor_reading(&self, row: &FactorReadingRow) -> Result<()> {
        let now = Utc::now().fixed_offset();
        let existing = ReadingEntity::find()
            .filter(ReadingCol::SiteId.eq(row.site_id.clone()))
            .filter(ReadingCol::Factor.eq(row.factor.clone()))
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        match existing {
            Some(m) => {
                let mut am: factor_reading::ActiveModel = m.into();
                am.site_name = Set(row.site_name.clone());
                am.value = Set(row.value);
                am.reading_time = Set(row.reading_time.fixed_offset());
                am.updated_at = Set(now);
                am.update(self.db()).await.map_err(StorageError::Db)?;
            }
            None => {
                let am = factor_reading::ActiveModel {
                    id: Set(ecomon_common::id::next_id()),
                    site_id: Set(row.site_id.clone()),
                    site_name: Set(row.site_name.clone()),
                    factor: Set(row.factor.clone()),
                    value: Set(row.value),
                    reading_time: Set(row.reading_time.fixed_offset()),
                    updated_at: Set(now),
                };
                am.insert(self.db()).await.map_err(StorageError::Db)?;
            }
        }
        Ok(())
    }

    /// 某因子在所有站点的最新读数。
    pub async fn list_factor_readings(&self, factor: &str) -> Result<Vec<FactorReadingRow>> {
        let rows = ReadingEntity::find()
            .filter(ReadingCol::Factor.eq(factor))
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(rows.into_iter().map(reading_to_row).collect())
    }

    /// 是否存在该因子的读数（因子采集器的 supports 判定依据）。
    pub async fn has_factor(&self, factor: &str) -> Result<bool> {
        let n = ReadingEntity::find()
            .filter(ReadingCol::Factor.eq(factor))
            .count(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(n > 0)
    }

    pub async fn upsert_device(&self, row: &DeviceRow) -> Result<()> {
        let now = Utc::now().fixed_offset();
        let existing = DeviceEntity::find_by_id(&row.id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        match existing {
            Some(m) => {
                let mut am: device::ActiveModel = m.into();
                am.name = Set(row.name.clone());
                am.site_id = Set(row.site_id.clone());
                am.site_name = Set(row.site_name.clone());
                am.last_heartbeat = Set(row.last_heartbeat.map(|t| t.fixed_offset()));
                am.updated_at = Set(now);
                am.update(self.db()).await.map_err(StorageError::Db)?;
            }
            None => {
                let am = device::ActiveModel {
                    id: Set(row.id.clone()),
                    name: Set(row.name.clone()),
                    site_id: Set(row.site_id.clone()),
                    site_name: Set(row.site_name.clone()),
                    last_heartbeat: Set(row.last_heartbeat.map(|t| t.fixed_offset())),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                am.insert(self.db()).await.map_err(StorageError::Db)?;
            }
        }
        Ok(())
    }

    pub async fn touch_device_heartbeat(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let model = DeviceEntity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(false);
        };
        let mut am: device::ActiveModel = m.into();
        am.last_heartbeat = Set(Some(at.fixed_offset()));
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(true)
    }

    /// 心跳超时（或从未上报）的设备。
    pub async fn list_offline_devices(&self, threshold_minutes: i64) -> Result<Vec<DeviceRow>> {
        let cutoff = (Utc::now() - Duration::minutes(threshold_minutes)).fixed_offset();
        let rows = DeviceEntity::find()
            .filter(
                Condition::any()
                    .add(DeviceCol::LastHeartbeat.is_null())
                    .add(DeviceCol::LastHeartbeat.lt(cutoff)),
            )
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(rows.into_iter().map(device_to_row).collect())
    }

    pub async fn insert_maint_task(
        &self,
        task: &MaintTask,
        scheme_id: Option<&str>,
        alert_id: Option<&str>,
    ) -> Result<MaintTask> {
        let now = Utc::now().fixed_offset();
        let am = maint_task::ActiveModel {
            id: Set(task.id.clone()),
            name: Set(task.name.clone()),
            target_type: Set(task.target_type.to_string()),
            target_id: Set(task.target_id.clone()),
            target_name: Set(task.target_name.clone()),
            deadline: Set(task.deadline.fixed_offset()),
            state: Set(task.state.to_string()),
            scheme_id: Set(scheme_id.map(str::to_string)),
            alert_id: Set(alert_id.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = am.insert(self.db()).await.map_err(StorageError::Db)?;
        task_to_domain(model)
    }

    pub async fn set_maint_task_state(&self, id: &str, state: TaskState) -> Result<bool> {
        let model = TaskEntity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(false);
        };
        let mut am: maint_task::ActiveModel = m.into();
        am.state = Set(state.to_string());
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(true)
    }

    /// 即将到期的未完成任务（到期时间落在 [now, now + window] 内）。
    /// 到期边界由这里统一裁定，采集器只消费结果。
    pub async fn list_expiring_tasks(&self, window_minutes: i64) -> Result<Vec<MaintTask>> {
        let now = Utc::now();
        let upper = (now + Duration::minutes(window_minutes)).fixed_offset();
        let rows = TaskEntity::find()
            .filter(TaskCol::State.eq(TaskState::Open.to_string()))
            .filter(TaskCol::Deadline.gte(now.fixed_offset()))
            .filter(TaskCol::Deadline.lte(upper))
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(task_to_domain).collect()
    }

    /// 已逾期的未完成任务。
    pub async fn list_overdue_tasks(&self) -> Result<Vec<MaintTask>> {
        let now = Utc::now().fixed_offset();
        let rows = TaskEntity::find()
            .filter(TaskCol::State.eq(TaskState::Open.to_string()))
            .filter(TaskCol::Deadline.lt(now))
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(task_to_domain).collect()
    }
}
