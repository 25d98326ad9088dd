use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionError, TransactionTrait,
};

use ecomon_common::repo::AlertRecordRepository;
use ecomon_common::types::{AlertRecord, TargetType};

use crate::entities::alert_record::{self, Column, Entity};
use crate::error::StorageError;
use crate::store::Store;

/// 告警记录列表过滤器
#[derive(Debug, Clone, Default)]
pub struct AlertRecordFilter {
    pub status_eq: Option<String>,
    pub level_eq: Option<String>,
    pub target_type_eq: Option<String>,
    pub rule_id_eq: Option<String>,
}

const ACTIVE_STATUSES: [&str; 2] = ["pending", "in_progress"];

fn to_domain(m: alert_record::Model) -> Result<AlertRecord> {
    Ok(AlertRecord {
        id: m.id,
        alert_code: m.alert_code,
        rule_id: m.rule_id,
        rule_name: m.rule_name,
        rule_type: m
            .rule_type
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "rule_type",
                detail: e,
            })?,
        target_type: m
            .target_type
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "target_type",
                detail: e,
            })?,
        target_id: m.target_id,
        target_name: m.target_name,
        level: m.level.parse().map_err(|e: String| StorageError::Corrupt {
            column: "level",
            detail: e,
        })?,
        message: m.message,
        payload_json: m.payload_json,
        task_instance_id: m.task_instance_id,
        task_created: m.task_created,
        status: m.status.parse().map_err(|e: String| StorageError::Corrupt {
            column: "status",
            detail: e,
        })?,
        notify_status: m
            .notify_status
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "notify_status",
                detail: e,
            })?,
        notify_time: m.notify_time.map(|t| t.with_timezone(&Utc)),
        recover_time: m.recover_time.map(|t| t.with_timezone(&Utc)),
        duration_minutes: m.duration_minutes,
        remark: m.remark,
        deleted: m.deleted,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_active(r: &AlertRecord) -> alert_record::ActiveModel {
    alert_record::ActiveModel {
        id: Set(r.id.clone()),
        alert_code: Set(r.alert_code.clone()),
        rule_id: Set(r.rule_id.clone()),
        rule_name: Set(r.rule_name.clone()),
        rule_type: Set(r.rule_type.to_string()),
        target_type: Set(r.target_type.to_string()),
        target_id: Set(r.target_id.clone()),
        target_name: Set(r.target_name.clone()),
        level: Set(r.level.to_string()),
        message: Set(r.message.clone()),
        payload_json: Set(r.payload_json.clone()),
        task_instance_id: Set(r.task_instance_id.clone()),
        task_created: Set(r.task_created),
        status: Set(r.status.to_string()),
        notify_status: Set(r.notify_status.to_string()),
        notify_time: Set(r.notify_time.map(|t| t.fixed_offset())),
        recover_time: Set(r.recover_time.map(|t| t.fixed_offset())),
        duration_minutes: Set(r.duration_minutes),
        remark: Set(r.remark.clone()),
        deleted: Set(r.deleted),
        created_at: Set(r.created_at.fixed_offset()),
        updated_at: Set(r.updated_at.fixed_offset()),
    }
}

impl Store {
    /// 静默期检查 + 插入，单事务内完成。
    ///
    /// 同一 (规则, 对象) 存在未关闭告警、或最近一条告警距今不足
    /// `quiet_minutes` 分钟时抑制插入，返回 `None`。并发 sweep 下的
    /// 原子性由该事务保证，而非进程内互斥。
    pub async fn insert_alert_if_quiet(
        &self,
        record: &AlertRecord,
        quiet_minutes: i64,
    ) -> Result<Option<AlertRecord>> {
        let am = to_active(record);
        let rule_id = record.rule_id.clone();
        let target_type = record.target_type.to_string();
        let target_id = record.target_id.clone();

        let inserted = self
            .db()
            .transaction::<_, Option<alert_record::Model>, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let open = Entity::find()
                        .filter(Column::RuleId.eq(rule_id.clone()))
                        .filter(Column::TargetType.eq(target_type.clone()))
                        .filter(Column::TargetId.eq(target_id.clone()))
                        .filter(Column::Status.is_in(ACTIVE_STATUSES))
                        .filter(Column::Deleted.eq(false))
                        .count(txn)
                        .await?;
                    if open > 0 {
                        return Ok(None);
                    }

                    if quiet_minutes > 0 {
                        let latest = Entity::find()
                            .filter(Column::RuleId.eq(rule_id))
                            .filter(Column::TargetType.eq(target_type))
                            .filter(Column::TargetId.eq(target_id))
                            .filter(Column::Deleted.eq(false))
                            .order_by(Column::CreatedAt, Order::Desc)
                            .one(txn)
                            .await?;
                        if let Some(latest) = latest {
                            let quiet_until = latest.created_at.with_timezone(&Utc)
                                + Duration::minutes(quiet_minutes);
                            if Utc::now() < quiet_until {
                                return Ok(None);
                            }
                        }
                    }

                    let model = am.insert(txn).await?;
                    Ok(Some(model))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(e) | TransactionError::Transaction(e) => {
                    StorageError::Db(e)
                }
            })?;

        inserted.map(to_domain).transpose()
    }

    pub async fn update_alert_record(&self, record: &AlertRecord) -> Result<()> {
        let exists = Entity::find_by_id(&record.id)
            .count(self.db())
            .await
            .map_err(StorageError::Db)?;
        if exists == 0 {
            return Err(StorageError::NotFound {
                entity: "alert_record",
                id: record.id.clone(),
            }
            .into());
        }
        to_active(record)
            .update(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(())
    }

    pub async fn get_alert_record_by_id(&self, id: &str) -> Result<Option<AlertRecord>> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        model.map(to_domain).transpose()
    }

    /// 所有未关闭（PENDING / IN_PROGRESS）的告警。
    pub async fn list_active_alert_records(&self) -> Result<Vec<AlertRecord>> {
        let rows = Entity::find()
            .filter(Column::Status.is_in(ACTIVE_STATUSES))
            .filter(Column::Deleted.eq(false))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn list_alert_records_by_rule_target(
        &self,
        rule_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<Vec<AlertRecord>> {
        let rows = Entity::find()
            .filter(Column::RuleId.eq(rule_id))
            .filter(Column::TargetType.eq(target_type.to_string()))
            .filter(Column::TargetId.eq(target_id))
            .filter(Column::Deleted.eq(false))
            .order_by(Column::CreatedAt, Order::Desc)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn list_alert_records(
        &self,
        filter: &AlertRecordFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRecord>> {
        let rows = filtered_query(filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn count_alert_records(&self, filter: &AlertRecordFilter) -> Result<u64> {
        Ok(filtered_query(filter)
            .count(self.db())
            .await
            .map_err(StorageError::Db)?)
    }

    /// 开始处理（PENDING → IN_PROGRESS）。非法流转返回 `StateError`。
    pub async fn start_process_alert(&self, id: &str) -> Result<AlertRecord> {
        let mut record = self.require_alert_record(id).await?;
        record.start_process()?;
        self.update_alert_record(&record).await?;
        Ok(record)
    }

    /// 处理完成（→ RESOLVED），关闭时一次性计算持续时长。
    pub async fn resolve_alert(&self, id: &str, remark: &str) -> Result<AlertRecord> {
        let mut record = self.require_alert_record(id).await?;
        record.resolve(remark)?;
        self.update_alert_record(&record).await?;
        Ok(record)
    }

    /// 忽略（→ IGNORED）。
    pub async fn ignore_alert(&self, id: &str, remark: &str) -> Result<AlertRecord> {
        let mut record = self.require_alert_record(id).await?;
        record.ignore(remark)?;
        self.update_alert_record(&record).await?;
        Ok(record)
    }

    async fn require_alert_record(&self, id: &str) -> Result<AlertRecord> {
        self.get_alert_record_by_id(id).await?.ok_or_else(|| {
            StorageError::NotFound {
                entity: "alert_record",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// 软删除：历史告警永不物理删除。
    pub async fn delete_alert_record(&self, id: &str) -> Result<bool> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(false);
        };
        let mut am: alert_record::ActiveModel = m.into();
        am.deleted = Set(true);
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(true)
    }
}

fn filtered_query(filter: &AlertRecordFilter) -> sea_orm::Select<Entity> {
    let mut q = Entity::find().filter(Column::Deleted.eq(false));
    if let Some(ref s) = filter.status_eq {
        q = q.filter(Column::Status.eq(s.clone()));
    }
    if let Some(ref l) = filter.level_eq {
        q = q.filter(Column::Level.eq(l.clone()));
    }
    if let Some(ref tt) = filter.target_type_eq {
        q = q.filter(Column::TargetType.eq(tt.clone()));
    }
    if let Some(ref r) = filter.rule_id_eq {
        q = q.filter(Column::RuleId.eq(r.clone()));
    }
    q
}

#[async_trait]
impl AlertRecordRepository for Store {
    async fn insert_if_quiet(
        &self,
        record: &AlertRecord,
        quiet_minutes: i64,
    ) -> Result<Option<AlertRecord>> {
        self.insert_alert_if_quiet(record, quiet_minutes).await
    }

    async fn update(&self, record: &AlertRecord) -> Result<()> {
        self.update_alert_record(record).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRecord>> {
        self.get_alert_record_by_id(id).await
    }

    async fn find_active(&self) -> Result<Vec<AlertRecord>> {
        self.list_active_alert_records().await
    }

    async fn find_by_rule_target(
        &self,
        rule_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<Vec<AlertRecord>> {
        self.list_alert_records_by_rule_target(rule_id, target_type, target_id)
            .await
    }
}
