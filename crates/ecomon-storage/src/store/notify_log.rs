use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use ecomon_common::repo::AlertNotifyLogRepository;
use ecomon_common::types::{AlertNotifyLog, NotifyEpisode, NotifyStatus};

use crate::entities::alert_notify_log::{self, Column, Entity};
use crate::error::StorageError;
use crate::store::Store;

fn to_domain(m: alert_notify_log::Model) -> Result<AlertNotifyLog> {
    Ok(AlertNotifyLog {
        id: m.id,
        alert_id: m.alert_id,
        episode: m
            .episode
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "episode",
                detail: e,
            })?,
        channel_type: m
            .channel_type
            .parse()
            .map_err(|e: String| StorageError::Corrupt {
                column: "channel_type",
                detail: e,
            })?,
        user_id: m.user_id,
        user_name: m.user_name,
        target: m.target,
        content: m.content,
        status: m.status.parse().map_err(|e: String| StorageError::Corrupt {
            column: "status",
            detail: e,
        })?,
        send_time: m.send_time.map(|t| t.with_timezone(&Utc)),
        error_message: m.error_message,
        retry_count: m.retry_count,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_active(l: &AlertNotifyLog) -> alert_notify_log::ActiveModel {
    alert_notify_log::ActiveModel {
        id: Set(l.id.clone()),
        alert_id: Set(l.alert_id.clone()),
        episode: Set(l.episode.to_string()),
        channel_type: Set(l.channel_type.to_string()),
        user_id: Set(l.user_id.clone()),
        user_name: Set(l.user_name.clone()),
        target: Set(l.target.clone()),
        content: Set(l.content.clone()),
        status: Set(l.status.to_string()),
        send_time: Set(l.send_time.map(|t| t.fixed_offset())),
        error_message: Set(l.error_message.clone()),
        retry_count: Set(l.retry_count),
        created_at: Set(l.created_at.fixed_offset()),
        updated_at: Set(l.updated_at.fixed_offset()),
    }
}

impl Store {
    pub async fn insert_notify_log(&self, log: &AlertNotifyLog) -> Result<()> {
        to_active(log)
            .insert(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(())
    }

    pub async fn batch_insert_notify_logs(&self, logs: &[AlertNotifyLog]) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }
        let models: Vec<alert_notify_log::ActiveModel> = logs.iter().map(to_active).collect();
        Entity::insert_many(models)
            .exec(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(())
    }

    pub async fn update_notify_log(&self, log: &AlertNotifyLog) -> Result<()> {
        to_active(log)
            .update(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(())
    }

    pub async fn get_notify_log_by_id(&self, id: &str) -> Result<Option<AlertNotifyLog>> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        model.map(to_domain).transpose()
    }

    pub async fn list_notify_logs_by_alert(
        &self,
        alert_id: &str,
        episode: Option<NotifyEpisode>,
    ) -> Result<Vec<AlertNotifyLog>> {
        let mut q = Entity::find().filter(Column::AlertId.eq(alert_id));
        if let Some(ep) = episode {
            q = q.filter(Column::Episode.eq(ep.to_string()));
        }
        let rows = q
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn count_notify_logs_by_status(
        &self,
        alert_id: &str,
        episode: NotifyEpisode,
        status: NotifyStatus,
    ) -> Result<u64> {
        Ok(Entity::find()
            .filter(Column::AlertId.eq(alert_id))
            .filter(Column::Episode.eq(episode.to_string()))
            .filter(Column::Status.eq(status.to_string()))
            .count(self.db())
            .await
            .map_err(StorageError::Db)?)
    }
}

#[async_trait]
impl AlertNotifyLogRepository for Store {
    async fn insert(&self, log: &AlertNotifyLog) -> Result<()> {
        self.insert_notify_log(log).await
    }

    async fn batch_insert(&self, logs: &[AlertNotifyLog]) -> Result<()> {
        self.batch_insert_notify_logs(logs).await
    }

    async fn update(&self, log: &AlertNotifyLog) -> Result<()> {
        self.update_notify_log(log).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertNotifyLog>> {
        self.get_notify_log_by_id(id).await
    }

    async fn find_by_alert(
        &self,
        alert_id: &str,
        episode: Option<NotifyEpisode>,
    ) -> Result<Vec<AlertNotifyLog>> {
        self.list_notify_logs_by_alert(alert_id, episode).await
    }

    async fn count_success(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64> {
        self.count_notify_logs_by_status(alert_id, episode, NotifyStatus::Success)
            .await
    }

    async fn count_failed(&self, alert_id: &str, episode: NotifyEpisode) -> Result<u64> {
        self.count_notify_logs_by_status(alert_id, episode, NotifyStatus::Failed)
            .await
    }
}
