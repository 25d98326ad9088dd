use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use ecomon_common::repo::RuleRepository;
use ecomon_common::types::{AlertRule, RuleCondition};

use crate::entities::alert_rule::{self, Column, Entity};
use crate::error::StorageError;
use crate::store::Store;

/// 告警规则列表过滤器
#[derive(Debug, Clone, Default)]
pub struct AlertRuleFilter {
    pub rule_type_eq: Option<String>,
    pub target_type_eq: Option<String>,
    pub enabled_eq: Option<bool>,
}

fn to_domain(m: alert_rule::Model) -> Result<AlertRule> {
    let conditions: Vec<RuleCondition> =
        serde_json::from_str(&m.conditions_json).map_err(StorageError::Json)?;
    Ok(AlertRule {
        id: m.id,
        name: m.name,
        rule_type: m.rule_type.parse().map_err(|e: String| StorageError::Corrupt {
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
        conditions,
        level: m.level.parse().map_err(|e: String| StorageError::Corrupt {
            column: "level",
            detail: e,
        })?,
        message_template: m.message_template,
        scheme_id: m.scheme_id,
        channels: serde_json::from_str(&m.channels_json).map_err(StorageError::Json)?,
        recipient_users: serde_json::from_str(&m.recipient_users_json)
            .map_err(StorageError::Json)?,
        recipient_depts: serde_json::from_str(&m.recipient_depts_json)
            .map_err(StorageError::Json)?,
        enabled: m.enabled,
        quiet_minutes: m.quiet_minutes,
        deleted: m.deleted,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_active(rule: &AlertRule) -> Result<alert_rule::ActiveModel> {
    Ok(alert_rule::ActiveModel {
        id: Set(rule.id.clone()),
        name: Set(rule.name.clone()),
        rule_type: Set(rule.rule_type.to_string()),
        target_type: Set(rule.target_type.to_string()),
        conditions_json: Set(serde_json::to_string(&rule.conditions).map_err(StorageError::Json)?),
        level: Set(rule.level.to_string()),
        message_template: Set(rule.message_template.clone()),
        scheme_id: Set(rule.scheme_id.clone()),
        channels_json: Set(serde_json::to_string(&rule.channels).map_err(StorageError::Json)?),
        recipient_users_json: Set(
            serde_json::to_string(&rule.recipient_users).map_err(StorageError::Json)?
        ),
        recipient_depts_json: Set(
            serde_json::to_string(&rule.recipient_depts).map_err(StorageError::Json)?
        ),
        enabled: Set(rule.enabled),
        quiet_minutes: Set(rule.quiet_minutes),
        deleted: Set(rule.deleted),
        created_at: Set(rule.created_at.fixed_offset()),
        updated_at: Set(rule.updated_at.fixed_offset()),
    })
}

/// Save-time validation: malformed conditions are rejected here, never
/// silently skipped at evaluation time.
fn validate_rule(rule: &AlertRule) -> Result<()> {
    if !rule.validate_condition_configs() {
        return Err(StorageError::InvalidRule(format!(
            "rule '{}' of type {} requires at least one valid condition",
            rule.name, rule.rule_type
        ))
        .into());
    }
    if let Some(bad) = rule.conditions.iter().find(|c| !c.is_valid()) {
        return Err(StorageError::InvalidRule(format!(
            "rule '{}' has a malformed condition on metric '{}'",
            rule.name, bad.metric
        ))
        .into());
    }
    Ok(())
}

impl Store {
    pub async fn insert_alert_rule(&self, rule: &AlertRule) -> Result<AlertRule> {
        validate_rule(rule)?;
        let now = Utc::now().fixed_offset();
        let mut am = to_active(rule)?;
        am.created_at = Set(now);
        am.updated_at = Set(now);
        let model = am.insert(self.db()).await.map_err(StorageError::Db)?;
        to_domain(model)
    }

    pub async fn update_alert_rule(&self, id: &str, rule: &AlertRule) -> Result<Option<AlertRule>> {
        validate_rule(rule)?;
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(None);
        };
        let created_at = m.created_at;
        let mut am = to_active(rule)?;
        am.id = Set(m.id);
        am.created_at = Set(created_at);
        am.updated_at = Set(Utc::now().fixed_offset());
        let updated = am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(Some(to_domain(updated)?))
    }

    pub async fn set_alert_rule_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(None);
        };
        let mut am: alert_rule::ActiveModel = m.into();
        am.enabled = Set(enabled);
        am.updated_at = Set(Utc::now().fixed_offset());
        let updated = am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(Some(to_domain(updated)?))
    }

    /// 软删除：规则不再参与评估，但历史告警仍可回溯其快照。
    pub async fn delete_alert_rule(&self, id: &str) -> Result<bool> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let Some(m) = model else {
            return Ok(false);
        };
        let mut am: alert_rule::ActiveModel = m.into();
        am.deleted = Set(true);
        am.enabled = Set(false);
        am.updated_at = Set(Utc::now().fixed_offset());
        am.update(self.db()).await.map_err(StorageError::Db)?;
        Ok(true)
    }

    pub async fn get_alert_rule_by_id(&self, id: &str) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id)
            .filter(Column::Deleted.eq(false))
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        model.map(to_domain).transpose()
    }

    pub async fn list_alert_rules(
        &self,
        filter: &AlertRuleFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<AlertRule>> {
        let mut q = Entity::find().filter(Column::Deleted.eq(false));
        if let Some(ref rt) = filter.rule_type_eq {
            q = q.filter(Column::RuleType.eq(rt.clone()));
        }
        if let Some(ref tt) = filter.target_type_eq {
            q = q.filter(Column::TargetType.eq(tt.clone()));
        }
        if let Some(en) = filter.enabled_eq {
            q = q.filter(Column::Enabled.eq(en));
        }
        let rows = q
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }

    pub async fn count_alert_rules(&self, filter: &AlertRuleFilter) -> Result<u64> {
        let mut q = Entity::find().filter(Column::Deleted.eq(false));
        if let Some(ref rt) = filter.rule_type_eq {
            q = q.filter(Column::RuleType.eq(rt.clone()));
        }
        if let Some(ref tt) = filter.target_type_eq {
            q = q.filter(Column::TargetType.eq(tt.clone()));
        }
        if let Some(en) = filter.enabled_eq {
            q = q.filter(Column::Enabled.eq(en));
        }
        Ok(q.count(self.db()).await.map_err(StorageError::Db)?)
    }

    pub async fn list_enabled_alert_rules(&self) -> Result<Vec<AlertRule>> {
        let rows = Entity::find()
            .filter(Column::Enabled.eq(true))
            .filter(Column::Deleted.eq(false))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        rows.into_iter().map(to_domain).collect()
    }
}

#[async_trait]
impl RuleRepository for Store {
    async fn find_all_enabled(&self) -> Result<Vec<AlertRule>> {
        self.list_enabled_alert_rules().await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AlertRule>> {
        self.get_alert_rule_by_id(id).await
    }
}
