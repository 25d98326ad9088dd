use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, QueryFilter,
};

use ecomon_common::repo::RecipientResolver;
use ecomon_common::types::{AlertRule, User};

use crate::entities::user::{self, Column, Entity};
use crate::error::StorageError;
use crate::store::Store;

fn to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        name: m.name,
        department_id: m.department_id,
        phone: m.phone,
        email: m.email,
        push_token: m.push_token,
        wechat_openid: m.wechat_openid,
        enabled: m.enabled,
    }
}

impl Store {
    pub async fn upsert_user(&self, u: &User) -> Result<User> {
        let now = Utc::now().fixed_offset();
        let existing = Entity::find_by_id(&u.id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        let am = user::ActiveModel {
            id: Set(u.id.clone()),
            name: Set(u.name.clone()),
            department_id: Set(u.department_id.clone()),
            phone: Set(u.phone.clone()),
            email: Set(u.email.clone()),
            push_token: Set(u.push_token.clone()),
            wechat_openid: Set(u.wechat_openid.clone()),
            enabled: Set(u.enabled),
            created_at: Set(existing
                .as_ref()
                .map(|m| m.created_at)
                .unwrap_or(now)),
            updated_at: Set(now),
        };
        let model = if existing.is_some() {
            am.update(self.db()).await.map_err(StorageError::Db)?
        } else {
            am.insert(self.db()).await.map_err(StorageError::Db)?
        };
        Ok(to_domain(model))
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(model.map(to_domain))
    }

    /// 按 用户 ID 集合 ∪ 部门 ID 集合 查询启用的接收人。
    pub async fn list_recipients(
        &self,
        user_ids: &[String],
        dept_ids: &[String],
    ) -> Result<Vec<User>> {
        if user_ids.is_empty() && dept_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut cond = Condition::any();
        if !user_ids.is_empty() {
            cond = cond.add(Column::Id.is_in(user_ids.to_vec()));
        }
        if !dept_ids.is_empty() {
            cond = cond.add(Column::DepartmentId.is_in(dept_ids.to_vec()));
        }
        let rows = Entity::find()
            .filter(cond)
            .filter(Column::Enabled.eq(true))
            .all(self.db())
            .await
            .map_err(StorageError::Db)?;
        Ok(rows.into_iter().map(to_domain).collect())
    }
}

#[async_trait]
impl RecipientResolver for Store {
    async fn alert_recipients(&self, rule: &AlertRule) -> Result<Vec<User>> {
        self.list_recipients(&rule.recipient_users, &rule.recipient_depts)
            .await
    }
}
