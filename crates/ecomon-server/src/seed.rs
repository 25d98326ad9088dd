//! JSON seed files for alert rules and notification recipients, applied by
//! the `init-rules` / `init-users` subcommands.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use ecomon_common::types::{AlertRule, RuleCondition, User};
use ecomon_storage::Store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesSeedFile {
    #[serde(default)]
    pub rules: Vec<SeedAlertRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAlertRule {
    pub name: String,
    pub rule_type: String,
    pub target_type: String,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default = "default_seed_level")]
    pub level: String,
    pub message_template: String,
    #[serde(default)]
    pub scheme_id: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub recipient_users: Vec<String>,
    #[serde(default)]
    pub recipient_depts: Vec<String>,
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
    #[serde(default = "default_quiet_minutes")]
    pub quiet_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersSeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub wechat_openid: Option<String>,
    #[serde(default = "default_seed_enabled")]
    pub enabled: bool,
}

fn default_seed_level() -> String {
    "warning".to_string()
}

fn default_seed_enabled() -> bool {
    true
}

fn default_quiet_minutes() -> i64 {
    30
}

fn to_rule(seed: &SeedAlertRule) -> Result<AlertRule> {
    let now = Utc::now();
    let mut channels = Vec::new();
    for c in &seed.channels {
        channels.push(c.parse().map_err(|e: String| anyhow::anyhow!(e))?);
    }
    Ok(AlertRule {
        id: ecomon_common::id::next_id(),
        name: seed.name.clone(),
        rule_type: seed
            .rule_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        target_type: seed
            .target_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?,
        conditions: seed.conditions.clone(),
        level: seed.level.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        message_template: seed.message_template.clone(),
        scheme_id: seed.scheme_id.clone(),
        channels,
        recipient_users: seed.recipient_users.clone(),
        recipient_depts: seed.recipient_depts.clone(),
        enabled: seed.enabled,
        quiet_minutes: seed.quiet_minutes,
        deleted: false,
        created_at: now,
        updated_at: now,
    })
}

/// Applies a rules seed file. Each rule goes through the same save-time
/// validation as any other rule; invalid or duplicate entries are skipped
/// with a warning.
pub async fn seed_rules(store: &Store, seed_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: RulesSeedFile = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    let mut applied = 0usize;
    for entry in &seed.rules {
        let rule = match to_rule(entry) {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(rule = %entry.name, error = %e, "Skipping malformed seed rule");
                continue;
            }
        };
        match store.insert_alert_rule(&rule).await {
            Ok(_) => {
                applied += 1;
                tracing::info!(rule = %rule.name, "Seeded alert rule");
            }
            Err(e) => {
                tracing::warn!(rule = %rule.name, error = %e, "Skipping seed rule (invalid or already exists)");
            }
        }
    }
    tracing::info!(applied, total = seed.rules.len(), "Rules seed finished");
    Ok(())
}

/// Applies a users seed file (upsert by id).
pub async fn seed_users(store: &Store, seed_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: UsersSeedFile = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    for entry in &seed.users {
        let user = User {
            id: entry
                .id
                .clone()
                .unwrap_or_else(ecomon_common::id::next_id),
            name: entry.name.clone(),
            department_id: entry.department_id.clone(),
            phone: entry.phone.clone(),
            email: entry.email.clone(),
            push_token: entry.push_token.clone(),
            wechat_openid: entry.wechat_openid.clone(),
            enabled: entry.enabled,
        };
        store.upsert_user(&user).await?;
        tracing::info!(user = %user.name, "Seeded user");
    }
    tracing::info!(total = seed.users.len(), "Users seed finished");
    Ok(())
}
