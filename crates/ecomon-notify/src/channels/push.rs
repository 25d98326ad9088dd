use crate::plugin::ChannelPlugin;
use crate::DeliveryChannel;
use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::NotifyChannelType;
use serde::Deserialize;
use serde_json::Value;

pub struct PushChannel {
    client: reqwest::Client,
    api_url: String,
    app_key: String,
    title: String,
}

impl PushChannel {
    pub fn new(api_url: &str, app_key: &str, title: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            app_key: app_key.to_string(),
            title: title.to_string(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for PushChannel {
    async fn deliver(&self, target: &str, content: &str) -> Result<()> {
        let payload = serde_json::json!({
            "token": target,
            "title": self.title,
            "body": content,
        });

        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.app_key))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Push provider returned HTTP {status}");
        }
        Ok(())
    }

    fn channel_type(&self) -> NotifyChannelType {
        NotifyChannelType::Push
    }
}

// Plugin

#[derive(Deserialize)]
struct PushConfig {
    api_url: String,
    app_key: String,
    #[serde(default = "default_title")]
    title: String,
}

fn default_title() -> String {
    "告警通知".to_string()
}

pub struct PushPlugin;

impl ChannelPlugin for PushPlugin {
    fn name(&self) -> &str {
        "push"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        serde_json::from_value::<PushConfig>(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid push config: {e}"))?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn DeliveryChannel>> {
        let cfg: PushConfig = serde_json::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid push config: {e}"))?;
        Ok(Box::new(PushChannel::new(
            &cfg.api_url,
            &cfg.app_key,
            &cfg.title,
        )))
    }

    fn redact_config(&self, config: &Value) -> Value {
        let mut redacted = config.clone();
        if let Some(obj) = redacted.as_object_mut() {
            if obj.contains_key("app_key") {
                obj.insert("app_key".to_string(), Value::String("***".to_string()));
            }
        }
        redacted
    }
}
