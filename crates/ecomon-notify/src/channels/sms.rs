use crate::plugin::ChannelPlugin;
use crate::DeliveryChannel;
use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::NotifyChannelType;
use serde::Deserialize;
use serde_json::Value;

pub struct SmsChannel {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
}

impl SmsChannel {
    pub fn new(gateway_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: gateway_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for SmsChannel {
    async fn deliver(&self, target: &str, content: &str) -> Result<()> {
        let payload = serde_json::json!({
            "to": target,
            "message": content,
        });

        let resp = self
            .client
            .post(&self.gateway_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("SMS gateway returned HTTP {status}");
        }
        Ok(())
    }

    fn channel_type(&self) -> NotifyChannelType {
        NotifyChannelType::Sms
    }
}

// Plugin

#[derive(Deserialize)]
struct SmsConfig {
    gateway_url: String,
    api_key: String,
}

pub struct SmsPlugin;

impl ChannelPlugin for SmsPlugin {
    fn name(&self) -> &str {
        "sms"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        serde_json::from_value::<SmsConfig>(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid sms config: {e}"))?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn DeliveryChannel>> {
        let cfg: SmsConfig = serde_json::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid sms config: {e}"))?;
        Ok(Box::new(SmsChannel::new(&cfg.gateway_url, &cfg.api_key)))
    }

    fn redact_config(&self, config: &Value) -> Value {
        let mut redacted = config.clone();
        if let Some(obj) = redacted.as_object_mut() {
            if obj.contains_key("api_key") {
                obj.insert("api_key".to_string(), Value::String("***".to_string()));
            }
        }
        redacted
    }
}
