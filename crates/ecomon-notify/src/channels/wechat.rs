use crate::plugin::ChannelPlugin;
use crate::DeliveryChannel;
use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::NotifyChannelType;
use serde::Deserialize;
use serde_json::Value;

pub struct WechatChannel {
    client: reqwest::Client,
    api_url: String,
    agent_id: i64,
}

impl WechatChannel {
    pub fn new(api_url: &str, agent_id: i64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            agent_id,
        }
    }
}

#[async_trait]
impl DeliveryChannel for WechatChannel {
    async fn deliver(&self, target: &str, content: &str) -> Result<()> {
        let payload = serde_json::json!({
            "touser": target,
            "msgtype": "text",
            "agentid": self.agent_id,
            "text": {
                "content": content,
            }
        });

        let resp = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("WeChat API returned HTTP {status}");
        }

        // WeChat reports failures in the body with HTTP 200
        let body: Value = resp.json().await?;
        let errcode = body.get("errcode").and_then(|v| v.as_i64());
        if errcode != Some(0) {
            let errmsg = body
                .get("errmsg")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            anyhow::bail!("WeChat error: {errmsg}");
        }
        Ok(())
    }

    fn channel_type(&self) -> NotifyChannelType {
        NotifyChannelType::Wechat
    }
}

// Plugin

#[derive(Deserialize)]
struct WechatConfig {
    api_url: String,
    agent_id: i64,
}

pub struct WechatPlugin;

impl ChannelPlugin for WechatPlugin {
    fn name(&self) -> &str {
        "wechat"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        serde_json::from_value::<WechatConfig>(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid wechat config: {e}"))?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn DeliveryChannel>> {
        let cfg: WechatConfig = serde_json::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid wechat config: {e}"))?;
        Ok(Box::new(WechatChannel::new(&cfg.api_url, cfg.agent_id)))
    }
}
