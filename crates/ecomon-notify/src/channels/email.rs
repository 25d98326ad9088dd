use crate::plugin::ChannelPlugin;
use crate::DeliveryChannel;
use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::NotifyChannelType;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::Value;

pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    subject: String,
}

impl EmailChannel {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        username: Option<&str>,
        password: Option<&str>,
        from: &str,
        subject: &str,
    ) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?.port(smtp_port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        let transport = builder.build();
        Ok(Self {
            transport,
            from: from.to_string(),
            subject: subject.to_string(),
        })
    }
}

#[async_trait]
impl DeliveryChannel for EmailChannel {
    async fn deliver(&self, target: &str, content: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(target.parse()?)
            .subject(&self.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.to_string())?;

        self.transport.send(email).await?;
        Ok(())
    }

    fn channel_type(&self) -> NotifyChannelType {
        NotifyChannelType::Email
    }
}

// Plugin

#[derive(Deserialize)]
struct EmailConfig {
    smtp_host: String,
    smtp_port: u16,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    from: String,
    #[serde(default = "default_subject")]
    subject: String,
}

fn default_subject() -> String {
    "[ecomon] 告警通知".to_string()
}

pub struct EmailPlugin;

impl ChannelPlugin for EmailPlugin {
    fn name(&self) -> &str {
        "email"
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        serde_json::from_value::<EmailConfig>(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid email config: {e}"))?;
        Ok(())
    }

    fn create_channel(&self, config: &Value) -> Result<Box<dyn DeliveryChannel>> {
        let cfg: EmailConfig = serde_json::from_value(config.clone())
            .map_err(|e| anyhow::anyhow!("Invalid email config: {e}"))?;
        let channel = EmailChannel::new(
            &cfg.smtp_host,
            cfg.smtp_port,
            cfg.smtp_username.as_deref(),
            cfg.smtp_password.as_deref(),
            &cfg.from,
            &cfg.subject,
        )?;
        Ok(Box::new(channel))
    }

    fn redact_config(&self, config: &Value) -> Value {
        let mut redacted = config.clone();
        if let Some(obj) = redacted.as_object_mut() {
            if obj.contains_key("smtp_password") {
                obj.insert(
                    "smtp_password".to_string(),
                    Value::String("***".to_string()),
                );
            }
        }
        redacted
    }
}
