//! Notification fan-out with pluggable delivery channels.
//!
//! The [`dispatcher::Dispatcher`] consumes alert signals, fans each alert
//! out to (channel, recipient) pairs, owns the per-row
//! [`AlertNotifyLog`] state machine and writes the aggregated notify status
//! back onto the alert record. Built-in channels cover SMS, email (SMTP),
//! push and WeChat; each is created from JSON configuration through its
//! [`plugin::ChannelPlugin`].
//!
//! [`AlertNotifyLog`]: ecomon_common::types::AlertNotifyLog

pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod plugin;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use ecomon_common::types::NotifyChannelType;

/// A delivery capability for one channel kind.
///
/// `deliver` sends pre-rendered content to one concrete address and reports
/// plain success/failure; it makes a single attempt — retries are an
/// explicit, bounded operation on the notify log, never automatic inside
/// the call.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Delivers `content` to `target` (phone / email / push token / openid).
    ///
    /// # Errors
    ///
    /// Returns an error when the transport rejects or fails the delivery;
    /// the dispatcher records it on the notify log row.
    async fn deliver(&self, target: &str, content: &str) -> Result<()>;

    /// The channel kind this capability serves.
    fn channel_type(&self) -> NotifyChannelType;
}
