use ecomon_common::types::{NotifyChannelType, StateError};

/// Errors that can occur within the notification subsystem.
///
/// The `DeliveryChannel` trait and plugin implementations return
/// `anyhow::Result` at the boundary; the dispatcher surfaces the typed
/// variants below for callers that need to distinguish rejected operations
/// (retry guard) from transport failures.
///
/// # Examples
///
/// ```rust
/// use ecomon_notify::error::NotifyError;
///
/// let err = NotifyError::InvalidConfig("missing smtp_host".to_string());
/// assert!(err.to_string().contains("smtp_host"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel configuration is missing a required field or contains an
    /// invalid value.
    #[error("Notify: invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// The channel type is not registered in the plugin registry.
    #[error("Notify: unknown channel type '{0}'")]
    UnknownChannelType(String),

    /// No delivery capability is wired for this channel kind.
    #[error("Notify: no channel configured for '{0}'")]
    ChannelUnavailable(NotifyChannelType),

    /// The retry guard on the notify log rejected the operation.
    #[error("Notify: {0}")]
    RetryRejected(#[from] StateError),

    /// The referenced notify log row does not exist.
    #[error("Notify: notify log not found (id={0})")]
    LogNotFound(String),

    /// An HTTP request to an external notification endpoint failed.
    #[error("Notify: HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed (e.g. config parsing).
    #[error("Notify: JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The external API returned a non-success response.
    #[error("Notify: API error from {service}: status={status}, body={body}")]
    ApiError {
        service: String,
        status: u16,
        body: String,
    },

    /// Generic notification error for cases not covered by other variants.
    #[error("Notify: {0}")]
    Other(String),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
