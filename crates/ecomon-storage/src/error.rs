/// Errors that can occur within the storage layer.
///
/// The `Store` methods return `anyhow::Result` at the boundary; typed
/// variants below are attached as the error source so callers that care can
/// downcast (the rule-save validation path relies on this).
///
/// # Examples
///
/// ```rust
/// use ecomon_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "alert_rule",
///     id: "rule-99".to_string(),
/// };
/// assert!(err.to_string().contains("alert_rule"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required record was not found in the database.
    #[error("Storage: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// A rule failed save-time validation (missing or malformed conditions).
    #[error("Storage: invalid rule configuration: {0}")]
    InvalidRule(String),

    /// A stored column held a value the domain type does not accept.
    #[error("Storage: corrupt value in column '{column}': {detail}")]
    Corrupt {
        column: &'static str,
        detail: String,
    },

    /// An underlying database error.
    #[error("Storage: database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// JSON serialization or deserialization failure (e.g. conditions_json).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
