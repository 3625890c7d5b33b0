//! Error types for the loveinthecity-store crate.
//!
//! All backend operations return [`StoreError`] via [`StoreResult`].
//! Uses `thiserror` for ergonomic, zero-cost error definitions.
//!
//! Note that [`StorageManager`](crate::StorageManager) never lets these
//! escape its public surface: every manager operation maps failure to a
//! `bool`/`Option` return and logs the underlying cause.

use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the storage engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is not present or not usable in this environment.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// SQLite operation failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored payload failed to parse and was treated as absent.
    #[error("corrupt entry under key {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
