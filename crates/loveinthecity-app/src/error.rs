//! Error types for the application layer.

use thiserror::Error;

/// Errors surfaced while constructing the application context.
#[derive(Debug, Error)]
pub enum AppError {
    /// The storage database could not be opened.
    #[error(transparent)]
    Store(#[from] loveinthecity_store::StoreError),
}
