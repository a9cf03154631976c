//! Error types for the letter pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can escape the letter pipeline.
///
/// Capability failures are absorbed into [`crate::Degradation`] values; only
/// caller-driven cancellation and bulk-ingestion I/O surface here.
#[derive(Error, Debug)]
pub enum RagError {
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// Provider or store error.
    #[error("provider error: {0}")]
    Provider(#[from] inkwell_providers::ProviderError),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
