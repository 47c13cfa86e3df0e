//! Error types for the platform and application layers.

use thiserror::Error;

/// Top-level error type for windowing and application plumbing.
///
/// Graphics-level failures carry their own error type in `prism-rhi` and
/// `prism-render`; this one covers everything around them.
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Presentation surface creation errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using the platform error type.
pub type Result<T> = std::result::Result<T, Error>;
