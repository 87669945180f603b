//! Error type for the NACHAM validation workspace.
//!
//! Problems found *inside* a payment file are never errors: the validator
//! reports them as diagnostics. [`NachamError`] only covers the seams around
//! it: reading and decoding the source, loading configuration, command-line
//! usage and the background worker.

use thiserror::Error;

/// Workspace-wide error.
#[derive(Debug, Error)]
pub enum NachamError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The source bytes are not valid UTF-8.
    #[error("source is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    /// A profile or options document could not be parsed.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Bad command-line usage.
    #[error("usage: {0}")]
    Usage(String),

    /// The background validation worker hung up before answering.
    #[error("validation worker is no longer running")]
    WorkerGone,

    /// The worker skipped a request because a newer one was submitted.
    #[error("validation request {token} was superseded by a newer one")]
    Superseded { token: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl NachamError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Process exit code for this error when surfaced by a binary.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Config { .. } => 2,
            Self::Io(_) | Self::InvalidUtf8 { .. } => 3,
            Self::WorkerGone | Self::Superseded { .. } | Self::Internal(_) => 4,
        }
    }
}

impl From<std::str::Utf8Error> for NachamError {
    fn from(value: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: value.valid_up_to(),
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, NachamError>;
