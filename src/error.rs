//! Error taxonomy for the monitor.
//!
//! Only [`ConfigError`] is fatal (startup). The other three are recoverable
//! and are logged by the loop without stopping it.

use thiserror::Error;

/// Startup configuration problems. Aborts the process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Feed retrieval failures. The cycle is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("feed returned HTTP {status}")]
    Status { status: u16 },

    #[error("feed body is not a post array: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Model call or reply validation failures. The loop falls back to a
/// conservative default.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("unparseable model reply: {0}")]
    Parse(String),

    #[error("daily model call limit of {limit} reached")]
    DailyLimit { limit: u32 },
}

/// Email delivery failures. Logged and skipped, never retried.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("could not build email: {0}")]
    Build(String),

    #[error("SMTP authentication failed: {0}")]
    Auth(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}
