//! Error types shared across the crate.

use thiserror::Error;

/// Crate-level error.
///
/// Quota exhaustion and transient upstream failures are *not* represented
/// here when they happen during a lookup: the fetch controller recovers them
/// into a "no result" outcome.  Only configuration and local I/O problems
/// reach the caller as an `Err`.
#[derive(Debug, Error)]
pub enum Error {
    /// No API keys were configured at all.
    #[error("no YouTube API keys configured (set YOUTUBE_API_KEYS or api_keys in the config file)")]
    NoCredentials,

    #[error("invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Failure of a single call against the video platform.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The current API key has used up its call budget.
    #[error("quota exceeded (HTTP {status})")]
    Quota { status: u16 },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cannot decode response: {0}")]
    Decode(#[from] std::io::Error),
}

impl UpstreamError {
    /// Whether this failure should rotate to the next API key.
    pub fn is_quota(&self) -> bool {
        matches!(self, UpstreamError::Quota { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
