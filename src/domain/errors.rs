//! Error types for catalog gateway operations
//!
//! Every call that crosses the gateway boundary returns a typed
//! [`FetchError`]. The browsing layer records these instead of
//! propagating them to the presentation layer, which decides whether
//! to offer a retry affordance.

use thiserror::Error;

use crate::domain::entities::EntityKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Gateway responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode gateway response: {message}")]
    Decode { message: String },

    #[error("Rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Filter group '{group}' is not supported for {kind}")]
    UnsupportedFilter { kind: EntityKind, group: String },

    #[error("Invalid gateway request: {message}")]
    InvalidRequest { message: String },
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether re-issuing the same request could plausibly succeed.
    ///
    /// Nothing in this crate retries automatically; the flag is surfaced so a
    /// front end can decide between a "try again" affordance and a plain
    /// empty state.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } | Self::UnsupportedFilter { .. } | Self::InvalidRequest { .. } => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::decode(err.to_string());
        }
        match err.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                body: String::new(),
            },
            None => Self::transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}
