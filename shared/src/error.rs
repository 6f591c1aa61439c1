use thiserror::Error;

use crate::model::PointId;

/// Failure signal of a backend call. Carries no partial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected request with status {status}: {message}")]
    Server { status: u16, message: String },

    #[error("point not found: {0}")]
    NotFound(PointId),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Server { .. } => "SERVER_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether a fresh user-initiated attempt could succeed. The core itself never retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Storage(_) => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::NotFound(_) | Self::Serialization(_) => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Serialization(e.to_string())
    }
}

#[cfg(all(feature = "sqlite", not(target_arch = "wasm32")))]
impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Storage(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a destination must be selected")]
    MissingDestination,

    #[error("end date {to} is before start date {from}")]
    InvertedDates { from: u64, to: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
