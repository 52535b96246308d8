//! Error types for LuckyDraw

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum LdError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Prize table is empty")]
    EmptyPrizeTable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for LdError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yml::Error> for LdError {
    fn from(e: serde_yml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias
pub type LdResult<T> = Result<T, LdError>;
