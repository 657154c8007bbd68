//! Unified error system for fleet capability crates
//!
//! Business conditions (unknown codes, expired overrides, missing plans) are
//! never errors on the read path. What reaches this type is either an
//! administrative rejection or an infrastructure failure.

use serde::{Deserialize, Serialize};

use crate::effects::{StorageError, TimeError};

/// Unified error type for all fleet capability operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FleetError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Clock unavailable
    #[error("Time error: {message}")]
    Time {
        /// Error message describing the clock failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl FleetError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a time error
    pub fn time(message: impl Into<String>) -> Self {
        Self::Time {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for fleet operations
pub type FleetResult<T> = std::result::Result<T, FleetError>;

impl From<StorageError> for FleetError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => Self::invalid(err.to_string()),
            StorageError::Unavailable => Self::storage(err.to_string()),
        }
    }
}

impl From<TimeError> for FleetError {
    fn from(err: TimeError) -> Self {
        Self::time(err.to_string())
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for FleetError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
