//! Error handling for shardmeta
//!
//! This module provides the crate-level error type and result alias. Shard
//! operations themselves report the narrower [`ShardError`].

use std::io;
use thiserror::Error;

use crate::shard::ShardError;

/// Errors that can occur outside of individual shard operations
#[derive(Error, Debug)]
pub enum Error {
    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors reported by a shard operation
    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    /// Generic error type for other cases
    #[error("{0}")]
    Other(String),
}

/// Result type for shardmeta operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization_error(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    /// Get the wrapped shard error, if any
    pub fn as_shard_error(&self) -> Option<&ShardError> {
        match self {
            Self::Shard(err) => Some(err),
            _ => None,
        }
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Config(_) => Some("Check the manager configuration values".to_string()),
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                Some("The specified configuration file does not exist".to_string())
            }
            Self::Shard(ShardError::UnknownPg(_)) => {
                Some("Register the placement group before creating shards in it".to_string())
            }
            Self::Shard(ShardError::Internal(_)) => {
                Some("Internal shard metadata failure; run a consistency check".to_string())
            }
            _ => None,
        }
    }
}
