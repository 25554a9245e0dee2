//! Error types for the shard module
//!
//! Defines the errors reported by shard manager operations. Only expected
//! failures live here; a desynchronised shard table and PG index is a fatal
//! invariant breach and panics instead.

use thiserror::Error;

use crate::shard::{PgId, ShardId};

/// Errors that can occur during shard operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    /// The referenced placement group is not registered
    #[error("Unknown placement group: {0}")]
    UnknownPg(PgId),

    /// The referenced shard does not exist
    #[error("Unknown shard: {0}")]
    UnknownShard(ShardId),

    /// Internal failure (identity collision, dropped completion)
    #[error("Internal shard error: {0}")]
    Internal(String),
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Create a new unknown placement group error
    pub fn unknown_pg(pg: PgId) -> Self {
        Self::UnknownPg(pg)
    }

    /// Create a new unknown shard error
    pub fn unknown_shard(id: ShardId) -> Self {
        Self::UnknownShard(id)
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is an unknown placement group error
    pub fn is_unknown_pg(&self) -> bool {
        matches!(self, Self::UnknownPg(_))
    }

    /// Check if this is an unknown shard error
    pub fn is_unknown_shard(&self) -> bool {
        matches!(self, Self::UnknownShard(_))
    }

    /// Check if this is an internal error
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Stable error code, shared with callers on the other side of an RPC
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPg(_) => "UNKNOWN_PG",
            Self::UnknownShard(_) => "UNKNOWN_SHARD",
            Self::Internal(_) => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_error_creation() {
        let err = ShardError::unknown_pg(7);
        assert!(matches!(err, ShardError::UnknownPg(7)));
        assert!(err.is_unknown_pg());
        assert!(!err.is_unknown_shard());
        assert_eq!(err.to_string(), "Unknown placement group: 7");

        let err = ShardError::unknown_shard(42);
        assert!(err.is_unknown_shard());
        assert_eq!(err.to_string(), "Unknown shard: 42");

        let err = ShardError::internal("collision on shard 3");
        assert!(err.is_internal());
        assert!(err.to_string().contains("collision on shard 3"));
    }

    #[test]
    fn test_shard_error_codes() {
        assert_eq!(ShardError::unknown_pg(1).code(), "UNKNOWN_PG");
        assert_eq!(ShardError::unknown_shard(1).code(), "UNKNOWN_SHARD");
        assert_eq!(ShardError::internal("x").code(), "UNKNOWN");
    }
}
