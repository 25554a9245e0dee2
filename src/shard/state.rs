//! Shard lifecycle state
//!
//! A shard starts `Open` and may be sealed once. Sealing is terminal.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Lifecycle state of a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShardState {
    /// Shard accepts new writes
    Open,
    /// Shard is closed to further writes
    Sealed,
}

impl Default for ShardState {
    fn default() -> Self {
        Self::Open
    }
}

impl fmt::Display for ShardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ShardState {
    /// Parse a shard state from a string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "sealed" => Ok(Self::Sealed),
            _ => Err(Error::config(format!("Unknown shard state: {}", s))),
        }
    }

    /// Get the name of the state
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Sealed => "sealed",
        }
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// `Sealed -> Sealed` is accepted so that sealing stays idempotent.
    pub fn can_transition_to(&self, next: ShardState) -> bool {
        match (self, next) {
            (Self::Open, _) => true,
            (Self::Sealed, Self::Sealed) => true,
            (Self::Sealed, Self::Open) => false,
        }
    }

    /// Check if the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_state_names() {
        assert_eq!(ShardState::Open.to_string(), "open");
        assert_eq!(ShardState::Sealed.to_string(), "sealed");

        assert_eq!(ShardState::from_str("OPEN").unwrap(), ShardState::Open);
        assert_eq!(ShardState::from_str("sealed").unwrap(), ShardState::Sealed);
        assert!(ShardState::from_str("deleted").is_err());

        assert_eq!(ShardState::default(), ShardState::Open);
    }

    #[test]
    fn test_shard_state_transitions() {
        assert!(ShardState::Open.can_transition_to(ShardState::Sealed));
        assert!(ShardState::Open.can_transition_to(ShardState::Open));
        assert!(ShardState::Sealed.can_transition_to(ShardState::Sealed));
        assert!(!ShardState::Sealed.can_transition_to(ShardState::Open));

        assert!(!ShardState::Open.is_terminal());
        assert!(ShardState::Sealed.is_terminal());
    }
}
