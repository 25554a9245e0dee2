//! Configuration for the shard manager
//!
//! This module provides configuration options for a [`ShardManager`](crate::ShardManager).

use std::collections::BTreeSet;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};
use crate::shard::{PgId, ShardId};

/// Default capacity assigned to new shards (1 GiB)
pub const DEFAULT_SHARD_CAPACITY: u64 = 1024 * 1024 * 1024;

/// Smallest capacity a configuration may assign (1 MiB)
pub const MIN_SHARD_CAPACITY: u64 = 1024 * 1024;

/// How the capacity of a new shard is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CapacityPolicy {
    /// Every shard gets the configured capacity; the requested size is ignored
    Fixed,
    /// The requested size is used; zero falls back to the configured capacity
    Requested,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::Fixed
    }
}

impl std::fmt::Display for CapacityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl CapacityPolicy {
    /// Parse a capacity policy from a string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "requested" => Ok(Self::Requested),
            _ => Err(Error::config(format!("Unknown capacity policy: {}", s))),
        }
    }

    /// Get the name of the capacity policy
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Requested => "requested",
        }
    }

    /// Capacity for a shard created with `requested` bytes
    pub fn resolve(&self, requested: u64, configured: u64) -> u64 {
        match self {
            Self::Fixed => configured,
            Self::Requested if requested == 0 => configured,
            Self::Requested => requested,
        }
    }
}

/// Configuration options for a shard manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct ManagerConfig {
    /// Capacity assigned to new shards in bytes
    pub shard_capacity_bytes: u64,
    /// How the requested size on create is treated
    pub capacity_policy: CapacityPolicy,
    /// First identity handed out by the allocator
    pub first_shard_id: ShardId,
    /// Placement groups registered when the manager is built
    pub initial_pgs: BTreeSet<PgId>,
    /// Enable metrics collection
    pub collect_metrics: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            shard_capacity_bytes: DEFAULT_SHARD_CAPACITY,
            capacity_policy: CapacityPolicy::default(),
            first_shard_id: 1,
            initial_pgs: BTreeSet::new(),
            collect_metrics: true,
        }
    }
}

impl ManagerConfig {
    /// Create a new manager configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity assigned to new shards
    pub fn with_shard_capacity_bytes(mut self, bytes: u64) -> Self {
        self.shard_capacity_bytes = bytes;
        self
    }

    /// Set the capacity policy
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    /// Set the first identity handed out by the allocator
    pub fn with_first_shard_id(mut self, id: ShardId) -> Self {
        self.first_shard_id = id;
        self
    }

    /// Register a placement group at construction time
    pub fn with_pg(mut self, pg: PgId) -> Self {
        self.initial_pgs.insert(pg);
        self
    }

    /// Register several placement groups at construction time
    pub fn with_pgs(mut self, pgs: impl IntoIterator<Item = PgId>) -> Self {
        self.initial_pgs.extend(pgs);
        self
    }

    /// Set whether to collect metrics
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.shard_capacity_bytes < MIN_SHARD_CAPACITY {
            return Err(Error::config(
                "Shard capacity must be at least 1MB"
            ));
        }

        if self.first_shard_id == 0 {
            return Err(Error::config(
                "First shard ID must be at least 1"
            ));
        }

        Ok(())
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Shard Manager Configuration ===\n\n");

        result.push_str("Allocation:\n");
        result.push_str(&format!("  Shard Capacity: {} MB\n", self.shard_capacity_bytes / 1024 / 1024));
        result.push_str(&format!("  Capacity Policy: {}\n", self.capacity_policy));
        result.push_str(&format!("  First Shard ID: {}\n", self.first_shard_id));

        result.push_str("\nPlacement Groups:\n");
        if self.initial_pgs.is_empty() {
            result.push_str("  Initial PGs: none\n");
        } else {
            let pgs: Vec<String> = self.initial_pgs.iter().map(|pg| pg.to_string()).collect();
            result.push_str(&format!("  Initial PGs: {}\n", pgs.join(", ")));
        }

        result.push_str("\nAdditional Settings:\n");
        result.push_str(&format!("  Collect Metrics: {}\n", self.collect_metrics));

        result
    }

    /// Parse and validate a configuration from JSON
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
