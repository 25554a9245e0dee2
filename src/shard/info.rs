//! Shard information and statistics data structures
//!
//! `ShardInfo` is handed out by value; callers never alias the copy held in
//! the shard table.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Deserialize};

use crate::shard::{PgId, ShardId, ShardState};

/// Metadata describing a single shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// Shard ID
    pub id: ShardId,
    /// Owning placement group
    pub placement_group: PgId,
    /// Lifecycle state
    pub state: ShardState,
    /// Capacity assigned at creation
    pub capacity_bytes: u64,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: u64,
    /// Bytes written into the shard by the data plane
    pub written_bytes: u64,
    /// Number of objects stored in the shard
    pub object_count: u64,
    /// Number of objects deleted from the shard
    pub deleted_object_count: u64,
}

impl ShardInfo {
    /// Create info for a freshly created, open shard
    pub fn new(id: ShardId, placement_group: PgId, capacity_bytes: u64, created_at: u64) -> Self {
        Self {
            id,
            placement_group,
            state: ShardState::Open,
            capacity_bytes,
            created_at,
            written_bytes: 0,
            object_count: 0,
            deleted_object_count: 0,
        }
    }

    /// Check if the shard is open
    pub fn is_open(&self) -> bool {
        self.state == ShardState::Open
    }

    /// Check if the shard is sealed
    pub fn is_sealed(&self) -> bool {
        self.state == ShardState::Sealed
    }

    /// Creation time as a UTC timestamp
    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(self.created_at).ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch
pub(crate) fn now_millis() -> u64 {
    // pre-1970 clocks clamp to zero
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Statistics about the shards tracked by a manager
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardStats {
    /// Number of shards
    pub shard_count: usize,
    /// Number of open shards
    pub open_shards: usize,
    /// Number of sealed shards
    pub sealed_shards: usize,
    /// Number of registered placement groups
    pub pg_count: usize,
    /// Number of registered placement groups that own no shard
    pub empty_pgs: usize,
    /// Sum of shard capacities in bytes
    pub total_capacity_bytes: u64,
    /// ID the allocator hands out next
    pub next_shard_id: ShardId,
}

impl ShardStats {
    /// Create new empty shard stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any shards
    pub fn has_shards(&self) -> bool {
        self.shard_count > 0
    }

    /// Average number of shards per placement group
    pub fn avg_shards_per_pg(&self) -> f64 {
        if self.pg_count == 0 {
            return 0.0;
        }

        self.shard_count as f64 / self.pg_count as f64
    }

    /// Fraction of shards that are sealed (0.0 - 1.0)
    pub fn sealed_ratio(&self) -> f64 {
        if self.shard_count == 0 {
            return 0.0;
        }

        self.sealed_shards as f64 / self.shard_count as f64
    }

    /// Create a human-readable report of statistics
    pub fn report(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Shard Statistics ===\n\n");

        result.push_str(&format!("Total Shards: {}\n", self.shard_count));
        result.push_str(&format!("  - Open: {}\n", self.open_shards));
        result.push_str(&format!("  - Sealed: {}\n", self.sealed_shards));

        result.push_str(&format!("Placement Groups: {}\n", self.pg_count));
        result.push_str(&format!("  - Empty: {}\n", self.empty_pgs));

        result.push_str(&format!("Total Capacity: {} bytes\n", self.total_capacity_bytes));
        result.push_str(&format!("Next Shard ID: {}\n", self.next_shard_id));

        if self.has_shards() {
            result.push_str(&format!("Avg. Shards per PG: {:.2}\n", self.avg_shards_per_pg()));
            result.push_str(&format!("Sealed Ratio: {:.2}\n", self.sealed_ratio()));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_info_basic() {
        let now = now_millis();
        let info = ShardInfo::new(1, 3, 1024 * 1024 * 1024, now);

        assert_eq!(info.id, 1);
        assert_eq!(info.placement_group, 3);
        assert!(info.is_open());
        assert!(!info.is_sealed());
        assert_eq!(info.capacity_bytes, 1_073_741_824);
        assert_eq!(info.written_bytes, 0);
        assert_eq!(info.object_count, 0);
        assert_eq!(info.deleted_object_count, 0);

        let created = info.created_at_datetime().unwrap();
        assert_eq!(created.timestamp_millis() as u64, now);
    }

    #[test]
    fn test_shard_info_serde() {
        let mut info = ShardInfo::new(9, 2, 4096, 1_700_000_000_000);
        info.state = ShardState::Sealed;

        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"Sealed\""));

        let back: ShardInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_shard_stats() {
        let mut stats = ShardStats::new();

        assert!(!stats.has_shards());
        assert_eq!(stats.avg_shards_per_pg(), 0.0);
        assert_eq!(stats.sealed_ratio(), 0.0);

        stats.shard_count = 10;
        stats.open_shards = 6;
        stats.sealed_shards = 4;
        stats.pg_count = 5;
        stats.next_shard_id = 11;

        assert_eq!(stats.avg_shards_per_pg(), 2.0);
        assert_eq!(stats.sealed_ratio(), 0.4);

        let report = stats.report();
        assert!(report.contains("Total Shards: 10"));
        assert!(report.contains("Sealed Ratio: 0.40"));
        assert!(report.contains("Next Shard ID: 11"));
    }
}
