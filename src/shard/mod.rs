//! Shard metadata management
//!
//! This module tracks which shards exist, which placement group owns each of
//! them and where each shard is in its lifecycle. The [`ShardManager`] keeps
//! the shard table and the placement group index in lockstep.

mod state;
mod info;
mod manager;
mod error;

pub use state::ShardState;
pub use info::{ShardInfo, ShardStats};
pub use manager::ShardManager;
pub use error::{ShardError, ShardResult};

/// Shard ID type
pub type ShardId = u64;

/// Placement group ID type
pub type PgId = u16;
