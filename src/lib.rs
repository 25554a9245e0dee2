//! # shardmeta_rs
//!
//! Metadata authority for the shards of a placement-group based object store.
//!
//! A [`ShardManager`] keeps two indexes consistent under concurrent callers:
//! the shard table (shard ID to [`ShardInfo`]) and the placement group index
//! (PG ID to the shards it owns). It allocates shard identities exactly once,
//! records the `Open -> Sealed` lifecycle and hands out copies of shard
//! metadata that are never partially written.
//!
//! ```
//! use shardmeta_rs::{ManagerConfig, ShardError, ShardManager, ShardState};
//!
//! let manager = ShardManager::new(ManagerConfig::new().with_pg(1))?;
//!
//! let shard = manager.create_shard(1, 2 * 1024 * 1024)?;
//! assert_eq!(shard.state, ShardState::Open);
//!
//! let sealed = manager.seal_shard(shard.id)?;
//! assert!(sealed.is_sealed());
//!
//! assert_eq!(manager.create_shard(2, 1024), Err(ShardError::UnknownPg(2)));
//! # Ok::<(), shardmeta_rs::Error>(())
//! ```
//!
//! Every operation also has a continuation form (`create_shard_with`, ...)
//! and, with the `async` feature, an `async` adapter in [`nonblocking`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod shard;

#[cfg(feature = "async")]
pub mod nonblocking;

pub use config::{CapacityPolicy, ManagerConfig, DEFAULT_SHARD_CAPACITY};
pub use error::{Error, Result};
pub use metrics::MetricsCollector;
pub use shard::{PgId, ShardError, ShardId, ShardInfo, ShardManager, ShardResult, ShardState, ShardStats};

#[cfg(feature = "async")]
pub use nonblocking::AsyncShardManager;
