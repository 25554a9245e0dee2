//! Shard manager
//!
//! Owns the shard table and the PG index. Both live behind one
//! `parking_lot::RwLock` together with the identity allocator cursor, so a
//! create is a single critical section: check the owner, allocate, register
//! membership, insert the row. Lookups and lists only take the read guard.
//!
//! Results are produced after the guard is released. The `*_with`
//! continuation forms therefore never run caller code under the lock, and a
//! continuation may call back into the manager.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::ManagerConfig;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::shard::info::now_millis;
use crate::shard::{PgId, ShardError, ShardId, ShardInfo, ShardResult, ShardState, ShardStats};

/// Shard table, PG index and allocator cursor, always locked together
#[derive(Debug)]
struct ShardIndex {
    /// Shard table: source of truth for existence and state
    shards: HashMap<ShardId, ShardInfo>,
    /// PG index: membership of every registered placement group
    pgs: HashMap<PgId, BTreeSet<ShardId>>,
    /// Next identity to hand out
    next_id: ShardId,
}

impl ShardIndex {
    fn new(first_id: ShardId) -> Self {
        Self {
            shards: HashMap::new(),
            pgs: HashMap::new(),
            next_id: first_id,
        }
    }

    /// Allocate an identity and insert a new open shard owned by `owner`.
    ///
    /// Nothing is allocated when the owner is unknown. If the row cannot be
    /// inserted the membership entry is rolled back; the identity stays
    /// burned.
    fn insert_shard(&mut self, owner: PgId, capacity_bytes: u64, created_at: u64) -> ShardResult<ShardInfo> {
        let members = self.pgs.get_mut(&owner).ok_or(ShardError::UnknownPg(owner))?;

        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| ShardError::internal("shard identity space exhausted"))?;

        members.insert(id);

        match self.shards.entry(id) {
            Entry::Vacant(slot) => {
                let info = slot.insert(ShardInfo::new(id, owner, capacity_bytes, created_at));
                Ok(info.clone())
            }
            Entry::Occupied(_) => {
                members.remove(&id);
                Err(ShardError::internal(format!("shard {} already present in shard table", id)))
            }
        }
    }

    fn seal(&mut self, id: ShardId) -> ShardResult<ShardInfo> {
        let info = self.shards.get_mut(&id).ok_or(ShardError::UnknownShard(id))?;

        if !info.state.can_transition_to(ShardState::Sealed) {
            return Err(ShardError::internal(format!(
                "shard {} cannot move from {} to sealed", id, info.state
            )));
        }
        info.state = ShardState::Sealed;

        Ok(info.clone())
    }

    fn list(&self, owner: PgId) -> ShardResult<Vec<ShardInfo>> {
        let members = self.pgs.get(&owner).ok_or(ShardError::UnknownPg(owner))?;

        let mut infos = Vec::with_capacity(members.len());
        for id in members {
            match self.shards.get(id) {
                Some(info) => infos.push(info.clone()),
                None => missing_shard(owner, *id),
            }
        }

        Ok(infos)
    }

    fn check(&self) -> ShardResult<()> {
        for (pg, members) in &self.pgs {
            for id in members {
                let info = self.shards.get(id).ok_or_else(|| {
                    ShardError::internal(format!("PG {} lists shard {} missing from shard table", pg, id))
                })?;
                if info.placement_group != *pg {
                    return Err(ShardError::internal(format!(
                        "PG {} lists shard {} owned by PG {}", pg, id, info.placement_group
                    )));
                }
            }
        }

        for (id, info) in &self.shards {
            if info.id != *id {
                return Err(ShardError::internal(format!(
                    "shard table key {} holds info for shard {}", id, info.id
                )));
            }
            if *id >= self.next_id {
                return Err(ShardError::internal(format!(
                    "shard {} was never handed out by the allocator (next {})", id, self.next_id
                )));
            }
            let registered = self
                .pgs
                .get(&info.placement_group)
                .map_or(false, |members| members.contains(id));
            if !registered {
                return Err(ShardError::internal(format!(
                    "shard {} is not registered under its owner PG {}", id, info.placement_group
                )));
            }
        }

        Ok(())
    }
}

/// A membership entry without a shard table row means the indexes have
/// desynchronised. There is no way to continue safely.
#[cold]
fn missing_shard(owner: PgId, id: ShardId) -> ! {
    error!(pg = owner, shard_id = id, "PG index entry has no shard table row");
    panic!("Missing shard [{}] of PG [{}] from shard table", id, owner);
}

/// Metadata authority for shards and their placement groups
#[derive(Debug)]
pub struct ShardManager {
    /// Shard table, PG index and allocator
    index: RwLock<ShardIndex>,
    /// Manager configuration
    config: ManagerConfig,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
}

impl Default for ShardManager {
    fn default() -> Self {
        Self::build(ManagerConfig::default(), Arc::new(MetricsCollector::new()))
    }
}

impl ShardManager {
    /// Create a manager from a validated configuration
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Self::with_metrics(config, Arc::new(MetricsCollector::new()))
    }

    /// Create a manager that reports into a shared metrics collector
    pub fn with_metrics(config: ManagerConfig, metrics: Arc<MetricsCollector>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, metrics))
    }

    fn build(config: ManagerConfig, metrics: Arc<MetricsCollector>) -> Self {
        let mut index = ShardIndex::new(config.first_shard_id);
        for pg in &config.initial_pgs {
            index.pgs.insert(*pg, BTreeSet::new());
        }

        debug!(
            pgs = config.initial_pgs.len(),
            first_shard_id = config.first_shard_id,
            "Shard manager initialised"
        );

        Self {
            index: RwLock::new(index),
            config,
            metrics,
        }
    }

    /// Create a new open shard owned by `owner`.
    ///
    /// Under the default [`CapacityPolicy::Fixed`](crate::CapacityPolicy)
    /// `size_bytes` is only logged; the shard gets the configured capacity.
    pub fn create_shard(&self, owner: PgId, size_bytes: u64) -> ShardResult<ShardInfo> {
        info!(pg = owner, size_bytes, "Creating shard");
        let start = Instant::now();

        let capacity = self
            .config
            .capacity_policy
            .resolve(size_bytes, self.config.shard_capacity_bytes);
        let created_at = now_millis();

        let (result, held) = {
            let mut index = self.index.write();
            let locked = Instant::now();
            let result = index.insert_shard(owner, capacity, created_at);
            (result, locked.elapsed())
        };

        match &result {
            Ok(info) => {
                debug!(shard_id = info.id, pg = owner, capacity_bytes = info.capacity_bytes, "Shard created");
                if self.config.collect_metrics {
                    self.metrics.increment_creates();
                    self.metrics.record_create_duration(start.elapsed());
                    self.metrics.record_write_hold(held);
                }
            }
            Err(err) => self.reject("create", err),
        }

        result
    }

    /// Get a copy of a shard's current metadata
    pub fn get_shard(&self, id: ShardId) -> ShardResult<ShardInfo> {
        let result = {
            let index = self.index.read();
            index.shards.get(&id).cloned().ok_or(ShardError::UnknownShard(id))
        };

        if self.config.collect_metrics {
            self.metrics.increment_gets();
        }
        if let Err(err) = &result {
            self.reject("get", err);
        }

        result
    }

    /// List every shard owned by `owner`, in ascending ID order.
    ///
    /// # Panics
    ///
    /// Panics if the PG index references a shard that is missing from the
    /// shard table.
    pub fn list_shards(&self, owner: PgId) -> ShardResult<Vec<ShardInfo>> {
        let start = Instant::now();

        let result = {
            let index = self.index.read();
            index.list(owner)
        };

        match &result {
            Ok(infos) => {
                debug!(pg = owner, count = infos.len(), "Listed shards");
                if self.config.collect_metrics {
                    self.metrics.increment_lists();
                    self.metrics.add_listed_entries(infos.len());
                    self.metrics.record_list_duration(start.elapsed());
                }
            }
            Err(err) => self.reject("list", err),
        }

        result
    }

    /// Seal a shard. Sealing an already sealed shard succeeds.
    pub fn seal_shard(&self, id: ShardId) -> ShardResult<ShardInfo> {
        let start = Instant::now();

        let (result, held) = {
            let mut index = self.index.write();
            let locked = Instant::now();
            let result = index.seal(id);
            (result, locked.elapsed())
        };

        match &result {
            Ok(info) => {
                debug!(shard_id = id, pg = info.placement_group, "Shard sealed");
                if self.config.collect_metrics {
                    self.metrics.increment_seals();
                    self.metrics.record_seal_duration(start.elapsed());
                    self.metrics.record_write_hold(held);
                }
            }
            Err(err) => self.reject("seal", err),
        }

        result
    }

    // Continuation forms

    /// [`create_shard`](Self::create_shard), delivering the result to `on_complete`
    pub fn create_shard_with<F>(&self, owner: PgId, size_bytes: u64, on_complete: F)
    where
        F: FnOnce(ShardResult<ShardInfo>),
    {
        on_complete(self.create_shard(owner, size_bytes))
    }

    /// [`get_shard`](Self::get_shard), delivering the result to `on_complete`
    pub fn get_shard_with<F>(&self, id: ShardId, on_complete: F)
    where
        F: FnOnce(ShardResult<ShardInfo>),
    {
        on_complete(self.get_shard(id))
    }

    /// [`list_shards`](Self::list_shards), delivering the result to `on_complete`
    pub fn list_shards_with<F>(&self, owner: PgId, on_complete: F)
    where
        F: FnOnce(ShardResult<Vec<ShardInfo>>),
    {
        on_complete(self.list_shards(owner))
    }

    /// [`seal_shard`](Self::seal_shard), delivering the result to `on_complete`
    pub fn seal_shard_with<F>(&self, id: ShardId, on_complete: F)
    where
        F: FnOnce(ShardResult<ShardInfo>),
    {
        on_complete(self.seal_shard(id))
    }

    // Placement group index

    /// Register a placement group so shards can be created in it.
    ///
    /// Returns `false` if the group was already registered.
    pub fn register_pg(&self, pg: PgId) -> bool {
        let added = {
            let mut index = self.index.write();
            match index.pgs.entry(pg) {
                Entry::Vacant(slot) => {
                    slot.insert(BTreeSet::new());
                    true
                }
                Entry::Occupied(_) => false,
            }
        };

        if added {
            info!(pg, "Registered placement group");
        }
        added
    }

    /// Check whether a placement group is registered
    pub fn has_pg(&self, pg: PgId) -> bool {
        self.index.read().pgs.contains_key(&pg)
    }

    /// Registered placement groups, ascending
    pub fn pg_ids(&self) -> Vec<PgId> {
        let mut pgs: Vec<PgId> = self.index.read().pgs.keys().copied().collect();
        pgs.sort_unstable();
        pgs
    }

    // Introspection

    /// Number of shards in the shard table
    pub fn shard_count(&self) -> usize {
        self.index.read().shards.len()
    }

    /// Get statistics about all shards
    pub fn stats(&self) -> ShardStats {
        let index = self.index.read();

        let mut stats = ShardStats::new();
        stats.shard_count = index.shards.len();
        stats.pg_count = index.pgs.len();
        stats.empty_pgs = index.pgs.values().filter(|members| members.is_empty()).count();
        stats.next_shard_id = index.next_id;

        for shard in index.shards.values() {
            match shard.state {
                ShardState::Open => stats.open_shards += 1,
                ShardState::Sealed => stats.sealed_shards += 1,
            }
            stats.total_capacity_bytes = stats.total_capacity_bytes.saturating_add(shard.capacity_bytes);
        }

        stats
    }

    /// Scan both indexes and report the first inconsistency found
    pub fn check_consistency(&self) -> ShardResult<()> {
        let result = self.index.read().check();
        if let Err(err) = &result {
            error!(error = %err, "Shard metadata consistency check failed");
        }
        result
    }

    /// Get the manager's configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Get the manager's metrics collector
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    // Internal methods

    fn reject(&self, op: &'static str, err: &ShardError) {
        warn!(op, code = err.code(), error = %err, "Shard operation rejected");
        if self.config.collect_metrics {
            self.metrics.record_error(err);
        }
    }
}
