//! Async access to a shard manager
//!
//! Callers that await metadata (for example a service whose shard metadata
//! may live on another node) use [`AsyncShardManager`]. The local
//! implementation completes each call through the manager's continuation form
//! and a `tokio` oneshot channel.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::shard::{PgId, ShardError, ShardId, ShardInfo, ShardManager, ShardResult};

/// Asynchronous shard metadata operations
#[async_trait]
pub trait AsyncShardManager: Send + Sync {
    /// Create a new open shard in `owner`
    async fn create_shard(&self, owner: PgId, size_bytes: u64) -> ShardResult<ShardInfo>;

    /// Get a shard's metadata
    async fn get_shard(&self, id: ShardId) -> ShardResult<ShardInfo>;

    /// List the shards of a placement group
    async fn list_shards(&self, owner: PgId) -> ShardResult<Vec<ShardInfo>>;

    /// Seal a shard
    async fn seal_shard(&self, id: ShardId) -> ShardResult<ShardInfo>;
}

/// Await a result delivered through a continuation
async fn completion<T>(rx: oneshot::Receiver<ShardResult<T>>) -> ShardResult<T> {
    rx.await
        .map_err(|_| ShardError::internal("shard operation dropped its completion"))?
}

#[async_trait]
impl AsyncShardManager for Arc<ShardManager> {
    async fn create_shard(&self, owner: PgId, size_bytes: u64) -> ShardResult<ShardInfo> {
        let (tx, rx) = oneshot::channel();
        self.create_shard_with(owner, size_bytes, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    async fn get_shard(&self, id: ShardId) -> ShardResult<ShardInfo> {
        let (tx, rx) = oneshot::channel();
        self.get_shard_with(id, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    async fn list_shards(&self, owner: PgId) -> ShardResult<Vec<ShardInfo>> {
        let (tx, rx) = oneshot::channel();
        self.list_shards_with(owner, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }

    async fn seal_shard(&self, id: ShardId) -> ShardResult<ShardInfo> {
        let (tx, rx) = oneshot::channel();
        self.seal_shard_with(id, move |result| {
            let _ = tx.send(result);
        });
        completion(rx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::shard::ShardState;

    fn manager() -> Arc<ShardManager> {
        Arc::new(ShardManager::new(ManagerConfig::new().with_pg(1)).unwrap())
    }

    #[test]
    fn test_async_lifecycle() {
        let manager = manager();

        tokio_test::block_on(async {
            let created = AsyncShardManager::create_shard(&manager, 1, 2_097_152).await.unwrap();
            assert_eq!(created.id, 1);
            assert_eq!(created.state, ShardState::Open);

            let sealed = AsyncShardManager::seal_shard(&manager, created.id).await.unwrap();
            assert_eq!(sealed.state, ShardState::Sealed);

            let listed = AsyncShardManager::list_shards(&manager, 1).await.unwrap();
            assert_eq!(listed, vec![sealed.clone()]);

            let fetched = AsyncShardManager::get_shard(&manager, created.id).await.unwrap();
            assert_eq!(fetched, sealed);
        });
    }

    #[test]
    fn test_async_errors() {
        let manager = manager();

        tokio_test::block_on(async {
            let err = AsyncShardManager::create_shard(&manager, 2, 0).await.unwrap_err();
            assert_eq!(err, ShardError::UnknownPg(2));

            let err = AsyncShardManager::get_shard(&manager, 5).await.unwrap_err();
            assert_eq!(err, ShardError::UnknownShard(5));

            let err = AsyncShardManager::list_shards(&manager, 2).await.unwrap_err();
            assert!(err.is_unknown_pg());
        });
    }

    #[test]
    fn test_dropped_completion_is_internal_error() {
        let (tx, rx) = oneshot::channel::<ShardResult<ShardInfo>>();
        drop(tx);

        let err = tokio_test::block_on(completion(rx)).unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_async_creates() -> anyhow::Result<()> {
        let manager = manager();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let manager = manager.clone();
            tasks.push(tokio::spawn(async move {
                let mut ids = Vec::new();
                for _ in 0..50 {
                    ids.push(AsyncShardManager::create_shard(&manager, 1, 0).await?.id);
                }
                Ok::<_, ShardError>(ids)
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.extend(task.await??);
        }

        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 800);
        manager.check_consistency()?;

        Ok(())
    }
}
