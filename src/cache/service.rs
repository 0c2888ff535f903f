use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{ArtifactStore, CacheError, CacheKey, KeyedLock};

/// Singleflight cache over an [`ArtifactStore`].
///
/// For any key the producer runs at most once while a published artifact
/// exists: callers that lose the race wait on the per-key lock and then
/// re-check the store before doing any work.
pub struct ArtifactCache {
    store: Arc<dyn ArtifactStore>,
    locks: KeyedLock,
}

impl ArtifactCache {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            locks: KeyedLock::new(),
        }
    }

    /// Reads the artifact for `key` without ever triggering computation
    pub async fn get<T>(&self, key: &CacheKey) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.store.load(key).await? {
            Some(bytes) => {
                let artifact = serde_json::from_slice(&bytes).map_err(|e| {
                    warn!(key = %key, error = %e, "Cached artifact failed to deserialize");
                    CacheError::Serialization(e.to_string())
                })?;
                Ok(Some(artifact))
            }
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but treats absence as [`CacheError::Miss`]
    pub async fn require<T>(&self, key: &CacheKey) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        self.get(key).await?.ok_or_else(|| CacheError::Miss {
            key: key.to_string(),
        })
    }

    pub async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.store.contains(key).await
    }

    /// Returns the cached artifact, or runs `producer` and publishes its
    /// result. A failing producer publishes nothing and its error goes back
    /// to this caller only; later callers retry.
    #[instrument(skip(self, producer), fields(key = %key))]
    pub async fn acquire_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        producer: F,
    ) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        if let Some(artifact) = self.get(key).await? {
            debug!("Cache hit");
            return Ok(artifact);
        }

        let _guard = self.locks.acquire(&key.to_string()).await;

        if let Some(artifact) = self.get(key).await? {
            debug!("Artifact populated by a concurrent caller");
            return Ok(artifact);
        }

        info!("Cache miss, running producer");
        let artifact = producer().await.map_err(|e| {
            warn!(error = %e, "Producer failed, nothing cached");
            e
        })?;

        self.publish(key, &artifact).await?;
        Ok(artifact)
    }

    /// Recomputes and replaces the artifact wholesale, even when one exists
    #[instrument(skip(self, producer), fields(key = %key))]
    pub async fn refresh<T, F, Fut>(&self, key: &CacheKey, producer: F) -> Result<T, CacheError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        let _guard = self.locks.acquire(&key.to_string()).await;

        info!("Forced refresh, running producer");
        let artifact = producer().await?;
        self.publish(key, &artifact).await?;
        Ok(artifact)
    }

    /// Drops the published artifact so the next caller recomputes it
    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let _guard = self.locks.acquire(&key.to_string()).await;
        self.store.remove(key).await
    }

    async fn publish<T: Serialize>(&self, key: &CacheKey, artifact: &T) -> Result<(), CacheError> {
        let bytes =
            serde_json::to_vec(artifact).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let size = bytes.len();
        self.store.publish(key, bytes).await?;
        info!(key = %key, size, "Artifact cached");
        Ok(())
    }
}
