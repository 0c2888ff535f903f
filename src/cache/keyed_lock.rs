use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

/// Lazily created mutex per opaque string key.
///
/// The map itself is guarded by one lock that is only held for the
/// lookup-or-insert; callers wait on the per-key mutex, so unrelated keys
/// never contend with each other.
#[derive(Debug, Default, Clone)]
pub struct KeyedLock {
    locks: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for `key`, creating it on first use
    pub async fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.locks.read().await;
            if let Some(lock) = guard.get(key) {
                return lock.clone();
            }
        }

        let mut guard = self.locks.write().await;
        guard
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Waits for exclusive access to `key`; released when the guard drops
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        self.lock_for(key).await.lock_owned().await
    }

    /// Number of keys that have ever been locked
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
