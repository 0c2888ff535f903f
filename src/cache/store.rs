use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{CacheError, CacheKey};

/// Durable byte store for cached artifacts.
///
/// `publish` must be atomic: a concurrent `load` sees either no artifact or
/// the complete new one. Presence of the published artifact is the only
/// readiness signal.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;
    async fn publish(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError>;
    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError>;
    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

/// Temp files older than this were left by a writer that never committed
pub const STALE_TEMP_AGE: Duration = Duration::from_secs(15 * 60);

/// Filesystem store: one JSON document per key, written to a hidden temp
/// file in the same directory and renamed into place.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

/// An artifact fully written to its temp location but not yet visible
#[derive(Debug)]
pub struct StagedArtifact {
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl StagedArtifact {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Moves the staged file to its final name in a single rename
    pub async fn commit(self) -> Result<(), CacheError> {
        if let Err(e) = tokio::fs::rename(&self.temp_path, &self.final_path).await {
            warn!(error = %e, temp = %self.temp_path.display(), "Failed to publish staged artifact");
            let _ = tokio::fs::remove_file(&self.temp_path).await;
            return Err(CacheError::Storage(e.to_string()));
        }
        Ok(())
    }
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn final_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()))
    }

    fn is_temp_name(name: &str) -> bool {
        name.starts_with('.') && name.ends_with(".tmp")
    }

    /// Deletes staged files that were never committed and are at least
    /// `older_than` old. Returns how many were removed; a missing root is
    /// an empty cache.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn remove_stale_temp_files(&self, older_than: Duration) -> Result<usize, CacheError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::Storage(e.to_string())),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::Storage(e.to_string()))?
        {
            let name = entry.file_name();
            if !name.to_str().is_some_and(Self::is_temp_name) {
                continue;
            }

            let age = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => now.duration_since(modified).unwrap_or_default(),
                Err(e) => {
                    warn!(error = %e, file = ?name, "Cannot read temp file age");
                    continue;
                }
            };
            if age < older_than {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Storage(e.to_string())),
            }
        }

        if removed > 0 {
            info!(removed, "Removed stale staged artifacts");
        }
        Ok(removed)
    }

    /// Writes and syncs `bytes` to a unique temp file next to the final path
    #[instrument(skip(self, bytes), fields(key = %key, size = bytes.len()))]
    pub async fn stage(&self, key: &CacheKey, bytes: &[u8]) -> Result<StagedArtifact, CacheError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CacheError::Storage(e.to_string()))?;

        let temp_path = self.temp_path(key);
        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            warn!(error = %e, temp = %temp_path.display(), "Failed to stage artifact");
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Storage(e.to_string()));
        }

        debug!(temp = %temp_path.display(), "Artifact staged");
        Ok(StagedArtifact {
            temp_path,
            final_path: self.final_path(key),
        })
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        match tokio::fs::read(self.final_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Storage(e.to_string())),
        }
    }

    async fn publish(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError> {
        self.stage(key, &bytes).await?.commit().await?;
        debug!(key = %key, "Artifact published to disk");
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        tokio::fs::try_exists(self.final_path(key))
            .await
            .map_err(|e| CacheError::Storage(e.to_string()))
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.final_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Storage(e.to_string())),
        }
    }
}

/// In-memory store for tests and ephemeral deployments; publishing is a
/// single map insert under the write lock.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: Arc<RwLock<HashMap<CacheKey, Arc<Vec<u8>>>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.artifacts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let artifacts = self.artifacts.read().await;
        Ok(artifacts.get(key).map(|bytes| bytes.to_vec()))
    }

    async fn publish(&self, key: &CacheKey, bytes: Vec<u8>) -> Result<(), CacheError> {
        let mut artifacts = self.artifacts.write().await;
        artifacts.insert(*key, Arc::new(bytes));
        Ok(())
    }

    async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.artifacts.read().await.contains_key(key))
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.artifacts.write().await.remove(key).is_some())
    }
}
