use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No cached artifact for {key}")]
    Miss { key: String },

    #[error("Producer error: {0}")]
    Producer(String),

    #[error("Producer for {key} timed out after {seconds}s")]
    Timeout { key: String, seconds: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// True when the failure came from the upstream producer rather than the cache itself
    pub fn is_producer_failure(&self) -> bool {
        matches!(self, CacheError::Producer(_) | CacheError::Timeout { .. })
    }
}
