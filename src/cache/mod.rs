// Durable, per-key singleflight cache for expensive race artifacts.
pub use errors::CacheError;
pub use key::{ArtifactCategory, CacheKey};
pub use keyed_lock::KeyedLock;
pub use service::ArtifactCache;
pub use store::{
    ArtifactStore, FsArtifactStore, InMemoryArtifactStore, StagedArtifact, STALE_TEMP_AGE,
};

mod errors;
mod key;
mod keyed_lock;
mod service;
mod store;
