use std::path::PathBuf;
use std::time::Duration;

/// Settings for the race artifact cache and its upstream producer
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub producer_timeout: Duration,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let producer_timeout_secs = std::env::var("PRODUCER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Self {
            cache_dir: std::env::var("PITLANE_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("race_cache")),
            raw_dir: std::env::var("PITLANE_RAW_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("race_raw")),
            producer_timeout: Duration::from_secs(producer_timeout_secs),
        }
    }
}

/// Process-wide settings read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub admin_key: String,
    pub cache: CacheConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            admin_key: std::env::var("ADMIN_KEY")
                .unwrap_or_else(|_| "pitlane-admin-change-me".to_string()),
            cache: CacheConfig::from_env(),
        }
    }
}
