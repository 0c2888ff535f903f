use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use super::models::{CircuitLayout, RaceTelemetry};
use crate::cache::CacheError;

/// Upstream source of processed race data. Calls may be slow and may fail;
/// the cache guarantees each one runs at most once per key.
#[async_trait]
pub trait RaceDataProducer: Send + Sync {
    async fn produce_telemetry(&self, year: i32, round: u32) -> Result<RaceTelemetry, CacheError>;
    async fn produce_circuit(&self, year: i32, round: u32) -> Result<CircuitLayout, CacheError>;
}

/// Reads race exports that an external downloader has already parsed into
/// `{year}_R{round}.json` and `{year}_R{round}_circuit.json`.
#[derive(Debug, Clone)]
pub struct JsonFileProducer {
    raw_dir: PathBuf,
}

impl JsonFileProducer {
    pub fn new(raw_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
        }
    }

    pub fn telemetry_path(&self, year: i32, round: u32) -> PathBuf {
        self.raw_dir.join(format!("{}_R{}.json", year, round))
    }

    pub fn circuit_path(&self, year: i32, round: u32) -> PathBuf {
        self.raw_dir.join(format!("{}_R{}_circuit.json", year, round))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                CacheError::Producer(format!("No upstream export at {}", path.display()))
            }
            _ => CacheError::Producer(e.to_string()),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            CacheError::Producer(format!("Malformed export {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl RaceDataProducer for JsonFileProducer {
    #[instrument(skip(self))]
    async fn produce_telemetry(&self, year: i32, round: u32) -> Result<RaceTelemetry, CacheError> {
        let path = self.telemetry_path(year, round);
        debug!(path = %path.display(), "Reading upstream telemetry export");

        let mut telemetry: RaceTelemetry = Self::read_json(&path).await?;
        telemetry.year = year;
        telemetry.round = round;
        telemetry.laps.sort_by_key(|lap| lap.lap_number);
        if telemetry.total_laps == 0 {
            telemetry.total_laps = telemetry.laps.len() as u32;
        }
        Ok(telemetry)
    }

    #[instrument(skip(self))]
    async fn produce_circuit(&self, year: i32, round: u32) -> Result<CircuitLayout, CacheError> {
        let path = self.circuit_path(year, round);
        debug!(path = %path.display(), "Reading upstream circuit export");

        let mut layout: CircuitLayout = Self::read_json(&path).await?;
        layout.year = year;
        layout.round = round;
        Ok(layout)
    }
}
