use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::{
    models::{CircuitLayout, LapRecord, RaceSummary, RaceTelemetry},
    producer::RaceDataProducer,
};
use crate::cache::{ArtifactCache, CacheError, CacheKey};

/// Outcome of a cache warming run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarmReport {
    pub processed: Vec<u32>,
    pub skipped: Vec<u32>,
    pub failed: Vec<WarmFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmFailure {
    pub round: u32,
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LapLookupError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Lap {lap} is outside 1..={total}")]
    OutOfRange { lap: u32, total: u32 },
}

/// Race data access: cache lookups backed by the upstream producer, with a
/// timeout on every producer call so a stuck fetch cannot hold a key lock.
pub struct RaceDataService {
    cache: Arc<ArtifactCache>,
    producer: Arc<dyn RaceDataProducer>,
    producer_timeout: Duration,
}

impl RaceDataService {
    pub fn new(
        cache: Arc<ArtifactCache>,
        producer: Arc<dyn RaceDataProducer>,
        producer_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            producer,
            producer_timeout,
        }
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    /// Telemetry for a race, fetching and caching it on first request
    #[instrument(skip(self))]
    pub async fn race_telemetry(&self, year: i32, round: u32) -> Result<RaceTelemetry, CacheError> {
        let key = CacheKey::telemetry(year, round);
        self.cache
            .acquire_or_compute(&key, || {
                self.bounded(&key, self.producer.produce_telemetry(year, round))
            })
            .await
    }

    /// Telemetry only if it has already been cached; never contacts upstream
    pub async fn cached_telemetry(
        &self,
        year: i32,
        round: u32,
    ) -> Result<Option<RaceTelemetry>, CacheError> {
        self.cache.get(&CacheKey::telemetry(year, round)).await
    }

    pub async fn lap(
        &self,
        year: i32,
        round: u32,
        lap_number: u32,
    ) -> Result<LapRecord, LapLookupError> {
        let telemetry = self.race_telemetry(year, round).await?;
        telemetry
            .lap(lap_number)
            .cloned()
            .ok_or(LapLookupError::OutOfRange {
                lap: lap_number,
                total: telemetry.laps.len() as u32,
            })
    }

    /// Name, date and podium, from the same cached telemetry
    pub async fn summary(&self, year: i32, round: u32) -> Result<RaceSummary, CacheError> {
        Ok(self.race_telemetry(year, round).await?.summary())
    }

    #[instrument(skip(self))]
    pub async fn circuit_layout(&self, year: i32, round: u32) -> Result<CircuitLayout, CacheError> {
        let key = CacheKey::circuit_layout(year, round);
        self.cache
            .acquire_or_compute(&key, || {
                self.bounded(&key, self.producer.produce_circuit(year, round))
            })
            .await
    }

    /// Pre-processes telemetry for each round. Rounds already cached are
    /// skipped unless `force`; a failing round does not stop the rest.
    #[instrument(skip(self, rounds), fields(rounds = rounds.len()))]
    pub async fn warm(&self, year: i32, rounds: &[u32], force: bool) -> WarmReport {
        let mut report = WarmReport::default();

        for &round in rounds {
            let key = CacheKey::telemetry(year, round);

            if !force {
                match self.cache.contains(&key).await {
                    Ok(true) => {
                        info!(year, round, "Already cached, skipping");
                        report.skipped.push(round);
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        report.failed.push(WarmFailure {
                            round,
                            error: e.to_string(),
                        });
                        continue;
                    }
                }
            }

            let produced = if force {
                self.cache
                    .refresh(&key, || {
                        self.bounded(&key, self.producer.produce_telemetry(year, round))
                    })
                    .await
            } else {
                self.race_telemetry(year, round).await
            };

            match produced {
                Ok(telemetry) => {
                    info!(year, round, laps = telemetry.laps.len(), "Race cached");
                    report.processed.push(round);
                }
                Err(e) => {
                    warn!(year, round, error = %e, "Failed to warm race");
                    report.failed.push(WarmFailure {
                        round,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Cache warm finished"
        );
        report
    }

    async fn bounded<T>(
        &self,
        key: &CacheKey,
        fut: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.producer_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                key: key.to_string(),
                seconds: self.producer_timeout.as_secs(),
            }),
        }
    }
}
