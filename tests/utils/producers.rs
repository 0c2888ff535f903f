use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pitlane::{
    telemetry::{CircuitLayout, RaceDataProducer},
    CacheError, RaceTelemetry,
};

use super::fixtures::RaceBuilder;

// ============================================================================
// Producer doubles
// ============================================================================

/// Produces the standard grid after an optional delay and counts calls
pub struct CountingProducer {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingProducer {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RaceDataProducer for CountingProducer {
    async fn produce_telemetry(&self, year: i32, round: u32) -> Result<RaceTelemetry, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(RaceBuilder::new(year, round).with_standard_grid().build())
    }

    async fn produce_circuit(&self, year: i32, round: u32) -> Result<CircuitLayout, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CircuitLayout {
            year,
            round,
            circuit: "Test Circuit".to_string(),
            coordinates: Vec::new(),
        })
    }
}

/// Fails the first `failures` calls, then behaves like [`CountingProducer`]
pub struct FailingProducer {
    failures: usize,
    inner: CountingProducer,
}

impl FailingProducer {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            inner: CountingProducer::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl RaceDataProducer for FailingProducer {
    async fn produce_telemetry(&self, year: i32, round: u32) -> Result<RaceTelemetry, CacheError> {
        if self.inner.calls() < self.failures {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            return Err(CacheError::Producer("upstream unavailable".to_string()));
        }
        self.inner.produce_telemetry(year, round).await
    }

    async fn produce_circuit(&self, year: i32, round: u32) -> Result<CircuitLayout, CacheError> {
        self.inner.produce_circuit(year, round).await
    }
}
