use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

use super::{PitStopRegistry, PredictionEvaluator, ScoringError};
use crate::prediction::{
    PredictionModel, PredictionRepository, PredictionStatus, ScoredPrediction,
};
use crate::telemetry::{RaceDataService, RaceTelemetry};

/// Admin request to score a finished race
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreRaceRequest {
    pub year: i32,
    pub round: u32,
    /// Restricts the pending scan to predictions made for this race
    #[serde(default)]
    pub race_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub race: String,
    pub total_pending: usize,
    /// correct + wrong
    pub scored: usize,
    pub correct: usize,
    pub wrong: usize,
    pub skipped: usize,
    pub users_updated: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub correct: u64,
    pub wrong: u64,
    pub skipped: u64,
    pub total: u64,
}

/// Dry run of a scoring pass; nothing is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPreview {
    pub race: String,
    pub total_laps: u32,
    pub pending_to_score: usize,
    pub pit_stops: PitStopRegistry,
}

/// Scores pending predictions against cached race telemetry. The repository
/// commit applies the outcomes and rewrites every user's totals in one step.
pub struct ScoringService {
    race_data: Arc<RaceDataService>,
    predictions: Arc<dyn PredictionRepository + Send + Sync>,
    evaluator: PredictionEvaluator,
    // One run at a time per process; two runs would read the same pending set
    run_lock: AsyncMutex<()>,
}

impl ScoringService {
    pub fn new(
        race_data: Arc<RaceDataService>,
        predictions: Arc<dyn PredictionRepository + Send + Sync>,
    ) -> Self {
        Self {
            race_data,
            predictions,
            evaluator: PredictionEvaluator::new(),
            run_lock: AsyncMutex::new(()),
        }
    }

    pub fn with_evaluator(mut self, evaluator: PredictionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    async fn cached_race(&self, year: i32, round: u32) -> Result<RaceTelemetry, ScoringError> {
        self.race_data
            .cached_telemetry(year, round)
            .await?
            .ok_or(ScoringError::RaceNotCached { year, round })
    }

    async fn pending(&self, race_id: Option<i64>) -> Result<Vec<PredictionModel>, ScoringError> {
        let mut pending = self
            .predictions
            .list_by_status(PredictionStatus::Pending)
            .await?;
        if let Some(race_id) = race_id {
            pending.retain(|p| p.race_id == Some(race_id));
        }
        Ok(pending)
    }

    #[instrument(skip(self, request), fields(year = request.year, round = request.round))]
    pub async fn score_race(&self, request: &ScoreRaceRequest) -> Result<ScoreSummary, ScoringError> {
        let _run = self.run_lock.lock().await;
        let started = Instant::now();

        let race = self.cached_race(request.year, request.round).await?;
        let registry = PitStopRegistry::build(&race);
        let participants = race.driver_codes();
        debug!(
            drivers = participants.len(),
            pit_stops = registry.total_stops(),
            "Pit stop registry built"
        );

        let pending = self.pending(request.race_id).await?;
        let mut summary = ScoreSummary {
            race: race.display_name(),
            total_pending: pending.len(),
            ..ScoreSummary::default()
        };
        if pending.is_empty() {
            info!("No pending predictions to score");
            return Ok(summary);
        }

        let outcomes: Vec<ScoredPrediction> = pending
            .iter()
            .map(|prediction| {
                let evaluation = self.evaluator.evaluate(prediction, &registry, &participants);
                ScoredPrediction {
                    prediction_id: prediction.id.clone(),
                    status: evaluation.status,
                    points_earned: evaluation.points,
                }
            })
            .collect();

        for outcome in &outcomes {
            match outcome.status {
                PredictionStatus::Correct => summary.correct += 1,
                PredictionStatus::Wrong => summary.wrong += 1,
                PredictionStatus::Skipped => summary.skipped += 1,
                PredictionStatus::Pending => {}
            }
        }
        summary.scored = summary.correct + summary.wrong;

        let aggregates = self.predictions.commit_scoring(outcomes).await?;
        summary.users_updated = aggregates.len();

        info!(
            race = %summary.race,
            total_pending = summary.total_pending,
            correct = summary.correct,
            wrong = summary.wrong,
            skipped = summary.skipped,
            users_updated = summary.users_updated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Race scored"
        );

        Ok(summary)
    }

    pub async fn status(&self) -> Result<StatusCounts, ScoringError> {
        let counts = self.predictions.count_by_status().await?;
        let count = |status: PredictionStatus| counts.get(&status).copied().unwrap_or(0);

        let status = StatusCounts {
            pending: count(PredictionStatus::Pending),
            correct: count(PredictionStatus::Correct),
            wrong: count(PredictionStatus::Wrong),
            skipped: count(PredictionStatus::Skipped),
            total: counts.values().sum(),
        };
        Ok(status)
    }

    #[instrument(skip(self))]
    pub async fn preview(&self, year: i32, round: u32) -> Result<ScoringPreview, ScoringError> {
        let race = self.cached_race(year, round).await?;
        let pending = self.pending(None).await?;

        Ok(ScoringPreview {
            race: race.display_name(),
            total_laps: race.total_laps,
            pending_to_score: pending.len(),
            pit_stops: PitStopRegistry::build(&race),
        })
    }
}
