pub mod aggregator;
pub mod evaluator;
pub mod registry;
pub mod rules;
pub mod service;

mod errors;
mod handlers;

pub use aggregator::{ScoreAggregator, UserAggregate};
pub use errors::ScoringError;
pub use evaluator::{calculate_points, Evaluation, PredictionEvaluator};
pub use handlers::{preview_scoring, score_race, scoring_status};
pub use registry::{PitEvent, PitStopRegistry};
pub use service::{ScoreRaceRequest, ScoreSummary, ScoringPreview, ScoringService, StatusCounts};

use crate::prediction::{PredictionAction, PredictionModel};

/// Scoring constants. Percentages keep the point arithmetic in integers so
/// `floor(confidence × 1.5 × multiplier)` is exact.
pub mod points {
    /// ± laps within which a pit prediction still counts
    pub const LAP_WINDOW: u32 = 2;
    /// Base award is 150% of confidence
    pub const BASE_PERCENT: i64 = 150;
    /// Bonus for the exact lap
    pub const EXACT_LAP_PERCENT: i64 = 125;
    /// Bonus for one lap off
    pub const CLOSE_LAP_PERCENT: i64 = 110;
    pub const NO_BONUS_PERCENT: i64 = 100;
}

/// Verdict of a single rule on one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub correct: bool,
    /// Distance between the predicted lap and the matching stop, when a lap was given
    pub lap_diff: Option<u32>,
}

impl Judgement {
    pub fn correct(lap_diff: Option<u32>) -> Self {
        Self {
            correct: true,
            lap_diff,
        }
    }

    pub fn wrong() -> Self {
        Self {
            correct: false,
            lap_diff: None,
        }
    }
}

/// Decides one family of actions against a driver's pit stops
pub trait PredictionRule: Send + Sync {
    fn handles(&self, action: &PredictionAction) -> bool;

    fn judge(&self, prediction: &PredictionModel, stops: &[PitEvent]) -> Judgement;
}

/// Absolute distance between an actual pit lap and a predicted one
pub fn lap_distance(lap_in: u32, predicted_lap: i32) -> u32 {
    (i64::from(lap_in) - i64::from(predicted_lap)).unsigned_abs() as u32
}
