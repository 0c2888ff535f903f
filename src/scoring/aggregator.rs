use serde::{Deserialize, Serialize};

use crate::prediction::{PredictionModel, PredictionStatus};

/// A user's totals, always derived from their complete prediction set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub user_id: String,
    pub total_score: i64,
    /// Percentage of correct among correct + wrong, one decimal place
    pub accuracy_rate: f64,
}

pub struct ScoreAggregator;

impl ScoreAggregator {
    /// Recomputes from scratch; pending and skipped predictions add no
    /// points and stay out of the accuracy denominator.
    pub fn aggregate<'a>(
        user_id: &str,
        predictions: impl IntoIterator<Item = &'a PredictionModel>,
    ) -> UserAggregate {
        let mut total_score = 0;
        let mut correct = 0u32;
        let mut scored = 0u32;

        for prediction in predictions {
            total_score += prediction.points_earned;
            if prediction.status.is_scored() {
                scored += 1;
                if prediction.status == PredictionStatus::Correct {
                    correct += 1;
                }
            }
        }

        UserAggregate {
            user_id: user_id.to_string(),
            total_score,
            accuracy_rate: accuracy_rate(correct, scored),
        }
    }
}

/// Percentage to one decimal, ties to even (6.25 -> 6.2). Worked in
/// integer tenths so ties are exact.
fn accuracy_rate(correct: u32, scored: u32) -> f64 {
    if scored == 0 {
        return 0.0;
    }
    let numerator = u64::from(correct) * 1000;
    let scored = u64::from(scored);
    let mut tenths = numerator / scored;
    let twice_remainder = (numerator % scored) * 2;
    if twice_remainder > scored || (twice_remainder == scored && tenths % 2 == 1) {
        tenths += 1;
    }
    tenths as f64 / 10.0
}
