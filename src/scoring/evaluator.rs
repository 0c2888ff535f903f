use std::collections::BTreeSet;
use std::sync::Arc;

use super::{
    points,
    rules::{PitCompoundRule, StayOutRule},
    PitStopRegistry, PredictionRule,
};
use crate::prediction::{PredictionModel, PredictionStatus};
use crate::telemetry::DriverCode;

/// Terminal classification of one pending prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: PredictionStatus,
    pub lap_diff: Option<u32>,
    pub points: i64,
}

impl Evaluation {
    fn skipped() -> Self {
        Self {
            status: PredictionStatus::Skipped,
            lap_diff: None,
            points: 0,
        }
    }

    fn wrong() -> Self {
        Self {
            status: PredictionStatus::Wrong,
            lap_diff: None,
            points: 0,
        }
    }
}

/// `floor(confidence × 1.5 × multiplier)`; the multiplier rewards an exact
/// or one-off lap and is neutral otherwise, including when no lap was given.
pub fn calculate_points(confidence: i32, lap_diff: Option<u32>) -> i64 {
    let bonus = match lap_diff {
        Some(0) => points::EXACT_LAP_PERCENT,
        Some(1) => points::CLOSE_LAP_PERCENT,
        _ => points::NO_BONUS_PERCENT,
    };
    i64::from(confidence.max(0)) * points::BASE_PERCENT * bonus / 10_000
}

/// Classifies predictions against one race. Total over its input: unknown
/// actions come out `wrong`, absent drivers `skipped`, nothing is raised.
pub struct PredictionEvaluator {
    rules: Vec<Arc<dyn PredictionRule>>,
}

impl Default for PredictionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionEvaluator {
    pub fn new() -> Self {
        Self {
            rules: vec![Arc::new(PitCompoundRule::new()), Arc::new(StayOutRule::new())],
        }
    }

    pub fn with_rule(mut self, rule: Arc<dyn PredictionRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn evaluate(
        &self,
        prediction: &PredictionModel,
        registry: &PitStopRegistry,
        participants: &BTreeSet<DriverCode>,
    ) -> Evaluation {
        if !participants.contains(&prediction.driver) {
            return Evaluation::skipped();
        }

        let Some(rule) = self.rules.iter().find(|r| r.handles(&prediction.action)) else {
            return Evaluation::wrong();
        };

        let judgement = rule.judge(prediction, registry.events_for(&prediction.driver));
        if judgement.correct {
            Evaluation {
                status: PredictionStatus::Correct,
                lap_diff: judgement.lap_diff,
                points: calculate_points(prediction.confidence, judgement.lap_diff),
            }
        } else {
            Evaluation::wrong()
        }
    }
}
