use super::super::{lap_distance, points::LAP_WINDOW, Judgement, PitEvent, PredictionRule};
use crate::prediction::{PredictionAction, PredictionModel};

/// `pit_soft` / `pit_medium` / `pit_hard`: the driver must have a stop onto
/// the named compound, within the lap window when a lap was predicted.
pub struct PitCompoundRule;

impl Default for PitCompoundRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PitCompoundRule {
    pub fn new() -> Self {
        Self
    }
}

impl PredictionRule for PitCompoundRule {
    fn handles(&self, action: &PredictionAction) -> bool {
        action.target_compound().is_some()
    }

    fn judge(&self, prediction: &PredictionModel, stops: &[PitEvent]) -> Judgement {
        let Some(target) = prediction.action.target_compound() else {
            return Judgement::wrong();
        };

        let mut on_target = stops.iter().filter(|stop| stop.new_compound == target);

        if prediction.predicted_lap == 0 {
            return if on_target.next().is_some() {
                Judgement::correct(None)
            } else {
                Judgement::wrong()
            };
        }

        // Closest stop wins so the lap bonus is deterministic
        on_target
            .map(|stop| lap_distance(stop.lap_in, prediction.predicted_lap))
            .filter(|diff| *diff <= LAP_WINDOW)
            .min()
            .map(|diff| Judgement::correct(Some(diff)))
            .unwrap_or_else(Judgement::wrong)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{DriverCode, TireCompound};

    fn prediction(action: PredictionAction, lap: i32) -> PredictionModel {
        PredictionModel::new(
            "user".into(),
            None,
            DriverCode::new("VER"),
            action,
            lap,
            80,
        )
    }

    fn stop(lap_in: u32, new_compound: TireCompound) -> PitEvent {
        PitEvent {
            lap_in,
            new_compound,
        }
    }

    #[test]
    fn handles_only_pit_actions() {
        let rule = PitCompoundRule::new();
        assert!(rule.handles(&PredictionAction::PitMedium));
        assert!(!rule.handles(&PredictionAction::StayOut));
        assert!(!rule.handles(&PredictionAction::Unrecognized("box".into())));
    }

    #[test]
    fn no_lap_matches_compound_anywhere() {
        let rule = PitCompoundRule::new();
        let stops = [stop(12, TireCompound::Hard), stop(44, TireCompound::Soft)];

        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitSoft, 0), &stops),
            Judgement::correct(None)
        );
        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitMedium, 0), &stops),
            Judgement::wrong()
        );
    }

    #[test]
    fn lap_window_is_inclusive() {
        let rule = PitCompoundRule::new();
        let stops = [stop(20, TireCompound::Medium)];

        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitMedium, 22), &stops),
            Judgement::correct(Some(2))
        );
        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitMedium, 23), &stops),
            Judgement::wrong()
        );
    }

    #[test]
    fn right_lap_wrong_compound_is_wrong() {
        let rule = PitCompoundRule::new();
        let stops = [stop(20, TireCompound::Hard)];

        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitMedium, 20), &stops),
            Judgement::wrong()
        );
    }

    #[test]
    fn picks_closest_matching_stop() {
        let rule = PitCompoundRule::new();
        let stops = [stop(18, TireCompound::Medium), stop(20, TireCompound::Medium)];

        assert_eq!(
            rule.judge(&prediction(PredictionAction::PitMedium, 20), &stops),
            Judgement::correct(Some(0))
        );
    }
}
