use super::super::{lap_distance, points::LAP_WINDOW, Judgement, PitEvent, PredictionRule};
use crate::prediction::{PredictionAction, PredictionModel};

/// `stay_out`: with no lap, the driver must never pit; with a lap, no stop
/// may fall inside the window around it.
pub struct StayOutRule;

impl Default for StayOutRule {
    fn default() -> Self {
        Self::new()
    }
}

impl StayOutRule {
    pub fn new() -> Self {
        Self
    }
}

impl PredictionRule for StayOutRule {
    fn handles(&self, action: &PredictionAction) -> bool {
        *action == PredictionAction::StayOut
    }

    fn judge(&self, prediction: &PredictionModel, stops: &[PitEvent]) -> Judgement {
        let pitted = if prediction.predicted_lap == 0 {
            !stops.is_empty()
        } else {
            stops
                .iter()
                .any(|stop| lap_distance(stop.lap_in, prediction.predicted_lap) <= LAP_WINDOW)
        };

        if pitted {
            Judgement::wrong()
        } else {
            Judgement::correct(None)
        }
    }
}
