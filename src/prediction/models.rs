use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::telemetry::{DriverCode, TireCompound};

/// What the user expects the driver to do
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PredictionAction {
    PitSoft,
    PitMedium,
    PitHard,
    StayOut,
    /// Stored value outside the known set; always scored as wrong
    Unrecognized(String),
}

impl PredictionAction {
    pub fn as_str(&self) -> &str {
        match self {
            PredictionAction::PitSoft => "pit_soft",
            PredictionAction::PitMedium => "pit_medium",
            PredictionAction::PitHard => "pit_hard",
            PredictionAction::StayOut => "stay_out",
            PredictionAction::Unrecognized(raw) => raw,
        }
    }

    /// Compound a pit action expects to be fitted
    pub fn target_compound(&self) -> Option<TireCompound> {
        match self {
            PredictionAction::PitSoft => Some(TireCompound::Soft),
            PredictionAction::PitMedium => Some(TireCompound::Medium),
            PredictionAction::PitHard => Some(TireCompound::Hard),
            _ => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PredictionAction::Unrecognized(_))
    }
}

impl FromStr for PredictionAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pit_soft" => PredictionAction::PitSoft,
            "pit_medium" => PredictionAction::PitMedium,
            "pit_hard" => PredictionAction::PitHard,
            "stay_out" => PredictionAction::StayOut,
            _ => PredictionAction::Unrecognized(s.to_string()),
        })
    }
}

impl From<String> for PredictionAction {
    fn from(raw: String) -> Self {
        match raw.parse() {
            Ok(action) => action,
            Err(never) => match never {},
        }
    }
}

impl From<PredictionAction> for String {
    fn from(action: PredictionAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for PredictionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `pending` is the only non-terminal state
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PredictionStatus {
    Pending,
    Correct,
    Wrong,
    Skipped,
}

impl PredictionStatus {
    /// Counted in the accuracy denominator
    pub fn is_scored(&self) -> bool {
        matches!(self, PredictionStatus::Correct | PredictionStatus::Wrong)
    }
}

/// Database model for predictions table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionModel {
    pub id: String,
    pub user_id: String,
    pub race_id: Option<i64>,
    pub driver: DriverCode,
    pub action: PredictionAction,
    /// 0 means no specific lap
    pub predicted_lap: i32,
    pub confidence: i32,
    pub status: PredictionStatus,
    pub points_earned: i64,
    pub created_at: DateTime<Utc>,
}

impl PredictionModel {
    /// Creates a pending prediction with a generated ID
    pub fn new(
        user_id: String,
        race_id: Option<i64>,
        driver: DriverCode,
        action: PredictionAction,
        predicted_lap: i32,
        confidence: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            race_id,
            driver,
            action,
            predicted_lap,
            confidence,
            status: PredictionStatus::Pending,
            points_earned: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PredictionStatus::Pending
    }
}
