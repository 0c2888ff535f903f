use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Kind of artifact cached for a race. Each category gets its own key space
/// so a circuit layout never collides with the telemetry of the same round.
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
pub enum ArtifactCategory {
    Telemetry,
    CircuitLayout,
}

/// Identity of one cached artifact: `(year, round, category)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub year: i32,
    pub round: u32,
    pub category: ArtifactCategory,
}

impl CacheKey {
    pub fn new(year: i32, round: u32, category: ArtifactCategory) -> Self {
        Self {
            year,
            round,
            category,
        }
    }

    pub fn telemetry(year: i32, round: u32) -> Self {
        Self::new(year, round, ArtifactCategory::Telemetry)
    }

    pub fn circuit_layout(year: i32, round: u32) -> Self {
        Self::new(year, round, ArtifactCategory::CircuitLayout)
    }

    /// File name under which the finished artifact is published
    pub fn file_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_R{}_{}", self.year, self.round, self.category)
    }
}
