use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use strum_macros::{AsRefStr, EnumIter, EnumString};

/// Short driver code (e.g. `VER`). Always stored upper-case, whatever case
/// the upstream source or a user submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DriverCode(String);

impl DriverCode {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for DriverCode {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for DriverCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<DriverCode> for String {
    fn from(code: DriverCode) -> Self {
        code.0
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tire compound label. Anything the upstream reports that is not a known
/// compound collapses to `Unknown`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, EnumIter,
)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl TireCompound {
    pub fn from_label(label: &str) -> Self {
        label.trim().parse().unwrap_or(TireCompound::Unknown)
    }
}

impl From<String> for TireCompound {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<TireCompound> for String {
    fn from(compound: TireCompound) -> Self {
        compound.as_ref().to_string()
    }
}

impl fmt::Display for TireCompound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

fn unknown_compound() -> TireCompound {
    TireCompound::Unknown
}

/// One driver's state on one lap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLapRecord {
    pub driver: DriverCode,
    #[serde(default)]
    pub team: String,
    /// Absent when the driver did not complete the lap
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default = "unknown_compound")]
    pub compound: TireCompound,
    #[serde(default)]
    pub tire_life: u32,
    /// Entered the pit lane at the end of this lap
    #[serde(default)]
    pub pit_in: bool,
    /// Left the pit lane at the start of this lap
    #[serde(default)]
    pub pit_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub lap_number: u32,
    /// Ordered by position
    #[serde(default)]
    pub drivers: Vec<DriverLapRecord>,
}

/// Processed lap-by-lap telemetry for one race. Written once by the
/// producer and replaced wholesale on re-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceTelemetry {
    pub year: i32,
    pub round: u32,
    pub name: String,
    pub circuit: String,
    pub date: String,
    pub total_laps: u32,
    #[serde(default)]
    pub laps: Vec<LapRecord>,
}

impl RaceTelemetry {
    /// Every driver code that appears on any lap
    pub fn driver_codes(&self) -> BTreeSet<DriverCode> {
        self.laps
            .iter()
            .flat_map(|lap| lap.drivers.iter().map(|d| d.driver.clone()))
            .collect()
    }

    /// Lap by 1-based lap number
    pub fn lap(&self, lap_number: u32) -> Option<&LapRecord> {
        if lap_number == 0 {
            return None;
        }
        self.laps.get(lap_number as usize - 1)
    }

    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{} R{}", self.year, self.round)
        } else {
            self.name.clone()
        }
    }

    /// Finishing order: drivers who completed more laps rank ahead, then by
    /// the position held on their last recorded lap. Drivers never given a
    /// position are not classified.
    pub fn classification(&self) -> Vec<DriverCode> {
        let mut last_seen: HashMap<&DriverCode, (u32, u32)> = HashMap::new();
        for lap in &self.laps {
            for record in &lap.drivers {
                let Some(position) = record.position else {
                    continue;
                };
                let seen = last_seen
                    .entry(&record.driver)
                    .or_insert((lap.lap_number, position));
                if lap.lap_number >= seen.0 {
                    *seen = (lap.lap_number, position);
                }
            }
        }

        let mut order: Vec<(&DriverCode, (u32, u32))> = last_seen.into_iter().collect();
        order.sort_by(|(a, (a_lap, a_pos)), (b, (b_lap, b_pos))| {
            b_lap.cmp(a_lap).then(a_pos.cmp(b_pos)).then(a.cmp(b))
        });
        order.into_iter().map(|(driver, _)| driver.clone()).collect()
    }

    pub fn summary(&self) -> RaceSummary {
        let podium: Vec<DriverCode> = self.classification().into_iter().take(3).collect();
        RaceSummary {
            year: self.year,
            round: self.round,
            name: self.display_name(),
            date: self.date.clone(),
            winner: podium.first().cloned(),
            podium,
        }
    }
}

/// Headline result of a race without the lap data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSummary {
    pub year: i32,
    pub round: u32,
    pub name: String,
    pub date: String,
    pub winner: Option<DriverCode>,
    pub podium: Vec<DriverCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

/// Track outline used by the replay view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitLayout {
    pub year: i32,
    pub round: u32,
    pub circuit: String,
    #[serde(default)]
    pub coordinates: Vec<TrackPoint>,
}
