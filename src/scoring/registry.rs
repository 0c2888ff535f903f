use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::telemetry::{DriverCode, RaceTelemetry, TireCompound};

/// Lap offsets from a pit-in lap where the matching pit-out is searched, in
/// priority order: next lap, a slow stop spilling two laps, then same lap.
pub const PIT_OUT_OFFSETS: [u32; 3] = [1, 2, 0];

/// One reconstructed pit stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitEvent {
    pub lap_in: u32,
    pub new_compound: TireCompound,
}

/// Pit stops per driver, each list ordered by `lap_in`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitStopRegistry {
    events: BTreeMap<DriverCode, Vec<PitEvent>>,
}

impl PitStopRegistry {
    /// Pairs every `pit_in` flag with the compound from the nearest
    /// `pit_out` flag of the same driver. A pit-in with no pit-out in reach
    /// still counts as a stop, fitted with `Unknown`.
    pub fn build(telemetry: &RaceTelemetry) -> Self {
        let mut pit_ins: BTreeMap<DriverCode, Vec<u32>> = BTreeMap::new();
        let mut pit_outs: HashMap<DriverCode, HashMap<u32, TireCompound>> = HashMap::new();

        for lap in &telemetry.laps {
            for record in &lap.drivers {
                if record.pit_in {
                    pit_ins
                        .entry(record.driver.clone())
                        .or_default()
                        .push(lap.lap_number);
                }
                if record.pit_out {
                    pit_outs
                        .entry(record.driver.clone())
                        .or_default()
                        .insert(lap.lap_number, record.compound);
                }
            }
        }

        let events = pit_ins
            .into_iter()
            .map(|(driver, laps_in)| {
                let driver_outs = pit_outs.get(&driver);
                let stops = laps_in
                    .into_iter()
                    .map(|lap_in| PitEvent {
                        lap_in,
                        new_compound: driver_outs
                            .and_then(|outs| {
                                PIT_OUT_OFFSETS.iter().find_map(|offset| {
                                    let lap = lap_in.checked_add(*offset)?;
                                    outs.get(&lap).copied()
                                })
                            })
                            .unwrap_or(TireCompound::Unknown),
                    })
                    .collect();
                (driver, stops)
            })
            .collect();

        Self { events }
    }

    /// Stops for a driver; empty when the driver never pitted
    pub fn events_for(&self, driver: &DriverCode) -> &[PitEvent] {
        self.events.get(driver).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn drivers(&self) -> impl Iterator<Item = &DriverCode> {
        self.events.keys()
    }

    pub fn total_stops(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{DriverLapRecord, LapRecord};

    fn record(driver: &str, compound: TireCompound, pit_in: bool, pit_out: bool) -> DriverLapRecord {
        DriverLapRecord {
            driver: DriverCode::new(driver),
            team: String::new(),
            position: Some(1),
            compound,
            tire_life: 0,
            pit_in,
            pit_out,
            lap_time: None,
            avg_speed: None,
            max_speed: None,
            distance: None,
        }
    }

    fn race(laps: Vec<(u32, Vec<DriverLapRecord>)>) -> RaceTelemetry {
        RaceTelemetry {
            year: 2024,
            round: 1,
            name: "Test GP".to_string(),
            circuit: "Test".to_string(),
            date: "2024-03-02".to_string(),
            total_laps: laps.len() as u32,
            laps: laps
                .into_iter()
                .map(|(lap_number, drivers)| LapRecord {
                    lap_number,
                    drivers,
                })
                .collect(),
        }
    }

    fn soft(driver: &str) -> DriverLapRecord {
        record(driver, TireCompound::Soft, false, false)
    }

    #[test]
    fn pairs_pit_in_with_next_lap_pit_out() {
        let telemetry = race(vec![
            (19, vec![soft("VER")]),
            (20, vec![record("VER", TireCompound::Soft, true, false)]),
            (21, vec![record("VER", TireCompound::Medium, false, true)]),
        ]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("VER")),
            &[PitEvent {
                lap_in: 20,
                new_compound: TireCompound::Medium
            }]
        );
    }

    #[test]
    fn slow_stop_pairs_two_laps_later() {
        let telemetry = race(vec![
            (10, vec![record("ALO", TireCompound::Medium, true, false)]),
            (11, vec![]),
            (12, vec![record("ALO", TireCompound::Hard, false, true)]),
        ]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("ALO"))[0].new_compound,
            TireCompound::Hard
        );
    }

    #[test]
    fn next_lap_takes_priority_over_same_lap() {
        let telemetry = race(vec![
            (5, vec![record("SAI", TireCompound::Soft, true, true)]),
            (6, vec![record("SAI", TireCompound::Hard, false, true)]),
        ]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("SAI"))[0].new_compound,
            TireCompound::Hard
        );
    }

    #[test]
    fn same_lap_pit_out_used_as_last_resort() {
        let telemetry = race(vec![(
            5,
            vec![record("SAI", TireCompound::Intermediate, true, true)],
        )]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("SAI"))[0].new_compound,
            TireCompound::Intermediate
        );
    }

    #[test]
    fn unpaired_pit_in_becomes_unknown_compound() {
        let telemetry = race(vec![
            (56, vec![soft("HAM")]),
            (57, vec![record("HAM", TireCompound::Soft, true, false)]),
        ]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("HAM")),
            &[PitEvent {
                lap_in: 57,
                new_compound: TireCompound::Unknown
            }]
        );
    }

    #[test]
    fn pit_in_on_largest_lap_number_does_not_overflow() {
        let telemetry = race(vec![(
            u32::MAX,
            vec![record("OCO", TireCompound::Medium, true, true)],
        )]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("OCO")),
            &[PitEvent {
                lap_in: u32::MAX,
                new_compound: TireCompound::Medium
            }]
        );
    }

    #[test]
    fn pit_out_of_another_driver_is_ignored() {
        let telemetry = race(vec![
            (
                30,
                vec![
                    record("NOR", TireCompound::Medium, true, false),
                    soft("PIA"),
                ],
            ),
            (
                31,
                vec![
                    soft("NOR"),
                    record("PIA", TireCompound::Hard, false, true),
                ],
            ),
        ]);

        let registry = PitStopRegistry::build(&telemetry);

        assert_eq!(
            registry.events_for(&DriverCode::new("NOR"))[0].new_compound,
            TireCompound::Unknown
        );
        assert!(registry.events_for(&DriverCode::new("PIA")).is_empty());
    }

    #[test]
    fn multiple_stops_stay_in_lap_order() {
        let telemetry = race(vec![
            (15, vec![record("LEC", TireCompound::Soft, true, false)]),
            (16, vec![record("LEC", TireCompound::Hard, false, true)]),
            (40, vec![record("LEC", TireCompound::Hard, true, false)]),
            (41, vec![record("LEC", TireCompound::Medium, false, true)]),
        ]);

        let registry = PitStopRegistry::build(&telemetry);
        let stops = registry.events_for(&DriverCode::new("lec"));

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].lap_in, 15);
        assert_eq!(stops[1].lap_in, 40);
        assert_eq!(stops[1].new_compound, TireCompound::Medium);
        assert_eq!(registry.total_stops(), 2);
    }

    #[test]
    fn serializes_as_driver_map() {
        let telemetry = race(vec![
            (20, vec![record("VER", TireCompound::Soft, true, false)]),
            (21, vec![record("VER", TireCompound::Medium, false, true)]),
        ]);

        let json = serde_json::to_value(PitStopRegistry::build(&telemetry)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"VER": [{"lap_in": 20, "new_compound": "MEDIUM"}]})
        );
    }
}
