use pitlane::telemetry::{DriverCode, DriverLapRecord, LapRecord, RaceTelemetry, TireCompound};

// ============================================================================
// Race fixtures
// ============================================================================

struct Stint {
    driver: String,
    start: TireCompound,
    stops: Vec<(u32, TireCompound)>,
}

/// Builds lap-by-lap telemetry from a list of drivers and their stops. A
/// stop on lap N sets `pit_in` on N and `pit_out` with the new compound on N+1.
pub struct RaceBuilder {
    year: i32,
    round: u32,
    name: String,
    total_laps: u32,
    stints: Vec<Stint>,
}

impl RaceBuilder {
    pub fn new(year: i32, round: u32) -> Self {
        Self {
            year,
            round,
            name: format!("Round {} Grand Prix", round),
            total_laps: 30,
            stints: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn laps(mut self, total_laps: u32) -> Self {
        self.total_laps = total_laps;
        self
    }

    pub fn driver(mut self, code: &str, start: TireCompound, stops: &[(u32, TireCompound)]) -> Self {
        self.stints.push(Stint {
            driver: code.to_string(),
            start,
            stops: stops.to_vec(),
        });
        self
    }

    /// The reference grid: VER one-stops on lap 20 for mediums, HAM
    /// two-stops (hards on 15, softs on 40), NOR never pits
    pub fn with_standard_grid(self) -> Self {
        self.laps(57)
            .driver("VER", TireCompound::Soft, &[(20, TireCompound::Medium)])
            .driver(
                "HAM",
                TireCompound::Medium,
                &[(15, TireCompound::Hard), (40, TireCompound::Soft)],
            )
            .driver("NOR", TireCompound::Hard, &[])
    }

    pub fn build(self) -> RaceTelemetry {
        let laps = (1..=self.total_laps)
            .map(|lap_number| LapRecord {
                lap_number,
                drivers: self
                    .stints
                    .iter()
                    .enumerate()
                    .map(|(index, stint)| {
                        let compound = stint
                            .stops
                            .iter()
                            .filter(|(lap_in, _)| lap_number > *lap_in)
                            .last()
                            .map(|(_, compound)| *compound)
                            .unwrap_or(stint.start);

                        DriverLapRecord {
                            driver: DriverCode::new(&stint.driver),
                            team: "Test Team".to_string(),
                            position: Some(index as u32 + 1),
                            compound,
                            tire_life: lap_number,
                            pit_in: stint.stops.iter().any(|(lap_in, _)| *lap_in == lap_number),
                            pit_out: stint
                                .stops
                                .iter()
                                .any(|(lap_in, _)| lap_in + 1 == lap_number),
                            lap_time: None,
                            avg_speed: None,
                            max_speed: None,
                            distance: None,
                        }
                    })
                    .collect(),
            })
            .collect();

        RaceTelemetry {
            year: self.year,
            round: self.round,
            name: self.name,
            circuit: "Test Circuit".to_string(),
            date: format!("{}-01-01", self.year),
            total_laps: self.total_laps,
            laps,
        }
    }
}
