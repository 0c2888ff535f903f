// Public API - what other modules can use
pub use handlers::{
    get_circuit_layout, get_lap, get_race_summary, get_race_telemetry, warm_cache, WarmRequest,
};
pub use models::{
    CircuitLayout, DriverCode, DriverLapRecord, LapRecord, RaceSummary, RaceTelemetry,
    TireCompound, TrackPoint,
};
pub use producer::{JsonFileProducer, RaceDataProducer};
pub use service::{LapLookupError, RaceDataService, WarmFailure, WarmReport};

// Internal modules
mod handlers;
pub mod models;
pub mod producer;
pub mod service;
