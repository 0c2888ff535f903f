pub mod pit_stop;
pub mod stay_out;

pub use pit_stop::PitCompoundRule;
pub use stay_out::StayOutRule;
