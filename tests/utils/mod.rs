pub mod fixtures;
pub mod producers;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use fixtures::RaceBuilder;
#[allow(unused_imports)]
pub use producers::{CountingProducer, FailingProducer};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
