//! Backing stores for users and predictions. Both implementations serve the
//! user and prediction repository traits from one place so a scoring commit
//! can update both tables atomically.

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
