use thiserror::Error;

use crate::cache::CacheError;
use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Scoring never fetches; the race has to be warmed first
    #[error("Race not cached yet: {year} R{round}")]
    RaceNotCached { year: i32, round: u32 },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Scoring conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<AppError> for ScoringError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Conflict(msg) => ScoringError::Conflict(msg),
            other => ScoringError::Repository(other.to_string()),
        }
    }
}
