// Public API - what other modules can use
pub use handlers::{create_prediction, list_my_predictions, list_race_predictions};
pub use models::{PredictionAction, PredictionModel, PredictionStatus};
pub use repository::{PredictionRepository, ScoredPrediction};
pub use service::PredictionService;
pub use types::{CreatePredictionRequest, CreatePredictionResponse, PredictionResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
