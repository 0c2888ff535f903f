// Public API - what other modules can use
pub use handlers::{get_leaderboard, get_user, register_user};
pub use models::UserModel;
pub use repository::UserRepository;
pub use service::UserService;
pub use types::{LeaderboardEntry, RegisterRequest, RegisterResponse, UserResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
