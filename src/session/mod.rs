// Public API - what other modules can use
pub use middleware::{admin_auth, jwt_auth, ADMIN_KEY_HEADER};
pub use token::TokenConfig;
pub use types::SessionClaims;

// Internal modules
mod middleware;
mod token;
mod types;
