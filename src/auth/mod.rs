// Public API - what other modules can use
pub use handlers::{obtain_token, refresh_token, register};
pub use middleware::jwt_auth;
pub use token::TokenConfig;
pub use types::{TokenClaims, TokenType};

// Internal modules
mod handlers;
mod middleware;
pub mod models;
mod password;
pub mod repository;
pub mod service;
mod token;
pub mod types;
