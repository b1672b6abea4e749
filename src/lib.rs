// Library crate for the Blitz developer network API
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod auth;
pub mod config;
pub mod models;
pub mod resources;
pub mod schema;
pub mod shared;
pub mod store;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use config::AppConfig;
pub use shared::{AppError, AppState};
