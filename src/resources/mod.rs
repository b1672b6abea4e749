// Public API - what other modules can use
pub use routes::api_routes;
pub use service::ResourceService;

// Internal modules
mod handlers;
mod routes;
mod service;
