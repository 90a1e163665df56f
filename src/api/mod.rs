//! HTTP API serving the search pipeline

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::Authenticator;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::build_app;
pub use server::serve_api;
