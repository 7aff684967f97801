// proxy module - chat-completion relay service

pub mod config;
pub mod error;
pub mod server;

pub mod handlers; // HTTP entry point
pub mod mappers; // Request shapes
pub mod middleware; // Axum middleware
pub mod upstream; // Upstream client

pub use config::RelayConfig;
pub use error::RelayError;
pub use server::{build_router, AppState, AxumServer};
