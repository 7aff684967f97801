pub mod error;
pub mod modules;
pub mod proxy; // Relay service module

pub use error::{AppError, AppResult};
pub use proxy::{AxumServer, RelayConfig};
