pub mod cli;
pub mod config;
pub mod logger;

pub use config::*;
pub use logger::*;
