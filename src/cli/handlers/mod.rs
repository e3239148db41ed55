//! Command handlers for CLI operations

pub mod health;
pub mod serve;

pub use health::HealthCommandHandler;
pub use serve::ServeCommandHandler;
