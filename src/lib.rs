//! Recipe Cache Library
//!
//! Rate limiting and caching core for the recipe app: a shared key-value
//! store abstraction, sliding-window request throttling and typed entity
//! caches, served over HTTP.

use shadow_rs::shadow;
shadow!(build);

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod rate_limit;
pub mod server;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
