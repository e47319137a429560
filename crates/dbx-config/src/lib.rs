//! # dbx Config
//!
//! Configuration management for dbx: a TOML file with `${VAR}` expansion,
//! overlaid by the `DBX_*` environment variables.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use schema::*;
