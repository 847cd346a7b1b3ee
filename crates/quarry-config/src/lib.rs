//! Configuration for the quarry importer.
//!
//! Settings persist to disk as `config.ron`. Missing fields fall back to
//! defaults so older files keep loading, and command-line flags override
//! whatever the file says.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, Config, ImportConfig, LogConfig};
pub use error::ConfigError;
