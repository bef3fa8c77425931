//! Configuration system for the strata terrain engine.
//!
//! Provides runtime-configurable terrain settings that persist to disk as RON
//! files. Supports CLI overrides via clap and hot-reload detection. Raw values
//! are validated into [`TerrainSettings`] before the terrain is built.

mod cli;
mod config;
mod error;
mod settings;

pub use cli::CliArgs;
pub use config::{CacheConfig, DebugConfig, DemoConfig, StrataConfig, TerrainConfig};
pub use error::ConfigError;
pub use settings::TerrainSettings;

/// Resolve the default configuration directory for strata tools.
///
/// Falls back to the current directory when the platform has no config dir.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("strata")
}
