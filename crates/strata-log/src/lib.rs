//! Structured logging for strata.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. The level comes from `RUST_LOG` when set, then from
//! the configuration's `debug.log_level`.

use std::path::Path;

use strata_config::StrataConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "strata.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is enabled
/// * `config` - optional configuration providing the log level
///
/// Calling this twice panics inside `tracing_subscriber`; use
/// [`try_init_logging`] where that can happen (tests, embedding hosts).
///
/// ```no_run
/// use strata_log::init_logging;
/// use strata_config::StrataConfig;
///
/// let config = StrataConfig::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&StrataConfig>) {
    if let Err(e) = try_init_logging(log_dir, debug_build, config) {
        eprintln!("logging already initialized: {e}");
    }
}

/// Fallible variant of [`init_logging`].
pub fn try_init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&StrataConfig>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_string(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        return subscriber.with(file_layer).try_init();
    }

    subscriber.try_init()
}

/// The filter directive taken from the config, or the default.
pub fn filter_string(config: Option<&StrataConfig>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// An `EnvFilter` with the default directive.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{filter}").contains("info"));
    }

    #[test]
    fn test_filter_from_config() {
        let mut config = StrataConfig::default();
        config.debug.log_level = "warn,strata_terrain=trace".to_string();
        assert_eq!(filter_string(Some(&config)), "warn,strata_terrain=trace");
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = StrataConfig::default();
        config.debug.log_level.clear();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,strata_lod=trace",
            "warn,strata_mesh=debug,strata_field=trace",
        ];
        for filter_str in &valid_filters {
            assert!(
                EnvFilter::try_from(*filter_str).is_ok(),
                "Failed to parse filter: {filter_str}"
            );
        }
    }

    #[test]
    fn test_second_init_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let _ = try_init_logging(Some(dir.path()), true, None);
        assert!(try_init_logging(None, false, None).is_err());
    }
}
