//! Tracing subscriber setup
//!
//! The library only emits `tracing` events; binaries and tests that want to
//! see them call [`init_logging`] once.

use crate::config::{ConfigError, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Builds the filter for `config`, letting `RUST_LOG` override the level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| ConfigError::Invalid(format!("Invalid log level {}: {}", config.level, e)))
}

/// Installs a global `fmt` subscriber.
///
/// Fails instead of panicking when a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = env_filter(config)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("Logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig {
            level: "warn".to_string(),
        };
        // Another test may have won the race for the global subscriber.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_filter_from_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter(&config).is_ok());
        }
    }
}
