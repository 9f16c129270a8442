//! Configuration validator for memwalk
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, ScannerConfig};
use crate::memory::charsets::Charset;
use tracing_subscriber::filter::LevelFilter;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        // A sliding walk needs a stride of at least one byte
        if scanner.min_buffer_size < 2 {
            return Err(ConfigError::Invalid(
                "Minimum buffer size must be at least 2".to_string(),
            ));
        }

        if scanner.workers == 0 {
            return Err(ConfigError::Invalid(
                "Scanner workers must be at least 1".to_string(),
            ));
        }

        if scanner.workers > 128 {
            return Err(ConfigError::Invalid(
                "Scanner workers cannot exceed 128".to_string(),
            ));
        }

        for tag in &scanner.charsets {
            tag.parse::<Charset>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        logging.level.parse::<LevelFilter>().map_err(|_| {
            ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error, off",
                logging.level
            ))
        })?;

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
