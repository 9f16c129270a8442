//! Default configuration values for memwalk

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub logging: LoggingDefaults,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub min_buffer_size: usize,
    pub workers: usize,
    pub charsets: Vec<String>,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Smallest walk buffer the searches use
pub const DEFAULT_MIN_BUFFER_SIZE: usize = 4096;

/// Worker threads for the parallel searches
pub fn default_workers() -> usize {
    num_cpus::get().clamp(1, 8)
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            min_buffer_size: DEFAULT_MIN_BUFFER_SIZE,
            workers: default_workers(),
            charsets: vec![
                "utf-8".to_string(),
                "utf-16-even".to_string(),
                "utf-16-odd".to_string(),
            ],
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_defaults() {
        let config = default_config();
        assert!(config.scanner.workers > 0);
        assert!(config.scanner.workers <= 8);
        assert_eq!(config.scanner.min_buffer_size, 4096);
        assert_eq!(config.scanner.charsets.len(), 3);
    }

    #[test]
    fn test_logging_defaults() {
        let config = default_config();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_serialization() {
        let config = default_config();
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("min_buffer_size"));
        assert!(serialized.contains("utf-16-odd"));

        let deserialized: ConfigDefaults = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.scanner.charsets, config.scanner.charsets);
        assert_eq!(deserialized.logging.level, config.logging.level);
    }
}
