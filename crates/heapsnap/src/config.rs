//! Configuration Module - Scanner Parameters
//!
//! The scanner has very few knobs. Everything about object layout comes from
//! the `ObjectModel` provider; this only covers output bounds and policy.

use crate::scanner::RecurseMode;

/// Default byte bound for one escaped text value
///
/// 100 wide characters escape to at most 602 bytes, so the default never
/// trips for text the escaper produces itself.
pub const DEFAULT_ENCODE_LIMIT: usize = 1024;

/// Main configuration for a snapshot pass
///
/// # Examples
///
/// ```rust
/// use heapsnap::{RecurseMode, ScanConfig};
///
/// // Use default configuration
/// let config = ScanConfig::default();
///
/// // Dump every direct neighbour of each root
/// let config = ScanConfig {
///     recurse: RecurseMode::OneLayer,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Upper bound in bytes for one quoted, escaped text value
    ///
    /// Encoding that would exceed this aborts with `ScanError::EncodeOverflow`.
    /// Must be at least 2 (the empty string `""`).
    ///
    /// Default: 1024
    pub encode_limit: usize,

    /// Recursion policy used by `RecordEmitter::dump`
    ///
    /// Default: `RecurseMode::LeafOnly`
    pub recurse: RecurseMode,

    /// Log an event for every record written and every object excluded
    ///
    /// Dump start and end events from the `walk` helpers are logged either way.
    ///
    /// Default: false
    pub verbose: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            encode_limit: DEFAULT_ENCODE_LIMIT,
            recurse: RecurseMode::LeafOnly,
            verbose: false,
        }
    }
}

impl ScanConfig {
    /// Validate configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use heapsnap::ScanConfig;
    ///
    /// let config = ScanConfig {
    ///     encode_limit: 1,  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encode_limit < 2 {
            return Err(ConfigError::InvalidEncodeLimit(format!(
                "encode_limit must be >= 2, got {}",
                self.encode_limit
            )));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - HEAPSNAP_ENCODE_LIMIT
    /// - HEAPSNAP_RECURSE (`0`/`1`/`2` or `none`/`leaf`/`one-layer`)
    /// - HEAPSNAP_VERBOSE
    ///
    /// Unparseable values keep the default.
    ///
    /// # Examples
    ///
    /// ```bash
    /// export HEAPSNAP_ENCODE_LIMIT=4096
    /// export HEAPSNAP_RECURSE=one-layer
    /// export HEAPSNAP_VERBOSE=1
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HEAPSNAP_ENCODE_LIMIT") {
            if let Ok(limit) = val.parse::<usize>() {
                config.encode_limit = limit;
            }
        }

        if let Ok(val) = std::env::var("HEAPSNAP_RECURSE") {
            if let Ok(mode) = val.parse::<RecurseMode>() {
                config.recurse = mode;
            }
        }

        if let Ok(val) = std::env::var("HEAPSNAP_VERBOSE") {
            config.verbose = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid encode limit: {0}")]
    InvalidEncodeLimit(String),

    #[error("Invalid recurse mode: {0}")]
    InvalidRecurseMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encode_limit, 1024);
        assert_eq!(config.recurse, RecurseMode::LeafOnly);
        assert!(!config.verbose);
    }

    #[test]
    fn test_invalid_encode_limit() {
        let config = ScanConfig {
            encode_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfig {
            encode_limit: 2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("HEAPSNAP_ENCODE_LIMIT", "4096");
        std::env::set_var("HEAPSNAP_RECURSE", "one-layer");
        std::env::set_var("HEAPSNAP_VERBOSE", "true");
        let config = ScanConfig::from_env();
        assert_eq!(config.encode_limit, 4096);
        assert_eq!(config.recurse, RecurseMode::OneLayer);
        assert!(config.verbose);

        // Unparseable values keep the defaults
        std::env::set_var("HEAPSNAP_ENCODE_LIMIT", "lots");
        std::env::set_var("HEAPSNAP_RECURSE", "deep");
        std::env::set_var("HEAPSNAP_VERBOSE", "0");
        let config = ScanConfig::from_env();
        assert_eq!(config, ScanConfig::default());

        for var in ["HEAPSNAP_ENCODE_LIMIT", "HEAPSNAP_RECURSE", "HEAPSNAP_VERBOSE"] {
            std::env::remove_var(var);
        }
    }
}
