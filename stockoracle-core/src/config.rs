//! Run configuration.
//!
//! Every field has a default matching the fixed S&P 500 / `getprices`
//! setup, so an empty TOML file (or no file at all) is a valid config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for one download run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    /// CSV of index constituents (`symbol,name,sector` with a header row).
    pub seed_path: PathBuf,

    /// Base URL of the price feed.
    pub endpoint: String,

    /// Sent as the `User-Agent` header.
    pub user_agent: String,

    /// Seconds represented by one offset unit in the feed.
    pub interval_secs: i64,

    /// Lookback window requested from the feed.
    pub period: String,

    pub request_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from("data/s&pConstituents.csv"),
            endpoint: "https://www.google.com/finance/getprices".into(),
            user_agent: "StockOracle".into(),
            interval_secs: 3600,
            period: "1Y".into(),
            request_timeout_secs: 30,
        }
    }
}

impl OracleConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Offsets are multiplied by the interval, so it must be positive for
    /// feed times to increase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs <= 0 {
            return Err(ConfigError::Invalid(format!(
                "interval_secs must be positive, got {}",
                self.interval_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let cfg = OracleConfig::from_toml("").unwrap();
        assert_eq!(cfg, OracleConfig::default());
        assert_eq!(cfg.interval_secs, 3600);
        assert_eq!(cfg.period, "1Y");
    }

    #[test]
    fn partial_override() {
        let cfg = OracleConfig::from_toml(
            r#"
            seed_path = "fixtures/tiny.csv"
            user_agent = "test-agent"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed_path, PathBuf::from("fixtures/tiny.csv"));
        assert_eq!(cfg.user_agent, "test-agent");
        assert_eq!(cfg.endpoint, OracleConfig::default().endpoint);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let result = OracleConfig::from_toml("interval_secs = \"hourly\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        for value in ["0", "-3600"] {
            let result = OracleConfig::from_toml(&format!("interval_secs = {value}"));
            assert!(
                matches!(result, Err(ConfigError::Invalid(_))),
                "interval_secs = {value} should be rejected"
            );
        }
        assert!(OracleConfig::from_toml("interval_secs = 60").is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = OracleConfig::from_file(Path::new("no/such/oracle.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
