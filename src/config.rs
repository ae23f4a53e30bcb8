//! Configuration management
//!
//! Handles loading and parsing of JSON configuration files with environment
//! variable overrides. Every section has defaults, so a partial file (or no
//! file at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::Symbol;

/// Shortest lookback window accepted, in minutes
pub const MIN_LOOKBACK_MINUTES: u32 = 5;
/// Longest lookback window accepted (one day), in minutes
pub const MAX_LOOKBACK_MINUTES: u32 = 1440;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("MOMENTUM_UNIVERSE_PATH") {
            self.universe.path = PathBuf::from(path);
        }
        if let Ok(lookback) = std::env::var("MOMENTUM_LOOKBACK_MINUTES") {
            self.ranking.lookback_minutes = lookback
                .parse()
                .context("MOMENTUM_LOOKBACK_MINUTES must be a whole number of minutes")?;
        }
        if let Ok(base_url) = std::env::var("MOMENTUM_SOURCE_BASE_URL") {
            self.source.base_url = base_url;
        }
        Ok(())
    }
}

/// Where the ticker universe comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// CSV file with a `ticker` column
    pub path: PathBuf,
    /// Used whenever the file cannot be read
    pub fallback: Vec<String>,
    /// How long a loaded universe is reused; 0 disables caching
    pub cache_ttl_secs: u64,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        UniverseConfig {
            path: PathBuf::from("data/tsx_tickers.csv"),
            fallback: vec![
                "BNS.TO".to_string(),
                "RY.TO".to_string(),
                "TD.TO".to_string(),
                "BMO.TO".to_string(),
                "ENB.TO".to_string(),
            ],
            cache_ttl_secs: 60,
        }
    }
}

impl UniverseConfig {
    pub fn fallback_symbols(&self) -> Vec<Symbol> {
        self.fallback.iter().map(Symbol::new).collect()
    }
}

/// Parameters of a ranking run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub lookback_minutes: u32,
    /// Symbols fetched at the same time
    pub max_concurrency: usize,
    /// Budget for one symbol's fetch (both tiers) and score
    pub symbol_timeout_secs: u64,
    /// Stop waiting for stragglers after this long and rank what completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_deadline_secs: Option<u64>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            lookback_minutes: 60,
            max_concurrency: 8,
            symbol_timeout_secs: 20,
            run_deadline_secs: None,
        }
    }
}

impl RankingConfig {
    /// Check the lookback bounds and the pool parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_lookback(self.lookback_minutes)?;
        if self.max_concurrency == 0 {
            return Err(ConfigError::Zero("max_concurrency"));
        }
        if self.symbol_timeout_secs == 0 {
            return Err(ConfigError::Zero("symbol_timeout_secs"));
        }
        Ok(())
    }

    pub fn symbol_timeout(&self) -> Duration {
        Duration::from_secs(self.symbol_timeout_secs)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

/// Reject lookback windows outside [MIN_LOOKBACK_MINUTES, MAX_LOOKBACK_MINUTES]
pub fn validate_lookback(minutes: u32) -> Result<(), ConfigError> {
    if !(MIN_LOOKBACK_MINUTES..=MAX_LOOKBACK_MINUTES).contains(&minutes) {
        return Err(ConfigError::LookbackOutOfRange {
            value: minutes,
            min: MIN_LOOKBACK_MINUTES,
            max: MAX_LOOKBACK_MINUTES,
        });
    }
    Ok(())
}

/// Upstream market-data settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_per_sec: usize,
    /// Extra minutes requested before the lookback window on the primary tier
    pub primary_padding_minutes: i64,
    /// Width of the coarse fallback window
    pub fallback_window_days: i64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; momentum-ranker/0.1)".to_string(),
            rate_limit_per_sec: 5,
            primary_padding_minutes: 10,
            fallback_window_days: 2,
        }
    }
}

/// Settings only the report/binary reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub rows: usize,
    pub currency: String,
    /// Re-run cadence for the binary; 0 runs once
    pub refresh_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            rows: 20,
            currency: "CAD".to_string(),
            refresh_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ranking.lookback_minutes, 60);
        assert_eq!(config.universe.fallback.len(), 5);
        assert_eq!(config.universe.cache_ttl_secs, 60);
        assert!(config.ranking.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ranking": {{ "lookback_minutes": 15 }} }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.ranking.lookback_minutes, 15);
        assert_eq!(config.ranking.max_concurrency, 8);
        assert_eq!(config.display.currency, "CAD");
    }

    #[test]
    fn test_lookback_bounds() {
        assert!(validate_lookback(5).is_ok());
        assert!(validate_lookback(1440).is_ok());
        assert_eq!(
            validate_lookback(4),
            Err(ConfigError::LookbackOutOfRange {
                value: 4,
                min: 5,
                max: 1440
            })
        );
        assert!(validate_lookback(1441).is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let ranking = RankingConfig {
            max_concurrency: 0,
            ..RankingConfig::default()
        };
        assert_eq!(
            ranking.validate(),
            Err(ConfigError::Zero("max_concurrency"))
        );
    }
}
