//! Error types for the ranking pipeline

use std::time::Duration;

use thiserror::Error;

/// Failure to read the ticker universe.
///
/// Never escapes the universe provider; it is logged and the fallback list is
/// used instead.
#[derive(Debug, Error)]
pub enum UniverseLoadError {
    #[error("failed to open universe file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse universe file: {0}")]
    Csv(#[from] csv::Error),

    #[error("universe file has no 'ticker' column")]
    MissingTickerColumn,

    #[error("universe file contains no tickers")]
    Empty,
}

/// Failure of a single upstream time-series request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream error {code}: {description}")]
    Upstream { code: String, description: String },

    #[error("failed to decode upstream payload: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid base URL {0}")]
    InvalidBaseUrl(String),
}

/// Invalid engine parameters
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("lookback of {value} minutes is outside [{min}, {max}]")]
    LookbackOutOfRange { value: u32, min: u32, max: u32 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
