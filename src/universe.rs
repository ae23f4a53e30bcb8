//! Ticker universe loading
//!
//! Reads the symbols to rank from a CSV file with a `ticker` column. Any
//! failure falls back to a fixed list so a ranking run always has something
//! to evaluate.

use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::config::UniverseConfig;
use crate::error::UniverseLoadError;
use crate::Symbol;

const TICKER_COLUMN: &str = "ticker";
const MAX_CACHE_TTL_SECS: u64 = 86_400;

/// Read every value of the `ticker` column, in file order
pub fn read_ticker_csv(path: impl AsRef<Path>) -> Result<Vec<Symbol>, UniverseLoadError> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}') == TICKER_COLUMN)
        .ok_or(UniverseLoadError::MissingTickerColumn)?;

    let mut symbols = Vec::new();
    for record in reader.records() {
        let record = record?;
        match record.get(column) {
            Some(value) if !value.is_empty() => symbols.push(Symbol::new(value)),
            _ => continue,
        }
    }

    if symbols.is_empty() {
        return Err(UniverseLoadError::Empty);
    }
    Ok(symbols)
}

/// Supplies the symbol universe, with a short-lived cache
pub struct TickerUniverseProvider {
    path: PathBuf,
    fallback: Vec<Symbol>,
    ttl: Duration,
    cache: Mutex<Option<CachedUniverse>>,
}

struct CachedUniverse {
    symbols: Vec<Symbol>,
    loaded_at: DateTime<Utc>,
}

impl TickerUniverseProvider {
    pub fn new(path: impl Into<PathBuf>, fallback: Vec<Symbol>, ttl_seconds: i64) -> Self {
        TickerUniverseProvider {
            path: path.into(),
            fallback,
            ttl: Duration::seconds(ttl_seconds),
            cache: Mutex::new(None),
        }
    }

    pub fn from_config(config: &UniverseConfig) -> Self {
        let ttl = i64::try_from(config.cache_ttl_secs.min(MAX_CACHE_TTL_SECS)).unwrap_or(0);
        Self::new(config.path.clone(), config.fallback_symbols(), ttl)
    }

    /// Symbols to rank. Never fails: unreadable sources yield the fallback list.
    pub fn load_universe(&self) -> Vec<Symbol> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(cached) = cache.as_ref() {
            if Utc::now() - cached.loaded_at < self.ttl {
                debug!("Using cached universe of {} symbols", cached.symbols.len());
                return cached.symbols.clone();
            }
        }

        let symbols = match read_ticker_csv(&self.path) {
            Ok(symbols) => {
                debug!(
                    "Loaded {} symbols from {}",
                    symbols.len(),
                    self.path.display()
                );
                symbols
            }
            Err(e) => {
                warn!(
                    "Universe load from {} failed ({}), using {} fallback symbols",
                    self.path.display(),
                    e,
                    self.fallback.len()
                );
                self.fallback.clone()
            }
        };

        if self.ttl > Duration::zero() {
            *cache = Some(CachedUniverse {
                symbols: symbols.clone(),
                loaded_at: Utc::now(),
            });
        }
        symbols
    }

    /// Drop the cached universe so the next load reads the source again
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }
}
