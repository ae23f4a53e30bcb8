//! Core data types used across the ranking pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instrument identifier using Arc<str> for cheap cloning
///
/// Symbols are cloned into every per-symbol task and every result row.
/// Using Arc<str> instead of String keeps each clone O(1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(#[serde(with = "arc_str_serde")] std::sync::Arc<str>);

/// Custom serde for Arc<str>
mod arc_str_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::sync::Arc;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Arc::from(s.as_str()))
    }
}

impl Symbol {
    pub fn new(s: impl AsRef<str>) -> Self {
        Symbol(std::sync::Arc::from(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

/// A bar as delivered by the upstream, before cleaning.
///
/// Vendors routinely emit rows with no close (halted minutes, partial
/// candles), so the close is optional here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub datetime: DateTime<Utc>,
    pub close: Option<f64>,
}

impl RawBar {
    pub fn new(datetime: DateTime<Utc>, close: Option<f64>) -> Self {
        Self { datetime, close }
    }
}

/// A single closing price at an instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub datetime: DateTime<Utc>,
    pub close: f64,
}

impl PricePoint {
    pub fn new(datetime: DateTime<Utc>, close: f64) -> Self {
        Self { datetime, close }
    }
}

/// Closing prices for one symbol.
///
/// Only usable closes (finite and positive) are ever stored. Points keep the
/// order they were delivered in; consumers derive recency from timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from raw bars, discarding rows without a usable close
    pub fn from_raw(bars: impl IntoIterator<Item = RawBar>) -> Self {
        let points = bars
            .into_iter()
            .filter_map(|bar| match bar.close {
                Some(close) if close.is_finite() && close > 0.0 => {
                    Some(PricePoint::new(bar.datetime, close))
                }
                _ => None,
            })
            .collect();
        Self { points }
    }

    /// Build a series from already-clean points
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        Self::from_raw(
            points
                .into_iter()
                .map(|p| RawBar::new(p.datetime, Some(p.close))),
        )
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Momentum of one symbol over the lookback window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub symbol: Symbol,
    /// Signed percentage change from `past` to `last`
    pub score: f64,
    pub last: f64,
    pub past: f64,
}

/// Entry, stop-loss and target derived from a reference price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
}

/// Results of one snapshot, highest score first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    rows: Vec<MomentumResult>,
}

impl RankedTable {
    /// Wrap rows that are already in rank order
    pub(crate) fn from_ranked(rows: Vec<MomentumResult>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MomentumResult] {
        &self.rows
    }

    pub fn top(&self) -> Option<&MomentumResult> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }
}

/// The rank-0 entry and its trade plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPick {
    pub result: MomentumResult,
    pub plan: TradePlan,
}

/// Outcome of a ranking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RankingOutcome {
    Ranked { table: RankedTable, top: TopPick },
    /// Every symbol in the universe failed or had no data
    NoDataAvailable,
}

impl RankingOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, RankingOutcome::NoDataAvailable)
    }

    pub fn table(&self) -> Option<&RankedTable> {
        match self {
            RankingOutcome::Ranked { table, .. } => Some(table),
            RankingOutcome::NoDataAvailable => None,
        }
    }

    pub fn top(&self) -> Option<&TopPick> {
        match self {
            RankingOutcome::Ranked { top, .. } => Some(top),
            RankingOutcome::NoDataAvailable => None,
        }
    }
}
