//! Time-series retrieval
//!
//! [`TimeSeriesSource`] is the seam to the market-data vendor: given a symbol,
//! a time range and a bar interval it returns raw closes. [`SeriesFetcher`]
//! layers the two-tier retrieval on top of any source: a fine-grained request
//! covering just the lookback window, then a wider, coarser request when the
//! first one fails or comes back empty. Minute bars are often missing for
//! thinly traded symbols and outside market hours.

pub mod yahoo;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::{PriceSeries, RawBar, Symbol};

pub use yahoo::YahooChartClient;

/// Bar granularity understood by the upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    OneMinute,
    TwoMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl Interval {
    /// Wire code, e.g. "1m"
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::TwoMinutes => "2m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream market-data query interface
#[allow(async_fn_in_trait)]
pub trait TimeSeriesSource {
    /// Closes for `symbol` between `start` and `end` at `interval` granularity
    async fn query(
        &self,
        symbol: &Symbol,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Interval,
    ) -> Result<Vec<RawBar>, FetchError>;
}

/// Result of fetching one symbol's history
#[derive(Debug)]
pub enum FetchOutcome {
    Success(PriceSeries),
    /// Both tiers answered but neither had a usable close
    EmptyNoData,
    /// The last tier tried failed outright
    TransportError(FetchError),
}

impl FetchOutcome {
    pub fn into_series(self) -> Option<PriceSeries> {
        match self {
            FetchOutcome::Success(series) => Some(series),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }
}

/// Windows and granularities of the two retrieval tiers
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub primary_interval: Interval,
    /// Requested on top of the lookback window so the cutoff bar is included
    pub primary_padding: Duration,
    pub fallback_interval: Interval,
    pub fallback_window: Duration,
}

impl Default for FetchPlan {
    fn default() -> Self {
        FetchPlan {
            primary_interval: Interval::OneMinute,
            primary_padding: Duration::minutes(10),
            fallback_interval: Interval::FiveMinutes,
            fallback_window: Duration::days(2),
        }
    }
}

impl FetchPlan {
    pub fn from_config(config: &SourceConfig) -> Self {
        FetchPlan {
            primary_padding: Duration::minutes(config.primary_padding_minutes.max(0)),
            fallback_window: Duration::days(config.fallback_window_days.max(1)),
            ..FetchPlan::default()
        }
    }
}

/// Two-tier retrieval over a [`TimeSeriesSource`]
pub struct SeriesFetcher<S> {
    source: S,
    plan: FetchPlan,
}

impl<S: TimeSeriesSource> SeriesFetcher<S> {
    pub fn new(source: S, plan: FetchPlan) -> Self {
        Self { source, plan }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch recent closes ending now
    pub async fn fetch(&self, symbol: &Symbol, lookback_minutes: u32) -> FetchOutcome {
        self.fetch_at(symbol, lookback_minutes, Utc::now()).await
    }

    /// Fetch recent closes ending at `now`
    pub async fn fetch_at(
        &self,
        symbol: &Symbol,
        lookback_minutes: u32,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        let primary_start =
            now - Duration::minutes(i64::from(lookback_minutes)) - self.plan.primary_padding;

        match self
            .source
            .query(symbol, primary_start, now, self.plan.primary_interval)
            .await
        {
            Ok(bars) => {
                let series = PriceSeries::from_raw(bars);
                if !series.is_empty() {
                    return FetchOutcome::Success(series);
                }
                debug!(
                    "{}: no {} bars in primary window, trying fallback",
                    symbol, self.plan.primary_interval
                );
            }
            Err(e) => {
                debug!("{}: primary request failed ({}), trying fallback", symbol, e);
            }
        }

        let fallback_start = now - self.plan.fallback_window;
        match self
            .source
            .query(symbol, fallback_start, now, self.plan.fallback_interval)
            .await
        {
            Ok(bars) => {
                let series = PriceSeries::from_raw(bars);
                if series.is_empty() {
                    debug!("{}: fallback returned no usable closes", symbol);
                    FetchOutcome::EmptyNoData
                } else {
                    FetchOutcome::Success(series)
                }
            }
            Err(e) => {
                warn!("{}: fallback request failed: {}", symbol, e);
                FetchOutcome::TransportError(e)
            }
        }
    }
}
