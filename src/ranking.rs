//! Ranking engine
//!
//! Fans out one fetch-and-score task per symbol, collects whatever succeeds,
//! and orders the results by score. Symbols that fail, time out or have no
//! data are left out of the table; they never abort the run.

use futures_util::stream::{self, StreamExt};
use std::pin::pin;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{validate_lookback, RankingConfig};
use crate::error::ConfigError;
use crate::planner;
use crate::scorer;
use crate::source::{FetchOutcome, FetchPlan, SeriesFetcher, TimeSeriesSource};
use crate::universe::TickerUniverseProvider;
use crate::{MomentumResult, RankedTable, RankingOutcome, Symbol, TopPick};

/// Order results by score, highest first.
///
/// Each result carries its position in the universe; equal scores keep
/// universe order regardless of the order results arrived in.
pub fn rank_results(mut results: Vec<(usize, MomentumResult)>) -> RankedTable {
    results.sort_by(|(ia, a), (ib, b)| b.score.total_cmp(&a.score).then(ia.cmp(ib)));
    RankedTable::from_ranked(results.into_iter().map(|(_, r)| r).collect())
}

/// Turn a ranked table into a run outcome, planning the top entry
pub fn finalize(table: RankedTable) -> RankingOutcome {
    match table.top().cloned() {
        Some(result) => {
            let plan = planner::derive(result.last);
            RankingOutcome::Ranked {
                table,
                top: TopPick { result, plan },
            }
        }
        None => RankingOutcome::NoDataAvailable,
    }
}

/// Scores a universe of symbols against a time-series source
pub struct RankingEngine<S> {
    fetcher: SeriesFetcher<S>,
    config: RankingConfig,
}

impl<S: TimeSeriesSource> RankingEngine<S> {
    pub fn new(source: S, plan: FetchPlan, config: RankingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(RankingEngine {
            fetcher: SeriesFetcher::new(source, plan),
            config,
        })
    }

    pub fn source(&self) -> &S {
        self.fetcher.source()
    }

    /// Rank `universe` by momentum over `lookback_minutes`.
    ///
    /// Only an out-of-range lookback is an error. A run where every symbol
    /// fails returns [`RankingOutcome::NoDataAvailable`].
    pub async fn run(
        &self,
        universe: &[Symbol],
        lookback_minutes: u32,
    ) -> Result<RankingOutcome, ConfigError> {
        validate_lookback(lookback_minutes)?;

        let started = Instant::now();
        let symbol_timeout = self.config.symbol_timeout();
        let deadline = self.config.run_deadline().map(|d| started + d);

        let mut pending = pin!(stream::iter(universe.iter().enumerate())
            .map(move |(index, symbol)| async move {
                let evaluated =
                    tokio::time::timeout(symbol_timeout, self.evaluate(symbol, lookback_minutes))
                        .await;
                (index, symbol, evaluated)
            })
            .buffer_unordered(self.config.max_concurrency));

        let mut collected = Vec::with_capacity(universe.len());
        let mut finished = 0usize;

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!(
                            "Run deadline reached with {}/{} symbols finished, ranking partial results",
                            finished,
                            universe.len()
                        );
                        break;
                    }
                },
                None => pending.next().await,
            };

            let Some((index, symbol, evaluated)) = next else {
                break;
            };
            finished += 1;

            match evaluated {
                Ok(Some(result)) => {
                    debug!(
                        "{}: score={:.3}% last={} past={}",
                        symbol, result.score, result.last, result.past
                    );
                    collected.push((index, result));
                }
                Ok(None) => debug!("{}: excluded, no usable data", symbol),
                Err(_) => warn!("{}: excluded, timed out after {:?}", symbol, symbol_timeout),
            }
        }

        let outcome = finalize(rank_results(collected));

        match &outcome {
            RankingOutcome::Ranked { table, top } => info!(
                "Ranked {}/{} symbols in {:?}, top {} at {:.2}%",
                table.len(),
                universe.len(),
                started.elapsed(),
                top.result.symbol,
                top.result.score
            ),
            RankingOutcome::NoDataAvailable => warn!(
                "No data available for any of {} symbols ({:?})",
                universe.len(),
                started.elapsed()
            ),
        }

        Ok(outcome)
    }

    /// Load the universe and rank it with the configured lookback
    pub async fn refresh(
        &self,
        provider: &TickerUniverseProvider,
    ) -> Result<RankingOutcome, ConfigError> {
        let universe = provider.load_universe();
        self.run(&universe, self.config.lookback_minutes).await
    }

    async fn evaluate(&self, symbol: &Symbol, lookback_minutes: u32) -> Option<MomentumResult> {
        match self.fetcher.fetch(symbol, lookback_minutes).await {
            FetchOutcome::Success(series) => scorer::score(symbol, &series, lookback_minutes),
            FetchOutcome::EmptyNoData => None,
            FetchOutcome::TransportError(e) => {
                debug!("{}: transport error: {}", symbol, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(symbol: &str, score: f64) -> MomentumResult {
        MomentumResult {
            symbol: Symbol::new(symbol),
            score,
            last: 100.0 + score,
            past: 100.0,
        }
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let table = rank_results(vec![
            (0, result("A", -1.0)),
            (1, result("B", 4.2)),
            (2, result("C", 0.0)),
        ]);
        assert_eq!(table.symbols(), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_ties_keep_universe_order() {
        let table = rank_results(vec![
            (0, result("A", 5.0)),
            (1, result("B", 5.0)),
            (2, result("C", 3.0)),
        ]);
        assert_eq!(table.symbols(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_ignore_completion_order() {
        let table = rank_results(vec![
            (2, result("C", 3.0)),
            (1, result("B", 5.0)),
            (0, result("A", 5.0)),
        ]);
        assert_eq!(table.symbols(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_finalize_plans_top_entry() {
        let outcome = finalize(rank_results(vec![(0, result("Y", 2.5))]));
        let top = outcome.top().unwrap();
        assert_eq!(top.result.symbol.as_str(), "Y");
        assert_eq!(top.plan, planner::derive(102.5));
    }

    #[test]
    fn test_finalize_empty_is_no_data() {
        assert!(finalize(rank_results(Vec::new())).is_no_data());
    }
}
