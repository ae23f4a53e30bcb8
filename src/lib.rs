//! Momentum Ranker
//!
//! Ranks a universe of exchange-listed equities by short-horizon price
//! momentum and derives a fixed-rule trade plan for the strongest one.
//!
//! ```no_run
//! use momentum_ranker::config::Config;
//! use momentum_ranker::ranking::RankingEngine;
//! use momentum_ranker::source::{FetchPlan, YahooChartClient};
//! use momentum_ranker::universe::TickerUniverseProvider;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let client = YahooChartClient::new(&config.source)?;
//!     let engine = RankingEngine::new(
//!         client,
//!         FetchPlan::from_config(&config.source),
//!         config.ranking.clone(),
//!     )?;
//!     let provider = TickerUniverseProvider::from_config(&config.universe);
//!
//!     if let Some(top) = engine.refresh(&provider).await?.top() {
//!         println!("{} {:.2}% stop {:.2}", top.result.symbol, top.result.score, top.plan.stop);
//!     }
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod planner;
pub mod ranking;
pub mod report;
pub mod scorer;
pub mod source;
pub mod types;
pub mod universe;

pub use config::Config;
pub use types::*;
