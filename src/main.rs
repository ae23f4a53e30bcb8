//! Momentum ranker - command-line front end
//!
//! Runs one ranking snapshot (or one per refresh interval) and prints the top
//! pick, its trade plan and the ranked table.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use momentum_ranker::config::{validate_lookback, Config};
use momentum_ranker::ranking::RankingEngine;
use momentum_ranker::report;
use momentum_ranker::source::{FetchPlan, YahooChartClient};
use momentum_ranker::universe::TickerUniverseProvider;

#[derive(Parser, Debug)]
#[command(name = "momentum-ranker")]
#[command(about = "Rank equities by short-horizon momentum and plan the top trade", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Momentum lookback in minutes (5-1440)
    #[arg(short, long)]
    lookback: Option<u32>,

    /// CSV file with a `ticker` column
    #[arg(short, long)]
    universe: Option<PathBuf>,

    /// Re-run every N seconds (0 runs once)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Number of table rows to print
    #[arg(long)]
    rows: Option<usize>,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "rank_{}.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy HTTP crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,h2=warn",
        level
    );
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console goes to stderr so stdout stays clean for the report
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Log file: {}", log_path.display());
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(lookback) = cli.lookback {
        validate_lookback(lookback)?;
        config.ranking.lookback_minutes = lookback;
    }
    if let Some(universe) = &cli.universe {
        config.universe.path = universe.clone();
    }
    if let Some(refresh) = cli.refresh {
        config.display.refresh_secs = refresh;
    }
    if let Some(rows) = cli.rows {
        config.display.rows = rows;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let config = load_config(&cli)?;
    info!(
        "Lookback {} min, universe {}, refresh {}s",
        config.ranking.lookback_minutes,
        config.universe.path.display(),
        config.display.refresh_secs
    );

    let client = YahooChartClient::new(&config.source).context("Failed to build HTTP client")?;
    let engine = RankingEngine::new(
        client,
        FetchPlan::from_config(&config.source),
        config.ranking.clone(),
    )?;
    let provider = TickerUniverseProvider::from_config(&config.universe);

    loop {
        let outcome = engine.refresh(&provider).await?;

        if cli.json {
            println!("{}", report::render_json(&outcome, &config.display)?);
        } else {
            print!("{}", report::render_text(&outcome, &config.display));
        }

        if config.display.refresh_secs == 0 {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(config.display.refresh_secs)) => {}
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
