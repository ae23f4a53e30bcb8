//! Snapshot rendering for the command-line front end

use serde::Serialize;
use std::fmt::Write as _;

use crate::config::DisplayConfig;
use crate::planner::round_half_even;
use crate::{RankingOutcome, TopPick};

pub const NO_DATA_MESSAGE: &str = "No data available right now.";

/// One table row as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub ticker: String,
    pub score: f64,
    pub last_close: f64,
    pub close_past: f64,
}

/// First `limit` rows of the table, values rounded to 3 decimals
pub fn table_rows(outcome: &RankingOutcome, limit: usize) -> Vec<TableRow> {
    outcome
        .table()
        .map(|table| {
            table
                .rows()
                .iter()
                .take(limit)
                .map(|r| TableRow {
                    ticker: r.symbol.to_string(),
                    score: round_half_even(r.score, 3),
                    last_close: round_half_even(r.last, 3),
                    close_past: round_half_even(r.past, 3),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn render_top(out: &mut String, top: &TopPick, currency: &str) -> std::fmt::Result {
    writeln!(
        out,
        "Top Momentum Stock: {} ({:+.2}%)",
        top.result.symbol, top.result.score
    )?;
    writeln!(out, "Last Price: {:.2} {}", top.result.last, currency)?;
    writeln!(out, "Entry:      {:.2}", top.plan.entry)?;
    writeln!(out, "Stop-loss:  {:.2}", top.plan.stop)?;
    writeln!(out, "Target:     {:.2}", top.plan.target)
}

/// Human-readable report of a snapshot
pub fn render_text(outcome: &RankingOutcome, display: &DisplayConfig) -> String {
    let mut out = String::new();

    let Some(top) = outcome.top() else {
        out.push_str(NO_DATA_MESSAGE);
        out.push('\n');
        return out;
    };

    // Writing into a String cannot fail
    let _ = render_top(&mut out, top, &display.currency);
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>12} {:>12}",
        "ticker", "score", "last_close", "close_past"
    );
    for row in table_rows(outcome, display.rows) {
        let _ = writeln!(
            out,
            "{:<12} {:>10.3} {:>12.3} {:>12.3}",
            row.ticker, row.score, row.last_close, row.close_past
        );
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<&'a TopPick>,
    table: Vec<TableRow>,
    no_data: bool,
}

/// Machine-readable report of a snapshot
pub fn render_json(outcome: &RankingOutcome, display: &DisplayConfig) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        generated_at: chrono::Utc::now(),
        top: outcome.top(),
        table: table_rows(outcome, display.rows),
        no_data: outcome.is_no_data(),
    })
}
