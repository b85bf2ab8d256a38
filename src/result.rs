//! The summary a backtest run produces: top-level performance, per-ticker
//! breakdown, and the daily value series for downstream charting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::portfolio::DailyPoint;

/// Per-ticker breakdown within a [`Summary`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TickerSummary {
    /// Shares held at the end of the run.
    pub final_holdings: i64,
    /// Market value of those shares at the final close.
    pub final_value: f64,
    /// Realized P/L across every closed lot portion.
    pub realized_pl: f64,
    /// Unrealized P/L on shares still open at the final close.
    pub unrealized_pl: f64,
    /// Number of transactions recorded for this ticker (including
    /// SKIPPED_BUY notes).
    pub transaction_count: usize,
}

/// Full output of a single backtest run.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Total portfolio value (bank + holdings) at the final close.
    pub final_value: f64,
    /// `final_value / initial_investment - 1`.
    pub total_return: f64,
    /// `total_return` compounded to a 365-day year over the run's span.
    pub annualized_return: f64,
    /// Per-ticker breakdown, keyed by ticker symbol.
    pub per_ticker: HashMap<String, TickerSummary>,
    /// Bank balance at the end of the run.
    pub final_bank: f64,
    /// Lowest bank balance observed across the run.
    pub min_bank: f64,
    /// Highest bank balance observed across the run.
    pub max_bank: f64,
    /// Total cash paid out across every scheduled withdrawal.
    pub total_withdrawn: f64,
    /// Total cash credited across every DIVIDEND transaction.
    pub total_dividends: f64,
    /// Total cash credited across every INTEREST transaction.
    pub total_interest: f64,
    /// Number of BUYs the margin policy skipped.
    pub skipped_buys: usize,
    /// This run's total return minus an internally-run buy-and-hold
    /// baseline's total return, over the same tickers and weights.
    pub volatility_alpha: f64,
    /// `total_dividends / total_withdrawn`, or `f64::INFINITY` when no
    /// withdrawals were ever scheduled.
    pub coverage_ratio: f64,
    /// Largest peak-to-trough decline in portfolio value across the run,
    /// as a positive percentage.
    pub max_drawdown_pct: f64,
    /// Longest run of trading days spent below a prior peak.
    pub max_drawdown_duration_days: u32,
    /// `bank + Σ(shares × close)` recorded once per simulated day.
    pub daily_portfolio_values: Vec<DailyPoint>,
    /// `bank` recorded once per simulated day.
    pub daily_bank_values: Vec<DailyPoint>,
}

impl Summary {
    /// Compute `max_drawdown_pct` and `max_drawdown_duration_days` from a
    /// daily value series.
    pub fn drawdown_stats(series: &[DailyPoint]) -> (f64, u32) {
        let mut peak = f64::MIN;
        let mut max_dd_pct = 0.0;
        let mut duration = 0u32;
        let mut max_duration = 0u32;

        for point in series {
            if point.value >= peak {
                peak = point.value;
                duration = 0;
            } else {
                duration += 1;
                let dd = (peak - point.value) / peak * 100.0;
                if dd > max_dd_pct {
                    max_dd_pct = dd;
                }
                max_duration = max_duration.max(duration);
            }
        }

        (max_dd_pct, max_duration)
    }

    /// Serialize to pretty-printed JSON, for callers persisting or
    /// transmitting a run's result.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a [`Summary`] previously produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
