//! The shared-bank, multi-ticker portfolio state the simulation engine
//! mutates over the daily loop.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::holding::Holding;

/// A single day's recorded value.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Calendar day.
    pub date: NaiveDate,
    /// Recorded value on that day.
    pub value: f64,
}

/// Portfolio state: one shared cash pool traversed by every ticker's BUY
/// cost and SELL proceeds, plus the per-ticker holdings and the daily value
/// series recorded by the engine.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    /// Per-ticker holdings, including the reserved `"CASH"` pseudo-ticker
    /// when present in the allocation (which never appears here as a real
    /// holding — CASH is folded directly into `bank` and never gets a
    /// `Holding` entry).
    pub holdings: HashMap<String, Holding>,
    /// The single shared cash pool. Signed: may go negative only when
    /// margin is allowed.
    pub bank: f64,
    /// `bank + Σ(shares × close_price)` recorded once per simulated day,
    /// after all same-day transactions have been applied.
    pub daily_portfolio_values: Vec<DailyPoint>,
    /// `bank` recorded once per simulated day, alongside
    /// `daily_portfolio_values`.
    pub daily_bank_values: Vec<DailyPoint>,
}

impl Portfolio {
    /// Create a new portfolio seeded with `initial_bank`.
    pub fn new(initial_bank: f64) -> Self {
        Self {
            holdings: HashMap::new(),
            bank: initial_bank,
            daily_portfolio_values: Vec::new(),
            daily_bank_values: Vec::new(),
        }
    }

    /// Get or create the holding for `ticker`.
    pub fn holding_mut(&mut self, ticker: &str) -> &mut Holding {
        self.holdings
            .entry(ticker.to_string())
            .or_insert_with(|| Holding::new(ticker))
    }

    /// Total portfolio value: bank plus the market value of every holding
    /// at the price given in `closes` (tickers missing from `closes` are
    /// valued at zero for that day — used when a ticker isn't active on the
    /// master timeline for a given bar).
    pub fn total_value(&self, closes: &HashMap<String, f64>) -> f64 {
        self.bank
            + self
                .holdings
                .values()
                .map(|h| {
                    closes
                        .get(&h.ticker)
                        .map(|&p| h.current_value(p))
                        .unwrap_or(0.0)
                })
                .sum::<f64>()
    }

    /// Record today's snapshot. Must be called once per simulated day,
    /// after all same-day transactions have been applied.
    pub fn snapshot(&mut self, date: NaiveDate, closes: &HashMap<String, f64>) {
        let value = self.total_value(closes);
        self.daily_portfolio_values.push(DailyPoint { date, value });
        self.daily_bank_values.push(DailyPoint {
            date,
            value: self.bank,
        });
    }

    /// Lowest bank balance recorded across the run (including `t0`'s seed).
    pub fn min_bank(&self) -> f64 {
        self.daily_bank_values
            .iter()
            .map(|p| p.value)
            .fold(self.bank, f64::min)
    }

    /// Highest bank balance recorded across the run.
    pub fn max_bank(&self) -> f64 {
        self.daily_bank_values
            .iter()
            .map(|p| p.value)
            .fold(self.bank, f64::max)
    }
}
