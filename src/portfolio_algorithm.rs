//! Portfolio-level composition of per-asset algorithms: either independent
//! per-ticker ladders, or a periodic rebalance toward target weights.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::algorithm::{Algorithm, AlgorithmInstance};
use crate::bar::OHLCBar;
use crate::error::Result;
use crate::transaction::Transaction;

/// How often [`PeriodicRebalance`] re-checks target weights.
///
/// A rebalance is due on a day whose calendar month falls in the
/// frequency's scheduled set *and* at least [`min_days_since_last`]
/// have elapsed since the previous rebalance — the exact rule spec.md §4.3
/// gives for the quarterly case (`month ∈ {3,6,9,12}`, `≥ 80 days`),
/// generalized to monthly/annual cadences.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceFrequency {
    /// Any month, at least ~25 days since the last rebalance.
    Monthly,
    /// Month ∈ {3, 6, 9, 12}, at least 80 days since the last rebalance.
    Quarterly,
    /// December only, at least ~350 days since the last rebalance.
    Annual,
}

impl RebalanceFrequency {
    fn month_due(self, date: NaiveDate) -> bool {
        match self {
            RebalanceFrequency::Monthly => true,
            RebalanceFrequency::Quarterly => matches!(date.month(), 3 | 6 | 9 | 12),
            RebalanceFrequency::Annual => date.month() == 12,
        }
    }

    fn min_days_since_last(self) -> i64 {
        match self {
            RebalanceFrequency::Monthly => 25,
            RebalanceFrequency::Quarterly => 80,
            RebalanceFrequency::Annual => 350,
        }
    }
}

/// A trait implemented by whatever decides the day's trades across the
/// whole portfolio, given each ticker's per-asset algorithm (if any) plus
/// portfolio-wide state the engine exposes.
pub trait PortfolioAlgorithm {
    /// Called once, after the initial BUYs, with each ticker's starting
    /// share count and price.
    fn on_new_holdings(&mut self, holdings: &HashMap<String, (i64, f64)>);

    /// Called once per simulated day with that day's bars (present tickers
    /// only), current share counts, and the portfolio's shared bank
    /// balance, returning the transactions to apply.
    fn on_day(
        &mut self,
        date: NaiveDate,
        bars: &HashMap<String, OHLCBar>,
        holdings: &HashMap<String, i64>,
        bank: f64,
    ) -> Result<Vec<Transaction>>;

    /// Called back by the engine once per proposed BUY, after the margin
    /// check has decided whether it actually executes. Lets a per-asset
    /// algorithm commit or roll back ladder state staged during `on_day`.
    /// Default no-op, since strategies that don't stage speculative state
    /// (e.g. [`PeriodicRebalance`]) have nothing to acknowledge.
    fn on_buy_result(&mut self, _ticker: &str, _executed: bool) {}
}

/// Each ticker runs its own [`AlgorithmInstance`] independently; the
/// composite never touches the bank or any other ticker's state.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct PerAssetComposite {
    instances: HashMap<String, AlgorithmInstance>,
}

impl PerAssetComposite {
    /// Build a composite from a ticker → algorithm assignment.
    pub fn new(assignments: HashMap<String, Algorithm>) -> Self {
        let instances = assignments
            .into_iter()
            .map(|(ticker, algo)| (ticker.clone(), AlgorithmInstance::new(algo, ticker)))
            .collect();
        Self { instances }
    }
}

impl PortfolioAlgorithm for PerAssetComposite {
    fn on_new_holdings(&mut self, holdings: &HashMap<String, (i64, f64)>) {
        for (ticker, inst) in self.instances.iter_mut() {
            if let Some(&(qty, price)) = holdings.get(ticker) {
                inst.on_new_holdings(qty, price);
            }
        }
    }

    fn on_day(
        &mut self,
        date: NaiveDate,
        bars: &HashMap<String, OHLCBar>,
        holdings: &HashMap<String, i64>,
        _bank: f64,
    ) -> Result<Vec<Transaction>> {
        let mut out = Vec::new();
        for (ticker, inst) in self.instances.iter_mut() {
            let Some(bar) = bars.get(ticker) else { continue };
            let h = holdings.get(ticker).copied().unwrap_or(0);
            out.extend(inst.on_day(date, bar, h)?);
        }
        Ok(out)
    }

    fn on_buy_result(&mut self, ticker: &str, executed: bool) {
        if let Some(inst) = self.instances.get_mut(ticker) {
            if executed {
                inst.on_buy_executed();
            } else {
                inst.on_buy_skipped();
            }
        }
    }
}

/// Periodically trims/tops-up each ticker back to its target weight,
/// ignoring moves below an absolute dollar threshold.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct PeriodicRebalance {
    frequency: RebalanceFrequency,
    target_weights: HashMap<String, f64>,
    /// Skip a rebalance trade worth less than this many dollars.
    pub no_trade_threshold: f64,
    last_rebalance_date: Option<NaiveDate>,
}

impl PeriodicRebalance {
    /// Build a periodic rebalance targeting `target_weights` (ticker →
    /// fraction of portfolio value, expected to sum to 1.0).
    pub fn new(frequency: RebalanceFrequency, target_weights: HashMap<String, f64>) -> Self {
        Self {
            frequency,
            target_weights,
            no_trade_threshold: 100.0,
            last_rebalance_date: None,
        }
    }
}

impl PortfolioAlgorithm for PeriodicRebalance {
    fn on_new_holdings(&mut self, _holdings: &HashMap<String, (i64, f64)>) {
        self.last_rebalance_date = None;
    }

    fn on_day(
        &mut self,
        date: NaiveDate,
        bars: &HashMap<String, OHLCBar>,
        holdings: &HashMap<String, i64>,
        bank: f64,
    ) -> Result<Vec<Transaction>> {
        let due = match self.last_rebalance_date {
            None => false,
            Some(last) => {
                self.frequency.month_due(date)
                    && (date - last).num_days() >= self.frequency.min_days_since_last()
            }
        };
        if self.last_rebalance_date.is_none() {
            self.last_rebalance_date = Some(date);
        }
        if !due {
            return Ok(Vec::new());
        }
        self.last_rebalance_date = Some(date);

        let total_value: f64 = bank
            + self
                .target_weights
                .keys()
                .filter_map(|t| {
                    let qty = holdings.get(t).copied().unwrap_or(0) as f64;
                    bars.get(t).map(|b| qty * b.close)
                })
                .sum::<f64>();

        let mut out = Vec::new();
        for (ticker, &weight) in &self.target_weights {
            let Some(bar) = bars.get(ticker) else { continue };
            let qty = holdings.get(ticker).copied().unwrap_or(0);
            let current_value = qty as f64 * bar.close;
            let target_value = total_value * weight;
            let delta_value = target_value - current_value;

            if delta_value.abs() < self.no_trade_threshold {
                continue;
            }

            let delta_qty = crate::rounding::round_half_to_even(delta_value / bar.close);
            if delta_qty > 0 {
                out.push(Transaction::buy(ticker.clone(), date, delta_qty, bar.close));
            } else if delta_qty < 0 {
                out.push(Transaction::sell(ticker.clone(), date, -delta_qty, bar.close));
            }
        }
        Ok(out)
    }
}
