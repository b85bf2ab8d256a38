//! Engine-wide run options: margin policy, withdrawal schedule, and cash
//! interest rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bar::BilSeries;
use crate::error::{EngineError, Result};

/// Options governing a single backtest run, independent of the algorithm
/// and ticker weights.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Whether a BUY that would drive the bank negative still executes
    /// (drawing on margin) rather than being skipped. A scheduled withdrawal
    /// that would otherwise force a FIFO share sale is likewise allowed to
    /// draw the bank negative instead.
    pub allow_margin: bool,
    /// Percentage of portfolio value withdrawn on each scheduled
    /// withdrawal date (0 disables withdrawals).
    pub withdrawal_rate_pct: f64,
    /// Days between scheduled withdrawals.
    pub withdrawal_frequency_days: u32,
    /// Annualized interest rate credited on a positive bank balance on a
    /// monthly cadence, pro-rated by the actual day count since the prior
    /// credit. Ignored when [`bil_series`](Self::bil_series) is set — the
    /// bill-equivalent-shares model takes priority. `None` disables flat-rate
    /// cash interest entirely.
    pub cash_interest_rate_pct: Option<f64>,
    /// A short-bill (e.g. BIL) price+coupon series standing in for a flat
    /// interest rate: on each coupon date, `bank / bil_price(d)` equivalent
    /// shares are credited at the coupon's per-unit rate. Only applies when
    /// `"CASH"` is present in the run's allocation.
    pub bil_series: Option<BilSeries>,
    /// A monthly CPI-style index, ascending by date, used to inflate
    /// scheduled withdrawal amounts by `cpi(d) / cpi(start)`. `None` leaves
    /// withdrawals at their nominal (non-inflated) amount.
    pub cpi_series: Option<Vec<(NaiveDate, f64)>>,
    /// Starting cash, before any initial allocation BUYs.
    pub initial_investment: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            allow_margin: false,
            withdrawal_rate_pct: 0.0,
            withdrawal_frequency_days: 30,
            cash_interest_rate_pct: None,
            bil_series: None,
            cpi_series: None,
            initial_investment: 1_000_000.0,
        }
    }
}

impl EngineOptions {
    /// Start a builder at the engine's defaults.
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }

    /// Validate the parameter combination, before the daily loop begins.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.withdrawal_rate_pct) {
            return Err(EngineError::config(
                "withdrawal_rate_pct",
                "must be within [0, 100]",
            ));
        }
        if self.withdrawal_frequency_days == 0 {
            return Err(EngineError::config(
                "withdrawal_frequency_days",
                "must be positive",
            ));
        }
        if let Some(rate) = self.cash_interest_rate_pct {
            if rate < 0.0 {
                return Err(EngineError::config(
                    "cash_interest_rate_pct",
                    "must be non-negative",
                ));
            }
        }
        if !(self.initial_investment > 0.0) {
            return Err(EngineError::config("initial_investment", "must be positive"));
        }
        Ok(())
    }
}

/// Fluent builder for [`EngineOptions`].
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct EngineOptionsBuilder {
    opts: EngineOptions,
}

impl EngineOptionsBuilder {
    /// Allow the shared bank to go negative on a BUY rather than skip it.
    pub fn allow_margin(mut self, allow: bool) -> Self {
        self.opts.allow_margin = allow;
        self
    }

    /// Set the per-withdrawal percentage of portfolio value.
    pub fn withdrawal_rate_pct(mut self, pct: f64) -> Self {
        self.opts.withdrawal_rate_pct = pct;
        self
    }

    /// Set the number of days between scheduled withdrawals.
    pub fn withdrawal_frequency_days(mut self, days: u32) -> Self {
        self.opts.withdrawal_frequency_days = days;
        self
    }

    /// Enable flat-rate cash interest at the given annualized percentage.
    pub fn cash_interest_rate_pct(mut self, pct: f64) -> Self {
        self.opts.cash_interest_rate_pct = Some(pct);
        self
    }

    /// Enable the BIL-style equivalent-shares interest model, superseding
    /// any flat [`cash_interest_rate_pct`](Self::cash_interest_rate_pct).
    pub fn bil_series(mut self, series: crate::bar::BilSeries) -> Self {
        self.opts.bil_series = Some(series);
        self
    }

    /// Inflate scheduled withdrawals by a monthly CPI-style index, given as
    /// ascending `(date, index_value)` pairs.
    pub fn cpi_series(mut self, series: Vec<(chrono::NaiveDate, f64)>) -> Self {
        self.opts.cpi_series = Some(series);
        self
    }

    /// Set the starting cash balance.
    pub fn initial_investment(mut self, amount: f64) -> Self {
        self.opts.initial_investment = amount;
        self
    }

    /// Finish the builder, validating the resulting options.
    pub fn build(self) -> Result<EngineOptions> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(EngineOptions::default().validate().is_ok());
    }

    #[test]
    fn builder_produces_customized_options() {
        let opts = EngineOptions::builder()
            .allow_margin(true)
            .withdrawal_rate_pct(4.0)
            .withdrawal_frequency_days(90)
            .cash_interest_rate_pct(2.5)
            .initial_investment(250_000.0)
            .build()
            .unwrap();

        assert!(opts.allow_margin);
        assert_eq!(opts.withdrawal_rate_pct, 4.0);
        assert_eq!(opts.withdrawal_frequency_days, 90);
        assert_eq!(opts.cash_interest_rate_pct, Some(2.5));
        assert_eq!(opts.initial_investment, 250_000.0);
    }

    #[test]
    fn rejects_out_of_range_withdrawal_rate() {
        let err = EngineOptions::builder().withdrawal_rate_pct(150.0).build();
        assert!(err.is_err());
    }

    #[test]
    fn rejects_zero_withdrawal_frequency() {
        let err = EngineOptions::builder().withdrawal_frequency_days(0).build();
        assert!(err.is_err());
    }

    #[test]
    fn cpi_series_builder_stores_pairs() {
        use chrono::NaiveDate;
        let d = |day: u32| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let opts = EngineOptions::builder()
            .cpi_series(vec![(d(1), 100.0), (d(31), 100.3)])
            .build()
            .unwrap();
        assert_eq!(opts.cpi_series.as_ref().map(|s| s.len()), Some(2));
    }
}
