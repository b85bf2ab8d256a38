//! The external market-data collaborator interface. This crate defines the
//! contract only — wiring up a concrete provider (a CSV loader, a vendor
//! API client, a cached store) is left to the caller.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::bar::{DividendEvent, OHLCBar};
use crate::error::Result;

/// Supplies daily OHLC bars and dividend events for the tickers a backtest
/// run needs.
///
/// Implementations are expected to return bars already restricted to
/// `[start, end]` and sorted ascending by date; the engine does not
/// re-sort or re-filter. Missing trading days for a given ticker are
/// treated as "ticker inactive that day", not an error.
pub trait PriceProvider {
    /// Fetch daily OHLC bars for `ticker` between `start` and `end`
    /// (inclusive), ascending by date.
    fn get_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<OHLCBar>>;

    /// Fetch dividend events for `ticker` between `start` and `end`
    /// (inclusive), ascending by date. Returns an empty vector for tickers
    /// that never pay dividends.
    fn get_dividends(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<DividendEvent>>;

    /// Convenience: fetch bars for every ticker in `tickers` at once. The
    /// default implementation calls [`get_prices`](Self::get_prices) per
    /// ticker; providers backed by a batch API should override this.
    fn get_prices_bulk(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<String, Vec<OHLCBar>>> {
        tickers
            .iter()
            .map(|t| self.get_prices(t, start, end).map(|bars| (t.clone(), bars)))
            .collect()
    }
}
