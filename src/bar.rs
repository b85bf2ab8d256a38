//! Daily price bars and dividend/coupon events consumed from the external
//! [`PriceProvider`](crate::provider::PriceProvider).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily OHLC bar.
///
/// All four prices are finite and positive; `date` is a calendar day with no
/// time-of-day component, matching the daily resolution this engine operates
/// at (§ Non-goals: intraday paths are not modeled).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OHLCBar {
    /// Calendar day this bar covers.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
}

impl OHLCBar {
    /// Construct a bar, useful in tests and for providers with no volume data.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Whether all four prices are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }
}

/// A dividend (equities) or coupon (money-market bill) payment event.
///
/// `per_share_amount` is semantically identical whether it represents an
/// equity dividend or a bill coupon — both credit the holder's bank per
/// share/unit held on the event date.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Ex-date the payment is credited against shares held at start of day.
    pub date: NaiveDate,
    /// Payment per share/unit held.
    pub per_share_amount: f64,
}

impl DividendEvent {
    /// Construct a dividend/coupon event.
    pub fn new(date: NaiveDate, per_share_amount: f64) -> Self {
        Self {
            date,
            per_share_amount,
        }
    }
}

/// A short-bill (e.g. BIL) price and coupon series, supplied by the caller
/// as the alternative cash-interest model: on each coupon date the bank's
/// equivalent bill-share count is computed from `prices` and credited at
/// `dividends`' per-unit rate (§4.5).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BilSeries {
    /// Daily bars for the bill ticker, ascending by date.
    pub prices: Vec<OHLCBar>,
    /// Coupon events for the bill ticker, ascending by date.
    pub dividends: Vec<DividendEvent>,
}

impl BilSeries {
    /// Construct a bill series from its price and coupon data.
    pub fn new(prices: Vec<OHLCBar>, dividends: Vec<DividendEvent>) -> Self {
        Self { prices, dividends }
    }

    /// The bar dated exactly `date`, if any.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.prices.iter().find(|b| b.date == date).map(|b| b.close)
    }

    /// The coupon event dated exactly `date`, if any.
    pub fn dividend_on(&self, date: NaiveDate) -> Option<f64> {
        self.dividends
            .iter()
            .find(|d| d.date == date)
            .map(|d| d.per_share_amount)
    }
}
