//! Per-ticker derived state: the append-only transaction history plus the
//! FIFO lot vector it opens and closes against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lot::{Lot, close_fifo};
use crate::transaction::Transaction;

/// Everything the engine tracks for a single ticker.
///
/// `transactions` and `lots` are both append-only. Current share count,
/// realized/unrealized P/L, and cost basis are derived on demand rather than
/// maintained as separately-mutated fields, so they can never drift from the
/// transaction log.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol.
    pub ticker: String,
    /// Every transaction recorded for this ticker, oldest first.
    pub transactions: Vec<Transaction>,
    /// Every BUY lot ever opened for this ticker, oldest first — the FIFO
    /// order SELLs close against.
    pub lots: Vec<Lot>,
}

impl Holding {
    /// Create an empty holding for `ticker`.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            transactions: Vec::new(),
            lots: Vec::new(),
        }
    }

    /// Record a BUY: open a new lot and append the transaction (with its
    /// `lot` index set to the new lot).
    pub fn record_buy(&mut self, date: NaiveDate, quantity: i64, price: f64) -> usize {
        let lot_idx = self.lots.len();
        self.lots.push(Lot::new(date, price, quantity));
        let txn = Transaction::buy(self.ticker.clone(), date, quantity, price).with_lot(lot_idx);
        self.transactions.push(txn);
        lot_idx
    }

    /// Record a SKIPPED_BUY note — no lot is opened, algorithm state is
    /// unaffected by definition (the caller simply doesn't update it).
    pub fn record_skipped_buy(&mut self, date: NaiveDate, price: f64) {
        self.transactions
            .push(Transaction::skipped_buy(self.ticker.clone(), date, price));
    }

    /// Record a SELL: close `quantity` shares FIFO against open lots, then
    /// append the transaction.
    pub fn record_sell(&mut self, date: NaiveDate, quantity: i64, price: f64) -> Result<()> {
        close_fifo(&mut self.lots, &self.ticker, quantity, date, price)?;
        self.transactions
            .push(Transaction::sell(self.ticker.clone(), date, quantity, price));
        Ok(())
    }

    /// Record a DIVIDEND or bill-coupon credit. Never changes share count.
    pub fn record_dividend(&mut self, date: NaiveDate, amount: f64) {
        self.transactions
            .push(Transaction::dividend(self.ticker.clone(), date, amount));
    }

    /// Current share count: sum of `remaining_qty` across all open lots.
    /// Never negative (the core forbids short positions).
    pub fn share_count(&self) -> i64 {
        self.lots.iter().map(|l| l.remaining_qty).sum()
    }

    /// Realized P/L: `Σ (close_price - open_price) × closed_qty` over every
    /// closed lot portion.
    pub fn realized_pnl(&self) -> f64 {
        self.lots.iter().map(|l| l.realized_pnl()).sum()
    }

    /// Unrealized P/L at `current_price`: `Σ (current_price - open_price) ×
    /// remaining_qty` over open lots.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.lots.iter().map(|l| l.unrealized_pnl(current_price)).sum()
    }

    /// Weighted cost basis over open lots: `Σ remaining_qty × open_price / Σ
    /// remaining_qty`. Zero when there are no open shares.
    pub fn cost_basis(&self) -> f64 {
        let open_qty: i64 = self.lots.iter().map(|l| l.remaining_qty).sum();
        if open_qty == 0 {
            return 0.0;
        }
        let weighted: f64 = self
            .lots
            .iter()
            .map(|l| l.remaining_qty as f64 * l.open_price)
            .sum();
        weighted / open_qty as f64
    }

    /// Market value of this holding at `current_price`.
    pub fn current_value(&self, current_price: f64) -> f64 {
        self.share_count() as f64 * current_price
    }

    /// Total number of transactions recorded (including SKIPPED_BUY notes).
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn buy_then_partial_sell_tracks_fifo() {
        let mut h = Holding::new("AAPL");
        h.record_buy(d(1), 10, 100.0);
        h.record_sell(d(2), 4, 110.0).unwrap();

        assert_eq!(h.share_count(), 6);
        assert_eq!(h.realized_pnl(), 40.0);
        assert_eq!(h.unrealized_pnl(120.0), 120.0);
        assert_eq!(h.cost_basis(), 100.0);
        assert_eq!(h.transaction_count(), 2);
    }

    #[test]
    fn multiple_buys_weighted_cost_basis() {
        let mut h = Holding::new("AAPL");
        h.record_buy(d(1), 10, 100.0);
        h.record_buy(d(2), 10, 120.0);
        // weighted: (10*100 + 10*120) / 20 = 110
        assert_eq!(h.cost_basis(), 110.0);
    }

    #[test]
    fn oversell_returns_error_and_leaves_state_intact() {
        let mut h = Holding::new("AAPL");
        h.record_buy(d(1), 5, 100.0);
        let err = h.record_sell(d(2), 10, 120.0).unwrap_err();
        assert!(err.to_string().contains("oversell") || err.to_string().contains("Oversell"));
        assert_eq!(h.share_count(), 5);
        assert_eq!(h.transaction_count(), 1);
    }

    #[test]
    fn skipped_buy_opens_no_lot() {
        let mut h = Holding::new("AAPL");
        h.record_skipped_buy(d(1), 90.0);
        assert_eq!(h.share_count(), 0);
        assert_eq!(h.lots.len(), 0);
        assert_eq!(h.transaction_count(), 1);
        assert!(h.transactions[0].is_skipped_buy());
    }
}
