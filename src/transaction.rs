//! The atomic unit of portfolio state mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a [`Transaction`] did to the shared bank and/or a ticker's holdings.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Opens (or adds to) a position; decreases the bank.
    Buy,
    /// Closes shares FIFO against open lots; increases the bank.
    Sell,
    /// Cash-only credit from a dividend or bill-coupon event.
    Dividend,
    /// Cash-only credit from accrued interest on the bank balance.
    Interest,
    /// Cash-only debit from a scheduled withdrawal.
    Withdrawal,
}

impl Action {
    /// Whether this action moves shares (as opposed to being cash-only).
    pub fn moves_shares(self) -> bool {
        matches!(self, Action::Buy | Action::Sell)
    }
}

/// The atomic unit of portfolio state mutation.
///
/// Transaction history is append-only: state at any historical date is
/// reconstructible by replaying transactions up to that date. The only
/// mutation permitted after a transaction is recorded is the FIFO lot
/// closure bookkeeping on an earlier BUY, which lives in a separate
/// append-only `Lot` vector (see [`crate::lot`]) rather than on the
/// transaction itself.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Ticker symbol this transaction applies to (or `"CASH"` for
    /// portfolio-wide cash events with no associated ticker).
    pub ticker: String,
    /// What kind of transaction this is.
    pub action: Action,
    /// Date the transaction executed.
    pub date: NaiveDate,
    /// Shares bought/sold; zero for pure cash-movement actions and for
    /// zero-qty SKIPPED_BUY notes.
    pub quantity: i64,
    /// Per-share execution price for BUY/SELL; zero/unused otherwise.
    pub price: f64,
    /// Signed cash delta applied to the bank: negative for BUY/WITHDRAWAL,
    /// positive for SELL/DIVIDEND/INTEREST.
    pub amount: f64,
    /// Free-form annotation (e.g. "ATH sell #3", "buyback at bracket -2",
    /// "skipped: insufficient cash").
    pub note: Option<String>,
    /// Index into the owning [`Holding`](crate::holding::Holding)'s lot
    /// vector for BUY transactions that opened a new lot. `None` for every
    /// other action, and for a SKIPPED_BUY (which opens no lot).
    pub lot: Option<usize>,
}

impl Transaction {
    /// Construct a BUY transaction. `lot` should be the index the new lot
    /// will occupy in the owning holding's lot vector.
    pub fn buy(ticker: impl Into<String>, date: NaiveDate, quantity: i64, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            action: Action::Buy,
            date,
            quantity,
            price,
            amount: -(quantity as f64 * price),
            note: None,
            lot: None,
        }
    }

    /// Construct a SELL transaction whose proceeds credit the bank.
    pub fn sell(ticker: impl Into<String>, date: NaiveDate, quantity: i64, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            action: Action::Sell,
            date,
            quantity,
            price,
            amount: quantity as f64 * price,
            note: None,
            lot: None,
        }
    }

    /// Construct a zero-qty SKIPPED_BUY note-only transaction — the margin
    /// check rejected a BUY and the algorithm's state is left untouched.
    pub fn skipped_buy(ticker: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            action: Action::Buy,
            date,
            quantity: 0,
            price,
            amount: 0.0,
            note: Some("skipped: insufficient cash".to_string()),
            lot: None,
        }
    }

    /// Construct a DIVIDEND or bill-coupon credit.
    pub fn dividend(ticker: impl Into<String>, date: NaiveDate, amount: f64) -> Self {
        Self {
            ticker: ticker.into(),
            action: Action::Dividend,
            date,
            quantity: 0,
            price: 0.0,
            amount,
            note: None,
            lot: None,
        }
    }

    /// Construct an INTEREST credit on the bank balance.
    pub fn interest(date: NaiveDate, amount: f64) -> Self {
        Self {
            ticker: "CASH".to_string(),
            action: Action::Interest,
            date,
            quantity: 0,
            price: 0.0,
            amount,
            note: None,
            lot: None,
        }
    }

    /// Construct a WITHDRAWAL debit from the bank.
    pub fn withdrawal(date: NaiveDate, amount: f64) -> Self {
        Self {
            ticker: "CASH".to_string(),
            action: Action::Withdrawal,
            date,
            quantity: 0,
            price: 0.0,
            amount: -amount,
            note: None,
            lot: None,
        }
    }

    /// Attach a free-form note, for algorithms that annotate the reason a
    /// transaction fired (e.g. "ATH sell #3", "buyback at bracket -2").
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Attach the lot index this BUY opened.
    pub fn with_lot(mut self, lot: usize) -> Self {
        self.lot = Some(lot);
        self
    }

    /// Whether this transaction is a SKIPPED_BUY note (zero-qty BUY).
    pub fn is_skipped_buy(&self) -> bool {
        self.action == Action::Buy && self.quantity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn buy_amount_is_negative() {
        let t = Transaction::buy("AAPL", d(1), 10, 100.0);
        assert_eq!(t.amount, -1000.0);
    }

    #[test]
    fn sell_amount_is_positive() {
        let t = Transaction::sell("AAPL", d(1), 10, 110.0);
        assert_eq!(t.amount, 1100.0);
    }

    #[test]
    fn withdrawal_amount_is_negative() {
        let t = Transaction::withdrawal(d(1), 400.0);
        assert_eq!(t.amount, -400.0);
    }

    #[test]
    fn skipped_buy_has_zero_quantity_and_amount() {
        let t = Transaction::skipped_buy("AAPL", d(1), 90.0);
        assert!(t.is_skipped_buy());
        assert_eq!(t.quantity, 0);
        assert_eq!(t.amount, 0.0);
        assert!(t.note.is_some());
    }
}
