//! FIFO lot tracking: every BUY opens a lot; a later SELL closes the oldest
//! open lots first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The portion of a lot closed by a single SELL.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LotClosure {
    /// Shares of this lot closed by the SELL.
    pub closed_qty: i64,
    /// Date the SELL executed.
    pub close_date: NaiveDate,
    /// Price the SELL executed at.
    pub close_price: f64,
}

/// A single open (or partially/fully closed) BUY lot.
///
/// Lots are append-only: a SELL never mutates an existing lot's
/// `open_price`/`open_date`/`quantity`, it only appends a [`LotClosure`] and
/// decrements `remaining_qty`. This keeps the BUY transaction itself
/// immutable — the redesign this spec follows in place of mutating
/// transaction objects in place.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    /// Date the originating BUY executed.
    pub open_date: NaiveDate,
    /// Price the originating BUY executed at.
    pub open_price: f64,
    /// Shares originally bought.
    pub quantity: i64,
    /// Shares of this lot still open (not yet closed by a SELL).
    pub remaining_qty: i64,
    /// Every SELL that has closed part of this lot, oldest first.
    pub closes: Vec<LotClosure>,
}

impl Lot {
    /// Open a new lot from a BUY of `quantity` shares at `price` on `date`.
    pub fn new(date: NaiveDate, price: f64, quantity: i64) -> Self {
        Self {
            open_date: date,
            open_price: price,
            quantity,
            remaining_qty: quantity,
            closes: Vec::new(),
        }
    }

    /// Realized P/L from every closed portion of this lot so far.
    pub fn realized_pnl(&self) -> f64 {
        self.closes
            .iter()
            .map(|c| (c.close_price - self.open_price) * c.closed_qty as f64)
            .sum()
    }

    /// Unrealized P/L on the still-open remainder of this lot at `current_price`.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.open_price) * self.remaining_qty as f64
    }
}

/// Close `qty` shares FIFO against `lots` (oldest first) at `price` on `date`.
///
/// Returns the index (into `lots`) and [`LotClosure`] recorded on each lot
/// touched, oldest first. Fails with [`EngineError::Oversell`] if `qty`
/// exceeds the total open shares across all lots — an algorithm bug, since
/// the engine never generates SELL quantities itself beyond what an
/// algorithm requested.
pub fn close_fifo(
    lots: &mut [Lot],
    ticker: &str,
    mut qty: i64,
    date: NaiveDate,
    price: f64,
) -> Result<Vec<(usize, LotClosure)>> {
    let requested = qty;
    let mut closures = Vec::new();

    for (idx, lot) in lots.iter_mut().enumerate() {
        if qty == 0 {
            break;
        }
        if lot.remaining_qty == 0 {
            continue;
        }

        let closed_qty = qty.min(lot.remaining_qty);
        let closure = LotClosure {
            closed_qty,
            close_date: date,
            close_price: price,
        };
        lot.remaining_qty -= closed_qty;
        lot.closes.push(closure);
        closures.push((idx, closure));
        qty -= closed_qty;
    }

    if qty > 0 {
        let available = requested - qty;
        return Err(EngineError::oversell(ticker, requested, available));
    }

    Ok(closures)
}
