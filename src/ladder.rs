//! The bracket ladder: a pure function from `(last_transaction_price,
//! rebalance_pct, optional seed)` to the next symmetric buy/sell price pair
//! and their order quantities.

use crate::error::{EngineError, Result};
use crate::rounding::round_half_to_even;

/// The next buy/sell trigger prices and quantities derived from the ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LadderOrders {
    /// Price at which the next BUY triggers: `node(k-1)`.
    pub buy_price: f64,
    /// Price at which the next SELL triggers: `node(k+1)`.
    pub sell_price: f64,
    /// Shares to buy if the buy trigger fires. Zero means the buy side is
    /// inactive this step.
    pub buy_qty: i64,
    /// Shares to sell if the sell trigger fires. Zero means the sell side is
    /// inactive this step.
    pub sell_qty: i64,
}

/// Compute the next ladder orders.
///
/// `last_price` is the algorithm's `last_transaction_price`; `r` is
/// `rebalance_pct` (the geometric step); `p` is `profit_sharing`; `seed` is
/// the optional `bracket_seed` reference price used to snap `last_price`
/// onto the nearest ladder node before deriving the next step; `holdings` is
/// the current share count feeding the quantity formulas.
///
/// `r <= 0`, `r >= 1`, `holdings < 0`, or `last_price <= 0` is a
/// configuration error — fatal, not retried.
pub fn next_orders(last_price: f64, r: f64, p: f64, seed: Option<f64>, holdings: i64) -> Result<LadderOrders> {
    if !(r > 0.0 && r < 1.0) {
        return Err(EngineError::config("rebalance_pct", "must be in (0, 1)"));
    }
    if holdings < 0 {
        return Err(EngineError::config("holdings", "must be non-negative"));
    }
    if !(last_price > 0.0) {
        return Err(EngineError::config(
            "last_transaction_price",
            "must be positive",
        ));
    }

    let anchor = match seed {
        Some(s) if s > 0.0 => {
            let k = round_half_to_even((last_price / s).ln() / (1.0 + r).ln());
            s * (1.0 + r).powi(k as i32)
        }
        _ => last_price,
    };

    let buy_price = anchor / (1.0 + r);
    let sell_price = anchor * (1.0 + r);

    let h = holdings as f64;
    let buy_qty = round_half_to_even(r * h * p).max(0);
    let sell_qty = round_half_to_even(r * h * p / (1.0 + r)).max(0);

    Ok(LadderOrders {
        buy_price,
        sell_price,
        buy_qty,
        sell_qty,
    })
}
