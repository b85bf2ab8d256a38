//! Per-asset synthetic-dividend algorithm variants.
//!
//! A tagged sum type (`Algorithm`) replaces the deep class hierarchy the
//! algorithm's source documents use — each variant's ladder state is small
//! and disjoint, and a single `on_day` dispatches on the tag rather than
//! resolving a virtual call through a chain of subclasses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bar::OHLCBar;
use crate::error::Result;
use crate::ladder::next_orders;
use crate::rounding::round_half_to_even;
use crate::transaction::Transaction;

/// One of the four per-asset strategies this engine evaluates.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Algorithm {
    /// One BUY at activation, then hold.
    BuyHold,
    /// Standard synthetic dividend: ATH sells, dip buybacks.
    Sd {
        /// Geometric ladder step.
        r: f64,
        /// Fraction of round-trip notional converted into SELL quantity.
        p: f64,
        /// Optional ladder reference price.
        seed: Option<f64>,
    },
    /// Sells on new ATH brackets only; never buys back after the initial
    /// position. Deterministic and path-independent.
    SdAthOnly {
        /// Geometric ladder step.
        r: f64,
        /// Fraction of round-trip notional converted into SELL quantity.
        p: f64,
    },
    /// Buys dips aggressively; sells are suppressed until a genuine new ATH,
    /// at which point the entire buyback stack unwinds at once.
    SdAthSell {
        /// Geometric ladder step.
        r: f64,
        /// Fraction of round-trip notional converted into SELL quantity.
        p: f64,
    },
}

impl Algorithm {
    fn r(&self) -> f64 {
        match self {
            Algorithm::BuyHold => 0.0,
            Algorithm::Sd { r, .. } | Algorithm::SdAthOnly { r, .. } | Algorithm::SdAthSell { r, .. } => *r,
        }
    }

    fn p(&self) -> f64 {
        match self {
            Algorithm::BuyHold => 0.0,
            Algorithm::Sd { p, .. } | Algorithm::SdAthOnly { p, .. } | Algorithm::SdAthSell { p, .. } => *p,
        }
    }

    fn seed(&self) -> Option<f64> {
        match self {
            Algorithm::Sd { seed, .. } => *seed,
            _ => None,
        }
    }
}

/// A buyback BUY sitting on the per-asset drawdown stack, awaiting unwind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct BuybackLot {
    /// 1-based depth in the stack at the time it was pushed.
    depth: usize,
    qty: i64,
    price: f64,
}

/// A BUY `on_day` has proposed but the engine has not yet confirmed —
/// ladder state only commits once [`on_buy_executed`](AlgorithmInstance::on_buy_executed)
/// is called, so a margin-skipped BUY never drifts `last_transaction_price`
/// or leaves a phantom lot on the buyback stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PendingBuy {
    depth: usize,
    qty: i64,
    price: f64,
}

/// Per-asset ladder state plus the `Algorithm` tag driving it.
///
/// Ladder state is owned here, by the algorithm instance, rather than by the
/// engine — the bracket ladder's `last_transaction_price`, `ath_price`, and
/// `buyback_stack` are algorithm-owned per the data model, so unlike the
/// engine's bank and lot ledgers (which the engine alone mutates), this
/// state is mutated directly by `on_day`. The one exception is a proposed
/// BUY: it stays pending until the engine calls back through
/// [`on_buy_executed`](Self::on_buy_executed) or
/// [`on_buy_skipped`](Self::on_buy_skipped), since whether it actually
/// executes depends on the margin policy, which `on_day` cannot see.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmInstance {
    /// Which variant and parameters this instance runs.
    pub algorithm: Algorithm,
    /// Ticker this instance trades.
    pub ticker: String,
    /// Price of the most recent BUY or SELL (not counting skipped buys).
    pub last_transaction_price: f64,
    /// Highest close ever observed.
    pub ath_price: f64,
    /// Outstanding buyback BUYs awaiting unwind, oldest first.
    buyback_stack: Vec<BuybackLot>,
    /// A BUY this instance proposed on the most recent `on_day` call, not
    /// yet confirmed executed or skipped by the engine.
    pending_buy: Option<PendingBuy>,
    activated: bool,
}

impl AlgorithmInstance {
    /// Create an uninitialized instance; call [`on_new_holdings`](Self::on_new_holdings)
    /// once the initial position is known before the first `on_day`.
    pub fn new(algorithm: Algorithm, ticker: impl Into<String>) -> Self {
        Self {
            algorithm,
            ticker: ticker.into(),
            last_transaction_price: 0.0,
            ath_price: 0.0,
            buyback_stack: Vec::new(),
            pending_buy: None,
            activated: false,
        }
    }

    /// Commits the ladder-state mutation for a BUY the engine actually
    /// executed: pushes the buyback lot and advances
    /// `last_transaction_price`. Call exactly once per BUY transaction this
    /// instance returned from `on_day`.
    pub fn on_buy_executed(&mut self) {
        if let Some(pending) = self.pending_buy.take() {
            self.last_transaction_price = pending.price;
            self.buyback_stack.push(BuybackLot {
                depth: pending.depth,
                qty: pending.qty,
                price: pending.price,
            });
        }
    }

    /// Discards a BUY the margin policy skipped, leaving
    /// `last_transaction_price` and the buyback stack exactly as they were
    /// before `on_day` proposed it.
    pub fn on_buy_skipped(&mut self) {
        self.pending_buy = None;
    }

    /// Initialize ladder state from the engine's initial BUY.
    pub fn on_new_holdings(&mut self, _qty: i64, first_price: f64) {
        self.last_transaction_price = first_price;
        self.ath_price = first_price;
        self.activated = true;
    }

    /// Evaluate one daily bar and return the transactions this algorithm
    /// wants executed. `holdings` is the ticker's current share count,
    /// needed by the ladder's quantity formulas. Returned transactions carry
    /// no lot index and do not touch the bank — the engine applies them.
    pub fn on_day(&mut self, date: NaiveDate, bar: &OHLCBar, holdings: i64) -> Result<Vec<Transaction>> {
        match self.algorithm {
            Algorithm::BuyHold => Ok(Vec::new()),
            Algorithm::Sd { .. } => self.on_day_standard(date, bar, holdings, true),
            Algorithm::SdAthOnly { .. } => self.on_day_ath_only(date, bar, holdings),
            Algorithm::SdAthSell { .. } => self.on_day_ath_sell(date, bar, holdings),
        }
    }

    fn extra_derisk_qty(&self, holdings: i64) -> i64 {
        let p = self.algorithm.p();
        if p > 1.0 {
            round_half_to_even((p - 1.0) * holdings as f64 * self.algorithm.r()).max(0)
        } else {
            0
        }
    }

    /// Shared Standard-SD / ATH-Sell buy logic: proposes the dip buyback as
    /// a transaction without committing any ladder-state mutation — the
    /// stack push and `last_transaction_price` advance only happen once the
    /// engine confirms the BUY actually executed (see
    /// [`on_buy_executed`](Self::on_buy_executed)), so a margin-skipped BUY
    /// can never drift the ladder's reference price.
    fn try_buy(&mut self, date: NaiveDate, bar: &OHLCBar, holdings: i64, out: &mut Vec<Transaction>) -> Result<()> {
        let orders = next_orders(
            self.last_transaction_price,
            self.algorithm.r(),
            self.algorithm.p(),
            self.algorithm.seed(),
            holdings,
        )?;
        if bar.low <= orders.buy_price && orders.buy_qty > 0 {
            let depth = self.buyback_stack.len() + 1;
            out.push(
                Transaction::buy(self.ticker.clone(), date, orders.buy_qty, orders.buy_price)
                    .with_note(format!("buyback at bracket depth {depth}")),
            );
            self.pending_buy = Some(PendingBuy {
                depth,
                qty: orders.buy_qty,
                price: orders.buy_price,
            });
        }
        Ok(())
    }

    /// Standard SD: ATH sell + buyback dip buy, at most one trigger per side
    /// per day, BUY-before-SELL on an upward gap through both triggers.
    fn on_day_standard(
        &mut self,
        date: NaiveDate,
        bar: &OHLCBar,
        holdings: i64,
        unwind_on_sell: bool,
    ) -> Result<Vec<Transaction>> {
        let mut out = Vec::new();
        let orders = next_orders(
            self.last_transaction_price,
            self.algorithm.r(),
            self.algorithm.p(),
            self.algorithm.seed(),
            holdings,
        )?;

        let sell_fires = bar.high >= orders.sell_price && bar.high > self.ath_price && orders.sell_qty > 0;
        let buy_fires = bar.low <= orders.buy_price && orders.buy_qty > 0;

        let buy_before_sell = bar.open < orders.buy_price && orders.buy_price < orders.sell_price && orders.sell_price < bar.close;

        let do_buy = |this: &mut Self, out: &mut Vec<Transaction>| -> Result<()> { this.try_buy(date, bar, holdings, out) };
        let do_sell = |this: &mut Self, out: &mut Vec<Transaction>| {
            this.fire_sell(date, orders.sell_price, orders.sell_qty, holdings, unwind_on_sell, out)
        };

        if buy_fires && sell_fires {
            if buy_before_sell {
                do_buy(self, &mut out)?;
                do_sell(self, &mut out);
            } else {
                do_sell(self, &mut out);
                do_buy(self, &mut out)?;
            }
        } else if sell_fires {
            do_sell(self, &mut out);
        } else if buy_fires {
            do_buy(self, &mut out)?;
        }

        // ATH tracks the bar's actual close every day, independent of
        // whether a sell fired (and of the sell trigger price, which is
        // usually below the close on a gap day).
        self.ath_price = self.ath_price.max(bar.close);

        Ok(out)
    }

    fn fire_sell(
        &mut self,
        date: NaiveDate,
        sell_price: f64,
        sell_qty: i64,
        holdings: i64,
        unwind_on_sell: bool,
        out: &mut Vec<Transaction>,
    ) {
        let extra = self.extra_derisk_qty(holdings);
        let total_qty = sell_qty + extra;

        let note = if unwind_on_sell && !self.buyback_stack.is_empty() {
            let unwound = self.buyback_stack.pop().unwrap();
            format!("unwind of buyback depth {}", unwound.depth)
        } else {
            "ATH sell".to_string()
        };

        out.push(Transaction::sell(self.ticker.clone(), date, total_qty, sell_price).with_note(note));
        self.last_transaction_price = sell_price;
    }

    /// ATH-only: same sell rule as Standard SD; never buys back.
    fn on_day_ath_only(&mut self, date: NaiveDate, bar: &OHLCBar, holdings: i64) -> Result<Vec<Transaction>> {
        let mut out = Vec::new();
        let orders = next_orders(
            self.last_transaction_price,
            self.algorithm.r(),
            self.algorithm.p(),
            None,
            holdings,
        )?;

        if bar.high >= orders.sell_price && bar.high > self.ath_price && orders.sell_qty > 0 {
            self.fire_sell(date, orders.sell_price, orders.sell_qty, holdings, false, &mut out);
        }
        self.ath_price = self.ath_price.max(bar.close);
        Ok(out)
    }

    /// ATH-Sell: buys dips like Standard SD, but holds every buyback until
    /// the close genuinely exceeds the all-time high, then unwinds the
    /// entire stack in one sell.
    fn on_day_ath_sell(&mut self, date: NaiveDate, bar: &OHLCBar, holdings: i64) -> Result<Vec<Transaction>> {
        let mut out = Vec::new();
        self.try_buy(date, bar, holdings, &mut out)?;

        if bar.close > self.ath_price && !self.buyback_stack.is_empty() {
            let orders = next_orders(
                self.last_transaction_price,
                self.algorithm.r(),
                self.algorithm.p(),
                None,
                holdings,
            )?;
            let unwind_price = if bar.high >= orders.sell_price {
                orders.sell_price
            } else {
                bar.close
            };
            let stack_qty: i64 = self.buyback_stack.iter().map(|l| l.qty).sum();
            let n = self.buyback_stack.len();
            self.buyback_stack.clear();
            let extra = self.extra_derisk_qty(holdings);
            let total_qty = stack_qty + extra;

            out.push(
                Transaction::sell(self.ticker.clone(), date, total_qty, unwind_price)
                    .with_note(format!("ATH unwind of {n} buyback(s)")),
            );
            self.ath_price = bar.close;
            self.last_transaction_price = unwind_price;
        } else {
            self.ath_price = self.ath_price.max(bar.close);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bar(day: u32, o: f64, h: f64, l: f64, c: f64) -> OHLCBar {
        OHLCBar::new(d(day), o, h, l, c)
    }

    #[test]
    fn buy_and_hold_never_emits_after_activation() {
        let mut inst = AlgorithmInstance::new(Algorithm::BuyHold, "AAPL");
        inst.on_new_holdings(100, 100.0);
        let txns = inst.on_day(d(2), &bar(2, 100.0, 140.0, 60.0, 130.0), 100).unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn standard_sd_v_shape_harvests_round_trip() {
        // S1: V-shape [100, 110, 100, 110, 100], 100 shares @ $100.
        let mut inst = AlgorithmInstance::new(
            Algorithm::Sd {
                r: 0.0905,
                p: 0.5,
                seed: None,
            },
            "AAPL",
        );
        inst.on_new_holdings(100, 100.0);

        let day2 = inst.on_day(d(2), &bar(2, 100.0, 110.0, 100.0, 110.0), 100).unwrap();
        assert_eq!(day2.len(), 1);
        assert!(matches!(day2[0].action, crate::transaction::Action::Sell));
        let sold_qty = day2[0].quantity;
        assert!(sold_qty > 0);

        let holdings_after_sell = 100 - sold_qty;
        let day3 = inst
            .on_day(d(3), &bar(3, 110.0, 110.0, 100.0, 100.0), holdings_after_sell)
            .unwrap();
        assert_eq!(day3.len(), 1);
        assert!(matches!(day3[0].action, crate::transaction::Action::Buy));
        // Round-trip symmetry modulo 1-share rounding.
        assert!((day3[0].quantity - sold_qty).abs() <= 1);
    }

    #[test]
    fn standard_sd_zero_profit_sharing_is_buy_and_hold() {
        let mut inst = AlgorithmInstance::new(
            Algorithm::Sd {
                r: 0.0905,
                p: 0.0,
                seed: None,
            },
            "AAPL",
        );
        inst.on_new_holdings(100, 100.0);
        for day in 2..=6 {
            let txns = inst
                .on_day(d(day), &bar(day, 100.0, 130.0, 70.0, 100.0 + day as f64), 100)
                .unwrap();
            assert!(txns.is_empty(), "expected no trades with p=0 on day {day}");
        }
    }

    #[test]
    fn ath_only_never_buys_back() {
        let mut inst = AlgorithmInstance::new(Algorithm::SdAthOnly { r: 0.0905, p: 0.5 }, "AAPL");
        inst.on_new_holdings(100, 100.0);
        for day in 2..=6 {
            let txns = inst.on_day(d(day), &bar(day, 90.0, 95.0, 60.0, 70.0), 100).unwrap();
            assert!(txns.iter().all(|t| !matches!(t.action, crate::transaction::Action::Buy)));
        }
    }

    #[test]
    fn ath_only_path_independence() {
        // S4: two paths to terminal close 120 from 100, ATH-only must agree.
        let path_a = [
            bar(1, 100.0, 100.0, 100.0, 100.0),
            bar(2, 100.0, 120.0, 100.0, 120.0),
            bar(3, 120.0, 120.0, 90.0, 90.0),
            bar(4, 90.0, 120.0, 90.0, 120.0),
        ];
        let path_b = [
            bar(1, 100.0, 100.0, 100.0, 100.0),
            bar(2, 100.0, 120.0, 100.0, 120.0),
            bar(3, 120.0, 120.0, 110.0, 110.0),
            bar(4, 110.0, 120.0, 110.0, 120.0),
        ];

        let run = |path: &[OHLCBar]| {
            let mut inst = AlgorithmInstance::new(Algorithm::SdAthOnly { r: 0.0905, p: 0.5 }, "AAPL");
            inst.on_new_holdings(100, 100.0);
            let mut holdings = 100i64;
            let mut total_sold = 0i64;
            for b in &path[1..] {
                let txns = inst.on_day(b.date, b, holdings).unwrap();
                for t in &txns {
                    holdings -= t.quantity;
                    total_sold += t.quantity;
                }
            }
            (holdings, total_sold, inst.last_transaction_price)
        };

        let (h_a, sold_a, last_a) = run(&path_a);
        let (h_b, sold_b, last_b) = run(&path_b);
        assert_eq!(h_a, h_b);
        assert_eq!(sold_a, sold_b);
        assert!((last_a - last_b).abs() < 1e-9);
    }

    #[test]
    fn skipped_buy_leaves_ladder_state_untouched() {
        let mut inst = AlgorithmInstance::new(
            Algorithm::Sd {
                r: 0.0905,
                p: 0.5,
                seed: None,
            },
            "AAPL",
        );
        inst.on_new_holdings(100, 100.0);
        let price_before = inst.last_transaction_price;

        let txns = inst.on_day(d(2), &bar(2, 100.0, 100.0, 90.0, 95.0), 100).unwrap();
        assert_eq!(txns.len(), 1);
        assert!(matches!(txns[0].action, crate::transaction::Action::Buy));

        // The engine decided the margin policy could not fund this BUY.
        inst.on_buy_skipped();
        assert_eq!(inst.last_transaction_price, price_before, "a skipped buy must not advance the reference price");

        // A subsequent bar's trigger is computed off the unchanged reference
        // price, not the skipped buy's price.
        let txns2 = inst.on_day(d(3), &bar(3, 95.0, 100.0, 90.0, 95.0), 100).unwrap();
        assert_eq!(txns2.len(), 1, "the same trigger should fire again since nothing actually bought");
        assert_eq!(txns2[0].quantity, txns[0].quantity);
        assert_eq!(txns2[0].price, txns[0].price);
    }

    #[test]
    fn executed_buy_commits_ladder_state() {
        let mut inst = AlgorithmInstance::new(
            Algorithm::Sd {
                r: 0.0905,
                p: 0.5,
                seed: None,
            },
            "AAPL",
        );
        inst.on_new_holdings(100, 100.0);

        let txns = inst.on_day(d(2), &bar(2, 100.0, 100.0, 90.0, 95.0), 100).unwrap();
        assert_eq!(txns.len(), 1);
        let bought_price = txns[0].price;

        inst.on_buy_executed();
        assert_eq!(inst.last_transaction_price, bought_price, "an executed buy must advance the reference price");

        // The same bracket should not fire again immediately.
        let txns2 = inst.on_day(d(3), &bar(3, 95.0, 96.0, 94.0, 95.0), 100 + txns[0].quantity).unwrap();
        assert!(txns2.is_empty());
    }

    #[test]
    fn ath_sell_suppresses_sells_until_new_high() {
        let mut inst = AlgorithmInstance::new(Algorithm::SdAthSell { r: 0.0905, p: 0.5 }, "AAPL");
        inst.on_new_holdings(100, 100.0);

        // Dip: buys accumulate on the stack, no sells since close never exceeds ATH.
        let txns = inst.on_day(d(2), &bar(2, 100.0, 100.0, 80.0, 90.0), 100).unwrap();
        assert!(txns.iter().all(|t| matches!(t.action, crate::transaction::Action::Buy)));
        // The engine confirms the buy executed, committing it to the stack.
        inst.on_buy_executed();

        // New ATH close: entire stack should unwind in one sell.
        let txns2 = inst.on_day(d(3), &bar(3, 90.0, 130.0, 90.0, 130.0), 104).unwrap();
        assert!(txns2.iter().any(|t| matches!(t.action, crate::transaction::Action::Sell)));
    }
}
