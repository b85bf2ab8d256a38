//! # synthetic-dividend
//!
//! A deterministic, single-threaded, event-driven backtest engine for
//! "synthetic dividend" bracket-ladder trading algorithms.
//!
//! The engine replays a portfolio of tickers day by day against a
//! caller-supplied [`PriceProvider`], applying dividends, cash interest,
//! and scheduled withdrawals in a fixed order before handing the day's
//! bars to a [`PortfolioAlgorithm`] for trade decisions. All share-count
//! math is pinned to round-half-to-even so a run is bit-for-bit
//! reproducible given the same price and dividend data.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::collections::HashMap;
//! use chrono::NaiveDate;
//! use synthetic_dividend::{
//!     algorithm::Algorithm,
//!     config::EngineOptions,
//!     engine::run_portfolio_backtest,
//!     portfolio_algorithm::PerAssetComposite,
//!     provider::PriceProvider,
//! };
//!
//! # fn example(provider: &dyn PriceProvider) -> synthetic_dividend::error::Result<()> {
//! let mut weights = HashMap::new();
//! weights.insert("AAPL".to_string(), 1.0);
//!
//! let mut assignments = HashMap::new();
//! assignments.insert("AAPL".to_string(), Algorithm::Sd { r: 0.0905, p: 0.5, seed: None });
//! let mut algorithm = PerAssetComposite::new(assignments);
//!
//! let options = EngineOptions::default();
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
//!
//! let (transactions, summary) = run_portfolio_backtest(provider, &weights, &mut algorithm, &options, start, end)?;
//! println!("{} transactions, total return: {:.2}%", transactions.len(), summary.total_return * 100.0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// The four per-asset bracket-ladder strategy variants.
pub mod algorithm;
/// Daily OHLC bars and dividend/coupon events.
pub mod bar;
/// Engine-wide run options: margin policy, withdrawals, cash interest.
pub mod config;
/// Error types and the engine's `Result` alias.
pub mod error;
/// The deterministic daily-loop simulation engine.
pub mod engine;
/// Per-ticker holdings: the append-only transaction log and FIFO lot vector.
pub mod holding;
/// The pure bracket-ladder pricing and quantity function.
pub mod ladder;
/// FIFO lot tracking for cost-basis accounting.
pub mod lot;
/// Compact algorithm specifier string parsing.
pub mod parsing;
/// Shared-bank, multi-ticker portfolio state.
pub mod portfolio;
/// Portfolio-level composition: per-asset or periodic rebalance.
pub mod portfolio_algorithm;
/// The external market-data collaborator interface.
pub mod provider;
/// Round-half-to-even, this engine's pinned rounding rule.
pub mod rounding;
/// The summary a backtest run produces.
pub mod result;
/// The atomic unit of portfolio state mutation.
pub mod transaction;

/// Inflation- and market-adjusted return overlays, computed from two extra
/// price series rather than folded into the core daily loop.
#[cfg(feature = "adjustments")]
pub mod adjustments;

pub use algorithm::{Algorithm, AlgorithmInstance};
pub use bar::{BilSeries, DividendEvent, OHLCBar};
pub use config::{EngineOptions, EngineOptionsBuilder};
pub use engine::run_portfolio_backtest;
pub use error::{EngineError, Result};
pub use holding::Holding;
pub use ladder::{next_orders, LadderOrders};
pub use lot::{close_fifo, Lot, LotClosure};
pub use portfolio::{DailyPoint, Portfolio};
pub use portfolio_algorithm::{PerAssetComposite, PeriodicRebalance, PortfolioAlgorithm, RebalanceFrequency};
pub use provider::PriceProvider;
pub use result::{Summary, TickerSummary};
pub use transaction::{Action, Transaction};
