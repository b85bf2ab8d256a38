//! Error types for the backtest engine.

use thiserror::Error;

use crate::transaction::Transaction;

/// Engine errors, grouped per the taxonomy in the engine's failure-mode spec.
///
/// All variants are fatal: the core performs no internal retries — retry is
/// a caller responsibility.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Invalid configuration parameter — weights that don't sum to 1.0,
    /// a non-positive `rebalance_pct`, or any other parameter combination
    /// that is fatal before the daily loop begins.
    #[error("invalid parameter '{param}': {reason}")]
    Config {
        /// Parameter name.
        param: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// The external [`PriceProvider`](crate::provider::PriceProvider) returned
    /// missing/inconsistent bars, a dividend date outside the requested
    /// range, or the intersection of trading dates across all tickers was
    /// empty.
    #[error("data error: {0}")]
    Data(String),

    /// A scheduled withdrawal could not be funded even after selling every
    /// remaining share FIFO across tickers. The transaction log recorded up
    /// to the point of failure is returned alongside the error for
    /// diagnosis.
    #[error("portfolio depleted: withdrawal of {shortfall} could not be funded")]
    Depletion {
        /// Cash still owed after exhausting all sellable holdings.
        shortfall: f64,
        /// Every transaction recorded before the run was aborted.
        transactions_so_far: Vec<Transaction>,
    },

    /// An algorithm requested a SELL quantity exceeding the open lots on a
    /// ticker — indicates an algorithm bug, since the engine only ever
    /// passes algorithm-generated sell quantities through FIFO closure.
    #[error("oversell on {ticker}: requested {requested} shares, only {available} open")]
    Oversell {
        /// Ticker the oversell occurred on.
        ticker: String,
        /// Shares the algorithm asked to sell.
        requested: i64,
        /// Shares actually available in open lots.
        available: i64,
    },

    /// A [`Summary`](crate::result::Summary) could not be encoded to or
    /// decoded from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Build a [`EngineError::Config`] error.
    pub fn config(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`EngineError::Data`] error.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Build a [`EngineError::Depletion`] error.
    pub fn depletion(shortfall: f64, transactions_so_far: Vec<Transaction>) -> Self {
        Self::Depletion {
            shortfall,
            transactions_so_far,
        }
    }

    /// Build an [`EngineError::Oversell`] error.
    pub fn oversell(ticker: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::Oversell {
            ticker: ticker.into(),
            requested,
            available,
        }
    }
}
