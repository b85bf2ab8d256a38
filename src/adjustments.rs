//! Inflation- and market-adjusted return overlays, computed from two extra
//! price series rather than folded into the core daily loop.
//!
//! Gated behind the `adjustments` feature: the core engine has no
//! dependency on CPI or benchmark-index data, so callers who don't need
//! these derived figures never pay for fetching them.

use chrono::NaiveDate;

use crate::bar::OHLCBar;
use crate::error::{EngineError, Result};

/// Real (inflation-adjusted) and benchmark-relative (alpha) return overlays
/// for a completed run.
#[derive(Debug, Clone, Copy)]
pub struct AdjustedReturns {
    /// Total return with CPI drift removed: `(1 + nominal) / (1 + cpi_change) - 1`.
    pub real_return: f64,
    /// `nominal_return - benchmark_return` over the same span.
    pub benchmark_alpha: f64,
}

/// Compute [`AdjustedReturns`] from a run's nominal total return plus a CPI
/// series and a benchmark price series spanning the same dates.
pub fn compute_adjusted_returns(
    nominal_return: f64,
    cpi_series: &[(NaiveDate, f64)],
    benchmark_series: &[OHLCBar],
) -> Result<AdjustedReturns> {
    let (cpi_start, cpi_end) = series_endpoints(cpi_series)?;
    let cpi_change = cpi_end / cpi_start - 1.0;
    let real_return = (1.0 + nominal_return) / (1.0 + cpi_change) - 1.0;

    if benchmark_series.len() < 2 {
        return Err(EngineError::data("benchmark series needs at least two points"));
    }
    let benchmark_return = benchmark_series.last().unwrap().close / benchmark_series[0].open - 1.0;
    let benchmark_alpha = nominal_return - benchmark_return;

    Ok(AdjustedReturns {
        real_return,
        benchmark_alpha,
    })
}

fn series_endpoints(series: &[(NaiveDate, f64)]) -> Result<(f64, f64)> {
    if series.len() < 2 {
        return Err(EngineError::data("CPI series needs at least two points"));
    }
    Ok((series.first().unwrap().1, series.last().unwrap().1))
}
