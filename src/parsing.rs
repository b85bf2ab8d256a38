//! Parses the compact algorithm specifier strings used in run
//! configuration and the CLI surface (`"sd-9.05,50"`, `"sd8"`,
//! `"per-asset:<algo>"`, ...) into [`Algorithm`] and
//! [`RebalanceFrequency`] values.

use std::collections::HashMap;

use crate::algorithm::Algorithm;
use crate::error::{EngineError, Result};
use crate::portfolio_algorithm::RebalanceFrequency;

/// Parse a single per-asset algorithm specifier.
///
/// Grammar:
/// - `"buy-and-hold"`
/// - `"sd-<r_pct>,<p_pct>[,<seed>]"` — e.g. `"sd-9.05,50"` or `"sd-9.05,50,120.00"`
/// - `"sd-ath-only-<r_pct>,<p_pct>"`
/// - `"sd-ath-sell-<r_pct>,<p_pct>"`
/// - `"sdN"` where `N` is a positive integer — shorthand for an `N`-fold
///   annual bracket count, i.e. `r = 2^(1/N) - 1` at the default 50% profit
///   share, e.g. `"sd8"` ⇒ `r ≈ 0.0905`
pub fn parse_algorithm(spec: &str) -> Result<Algorithm> {
    let spec = spec.trim();
    if spec == "buy-and-hold" {
        return Ok(Algorithm::BuyHold);
    }
    if let Some(rest) = spec.strip_prefix("sd-ath-only-") {
        let (r, p) = parse_r_p(rest)?;
        return Ok(Algorithm::SdAthOnly { r, p });
    }
    if let Some(rest) = spec.strip_prefix("sd-ath-sell-") {
        let (r, p) = parse_r_p(rest)?;
        return Ok(Algorithm::SdAthSell { r, p });
    }
    if let Some(rest) = spec.strip_prefix("sd-") {
        let parts: Vec<&str> = rest.split(',').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(EngineError::config("algorithm", format!("malformed sd spec: {spec}")));
        }
        let r = parse_pct(parts[0])?;
        let p = parse_pct(parts[1])?;
        let seed = match parts.get(2) {
            Some(s) => Some(parse_f64(s)?),
            None => None,
        };
        return Ok(Algorithm::Sd { r, p, seed });
    }
    if let Some(rest) = spec.strip_prefix("sd") {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            let n: u32 = rest
                .parse()
                .map_err(|_| EngineError::config("algorithm", format!("not a valid sdN spec: {spec}")))?;
            if n == 0 {
                return Err(EngineError::config("algorithm", format!("sdN bracket count must be positive: {spec}")));
            }
            let r = 2f64.powf(1.0 / n as f64) - 1.0;
            return Ok(Algorithm::Sd { r, p: 0.50, seed: None });
        }
    }

    Err(EngineError::config("algorithm", format!("unrecognized specifier: {spec}")))
}

fn parse_r_p(rest: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = rest.split(',').collect();
    if parts.len() != 2 {
        return Err(EngineError::config("algorithm", format!("expected r,p, got: {rest}")));
    }
    Ok((parse_pct(parts[0])?, parse_pct(parts[1])?))
}

fn parse_pct(s: &str) -> Result<f64> {
    parse_f64(s).map(|v| v / 100.0)
}

fn parse_f64(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| EngineError::config("algorithm", format!("not a number: {s}")))
}

/// Parse a portfolio-level specifier: either `"per-asset:<algo>,<algo>,..."`
/// paired against a ticker list by position, or one of
/// `"quarterly-rebalance"` / `"monthly-rebalance"` / `"annual-rebalance"`.
pub fn parse_portfolio_algorithm(
    spec: &str,
    tickers: &[String],
) -> Result<PortfolioAlgorithmSpec> {
    let spec = spec.trim();
    match spec {
        "quarterly-rebalance" => return Ok(PortfolioAlgorithmSpec::Rebalance(RebalanceFrequency::Quarterly)),
        "monthly-rebalance" => return Ok(PortfolioAlgorithmSpec::Rebalance(RebalanceFrequency::Monthly)),
        "annual-rebalance" => return Ok(PortfolioAlgorithmSpec::Rebalance(RebalanceFrequency::Annual)),
        _ => {}
    }

    if let Some(rest) = spec.strip_prefix("per-asset:") {
        let algo_specs: Vec<&str> = rest.split(';').collect();
        if algo_specs.len() == 1 {
            let algo = parse_algorithm(algo_specs[0])?;
            let assignments = tickers.iter().map(|t| (t.clone(), algo)).collect();
            return Ok(PortfolioAlgorithmSpec::PerAsset(assignments));
        }
        if algo_specs.len() != tickers.len() {
            return Err(EngineError::config(
                "algorithm",
                "per-asset specifier count must match ticker count",
            ));
        }
        let mut assignments = HashMap::new();
        for (ticker, algo_spec) in tickers.iter().zip(algo_specs) {
            assignments.insert(ticker.clone(), parse_algorithm(algo_spec)?);
        }
        return Ok(PortfolioAlgorithmSpec::PerAsset(assignments));
    }

    Err(EngineError::config(
        "algorithm",
        format!("unrecognized portfolio specifier: {spec}"),
    ))
}

/// The two shapes a parsed portfolio-level specifier can take; the caller
/// builds the corresponding [`PortfolioAlgorithm`](crate::portfolio_algorithm::PortfolioAlgorithm)
/// (a rebalance still needs target weights, which this parser does not own).
#[derive(Debug, Clone)]
pub enum PortfolioAlgorithmSpec {
    /// Independent per-ticker algorithms.
    PerAsset(HashMap<String, Algorithm>),
    /// A periodic rebalance at the given frequency.
    Rebalance(RebalanceFrequency),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_buy_and_hold() {
        assert!(matches!(parse_algorithm("buy-and-hold").unwrap(), Algorithm::BuyHold));
    }

    #[test]
    fn parses_standard_sd_with_seed() {
        let algo = parse_algorithm("sd-9.05,50,120.00").unwrap();
        match algo {
            Algorithm::Sd { r, p, seed } => {
                assert!((r - 0.0905).abs() < 1e-9);
                assert!((p - 0.50).abs() < 1e-9);
                assert_eq!(seed, Some(120.0));
            }
            _ => panic!("expected Sd"),
        }
    }

    #[test]
    fn parses_sdn_shorthand() {
        let algo = parse_algorithm("sd8").unwrap();
        match algo {
            Algorithm::Sd { r, p, seed } => {
                assert!((r - 0.0905).abs() < 1e-3, "r = {r}");
                assert!((p - 0.50).abs() < 1e-9);
                assert_eq!(seed, None);
            }
            _ => panic!("expected Sd"),
        }
    }

    #[test]
    fn rejects_sdn_zero_and_non_numeric() {
        assert!(parse_algorithm("sd0").is_err());
        assert!(parse_algorithm("sdN").is_err());
    }

    #[test]
    fn parses_ath_variants() {
        assert!(matches!(
            parse_algorithm("sd-ath-only-9.05,50").unwrap(),
            Algorithm::SdAthOnly { .. }
        ));
        assert!(matches!(
            parse_algorithm("sd-ath-sell-9.05,50").unwrap(),
            Algorithm::SdAthSell { .. }
        ));
    }

    #[test]
    fn rejects_malformed_spec() {
        assert!(parse_algorithm("sd-9.05").is_err());
        assert!(parse_algorithm("not-a-thing").is_err());
    }

    #[test]
    fn parses_per_asset_broadcast() {
        let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
        let spec = parse_portfolio_algorithm("per-asset:buy-and-hold", &tickers).unwrap();
        match spec {
            PortfolioAlgorithmSpec::PerAsset(map) => assert_eq!(map.len(), 2),
            _ => panic!("expected PerAsset"),
        }
    }

    #[test]
    fn parses_rebalance_specifiers() {
        let tickers = vec!["AAPL".to_string()];
        assert!(matches!(
            parse_portfolio_algorithm("quarterly-rebalance", &tickers).unwrap(),
            PortfolioAlgorithmSpec::Rebalance(RebalanceFrequency::Quarterly)
        ));
    }
}
