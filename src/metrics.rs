//! Extended performance metrics beyond the core numeric kernels: drawdown,
//! Sortino/Calmar, tracking error, and value-at-risk.
//!
//! These supplement [`crate::numeric`] for reporting; the engine and
//! algorithms do not depend on them.

use crate::numeric;

/// A bundle of performance statistics computed from a single return series.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PerformanceReport {
    /// Compounded total return over the series.
    pub total_return: f64,
    /// Annualized compound growth rate.
    pub cagr: f64,
    /// Annualized sample volatility.
    pub volatility: f64,
    /// `(cagr - risk_free) / volatility`.
    pub sharpe: f64,
    /// `(cagr - risk_free) / downside_volatility`.
    pub sortino: f64,
    /// Maximum peak-to-trough drawdown, as a positive fraction.
    pub max_drawdown: f64,
    /// `cagr / max_drawdown`.
    pub calmar: f64,
}

/// Computes a [`PerformanceReport`] from a period-return series
/// (chronological order; orientation does not matter since every
/// ingredient here is order-independent except drawdown, which expects
/// oldest-to-newest).
pub fn compute(returns: &[f64], periods_per_year: f64, risk_free: f64) -> Option<PerformanceReport> {
    if returns.is_empty() {
        return None;
    }
    let total_return = numeric::time_weighted_return(returns);
    let cagr = numeric::annualized_time_weighted_return(returns, periods_per_year);
    let volatility = numeric::annualize_risk(numeric::risk_from_std_dev(returns), periods_per_year);
    let sharpe = if volatility == 0.0 {
        0.0
    } else {
        (cagr - risk_free) / volatility
    };
    let downside_vol = downside_volatility(returns, periods_per_year);
    let sortino = if downside_vol == 0.0 {
        0.0
    } else {
        (cagr - risk_free) / downside_vol
    };
    let max_drawdown = max_drawdown(returns);
    let calmar = if max_drawdown == 0.0 {
        0.0
    } else {
        cagr / max_drawdown
    };

    Some(PerformanceReport {
        total_return,
        cagr,
        volatility,
        sharpe,
        sortino,
        max_drawdown,
        calmar,
    })
}

/// Annualized standard deviation of the negative subset of `returns`.
pub fn downside_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    let negative: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    numeric::annualize_risk(numeric::risk_from_std_dev(&negative), periods_per_year)
}

/// Maximum peak-to-trough drawdown across the cumulative wealth curve
/// implied by `returns` (oldest-to-newest order).
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = 1.0;
    let mut worst = 0.0;
    for r in returns {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        let drawdown = (peak - wealth) / peak;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst
}

/// Annualized tracking error: the standard deviation of `portfolio - benchmark`.
pub fn tracking_error(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64) -> f64 {
    let diffs: Vec<f64> = portfolio
        .iter()
        .zip(benchmark)
        .map(|(p, b)| p - b)
        .collect();
    numeric::annualize_risk(numeric::risk_from_std_dev(&diffs), periods_per_year)
}

/// Information ratio: annualized excess return over tracking error.
pub fn information_ratio(portfolio: &[f64], benchmark: &[f64], periods_per_year: f64) -> f64 {
    let te = tracking_error(portfolio, benchmark, periods_per_year);
    if te == 0.0 {
        return 0.0;
    }
    let excess = numeric::annualized_arithmetic_return(portfolio, periods_per_year)
        - numeric::annualized_arithmetic_return(benchmark, periods_per_year);
    excess / te
}

/// Historical value-at-risk at `confidence` (e.g. 0.95), expressed as a
/// positive loss fraction.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = (((1.0 - confidence) * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    (-sorted[idx]).max(0.0)
}
