//! Numeric kernels shared by the allocation algorithms and the metrics
//! module: holding-period returns, annualization, correlation, and the
//! Mindlin arithmetic/geometric return conversion.

/// Default number of periods per year used when a caller does not supply
/// one (matches the daily-bar convention of 252 trading days).
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Converts a series of quotes (most-recent-first) into holding-period
/// returns of the same orientation. Returns an empty vector for fewer than
/// two quotes.
pub fn holding_period_returns(quotes: &[f64]) -> Vec<f64> {
    if quotes.len() < 2 {
        return Vec::new();
    }
    quotes
        .windows(2)
        .map(|pair| pair[0] / pair[1] - 1.0)
        .collect()
}

/// Compounds a series of period returns into a single time-weighted return.
pub fn time_weighted_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Annualizes a compounded time-weighted return over `returns.len()` periods.
pub fn annualized_time_weighted_return(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let compounded = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r));
    compounded.powf(periods_per_year / returns.len() as f64) - 1.0
}

/// Annualizes the arithmetic mean of a series of period returns.
pub fn annualized_arithmetic_return(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    mean * periods_per_year
}

/// Sample standard deviation (divisor `n - 1`); 0 for fewer than two values.
pub fn risk_from_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Scales a single-period risk figure to an annualized one.
pub fn annualize_risk(risk: f64, periods_per_year: f64) -> f64 {
    risk * periods_per_year.sqrt()
}

/// Computes the N x N Pearson correlation matrix for `N` equal-length
/// columns, returned as a flat row-major buffer of length `N * N`.
pub fn correlation_matrix(columns: &[Vec<f64>]) -> Vec<f64> {
    let n = columns.len();
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        out[i * n + i] = 1.0;
        for j in (i + 1)..n {
            let c = pearson(&columns[i], &columns[j]);
            out[i * n + j] = c;
            out[j * n + i] = c;
        }
    }
    out
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Decomposes portfolio variance into total risk and per-asset risk
/// contributions. `correlations` is a flat row-major `N * N` buffer as
/// produced by [`correlation_matrix`].
///
/// Returns `(total_risk, risk_contributions)`, where `risk_contributions`
/// sums to `total_risk`.
pub fn portfolio_volatility(
    weights: &[f64],
    std_devs: &[f64],
    correlations: &[f64],
) -> (f64, Vec<f64>) {
    let n = weights.len();
    let mut row_sums = vec![0.0; n];
    let mut total_variance = 0.0;
    for i in 0..n {
        for j in 0..n {
            let cov = weights[i] * weights[j] * std_devs[i] * std_devs[j] * correlations[i * n + j];
            row_sums[i] += cov;
            total_variance += cov;
        }
    }
    let total_risk = total_variance.max(0.0).sqrt();
    let contributions = if total_risk == 0.0 {
        vec![0.0; n]
    } else {
        row_sums.iter().map(|s| s / total_risk).collect()
    };
    (total_risk, contributions)
}

/// Element-wise division of risk contributions by total risk, producing
/// weights. Caller must ensure `total_risk != 0`.
pub fn risk_weights(contributions: &[f64], total_risk: f64) -> Vec<f64> {
    contributions.iter().map(|c| c / total_risk).collect()
}

/// Minimum representable arithmetic return accepted by the Mindlin
/// conversion before it is clamped to zero.
const MIN_ARITHMETIC_RETURN: f64 = -0.9999;

/// Converts an annualized arithmetic (simple-average) return and volatility
/// into the corresponding compound annual growth rate, using the Mindlin
/// ex-ante approximation.
pub fn cagr_from_arithmetic_return(arithmetic_return: f64, volatility: f64) -> f64 {
    let r = if arithmetic_return <= MIN_ARITHMETIC_RETURN {
        0.0
    } else {
        arithmetic_return
    };
    (1.0 + r) * (1.0 + (volatility * volatility) / (1.0 + r).powi(2)).powf(-0.5) - 1.0
}

/// Inverts [`cagr_from_arithmetic_return`]: recovers the arithmetic return
/// that would compound to `cagr` given `volatility`, via the closed-form
/// solution of `g = x^2 / sqrt(x^2 + variance)` for `x = 1 + r`.
pub fn arithmetic_return_from_cagr(cagr: f64, volatility: f64) -> f64 {
    let g = 1.0 + cagr;
    let variance = volatility * volatility;
    let u = (g * g + g * (g * g + 4.0 * variance).sqrt()) / 2.0;
    u.sqrt() - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_period_returns_short_input() {
        assert!(holding_period_returns(&[]).is_empty());
        assert!(holding_period_returns(&[1.0]).is_empty());
    }

    #[test]
    fn holding_period_returns_matches_ratio() {
        let quotes = [110.0, 100.0];
        let r = holding_period_returns(&quotes);
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn time_weighted_return_of_empty_is_zero() {
        assert_eq!(time_weighted_return(&[]), 0.0);
    }

    #[test]
    fn round_trip_holding_period_returns_to_cumulative_product() {
        let quotes = [121.0, 110.0, 100.0];
        let returns = holding_period_returns(&quotes);
        let cumulative = returns.iter().fold(1.0, |acc, r| acc * (1.0 + r));
        assert!((cumulative - quotes[0] / quotes[quotes.len() - 1]).abs() < 1e-9);
    }

    #[test]
    fn cagr_arithmetic_round_trip() {
        let vol = 0.15;
        for arithmetic in [0.02, 0.08, 0.20, -0.05] {
            let cagr = cagr_from_arithmetic_return(arithmetic, vol);
            let recovered = arithmetic_return_from_cagr(cagr, vol);
            assert!(
                (recovered - arithmetic).abs() < 1e-6,
                "arithmetic={arithmetic} cagr={cagr} recovered={recovered}"
            );
        }
    }

    #[test]
    fn cagr_clamps_extreme_losses() {
        let clamped = cagr_from_arithmetic_return(-0.9999, 0.1);
        let zero = cagr_from_arithmetic_return(0.0, 0.1);
        assert_eq!(clamped, zero);
    }

    #[test]
    fn correlation_matrix_diagonal_is_one() {
        let cols = vec![vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]];
        let m = correlation_matrix(&cols);
        assert_eq!(m[0], 1.0);
        assert_eq!(m[1 * 2 + 1], 1.0);
        assert!((m[0 * 2 + 1] - (-1.0)).abs() < 1e-9);
        assert_eq!(m[0 * 2 + 1], m[1 * 2 + 0]);
    }

    #[test]
    fn risk_contributions_sum_to_total_risk() {
        let weights = [0.5, 0.5];
        let std_devs = [0.2, 0.3];
        let correlations = correlation_matrix(&[vec![1.0, 0.5, -0.3], vec![0.2, 0.6, 0.1]]);
        let (total, contributions) = portfolio_volatility(&weights, &std_devs, &correlations);
        let sum: f64 = contributions.iter().sum();
        assert!((sum - total).abs() < 1e-9);
    }
}
