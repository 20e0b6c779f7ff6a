//! Allocation algorithms: named policies that turn a window of historical
//! returns into a target weight vector.
//!
//! The six built-in algorithms are modeled as a closed tagged enum rather
//! than a trait object hierarchy, since the set is fixed; a `Custom` variant
//! carries a boxed callable for anything outside that set.

use chrono::NaiveDate;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::numeric;
use crate::optimize;
use crate::table::Table;

/// A policy weight calculator: given today's date, a window of historical
/// asset returns, and the current (drift-adjusted) weights, produces a new
/// target weight vector.
pub trait PolicyWeightCalculator {
    /// Computes target weights. Implementations should return
    /// [`Error::NotEnoughData`] when the window does not contain enough
    /// history, which the engine's bootstrap loop treats as "try the next
    /// date" rather than a fatal error.
    fn policy_weights(
        &self,
        cancel: &mut CancelToken,
        today: NaiveDate,
        asset_returns: &Table,
        current_weights: &[f64],
    ) -> Result<Vec<f64>>;

    /// The algorithm's display name.
    fn name(&self) -> &str;
}

/// One of the six built-in algorithms, or a caller-supplied calculator.
pub enum Algorithm {
    /// Always returns a fixed weight vector.
    Constant(Vec<f64>),
    /// `1/N` to every asset.
    Equal,
    /// Inversely proportional to each asset's variance.
    EqualInverseVariance,
    /// Inversely proportional to each asset's volatility.
    EqualInverseVolatility,
    /// Directly proportional to each asset's volatility (preserved exactly
    /// as implemented upstream, despite the unusual "riskier asset gets
    /// more weight" behavior this implies).
    EqualVolatility,
    /// Minimizes the dispersion of per-asset fractional risk contributions
    /// away from `1/N`, via the Nelder-Mead optimizer.
    EqualRiskContribution,
    /// A caller-supplied algorithm.
    Custom(Box<dyn PolicyWeightCalculator>),
}

impl Algorithm {
    /// The canonical name used in the portfolio specification format and in
    /// [`Error::UnknownAlgorithm`] messages.
    pub fn name(&self) -> &str {
        match self {
            Algorithm::Constant(_) => "Constant Weights",
            Algorithm::Equal => "Equal Weights",
            Algorithm::EqualInverseVariance => "Equal Inverse Variance",
            Algorithm::EqualInverseVolatility => "Equal Inverse Volatility",
            Algorithm::EqualVolatility => "Equal Volatility",
            Algorithm::EqualRiskContribution => "Equal Risk Contribution",
            Algorithm::Custom(c) => c.name(),
        }
    }

    /// Looks up a built-in algorithm by its canonical name.
    pub fn by_name(name: &str) -> Result<Algorithm> {
        Ok(match name {
            "Equal Weights" => Algorithm::Equal,
            "Equal Inverse Variance" => Algorithm::EqualInverseVariance,
            "Equal Inverse Volatility" => Algorithm::EqualInverseVolatility,
            "Equal Volatility" => Algorithm::EqualVolatility,
            "Equal Risk Contribution" => Algorithm::EqualRiskContribution,
            _ => return Err(Error::UnknownAlgorithm(name.to_string())),
        })
    }

    /// The built-in registry, in the order new algorithms were added
    /// upstream. `Constant Weights` is omitted since it requires a weight
    /// vector supplied by the caller; see [`Algorithm::by_name`] for
    /// resolving the remaining five by name.
    pub fn default_names() -> &'static [&'static str] {
        &[
            "Equal Weights",
            "Equal Inverse Variance",
            "Equal Risk Contribution",
            "Equal Volatility",
            "Equal Inverse Volatility",
        ]
    }

    /// Computes target weights for this algorithm.
    pub fn policy_weights(
        &self,
        cancel: &mut CancelToken,
        today: NaiveDate,
        asset_returns: &Table,
        current_weights: &[f64],
    ) -> Result<Vec<f64>> {
        let n = asset_returns.number_of_columns();
        if n == 0 || asset_returns.number_of_rows() < 2 {
            if !matches!(self, Algorithm::Constant(_) | Algorithm::Custom(_)) {
                return Err(Error::NotEnoughData);
            }
        }

        let weights = match self {
            Algorithm::Constant(w) => {
                if w.len() != n {
                    return Err(Error::SizeMismatch {
                        expected: n,
                        actual: w.len(),
                    });
                }
                w.clone()
            }
            Algorithm::Equal => equal_weights(n),
            Algorithm::EqualInverseVariance => {
                let std_devs = asset_returns.risks();
                let inv: Vec<f64> = std_devs.iter().map(|s| 1.0 / (s * s)).collect();
                rescale(&inv)
            }
            Algorithm::EqualInverseVolatility => {
                let std_devs = asset_returns.risks();
                let inv: Vec<f64> = std_devs.iter().map(|s| 1.0 / s).collect();
                rescale(&inv)
            }
            Algorithm::EqualVolatility => {
                let std_devs = asset_returns.risks();
                rescale(&std_devs)
            }
            Algorithm::EqualRiskContribution => {
                equal_risk_contribution(cancel, asset_returns, current_weights)?
            }
            Algorithm::Custom(c) => {
                return c.policy_weights(cancel, today, asset_returns, current_weights)
            }
        };
        Ok(rescale(&weights))
    }
}

fn equal_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

fn rescale(values: &[f64]) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    if sum == 0.0 {
        values.to_vec()
    } else {
        values.iter().map(|v| v / sum).collect()
    }
}

fn uniform_if_all_zero(weights: &[f64]) -> Vec<f64> {
    if weights.iter().all(|w| *w == 0.0) {
        equal_weights(weights.len())
    } else {
        weights.to_vec()
    }
}

fn equal_risk_contribution(
    cancel: &mut CancelToken,
    asset_returns: &Table,
    current_weights: &[f64],
) -> Result<Vec<f64>> {
    let n = asset_returns.number_of_columns();
    let std_devs = asset_returns.risks();
    let correlations = asset_returns.correlation_matrix();
    let target = 1.0 / n as f64;

    let mut weights = uniform_if_all_zero(current_weights);
    if weights.len() != n {
        weights = equal_weights(n);
    }

    optimize::minimize_weights(&mut weights, cancel, |w| {
        let (total_risk, contributions) = numeric::portfolio_volatility(w, &std_devs, &correlations);
        if total_risk == 0.0 {
            return f64::MAX;
        }
        contributions
            .iter()
            .map(|c| (target - c / total_risk).abs())
            .sum()
    })?;

    Ok(weights)
}
