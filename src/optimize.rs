//! Nelder-Mead simplex minimization, used by the Equal-Risk-Contribution
//! allocation algorithm.
//!
//! The objective is always evaluated on a unit-sum rescaling of the
//! candidate point, so the search is effectively constrained to the simplex
//! without needing a projection step on every move. The search cooperates
//! with an external [`CancelToken`] rather than blocking indefinitely: past
//! a fixed number of objective evaluations it starts polling the token, and
//! past a hard cap it gives up.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

const MAX_TRIES: u32 = 50_000;
const PRE_CANCEL_CHECK_TRIES: u32 = 10_000;
const SKIP_CANCEL_CHECK_COUNT: u32 = 500;

const ABSOLUTE_TOLERANCE: f64 = 1e-10;
const CONVERGED_ITERATIONS: u32 = 1000;

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Rescales `x` to sum to 1, leaving it unchanged if the sum is zero.
pub fn rescale_to_unit(x: &[f64]) -> Vec<f64> {
    let sum: f64 = x.iter().sum();
    if sum == 0.0 {
        x.to_vec()
    } else {
        x.iter().map(|v| v / sum).collect()
    }
}

struct Watchdog {
    tries: u32,
}

impl Watchdog {
    fn new() -> Self {
        Watchdog { tries: 0 }
    }

    /// Called once per objective evaluation. Returns an error once the
    /// search should stop.
    fn tick(&mut self, cancel: &mut CancelToken) -> Result<()> {
        self.tries += 1;
        if self.tries > MAX_TRIES {
            return Err(Error::OptimizerExhausted);
        }
        if self.tries > PRE_CANCEL_CHECK_TRIES && self.tries % SKIP_CANCEL_CHECK_COUNT == 0 {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }
}

/// Minimizes `objective` starting from `weights`, overwriting `weights` with
/// the rescaled minimizer on success.
///
/// `objective` is called with a unit-sum-rescaled candidate point on every
/// evaluation.
pub fn minimize_weights(
    weights: &mut [f64],
    cancel: &mut CancelToken,
    mut objective: impl FnMut(&[f64]) -> f64,
) -> Result<()> {
    let n = weights.len();
    if n == 0 {
        return Ok(());
    }
    let mut watchdog = Watchdog::new();
    let mut wrapped = |x: &[f64]| -> f64 { objective(&rescale_to_unit(x)) };

    let mut simplex = initial_simplex(weights);
    let mut values: Vec<f64> = simplex.iter().map(|p| wrapped(p)).collect();
    for _ in 0..n {
        watchdog.tick(cancel)?;
    }

    let mut converged_streak = 0u32;

    loop {
        let (best, worst, second_worst) = rank(&values);

        if (values[worst] - values[best]).abs() <= ABSOLUTE_TOLERANCE {
            converged_streak += 1;
        } else {
            converged_streak = 0;
        }
        if converged_streak >= CONVERGED_ITERATIONS {
            break;
        }

        let centroid = centroid_excluding(&simplex, worst);

        let reflected = step(&centroid, &simplex[worst], REFLECT);
        watchdog.tick(cancel)?;
        let reflected_value = wrapped(&reflected);

        if reflected_value < values[best] {
            let expanded = step(&centroid, &simplex[worst], EXPAND);
            watchdog.tick(cancel)?;
            let expanded_value = wrapped(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
        } else if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
        } else {
            let contracted = step(&centroid, &simplex[worst], CONTRACT);
            watchdog.tick(cancel)?;
            let contracted_value = wrapped(&contracted);
            if contracted_value < values[worst] {
                simplex[worst] = contracted;
                values[worst] = contracted_value;
            } else {
                shrink_simplex(&mut simplex, best, SHRINK);
                for (i, p) in simplex.iter().enumerate() {
                    if i != best {
                        watchdog.tick(cancel)?;
                    }
                }
                values = simplex.iter().map(|p| wrapped(p)).collect();
            }
        }
    }

    let (best, _, _) = rank(&values);
    let solution = rescale_to_unit(&simplex[best]);
    weights.copy_from_slice(&solution);
    Ok(())
}

fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let n = start.len();
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut point = start.to_vec();
        point[i] = if point[i] == 0.0 {
            0.00025
        } else {
            point[i] * 1.05
        };
        simplex.push(point);
    }
    simplex
}

fn rank(values: &[f64]) -> (usize, usize, usize) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(std::cmp::Ordering::Equal));
    let best = order[0];
    let worst = order[order.len() - 1];
    let second_worst = order[order.len() - 2];
    (best, worst, second_worst)
}

fn centroid_excluding(simplex: &[Vec<f64>], excluded: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let mut centroid = vec![0.0; n];
    let mut count = 0;
    for (i, point) in simplex.iter().enumerate() {
        if i == excluded {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(point) {
            *c += v;
        }
        count += 1;
    }
    for c in &mut centroid {
        *c /= count as f64;
    }
    centroid
}

fn step(centroid: &[f64], worst: &[f64], coefficient: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(worst)
        .map(|(c, w)| c + coefficient * (c - w))
        .collect()
}

fn shrink_simplex(simplex: &mut [Vec<f64>], best: usize, coefficient: f64) {
    let anchor = simplex[best].clone();
    for (i, point) in simplex.iter_mut().enumerate() {
        if i == best {
            continue;
        }
        for (p, a) in point.iter_mut().zip(&anchor) {
            *p = a + coefficient * (*p - a);
        }
    }
}
