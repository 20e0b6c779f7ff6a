//! The back-test simulation loop: policy bootstrap, per-period drift,
//! trigger evaluation, and reversed-chronology result assembly.

use chrono::NaiveDate;
use log::{debug, warn};

use crate::algorithms::Algorithm;
use crate::calendar::{Trigger, Window};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::table::Table;

/// The outcome of a back-test run.
#[derive(Clone, Debug)]
pub struct BacktestResult {
    /// A two-column table: the realized portfolio return and the
    /// daily-rebalanced benchmark return, most-recent-first.
    pub returns: Table,
    /// Per-period weight snapshots, parallel to `returns`, most-recent-first.
    pub weights: Vec<Vec<f64>>,
    /// The final policy weight vector in effect at the end of the run.
    pub policy_weights: Vec<f64>,
    /// Dates on which a rebalance fired, most-recent-first.
    pub rebalance_times: Vec<NaiveDate>,
    /// Dates on which a policy update fired, most-recent-first.
    pub policy_update_times: Vec<NaiveDate>,
}

/// Runs a back-test over `assets` from `start` to `end` (inclusive).
///
/// `start`/`end` of `None` default to the table's envelope. `lookback`
/// bounds the window of history the algorithm may consult at each step.
/// `should_update_policy` and `should_rebalance` are independent schedules.
#[allow(clippy::too_many_arguments)]
pub fn run(
    cancel: &mut CancelToken,
    assets: &Table,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    algorithm: &Algorithm,
    lookback: Window,
    mut should_update_policy: Trigger,
    mut should_rebalance: Trigger,
) -> Result<BacktestResult> {
    if assets.number_of_columns() == 0 {
        return Err(Error::NoAssets);
    }

    let table_first = assets.first_time().ok_or(Error::NotEnoughData)?;
    let table_last = assets.last_time().ok_or(Error::NotEnoughData)?;
    let start = start.unwrap_or(table_first);
    let end = end.unwrap_or(table_last);
    if end > table_last || start < table_first {
        return Err(Error::NotEnoughData);
    }

    let n = assets.number_of_columns();
    let (first_policy_date, mut policy_weights) =
        bootstrap_policy(cancel, assets, start, end, algorithm, lookback, n)?;

    let mut updated_weights = policy_weights.clone();
    let mut updated_daily_weights = policy_weights.clone();

    let mut back_test_times = Vec::new();
    let mut back_test_returns = Vec::new();
    let mut daily_rebalanced_returns = Vec::new();
    let mut weight_history = Vec::new();
    let mut rebalance_times = Vec::new();
    let mut policy_update_times = Vec::new();

    let mut today = first_policy_date;
    loop {
        if today > end {
            break;
        }

        rescale_in_place(&mut updated_weights);
        rescale_in_place(&mut updated_daily_weights);

        let historic_returns = lookback.apply(today, assets);
        let asset_returns_today = historic_returns.most_recent_values();

        if today != first_policy_date && should_update_policy.check(today, &updated_daily_weights) {
            match algorithm.policy_weights(cancel, today, &historic_returns, &updated_weights) {
                Ok(mut w) => {
                    if w.len() != n {
                        return Err(Error::SizeMismatch {
                            expected: n,
                            actual: w.len(),
                        });
                    }
                    rescale_in_place(&mut w);
                    policy_weights = w;
                    policy_update_times.push(today);
                    debug!("policy update at {today}");
                }
                Err(Error::Cancelled) => {
                    warn!("policy update cancelled at {today}");
                    return Err(Error::Cancelled);
                }
                Err(Error::OptimizerExhausted) => {
                    warn!("optimizer exhausted during policy update at {today}");
                    return Err(Error::OptimizerExhausted);
                }
                Err(e) => return Err(e),
            }
        }

        weight_history.push(updated_weights.clone());

        back_test_returns.push(dot(&updated_weights, &asset_returns_today));
        daily_rebalanced_returns.push(dot(&updated_daily_weights, &asset_returns_today));
        back_test_times.push(today);

        if !asset_returns_today.is_empty() {
            for (w, r) in updated_weights.iter_mut().zip(&asset_returns_today) {
                *w *= 1.0 + r;
            }
            for (w, r) in updated_daily_weights.iter_mut().zip(&asset_returns_today) {
                *w *= 1.0 + r;
            }
        }

        if should_rebalance.check(today, &updated_daily_weights) {
            updated_weights = policy_weights.clone();
            rebalance_times.push(today);
            debug!("rebalance at {today}");
        }

        updated_daily_weights = policy_weights.clone();

        match assets.time_after(today) {
            Some(next) if next <= end => today = next,
            _ => break,
        }
    }

    back_test_times.reverse();
    back_test_returns.reverse();
    daily_rebalanced_returns.reverse();
    weight_history.reverse();
    rebalance_times.reverse();
    policy_update_times.reverse();

    let returns_table = Table::from_lists([
        crate::table::List::new(
            back_test_times
                .iter()
                .zip(&back_test_returns)
                .map(|(&t, &v)| crate::table::Return { time: t, value: v }),
        ),
        crate::table::List::new(
            back_test_times
                .iter()
                .zip(&daily_rebalanced_returns)
                .map(|(&t, &v)| crate::table::Return { time: t, value: v }),
        ),
    ]);

    Ok(BacktestResult {
        returns: returns_table,
        weights: weight_history,
        policy_weights,
        rebalance_times,
        policy_update_times,
    })
}

fn rescale_in_place(weights: &mut [f64]) {
    let sum: f64 = weights.iter().sum();
    if sum != 0.0 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
}

fn dot(weights: &[f64], returns: &[f64]) -> f64 {
    weights.iter().zip(returns).map(|(w, r)| w * r).sum()
}

fn bootstrap_policy(
    cancel: &mut CancelToken,
    assets: &Table,
    start: NaiveDate,
    end: NaiveDate,
    algorithm: &Algorithm,
    lookback: Window,
    n: usize,
) -> Result<(NaiveDate, Vec<f64>)> {
    let mut today = start;
    loop {
        if today > end {
            return Err(Error::NotEnoughData);
        }
        let window = lookback.apply(today, assets);
        match algorithm.policy_weights(cancel, today, &window, &vec![0.0; n]) {
            Ok(mut w) => {
                if w.len() != n {
                    return Err(Error::SizeMismatch {
                        expected: n,
                        actual: w.len(),
                    });
                }
                rescale_in_place(&mut w);
                return Ok((today, w));
            }
            Err(Error::NotEnoughData) => match assets.time_after(today) {
                Some(next) => today = next,
                None => return Err(Error::NotEnoughData),
            },
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{List, Return};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn returns_column(pairs: &[(&str, f64)]) -> List {
        List::new(pairs.iter().map(|(t, v)| Return::new(d(t), *v).unwrap()))
    }

    #[test]
    fn end_before_start_is_not_enough_data() {
        let assets = Table::from_lists([returns_column(&[
            ("2020-01-03", 0.01),
            ("2020-01-02", 0.02),
            ("2020-01-01", 0.03),
        ])]);
        let mut cancel = CancelToken::never();
        let err = run(
            &mut cancel,
            &assets,
            Some(d("2020-01-03")),
            Some(d("2020-01-01")),
            &Algorithm::Equal,
            Window::OneDay,
            interval_trigger(),
            interval_trigger(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotEnoughData));
    }

    fn interval_trigger() -> Trigger {
        crate::calendar::Interval::Daily.trigger()
    }

    #[test]
    fn daily_rebalance_matches_benchmark_series() {
        let a = returns_column(&[
            ("2021-01-04", 0.02),
            ("2021-01-03", -0.01),
            ("2021-01-02", 0.03),
            ("2021-01-01", 0.01),
        ]);
        let b = returns_column(&[
            ("2021-01-04", -0.02),
            ("2021-01-03", 0.04),
            ("2021-01-02", -0.03),
            ("2021-01-01", 0.05),
        ]);
        let assets = Table::from_lists([a, b]);
        let mut cancel = CancelToken::never();
        let result = run(
            &mut cancel,
            &assets,
            None,
            None,
            &Algorithm::Equal,
            Window::OneYear,
            interval_trigger(),
            interval_trigger(),
        )
        .unwrap();
        for (a, b) in result
            .returns
            .column_values()[0]
            .iter()
            .zip(&result.returns.column_values()[1])
        {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn single_asset_weight_is_always_one() {
        let a = returns_column(&[
            ("2021-01-03", 0.01),
            ("2021-01-02", 0.02),
            ("2021-01-01", 0.03),
        ]);
        let assets = Table::from_lists([a]);
        let mut cancel = CancelToken::never();
        let result = run(
            &mut cancel,
            &assets,
            None,
            None,
            &Algorithm::Equal,
            Window::OneYear,
            interval_trigger(),
            interval_trigger(),
        )
        .unwrap();
        for w in &result.weights {
            assert_eq!(w, &vec![1.0]);
        }
    }
}
