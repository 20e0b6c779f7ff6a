//! End-to-end back-test scenarios.

use chrono::NaiveDate;

use porttree::algorithms::{Algorithm, PolicyWeightCalculator};
use porttree::calendar::{Interval, Window};
use porttree::cancel::{self, CancelToken};
use porttree::engine;
use porttree::table::{List, Return, Table};
use porttree::Error;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn column(pairs: &[(&str, f64)]) -> List {
    List::new(pairs.iter().map(|(t, v)| Return::new(d(t), *v).unwrap()))
}

#[test]
fn end_before_start_is_not_enough_data() {
    let assets = Table::from_lists([column(&[
        ("2020-01-03", 0.01),
        ("2020-01-02", 0.02),
        ("2020-01-01", 0.03),
    ])]);
    let mut cancel = CancelToken::never();
    let err = engine::run(
        &mut cancel,
        &assets,
        Some(d("2020-01-03")),
        Some(d("2020-01-01")),
        &Algorithm::Equal,
        Window::OneDay,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotEnoughData));
}

#[test]
fn daily_rebalancing_equals_benchmark_series() {
    let a = column(&[
        ("2021-01-04", 0.02),
        ("2021-01-03", -0.01),
        ("2021-01-02", 0.03),
        ("2021-01-01", 0.01),
    ]);
    let b = column(&[
        ("2021-01-04", -0.02),
        ("2021-01-03", 0.04),
        ("2021-01-02", -0.03),
        ("2021-01-01", 0.05),
    ]);
    let assets = Table::from_lists([a, b]);
    let mut cancel = CancelToken::never();
    let result = engine::run(
        &mut cancel,
        &assets,
        None,
        None,
        &Algorithm::Equal,
        Window::OneYear,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap();

    let cols = result.returns.column_values();
    for (a, b) in cols[0].iter().zip(&cols[1]) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[test]
fn composite_daily_rebalanced_return_matches_equal_weight_average() {
    // The oldest date never becomes a policy date: its look-back window
    // holds only itself, one row short of the two an algorithm needs.
    let a = column(&[
        ("2021-01-04", 0.20),
        ("2021-01-03", 0.10),
        ("2021-01-02", 0.0),
        ("2021-01-01", 0.50),
    ]);
    let b = column(&[
        ("2021-01-04", 0.0),
        ("2021-01-03", 0.10),
        ("2021-01-02", 0.20),
        ("2021-01-01", -0.30),
    ]);
    let assets = Table::from_lists([a, b]);
    let mut cancel = CancelToken::never();
    let result = engine::run(
        &mut cancel,
        &assets,
        None,
        None,
        &Algorithm::Equal,
        Window::OneYear,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap();

    let rounded: Vec<f64> = result.returns.column_values()[0]
        .iter()
        .map(|v| (v * 100.0).round() / 100.0)
        .collect();
    assert_eq!(rounded, vec![0.10, 0.10, 0.10]);
}

#[test]
fn single_asset_weight_history_is_always_one() {
    let assets = Table::from_lists([column(&[
        ("2021-01-03", 0.01),
        ("2021-01-02", 0.02),
        ("2021-01-01", 0.03),
    ])]);
    let mut cancel = CancelToken::never();
    let result = engine::run(
        &mut cancel,
        &assets,
        None,
        None,
        &Algorithm::Equal,
        Window::OneYear,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap();
    for w in &result.weights {
        assert_eq!(w, &vec![1.0]);
    }
}

/// An algorithm reporting `NotEnoughData` before a cutoff date, then equal
/// weights afterward — exercises the bootstrap's skip-ahead behavior.
struct NotReadyUntil {
    cutoff: NaiveDate,
}

impl PolicyWeightCalculator for NotReadyUntil {
    fn policy_weights(
        &self,
        _cancel: &mut CancelToken,
        today: NaiveDate,
        asset_returns: &porttree::table::Table,
        _current_weights: &[f64],
    ) -> porttree::Result<Vec<f64>> {
        if today < self.cutoff {
            return Err(Error::NotEnoughData);
        }
        let n = asset_returns.number_of_columns();
        Ok(vec![1.0 / n as f64; n])
    }

    fn name(&self) -> &str {
        "not-ready-until"
    }
}

#[test]
fn bootstrap_skips_dates_until_the_algorithm_is_ready() {
    let a = column(&[
        ("2021-04-23", 0.30),
        ("2021-04-22", -0.10),
        ("2021-04-21", 0.25),
        ("2021-04-20", -0.10),
        ("2021-04-19", 0.01),
        ("2021-04-18", 0.02),
        ("2021-04-17", 0.03),
    ]);
    let b = a.clone();
    let assets = Table::from_lists([a, b]);
    let algorithm = Algorithm::Custom(Box::new(NotReadyUntil {
        cutoff: d("2021-04-20"),
    }));
    let mut cancel = CancelToken::never();
    let result = engine::run(
        &mut cancel,
        &assets,
        None,
        None,
        &algorithm,
        Window::OneYear,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap();

    assert_eq!(result.returns.number_of_rows(), 4);
    let rounded: Vec<f64> = result.returns.column_values()[0]
        .iter()
        .map(|v| (v * 100.0).round() / 100.0)
        .collect();
    // returns are reported most-recent-first.
    assert_eq!(rounded, vec![0.30, -0.10, 0.25, -0.10]);
}

struct CancelsOnFirstCall {
    canceller: cancel::Canceller,
}

impl PolicyWeightCalculator for CancelsOnFirstCall {
    fn policy_weights(
        &self,
        cancel: &mut CancelToken,
        _today: NaiveDate,
        asset_returns: &porttree::table::Table,
        _current_weights: &[f64],
    ) -> porttree::Result<Vec<f64>> {
        self.canceller.cancel();
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let n = asset_returns.number_of_columns();
        Ok(vec![1.0 / n as f64; n])
    }

    fn name(&self) -> &str {
        "cancels-on-first-call"
    }
}

#[test]
fn cancellation_during_bootstrap_propagates() {
    let assets = Table::from_lists([column(&[
        ("2021-01-03", 0.01),
        ("2021-01-02", 0.02),
        ("2021-01-01", 0.03),
    ])]);
    let (canceller, mut cancel) = cancel::channel();
    let algorithm = Algorithm::Custom(Box::new(CancelsOnFirstCall { canceller }));
    let err = engine::run(
        &mut cancel,
        &assets,
        None,
        None,
        &algorithm,
        Window::OneYear,
        Interval::Daily.trigger(),
        Interval::Daily.trigger(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
