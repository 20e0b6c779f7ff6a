//! Back-test engine benchmarks: a multi-year daily run across a handful of
//! assets under the default allocation algorithms.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use porttree::algorithms::Algorithm;
use porttree::calendar::{Interval, Window};
use porttree::cancel::CancelToken;
use porttree::table::{List, Return, Table};

fn synthetic_assets(n_days: usize, n_assets: usize) -> Table {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let mut state: u32 = 7;
    let lists = (0..n_assets)
        .map(|_| {
            let returns = (0..n_days).map(|d| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let value = ((state % 201) as f64 - 100.0) / 5_000.0;
                Return::new(start + chrono::Duration::days(d as i64), value).unwrap()
            });
            List::new(returns)
        })
        .collect::<Vec<_>>();
    Table::from_lists(lists)
}

fn bench_equal_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/equal_weights");
    let table = synthetic_assets(252 * 10, 10);

    group.bench_function(BenchmarkId::new("daily", "10y_10assets"), |b| {
        b.iter(|| {
            let mut cancel = CancelToken::never();
            black_box(
                porttree::engine::run(
                    &mut cancel,
                    &table,
                    None,
                    None,
                    &Algorithm::Equal,
                    Window::OneYear,
                    Interval::Monthly.trigger(),
                    Interval::Quarterly.trigger(),
                )
                .unwrap(),
            )
        })
    });

    group.finish();
}

fn bench_equal_risk_contribution(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/equal_risk_contribution");
    let table = synthetic_assets(252 * 3, 5);

    group.bench_function(BenchmarkId::new("daily", "3y_5assets"), |b| {
        b.iter(|| {
            let mut cancel = CancelToken::never();
            black_box(
                porttree::engine::run(
                    &mut cancel,
                    &table,
                    None,
                    None,
                    &Algorithm::EqualRiskContribution,
                    Window::OneYear,
                    Interval::Monthly.trigger(),
                    Interval::Quarterly.trigger(),
                )
                .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_equal_weights, bench_equal_risk_contribution);
criterion_main!(benches);
