//! Calendar helpers: trigger intervals and look-back windows.
//!
//! Triggers are small value types rather than captured closures: each one
//! remembers the date of its previous call and answers `check(today)` in
//! constant time, which keeps them `Copy`/`Clone` and safe to replay.

use chrono::{Datelike, NaiveDate};

use crate::table::Table;

/// How often a scheduled event (rebalance, policy update) should fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
    /// Never fires.
    Never,
    /// Fires on every call.
    Daily,
    /// Fires on the first call of each ISO week.
    Weekly,
    /// Fires on the first call of each calendar month.
    Monthly,
    /// Fires on the first call of January, April, July, or October.
    Quarterly,
    /// Fires on the first call of January.
    Annually,
}

impl Interval {
    /// Parses one of the canonical interval strings from the portfolio
    /// specification format.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "Never" => Interval::Never,
            "Daily" => Interval::Daily,
            "Weekly" => Interval::Weekly,
            "Monthly" => Interval::Monthly,
            "Quarterly" => Interval::Quarterly,
            "Annually" => Interval::Annually,
            _ => return None,
        })
    }

    /// Builds a fresh, stateless trigger for this interval.
    pub fn trigger(self) -> Trigger {
        Trigger {
            interval: self,
            previous: None,
        }
    }
}

/// A stateful predicate deciding whether a scheduled event fires on a given
/// date. Carries only the previous call's date.
#[derive(Clone, Copy, Debug)]
pub struct Trigger {
    interval: Interval,
    previous: Option<NaiveDate>,
}

impl Trigger {
    /// Evaluates the trigger for `today` and advances its internal state.
    /// The `weights` parameter is accepted (and ignored) to match the shape
    /// of algorithms that might someday gate on portfolio state, mirroring
    /// the `should_rebalance`/`should_update_policy` call sites in the
    /// engine loop.
    pub fn check(&mut self, today: NaiveDate, _weights: &[f64]) -> bool {
        let fired = match self.interval {
            Interval::Never => false,
            Interval::Daily => true,
            Interval::Weekly => match self.previous {
                None => true,
                Some(prev) => today.weekday().num_days_from_sunday()
                    < prev.weekday().num_days_from_sunday(),
            },
            Interval::Monthly => match self.previous {
                None => true,
                Some(prev) => today.day() < prev.day(),
            },
            Interval::Quarterly => {
                let month_rolled = match self.previous {
                    None => true,
                    Some(prev) => today.day() < prev.day(),
                };
                month_rolled && matches!(today.month(), 1 | 4 | 7 | 10)
            }
            Interval::Annually => {
                let month_rolled = match self.previous {
                    None => true,
                    Some(prev) => today.day() < prev.day(),
                };
                month_rolled && today.month() == 1
            }
        };
        self.previous = Some(today);
        fired
    }
}

/// A named look-back or horizon duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Window {
    OneDay,
    OneWeek,
    OneMonth,
    OneQuarter,
    OneYear,
    ThreeYears,
    FiveYears,
}

impl Window {
    /// Parses one of the canonical window strings from the portfolio
    /// specification format.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "1 Day" => Window::OneDay,
            "1 Week" => Window::OneWeek,
            "1 Month" => Window::OneMonth,
            "1 Quarter" => Window::OneQuarter,
            "1 Year" => Window::OneYear,
            "3 Years" => Window::ThreeYears,
            "5 Years" => Window::FiveYears,
            _ => return None,
        })
    }

    /// Adds the window's duration to `t`.
    pub fn add(self, t: NaiveDate) -> NaiveDate {
        match self {
            Window::OneDay => t + chrono::Duration::days(1),
            Window::OneWeek => t + chrono::Duration::days(7),
            Window::OneMonth => add_months(t, 1),
            Window::OneQuarter => add_months(t, 3),
            Window::OneYear => add_months(t, 12),
            Window::ThreeYears => add_months(t, 36),
            Window::FiveYears => add_months(t, 60),
        }
    }

    /// Subtracts the window's duration from `t`. Not the exact inverse of
    /// [`Window::add`] — several variants carry a deliberate one-day
    /// asymmetry so a look-back window includes both its boundary dates.
    pub fn sub(self, t: NaiveDate) -> NaiveDate {
        match self {
            Window::OneDay => t - chrono::Duration::days(1),
            Window::OneWeek => t - chrono::Duration::days(6),
            Window::OneMonth => add_months(t, -1) + chrono::Duration::days(1),
            Window::OneQuarter => add_months(t, -3) + chrono::Duration::days(1),
            Window::OneYear => add_months(t, -12) + chrono::Duration::days(1),
            Window::ThreeYears => add_months(t, -36) + chrono::Duration::days(1),
            Window::FiveYears => add_months(t, -60) + chrono::Duration::days(1),
        }
    }

    /// Restricts `table` to the look-back window ending at `today`.
    pub fn apply(self, today: NaiveDate, table: &Table) -> Table {
        table.between(today, self.sub(today))
    }
}

fn add_months(t: NaiveDate, months: i32) -> NaiveDate {
    let total = t.year() * 12 + (t.month() as i32 - 1) + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let last_day = days_in_month(year, month);
    NaiveDate::from_ymd_opt(year, month, t.day().min(last_day))
        .expect("normalized year/month/day must be valid")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("next-month boundary must be valid");
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("first-of-month must be valid");
    (next - first).num_days() as u32
}
