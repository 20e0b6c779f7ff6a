//! The aligned return table: a column-oriented time series store with
//! union-of-dates insertion semantics, plus [`List`], its row-oriented
//! single-column counterpart.

use chrono::NaiveDate;

use crate::numeric;

/// A single `{time, value}` observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Return {
    /// The observation date.
    pub time: NaiveDate,
    /// The observed value. Must be finite; [`Return::new`] rejects NaN.
    pub value: f64,
}

impl Return {
    /// Builds a `Return`, rejecting non-finite values.
    pub fn new(time: NaiveDate, value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Return { time, value })
        } else {
            None
        }
    }
}

/// An ordered sequence of [`Return`], sorted strictly most-recent-first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct List {
    returns: Vec<Return>,
}

impl List {
    /// Builds a list from an iterator of returns, sorting descending by time.
    pub fn new(returns: impl IntoIterator<Item = Return>) -> Self {
        let mut returns: Vec<Return> = returns.into_iter().collect();
        returns.sort_by(|a, b| b.time.cmp(&a.time));
        List { returns }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// True if the list holds no observations.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// The full observation sequence, most-recent-first.
    pub fn returns(&self) -> &[Return] {
        &self.returns
    }

    /// The oldest time, if any.
    pub fn first_time(&self) -> Option<NaiveDate> {
        self.returns.last().map(|r| r.time)
    }

    /// The most recent time, if any.
    pub fn last_time(&self) -> Option<NaiveDate> {
        self.returns.first().map(|r| r.time)
    }

    /// Inserts `r`, overwriting any existing observation with an equal time.
    pub fn insert(&mut self, r: Return) {
        match self.returns.binary_search_by(|probe| r.time.cmp(&probe.time)) {
            Ok(idx) => self.returns[idx] = r,
            Err(idx) => self.returns.insert(idx, r),
        }
    }

    /// Restricts to `last >= time >= first` (inclusive), where `last` is the
    /// more recent bound. Returns an empty list for swapped or
    /// out-of-range bounds.
    pub fn between(&self, last: NaiveDate, first: NaiveDate) -> List {
        if first > last {
            return List::default();
        }
        let returns = self
            .returns
            .iter()
            .copied()
            .filter(|r| r.time <= last && r.time >= first)
            .collect();
        List { returns }
    }

    /// Looks up the value at an exact time via binary search.
    pub fn value(&self, time: NaiveDate) -> Option<f64> {
        self.returns
            .binary_search_by(|probe| time.cmp(&probe.time))
            .ok()
            .map(|idx| self.returns[idx].value)
    }

    /// Element-wise excess return against `other`, restricted to dates
    /// present in both lists.
    pub fn excess(&self, other: &List) -> List {
        let returns = self
            .returns
            .iter()
            .filter_map(|r| other.value(r.time).map(|ov| Return::new(r.time, r.value - ov)))
            .flatten()
            .collect();
        List { returns }
    }

    /// Compounded (non-annualized) time-weighted return across all
    /// observations.
    pub fn time_weighted_return(&self) -> f64 {
        numeric::time_weighted_return(&self.values())
    }

    /// Annualized time-weighted return.
    pub fn annualized_time_weighted_return(&self, periods_per_year: f64) -> f64 {
        numeric::annualized_time_weighted_return(&self.values(), periods_per_year)
    }

    /// Annualized arithmetic-mean return.
    pub fn annualized_arithmetic_return(&self, periods_per_year: f64) -> f64 {
        numeric::annualized_arithmetic_return(&self.values(), periods_per_year)
    }

    /// Sample standard deviation of the observations.
    pub fn risk(&self) -> f64 {
        numeric::risk_from_std_dev(&self.values())
    }

    /// Annualized sample standard deviation.
    pub fn annualized_risk(&self, periods_per_year: f64) -> f64 {
        numeric::annualize_risk(self.risk(), periods_per_year)
    }

    fn values(&self) -> Vec<f64> {
        self.returns.iter().map(|r| r.value).collect()
    }
}

/// A contiguous range of columns added to a [`Table`] together, used to
/// retrieve the columns contributed by one call later without renumbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnGroup {
    offset: usize,
    length: usize,
}

/// A column-oriented, time-aligned table of returns.
///
/// Times are kept in a single sorted, strictly decreasing buffer; every
/// column has exactly `times.len()` values, positionally aligned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    times: Vec<NaiveDate>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// An empty table.
    pub fn new() -> Self {
        Table::default()
    }

    /// Builds a table by adding each list as a column, in order.
    pub fn from_lists(lists: impl IntoIterator<Item = List>) -> Self {
        let mut table = Table::new();
        for list in lists {
            table.add_column(list);
        }
        table
    }

    /// Number of columns.
    pub fn number_of_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (dates).
    pub fn number_of_rows(&self) -> usize {
        self.times.len()
    }

    /// All timestamps, most-recent-first.
    pub fn times(&self) -> &[NaiveDate] {
        &self.times
    }

    /// The oldest time in the table.
    pub fn first_time(&self) -> Option<NaiveDate> {
        self.times.last().copied()
    }

    /// The most recent time in the table.
    pub fn last_time(&self) -> Option<NaiveDate> {
        self.times.first().copied()
    }

    /// Adds `list` as a new column, applying union-of-dates semantics: new
    /// dates within the table's current envelope insert a zero-filled row
    /// into every existing column; dates outside the envelope are dropped.
    /// The table itself is narrowed to the incoming list's envelope first,
    /// so existing rows outside the new column's date range are dropped
    /// rather than zero-filled.
    pub fn add_column(&mut self, list: List) {
        if self.columns.is_empty() {
            self.times = list.returns().iter().map(|r| r.time).collect();
            self.columns.push(list.returns().iter().map(|r| r.value).collect());
            return;
        }
        let Some(env_newest) = self.last_time() else {
            return;
        };
        let env_oldest = self.first_time().unwrap();
        let restricted = list.between(env_newest, env_oldest);

        match (restricted.last_time(), restricted.first_time()) {
            (Some(newest), Some(oldest)) => {
                let narrowed = self.between(newest, oldest);
                self.times = narrowed.times;
                self.columns = narrowed.columns;
            }
            _ => {
                self.times.clear();
                for column in &mut self.columns {
                    column.clear();
                }
            }
        }

        for r in restricted.returns() {
            if self.times.binary_search_by(|t| r.time.cmp(t)).is_err() {
                self.insert_empty_row(r.time);
            }
        }

        let new_column: Vec<f64> = self
            .times
            .iter()
            .map(|t| restricted.value(*t).unwrap_or(0.0))
            .collect();
        self.columns.push(new_column);
    }

    fn insert_empty_row(&mut self, time: NaiveDate) {
        let idx = match self.times.binary_search_by(|t| time.cmp(t)) {
            Ok(idx) => idx,
            Err(idx) => idx,
        };
        self.times.insert(idx, time);
        for column in &mut self.columns {
            column.insert(idx, 0.0);
        }
    }

    /// Adds several lists as a contiguous group and returns a handle to
    /// retrieve them later.
    pub fn add_column_group(&mut self, lists: impl IntoIterator<Item = List>) -> ColumnGroup {
        let offset = self.columns.len();
        let mut length = 0;
        for list in lists {
            self.add_column(list);
            length += 1;
        }
        ColumnGroup { offset, length }
    }

    /// Adds every column of `other` as a group. If the receiver is empty,
    /// takes `other` whole, preserving its rows exactly.
    pub fn add_table(&mut self, other: &Table) -> ColumnGroup {
        if self.columns.is_empty() {
            self.times = other.times.clone();
            self.columns = other.columns.clone();
            return ColumnGroup {
                offset: 0,
                length: other.columns.len(),
            };
        }
        self.add_column_group(other.lists())
    }

    /// Restricts to rows with `last >= time >= first`, where `last` is the
    /// more recent bound. Returns an empty table for swapped or
    /// out-of-range bounds.
    pub fn between(&self, last: NaiveDate, first: NaiveDate) -> Table {
        if first > last {
            return Table::new();
        }
        let indices: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, t)| **t <= last && **t >= first)
            .map(|(i, _)| i)
            .collect();
        let times = indices.iter().map(|&i| self.times[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i]).collect())
            .collect();
        Table { times, columns }
    }

    /// Returns the row at an exact time, if present.
    pub fn row(&self, time: NaiveDate) -> Option<Vec<f64>> {
        let idx = self.times.binary_search_by(|t| time.cmp(t)).ok()?;
        Some(self.columns.iter().map(|col| col[idx]).collect())
    }

    /// True if `time` is an exact row.
    pub fn has_row(&self, time: NaiveDate) -> bool {
        self.times.binary_search_by(|t| time.cmp(t)).is_ok()
    }

    /// The most recent row's values (index 0), or an empty vector for an
    /// empty table.
    pub fn most_recent_values(&self) -> Vec<f64> {
        if self.times.is_empty() {
            Vec::new()
        } else {
            self.columns.iter().map(|col| col[0]).collect()
        }
    }

    /// The next time strictly after `time` (i.e. the smallest recorded time
    /// greater than `time`). When `time` precedes the table's oldest date,
    /// returns the oldest date itself; when `time` is at or after the most
    /// recent date, returns `None`.
    pub fn time_after(&self, time: NaiveDate) -> Option<NaiveDate> {
        // times is sorted descending, so scanning from the back gives
        // ascending order and the first match is the smallest time > `time`.
        self.times.iter().rev().copied().find(|&t| t > time)
    }

    /// The time immediately before `time` (i.e. the largest recorded time
    /// less than `time`). When `time` is at or after the most recent date,
    /// returns the most recent date itself; when `time` is at or before the
    /// oldest date, returns `None`.
    pub fn time_before(&self, time: NaiveDate) -> Option<NaiveDate> {
        self.times.iter().copied().find(|&t| t < time)
    }

    /// Materializes column `i` as a [`List`].
    pub fn list(&self, i: usize) -> List {
        let returns = self
            .times
            .iter()
            .zip(self.columns[i].iter())
            .map(|(&time, &value)| Return { time, value })
            .collect::<Vec<_>>();
        List { returns }
    }

    /// Materializes every column as a [`List`].
    pub fn lists(&self) -> Vec<List> {
        (0..self.columns.len()).map(|i| self.list(i)).collect()
    }

    /// Raw column values, in column-major order.
    pub fn column_values(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Slices a [`ColumnGroup`] out as its own table, sharing this table's
    /// rows.
    pub fn column_group_as_table(&self, g: ColumnGroup) -> Table {
        Table {
            times: self.times.clone(),
            columns: self.columns[g.offset..g.offset + g.length].to_vec(),
        }
    }

    /// Raw column values for a [`ColumnGroup`].
    pub fn column_group_values(&self, g: ColumnGroup) -> &[Vec<f64>] {
        &self.columns[g.offset..g.offset + g.length]
    }

    /// Materialized [`List`]s for a [`ColumnGroup`].
    pub fn column_group_lists(&self, g: ColumnGroup) -> Vec<List> {
        (g.offset..g.offset + g.length).map(|i| self.list(i)).collect()
    }

    /// The N x N Pearson correlation matrix across all columns, flat
    /// row-major.
    pub fn correlation_matrix(&self) -> Vec<f64> {
        numeric::correlation_matrix(&self.columns)
    }

    /// Per-column sample standard deviation.
    pub fn risks(&self) -> Vec<f64> {
        self.columns.iter().map(|c| numeric::risk_from_std_dev(c)).collect()
    }

    /// Per-column annualized sample standard deviation.
    pub fn annualized_risks(&self, periods_per_year: f64) -> Vec<f64> {
        self.risks()
            .into_iter()
            .map(|r| numeric::annualize_risk(r, periods_per_year))
            .collect()
    }

    /// Per-column annualized (compounded) time-weighted returns.
    pub fn time_weighted_returns(&self, periods_per_year: f64) -> Vec<f64> {
        self.columns
            .iter()
            .map(|c| numeric::annualized_time_weighted_return(c, periods_per_year))
            .collect()
    }

    /// Per-column annualized arithmetic-mean returns.
    pub fn annualized_arithmetic_returns(&self, periods_per_year: f64) -> Vec<f64> {
        self.columns
            .iter()
            .map(|c| numeric::annualized_arithmetic_return(c, periods_per_year))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn list(pairs: &[(&str, f64)]) -> List {
        List::new(pairs.iter().map(|(t, v)| Return::new(d(t), *v).unwrap()))
    }

    #[test]
    fn list_is_sorted_descending() {
        let l = list(&[("2021-01-01", 1.0), ("2021-03-01", 3.0), ("2021-02-01", 2.0)]);
        assert_eq!(l.first_time(), Some(d("2021-01-01")));
        assert_eq!(l.last_time(), Some(d("2021-03-01")));
    }

    #[test]
    fn add_column_to_empty_table_installs_directly() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-02", 1.0), ("2021-01-01", 2.0)]));
        assert_eq!(t.number_of_columns(), 1);
        assert_eq!(t.number_of_rows(), 2);
    }

    #[test]
    fn add_column_union_of_dates_zero_fills() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-03", 1.0), ("2021-01-01", 2.0)]));
        t.add_column(list(&[("2021-01-03", 10.0), ("2021-01-02", 20.0), ("2021-01-01", 30.0)]));
        assert_eq!(t.number_of_rows(), 3);
        let row = t.row(d("2021-01-02")).unwrap();
        assert_eq!(row, vec![0.0, 20.0]);
    }

    #[test]
    fn add_column_drops_dates_outside_envelope() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-03", 1.0), ("2021-01-01", 2.0)]));
        t.add_column(list(&[("2021-02-01", 99.0), ("2021-01-02", 20.0)]));
        assert!(!t.has_row(d("2021-02-01")));
        assert!(t.has_row(d("2021-01-02")));
    }

    #[test]
    fn add_column_with_no_overlap_empties_every_column() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-03", 1.0), ("2021-01-01", 2.0)]));
        t.add_column(list(&[("2021-02-05", 99.0), ("2021-02-01", 50.0)]));
        assert_eq!(t.number_of_rows(), 0);
        assert_eq!(t.number_of_columns(), 2);
        assert!(t.lists().iter().all(List::is_empty));
    }

    #[test]
    fn between_is_idempotent() {
        let mut t = Table::new();
        t.add_column(list(&[
            ("2021-01-05", 5.0),
            ("2021-01-04", 4.0),
            ("2021-01-03", 3.0),
            ("2021-01-02", 2.0),
            ("2021-01-01", 1.0),
        ]));
        let once = t.between(d("2021-01-04"), d("2021-01-02"));
        let twice = once.between(d("2021-01-04"), d("2021-01-02"));
        assert_eq!(once, twice);
    }

    #[test]
    fn time_after_and_before() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-03", 1.0), ("2021-01-01", 2.0)]));
        assert_eq!(t.time_after(d("2021-01-01")), Some(d("2021-01-03")));
        assert_eq!(t.time_after(d("2020-12-01")), Some(d("2021-01-01")));
        assert_eq!(t.time_before(d("2021-01-03")), Some(d("2021-01-01")));
        assert_eq!(t.time_before(d("2021-01-01")), None);
    }

    #[test]
    fn column_group_round_trips_values() {
        let mut t = Table::new();
        t.add_column(list(&[("2021-01-02", 1.0), ("2021-01-01", 2.0)]));
        let g = t.add_column_group([
            list(&[("2021-01-02", 10.0), ("2021-01-01", 20.0)]),
            list(&[("2021-01-02", 100.0), ("2021-01-01", 200.0)]),
        ]);
        let values = t.column_group_values(g);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], vec![10.0, 20.0]);
    }

    #[test]
    fn list_insert_overwrites_equal_time() {
        let mut l = list(&[("2021-01-01", 1.0)]);
        l.insert(Return::new(d("2021-01-01"), 99.0).unwrap());
        assert_eq!(l.len(), 1);
        assert_eq!(l.value(d("2021-01-01")), Some(99.0));
    }
}
