//! JSON persistence for a [`BacktestResult`](crate::engine::BacktestResult).
//!
//! BSON and MongoDB identifiers are not handled here; only the JSON
//! projection of a result is supported.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::BacktestResult;
use crate::table::Return;

/// The JSON-serializable shape of a [`BacktestResult`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedResult {
    /// `{times, values}` projection of the result's two-column return table.
    pub returns_table: ReturnsTable,
    /// Per-period weight snapshots.
    pub weights: Vec<Vec<f64>>,
    /// The final policy weight vector.
    pub policy_weights: Vec<f64>,
    /// Dates on which a rebalance fired.
    pub rebalance_dates: Vec<chrono::NaiveDate>,
    /// Dates on which a policy update fired.
    pub policy_updates_dates: Vec<chrono::NaiveDate>,
}

/// The wire schema shared with the asset-return fetch endpoint: parallel
/// `times` and per-column `values`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReturnsTable {
    /// Observation dates.
    pub times: Vec<chrono::NaiveDate>,
    /// One entry per column, each aligned positionally to `times`.
    pub values: Vec<Vec<f64>>,
}

impl From<&BacktestResult> for PersistedResult {
    fn from(result: &BacktestResult) -> Self {
        PersistedResult {
            returns_table: ReturnsTable {
                times: result.returns.times().to_vec(),
                values: result.returns.column_values().to_vec(),
            },
            weights: result.weights.clone(),
            policy_weights: result.policy_weights.clone(),
            rebalance_dates: result.rebalance_times.clone(),
            policy_updates_dates: result.policy_update_times.clone(),
        }
    }
}

impl ReturnsTable {
    /// Builds a [`crate::table::Table`] from this wire schema, treating each
    /// entry of `values` as one column's observations.
    pub fn into_table(self) -> crate::error::Result<crate::table::Table> {
        let mut lists = Vec::with_capacity(self.values.len());
        for column in self.values {
            if column.len() != self.times.len() {
                return Err(crate::error::Error::DecodeFailure(format!(
                    "column has {} values for {} times",
                    column.len(),
                    self.times.len()
                )));
            }
            let returns = self
                .times
                .iter()
                .zip(column)
                .map(|(&time, value)| {
                    Return::new(time, value)
                        .ok_or_else(|| crate::error::Error::DecodeFailure("non-finite value".to_string()))
                })
                .collect::<crate::error::Result<Vec<_>>>()?;
            lists.push(crate::table::List::new(returns));
        }
        Ok(crate::table::Table::from_lists(lists))
    }
}

/// Saves a result to `path` as pretty-printed JSON.
pub fn save(result: &BacktestResult, path: &Path) -> io::Result<()> {
    let persisted = PersistedResult::from(result);
    let json = serde_json::to_string_pretty(&persisted)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(path, json)
}

/// Loads a previously saved result.
pub fn load(path: &Path) -> io::Result<PersistedResult> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
