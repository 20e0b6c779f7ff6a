//! # porttree
//!
//! A deterministic portfolio back-testing and allocation engine.
//!
//! ## Features
//!
//! - **Aligned return table**: column-oriented time series with
//!   union-of-dates insertion and column-group provenance
//! - **Six allocation algorithms**: Constant, Equal, Equal-Inverse-Variance,
//!   Equal-Volatility, Equal-Inverse-Volatility, Equal-Risk-Contribution
//! - **Nelder-Mead optimizer** with cooperative cancellation, used by
//!   Equal-Risk-Contribution
//! - **Back-test loop**: policy bootstrap, drift, rebalance/update
//!   triggers, reversed-chronology results
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use porttree::algorithms::Algorithm;
//! use porttree::calendar::{Interval, Window};
//! use porttree::cancel::CancelToken;
//! use porttree::table::{List, Return, Table};
//!
//! fn d(s: &str) -> NaiveDate {
//!     NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
//! }
//!
//! let a = List::new(
//!     [("2021-01-03", 0.02), ("2021-01-02", -0.01), ("2021-01-01", 0.03)]
//!         .iter()
//!         .map(|(t, v)| Return::new(d(t), *v).unwrap()),
//! );
//! let b = List::new(
//!     [("2021-01-03", 0.01), ("2021-01-02", 0.02), ("2021-01-01", -0.02)]
//!         .iter()
//!         .map(|(t, v)| Return::new(d(t), *v).unwrap()),
//! );
//! let assets = Table::from_lists([a, b]);
//!
//! let mut cancel = CancelToken::never();
//! let result = porttree::engine::run(
//!     &mut cancel,
//!     &assets,
//!     None,
//!     None,
//!     &Algorithm::Equal,
//!     Window::OneYear,
//!     Interval::Monthly.trigger(),
//!     Interval::Quarterly.trigger(),
//! )
//! .unwrap();
//!
//! assert_eq!(result.weights.len(), result.returns.number_of_rows());
//! ```
//!
//! ## Cancellation
//!
//! The optimizer and the engine both cooperate with an external
//! [`cancel::CancelToken`] rather than blocking indefinitely:
//!
//! ```
//! use porttree::cancel;
//!
//! let (canceller, mut token) = cancel::channel();
//! assert!(!token.is_cancelled());
//! canceller.cancel();
//! assert!(token.is_cancelled());
//! ```
//!
//! ## Portfolio Specifications
//!
//! Portfolios are described in a `---`-separated YAML document stream
//! (see [`spec::PortfolioSpec`]):
//!
//! ```
//! use porttree::spec::PortfolioSpec;
//!
//! let yaml = r#"
//! type: Portfolio
//! metadata:
//!   name: Sample
//! spec:
//!   assets:
//!     - AAA
//!     - BBB
//!   policy:
//!     weights_algorithm: Equal Weights
//!     weights_algorithm_look_back_window: 1 Year
//!     weights_updating_interval: Monthly
//!     rebalancing_interval: Quarterly
//! "#;
//!
//! let specs = PortfolioSpec::parse_documents(yaml).unwrap();
//! assert_eq!(specs[0].assets.len(), 2);
//! ```

pub mod algorithms;
pub mod calendar;
pub mod cancel;
pub mod engine;
mod error;
#[cfg(feature = "http-fetch")]
pub mod fetch;
pub mod metrics;
pub mod numeric;
pub mod optimize;
pub mod persistence;
pub mod spec;
pub mod table;

pub use error::{Error, Result};
