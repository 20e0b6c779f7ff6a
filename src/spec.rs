//! The portfolio specification aggregate: assets, policy, and the YAML
//! document format used to load them from disk.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::algorithms::Algorithm;
use crate::calendar::{Interval, Window};
use crate::cancel::CancelToken;
use crate::engine::{self, BacktestResult};
use crate::error::{Error, Result};
use crate::table::Table;

/// A YAML `<component>`: either a bare identifier string or a mapping with
/// a type, id, and label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Component {
    /// A caller-defined category, e.g. `"Security"` or `"Index"`. Empty
    /// when the component was given as a bare scalar.
    #[serde(rename = "type")]
    pub component_type: String,
    /// The asset identifier. Must not be empty or the literal `"undefined"`.
    pub id: String,
    /// A human-readable label, defaulting to `id` when omitted.
    pub label: String,
}

impl Component {
    /// Builds a component from a bare identifier.
    pub fn scalar(id: impl Into<String>) -> Self {
        let id = id.into();
        Component {
            component_type: String::new(),
            label: id.clone(),
            id,
        }
    }

    /// Validates the identifier: alphanumeric, `.`, or `:`, 1-24 characters,
    /// and not the reserved string `"undefined"`.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.is_empty() {
            return Err("component id must not be empty".to_string());
        }
        if self.id == "undefined" {
            return Err("component id must not be \"undefined\"".to_string());
        }
        if self.id.len() > 24 {
            return Err(format!("component id {:?} exceeds 24 characters", self.id));
        }
        if !self
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == ':')
        {
            return Err(format!(
                "component id {:?} must contain only letters, digits, '.', or ':'",
                self.id
            ));
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Component {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Scalar(String),
            Mapping {
                #[serde(default, rename = "type")]
                component_type: String,
                id: String,
                #[serde(default)]
                label: Option<String>,
            },
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Scalar(id) => Component::scalar(id),
            Raw::Mapping {
                component_type,
                id,
                label,
            } => {
                let label = label.unwrap_or_else(|| id.clone());
                Component {
                    component_type,
                    id,
                    label,
                }
            }
        })
    }
}

/// The policy governing how target weights are chosen and when they are
/// applied.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Weights used when `weights_algorithm` is `"Constant Weights"`.
    #[serde(default)]
    pub weights: Vec<f64>,
    /// The algorithm name, see [`Algorithm::by_name`].
    pub weights_algorithm: String,
    /// The look-back window string, see [`Window::parse`].
    pub weights_algorithm_look_back_window: String,
    /// The policy-update interval string, see [`Interval::parse`].
    pub weights_updating_interval: String,
    /// The rebalance interval string, see [`Interval::parse`].
    pub rebalancing_interval: String,
}

/// Portfolio metadata: a display name and an optional benchmark component.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    /// A human-readable name for the portfolio.
    #[serde(default)]
    pub name: String,
    /// An optional benchmark to compare the back-test against.
    #[serde(default)]
    pub benchmark: Option<Component>,
}

/// The `spec:` body of a portfolio document.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SpecBody {
    assets: Vec<Component>,
    policy: Policy,
}

/// One `---`-separated YAML document.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    metadata: Metadata,
    spec: SpecBody,
}

/// A portfolio specification: assets, policy, and metadata, aggregated for
/// the back-test engine.
#[derive(Clone, Debug)]
pub struct PortfolioSpec {
    /// The assets in this portfolio.
    pub assets: Vec<Component>,
    /// The allocation/rebalance policy.
    pub policy: Policy,
    /// Display metadata.
    pub metadata: Metadata,
}

impl PortfolioSpec {
    /// Parses a multi-document YAML stream, returning every document whose
    /// `type` is `"Portfolio"`.
    pub fn parse_documents(yaml: &str) -> Result<Vec<PortfolioSpec>> {
        let mut specs = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            let document = Document::deserialize(doc)?;
            if document.kind != "Portfolio" {
                return Err(Error::DecodeFailure(format!(
                    "unsupported document type {:?}",
                    document.kind
                )));
            }
            specs.push(PortfolioSpec {
                assets: document.spec.assets,
                policy: document.spec.policy,
                metadata: document.metadata,
            });
        }
        Ok(specs)
    }

    /// Validates every asset identifier, collecting all failures.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.assets.is_empty() {
            errors.push("portfolio has no assets".to_string());
        }
        for asset in &self.assets {
            if let Err(e) = asset.validate() {
                errors.push(e);
            }
        }
        if self.policy.weights_algorithm == "Constant Weights"
            && self.policy.weights.len() != self.assets.len()
        {
            errors.push(format!(
                "constant weights policy has {} weights for {} assets",
                self.policy.weights.len(),
                self.assets.len()
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailure(errors))
        }
    }

    /// Resolves the policy's named algorithm, falling back to `override_algorithm`
    /// when supplied.
    fn resolve_algorithm(&self, override_algorithm: Option<Algorithm>) -> Result<Algorithm> {
        if let Some(algo) = override_algorithm {
            return Ok(algo);
        }
        if self.policy.weights_algorithm == "Constant Weights" {
            if self.policy.weights.len() != self.assets.len() {
                return Err(Error::SizeMismatch {
                    expected: self.assets.len(),
                    actual: self.policy.weights.len(),
                });
            }
            return Ok(Algorithm::Constant(self.policy.weights.clone()));
        }
        Algorithm::by_name(&self.policy.weights_algorithm)
    }

    /// Runs a back-test for this spec against `asset_returns`, a table whose
    /// columns are positionally aligned with `self.assets`.
    pub fn backtest(
        &self,
        cancel: &mut CancelToken,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        asset_returns: &Table,
        override_algorithm: Option<Algorithm>,
    ) -> Result<BacktestResult> {
        self.validate()?;
        let algorithm = self.resolve_algorithm(override_algorithm)?;
        let lookback = Window::parse(&self.policy.weights_algorithm_look_back_window)
            .ok_or_else(|| Error::DecodeFailure("unknown look-back window".to_string()))?;
        let update_interval = Interval::parse(&self.policy.weights_updating_interval)
            .ok_or_else(|| Error::DecodeFailure("unknown policy update interval".to_string()))?;
        let rebalance_interval = Interval::parse(&self.policy.rebalancing_interval)
            .ok_or_else(|| Error::DecodeFailure("unknown rebalance interval".to_string()))?;

        engine::run(
            cancel,
            asset_returns,
            start,
            end,
            &algorithm,
            lookback,
            update_interval.trigger(),
            rebalance_interval.trigger(),
        )
    }
}
