//! This module provides the status and metric types shared by all test results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Execution status of a test case
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The check ran and the model satisfied it
    Passed,
    /// The check ran and the model did not satisfy it
    Failed,
    /// The check was not run for this model
    Skipped,
    /// The check raised instead of producing a result
    #[serde(alias = "error")]
    Errored,
}

impl Status {
    /// Whether a test with this status takes part in scoring
    ///
    /// Skipped and errored tests are excluded from aggregation entirely, they
    /// must never count as a zero score.
    pub fn contributes_to_score(&self) -> bool {
        matches!(self, Status::Passed | Status::Failed)
    }
}

/// Execution status of a test, either a single status or one per parameter
///
/// Parametrized tests (for example one run per biomass reaction) record an
/// individual status for every parameter under the same test id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Status of a plain test case
    Single(Status),
    /// Map of parameter name to status for a parametrized test case
    Parametrized(IndexMap<String, Status>),
}

impl Outcome {
    /// Whether the named parameter (or the whole test) takes part in scoring
    ///
    /// A parameter missing from a parametrized status map is assumed to have
    /// run, only an explicit skipped or errored entry excludes it.
    pub fn contributes(&self, param: Option<&str>) -> bool {
        match (self, param) {
            (Outcome::Single(status), _) => status.contributes_to_score(),
            (Outcome::Parametrized(statuses), Some(param)) => statuses
                .get(param)
                .map_or(true, Status::contributes_to_score),
            // A scalar metric under a parametrized status map contributes as
            // long as any parameter ran
            (Outcome::Parametrized(statuses), None) => {
                statuses.is_empty()
                    || statuses.values().any(Status::contributes_to_score)
            }
        }
    }
}

/// Measured metric of a test, either a single value or one per parameter
///
/// A metric is the defect fraction reported by a check, e.g. the fraction of
/// reactions that are not mass balanced, and must lie in the unit interval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    /// Metric of a plain test case
    Scalar(f64),
    /// Map of parameter name to metric for a parametrized test case
    Parametrized(IndexMap<String, f64>),
}

/// How the report front end should format the raw result data
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    /// Data is a collection, display its length
    Count,
    /// Data is a single number, display it as such
    Number,
    /// Data is displayed without any formatting
    Raw,
    /// The metric rather than the data is displayed, as a percentage
    Percent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_string(&Status::Passed).unwrap(), "\"passed\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"errored\"").unwrap(),
            Status::Errored
        );
        // pytest reports setup failures as "error"
        assert_eq!(
            serde_json::from_str::<Status>("\"error\"").unwrap(),
            Status::Errored
        );
    }

    #[test]
    fn metric_untagged() {
        let scalar: Metric = serde_json::from_str("0.25").unwrap();
        assert_eq!(scalar, Metric::Scalar(0.25));

        let parametrized: Metric =
            serde_json::from_str(r#"{"BIOMASS_Ec_iJO1366_core_53p95M": 0.5}"#).unwrap();
        match parametrized {
            Metric::Parametrized(map) => {
                assert_eq!(map.len(), 1);
                assert!((map["BIOMASS_Ec_iJO1366_core_53p95M"] - 0.5).abs() < 1e-12);
            }
            Metric::Scalar(_) => panic!("expected a parametrized metric"),
        }
    }

    #[test]
    fn outcome_contribution() {
        assert!(Outcome::Single(Status::Failed).contributes(None));
        assert!(!Outcome::Single(Status::Skipped).contributes(None));
        assert!(!Outcome::Single(Status::Errored).contributes(None));

        let mut statuses = IndexMap::new();
        statuses.insert("b1".to_string(), Status::Passed);
        statuses.insert("b2".to_string(), Status::Errored);
        let outcome = Outcome::Parametrized(statuses);
        assert!(outcome.contributes(Some("b1")));
        assert!(!outcome.contributes(Some("b2")));
        // Parameters without a recorded status are assumed to have run
        assert!(outcome.contributes(Some("b3")));
        assert!(outcome.contributes(None));
    }
}
