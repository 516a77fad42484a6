//! This module provides the TestResult struct representing a single annotated
//! test case and the SuiteResult struct collecting a full evaluation pass

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::results::outcome::{FormatType, Metric, Outcome, Status};

/// A single annotated test case result
///
/// One record is produced per executed test case and is immutable after
/// collection. The test id itself is the key under which the record is stored
/// in a [`SuiteResult`].
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Human readable descriptive title of the test case
    #[builder(default = "None")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short summary of what the test case checks
    #[builder(default = "None")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Message stating the result, a string or a map of parameter to string
    #[builder(default = "Value::Null")]
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub message: Value,
    /// Raw data produced by the check, carried through without inspection
    #[builder(default = "Value::Null")]
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    /// How the report front end should format the raw data
    pub format_type: FormatType,
    /// Defect fraction measured by the check (see [`Metric`])
    #[builder(default = "None")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<Metric>,
    /// Execution status, a single status or one per parameter
    #[builder(default = "Outcome::Single(Status::Passed)")]
    #[serde(default = "default_outcome")]
    pub result: Outcome,
    /// Wall clock duration in seconds, a number or a map of parameter to number
    #[builder(default = "Value::Null")]
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub duration: Value,
}

fn default_outcome() -> Outcome {
    Outcome::Single(Status::Passed)
}

/// Environment information recorded alongside a result
///
/// This crate only transports the metadata, it is produced by the test runner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMeta {
    /// When the evaluation pass was run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Operating system name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Operating system release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Map of package name to version of the environment that produced the
    /// result
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub packages: IndexMap<String, String>,
}

/// The collected outcome of one evaluation pass over one model
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Environment information for this pass
    #[serde(default)]
    pub meta: ResultMeta,
    /// Map of test id to its collected result
    #[serde(default, rename = "tests")]
    pub cases: IndexMap<String, TestResult>,
}

impl SuiteResult {
    pub fn new() -> Self {
        SuiteResult::default()
    }

    /// Add a test case result under its id
    pub fn add_case(&mut self, id: impl Into<String>, case: TestResult) {
        self.cases.insert(id.into(), case);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let case = TestResultBuilder::default()
            .format_type(FormatType::Count)
            .build()
            .unwrap();
        assert_eq!(case.title, None);
        assert_eq!(case.metric, None);
        assert_eq!(case.result, Outcome::Single(Status::Passed));
        assert!(case.data.is_null());
    }

    #[test]
    fn deserialize_case() {
        let data = r#"{
"title":"Mass Balance",
"summary":"Check the mass balance of all metabolic reactions.",
"message":"A total of 5 (2.08%) reactions are not mass balanced.",
"data":["GLUDy","PYK","PGK","ENO","TPI"],
"format_type":"count",
"metric":0.0208,
"result":"failed",
"duration":0.153
}"#;
        let case: TestResult = serde_json::from_str(data).unwrap();
        assert_eq!(case.title.unwrap(), "Mass Balance");
        assert_eq!(case.format_type, FormatType::Count);
        assert_eq!(case.metric, Some(Metric::Scalar(0.0208)));
        assert_eq!(case.result, Outcome::Single(Status::Failed));
        assert_eq!(case.data.as_array().unwrap().len(), 5);
    }

    #[test]
    fn deserialize_parametrized_case() {
        let data = r#"{
"title":"Biomass Production",
"format_type":"number",
"metric":{"BIOMASS_Ecoli_core":0.0,"BIOMASS_Ecoli_wt":1.0},
"result":{"BIOMASS_Ecoli_core":"passed","BIOMASS_Ecoli_wt":"failed"},
"duration":{"BIOMASS_Ecoli_core":0.3,"BIOMASS_Ecoli_wt":0.4}
}"#;
        let case: TestResult = serde_json::from_str(data).unwrap();
        match case.metric.unwrap() {
            Metric::Parametrized(map) => assert_eq!(map.len(), 2),
            Metric::Scalar(_) => panic!("expected a parametrized metric"),
        }
        match case.result {
            Outcome::Parametrized(statuses) => {
                assert_eq!(statuses["BIOMASS_Ecoli_core"], Status::Passed);
                assert_eq!(statuses["BIOMASS_Ecoli_wt"], Status::Failed);
            }
            Outcome::Single(_) => panic!("expected a parametrized outcome"),
        }
    }

    #[test]
    fn suite_roundtrip_preserves_order() {
        let mut result = SuiteResult::new();
        result.add_case(
            "test_b",
            TestResultBuilder::default()
                .format_type(FormatType::Raw)
                .build()
                .unwrap(),
        );
        result.add_case(
            "test_a",
            TestResultBuilder::default()
                .format_type(FormatType::Raw)
                .build()
                .unwrap(),
        );
        let serialized = serde_json::to_string(&result).unwrap();
        let restored: SuiteResult = serde_json::from_str(&serialized).unwrap();
        let ids: Vec<&String> = restored.cases.keys().collect();
        assert_eq!(ids, vec!["test_b", "test_a"]);
    }
}
