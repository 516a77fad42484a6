//! Compare the results of two or more models with one another side by side

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::report::config::{Cards, ReportConfiguration};
use crate::report::param_field;
use crate::report::score::{ScoreCollection, ScoreError, SectionScore};
use crate::results::outcome::{FormatType, Metric, Outcome, Status};
use crate::results::result::{ResultMeta, SuiteResult, TestResult};

/// One model's entry in a per test comparison series
#[derive(Clone, Debug, Serialize)]
pub struct DiffEntry {
    /// Name of the compared model
    pub model: String,
    /// Raw data of the check for this model
    pub data: Value,
    /// Wall clock duration for this model
    pub duration: Value,
    /// Result message for this model
    pub message: Value,
    /// Reported metric for this model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    /// Execution status for this model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Status>,
}

/// Comparison series of one test, plain or per parameter
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum DiffSeries {
    /// One entry per compared model
    Single(Vec<DiffEntry>),
    /// One entry per compared model for every parameter
    Parametrized(IndexMap<String, Vec<DiffEntry>>),
}

/// Shared descriptive fields plus the per model series for one test
#[derive(Clone, Debug, Serialize)]
pub struct DiffTest {
    /// Human readable title, hoisted from the first model carrying the test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short summary, hoisted from the first model carrying the test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// How the report front end should format the raw data
    pub format_type: FormatType,
    /// The per model comparison series
    pub diff: DiffSeries,
}

/// Total score of one compared model
#[derive(Clone, Debug, Serialize)]
pub struct DiffTotalEntry {
    /// Name of the compared model
    pub model: String,
    /// Weighted mean over the model's scored sections
    pub total_score: f64,
    /// Human readable breakdown of how the total was computed
    pub formula: String,
}

/// Section score of one compared model
#[derive(Clone, Debug, Serialize)]
pub struct DiffSectionEntry {
    /// Name of the compared model
    pub model: String,
    #[serde(flatten)]
    pub score: SectionScore,
}

/// Per model total scores
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiffTotalScore {
    pub diff: Vec<DiffTotalEntry>,
}

/// Per model section scores, flattened for the front end bar charts
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiffSections {
    pub diff: Vec<DiffSectionEntry>,
}

/// All scores of a diff report
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiffScore {
    pub total_score: DiffTotalScore,
    pub sections: DiffSections,
}

/// A report comparing several models side by side
///
/// Every model is scored in isolation; the per test series interleave the
/// models in input order.
#[derive(Clone, Debug, Serialize)]
pub struct DiffReport {
    /// Environment information, taken from the first compared result
    pub meta: ResultMeta,
    /// The per test comparison series
    pub tests: IndexMap<String, DiffTest>,
    /// The per model scores
    pub score: DiffScore,
    /// The report layout
    pub cards: Cards,
    /// Per test weight overrides used for scoring
    pub weights: IndexMap<String, f64>,
}

impl DiffReport {
    /// Score each model in isolation and interleave the results per test
    ///
    /// A model without a single scorable section is logged and left out of
    /// the score series; its raw results still appear in the comparison.
    pub fn collect(
        results: IndexMap<String, SuiteResult>,
        config: ReportConfiguration,
    ) -> Result<DiffReport, ScoreError> {
        let mut meta: Option<ResultMeta> = None;
        let mut tests: IndexMap<String, DiffTest> = IndexMap::new();
        let mut score = DiffScore::default();
        for (model, result) in &results {
            if meta.is_none() {
                meta = Some(result.meta.clone());
            }
            for (id, case) in &result.cases {
                Self::push_entry(&mut tests, model, id, case);
            }
            match ScoreCollection::compute(result, &config) {
                Ok(scores) => {
                    score.total_score.diff.push(DiffTotalEntry {
                        model: model.clone(),
                        total_score: scores.total_score,
                        formula: scores.formula,
                    });
                    for section in scores.sections {
                        score.sections.diff.push(DiffSectionEntry {
                            model: model.clone(),
                            score: section,
                        });
                    }
                }
                Err(ScoreError::NothingToScore) => {
                    warn!("Model '{}' has no scorable section, omitting its score.", model);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(DiffReport {
            meta: meta.unwrap_or_default(),
            tests,
            score,
            cards: config.cards,
            weights: config.weights,
        })
    }

    fn push_entry(
        tests: &mut IndexMap<String, DiffTest>,
        model: &str,
        id: &str,
        case: &TestResult,
    ) {
        let slot = tests.entry(id.to_string()).or_insert_with(|| DiffTest {
            title: case.title.clone(),
            summary: case.summary.clone(),
            format_type: case.format_type,
            diff: match case.metric {
                Some(Metric::Parametrized(_)) => DiffSeries::Parametrized(IndexMap::new()),
                _ => DiffSeries::Single(Vec::new()),
            },
        });
        match (&mut slot.diff, &case.metric) {
            (DiffSeries::Parametrized(series), Some(Metric::Parametrized(metrics))) => {
                for (param, metric) in metrics {
                    let status = match &case.result {
                        Outcome::Parametrized(statuses) => statuses.get(param).copied(),
                        Outcome::Single(status) => Some(*status),
                    };
                    series.entry(param.clone()).or_default().push(DiffEntry {
                        model: model.to_string(),
                        data: param_field(&case.data, param),
                        duration: param_field(&case.duration, param),
                        message: param_field(&case.message, param),
                        metric: Some(*metric),
                        result: status,
                    });
                }
            }
            (DiffSeries::Single(series), metric) => {
                let metric = match metric {
                    Some(Metric::Scalar(value)) => Some(*value),
                    Some(Metric::Parametrized(_)) => {
                        warn!(
                            "Test '{}' is parametrized for model '{}' but not for an earlier model, skipping it.",
                            id, model
                        );
                        return;
                    }
                    None => None,
                };
                let status = match &case.result {
                    Outcome::Single(status) => Some(*status),
                    Outcome::Parametrized(_) => None,
                };
                series.push(DiffEntry {
                    model: model.to_string(),
                    data: case.data.clone(),
                    duration: case.duration.clone(),
                    message: case.message.clone(),
                    metric,
                    result: status,
                });
            }
            (DiffSeries::Parametrized(_), _) => {
                warn!(
                    "Test '{}' is not parametrized for model '{}' but was for an earlier model, skipping it.",
                    id, model
                );
            }
        }
    }

    /// Render the report document as JSON
    pub fn render_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        super::render_json(self, pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::result::TestResultBuilder;

    fn config() -> ReportConfiguration {
        serde_yaml::from_str(
            r#"
cards:
  scored:
    title: "Core Tests"
    sections:
      consistency:
        title: "Consistency"
        cases: [test_a]
"#,
        )
        .unwrap()
    }

    fn model_result(metric: f64) -> SuiteResult {
        let mut result = SuiteResult::new();
        result.add_case(
            "test_a",
            TestResultBuilder::default()
                .title(Some("Mass Balance".to_string()))
                .format_type(FormatType::Percent)
                .metric(Some(Metric::Scalar(metric)))
                .result(Outcome::Single(Status::Failed))
                .build()
                .unwrap(),
        );
        result
    }

    #[test]
    fn models_are_interleaved_and_scored_in_isolation() {
        let mut results = IndexMap::new();
        results.insert("model_1.xml".to_string(), model_result(0.2));
        results.insert("model_2.xml".to_string(), model_result(0.6));
        let report = DiffReport::collect(results, config()).unwrap();

        match &report.tests["test_a"].diff {
            DiffSeries::Single(series) => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].model, "model_1.xml");
                assert_eq!(series[1].model, "model_2.xml");
            }
            DiffSeries::Parametrized(_) => panic!("expected a plain series"),
        }
        let totals = &report.score.total_score.diff;
        assert_eq!(totals.len(), 2);
        assert!((totals[0].total_score - 0.8).abs() < 1e-12);
        assert!((totals[1].total_score - 0.4).abs() < 1e-12);
        assert_eq!(report.score.sections.diff.len(), 2);
        assert_eq!(report.score.sections.diff[0].model, "model_1.xml");
    }

    #[test]
    fn unscorable_model_keeps_its_results_but_no_score() {
        let mut results = IndexMap::new();
        results.insert("scored.xml".to_string(), model_result(0.2));
        let mut empty = SuiteResult::new();
        empty.add_case(
            "test_unrelated",
            TestResultBuilder::default()
                .format_type(FormatType::Raw)
                .build()
                .unwrap(),
        );
        results.insert("unscored.xml".to_string(), empty);
        let report = DiffReport::collect(results, config()).unwrap();
        assert_eq!(report.score.total_score.diff.len(), 1);
        assert_eq!(report.score.total_score.diff[0].model, "scored.xml");
        assert!(report.tests.contains_key("test_unrelated"));
    }

    #[test]
    fn parametrized_tests_are_compared_per_parameter() {
        let mut metrics = IndexMap::new();
        metrics.insert("BIOMASS_core".to_string(), 0.25);
        let mut statuses = IndexMap::new();
        statuses.insert("BIOMASS_core".to_string(), Status::Failed);
        let case = TestResultBuilder::default()
            .format_type(FormatType::Number)
            .metric(Some(Metric::Parametrized(metrics)))
            .result(Outcome::Parametrized(statuses))
            .data(serde_json::json!({"BIOMASS_core": [1, 2, 3]}))
            .build()
            .unwrap();
        let mut result = SuiteResult::new();
        result.add_case("test_p", case);
        let mut results = IndexMap::new();
        results.insert("model_1.xml".to_string(), result);

        let report = DiffReport::collect(results, config()).unwrap();
        match &report.tests["test_p"].diff {
            DiffSeries::Parametrized(series) => {
                let entries = &series["BIOMASS_core"];
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].metric, Some(0.25));
                assert_eq!(entries[0].result, Some(Status::Failed));
                assert_eq!(entries[0].data, serde_json::json!([1, 2, 3]));
            }
            DiffSeries::Single(_) => panic!("expected a parametrized series"),
        }
    }
}
