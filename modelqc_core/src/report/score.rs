//! Aggregate per test metrics into section scores and a total score
//!
//! Scoring is a pure recomputation over an immutable result set: the same
//! input always produces bit identical output, and nothing is cached between
//! runs. A test's wire metric is the defect fraction reported by its check,
//! so the quality credited to a test is `1 - metric`; parametrized tests are
//! credited with the mean quality over their contributing parameters.

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::report::config::{ConfigError, ReportConfiguration};
use crate::report::formula;
use crate::results::outcome::{Metric, Outcome, Status};
use crate::results::result::{SuiteResult, TestResult};

/// Scoring view of a single executed test case
#[derive(Clone, Debug, PartialEq)]
pub struct TestScore {
    /// Id of the test case
    pub id: String,
    /// Quality fraction credited to the test, None when the test contributes
    /// nothing to its section
    pub value: Option<f64>,
    /// Relative weight of the test within its section
    pub weight: f64,
    /// Whether the whole test was skipped
    pub skipped: bool,
    /// Whether the whole test errored
    pub errored: bool,
}

/// Weighted score of one report section
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SectionScore {
    /// Id of the section
    pub section: String,
    /// Human readable section title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Weighted mean quality over the section's contributing tests
    pub score: f64,
    /// Relative weight of the section in the total score
    pub weight: f64,
    /// Human readable breakdown of how the score was computed
    pub formula: String,
}

/// Aggregated scores for one full result set
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreCollection {
    /// Weighted mean over all scored sections
    pub total_score: f64,
    /// Human readable breakdown of how the total was computed
    pub formula: String,
    /// The individual section scores in configuration order
    pub sections: Vec<SectionScore>,
}

impl TestScore {
    /// Derive the scoring view of a single executed test
    ///
    /// A test that is skipped or errored, carries no metric, or whose
    /// parametrized metric has no contributing parameter yields no value; it
    /// must be excluded from its section rather than counted as zero. A
    /// metric outside the unit interval on a contributing test is rejected.
    pub fn from_result(id: &str, result: &TestResult, weight: f64) -> Result<TestScore, ScoreError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ScoreError::InvalidWeight {
                target: id.to_string(),
                value: weight,
            });
        }
        let (skipped, errored) = whole_test_flags(&result.result);
        let value = match &result.metric {
            None => None,
            Some(Metric::Scalar(metric)) => {
                if result.result.contributes(None) {
                    Some(quality(id, None, *metric)?)
                } else {
                    None
                }
            }
            Some(Metric::Parametrized(metrics)) => {
                let mut total = 0.0;
                let mut count = 0u32;
                for (param, metric) in metrics {
                    if !result.result.contributes(Some(param.as_str())) {
                        continue;
                    }
                    total += quality(id, Some(param.as_str()), *metric)?;
                    count += 1;
                }
                if count == 0 {
                    None
                } else {
                    Some(total / f64::from(count))
                }
            }
        };
        Ok(TestScore {
            id: id.to_string(),
            value,
            weight,
            skipped,
            errored,
        })
    }
}

/// Whether the result as a whole was skipped or errored
fn whole_test_flags(outcome: &Outcome) -> (bool, bool) {
    match outcome {
        Outcome::Single(Status::Skipped) => (true, false),
        Outcome::Single(Status::Errored) => (false, true),
        Outcome::Single(_) => (false, false),
        Outcome::Parametrized(statuses) => (
            !statuses.is_empty() && statuses.values().all(|s| *s == Status::Skipped),
            !statuses.is_empty() && statuses.values().all(|s| *s == Status::Errored),
        ),
    }
}

/// Quality credited for one reported metric, `1 - metric`
///
/// Values within the configured tolerance of the unit interval are clamped,
/// anything further out fails fast instead of producing an out of range score.
fn quality(test: &str, param: Option<&str>, metric: f64) -> Result<f64, ScoreError> {
    let tolerance = CONFIGURATION.read().unwrap().metric_tolerance;
    if !metric.is_finite() || metric < -tolerance || metric > 1.0 + tolerance {
        let test = match param {
            Some(param) => format!("{}[{}]", test, param),
            None => test.to_string(),
        };
        return Err(ScoreError::MetricOutOfRange {
            test,
            value: metric,
        });
    }
    Ok((1.0 - metric).clamp(0.0, 1.0))
}

impl SectionScore {
    /// Aggregate the weighted mean over the contributing members of a section
    ///
    /// Returns None when no member contributes a usable value or the total
    /// member weight is zero; such a section is dropped from the total score
    /// computation instead of scoring as zero.
    pub fn aggregate(
        section: &str,
        title: Option<&str>,
        weight: f64,
        members: &[TestScore],
    ) -> Option<SectionScore> {
        let mut num = 0.0;
        let mut den = 0.0;
        for member in members {
            if let Some(value) = member.value {
                num += member.weight * value;
                den += member.weight;
            }
        }
        if den <= 0.0 {
            return None;
        }
        Some(SectionScore {
            section: section.to_string(),
            title: title.map(str::to_string),
            score: num / den,
            weight,
            formula: formula::section_formula(members),
        })
    }
}

impl ScoreCollection {
    /// Compute section and total scores for one result under a configuration
    ///
    /// Tests referenced by the configuration but absent from the result are
    /// ignored; they belong to the report's "not run" concern, not scoring.
    ///
    /// # Examples
    /// ```rust
    /// use modelqc_core::report::config::ReportConfiguration;
    /// use modelqc_core::report::score::ScoreCollection;
    /// use modelqc_core::results::result::SuiteResult;
    /// let result = SuiteResult::from_json_str(
    ///     r#"{"tests": {"test_reaction_mass_balance":
    ///         {"format_type": "percent", "metric": 0.2, "result": "failed"}}}"#,
    /// )
    /// .unwrap();
    /// let config = ReportConfiguration::default();
    /// let scores = ScoreCollection::compute(&result, &config).unwrap();
    /// assert!((scores.total_score - 0.8).abs() < 1e-12);
    /// ```
    pub fn compute(
        result: &SuiteResult,
        config: &ReportConfiguration,
    ) -> Result<ScoreCollection, ScoreError> {
        config.validate()?;
        let mut sections = Vec::new();
        for (id, section) in &config.cards.scored.sections {
            debug!("Calculate score for section '{}'.", id);
            let mut members = Vec::new();
            for case in &section.cases {
                let Some(test) = result.cases.get(case) else {
                    continue;
                };
                let weight = config.weights.get(case).copied().unwrap_or(1.0);
                members.push(TestScore::from_result(case, test, weight)?);
            }
            match SectionScore::aggregate(id, Some(section.title.as_str()), section.weight, &members)
            {
                Some(score) => sections.push(score),
                None => debug!("Section '{}' has no scorable test, excluding it.", id),
            }
        }
        Self::from_sections(sections)
    }

    /// Weighted mean over already aggregated section scores
    pub fn from_sections(sections: Vec<SectionScore>) -> Result<ScoreCollection, ScoreError> {
        let mut num = 0.0;
        let mut den = 0.0;
        for section in &sections {
            num += section.weight * section.score;
            den += section.weight;
        }
        if den <= 0.0 {
            return Err(ScoreError::NothingToScore);
        }
        Ok(ScoreCollection {
            total_score: num / den,
            formula: formula::total_formula(&sections),
            sections,
        })
    }
}

#[derive(Error, Debug)]
pub enum ScoreError {
    /// A contributing test reported a metric outside the unit interval
    #[error("Metric for '{test}' is outside the unit interval: {value}")]
    MetricOutOfRange { test: String, value: f64 },
    /// A weight was not a usable number
    #[error("Weight for '{target}' must be a finite, non-negative number, got {value}")]
    InvalidWeight { target: String, value: f64 },
    /// No section produced a score at all
    #[error("No section produced a score, nothing to aggregate")]
    NothingToScore,
    /// The report configuration itself is invalid
    #[error("Invalid report configuration")]
    InvalidConfiguration(#[from] ConfigError),
}
