//! Arrange recorded results into a report over the commit history

use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::report::config::{Cards, ReportConfiguration};
use crate::report::param_field;
use crate::report::score::{ScoreCollection, ScoreError};
use crate::results::outcome::{FormatType, Metric, Outcome, Status};
use crate::results::result::SuiteResult;

/// Access to results recorded per commit
///
/// Where the results come from (a repository, a database, plain files) is the
/// caller's concern; the report only needs to enumerate them.
pub trait ResultHistory {
    /// All branches with recorded results
    fn branches(&self) -> Vec<String>;

    /// The commits of a branch with recorded results, oldest first
    fn commits(&self, branch: &str) -> Vec<String>;

    /// The stored result for a commit
    fn result(&self, commit: &str) -> Result<SuiteResult, HistoryError>;
}

/// In-memory history store
///
/// Primarily useful for assembling a report from results that were already
/// loaded, and as the reference implementation of [`ResultHistory`].
#[derive(Clone, Debug, Default)]
pub struct MemoryHistory {
    branches: IndexMap<String, Vec<String>>,
    results: IndexMap<String, SuiteResult>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        MemoryHistory::default()
    }

    /// Record a result for a commit, appending in chronological order
    pub fn record(
        &mut self,
        branch: impl Into<String>,
        commit: impl Into<String>,
        result: SuiteResult,
    ) {
        let commit = commit.into();
        self.branches
            .entry(branch.into())
            .or_default()
            .push(commit.clone());
        self.results.insert(commit, result);
    }
}

impl ResultHistory for MemoryHistory {
    fn branches(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    fn commits(&self, branch: &str) -> Vec<String> {
        self.branches.get(branch).cloned().unwrap_or_default()
    }

    fn result(&self, commit: &str) -> Result<SuiteResult, HistoryError> {
        self.results
            .get(commit)
            .cloned()
            .ok_or_else(|| HistoryError::UnknownCommit(commit.to_string()))
    }
}

/// One commit's entry in a per test history series
#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    /// Branch the commit belongs to
    pub branch: String,
    /// Commit identifier
    pub commit: String,
    /// Reported metric at this commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    /// Raw data at this commit, formatted down to what the front end plots
    pub data: Value,
    /// Execution status at this commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Status>,
}

/// History series of one test, plain or per parameter
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum HistorySeries {
    Single(Vec<HistoryEntry>),
    Parametrized(IndexMap<String, Vec<HistoryEntry>>),
}

/// Shared descriptive fields plus the per commit series for one test
#[derive(Clone, Debug, Serialize)]
pub struct HistoryTest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub format_type: FormatType,
    pub history: HistorySeries,
}

/// Total score at one commit
#[derive(Clone, Debug, Serialize)]
pub struct ScoreSample {
    pub branch: String,
    pub commit: String,
    /// The total score at this commit
    pub metric: f64,
    /// Human readable breakdown of how the total was computed
    pub formula: String,
}

/// The total score series over the recorded history
#[derive(Clone, Debug, Serialize)]
pub struct ScoreSeries {
    pub format_type: String,
    pub history: Vec<ScoreSample>,
}

/// All scores of a history report
#[derive(Clone, Debug, Serialize)]
pub struct HistoryScore {
    pub total_score: ScoreSeries,
}

/// A report following the results of a model over its commit history
#[derive(Clone, Debug, Serialize)]
pub struct HistoryReport {
    /// The per test history series
    pub tests: IndexMap<String, HistoryTest>,
    /// The total score per commit
    pub score: HistoryScore,
    /// The report layout
    pub cards: Cards,
    /// Per test weight overrides used for scoring
    pub weights: IndexMap<String, f64>,
}

/// Format result data according to the user defined type
///
/// Percent formatted tests are plotted from their metric, so their raw data
/// is dropped to keep the document small; counted data is reduced to its
/// length ahead of time.
fn format_data(format_type: FormatType, data: &Value) -> Value {
    if data.is_null() {
        return Value::Array(Vec::new());
    }
    match format_type {
        FormatType::Percent => Value::Array(Vec::new()),
        FormatType::Count => match data {
            Value::Array(items) => Value::from(items.len()),
            other => other.clone(),
        },
        FormatType::Number | FormatType::Raw => data.clone(),
    }
}

impl HistoryReport {
    /// Score every recorded commit and arrange the results as time series
    ///
    /// A commit without a single scorable section is logged and left out of
    /// the score series; its raw results still appear in the test series.
    pub fn collect<H: ResultHistory>(
        history: &H,
        config: ReportConfiguration,
    ) -> Result<HistoryReport, HistoryError> {
        let mut tests: IndexMap<String, HistoryTest> = IndexMap::new();
        let mut samples = Vec::new();
        for branch in history.branches() {
            for commit in history.commits(&branch) {
                let result = history.result(&commit)?;
                match ScoreCollection::compute(&result, &config) {
                    Ok(scores) => samples.push(ScoreSample {
                        branch: branch.clone(),
                        commit: commit.clone(),
                        metric: scores.total_score,
                        formula: scores.formula,
                    }),
                    Err(ScoreError::NothingToScore) => {
                        warn!(
                            "Commit '{}' has no scorable section, omitting its score.",
                            commit
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
                for (id, case) in &result.cases {
                    let slot = tests.entry(id.clone()).or_insert_with(|| HistoryTest {
                        title: case.title.clone(),
                        summary: case.summary.clone(),
                        format_type: case.format_type,
                        history: match case.metric {
                            Some(Metric::Parametrized(_)) => {
                                HistorySeries::Parametrized(IndexMap::new())
                            }
                            _ => HistorySeries::Single(Vec::new()),
                        },
                    });
                    let format_type = slot.format_type;
                    match (&mut slot.history, &case.metric) {
                        (HistorySeries::Parametrized(series), Some(Metric::Parametrized(metrics))) => {
                            for (param, metric) in metrics {
                                let status = match &case.result {
                                    Outcome::Parametrized(statuses) => statuses.get(param).copied(),
                                    Outcome::Single(status) => Some(*status),
                                };
                                series.entry(param.clone()).or_default().push(HistoryEntry {
                                    branch: branch.clone(),
                                    commit: commit.clone(),
                                    metric: Some(*metric),
                                    data: format_data(format_type, &param_field(&case.data, param)),
                                    result: status,
                                });
                            }
                        }
                        (HistorySeries::Single(series), metric) => {
                            let metric = match metric {
                                Some(Metric::Scalar(value)) => Some(*value),
                                Some(Metric::Parametrized(_)) => {
                                    warn!(
                                        "Test '{}' changed to parametrized at commit '{}', skipping it there.",
                                        id, commit
                                    );
                                    continue;
                                }
                                None => None,
                            };
                            let status = match &case.result {
                                Outcome::Single(status) => Some(*status),
                                Outcome::Parametrized(_) => None,
                            };
                            series.push(HistoryEntry {
                                branch: branch.clone(),
                                commit: commit.clone(),
                                metric,
                                data: format_data(format_type, &case.data),
                                result: status,
                            });
                        }
                        (HistorySeries::Parametrized(_), _) => {
                            warn!(
                                "Test '{}' stopped being parametrized at commit '{}', skipping it there.",
                                id, commit
                            );
                        }
                    }
                }
            }
        }
        Ok(HistoryReport {
            tests,
            score: HistoryScore {
                total_score: ScoreSeries {
                    format_type: "score".to_string(),
                    history: samples,
                },
            },
            cards: config.cards,
            weights: config.weights,
        })
    }

    /// Render the report document as JSON
    pub fn render_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        super::render_json(self, pretty)
    }
}

#[derive(Error, Debug)]
pub enum HistoryError {
    /// No result is recorded for the requested commit
    #[error("No result recorded for commit '{0}'")]
    UnknownCommit(String),
    /// A recorded result could not be scored
    #[error("Unable to score a recorded result")]
    Score(#[from] ScoreError),
}
