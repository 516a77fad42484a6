//! Render a one-time model report document

use indexmap::IndexMap;
use serde::Serialize;

use crate::report::config::{Cards, ReportConfiguration};
use crate::report::score::{ScoreCollection, ScoreError};
use crate::results::result::{ResultMeta, SuiteResult, TestResult};

/// A scored one-time report over a single collected result
#[derive(Clone, Debug, Serialize)]
pub struct SnapshotReport {
    /// Environment information of the evaluation pass
    pub meta: ResultMeta,
    /// The collected test results
    pub tests: IndexMap<String, TestResult>,
    /// The computed section and total scores
    pub score: ScoreCollection,
    /// The report layout, with unconfigured tests placed on a misc card
    pub cards: Cards,
    /// Per test weight overrides used for scoring
    pub weights: IndexMap<String, f64>,
}

impl SnapshotReport {
    /// Score a collected result and fuse it with the report layout
    pub fn collect(
        result: SuiteResult,
        mut config: ReportConfiguration,
    ) -> Result<SnapshotReport, ScoreError> {
        config.add_miscellaneous(&result);
        let score = ScoreCollection::compute(&result, &config)?;
        Ok(SnapshotReport {
            meta: result.meta,
            tests: result.cases,
            score,
            cards: config.cards,
            weights: config.weights,
        })
    }

    /// Render the report document as JSON
    pub fn render_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        super::render_json(self, pretty)
    }
}
