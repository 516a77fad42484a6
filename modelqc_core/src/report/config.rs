//! Configure the layout and scoring of test reports

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::results::result::SuiteResult;

/// Report layout shipped with the crate, used when no custom file is given
const DEFAULT_CONFIG: &str = include_str!("../../templates/test_config.yml");

fn default_weight() -> f64 {
    1.0
}

/// A section of the scored card
///
/// Member tests are aggregated into one section score, and the section in turn
/// contributes to the total score with its weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredSection {
    /// Human readable section title
    pub title: String,
    /// Weight of this section relative to its siblings in the total score
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Ids of the tests belonging to this section
    #[serde(default)]
    pub cases: Vec<String>,
}

/// An unscored card grouping tests for report layout only
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Human readable card title
    pub title: String,
    /// Ids of the tests displayed on this card
    #[serde(default)]
    pub cases: Vec<String>,
}

/// The single scored card with its sections
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCard {
    /// Human readable card title
    pub title: String,
    /// Map of section id to scored section
    #[serde(default)]
    pub sections: IndexMap<String, ScoredSection>,
}

/// All cards of a report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cards {
    /// The card whose sections make up the score
    pub scored: ScoredCard,
    /// All remaining cards, keyed by card id
    #[serde(flatten)]
    pub unscored: IndexMap<String, Card>,
}

/// Layout and weighting of a test report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportConfiguration {
    /// The cards of the report (see [`Cards`])
    pub cards: Cards,
    /// Map of test id to an explicit weight, tests not listed weigh 1
    #[serde(default)]
    pub weights: IndexMap<String, f64>,
}

/// A custom configuration file, every top level entry is optional
///
/// Entries that are present replace the corresponding default entry wholesale.
#[derive(Debug, Deserialize)]
pub struct PartialConfiguration {
    #[serde(default)]
    pub cards: Option<Cards>,
    #[serde(default)]
    pub weights: Option<IndexMap<String, f64>>,
}

impl Default for ReportConfiguration {
    fn default() -> Self {
        // The embedded template is part of the crate, failing to parse it is a
        // packaging bug caught by the unit tests
        serde_yaml::from_str(DEFAULT_CONFIG).expect("embedded test_config.yml must parse")
    }
}

impl ReportConfiguration {
    /// Load a test report configuration
    ///
    /// With no filename the default configuration is returned. With a
    /// filename the file is merged over the default; an unreadable file is
    /// logged and skipped, matching the behavior users rely on when a
    /// repository has not been initialized yet, while a file with invalid
    /// content is an error.
    pub fn load(filename: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let Some(path) = filename else {
            debug!("Loading default configuration.");
            return Ok(config);
        };
        debug!("Loading custom configuration '{}'.", path.display());
        match fs::read_to_string(path) {
            Ok(content) => {
                let custom: PartialConfiguration = serde_yaml::from_str(&content)?;
                config.merge(custom);
            }
            Err(err) => {
                error!(
                    "Failed to load the custom configuration '{}'. Skipping.",
                    path.display()
                );
                debug!("{}", err);
            }
        }
        Ok(config)
    }

    /// Merge a custom configuration, replacing top level entries
    pub fn merge(&mut self, other: PartialConfiguration) {
        if let Some(cards) = other.cards {
            self.cards = cards;
        }
        if let Some(weights) = other.weights {
            self.weights = weights;
        }
    }

    /// The ids of all tests explicitly placed on a card
    pub fn configured_tests(&self) -> HashSet<&str> {
        let mut tests: HashSet<&str> = HashSet::new();
        for section in self.cards.scored.sections.values() {
            tests.extend(section.cases.iter().map(String::as_str));
        }
        for card in self.cards.unscored.values() {
            tests.extend(card.cases.iter().map(String::as_str));
        }
        tests
    }

    /// Place tests present in a result but on no card onto a `misc` card
    ///
    /// Ensures every executed test appears in the report exactly once.
    pub fn add_miscellaneous(&mut self, result: &SuiteResult) {
        let misc: Vec<String> = {
            let configured = self.configured_tests();
            result
                .cases
                .keys()
                .filter(|id| !configured.contains(id.as_str()))
                .cloned()
                .collect()
        };
        let card = self
            .cards
            .unscored
            .entry("misc".to_string())
            .or_insert_with(|| Card {
                title: String::new(),
                cases: Vec::new(),
            });
        card.title = "Misc. Tests".to_string();
        card.cases = misc;
    }

    /// Check that every weight in the configuration is usable
    ///
    /// Weights must be finite and non-negative; a zero weight is allowed and
    /// removes the contribution of its target.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, section) in &self.cards.scored.sections {
            if !section.weight.is_finite() || section.weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    target: id.clone(),
                    value: section.weight,
                });
            }
        }
        for (id, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    target: id.clone(),
                    value: *weight,
                });
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to parse the report configuration")]
    UnableToParse(#[from] serde_yaml::Error),
    #[error("Weight for '{target}' must be a finite, non-negative number, got {value}")]
    InvalidWeight { target: String, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::outcome::FormatType;
    use crate::results::result::TestResultBuilder;
    use std::io::Write;

    #[test]
    fn default_configuration_parses() {
        let config = ReportConfiguration::default();
        assert_eq!(config.cards.scored.title, "Core Tests");
        assert!(config.cards.scored.sections.contains_key("consistency"));
        assert!((config.cards.scored.sections["consistency"].weight - 3.0).abs() < 1e-12);
        // Sections without an explicit weight default to 1
        assert!((config.cards.scored.sections["annotation_met"].weight - 1.0).abs() < 1e-12);
        assert!(config.cards.unscored.contains_key("basic"));
        config.validate().unwrap();
    }

    #[test]
    fn configured_tests_cover_all_cards() {
        let config = ReportConfiguration::default();
        let tests = config.configured_tests();
        assert!(tests.contains("test_stoichiometric_consistency"));
        assert!(tests.contains("test_model_id_presence"));
    }

    #[test]
    fn misc_card_collects_unconfigured_tests() {
        let mut config = ReportConfiguration::default();
        let mut result = SuiteResult::new();
        result.add_case(
            "test_some_new_check",
            TestResultBuilder::default()
                .format_type(FormatType::Raw)
                .build()
                .unwrap(),
        );
        result.add_case(
            "test_model_id_presence",
            TestResultBuilder::default()
                .format_type(FormatType::Raw)
                .build()
                .unwrap(),
        );
        config.add_miscellaneous(&result);
        let misc = &config.cards.unscored["misc"];
        assert_eq!(misc.title, "Misc. Tests");
        assert_eq!(misc.cases, vec!["test_some_new_check".to_string()]);
    }

    #[test]
    fn merge_replaces_top_level_entries() {
        let mut config = ReportConfiguration::default();
        let custom: PartialConfiguration = serde_yaml::from_str(
            r#"
weights:
  test_stoichiometric_consistency: 2.5
"#,
        )
        .unwrap();
        config.merge(custom);
        assert!((config.weights["test_stoichiometric_consistency"] - 2.5).abs() < 1e-12);
        // Cards were not part of the custom file and stay untouched
        assert!(config.cards.scored.sections.contains_key("consistency"));
    }

    #[test]
    fn load_with_unreadable_file_falls_back() {
        let config =
            ReportConfiguration::load(Some(Path::new("/does/not/exist.yml"))).unwrap();
        assert_eq!(config, ReportConfiguration::default());
    }

    #[test]
    fn load_custom_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "weights:\n  test_reaction_mass_balance: 0.5\n"
        )
        .unwrap();
        let config = ReportConfiguration::load(Some(file.path())).unwrap();
        assert!((config.weights["test_reaction_mass_balance"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_weight_is_rejected() {
        let mut config = ReportConfiguration::default();
        config
            .weights
            .insert("test_reaction_mass_balance".to_string(), f64::NAN);
        match config.validate() {
            Err(ConfigError::InvalidWeight { target, .. }) => {
                assert_eq!(target, "test_reaction_mass_balance");
            }
            other => panic!("expected an invalid weight error, got {:?}", other.err()),
        }
    }
}
