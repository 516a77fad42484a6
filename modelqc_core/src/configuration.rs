use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

/// Settings which control score display and metric validation
pub struct Configuration {
    /// Number of decimal places used when a score is rendered as a percentage,
    /// at most one is ever used
    pub score_decimals: u8,
    /// Tolerance allowed when checking that a reported metric lies in the unit
    /// interval, values within the tolerance are clamped
    pub metric_tolerance: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            score_decimals: 1,
            metric_tolerance: 1e-07,
        }
    }
}
