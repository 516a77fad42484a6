//! Render score computations as human readable expressions
//!
//! The report front end displays, next to every percentage, the weighted mean
//! it was computed from. The same rendering rules apply to the snapshot, diff
//! and history views: a weight of exactly 1 is never shown as a multiplier,
//! and section breakdowns compact runs of tests that round to exactly 0% or
//! 100% into counted groups to keep long expressions readable.

use crate::configuration::CONFIGURATION;
use crate::report::score::{SectionScore, TestScore};

/// Percentage of a fractional score, rounded for display
///
/// Rounding happens only here, at the display boundary; aggregation itself
/// stays in fractional arithmetic throughout.
pub fn percentage(fraction: f64) -> f64 {
    let decimals = CONFIGURATION.read().unwrap().score_decimals.min(1);
    let factor = 10f64.powi(i32::from(decimals));
    (fraction * 100.0 * factor).round() / factor
}

/// Format a display value, dropping any trailing zero decimal
fn display(value: f64) -> String {
    format!("{}", value)
}

/// One term of a weighted sum, omitting the default weight of 1
fn factor(weight: f64, value: f64) -> String {
    if weight == 1.0 {
        display(value)
    } else {
        format!("{} * {}", display(weight), display(value))
    }
}

/// One term for a counted group of identical percentages
fn count_term(count: usize, value: f64) -> String {
    if count == 1 {
        display(value)
    } else {
        format!("{} * {}", count, display(value))
    }
}

/// Render the total score as the weighted mean over its section scores
pub fn total_formula(sections: &[SectionScore]) -> String {
    let mut numerator: Vec<String> = Vec::new();
    let mut denominator: Vec<String> = Vec::new();
    let mut num = 0.0;
    let mut den = 0.0;
    for section in sections {
        num += section.weight * section.score;
        den += section.weight;
        numerator.push(factor(section.weight, percentage(section.score)));
        denominator.push(factor(section.weight, 100.0));
    }
    if den <= 0.0 {
        return String::new();
    }
    format!(
        "({}) / ({}) = {}%",
        numerator.join(" + "),
        denominator.join(" + "),
        display(percentage(num / den))
    )
}

/// Render a section score as the weighted mean over its member tests
///
/// Members without a usable value are left out. Members with the default
/// weight whose percentage rounds to exactly 0% or 100% are grouped and
/// counted after the individually listed terms; everything else is listed
/// individually with its weight factor.
pub fn section_formula(members: &[TestScore]) -> String {
    let mut numerator: Vec<String> = Vec::new();
    let mut denominator: Vec<String> = Vec::new();
    let mut zero = 0usize;
    let mut full = 0usize;
    let mut num = 0.0;
    let mut den = 0.0;
    for member in members {
        let Some(value) = member.value else {
            continue;
        };
        num += member.weight * value;
        den += member.weight;
        let percent = percentage(value);
        if member.weight == 1.0 && percent == 0.0 {
            zero += 1;
            continue;
        }
        if member.weight == 1.0 && percent == 100.0 {
            full += 1;
            continue;
        }
        numerator.push(factor(member.weight, percent));
        denominator.push(factor(member.weight, 100.0));
    }
    if zero > 0 {
        numerator.push(count_term(zero, 0.0));
        denominator.push(count_term(zero, 100.0));
    }
    if full > 0 {
        numerator.push(count_term(full, 100.0));
        denominator.push(count_term(full, 100.0));
    }
    if den <= 0.0 {
        return String::new();
    }
    format!(
        "({}) / ({}) = {}%",
        numerator.join(" + "),
        denominator.join(" + "),
        display(percentage(num / den))
    )
}
