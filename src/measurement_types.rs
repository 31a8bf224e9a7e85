//! # Measurement Types Module
//!
//! This module defines the configuration and rule types used for quantity detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a comma inside a number is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberLocale {
    /// Comma is decimal in Danish recipes; elsewhere "1,500" is thousands and "1,5" decimal
    #[default]
    Auto,
    /// Comma is always the decimal separator
    Comma,
    /// Period is the decimal separator and commas group thousands
    Period,
}

/// Which value a range like "2-3" resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePolicy {
    /// Buy enough for the generous end of the range
    #[default]
    Upper,
    Lower,
    Midpoint,
}

impl RangePolicy {
    /// Collapse a range to a single quantity
    pub fn resolve(&self, low: f64, high: f64) -> f64 {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        match self {
            RangePolicy::Upper => high,
            RangePolicy::Lower => low,
            RangePolicy::Midpoint => (low + high) / 2.0,
        }
    }
}

impl FromStr for NumberLocale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(NumberLocale::Auto),
            "comma" | "da" | "danish" => Ok(NumberLocale::Comma),
            "period" | "dot" | "en" | "english" => Ok(NumberLocale::Period),
            other => Err(format!("unknown number locale '{}'", other)),
        }
    }
}

impl FromStr for RangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upper" | "max" => Ok(RangePolicy::Upper),
            "lower" | "min" => Ok(RangePolicy::Lower),
            "midpoint" | "mid" | "average" => Ok(RangePolicy::Midpoint),
            other => Err(format!("unknown range policy '{}'", other)),
        }
    }
}

/// Configuration options for quantity parsing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Decimal separator handling
    pub number_locale: NumberLocale,
    /// Range collapse policy
    pub range_policy: RangePolicy,
}

/// The rule that produced a line's quantity, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityRule {
    MixedNumber,
    Fraction,
    UnicodeFraction,
    Range,
    PlainNumber,
    SuffixMultiplier,
    UnitOnly,
    ToTaste,
    NameOnly,
}

impl QuantityRule {
    /// All rules, highest priority first
    pub const ORDERED: [QuantityRule; 9] = [
        QuantityRule::MixedNumber,
        QuantityRule::Fraction,
        QuantityRule::UnicodeFraction,
        QuantityRule::Range,
        QuantityRule::PlainNumber,
        QuantityRule::SuffixMultiplier,
        QuantityRule::UnitOnly,
        QuantityRule::ToTaste,
        QuantityRule::NameOnly,
    ];
}

impl fmt::Display for QuantityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuantityRule::MixedNumber => "mixed-number",
            QuantityRule::Fraction => "fraction",
            QuantityRule::UnicodeFraction => "unicode-fraction",
            QuantityRule::Range => "range",
            QuantityRule::PlainNumber => "plain-number",
            QuantityRule::SuffixMultiplier => "suffix-multiplier",
            QuantityRule::UnitOnly => "unit-only",
            QuantityRule::ToTaste => "to-taste",
            QuantityRule::NameOnly => "name-only",
        };
        write!(f, "{}", name)
    }
}
