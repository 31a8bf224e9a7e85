//! # Ingredient Parser
//!
//! This module turns raw recipe lines into structured [`Ingredient`] values.
//! Parsing never fails: lines that are only partially understood come back as
//! name-only ingredients carrying [`ParseDegraded`] warnings.
//!
//! ## Features
//!
//! - Mixed numbers and fractions (1 1/2, 3/4, 1½, ½)
//! - Ranges (2-3, 2 to 3, 2 til 3) collapsed by a configurable policy
//! - Danish and English decimal separators, decided once per recipe
//! - Suffix multipliers ("æg x6") and article + unit forms ("a pinch of salt")
//! - Notes from parentheses and text after the first comma
//!
//! ## Usage
//!
//! ```rust
//! use recipe_shopper::ingredient_parser::parse_ingredient_list;
//!
//! let text = "400g spaghetti\n½ tsk salt\n1 1/2 dl mælk";
//! let parsed = parse_ingredient_list(text);
//!
//! for ingredient in parsed.ingredients {
//!     println!("{}", ingredient);
//! }
//! ```

use crate::ingredient_model::{Ingredient, IngredientList, ParseDegraded, Unit};
use crate::measurement_patterns::{
    glyph_value, ARTICLES, FRACTION_REGEX, MIXED_GLYPH_REGEX, MIXED_NUMBER_REGEX, PARENTHETICAL_REGEX, PLAIN_NUMBER_REGEX, RANGE_REGEX, SUFFIX_MULTIPLIER_REGEX,
    THOUSANDS_REGEX, TO_TASTE_REGEX, UNICODE_FRACTION_REGEX, UNIT_NAME_LINKERS,
    UNIT_TOKEN_REGEX, ZERO_WIDTH_CHARS,
};
use crate::measurement_types::{NumberLocale, ParserConfig, QuantityRule};
use crate::text_processing::RecipeTextProcessor;
use crate::translation::TranslationTable;
use crate::units::lookup_unit;
use log::{debug, trace, warn};

/// Units that read naturally without an article ("knivspids salt", "bundt persille")
const BARE_UNIT_WORDS: &[Unit] = &[Unit::Pinches, Unit::Handfuls, Unit::Bunches];

/// Characters trimmed from both ends of an extracted name
const NAME_TRIM: &[char] = &[',', ';', ':', '-', '.', ' '];

/// What the first matching rule recognized at the start of a line
#[derive(Debug, Clone, PartialEq)]
struct RuleMatch {
    rule: QuantityRule,
    quantity: Option<f64>,
    unit: Option<Unit>,
    rest: String,
    warning: Option<ParseDegraded>,
}

impl RuleMatch {
    fn new(rule: QuantityRule, quantity: Option<f64>, unit: Option<Unit>, rest: &str) -> Self {
        Self {
            rule,
            quantity,
            unit,
            rest: rest.to_string(),
            warning: None,
        }
    }
}

/// Quantity parser with its number and range policies.
///
/// The vocabulary decides whether a recipe is Danish, which makes every comma
/// in it a decimal separator under [`NumberLocale::Auto`].
#[derive(Debug, Clone)]
pub struct IngredientParser {
    config: ParserConfig,
    vocabulary: TranslationTable,
}

impl Default for IngredientParser {
    fn default() -> Self {
        Self::with_config(ParserConfig::default())
    }
}

impl IngredientParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            vocabulary: TranslationTable::danish(),
        }
    }

    /// Use another table to recognize native recipes
    pub fn with_vocabulary(mut self, vocabulary: TranslationTable) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a single ingredient line on its own
    pub fn parse(&self, line: &str) -> Ingredient {
        self.parse_in_locale(line, self.source_locale(&[line]))
    }

    /// Parse the lines of one recipe, reading every number in the same locale
    pub fn parse_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<Ingredient> {
        let locale = self.source_locale(lines);
        trace!("Reading {} lines with number locale {:?}", lines.len(), locale);
        lines
            .iter()
            .map(|line| self.parse_in_locale(line.as_ref(), locale))
            .collect()
    }

    /// Parse every ingredient line of a recipe text block
    pub fn parse_list(&self, text: &str) -> IngredientList {
        let mut list = IngredientList::new(text.to_string());
        let lines = RecipeTextProcessor::new().split_lines(text);
        for ingredient in self.parse_lines(&lines) {
            list.add_ingredient(ingredient);
        }
        debug!(
            "Parsed {} ingredient lines ({} degraded)",
            list.parsed_count(),
            list.degraded().count()
        );
        list
    }

    /// Settle `Auto` for a whole source: Danish vocabulary anywhere means decimal commas
    fn source_locale<S: AsRef<str>>(&self, lines: &[S]) -> NumberLocale {
        match self.config.number_locale {
            NumberLocale::Auto
                if lines
                    .iter()
                    .any(|line| self.vocabulary.mentions_native(line.as_ref())) =>
            {
                NumberLocale::Comma
            }
            locale => locale,
        }
    }

    fn parse_in_locale(&self, line: &str, locale: NumberLocale) -> Ingredient {
        let cleaned = normalize_line(line);

        let matched = QuantityRule::ORDERED
            .iter()
            .find_map(|rule| self.apply_rule(*rule, &cleaned, locale))
            .unwrap_or_else(|| RuleMatch::new(QuantityRule::NameOnly, None, None, &cleaned));

        trace!("Line '{}' matched rule {}", cleaned, matched.rule);
        build_ingredient(line, &cleaned, matched)
    }

    fn apply_rule(
        &self,
        rule: QuantityRule,
        line: &str,
        locale: NumberLocale,
    ) -> Option<RuleMatch> {
        match rule {
            QuantityRule::MixedNumber => {
                if let Some(caps) = MIXED_NUMBER_REGEX.captures(line) {
                    let whole: f64 = caps[1].parse().ok()?;
                    let fraction = fraction_value(&caps[2], &caps[3]);
                    let rest = &line[caps.get(0)?.end()..];
                    return Some(match fraction {
                        Some(value) => numeric_match(rule, whole + value, rest),
                        None => invalid_fraction(rule, &caps[0], rest),
                    });
                }
                let caps = MIXED_GLYPH_REGEX.captures(line)?;
                let whole: f64 = caps[1].parse().ok()?;
                let glyph = glyph_value(caps[2].chars().next()?)?;
                Some(numeric_match(rule, whole + glyph, &line[caps.get(0)?.end()..]))
            }
            QuantityRule::Fraction => {
                let caps = FRACTION_REGEX.captures(line)?;
                let rest = &line[caps.get(0)?.end()..];
                Some(match fraction_value(&caps[1], &caps[2]) {
                    Some(value) => numeric_match(rule, value, rest),
                    None => invalid_fraction(rule, &caps[0], rest),
                })
            }
            QuantityRule::UnicodeFraction => {
                let caps = UNICODE_FRACTION_REGEX.captures(line)?;
                let value = glyph_value(caps[1].chars().next()?)?;
                Some(numeric_match(rule, value, &line[caps.get(0)?.end()..]))
            }
            QuantityRule::Range => {
                let caps = RANGE_REGEX.captures(line)?;
                let low = parse_number(&caps[1], locale)?;
                let high = parse_number(&caps[2], locale)?;
                let value = self.config.range_policy.resolve(low, high);
                Some(numeric_match(rule, value, &line[caps.get(0)?.end()..]))
            }
            QuantityRule::PlainNumber => {
                let caps = PLAIN_NUMBER_REGEX.captures(line)?;
                let value = parse_number(&caps[1], locale)?;
                Some(numeric_match(rule, value, &line[caps.get(0)?.end()..]))
            }
            QuantityRule::SuffixMultiplier => {
                let caps = SUFFIX_MULTIPLIER_REGEX.captures(line)?;
                let count: f64 = caps["count"].parse().ok()?;
                Some(RuleMatch::new(rule, Some(count), Some(Unit::Pieces), &caps["name"]))
            }
            QuantityRule::UnitOnly => unit_only_match(line),
            QuantityRule::ToTaste => {
                let caps = TO_TASTE_REGEX.captures(line)?;
                let phrase = caps.name("phrase")?;
                let rest = format!("{} {}", &line[..phrase.start()], &line[phrase.end()..]);
                Some(RuleMatch::new(rule, None, Some(Unit::ToTaste), rest.trim()))
            }
            QuantityRule::NameOnly => Some(RuleMatch::new(rule, None, None, line)),
        }
    }
}

/// Parse a single line with the default configuration
pub fn parse_ingredient_line(line: &str) -> Ingredient {
    IngredientParser::new().parse(line)
}

/// Parse a full ingredient list with the default configuration
pub fn parse_ingredient_list(text: &str) -> IngredientList {
    IngredientParser::new().parse_list(text)
}

/// Strip zero-width characters and collapse whitespace
fn normalize_line(line: &str) -> String {
    line.chars()
        .filter(|c| !ZERO_WIDTH_CHARS.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read a number, resolving a comma according to the source's locale.
///
/// Outside Danish sources a comma before exactly three digits groups thousands
/// ("1,500"), unless the number starts with 0 ("0,125").
fn parse_number(text: &str, locale: NumberLocale) -> Option<f64> {
    if !text.contains(',') {
        return text.parse().ok();
    }

    let decimal_comma = match locale {
        NumberLocale::Comma => true,
        NumberLocale::Period => false,
        NumberLocale::Auto => !THOUSANDS_REGEX.is_match(text),
    };

    if decimal_comma {
        text.replace(',', ".").parse().ok()
    } else {
        text.replace(',', "").parse().ok()
    }
}

fn fraction_value(numerator: &str, denominator: &str) -> Option<f64> {
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

fn invalid_fraction(rule: QuantityRule, fraction: &str, rest: &str) -> RuleMatch {
    let (unit, rest) = take_unit(rest);
    let mut matched = RuleMatch::new(rule, None, unit, &rest);
    matched.warning = Some(ParseDegraded::InvalidFraction(fraction.to_string()));
    matched
}

fn numeric_match(rule: QuantityRule, quantity: f64, rest: &str) -> RuleMatch {
    let (unit, rest) = take_unit(rest);
    RuleMatch::new(rule, Some(quantity), unit, &rest)
}

/// Split a unit token off the text following a quantity
fn take_unit(rest: &str) -> (Option<Unit>, String) {
    let trimmed = rest.trim_start();
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() >= 2 {
        let pair = format!("{} {}", words[0], words[1]);
        if let Some(unit) = lookup_unit(pair.trim_end_matches(',')) {
            let remainder = words[2..].join(" ");
            return (Some(unit), strip_linker(&remainder).to_string());
        }
    }

    if let Some(caps) = UNIT_TOKEN_REGEX.captures(trimmed) {
        if let Some(token) = caps.name("unit") {
            if let Some(unit) = lookup_unit(token.as_str()) {
                let remainder = trimmed[token.end()..].trim_start_matches('.');
                return (Some(unit), strip_linker(remainder.trim()).to_string());
            }
        }
    }

    (None, strip_linker(trimmed).to_string())
}

/// "a pinch of salt", "en håndfuld spinat", "knivspids muskat"
fn unit_only_match(line: &str) -> Option<RuleMatch> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let first = words.first()?.to_lowercase();
    let has_article = ARTICLES.contains(&first.as_str());
    let start = usize::from(has_article);

    let unit = lookup_unit(words.get(start)?.trim_end_matches(','))?;
    if !has_article && !BARE_UNIT_WORDS.contains(&unit) {
        return None;
    }

    let remainder = words[start + 1..].join(" ");
    Some(RuleMatch::new(
        QuantityRule::UnitOnly,
        Some(1.0),
        Some(unit),
        strip_linker(&remainder),
    ))
}

/// Drop a leading "of"/"af"
fn strip_linker(text: &str) -> &str {
    let text = text.trim_start();
    for linker in UNIT_NAME_LINKERS {
        if let Some(after) = text.strip_prefix(linker) {
            if after.starts_with(' ') {
                return after.trim_start();
            }
        }
    }
    text
}

/// Separate the name from parenthetical and after-comma notes
fn split_notes(text: &str) -> (String, Option<String>) {
    let mut notes = Vec::new();
    let without_parens = PARENTHETICAL_REGEX.replace_all(text, |caps: &regex::Captures| {
        let note = caps[1].trim();
        if !note.is_empty() {
            notes.push(note.to_string());
        }
        " ".to_string()
    });

    let (name, trailing) = match without_parens.split_once(',') {
        Some((name, trailing)) => (name.to_string(), Some(trailing.trim().to_string())),
        None => (without_parens.to_string(), None),
    };
    if let Some(trailing) = trailing.filter(|t| !t.trim_matches(NAME_TRIM).is_empty()) {
        notes.push(trailing.trim_matches(NAME_TRIM).to_string());
    }

    let name = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(NAME_TRIM)
        .to_string();
    let notes = if notes.is_empty() {
        None
    } else {
        Some(notes.join(", "))
    };
    (name, notes)
}

fn build_ingredient(raw: &str, cleaned: &str, matched: RuleMatch) -> Ingredient {
    let (name, notes) = split_notes(&matched.rest);
    let mut warnings: Vec<ParseDegraded> = matched.warning.into_iter().collect();

    let name = if name.is_empty() && (matched.quantity.is_some() || matched.unit.is_some()) {
        warnings.push(ParseDegraded::MissingName);
        cleaned.to_string()
    } else {
        name
    };

    let degraded_fraction = warnings
        .iter()
        .any(|w| matches!(w, ParseDegraded::InvalidFraction(_)));
    if matched.quantity.is_none()
        && !degraded_fraction
        && matched.unit != Some(Unit::ToTaste)
        && name.chars().any(|c| c.is_ascii_digit())
    {
        warnings.push(ParseDegraded::UnparsedNumber(name.clone()));
    }

    for warning in &warnings {
        warn!("Degraded parse of '{}': {}", raw.trim(), warning);
    }

    Ingredient {
        name,
        quantity: matched.quantity,
        unit: matched.unit,
        notes,
        raw_text: raw.to_string(),
        warnings,
    }
}
