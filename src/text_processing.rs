//! # Text Processing Module
//!
//! This module prepares pasted or scraped recipe text for the quantity parser:
//! it picks out the ingredient lines and reads the declared serving count.
//!
//! ## Features
//!
//! - Header detection ("Ingredients", "Ingredienser", "Til dejen:")
//! - Method sections end the ingredient list ("Fremgangsmåde", "Instructions")
//! - Bullet and numbering removal ("- 2 løg", "3) 1 dl fløde")
//! - Serving extraction in English and Danish ("4 personer", "serves 4")

use lazy_static::lazy_static;
use log::{debug, info, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Headings that end the ingredient section
const METHOD_HEADINGS: &[&str] = &[
    "instructions",
    "method",
    "directions",
    "preparation",
    "steps",
    "fremgangsmåde",
    "fremgangsmaade",
    "tilberedning",
    "sådan gør du",
];

/// Headings that introduce an ingredient section
const INGREDIENT_HEADINGS: &[&str] = &["ingredients", "ingredienser", "du skal bruge"];

lazy_static! {
    static ref BULLET_REGEX: Regex =
        Regex::new(r"^(?:[-*•·▪–]\s*)+").expect("Bullet pattern should be valid");

    static ref NUMBERING_REGEX: Regex =
        Regex::new(r"^[0-9]{1,2}[.)]\s+").expect("Numbering pattern should be valid");

    static ref SEPARATOR_REGEX: Regex =
        Regex::new(r"^[-=_*~]{3,}$").expect("Separator pattern should be valid");

    /// "4 personer", "4 servings", "6 portioner", "til 4 personer"
    static ref SERVINGS_COUNT_FIRST: Regex = Regex::new(
        r"(?i)\b([0-9]{1,3})\s*(?:personer|person|pers\.?|portioner|portion|servings|serving|people|persons|portions)\b"
    )
    .expect("Servings pattern should be valid");

    /// "serves 4", "Servings: 4", "Portioner: 6", "yield 8"
    static ref SERVINGS_LABEL_FIRST: Regex = Regex::new(
        r"(?i)\b(?:serves|servings|portioner|antal personer|yield|makes)\s*:?\s*([0-9]{1,3})\b"
    )
    .expect("Servings label pattern should be valid");
}

/// A recipe as delivered by a scraper or a pasted text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSource {
    pub title: String,
    /// Declared serving count, if the recipe states one
    pub servings: Option<u32>,
    /// Raw ingredient lines
    pub lines: Vec<String>,
}

impl RecipeSource {
    pub fn new(title: &str, servings: Option<u32>, lines: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            servings,
            lines,
        }
    }
}

/// Configuration options for recipe text processing
#[derive(Debug, Clone)]
pub struct TextProcessingConfig {
    /// Lines longer than this are prose, not ingredients
    pub max_line_length: usize,
    /// Whether a method heading ends the ingredient section
    pub stop_at_method: bool,
}

impl Default for TextProcessingConfig {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            stop_at_method: true,
        }
    }
}

/// Splits recipe text into ingredient lines
#[derive(Debug, Clone, Default)]
pub struct RecipeTextProcessor {
    config: TextProcessingConfig,
}

impl RecipeTextProcessor {
    /// Create a processor with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with custom configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Line length limit and method-section handling
    pub fn with_config(config: TextProcessingConfig) -> Self {
        Self { config }
    }

    /// Extract the ingredient lines from a block of recipe text
    ///
    /// # Arguments
    ///
    /// * `text` - Recipe text, one ingredient per line
    ///
    /// # Returns
    ///
    /// The cleaned ingredient lines, in order
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recipe_shopper::text_processing::RecipeTextProcessor;
    ///
    /// let processor = RecipeTextProcessor::new();
    /// let lines = processor.split_lines("Ingredienser:\n- 2 løg\n- 1 dl fløde");
    /// assert_eq!(lines, vec!["2 løg", "1 dl fløde"]);
    /// ```
    pub fn split_lines(&self, text: &str) -> Vec<String> {
        let mut lines = Vec::new();

        for (line_number, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || SEPARATOR_REGEX.is_match(line) {
                continue;
            }

            if self.config.stop_at_method && is_method_heading(line) {
                debug!("Method section starts at line {}, stopping", line_number + 1);
                break;
            }

            if is_header(line) || is_servings_line(line) {
                trace!("Skipping header line {}: '{}'", line_number + 1, line);
                continue;
            }

            let cleaned = strip_list_marker(line);
            if cleaned.is_empty() {
                continue;
            }
            if cleaned.chars().count() > self.config.max_line_length {
                debug!("Skipping prose line {} ({} chars)", line_number + 1, cleaned.len());
                continue;
            }

            lines.push(cleaned.to_string());
        }

        trace!("Extracted {} ingredient lines", lines.len());
        lines
    }

    /// Find the declared serving count in recipe text
    pub fn extract_servings(&self, text: &str) -> Option<u32> {
        let servings = SERVINGS_COUNT_FIRST
            .captures(text)
            .or_else(|| SERVINGS_LABEL_FIRST.captures(text))
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|servings| *servings > 0);

        match servings {
            Some(count) => debug!("Recipe declares {} servings", count),
            None => trace!("No serving count found"),
        }
        servings
    }

    /// Build a [`RecipeSource`] from a titled block of text
    pub fn recipe_from_text(&self, title: &str, text: &str) -> RecipeSource {
        let recipe = RecipeSource::new(title, self.extract_servings(text), self.split_lines(text));
        info!(
            "Recipe '{}': {} ingredient lines, servings {:?}",
            recipe.title,
            recipe.lines.len(),
            recipe.servings
        );
        recipe
    }
}

fn heading_text(line: &str) -> String {
    line.trim_end_matches(':').trim().to_lowercase()
}

fn is_method_heading(line: &str) -> bool {
    let heading = heading_text(line);
    METHOD_HEADINGS.contains(&heading.as_str())
}

fn is_header(line: &str) -> bool {
    let heading = heading_text(line);
    if INGREDIENT_HEADINGS.contains(&heading.as_str()) {
        return true;
    }
    if line.ends_with(':') {
        return true;
    }
    let lower = line.to_lowercase();
    lower.starts_with("for the ") && !lower.chars().any(|c| c.is_ascii_digit())
}

fn is_servings_line(line: &str) -> bool {
    let matched = SERVINGS_COUNT_FIRST
        .find(line)
        .or_else(|| SERVINGS_LABEL_FIRST.find(line));
    match matched {
        // Only when the serving phrase is the whole line, optionally "til"/"for"-prefixed
        Some(m) => {
            let prefix = line[..m.start()].trim().to_lowercase();
            let suffix = line[m.end()..].trim();
            (prefix.is_empty() || prefix == "til" || prefix == "for") && suffix.is_empty()
        }
        None => false,
    }
}

fn strip_list_marker(line: &str) -> &str {
    let line = match BULLET_REGEX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    };
    let line = match NUMBERING_REGEX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    };
    line.trim()
}
