//! # Measurement Patterns Module
//!
//! This module contains regex patterns and constants used for quantity detection.
//! Every pattern is anchored at the start of the (already trimmed) line, so the
//! parser can try them in priority order and stop at the first hit.

use lazy_static::lazy_static;
use regex::Regex;

/// A decimal number with an optional `.` or `,` separator
pub const NUMBER_PATTERN: &str = r"[0-9]+(?:[.,][0-9]+)?";

/// Unicode vulgar fraction glyphs and their values
pub const FRACTION_GLYPHS: &[(char, f64)] = &[
    ('½', 0.5),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅕', 0.2),
    ('⅖', 0.4),
    ('⅗', 0.6),
    ('⅘', 0.8),
    ('⅙', 1.0 / 6.0),
    ('⅚', 5.0 / 6.0),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

/// Characters that OCR and copy-paste leave inside lines
pub const ZERO_WIDTH_CHARS: &[char] = &['\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}'];

/// Leading words that stand in for "1" before a unit ("en knivspids salt")
pub const ARTICLES: &[&str] = &["a", "an", "one", "en", "et", "ét", "én"];

/// Words that may follow a unit before the name ("1 cup of milk")
pub const UNIT_NAME_LINKERS: &[&str] = &["of", "af"];

/// Prefixes that mark a pack size as approximate ("ca. 500 g")
pub const PACK_SIZE_PREFIXES: &[&str] = &["ca.", "ca", "cirka", "approx.", "approx", "~"];

fn glyph_class() -> String {
    FRACTION_GLYPHS.iter().map(|(glyph, _)| *glyph).collect()
}

lazy_static! {
    /// "1 1/2", "2 3⁄4"
    pub static ref MIXED_NUMBER_REGEX: Regex =
        Regex::new(r"^([0-9]+)\s+([0-9]+)\s*[/⁄]\s*([0-9]+)")
            .expect("Mixed number pattern should be valid");

    /// "1½", "2 ¾"
    pub static ref MIXED_GLYPH_REGEX: Regex =
        Regex::new(&format!(r"^([0-9]+)\s*([{}])", glyph_class()))
            .expect("Mixed glyph pattern should be valid");

    /// "1/2", "3⁄4"
    pub static ref FRACTION_REGEX: Regex =
        Regex::new(r"^([0-9]+)\s*[/⁄]\s*([0-9]+)")
            .expect("Fraction pattern should be valid");

    /// "½", "¾"
    pub static ref UNICODE_FRACTION_REGEX: Regex =
        Regex::new(&format!(r"^([{}])", glyph_class()))
            .expect("Unicode fraction pattern should be valid");

    /// "2-3", "2 – 3", "2 to 3", "2 til 3"
    pub static ref RANGE_REGEX: Regex = Regex::new(&format!(
        r"(?i)^({num})(?:\s*[-–—]\s*|\s+(?:to|til|or|eller)\s+)({num})",
        num = NUMBER_PATTERN
    ))
    .expect("Range pattern should be valid");

    /// "400", "1.5", "1,5", "1,500"
    pub static ref PLAIN_NUMBER_REGEX: Regex =
        Regex::new(&format!(r"^({})", NUMBER_PATTERN))
            .expect("Plain number pattern should be valid");

    /// "æg x6", "citron × 2" with no leading quantity
    pub static ref SUFFIX_MULTIPLIER_REGEX: Regex =
        Regex::new(r"^(?P<name>.*\S)\s*(?:\s[xX]|×)\s*(?P<count>[0-9]+)\s*$")
            .expect("Suffix multiplier pattern should be valid");

    /// The unit token directly after a quantity, attached or separated ("400g", "2 dl")
    pub static ref UNIT_TOKEN_REGEX: Regex =
        Regex::new(r"^\s*(?P<unit>\p{L}+)\.?(?:\s+|$|[,(])")
            .expect("Unit token pattern should be valid");

    /// "to taste", "efter smag", "as needed"
    pub static ref TO_TASTE_REGEX: Regex =
        Regex::new(r"(?i)(?:^|[\s,(])(?P<phrase>to taste|efter smag|as needed|efter behov)(?:$|[\s,.)])")
            .expect("To taste pattern should be valid");

    /// Thousands grouping: "1,500", "12,000,000" but never "0,125"
    pub static ref THOUSANDS_REGEX: Regex =
        Regex::new(r"^[1-9][0-9]{0,2}(?:,[0-9]{3})+$")
            .expect("Thousands pattern should be valid");

    /// Parenthetical notes: "(finely chopped)"
    pub static ref PARENTHETICAL_REGEX: Regex =
        Regex::new(r"\(([^)]*)\)")
            .expect("Parenthetical pattern should be valid");

    /// Pack sizes that hold several units: "2 x 500 g", "4×125g / Arla"
    pub static ref MULTIPACK_REGEX: Regex = Regex::new(&format!(
        r"(?i)\b([0-9]+)\s*[x×]\s*({num})\s*(\p{{L}}+)",
        num = NUMBER_PATTERN
    ))
    .expect("Multipack pattern should be valid");

    /// Simple pack sizes anywhere in a description: "500 g", "1 l / Arla", "0,5 kg, frost"
    pub static ref PACK_SIZE_REGEX: Regex = Regex::new(&format!(
        r"(?i)\b({num})\s*(\p{{L}}+)",
        num = NUMBER_PATTERN
    ))
    .expect("Pack size pattern should be valid");
}

/// Look up the value of a vulgar fraction glyph
pub fn glyph_value(glyph: char) -> Option<f64> {
    FRACTION_GLYPHS
        .iter()
        .find(|(candidate, _)| *candidate == glyph)
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_values() {
        assert_eq!(glyph_value('½'), Some(0.5));
        assert_eq!(glyph_value('¾'), Some(0.75));
        assert_eq!(glyph_value('x'), None);
    }

    #[test]
    fn test_mixed_patterns() {
        let caps = MIXED_NUMBER_REGEX.captures("1 1/2 dl mælk").unwrap();
        assert_eq!(&caps[1], "1");
        assert_eq!(&caps[3], "2");

        assert!(MIXED_GLYPH_REGEX.is_match("1½ tsk salt"));
        assert!(!MIXED_NUMBER_REGEX.is_match("1/2 dl"));
    }

    #[test]
    fn test_range_pattern() {
        assert!(RANGE_REGEX.is_match("2-3 fed hvidløg"));
        assert!(RANGE_REGEX.is_match("2 – 3 gulerødder"));
        assert!(RANGE_REGEX.is_match("2 to 3 carrots"));
        assert!(RANGE_REGEX.is_match("1,5-2 dl"));
        assert!(!RANGE_REGEX.is_match("2 tomater"));
    }

    #[test]
    fn test_unit_token_pattern() {
        let caps = UNIT_TOKEN_REGEX.captures("g spaghetti").unwrap();
        assert_eq!(&caps["unit"], "g");

        let caps = UNIT_TOKEN_REGEX.captures(" spsk. olie").unwrap();
        assert_eq!(&caps["unit"], "spsk");
    }

    #[test]
    fn test_suffix_multiplier_pattern() {
        let caps = SUFFIX_MULTIPLIER_REGEX.captures("æg x6").unwrap();
        assert_eq!(&caps["name"], "æg");
        assert_eq!(&caps["count"], "6");

        let caps = SUFFIX_MULTIPLIER_REGEX.captures("citroner × 2").unwrap();
        assert_eq!(&caps["name"], "citroner");

        assert!(!SUFFIX_MULTIPLIER_REGEX.is_match("mix6"));
    }

    #[test]
    fn test_thousands_pattern() {
        assert!(THOUSANDS_REGEX.is_match("1,500"));
        assert!(!THOUSANDS_REGEX.is_match("1,5"));
        assert!(!THOUSANDS_REGEX.is_match("1,50"));
        assert!(!THOUSANDS_REGEX.is_match("0,125"));
    }

    #[test]
    fn test_pack_size_patterns() {
        let caps = PACK_SIZE_REGEX.captures("500 g / Arla").unwrap();
        assert_eq!(&caps[1], "500");
        assert_eq!(&caps[2], "g");

        // Unit words are any letters, Danish ones included
        let caps = PACK_SIZE_REGEX.captures("ca. 0,5 kg, frost").unwrap();
        assert_eq!(&caps[1], "0,5");
        assert_eq!(&caps[2], "kg");
        let caps = PACK_SIZE_REGEX.captures("6 æsker").unwrap();
        assert_eq!(&caps[2], "æsker");

        let caps = MULTIPACK_REGEX.captures("4×125g / Arla").unwrap();
        assert_eq!(&caps[1], "4");
        assert_eq!(&caps[2], "125");
        assert_eq!(&caps[3], "g");
        assert!(MULTIPACK_REGEX.captures("500 g").is_none());
    }
}
