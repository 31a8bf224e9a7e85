//! # Pipeline Configuration
//!
//! Collects every tunable of a shopping run in one structure: how quantities
//! are parsed, how recipes are resized and how products are matched.
//! Settings are loaded from `SHOPPER_*` environment variables (a `.env` file is
//! honored by the binary) and validated before use.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `SHOPPER_SCALE` | Multiply all quantities | unchanged |
//! | `SHOPPER_TARGET_SERVINGS` | Resize to this many servings | unchanged |
//! | `SHOPPER_DIETARY` | Comma list: lactose-free, gluten-free, vegan, vegetarian, pescatarian | none |
//! | `SHOPPER_ALLERGIES` | Comma list: lactose, dairy, gluten, nuts, shellfish, fish, eggs, soy, sesame, celery, mustard | none |
//! | `SHOPPER_MEAL_CONTEXT` | mexican, italian, asian, indian | none |
//! | `SHOPPER_ORGANIC` | Boost organic products | false |
//! | `SHOPPER_BUDGET` | Boost cheap products | false |
//! | `SHOPPER_MATCH_LIMIT` | Ranked matches per ingredient | 5 |
//! | `SHOPPER_NUMBER_LOCALE` | auto, comma, period | auto |
//! | `SHOPPER_RANGE_POLICY` | upper, lower, midpoint | upper |
//! | `SHOPPER_ORDER_OUT_OF_STOCK` | Order quantity for out-of-stock fallbacks | false |

use crate::catalog::{Allergen, DietaryFilter, MealContext};
use crate::errors::{PipelineError, PipelineResult};
use crate::matcher::MatchOptions;
use crate::measurement_types::{NumberLocale, ParserConfig, RangePolicy};
use crate::scaler::ScaleSpec;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Upper bound on ranked matches per ingredient
pub const MAX_MATCH_LIMIT: usize = 50;

/// Complete configuration of a shopping run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub parser: ParserConfig,
    pub scale: ScaleSpec,
    pub matching: MatchOptions,
}

fn parse_bool(name: &str, value: &str) -> PipelineResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(PipelineError::Config(format!(
            "{name} must be a boolean (true/false), got '{value}'"
        ))),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str, expected: &str) -> PipelineResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("{name} must be {expected}, got '{value}'")))
}

impl PipelineConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let factor = get("SHOPPER_SCALE");
        let target = get("SHOPPER_TARGET_SERVINGS");
        config.scale = match (factor, target) {
            (Some(_), Some(_)) => {
                return Err(PipelineError::Config(
                    "SHOPPER_SCALE and SHOPPER_TARGET_SERVINGS cannot both be set".to_string(),
                ))
            }
            (Some(factor), None) => {
                ScaleSpec::Factor(parse_value("SHOPPER_SCALE", &factor, "a number")?)
            }
            (None, Some(target)) => ScaleSpec::TargetServings(parse_value(
                "SHOPPER_TARGET_SERVINGS",
                &target,
                "a whole number",
            )?),
            (None, None) => ScaleSpec::Unchanged,
        };

        if let Some(dietary) = get("SHOPPER_DIETARY") {
            for filter in dietary.split(',').filter(|f| !f.trim().is_empty()) {
                let filter = filter
                    .parse::<DietaryFilter>()
                    .map_err(|e| PipelineError::Config(format!("SHOPPER_DIETARY: {e}")))?;
                config.matching.filters.insert(filter);
            }
        }

        if let Some(allergies) = get("SHOPPER_ALLERGIES") {
            for allergen in allergies.split(',').filter(|a| !a.trim().is_empty()) {
                let allergen = allergen
                    .parse::<Allergen>()
                    .map_err(|e| PipelineError::Config(format!("SHOPPER_ALLERGIES: {e}")))?;
                config.matching.allergies.insert(allergen);
            }
        }

        if let Some(context) = get("SHOPPER_MEAL_CONTEXT") {
            let context = context
                .parse::<MealContext>()
                .map_err(|e| PipelineError::Config(format!("SHOPPER_MEAL_CONTEXT: {e}")))?;
            config.matching.context = Some(context);
        }

        if let Some(value) = get("SHOPPER_ORGANIC") {
            config.matching.boosts.organic = parse_bool("SHOPPER_ORGANIC", &value)?;
        }
        if let Some(value) = get("SHOPPER_BUDGET") {
            config.matching.boosts.budget = parse_bool("SHOPPER_BUDGET", &value)?;
        }
        if let Some(value) = get("SHOPPER_ORDER_OUT_OF_STOCK") {
            config.matching.order_out_of_stock_fallback =
                parse_bool("SHOPPER_ORDER_OUT_OF_STOCK", &value)?;
        }
        if let Some(value) = get("SHOPPER_MATCH_LIMIT") {
            config.matching.limit = parse_value("SHOPPER_MATCH_LIMIT", &value, "a whole number")?;
        }

        if let Some(value) = get("SHOPPER_NUMBER_LOCALE") {
            config.parser.number_locale = value
                .parse::<NumberLocale>()
                .map_err(|e| PipelineError::Config(format!("SHOPPER_NUMBER_LOCALE: {e}")))?;
        }
        if let Some(value) = get("SHOPPER_RANGE_POLICY") {
            config.parser.range_policy = value
                .parse::<RangePolicy>()
                .map_err(|e| PipelineError::Config(format!("SHOPPER_RANGE_POLICY: {e}")))?;
        }

        config.validate()?;
        debug!("Loaded configuration: {}", config.summary());
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> PipelineResult<()> {
        match self.scale {
            ScaleSpec::Factor(factor) if !factor.is_finite() || factor <= 0.0 => {
                return Err(PipelineError::Config(format!(
                    "Scale factor must be positive, got {factor}"
                )));
            }
            ScaleSpec::TargetServings(0) => {
                return Err(PipelineError::Config(
                    "Target servings cannot be 0".to_string(),
                ));
            }
            _ => {}
        }

        if self.matching.limit == 0 {
            return Err(PipelineError::Config("Match limit cannot be 0".to_string()));
        }
        if self.matching.limit > MAX_MATCH_LIMIT {
            return Err(PipelineError::Config(format!(
                "Match limit cannot be greater than {MAX_MATCH_LIMIT}"
            )));
        }

        Ok(())
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        let filters: Vec<String> = self.matching.filters.iter().map(|f| f.to_string()).collect();
        let allergies: Vec<String> = self.matching.allergies.iter().map(|a| a.to_string()).collect();
        format!(
            "scale={:?}, filters=[{}], allergies=[{}], context={}, organic={}, budget={}, limit={}, locale={:?}, range={:?}",
            self.scale,
            filters.join(","),
            allergies.join(","),
            self.matching
                .context
                .map_or_else(|| "none".to_string(), |c| c.to_string()),
            self.matching.boosts.organic,
            self.matching.boosts.budget,
            self.matching.limit,
            self.parser.number_locale,
            self.parser.range_policy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> PipelineResult<PipelineConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.scale, ScaleSpec::Unchanged);
        assert_eq!(config.matching.limit, 5);
        assert!(config.matching.filters.is_empty());
        assert_eq!(config.parser.range_policy, RangePolicy::Upper);
    }

    #[test]
    fn test_full_configuration() {
        let config = load(&[
            ("SHOPPER_TARGET_SERVINGS", "6"),
            ("SHOPPER_DIETARY", "lactose-free, vegan"),
            ("SHOPPER_ALLERGIES", "nødder, Gluten"),
            ("SHOPPER_MEAL_CONTEXT", "Italian"),
            ("SHOPPER_ORGANIC", "yes"),
            ("SHOPPER_BUDGET", "0"),
            ("SHOPPER_MATCH_LIMIT", "3"),
            ("SHOPPER_NUMBER_LOCALE", "period"),
            ("SHOPPER_RANGE_POLICY", "midpoint"),
            ("SHOPPER_ORDER_OUT_OF_STOCK", "on"),
        ])
        .unwrap();

        assert_eq!(config.scale, ScaleSpec::TargetServings(6));
        assert!(config.matching.filters.contains(&DietaryFilter::LactoseFree));
        assert!(config.matching.filters.contains(&DietaryFilter::Vegan));
        assert!(config.matching.allergies.contains(&Allergen::Nuts));
        assert!(config.matching.allergies.contains(&Allergen::Gluten));
        assert!(config.summary().contains("allergies=[gluten,nuts]"));
        assert_eq!(config.matching.context, Some(MealContext::Italian));
        assert!(config.matching.boosts.organic);
        assert!(!config.matching.boosts.budget);
        assert_eq!(config.matching.limit, 3);
        assert_eq!(config.parser.number_locale, NumberLocale::Period);
        assert_eq!(config.parser.range_policy, RangePolicy::Midpoint);
        assert!(config.matching.order_out_of_stock_fallback);
    }

    #[test]
    fn test_scale_factor() {
        let config = load(&[("SHOPPER_SCALE", "1.5")]).unwrap();
        assert_eq!(config.scale, ScaleSpec::Factor(1.5));

        // Blank values count as unset
        let config = load(&[("SHOPPER_SCALE", "  ")]).unwrap();
        assert_eq!(config.scale, ScaleSpec::Unchanged);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("SHOPPER_SCALE", "2"), ("SHOPPER_TARGET_SERVINGS", "4")]).is_err());
        assert!(load(&[("SHOPPER_SCALE", "abc")]).is_err());
        assert!(load(&[("SHOPPER_SCALE", "-1")]).is_err());
        assert!(load(&[("SHOPPER_TARGET_SERVINGS", "0")]).is_err());
        assert!(load(&[("SHOPPER_DIETARY", "keto")]).is_err());
        assert!(load(&[("SHOPPER_ALLERGIES", "kiwi")]).is_err());
        assert!(load(&[("SHOPPER_MEAL_CONTEXT", "martian")]).is_err());
        assert!(load(&[("SHOPPER_ORGANIC", "maybe")]).is_err());
        assert!(load(&[("SHOPPER_MATCH_LIMIT", "0")]).is_err());
        assert!(load(&[("SHOPPER_MATCH_LIMIT", "500")]).is_err());
        assert!(load(&[("SHOPPER_RANGE_POLICY", "widest")]).is_err());
    }

    #[test]
    fn test_error_messages_name_the_variable() {
        let err = load(&[("SHOPPER_BUDGET", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("SHOPPER_BUDGET"));
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_summary() {
        let config = load(&[("SHOPPER_DIETARY", "gluten-free")]).unwrap();
        let summary = config.summary();
        assert!(summary.contains("filters=[gluten-free]"));
        assert!(summary.contains("limit=5"));
    }
}
