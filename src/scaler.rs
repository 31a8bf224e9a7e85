//! # Scaler
//!
//! Scales parsed ingredients by a factor or a servings ratio and rounds the
//! result to amounts a cook can measure or a shop can sell.
//!
//! The exact scaled quantity is always kept next to the rounded one. Rescaling
//! starts again from the parsed ingredient with the combined factor, so
//! rounding never compounds and a factor of 1.0 reproduces the parsed value.

use crate::errors::ScaleError;
use crate::ingredient_model::{format_quantity, Ingredient, Unit, UnitClass};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deciliter amounts up to this value are measured with a cup; above it they are bulk
pub const SMALL_VOLUME_THRESHOLD_DL: f64 = 10.0;

/// Smallest step for spoon and cup measures
const QUARTER_STEP: f64 = 0.25;

/// Bulk rounding steps in base units (g / ml)
const BULK_FINE_STEP: f64 = 5.0;
const BULK_COARSE_STEP: f64 = 25.0;
const BULK_COARSE_FROM: f64 = 100.0;

/// Tolerance so float noise like 2.0000000001 does not ceil to 3
const CEIL_EPSILON: f64 = 1e-9;

/// How a scaled quantity is rounded for display and shopping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Whole items: eggs, cloves, cans
    CeilInteger,
    /// Nearest quarter of a spoon, cup or small dl amount
    QuarterStep,
    /// Nearest 5 (below 100) or 25 base units
    BulkIncrement,
    /// No quantity to round
    None,
}

impl RoundingPolicy {
    /// Pick the policy for a quantity in a given unit
    pub fn for_quantity(quantity: Option<f64>, unit: Option<Unit>) -> Self {
        let quantity = match quantity {
            Some(q) => q,
            None => return RoundingPolicy::None,
        };

        match unit {
            None => RoundingPolicy::CeilInteger,
            Some(unit) => match unit.class() {
                UnitClass::Count | UnitClass::Imprecise => RoundingPolicy::CeilInteger,
                UnitClass::Mass => match unit {
                    Unit::Ounces | Unit::Pounds => RoundingPolicy::QuarterStep,
                    _ => RoundingPolicy::BulkIncrement,
                },
                UnitClass::Volume => match unit {
                    Unit::Teaspoons
                    | Unit::Tablespoons
                    | Unit::Cups
                    | Unit::FluidOunces
                    | Unit::Centiliters => RoundingPolicy::QuarterStep,
                    Unit::Deciliters if quantity <= SMALL_VOLUME_THRESHOLD_DL => {
                        RoundingPolicy::QuarterStep
                    }
                    _ => RoundingPolicy::BulkIncrement,
                },
            },
        }
    }

    /// Round a quantity expressed in `unit`.
    ///
    /// Monotone non-decreasing and never maps a positive quantity to zero.
    pub fn apply(&self, quantity: f64, unit: Option<Unit>) -> f64 {
        if quantity <= 0.0 {
            return quantity;
        }

        match self {
            RoundingPolicy::CeilInteger => (quantity - CEIL_EPSILON).ceil().max(1.0),
            RoundingPolicy::QuarterStep => {
                ((quantity / QUARTER_STEP).round() * QUARTER_STEP).max(QUARTER_STEP)
            }
            RoundingPolicy::BulkIncrement => {
                let factor = unit
                    .and_then(|u| u.base_factor())
                    .map(|(factor, _)| factor)
                    .unwrap_or(1.0);
                let base = quantity * factor;
                let step = if base < BULK_COARSE_FROM {
                    BULK_FINE_STEP
                } else {
                    BULK_COARSE_STEP
                };
                let rounded = ((base / step).round() * step).max(BULK_FINE_STEP);
                rounded / factor
            }
            RoundingPolicy::None => quantity,
        }
    }
}

impl fmt::Display for RoundingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundingPolicy::CeilInteger => "ceil-integer",
            RoundingPolicy::QuarterStep => "quarter-step",
            RoundingPolicy::BulkIncrement => "bulk-increment",
            RoundingPolicy::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// An ingredient after scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledIngredient {
    /// The parsed ingredient, unchanged
    pub ingredient: Ingredient,
    /// Total factor applied to the parsed quantity
    pub scale_factor: f64,
    /// Exact scaled quantity
    pub quantity: Option<f64>,
    /// Quantity after kitchen rounding
    pub practical_quantity: Option<f64>,
    pub rounding: RoundingPolicy,
}

impl ScaledIngredient {
    /// Scale again, combining with the factor already applied
    pub fn rescale(&self, factor: f64) -> Result<ScaledIngredient, ScaleError> {
        validate_factor(factor)?;
        scale(&self.ingredient, self.scale_factor * factor)
    }

    pub fn name(&self) -> &str {
        &self.ingredient.name
    }

    pub fn unit(&self) -> Option<Unit> {
        self.ingredient.unit
    }
}

impl fmt::Display for ScaledIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(quantity) = self.practical_quantity {
            write!(f, "{} ", format_quantity(quantity))?;
        }
        if let Some(unit) = self.ingredient.unit {
            write!(f, "{} ", unit)?;
        }
        write!(f, "{}", self.ingredient.name)
    }
}

/// How the recipe should be resized
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode", content = "value")]
pub enum ScaleSpec {
    #[default]
    Unchanged,
    /// Multiply every quantity by this factor
    Factor(f64),
    /// Resize to this many servings
    TargetServings(u32),
}

fn validate_factor(factor: f64) -> Result<(), ScaleError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(ScaleError::InvalidFactor(factor));
    }
    Ok(())
}

fn validate_servings(servings: f64) -> Result<(), ScaleError> {
    if !servings.is_finite() || servings <= 0.0 {
        return Err(ScaleError::InvalidServings(servings));
    }
    Ok(())
}

/// Scale an ingredient by a factor
pub fn scale(ingredient: &Ingredient, factor: f64) -> Result<ScaledIngredient, ScaleError> {
    validate_factor(factor)?;

    let quantity = ingredient.quantity.map(|q| q * factor);
    let rounding = RoundingPolicy::for_quantity(quantity, ingredient.unit);
    let practical_quantity = quantity.map(|q| rounding.apply(q, ingredient.unit));

    trace!(
        "Scaled '{}' by {}: {:?} -> {:?} ({})",
        ingredient.name,
        factor,
        ingredient.quantity,
        practical_quantity,
        rounding
    );

    Ok(ScaledIngredient {
        ingredient: ingredient.clone(),
        scale_factor: factor,
        quantity,
        practical_quantity,
        rounding,
    })
}

/// Scale an ingredient from one serving count to another
pub fn scale_to_servings(
    ingredient: &Ingredient,
    original_servings: f64,
    target_servings: f64,
) -> Result<ScaledIngredient, ScaleError> {
    validate_servings(original_servings)?;
    validate_servings(target_servings)?;
    scale(ingredient, target_servings / original_servings)
}

/// Scale every ingredient by the same factor
pub fn scale_all(
    ingredients: &[Ingredient],
    factor: f64,
) -> Result<Vec<ScaledIngredient>, ScaleError> {
    ingredients.iter().map(|i| scale(i, factor)).collect()
}

/// Resolve a [`ScaleSpec`] against the servings a recipe declares
pub fn calculate_scale_factor(
    declared_servings: Option<u32>,
    spec: &ScaleSpec,
) -> Result<f64, ScaleError> {
    let factor = match spec {
        ScaleSpec::Unchanged => 1.0,
        ScaleSpec::Factor(factor) => {
            validate_factor(*factor)?;
            *factor
        }
        ScaleSpec::TargetServings(target) => {
            let declared = declared_servings.ok_or(ScaleError::MissingServings)?;
            validate_servings(declared as f64)?;
            validate_servings(*target as f64)?;
            *target as f64 / declared as f64
        }
    };
    debug!("Scale factor {} from {:?}", factor, spec);
    Ok(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(name: &str, quantity: f64) -> Ingredient {
        Ingredient::new(name)
            .with_quantity(quantity)
            .with_unit(Unit::Grams)
    }

    #[test]
    fn test_scale_doubles_quantity() {
        let scaled = scale(&grams("spaghetti", 400.0), 2.0).unwrap();
        assert_eq!(scaled.quantity, Some(800.0));
        assert_eq!(scaled.practical_quantity, Some(800.0));
        assert_eq!(scaled.rounding, RoundingPolicy::BulkIncrement);
    }

    #[test]
    fn test_invalid_factors() {
        let ingredient = grams("mel", 100.0);
        assert_eq!(scale(&ingredient, 0.0), Err(ScaleError::InvalidFactor(0.0)));
        assert_eq!(scale(&ingredient, -2.0), Err(ScaleError::InvalidFactor(-2.0)));
        assert!(scale(&ingredient, f64::NAN).is_err());
        assert!(scale(&ingredient, f64::INFINITY).is_err());
    }

    #[test]
    fn test_scale_to_servings() {
        let eggs = Ingredient::new("æg").with_quantity(3.0);
        let scaled = scale_to_servings(&eggs, 4.0, 6.0).unwrap();
        assert_eq!(scaled.quantity, Some(4.5));
        assert_eq!(scaled.practical_quantity, Some(5.0));
        assert_eq!(scaled.rounding, RoundingPolicy::CeilInteger);

        assert_eq!(
            scale_to_servings(&eggs, 0.0, 6.0),
            Err(ScaleError::InvalidServings(0.0))
        );
        assert_eq!(
            scale_to_servings(&eggs, 4.0, -1.0),
            Err(ScaleError::InvalidServings(-1.0))
        );
    }

    #[test]
    fn test_rescale_returns_to_original() {
        let eggs = Ingredient::new("æg").with_quantity(3.0).with_unit(Unit::Pieces);
        let doubled = scale(&eggs, 2.0).unwrap();
        let back = doubled.rescale(0.5).unwrap();
        assert_eq!(back.quantity, Some(3.0));
        assert_eq!(back.practical_quantity, Some(3.0));
        assert_eq!(back.scale_factor, 1.0);

        let milk = Ingredient::new("mælk").with_quantity(1.3).with_unit(Unit::Deciliters);
        let back = scale(&milk, 3.0).unwrap().rescale(1.0 / 3.0).unwrap();
        assert!((back.quantity.unwrap() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_factor_one_has_no_drift() {
        let oil = Ingredient::new("olie").with_quantity(0.3).with_unit(Unit::Tablespoons);
        let scaled = scale(&oil, 1.0).unwrap();
        assert_eq!(scaled.quantity, Some(0.3));
    }

    #[test]
    fn test_quantity_less_ingredients_stay_quantity_less() {
        let salt = Ingredient::new("salt").with_unit(Unit::ToTaste);
        let scaled = scale(&salt, 3.0).unwrap();
        assert_eq!(scaled.quantity, None);
        assert_eq!(scaled.practical_quantity, None);
        assert_eq!(scaled.rounding, RoundingPolicy::None);
    }

    #[test]
    fn test_rounding_policy_selection() {
        assert_eq!(
            RoundingPolicy::for_quantity(Some(2.0), Some(Unit::Teaspoons)),
            RoundingPolicy::QuarterStep
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(4.0), Some(Unit::Deciliters)),
            RoundingPolicy::QuarterStep
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(12.0), Some(Unit::Deciliters)),
            RoundingPolicy::BulkIncrement
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(1.0), Some(Unit::Pinches)),
            RoundingPolicy::CeilInteger
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(1.5), Some(Unit::Pounds)),
            RoundingPolicy::QuarterStep
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(2.0), Some(Unit::Sprigs)),
            RoundingPolicy::CeilInteger
        );
        assert_eq!(
            RoundingPolicy::for_quantity(Some(2.0), None),
            RoundingPolicy::CeilInteger
        );
    }

    #[test]
    fn test_quarter_step_rounding() {
        let policy = RoundingPolicy::QuarterStep;
        assert_eq!(policy.apply(0.3, Some(Unit::Teaspoons)), 0.25);
        assert_eq!(policy.apply(0.4, Some(Unit::Teaspoons)), 0.5);
        assert_eq!(policy.apply(0.05, Some(Unit::Teaspoons)), 0.25);
        assert_eq!(policy.apply(1.75, Some(Unit::Cups)), 1.75);
    }

    #[test]
    fn test_bulk_rounding() {
        let policy = RoundingPolicy::BulkIncrement;
        assert_eq!(policy.apply(43.0, Some(Unit::Grams)), 45.0);
        assert_eq!(policy.apply(1.0, Some(Unit::Grams)), 5.0);
        assert_eq!(policy.apply(310.0, Some(Unit::Grams)), 300.0);
        assert_eq!(policy.apply(340.0, Some(Unit::Milliliters)), 350.0);
        assert_eq!(policy.apply(1.26, Some(Unit::Kilograms)), 1.25);
    }

    #[test]
    fn test_rounding_never_reaches_zero() {
        for policy in [
            RoundingPolicy::CeilInteger,
            RoundingPolicy::QuarterStep,
            RoundingPolicy::BulkIncrement,
        ] {
            assert!(policy.apply(0.001, Some(Unit::Grams)) > 0.0);
        }
    }

    #[test]
    fn test_scaling_is_monotone_in_factor() {
        let ingredients = [
            grams("mel", 37.0),
            Ingredient::new("fløde").with_quantity(3.5).with_unit(Unit::Deciliters),
            Ingredient::new("salt").with_quantity(0.5).with_unit(Unit::Teaspoons),
            Ingredient::new("løg").with_quantity(1.0),
        ];

        for ingredient in &ingredients {
            let mut previous_exact = 0.0;
            let mut previous_practical = 0.0;
            for step in 1..=60 {
                let factor = step as f64 * 0.25;
                let scaled = scale(ingredient, factor).unwrap();
                let exact = scaled.quantity.unwrap();
                let practical = scaled.practical_quantity.unwrap();
                assert!(exact >= previous_exact, "{} exact at {}", ingredient.name, factor);
                assert!(
                    practical >= previous_practical,
                    "{} practical at {}",
                    ingredient.name,
                    factor
                );
                previous_exact = exact;
                previous_practical = practical;
            }
        }
    }

    #[test]
    fn test_calculate_scale_factor() {
        assert_eq!(calculate_scale_factor(Some(4), &ScaleSpec::Unchanged), Ok(1.0));
        assert_eq!(calculate_scale_factor(None, &ScaleSpec::Factor(1.5)), Ok(1.5));
        assert_eq!(
            calculate_scale_factor(Some(4), &ScaleSpec::TargetServings(6)),
            Ok(1.5)
        );
        assert_eq!(
            calculate_scale_factor(None, &ScaleSpec::TargetServings(6)),
            Err(ScaleError::MissingServings)
        );
        assert_eq!(
            calculate_scale_factor(Some(4), &ScaleSpec::TargetServings(0)),
            Err(ScaleError::InvalidServings(0.0))
        );
        assert_eq!(
            calculate_scale_factor(None, &ScaleSpec::Factor(0.0)),
            Err(ScaleError::InvalidFactor(0.0))
        );
    }

    #[test]
    fn test_scale_all() {
        let ingredients = vec![grams("mel", 200.0), Ingredient::new("salt")];
        let scaled = scale_all(&ingredients, 2.0).unwrap();
        assert_eq!(scaled.len(), 2);
        assert_eq!(scaled[0].quantity, Some(400.0));
        assert_eq!(scaled[1].quantity, None);
    }
}
