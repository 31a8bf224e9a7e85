//! # Ingredient Data Model
//!
//! This module defines the value types produced by the quantity parser: a closed
//! unit vocabulary, the parsed [`Ingredient`] record and the degradation warnings
//! attached to lines that were only partially understood.
//!
//! ## Core Concepts
//!
//! - **Ingredient**: a food item with an optional quantity and unit
//! - **Unit**: one entry of the closed vocabulary (grams, dl, tsk, fed, ...)
//! - **UnitClass**: mass, volume, count or imprecise (pinch, to taste)
//! - **ParseDegraded**: a warning explaining why a line was only partially parsed
//!
//! ## Usage
//!
//! ```rust
//! use recipe_shopper::ingredient_model::{Ingredient, Unit};
//!
//! let milk = Ingredient::new("mælk")
//!     .with_quantity(1.5)
//!     .with_unit(Unit::Deciliters);
//!
//! assert_eq!(milk.to_string(), "1.5 dl mælk");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement units recognized by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    // Mass
    /// Grams
    Grams,
    /// Kilograms
    Kilograms,
    /// Ounces (oz)
    Ounces,
    /// Pounds (lb)
    Pounds,

    // Volume
    /// Milliliters
    Milliliters,
    /// Centiliters
    Centiliters,
    /// Deciliters
    Deciliters,
    /// Liters
    Liters,
    /// Teaspoons (tsk / tsp)
    Teaspoons,
    /// Tablespoons (spsk / tbsp)
    Tablespoons,
    /// Cups
    Cups,
    /// Fluid ounces (fl oz)
    FluidOunces,

    // Count
    /// Individual pieces (stk / pcs), also used for bare counts like "x6"
    Pieces,
    /// Cloves (fed)
    Cloves,
    /// Bunches (bundt)
    Bunches,
    /// Handfuls (håndfuld)
    Handfuls,
    /// Packages (pk / pakke)
    Packages,
    /// Cans (dåse)
    Cans,
    /// Slices (skive)
    Slices,
    /// Heads of lettuce, cabbage or garlic
    Heads,
    /// Stalks (stilk)
    Stalks,
    /// Sprigs (kvist)
    Sprigs,
    /// Bags (pose)
    Bags,
    /// Bottles (flaske)
    Bottles,

    // Imprecise
    /// Pinches (knivspids)
    Pinches,
    /// "To taste" / "efter smag"
    ToTaste,
}

/// Broad family a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitClass {
    Mass,
    Volume,
    Count,
    Imprecise,
}

impl Unit {
    /// Short display token, using the catalog's native (Danish) abbreviations
    pub fn display_name(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Kilograms => "kg",
            Unit::Ounces => "oz",
            Unit::Pounds => "lb",
            Unit::Milliliters => "ml",
            Unit::Centiliters => "cl",
            Unit::Deciliters => "dl",
            Unit::Liters => "l",
            Unit::Teaspoons => "tsk",
            Unit::Tablespoons => "spsk",
            Unit::Cups => "cup",
            Unit::FluidOunces => "fl oz",
            Unit::Pieces => "stk",
            Unit::Cloves => "fed",
            Unit::Bunches => "bundt",
            Unit::Handfuls => "håndfuld",
            Unit::Packages => "pk",
            Unit::Cans => "dåse",
            Unit::Slices => "skive",
            Unit::Heads => "hoved",
            Unit::Stalks => "stilk",
            Unit::Sprigs => "kvist",
            Unit::Bags => "pose",
            Unit::Bottles => "flaske",
            Unit::Pinches => "knivspids",
            Unit::ToTaste => "efter smag",
        }
    }

    /// The family this unit belongs to
    pub fn class(&self) -> UnitClass {
        match self {
            Unit::Grams | Unit::Kilograms | Unit::Ounces | Unit::Pounds => UnitClass::Mass,
            Unit::Milliliters
            | Unit::Centiliters
            | Unit::Deciliters
            | Unit::Liters
            | Unit::Teaspoons
            | Unit::Tablespoons
            | Unit::Cups
            | Unit::FluidOunces => UnitClass::Volume,
            Unit::Pieces
            | Unit::Cloves
            | Unit::Bunches
            | Unit::Handfuls
            | Unit::Packages
            | Unit::Cans
            | Unit::Slices
            | Unit::Heads
            | Unit::Stalks
            | Unit::Sprigs
            | Unit::Bags
            | Unit::Bottles => UnitClass::Count,
            Unit::Pinches | Unit::ToTaste => UnitClass::Imprecise,
        }
    }

    /// Check if this is a mass unit
    pub fn is_mass(&self) -> bool {
        self.class() == UnitClass::Mass
    }

    /// Check if this is a volume unit
    pub fn is_volume(&self) -> bool {
        self.class() == UnitClass::Volume
    }

    /// Check if this is a count unit
    pub fn is_count(&self) -> bool {
        self.class() == UnitClass::Count
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Reasons a line was only partially understood.
///
/// These are warnings, not errors: the ingredient is still produced and keeps
/// its raw text so a human can correct it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detail")]
pub enum ParseDegraded {
    /// A fraction with a zero denominator, e.g. "1/0"
    InvalidFraction(String),
    /// Digits remained in the name although no leading quantity was found
    UnparsedNumber(String),
    /// Only a quantity and/or unit was found; the raw text became the name
    MissingName,
}

impl fmt::Display for ParseDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDegraded::InvalidFraction(text) => write!(f, "Invalid fraction: {}", text),
            ParseDegraded::UnparsedNumber(text) => {
                write!(f, "Number could not be read as a quantity: {}", text)
            }
            ParseDegraded::MissingName => write!(f, "No ingredient name found"),
        }
    }
}

/// A parsed recipe line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// The name of the ingredient (e.g., "spaghetti", "mælk", "olive oil")
    pub name: String,

    /// Numeric amount, if one was found
    pub quantity: Option<f64>,

    /// Unit from the closed vocabulary, if one was found
    pub unit: Option<Unit>,

    /// Parenthetical or after-comma notes (e.g., "finely chopped")
    pub notes: Option<String>,

    /// The line exactly as it was received
    pub raw_text: String,

    /// Degradation warnings collected while parsing
    pub warnings: Vec<ParseDegraded>,
}

impl Ingredient {
    /// Create a new ingredient with just a name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: None,
            unit: None,
            notes: None,
            raw_text: name.to_string(),
            warnings: Vec::new(),
        }
    }

    /// Set the quantity
    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Add notes to this ingredient
    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Record the raw line this ingredient came from
    pub fn with_raw_text(mut self, raw_text: &str) -> Self {
        self.raw_text = raw_text.to_string();
        self
    }

    /// Attach a degradation warning
    pub fn with_warning(mut self, warning: ParseDegraded) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Check if this ingredient has a numeric quantity
    pub fn has_quantity(&self) -> bool {
        self.quantity.is_some()
    }

    /// Check if the line was only partially understood
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Unit class used for scaling and ordering.
    ///
    /// A quantity without a unit ("2 løg") is a count.
    pub fn effective_class(&self) -> Option<UnitClass> {
        match (self.unit, self.quantity) {
            (Some(unit), _) => Some(unit.class()),
            (None, Some(_)) => Some(UnitClass::Count),
            (None, None) => None,
        }
    }
}

/// Format a quantity the way a cook writes it: "2", "1.5", "0.25"
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        let formatted = format!("{:.2}", quantity);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(quantity) = self.quantity {
            write!(f, "{} ", format_quantity(quantity))?;
        }
        if let Some(unit) = self.unit {
            write!(f, "{} ", unit)?;
        }
        write!(f, "{}", self.name)?;

        if let Some(notes) = &self.notes {
            write!(f, " ({})", notes)?;
        }

        Ok(())
    }
}

/// Represents all ingredients parsed from one block of recipe text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientList {
    /// Parsed ingredients, one per ingredient line
    pub ingredients: Vec<Ingredient>,

    /// Original raw text that was parsed
    pub original_text: String,
}

impl IngredientList {
    /// Create a new empty ingredient list
    pub fn new(original_text: String) -> Self {
        Self {
            ingredients: Vec::new(),
            original_text,
        }
    }

    /// Add an ingredient to the list
    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.push(ingredient);
    }

    /// Number of parsed lines
    pub fn parsed_count(&self) -> usize {
        self.ingredients.len()
    }

    /// Ingredients that carry at least one degradation warning
    pub fn degraded(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| i.is_degraded())
    }

    /// Share of lines parsed without warnings
    pub fn success_rate(&self) -> f32 {
        if self.ingredients.is_empty() {
            return 1.0;
        }
        let clean = self.ingredients.len() - self.degraded().count();
        clean as f32 / self.ingredients.len() as f32
    }
}

impl fmt::Display for IngredientList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Ingredient List ({} parsed, {:.1}% clean):",
            self.parsed_count(),
            self.success_rate() * 100.0
        )?;

        for ingredient in &self.ingredients {
            if ingredient.is_degraded() {
                writeln!(f, "  ? {}", ingredient.raw_text)?;
            } else {
                writeln!(f, "  • {}", ingredient)?;
            }
        }

        Ok(())
    }
}
