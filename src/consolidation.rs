//! # Consolidation
//!
//! Merges scaled ingredients from several recipes into one shopping need per
//! ingredient.
//!
//! ## Features
//!
//! - Groups by normalized name, so "tomater" and "tomat" merge
//! - Sums mass and volume in base units and picks a readable display unit
//! - Keeps incompatible units (pinches, unit-less counts) in separate entries
//! - Remembers which recipes asked for each ingredient
//!
//! ## Usage
//!
//! ```rust,no_run
//! use recipe_shopper::consolidation::consolidate;
//! use recipe_shopper::ingredient_model::{Ingredient, Unit};
//! use recipe_shopper::scaler::scale;
//!
//! let a = scale(&Ingredient::new("smør").with_quantity(200.0).with_unit(Unit::Grams), 1.0)?;
//! let b = scale(&Ingredient::new("smør").with_quantity(0.5).with_unit(Unit::Kilograms), 1.0)?;
//! let merged = consolidate(&[(a, "Kage".to_string()), (b, "Boller".to_string())]);
//! assert_eq!(merged[0].to_string(), "700 g smør");
//! # Ok::<(), recipe_shopper::errors::ScaleError>(())
//! ```

use crate::ingredient_model::{format_quantity, Unit, UnitClass};
use crate::scaler::{RoundingPolicy, ScaledIngredient};
use crate::units::{to_base, BaseUnit};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Plural forms in both languages and their singular
static PLURAL_FORMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("onions", "onion"),
        ("tomatoes", "tomato"),
        ("potatoes", "potato"),
        ("carrots", "carrot"),
        ("eggs", "egg"),
        ("cloves", "clove"),
        ("lemons", "lemon"),
        ("limes", "lime"),
        ("apples", "apple"),
        ("oranges", "orange"),
        ("bananas", "banana"),
        ("mushrooms", "mushroom"),
        ("peppers", "pepper"),
        ("shallots", "shallot"),
        ("gulerødder", "gulerod"),
        ("kartofler", "kartoffel"),
        ("tomater", "tomat"),
        ("citroner", "citron"),
        ("æbler", "æble"),
        ("rødløg", "rødløg"),
        ("champignoner", "champignon"),
        ("peberfrugter", "peberfrugt"),
        ("agurker", "agurk"),
        ("bananer", "banan"),
        ("appelsiner", "appelsin"),
    ])
});

/// Lower-case a name and map known plurals to their singular
pub fn normalize_ingredient_name(name: &str) -> String {
    let name = name.trim().to_lowercase();
    PLURAL_FORMS
        .get(name.as_str())
        .map(|singular| singular.to_string())
        .unwrap_or(name)
}

/// One ingredient need after merging all recipes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedIngredient {
    /// Name as first written
    pub name: String,
    /// Exact summed quantity, absent when no entry had one
    pub total_quantity: Option<f64>,
    pub unit: Option<Unit>,
    /// Recipe titles, each once, in first-seen order
    pub sources: Vec<String>,
}

impl ConsolidatedIngredient {
    /// Quantity rounded the way the scaler rounds
    pub fn practical_quantity(&self) -> Option<f64> {
        let rounding = RoundingPolicy::for_quantity(self.total_quantity, self.unit);
        self.total_quantity.map(|q| rounding.apply(q, self.unit))
    }
}

impl fmt::Display for ConsolidatedIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(quantity) = self.practical_quantity() {
            write!(f, "{} ", format_quantity(quantity))?;
        }
        if let Some(unit) = self.unit {
            write!(f, "{} ", unit)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Sub-group of one ingredient name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum UnitGroup {
    /// Convertible units summed in this base
    Base(BaseUnit),
    /// Imprecise or missing units, merged only when identical
    Exact(Option<Unit>),
}

impl UnitGroup {
    fn of(unit: Option<Unit>) -> Self {
        match unit.and_then(|u| u.base_factor()) {
            Some((_, base)) => UnitGroup::Base(base),
            None => UnitGroup::Exact(unit),
        }
    }
}

#[derive(Debug)]
struct Accumulator {
    group: UnitGroup,
    name: String,
    total: Option<f64>,
    /// Shared unit while every entry uses the same one
    shared_unit: Option<Option<Unit>>,
    mixed: bool,
    sources: Vec<String>,
}

impl Accumulator {
    fn new(group: UnitGroup, name: &str) -> Self {
        Self {
            group,
            name: name.to_string(),
            total: None,
            shared_unit: None,
            mixed: false,
            sources: Vec::new(),
        }
    }

    fn add(&mut self, scaled: &ScaledIngredient, source: &str) {
        let unit = scaled.unit();
        match self.shared_unit {
            None => self.shared_unit = Some(unit),
            Some(shared) if shared != unit => self.mixed = true,
            Some(_) => {}
        }

        if let Some(quantity) = scaled.quantity {
            let amount = match self.group {
                UnitGroup::Base(_) => to_base(quantity, unit).map_or(quantity, |(q, _)| q),
                UnitGroup::Exact(_) => quantity,
            };
            self.total = Some(self.total.unwrap_or(0.0) + amount);
        }

        if !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
        }
    }

    fn finish(self) -> ConsolidatedIngredient {
        let (total_quantity, unit) = match self.group {
            UnitGroup::Exact(unit) => (self.total, unit),
            UnitGroup::Base(BaseUnit::Pieces) => match (self.mixed, self.shared_unit) {
                (false, Some(unit)) => (self.total, unit),
                _ => (self.total, Some(Unit::Pieces)),
            },
            UnitGroup::Base(base) => {
                let unit = display_unit(self.total, base);
                let factor = unit.base_factor().map_or(1.0, |(factor, _)| factor);
                (self.total.map(|q| q / factor), Some(unit))
            }
        };

        ConsolidatedIngredient {
            name: self.name,
            total_quantity,
            unit,
            sources: self.sources,
        }
    }
}

/// Readable unit for a base quantity
fn display_unit(base_quantity: Option<f64>, base: BaseUnit) -> Unit {
    let quantity = base_quantity.unwrap_or(0.0);
    match base.class() {
        UnitClass::Mass if quantity >= 1000.0 => Unit::Kilograms,
        UnitClass::Mass => Unit::Grams,
        UnitClass::Volume if quantity >= 1000.0 => Unit::Liters,
        UnitClass::Volume if quantity >= 100.0 => Unit::Deciliters,
        UnitClass::Volume => Unit::Milliliters,
        _ => base.as_unit(),
    }
}

/// Merge scaled ingredients tagged with the recipe they came from
pub fn consolidate(items: &[(ScaledIngredient, String)]) -> Vec<ConsolidatedIngredient> {
    let mut accumulators: Vec<Accumulator> = Vec::new();
    let mut index: HashMap<(String, UnitGroup), usize> = HashMap::new();

    for (scaled, source) in items {
        let key = (normalize_ingredient_name(scaled.name()), UnitGroup::of(scaled.unit()));
        let position = *index.entry(key).or_insert_with(|| {
            accumulators.push(Accumulator::new(UnitGroup::of(scaled.unit()), scaled.name()));
            accumulators.len() - 1
        });
        accumulators[position].add(scaled, source);
    }

    let consolidated: Vec<ConsolidatedIngredient> =
        accumulators.into_iter().map(Accumulator::finish).collect();
    debug!(
        "Consolidated {} ingredients into {}",
        items.len(),
        consolidated.len()
    );
    consolidated
}
