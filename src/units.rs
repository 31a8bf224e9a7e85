//! # Units
//!
//! Unit vocabulary lookup, conversion to base units and catalog pack sizes.
//!
//! Base units are grams for mass, milliliters for volume and pieces for
//! counts. Imprecise units (pinch, to taste) have no base and never convert.

use crate::ingredient_model::{Unit, UnitClass};
use crate::measurement_patterns::{MULTIPACK_REGEX, PACK_SIZE_PREFIXES, PACK_SIZE_REGEX};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Tolerance applied before rounding order quantities up
const ORDER_EPSILON: f64 = 1e-9;

/// Unit tokens in both languages and their vocabulary entry
static UNIT_MAPPINGS: LazyLock<HashMap<&'static str, Unit>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Mass
    for token in ["g", "gr", "gram", "grams", "gramme"] {
        map.insert(token, Unit::Grams);
    }
    for token in ["kg", "kilo", "kilogram", "kilograms"] {
        map.insert(token, Unit::Kilograms);
    }
    for token in ["oz", "ounce", "ounces"] {
        map.insert(token, Unit::Ounces);
    }
    for token in ["lb", "lbs", "pound", "pounds"] {
        map.insert(token, Unit::Pounds);
    }

    // Volume
    for token in ["ml", "milliliter", "milliliters"] {
        map.insert(token, Unit::Milliliters);
    }
    for token in ["cl", "centiliter", "centiliters"] {
        map.insert(token, Unit::Centiliters);
    }
    for token in ["dl", "deciliter", "deciliters"] {
        map.insert(token, Unit::Deciliters);
    }
    for token in ["l", "ltr", "lt", "liter", "liters", "litre", "litres"] {
        map.insert(token, Unit::Liters);
    }
    for token in ["tsk", "ts", "tsp", "teaspoon", "teaspoons", "teskefuld"] {
        map.insert(token, Unit::Teaspoons);
    }
    for token in ["spsk", "tbsp", "tbs", "tablespoon", "tablespoons", "spiseskefuld"] {
        map.insert(token, Unit::Tablespoons);
    }
    for token in ["cup", "cups", "kop", "kopper"] {
        map.insert(token, Unit::Cups);
    }
    for token in ["fl oz", "fl. oz", "floz", "fluid ounce", "fluid ounces"] {
        map.insert(token, Unit::FluidOunces);
    }

    // Count
    for token in ["stk", "styk", "stykker", "pcs", "pc", "piece", "pieces"] {
        map.insert(token, Unit::Pieces);
    }
    for token in ["fed", "clove", "cloves"] {
        map.insert(token, Unit::Cloves);
    }
    for token in ["bundt", "bundter", "bunch", "bunches"] {
        map.insert(token, Unit::Bunches);
    }
    for token in ["håndfuld", "håndfulde", "handful", "handfuls"] {
        map.insert(token, Unit::Handfuls);
    }
    for token in ["pk", "pakke", "pakker", "pack", "packs", "package", "packages", "pkg"] {
        map.insert(token, Unit::Packages);
    }
    for token in ["dåse", "dåser", "ds", "can", "cans"] {
        map.insert(token, Unit::Cans);
    }
    for token in ["skive", "skiver", "slice", "slices"] {
        map.insert(token, Unit::Slices);
    }
    for token in ["hoved", "hoveder", "head", "heads"] {
        map.insert(token, Unit::Heads);
    }
    for token in ["stilk", "stilke", "stængel", "stængler", "stalk", "stalks"] {
        map.insert(token, Unit::Stalks);
    }
    for token in ["kvist", "kviste", "sprig", "sprigs"] {
        map.insert(token, Unit::Sprigs);
    }
    for token in ["pose", "poser", "bag", "bags"] {
        map.insert(token, Unit::Bags);
    }
    for token in ["flaske", "flasker", "bottle", "bottles"] {
        map.insert(token, Unit::Bottles);
    }

    // Imprecise
    for token in ["knivspids", "knivspidser", "pinch", "pinches"] {
        map.insert(token, Unit::Pinches);
    }
    for token in ["efter smag", "to taste"] {
        map.insert(token, Unit::ToTaste);
    }

    map
});

/// Look up a unit token, ignoring case and a trailing period
pub fn lookup_unit(token: &str) -> Option<Unit> {
    let token = token.trim().trim_end_matches('.').to_lowercase();
    UNIT_MAPPINGS.get(token.as_str()).copied()
}

/// Base unit of a convertible class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseUnit {
    Grams,
    Milliliters,
    Pieces,
}

impl BaseUnit {
    pub fn class(&self) -> UnitClass {
        match self {
            BaseUnit::Grams => UnitClass::Mass,
            BaseUnit::Milliliters => UnitClass::Volume,
            BaseUnit::Pieces => UnitClass::Count,
        }
    }

    pub fn as_unit(&self) -> Unit {
        match self {
            BaseUnit::Grams => Unit::Grams,
            BaseUnit::Milliliters => Unit::Milliliters,
            BaseUnit::Pieces => Unit::Pieces,
        }
    }
}

impl Unit {
    /// How many base units one of this unit holds, with the base it converts to
    pub fn base_factor(&self) -> Option<(f64, BaseUnit)> {
        match self {
            Unit::Grams => Some((1.0, BaseUnit::Grams)),
            Unit::Kilograms => Some((1000.0, BaseUnit::Grams)),
            Unit::Ounces => Some((28.35, BaseUnit::Grams)),
            Unit::Pounds => Some((453.6, BaseUnit::Grams)),
            Unit::Milliliters => Some((1.0, BaseUnit::Milliliters)),
            Unit::Centiliters => Some((10.0, BaseUnit::Milliliters)),
            Unit::Deciliters => Some((100.0, BaseUnit::Milliliters)),
            Unit::Liters => Some((1000.0, BaseUnit::Milliliters)),
            Unit::Teaspoons => Some((5.0, BaseUnit::Milliliters)),
            Unit::Tablespoons => Some((15.0, BaseUnit::Milliliters)),
            Unit::Cups => Some((240.0, BaseUnit::Milliliters)),
            Unit::FluidOunces => Some((29.57, BaseUnit::Milliliters)),
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
            | Unit::Bottles => Some((1.0, BaseUnit::Pieces)),
            Unit::Pinches | Unit::ToTaste => None,
        }
    }
}

/// Convert a quantity to its base unit.
///
/// A quantity with no unit is a count.
pub fn to_base(quantity: f64, unit: Option<Unit>) -> Option<(f64, BaseUnit)> {
    match unit {
        Some(unit) => unit
            .base_factor()
            .map(|(factor, base)| (quantity * factor, base)),
        None => Some((quantity, BaseUnit::Pieces)),
    }
}

/// Convert between two units of the same class
pub fn convert(quantity: f64, from: Unit, to: Unit) -> Option<f64> {
    let (from_factor, from_base) = from.base_factor()?;
    let (to_factor, to_base) = to.base_factor()?;
    if from_base != to_base {
        return None;
    }
    Some(quantity * from_factor / to_factor)
}

/// A catalog pack size expressed in base units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedUnit {
    /// Pack content in base units (e.g. 1000 for "1 kg")
    pub value: f64,
    pub base: BaseUnit,
    pub class: UnitClass,
    /// Pack text as the catalog wrote it
    pub original: String,
}

impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

fn parse_pack_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok()
}

fn strip_pack_prefix(text: &str) -> &str {
    let lower = text.to_lowercase();
    for prefix in PACK_SIZE_PREFIXES {
        if lower.starts_with(prefix) {
            return text[prefix.len()..].trim_start();
        }
    }
    text
}

/// Parse a catalog pack string: "500g", "1 L", "ca. 400g", "2 x 500 g", "500 g / Arla".
///
/// The first number followed by a known unit wins; vendor text around it is ignored.
pub fn parse_pack_size(text: &str) -> Option<ParsedUnit> {
    let original = text.trim();
    let body = strip_pack_prefix(original);

    let multipack = MULTIPACK_REGEX.captures_iter(body).find_map(|caps| {
        let count = caps[1].parse::<f64>().ok()?;
        let amount = parse_pack_number(&caps[2])?;
        let (factor, base) = lookup_unit(&caps[3])?.base_factor()?;
        Some((count * amount * factor, base))
    });
    let size = multipack.or_else(|| {
        PACK_SIZE_REGEX.captures_iter(body).find_map(|caps| {
            let amount = parse_pack_number(&caps[1])?;
            let (factor, base) = lookup_unit(&caps[2])?.base_factor()?;
            Some((amount * factor, base))
        })
    });

    let Some((value, base)) = size else {
        trace!("Pack size '{}' not recognized", original);
        return None;
    };

    Some(ParsedUnit {
        value,
        base,
        class: base.class(),
        original: original.to_string(),
    })
}

/// Number of packages to order for a need.
///
/// Always at least 1. Needs and packs of different classes cannot be compared,
/// so counted needs order one pack per item and anything else orders one pack.
pub fn calculate_order_quantity(
    needed_quantity: Option<f64>,
    needed_unit: Option<Unit>,
    package: Option<&ParsedUnit>,
) -> u32 {
    let quantity = match needed_quantity {
        Some(q) if q.is_finite() && q > 0.0 => q,
        _ => return 1,
    };

    let need = to_base(quantity, needed_unit);
    let is_count = matches!(need, Some((_, BaseUnit::Pieces)));

    let packs = match (need, package) {
        (Some((needed, base)), Some(pack)) if base == pack.base && pack.value > 0.0 => {
            (needed / pack.value - ORDER_EPSILON).ceil()
        }
        (Some(_), Some(pack)) if pack.value <= 0.0 => 1.0,
        _ if is_count => (quantity - ORDER_EPSILON).ceil(),
        _ => 1.0,
    };

    packs.clamp(1.0, u32::MAX as f64) as u32
}
