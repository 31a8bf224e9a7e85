//! # Scaler Tests
//!
//! Scaling, rounding and order quantities from the public API.

use recipe_shopper::errors::ScaleError;
use recipe_shopper::ingredient_model::{Ingredient, Unit};
use recipe_shopper::ingredient_parser::parse_ingredient_line;
use recipe_shopper::scaler::{calculate_scale_factor, scale, scale_all, scale_to_servings, ScaleSpec};
use recipe_shopper::units::{calculate_order_quantity, parse_pack_size};

#[test]
fn test_rescale_returns_to_original() {
    for line in ["3 æg", "137 g mel", "2 spsk olie", "1,5 dl fløde", "2 fed hvidløg"] {
        let ingredient = parse_ingredient_line(line);
        let back = scale(&ingredient, 2.0).unwrap().rescale(0.5).unwrap();
        assert_eq!(back.quantity, ingredient.quantity, "round trip of '{}'", line);
        assert_eq!(back.scale_factor, 1.0);
    }
}

#[test]
fn test_scaling_is_monotone() {
    let ingredients = [
        Ingredient::new("mel").with_quantity(137.0).with_unit(Unit::Grams),
        Ingredient::new("olie").with_quantity(1.0).with_unit(Unit::Tablespoons),
        Ingredient::new("æg").with_quantity(3.0),
    ];

    for ingredient in &ingredients {
        let mut previous_exact = 0.0;
        let mut previous_practical = 0.0;
        for step in 1..=50 {
            let factor = step as f64 * 0.1;
            let scaled = scale(ingredient, factor).unwrap();
            let exact = scaled.quantity.unwrap();
            let practical = scaled.practical_quantity.unwrap();

            assert!(exact >= previous_exact, "{} at {}", ingredient.name, factor);
            assert!(practical >= previous_practical, "{} at {}", ingredient.name, factor);
            assert!(practical > 0.0);
            previous_exact = exact;
            previous_practical = practical;
        }
    }
}

#[test]
fn test_servings_scaling() {
    let butter = parse_ingredient_line("200 g smør");
    let scaled = scale_to_servings(&butter, 4.0, 6.0).unwrap();
    assert_eq!(scaled.quantity, Some(300.0));

    assert_eq!(
        scale_to_servings(&butter, 0.0, 6.0),
        Err(ScaleError::InvalidServings(0.0))
    );
    assert_eq!(
        calculate_scale_factor(Some(4), &ScaleSpec::TargetServings(2)),
        Ok(0.5)
    );
    assert_eq!(
        calculate_scale_factor(None, &ScaleSpec::TargetServings(2)),
        Err(ScaleError::MissingServings)
    );
    assert_eq!(calculate_scale_factor(None, &ScaleSpec::Unchanged), Ok(1.0));
}

#[test]
fn test_invalid_factors() {
    let butter = parse_ingredient_line("200 g smør");
    assert_eq!(scale(&butter, 0.0), Err(ScaleError::InvalidFactor(0.0)));
    assert!(scale(&butter, f64::NAN).is_err());
    assert!(scale(&butter, f64::INFINITY).is_err());
}

#[test]
fn test_quantity_less_ingredients_pass_through() {
    let salt = parse_ingredient_line("salt og peber efter smag");
    let scaled = scale(&salt, 3.0).unwrap();
    assert_eq!(scaled.quantity, None);
    assert_eq!(scaled.practical_quantity, None);
    assert_eq!(scaled.unit(), Some(Unit::ToTaste));
}

#[test]
fn test_scale_all_keeps_order() {
    let ingredients = vec![
        parse_ingredient_line("2 løg"),
        parse_ingredient_line("500 g oksekød"),
    ];
    let scaled = scale_all(&ingredients, 1.5).unwrap();
    assert_eq!(scaled[0].practical_quantity, Some(3.0));
    assert_eq!(scaled[1].quantity, Some(750.0));
    assert_eq!(scaled[1].to_string(), "750 g oksekød");
}

#[test]
fn test_order_quantities() {
    let kilo = parse_pack_size("1000 g");
    assert_eq!(
        calculate_order_quantity(Some(750.0), Some(Unit::Grams), kilo.as_ref()),
        1
    );

    let ten_pack = parse_pack_size("10 stk");
    assert_eq!(calculate_order_quantity(Some(6.0), None, ten_pack.as_ref()), 1);

    let liter = parse_pack_size("1 l");
    assert_eq!(
        calculate_order_quantity(Some(2000.0), Some(Unit::Milliliters), liter.as_ref()),
        2
    );

    // Unknown pack or need still orders one
    assert_eq!(calculate_order_quantity(None, None, liter.as_ref()), 1);
    assert_eq!(calculate_order_quantity(Some(3.0), Some(Unit::Grams), None), 1);
}
