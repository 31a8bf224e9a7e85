//! # Integration Tests
//!
//! End-to-end runs: recipe text and a JSON catalog file in, shopping list out.

use recipe_shopper::catalog::{CatalogSearch, InMemoryCatalog, ProductLabel};
use recipe_shopper::config::PipelineConfig;
use recipe_shopper::ingredient_model::Unit;
use recipe_shopper::pipeline::{CartItem, ShoppingPipeline};
use recipe_shopper::text_processing::RecipeTextProcessor;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

const GROCERY_CATALOG: &str = r#"[
    {"id": 1, "name": "Spaghetti", "category": "Kolonial", "price": 10.0, "unit_size": "500 g"},
    {"id": 2, "name": "Løg", "category": "Grønt", "price": 4.0, "unit_size": "1 stk"},
    {"id": 5, "name": "Smør", "category": "Mejeri", "price": 25.0, "unit_size": "250 g"},
    {"id": 6, "name": "Letmælk", "category": "Mejeri", "price": 12.0, "unit_size": "1 l", "available": false},
    {"id": 7, "name": "Sødmælk", "category": "Mejeri", "price": 14.0, "unit_size": "1 l", "available": false}
]"#;

const ONION_CATALOG: &str = r#"[
    {"id": 20, "name": "Onion chips", "category": "Kiosk", "price": 20.0, "unit_size": "150 g"},
    {"id": 21, "name": "Onion", "category": "Frugt & grønt", "price": 5.0, "unit_size": "1 stk"},
    {"id": 22, "name": "Onion cleaner", "category": "Rengøring", "price": 30.0, "unit_size": "500 ml"}
]"#;

const DAIRY_CATALOG: &str = r#"[
    {"id": 30, "name": "Letmælk", "category": "Mejeri", "price": 12.0, "unit_size": "1 l"},
    {"id": 31, "name": "Laktosefri letmælk", "category": "Mejeri", "price": 16.0,
     "unit_size": "1 l", "labels": ["Laktosefri", "Økologisk"], "on_discount": true}
]"#;

const VENDOR_CATALOG: &str = r#"[
    {"id": 40, "name": "Smør", "category": "Mejeri", "price": 22.0, "unit_size": "250 g / Lurpak"},
    {"id": 41, "name": "Kartofler", "category": "Grønt", "price": 18.0, "unit_size": "1 kg, Danmark"}
]"#;

const FLOUR_CATALOG: &str = r#"[
    {"id": 50, "name": "Hvedemel", "category": "Kolonial", "price": 10.0, "unit_size": "1 kg"},
    {"id": 51, "name": "Glutenfri mel", "category": "Kolonial", "price": 30.0,
     "unit_size": "1 kg", "labels": ["Glutenfri"]}
]"#;

fn catalog_file(json: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(json.as_bytes()).unwrap();
    temp_file
}

fn load_catalog(json: &str) -> InMemoryCatalog {
    let temp_file = catalog_file(json);
    InMemoryCatalog::from_json_file(temp_file.path()).unwrap()
}

fn config_from(vars: &[(&str, &str)]) -> PipelineConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    PipelineConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

#[test]
fn test_two_recipes_to_cart() {
    let catalog = load_catalog(GROCERY_CATALOG);
    assert_eq!(catalog.len(), 5);

    let processor = RecipeTextProcessor::new();
    let pasta = processor.recipe_from_text(
        "Pasta",
        r#"
        Til 4 personer

        Ingredienser:
        - 400g spaghetti
        - 2 løg
        - 200 g smør
        - 1 l mælk

        Fremgangsmåde:
        Kog pastaen.
        "#,
    );
    let bread = processor.recipe_from_text("Boller", "0,5 kg smør\n1 løg");
    assert_eq!(pasta.servings, Some(4));
    assert_eq!(bread.servings, None);

    let pipeline = ShoppingPipeline::from_config(&PipelineConfig::default());
    let list = pipeline.run(&[pasta, bread], &catalog).unwrap();

    let names: Vec<&str> = list.items.iter().map(|i| i.ingredient.name.as_str()).collect();
    assert_eq!(names, vec!["spaghetti", "løg", "smør", "mælk"]);

    let onion = &list.items[1];
    assert_eq!(onion.ingredient.total_quantity, Some(3.0));
    assert_eq!(onion.ingredient.sources, vec!["Pasta", "Boller"]);

    let butter = &list.items[2];
    assert_eq!(butter.ingredient.total_quantity, Some(700.0));
    assert_eq!(butter.ingredient.unit, Some(Unit::Grams));

    // Every milk is sold out: the best one is shown but not ordered
    let milk = list.items[3].best().unwrap();
    assert_eq!(milk.candidate.id, 6);
    assert!(milk.out_of_stock_fallback);
    assert_eq!(milk.computed_order_quantity, None);

    assert!(list.unmatched().is_empty());
    assert_eq!(
        list.cart_items(),
        vec![
            CartItem { product_id: 1, quantity: 1 },
            CartItem { product_id: 2, quantity: 3 },
            CartItem { product_id: 5, quantity: 3 },
        ]
    );
    assert_eq!(list.total_cost(), 97.0);
    assert!(list.warnings.is_empty());

    let rendered = list.to_string();
    assert!(rendered.contains("700 g smør -> Smør"));
    assert!(rendered.contains("(out of stock)"));
    assert!(rendered.contains("Total: 97 kr"));
}

#[test]
fn test_target_servings_from_configuration() {
    let catalog = load_catalog(GROCERY_CATALOG);
    let processor = RecipeTextProcessor::new();
    let recipe = processor.recipe_from_text("Pasta", "4 personer\n400g spaghetti\n2 løg");

    let config = config_from(&[("SHOPPER_TARGET_SERVINGS", "6")]);
    let list = ShoppingPipeline::from_config(&config)
        .run(&[recipe], &catalog)
        .unwrap();

    assert_eq!(list.items[0].ingredient.total_quantity, Some(600.0));
    assert_eq!(list.items[0].best().unwrap().computed_order_quantity, Some(2));
    assert_eq!(list.items[1].best().unwrap().computed_order_quantity, Some(3));
}

#[test]
fn test_onion_ranking_from_catalog_file() {
    let catalog = load_catalog(ONION_CATALOG);
    let processor = RecipeTextProcessor::new();
    let recipe = processor.recipe_from_text("Soup", "1 onion");

    let list = ShoppingPipeline::from_config(&PipelineConfig::default())
        .run(&[recipe], &catalog)
        .unwrap();

    let item = &list.items[0];
    assert_eq!(item.search_query.as_deref(), Some("onion"));
    let ids: Vec<u64> = item.matches.iter().map(|m| m.candidate.id).collect();
    assert_eq!(ids, vec![21, 20, 22]);
    assert_eq!(item.best().unwrap().computed_order_quantity, Some(1));
}

#[test]
fn test_lactose_free_filter_from_configuration() {
    let catalog = load_catalog(DAIRY_CATALOG);
    let candidates = catalog.search("mælk").unwrap();
    let labelled = candidates.iter().find(|c| c.id == 31).unwrap();
    assert!(labelled.has_label(ProductLabel::LactoseFree));
    assert!(labelled.has_label(ProductLabel::Organic));
    assert!(labelled.has_label(ProductLabel::OnSale));

    let processor = RecipeTextProcessor::new();
    let recipe = processor.recipe_from_text("Grød", "5 dl mælk");

    let config = config_from(&[("SHOPPER_DIETARY", "laktosefri")]);
    let list = ShoppingPipeline::from_config(&config)
        .run(&[recipe.clone()], &catalog)
        .unwrap();
    let item = &list.items[0];
    assert_eq!(item.matches.len(), 1);
    assert_eq!(item.best().unwrap().candidate.id, 31);
    assert_eq!(item.best().unwrap().computed_order_quantity, Some(1));

    // Without the filter the cheaper milk wins
    let list = ShoppingPipeline::from_config(&PipelineConfig::default())
        .run(&[recipe], &catalog)
        .unwrap();
    assert_eq!(list.items[0].best().unwrap().candidate.id, 30);
}

#[test]
fn test_shopping_list_serializes_to_json() {
    let catalog = load_catalog(GROCERY_CATALOG);
    let recipe = RecipeTextProcessor::new().recipe_from_text("Pasta", "200 g smør\n1 l mælk");
    let list = ShoppingPipeline::from_config(&PipelineConfig::default())
        .run(&[recipe], &catalog)
        .unwrap();

    let json = serde_json::to_value(&list).unwrap();
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["matches"][0]["candidate"]["name"], "Smør");
    assert_eq!(items[0]["matches"][0]["computed_order_quantity"], 1);
    assert_eq!(items[1]["matches"][0]["out_of_stock_fallback"], true);
}

#[test]
fn test_invalid_catalog_files() {
    let temp_file = catalog_file("{ not json");
    let err = InMemoryCatalog::from_json_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid catalog file"));

    assert!(InMemoryCatalog::from_json_file("/nonexistent/catalog.json").is_err());
}

#[test]
fn test_vendor_pack_descriptions_and_danish_decimals() {
    let catalog = load_catalog(VENDOR_CATALOG);
    let processor = RecipeTextProcessor::new();
    let recipe =
        processor.recipe_from_text("Stegte kartofler", "0,75 kg smør\n2,500 kg kartofler");

    let list = ShoppingPipeline::from_config(&PipelineConfig::default())
        .run(&[recipe], &catalog)
        .unwrap();

    let butter = &list.items[0];
    assert_eq!(butter.ingredient.total_quantity, Some(750.0));
    assert_eq!(butter.best().unwrap().computed_order_quantity, Some(3));

    let potatoes = &list.items[1];
    assert_eq!(potatoes.ingredient.total_quantity, Some(2.5));
    assert_eq!(potatoes.ingredient.unit, Some(Unit::Kilograms));
    assert_eq!(potatoes.best().unwrap().computed_order_quantity, Some(3));
}

#[test]
fn test_gluten_allergy_from_configuration() {
    let catalog = load_catalog(FLOUR_CATALOG);
    let recipe = RecipeTextProcessor::new().recipe_from_text("Boller", "500 g mel");

    let config = config_from(&[("SHOPPER_ALLERGIES", "gluten")]);
    let list = ShoppingPipeline::from_config(&config)
        .run(&[recipe], &catalog)
        .unwrap();

    let flour = &list.items[0];
    assert_eq!(flour.search_query.as_deref(), Some("glutenfri mel"));
    assert_eq!(flour.matches.len(), 1);
    assert_eq!(flour.best().unwrap().candidate.id, 51);
    assert_eq!(flour.best().unwrap().computed_order_quantity, Some(1));
}
