//! # Matcher Tests
//!
//! Ranking behavior against small hand-built catalogs.

use recipe_shopper::catalog::{
    Allergen, CatalogCandidate, DietaryFilter, MealContext, ProductLabel,
};
use recipe_shopper::errors::MatchError;
use recipe_shopper::ingredient_model::Unit;
use recipe_shopper::matcher::{
    score_breakdown, BoostModes, ExclusionReason, MatchOptions, Matcher, Need,
};
use recipe_shopper::translation::{TranslationKind, TranslationTable};

fn onion_catalog() -> Vec<CatalogCandidate> {
    vec![
        CatalogCandidate::new(10, "Onion chips", "Kiosk", 20.0),
        CatalogCandidate::new(11, "Onion", "Grønt", 5.0),
        CatalogCandidate::new(12, "Onion cleaner", "Rengøring", 30.0),
    ]
}

#[test]
fn test_plain_produce_ranks_first() {
    let matcher = Matcher::default();
    let matches = matcher
        .rank("onion", &onion_catalog(), &MatchOptions::default())
        .unwrap();

    let ids: Vec<u64> = matches.iter().map(|m| m.candidate.id).collect();
    assert_eq!(ids, vec![11, 10, 12]);
}

#[test]
fn test_danish_name_finds_same_product() {
    let catalog = vec![
        CatalogCandidate::new(1, "Løg", "Grønt", 5.0),
        CatalogCandidate::new(2, "Chips sour cream & løg", "Kiosk", 20.0),
    ];
    let matcher = Matcher::default();

    for name in ["løg", "onions", "Onion"] {
        let matches = matcher.rank(name, &catalog, &MatchOptions::default()).unwrap();
        assert_eq!(matches[0].candidate.id, 1, "best match for '{}'", name);
    }
}

#[test]
fn test_injected_translation_table() {
    let table = TranslationTable::from_pairs([("leek", "porre")]);
    let matcher = Matcher::new(table);
    let query = matcher.query("leek", &MatchOptions::default());
    assert_eq!(query.translated, "porre");
    assert_eq!(query.translation_kind, TranslationKind::PerWord);

    let catalog = vec![
        CatalogCandidate::new(1, "Leek soup", "Kolonial", 15.0),
        CatalogCandidate::new(2, "Porrer", "Grønt", 10.0),
    ];
    let matches = matcher.rank("leek", &catalog, &MatchOptions::default()).unwrap();
    assert_eq!(matches[0].candidate.id, 2);
}

#[test]
fn test_dietary_filters_report_exclusions() {
    let catalog = vec![
        CatalogCandidate::new(1, "Minimælk", "Mejeri", 11.0),
        CatalogCandidate::new(2, "Laktosefri minimælk", "Mejeri", 15.0)
            .with_label(ProductLabel::LactoseFree),
        CatalogCandidate::new(3, "Havredrik", "Mejeri", 20.0).with_label(ProductLabel::Vegan),
    ];
    let options = MatchOptions::default().with_filter(DietaryFilter::LactoseFree);
    let report = Matcher::default()
        .rank_with_report("mælk", Need::default(), &catalog, &options)
        .unwrap();

    assert_eq!(report.matches.len(), 1);
    assert_eq!(report.matches[0].candidate.id, 2);
    assert_eq!(report.excluded.len(), 2);
    assert!(report
        .excluded
        .iter()
        .all(|e| e.reason == ExclusionReason::MissingLabel(DietaryFilter::LactoseFree)));

    // Two filters require both labels
    let options = options.with_filter(DietaryFilter::Vegan);
    let matches = Matcher::default().rank("mælk", &catalog, &options).unwrap();
    assert!(matches.is_empty());
}

#[test]
fn test_allergies_and_diets_report_reasons() {
    let catalog = vec![
        CatalogCandidate::new(1, "Kyllingebryst", "Fjerkræ", 45.0),
        CatalogCandidate::new(2, "Rejer i lage", "Fisk", 35.0),
        CatalogCandidate::new(3, "Sojabønner", "Kolonial", 20.0),
        CatalogCandidate::new(4, "Kikærter", "Kolonial", 12.0),
    ];
    let options = MatchOptions::default()
        .with_filter(DietaryFilter::Pescatarian)
        .with_allergy(Allergen::Shellfish)
        .with_allergy(Allergen::Soy);
    let report = Matcher::default()
        .rank_with_report("protein", Need::default(), &catalog, &options)
        .unwrap();

    let ids: Vec<u64> = report.matches.iter().map(|m| m.candidate.id).collect();
    assert_eq!(ids, vec![4]);

    let reason_of = |id: u64| {
        report
            .excluded
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.reason.clone())
    };
    assert_eq!(
        reason_of(1),
        Some(ExclusionReason::Incompatible {
            filter: DietaryFilter::Pescatarian,
            term: "kylling".to_string(),
        })
    );
    assert_eq!(
        reason_of(2),
        Some(ExclusionReason::Allergen {
            allergen: Allergen::Shellfish,
            term: "rejer".to_string(),
        })
    );
    assert_eq!(
        reason_of(3),
        Some(ExclusionReason::Allergen {
            allergen: Allergen::Soy,
            term: "soja".to_string(),
        })
    );
}

#[test]
fn test_all_out_of_stock_returns_flagged_best() {
    let catalog = vec![
        CatalogCandidate::new(1, "Letmælk", "Mejeri", 12.0).out_of_stock(),
        CatalogCandidate::new(2, "Sødmælk", "Mejeri", 14.0).out_of_stock(),
        CatalogCandidate::new(3, "Mælkechokolade", "Kiosk", 18.0).out_of_stock(),
    ];
    let report = Matcher::default()
        .rank_with_report(
            "mælk",
            Need::new(Some(1.0), Some(Unit::Liters)),
            &catalog,
            &MatchOptions::default(),
        )
        .unwrap();

    assert_eq!(report.matches.len(), 1);
    let best = &report.matches[0];
    assert_eq!(best.candidate.id, 1);
    assert!(best.out_of_stock_fallback);
    assert_eq!(best.computed_order_quantity, None);
    assert_eq!(best.line_total(), None);
    assert_eq!(report.excluded.len(), 2);
    assert!(report.excluded.iter().all(|e| e.reason == ExclusionReason::OutOfStock));
}

#[test]
fn test_meal_context_prefers_cuisine_products() {
    let catalog = vec![
        CatalogCandidate::new(1, "Brie ost", "Mejeri", 30.0),
        CatalogCandidate::new(2, "Revet ost", "Mejeri", 30.0),
        CatalogCandidate::new(3, "Parmesan ost", "Mejeri", 30.0),
    ];
    let matcher = Matcher::default();

    let mexican = MatchOptions::default().with_context(MealContext::Mexican);
    let matches = matcher.rank("cheese", &catalog, &mexican).unwrap();
    assert_eq!(matches[0].candidate.id, 2);

    let italian = MatchOptions::default().with_context(MealContext::Italian);
    let matches = matcher.rank("cheese", &catalog, &italian).unwrap();
    assert_eq!(matches[0].candidate.id, 3);

    // Without a context the tie goes to the lowest id
    let matches = matcher.rank("cheese", &catalog, &MatchOptions::default()).unwrap();
    assert_eq!(matches[0].candidate.id, 1);
}

#[test]
fn test_boost_modes_and_preferred_products() {
    let catalog = vec![
        CatalogCandidate::new(1, "Hvedemel", "Kolonial", 25.0).with_pack_size("1 kg"),
        CatalogCandidate::new(2, "Hvedemel økologisk", "Kolonial", 32.0)
            .with_pack_size("1 kg")
            .with_label(ProductLabel::Organic),
        CatalogCandidate::new(3, "Hvedemel", "Kolonial", 12.0).with_pack_size("1 kg"),
    ];
    let matcher = Matcher::default();

    let organic = MatchOptions::default().with_boosts(BoostModes {
        organic: true,
        budget: false,
    });
    assert_eq!(matcher.rank("hvedemel", &catalog, &organic).unwrap()[0].candidate.id, 2);

    let budget = MatchOptions::default().with_boosts(BoostModes {
        organic: false,
        budget: true,
    });
    assert_eq!(matcher.rank("hvedemel", &catalog, &budget).unwrap()[0].candidate.id, 3);

    let preferred = MatchOptions::default().with_preferred(1);
    assert_eq!(matcher.rank("hvedemel", &catalog, &preferred).unwrap()[0].candidate.id, 1);
}

#[test]
fn test_score_breakdown_names_rules() {
    let matcher = Matcher::default();
    let query = matcher.query("onion", &MatchOptions::default());
    let candidates = onion_catalog();
    let breakdown = score_breakdown(&query, &candidates[2]);

    let non_food = breakdown.iter().find(|(name, _)| *name == "non-food").unwrap();
    assert_eq!(non_food.1, -150.0);
    let category = breakdown.iter().find(|(name, _)| *name == "category").unwrap();
    assert_eq!(category.1, 0.0);
}

#[test]
fn test_limit_contract() {
    let matcher = Matcher::default();
    let options = MatchOptions::default().with_limit(2);
    assert_eq!(matcher.rank("onion", &onion_catalog(), &options).unwrap().len(), 2);

    let options = MatchOptions::default().with_limit(0);
    assert_eq!(
        matcher.rank("onion", &onion_catalog(), &options),
        Err(MatchError::InvalidLimit)
    );
    assert!(matcher
        .rank("onion", &[], &MatchOptions::default())
        .unwrap()
        .is_empty());
}
