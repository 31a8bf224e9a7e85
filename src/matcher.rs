//! # Matcher
//!
//! Ranks catalog candidates for an ingredient.
//!
//! Ranking has four steps:
//!
//! 1. **Translation** of the ingredient name through the injected [`TranslationTable`]
//! 2. **Filtering** on allergens, dietary requirements and stock
//! 3. **Scoring** with independent rules whose deltas are summed
//! 4. **Tie-breaking** on stock, price and id, then truncation to the limit
//!
//! Every rule is a pure `fn(&MatchQuery, &CatalogCandidate) -> f64`, so a score
//! can always be recomputed and explained with [`score_breakdown`].

use crate::catalog::{
    expected_category, safe_alternative_prefix, word_matches, Allergen, CatalogCandidate,
    CategoryClass, DietaryConflict, DietaryFilter, MealContext, ProductLabel,
};
use crate::errors::MatchError;
use crate::ingredient_model::Unit;
use crate::scaler::ScaledIngredient;
use crate::translation::{tokenize, TranslationKind, TranslationTable};
use crate::units::calculate_order_quantity;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Default number of ranked matches returned
pub const DEFAULT_MATCH_LIMIT: usize = 5;

const WORD_START_BONUS: f64 = 50.0;
const NAME_START_BONUS: f64 = 30.0;
const TOKEN_COVERAGE_WEIGHT: f64 = 60.0;
const CATEGORY_BONUS: f64 = 50.0;
const SNACK_PENALTY: f64 = -75.0;
const NON_FOOD_PENALTY: f64 = -150.0;
const DERIVATIVE_PENALTY: f64 = -40.0;
const FLAVOUR_PENALTY: f64 = -60.0;
const CONTEXT_BONUS: f64 = 35.0;
const ORGANIC_BOOST: f64 = 25.0;
const BUDGET_WEIGHT: f64 = 30.0;
const BUDGET_PIVOT: f64 = 20.0;
const PREFERRED_BOOST: f64 = 75.0;

/// Words that make an ingredient itself a snack
const SNACK_TERMS: &[&str] = &["chips", "slik", "candy", "snack", "chokolade", "chocolate"];

/// Product name words that mark cleaning and care products
const CLEANING_TERMS: &[&str] = &[
    "klud", "klude", "rengøring", "spray", "sæbe", "vask", "opvask", "mopning", "ble", "bleer",
    "drynites", "shampoo", "cleaner", "cleaning", "detergent", "soap",
];

/// Product name words that mark a product made from the ingredient, not the ingredient
const DERIVATIVE_QUALIFIERS: &[&str] = &[
    "chips", "snack", "sauce", "dressing", "pulver", "powder", "mix", "krydderi", "spice",
    "seasoning", "marinade", "suppe", "soup", "pesto", "sirup", "syrup", "aroma", "essens",
    "bouillon", "refill",
];

/// Connectors after which ingredient words only name a flavour
const FLAVOUR_CONNECTORS: &[&str] = &[" & ", " m. ", " med ", " with ", " smag "];

/// Organic markers in product names
const ORGANIC_MARKERS: &[&str] = &["øko", "økologisk", "organic"];

/// Optional score boosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoostModes {
    /// Prefer organic products
    pub organic: bool,
    /// Prefer cheaper products per kg/l/piece
    pub budget: bool,
}

/// Caller options for a ranking call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub context: Option<MealContext>,
    pub filters: BTreeSet<DietaryFilter>,
    #[serde(default)]
    pub allergies: BTreeSet<Allergen>,
    pub boosts: BoostModes,
    pub preferred_product_ids: BTreeSet<u64>,
    /// Compute an order quantity even for an out-of-stock fallback
    pub order_out_of_stock_fallback: bool,
    pub limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            context: None,
            filters: BTreeSet::new(),
            allergies: BTreeSet::new(),
            boosts: BoostModes::default(),
            preferred_product_ids: BTreeSet::new(),
            order_out_of_stock_fallback: false,
            limit: DEFAULT_MATCH_LIMIT,
        }
    }
}

impl MatchOptions {
    pub fn with_context(mut self, context: MealContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_filter(mut self, filter: DietaryFilter) -> Self {
        self.filters.insert(filter);
        self
    }

    pub fn with_allergy(mut self, allergen: Allergen) -> Self {
        self.allergies.insert(allergen);
        self
    }

    pub fn with_boosts(mut self, boosts: BoostModes) -> Self {
        self.boosts = boosts;
        self
    }

    pub fn with_preferred(mut self, product_id: u64) -> Self {
        self.preferred_product_ids.insert(product_id);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Everything a scoring rule knows about the ingredient being matched
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    /// Ingredient name as written, lower-cased
    pub original: String,
    pub original_tokens: Vec<String>,
    /// Danish form used against the catalog
    pub translated: String,
    pub translated_tokens: Vec<String>,
    pub translation_kind: TranslationKind,
    pub expected_category: Option<CategoryClass>,
    pub context: Option<MealContext>,
    pub boosts: BoostModes,
    pub preferred_product_ids: BTreeSet<u64>,
}

impl MatchQuery {
    pub fn new(ingredient_name: &str, translations: &TranslationTable, options: &MatchOptions) -> Self {
        let original_tokens = tokenize(ingredient_name);
        let translation = translations.translate(ingredient_name);
        let translated_tokens = tokenize(&translation.text);
        let expected = expected_category(&translation.text)
            .or_else(|| expected_category(ingredient_name));

        Self {
            original: original_tokens.join(" "),
            original_tokens,
            translated: translation.text,
            translated_tokens,
            translation_kind: translation.kind,
            expected_category: expected,
            context: options.context,
            boosts: options.boosts,
            preferred_product_ids: options.preferred_product_ids.clone(),
        }
    }

    /// Both name forms, for rules that check "the ingredient contains ..."
    fn mentions(&self, term: &str) -> bool {
        self.original.contains(term) || self.translated.contains(term)
    }

    fn all_tokens(&self) -> impl Iterator<Item = &String> {
        self.original_tokens.iter().chain(self.translated_tokens.iter())
    }
}

/// A scoring rule: a pure score delta for one candidate
pub type ScoringRule = fn(&MatchQuery, &CatalogCandidate) -> f64;

/// All scoring rules with their names
pub const SCORING_RULES: [(&str, ScoringRule); 10] = [
    ("lexical", lexical_relevance),
    ("category", category_bonus),
    ("snack", snack_penalty),
    ("non-food", non_food_penalty),
    ("derivative", derivative_penalty),
    ("flavour", flavour_penalty),
    ("context", context_bonus),
    ("organic", organic_boost),
    ("budget", budget_boost),
    ("preferred", preferred_boost),
];

/// Does a candidate word contain a query word, tolerating Danish inflection
fn token_found(query_token: &str, name_tokens: &[String]) -> bool {
    name_tokens.iter().any(|name_token| {
        name_token == query_token
            || (query_token.chars().count() >= 3 && name_token.starts_with(query_token))
            || (query_token.chars().count() >= 4 && name_token.ends_with(query_token))
    })
}

/// Does `phrase` occur in `name` at the start of a word
fn occurs_at_word_start(name: &str, phrase: &str) -> bool {
    name.match_indices(phrase).any(|(index, _)| {
        name[..index]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

fn lexical_score(phrase: &str, tokens: &[String], name: &str, name_tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    if occurs_at_word_start(name, phrase) {
        score += WORD_START_BONUS;
        if name.starts_with(phrase) {
            score += NAME_START_BONUS;
        }
    }

    let found = tokens.iter().filter(|t| token_found(t, name_tokens)).count();
    score + TOKEN_COVERAGE_WEIGHT * found as f64 / tokens.len() as f64
}

/// How well the candidate name matches the ingredient, in either language
pub fn lexical_relevance(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    let name = candidate.name.to_lowercase();
    let name_tokens = tokenize(&name);
    let translated = lexical_score(&query.translated, &query.translated_tokens, &name, &name_tokens);
    let original = lexical_score(&query.original, &query.original_tokens, &name, &name_tokens);
    translated.max(original)
}

/// Bonus when the candidate sits in the department the ingredient belongs to
pub fn category_bonus(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    match query.expected_category {
        Some(expected) if expected == candidate.category_class() => CATEGORY_BONUS,
        _ => 0.0,
    }
}

/// Penalty for snack departments unless a snack is wanted
pub fn snack_penalty(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    if candidate.category_class() != CategoryClass::Snack {
        return 0.0;
    }
    if SNACK_TERMS.iter().any(|term| query.mentions(term)) {
        return 0.0;
    }
    SNACK_PENALTY
}

/// Penalty for non-food departments and cleaning products
pub fn non_food_penalty(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    if candidate.category_class() == CategoryClass::NonFood {
        return NON_FOOD_PENALTY;
    }
    let name_tokens = tokenize(&candidate.name);
    let cleaning = CLEANING_TERMS.iter().any(|term| {
        name_tokens.iter().any(|token| word_matches(token, term)) && !query.mentions(term)
    });
    if cleaning {
        NON_FOOD_PENALTY
    } else {
        0.0
    }
}

/// Penalty per derivative qualifier the ingredient does not ask for.
///
/// Qualifiers match whole words; those of five letters or more also close a
/// compound ("hvidløgspulver"), so "mix" leaves "mixed" alone.
pub fn derivative_penalty(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    let name_tokens = tokenize(&candidate.name);
    let count = DERIVATIVE_QUALIFIERS
        .iter()
        .filter(|qualifier| {
            name_tokens.iter().any(|token| {
                token == *qualifier
                    || (qualifier.chars().count() >= 5 && token.ends_with(*qualifier))
            }) && !query.mentions(qualifier)
        })
        .count();
    DERIVATIVE_PENALTY * count as f64
}

/// Penalty when the ingredient only appears as a flavour ("sour cream & onion chips")
pub fn flavour_penalty(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    let name = format!(" {} ", candidate.name.to_lowercase());
    for connector in FLAVOUR_CONNECTORS {
        if let Some((before, after)) = name.split_once(connector) {
            let before_tokens = tokenize(before);
            let after_tokens = tokenize(after);
            let mut words = query.all_tokens().filter(|t| t.chars().count() > 2);
            let only_after = words.any(|word| {
                token_found(word, &after_tokens) && !token_found(word, &before_tokens)
            });
            let anywhere_before = query
                .all_tokens()
                .any(|word| word.chars().count() > 2 && token_found(word, &before_tokens));
            if only_after && !anywhere_before {
                return FLAVOUR_PENALTY;
            }
        }
    }
    0.0
}

/// Bonus when a cuisine prefers this kind of product for an ambiguous ingredient
pub fn context_bonus(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    let context = match query.context {
        Some(context) => context,
        None => return 0.0,
    };
    let name = candidate.name.to_lowercase();

    let preferred = context.preferences().iter().any(|(terms, keywords)| {
        let ambiguous = terms
            .iter()
            .any(|term| query.all_tokens().any(|token| word_matches(token, term)));
        ambiguous && keywords.iter().any(|keyword| name.contains(keyword))
    });

    if preferred {
        CONTEXT_BONUS
    } else {
        0.0
    }
}

/// Boost organic products in organic mode
pub fn organic_boost(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    if !query.boosts.organic {
        return 0.0;
    }
    let name = candidate.name.to_lowercase();
    let organic = candidate.has_label(ProductLabel::Organic)
        || ORGANIC_MARKERS.iter().any(|marker| name.contains(marker));
    if organic {
        ORGANIC_BOOST
    } else {
        0.0
    }
}

/// Boost cheaper products in budget mode, by price per kg/l/piece when known
pub fn budget_boost(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    if !query.boosts.budget {
        return 0.0;
    }
    let price = candidate.unit_price().unwrap_or(candidate.price).max(0.0);
    BUDGET_WEIGHT * BUDGET_PIVOT / (BUDGET_PIVOT + price)
}

/// Boost products the caller marked as preferred
pub fn preferred_boost(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    if query.preferred_product_ids.contains(&candidate.id) {
        PREFERRED_BOOST
    } else {
        0.0
    }
}

/// Total score of a candidate
pub fn score_candidate(query: &MatchQuery, candidate: &CatalogCandidate) -> f64 {
    SCORING_RULES.iter().map(|(_, rule)| rule(query, candidate)).sum()
}

/// Per-rule deltas of a candidate's score
pub fn score_breakdown(query: &MatchQuery, candidate: &CatalogCandidate) -> Vec<(&'static str, f64)> {
    SCORING_RULES
        .iter()
        .map(|(name, rule)| (*name, rule(query, candidate)))
        .collect()
}

/// How much of an ingredient is needed, for order quantities
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Need {
    pub quantity: Option<f64>,
    pub unit: Option<Unit>,
}

impl Need {
    pub fn new(quantity: Option<f64>, unit: Option<Unit>) -> Self {
        Self { quantity, unit }
    }
}

impl From<&ScaledIngredient> for Need {
    fn from(scaled: &ScaledIngredient) -> Self {
        Self::new(scaled.quantity, scaled.ingredient.unit)
    }
}

/// A ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub candidate: CatalogCandidate,
    pub score: f64,
    pub needed_quantity: Option<f64>,
    pub needed_unit: Option<Unit>,
    /// Packages to order; absent for an out-of-stock fallback unless requested
    pub computed_order_quantity: Option<u32>,
    pub out_of_stock_fallback: bool,
}

impl ProductMatch {
    /// Price of the packages to order
    pub fn line_total(&self) -> Option<f64> {
        self.computed_order_quantity
            .map(|quantity| self.candidate.price * quantity as f64)
    }
}

/// Why a candidate was left out of the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "reason", content = "detail")]
pub enum ExclusionReason {
    MissingLabel(DietaryFilter),
    Incompatible { filter: DietaryFilter, term: String },
    Allergen { allergen: Allergen, term: String },
    OutOfStock,
}

/// First allergy or dietary requirement a candidate fails
fn screen(candidate: &CatalogCandidate, options: &MatchOptions) -> Option<ExclusionReason> {
    for allergen in &options.allergies {
        if let Some(term) = allergen.found_in(candidate) {
            return Some(ExclusionReason::Allergen {
                allergen: *allergen,
                term: term.to_string(),
            });
        }
    }
    options
        .filters
        .iter()
        .find_map(|filter| match filter.conflict(candidate)? {
            DietaryConflict::MissingLabel => Some(ExclusionReason::MissingLabel(*filter)),
            DietaryConflict::Contains(term) => Some(ExclusionReason::Incompatible {
                filter: *filter,
                term: term.to_string(),
            }),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedCandidate {
    pub id: u64,
    pub name: String,
    pub reason: ExclusionReason,
}

/// Ranked matches plus the candidates that were filtered away
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// The name the catalog was matched against
    pub query: String,
    pub matches: Vec<ProductMatch>,
    pub excluded: Vec<ExcludedCandidate>,
}

/// Ranking order: score, then in stock, then cheaper, then lower id
fn compare_ranked(a: &(f64, &CatalogCandidate), b: &(f64, &CatalogCandidate)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| b.1.in_stock.cmp(&a.1.in_stock))
        .then_with(|| a.1.price.total_cmp(&b.1.price))
        .then_with(|| a.1.id.cmp(&b.1.id))
}

fn excluded(candidate: &CatalogCandidate, reason: ExclusionReason) -> ExcludedCandidate {
    ExcludedCandidate {
        id: candidate.id,
        name: candidate.name.clone(),
        reason,
    }
}

/// Ranks catalog candidates using an injected translation table
#[derive(Debug, Clone)]
pub struct Matcher {
    translations: TranslationTable,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(TranslationTable::danish())
    }
}

impl Matcher {
    pub fn new(translations: TranslationTable) -> Self {
        Self { translations }
    }

    pub fn translations(&self) -> &TranslationTable {
        &self.translations
    }

    /// Search queries for an ingredient, most specific first.
    ///
    /// With an allergy or diet that has a safe product wording, the first
    /// query is repeated with that wording in front ("laktosefri mælk").
    pub fn search_queries(&self, ingredient_name: &str, options: &MatchOptions) -> Vec<String> {
        let mut queries = self.translations.search_queries(ingredient_name);
        let prefix = safe_alternative_prefix(&options.allergies, &options.filters);
        let safer = match (prefix, queries.first()) {
            (Some(prefix), Some(first)) if !first.split_whitespace().any(|w| w == prefix) => {
                Some(format!("{} {}", prefix, first))
            }
            _ => None,
        };
        if let Some(safer) = safer {
            debug!("Searching '{}' first for '{}'", safer, ingredient_name);
            queries.insert(0, safer);
        }
        queries
    }

    /// Build the scoring query for an ingredient name
    pub fn query(&self, ingredient_name: &str, options: &MatchOptions) -> MatchQuery {
        MatchQuery::new(ingredient_name, &self.translations, options)
    }

    /// Rank candidates for an ingredient name with no known quantity
    pub fn rank(
        &self,
        ingredient_name: &str,
        candidates: &[CatalogCandidate],
        options: &MatchOptions,
    ) -> Result<Vec<ProductMatch>, MatchError> {
        self.rank_need(ingredient_name, Need::default(), candidates, options)
    }

    /// Rank candidates for a scaled ingredient, computing order quantities
    pub fn rank_scaled(
        &self,
        ingredient: &ScaledIngredient,
        candidates: &[CatalogCandidate],
        options: &MatchOptions,
    ) -> Result<Vec<ProductMatch>, MatchError> {
        self.rank_need(ingredient.name(), Need::from(ingredient), candidates, options)
    }

    /// Rank candidates for an ingredient name and a needed amount
    pub fn rank_need(
        &self,
        ingredient_name: &str,
        need: Need,
        candidates: &[CatalogCandidate],
        options: &MatchOptions,
    ) -> Result<Vec<ProductMatch>, MatchError> {
        self.rank_with_report(ingredient_name, need, candidates, options)
            .map(|report| report.matches)
    }

    /// Rank candidates and report which ones were excluded and why
    pub fn rank_with_report(
        &self,
        ingredient_name: &str,
        need: Need,
        candidates: &[CatalogCandidate],
        options: &MatchOptions,
    ) -> Result<MatchReport, MatchError> {
        if options.limit == 0 {
            return Err(MatchError::InvalidLimit);
        }

        let query = self.query(ingredient_name, options);
        let mut report = MatchReport {
            query: query.translated.clone(),
            matches: Vec::new(),
            excluded: Vec::new(),
        };
        if candidates.is_empty() {
            debug!("No candidates for '{}'", ingredient_name);
            return Ok(report);
        }

        let mut in_stock = Vec::new();
        let mut out_of_stock = Vec::new();
        for candidate in candidates {
            match screen(candidate, options) {
                Some(reason) => {
                    trace!("Excluding '{}': {:?}", candidate.name, reason);
                    report.excluded.push(excluded(candidate, reason));
                }
                None if candidate.in_stock => in_stock.push(candidate),
                None => out_of_stock.push(candidate),
            }
        }

        let fallback = in_stock.is_empty();
        let pool = if fallback {
            out_of_stock
        } else {
            report.excluded.extend(
                out_of_stock
                    .iter()
                    .map(|c| excluded(c, ExclusionReason::OutOfStock)),
            );
            in_stock
        };

        let mut scored: Vec<(f64, &CatalogCandidate)> = pool
            .into_iter()
            .map(|candidate| (score_candidate(&query, candidate), candidate))
            .collect();
        scored.sort_by(compare_ranked);

        if fallback && !scored.is_empty() {
            report.excluded.extend(
                scored[1..]
                    .iter()
                    .map(|(_, c)| excluded(c, ExclusionReason::OutOfStock)),
            );
            scored.truncate(1);
            warn!(
                "Nothing in stock for '{}', falling back to '{}'",
                ingredient_name, scored[0].1.name
            );
        }
        scored.truncate(options.limit);

        let orderable = !fallback || options.order_out_of_stock_fallback;
        report.matches = scored
            .into_iter()
            .map(|(score, candidate)| ProductMatch {
                candidate: candidate.clone(),
                score,
                needed_quantity: need.quantity,
                needed_unit: need.unit,
                computed_order_quantity: orderable.then(|| {
                    calculate_order_quantity(need.quantity, need.unit, candidate.pack_size.as_ref())
                }),
                out_of_stock_fallback: fallback,
            })
            .collect();

        for product in &report.matches {
            trace!(
                "'{}' -> '{}' score {:.1}",
                ingredient_name,
                product.candidate.name,
                product.score
            );
        }
        debug!(
            "Ranked {} matches for '{}' ({} excluded)",
            report.matches.len(),
            ingredient_name,
            report.excluded.len()
        );

        Ok(report)
    }
}
