//! # Shopping Pipeline
//!
//! Turns recipes into a priced shopping list:
//!
//! 1. Parse every recipe line, keeping parse warnings
//! 2. Resize each recipe by the configured [`ScaleSpec`]
//! 3. Consolidate the same ingredient across recipes
//! 4. Search the catalog with every generated query and merge candidates by id
//! 5. Rank the candidates and pick the best one
//!
//! The catalog is reached only through the [`CatalogSearch`] trait; failed
//! searches are logged and skipped.

use crate::catalog::{CatalogCandidate, CatalogSearch};
use crate::config::PipelineConfig;
use crate::consolidation::{consolidate, ConsolidatedIngredient};
use crate::errors::PipelineResult;
use crate::ingredient_model::{format_quantity, ParseDegraded};
use crate::ingredient_parser::IngredientParser;
use crate::matcher::{MatchOptions, Matcher, Need, ProductMatch};
use crate::scaler::{calculate_scale_factor, scale, ScaleSpec, ScaledIngredient};
use crate::text_processing::RecipeSource;
use crate::translation::TranslationTable;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A line that was only partially understood
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// Title of the recipe the line came from
    pub source: String,
    pub raw_text: String,
    pub warning: ParseDegraded,
}

/// A consolidated ingredient with its ranked products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIngredient {
    pub ingredient: ConsolidatedIngredient,
    /// First query that returned candidates
    pub search_query: Option<String>,
    pub matches: Vec<ProductMatch>,
    /// Index into `matches` of the chosen product
    pub selected: usize,
}

impl ResolvedIngredient {
    pub fn best(&self) -> Option<&ProductMatch> {
        self.matches.get(self.selected)
    }

    /// Every ranked product except the chosen one
    pub fn alternatives(&self) -> Vec<&ProductMatch> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.selected)
            .map(|(_, product)| product)
            .collect()
    }

    pub fn is_matched(&self) -> bool {
        self.best().is_some()
    }

    /// Make the alternative at `index` the chosen product
    pub fn select_alternative(&mut self, index: usize) -> bool {
        let alternatives: Vec<usize> = (0..self.matches.len())
            .filter(|i| *i != self.selected)
            .collect();
        match alternatives.get(index) {
            Some(position) => {
                self.selected = *position;
                true
            }
            None => false,
        }
    }
}

/// A product and how many of it to put in the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: u64,
    pub quantity: u32,
}

/// Result of a pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShoppingList {
    pub items: Vec<ResolvedIngredient>,
    pub warnings: Vec<ParseWarning>,
}

impl ShoppingList {
    /// Ingredients no product was found for
    pub fn unmatched(&self) -> Vec<&ConsolidatedIngredient> {
        self.items
            .iter()
            .filter(|item| !item.is_matched())
            .map(|item| &item.ingredient)
            .collect()
    }

    /// Price of every orderable chosen product
    pub fn total_cost(&self) -> f64 {
        self.items
            .iter()
            .filter_map(|item| item.best())
            .filter_map(ProductMatch::line_total)
            .sum()
    }

    /// Chosen products with an order quantity, for a cart
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.items
            .iter()
            .filter_map(|item| item.best())
            .filter_map(|product| {
                product.computed_order_quantity.map(|quantity| CartItem {
                    product_id: product.candidate.id,
                    quantity,
                })
            })
            .collect()
    }

    /// Swap the chosen product of item `item` for its alternative `alternative`
    pub fn select_alternative(&mut self, item: usize, alternative: usize) -> bool {
        self.items
            .get_mut(item)
            .map_or(false, |resolved| resolved.select_alternative(alternative))
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shopping list ({} items)", self.items.len())?;
        for item in &self.items {
            match item.best() {
                Some(product) => {
                    write!(f, "- {} -> {}", item.ingredient, product.candidate)?;
                    match product.computed_order_quantity {
                        Some(quantity) => writeln!(f, " x{}", quantity)?,
                        None => writeln!(f, " (out of stock)")?,
                    }
                }
                None => writeln!(f, "- {} -> no match", item.ingredient)?,
            }
        }
        writeln!(f, "Total: {} kr", format_quantity((self.total_cost() * 100.0).round() / 100.0))?;
        for warning in &self.warnings {
            writeln!(f, "! {}: '{}' ({})", warning.source, warning.raw_text, warning.warning)?;
        }
        Ok(())
    }
}

/// Parser, scaler and matcher wired together
#[derive(Debug, Clone)]
pub struct ShoppingPipeline {
    parser: IngredientParser,
    matcher: Matcher,
    scale: ScaleSpec,
    options: MatchOptions,
}

impl ShoppingPipeline {
    pub fn new(config: &PipelineConfig, translations: TranslationTable) -> Self {
        Self {
            parser: IngredientParser::with_config(config.parser)
                .with_vocabulary(translations.clone()),
            matcher: Matcher::new(translations),
            scale: config.scale,
            options: config.matching.clone(),
        }
    }

    /// Pipeline with the curated Danish translation table
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config, TranslationTable::danish())
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Parse, scale and consolidate recipes without touching the catalog
    pub fn prepare(
        &self,
        recipes: &[RecipeSource],
    ) -> PipelineResult<(Vec<ConsolidatedIngredient>, Vec<ParseWarning>)> {
        let mut scaled: Vec<(ScaledIngredient, String)> = Vec::new();
        let mut warnings = Vec::new();

        for recipe in recipes {
            let factor = calculate_scale_factor(recipe.servings, &self.scale)?;
            for ingredient in self.parser.parse_lines(&recipe.lines) {
                warnings.extend(ingredient.warnings.iter().map(|warning| ParseWarning {
                    source: recipe.title.clone(),
                    raw_text: ingredient.raw_text.clone(),
                    warning: warning.clone(),
                }));
                if ingredient.name.is_empty()
                    || ingredient.warnings.contains(&ParseDegraded::MissingName)
                {
                    continue;
                }
                scaled.push((scale(&ingredient, factor)?, recipe.title.clone()));
            }
            debug!("Recipe '{}' scaled by {}", recipe.title, factor);
        }

        Ok((consolidate(&scaled), warnings))
    }

    /// Search the catalog for one ingredient and rank what comes back
    pub fn resolve(
        &self,
        ingredient: ConsolidatedIngredient,
        catalog: &dyn CatalogSearch,
    ) -> PipelineResult<ResolvedIngredient> {
        let mut candidates: Vec<CatalogCandidate> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut search_query = None;

        for query in self.matcher.search_queries(&ingredient.name, &self.options) {
            match catalog.search(&query) {
                Ok(results) => {
                    if !results.is_empty() && search_query.is_none() {
                        search_query = Some(query.clone());
                    }
                    for candidate in results {
                        if seen.insert(candidate.id) {
                            candidates.push(candidate);
                        }
                    }
                }
                Err(e) => warn!("Search for '{}' failed: {}", query, e),
            }
        }

        let need = Need::new(ingredient.total_quantity, ingredient.unit);
        let matches = self
            .matcher
            .rank_need(&ingredient.name, need, &candidates, &self.options)?;
        if matches.is_empty() {
            info!("No product found for '{}'", ingredient.name);
        }

        Ok(ResolvedIngredient {
            ingredient,
            search_query,
            matches,
            selected: 0,
        })
    }

    /// Build a shopping list for recipes against a catalog
    pub fn run(
        &self,
        recipes: &[RecipeSource],
        catalog: &dyn CatalogSearch,
    ) -> PipelineResult<ShoppingList> {
        let (ingredients, warnings) = self.prepare(recipes)?;
        let items = ingredients
            .into_iter()
            .map(|ingredient| self.resolve(ingredient, catalog))
            .collect::<PipelineResult<Vec<_>>>()?;

        let list = ShoppingList { items, warnings };
        info!(
            "Shopping list ready: {} items, {} unmatched, {} warnings",
            list.items.len(),
            list.unmatched().len(),
            list.warnings.len()
        );
        Ok(list)
    }
}
