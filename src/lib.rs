//! # Recipe Shopper
//!
//! Turns free-text recipe ingredient lines into a shopping list of grocery
//! products: quantities are parsed, recipes are resized, ingredients are
//! consolidated across recipes and ranked against a product catalog.

pub mod catalog;
pub mod config;
pub mod consolidation;
pub mod errors;
pub mod ingredient_model;
pub mod ingredient_parser;
pub mod matcher;
pub mod measurement_patterns;
pub mod measurement_types;
pub mod pipeline;
pub mod scaler;
pub mod text_processing;
pub mod translation;
pub mod units;
