//! # Error Types Module
//!
//! This module defines the error types used throughout the shopping pipeline.
//! Parsing never fails (see [`crate::ingredient_model::ParseDegraded`]); the
//! errors below are contract violations of the scaling and matching calls,
//! catalog search failures and configuration problems.

/// Errors from scaling an ingredient
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleError {
    /// Scale factor was zero, negative or not finite
    InvalidFactor(f64),
    /// Serving count was zero or negative
    InvalidServings(f64),
    /// Target servings requested for a recipe that declares none
    MissingServings,
}

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::InvalidFactor(factor) => {
                write!(f, "Invalid scale factor: {factor} (must be positive and finite)")
            }
            ScaleError::InvalidServings(servings) => {
                write!(f, "Invalid servings: {servings} (must be positive)")
            }
            ScaleError::MissingServings => {
                write!(f, "Recipe declares no servings to scale from")
            }
        }
    }
}

impl std::error::Error for ScaleError {}

/// Errors from ranking catalog candidates
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// A result limit of zero was requested
    InvalidLimit,
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::InvalidLimit => write!(f, "Match limit must be at least 1"),
        }
    }
}

impl std::error::Error for MatchError {}

/// Errors reported by a catalog search collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The catalog could not be reached or read
    Unavailable(String),
    /// The query was rejected
    InvalidQuery(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Unavailable(msg) => write!(f, "Catalog unavailable: {msg}"),
            SearchError::InvalidQuery(msg) => write!(f, "Invalid search query: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Errors surfaced by a pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Scale(ScaleError),
    Match(MatchError),
    /// Configuration errors
    Config(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Scale(err) => write!(f, "Scaling error: {err}"),
            PipelineError::Match(err) => write!(f, "Matching error: {err}"),
            PipelineError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Scale(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Config(_) => None,
        }
    }
}

impl From<ScaleError> for PipelineError {
    fn from(err: ScaleError) -> Self {
        PipelineError::Scale(err)
    }
}

impl From<MatchError> for PipelineError {
    fn from(err: MatchError) -> Self {
        PipelineError::Match(err)
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
