//! Error types for loading inputs and for generation requests that can never succeed.
//!
//! Note what is *not* here: a request that simply fails to produce a fill (an impoverished word
//! bank, an exhausted retry budget) is an expected outcome and is reported as `Ok(None)` by
//! [`crate::PuzzleGenerator::generate`], never as an error.

use std::io;

use thiserror::Error;

/// Failure to load a raw word bank.
#[derive(Debug, Error)]
pub enum WordBankError {
    #[error("failed to read word bank: {0}")]
    Io(#[from] io::Error),

    #[error("malformed word bank: {0}")]
    Json(#[from] serde_json::Error),
}

/// A grid template definition that can't be used. Invalid templates are kept out of the
/// registry, so they can never be picked as generation candidates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {id}: expected {expected} rows, found {found}")]
    WrongRowCount {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("template {id}: row {row} has {found} cells, expected {expected}")]
    WrongRowLength {
        id: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("template {id}: invalid cell '{cell}' at ({row}, {col})")]
    InvalidCell {
        id: String,
        row: usize,
        col: usize,
        cell: char,
    },

    #[error("template {id}: cell ({row}, {col}) breaks 180° rotational symmetry")]
    NotSymmetric { id: String, row: usize, col: usize },

    #[error("template {id}: contains no slots")]
    NoSlots { id: String },
}

impl TemplateError {
    /// The id of the offending template.
    pub fn template_id(&self) -> &str {
        match self {
            TemplateError::WrongRowCount { id, .. }
            | TemplateError::WrongRowLength { id, .. }
            | TemplateError::InvalidCell { id, .. }
            | TemplateError::NotSymmetric { id, .. }
            | TemplateError::NoSlots { id } => id,
        }
    }
}

/// A generation request that indicates a caller bug rather than an unlucky search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("word index has not been built; load a word bank before generating puzzles")]
    IndexNotBuilt,
    /// The bank was loaded but none of its records survived normalization.
    #[error("word index is empty: all {skipped} word bank records were discarded")]
    EmptyIndex { skipped: usize },
}

/// Failure to load generator settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}
