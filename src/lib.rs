//! Procedural crossword generation: fill a black/white grid template with mutually consistent
//! words from a word bank, then score the result for difficulty.
//!
//! The pipeline is [`template`] → [`slot`] → [`word_index`] (domains) → [`solver`] →
//! [`difficulty`], driven end to end by [`generator::PuzzleGenerator`].

pub mod difficulty;
pub mod errors;
pub mod generator;
pub mod logging;
pub mod random;
pub mod retry;
pub mod settings;
pub mod slot;
pub mod solver;
pub mod template;
mod trail;
pub mod word_index;

#[cfg(test)]
mod test_support;

/// The expected maximum length for a single slot. Longer words still work, they just spill onto
/// the heap.
pub const MAX_SLOT_LENGTH: usize = 15;

/// Words shorter than this are never placed in a grid.
pub const MIN_WORD_LENGTH: usize = 2;

pub use difficulty::{
    compute_metrics, difficulty_config, score_puzzle, DifficultyConfig, NormalizationRange, PuzzleMetrics,
    ScoreNormalization,
};
pub use errors::{GenerateError, SettingsError, TemplateError, WordBankError};
pub use generator::{
    to_level_data, GenerateOptions, GeneratedPuzzle, GeneratedWord, LevelData, LevelWord, PuzzleGenerator,
};
pub use random::{seed_for_date, time_seed, SeededRandom};
pub use settings::GeneratorSettings;
pub use slot::{extract_slots, Direction, Intersection, Slot, SlotId};
pub use solver::{is_consistent, solve, SolveOutcome, SolveStatus, SolverLimits};
pub use template::{GridTemplate, GridTier, TemplateDefinition, TemplateRegistry};
pub use word_index::{DifficultyBand, RawWord, Tier, WordEntry, WordId, WordIndex};
