//! Puzzle-level difficulty: metrics over a finished fill, a weighted 1–10 score, and the level →
//! generation parameters table.

use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::template::GridTier;
use crate::word_index::{round_to_tenth, DifficultyBand, WordIndex};

const AVERAGE_DIFFICULTY_WEIGHT: f64 = 0.30;
const MAX_DIFFICULTY_WEIGHT: f64 = 0.15;
const AVERAGE_LENGTH_WEIGHT: f64 = 0.15;
const DENSITY_WEIGHT: f64 = 0.15;
const RARE_RATIO_WEIGHT: f64 = 0.15;
const WORD_COUNT_WEIGHT: f64 = 0.10;

/// Aggregate statistics over the filled slots of a puzzle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PuzzleMetrics {
    pub average_difficulty: f64,
    pub max_difficulty: f64,
    pub average_length: f64,
    pub total_letters: usize,
    pub rare_letter_ratio: f64,
    /// Crossings per filled slot.
    pub intersection_density: f64,
    pub word_count: usize,
}

/// A linear mapping of `[min, max]` onto `[0, 10]`, clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        if self.max <= self.min {
            return 0.0;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0) * 10.0
    }
}

/// Ranges used to put the non-difficulty metrics on the same 0–10 scale as word difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreNormalization {
    pub average_length: NormalizationRange,
    pub intersection_density: NormalizationRange,
    pub rare_letter_ratio: NormalizationRange,
    pub word_count: NormalizationRange,
}

impl Default for ScoreNormalization {
    fn default() -> Self {
        Self {
            average_length: NormalizationRange::new(3.0, 8.0),
            intersection_density: NormalizationRange::new(0.5, 3.0),
            rare_letter_ratio: NormalizationRange::new(0.0, 0.5),
            word_count: NormalizationRange::new(6.0, 40.0),
        }
    }
}

/// Compute metrics over every slot that has a word assigned. Unassigned slots are ignored.
pub fn compute_metrics(index: &WordIndex, slots: &[Slot]) -> PuzzleMetrics {
    let filled: Vec<(&Slot, usize)> = slots
        .iter()
        .filter_map(|slot| slot.assigned.map(|word_id| (slot, word_id)))
        .collect();

    if filled.is_empty() {
        return PuzzleMetrics::default();
    }

    let word_count = filled.len();
    let mut difficulty_sum = 0.0;
    let mut max_difficulty: f64 = 0.0;
    let mut total_letters = 0;
    let mut rare_letters = 0;
    let mut crossing_count = 0;

    for &(slot, word_id) in &filled {
        let entry = index.entry(word_id);
        difficulty_sum += entry.difficulty_score;
        max_difficulty = max_difficulty.max(entry.difficulty_score);
        total_letters += entry.len();
        rare_letters += entry.rare_letter_count();
        crossing_count += slot.intersections.len();
    }

    PuzzleMetrics {
        average_difficulty: difficulty_sum / word_count as f64,
        max_difficulty,
        average_length: total_letters as f64 / word_count as f64,
        total_letters,
        rare_letter_ratio: rare_letters as f64 / total_letters as f64,
        // Each crossing is recorded on both of its slots.
        intersection_density: crossing_count as f64 / 2.0 / word_count as f64,
        word_count,
    }
}

/// Weighted puzzle difficulty in `[1, 10]`, rounded to one decimal.
pub fn score_puzzle(metrics: &PuzzleMetrics, normalization: &ScoreNormalization) -> f64 {
    let score = AVERAGE_DIFFICULTY_WEIGHT * metrics.average_difficulty
        + MAX_DIFFICULTY_WEIGHT * metrics.max_difficulty
        + AVERAGE_LENGTH_WEIGHT * normalization.average_length.normalize(metrics.average_length)
        + DENSITY_WEIGHT * normalization.intersection_density.normalize(metrics.intersection_density)
        + RARE_RATIO_WEIGHT * normalization.rare_letter_ratio.normalize(metrics.rare_letter_ratio)
        + WORD_COUNT_WEIGHT * normalization.word_count.normalize(metrics.word_count as f64);

    round_to_tenth(score.clamp(1.0, 10.0))
}

/// Generation parameters for a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyConfig {
    pub level: u32,
    pub grid_size: usize,
    /// Per-word difficulty scores to draw from before any widening.
    pub band: DifficultyBand,
    pub min_word_length: usize,
    pub target_average_length: f64,
    pub target_rare_ratio: f64,
    pub tier: GridTier,
}

/// Map a level number to its generation parameters. Level 0 is treated as level 1.
pub fn difficulty_config(level: u32) -> DifficultyConfig {
    let level = level.max(1);

    let (grid_size, band, target_average_length, target_rare_ratio, tier) = match level {
        1..=5 => (7, DifficultyBand::new(1.0, 4.5), 4.0, 0.05, GridTier::Beginner),
        6..=10 => (9, DifficultyBand::new(1.5, 6.0), 4.5, 0.08, GridTier::Intermediate),
        11..=20 => (11, DifficultyBand::new(2.5, 7.5), 5.0, 0.12, GridTier::Advanced),
        _ => (13, DifficultyBand::new(3.5, 10.0), 5.5, 0.15, GridTier::Expert),
    };

    DifficultyConfig {
        level,
        grid_size,
        band,
        min_word_length: 3,
        target_average_length,
        target_rare_ratio,
        tier,
    }
}
