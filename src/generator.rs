//! End-to-end puzzle generation: choose templates, fill them with the solver, climb the retry
//! ladder on failure, and number and score the result.

use std::collections::HashSet;
use std::sync::Arc;

use instant::Duration;
use log::{debug, info};
use serde::Serialize;

use crate::difficulty::{compute_metrics, difficulty_config, score_puzzle, DifficultyConfig, PuzzleMetrics};
use crate::errors::GenerateError;
use crate::random::{time_seed, SeededRandom};
use crate::retry::{RetryEvent, RetryLadder, RetryState};
use crate::settings::GeneratorSettings;
use crate::slot::{extract_slots, Direction, Slot};
use crate::solver::{is_consistent, solve};
use crate::template::{GridTemplate, TemplateRegistry};
use crate::word_index::{Tier, WordIndex};

const EASY_TITLES: &[&str] = &["İlk Adım", "Isınma Turu", "Sabah Kahvesi", "Kolay Başlangıç"];
const MEDIUM_TITLES: &[&str] = &["Orta Yol", "Zihin Jimnastiği", "Öğle Molası", "Dolambaçlı Yollar"];
const HARD_TITLES: &[&str] = &["Zorlu Tırmanış", "Usta İşi", "Labirent", "Gece Yarısı"];

/// A request for one puzzle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub level: u32,
    /// Seed for every random choice. When absent, one is derived from the clock.
    pub seed: Option<u64>,
    /// Source word ids that must not appear in the puzzle.
    pub exclude_word_ids: HashSet<String>,
}

impl GenerateOptions {
    pub fn for_level(level: u32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn excluding<I, S>(mut self, word_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_word_ids.extend(word_ids.into_iter().map(Into::into));
        self
    }
}

/// One placed word of a finished puzzle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedWord {
    /// Clue number plus direction suffix, e.g. `"4D"`.
    pub id: String,
    pub number: usize,
    pub direction: Direction,
    pub row: usize,
    pub col: usize,
    pub answer: String,
    pub clue: String,
    /// Id of the word bank entry this came from.
    pub word_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPuzzle {
    pub template_id: String,
    pub grid_size: usize,
    /// Words in reading order of their starting cells, across before down.
    pub words: Vec<GeneratedWord>,
    pub difficulty_score: f64,
    pub level: u32,
    pub seed: u64,
    pub metrics: PuzzleMetrics,
    /// Candidate words tried across every solve of this request.
    pub attempts_used: u64,
    pub elapsed_ms: u64,
}

impl GeneratedPuzzle {
    /// Plain-text grid: `#` for blocks, letters for white cells.
    pub fn render(&self) -> String {
        let mut grid = vec![vec!['#'; self.grid_size]; self.grid_size];

        for word in &self.words {
            for (offset, letter) in word.answer.chars().enumerate() {
                let (row, col) = match word.direction {
                    Direction::Across => (word.row, word.col + offset),
                    Direction::Down => (word.row + offset, word.col),
                };
                if let Some(cell) = grid.get_mut(row).and_then(|line| line.get_mut(col)) {
                    *cell = letter;
                }
            }
        }

        grid.into_iter()
            .map(|line| line.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Generates puzzles from a shared word index and template registry. Cheap to share between
/// threads: every call to `generate` owns its own scratch state.
#[derive(Debug, Clone)]
pub struct PuzzleGenerator {
    index: Arc<WordIndex>,
    templates: Arc<TemplateRegistry>,
    settings: GeneratorSettings,
}

impl PuzzleGenerator {
    pub fn new(index: Arc<WordIndex>, templates: Arc<TemplateRegistry>) -> Self {
        Self {
            index,
            templates,
            settings: GeneratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Generate a puzzle for the requested level. Returns `Ok(None)` when no candidate template
    /// could be filled within the retry budget; a partial puzzle is never returned.
    pub fn generate(&self, options: &GenerateOptions) -> Result<Option<GeneratedPuzzle>, GenerateError> {
        if self.index.is_empty() {
            return Err(match self.index.skipped() {
                0 => GenerateError::IndexNotBuilt,
                skipped => GenerateError::EmptyIndex { skipped },
            });
        }

        let seed = options.seed.unwrap_or_else(time_seed);
        let mut rng = SeededRandom::new(seed);
        let config = difficulty_config(options.level);

        info!(
            "Generating level {} puzzle ({}x{} grid, seed {})",
            config.level, config.grid_size, config.grid_size, seed
        );

        let candidates = self.candidate_templates(&config, &mut rng);
        let ladder = RetryLadder::new(candidates.len(), self.settings.band_tries);

        let mut state = ladder.start();
        let mut slots: Vec<Slot> = vec![];
        let mut attempts_used = 0;
        let mut elapsed = Duration::ZERO;

        loop {
            state = match state {
                RetryState::SelectTemplate { template } => {
                    let template = candidates[template];
                    match template
                        .slot_lengths()
                        .iter()
                        .find(|&&length| self.index.count_of_length(length) == 0)
                    {
                        Some(length) => {
                            debug!("Skipping template {}: no words of length {}", template.id(), length);
                            ladder.next(state, RetryEvent::TemplateRejected)
                        }
                        None => ladder.next(state, RetryEvent::TemplateViable),
                    }
                }

                RetryState::InitDomains { template, band_try } => {
                    let template = candidates[template];
                    let band = ladder.band_for_try(config.band, band_try, self.settings.band_widen_step);

                    slots = extract_slots(template);
                    for slot in &mut slots {
                        slot.domain =
                            self.index.domain_for(slot.length, band, &options.exclude_word_ids);
                    }

                    match slots.iter().find(|slot| slot.domain.is_empty()) {
                        Some(slot) => {
                            debug!(
                                "Template {} with band [{:.1}, {:.1}]: no candidates for slot {}",
                                template.id(),
                                band.min,
                                band.max,
                                slot.id
                            );
                            ladder.next(state, RetryEvent::DomainEmpty)
                        }
                        None => ladder.next(state, RetryEvent::DomainsReady),
                    }
                }

                RetryState::Solve { template, band_try } => {
                    let template = candidates[template];
                    let limits = self.settings.solver_limits(template.size());
                    let outcome = solve(&self.index, &mut slots, &mut rng, &limits);
                    attempts_used += outcome.attempts_used;
                    elapsed += outcome.elapsed;

                    debug!(
                        "Template {} band try {}: {:?} after {} attempts",
                        template.id(),
                        band_try,
                        outcome.status,
                        outcome.attempts_used
                    );

                    if outcome.success && is_consistent(&self.index, &slots) {
                        ladder.next(state, RetryEvent::Solved)
                    } else {
                        ladder.next(state, RetryEvent::Unsolved)
                    }
                }

                RetryState::Accept { template, .. } => {
                    let puzzle = self.finalize(
                        candidates[template],
                        &slots,
                        config.level,
                        seed,
                        attempts_used,
                        elapsed,
                    );
                    info!(
                        "Generated level {} puzzle on {} with {} words, difficulty {:.1}",
                        puzzle.level,
                        puzzle.template_id,
                        puzzle.words.len(),
                        puzzle.difficulty_score
                    );
                    return Ok(Some(puzzle));
                }

                RetryState::WidenBand { .. } | RetryState::NextTemplate { .. } => {
                    ladder.next(state, RetryEvent::Continue)
                }

                RetryState::Exhausted => {
                    info!(
                        "No puzzle found for level {} (seed {}) after {} attempts",
                        config.level, seed, attempts_used
                    );
                    return Ok(None);
                }
            };
        }
    }

    /// Templates of the target size first, then others of the target tier, then the rest, each
    /// group in seeded random order.
    fn candidate_templates(&self, config: &DifficultyConfig, rng: &mut SeededRandom) -> Vec<&GridTemplate> {
        let all = self.templates.all();

        let mut matching_size: Vec<&GridTemplate> =
            all.iter().filter(|t| t.size() == config.grid_size).collect();
        let mut matching_tier: Vec<&GridTemplate> = all
            .iter()
            .filter(|t| t.size() != config.grid_size && t.tier() == config.tier)
            .collect();
        let mut rest: Vec<&GridTemplate> = all
            .iter()
            .filter(|t| t.size() != config.grid_size && t.tier() != config.tier)
            .collect();

        rng.shuffle(&mut matching_size);
        rng.shuffle(&mut matching_tier);
        rng.shuffle(&mut rest);

        let mut candidates = matching_size;
        candidates.append(&mut matching_tier);
        candidates.append(&mut rest);
        candidates.truncate(self.settings.max_templates);
        candidates
    }

    fn finalize(
        &self,
        template: &GridTemplate,
        slots: &[Slot],
        level: u32,
        seed: u64,
        attempts_used: u64,
        elapsed: Duration,
    ) -> GeneratedPuzzle {
        let metrics = compute_metrics(&self.index, slots);

        let words = number_slots(slots)
            .into_iter()
            .filter_map(|(number, slot)| {
                let entry = self.index.entry(slot.assigned?);
                Some(GeneratedWord {
                    id: format!("{}{}", number, slot.direction.suffix()),
                    number,
                    direction: slot.direction,
                    row: slot.start.0,
                    col: slot.start.1,
                    answer: entry.answer.clone(),
                    clue: entry.clue.clone(),
                    word_id: entry.id.clone(),
                })
            })
            .collect();

        GeneratedPuzzle {
            template_id: template.id().to_string(),
            grid_size: template.size(),
            words,
            difficulty_score: score_puzzle(&metrics, &self.settings.normalization),
            level,
            seed,
            metrics,
            attempts_used,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Order slots by starting cell in reading order (across before down on a shared start) and give
/// each distinct starting cell the next clue number.
fn number_slots(slots: &[Slot]) -> Vec<(usize, &Slot)> {
    let mut ordered: Vec<&Slot> = slots.iter().collect();
    ordered.sort_by_key(|slot| (slot.start, slot.direction));

    let mut numbered = Vec::with_capacity(ordered.len());
    let mut number = 0;
    let mut previous_start = None;

    for slot in ordered {
        if previous_start != Some(slot.start) {
            number += 1;
            previous_start = Some(slot.start);
        }
        numbered.push((number, slot));
    }

    numbered
}

/// A placed word as the game's level format expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelWord {
    pub id: String,
    pub number: usize,
    pub direction: Direction,
    pub row: usize,
    pub col: usize,
    pub answer: String,
    pub clue: String,
}

/// The game-facing representation of a generated puzzle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelData {
    pub id: u32,
    pub grid_size: usize,
    pub words: Vec<LevelWord>,
    pub difficulty: Tier,
    pub title: String,
}

pub fn to_level_data(puzzle: &GeneratedPuzzle) -> LevelData {
    let (difficulty, titles) = if puzzle.difficulty_score <= 4.0 {
        (Tier::Easy, EASY_TITLES)
    } else if puzzle.difficulty_score <= 7.0 {
        (Tier::Medium, MEDIUM_TITLES)
    } else {
        (Tier::Hard, HARD_TITLES)
    };

    LevelData {
        id: puzzle.level,
        grid_size: puzzle.grid_size,
        words: puzzle
            .words
            .iter()
            .map(|word| LevelWord {
                id: word.id.clone(),
                number: word.number,
                direction: word.direction,
                row: word.row,
                col: word.col,
                answer: word.answer.clone(),
                clue: word.clue.clone(),
            })
            .collect(),
        difficulty,
        title: titles[puzzle.level as usize % titles.len()].to_string(),
    }
}
