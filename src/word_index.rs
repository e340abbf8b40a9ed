//! The word bank, indexed for slot filling.
//!
//! [`WordIndex::build`] turns raw `(answer, clue, tier, ...)` records into immutable
//! [`WordEntry`] values and builds the lookup structures the generator needs: entries by exact
//! length, by `(position, letter)`, by source tier, and by id. Per-word difficulty and
//! letter-rarity scores are computed once here and never again.
//!
//! The index is read-only after construction and is shared across generation calls (and threads)
//! behind an `Arc`.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

use bit_set::BitSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::WordBankError;
use crate::{MAX_SLOT_LENGTH, MIN_WORD_LENGTH};

/// An identifier for a word, based on its index in the `WordIndex`'s `entries` field.
pub type WordId = usize;

/// Letters that make a word harder to guess and a grid harder to fill.
pub const RARE_LETTERS: [char; 12] = ['J', 'Ğ', 'F', 'V', 'Ö', 'Ü', 'Ç', 'Ş', 'Z', 'Q', 'W', 'X'];

/// Tags (and the category) marking archaic vocabulary, which earns a difficulty bonus.
const ARCHAIC_MARKERS: [&str; 3] = ["archaic", "arkaik", "eski"];

/// Word length stops adding difficulty past this many letters.
const LENGTH_CAP: usize = 12;

const LENGTH_WEIGHT: f64 = 3.0;
const RARE_LETTER_WEIGHT: f64 = 4.0;
const ARCHAIC_BONUS: f64 = 1.5;

/// Difficulty tier of a source word. Also used as the coarse label of a finished level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Tier {
    /// Base contribution of the source tier to a word's difficulty score.
    fn weight(self) -> f64 {
        match self {
            Tier::Easy => 1.0,
            Tier::Medium => 2.5,
            Tier::Hard => 4.0,
        }
    }
}

/// One record of the raw word bank, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWord {
    pub id: String,
    pub answer: String,
    #[serde(default)]
    pub difficulty: Tier,
    /// Level the curators had in mind for this word. Informational only.
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub clue: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An acceptable `[min, max]` range of per-word difficulty scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyBand {
    pub min: f64,
    pub max: f64,
}

impl DifficultyBand {
    /// The unrestricted band: every word qualifies.
    pub const FULL: DifficultyBand = DifficultyBand { min: 1.0, max: 10.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }

    /// This band grown by `step` on both ends, never beyond [`DifficultyBand::FULL`].
    pub fn widened(&self, step: f64) -> Self {
        Self {
            min: (self.min - step).max(Self::FULL.min),
            max: (self.max + step).min(Self::FULL.max),
        }
    }
}

/// A word that can be placed in a slot. Immutable once the index is built.
pub struct WordEntry {
    pub id: String,
    /// Normalized uppercase answer.
    pub answer: String,
    /// `answer` split into characters, for per-position access.
    pub letters: SmallVec<[char; MAX_SLOT_LENGTH]>,
    pub clue: String,
    pub tier: Tier,
    /// Computed difficulty in `[1.0, 10.0]`, one decimal place.
    pub difficulty_score: f64,
    pub category: String,
    pub tags: Vec<String>,
    /// Mean commonness of the word's letters in `[0, 1]`; higher means more common letters.
    pub letter_frequency_score: f64,
}

impl Debug for WordEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordEntry")
            .field("id", &self.id)
            .field("answer", &self.answer)
            .field("tier", &self.tier)
            .field("difficulty_score", &self.difficulty_score)
            .finish()
    }
}

impl WordEntry {
    fn new(raw: RawWord, letters: SmallVec<[char; MAX_SLOT_LENGTH]>) -> Self {
        let archaic = is_archaic(&raw.category, &raw.tags);
        let difficulty_score = word_difficulty(&letters, raw.difficulty, archaic);
        let letter_frequency_score =
            letters.iter().map(|&c| letter_frequency(c)).sum::<f64>() / letters.len() as f64;

        Self {
            id: raw.id,
            answer: letters.iter().collect(),
            letters,
            clue: raw.clue,
            tier: raw.difficulty,
            difficulty_score,
            category: raw.category,
            tags: raw.tags,
            letter_frequency_score,
        }
    }

    /// Length in letters (not bytes).
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn letter_at(&self, position: usize) -> char {
        self.letters[position]
    }

    pub fn rare_letter_count(&self) -> usize {
        self.letters.iter().filter(|&&c| is_rare_letter(c)).count()
    }
}

/// Lookup structures over the word bank.
#[derive(Default)]
pub struct WordIndex {
    entries: Vec<WordEntry>,

    /// Entry ids indexed by exact word length.
    by_length: Vec<Vec<WordId>>,

    /// For each `(position, letter)`, the set of entries having that letter at that position.
    by_position_letter: HashMap<(usize, char), BitSet>,

    by_tier: HashMap<Tier, Vec<WordId>>,

    by_id: HashMap<String, WordId>,

    /// How many raw records were discarded while building.
    skipped: usize,
}

impl Debug for WordIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordIndex")
            .field("entries", &self.entries.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl WordIndex {
    /// Build the index from raw records. Records whose answer normalizes to fewer than two
    /// letters, contains anything but letters, or repeats an earlier id are discarded.
    pub fn build<I>(raw_words: I) -> WordIndex
    where
        I: IntoIterator<Item = RawWord>,
    {
        let mut index = WordIndex::default();

        for raw in raw_words {
            let Some(letters) = normalize_answer(&raw.answer) else {
                debug!("Skipping word {}: answer {:?} has non-letter characters", raw.id, raw.answer);
                index.skipped += 1;
                continue;
            };
            if letters.len() < MIN_WORD_LENGTH {
                debug!("Skipping word {}: answer {:?} is too short", raw.id, raw.answer);
                index.skipped += 1;
                continue;
            }
            if index.by_id.contains_key(&raw.id) {
                debug!("Skipping word {}: duplicate id", raw.id);
                index.skipped += 1;
                continue;
            }

            let word_id = index.entries.len();
            let entry = WordEntry::new(raw, letters);

            if index.by_length.len() <= entry.len() {
                index.by_length.resize_with(entry.len() + 1, Vec::new);
            }
            index.by_length[entry.len()].push(word_id);

            for (position, &letter) in entry.letters.iter().enumerate() {
                index
                    .by_position_letter
                    .entry((position, letter))
                    .or_default()
                    .insert(word_id);
            }

            index.by_tier.entry(entry.tier).or_default().push(word_id);
            index.by_id.insert(entry.id.clone(), word_id);
            index.entries.push(entry);
        }

        info!(
            "Built word index with {} entries ({} skipped)",
            index.entries.len(),
            index.skipped
        );

        index
    }

    /// Parse a JSON array of [`RawWord`] records and build an index from them.
    pub fn from_json(json: &str) -> Result<WordIndex, WordBankError> {
        let raw_words: Vec<RawWord> = serde_json::from_str(json)?;
        Ok(Self::build(raw_words))
    }

    /// Native-only convenience: read a JSON word bank from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<WordIndex, WordBankError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// An empty index is one that was never built from a word bank.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn entry(&self, word_id: WordId) -> &WordEntry {
        &self.entries[word_id]
    }

    pub fn get(&self, id: &str) -> Option<&WordEntry> {
        self.by_id.get(id).map(|&word_id| &self.entries[word_id])
    }

    /// Ids of every entry with exactly `length` letters, in bank order.
    pub fn ids_of_length(&self, length: usize) -> &[WordId] {
        self.by_length.get(length).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count_of_length(&self, length: usize) -> usize {
        self.ids_of_length(length).len()
    }

    pub fn ids_of_tier(&self, tier: Tier) -> &[WordId] {
        self.by_tier.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The initial solver domain for a slot: every entry of the right length inside the band
    /// that isn't excluded, in bank order.
    pub fn domain_for(
        &self,
        length: usize,
        band: DifficultyBand,
        exclude_ids: &HashSet<String>,
    ) -> Vec<WordId> {
        self.ids_of_length(length)
            .iter()
            .copied()
            .filter(|&word_id| {
                let entry = &self.entries[word_id];
                band.contains(entry.difficulty_score) && !exclude_ids.contains(&entry.id)
            })
            .collect()
    }

    /// All entries of `length` letters consistent with a partial pattern (`None` is a wildcard),
    /// optionally restricted to a difficulty band, minus any excluded ids. A pattern shorter than
    /// `length` leaves the remaining positions open.
    pub fn pattern_match(
        &self,
        pattern: &[Option<char>],
        length: usize,
        band: Option<DifficultyBand>,
        exclude_ids: &HashSet<String>,
    ) -> Vec<&WordEntry> {
        if pattern.iter().skip(length).any(Option::is_some) {
            return Vec::new();
        }

        // Intersect the position/letter sets for every fixed letter in the pattern.
        let mut matching: Option<BitSet> = None;
        for (position, letter) in pattern.iter().enumerate().take(length) {
            let Some(letter) = letter else { continue };
            let Some(word_ids) = self.by_position_letter.get(&(position, *letter)) else {
                return Vec::new();
            };
            match matching.as_mut() {
                Some(matching) => matching.intersect_with(word_ids),
                None => matching = Some(word_ids.clone()),
            }
        }

        self.ids_of_length(length)
            .iter()
            .copied()
            .filter(|&word_id| matching.as_ref().map_or(true, |m| m.contains(word_id)))
            .map(|word_id| &self.entries[word_id])
            .filter(|entry| band.map_or(true, |band| band.contains(entry.difficulty_score)))
            .filter(|entry| !exclude_ids.contains(&entry.id))
            .collect()
    }
}

pub fn is_rare_letter(letter: char) -> bool {
    RARE_LETTERS.contains(&letter)
}

/// Uppercase an answer with Turkish casing (`i` → `İ`, `ı` → `I`), dropping spaces, hyphens and
/// apostrophes. Returns `None` if anything other than a letter remains.
pub fn normalize_answer(raw: &str) -> Option<SmallVec<[char; MAX_SLOT_LENGTH]>> {
    let mut letters = SmallVec::new();

    for c in raw.chars() {
        match c {
            c if c.is_whitespace() => {}
            '-' | '\'' | '’' => {}
            'i' => letters.push('İ'),
            'ı' => letters.push('I'),
            c if c.is_alphabetic() => letters.extend(c.to_uppercase()),
            _ => return None,
        }
    }

    Some(letters)
}

fn is_archaic(category: &str, tags: &[String]) -> bool {
    let matches = |s: &str| ARCHAIC_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m));
    matches(category) || tags.iter().any(|tag| matches(tag))
}

/// Weighted combination of length, source tier, rare-letter ratio and an archaism bonus, clamped
/// to `[1, 10]` and rounded to one decimal.
fn word_difficulty(letters: &[char], tier: Tier, archaic: bool) -> f64 {
    let length_part = letters.len().min(LENGTH_CAP) as f64 / LENGTH_CAP as f64 * LENGTH_WEIGHT;
    let rare_ratio =
        letters.iter().filter(|&&c| is_rare_letter(c)).count() as f64 / letters.len() as f64;
    let archaic_part = if archaic { ARCHAIC_BONUS } else { 0.0 };

    let raw = length_part + tier.weight() + rare_ratio * RARE_LETTER_WEIGHT + archaic_part;
    round_to_tenth(raw.clamp(1.0, 10.0))
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Relative frequency of a letter in Turkish text, scaled so the most common letter (A) is 1.0.
/// Letters outside the table count as 0.
fn letter_frequency(letter: char) -> f64 {
    let percent = match letter {
        'A' => 11.92,
        'E' => 8.91,
        'İ' => 8.60,
        'N' => 7.49,
        'R' => 6.95,
        'L' => 5.75,
        'I' => 5.11,
        'K' => 4.68,
        'D' => 4.63,
        'M' => 3.75,
        'Y' => 3.34,
        'U' => 3.23,
        'T' => 3.01,
        'S' => 3.01,
        'B' => 2.84,
        'O' => 2.47,
        'Ü' => 1.97,
        'Ş' => 1.78,
        'Z' => 1.51,
        'G' => 1.25,
        'H' => 1.21,
        'Ç' => 1.15,
        'Ğ' => 1.13,
        'C' => 0.96,
        'V' => 0.95,
        'P' => 0.89,
        'Ö' => 0.78,
        'F' => 0.46,
        'J' => 0.03,
        _ => 0.0,
    };
    percent / 11.92
}
