//! The constraint solver: AC-3 preprocessing followed by a bounded backtracking search with MRV
//! slot ordering and forward checking.
//!
//! The solver works directly on the `domain` and `assigned` fields of the slots it's given. On
//! success every slot is assigned; on any other outcome the slots are left in an unspecified
//! state and should be thrown away.

use std::cmp::Reverse;
use std::collections::{HashSet, VecDeque};

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, trace};
use serde::Serialize;
use smallvec::SmallVec;

use crate::random::SeededRandom;
use crate::slot::{Intersection, Slot, SlotId};
use crate::trail::DomainTrail;
use crate::word_index::{WordId, WordIndex};

/// Bounds on a single solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverLimits {
    /// Total number of candidate words the search may try.
    pub max_attempts: u64,
    pub time_budget: Duration,
    /// How many (shuffled) candidates to try per slot before giving up on it.
    pub max_candidates: usize,
    pub max_ac3_iterations: usize,
}

impl Default for SolverLimits {
    fn default() -> Self {
        Self {
            max_attempts: 2_000,
            time_budget: Duration::from_secs(3),
            max_candidates: 40,
            max_ac3_iterations: 10_000,
        }
    }
}

/// Why a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Solved,
    /// The search tried everything it was allowed to and found nothing.
    Exhausted,
    AttemptLimit,
    TimedOut,
    /// Arc consistency emptied a domain before search began.
    Inconsistent,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub success: bool,
    pub status: SolveStatus,
    pub attempts_used: u64,
    pub elapsed: Duration,
}

/// A wall-clock deadline.
#[derive(Debug, Clone, Copy)]
struct TimeBudget {
    start: Instant,
    limit: Duration,
}

impl TimeBudget {
    fn new(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }
}

#[derive(Debug)]
struct ConsistencyQueueItem {
    slot_id: SlotId,
    crossings: SmallVec<[Intersection; 4]>,
}

/// Work list for `establish_arc_consistency`: for each slot, the crossings whose other side has
/// changed since the slot was last revised against it.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<ConsistencyQueueItem>,
}

impl ConsistencyQueue {
    fn with_all_arcs(slots: &[Slot]) -> ConsistencyQueue {
        ConsistencyQueue {
            queue: slots
                .iter()
                .filter(|slot| !slot.intersections.is_empty())
                .map(|slot| ConsistencyQueueItem {
                    slot_id: slot.id,
                    crossings: slot.intersections.iter().copied().collect(),
                })
                .collect(),
        }
    }

    fn pop_front(&mut self) -> Option<ConsistencyQueueItem> {
        self.queue.pop_front()
    }

    fn enqueue(&mut self, slot_id: SlotId, crossing: Intersection) {
        let existing_item = self.queue.iter_mut().find(|item| item.slot_id == slot_id);

        if let Some(existing_item) = existing_item {
            if !existing_item.crossings.contains(&crossing) {
                existing_item.crossings.push(crossing);
            }
        } else {
            let mut crossings = SmallVec::new();
            crossings.push(crossing);
            self.queue.push_back(ConsistencyQueueItem { slot_id, crossings });
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArcConsistency {
    Consistent,
    /// Propagation stopped early. The domains are still valid, just not fully pruned.
    IterationCapReached,
    Wipeout { slot_id: SlotId },
    TimedOut,
}

/// Prune every unassigned slot's domain down to words whose letters are supported by each
/// crossing slot (by its assigned word, or by some word still in its domain).
fn establish_arc_consistency(
    index: &WordIndex,
    slots: &mut [Slot],
    limits: &SolverLimits,
    budget: &TimeBudget,
) -> ArcConsistency {
    let mut queue = ConsistencyQueue::with_all_arcs(slots);
    let mut iterations = 0;

    while let Some(ConsistencyQueueItem { slot_id, crossings }) = queue.pop_front() {
        for crossing in crossings {
            if budget.expired() {
                return ArcConsistency::TimedOut;
            }
            if iterations >= limits.max_ac3_iterations {
                debug!("Stopping arc consistency after {iterations} revisions");
                return ArcConsistency::IterationCapReached;
            }
            iterations += 1;

            if slots[slot_id].is_assigned() {
                continue;
            }

            let other = &slots[crossing.other_slot_id];
            let supported: HashSet<char> = match other.assigned {
                Some(word_id) => {
                    HashSet::from([index.entry(word_id).letter_at(crossing.other_position)])
                }
                None => other
                    .domain
                    .iter()
                    .map(|&word_id| index.entry(word_id).letter_at(crossing.other_position))
                    .collect(),
            };

            let slot = &mut slots[slot_id];
            let before = slot.domain.len();
            slot.domain
                .retain(|&word_id| supported.contains(&index.entry(word_id).letter_at(crossing.position)));

            if slot.domain.len() == before {
                continue;
            }

            trace!(
                "Revised slot {} against slot {}: {} -> {} candidates",
                slot_id,
                crossing.other_slot_id,
                before,
                slot.domain.len()
            );

            if slot.domain.is_empty() {
                return ArcConsistency::Wipeout { slot_id };
            }

            // Every other neighbor now has to be rechecked against this slot.
            for neighbor in &slot.intersections {
                if neighbor.other_slot_id != crossing.other_slot_id {
                    queue.enqueue(
                        neighbor.other_slot_id,
                        Intersection {
                            other_slot_id: slot_id,
                            position: neighbor.other_position,
                            other_position: neighbor.position,
                        },
                    );
                }
            }
        }
    }

    trace!("Arc consistency reached after {iterations} revisions");
    ArcConsistency::Consistent
}

/// Reasons the search stops before exhausting its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    AttemptLimit,
    TimedOut,
}

/// The live state of one backtracking search.
struct Search<'a> {
    index: &'a WordIndex,
    rng: &'a mut SeededRandom,
    limits: &'a SolverLimits,
    budget: TimeBudget,
    attempts: u64,
    used_word_ids: BitSet,
    used_answers: HashSet<&'a str>,
    trail: DomainTrail,
}

impl<'a> Search<'a> {
    fn new(index: &'a WordIndex, rng: &'a mut SeededRandom, limits: &'a SolverLimits) -> Self {
        Self {
            index,
            rng,
            limits,
            budget: TimeBudget::new(limits.time_budget),
            attempts: 0,
            used_word_ids: BitSet::with_capacity(index.len()),
            used_answers: HashSet::new(),
            trail: DomainTrail::new(),
        }
    }

    fn run(&mut self, slots: &mut [Slot]) -> SolveStatus {
        let index = self.index;
        for word_id in slots.iter().filter_map(|slot| slot.assigned) {
            self.used_word_ids.insert(word_id);
            self.used_answers.insert(index.entry(word_id).answer.as_str());
        }

        match self.backtrack(slots) {
            Ok(true) => SolveStatus::Solved,
            Ok(false) => SolveStatus::Exhausted,
            Err(Interrupt::AttemptLimit) => SolveStatus::AttemptLimit,
            Err(Interrupt::TimedOut) => SolveStatus::TimedOut,
        }
    }

    /// The unassigned slot with the fewest candidates, preferring the most constrained and then
    /// the lowest id.
    fn select_slot(slots: &[Slot]) -> Option<SlotId> {
        slots
            .iter()
            .filter(|slot| !slot.is_assigned())
            .min_by_key(|slot| (slot.domain.len(), Reverse(slot.intersections.len()), slot.id))
            .map(|slot| slot.id)
    }

    fn backtrack(&mut self, slots: &mut [Slot]) -> Result<bool, Interrupt> {
        if self.budget.expired() {
            return Err(Interrupt::TimedOut);
        }
        if self.attempts >= self.limits.max_attempts {
            return Err(Interrupt::AttemptLimit);
        }

        let Some(slot_id) = Self::select_slot(slots) else {
            return Ok(true);
        };
        if slots[slot_id].domain.is_empty() {
            return Ok(false);
        }

        let mut candidates = slots[slot_id].domain.clone();
        self.rng.shuffle(&mut candidates);
        candidates.truncate(self.limits.max_candidates);

        let index = self.index;
        for word_id in candidates {
            let entry = index.entry(word_id);
            if self.used_word_ids.contains(word_id) || self.used_answers.contains(entry.answer.as_str()) {
                continue;
            }
            if self.attempts >= self.limits.max_attempts {
                return Err(Interrupt::AttemptLimit);
            }
            self.attempts += 1;

            let checkpoint = self.trail.checkpoint();
            slots[slot_id].assigned = Some(word_id);
            self.used_word_ids.insert(word_id);
            self.used_answers.insert(entry.answer.as_str());

            if self.forward_check(slots, slot_id, word_id) && self.backtrack(slots)? {
                return Ok(true);
            }

            slots[slot_id].assigned = None;
            self.used_word_ids.remove(word_id);
            self.used_answers.remove(entry.answer.as_str());
            self.trail.rewind(checkpoint, slots);
        }

        Ok(false)
    }

    /// Narrow every unassigned neighbor of `slot_id` to words agreeing with `word_id` at the shared
    /// cell, recording the old domains on the trail. Returns false if an assigned neighbor
    /// disagrees or a neighbor runs out of candidates.
    fn forward_check(&mut self, slots: &mut [Slot], slot_id: SlotId, word_id: WordId) -> bool {
        let index = self.index;
        let entry = index.entry(word_id);
        let crossings = slots[slot_id].intersections.clone();

        for crossing in crossings {
            let letter = entry.letter_at(crossing.position);
            let other = &mut slots[crossing.other_slot_id];

            match other.assigned {
                Some(other_word_id) => {
                    if index.entry(other_word_id).letter_at(crossing.other_position) != letter {
                        return false;
                    }
                }
                None => {
                    let narrowed: Vec<WordId> = other
                        .domain
                        .iter()
                        .copied()
                        .filter(|&candidate| {
                            index.entry(candidate).letter_at(crossing.other_position) == letter
                        })
                        .collect();

                    if narrowed.len() != other.domain.len() {
                        let previous = std::mem::replace(&mut other.domain, narrowed);
                        self.trail.record(other.id, previous);
                    }
                    if other.domain.is_empty() {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Fill every slot with a word from its domain such that crossing slots agree and no word (by id
/// or by answer) is used twice. Candidate order comes from `rng`, so a given seed always produces
/// the same fill.
pub fn solve(
    index: &WordIndex,
    slots: &mut [Slot],
    rng: &mut SeededRandom,
    limits: &SolverLimits,
) -> SolveOutcome {
    let mut search = Search::new(index, rng, limits);

    let status = match establish_arc_consistency(index, slots, limits, &search.budget) {
        ArcConsistency::Wipeout { slot_id } => {
            debug!("Arc consistency left slot {slot_id} without candidates");
            SolveStatus::Inconsistent
        }
        ArcConsistency::TimedOut => SolveStatus::TimedOut,
        ArcConsistency::Consistent | ArcConsistency::IterationCapReached => search.run(slots),
    };

    let outcome = SolveOutcome {
        success: status == SolveStatus::Solved,
        status,
        attempts_used: search.attempts,
        elapsed: search.budget.elapsed(),
    };

    debug!(
        "Solve finished: {:?} after {} attempts in {:?}",
        outcome.status, outcome.attempts_used, outcome.elapsed
    );

    outcome
}

/// Check that a slot set is a complete, valid fill: every slot assigned a word of the right
/// length, every crossing agreeing, and no word or answer repeated.
pub fn is_consistent(index: &WordIndex, slots: &[Slot]) -> bool {
    let mut seen_ids = BitSet::with_capacity(index.len());
    let mut seen_answers: HashSet<&str> = HashSet::new();

    for slot in slots {
        let Some(word_id) = slot.assigned else {
            return false;
        };
        let entry = index.entry(word_id);

        if entry.len() != slot.length {
            return false;
        }
        if !seen_ids.insert(word_id) || !seen_answers.insert(entry.answer.as_str()) {
            return false;
        }

        for crossing in &slot.intersections {
            let Some(other_word_id) = slots[crossing.other_slot_id].assigned else {
                return false;
            };
            if index.entry(other_word_id).letter_at(crossing.other_position)
                != entry.letter_at(crossing.position)
            {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{extract_slots, slots_from_cells};
    use crate::template::TemplateRegistry;
    use crate::test_support::{cells_from_rows, planted_bank, raw_word};
    use crate::word_index::{DifficultyBand, Tier};

    fn prepared_slots(index: &WordIndex, rows: &[&str]) -> Vec<Slot> {
        let mut slots = slots_from_cells(&cells_from_rows(rows));
        for slot in &mut slots {
            slot.domain = index.domain_for(slot.length, DifficultyBand::FULL, &HashSet::new());
        }
        slots
    }

    fn answer_of<'a>(index: &'a WordIndex, slot: &Slot) -> &'a str {
        slot.assigned.map(|word_id| index.entry(word_id).answer.as_str()).unwrap_or("")
    }

    /// ...
    /// .##
    /// .##
    #[test]
    fn test_fills_two_slots_sharing_a_letter() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "KUŞ", Tier::Easy),
            raw_word("3", "ARABA", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##"]);
        assert!(slots.iter().all(|slot| slot.domain == vec![0, 1]));

        let outcome = solve(&index, &mut slots, &mut SeededRandom::new(42), &SolverLimits::default());

        assert!(outcome.success);
        assert_eq!(outcome.status, SolveStatus::Solved);
        assert!(is_consistent(&index, &slots));

        let mut answers = vec![answer_of(&index, &slots[0]), answer_of(&index, &slots[1])];
        answers.sort();
        assert_eq!(answers, vec!["KOD", "KUŞ"]);
    }

    /// ...
    /// .##
    /// .##
    /// .##
    #[test]
    fn test_arc_consistency_prunes_unsupported_words() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "TAŞ", Tier::Easy),
            raw_word("3", "KAYA", Tier::Easy),
            raw_word("4", "KUZU", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##", ".##"]);
        assert_eq!(slots[0].domain, vec![0, 1]);

        let result = establish_arc_consistency(
            &index,
            &mut slots,
            &SolverLimits::default(),
            &TimeBudget::new(Duration::from_secs(3)),
        );

        assert_eq!(result, ArcConsistency::Consistent);
        assert_eq!(slots[0].domain, vec![0]);
        assert_eq!(slots[1].domain, vec![2, 3]);
    }

    #[test]
    fn test_arc_consistency_wipeout_fails_before_search() {
        let index = WordIndex::build(vec![
            raw_word("1", "TAŞ", Tier::Easy),
            raw_word("2", "KAYA", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##", ".##"]);

        let outcome = solve(&index, &mut slots, &mut SeededRandom::new(1), &SolverLimits::default());

        assert!(!outcome.success);
        assert_eq!(outcome.status, SolveStatus::Inconsistent);
        assert_eq!(outcome.attempts_used, 0);
    }

    #[test]
    fn test_arc_consistency_iteration_cap() {
        let index = WordIndex::build(vec![
            raw_word("1", "TAŞ", Tier::Easy),
            raw_word("2", "KAYA", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##", ".##"]);
        let limits = SolverLimits {
            max_ac3_iterations: 0,
            ..SolverLimits::default()
        };

        let result = establish_arc_consistency(
            &index,
            &mut slots,
            &limits,
            &TimeBudget::new(Duration::from_secs(3)),
        );

        assert_eq!(result, ArcConsistency::IterationCapReached);
        assert_eq!(slots[0].domain, vec![0]);
    }

    #[test]
    fn test_attempt_limit_stops_search() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "KUŞ", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##"]);
        let limits = SolverLimits {
            max_attempts: 0,
            ..SolverLimits::default()
        };

        let outcome = solve(&index, &mut slots, &mut SeededRandom::new(1), &limits);

        assert!(!outcome.success);
        assert_eq!(outcome.status, SolveStatus::AttemptLimit);
        assert_eq!(outcome.attempts_used, 0);
    }

    #[test]
    fn test_zero_time_budget_times_out() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "KUŞ", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##"]);
        let limits = SolverLimits {
            time_budget: Duration::ZERO,
            ..SolverLimits::default()
        };

        let outcome = solve(&index, &mut slots, &mut SeededRandom::new(1), &limits);

        assert!(!outcome.success);
        assert_eq!(outcome.status, SolveStatus::TimedOut);
    }

    /// Two entries share the answer KOD, so the grid can't be filled without repeating it.
    #[test]
    fn test_never_repeats_an_answer() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "KOD", Tier::Medium),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##"]);

        let outcome = solve(&index, &mut slots, &mut SeededRandom::new(5), &SolverLimits::default());

        assert!(!outcome.success);
        assert_eq!(outcome.status, SolveStatus::Exhausted);
        assert_eq!(outcome.attempts_used, 2);
    }

    #[test]
    fn test_fills_builtin_template_deterministically() {
        let registry = TemplateRegistry::builtin();
        let template = registry.get("classic-7a").unwrap();
        let index = WordIndex::build(planted_bank(&[template], 8, 11));

        let fill = |seed| {
            let mut slots = extract_slots(template);
            for slot in &mut slots {
                slot.domain = index.domain_for(slot.length, DifficultyBand::FULL, &HashSet::new());
            }
            let outcome = solve(&index, &mut slots, &mut SeededRandom::new(seed), &SolverLimits::default());
            println!("{:?}", outcome);
            (outcome, slots)
        };

        let (outcome, slots) = fill(42);
        assert!(outcome.success, "{:?}", outcome);
        assert!(outcome.attempts_used <= SolverLimits::default().max_attempts);
        assert!(is_consistent(&index, &slots));

        let (_, again) = fill(42);
        let assignments = |slots: &[Slot]| slots.iter().map(|s| s.assigned).collect::<Vec<_>>();
        assert_eq!(assignments(&slots), assignments(&again));
    }

    #[test]
    fn test_fills_every_builtin_template() {
        let registry = TemplateRegistry::builtin();
        assert_eq!(registry.all().len(), 12);

        for template in registry.all() {
            let index = WordIndex::build(planted_bank(&[template], 8, 11));

            for seed in 1..=3 {
                let mut slots = extract_slots(template);
                for slot in &mut slots {
                    slot.domain = index.domain_for(slot.length, DifficultyBand::FULL, &HashSet::new());
                }
                let outcome = solve(&index, &mut slots, &mut SeededRandom::new(seed), &SolverLimits::default());

                assert!(outcome.success, "{} seed {}: {:?}", template.id(), seed, outcome);
                assert!(is_consistent(&index, &slots), "{} seed {}", template.id(), seed);
                assert_eq!(slots.len(), template.slot_count());
            }
        }
    }

    #[test]
    fn test_is_consistent_rejects_bad_fills() {
        let index = WordIndex::build(vec![
            raw_word("1", "KOD", Tier::Easy),
            raw_word("2", "KUŞ", Tier::Easy),
            raw_word("3", "TAŞ", Tier::Easy),
        ]);
        let mut slots = prepared_slots(&index, &["...", ".##", ".##"]);

        slots[0].assigned = Some(0);
        assert!(!is_consistent(&index, &slots), "unassigned slot");

        slots[1].assigned = Some(2);
        assert!(!is_consistent(&index, &slots), "crossing disagrees");

        slots[1].assigned = Some(0);
        assert!(!is_consistent(&index, &slots), "repeated word");

        slots[1].assigned = Some(1);
        assert!(is_consistent(&index, &slots));
    }

    #[test]
    fn test_consistency_queue_merges_crossings_per_slot() {
        let crossing = |other_slot_id, position| Intersection {
            other_slot_id,
            position,
            other_position: 0,
        };

        let mut queue = ConsistencyQueue { queue: VecDeque::new() };
        queue.enqueue(3, crossing(1, 0));
        queue.enqueue(4, crossing(1, 2));
        queue.enqueue(3, crossing(2, 1));
        queue.enqueue(3, crossing(1, 0));

        assert_eq!(queue.queue.len(), 2);
        let first = queue.pop_front().unwrap();
        assert_eq!(first.slot_id, 3);
        assert_eq!(first.crossings.as_slice(), &[crossing(1, 0), crossing(2, 1)]);
    }
}
