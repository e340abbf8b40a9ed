//! Slot extraction: turning a template's white cells into the across/down runs the solver fills.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

use crate::template::GridTemplate;
use crate::word_index::WordId;
use crate::{MAX_SLOT_LENGTH, MIN_WORD_LENGTH};

/// An identifier for a given slot, based on its index in the extracted slot list.
pub type SlotId = usize;

/// Zero-indexed `(row, col)` coordinates for a cell in the grid.
pub type GridCoord = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// The letter appended to a clue number to form a word's public id.
    pub fn suffix(self) -> char {
        match self {
            Direction::Across => 'A',
            Direction::Down => 'D',
        }
    }
}

/// A crossing between one slot and another, from the point of view of the slot holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intersection {
    pub other_slot_id: SlotId,
    /// Index of the shared cell within this slot.
    pub position: usize,
    /// Index of the shared cell within the other slot.
    pub other_position: usize,
}

/// A maximal run of white cells, plus the live state the solver keeps for it. Slots are scratch
/// state: a fresh set is extracted for every fill attempt.
#[derive(Clone)]
pub struct Slot {
    pub id: SlotId,
    pub direction: Direction,
    pub start: GridCoord,
    pub length: usize,
    pub cells: SmallVec<[GridCoord; MAX_SLOT_LENGTH]>,
    pub intersections: SmallVec<[Intersection; MAX_SLOT_LENGTH]>,
    pub assigned: Option<WordId>,
    /// Remaining candidate words.
    pub domain: Vec<WordId>,
}

impl Debug for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("start", &self.start)
            .field("length", &self.length)
            .field("crossings", &self.intersections.len())
            .field("assigned", &self.assigned)
            .field("domain_size", &self.domain.len())
            .finish()
    }
}

impl Slot {
    pub fn is_assigned(&self) -> bool {
        self.assigned.is_some()
    }
}

/// One maximal run of at least two white cells, in the order its cells are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Run {
    pub direction: Direction,
    pub cells: SmallVec<[GridCoord; MAX_SLOT_LENGTH]>,
}

/// Find every across run (row by row) followed by every down run (column by column) in a
/// rectangular white/black matrix.
pub(crate) fn find_runs(cells: &[Vec<bool>]) -> Vec<Run> {
    fn scan_lines(lines: &[Vec<bool>]) -> Vec<SmallVec<[GridCoord; MAX_SLOT_LENGTH]>> {
        let mut result = vec![];

        for (line_idx, line) in lines.iter().enumerate() {
            let mut current: SmallVec<[GridCoord; MAX_SLOT_LENGTH]> = SmallVec::new();

            for (cell_idx, &white) in line.iter().enumerate() {
                if white {
                    current.push((line_idx, cell_idx));
                } else {
                    if current.len() >= MIN_WORD_LENGTH {
                        result.push(current.clone());
                    }
                    current.clear();
                }
            }

            if current.len() >= MIN_WORD_LENGTH {
                result.push(current);
            }
        }

        result
    }

    let width = cells.first().map_or(0, Vec::len);

    let mut runs: Vec<Run> = scan_lines(cells)
        .into_iter()
        .map(|cells| Run { direction: Direction::Across, cells })
        .collect();

    let transposed: Vec<Vec<bool>> = (0..width)
        .map(|col| cells.iter().map(|row| row[col]).collect())
        .collect();

    runs.extend(scan_lines(&transposed).into_iter().map(|cells| Run {
        direction: Direction::Down,
        cells: cells.into_iter().map(|(col, row)| (row, col)).collect(),
    }));

    runs
}

/// Build slots (with symmetric intersections, no domains yet) from a white/black matrix.
pub(crate) fn slots_from_cells(cells: &[Vec<bool>]) -> Vec<Slot> {
    let width = cells.first().map_or(0, Vec::len);

    let mut slots: Vec<Slot> = find_runs(cells)
        .into_iter()
        .enumerate()
        .map(|(id, run)| Slot {
            id,
            direction: run.direction,
            start: run.cells[0],
            length: run.cells.len(),
            cells: run.cells,
            intersections: SmallVec::new(),
            assigned: None,
            domain: vec![],
        })
        .collect();

    // For each cell, the across slot covering it and the position within that slot.
    let mut across_owner: Vec<Option<(SlotId, usize)>> = vec![None; cells.len() * width];
    for slot in slots.iter().filter(|slot| slot.direction == Direction::Across) {
        for (position, &(row, col)) in slot.cells.iter().enumerate() {
            across_owner[row * width + col] = Some((slot.id, position));
        }
    }

    let mut crossings: Vec<(SlotId, SlotId, usize, usize)> = vec![];
    for slot in slots.iter().filter(|slot| slot.direction == Direction::Down) {
        for (position, &(row, col)) in slot.cells.iter().enumerate() {
            if let Some((across_id, across_position)) = across_owner[row * width + col] {
                crossings.push((across_id, slot.id, across_position, position));
            }
        }
    }

    for (across_id, down_id, across_position, down_position) in crossings {
        slots[across_id].intersections.push(Intersection {
            other_slot_id: down_id,
            position: across_position,
            other_position: down_position,
        });
        slots[down_id].intersections.push(Intersection {
            other_slot_id: across_id,
            position: down_position,
            other_position: across_position,
        });
    }

    for slot in &mut slots {
        slot.intersections.sort_by_key(|i| i.position);
    }

    slots
}

/// Extract a fresh set of slots from a template. Ids are dense: across slots in reading order,
/// then down slots column by column.
pub fn extract_slots(template: &GridTemplate) -> Vec<Slot> {
    slots_from_cells(template.cells())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cells_from_rows;

    #[test]
    fn test_extracts_runs_of_two_or_more() {
        let slots = slots_from_cells(&cells_from_rows(&["...", ".##", ".##"]));

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].direction, Direction::Across);
        assert_eq!(slots[0].start, (0, 0));
        assert_eq!(slots[0].length, 3);
        assert_eq!(slots[1].direction, Direction::Down);
        assert_eq!(slots[1].cells.as_slice(), &[(0, 0), (1, 0), (2, 0)]);

        assert_eq!(
            slots[0].intersections.as_slice(),
            &[Intersection { other_slot_id: 1, position: 0, other_position: 0 }]
        );
        assert_eq!(
            slots[1].intersections.as_slice(),
            &[Intersection { other_slot_id: 0, position: 0, other_position: 0 }]
        );
    }

    #[test]
    fn test_splits_runs_at_blocks() {
        let slots = slots_from_cells(&cells_from_rows(&["..#..", ".....", "..#.."]));

        let across: Vec<(GridCoord, usize)> = slots
            .iter()
            .filter(|s| s.direction == Direction::Across)
            .map(|s| (s.start, s.length))
            .collect();
        assert_eq!(
            across,
            vec![((0, 0), 2), ((0, 3), 2), ((1, 0), 5), ((2, 0), 2), ((2, 3), 2)]
        );

        // Column 2 is a single white cell between blocks: no down slot there.
        assert!(slots.iter().all(|s| s.direction == Direction::Across || s.start.1 != 2));
        assert_eq!(slots.iter().filter(|s| s.direction == Direction::Down).count(), 4);
    }

    #[test]
    fn test_intersections_are_symmetric() {
        let slots = slots_from_cells(&cells_from_rows(&[
            "...#...", ".#.#.#.", ".......", "##.#.##", ".......", ".#.#.#.", "...#...",
        ]));

        for (id, slot) in slots.iter().enumerate() {
            assert_eq!(slot.id, id);
            for intersection in &slot.intersections {
                let other = &slots[intersection.other_slot_id];
                assert_ne!(other.direction, slot.direction);
                assert_eq!(slot.cells[intersection.position], other.cells[intersection.other_position]);
                assert!(other.intersections.contains(&Intersection {
                    other_slot_id: slot.id,
                    position: intersection.other_position,
                    other_position: intersection.position,
                }));
            }
        }
    }

    #[test]
    fn test_direction_suffixes() {
        assert_eq!(Direction::Across.suffix(), 'A');
        assert_eq!(Direction::Down.suffix(), 'D');
        assert!(Direction::Across < Direction::Down);
    }
}
