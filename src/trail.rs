//! Undo log for domain pruning during search.

use crate::slot::{Slot, SlotId};
use crate::word_index::WordId;

/// A position in the trail that a later `rewind` can return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint(usize);

/// Records each slot's domain before forward checking narrows it, so that backtracking can
/// restore exactly what was there. Entries are undone in reverse order.
#[derive(Debug, Default)]
pub(crate) struct DomainTrail {
    entries: Vec<(SlotId, Vec<WordId>)>,
}

impl DomainTrail {
    pub fn new() -> DomainTrail {
        DomainTrail::default()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.entries.len())
    }

    /// Remember `previous` as the domain `slot_id` had before the current change.
    pub fn record(&mut self, slot_id: SlotId, previous: Vec<WordId>) {
        self.entries.push((slot_id, previous));
    }

    /// Restore every domain recorded since `checkpoint`.
    pub fn rewind(&mut self, checkpoint: Checkpoint, slots: &mut [Slot]) {
        while self.entries.len() > checkpoint.0 {
            if let Some((slot_id, previous)) = self.entries.pop() {
                slots[slot_id].domain = previous;
            }
        }
    }
}
