//! The strategies driving the search: which slot to fill next, which word to fill it with, and
//! which assignments to retract on a dead-end.

use crate::crossword::Crossword;
use crate::elimination::Elimination;
use crate::{SlotId, WordId};

pub mod backtrack;
pub mod candidate;
pub mod slot;

pub use backtrack::{Backjumper, ChronologicalBacktracker, ConflictDirected, DynamicBacktracker};
pub use candidate::{FirstViable, LeastConstraining, DEFAULT_MAX_COMPARED_CANDIDATES};
pub use slot::MostConstrainedFirst;

/// Picks the next slot to fill, among the unfilled ones.
pub trait SlotSelector {
    fn next_slot(&mut self, crossword: &mut Crossword) -> Option<SlotId>;
}

/// Picks a value for a slot without touching the live grid. `None` means the slot is a dead-end.
pub trait CandidateChooser {
    fn find(&mut self, crossword: &mut Crossword, slot_id: SlotId) -> Option<WordId>;
}

/// Decides which assigned slots to retract when a slot can't be assigned. An empty list means
/// that no retraction can help, i.e. the grid has no solution.
pub trait Backtracker {
    fn backtrack_from(&mut self, crossword: &mut Crossword, unassignable: SlotId)
        -> Vec<Elimination>;
}
