use crate::crossword::Crossword;
use crate::heuristics::CandidateChooser;
use crate::{SlotId, WordId};

/// How many viable candidates the least-constraining chooser compares by default.
pub const DEFAULT_MAX_COMPARED_CANDIDATES: usize = 10;

/// Picks the first candidate, in lexicographic order, after which every connected slot keeps at
/// least one candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstViable;

impl CandidateChooser for FirstViable {
    fn find(&mut self, crossword: &mut Crossword, slot_id: SlotId) -> Option<WordId> {
        let candidates = crossword.candidates(slot_id);
        let mut probe = crossword.probe();
        candidates
            .into_iter()
            .find(|&word_id| probe.has_solution_after_assignment(slot_id, word_id))
    }
}

/// Compares the first few viable candidates by the estimated number of local solutions they leave
/// and picks the one leaving the most. Ties go to the lexicographically greatest word.
#[derive(Debug, Clone, Copy)]
pub struct LeastConstraining {
    pub max_compared: usize,
}

impl Default for LeastConstraining {
    fn default() -> Self {
        LeastConstraining {
            max_compared: DEFAULT_MAX_COMPARED_CANDIDATES,
        }
    }
}

impl CandidateChooser for LeastConstraining {
    fn find(&mut self, crossword: &mut Crossword, slot_id: SlotId) -> Option<WordId> {
        let candidates = crossword.candidates(slot_id);
        let mut probe = crossword.probe();
        candidates
            .into_iter()
            .map(|word_id| (probe.local_solutions_after(slot_id, word_id), word_id))
            .filter(|&(solutions, _)| solutions > 0)
            .take(self.max_compared.max(1))
            .max()
            .map(|(_, word_id)| word_id)
    }
}
