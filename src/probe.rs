use bit_set::BitSet;

use crate::dictionary::CachedDictionary;
use crate::elimination::EliminationSpace;
use crate::grid::Grid;
use crate::{SlotId, WordId};

/// An isolated copy of the grid used to try assignments and unassignments without touching the
/// live search state. Every query leaves the copy exactly as it found it.
pub struct Probe<'a> {
    grid: Grid,
    dictionary: &'a mut CachedDictionary,
    eliminations: &'a EliminationSpace,
}

impl<'a> Probe<'a> {
    pub fn new(
        grid: &Grid,
        dictionary: &'a mut CachedDictionary,
        eliminations: &'a EliminationSpace,
    ) -> Probe<'a> {
        Probe {
            grid: grid.clone(),
            dictionary,
            eliminations,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Estimate the number of solutions for the part of the grid impacted by assigning the word
    /// to the slot: the product of the candidate counts of the unassigned connected slots, which
    /// are treated as independent. A positive estimate doesn't guarantee that a solution exists.
    pub fn local_solutions_after(&mut self, slot_id: SlotId, word_id: WordId) -> u128 {
        self.grid.assign(slot_id, word_id, &self.dictionary.word(word_id).glyphs);

        let mut solutions: u128 = 1;
        for &connected in self.grid.connected_slots(slot_id) {
            if self.grid.is_assigned(connected) {
                continue;
            }
            let count = self.dictionary.count_candidates(
                &self.grid,
                connected,
                self.eliminations,
                Some(word_id),
            );
            solutions = solutions.saturating_mul(count as u128);
            if solutions == 0 {
                break;
            }
        }

        self.grid.unassign(slot_id);
        solutions
    }

    /// Would every slot connected to the given one keep at least one candidate after assigning
    /// it the word?
    pub fn has_solution_after_assignment(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.local_solutions_after(slot_id, word_id) > 0
    }

    /// Would the unassignable slot become assignable again if the given slots were unassigned?
    ///
    /// Eliminations justified by any of the unassigned slots are lifted for the duration of the
    /// query, and the values those slots held are considered available again.
    pub fn has_solution_after_unassignments(
        &mut self,
        unassignments: &[SlotId],
        unassignable: SlotId,
    ) -> bool {
        let mut modified = BitSet::with_capacity(self.grid.slot_count());
        let mut freed: Vec<(SlotId, WordId)> = Vec::with_capacity(unassignments.len());
        for &slot_id in unassignments {
            if let Some(word_id) = self.grid.unassign(slot_id) {
                freed.push((slot_id, word_id));
            }
            modified.insert(slot_id);
        }

        let dictionary = &*self.dictionary;
        let eliminations = self.eliminations;
        let has_solution = dictionary
            .reevaluated_candidates(&self.grid, unassignable)
            .any(|word_id| {
                let available = !dictionary.is_in_use(word_id)
                    || freed.iter().any(|&(_, freed_word_id)| freed_word_id == word_id);
                available && !eliminations.is_eliminated_after(unassignable, word_id, &modified)
            });

        for &(slot_id, word_id) in freed.iter().rev() {
            self.grid.assign(slot_id, word_id, &self.dictionary.word(word_id).glyphs);
        }

        has_solution
    }
}
