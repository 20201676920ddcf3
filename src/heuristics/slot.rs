use crate::crossword::Crossword;
use crate::heuristics::SlotSelector;
use crate::SlotId;

/// Picks the unfilled slot with the fewest candidates, the lowest id winning ties.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostConstrainedFirst;

impl SlotSelector for MostConstrainedFirst {
    fn next_slot(&mut self, crossword: &mut Crossword) -> Option<SlotId> {
        let unfilled: Vec<SlotId> = crossword.grid.unfilled_slots().collect();
        unfilled
            .into_iter()
            .min_by_key(|&slot_id| (crossword.candidates_count(slot_id), slot_id))
    }
}
