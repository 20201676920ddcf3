use crate::SlotId;

/// The temporal order of the assignments currently in the grid, used to rank backtrack
/// candidates by recency.
#[derive(Debug, Default, Clone)]
pub struct History {
    /// Assigned slots with the step at which they were assigned, oldest first.
    entries: Vec<(SlotId, u64)>,
    next_step: u64,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    pub fn add_assignment(&mut self, slot_id: SlotId) {
        self.remove_assignment(slot_id);
        self.entries.push((slot_id, self.next_step));
        self.next_step += 1;
    }

    pub fn remove_assignment(&mut self, slot_id: SlotId) {
        self.entries.retain(|&(assigned, _)| assigned != slot_id);
    }

    /// The step at which the slot was assigned, if it currently is.
    pub fn assignment_number(&self, slot_id: SlotId) -> Option<u64> {
        self.entries
            .iter()
            .find(|&&(assigned, _)| assigned == slot_id)
            .map(|&(_, step)| step)
    }

    pub fn last_assigned_slot(&self) -> Option<SlotId> {
        self.entries.last().map(|&(slot_id, _)| slot_id)
    }

    /// Assigned slots, most recent first.
    pub fn most_recent_first(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.entries.iter().rev().map(|&(slot_id, _)| slot_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
