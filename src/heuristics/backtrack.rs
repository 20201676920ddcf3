use std::cmp::Reverse;
use std::collections::HashMap;

use bit_set::BitSet;
use log::debug;

use crate::crossword::Crossword;
use crate::elimination::Elimination;
use crate::heuristics::Backtracker;
use crate::{SlotId, WordId};

/// Retracts the fewest assignments that make the dead-end slot assignable again, looking first at
/// the assigned slots crossing it, then at the assigned slots crossing its unassigned neighbours,
/// then at the other slots that hold the dead-end area back. Each retracted value is eliminated
/// because of the candidates that were kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicBacktracker;

impl DynamicBacktracker {
    /// The slots worth retracting, most promising first: assigned neighbours, then assigned slots
    /// at distance 2 through an unassigned neighbour, then the slots holding a word the dead-end
    /// area could take or justifying one of its eliminations. Each group is most recently
    /// assigned first.
    ///
    /// Every assignment that keeps the dead-end slot or its unassigned neighbours from a word is
    /// in there, so retracting all of them leaves nothing but permanent eliminations in the way.
    pub(crate) fn candidates_from(crossword: &Crossword, unassignable: SlotId) -> Vec<SlotId> {
        let grid = &crossword.grid;
        let history = &crossword.history;
        let by_recency = |slot_id: &SlotId| Reverse(history.assignment_number(*slot_id));

        let mut seen = BitSet::with_capacity(grid.slot_count());
        let mut take = |slot_id: SlotId| grid.is_assigned(slot_id) && seen.insert(slot_id);

        let mut direct: Vec<SlotId> = grid
            .connected_slots(unassignable)
            .iter()
            .cloned()
            .filter(|&slot_id| take(slot_id))
            .collect();
        direct.sort_by_key(by_recency);

        let area: Vec<SlotId> = std::iter::once(unassignable)
            .chain(
                grid.connected_slots(unassignable)
                    .iter()
                    .cloned()
                    .filter(|&slot_id| !grid.is_assigned(slot_id)),
            )
            .collect();

        let mut indirect: Vec<SlotId> = vec![];
        for &neighbour in &area[1..] {
            for &slot_id in grid.connected_slots(neighbour) {
                if take(slot_id) {
                    indirect.push(slot_id);
                }
            }
        }
        indirect.sort_by_key(by_recency);

        let holders: HashMap<WordId, SlotId> = grid
            .slot_ids()
            .filter_map(|slot_id| grid.value(slot_id).map(|word_id| (word_id, slot_id)))
            .collect();
        let mut others: Vec<SlotId> = vec![];
        for &slot_id in &area {
            for word_id in crossword.dictionary.reevaluated_candidates(grid, slot_id) {
                if let Some(&holder) = holders.get(&word_id) {
                    if take(holder) {
                        others.push(holder);
                    }
                }
            }
            for reasons in crossword.eliminations.eliminations(slot_id).values() {
                for reason in reasons.iter() {
                    if reason < grid.slot_count() && take(reason) {
                        others.push(reason);
                    }
                }
            }
        }
        others.sort_by_key(by_recency);

        direct.extend(indirect);
        direct.extend(others);
        direct
    }

    /// The first single candidate whose retraction helps, or else the shortest prefix of the
    /// candidates whose combined retraction does. Empty if nothing helps.
    fn choose(crossword: &mut Crossword, candidates: &[SlotId], unassignable: SlotId) -> Vec<SlotId> {
        let mut probe = crossword.probe();

        if let Some(&slot_id) = candidates
            .iter()
            .find(|&&slot_id| probe.has_solution_after_unassignments(&[slot_id], unassignable))
        {
            return vec![slot_id];
        }

        debug!("No single retraction unblocks slot {}, trying to backjump", unassignable);
        for end in 2..=candidates.len() {
            let combination = &candidates[..end];
            debug!("Trying combined retraction of {:?}", combination);
            if probe.has_solution_after_unassignments(combination, unassignable) {
                return combination.to_vec();
            }
        }

        vec![]
    }
}

impl Backtracker for DynamicBacktracker {
    fn backtrack_from(&mut self, crossword: &mut Crossword, unassignable: SlotId) -> Vec<Elimination> {
        debug!("Slot {} is not assignable, looking for a backtrack point", unassignable);

        let candidates = DynamicBacktracker::candidates_from(crossword, unassignable);
        debug!("Backtrack candidates: {:?}", candidates);

        let chosen = DynamicBacktracker::choose(crossword, &candidates, unassignable);
        if chosen.is_empty() {
            debug!("No retraction unblocks slot {}", unassignable);
            return vec![];
        }

        let reasons: BitSet = candidates
            .iter()
            .cloned()
            .filter(|slot_id| !chosen.contains(slot_id))
            .collect();
        let global_reason = crossword.eliminations.global_reason();

        let eliminations: Vec<Elimination> = chosen
            .into_iter()
            .map(|slot_id| Elimination::new(slot_id, reasons.clone(), global_reason))
            .collect();
        debug!("Backtrack gave the following eliminations: {:?}", eliminations);
        eliminations
    }
}

/// Retracts the most recently assigned of the slots holding the dead-end slot back, eliminating
/// its value because of all the others. Every elimination it records is a consequence of the
/// assignments it names, and those are always older than the slot they apply to, so the search
/// can neither miss a fill nor come back to a state it has left.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictDirected;

impl Backtracker for ConflictDirected {
    fn backtrack_from(&mut self, crossword: &mut Crossword, unassignable: SlotId) -> Vec<Elimination> {
        let mut culprits = DynamicBacktracker::candidates_from(crossword, unassignable);
        let history = &crossword.history;
        let Some(latest) = culprits
            .iter()
            .cloned()
            .max_by_key(|&slot_id| history.assignment_number(slot_id))
        else {
            debug!("Nothing holds slot {} back", unassignable);
            return vec![];
        };

        culprits.retain(|&slot_id| slot_id != latest);
        let elimination = Elimination::new(
            latest,
            culprits.into_iter().collect(),
            crossword.eliminations.global_reason(),
        );
        debug!("Dead-end on slot {} resolved by {:?}", unassignable, elimination);
        vec![elimination]
    }
}

/// Retracts the most recent assignment, whatever it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronologicalBacktracker;

impl Backtracker for ChronologicalBacktracker {
    fn backtrack_from(&mut self, crossword: &mut Crossword, unassignable: SlotId) -> Vec<Elimination> {
        crossword
            .history
            .last_assigned_slot()
            .map(|slot_id| vec![elimination_of(crossword, slot_id, unassignable)])
            .unwrap_or_default()
    }
}

/// Retracts every assignment made since the most recent one crossing the dead-end slot, that one
/// included.
#[derive(Debug, Default, Clone, Copy)]
pub struct Backjumper;

impl Backtracker for Backjumper {
    fn backtrack_from(&mut self, crossword: &mut Crossword, unassignable: SlotId) -> Vec<Elimination> {
        let mut eliminations = vec![];
        for slot_id in crossword.history.most_recent_first() {
            eliminations.push(elimination_of(crossword, slot_id, unassignable));
            if crossword.grid.is_connected(unassignable, slot_id) {
                break;
            }
        }
        eliminations
    }
}

/// An elimination explained by the slots crossing the dead-end slot.
fn elimination_of(crossword: &Crossword, slot_id: SlotId, unassignable: SlotId) -> Elimination {
    let reasons: BitSet = crossword
        .grid
        .connected_slots(unassignable)
        .iter()
        .cloned()
        .collect();
    Elimination::new(slot_id, reasons, crossword.eliminations.global_reason())
}
