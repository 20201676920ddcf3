use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

use bit_set::BitSet;

use crate::{SlotId, WordId};

/// A decision to unassign a slot, explained by the slots whose current assignments made its value
/// unworkable. The value the slot holds when the elimination is applied becomes forbidden for it
/// until one of the reason slots changes.
#[derive(Clone, PartialEq, Eq)]
pub struct Elimination {
    pub slot_id: SlotId,
    pub reasons: BitSet,
}

impl Elimination {
    /// Build an elimination, making sure it is never orphaned: a slot can't explain its own
    /// elimination, and an empty explanation is replaced by the global reason.
    pub fn new(slot_id: SlotId, mut reasons: BitSet, global_reason: SlotId) -> Elimination {
        reasons.remove(slot_id);
        if reasons.is_empty() {
            reasons.insert(global_reason);
        }
        Elimination { slot_id, reasons }
    }
}

impl Debug for Elimination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Elimination({} because of {:?})", self.slot_id, self.reasons)
    }
}

/// Records, per slot, the values forbidden for that slot along with the slots justifying each
/// exclusion.
pub struct EliminationSpace {
    /// Indexed by slot id. Eliminations are indexed by value rather than by reason since lookups
    /// by value are far more frequent than writes.
    eliminations: Vec<BTreeMap<WordId, BitSet>>,

    /// A reason id outside of the slot id range that no unassignment ever invalidates.
    global_reason: SlotId,
}

impl Debug for EliminationSpace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.eliminations
                    .iter()
                    .enumerate()
                    .filter(|(_, eliminations)| !eliminations.is_empty()),
            )
            .finish()
    }
}

impl Hash for EliminationSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.eliminations.hash(state);
    }
}

impl EliminationSpace {
    pub fn new(slot_count: usize) -> EliminationSpace {
        EliminationSpace {
            eliminations: (0..slot_count).map(|_| BTreeMap::new()).collect(),
            global_reason: slot_count,
        }
    }

    pub fn global_reason(&self) -> SlotId {
        self.global_reason
    }

    pub fn is_eliminated(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.eliminations[slot_id].contains_key(&word_id)
    }

    /// The eliminations for a slot, as a map from eliminated value to reasons.
    pub fn eliminations(&self, slot_id: SlotId) -> &BTreeMap<WordId, BitSet> {
        &self.eliminations[slot_id]
    }

    /// Would the value still be eliminated for the slot if the given slots were modified? An
    /// elimination survives only if none of its reasons is among the modified slots.
    pub fn is_eliminated_after(&self, slot_id: SlotId, word_id: WordId, modified: &BitSet) -> bool {
        self.eliminations[slot_id]
            .get(&word_id)
            .map(|reasons| reasons.is_disjoint(modified))
            .unwrap_or(false)
    }

    /// Forbid `value` for the freshly unassigned slot, then forget every elimination that was
    /// justified by that slot, since its assignment no longer holds. Returns the slots whose
    /// eliminations changed.
    pub fn eliminate(&mut self, unassigned: SlotId, reasons: &BitSet, value: WordId) -> BitSet {
        let mut changed = BitSet::with_capacity(self.eliminations.len());
        let reason_capacity = self.global_reason + 1;

        self.eliminations[unassigned]
            .entry(value)
            .or_insert_with(|| BitSet::with_capacity(reason_capacity))
            .union_with(reasons);
        changed.insert(unassigned);

        for (slot_id, eliminations) in self.eliminations.iter_mut().enumerate() {
            let before = eliminations.len();
            eliminations.retain(|_, previous_reasons| !previous_reasons.contains(unassigned));
            if eliminations.len() != before {
                changed.insert(slot_id);
            }
        }

        changed
    }

    /// Forget every elimination, global ones included.
    pub fn clear(&mut self) {
        self.eliminations.iter_mut().for_each(BTreeMap::clear);
    }

    /// Total number of eliminations across all slots.
    pub fn len(&self) -> usize {
        self.eliminations.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.eliminations.iter().all(BTreeMap::is_empty)
    }
}
