use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use crate::dictionary::CachedDictionary;
use crate::elimination::{Elimination, EliminationSpace};
use crate::error::GridError;
use crate::grid::Grid;
use crate::history::History;
use crate::listener::{ProgressNotifier, SolverListener};
use crate::probe::Probe;
use crate::puzzle::PuzzleGrid;
use crate::solver::Statistics;
use crate::word_list::{Dictionary, WordList};
use crate::{GridPosition, SlotId, WordId};

/// The state of one solve: the live grid, the cached dictionary, the elimination space and the
/// assignment history. Nothing here outlives the solve that created it.
#[derive(Debug)]
pub struct Crossword {
    pub grid: Grid,
    pub dictionary: CachedDictionary,
    pub eliminations: EliminationSpace,
    pub history: History,
}

impl Crossword {
    pub fn create<D>(puzzle: &PuzzleGrid, dictionary: &D) -> Result<Crossword, GridError>
    where
        D: Dictionary + ?Sized,
    {
        let grid = Grid::new(puzzle)?;
        let dictionary = CachedDictionary::new(WordList::new(dictionary), &grid);
        let eliminations = EliminationSpace::new(grid.slot_count());

        Ok(Crossword {
            grid,
            dictionary,
            eliminations,
            history: History::new(),
        })
    }

    pub fn probe(&mut self) -> Probe<'_> {
        Probe::new(&self.grid, &mut self.dictionary, &self.eliminations)
    }

    pub fn candidates(&mut self, slot_id: SlotId) -> Vec<WordId> {
        self.dictionary.candidates(&self.grid, slot_id, &self.eliminations)
    }

    pub fn candidates_count(&mut self, slot_id: SlotId) -> usize {
        self.dictionary.candidates_count(&self.grid, slot_id, &self.eliminations)
    }

    pub fn word(&self, word_id: WordId) -> &str {
        &self.dictionary.word(word_id).string
    }

    /// The number of branches of the search tree before any pruning: the product of the
    /// candidate counts of the unfilled slots.
    pub fn branch_count(&mut self) -> f64 {
        let unfilled: Vec<SlotId> = self.grid.unfilled_slots().collect();
        unfilled
            .into_iter()
            .map(|slot_id| self.candidates_count(slot_id) as f64)
            .product()
    }

    /// Positions of the unfilled slots left without a single candidate, along with the ones of
    /// the slot the search gave up on, if any.
    pub fn unsolvable_boxes(&mut self, dead_end: Option<SlotId>) -> BTreeSet<GridPosition> {
        self.dictionary.invalidate_all();

        let unfilled: Vec<SlotId> = self.grid.unfilled_slots().collect();
        let mut boxes = BTreeSet::new();
        for slot_id in unfilled {
            if Some(slot_id) == dead_end || self.candidates_count(slot_id) == 0 {
                boxes.extend(self.grid.slot(slot_id).positions());
            }
        }
        boxes
    }

    /// A digest of everything the next search steps depend on when the given slot is a dead-end:
    /// the assignments, their order and the eliminations.
    pub fn fingerprint(&self, dead_end: SlotId) -> u64 {
        let mut hasher = DefaultHasher::new();
        dead_end.hash(&mut hasher);
        for slot_id in self.history.most_recent_first() {
            (slot_id, self.grid.value(slot_id)).hash(&mut hasher);
        }
        self.eliminations.hash(&mut hasher);
        hasher.finish()
    }

    /// Drop every elimination, making the eliminated values candidates again.
    pub fn forget_eliminations(&mut self) {
        self.eliminations.clear();
        self.dictionary.invalidate_all();
    }
}

/// Applies assignments and unassignments to a crossword, keeping the dictionary, eliminations and
/// history in sync, counting them and telling the listeners about them.
pub struct CrosswordUpdater<'a> {
    pub crossword: Crossword,
    pub statistics: Statistics,
    progress: ProgressNotifier<'a>,
    listeners: Vec<Box<dyn SolverListener + 'a>>,
}

impl<'a> CrosswordUpdater<'a> {
    pub fn new(
        crossword: Crossword,
        progress: ProgressNotifier<'a>,
        listeners: Vec<Box<dyn SolverListener + 'a>>,
    ) -> CrosswordUpdater<'a> {
        CrosswordUpdater {
            crossword,
            statistics: Statistics::default(),
            progress,
            listeners,
        }
    }

    /// Report the current fill percentage, ignoring the notification interval.
    pub fn notify_progress(&mut self) {
        self.progress.notify(&self.crossword.grid);
    }

    pub fn finish(self) -> (Crossword, Statistics) {
        (self.crossword, self.statistics)
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        let crossword = &mut self.crossword;

        crossword
            .grid
            .assign(slot_id, word_id, &crossword.dictionary.word(word_id).glyphs);
        crossword.dictionary.use_word(word_id);
        crossword.dictionary.invalidate_around(&crossword.grid, slot_id);
        crossword.history.add_assignment(slot_id);
        self.statistics.assignments += 1;

        let word = &crossword.dictionary.word(word_id).string;
        for listener in self.listeners.iter_mut() {
            listener.on_assignment(&crossword.grid, slot_id, word);
        }
        self.progress.on_change(&crossword.grid);
    }

    /// Unassign the eliminated slot and forbid the value it held, for the elimination's reasons.
    pub fn unassign(&mut self, elimination: &Elimination) {
        let crossword = &mut self.crossword;
        let slot_id = elimination.slot_id;

        let Some(word_id) = crossword.grid.unassign(slot_id) else {
            return;
        };
        crossword.dictionary.free_word(word_id);

        let changed = crossword
            .eliminations
            .eliminate(slot_id, &elimination.reasons, word_id);
        for changed_slot_id in changed.iter() {
            crossword.dictionary.invalidate_count(changed_slot_id);
        }
        crossword.dictionary.invalidate_around(&crossword.grid, slot_id);
        crossword.history.remove_assignment(slot_id);
        self.statistics.unassignments += 1;

        let word = &crossword.dictionary.word(word_id).string;
        for listener in self.listeners.iter_mut() {
            listener.on_unassignment(&crossword.grid, slot_id, word);
        }
        self.progress.on_change(&crossword.grid);
    }
}
