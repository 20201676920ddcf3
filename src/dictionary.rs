use std::collections::HashMap;
use std::rc::Rc;

use bit_set::BitSet;

use crate::elimination::EliminationSpace;
use crate::grid::{Grid, Pattern};
use crate::word_list::{Word, WordList};
use crate::{SlotId, WordId};

/// How many distinct patterns we're willing to cache per slot before starting over.
pub const CACHED_PATTERNS_PER_SLOT: usize = 1_000;

/// Caches, per slot, the dictionary words compatible with the slot's letters, and serves them
/// filtered against the elimination space and the words already placed in the grid.
#[derive(Debug)]
pub struct CachedDictionary {
    word_list: WordList,

    /// Words compatible with each slot's pre-filled letters, in lexicographic order. Slots with
    /// the same initial pattern share the same list.
    initial_candidates: Vec<Rc<Vec<WordId>>>,

    /// Words matching a given pattern. Patterns carry their length, so entries can be shared by
    /// any slot currently showing that pattern.
    words_by_pattern: HashMap<Pattern, Rc<Vec<WordId>>>,
    max_cached_patterns: usize,

    /// Cached candidate counts for the live grid, `None` when stale.
    candidates_count: Vec<Option<usize>>,

    slot_lengths: Vec<usize>,

    /// Words currently placed somewhere in the grid.
    in_use: BitSet,
}

impl CachedDictionary {
    pub fn new(word_list: WordList, grid: &Grid) -> CachedDictionary {
        let mut initial_by_pattern: HashMap<Pattern, Rc<Vec<WordId>>> = HashMap::new();

        let initial_candidates: Vec<Rc<Vec<WordId>>> = grid
            .slot_ids()
            .map(|slot_id| {
                let pattern = grid.pattern(slot_id);
                let candidates = initial_by_pattern.entry(pattern).or_insert_with(|| {
                    Rc::new(
                        word_list
                            .words_of_length(grid.slot(slot_id).length)
                            .iter()
                            .cloned()
                            .filter(|&word_id| {
                                grid.is_compatible(slot_id, &word_list.word(word_id).glyphs)
                            })
                            .collect(),
                    )
                });
                Rc::clone(candidates)
            })
            .collect();

        let slot_count = grid.slot_count();

        CachedDictionary {
            initial_candidates,
            words_by_pattern: HashMap::new(),
            max_cached_patterns: slot_count.max(1) * CACHED_PATTERNS_PER_SLOT,
            candidates_count: vec![None; slot_count],
            slot_lengths: grid.slot_ids().map(|slot_id| grid.slot(slot_id).length).collect(),
            in_use: BitSet::with_capacity(word_list.len()),
            word_list,
        }
    }

    pub fn word_list(&self) -> &WordList {
        &self.word_list
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        self.word_list.word(word_id)
    }

    /// Words compatible with the slot's pre-filled letters, ignoring everything else.
    pub fn initial_candidates(&self, slot_id: SlotId) -> &[WordId] {
        &self.initial_candidates[slot_id]
    }

    /// Words matching the slot's current pattern, computed once per distinct pattern.
    fn words_matching(&mut self, grid: &Grid, slot_id: SlotId) -> Rc<Vec<WordId>> {
        let pattern = grid.pattern(slot_id);
        if let Some(words) = self.words_by_pattern.get(&pattern) {
            return Rc::clone(words);
        }

        let words: Rc<Vec<WordId>> = Rc::new(self.reevaluated_candidates(grid, slot_id).collect());

        if self.words_by_pattern.len() >= self.max_cached_patterns {
            self.words_by_pattern.clear();
        }
        self.words_by_pattern.insert(pattern, Rc::clone(&words));

        words
    }

    fn is_available(&self, slot_id: SlotId, word_id: WordId, eliminations: &EliminationSpace) -> bool {
        !self.in_use.contains(word_id) && !eliminations.is_eliminated(slot_id, word_id)
    }

    /// The words that can currently be placed in the slot, in lexicographic order: they match the
    /// slot's pattern, are not placed elsewhere and are not eliminated for this slot.
    pub fn candidates(
        &mut self,
        grid: &Grid,
        slot_id: SlotId,
        eliminations: &EliminationSpace,
    ) -> Vec<WordId> {
        self.words_matching(grid, slot_id)
            .iter()
            .cloned()
            .filter(|&word_id| self.is_available(slot_id, word_id, eliminations))
            .collect()
    }

    /// Uncached count of the slot's candidates for an arbitrary grid state, optionally treating
    /// one more word as placed. This is what lookahead uses on its private grid copy.
    pub fn count_candidates(
        &mut self,
        grid: &Grid,
        slot_id: SlotId,
        eliminations: &EliminationSpace,
        also_in_use: Option<WordId>,
    ) -> usize {
        self.words_matching(grid, slot_id)
            .iter()
            .filter(|&&word_id| {
                Some(word_id) != also_in_use && self.is_available(slot_id, word_id, eliminations)
            })
            .count()
    }

    /// Cached count of the slot's candidates in the live grid.
    pub fn candidates_count(
        &mut self,
        grid: &Grid,
        slot_id: SlotId,
        eliminations: &EliminationSpace,
    ) -> usize {
        if let Some(count) = self.candidates_count[slot_id] {
            return count;
        }
        let count = self.count_candidates(grid, slot_id, eliminations, None);
        self.candidates_count[slot_id] = Some(count);
        count
    }

    /// Recompute the slot's matches from its initial candidates against its current pattern,
    /// ignoring eliminations and words in use.
    pub fn reevaluated_candidates<'a>(
        &'a self,
        grid: &'a Grid,
        slot_id: SlotId,
    ) -> impl Iterator<Item = WordId> + 'a {
        self.initial_candidates[slot_id]
            .iter()
            .cloned()
            .filter(move |&word_id| grid.is_compatible(slot_id, &self.word(word_id).glyphs))
    }

    pub fn invalidate_count(&mut self, slot_id: SlotId) {
        self.candidates_count[slot_id] = None;
    }

    /// Invalidate the counts that a change to the given slot's letters can affect: its own and its
    /// neighbours'.
    pub fn invalidate_around(&mut self, grid: &Grid, slot_id: SlotId) {
        self.invalidate_count(slot_id);
        for &connected in grid.connected_slots(slot_id) {
            self.invalidate_count(connected);
        }
    }

    pub fn invalidate_all(&mut self) {
        self.candidates_count.iter_mut().for_each(|count| *count = None);
    }

    /// Invalidate the counts of every slot that could hold the given word.
    fn invalidate_same_length(&mut self, word_id: WordId) {
        let length = self.word_list.word(word_id).glyphs.len();
        for (slot_id, &slot_length) in self.slot_lengths.iter().enumerate() {
            if slot_length == length {
                self.candidates_count[slot_id] = None;
            }
        }
    }

    /// Mark a word as placed in the grid so that no other slot is offered it.
    pub fn use_word(&mut self, word_id: WordId) {
        self.in_use.insert(word_id);
        self.invalidate_same_length(word_id);
    }

    pub fn free_word(&mut self, word_id: WordId) {
        self.in_use.remove(word_id);
        self.invalidate_same_length(word_id);
    }

    pub fn is_in_use(&self, word_id: WordId) -> bool {
        self.in_use.contains(word_id)
    }
}

#[cfg(test)]
mod tests {
    use bit_set::BitSet;

    use crate::dictionary::CachedDictionary;
    use crate::elimination::EliminationSpace;
    use crate::grid::Grid;
    use crate::word_list::WordList;
    use crate::PuzzleGrid;

    fn setup(template: &str, words: &[&str]) -> (Grid, CachedDictionary, EliminationSpace) {
        let grid = Grid::new(&PuzzleGrid::from_template(template).expect("valid template"))
            .expect("valid grid");
        let dictionary = CachedDictionary::new(WordList::new(words), &grid);
        let eliminations = EliminationSpace::new(grid.slot_count());
        (grid, dictionary, eliminations)
    }

    fn strings(dictionary: &CachedDictionary, word_ids: &[usize]) -> Vec<String> {
        word_ids.iter().map(|&id| dictionary.word(id).string.clone()).collect()
    }

    #[test]
    fn test_candidates_match_pattern_in_lexicographic_order() {
        let (grid, mut dictionary, eliminations) = setup(
            "
            c..
            ...
            ...
            ",
            &["cow", "cat", "dog", "ape", "cats"],
        );

        let candidates = dictionary.candidates(&grid, 0, &eliminations);
        assert_eq!(strings(&dictionary, &candidates), vec!["cat", "cow"]);

        let candidates = dictionary.candidates(&grid, 1, &eliminations);
        assert_eq!(strings(&dictionary, &candidates), vec!["ape", "cat", "cow", "dog"]);
        assert_eq!(dictionary.initial_candidates(3).len(), 2);
    }

    #[test]
    fn test_candidates_exclude_eliminated_and_used_words() {
        let (grid, mut dictionary, mut eliminations) = setup(
            "
            ...
            ",
            &["aaa", "bbb", "ccc"],
        );
        let bbb = dictionary.word_list().find("bbb").expect("bbb");
        let ccc = dictionary.word_list().find("ccc").expect("ccc");

        assert_eq!(dictionary.candidates_count(&grid, 0, &eliminations), 3);

        dictionary.use_word(bbb);
        assert!(dictionary.is_in_use(bbb));
        assert_eq!(dictionary.candidates_count(&grid, 0, &eliminations), 2);

        let reasons: BitSet = [eliminations.global_reason()].into_iter().collect();
        eliminations.eliminate(0, &reasons, ccc);
        dictionary.invalidate_count(0);
        let candidates = dictionary.candidates(&grid, 0, &eliminations);
        assert_eq!(strings(&dictionary, &candidates), vec!["aaa"]);
        assert_eq!(dictionary.candidates_count(&grid, 0, &eliminations), 1);
        assert_eq!(dictionary.count_candidates(&grid, 0, &eliminations, Some(0)), 0);

        dictionary.free_word(bbb);
        assert_eq!(dictionary.candidates_count(&grid, 0, &eliminations), 2);

        // Reevaluation ignores both filters.
        assert_eq!(dictionary.reevaluated_candidates(&grid, 0).count(), 3);
    }

    #[test]
    fn test_counts_follow_connected_assignments() {
        let (mut grid, mut dictionary, eliminations) = setup(
            "
            ..
            ..
            ",
            &["ab", "ac", "bd", "cd"],
        );
        assert_eq!(dictionary.candidates_count(&grid, 2, &eliminations), 4);

        let ab = dictionary.word_list().find("ab").expect("ab");
        grid.assign(0, ab, &['a', 'b']);
        dictionary.use_word(ab);
        dictionary.invalidate_around(&grid, 0);

        // The first column now reads "a_" and "ab" is taken.
        let candidates = dictionary.candidates(&grid, 2, &eliminations);
        assert_eq!(strings(&dictionary, &candidates), vec!["ac"]);
        assert_eq!(dictionary.candidates_count(&grid, 3, &eliminations), 1);

        grid.unassign(0);
        dictionary.free_word(ab);
        dictionary.invalidate_around(&grid, 0);
        assert_eq!(dictionary.candidates_count(&grid, 2, &eliminations), 4);
    }
}
