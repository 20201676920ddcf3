use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use instant::{Duration, Instant};
use log::info;

use crate::crossword::{Crossword, CrosswordUpdater};
use crate::error::SolveError;
use crate::heuristics::{
    Backjumper, Backtracker, CandidateChooser, ChronologicalBacktracker, ConflictDirected,
    DynamicBacktracker, FirstViable, LeastConstraining, MostConstrainedFirst, SlotSelector,
    DEFAULT_MAX_COMPARED_CANDIDATES,
};
use crate::listener::{
    FineProgressPrinter, NullProgressListener, ProgressListener, ProgressNotifier, SolverListener,
};
use crate::puzzle::PuzzleGrid;
use crate::word_list::Dictionary;
use crate::{GridPosition, SlotId};

/// How to pick the next slot to fill.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SlotSelection {
    /// Fewest candidates first.
    #[default]
    MostConstrained,
}

impl SlotSelection {
    fn selector(self) -> Box<dyn SlotSelector> {
        match self {
            SlotSelection::MostConstrained => Box::new(MostConstrainedFirst),
        }
    }
}

/// How to pick a word for the selected slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ValueSelection {
    /// The word leaving the most local solutions, among the first few viable ones.
    #[default]
    LeastConstraining,
    /// The first viable word.
    FirstViable,
}

impl ValueSelection {
    fn chooser(self, max_compared: usize) -> Box<dyn CandidateChooser> {
        match self {
            ValueSelection::LeastConstraining => Box::new(LeastConstraining { max_compared }),
            ValueSelection::FirstViable => Box::new(FirstViable),
        }
    }
}

/// How to recover from a slot that can't be filled.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Backtracking {
    /// Retract the fewest assignments that make the slot fillable again.
    #[default]
    Dynamic,
    /// Retract the most recent assignment.
    Chronological,
    /// Retract the most recent assignments up to one crossing the slot.
    Backjump,
}

impl Backtracking {
    fn backtracker(self) -> Box<dyn Backtracker> {
        match self {
            Backtracking::Dynamic => Box::new(DynamicBacktracker),
            Backtracking::Chronological => Box::new(ChronologicalBacktracker),
            Backtracking::Backjump => Box::new(Backjumper),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub slot_selection: SlotSelection,
    pub value_selection: ValueSelection,
    pub backtracking: Backtracking,

    /// Minimum delay between two progress notifications.
    pub progress_interval: Duration,

    /// How many viable candidates the least-constraining value selection compares.
    pub max_compared_candidates: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            slot_selection: SlotSelection::default(),
            value_selection: ValueSelection::default(),
            backtracking: Backtracking::default(),
            progress_interval: Duration::from_secs(1),
            max_compared_candidates: DEFAULT_MAX_COMPARED_CANDIDATES,
        }
    }
}

impl SolverConfig {
    pub fn with_slot_selection(mut self, slot_selection: SlotSelection) -> Self {
        self.slot_selection = slot_selection;
        self
    }

    pub fn with_value_selection(mut self, value_selection: ValueSelection) -> Self {
        self.value_selection = value_selection;
        self
    }

    pub fn with_backtracking(mut self, backtracking: Backtracking) -> Self {
        self.backtracking = backtracking;
        self
    }

    pub fn with_progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    pub fn with_max_compared_candidates(mut self, max_compared_candidates: usize) -> Self {
        self.max_compared_candidates = max_compared_candidates;
        self
    }
}

/// A flag the caller can raise, from any thread, to stop a solve between two steps.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Cancellation {
        Cancellation::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Iterations of the main loop.
    pub states: u64,
    pub assignments: u64,
    pub unassignments: u64,
    /// Dead-ends reached.
    pub backtracks: u64,
    /// Dead-ends resolved by retracting more than one assignment.
    pub backjumps: u64,
    pub duration: Duration,
}

impl Display for Statistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} states, {} assignments, {} unassignments, {} backtracks, {} backjumps in {:?}",
            self.states,
            self.assignments,
            self.unassignments,
            self.backtracks,
            self.backjumps,
            self.duration
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Success,
    Impossible,
}

impl Display for ResultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultKind::Success => write!(f, "SUCCESS"),
            ResultKind::Impossible => write!(f, "IMPOSSIBLE"),
        }
    }
}

/// The outcome of a solve that ran to completion.
#[derive(Debug, Clone)]
pub struct SolverResult {
    pub kind: ResultKind,
    pub width: usize,
    pub height: usize,

    /// Every lettered box: the whole grid on success, whatever was filled when the search gave
    /// up otherwise.
    pub filled_boxes: BTreeMap<GridPosition, char>,

    /// Boxes of the slots left without any candidate. Always empty on success.
    pub unsolvable_boxes: BTreeSet<GridPosition>,

    pub statistics: Statistics,
}

impl Display for SolverResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Result: {}", self.kind)?;
        for y in 0..self.height {
            write!(f, "|")?;
            for x in 0..self.width {
                let letter = self
                    .filled_boxes
                    .get(&GridPosition::new(x, y))
                    .cloned()
                    .unwrap_or('#');
                write!(f, "{}|", letter)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Statistics: {}", self.statistics)?;
        if !self.unsolvable_boxes.is_empty() {
            let boxes: Vec<String> = self.unsolvable_boxes.iter().map(|p| p.to_string()).collect();
            writeln!(f, "Unsolvable boxes: {}", boxes.join(", "))?;
        }
        Ok(())
    }
}

/// Fills crossword grids by dynamic backtracking, as configured.
#[derive(Debug, Clone, Default)]
pub struct CrosswordSolver {
    config: SolverConfig,
}

impl CrosswordSolver {
    pub fn new(config: SolverConfig) -> CrosswordSolver {
        CrosswordSolver { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solve<D>(&self, puzzle: &PuzzleGrid, dictionary: &D) -> Result<SolverResult, SolveError>
    where
        D: Dictionary + ?Sized,
    {
        self.solve_with(
            puzzle,
            dictionary,
            &mut NullProgressListener,
            vec![],
            &Cancellation::new(),
        )
    }

    /// Fill the puzzle, reporting progress and every grid change to the given listeners, and
    /// stopping with `SolveError::Interrupted` as soon as the cancellation flag is seen raised.
    pub fn solve_with<'a, D>(
        &self,
        puzzle: &PuzzleGrid,
        dictionary: &D,
        progress: &'a mut dyn ProgressListener,
        observers: Vec<Box<dyn SolverListener + 'a>>,
        cancellation: &Cancellation,
    ) -> Result<SolverResult, SolveError>
    where
        D: Dictionary + ?Sized,
    {
        let start = Instant::now();

        progress.on_initialisation_start();
        let mut crossword = Crossword::create(puzzle, dictionary)?;
        progress.on_initialisation_end();

        info!(
            "Filling {} slots among {} words, {:e} branches before pruning",
            crossword.grid.slot_count(),
            crossword.dictionary.word_list().len(),
            crossword.branch_count()
        );

        let mut listeners: Vec<Box<dyn SolverListener + 'a>> = vec![Box::new(FineProgressPrinter)];
        listeners.extend(observers);
        let notifier = ProgressNotifier::new(progress, self.config.progress_interval);
        let mut updater = CrosswordUpdater::new(crossword, notifier, listeners);

        let outcome = self.run(&mut updater, cancellation)?;

        updater.notify_progress();
        let (mut crossword, mut statistics) = updater.finish();
        statistics.duration = start.elapsed();

        let (kind, unsolvable_boxes) = match outcome {
            Outcome::Filled => (ResultKind::Success, BTreeSet::new()),
            Outcome::DeadEnd(slot_id) => (
                ResultKind::Impossible,
                crossword.unsolvable_boxes(Some(slot_id)),
            ),
        };

        info!("{}: {}", kind, statistics);

        Ok(SolverResult {
            kind,
            width: puzzle.width(),
            height: puzzle.height(),
            filled_boxes: crossword.grid.filled_boxes(),
            unsolvable_boxes,
            statistics,
        })
    }

    /// The main loop: fill the most pressing slot, or retract assignments when it can't be
    /// filled, until every slot is filled or no retraction helps.
    ///
    /// The configured backtracker may record eliminations that don't strictly follow from the
    /// grid, or lead the search back to a dead-end it already met in the very same state. When it
    /// gives up or loops, its eliminations are dropped and the rest of the search retracts
    /// conflict-directed, which only stops on a fill or on a slot nothing holds back.
    fn run(
        &self,
        updater: &mut CrosswordUpdater,
        cancellation: &Cancellation,
    ) -> Result<Outcome, SolveError> {
        let mut slot_selector = self.config.slot_selection.selector();
        let mut chooser = self
            .config
            .value_selection
            .chooser(self.config.max_compared_candidates);
        let mut backtracker = self.config.backtracking.backtracker();
        let mut conflict_directed = false;
        let mut dead_ends: HashSet<u64> = HashSet::new();

        // A slot that just caused a backtrack is retried first.
        let mut pending: Option<SlotId> = None;

        loop {
            if cancellation.is_cancelled() {
                info!("Interrupted after {} states", updater.statistics.states);
                return Err(SolveError::Interrupted);
            }

            let crossword = &mut updater.crossword;
            let retried = pending
                .take()
                .filter(|&slot_id| !crossword.grid.is_assigned(slot_id));
            let slot_id = match retried.or_else(|| slot_selector.next_slot(crossword)) {
                Some(slot_id) => slot_id,
                None => return Ok(Outcome::Filled),
            };
            updater.statistics.states += 1;

            if let Some(word_id) = chooser.find(&mut updater.crossword, slot_id) {
                updater.assign(slot_id, word_id);
                continue;
            }

            updater.statistics.backtracks += 1;
            let mut eliminations = if conflict_directed {
                ConflictDirected.backtrack_from(&mut updater.crossword, slot_id)
            } else if dead_ends.insert(updater.crossword.fingerprint(slot_id)) {
                backtracker.backtrack_from(&mut updater.crossword, slot_id)
            } else {
                info!("Dead-end on slot {} met again in the same state", slot_id);
                vec![]
            };

            if eliminations.is_empty() && !conflict_directed {
                conflict_directed = true;
                if !updater.crossword.eliminations.is_empty() {
                    info!(
                        "Dropping {} eliminations, retracting conflict-directed from now on",
                        updater.crossword.eliminations.len()
                    );
                    updater.crossword.forget_eliminations();
                    pending = Some(slot_id);
                    continue;
                }
                info!("Retracting conflict-directed from now on");
                eliminations = ConflictDirected.backtrack_from(&mut updater.crossword, slot_id);
            }
            if eliminations.is_empty() {
                return Ok(Outcome::DeadEnd(slot_id));
            }
            if eliminations.len() > 1 {
                updater.statistics.backjumps += 1;
            }
            for elimination in &eliminations {
                updater.unassign(elimination);
            }
            pending = Some(slot_id);
        }
    }
}

/// How the main loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Filled,
    /// No retraction can make this slot assignable.
    DeadEnd(SlotId),
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use crate::grid::Grid;
    use crate::listener::{ProgressListener, SolverListener};
    use crate::solver::{
        Backtracking, Cancellation, CrosswordSolver, ResultKind, SolverConfig, SolverResult,
        ValueSelection,
    };
    use crate::{solve, GridError, GridPosition, PuzzleGrid, SlotId, SolveError};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn puzzle(template: &str) -> PuzzleGrid {
        PuzzleGrid::from_template(template).expect("valid template")
    }

    /// The words spelled by the slots of the puzzle, in slot order.
    fn entries(puzzle: &PuzzleGrid, result: &SolverResult) -> Vec<String> {
        let grid = Grid::new(puzzle).expect("valid grid");
        grid.slot_ids()
            .map(|slot_id| {
                grid.slot(slot_id)
                    .positions()
                    .map(|position| result.filled_boxes.get(&position).cloned().unwrap_or('.'))
                    .collect()
            })
            .collect()
    }

    fn assert_sound(puzzle: &PuzzleGrid, result: &SolverResult, dictionary: &[&str]) {
        assert_eq!(result.kind, ResultKind::Success);
        assert!(result.unsolvable_boxes.is_empty());

        let entries = entries(puzzle, result);
        for entry in &entries {
            assert!(dictionary.contains(&entry.as_str()), "{} is not a word", entry);
        }
        let distinct: BTreeSet<&String> = entries.iter().collect();
        assert_eq!(distinct.len(), entries.len(), "a word is used twice: {:?}", entries);
    }

    fn positions(coordinates: &[(usize, usize)]) -> BTreeSet<GridPosition> {
        coordinates
            .iter()
            .map(|&(x, y)| GridPosition::new(x, y))
            .collect()
    }

    const OPEN_3X3: &str = "
        ...
        ...
        ...
    ";

    const SCENARIO_WORDS: [&str; 6] = ["AAA", "BBB", "CDE", "ABC", "ABD", "ABE"];

    /// A 2x2 grid where the first choice is a dead-end one step later.
    const BACKTRACK_WORDS: [&str; 6] = ["ab", "aw", "ax", "bz", "wz", "xy"];

    const OPEN_2X2: &str = "
        ..
        ..
    ";

    #[test]
    fn test_open_grid_is_filled_consistently() {
        init_logger();
        let puzzle = puzzle(OPEN_3X3);

        let result = solve(&puzzle, &SCENARIO_WORDS).expect("valid puzzle");

        assert_sound(&puzzle, &result, &SCENARIO_WORDS);
        assert_eq!(entries(&puzzle, &result), vec!["AAA", "BBB", "CDE", "ABC", "ABD", "ABE"]);
        assert_eq!(result.filled_boxes.len(), 9);
        assert_eq!(result.statistics.assignments, 6);
        assert_eq!(result.statistics.unassignments, 0);
        assert_eq!(result.statistics.backtracks, 0);
    }

    #[test]
    fn test_missing_letter_is_completed() {
        init_logger();
        let puzzle = puzzle("AB.");

        let result = solve(&puzzle, &["ABC"]).expect("valid puzzle");

        assert_eq!(result.kind, ResultKind::Success);
        assert_eq!(result.filled_boxes.get(&GridPosition::new(2, 0)), Some(&'C'));
        assert_eq!(result.to_string().lines().nth(1), Some("|A|B|C|"));
    }

    #[test]
    fn test_unmatchable_column_is_impossible() {
        init_logger();
        let puzzle = puzzle(
            "
            ABC
            ...
            ...
            ",
        );

        let result = solve(&puzzle, &["ABC", "AAA", "BBB", "ABD", "ABE", "DCE"])
            .expect("valid puzzle");

        assert_eq!(result.kind, ResultKind::Impossible);
        assert_eq!(result.unsolvable_boxes, positions(&[(2, 0), (2, 1), (2, 2)]));
        // Pre-filled letters are still reported.
        assert_eq!(result.filled_boxes.len(), 3);
        assert_eq!(result.statistics.assignments, 0);
        assert_eq!(result.statistics.backtracks, 1);
    }

    #[test]
    fn test_grid_without_slots_is_solved_immediately() {
        init_logger();
        for template in ["#", ".", "#.#\n.#.\n#.#"] {
            let result = solve(&puzzle(template), &SCENARIO_WORDS).expect("valid puzzle");
            assert_eq!(result.kind, ResultKind::Success);
            assert!(result.filled_boxes.is_empty());
            assert_eq!(result.statistics.states, 0);
        }
    }

    #[test]
    fn test_impossible_because_of_prefilled_column() {
        init_logger();
        let puzzle = puzzle(
            "
            X..
            Y..
            Z..
            ",
        );

        let result = solve(&puzzle, &["XXX", "ZZZ", "XXZ", "YYX"]).expect("valid puzzle");
        assert_eq!(result.kind, ResultKind::Impossible);
        assert_eq!(result.unsolvable_boxes, positions(&[(0, 0), (0, 1), (0, 2)]));

        let result = solve(&puzzle, &["XXX", "XXZ", "YYX"]).expect("valid puzzle");
        assert_eq!(result.kind, ResultKind::Impossible);
        assert_eq!(
            result.unsolvable_boxes,
            positions(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)])
        );
    }

    #[test]
    fn test_impossible_without_words() {
        init_logger();
        let no_words: [&str; 0] = [];

        let result = solve(&puzzle(OPEN_3X3), &no_words).expect("valid puzzle");

        assert_eq!(result.kind, ResultKind::Impossible);
        assert_eq!(result.unsolvable_boxes.len(), 9);
        assert!(result.filled_boxes.is_empty());
        assert!(result.to_string().starts_with("Result: IMPOSSIBLE\n|#|#|#|"));
    }

    #[test]
    fn test_dead_end_is_backtracked() {
        init_logger();
        let puzzle = puzzle(OPEN_2X2);

        let result = solve(&puzzle, &BACKTRACK_WORDS).expect("valid puzzle");

        assert_sound(&puzzle, &result, &BACKTRACK_WORDS);
        // "ax" first goes to the top row, which leaves "xy" alone for the right column, and
        // nothing for the bottom row to end with 'y'.
        assert_eq!(entries(&puzzle, &result), vec!["aw", "bz", "ab", "wz"]);
        assert_eq!(result.statistics.states, 6);
        assert_eq!(result.statistics.assignments, 5);
        assert_eq!(result.statistics.unassignments, 1);
        assert_eq!(result.statistics.backtracks, 1);
        assert_eq!(result.statistics.backjumps, 0);
    }

    #[test]
    fn test_solves_are_deterministic() {
        init_logger();
        let puzzle = puzzle(OPEN_2X2);
        let shuffled: Vec<&str> = BACKTRACK_WORDS.iter().rev().cloned().collect();

        let first = solve(&puzzle, &BACKTRACK_WORDS).expect("valid puzzle");
        let second = solve(&puzzle, &shuffled).expect("valid puzzle");

        assert_eq!(first.kind, second.kind);
        assert_eq!(first.filled_boxes, second.filled_boxes);
        assert_eq!(first.statistics.states, second.statistics.states);
        assert_eq!(first.statistics.assignments, second.statistics.assignments);
        assert_eq!(first.statistics.unassignments, second.statistics.unassignments);
    }

    #[test]
    fn test_alternate_strategies() {
        init_logger();
        let puzzle = puzzle(OPEN_2X2);

        for backtracking in [
            Backtracking::Dynamic,
            Backtracking::Chronological,
            Backtracking::Backjump,
        ] {
            let config = SolverConfig::default()
                .with_value_selection(ValueSelection::FirstViable)
                .with_backtracking(backtracking);
            let result = CrosswordSolver::new(config)
                .solve(&puzzle, &BACKTRACK_WORDS)
                .expect("valid puzzle");

            assert_sound(&puzzle, &result, &BACKTRACK_WORDS);
            assert_eq!(entries(&puzzle, &result), vec!["ab", "wz", "aw", "bz"]);
        }
    }

    #[test]
    fn test_invalid_grid_is_rejected() {
        let result = solve(&PuzzleGrid::new(0, 3), &SCENARIO_WORDS);
        assert_eq!(
            result.map(|_| ()),
            Err(SolveError::InvalidGrid(GridError::InvalidDimensions {
                width: 0,
                height: 3
            }))
        );
    }

    #[derive(Default)]
    struct ProgressRecorder {
        events: Vec<String>,
    }

    impl ProgressListener for ProgressRecorder {
        fn on_initialisation_start(&mut self) {
            self.events.push("start".to_string());
        }

        fn on_initialisation_end(&mut self) {
            self.events.push("end".to_string());
        }

        fn on_progress(&mut self, percentage: u8) {
            self.events.push(percentage.to_string());
        }
    }

    /// Records the grid changes and raises the cancellation flag after a number of assignments.
    struct Saboteur {
        cancellation: Cancellation,
        assignments_before_cancel: usize,
        events: Vec<String>,
    }

    impl SolverListener for Saboteur {
        fn on_assignment(&mut self, _grid: &Grid, slot_id: SlotId, word: &str) {
            self.events.push(format!("+{} {}", slot_id, word));
            if self.events.len() >= self.assignments_before_cancel {
                self.cancellation.cancel();
            }
        }

        fn on_unassignment(&mut self, _grid: &Grid, slot_id: SlotId, word: &str) {
            self.events.push(format!("-{} {}", slot_id, word));
        }
    }

    #[test]
    fn test_listeners_see_every_change() {
        init_logger();
        let puzzle = puzzle(OPEN_2X2);
        let cancellation = Cancellation::new();
        let mut progress = ProgressRecorder::default();
        let mut observer = Saboteur {
            cancellation: cancellation.clone(),
            assignments_before_cancel: usize::MAX,
            events: vec![],
        };

        let observers: Vec<Box<dyn SolverListener + '_>> = vec![Box::new(&mut observer)];
        let result = CrosswordSolver::default()
            .solve_with(
                &puzzle,
                &BACKTRACK_WORDS,
                &mut progress,
                observers,
                &cancellation,
            )
            .expect("valid puzzle");

        assert_eq!(result.kind, ResultKind::Success);
        assert_eq!(observer.events[..3], ["+0 ax", "-0 ax", "+3 wz"]);
        assert_eq!(observer.events.len(), 6);
        assert_eq!(progress.events[..2], ["start", "end"]);
        assert_eq!(progress.events.last().map(String::as_str), Some("100"));
    }

    #[test]
    fn test_cancellation_is_not_impossibility() {
        init_logger();
        let puzzle = puzzle(OPEN_3X3);

        let cancellation = Cancellation::new();
        cancellation.cancel();
        let result = CrosswordSolver::default().solve_with(
            &puzzle,
            &SCENARIO_WORDS,
            &mut ProgressRecorder::default(),
            vec![],
            &cancellation,
        );
        assert_eq!(result.map(|_| ()), Err(SolveError::Interrupted));

        // Raised during the search.
        let cancellation = Cancellation::new();
        let mut observer = Saboteur {
            cancellation: cancellation.clone(),
            assignments_before_cancel: 1,
            events: vec![],
        };
        let observers: Vec<Box<dyn SolverListener + '_>> = vec![Box::new(&mut observer)];
        let result = CrosswordSolver::default().solve_with(
            &puzzle,
            &SCENARIO_WORDS,
            &mut ProgressRecorder::default(),
            observers,
            &cancellation,
        );
        assert_eq!(result.map(|_| ()), Err(SolveError::Interrupted));
        assert_eq!(observer.events, vec!["+0 AAA"]);
    }

    /// Solve, failing instead of hanging if the search doesn't end by itself.
    fn solve_or_give_up(
        puzzle: &PuzzleGrid,
        words: &[&str],
        config: SolverConfig,
    ) -> SolverResult {
        let cancellation = Cancellation::new();
        let mut guard = Saboteur {
            cancellation: cancellation.clone(),
            assignments_before_cancel: 100_000,
            events: vec![],
        };
        let observers: Vec<Box<dyn SolverListener + '_>> = vec![Box::new(&mut guard)];
        CrosswordSolver::new(config)
            .solve_with(
                puzzle,
                words,
                &mut ProgressRecorder::default(),
                observers,
                &cancellation,
            )
            .expect("the search ends by itself")
    }

    /// Whether the puzzle can be filled with distinct words, by exhaustive search.
    fn has_fill(puzzle: &PuzzleGrid, words: &[&str]) -> bool {
        let words: Vec<Vec<char>> = words
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|word| word.chars().collect())
            .collect();
        let mut grid = Grid::new(puzzle).expect("valid grid");
        let mut used = vec![false; words.len()];
        fill_from(&mut grid, 0, &words, &mut used)
    }

    fn fill_from(
        grid: &mut Grid,
        slot_id: SlotId,
        words: &[Vec<char>],
        used: &mut [bool],
    ) -> bool {
        if slot_id == grid.slot_count() {
            return true;
        }
        for (word_id, glyphs) in words.iter().enumerate() {
            if used[word_id] || !grid.is_compatible(slot_id, glyphs) {
                continue;
            }
            grid.assign(slot_id, word_id, glyphs);
            used[word_id] = true;
            let filled = fill_from(grid, slot_id + 1, words, used);
            used[word_id] = false;
            grid.unassign(slot_id);
            if filled {
                return true;
            }
        }
        false
    }

    #[test]
    fn test_word_taken_by_a_distant_slot_is_given_back() {
        init_logger();
        let puzzle = puzzle(
            "
            ...
            #..
            .#.
            ..#
            ",
        );
        let words = [
            "aa", "aaa", "aabc", "aac", "aacb", "aba", "acaa", "acab", "acb", "acbc", "acc", "ba",
            "bb", "bbab", "bccc", "cab", "cb", "cbba", "cc",
        ];
        assert!(has_fill(&puzzle, &words));

        let result = solve_or_give_up(&puzzle, &words, SolverConfig::default());

        assert_sound(&puzzle, &result, &words);
    }

    #[test]
    fn test_search_does_not_cycle() {
        init_logger();
        let puzzle = puzzle(
            "
            ....
            ....
            ",
        );
        let words = [
            "aa", "aab", "ab", "abb", "abba", "accc", "baa", "bb", "bbaa", "bbb", "ca", "cb",
            "cbb", "cbca", "cc", "cca", "ccab",
        ];
        assert!(has_fill(&puzzle, &words));

        let result = solve_or_give_up(&puzzle, &words, SolverConfig::default());

        assert_sound(&puzzle, &result, &words);
    }

    #[test]
    fn test_slot_given_up_on_is_reported() {
        init_logger();
        let puzzle = puzzle(OPEN_2X2);

        // Every slot has two candidates, but each word leaves its crossing slots with nothing.
        let result = solve(&puzzle, &["ab", "cd"]).expect("valid puzzle");

        assert_eq!(result.kind, ResultKind::Impossible);
        assert_eq!(result.unsolvable_boxes, positions(&[(0, 0), (1, 0)]));
    }

    #[test]
    fn test_fills_whenever_a_fill_exists() {
        init_logger();
        let mut rng = SmallRng::seed_from_u64(0x6772_6964);

        for _ in 0..200 {
            let width = rng.gen_range(2..=4);
            let height = rng.gen_range(2..=4);
            let mut rows = vec![];
            for _ in 0..height {
                let mut row = String::new();
                for _ in 0..width {
                    row.push(if rng.gen_bool(0.2) { '#' } else { '.' });
                }
                rows.push(row);
            }
            let template = rows.join("\n");

            let mut owned_words = vec![];
            for _ in 0..rng.gen_range(8..=16) {
                let mut word = String::new();
                for _ in 0..rng.gen_range(2..=4) {
                    word.push(['a', 'b', 'c'][rng.gen_range(0..3)]);
                }
                owned_words.push(word);
            }
            let words: Vec<&str> = owned_words.iter().map(String::as_str).collect();

            let puzzle = puzzle(&template);
            let expected = if has_fill(&puzzle, &words) {
                ResultKind::Success
            } else {
                ResultKind::Impossible
            };

            for backtracking in [
                Backtracking::Dynamic,
                Backtracking::Chronological,
                Backtracking::Backjump,
            ] {
                let config = SolverConfig::default().with_backtracking(backtracking);
                let result = solve_or_give_up(&puzzle, &words, config);
                assert_eq!(
                    result.kind, expected,
                    "{:?} on\n{}\nwith {:?}",
                    backtracking, template, words
                );
                if expected == ResultKind::Success {
                    assert_sound(&puzzle, &result, &words);
                } else {
                    assert!(!result.unsolvable_boxes.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_result_display() {
        let mut filled_boxes = BTreeMap::new();
        filled_boxes.insert(GridPosition::new(0, 0), 'A');
        filled_boxes.insert(GridPosition::new(1, 1), 'B');
        let result = SolverResult {
            kind: ResultKind::Impossible,
            width: 2,
            height: 2,
            filled_boxes,
            unsolvable_boxes: positions(&[(1, 0)]),
            statistics: Default::default(),
        };

        let rendered = result.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Result: IMPOSSIBLE");
        assert_eq!(lines[1], "|A|#|");
        assert_eq!(lines[2], "|#|B|");
        assert!(lines[3].starts_with("Statistics: 0 states"));
        assert_eq!(lines[4], "Unsolvable boxes: (1, 0)");
    }
}
