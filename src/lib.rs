//! Fills crossword grids with dictionary words.
//!
//! Slots (maximal across/down runs of white cells) are the variables of a constraint satisfaction
//! problem whose domains are dictionary words and whose constraints are the letters shared by
//! crossing slots. The search assigns one slot at a time, guided by lookahead on an isolated copy
//! of the grid, and recovers from dead-ends with dynamic backtracking: it retracts the smallest
//! set of earlier assignments that makes the dead-end slot assignable again, remembering why each
//! retracted value was eliminated.

use std::fmt::{Debug, Display, Formatter};

pub mod crossword;
pub mod dictionary;
pub mod elimination;
pub mod error;
pub mod grid;
pub mod heuristics;
pub mod history;
pub mod listener;
pub mod probe;
pub mod puzzle;
pub mod solver;
pub mod word_list;

pub use error::{GridError, SolveError};
pub use grid::Direction;
pub use listener::{NullProgressListener, ProgressListener, SolverListener};
pub use puzzle::PuzzleGrid;
pub use solver::{
    Backtracking, Cancellation, CrosswordSolver, ResultKind, SlotSelection, SolverConfig,
    SolverResult, Statistics, ValueSelection,
};
pub use word_list::Dictionary;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given slot, based on its index in the grid's `slot_configs` field.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the normalised `WordList`. Word ids
/// follow the lexicographic order of the words.
pub type WordId = usize;

/// Zero-indexed column and row of a cell, where y = 0 is the top row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPosition {
    pub x: usize,
    pub y: usize,
}

impl GridPosition {
    pub fn new(x: usize, y: usize) -> GridPosition {
        GridPosition { x, y }
    }
}

impl Debug for GridPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Display for GridPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Fill the given puzzle with words from the given dictionary using the default configuration.
pub fn solve<D>(puzzle: &PuzzleGrid, dictionary: &D) -> Result<SolverResult, SolveError>
where
    D: Dictionary + ?Sized,
{
    CrosswordSolver::default().solve(puzzle, dictionary)
}
