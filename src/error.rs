use thiserror::Error;

use crate::GridPosition;

/// Reasons for rejecting a puzzle definition before any search happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("shaded box {0} is outside the grid")]
    ShadedOutOfBounds(GridPosition),

    #[error("pre-filled box {0} is outside the grid")]
    PrefilledOutOfBounds(GridPosition),

    #[error("pre-filled box {0} is shaded")]
    PrefilledOnShaded(GridPosition),

    #[error("contradictory pre-filled letters for box {position}: '{existing}' and '{new}'")]
    ConflictingPrefill {
        position: GridPosition,
        existing: char,
        new: char,
    },

    #[error("grid template has no rows")]
    EmptyTemplate,

    #[error("grid template row {line} does not have the same width as the first row")]
    RaggedTemplate { line: usize },
}

/// Reasons for a solve call not producing a `SolverResult`. Note that an unsolvable grid is not an
/// error: it is reported as a result of kind `ResultKind::Impossible`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("invalid grid: {0}")]
    InvalidGrid(#[from] GridError),

    #[error("solver interrupted")]
    Interrupted,
}
