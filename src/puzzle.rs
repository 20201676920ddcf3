use std::collections::{BTreeMap, BTreeSet};

use crate::error::GridError;
use crate::grid::Direction;
use crate::GridPosition;

/// The caller-facing definition of a puzzle: dimensions, shaded boxes and pre-filled letters.
///
/// Nothing is validated until the puzzle is turned into a grid, except contradictory pre-fills,
/// which are rejected as soon as they are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleGrid {
    width: usize,
    height: usize,
    shaded: BTreeSet<GridPosition>,
    prefilled: BTreeMap<GridPosition, char>,
}

impl PuzzleGrid {
    pub fn new(width: usize, height: usize) -> PuzzleGrid {
        PuzzleGrid {
            width,
            height,
            shaded: BTreeSet::new(),
            prefilled: BTreeMap::new(),
        }
    }

    /// Build a puzzle from a string template, with `.` representing empty boxes, `#` representing
    /// shaded boxes, and anything else representing a pre-filled letter. Blank lines and
    /// surrounding whitespace are ignored.
    pub fn from_template(template: &str) -> Result<PuzzleGrid, GridError> {
        let rows: Vec<Vec<char>> = template
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().collect())
            .collect();

        let width = rows.first().map(|row| row.len()).ok_or(GridError::EmptyTemplate)?;
        let mut puzzle = PuzzleGrid::new(width, rows.len());

        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridError::RaggedTemplate { line: y });
            }
            for (x, &cell) in row.iter().enumerate() {
                match cell {
                    '.' => {}
                    '#' => puzzle.shade(GridPosition::new(x, y)),
                    letter => puzzle.prefill(GridPosition::new(x, y), letter)?,
                }
            }
        }

        Ok(puzzle)
    }

    pub fn with_shaded<I>(mut self, positions: I) -> PuzzleGrid
    where
        I: IntoIterator<Item = GridPosition>,
    {
        self.shaded.extend(positions);
        self
    }

    pub fn shade(&mut self, position: GridPosition) {
        self.shaded.insert(position);
    }

    /// Pre-fill a single box. Writing the same letter twice is allowed; writing a different one
    /// is a contradiction.
    pub fn prefill(&mut self, position: GridPosition, letter: char) -> Result<(), GridError> {
        match self.prefilled.get(&position) {
            Some(&existing) if existing != letter => Err(GridError::ConflictingPrefill {
                position,
                existing,
                new: letter,
            }),
            _ => {
                self.prefilled.insert(position, letter);
                Ok(())
            }
        }
    }

    /// Pre-fill a run of boxes starting at `start` in the given direction. A `.` leaves the
    /// corresponding box untouched.
    pub fn fill_entry(
        &mut self,
        start: GridPosition,
        direction: Direction,
        fill: &str,
    ) -> Result<(), GridError> {
        for (idx, letter) in fill.chars().enumerate() {
            if letter == '.' {
                continue;
            }
            let position = match direction {
                Direction::Across => GridPosition::new(start.x + idx, start.y),
                Direction::Down => GridPosition::new(start.x, start.y + idx),
            };
            self.prefill(position, letter)?;
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shaded(&self) -> &BTreeSet<GridPosition> {
        &self.shaded
    }

    pub fn prefilled(&self) -> &BTreeMap<GridPosition, char> {
        &self.prefilled
    }

    pub fn is_shaded(&self, position: GridPosition) -> bool {
        self.shaded.contains(&position)
    }

    fn contains(&self, position: GridPosition) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Check that the definition describes a usable grid.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.width == 0 || self.height == 0 {
            return Err(GridError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(&position) = self.shaded.iter().find(|&&p| !self.contains(p)) {
            return Err(GridError::ShadedOutOfBounds(position));
        }
        for &position in self.prefilled.keys() {
            if !self.contains(position) {
                return Err(GridError::PrefilledOutOfBounds(position));
            }
            if self.is_shaded(position) {
                return Err(GridError::PrefilledOnShaded(position));
            }
        }
        Ok(())
    }
}
