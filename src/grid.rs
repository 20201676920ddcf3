use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::ops::Range;
use std::rc::Rc;

use bit_set::BitSet;
use smallvec::SmallVec;

use crate::error::GridError;
use crate::puzzle::PuzzleGrid;
use crate::{GridPosition, SlotId, WordId, MAX_SLOT_LENGTH};

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

/// The current letters of a slot, `None` standing for a blank box.
pub type Pattern = SmallVec<[Option<char>; MAX_SLOT_LENGTH]>;

/// A struct representing a crossing between one slot and another, referencing the other slot's id
/// and the location of the intersection within the other slot.
#[derive(Debug, Clone)]
pub struct Crossing {
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
pub struct SlotConfig {
    pub id: SlotId,
    pub start_cell: GridPosition,
    pub direction: Direction,
    pub length: usize,

    /// Indices of the covered boxes in the grid's row-major box array.
    pub cells: SmallVec<[usize; MAX_SLOT_LENGTH]>,

    pub crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]>,

    /// Distinct slots crossing this one, in the order of the cells they cross.
    pub connected: Vec<SlotId>,
}

impl Debug for SlotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotConfig")
            .field("id", &self.id)
            .field("start_cell", &self.start_cell)
            .field("direction", &self.direction)
            .field("length", &self.length)
            .field("connected", &self.connected)
            .finish()
    }
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    pub fn positions(&self) -> impl Iterator<Item = GridPosition> + '_ {
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => GridPosition::new(self.start_cell.x + cell_idx, self.start_cell.y),
            Direction::Down => GridPosition::new(self.start_cell.x, self.start_cell.y + cell_idx),
        })
    }
}

/// The immutable topology of a grid: boxes, slots and the crossings between them.
#[derive(Debug)]
pub struct GridConfig {
    pub width: usize,
    pub height: usize,
    pub shaded: BitSet,
    pub prefilled: Vec<Option<char>>,
    pub slot_configs: Vec<SlotConfig>,
}

impl GridConfig {
    /// Derive slots and crossings from a puzzle definition. Across slots are numbered first, then
    /// down slots; runs shorter than two boxes are not slots.
    pub fn build(puzzle: &PuzzleGrid) -> Result<GridConfig, GridError> {
        puzzle.validate()?;

        let width = puzzle.width();
        let height = puzzle.height();

        let mut shaded = BitSet::with_capacity(width * height);
        for position in puzzle.shaded() {
            shaded.insert(position.y * width + position.x);
        }

        let mut prefilled: Vec<Option<char>> = vec![None; width * height];
        for (position, &letter) in puzzle.prefilled() {
            prefilled[position.y * width + position.x] = Some(letter);
        }

        let mut runs: Vec<(GridPosition, Direction, SmallVec<[usize; MAX_SLOT_LENGTH]>)> = vec![];

        fn close_run(
            runs: &mut Vec<(GridPosition, Direction, SmallVec<[usize; MAX_SLOT_LENGTH]>)>,
            current: &mut SmallVec<[usize; MAX_SLOT_LENGTH]>,
            start: GridPosition,
            direction: Direction,
        ) {
            if current.len() > 1 {
                runs.push((start, direction, std::mem::take(current)));
            } else {
                current.clear();
            }
        }

        for y in 0..height {
            let mut current: SmallVec<[usize; MAX_SLOT_LENGTH]> = SmallVec::new();
            let mut start = GridPosition::new(0, y);
            for x in 0..width {
                let cell = y * width + x;
                if shaded.contains(cell) {
                    close_run(&mut runs, &mut current, start, Direction::Across);
                } else {
                    if current.is_empty() {
                        start = GridPosition::new(x, y);
                    }
                    current.push(cell);
                }
            }
            close_run(&mut runs, &mut current, start, Direction::Across);
        }

        for x in 0..width {
            let mut current: SmallVec<[usize; MAX_SLOT_LENGTH]> = SmallVec::new();
            let mut start = GridPosition::new(x, 0);
            for y in 0..height {
                let cell = y * width + x;
                if shaded.contains(cell) {
                    close_run(&mut runs, &mut current, start, Direction::Down);
                } else {
                    if current.is_empty() {
                        start = GridPosition::new(x, y);
                    }
                    current.push(cell);
                }
            }
            close_run(&mut runs, &mut current, start, Direction::Down);
        }

        // Map each box to the (slot, cell index) pairs covering it, so that we can calculate
        // crossings.
        let mut entries_by_cell: Vec<SmallVec<[(SlotId, usize); 2]>> =
            vec![SmallVec::new(); width * height];
        for (slot_id, (_, _, cells)) in runs.iter().enumerate() {
            for (cell_idx, &cell) in cells.iter().enumerate() {
                entries_by_cell[cell].push((slot_id, cell_idx));
            }
        }

        let slot_configs = runs
            .into_iter()
            .enumerate()
            .map(|(slot_id, (start_cell, direction, cells))| {
                let crossings: SmallVec<[Option<Crossing>; MAX_SLOT_LENGTH]> = cells
                    .iter()
                    .map(|&cell| {
                        entries_by_cell[cell]
                            .iter()
                            .find(|&&(other, _)| other != slot_id)
                            .map(|&(other_slot_id, other_slot_cell)| Crossing {
                                other_slot_id,
                                other_slot_cell,
                            })
                    })
                    .collect();

                let mut connected: Vec<SlotId> = Vec::with_capacity(crossings.len());
                for crossing in crossings.iter().flatten() {
                    if !connected.contains(&crossing.other_slot_id) {
                        connected.push(crossing.other_slot_id);
                    }
                }

                SlotConfig {
                    id: slot_id,
                    start_cell,
                    direction,
                    length: cells.len(),
                    cells,
                    crossings,
                    connected,
                }
            })
            .collect();

        Ok(GridConfig {
            width,
            height,
            shaded,
            prefilled,
            slot_configs,
        })
    }
}

/// The live state of the grid during filling: the letter in each box and the value assigned to
/// each slot. Cloning a grid duplicates that state and shares the topology, which is what the
/// lookahead probe relies on.
#[derive(Clone)]
pub struct Grid {
    config: Rc<GridConfig>,
    letters: Vec<Option<char>>,
    values: Vec<Option<WordId>>,
}

impl Debug for Grid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("slots", &self.config.slot_configs.len())
            .field("values", &self.values)
            .finish()
    }
}

impl Grid {
    pub fn new(puzzle: &PuzzleGrid) -> Result<Grid, GridError> {
        let config = GridConfig::build(puzzle)?;
        let letters = config.prefilled.clone();
        let values = vec![None; config.slot_configs.len()];

        Ok(Grid {
            config: Rc::new(config),
            letters,
            values,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn slot_count(&self) -> usize {
        self.config.slot_configs.len()
    }

    pub fn slot_ids(&self) -> Range<SlotId> {
        0..self.slot_count()
    }

    pub fn slot(&self, slot_id: SlotId) -> &SlotConfig {
        &self.config.slot_configs[slot_id]
    }

    pub fn connected_slots(&self, slot_id: SlotId) -> &[SlotId] {
        &self.config.slot_configs[slot_id].connected
    }

    pub fn is_connected(&self, slot_id: SlotId, other_slot_id: SlotId) -> bool {
        self.connected_slots(slot_id).contains(&other_slot_id)
    }

    pub fn value(&self, slot_id: SlotId) -> Option<WordId> {
        self.values[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.values[slot_id].is_some()
    }

    pub fn unfilled_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_ids().filter(|&slot_id| !self.is_assigned(slot_id))
    }

    pub fn filled_slot_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    /// The current letters of the given slot.
    pub fn pattern(&self, slot_id: SlotId) -> Pattern {
        self.slot(slot_id).cells.iter().map(|&cell| self.letters[cell]).collect()
    }

    /// Does the given word fit the current letters of the given slot?
    pub fn is_compatible(&self, slot_id: SlotId, glyphs: &[char]) -> bool {
        let cells = &self.slot(slot_id).cells;
        cells.len() == glyphs.len()
            && cells.iter().zip(glyphs).all(|(&cell, &glyph)| {
                self.letters[cell].map(|letter| letter == glyph).unwrap_or(true)
            })
    }

    /// Write a word into a slot. The word must fit the slot's current pattern.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId, glyphs: &[char]) {
        debug_assert!(self.is_compatible(slot_id, glyphs), "Incompatible assignment");

        let config = Rc::clone(&self.config);
        for (&cell, &glyph) in config.slot_configs[slot_id].cells.iter().zip(glyphs) {
            self.letters[cell] = Some(glyph);
        }
        self.values[slot_id] = Some(word_id);
    }

    /// Clear a slot, returning its previous value. Boxes that are pre-filled or that belong to an
    /// assigned crossing slot keep their letter.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.values[slot_id].take()?;

        let config = Rc::clone(&self.config);
        let slot_config = &config.slot_configs[slot_id];
        for (&cell, crossing) in slot_config.cells.iter().zip(&slot_config.crossings) {
            let kept_by_crossing = crossing
                .as_ref()
                .map(|crossing| self.values[crossing.other_slot_id].is_some())
                .unwrap_or(false);

            if !kept_by_crossing {
                self.letters[cell] = config.prefilled[cell];
            }
        }

        Some(previous)
    }

    /// Every lettered box of the grid, pre-filled or filled by the solver.
    pub fn filled_boxes(&self) -> BTreeMap<GridPosition, char> {
        let width = self.config.width;
        self.letters
            .iter()
            .enumerate()
            .filter_map(|(cell, letter)| {
                letter.map(|letter| (GridPosition::new(cell % width, cell / width), letter))
            })
            .collect()
    }

    /// Turn the current grid state into a rendered string: `#` for shaded boxes and `.` for blank
    /// ones.
    pub fn render(&self) -> String {
        let width = self.config.width;
        (0..self.config.height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let cell = y * width + x;
                        if self.config.shaded.contains(cell) {
                            '#'
                        } else {
                            self.letters[cell].unwrap_or('.')
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
