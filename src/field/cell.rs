use std::fmt::{Debug, Display, Formatter};

/// The offsets of the adjacent cells, clockwise from the top one (N, NW, W, SW, S, SE, E, NE).
const ADJACENT_OFFSETS: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

/// The cell's state.
///
/// A cell can either be open or closed. When closed, it can also either be or not be flagged.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum CellState {
    /// Represents a closed cell.
    ///
    /// The boolean value indicates whether the cell's flagged (`true`) or not (`false`).
    Closed(bool),
    /// Represents an open cell.
    Open,
}

/// The representation of a cell.
///
/// A cell is described with its position in the field, whether it holds a mine, the number of mines around it and a
/// state.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Cell {
    /// The cell's position in the field is represented with its row's and column's indices (respectively).
    position: (u16, u16),
    mined: bool,
    /// The number of mines in the adjacent cells. Only changed while the field is being populated with mines.
    mines_around: u8,
    /// The cell's state is either of the `CellState` enum.
    state: CellState,
}

impl Cell {
    /// Creates a new closed un-flagged empty `Cell` instance with the position provided.
    pub fn new(position: (u16, u16)) -> Self {
        Cell {
            position,
            mined: false,
            mines_around: 0,
            state: CellState::Closed(false),
        }
    }

    pub fn get_position(&self) -> (u16, u16) {
        self.position
    }

    /// Checks whether the cell is mined.
    pub fn is_mined(&self) -> bool {
        self.mined
    }

    /// Mines the cell. Returns `false` if it was mined already.
    pub fn mine(&mut self) -> bool {
        !std::mem::replace(&mut self.mined, true)
    }

    /// Returns the amount of mines around the cell. Mined cells have it too.
    pub fn get_mines_around_amount(&self) -> u8 {
        self.mines_around
    }

    /// Increments the number representing the amount of mines around the cell.
    pub fn increment_mines_around_amount(&mut self) {
        self.mines_around += 1;
    }

    /// Checks whether the cell is open.
    pub fn is_open(&self) -> bool {
        self.state == CellState::Open
    }

    /// Opens the cell, dropping its flag if there was one.
    ///
    /// Returns `false` if the cell had already been open.
    pub fn open(&mut self) -> bool {
        if self.is_open() {
            return false;
        }

        // `Open` carries no flag, so a flagged cell loses it here.
        self.state = CellState::Open;
        true
    }

    /// Check whether the cell is flagged.
    pub fn is_flagged(&self) -> bool {
        self.state == CellState::Closed(true)
    }

    /// Flags a closed cell. Returns whether the cell has changed.
    pub fn set_flag(&mut self) -> bool {
        self.change_flag(true)
    }

    /// Un-flags a closed cell. Returns whether the cell has changed.
    pub fn remove_flag(&mut self) -> bool {
        self.change_flag(false)
    }

    fn change_flag(&mut self, flagged: bool) -> bool {
        match self.state {
            CellState::Closed(is_flagged) if is_flagged != flagged => {
                self.state = CellState::Closed(flagged);
                true
            }
            _ => false,
        }
    }

    /// Returns the positions of the cell's adjacent cells.
    ///
    /// The method implies an infinite field, so the returned values must be double-checked by the caller with respect
    /// for the field's dimensions (so that there are no out-of-bounds cells' positions).
    pub fn get_adjacent_cells_positions(&self) -> Vec<(i32, i32)> {
        let (row_index, column_index) = (self.position.0 as i32, self.position.1 as i32);

        ADJACENT_OFFSETS
            .iter()
            .map(|(row_offset, column_offset)| (row_index + row_offset, column_index + column_offset))
            .collect()
    }
}

/// The `Debug` implementation displays the closed cells as open.
impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.mined {
            f.pad("x")
        } else if self.mines_around > 0 {
            f.pad(&self.mines_around.to_string())
        } else {
            f.pad("□")
        }
    }
}

/// The `Display` implementation represents the cell in a real-game fashion.
impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.state {
            // In the real game, the cells don't reveal their inner state.
            CellState::Closed(true) => f.pad("F"),
            CellState::Closed(false) => f.pad("■"),
            // The rest of the cases is successfully covered with the `Debug` trait's implementation.
            CellState::Open => Debug::fmt(self, f),
        }
    }
}
