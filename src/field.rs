pub mod cell;

use cell::Cell;
use rand::Rng;
use std::fmt::{Debug, Display, Formatter};
use tracing::{debug, trace};

/// The enum represents all the variants of what can possibly go wrong when working with fields.
#[derive(Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Used when a field can't be created with the requested parameters: either dimension is zero, or there are not
    /// fewer mines than cells (at least one cell must stay free of mines for mine placement to terminate).
    InvalidConfiguration {
        rows_amount: u16,
        columns_amount: u16,
        mines_amount: u32,
    },
    /// Used when the requested position lies beyond the field's bounds.
    ///
    /// The value represents the requested row and column indices respectively.
    OutOfBounds((i32, i32)),
    /// Used when trying to populate with mines a field that has already been populated with them.
    ///
    /// The restriction is implied to avoid accidentally re-distributing the mines of a field of an ongoing game.
    MinesAlreadyExist,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldError::InvalidConfiguration {
                rows_amount,
                columns_amount,
                mines_amount,
            } => write!(
                f,
                "invalid configuration: {} mines on a {}x{} field",
                mines_amount, rows_amount, columns_amount
            ),
            FieldError::OutOfBounds((row_index, column_index)) => {
                write!(f, "position ({}, {}) is out of the field", row_index, column_index)
            }
            FieldError::MinesAlreadyExist => write!(f, "the field has already been populated with mines"),
        }
    }
}

impl std::error::Error for FieldError {}

/// The field representation.
///
/// The field is basically a grid (a 2D vector) of cells with a known number of mines.
#[derive(PartialEq, Eq)]
pub struct Field {
    /// The grid of cells of the field. A 2D vector, where the top level represents rows, and the nested vector of each
    /// row represents cells.
    grid: Vec<Vec<Cell>>,
    /// The total number of mined cells.
    mines_amount: u32,
}

impl Field {
    /// Creates a new [`Field`] with the provided dimensions and number of mines.
    ///
    /// The field is created without mines; [`Field::populate_with_mines`] places them. The configuration is checked
    /// here though, so that the placement afterwards is guaranteed to terminate.
    ///
    /// The method might fail with [`FieldError::InvalidConfiguration`] in case either dimension is zero or the mines
    /// amount is not less than the total number of cells.
    pub fn new(rows_amount: u16, columns_amount: u16, mines_amount: u32) -> Result<Self, FieldError> {
        let cells_amount = rows_amount as u32 * columns_amount as u32;

        if rows_amount == 0 || columns_amount == 0 || mines_amount >= cells_amount {
            return Err(FieldError::InvalidConfiguration {
                rows_amount,
                columns_amount,
                mines_amount,
            });
        }

        let grid = (0..rows_amount)
            .map(|row_index| {
                (0..columns_amount)
                    .map(|column_index| Cell::new((row_index, column_index)))
                    .collect()
            })
            .collect();

        Ok(Field { grid, mines_amount })
    }

    /// Populates the field with randomly distributed mines, the total amount of which is known from the time when the
    /// field was created.
    ///
    /// Positions are sampled uniformly from `rng` and re-drawn when they hit an already mined cell, so the method
    /// slows down as the mines amount gets close to the number of cells.
    ///
    /// The method might fail with [`FieldError::MinesAlreadyExist`] in case it is called when there are mines in the
    /// field already.
    pub fn populate_with_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), FieldError> {
        if self.grid.iter().flatten().any(|cell| cell.is_mined()) {
            return Err(FieldError::MinesAlreadyExist);
        }

        let (rows_amount, columns_amount, _) = self.get_size();
        let mut placed = 0;
        let mut draws = 0u64;

        while placed != self.mines_amount {
            draws += 1;
            let position = (rng.gen_range(0..rows_amount), rng.gen_range(0..columns_amount));

            if self.place_mine(position) {
                placed += 1;
            }
        }

        debug!(mines = placed, draws, "populated the field with mines");
        trace!("revealed field:\n{:?}", self);

        Ok(())
    }

    /// Mines the cell at `position` and increments the mines-around values of its adjacent cells.
    ///
    /// Returns `false` (and changes nothing) if the cell is already mined or doesn't exist.
    pub fn place_mine(&mut self, position: (u16, u16)) -> bool {
        let mined = self
            .get_cell_mut(position)
            .map(|cell| cell.mine())
            .unwrap_or(false);

        if mined {
            for adjacent_position in self.get_adjacent_cells_positions(position) {
                if let Some(cell) = self.get_cell_mut(adjacent_position) {
                    cell.increment_mines_around_amount();
                }
            }
        }

        mined
    }

    /// Returns the field's height (the number of rows), width (the number of columns) and the two values multiplied,
    /// which is effectively the total number of cells.
    pub fn get_size(&self) -> (u16, u16, u32) {
        let rows_amount = self.grid.len() as u16;
        let columns_amount = self.grid.first().map(|row| row.len()).unwrap_or(0) as u16;
        let cells_amount = rows_amount as u32 * columns_amount as u32;

        (rows_amount, columns_amount, cells_amount)
    }

    pub fn get_mines_amount(&self) -> u32 {
        self.mines_amount
    }

    /// Checks that the position lies within the field and converts it into the field's own coordinates.
    pub fn check_position(&self, (row_index, column_index): (i32, i32)) -> Result<(u16, u16), FieldError> {
        let (rows_amount, columns_amount, _) = self.get_size();

        if row_index >= 0
            && column_index >= 0
            && row_index < rows_amount as i32
            && column_index < columns_amount as i32
        {
            Ok((row_index as u16, column_index as u16))
        } else {
            Err(FieldError::OutOfBounds((row_index, column_index)))
        }
    }

    /// Returns a read-only cell reference by its position or [`None`] if there's no cell at the given position.
    pub fn get_cell(&self, (row_index, column_index): (u16, u16)) -> Option<&Cell> {
        self.grid
            .get(row_index as usize)
            .and_then(|r| r.get(column_index as usize))
    }

    /// Returns a mutable cell reference by its position or [`None`] if there's no cell at the given position.
    fn get_cell_mut(&mut self, (row_index, column_index): (u16, u16)) -> Option<&mut Cell> {
        self.grid
            .get_mut(row_index as usize)
            .and_then(|r| r.get_mut(column_index as usize))
    }

    /// Returns the positions of the cells adjacent to the one at `position`, clipped to the field.
    pub fn get_adjacent_cells_positions(&self, position: (u16, u16)) -> Vec<(u16, u16)> {
        match self.get_cell(position) {
            Some(cell) => cell
                .get_adjacent_cells_positions()
                .into_iter()
                .filter_map(|adjacent_position| self.check_position(adjacent_position).ok())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Opens a single cell by its position. Doesn't touch the adjacent cells.
    ///
    /// Returns `false` if the cell had already been open or doesn't exist.
    pub fn open_cell(&mut self, position: (u16, u16)) -> bool {
        self.get_cell_mut(position)
            .map(|cell| cell.open())
            .unwrap_or(false)
    }

    /// Flags a closed cell. Returns whether the cell has changed.
    pub fn set_flag(&mut self, position: (u16, u16)) -> bool {
        self.get_cell_mut(position)
            .map(|cell| cell.set_flag())
            .unwrap_or(false)
    }

    /// Un-flags a closed cell. Returns whether the cell has changed.
    pub fn remove_flag(&mut self, position: (u16, u16)) -> bool {
        self.get_cell_mut(position)
            .map(|cell| cell.remove_flag())
            .unwrap_or(false)
    }

    /// Returns all the cells row by row.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter().flatten()
    }
}

impl Debug for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.grid.iter() {
            for cell in row {
                write!(f, "{:?} ", cell)?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (_, columns_amount, _) = self.get_size();
        let separator = "=".repeat((columns_amount as usize + 1) * 3);

        writeln!(f, "{}", separator)?;

        write!(f, "   ")?;
        for column_index in 0..columns_amount {
            write!(f, " {:02}", column_index)?;
        }
        writeln!(f)?;

        for (row_index, row) in self.grid.iter().enumerate() {
            write!(f, " {:02}", row_index)?;

            for cell in row {
                write!(f, "{:>3}", cell)?;
            }

            writeln!(f)?;
        }

        writeln!(f, "{}", separator)
    }
}
