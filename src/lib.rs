pub mod field;

use field::{Field, FieldError};
use rand::{rngs::StdRng, thread_rng, Rng, SeedableRng};
use std::fmt::{Display, Formatter};
use std::io::{self, BufWriter, Write};
use tracing::{debug, info, instrument};

/// The enum represents the variants of everything that can possibly go wrong during the game.
#[derive(Debug, PartialEq, Eq)]
pub enum MinesweeperError {
    /// This is used when something's wrong with the field. The `FieldError` variant is just a wrapper for the original
    /// [`FieldError`] type. The [`From`] trait is implemented for the `MinesweeperError` to en-wrap with it
    /// `FieldError`s.
    FieldError(FieldError),
    /// The command token didn't name any known action. The value is the token itself.
    UnknownCommand(String),
    /// The error indicates that the game has already ended, and therefore the requested action could not be performed.
    GameAlreadyEnded,
}

impl From<FieldError> for MinesweeperError {
    fn from(field_error: FieldError) -> Self {
        MinesweeperError::FieldError(field_error)
    }
}

impl Display for MinesweeperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MinesweeperError::FieldError(field_error) => write!(f, "{}", field_error),
            MinesweeperError::UnknownCommand(token) => write!(f, "unknown command `{}`", token),
            MinesweeperError::GameAlreadyEnded => write!(f, "the game has already ended"),
        }
    }
}

impl std::error::Error for MinesweeperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MinesweeperError::FieldError(field_error) => Some(field_error),
            _ => None,
        }
    }
}

/// The status of a game.
#[derive(Debug, Eq, PartialEq)]
pub enum MinesweeperStatus {
    /// An ongoing game.
    On,
    /// A finished game. `true` for victory, `false` for loss.
    End(bool),
}

/// Describes all the possible action a user can take. Positions are `(row_index, column_index)` and may lie outside
/// of the field, in which case the action fails.
#[derive(Debug, PartialEq, Eq)]
pub enum MinesweeperAction {
    /// A request to open a cell by its position.
    OpenCell((i32, i32)),
    /// A request to flag a cell by its position.
    SetFlag((i32, i32)),
    /// A request to remove the flag from a cell by its position.
    RemoveFlag((i32, i32)),
}

impl MinesweeperAction {
    /// Builds an action from its command token: `o` to open, `fs` to set a flag and `fr` to remove one.
    pub fn new(token: &str, position: (i32, i32)) -> Result<Self, MinesweeperError> {
        match token {
            "o" => Ok(MinesweeperAction::OpenCell(position)),
            "fs" => Ok(MinesweeperAction::SetFlag(position)),
            "fr" => Ok(MinesweeperAction::RemoveFlag(position)),
            _ => Err(MinesweeperError::UnknownCommand(token.to_string())),
        }
    }
}

/// The struct representing a Minesweeper game itself.
#[derive(Debug)]
pub struct Minesweeper {
    /// The field used in the game.
    field: Field,
    /// The number of cells that are not open yet. Once it drops to the mines amount, the game is won.
    closed_cells_amount: u32,
    /// The number of flagged cells that actually hold a mine.
    flagged_mines_amount: u32,
    /// The game status.
    status: MinesweeperStatus,
}

impl Minesweeper {
    /// Creates a new game with the mines distributed using the thread-local random generator.
    pub fn new(rows_amount: u16, columns_amount: u16, mines_amount: u32) -> Result<Self, MinesweeperError> {
        Self::with_rng(rows_amount, columns_amount, mines_amount, &mut thread_rng())
    }

    /// Creates a new game whose mines are laid out deterministically by `seed`.
    pub fn with_seed(
        rows_amount: u16,
        columns_amount: u16,
        mines_amount: u32,
        seed: u64,
    ) -> Result<Self, MinesweeperError> {
        Self::with_rng(
            rows_amount,
            columns_amount,
            mines_amount,
            &mut StdRng::seed_from_u64(seed),
        )
    }

    /// Creates a new game, drawing the mines' positions from `rng`.
    ///
    /// Fails with [`FieldError::InvalidConfiguration`] if either dimension is zero or the mines amount is not less
    /// than the number of cells.
    #[instrument(skip(rng))]
    pub fn with_rng<R: Rng + ?Sized>(
        rows_amount: u16,
        columns_amount: u16,
        mines_amount: u32,
        rng: &mut R,
    ) -> Result<Self, MinesweeperError> {
        let mut field = Field::new(rows_amount, columns_amount, mines_amount)?;
        field.populate_with_mines(rng)?;

        info!("created a new game");

        Ok(Self::from_field(field))
    }

    fn from_field(field: Field) -> Self {
        let (_, _, cells_amount) = field.get_size();

        Minesweeper {
            field,
            closed_cells_amount: cells_amount,
            flagged_mines_amount: 0,
            status: MinesweeperStatus::On,
        }
    }

    /// The method performs the requested action, updates the status of the game and returns it.
    ///
    /// Might fail with a [`MinesweeperError`] in case something goes wrong, including any action requested after the
    /// game has ended.
    pub fn take_action(
        &mut self,
        action: MinesweeperAction,
    ) -> Result<&MinesweeperStatus, MinesweeperError> {
        if let MinesweeperStatus::End(_) = self.status {
            return Err(MinesweeperError::GameAlreadyEnded);
        }

        match action {
            MinesweeperAction::OpenCell(position) => {
                self.open_cell(position)?;
            }
            MinesweeperAction::SetFlag(position) => self.set_flag(position)?,
            MinesweeperAction::RemoveFlag(position) => self.remove_flag(position)?,
        };

        Ok(&self.status)
    }

    /// Opens a cell by its position and returns whether a mine has exploded.
    ///
    /// Opening an already open cell does nothing. Opening a mine-free cell with no mines around it also opens the
    /// whole surrounding area up to (and including) the numbered cells bordering it.
    ///
    /// Once the game is lost, it stays lost whatever gets opened afterwards.
    pub fn open_cell(&mut self, requested_position: (i32, i32)) -> Result<bool, MinesweeperError> {
        let position = self.check_position(requested_position)?;
        let cell = *self
            .field
            .get_cell(position)
            .ok_or(FieldError::OutOfBounds(requested_position))?;

        if cell.is_open() {
            debug!(?position, "the cell is open already");
            return Ok(false);
        }

        if cell.is_mined() {
            self.open(position);
            if self.status == MinesweeperStatus::On {
                self.status = MinesweeperStatus::End(false);
            }
            info!(?position, "a mine has exploded");

            return Ok(true);
        }

        self.open_adjacent_cells(position);

        if self.status == MinesweeperStatus::On && self.ends() {
            self.status = MinesweeperStatus::End(true);
            info!("all the mine-free cells are open");
        }

        Ok(false)
    }

    /// Flags a closed cell. Flagging an open or an already flagged cell does nothing.
    pub fn set_flag(&mut self, position: (i32, i32)) -> Result<(), MinesweeperError> {
        let position = self.check_position(position)?;

        if self.field.set_flag(position) && self.is_mined(position) {
            self.flagged_mines_amount += 1;
        }

        Ok(())
    }

    /// Removes the flag from a cell. Does nothing if there's no flag.
    pub fn remove_flag(&mut self, position: (i32, i32)) -> Result<(), MinesweeperError> {
        let position = self.check_position(position)?;

        if self.field.remove_flag(position) && self.is_mined(position) {
            self.flagged_mines_amount -= 1;
        }

        Ok(())
    }

    /// Checks whether the game is won, i.e., every cell that is still closed holds a mine.
    ///
    /// The game never reports the victory on its own; call it after each opened cell that didn't explode.
    pub fn ends(&self) -> bool {
        debug!(
            closed_cells = self.closed_cells_amount,
            mines = self.field.get_mines_amount(),
            flagged_mines = self.flagged_mines_amount,
            "checking the win condition"
        );

        self.closed_cells_amount == self.field.get_mines_amount()
    }

    /// Writes the field's current look to `writer`. The output is buffered and flushed once it's complete.
    pub fn show<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        write!(writer, "{}", self.field)?;
        writer.flush()
    }

    pub fn get_field(&self) -> &Field {
        &self.field
    }

    pub fn get_status(&self) -> &MinesweeperStatus {
        &self.status
    }

    pub fn get_closed_cells_amount(&self) -> u32 {
        self.closed_cells_amount
    }

    pub fn get_flagged_mines_amount(&self) -> u32 {
        self.flagged_mines_amount
    }

    pub fn get_mines_amount(&self) -> u32 {
        self.field.get_mines_amount()
    }

    fn check_position(&self, position: (i32, i32)) -> Result<(u16, u16), MinesweeperError> {
        self.field.check_position(position).map_err(|error| {
            debug!(?position, "rejected an out-of-bounds position");
            error.into()
        })
    }

    fn is_mined(&self, position: (u16, u16)) -> bool {
        self.field
            .get_cell(position)
            .map(|cell| cell.is_mined())
            .unwrap_or(false)
    }

    /// Opens a single cell keeping the counters in sync. Returns `false` if the cell had already been open.
    fn open(&mut self, position: (u16, u16)) -> bool {
        let flagged_mine = self
            .field
            .get_cell(position)
            .map(|cell| cell.is_flagged() && cell.is_mined())
            .unwrap_or(false);

        if !self.field.open_cell(position) {
            return false;
        }

        // Opening drops the flag.
        if flagged_mine {
            self.flagged_mines_amount -= 1;
        }
        self.closed_cells_amount -= 1;

        true
    }

    /// Opens the cell at `position` and, while the opened cells have no mines around them, keeps on opening their
    /// closed mine-free neighbours.
    fn open_adjacent_cells(&mut self, position: (u16, u16)) {
        let mut pending = vec![position];
        let mut opened = 0;

        while let Some(position) = pending.pop() {
            if !self.open(position) {
                continue;
            }
            opened += 1;

            if self.field.get_cell(position).map(|cell| cell.get_mines_around_amount()) != Some(0) {
                continue;
            }

            for adjacent_position in self.field.get_adjacent_cells_positions(position) {
                if let Some(cell) = self.field.get_cell(adjacent_position) {
                    if !cell.is_open() && !cell.is_mined() {
                        pending.push(adjacent_position);
                    }
                }
            }
        }

        debug!(?position, opened, "opened the cells");
    }
}

#[cfg(test)]
mod test {
    use super::{Minesweeper, MinesweeperAction, MinesweeperError, MinesweeperStatus};
    use crate::field::{Field, FieldError};

    /// Creates a game over a field with mines at the given positions.
    fn create_stub_game(rows_amount: u16, columns_amount: u16, mines: &[(u16, u16)]) -> Minesweeper {
        let mut field = Field::new(rows_amount, columns_amount, mines.len() as u32).unwrap();
        for position in mines {
            field.place_mine(*position);
        }

        Minesweeper::from_field(field)
    }

    fn open_positions(game: &Minesweeper) -> Vec<(u16, u16)> {
        game.get_field()
            .cells()
            .filter(|cell| cell.is_open())
            .map(|cell| cell.get_position())
            .collect()
    }

    #[test]
    fn a_new_game_has_everything_closed() {
        let game = Minesweeper::with_seed(3, 3, 1, 5).unwrap();

        assert_eq!(game.get_closed_cells_amount(), 9);
        assert_eq!(game.get_flagged_mines_amount(), 0);
        assert_eq!(game.get_mines_amount(), 1);
        assert_eq!(
            game.get_field().cells().filter(|cell| cell.is_mined()).count(),
            1
        );
        assert_eq!(game.get_status(), &MinesweeperStatus::On);
        assert!(!game.ends());
    }

    #[test]
    fn the_mines_around_values_sum_up_to_the_clipped_neighbourhoods() {
        for seed in 0..30 {
            let game = Minesweeper::with_seed(3, 3, 1, seed).unwrap();
            let field = game.get_field();
            let mine = field.cells().find(|cell| cell.is_mined()).unwrap();
            let total: usize = field
                .cells()
                .map(|cell| cell.get_mines_around_amount() as usize)
                .sum();

            assert_eq!(total, field.get_adjacent_cells_positions(mine.get_position()).len());
        }
    }

    #[test]
    fn the_constructor_rejects_bad_configurations() {
        assert!(matches!(
            Minesweeper::new(3, 3, 9),
            Err(MinesweeperError::FieldError(FieldError::InvalidConfiguration { .. }))
        ));
        assert!(matches!(
            Minesweeper::new(0, 3, 0),
            Err(MinesweeperError::FieldError(FieldError::InvalidConfiguration { .. }))
        ));
        assert!(Minesweeper::new(3, 3, 8).is_ok());
    }

    #[test]
    fn opening_a_mine_explodes_and_touches_nothing_else() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);

        assert_eq!(game.open_cell((0, 0)), Ok(true));
        assert_eq!(open_positions(&game), vec![(0, 0)]);
        assert_eq!(game.get_closed_cells_amount(), 8);
        assert_eq!(game.get_status(), &MinesweeperStatus::End(false));
    }

    #[test]
    fn opening_a_numbered_cell_opens_only_it() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);

        assert_eq!(game.open_cell((1, 1)), Ok(false));
        assert_eq!(open_positions(&game), vec![(1, 1)]);
        assert_eq!(game.get_closed_cells_amount(), 8);
    }

    #[test]
    fn opening_a_blank_cell_wins_a_three_by_three_corner_game() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);

        assert_eq!(game.open_cell((2, 2)), Ok(false));
        assert_eq!(game.get_closed_cells_amount(), 1);
        assert!(game.ends());
        assert_eq!(game.get_status(), &MinesweeperStatus::End(true));
        assert!(!game.get_field().get_cell((0, 0)).unwrap().is_open());
    }

    #[test]
    fn flood_fill_stops_at_the_numbered_border() {
        // A mine in the bottom-left corner and a wall of mines in column 5. Column 6 is only reachable through the wall.
        let mut game = create_stub_game(5, 7, &[(4, 0), (0, 5), (1, 5), (2, 5), (3, 5), (4, 5)]);

        game.open_cell((0, 0)).unwrap();

        let opened = open_positions(&game);
        // columns 0..=4 minus the mine at (4, 0)
        assert_eq!(opened.len(), 24);
        assert!(opened.iter().all(|(_, column_index)| *column_index <= 4));
        assert!(!opened.contains(&(4, 0)));
        assert_eq!(game.get_closed_cells_amount(), 35 - 24);
        assert!(!game.ends());

        let field = game.get_field();
        for position in opened {
            let cell = field.get_cell(position).unwrap();
            assert!(!cell.is_mined());
            if cell.get_mines_around_amount() == 0 {
                // every neighbour of an opened blank cell must be open too
                assert!(field
                    .get_adjacent_cells_positions(position)
                    .into_iter()
                    .all(|adjacent| field.get_cell(adjacent).unwrap().is_open()
                        || field.get_cell(adjacent).unwrap().is_mined()));
            }
        }
    }

    #[test]
    fn flood_fill_opens_flagged_cells_and_drops_the_flags() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);
        game.set_flag((2, 1)).unwrap();

        game.open_cell((2, 2)).unwrap();

        let cell = game.get_field().get_cell((2, 1)).unwrap();
        assert!(cell.is_open());
        assert!(!cell.is_flagged());
    }

    #[test]
    fn opening_a_flagged_mine_drops_the_flag_count() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);
        game.set_flag((0, 0)).unwrap();
        assert_eq!(game.get_flagged_mines_amount(), 1);

        assert_eq!(game.open_cell((0, 0)), Ok(true));
        assert_eq!(game.get_flagged_mines_amount(), 0);
    }

    #[test]
    fn reopening_is_idempotent() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);
        game.open_cell((1, 1)).unwrap();

        assert_eq!(game.open_cell((1, 1)), Ok(false));
        assert_eq!(game.get_closed_cells_amount(), 8);
        assert_eq!(open_positions(&game), vec![(1, 1)]);
    }

    #[test]
    fn out_of_bounds_positions_are_rejected_without_changes() {
        let mut game = create_stub_game(3, 4, &[(0, 0)]);

        for position in [(-1, 0), (3, 0), (0, 4), (0, -1)] {
            assert_eq!(
                game.open_cell(position),
                Err(MinesweeperError::FieldError(FieldError::OutOfBounds(position)))
            );
            assert!(game.set_flag(position).is_err());
            assert!(game.remove_flag(position).is_err());
        }

        assert_eq!(game.get_closed_cells_amount(), 12);
        assert!(open_positions(&game).is_empty());
        assert!(game.get_field().cells().all(|cell| !cell.is_flagged()));
    }

    #[test]
    fn flags_count_only_the_flagged_mines() {
        let mut game = create_stub_game(3, 3, &[(0, 0), (2, 2)]);

        game.set_flag((0, 0)).unwrap();
        game.set_flag((2, 2)).unwrap();
        game.set_flag((1, 1)).unwrap();
        assert_eq!(game.get_flagged_mines_amount(), 2);

        // flagging twice doesn't count twice
        game.set_flag((0, 0)).unwrap();
        assert_eq!(game.get_flagged_mines_amount(), 2);

        game.remove_flag((0, 0)).unwrap();
        game.remove_flag((2, 2)).unwrap();
        game.remove_flag((2, 2)).unwrap();
        assert_eq!(game.get_flagged_mines_amount(), 0);
        assert_eq!(game.get_closed_cells_amount(), 9);
    }

    #[test]
    fn flagging_an_open_cell_does_nothing() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);
        game.open_cell((1, 1)).unwrap();

        assert_eq!(game.set_flag((1, 1)), Ok(()));
        assert!(!game.get_field().get_cell((1, 1)).unwrap().is_flagged());
    }

    #[test]
    fn actions_get_parsed_from_command_tokens() {
        assert_eq!(
            MinesweeperAction::new("o", (1, 2)),
            Ok(MinesweeperAction::OpenCell((1, 2)))
        );
        assert_eq!(
            MinesweeperAction::new("fs", (1, 2)),
            Ok(MinesweeperAction::SetFlag((1, 2)))
        );
        assert_eq!(
            MinesweeperAction::new("fr", (1, 2)),
            Ok(MinesweeperAction::RemoveFlag((1, 2)))
        );
        assert_eq!(
            MinesweeperAction::new("x", (1, 2)),
            Err(MinesweeperError::UnknownCommand("x".to_string()))
        );
    }

    #[test]
    fn take_action_reports_the_status_and_refuses_to_continue_after_the_end() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);

        assert_eq!(
            game.take_action(MinesweeperAction::SetFlag((0, 0))),
            Ok(&MinesweeperStatus::On)
        );
        assert_eq!(
            game.take_action(MinesweeperAction::OpenCell((2, 2))),
            Ok(&MinesweeperStatus::End(true))
        );
        assert_eq!(
            game.take_action(MinesweeperAction::RemoveFlag((0, 0))),
            Err(MinesweeperError::GameAlreadyEnded)
        );
    }

    #[test]
    fn take_action_passes_out_of_bounds_errors_through() {
        let mut game = create_stub_game(3, 3, &[(0, 0)]);

        assert!(matches!(
            game.take_action(MinesweeperAction::OpenCell((3, 3))),
            Err(MinesweeperError::FieldError(FieldError::OutOfBounds((3, 3))))
        ));
        assert_eq!(game.get_status(), &MinesweeperStatus::On);
    }

    #[test]
    fn a_lost_game_stays_lost_after_more_opens() {
        let mut game = create_stub_game(1, 5, &[(0, 0), (0, 4)]);

        assert_eq!(game.open_cell((0, 0)), Ok(true));
        assert_eq!(game.get_status(), &MinesweeperStatus::End(false));

        game.open_cell((0, 1)).unwrap();
        game.open_cell((0, 3)).unwrap();

        // every remaining closed cell is a mine now
        assert!(game.ends());
        assert_eq!(game.get_status(), &MinesweeperStatus::End(false));
    }

    fn assert_mines_around_values_hold(game: &Minesweeper) {
        let field = game.get_field();

        for cell in field.cells() {
            let mined_neighbours = field
                .get_adjacent_cells_positions(cell.get_position())
                .into_iter()
                .filter(|adjacent| field.get_cell(*adjacent).unwrap().is_mined())
                .count() as u8;

            assert_eq!(cell.get_mines_around_amount(), mined_neighbours);
        }
    }

    #[test]
    fn mines_around_values_survive_opens_and_flags() {
        let mut game = Minesweeper::with_seed(8, 8, 10, 3).unwrap();
        assert_mines_around_values_hold(&game);

        let positions = game
            .get_field()
            .cells()
            .map(|cell| (cell.get_position(), cell.is_mined()))
            .collect::<Vec<_>>();
        let to_i32 = |(row_index, column_index): (u16, u16)| (row_index as i32, column_index as i32);

        for ((row_index, column_index), _) in &positions {
            if (row_index + column_index) % 3 == 0 {
                game.set_flag(to_i32((*row_index, *column_index))).unwrap();
            }
        }
        assert_mines_around_values_hold(&game);

        for (position, mined) in &positions {
            if !mined {
                assert_eq!(game.open_cell(to_i32(*position)), Ok(false));
            }
        }
        assert_mines_around_values_hold(&game);
        assert!(game.ends());

        for (position, _) in &positions {
            game.remove_flag(to_i32(*position)).unwrap();
        }
        let (mine, _) = positions.iter().find(|(_, mined)| *mined).unwrap();
        assert_eq!(game.open_cell(to_i32(*mine)), Ok(true));
        assert_mines_around_values_hold(&game);
    }

    #[test]
    fn show_writes_the_whole_field() {
        let mut game = create_stub_game(2, 2, &[(0, 0)]);
        game.open_cell((1, 1)).unwrap();

        let mut output = Vec::new();
        game.show(&mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "=========\n    00 01\n 00  ■  ■\n 01  ■  1\n=========\n"
        );
    }
}
