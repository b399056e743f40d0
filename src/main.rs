use clap::Parser;
use color_eyre::Result;
use mine_grid::{Minesweeper, MinesweeperAction, MinesweeperError, MinesweeperStatus};
use std::io::{self, BufRead};
use tracing::{warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value_t = 9)]
    height: u16,
    #[arg(short, long, default_value_t = 9)]
    width: u16,
    #[arg(short, long, default_value_t = 10)]
    mines: u32,
    /// Lay the mines out deterministically.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Log the game's internals to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Parses `<row> <column>` (an open request) or `<command> <row> <column>`.
fn parse_action(line: &str) -> Option<Result<MinesweeperAction, MinesweeperError>> {
    let tokens = line.split_whitespace().collect::<Vec<&str>>();

    let (command, row, column) = match tokens.as_slice() {
        [row, column] => ("o", row, column),
        [command, row, column] => (*command, row, column),
        _ => return None,
    };

    let position = (row.parse().ok()?, column.parse().ok()?);

    Some(MinesweeperAction::new(command, position))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let mut game = match args.seed {
        Some(seed) => Minesweeper::with_seed(args.height, args.width, args.mines, seed)?,
        None => Minesweeper::new(args.height, args.width, args.mines)?,
    };

    game.show(io::stdout().lock())?;
    println!("Enter the target cell's coordinates, optionally preceded by a command (`o`, `fs` or `fr`):");

    for line in io::stdin().lock().lines() {
        let line = line?;

        let action = match parse_action(&line) {
            Some(Ok(action)) => action,
            Some(Err(error)) => {
                println!("{}", error);
                continue;
            }
            None => {
                println!("Incorrect input! Please, try again.");
                continue;
            }
        };

        let victory = match game.take_action(action) {
            Ok(MinesweeperStatus::On) => None,
            Ok(MinesweeperStatus::End(victory)) => Some(*victory),
            Err(error) => {
                warn!(%error, "the action has been rejected");
                println!("{}", error);
                continue;
            }
        };

        game.show(io::stdout().lock())?;

        match victory {
            Some(false) => {
                println!("bomb exploded. game over.");
                break;
            }
            Some(true) => {
                println!("you win");
                break;
            }
            None => {}
        }
    }

    Ok(())
}
