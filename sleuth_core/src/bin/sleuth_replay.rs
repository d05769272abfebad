//! Replay a game log into a fresh agent and print what it makes of it.

use anyhow::{anyhow, bail, Context, Result};
use board_rules::{Board, CardId, Coord, Deck, Location};
use clap::Parser;
use sleuth_core::{Agent, SessionConfig, TurnCommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sleuth-replay")]
#[command(about = "Replay a whodunit game log and show the agent's deductions and next move")]
struct Cli {
    /// Session file: seating, the agent's hand and the face-up cards
    #[arg(long)]
    session: PathBuf,

    /// Game log, one event per line
    #[arg(long)]
    log: PathBuf,

    /// Board definition; the bundled reference board when omitted
    #[arg(long)]
    board: Option<PathBuf>,

    /// Where the agent stands: a room name or "row,col"
    #[arg(long)]
    position: Option<String>,

    /// Dice roll for the planned move
    #[arg(long)]
    roll: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let deck = Deck::reference();
    let board = match &cli.board {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("reading board {}", path.display()))?;
            Board::from_toml_str(&source, &deck)?
        }
        None => Board::reference(&deck)?,
    };
    let session = SessionConfig::load(&cli.session)?;
    let log = std::fs::read_to_string(&cli.log)
        .with_context(|| format!("reading log {}", cli.log.display()))?;
    let lines: Vec<&str> = log.lines().collect();

    let mut agent = Agent::from_session(board, deck, &session)?;
    agent.observe(&lines)?;

    let deck = agent.knowledge().deck();
    let solution = agent.solution();
    let name = |card: Option<CardId>| card.map(|c| deck.name(c)).unwrap_or("?");
    println!(
        "solution: {} with the {} in the {}",
        name(solution.suspect),
        name(solution.weapon),
        name(solution.room)
    );
    println!("{}", agent.knowledge().notebook().to_table_string());
    println!("{}", agent.knowledge().notebook().to_json()?);

    let Some(position) = &cli.position else {
        return Ok(());
    };
    let position = parse_position(agent.board(), position)?;
    let command = agent.begin_turn(position)?;
    let target = agent
        .strategy()
        .target()
        .and_then(|room| agent.board().room(room))
        .map(|room| room.name.clone())
        .unwrap_or_default();
    println!("command: {command}");
    println!("target: {target}");

    if let (TurnCommand::Roll, Some(roll)) = (command, cli.roll) {
        let plan = agent.plan_move(roll)?;
        println!("moves: {}", plan.moves);
    }
    Ok(())
}

fn parse_position(board: &Board, text: &str) -> Result<Location> {
    if let Some(room) = board.room_by_name(text) {
        return Ok(Location::Room(room.id));
    }
    let Some((row, col)) = text.split_once(',') else {
        bail!("'{text}' is neither a room nor a row,col position");
    };
    let row = row.trim().parse().map_err(|_| anyhow!("bad row in '{text}'"))?;
    let col = col.trim().parse().map_err(|_| anyhow!("bad column in '{text}'"))?;
    Ok(board.normalize(Location::Tile(Coord::new(row, col))))
}
