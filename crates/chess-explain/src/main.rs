//! chess-explain - Explains the best move in a chess position.
//!
//! Reads settings from `chess-explain.toml` (if present), analyzes the given
//! position with a UCI engine and prints the best move with a plain-language
//! explanation.

use anyhow::{bail, Context};
use chess_explain::{explain_best_move, parse_position, Board, BestMoveExplanation, ExplainerConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Explain the best move in a chess position.
#[derive(Parser)]
#[command(name = "chess-explain")]
#[command(about = "Explains the engine's best move in plain language")]
struct Args {
    /// Position as FEN or PGN from the start (default: starting position)
    #[arg(default_value = "")]
    position: String,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// UCI engine executable (overrides config)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Search depth (overrides config)
    #[arg(long)]
    depth: Option<u32>,

    /// Search time in milliseconds (overrides config)
    #[arg(long)]
    movetime: Option<u64>,

    /// Number of ranked lines to request (overrides config)
    #[arg(long)]
    multipv: Option<u32>,

    /// Print the explanation as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExplainerConfig::load_from(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ExplainerConfig::load().context("Failed to load chess-explain.toml")?,
    };
    if let Some(engine) = args.engine {
        config.engine.path = engine;
    }
    if let Some(depth) = args.depth {
        config.analysis.depth = depth;
    }
    if let Some(movetime) = args.movetime {
        config.analysis.movetime_ms = movetime;
    }
    if let Some(multipv) = args.multipv {
        config.analysis.multipv = multipv;
    }

    let Some(board) = parse_position(&args.position) else {
        bail!("Not a valid FEN or PGN: {}", args.position);
    };
    tracing::info!("Position: {}", board.fen());

    let explained = explain_best_move(&board, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&explained)?);
    } else {
        print_explanation(&board, &explained);
    }
    Ok(())
}

fn print_explanation<B: Board>(board: &B, explained: &BestMoveExplanation) {
    let side = chess_explain::board::side_name(board.turn());
    println!("{} to move", side);
    println!("FEN: {}", board.fen());
    println!();
    println!(
        "Best move: {} ({})",
        explained.best_move_san, explained.move_description
    );
    println!("Evaluation: {}", explained.advantage);
    println!("Phase: {}", explained.phase);
    println!();
    for (i, statement) in explained.statements.statements().iter().enumerate() {
        println!("{}. {}", i + 1, statement);
    }
}
