//! Beginner-friendly explanations of the best move in a chess position.
//!
//! A UCI engine such as Stockfish finds the best move; this crate turns the
//! engine's answer into plain-language statements a novice can follow.
//!
//! # Overview
//!
//! - [`EngineSession`] - Owned UCI engine process with a strict lifecycle
//! - [`extract_features`] - Facts about a move (capture, check, castling, ...)
//! - [`classify_phase`] - Opening, middlegame or endgame
//! - [`normalize_score`] - Engine score restated as an absolute advantage
//! - [`generate`] - Ordered explanation statements
//! - [`explain_best_move`] - All of the above in one call
//!
//! # Example
//!
//! ```ignore
//! use chess_explain::{explain_best_move, parse_position, ExplainerConfig};
//!
//! let board = parse_position("1. e4 e5 2. Nf3").unwrap();
//! let explained = explain_best_move(&board, &ExplainerConfig::default())?;
//! println!("{} ({})", explained.best_move_san, explained.advantage);
//! for statement in explained.statements.statements() {
//!     println!("- {}", statement);
//! }
//! ```

pub mod board;
pub mod config;
pub mod engine;
pub mod explain;
pub mod explanation;
pub mod features;
mod mov;
pub mod phase;
pub mod score;

pub use board::{parse_position, Board, BoardError, StandardBoard};
pub use config::{ConfigError, ExplainerConfig};
pub use engine::{AnalysisResult, EngineError, EngineSession, SearchLimits, SessionState};
pub use explain::{
    explain_analysis, explain_best_move, explain_with_session, BestMoveExplanation, ExplainError,
};
pub use explanation::{generate, Explanation};
pub use features::{extract_features, MoveFeatures};
pub use mov::Move;
pub use phase::{classify_phase, GamePhase};
pub use score::{normalize_score, Advantage, AdvantageTier, Evaluation};
