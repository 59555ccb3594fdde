//! Game phase classification from material and move number.

use serde::Serialize;
use std::fmt;

use crate::board::Board;

/// At least this many pieces on the board is still the opening.
pub const OPENING_MIN_PIECES: u32 = 26;
/// Up to this move number is always the opening.
pub const OPENING_MAX_MOVE: u32 = 10;
/// At least this many pieces (and past the opening) is the middlegame.
pub const MIDDLEGAME_MIN_PIECES: u32 = 14;
/// From this move number on the game is treated as an endgame.
pub const LATE_GAME_MOVE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Opening => "opening",
            GamePhase::Middlegame => "middlegame",
            GamePhase::Endgame => "endgame",
        };
        write!(f, "{}", name)
    }
}

/// Classifies the phase of the game on `board`.
pub fn classify_phase<B: Board>(board: &B) -> GamePhase {
    phase_for(board.piece_count(), board.fullmove_number())
}

/// Phase from total piece count (both colors) and fullmove number.
///
/// The late-game rule is applied last and wins over any piece count.
pub fn phase_for(total_pieces: u32, fullmove_number: u32) -> GamePhase {
    let phase = if total_pieces >= OPENING_MIN_PIECES || fullmove_number <= OPENING_MAX_MOVE {
        GamePhase::Opening
    } else if total_pieces >= MIDDLEGAME_MIN_PIECES {
        GamePhase::Middlegame
    } else {
        GamePhase::Endgame
    };

    if fullmove_number >= LATE_GAME_MOVE {
        GamePhase::Endgame
    } else {
        phase
    }
}
