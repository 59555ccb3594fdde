//! Semantic facts about a candidate move.

use shakmaty::{Color, Role, Square};

use crate::board::{role_name, Board, BoardError};
use crate::Move;

/// Which side of the board the king castles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub fn as_str(self) -> &'static str {
        match self {
            CastleSide::Kingside => "kingside",
            CastleSide::Queenside => "queenside",
        }
    }
}

/// The four standard castling moves, king origin to king destination.
const CASTLING_MOVES: [(Square, Square, CastleSide); 4] = [
    (Square::E1, Square::G1, CastleSide::Kingside),
    (Square::E1, Square::C1, CastleSide::Queenside),
    (Square::E8, Square::G8, CastleSide::Kingside),
    (Square::E8, Square::C8, CastleSide::Queenside),
];

const CENTER: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

/// Development toward the center only counts before this move number.
const DEVELOPMENT_MOVE_LIMIT: u32 = 10;

/// Facts about one move in the context of one position.
///
/// Only valid for the board it was extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFeatures {
    pub from: Square,
    pub to: Square,
    /// The moving piece.
    pub piece: Role,
    pub color: Color,
    /// Occupant of the destination square before the move.
    pub captured: Option<Role>,
    pub gives_check: bool,
    pub promotion: Option<Role>,
    pub castle: Option<CastleSide>,
    /// Knight or bishop landing on a central square early in the game.
    pub central_development: bool,
}

impl MoveFeatures {
    pub fn piece_name(&self) -> &'static str {
        role_name(self.piece)
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    pub fn is_castle(&self) -> bool {
        self.castle.is_some()
    }

    pub fn is_minor_piece(&self) -> bool {
        matches!(self.piece, Role::Knight | Role::Bishop)
    }

    /// "<Piece> from <from> to <to>" plus capture, check and promotion clauses,
    /// in that order.
    pub fn describe(&self) -> String {
        let mut text = format!("{} from {} to {}", self.piece_name(), self.from, self.to);
        if let Some(captured) = self.captured {
            text.push_str(&format!(", capturing a {}", role_name(captured)));
        }
        if self.gives_check {
            text.push_str(", giving check");
        }
        if let Some(promoted) = self.promotion {
            text.push_str(&format!(", promoting to {}", role_name(promoted)));
        }
        text
    }
}

/// Derives [`MoveFeatures`] for `mv` played on `board`.
///
/// The board is left untouched; check detection plays the move on a copy.
pub fn extract_features<B: Board>(board: &B, mv: Move) -> Result<MoveFeatures, BoardError> {
    let mover = board
        .piece_at(mv.from)
        .ok_or(BoardError::EmptySquare(mv.from))?;
    let captured = board.piece_at(mv.to).map(|p| p.role);

    let mut preview = board.clone();
    preview.push(mv)?;
    let gives_check = preview.is_check();

    let castle = if mover.role == Role::King {
        castle_side(mv.from, mv.to)
    } else {
        None
    };

    let central_development = matches!(mover.role, Role::Knight | Role::Bishop)
        && CENTER.contains(&mv.to)
        && board.fullmove_number() < DEVELOPMENT_MOVE_LIMIT;

    Ok(MoveFeatures {
        from: mv.from,
        to: mv.to,
        piece: mover.role,
        color: mover.color,
        captured,
        gives_check,
        promotion: mv.promotion,
        castle,
        central_development,
    })
}

fn castle_side(from: Square, to: Square) -> Option<CastleSide> {
    CASTLING_MOVES
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, side)| *side)
}
