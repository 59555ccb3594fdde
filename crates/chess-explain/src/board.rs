//! The chess rules provider seam.
//!
//! Everything the explainer needs to know about chess rules goes through the
//! [`Board`] trait: piece lookup, move application, check detection, SAN and
//! FEN. [`StandardBoard`] binds it to `shakmaty`.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Piece, Position, Role, Square};
use thiserror::Error;

use crate::Move;

/// Errors raised by the rules provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// The move is not legal in the current position.
    #[error("Illegal move: {0}")]
    IllegalMove(Move),
    /// The move could not be rendered in SAN.
    #[error("Cannot notate move {0}")]
    NotationFailure(Move),
    /// The origin square of the move is empty.
    #[error("No piece on {0}")]
    EmptySquare(Square),
}

/// Board state as consumed by the explainer.
///
/// `Clone` is the disposable copy used for previews; implementations must make
/// clones fully independent of the original.
pub trait Board: Clone {
    /// The piece standing on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Plays a legal move.
    fn push(&mut self, mv: Move) -> Result<(), BoardError>;

    /// Returns true if the side to move is in check.
    fn is_check(&self) -> bool;

    /// SAN of a legal move in this position, with `+`/`#` suffix.
    fn san(&self, mv: Move) -> Result<String, BoardError>;

    /// FEN of the current position.
    fn fen(&self) -> String;

    /// Fullmove number (starts at 1, increments after Black's move).
    fn fullmove_number(&self) -> u32;

    /// The side to move.
    fn turn(&self) -> Color;

    /// Number of pieces of both colors on the board, kings and pawns included.
    fn piece_count(&self) -> u32;
}

/// Standard chess backed by `shakmaty`.
#[derive(Debug, Clone, Default)]
pub struct StandardBoard {
    pos: Chess,
}

impl StandardBoard {
    /// The standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board from a FEN string.
    pub fn from_fen(fen: &str) -> Option<Self> {
        let fen: Fen = fen.trim().parse().ok()?;
        let pos: Chess = fen.into_position(CastlingMode::Standard).ok()?;
        Some(Self { pos })
    }

    /// Plays the mainline of PGN movetext from the starting position.
    ///
    /// Tag pairs, comments, NAGs and variations are skipped. Move numbers
    /// (`1.`, `12...`), annotations (`!`, `?`), check suffixes and a result
    /// token are accepted and ignored.
    pub fn from_movetext(text: &str) -> Option<Self> {
        let mut pos = Chess::default();
        let mainline = strip_pgn_extras(text);
        for token in mainline.split_whitespace() {
            if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
                continue;
            }
            let token = token
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
                .trim_end_matches(['+', '#', '!', '?']);
            if token.is_empty() {
                continue;
            }
            let san: San = token.parse().ok()?;
            let m = san.to_move(&pos).ok()?;
            pos.play_unchecked(&m);
        }
        Some(Self { pos })
    }

    /// Finds the legal `shakmaty` move matching a UCI-style move.
    fn to_legal(&self, mv: Move) -> Option<shakmaty::Move> {
        self.pos
            .legal_moves()
            .into_iter()
            .find(|candidate| matches_uci(candidate, mv))
    }
}

/// Parses a position given as FEN or as PGN played from the start.
///
/// Blank input is the standard starting position. Returns `None` when the
/// text is neither.
pub fn parse_position(text: &str) -> Option<StandardBoard> {
    let text = text.trim();
    if text.is_empty() {
        return Some(StandardBoard::new());
    }
    StandardBoard::from_fen(text).or_else(|| StandardBoard::from_movetext(text))
}

/// Movetext with everything but mainline tokens replaced by whitespace.
fn strip_pgn_extras(pgn: &str) -> String {
    let mut out = String::with_capacity(pgn.len());
    let mut chars = pgn.chars().peekable();
    let mut variation_depth = 0u32;

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let mut quoted = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' if quoted => {
                            chars.next();
                        }
                        '"' => quoted = !quoted,
                        ']' if !quoted => break,
                        _ => {}
                    }
                }
            }
            '{' => {
                chars.by_ref().find(|&c| c == '}');
            }
            ';' => {
                chars.by_ref().find(|&c| c == '\n');
            }
            '$' => while chars.next_if(char::is_ascii_digit).is_some() {},
            '(' => variation_depth += 1,
            ')' => variation_depth = variation_depth.saturating_sub(1),
            _ if variation_depth > 0 => continue,
            c => {
                out.push(c);
                continue;
            }
        }
        out.push(' ');
    }
    out
}

fn matches_uci(candidate: &shakmaty::Move, mv: Move) -> bool {
    if candidate.from() != Some(mv.from) || candidate.promotion() != mv.promotion {
        return false;
    }
    match *candidate {
        shakmaty::Move::Castle { king, rook } => {
            let file = if rook > king { File::G } else { File::C };
            mv.to == Square::from_coords(file, king.rank()) || mv.to == rook
        }
        _ => candidate.to() == mv.to,
    }
}

impl Board for StandardBoard {
    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pos.board().piece_at(square)
    }

    fn push(&mut self, mv: Move) -> Result<(), BoardError> {
        let m = self.to_legal(mv).ok_or(BoardError::IllegalMove(mv))?;
        self.pos.play_unchecked(&m);
        Ok(())
    }

    fn is_check(&self) -> bool {
        self.pos.is_check()
    }

    fn san(&self, mv: Move) -> Result<String, BoardError> {
        let m = self.to_legal(mv).ok_or(BoardError::NotationFailure(mv))?;
        let mut san = San::from_move(&self.pos, &m).to_string();
        let mut after = self.pos.clone();
        after.play_unchecked(&m);
        if after.is_checkmate() {
            san.push('#');
        } else if after.is_check() {
            san.push('+');
        }
        Ok(san)
    }

    fn fen(&self) -> String {
        Fen::from_position(self.pos.clone(), EnPassantMode::Legal).to_string()
    }

    fn fullmove_number(&self) -> u32 {
        self.pos.fullmoves().get()
    }

    fn turn(&self) -> Color {
        self.pos.turn()
    }

    fn piece_count(&self) -> u32 {
        self.pos.board().occupied().count() as u32
    }
}

/// Capitalized English name of a piece role.
pub fn role_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "Pawn",
        Role::Knight => "Knight",
        Role::Bishop => "Bishop",
        Role::Rook => "Rook",
        Role::Queen => "Queen",
        Role::King => "King",
    }
}

/// "White" or "Black".
pub fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
