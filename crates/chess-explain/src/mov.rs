//! Move representation as exchanged with UCI engines.

use serde::{Serialize, Serializer};
use shakmaty::{Role, Square};
use std::fmt;

/// A move in long algebraic form: origin, destination, optional promotion.
///
/// Castling is written king origin to king destination (`e1g1`), which is how
/// UCI engines report it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl Move {
    /// Creates a non-promoting move.
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promoting move.
    #[inline]
    pub const fn promoting(from: Square, to: Square, role: Role) -> Self {
        Move {
            from,
            to,
            promotion: Some(role),
        }
    }

    /// Returns the UCI notation for this move (e.g., "e2e4", "e7e8q").
    pub fn to_uci(self) -> String {
        let promo = match self.promotion {
            Some(Role::Knight) => "n",
            Some(Role::Bishop) => "b",
            Some(Role::Rook) => "r",
            Some(Role::Queen) => "q",
            Some(Role::Pawn) => "p",
            Some(Role::King) => "k",
            None => "",
        };
        format!("{}{}{}", self.from, self.to, promo)
    }

    /// Parses a move from UCI notation.
    ///
    /// Null moves (`0000`) and `(none)` are rejected.
    pub fn from_uci(s: &str) -> Option<Self> {
        if !s.is_ascii() || s.len() < 4 || s.len() > 5 {
            return None;
        }
        let from: Square = s[0..2].parse().ok()?;
        let to: Square = s[2..4].parse().ok()?;
        if from == to {
            return None;
        }
        let promotion = match s.chars().nth(4) {
            None => None,
            Some(c) => Some(match c.to_ascii_lowercase() {
                'n' => Role::Knight,
                'b' => Role::Bishop,
                'r' => Role::Rook,
                'q' => Role::Queen,
                _ => return None,
            }),
        };
        Some(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
