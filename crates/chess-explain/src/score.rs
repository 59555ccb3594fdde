//! Engine score normalization.
//!
//! UCI engines report scores relative to the side to move. Everything shown
//! to a player is phrased in absolute terms, so the conversion happens here
//! and nowhere else.

use serde::Serialize;
use shakmaty::Color;
use std::fmt;

use crate::board::side_name;

/// Represents an engine evaluation, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawn score (positive = side to move is better)
    Centipawns(i32),
    /// Mate in N moves (positive = side to move mates, negative = gets mated)
    Mate(i32),
}

impl Evaluation {
    /// Builds an evaluation from the two optional score fields of an engine
    /// report. A mate score wins over a centipawn score when both are present.
    pub fn from_uci_score(centipawns: Option<i32>, mate: Option<i32>) -> Option<Self> {
        match (centipawns, mate) {
            (_, Some(m)) => Some(Evaluation::Mate(m)),
            (Some(cp), None) => Some(Evaluation::Centipawns(cp)),
            (None, None) => None,
        }
    }

    /// Returns the centipawn value, if this is not a mate score.
    pub fn centipawns(&self) -> Option<i32> {
        match self {
            Evaluation::Centipawns(cp) => Some(*cp),
            Evaluation::Mate(_) => None,
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Evaluation::Mate(_))
    }
}

impl From<uci::Score> for Evaluation {
    fn from(score: uci::Score) -> Self {
        match score {
            uci::Score::Cp(cp) => Evaluation::Centipawns(cp),
            uci::Score::Mate(m) => Evaluation::Mate(m),
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Evaluation::Mate(m) => write!(f, "M{}", m),
        }
    }
}

/// Qualitative size of a centipawn advantage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvantageTier {
    RoughlyEqual,
    SlightlyBetter,
    Better,
    SignificantlyBetter,
    ClearlyWinning,
    CompletelyWinning,
}

impl AdvantageTier {
    /// Tier for a centipawn score; only the magnitude matters.
    pub fn from_centipawns(cp: i32) -> Self {
        match cp.unsigned_abs() {
            1000.. => AdvantageTier::CompletelyWinning,
            500..=999 => AdvantageTier::ClearlyWinning,
            300..=499 => AdvantageTier::SignificantlyBetter,
            150..=299 => AdvantageTier::Better,
            50..=149 => AdvantageTier::SlightlyBetter,
            _ => AdvantageTier::RoughlyEqual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdvantageTier::RoughlyEqual => "roughly equal",
            AdvantageTier::SlightlyBetter => "slightly better",
            AdvantageTier::Better => "better",
            AdvantageTier::SignificantlyBetter => "significantly better",
            AdvantageTier::ClearlyWinning => "clearly winning",
            AdvantageTier::CompletelyWinning => "completely winning",
        }
    }
}

impl fmt::Display for AdvantageTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The side a mover-relative centipawn score favors. Zero favors nobody.
pub fn favored_side(centipawns: i32, side_to_move: Color) -> Option<Color> {
    match centipawns {
        cp if cp > 0 => Some(side_to_move),
        cp if cp < 0 => Some(!side_to_move),
        _ => None,
    }
}

/// An evaluation restated in absolute terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advantage {
    Material {
        favored: Option<Color>,
        tier: AdvantageTier,
        /// Still relative to the side to move.
        centipawns: i32,
    },
    Mate {
        side_to_move: Color,
        /// Positive when the side to move delivers mate.
        moves: i32,
    },
}

impl Advantage {
    pub fn tier(&self) -> Option<AdvantageTier> {
        match self {
            Advantage::Material { tier, .. } => Some(*tier),
            Advantage::Mate { .. } => None,
        }
    }
}

impl fmt::Display for Advantage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Advantage::Material {
                favored: Some(side),
                tier,
                ..
            } => write!(f, "{} is ahead (position is {})", side_name(side), tier),
            Advantage::Material { favored: None, tier, .. } => {
                write!(f, "Neither side is ahead (position is {})", tier)
            }
            Advantage::Mate {
                side_to_move,
                moves,
            } if moves > 0 => write!(
                f,
                "{} can force mate in {} moves",
                side_name(side_to_move),
                moves
            ),
            Advantage::Mate {
                side_to_move,
                moves,
            } => write!(
                f,
                "{} is getting mated in {} moves",
                side_name(side_to_move),
                moves.unsigned_abs()
            ),
        }
    }
}

/// Converts a mover-relative evaluation into an [`Advantage`].
///
/// Mate scores never go through the centipawn tiers.
pub fn normalize_score(eval: Evaluation, side_to_move: Color) -> Advantage {
    match eval {
        Evaluation::Centipawns(cp) => Advantage::Material {
            favored: favored_side(cp, side_to_move),
            tier: AdvantageTier::from_centipawns(cp),
            centipawns: cp,
        },
        Evaluation::Mate(moves) => Advantage::Mate {
            side_to_move,
            moves,
        },
    }
}
