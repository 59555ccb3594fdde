//! Natural-language explanation of a best move.
//!
//! Statements come out in a fixed order: the move itself, a short look at the
//! expected continuation, one piece of phase advice, and at most one remark
//! about the evaluation. Phase and evaluation advice are driven by ordered rule
//! tables where the first matching rule wins.

use serde::Serialize;
use shakmaty::{Color, File, Role};
use tracing::debug;

use crate::board::{role_name, side_name, Board};
use crate::features::MoveFeatures;
use crate::phase::GamePhase;
use crate::score::Advantage;
use crate::Move;

/// Plies of the continuation rendered in the preview.
pub const PREVIEW_PLIES: usize = 3;

/// Ordered explanation statements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Explanation {
    statements: Vec<String>,
}

impl Explanation {
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }

    fn push(&mut self, statement: String) {
        self.statements.push(statement);
    }
}

/// A phase advice rule: when `applies` holds, `statement` is emitted.
struct Rule {
    applies: fn(&MoveFeatures) -> bool,
    statement: fn(&MoveFeatures) -> String,
}

const OPENING_RULES: &[Rule] = &[
    Rule {
        applies: MoveFeatures::is_castle,
        statement: castling_advice,
    },
    Rule {
        applies: is_central_pawn_push,
        statement: central_pawn_advice,
    },
    Rule {
        applies: is_central_development,
        statement: central_development_advice,
    },
    Rule {
        applies: MoveFeatures::is_minor_piece,
        statement: development_advice,
    },
];

const MIDDLEGAME_RULES: &[Rule] = &[
    Rule {
        applies: MoveFeatures::is_capture,
        statement: material_gain_advice,
    },
    Rule {
        applies: gives_check,
        statement: check_advice,
    },
    Rule {
        applies: MoveFeatures::is_minor_piece,
        statement: repositioning_advice,
    },
];

const ENDGAME_RULES: &[Rule] = &[
    Rule {
        applies: is_pawn_move,
        statement: pawn_advance_advice,
    },
    Rule {
        applies: is_king_move,
        statement: king_activity_advice,
    },
    Rule {
        applies: MoveFeatures::is_capture,
        statement: trade_advice,
    },
    Rule {
        applies: always,
        statement: activity_advice,
    },
];

fn rules_for(phase: GamePhase) -> &'static [Rule] {
    match phase {
        GamePhase::Opening => OPENING_RULES,
        GamePhase::Middlegame => MIDDLEGAME_RULES,
        GamePhase::Endgame => ENDGAME_RULES,
    }
}

fn is_central_pawn_push(f: &MoveFeatures) -> bool {
    f.piece == Role::Pawn && matches!(f.from.file(), File::D | File::E)
}

fn is_central_development(f: &MoveFeatures) -> bool {
    f.central_development
}

fn gives_check(f: &MoveFeatures) -> bool {
    f.gives_check
}

fn is_pawn_move(f: &MoveFeatures) -> bool {
    f.piece == Role::Pawn
}

fn is_king_move(f: &MoveFeatures) -> bool {
    f.piece == Role::King
}

fn always(_: &MoveFeatures) -> bool {
    true
}

fn captured_name(f: &MoveFeatures) -> &'static str {
    f.captured.map(role_name).unwrap_or("piece")
}

fn castling_advice(f: &MoveFeatures) -> String {
    let side = f.castle.map(|c| c.as_str()).unwrap_or("here");
    format!(
        "Castling {} keeps your king safe and connects your rooks. This is a key opening goal.",
        side
    )
}

fn central_pawn_advice(_: &MoveFeatures) -> String {
    "Controlling the center with your pawns gives you more space and options for your pieces."
        .to_string()
}

fn central_development_advice(f: &MoveFeatures) -> String {
    format!(
        "This move develops your {} toward the center, improving your control of important squares.",
        f.piece_name()
    )
}

fn development_advice(f: &MoveFeatures) -> String {
    format!(
        "This move develops your {}, which is important in the opening. Aim to control the center and develop all your pieces before launching an attack.",
        f.piece_name()
    )
}

fn material_gain_advice(f: &MoveFeatures) -> String {
    format!(
        "Taking their {} gives you a material advantage, which can be converted to a win with careful play.",
        captured_name(f)
    )
}

fn check_advice(_: &MoveFeatures) -> String {
    "Checking the king forces your opponent to respond to the threat, which gives you initiative to execute your plan."
        .to_string()
}

fn repositioning_advice(f: &MoveFeatures) -> String {
    format!(
        "Repositioning your {} to a more active square improves your piece coordination and creates new threats.",
        f.piece_name()
    )
}

fn pawn_advance_advice(_: &MoveFeatures) -> String {
    "In the endgame, advancing pawns toward promotion is often decisive. Each pawn that promotes gains you a queen!"
        .to_string()
}

fn king_activity_advice(_: &MoveFeatures) -> String {
    "In the endgame, the king becomes a powerful piece. Don't be afraid to use it actively."
        .to_string()
}

fn trade_advice(f: &MoveFeatures) -> String {
    format!(
        "In the endgame, trading pieces when ahead (or avoiding trades when behind) is a key principle. This capture of their {} is following that strategy.",
        captured_name(f)
    )
}

fn activity_advice(_: &MoveFeatures) -> String {
    "In the endgame, piece activity and coordination are crucial. This move improves your piece position."
        .to_string()
}

/// Evaluation advice: applies when the score magnitude exceeds `above`.
struct EvaluationRule {
    above: u32,
    ahead: &'static str,
    behind: &'static str,
}

const EVALUATION_RULES: &[EvaluationRule] = &[
    EvaluationRule {
        above: 300,
        ahead: "You have a winning advantage. Focus on simplifying the position while maintaining your advantage.",
        behind: "Your position is challenging, but this move gives you the best fighting chance.",
    },
    EvaluationRule {
        above: 100,
        ahead: "You have a clear advantage. Look for tactical opportunities while avoiding piece trades when you're ahead.",
        behind: "You're at a disadvantage, but this move helps minimize your opponent's edge. Look for counterplay.",
    },
];

/// One phase statement for the move; falls back to a generic remark.
pub fn phase_advice(features: &MoveFeatures, phase: GamePhase) -> String {
    rules_for(phase)
        .iter()
        .find(|rule| (rule.applies)(features))
        .map(|rule| (rule.statement)(features))
        .unwrap_or_else(|| generic_advice(features.color))
}

fn generic_advice(side: Color) -> String {
    format!(
        "This is the best move for {} in this position according to computer analysis.",
        side_name(side)
    )
}

/// Remark on a clearly lopsided centipawn evaluation, phrased for the side to
/// move. Mate scores and small advantages produce nothing.
pub fn evaluation_advice(advantage: &Advantage, side_to_move: Color) -> Option<&'static str> {
    let Advantage::Material {
        favored,
        centipawns,
        ..
    } = *advantage
    else {
        return None;
    };
    let magnitude = centipawns.unsigned_abs();
    EVALUATION_RULES
        .iter()
        .find(|rule| magnitude > rule.above)
        .map(|rule| {
            if favored == Some(side_to_move) {
                rule.ahead
            } else {
                rule.behind
            }
        })
}

/// Renders up to [`PREVIEW_PLIES`] moves of the continuation from `board`.
///
/// Each move is notated against a rolling copy of the board and then played
/// on it. The first unnotatable move ends the preview.
pub fn line_preview<B: Board>(board: &B, moves: &[Move]) -> Option<String> {
    let mut rolling = board.clone();
    let mut plies = Vec::with_capacity(PREVIEW_PLIES);

    for (i, &mv) in moves.iter().take(PREVIEW_PLIES).enumerate() {
        let san = match rolling.san(mv).and_then(|san| rolling.push(mv).map(|()| san)) {
            Ok(san) => san,
            Err(e) => {
                debug!(%mv, error = %e, "Truncating line preview");
                break;
            }
        };
        let mover = if i % 2 == 0 {
            "your opponent plays"
        } else {
            "you play"
        };
        plies.push(format!("{} {}", mover, san));
    }

    if plies.is_empty() {
        None
    } else {
        Some(format!("Looking ahead, {}.", plies.join(" then ")))
    }
}

/// Composes the explanation for `best` played on `board`.
///
/// `features` must have been extracted for `best` on this same board.
pub fn generate<B: Board>(
    board: &B,
    best: Move,
    next_moves: &[Move],
    advantage: &Advantage,
    phase: GamePhase,
    features: &MoveFeatures,
) -> Explanation {
    let mut explanation = Explanation::default();
    explanation.push(format!("{}.", features.describe()));

    if !next_moves.is_empty() {
        let mut after = board.clone();
        match after.push(best) {
            Ok(()) => {
                if let Some(preview) = line_preview(&after, next_moves) {
                    explanation.push(preview);
                }
            }
            Err(e) => debug!(%best, error = %e, "Skipping line preview"),
        }
    }

    explanation.push(phase_advice(features, phase));

    if let Some(advice) = evaluation_advice(advantage, board.turn()) {
        explanation.push(advice.to_string());
    }

    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::StandardBoard;
    use crate::features::extract_features;
    use crate::score::{normalize_score, Evaluation};

    fn mv(uci: &str) -> Move {
        Move::from_uci(uci).unwrap()
    }

    fn features(fen: &str, uci: &str) -> MoveFeatures {
        extract_features(&StandardBoard::from_fen(fen).unwrap(), mv(uci)).unwrap()
    }

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn opening_prefers_castling() {
        let f = features("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 8", "e1g1");
        assert!(phase_advice(&f, GamePhase::Opening).starts_with("Castling kingside keeps"));
    }

    #[test]
    fn opening_central_pawn_and_development() {
        let pawn = features(START, "d2d4");
        assert!(phase_advice(&pawn, GamePhase::Opening).contains("center with your pawns"));

        let knight = features(START, "g1f3");
        assert_eq!(
            phase_advice(&knight, GamePhase::Opening),
            "This move develops your Knight, which is important in the opening. Aim to control the center and develop all your pieces before launching an attack."
        );
    }

    #[test]
    fn opening_wing_pawn_falls_back_to_generic() {
        let f = features(START, "a2a3");
        assert_eq!(
            phase_advice(&f, GamePhase::Opening),
            "This is the best move for White in this position according to computer analysis."
        );
    }

    #[test]
    fn middlegame_capture_beats_check() {
        let f = features(
            "rnbqkbnr/ppppp2p/6p1/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 0 3",
            "h5g6",
        );
        assert!(phase_advice(&f, GamePhase::Middlegame).starts_with("Taking their Pawn"));
    }

    #[test]
    fn endgame_rules_always_match() {
        let king = features("4k3/8/8/8/8/8/8/4K2R w - - 0 50", "e1f2");
        assert!(phase_advice(&king, GamePhase::Endgame).contains("the king becomes a powerful piece"));

        let rook = features("4k3/8/8/8/8/8/8/4K2R w - - 0 50", "h1h5");
        assert!(phase_advice(&rook, GamePhase::Endgame).contains("piece activity"));
    }

    #[test]
    fn evaluation_advice_thresholds() {
        let white = Color::White;
        let small = normalize_score(Evaluation::Centipawns(100), white);
        assert_eq!(evaluation_advice(&small, white), None);

        let clear = normalize_score(Evaluation::Centipawns(101), white);
        assert!(evaluation_advice(&clear, white)
            .unwrap()
            .starts_with("You have a clear advantage"));

        let losing = normalize_score(Evaluation::Centipawns(-301), white);
        assert!(evaluation_advice(&losing, white)
            .unwrap()
            .starts_with("Your position is challenging"));

        let mate = normalize_score(Evaluation::Mate(2), white);
        assert_eq!(evaluation_advice(&mate, white), None);
    }

    #[test]
    fn preview_alternates_and_caps_at_three_plies() {
        let after = StandardBoard::from_movetext("1. e4").unwrap();
        let line = [mv("e7e5"), mv("g1f3"), mv("b8c6"), mv("f1b5")];
        assert_eq!(
            line_preview(&after, &line).unwrap(),
            "Looking ahead, your opponent plays e5 then you play Nf3 then your opponent plays Nc6."
        );
    }

    #[test]
    fn preview_truncates_at_first_bad_move() {
        let after = StandardBoard::from_movetext("1. e4").unwrap();
        let line = [mv("e7e5"), mv("e1e3"), mv("b8c6")];
        assert_eq!(
            line_preview(&after, &line).unwrap(),
            "Looking ahead, your opponent plays e5."
        );
        assert_eq!(line_preview(&after, &[mv("a1a8")]), None);
    }

    #[test]
    fn statements_serialize_as_a_list() {
        let board = StandardBoard::new();
        let f = extract_features(&board, mv("e2e4")).unwrap();
        let adv = normalize_score(Evaluation::Centipawns(20), Color::White);
        let explanation = generate(&board, mv("e2e4"), &[], &adv, GamePhase::Opening, &f);
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }
}
