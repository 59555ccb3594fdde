//! Explanation scenarios on real positions, no engine involved.

use chess_explain::{
    classify_phase, explain_analysis, extract_features, generate, normalize_score,
    parse_position, AnalysisResult, Board, Evaluation, GamePhase, Move, StandardBoard,
};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, File, Position, Square};

fn mv(uci: &str) -> Move {
    Move::from_uci(uci).unwrap()
}

fn moves(ucis: &[&str]) -> Vec<Move> {
    ucis.iter().map(|m| mv(m)).collect()
}

fn explain(board: &StandardBoard, best: &str, next: &[&str], eval: Evaluation) -> Vec<String> {
    let best = mv(best);
    let features = extract_features(board, best).unwrap();
    let advantage = normalize_score(eval, board.turn());
    generate(
        board,
        best,
        &moves(next),
        &advantage,
        classify_phase(board),
        &features,
    )
    .into_statements()
}

#[test]
fn king_pawn_opening() {
    let board = StandardBoard::new();
    let statements = explain(&board, "e2e4", &["e7e5", "g1f3"], Evaluation::Centipawns(20));

    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "Pawn from e2 to e4.");
    assert_eq!(
        statements[1],
        "Looking ahead, your opponent plays e5 then you play Nf3."
    );
    assert!(statements[2].contains("Controlling the center with your pawns"));
}

#[test]
fn capture_with_check_in_every_phase() {
    let board = StandardBoard::from_fen(
        "rnbqkbnr/ppppp2p/6p1/5p1Q/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 0 3",
    )
    .unwrap();
    let best = mv("h5g6");
    let features = extract_features(&board, best).unwrap();
    let advantage = normalize_score(Evaluation::Centipawns(450), Color::White);

    for phase in [GamePhase::Opening, GamePhase::Middlegame, GamePhase::Endgame] {
        let explanation = generate(&board, best, &[], &advantage, phase, &features);
        assert_eq!(
            explanation.statements()[0],
            "Queen from h5 to g6, capturing a Pawn, giving check."
        );
    }
}

#[test]
fn middlegame_capture_explains_material() {
    let board = StandardBoard::from_fen("r4rk1/ppp2ppp/5n2/4p3/2B1P1b1/5N2/PPP2PPP/R4RK1 w - - 0 18")
        .unwrap();
    assert_eq!(classify_phase(&board), GamePhase::Middlegame);

    let statements = explain(&board, "c4f7", &[], Evaluation::Centipawns(60));
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0], "Bishop from c4 to f7, capturing a Pawn, giving check.");
    assert!(statements[1].starts_with("Taking their Pawn gives you a material advantage"));
}

#[test]
fn endgame_pawn_push_with_winning_score() {
    let board = StandardBoard::from_fen("8/5k2/8/3P4/8/8/5K2/8 w - - 0 52").unwrap();
    let statements = explain(&board, "d5d6", &["f7e8", "f2e3"], Evaluation::Centipawns(650));

    assert_eq!(statements[0], "Pawn from d5 to d6.");
    assert_eq!(
        statements[1],
        "Looking ahead, your opponent plays Ke8 then you play Ke3."
    );
    assert!(statements[2].starts_with("In the endgame, advancing pawns"));
    assert!(statements[3].starts_with("You have a winning advantage"));
}

#[test]
fn losing_side_gets_encouragement() {
    let board = parse_position("1. e4 e5 2. Nf3 d6 3. d4 Bg4").unwrap();
    let statements = explain(&board, "d4e5", &[], Evaluation::Centipawns(-180));
    assert_eq!(
        statements.last().unwrap(),
        "You're at a disadvantage, but this move helps minimize your opponent's edge. Look for counterplay."
    );
}

#[test]
fn mate_in_three_for_side_to_move() {
    let board = StandardBoard::from_fen("6k1/5ppp/8/8/8/8/5PPP/3RR1K1 w - - 0 30").unwrap();
    let explained = explain_analysis(
        &board,
        &AnalysisResult {
            best_move: mv("e1e8"),
            next_moves: Vec::new(),
            evaluation: Evaluation::Mate(3),
            depth: 20,
            nodes: 1,
        },
    )
    .unwrap();
    assert_eq!(explained.advantage, "White can force mate in 3 moves");
    // Mate scores never produce evaluation advice.
    assert!(!explained
        .statements
        .statements()
        .iter()
        .any(|s| s.starts_with("You have")));
}

#[test]
fn black_is_mated_text() {
    let advantage = normalize_score(Evaluation::Mate(-4), Color::Black);
    assert_eq!(advantage.to_string(), "Black is getting mated in 4 moves");
}

#[test]
fn preview_is_capped_at_three_plies() {
    let board = StandardBoard::new();
    let statements = explain(
        &board,
        "e2e4",
        &["e7e5", "g1f3", "b8c6", "f1b5", "a7a6"],
        Evaluation::Centipawns(30),
    );
    assert_eq!(statements[1].matches(" then ").count(), 2);
    assert!(statements[1].ends_with("your opponent plays Nc6."));
}

#[test]
fn unplayable_continuation_drops_preview() {
    let board = StandardBoard::new();
    let statements = explain(&board, "e2e4", &["e2e4"], Evaluation::Centipawns(30));
    assert_eq!(statements.len(), 2);
    assert!(!statements.iter().any(|s| s.starts_with("Looking ahead")));
}

#[test]
fn description_names_piece_then_squares_for_every_legal_move() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/pppq1ppp/2npbn2/4p3/2B1P3/2NP1N2/PPPQ1PPP/R3K2R w KQkq - 4 9",
        "8/P6k/8/8/8/8/8/K7 w - - 0 60",
    ];

    for fen in fens {
        let pos: Chess = fen
            .parse::<Fen>()
            .unwrap()
            .into_position(CastlingMode::Standard)
            .unwrap();
        let board = StandardBoard::from_fen(fen).unwrap();

        for legal in pos.legal_moves() {
            let from = legal.from().unwrap();
            let to = match legal {
                shakmaty::Move::Castle { king, rook } => {
                    let file = if rook > king { File::G } else { File::C };
                    Square::from_coords(file, king.rank())
                }
                _ => legal.to(),
            };
            let best = Move {
                from,
                to,
                promotion: legal.promotion(),
            };
            let piece = extract_features(&board, best).unwrap().piece_name();
            let statements = explain(&board, &best.to_uci(), &[], Evaluation::Centipawns(0));
            let expected = format!("{} from {} to {}", piece, from, to);
            assert!(
                statements[0].starts_with(&expected),
                "{} does not start with {}",
                statements[0],
                expected
            );
        }
    }
}
