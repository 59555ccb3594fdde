//! One-call best move explanation.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Board, BoardError};
use crate::config::ExplainerConfig;
use crate::engine::{AnalysisResult, EngineError, EngineSession, SearchLimits};
use crate::explanation::{generate, Explanation};
use crate::features::extract_features;
use crate::phase::{classify_phase, GamePhase};
use crate::score::{normalize_score, Evaluation};
use crate::Move;

/// Errors surfaced to callers of the explainer.
#[derive(Error, Debug)]
pub enum ExplainError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// The best move in a position and why it is good.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMoveExplanation {
    pub best_move: Move,
    pub best_move_san: String,
    /// Who is better, in absolute terms.
    pub advantage: String,
    /// The move in words, without a trailing period.
    pub move_description: String,
    pub statements: Explanation,
    pub phase: GamePhase,
    /// Relative to the side to move.
    pub evaluation: Evaluation,
    /// Best move followed by the expected continuation.
    pub principal_variation: Vec<Move>,
}

/// Starts an engine from `config`, analyzes `board` and explains the best
/// move. The engine is shut down before this returns, on every path.
pub fn explain_best_move<B: Board>(
    board: &B,
    config: &ExplainerConfig,
) -> Result<BestMoveExplanation, ExplainError> {
    let mut session = EngineSession::start(
        &config.engine.path,
        &config.engine.args,
        config.engine.startup_timeout(),
    )?
    .with_response_grace(config.engine.response_grace());

    let unsupported = session.configure(&config.engine.option_pairs())?;
    if !unsupported.is_empty() {
        debug!(count = unsupported.len(), "Continuing with engine defaults");
    }

    let result = explain_with_session(&mut session, board, &config.analysis.limits());
    session.close();
    result
}

/// Explains the best move using an already running session.
pub fn explain_with_session<B: Board>(
    session: &mut EngineSession,
    board: &B,
    limits: &SearchLimits,
) -> Result<BestMoveExplanation, ExplainError> {
    let analysis = session.analyze(board, limits)?;
    info!(
        best_move = %analysis.best_move,
        evaluation = %analysis.evaluation,
        depth = analysis.depth,
        "Analysis complete"
    );
    Ok(explain_analysis(board, &analysis)?)
}

/// Turns an engine result for `board` into an explanation. No engine needed.
pub fn explain_analysis<B: Board>(
    board: &B,
    analysis: &AnalysisResult,
) -> Result<BestMoveExplanation, BoardError> {
    let best = analysis.best_move;
    let features = extract_features(board, best)?;
    let best_move_san = board.san(best)?;
    let phase = classify_phase(board);
    let advantage = normalize_score(analysis.evaluation, board.turn());

    let statements = generate(
        board,
        best,
        &analysis.next_moves,
        &advantage,
        phase,
        &features,
    );

    let mut principal_variation = Vec::with_capacity(1 + analysis.next_moves.len());
    principal_variation.push(best);
    principal_variation.extend_from_slice(&analysis.next_moves);

    Ok(BestMoveExplanation {
        best_move: best,
        best_move_san,
        advantage: advantage.to_string(),
        move_description: features.describe(),
        statements,
        phase,
        evaluation: analysis.evaluation,
        principal_variation,
    })
}
