//! UCI analysis engine session.
//!
//! An [`EngineSession`] owns one engine process for its whole lifetime. Engine
//! output is read on a dedicated thread and forwarded over a channel, so every
//! wait on the engine has a deadline. Any failure while talking to the engine
//! terminates the process before the error is returned, and the session then
//! refuses further work with [`EngineError::SessionClosed`].

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use uci::{EngineInfo, EngineMessage, GoOptions, GuiCommand, OptionInfo, ScoreBound};

use crate::board::Board;
use crate::{Evaluation, Move};

/// Moves after the best move kept from the principal variation.
pub const MAX_NEXT_MOVES: usize = 5;

/// Extra time the engine gets beyond its own search bound.
pub const DEFAULT_RESPONSE_GRACE: Duration = Duration::from_millis(2000);

/// How long a `quit` is given before the process is killed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

const ENGINE_CLOSED: &str = "Engine closed unexpectedly";

/// Errors that can occur when working with an analysis engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be spawned or did not complete the handshake.
    #[error("Engine unavailable at {path}: {reason}")]
    EngineUnavailable { path: String, reason: String },
    /// The session was terminated by an earlier failure.
    #[error("Engine session is closed")]
    SessionClosed,
    /// The engine crashed, timed out or gave an unusable answer.
    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),
    /// The engine finished without reporting a score.
    #[error("Malformed engine output: {0}")]
    MalformedEngineOutput(String),
}

/// An option the engine does not advertise. Reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Engine does not support option '{name}'")]
pub struct UnsupportedOption {
    pub name: String,
    pub value: String,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    Configured,
    Analyzing,
    Idle,
    Terminated,
}

/// Bounds for one analysis request. The engine stops at whichever of depth
/// and time is reached first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: u32,
    pub movetime_ms: u64,
    /// Number of ranked lines requested (MultiPV).
    pub variations: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            depth: 15,
            movetime_ms: 5000,
            variations: 1,
        }
    }
}

/// Result of analyzing a position.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub best_move: Move,
    /// Principal variation after the best move, at most [`MAX_NEXT_MOVES`].
    pub next_moves: Vec<Move>,
    /// Relative to the side to move in the analyzed position.
    pub evaluation: Evaluation,
    pub depth: u32,
    pub nodes: u64,
}

enum Wait {
    Line(String),
    TimedOut,
    Closed,
}

/// A running UCI engine.
pub struct EngineSession {
    process: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    name: String,
    options: Vec<OptionInfo>,
    state: SessionState,
    sync_timeout: Duration,
    grace: Duration,
    variations: u32,
}

impl EngineSession {
    /// Spawns the engine and performs the `uci`/`isready` handshake.
    ///
    /// # Errors
    ///
    /// [`EngineError::EngineUnavailable`] if the process cannot be spawned or
    /// the handshake does not finish within `startup_timeout`. The process is
    /// already gone when this returns.
    pub fn start<P: AsRef<Path>>(
        path: P,
        args: &[String],
        startup_timeout: Duration,
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let unavailable = |reason: String| EngineError::EngineUnavailable {
            path: path.display().to_string(),
            reason,
        };

        let mut process = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| unavailable(e.to_string()))?;

        let (stdin, stdout) = match (process.stdin.take(), process.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                reap(&mut process);
                return Err(unavailable("engine pipes unavailable".to_string()));
            }
        };

        let (tx, rx) = mpsc::channel();
        if let Err(e) = thread::Builder::new()
            .name("uci-reader".to_string())
            .spawn(move || forward_lines(stdout, tx))
        {
            reap(&mut process);
            return Err(unavailable(e.to_string()));
        }

        let mut session = Self {
            process,
            stdin,
            lines: rx,
            name: String::new(),
            options: Vec::new(),
            state: SessionState::Started,
            sync_timeout: startup_timeout,
            grace: DEFAULT_RESPONSE_GRACE,
            variations: 1,
        };

        if let Err(e) = session.handshake(startup_timeout) {
            session.terminate();
            return Err(unavailable(e.to_string()));
        }

        if session.name.is_empty() {
            session.name = "Unknown Engine".to_string();
        }
        info!(engine = %session.name, options = session.options.len(), "Engine session started");
        Ok(session)
    }

    /// Sets how long past its search bound the engine may take to answer.
    pub fn with_response_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Returns the engine's name as reported via `id name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Options advertised during the handshake.
    pub fn options(&self) -> &[OptionInfo] {
        &self.options
    }

    /// Returns true if the engine advertised `name` (case-insensitive).
    pub fn supports(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name.eq_ignore_ascii_case(name))
    }

    /// Applies engine options, best effort.
    ///
    /// Options the engine did not advertise are skipped and returned as
    /// warnings. Only a failing engine makes this an error.
    pub fn configure(
        &mut self,
        options: &[(String, String)],
    ) -> Result<Vec<UnsupportedOption>, EngineError> {
        self.guarded(|session| {
            let mut unsupported = Vec::new();
            let mut sent = 0;
            for (name, value) in options {
                if !session.supports(name) {
                    warn!(option = %name, "Engine does not support option, ignoring");
                    unsupported.push(UnsupportedOption {
                        name: name.clone(),
                        value: value.clone(),
                    });
                    continue;
                }
                session.send(&GuiCommand::SetOption {
                    name: name.clone(),
                    value: Some(value.clone()),
                })?;
                if name.eq_ignore_ascii_case("MultiPV") {
                    session.variations = value.parse().unwrap_or(session.variations);
                }
                sent += 1;
            }
            if sent > 0 {
                session.sync()?;
            }
            if session.state == SessionState::Started {
                session.set_state(SessionState::Configured);
            }
            Ok(unsupported)
        })
    }

    /// Tells the engine the next position is unrelated to the previous one.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        self.guarded(|session| {
            session.send(&GuiCommand::UciNewGame)?;
            session.sync()
        })
    }

    /// Analyzes the position on `board` within `limits`.
    ///
    /// The board is only read. On any failure the engine is terminated.
    pub fn analyze<B: Board>(
        &mut self,
        board: &B,
        limits: &SearchLimits,
    ) -> Result<AnalysisResult, EngineError> {
        let fen = board.fen();
        self.guarded(|session| {
            session.set_state(SessionState::Analyzing);
            let result = session.run_analysis(&fen, limits)?;
            session.set_state(SessionState::Idle);
            Ok(result)
        })
    }

    /// Shuts the engine down.
    pub fn close(mut self) {
        self.terminate();
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(from = ?self.state, to = ?state, "Session state change");
        self.state = state;
    }

    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if self.state == SessionState::Terminated {
            return Err(EngineError::SessionClosed);
        }
        let result = op(self);
        if let Err(e) = &result {
            warn!(error = %e, "Engine request failed, terminating session");
            self.terminate();
        }
        result
    }

    fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        self.send(&GuiCommand::Uci)?;
        loop {
            let line = self.expect_line(deadline, "uciok")?;
            match EngineMessage::parse(&line) {
                EngineMessage::Id {
                    name: Some(name), ..
                } => self.name = name,
                EngineMessage::Option(option) => self.options.push(option),
                EngineMessage::UciOk => break,
                _ => {}
            }
        }
        self.send(&GuiCommand::IsReady)?;
        self.await_ready(deadline)
    }

    fn run_analysis(
        &mut self,
        fen: &str,
        limits: &SearchLimits,
    ) -> Result<AnalysisResult, EngineError> {
        if limits.variations != self.variations {
            if self.supports("MultiPV") {
                self.send(&GuiCommand::SetOption {
                    name: "MultiPV".to_string(),
                    value: Some(limits.variations.to_string()),
                })?;
                self.sync()?;
                self.variations = limits.variations;
            } else {
                warn!(
                    requested = limits.variations,
                    "Engine does not support MultiPV, analyzing a single line"
                );
            }
        }

        self.send(&GuiCommand::Position {
            fen: Some(fen.to_string()),
            moves: Vec::new(),
        })?;
        self.send(&GuiCommand::Go(GoOptions::bounded(
            limits.depth,
            limits.movetime_ms,
        )))?;

        let mut deadline = Instant::now() + Duration::from_millis(limits.movetime_ms) + self.grace;
        let mut stopped = false;
        let mut tracker = LineTracker::default();

        loop {
            match self.next_line(deadline) {
                Wait::Line(line) => match EngineMessage::parse(&line) {
                    EngineMessage::Info(info) => tracker.observe(info),
                    EngineMessage::BestMove { mv, .. } => return assemble(tracker.best(), mv),
                    _ => {}
                },
                Wait::TimedOut if !stopped => {
                    debug!("Search overran its bound, sending stop");
                    self.send(&GuiCommand::Stop)?;
                    deadline = Instant::now() + self.grace;
                    stopped = true;
                }
                Wait::TimedOut => {
                    return Err(EngineError::AnalysisFailure(
                        "Engine did not answer stop".to_string(),
                    ))
                }
                Wait::Closed => return Err(EngineError::AnalysisFailure(ENGINE_CLOSED.to_string())),
            }
        }
    }

    fn sync(&mut self) -> Result<(), EngineError> {
        self.send(&GuiCommand::IsReady)?;
        self.await_ready(Instant::now() + self.sync_timeout)
    }

    fn await_ready(&mut self, deadline: Instant) -> Result<(), EngineError> {
        loop {
            let line = self.expect_line(deadline, "readyok")?;
            if matches!(EngineMessage::parse(&line), EngineMessage::ReadyOk) {
                return Ok(());
            }
        }
    }

    fn expect_line(&self, deadline: Instant, awaiting: &str) -> Result<String, EngineError> {
        match self.next_line(deadline) {
            Wait::Line(line) => Ok(line),
            Wait::TimedOut => Err(EngineError::AnalysisFailure(format!(
                "Timed out waiting for {}",
                awaiting
            ))),
            Wait::Closed => Err(EngineError::AnalysisFailure(ENGINE_CLOSED.to_string())),
        }
    }

    fn next_line(&self, deadline: Instant) -> Wait {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(remaining) {
            Ok(line) => {
                debug!("<< {}", line);
                Wait::Line(line)
            }
            Err(RecvTimeoutError::Timeout) => Wait::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Wait::Closed,
        }
    }

    fn send(&mut self, command: &GuiCommand) -> Result<(), EngineError> {
        let text = command.to_uci();
        debug!(">> {}", text);
        writeln!(self.stdin, "{}", text)
            .and_then(|()| self.stdin.flush())
            .map_err(|e| EngineError::AnalysisFailure(format!("Failed to write to engine: {}", e)))
    }

    /// Sends `quit`, waits briefly, then kills. Safe to call repeatedly.
    fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.set_state(SessionState::Terminated);
        let _ = self.send(&GuiCommand::Quit);

        let deadline = Instant::now() + EXIT_GRACE;
        loop {
            match self.process.try_wait() {
                Ok(Some(status)) => {
                    info!(engine = %self.name, %status, "Engine session closed");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }
        warn!(engine = %self.name, "Engine did not exit after quit, killing");
        reap(&mut self.process);
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn reap(process: &mut Child) {
    let _ = process.kill();
    let _ = process.wait();
}

/// Reader thread body. Ends when the pipe closes or the session goes away.
fn forward_lines(stdout: ChildStdout, tx: Sender<String>) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    }
}

/// Latest scored info for the first line. A bound from a deeper iteration
/// replaces an exact score from a shallower one.
#[derive(Debug, Default)]
struct LineTracker {
    latest: Option<EngineInfo>,
}

impl LineTracker {
    fn observe(&mut self, info: EngineInfo) {
        if info.line() != 1 || info.score.is_none() {
            return;
        }
        if let Some(current) = &self.latest {
            let same_depth = info.depth.is_some() && info.depth == current.depth;
            if same_depth && info.bound != ScoreBound::Exact && current.bound == ScoreBound::Exact {
                return;
            }
        }
        self.latest = Some(info);
    }

    fn best(self) -> Option<EngineInfo> {
        self.latest
    }
}

/// Builds the result from the last scored info and the `bestmove` token.
fn assemble(info: Option<EngineInfo>, bestmove: Option<String>) -> Result<AnalysisResult, EngineError> {
    let bestmove = bestmove.ok_or_else(|| {
        EngineError::AnalysisFailure("Engine reported no legal move".to_string())
    })?;
    let info = info.ok_or_else(|| {
        EngineError::MalformedEngineOutput("no score before bestmove".to_string())
    })?;
    let evaluation = info
        .score
        .map(Evaluation::from)
        .ok_or_else(|| EngineError::MalformedEngineOutput("no score before bestmove".to_string()))?;

    let chosen = Move::from_uci(&bestmove).ok_or_else(|| {
        EngineError::MalformedEngineOutput(format!("unreadable best move '{}'", bestmove))
    })?;
    let mut line = info.pv.iter().map(|m| Move::from_uci(m));
    let (best_move, next_moves) = match line.next() {
        Some(Some(mv)) if mv == chosen => (mv, line.map_while(|m| m).take(MAX_NEXT_MOVES).collect()),
        Some(_) => {
            debug!(%chosen, "Principal variation does not start with bestmove, dropping it");
            (chosen, Vec::new())
        }
        None => (chosen, Vec::new()),
    };

    Ok(AnalysisResult {
        best_move,
        next_moves,
        evaluation,
        depth: info.depth.unwrap_or(0),
        nodes: info.nodes.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::Square;

    fn info(line: &str) -> EngineInfo {
        EngineInfo::parse(line).unwrap()
    }

    #[test]
    fn test_start_missing_executable() {
        let result = EngineSession::start(
            "/nonexistent/path/to/stockfish",
            &[],
            Duration::from_millis(200),
        );
        match result {
            Err(EngineError::EngineUnavailable { path, .. }) => {
                assert_eq!(path, "/nonexistent/path/to/stockfish");
            }
            _ => panic!("Expected EngineUnavailable"),
        }
    }

    #[test]
    fn test_engine_error_display() {
        let unavailable = EngineError::EngineUnavailable {
            path: "/path/to/engine".to_string(),
            reason: "No such file".to_string(),
        };
        assert!(unavailable.to_string().contains("/path/to/engine"));
        assert_eq!(EngineError::SessionClosed.to_string(), "Engine session is closed");

        let unsupported = UnsupportedOption {
            name: "Threads".to_string(),
            value: "4".to_string(),
        };
        assert_eq!(unsupported.to_string(), "Engine does not support option 'Threads'");
    }

    #[test]
    fn test_assemble_splits_principal_variation() {
        let result = assemble(
            Some(info("info depth 18 score cp 31 nodes 90000 pv e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4")),
            Some("e2e4".to_string()),
        )
        .unwrap();
        assert_eq!(result.best_move, Move::new(Square::E2, Square::E4));
        assert_eq!(result.next_moves.len(), MAX_NEXT_MOVES);
        assert_eq!(result.next_moves[0], Move::new(Square::E7, Square::E5));
        assert_eq!(result.evaluation, Evaluation::Centipawns(31));
        assert_eq!(result.depth, 18);
        assert_eq!(result.nodes, 90000);
    }

    #[test]
    fn test_assemble_short_pv_is_not_padded() {
        let result = assemble(
            Some(info("info depth 5 score mate 1 pv d8h4")),
            Some("d8h4".to_string()),
        )
        .unwrap();
        assert_eq!(result.evaluation, Evaluation::Mate(1));
        assert!(result.next_moves.is_empty());
    }

    #[test]
    fn test_assemble_falls_back_to_bestmove_token() {
        let result = assemble(Some(info("info depth 1 score cp 5")), Some("g1f3".to_string())).unwrap();
        assert_eq!(result.best_move, Move::new(Square::G1, Square::F3));
    }

    #[test]
    fn test_assemble_without_score_is_malformed() {
        let result = assemble(None, Some("e2e4".to_string()));
        assert!(matches!(result, Err(EngineError::MalformedEngineOutput(_))));
    }

    #[test]
    fn test_assemble_without_move_is_failure() {
        let result = assemble(Some(info("info depth 0 score mate 0")), None);
        assert!(matches!(result, Err(EngineError::AnalysisFailure(_))));
    }

    #[test]
    fn test_tracker_keeps_exact_score_over_same_depth_bound() {
        let mut tracker = LineTracker::default();
        tracker.observe(info("info depth 10 multipv 1 score cp 20 pv e2e4"));
        tracker.observe(info("info depth 10 multipv 1 score cp 40 lowerbound pv d2d4"));
        tracker.observe(info("info depth 10 multipv 2 score cp 15 pv c2c4"));
        tracker.observe(info("info depth 10 currmove g1f3"));
        let best = tracker.best().unwrap();
        assert_eq!(best.pv, vec!["e2e4"]);
        assert_eq!(best.depth, Some(10));
    }

    #[test]
    fn test_deeper_fail_high_replaces_shallower_exact_line() {
        let mut tracker = LineTracker::default();
        tracker.observe(info("info depth 10 multipv 1 score cp 20 pv e2e4 e7e5"));
        tracker.observe(info("info depth 14 multipv 1 score cp 55 lowerbound pv d2d4 d7d5"));
        let result = assemble(tracker.best(), Some("d2d4".to_string())).unwrap();
        assert_eq!(result.best_move, Move::new(Square::D2, Square::D4));
        assert_eq!(result.next_moves, vec![Move::new(Square::D7, Square::D5)]);
        assert_eq!(result.evaluation, Evaluation::Centipawns(55));
        assert_eq!(result.depth, 14);
    }

    #[test]
    fn test_bestmove_token_wins_over_disagreeing_pv() {
        let result = assemble(
            Some(info("info depth 12 score cp 25 pv e2e4 e7e5 g1f3")),
            Some("c2c4".to_string()),
        )
        .unwrap();
        assert_eq!(result.best_move, Move::new(Square::C2, Square::C4));
        assert!(result.next_moves.is_empty());
        assert_eq!(result.evaluation, Evaluation::Centipawns(25));
    }

    #[test]
    fn test_tracker_uses_bound_when_nothing_exact() {
        let mut tracker = LineTracker::default();
        tracker.observe(info("info depth 3 score cp -12 upperbound pv a2a3"));
        assert_eq!(tracker.best().map(|i| i.bound), Some(ScoreBound::Upper));
    }

    #[test]
    fn test_default_limits() {
        let limits = SearchLimits::default();
        assert_eq!(limits.depth, 15);
        assert_eq!(limits.movetime_ms, 5000);
        assert_eq!(limits.variations, 1);
    }
}
