//! Commands sent from the GUI (us) to an engine.

/// Commands sent from GUI to engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiCommand {
    /// Initialize UCI mode.
    Uci,
    /// Check if engine is ready.
    IsReady,
    /// Change an engine option. `value` is absent for button options.
    SetOption { name: String, value: Option<String> },
    /// The next position belongs to a different game.
    UciNewGame,
    /// Set up position.
    Position {
        fen: Option<String>,
        moves: Vec<String>,
    },
    /// Start calculating.
    Go(GoOptions),
    /// Stop calculating.
    Stop,
    /// Quit the engine.
    Quit,
}

/// Options for the `go` command.
///
/// Limits combine: an engine given both `depth` and `movetime` stops at
/// whichever is reached first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GoOptions {
    /// Search to this depth.
    pub depth: Option<u32>,
    /// Search for at most this time in milliseconds.
    pub movetime: Option<u64>,
}

impl GoOptions {
    /// Depth and wall-clock bound together.
    pub fn bounded(depth: u32, movetime_ms: u64) -> Self {
        Self {
            depth: Some(depth),
            movetime: Some(movetime_ms),
        }
    }
}

impl GuiCommand {
    /// Format the command as a single line of wire text (no newline).
    pub fn to_uci(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::SetOption { name, value } => match value {
                Some(v) => format!("setoption name {} value {}", name, v),
                None => format!("setoption name {}", name),
            },
            GuiCommand::UciNewGame => "ucinewgame".to_string(),
            GuiCommand::Position { fen, moves } => {
                let mut out = match fen {
                    Some(f) => format!("position fen {}", f),
                    None => "position startpos".to_string(),
                };
                if !moves.is_empty() {
                    out.push_str(" moves ");
                    out.push_str(&moves.join(" "));
                }
                out
            }
            GuiCommand::Go(opts) => {
                let mut parts = vec!["go".to_string()];
                if let Some(d) = opts.depth {
                    parts.push(format!("depth {}", d));
                }
                if let Some(t) = opts.movetime {
                    parts.push(format!("movetime {}", t));
                }
                parts.join(" ")
            }
            GuiCommand::Stop => "stop".to_string(),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}
