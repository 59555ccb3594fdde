//! UCI (Universal Chess Interface) protocol vocabulary, seen from the GUI side.
//!
//! This crate formats the commands a GUI sends to an analysis engine and parses
//! the messages the engine answers with. It does no I/O of its own.
//!
//! # Commands (GUI to engine)
//!
//! - `uci` - Initialize engine, get id and options
//! - `isready` / `readyok` - Synchronization
//! - `setoption name <name> [value <value>]` - Configure engine
//! - `position fen <fen> [moves <move>...]` - Set position
//! - `go [depth <d>] [movetime <ms>]` - Start search
//! - `stop` - Stop search
//! - `quit` - Exit engine
//!
//! # Messages (engine to GUI)
//!
//! - `id name <name>`, `option name <name> type <type> ...`, `uciok`
//! - `readyok`
//! - `info ...`
//! - `bestmove <move> [ponder <move>]`

mod command;
mod info;

pub use command::{GoOptions, GuiCommand};
pub use info::{EngineInfo, Score, ScoreBound};

/// An option declared by the engine during the `uci` handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionInfo {
    /// Option name, may contain spaces (e.g. "Skill Level").
    pub name: String,
    /// Declared type (`spin`, `check`, `combo`, `button`, `string`).
    pub kind: String,
}

/// Messages sent from engine to GUI.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Engine identification.
    Id {
        name: Option<String>,
        author: Option<String>,
    },
    /// Option declaration.
    Option(OptionInfo),
    /// UCI initialization complete.
    UciOk,
    /// Engine is ready.
    ReadyOk,
    /// Search information.
    Info(EngineInfo),
    /// Best move found. `mv` is `None` when the engine reports `(none)` or `0000`.
    BestMove {
        mv: Option<String>,
        ponder: Option<String>,
    },
    /// Anything else (copyprotection, registration, free-form chatter).
    Unknown(String),
}

impl EngineMessage {
    /// Parse one line of engine output.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("uciok") => EngineMessage::UciOk,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("info") => match EngineInfo::parse(line) {
                Some(info) => EngineMessage::Info(info),
                None => EngineMessage::Unknown(line.to_string()),
            },
            Some("bestmove") => {
                let mv = parts.next().filter(|m| is_real_move(m)).map(str::to_string);
                let ponder = match parts.next() {
                    Some("ponder") => parts.next().filter(|m| is_real_move(m)).map(str::to_string),
                    _ => None,
                };
                EngineMessage::BestMove { mv, ponder }
            }
            Some("id") => {
                let rest: Vec<&str> = parts.collect();
                match rest.split_first() {
                    Some((&"name", value)) => EngineMessage::Id {
                        name: Some(value.join(" ")),
                        author: None,
                    },
                    Some((&"author", value)) => EngineMessage::Id {
                        name: None,
                        author: Some(value.join(" ")),
                    },
                    _ => EngineMessage::Unknown(line.to_string()),
                }
            }
            Some("option") => match parse_option(parts) {
                Some(opt) => EngineMessage::Option(opt),
                None => EngineMessage::Unknown(line.to_string()),
            },
            _ => EngineMessage::Unknown(line.to_string()),
        }
    }
}

fn is_real_move(token: &&str) -> bool {
    !matches!(*token, "(none)" | "0000")
}

fn parse_option<'a>(parts: impl Iterator<Item = &'a str>) -> Option<OptionInfo> {
    let parts: Vec<&str> = parts.collect();
    if parts.first() != Some(&"name") {
        return None;
    }
    let type_idx = parts.iter().position(|&p| p == "type")?;
    let name = parts[1..type_idx].join(" ");
    let kind = parts.get(type_idx + 1)?.to_string();
    if name.is_empty() {
        return None;
    }
    Some(OptionInfo { name, kind })
}
