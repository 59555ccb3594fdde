//! Configuration file loading for the explainer.
//!
//! Settings live in `chess-explain.toml`. Every field has a default, so a
//! missing file or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::engine::SearchLimits;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Value of an engine option, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// How to launch and set up the analysis engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineConfig {
    /// Engine executable. Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_engine_path")]
    pub path: PathBuf,
    /// Extra command-line arguments for the engine.
    #[serde(default)]
    pub args: Vec<String>,
    /// Time allowed for the UCI handshake. Defaults to 10 seconds.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
    /// Time allowed past the search bound for a reply. Defaults to 2 seconds.
    #[serde(default = "default_response_grace_ms")]
    pub response_grace_ms: u64,
    /// UCI options applied after startup.
    #[serde(default = "default_engine_options")]
    pub options: BTreeMap<String, OptionValue>,
}

fn default_engine_path() -> PathBuf {
    PathBuf::from("stockfish")
}

fn default_startup_timeout_ms() -> u64 {
    10_000
}

fn default_response_grace_ms() -> u64 {
    2_000
}

fn default_engine_options() -> BTreeMap<String, OptionValue> {
    BTreeMap::from([("Skill Level".to_string(), OptionValue::Int(20))])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: default_engine_path(),
            args: Vec::new(),
            startup_timeout_ms: default_startup_timeout_ms(),
            response_grace_ms: default_response_grace_ms(),
            options: default_engine_options(),
        }
    }
}

impl EngineConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn response_grace(&self) -> Duration {
        Duration::from_millis(self.response_grace_ms)
    }

    /// Options as `(name, value)` pairs ready for `setoption`.
    pub fn option_pairs(&self) -> Vec<(String, String)> {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }
}

/// Search bounds for each analysis.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Maximum search depth. Defaults to 15.
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Wall-clock bound per search. Defaults to 5 seconds.
    #[serde(default = "default_movetime_ms")]
    pub movetime_ms: u64,
    /// Ranked lines requested. Defaults to 1.
    #[serde(default = "default_multipv")]
    pub multipv: u32,
}

fn default_depth() -> u32 {
    15
}

fn default_movetime_ms() -> u64 {
    5_000
}

fn default_multipv() -> u32 {
    1
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            movetime_ms: default_movetime_ms(),
            multipv: default_multipv(),
        }
    }
}

impl AnalysisSettings {
    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            depth: self.depth,
            movetime_ms: self.movetime_ms,
            variations: self.multipv.max(1),
        }
    }
}

/// Top-level explainer configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ExplainerConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl ExplainerConfig {
    /// Loads the configuration from [`Self::config_path()`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns `chess-explain.toml` in the current working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess-explain.toml")
    }
}
