//! Error types with fix suggestions
//!
//! Error code ranges:
//! - MC-000-009: Configuration errors
//! - MC-010-019: Storage errors
//! - MC-020-029: Terminal errors
//!
//! Evaluator and typesetting failures never reach this type: the chat
//! session converts them into bot replies (see `eval::EvalError` and
//! `markup::TypesetError`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TutorError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum TutorError {
    // ─────────────────────────────────────────────────────────────
    // Configuration errors (MC-000 to MC-009)
    // ─────────────────────────────────────────────────────────────
    #[error("[MC-001] Failed to read config file {path}: {reason}")]
    ConfigRead { path: String, reason: String },

    #[error("[MC-002] Failed to parse config file {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    #[error("[MC-003] Failed to write config file {path}: {reason}")]
    ConfigWrite { path: String, reason: String },

    #[error("[MC-004] Invalid value for {key}: '{value}'")]
    InvalidSetting { key: String, value: String },

    // ─────────────────────────────────────────────────────────────
    // Storage errors (MC-010 to MC-019)
    // ─────────────────────────────────────────────────────────────
    #[error("[MC-010] Failed to read store {path}: {reason}")]
    StoreRead { path: String, reason: String },

    #[error("[MC-011] Failed to write store {path}: {reason}")]
    StoreWrite { path: String, reason: String },

    #[error("[MC-012] Store {path} is corrupted: {reason}")]
    StoreCorrupted { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Terminal errors (MC-020 to MC-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[MC-020] Terminal error: {0}")]
    Terminal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixSuggestion for TutorError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            TutorError::ConfigRead { .. } => Some("Check the config file exists and is readable"),
            TutorError::ConfigParse { .. } => {
                Some("Check TOML syntax in config.toml (keys: think_delay_ms, greeting_delay_ms, data_dir, theme)")
            }
            TutorError::ConfigWrite { .. } => Some("Check permissions on the config directory"),
            TutorError::InvalidSetting { .. } => Some("Use 'light' or 'dark' for the theme"),
            TutorError::StoreRead { .. } => Some("Check permissions on the data directory"),
            TutorError::StoreWrite { .. } => {
                Some("Check the data directory is writable or pass --data-dir")
            }
            TutorError::StoreCorrupted { .. } => {
                Some("Delete store.json in the data directory to reset score and theme")
            }
            TutorError::Terminal(_) => Some("Run in an interactive terminal, or use 'mathchat repl'"),
            TutorError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
