//! Persistence - score and theme across sessions
//!
//! Values live in a string key-value store. [`JsonFileStore`] keeps them in
//! `store.json` under the user data directory; [`MemoryStore`] is the
//! in-process double used by tests and `--ephemeral` runs.
//!
//! Persisted entries:
//! - `score`: stringified non-negative integer
//! - `theme`: `"light"` or `"dark"`

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{info, warn};

use crate::error::{Result, TutorError};

pub const SCORE_KEY: &str = "score";
pub const THEME_KEY: &str = "theme";
pub const STORE_FILE: &str = "store.json";

// ─────────────────────────────────────────────────────────────────────────────
// Key-value storage
// ─────────────────────────────────────────────────────────────────────────────

/// Durable string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory store; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk, rewritten on every `set`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store in `dir`, starting empty when the file is missing.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORE_FILE);

        if !path.exists() {
            return Ok(Self {
                path,
                entries: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| TutorError::StoreRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let entries = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content).map_err(|e| TutorError::StoreCorrupted {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        };

        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<()> {
        let write_err = |e: &dyn fmt::Display| TutorError::StoreWrite {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| write_err(&e))?;
        }

        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| write_err(&e))?;

        // Write-then-rename so a crash never leaves a half-written store
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| write_err(&e))?;
        fs::rename(&tmp, &self.path).map_err(|e| write_err(&e))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Theme
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Terminal background reported by the environment, if any.
    ///
    /// Reads `COLORFGBG` (set by rxvt, Konsole, iTerm2 and others). Without
    /// it there is no preference to follow and the light theme is used.
    pub fn system_preference() -> Self {
        std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| theme_from_colorfgbg(&value))
            .unwrap_or_default()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(TutorError::InvalidSetting {
                key: THEME_KEY.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// `COLORFGBG` is `fg;bg` or `fg;default;bg` with ANSI color indexes.
/// Backgrounds 7 (white) and 9-15 (bright colors) are light.
pub fn theme_from_colorfgbg(value: &str) -> Option<Theme> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(match bg {
        7 | 9..=15 => Theme::Light,
        _ => Theme::Dark,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Preferences
// ─────────────────────────────────────────────────────────────────────────────

/// Typed access to the persisted score and theme
pub struct Preferences<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persisted score, 0 when missing or malformed
    pub fn score(&self) -> u64 {
        match self.store.get(SCORE_KEY) {
            None => 0,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring malformed stored score");
                0
            }),
        }
    }

    pub fn set_score(&mut self, score: u64) -> Result<()> {
        self.store.set(SCORE_KEY, &score.to_string())
    }

    /// Add `delta` to the persisted score and return the new total.
    /// The score only ever grows.
    pub fn add_to_score(&mut self, delta: u64) -> Result<u64> {
        let score = self.score().saturating_add(delta);
        self.set_score(score)?;
        info!(score, delta, "score updated");
        Ok(score)
    }

    /// Persisted theme, `system_default` when missing or malformed
    pub fn theme(&self, system_default: Theme) -> Theme {
        match self.store.get(THEME_KEY) {
            None => system_default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring malformed stored theme");
                system_default
            }),
        }
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        info!(theme = %theme, "theme saved");
        Ok(())
    }

    /// Flip the current theme, persist and return it
    pub fn toggle_theme(&mut self, system_default: Theme) -> Result<Theme> {
        let next = self.theme(system_default).toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
