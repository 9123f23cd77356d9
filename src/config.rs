//! Configuration
//!
//! Config is stored in `~/.config/mathchat/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags (`--data-dir`, `--no-delay`)
//! 2. Environment variables (`MATHCHAT_DATA_DIR`, `MATHCHAT_THINK_DELAY_MS`)
//! 3. Config file
//! 4. Defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TutorError};
use crate::store::Theme;

pub const APP_DIR: &str = "mathchat";
pub const DEFAULT_THINK_DELAY_MS: u64 = 300;
pub const DEFAULT_GREETING_DELAY_MS: u64 = 200;

pub const ENV_DATA_DIR: &str = "MATHCHAT_DATA_DIR";
pub const ENV_THINK_DELAY: &str = "MATHCHAT_THINK_DELAY_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TutorConfig {
    /// Pause before the bot answers a submission
    pub think_delay_ms: u64,

    /// Pause before the startup greeting
    pub greeting_delay_ms: u64,

    /// Where `store.json` lives (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,

    /// Force a startup theme ("light" or "dark"); otherwise the stored
    /// theme or the system preference is used
    pub theme: Option<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
            greeting_delay_ms: DEFAULT_GREETING_DELAY_MS,
            data_dir: None,
            theme: None,
        }
    }
}

impl TutorConfig {
    /// Returns `~/.config/mathchat/` on Unix, `%APPDATA%/mathchat/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| TutorError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| TutorError::ConfigParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        config.validate(path)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let write_err = |reason: String| TutorError::ConfigWrite {
            path: path.display().to_string(),
            reason,
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| write_err(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        fs::write(path, content).map_err(|e| write_err(e.to_string()))?;

        Ok(())
    }

    /// Merge with process environment variables
    pub fn with_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Merge with variables from `lookup`. Empty or unparsable values are
    /// ignored.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(ms) = lookup(ENV_THINK_DELAY).and_then(|v| v.trim().parse().ok()) {
            self.think_delay_ms = ms;
        }

        self
    }

    /// Effective data directory
    ///
    /// Returns `~/.local/share/mathchat/` on Linux unless overridden
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        })
    }

    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }

    /// Forced startup theme, if configured
    pub fn forced_theme(&self) -> Option<Theme> {
        self.theme.as_deref().and_then(|t| t.parse().ok())
    }

    /// Drop both delays (scripted runs and tests)
    pub fn without_delays(mut self) -> Self {
        self.think_delay_ms = 0;
        self.greeting_delay_ms = 0;
        self
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(theme) = &self.theme {
            theme.parse::<Theme>().map_err(|_| TutorError::ConfigParse {
                path: path.display().to_string(),
                reason: format!("theme must be 'light' or 'dark', got '{}'", theme),
            })?;
        }
        Ok(())
    }
}
