//! Configuration loading and validation.
//!
//! Settings come from a JSON file in the platform config directory, then
//! environment variables, then command-line flags. The loose [`Settings`]
//! are turned into a validated [`ConnectionIdentity`] and [`EngineConfig`]
//! before anything connects; invalid values stop the process right there.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{
    DEFAULT_BYTE_CEILING_MULTIPLIER, DEFAULT_GENERATION_ATTEMPTS, DEFAULT_MESSAGES_PER_GENERATION,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MESSAGE_CHAR_LIMIT, MIN_MESSAGES_PER_GENERATION,
};
use crate::identity::ConnectionIdentity;

/// Prefix shared by every environment override.
const ENV_PREFIX: &str = "CHAT_SIMULATOR_";

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Login name is empty.
    MissingLogin,
    /// OAuth token is empty.
    MissingToken,
    /// OAuth token is only the `oauth:` prefix.
    IncompleteToken,
    /// Channel name is empty.
    MissingChannel,
    /// Trigger threshold below the two samples a standard deviation needs.
    TriggerThresholdTooSmall(usize),
    /// Character ceiling of zero leaves no room for any message.
    ZeroCharCeiling,
    /// Byte ceiling multiplier of zero leaves no room for any frame.
    ZeroByteCeilingMultiplier,
    /// Generation attempts of zero would never produce a message.
    ZeroGenerationAttempts,
    /// An environment override could not be parsed.
    InvalidOverride {
        /// Full environment variable name.
        name: String,
        /// Value as given.
        value: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLogin => write!(f, "username must be provided"),
            Self::MissingToken => write!(f, "oauth_token must be provided"),
            Self::IncompleteToken => write!(f, "oauth_token is incomplete"),
            Self::MissingChannel => write!(f, "channel must be provided"),
            Self::TriggerThresholdTooSmall(n) => write!(
                f,
                "messages_per_generation must be at least {MIN_MESSAGES_PER_GENERATION} (got {n})"
            ),
            Self::ZeroCharCeiling => write!(f, "character ceiling must be positive"),
            Self::ZeroByteCeilingMultiplier => {
                write!(f, "byte ceiling multiplier must be positive")
            }
            Self::ZeroGenerationAttempts => write!(f, "generation_attempts must be positive"),
            Self::InvalidOverride { name, value } => {
                write!(f, "{name}={value:?} is not a valid number")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Validated tuning for the generation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    trigger_threshold: usize,
    char_ceiling: usize,
    byte_ceiling_multiplier: usize,
}

impl EngineConfig {
    /// Build an engine config.
    ///
    /// `trigger_threshold` must be at least 2; both ceilings must be positive.
    pub fn new(
        trigger_threshold: usize,
        char_ceiling: usize,
        byte_ceiling_multiplier: usize,
    ) -> Result<Self, ConfigError> {
        if trigger_threshold < MIN_MESSAGES_PER_GENERATION {
            return Err(ConfigError::TriggerThresholdTooSmall(trigger_threshold));
        }
        if char_ceiling == 0 {
            return Err(ConfigError::ZeroCharCeiling);
        }
        if byte_ceiling_multiplier == 0 {
            return Err(ConfigError::ZeroByteCeilingMultiplier);
        }
        Ok(Self {
            trigger_threshold,
            char_ceiling,
            byte_ceiling_multiplier,
        })
    }

    /// Engine config with the server's limits and the given trigger threshold.
    pub fn with_trigger_threshold(trigger_threshold: usize) -> Result<Self, ConfigError> {
        Self::new(
            trigger_threshold,
            MESSAGE_CHAR_LIMIT,
            DEFAULT_BYTE_CEILING_MULTIPLIER,
        )
    }

    /// Corpus size that starts a generation cycle.
    pub fn trigger_threshold(&self) -> usize {
        self.trigger_threshold
    }

    /// Per-message character limit.
    pub fn char_ceiling(&self) -> usize {
        self.char_ceiling
    }

    /// Multiplier turning the character limit into a byte limit.
    pub fn byte_ceiling_multiplier(&self) -> usize {
        self.byte_ceiling_multiplier
    }

    /// Hard byte limit for an encoded frame, terminator included.
    pub fn byte_ceiling(&self) -> usize {
        self.char_ceiling * self.byte_ceiling_multiplier
    }
}

/// User-facing settings for the chat simulator.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    /// Username of the bot account.
    pub username: String,
    /// OAuth token used with `PASS`. Read from file or env, never written back.
    #[serde(skip_serializing)]
    pub oauth_token: String,
    /// Channel whose chat is simulated.
    pub channel: String,
    /// Number of chat messages used to generate one simulated message.
    pub messages_per_generation: usize,
    /// Log every observed chat message.
    pub debug: bool,
    /// Chat server host.
    pub server_host: String,
    /// Chat server port.
    pub server_port: u16,
    /// Markov sampling walks per generation cycle.
    pub generation_attempts: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            oauth_token: String::new(),
            channel: String::new(),
            messages_per_generation: DEFAULT_MESSAGES_PER_GENERATION,
            debug: false,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            generation_attempts: DEFAULT_GENERATION_ATTEMPTS,
        }
    }
}

impl Settings {
    /// Returns the configuration directory path, creating it if necessary.
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("chat-simulator");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Default location of the settings file.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Loads settings from `path` (or the default location), then applies
    /// environment overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let mut settings = Self::load_from_file(&path)?;
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Reads a settings file. A missing file yields defaults; a malformed one
    /// is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Applies overrides from `lookup`, keyed by the upper-case setting name.
    ///
    /// A numeric value that fails to parse is an error; nothing falls back to
    /// the previous value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(username) = lookup("USERNAME") {
            self.username = username;
        }
        if let Some(token) = lookup("OAUTH_TOKEN") {
            self.oauth_token = token;
        }
        if let Some(channel) = lookup("CHANNEL") {
            self.channel = channel;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server_host = host;
        }
        if let Some(value) = lookup("MESSAGES_PER_GENERATION") {
            self.messages_per_generation = parse_override("MESSAGES_PER_GENERATION", value)?;
        }
        if let Some(value) = lookup("SERVER_PORT") {
            self.server_port = parse_override("SERVER_PORT", value)?;
        }
        if let Some(value) = lookup("DEBUG") {
            self.debug = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    /// Turns the settings into the validated identity and engine config.
    pub fn validate(&self) -> Result<(ConnectionIdentity, EngineConfig), ConfigError> {
        let identity = ConnectionIdentity::new(&self.username, &self.oauth_token, &self.channel)?;
        let engine = EngineConfig::with_trigger_threshold(self.messages_per_generation)?;
        if self.generation_attempts == 0 {
            return Err(ConfigError::ZeroGenerationAttempts);
        }
        Ok((identity, engine))
    }

    /// Writes the settings to `path` with owner-only permissions.
    /// The OAuth token is never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::InvalidOverride {
            name: format!("{ENV_PREFIX}{key}"),
            value,
        }),
    }
}
