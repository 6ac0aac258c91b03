//! Cloner configuration, loaded from `config.json` or `config.toml`.

use guildmirror_engine::PacingConfig;
use guildmirror_rest::{RestConfig, TokenKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Placeholder token shipped in the sample configuration.
pub const PLACEHOLDER_TOKEN: &str = "YOUR_TOKEN_HERE";

const MIN_TOKEN_LEN: usize = 50;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed.
    #[error("invalid format in {path}: {reason}")]
    Parse {
        /// File path.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// The file extension is neither json nor toml.
    #[error("unsupported config file extension: {0}")]
    UnsupportedExtension(String),

    /// No token, or the placeholder token.
    #[error("please configure your Discord token")]
    MissingToken,

    /// A token that cannot be a valid Discord token.
    #[error("invalid token format")]
    InvalidToken,

    /// A delay that is negative, not a number, or too large.
    #[error("invalid delay for {name}: {value}")]
    InvalidDelay {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Delays between operations, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// After each role creation.
    pub role_create_delay: f64,
    /// After each category or channel creation.
    pub channel_create_delay: f64,
    /// After each emoji upload.
    pub emoji_create_delay: f64,
    /// After a role reorder or guild settings edit.
    pub permission_update_delay: f64,
    /// After each channel, category or role deletion.
    pub delete_delay: f64,
    /// After each emoji deletion.
    pub emoji_delete_delay: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            role_create_delay: 1.0,
            channel_create_delay: 0.5,
            emoji_create_delay: 1.0,
            permission_update_delay: 0.3,
            delete_delay: 0.3,
            emoji_delete_delay: 0.2,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClonerConfig {
    /// Access token.
    pub discord_token: String,
    /// How the token is sent.
    pub token_kind: TokenKind,
    /// Pacing delays.
    pub settings: Settings,
}

impl ClonerConfig {
    /// Load from a `.json` or `.toml` file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: display,
                reason: e.to_string(),
            }),
            "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: display,
                reason: e.to_string(),
            }),
            _ => Err(ConfigError::UnsupportedExtension(ext.to_string())),
        }
    }

    /// Check the token shape and every delay.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_token(&self.discord_token)?;
        self.to_pacing().map(|_| ())
    }

    /// Convert the delays into engine pacing.
    pub fn to_pacing(&self) -> Result<PacingConfig, ConfigError> {
        let s = &self.settings;
        Ok(PacingConfig {
            role_create: delay("role_create_delay", s.role_create_delay)?,
            channel_create: delay("channel_create_delay", s.channel_create_delay)?,
            emoji_create: delay("emoji_create_delay", s.emoji_create_delay)?,
            permission_update: delay("permission_update_delay", s.permission_update_delay)?,
            delete: delay("delete_delay", s.delete_delay)?,
            emoji_delete: delay("emoji_delete_delay", s.emoji_delete_delay)?,
        })
    }

    /// REST client settings for this token.
    pub fn to_rest(&self) -> RestConfig {
        RestConfig::with_token(self.discord_token.clone(), self.token_kind)
    }
}

fn delay(name: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDelay { name, value: secs })
}

/// A token must be present, not the placeholder, at least 50 characters long
/// and made of at least two dot-separated parts.
pub fn validate_token(token: &str) -> Result<(), ConfigError> {
    if token.is_empty() || token == PLACEHOLDER_TOKEN {
        return Err(ConfigError::MissingToken);
    }
    if token.len() < MIN_TOKEN_LEN || token.split('.').count() < 2 {
        return Err(ConfigError::InvalidToken);
    }
    Ok(())
}
