//! Application configuration.
//!
//! Values come from built-in defaults, then `<config dir>/flock/config.toml`,
//! then `FLOCK__SECTION__KEY` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::rules::SetOrdering;

/// Directory under the user's config dir holding the config file.
pub const CONFIG_DIR: &str = "flock";
/// Config file name.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FLOCK";

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_INTENT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_CONFIG: &str = r#"# Flock client configuration.

[server]
# Socket.IO endpoint of the game server.
url = "http://localhost:5000"
# Seconds to wait for the server to answer an action before flagging it.
intent_timeout_secs = 10

[board]
# "ranked" puts the fullest sets first, "server" keeps the server's order.
set_ordering = "ranked"
"#;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server connection settings.
    pub server: ServerConfig,
    /// Board display settings.
    pub board: BoardConfig,
}

/// Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket.IO endpoint.
    pub url: String,
    /// Seconds before an unanswered intent is flagged as overdue.
    pub intent_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            intent_timeout_secs: DEFAULT_INTENT_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Intent timeout as a duration.
    pub fn intent_timeout(&self) -> Duration {
        Duration::from_secs(self.intent_timeout_secs)
    }
}

/// Board display settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Order in which sets are drawn.
    pub set_ordering: SetOrdering,
}

impl AppConfig {
    /// Load from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path`, which may be missing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = ServerConfig::default();
        let settings = Config::builder()
            .set_default("server.url", defaults.url)?
            .set_default("server.intent_timeout_secs", defaults.intent_timeout_secs as i64)?
            .set_default("board.set_ordering", "ranked")?
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write the commented default config if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(config_path())
}

/// Write the commented default config to `path` unless the file exists.
pub fn ensure_default_config_at(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(path)
}
