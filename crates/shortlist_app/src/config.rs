use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shortlist_core::{ReconcilePolicy, ShortlistConfig, DEFAULT_STORAGE_KEY};
use shortlist_engine::ApiSettings;
use thiserror::Error;

const SERVER_URL_VAR: &str = "SHORTLIST_SERVER_URL";
const SESSION_COOKIE_VAR: &str = "SHORTLIST_SESSION_COOKIE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("server mode is enabled but no base_url is configured")]
    MissingServerUrl,
    #[error("storage_key must not be empty")]
    EmptyStorageKey,
}

/// Where [`AppConfig::load`] got its values from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No path was given.
    Defaults,
    /// A path was given but nothing exists there.
    Missing(PathBuf),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub base_url: String,
    pub session_cookie: Option<String>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            session_cookie: None,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub server: ServerConfig,
    pub reconcile_policy: ReconcilePolicy,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".shortlist"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            server: ServerConfig::default(),
            reconcile_policy: ReconcilePolicy::PullOnly,
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Reads `path` when given and present; otherwise returns defaults.
    ///
    /// Runs before logging is set up, so the returned [`ConfigSource`] is
    /// what callers log.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource), ConfigError> {
        let Some(path) = path else {
            return Ok((Self::default(), ConfigSource::Defaults));
        };
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((Self::default(), ConfigSource::Missing(path.to_path_buf())));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((config, ConfigSource::File(path.to_path_buf())))
    }

    pub fn parse(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    /// Overrides from the environment. A server URL also switches server mode on.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(SERVER_URL_VAR).filter(|url| !url.trim().is_empty()) {
            self.server.base_url = url;
            self.server.enabled = true;
        }
        if let Some(cookie) = lookup(SESSION_COOKIE_VAR).filter(|cookie| !cookie.is_empty()) {
            self.server.session_cookie = Some(cookie);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.server.enabled && self.server.base_url.trim().is_empty() {
            return Err(ConfigError::MissingServerUrl);
        }
        Ok(())
    }

    pub fn shortlist_config(&self) -> ShortlistConfig {
        ShortlistConfig {
            storage_key: self.storage_key.clone(),
            server_mode: self.server.enabled,
            reconcile_policy: self.reconcile_policy,
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        let mut settings = ApiSettings::new(self.server.base_url.clone());
        settings.session_cookie = self.server.session_cookie.clone();
        settings.connect_timeout = Duration::from_millis(self.server.connect_timeout_ms);
        settings.request_timeout = Duration::from_millis(self.server.request_timeout_ms);
        settings
    }
}
