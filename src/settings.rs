//! Application settings for cloudmark.
//!
//! The service URL and public API key are required and come from the
//! environment or a JSON settings file; everything else has defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::errors::SettingsError;

/// Base URL of the hosted data service.
pub const ENV_SERVICE_URL: &str = "CLOUDMARK_URL";
/// Public API key sent with every request.
pub const ENV_ANON_KEY: &str = "CLOUDMARK_ANON_KEY";
/// Directory holding local state (the persisted session).
pub const ENV_DATA_DIR: &str = "CLOUDMARK_DATA_DIR";
/// OAuth provider passed to the authorize endpoint.
pub const ENV_OAUTH_PROVIDER: &str = "CLOUDMARK_OAUTH_PROVIDER";
/// Return URL handed to the identity provider after sign-in.
pub const ENV_REDIRECT_TO: &str = "CLOUDMARK_REDIRECT_TO";

const DEFAULT_PROVIDER: &str = "google";

/// Validated application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Service base URL, http(s), stored without a trailing slash.
    pub service_url: String,
    pub anon_key: String,
    pub data_dir: PathBuf,
    #[serde(default = "default_provider")]
    pub oauth_provider: String,
    /// Empty means "let the service use its configured default".
    #[serde(default)]
    pub redirect_to: String,
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

impl Settings {
    /// Reads settings from the environment.
    ///
    /// `CLOUDMARK_URL` and `CLOUDMARK_ANON_KEY` are required; the data
    /// directory falls back to the current directory.
    pub fn from_env() -> Result<Self, SettingsError> {
        let service_url = env::var(ENV_SERVICE_URL)
            .map_err(|_| SettingsError::MissingValue(ENV_SERVICE_URL.to_string()))?;
        let anon_key = env::var(ENV_ANON_KEY)
            .map_err(|_| SettingsError::MissingValue(ENV_ANON_KEY.to_string()))?;
        let data_dir = env::var(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let oauth_provider =
            env::var(ENV_OAUTH_PROVIDER).unwrap_or_else(|_| DEFAULT_PROVIDER.to_string());
        let redirect_to = env::var(ENV_REDIRECT_TO).unwrap_or_default();

        let settings = Settings {
            service_url,
            anon_key,
            data_dir,
            oauth_provider,
            redirect_to,
        };
        settings.validated()
    }

    /// Loads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read settings file: {}", e)))?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse settings file: {}", e))
        })?;
        settings.validated()
    }

    /// Path of the persisted session file inside the data directory.
    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }

    fn validated(mut self) -> Result<Self, SettingsError> {
        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err(SettingsError::InvalidUrl(self.service_url));
        }
        while self.service_url.ends_with('/') {
            self.service_url.pop();
        }
        if self.anon_key.is_empty() {
            return Err(SettingsError::MissingValue(ENV_ANON_KEY.to_string()));
        }
        if self.oauth_provider.is_empty() {
            self.oauth_provider = DEFAULT_PROVIDER.to_string();
        }
        Ok(self)
    }
}
