//! Configuration management

use crate::error::{ErrorContext, FicctError, FicctResult};
use crate::logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base URL used when neither the environment nor the config file names one
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Environment variables consulted for the API base URL, first match wins
pub const API_URL_ENV_VARS: [&str; 2] = ["FICCT_API_URL", "NEXT_PUBLIC_API_URL"];

/// Environment variable overriding the session file location
pub const SESSION_FILE_ENV_VAR: &str = "FICCT_SESSION_FILE";

/// Top-level client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FicctConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://ficct.example.edu/api`
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string sent with every request
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: 30,
            user_agent: format!("ficct-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// The one base URL every request is issued against
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Where the session is persisted between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file on disk, survives process restarts
    File,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: StorageBackend,
    /// Session file path; defaults to the user data directory
    pub path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: None,
        }
    }
}

impl SessionConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_session_path)
    }
}

/// Default location of the session file
pub fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("ficct").join("session.json"))
        .unwrap_or_else(|| PathBuf::from(".ficct-session.json"))
}

impl FicctConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> FicctResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FicctError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: FicctConfig = toml::from_str(&content).map_err(|e| FicctError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> FicctResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| FicctError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| FicctError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = API_URL_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.trim().is_empty())
        {
            self.api.base_url = Some(url);
        }

        if let Some(path) = lookup(SESSION_FILE_ENV_VAR).filter(|p| !p.trim().is_empty()) {
            self.session.path = Some(PathBuf::from(path));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> FicctResult<()> {
        let base_url = self.api.resolved_base_url();
        let parsed = url::Url::parse(&base_url).map_err(|e| FicctError::Config {
            message: format!("Invalid API base URL '{}': {}", base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Set api.base_url to an absolute http(s) URL"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(crate::config_error!(
                format!("Unsupported API URL scheme: {}", parsed.scheme()),
                "config"
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(crate::validation_error!(
                "API timeout_seconds must be greater than 0",
                "api.timeout_seconds",
                "config"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_single_fallback_url() {
        let config = FicctConfig::default();
        assert_eq!(config.api.resolved_base_url(), DEFAULT_API_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let mut config = FicctConfig::default();
        config.api.base_url = Some("https://ficct.example.edu/api/".to_string());
        assert_eq!(
            config.api.resolved_base_url(),
            "https://ficct.example.edu/api"
        );
    }

    #[test]
    fn test_env_overrides_precedence() {
        let env: HashMap<&str, &str> = [
            ("NEXT_PUBLIC_API_URL", "http://next.example/api"),
            ("FICCT_API_URL", "http://ficct.example/api"),
            ("FICCT_SESSION_FILE", "/tmp/ficct/session.json"),
        ]
        .into_iter()
        .collect();

        let mut config = FicctConfig::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.resolved_base_url(), "http://ficct.example/api");
        assert_eq!(
            config.session.resolved_path(),
            PathBuf::from("/tmp/ficct/session.json")
        );
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = FicctConfig::default();
        config.api.base_url = Some("http://from-file/api".to_string());
        config.apply_overrides_from(|k| match k {
            "FICCT_API_URL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api.resolved_base_url(), "http://from-file/api");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FicctConfig::default();
        config.api.base_url = Some("ftp://ficct.example/api".to_string());
        assert!(config.validate().is_err());

        let mut config = FicctConfig::default();
        config.api.base_url = Some("not a url".to_string());
        assert!(config.validate().is_err());

        let mut config = FicctConfig::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = FicctConfig::default();
        config.api.base_url = Some("https://ficct.example.edu/api".to_string());
        config.session.backend = StorageBackend::Memory;
        config.save_to_file(&path).unwrap();

        let loaded = FicctConfig::from_file(&path).unwrap();
        assert_eq!(
            loaded.api.base_url.as_deref(),
            Some("https://ficct.example.edu/api")
        );
        assert_eq!(loaded.session.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: FicctConfig = toml::from_str("[api]\ntimeout_seconds = 5\n").unwrap();
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.session.backend, StorageBackend::File);
        assert_eq!(config.logging.level, "info");
    }
}
