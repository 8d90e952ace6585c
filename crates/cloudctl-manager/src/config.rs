use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cloudctl_controllers::ControllerConfig;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(String),
    #[error("config deserialize error: {0}")]
    Deserialize(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub controllers: ControllerConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub claims: ClaimsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl ManagerConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.controllers.validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "logging.level must be one of {valid_levels:?}, got '{}'",
                self.logging.level
            ));
        }

        if self.directory.backend == DirectoryBackend::Http && self.directory.base_url.is_none() {
            return Err("directory.base_url is required for the http backend".into());
        }
        if self.directory.timeout.is_zero() {
            return Err("directory.timeout must be > 0".into());
        }

        if self.claims.timeout.is_zero() {
            return Err("claims.timeout must be > 0".into());
        }
        if self.claims.backend != ClaimsBackend::Static && !self.claims.repositories.is_empty() {
            return Err("claims.repositories is only used by the static backend".into());
        }
        for entry in &self.claims.repositories {
            if entry.repository_url.trim().is_empty() || entry.git_commit.trim().is_empty() {
                return Err(
                    "claims.repositories entries need repository_url and git_commit".into(),
                );
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    #[default]
    Static,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub backend: DirectoryBackend,
    /// Group table for the static backend.
    #[serde(default)]
    pub groups: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub base_url: Option<Url>,
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            backend: DirectoryBackend::Static,
            groups: HashMap::new(),
            base_url: None,
            timeout: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimsBackend {
    #[default]
    None,
    Static,
    Http,
}

/// Claim list served by the static backend for one repository commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticClaims {
    pub repository_url: String,
    pub git_commit: String,
    #[serde(default)]
    pub claims: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimsConfig {
    #[serde(default)]
    pub backend: ClaimsBackend,
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default)]
    pub repositories: Vec<StaticClaims>,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            backend: ClaimsBackend::None,
            timeout: default_http_timeout(),
            repositories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Directory of JSON manifests created in the store before the
    /// controllers start.
    #[serde(default)]
    pub manifests_dir: Option<PathBuf>,
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_log_level() -> String {
    "info".to_string()
}

pub mod loader {
    use super::{ConfigError, ManagerConfig};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "cloudctl.toml";

    /// Loads the optional TOML file at `path` (or `cloudctl.toml`), then
    /// applies `CLOUDCTL__SECTION__KEY` environment overrides.
    pub fn load_config(path: Option<&str>) -> Result<ManagerConfig, ConfigError> {
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        let mut builder = Config::builder();
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // e.g. CLOUDCTL__CONTROLLERS__MAX_CONCURRENT_RECONCILES=4
        builder = builder.add_source(
            Environment::with_prefix("CLOUDCTL")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Build(e.to_string()))?;
        let merged: ManagerConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        merged.validate().map_err(ConfigError::Invalid)?;
        Ok(merged)
    }
}
