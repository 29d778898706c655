//! Application configuration for ProjPool core.
//!
//! Values come from an optional TOML file, then environment overrides, then
//! built-in defaults for anything still unset. An empty file is a valid config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding `[database] path`.
pub const ENV_DATABASE_PATH: &str = "PROJPOOL_DATABASE_PATH";
/// Environment variable overriding `[logging] level`.
pub const ENV_LOG_LEVEL: &str = "PROJPOOL_LOG_LEVEL";
/// Environment variable overriding `[logging] dir`.
pub const ENV_LOG_DIR: &str = "PROJPOOL_LOG_DIR";
/// Environment variable overriding `[generation] project_id`.
pub const ENV_GCP_PROJECT_ID: &str = "GOOGLE_CLOUD_PROJECT_ID";
/// Environment variable overriding `[generation] region`.
pub const ENV_GCP_REGION: &str = "GOOGLE_CLOUD_REGION";
/// Environment variable overriding `[generation] model_id`.
pub const ENV_GEMINI_MODEL_ID: &str = "GOOGLE_CLOUD_GEMINI_MODEL_ID";

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading and validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("projpool.sqlite3")
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`; build-mode default when unset.
    #[serde(default)]
    pub level: Option<String>,
    /// Absolute directory for rolling log files. File logging is off when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// `[generation]` section: Vertex AI Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub model_id: Option<String>,
    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Full `generateContent` URL, replacing the one derived from project/region/model.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: default_region(),
            model_id: None,
            access_token_env: default_access_token_env(),
            timeout_secs: default_timeout_secs(),
            endpoint: None,
        }
    }
}

fn default_region() -> String {
    "us-central1".into()
}
fn default_access_token_env() -> String {
    "GOOGLE_CLOUD_ACCESS_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    60
}

/// `[limits]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_label_limit")]
    pub max_labels_per_project: u32,
    #[serde(default = "default_label_limit")]
    pub max_labels_per_request: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_labels_per_project: default_label_limit(),
            max_labels_per_request: default_label_limit(),
        }
    }
}

fn default_label_limit() -> u32 {
    10
}

impl AppConfig {
    /// Loads config from `path` (defaults when `None`), applies process
    /// environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML config file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(ENV_DATABASE_PATH) {
            self.database.path = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            self.logging.level = Some(value);
        }
        if let Some(value) = get(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get(ENV_GCP_PROJECT_ID) {
            self.generation.project_id = Some(value);
        }
        if let Some(value) = get(ENV_GCP_REGION) {
            self.generation.region = value;
        }
        if let Some(value) = get(ENV_GEMINI_MODEL_ID) {
            self.generation.model_id = Some(value);
        }
    }

    /// Rejects limit and timeout values the services cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        let limits = &self.limits;
        if limits.max_labels_per_project == 0 || limits.max_labels_per_request == 0 {
            return Err(ConfigError::Invalid(
                "label limits must be greater than zero".to_string(),
            ));
        }
        if limits.max_labels_per_request > limits.max_labels_per_project {
            return Err(ConfigError::Invalid(format!(
                "max_labels_per_request ({}) exceeds max_labels_per_project ({})",
                limits.max_labels_per_request, limits.max_labels_per_project
            )));
        }
        if self.generation.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
