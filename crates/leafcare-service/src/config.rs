//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use leafcare_core::SpeciesTemplate;
use leafcare_core::photo::DEFAULT_MAX_UPLOAD_BYTES;

/// Environment variables checked for the Plant.id key, in priority order.
pub const PLANT_ID_KEY_VARS: &[&str] = &["PLANT_ID_API_KEY", "VITE_PLANT_ID_API_KEY"];
/// Environment variables checked for the OpenWeatherMap key, in priority order.
pub const OPENWEATHER_KEY_VARS: &[&str] = &["OPENWEATHER_API_KEY", "VITE_OPENWEATHER_API_KEY"];

/// Minimum outbound request timeout in seconds.
pub const MIN_TIMEOUT_SECS: u64 = 1;
/// Maximum outbound request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    /// Plant.id identification API.
    pub plant_id: PlantIdConfig,
    /// OpenWeatherMap API.
    pub weather: WeatherConfig,
    /// Extra species care templates.
    pub care: CareConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Fill API keys from the process environment.
    ///
    /// See [`apply_env_with`](Self::apply_env_with).
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Fill API keys from `lookup`.
    ///
    /// A non-empty variable from [`PLANT_ID_KEY_VARS`] or
    /// [`OPENWEATHER_KEY_VARS`] overrides the key from the file. The first
    /// variable in each list wins.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_set = |vars: &[&str]| {
            vars.iter()
                .filter_map(|name| lookup(*name))
                .find(|value| !value.is_empty())
        };

        if let Some(key) = first_set(PLANT_ID_KEY_VARS) {
            self.plant_id.api_key = Some(key);
        }
        if let Some(key) = first_set(OPENWEATHER_KEY_VARS) {
            self.weather.api_key = Some(key);
        }
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Upload limit is non-zero
    /// - SQLite storage has a path
    /// - API base URLs use http(s) and timeouts are within bounds
    /// - Every species template has at least one non-empty keyword
    ///
    /// # Example
    ///
    /// ```
    /// use leafcare_service::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(validate_api(
            "plant_id",
            &self.plant_id.base_url,
            self.plant_id.timeout_secs,
        ));
        errors.extend(validate_api(
            "weather",
            &self.weather.base_url,
            self.weather.timeout_secs,
        ));
        errors.extend(self.care.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind: String,
    /// Maximum accepted image upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError::new(
                "server.bind",
                "bind address cannot be empty",
            ));
        } else {
            match self.bind.rsplit_once(':') {
                None => errors.push(ValidationError::new(
                    "server.bind",
                    format!(
                        "invalid bind address '{}': expected format 'host:port'",
                        self.bind
                    ),
                )),
                Some((_, port)) => match port.parse::<u16>() {
                    Ok(0) => errors.push(ValidationError::new("server.bind", "port cannot be 0")),
                    Err(_) => errors.push(ValidationError::new(
                        "server.bind",
                        format!("invalid port '{}': must be a number 1-65535", port),
                    )),
                    Ok(_) => {}
                },
            }
        }

        if self.max_upload_bytes == 0 {
            errors.push(ValidationError::new(
                "server.max_upload_bytes",
                "upload limit must be greater than 0",
            ));
        }

        errors
    }
}

/// Which record store backs the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, lost on restart.
    #[default]
    Memory,
    /// SQLite file at `storage.path`.
    Sqlite,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file path (SQLite backend only).
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: leafcare_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.backend == StorageBackend::Sqlite && self.path.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.path",
                "database path cannot be empty",
            ));
        }

        errors
    }
}

/// Plant.id API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantIdConfig {
    /// API key; analysis requests fail without one.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PlantIdConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: leafcare_core::plant_id::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl PlantIdConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OpenWeatherMap API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// API key; weather is skipped without one.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: leafcare_core::weather::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn validate_api(section: &str, base_url: &str, timeout_secs: u64) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ValidationError::new(
            format!("{}.base_url", section),
            format!("'{}' must start with http:// or https://", base_url),
        ));
    }

    if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
        errors.push(ValidationError::new(
            format!("{}.timeout_secs", section),
            format!(
                "timeout {} is out of range ({}-{} seconds)",
                timeout_secs, MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS
            ),
        ));
    }

    errors
}

/// Species care templates checked before the built-in ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareConfig {
    pub species: Vec<SpeciesTemplate>,
}

impl CareConfig {
    pub fn validate(&self) -> Vec<ValidationError> {
        self.species
            .iter()
            .enumerate()
            .filter(|(_, t)| t.keywords.iter().all(|k| k.trim().is_empty()))
            .map(|(i, _)| {
                ValidationError::new(
                    format!("care.species[{}].keywords", i),
                    "at least one non-empty keyword is required",
                )
            })
            .collect()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind` or `care.species[0].keywords`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leafcare")
        .join("server.toml")
}
