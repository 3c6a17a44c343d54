//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hmvid.toml` unless another path is given. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where device-type templates are read from.
    pub templates: TemplatesConfig,
    /// Where device snapshots are kept between runs.
    pub state: StateConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Devices to materialize at startup.
    pub devices: Vec<DeviceConfig>,
}

/// Template directory configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Directory holding one `<TYPE>.json` per device type.
    pub dir: PathBuf,
}

/// Snapshot persistence configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding one `<ADDRESS>.json` snapshot per device.
    /// Persistence is off when unset.
    pub dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One configured device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    /// Device type, the template name.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Device address (serial number).
    pub address: String,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path.as_ref())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HMVI_TEMPLATE_DIR") {
            self.templates.dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("HMVI_STATE_DIR") {
            self.state.dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HMVI_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.templates.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "template directory must not be empty".to_string(),
            ));
        }
        for (position, device) in self.devices.iter().enumerate() {
            if device.device_type.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "device #{position} has an empty type"
                )));
            }
            if device.address.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "device #{position} has an empty address"
                )));
            }
        }
        Ok(())
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("templates"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hmvid=info,hmvi_app=info,hmvi_domain=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
