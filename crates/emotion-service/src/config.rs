//! Layered service configuration: defaults, optional TOML file, environment

use std::path::Path;

use camera_capture::CameraConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use wellbeing::WellbeingConfig;

use crate::ServiceError;

/// Environment variable prefix, e.g. `EMOTION_SERVICE_CAMERA__DEVICE`
pub const ENV_PREFIX: &str = "EMOTION_SERVICE";

/// Log output format on the side channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Maximum level: trace, debug, info, warn, error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub camera: CameraConfig,
    pub wellbeing: WellbeingConfig,
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Load configuration. A missing `path` means defaults plus environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ServiceError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config: ServiceConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ServiceError::Config(e.to_string()))?;

        config
            .wellbeing
            .validate()
            .map_err(|e| ServiceError::Config(e.to_string()))?;
        Ok(config)
    }
}
