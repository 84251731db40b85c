use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "runtime/engine.json";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_SPEC: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read engine config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse engine config JSON {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// flexi_logger spec, e.g. `info` or `reader_playback=debug`.
    pub spec: String,
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            spec: DEFAULT_LOG_SPEC.to_string(),
            directory: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Upper bound on fragment length, applied on top of the synthesiser's own.
    pub max_fragment_chars: Option<usize>,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Read `path` as JSON, or fall back to defaults when it does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        serde_json::from_str(&data).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
    }

    /// Load from `READER_ENGINE_CONFIG` (or the default path), then apply
    /// `READER_MAX_FRAGMENT_CHARS`, `READER_LOG_LEVEL` and `READER_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("READER_ENGINE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut config = Self::load_or_default(path)?;

        if let Ok(raw) = std::env::var("READER_MAX_FRAGMENT_CHARS") {
            let limit = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "READER_MAX_FRAGMENT_CHARS",
                    value: raw.clone(),
                })?;
            config.max_fragment_chars = Some(limit);
        }
        if let Ok(spec) = std::env::var("READER_LOG_LEVEL") {
            config.logging.spec = spec;
        }
        if let Ok(dir) = std::env::var("READER_LOG_DIR") {
            config.logging.directory = PathBuf::from(dir);
        }
        Ok(config)
    }
}
