use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notes_engine::{ServiceSettings, TransportKind, DEFAULT_FILENAME};
use notes_logging::{notes_info, notes_warn};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Behaviour of the injected control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSettings {
    /// Fixed delay before `Error` re-derives its state. No backoff.
    pub error_recovery_delay: Duration,
    pub default_filename: String,
    /// Where downloaded notes are saved.
    pub output_dir: PathBuf,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            error_recovery_delay: Duration::from_secs(3),
            default_filename: DEFAULT_FILENAME.to_string(),
            output_dir: PathBuf::from("notes"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub control: ControlSettings,
}

/// On-disk shape of `notes.ron`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PersistedConfig {
    base_url: Option<String>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    transport: Option<TransportKind>,
    credential_path: Option<PathBuf>,
    error_recovery_delay_ms: Option<u64>,
    default_filename: Option<String>,
    output_dir: Option<PathBuf>,
}

impl PersistedConfig {
    fn apply(self, config: &mut AppConfig) {
        let service = &mut config.service;
        if let Some(base_url) = self.base_url {
            service.base_url = base_url;
        }
        if let Some(ms) = self.connect_timeout_ms {
            service.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            service.request_timeout = Duration::from_millis(ms);
        }
        if let Some(transport) = self.transport {
            service.transport = transport;
        }
        if self.credential_path.is_some() {
            service.credential_path = self.credential_path;
        }

        let control = &mut config.control;
        if let Some(ms) = self.error_recovery_delay_ms {
            control.error_recovery_delay = Duration::from_millis(ms);
        }
        if let Some(filename) = self.default_filename {
            control.default_filename = filename;
        }
        if let Some(dir) = self.output_dir {
            control.output_dir = dir;
        }
    }
}

/// Loads `path` over the defaults. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            notes_info!("No config at {:?}; using defaults", path);
            return Ok(config);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let persisted: PersistedConfig = ron::from_str(&content).map_err(|err| {
        notes_warn!("Failed to parse config from {:?}: {}", path, err);
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    persisted.apply(&mut config);
    notes_info!("Loaded config from {:?}", path);
    Ok(config)
}
