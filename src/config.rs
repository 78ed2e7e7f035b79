//! Environment-driven runtime configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// SQLite database holding the call log and contacts tables.
    pub db_path: PathBuf,
    /// Number the carrier routes to voicemail, if known.
    pub voicemail_number: Option<String>,
    /// How long after the first frame before the resolution worker spins up.
    pub worker_start_delay: Duration,
    /// Bound on resident contact photos.
    pub photo_cache_capacity: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = env::var("CALLFLOW_DB_PATH").unwrap_or_else(|_| "data/callflow.db".to_string());
        if db_path.is_empty() {
            return Err(ConfigError::InvalidValue(
                "CALLFLOW_DB_PATH cannot be empty".to_string(),
            ));
        }

        let voicemail_number = env::var("CALLFLOW_VOICEMAIL_NUMBER")
            .ok()
            .filter(|v| !v.is_empty());

        let worker_start_delay_ms = env::var("CALLFLOW_WORKER_START_DELAY_MS")
            .ok()
            .map(|raw| match raw.parse::<u64>() {
                Ok(ms) => ms,
                Err(_) => {
                    log::warn!(
                        "Invalid CALLFLOW_WORKER_START_DELAY_MS '{}', defaulting to 1000",
                        raw
                    );
                    1000
                }
            })
            .unwrap_or(1000);

        let photo_cache_capacity = env::var("CALLFLOW_PHOTO_CACHE_CAPACITY")
            .ok()
            .map(|raw| match raw.parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    log::warn!(
                        "Invalid CALLFLOW_PHOTO_CACHE_CAPACITY '{}', defaulting to 32",
                        raw
                    );
                    32
                }
            })
            .unwrap_or(32);

        Ok(Self {
            db_path: db_path.into(),
            voicemail_number,
            worker_start_delay: Duration::from_millis(worker_start_delay_ms),
            photo_cache_capacity,
        })
    }
}
