//! Runtime configuration for the catalog core.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file:
//!
//! - `HBNB_STORAGE`: `memory` (default) or `sqlite`
//! - `HBNB_DATABASE_PATH`: database file, required for `sqlite`
//! - `HBNB_LOG_LEVEL`: `trace|debug|info|warn|error`
//! - `HBNB_LOG_DIR`: absolute directory; file logging stays off when unset

use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const STORAGE_VAR: &str = "HBNB_STORAGE";
pub const DATABASE_PATH_VAR: &str = "HBNB_DATABASE_PATH";
pub const LOG_LEVEL_VAR: &str = "HBNB_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "HBNB_LOG_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Storage backend selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
}

impl StorageBackend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub storage: StorageBackend,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Reads configuration from the environment after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage = match read(STORAGE_VAR).map(|value| value.to_ascii_lowercase()) {
            None => StorageBackend::Memory,
            Some(kind) if kind == "memory" => StorageBackend::Memory,
            Some(kind) if kind == "sqlite" => StorageBackend::Sqlite {
                path: read(DATABASE_PATH_VAR)
                    .map(PathBuf::from)
                    .ok_or(ConfigError::Missing(DATABASE_PATH_VAR))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: STORAGE_VAR,
                    value: other,
                    reason: "expected memory|sqlite",
                })
            }
        };

        let log_level = match read(LOG_LEVEL_VAR) {
            Some(level) => normalize_level(&level)
                .map_err(|_| ConfigError::Invalid {
                    var: LOG_LEVEL_VAR,
                    value: level.clone(),
                    reason: "expected trace|debug|info|warn|error",
                })?
                .to_string(),
            None => default_log_level().to_string(),
        };

        let log_dir = match read(LOG_DIR_VAR) {
            Some(dir) => {
                let path = PathBuf::from(&dir);
                if !path.is_absolute() {
                    return Err(ConfigError::Invalid {
                        var: LOG_DIR_VAR,
                        value: dir,
                        reason: "must be an absolute path",
                    });
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            storage,
            log_level,
            log_dir,
        })
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns `Ok(false)` when no directory is set.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, dir).map(|()| true),
            None => Ok(false),
        }
    }
}
