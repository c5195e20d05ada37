//! Engine connection configuration.
//!
//! The configuration is TOML:
//!
//! ```toml
//! [storage]
//! backend = "memory"
//! snapshot_path = "/var/lib/scanbridge/data.json"
//! read_only = false
//! session_timeout_ms = 10000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

/// Storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process backend, optionally persisted to a JSON snapshot.
    Memory,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Storage section.
    pub storage: StorageSection,
}

/// The `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Backend kind.
    #[serde(default = "default_backend")]
    pub backend: Backend,

    /// Snapshot file of the memory backend; `None` keeps data in memory only.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Reject writes and DDL.
    #[serde(default)]
    pub read_only: bool,

    /// Longest time, in milliseconds, a session operation waits for the
    /// engine before failing with a connection error.
    #[serde(default = "default_session_timeout")]
    pub session_timeout_ms: u64,
}

fn default_backend() -> Backend {
    Backend::Memory
}

fn default_session_timeout() -> u64 {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage: StorageSection {
                backend: default_backend(),
                snapshot_path: None,
                read_only: false,
                session_timeout_ms: default_session_timeout(),
            },
        }
    }
}

impl EngineConfig {
    /// Creates an in-memory configuration.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Creates a configuration persisted to a snapshot file.
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.snapshot_path = Some(path.into());
        config
    }

    /// Parses the configuration from TOML text.
    pub fn from_toml(text: &str) -> StorageResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StorageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml(&self) -> StorageResult<String> {
        toml::to_string_pretty(self).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StorageResult<()> {
        if self.storage.session_timeout_ms == 0 {
            return Err(StorageError::Config(
                "session_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.storage.snapshot_path {
            if path.as_os_str().is_empty() {
                return Err(StorageError::Config(
                    "snapshot_path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Returns the snapshot path, if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.storage.snapshot_path.as_deref()
    }

    /// Returns the session timeout.
    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.session_timeout_ms)
    }

    /// Marks the configuration read-only.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.storage.read_only = read_only;
        self
    }
}
