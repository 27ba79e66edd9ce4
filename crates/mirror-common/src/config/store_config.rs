//! Store configuration
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Where the store keeps its committed state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Volatile store, state lives only in the process
    #[default]
    InMemory,
    /// Snapshot-backed store persisted to the given file
    OnDisk(PathBuf),
}

impl StoreKind {
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::OnDisk(_))
    }

    /// Snapshot path for on-disk stores
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::InMemory => None,
            Self::OnDisk(path) => Some(path),
        }
    }
}

/// Main store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file path; absent means in-memory
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Buffer size of the commit notification feed
    #[serde(default = "default_commit_feed_buffer")]
    pub commit_feed_buffer: usize,
    /// Seconds before a typing signal expires
    #[serde(default = "default_typing_timeout_secs")]
    pub typing_timeout_secs: u64,
}

// Default value functions
fn default_commit_feed_buffer() -> usize {
    256
}

fn default_typing_timeout_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            commit_feed_buffer: default_commit_feed_buffer(),
            typing_timeout_secs: default_typing_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a present variable cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let commit_feed_buffer = match env::var("MIRROR_COMMIT_FEED_BUFFER") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidVar("MIRROR_COMMIT_FEED_BUFFER"))?,
            Err(_) => default_commit_feed_buffer(),
        };

        let typing_timeout_secs = match env::var("MIRROR_TYPING_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidVar("MIRROR_TYPING_TIMEOUT_SECS"))?,
            Err(_) => default_typing_timeout_secs(),
        };

        Ok(Self {
            snapshot_path: env::var("MIRROR_SNAPSHOT_PATH").ok().map(PathBuf::from),
            commit_feed_buffer,
            typing_timeout_secs,
        })
    }

    /// Resolve the configured store kind
    #[must_use]
    pub fn kind(&self) -> StoreKind {
        match &self.snapshot_path {
            Some(path) => StoreKind::OnDisk(path.clone()),
            None => StoreKind::InMemory,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} has an invalid value")]
    InvalidVar(&'static str),
}
