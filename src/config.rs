//! Configuration types for Mimeo

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::replay::ResolveMock;
use crate::{MimeoError, Result};

/// Runner-level configuration: what the host test run allows and where
/// session state lives on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Whether sessions may record live traffic
    #[serde(default = "default_true")]
    pub record: bool,
    /// Whether sessions may replay persisted recordings
    #[serde(default = "default_true")]
    pub playback: bool,
    /// Directory holding session manifests
    pub manifest_dir: PathBuf,
    /// Root directory for per-session fixture subdirectories
    pub fixture_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

impl RunnerConfig {
    /// Create a configuration with recording and playback both allowed
    #[must_use]
    pub fn new(manifest_dir: impl Into<PathBuf>, fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            record: true,
            playback: true,
            manifest_dir: manifest_dir.into(),
            fixture_dir: fixture_dir.into(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MimeoError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| MimeoError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.manifest_dir.as_os_str().is_empty() {
            return Err(MimeoError::ConfigError(
                "manifest_dir cannot be empty".to_string(),
            ));
        }

        if self.fixture_dir.as_os_str().is_empty() {
            return Err(MimeoError::ConfigError(
                "fixture_dir cannot be empty".to_string(),
            ));
        }

        if self.manifest_dir == self.fixture_dir {
            return Err(MimeoError::ConfigError(
                "manifest_dir and fixture_dir must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}

/// Per-session options supplied at `begin_session`
#[derive(Default)]
pub struct SessionOptions {
    /// Session uses hand-written mocks: never auto-record even when the
    /// runner allows recording
    pub is_custom_mock: bool,
    /// Include the query string in keys (and therefore in replay matching)
    pub include_query: bool,
    /// Raise per-request resolution logging from debug to info
    pub verbose: bool,
    /// Resolver override; post-processes the default sequential result
    pub resolver: Option<Box<dyn ResolveMock + Send>>,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("is_custom_mock", &self.is_custom_mock)
            .field("include_query", &self.include_query)
            .field("verbose", &self.verbose)
            .field("resolver", &self.resolver.as_ref().map(|_| "<override>"))
            .finish()
    }
}
