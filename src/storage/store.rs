//! Reading and writing persisted sessions

use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::key::Key;
use crate::{MimeoError, Result};

use super::{Body, Manifest};

/// Serializes a session log to a manifest plus one fixture file per
/// interaction, and loads them back.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionStore;

impl SessionStore {
    /// Create a store
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Persist a session.
    ///
    /// Fixtures are durably written before the manifest, so a manifest is
    /// never observed on disk without its fixtures.
    pub async fn write(&self, manifest_path: &Path, manifest: &Manifest) -> Result<()> {
        for recording in &manifest.recordings {
            let Some(body) = recording.response.as_ref() else {
                continue;
            };
            if let Some(parent) = recording.fixture_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&recording.fixture_path, body.to_fixture_string()).await?;
            debug!("Wrote fixture {}", recording.fixture_path.display());
        }

        if let Some(parent) = manifest_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(manifest)?;
        fs::write(manifest_path, text).await?;

        info!(
            "Wrote manifest {} ({} recordings)",
            manifest_path.display(),
            manifest.recordings.len()
        );
        Ok(())
    }

    /// Load and shape-validate a manifest. Response bodies are not attached;
    /// see [`attach_fixtures`](Self::attach_fixtures).
    pub async fn load(&self, manifest_path: &Path) -> Result<Manifest> {
        let text = fs::read_to_string(manifest_path).await?;

        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| MimeoError::InvalidManifest {
                path: manifest_path.display().to_string(),
                reason: e.to_string(),
            })?;

        manifest
            .validate()
            .map_err(|reason| MimeoError::InvalidManifest {
                path: manifest_path.display().to_string(),
                reason,
            })?;

        debug!(
            "Loaded manifest {} ({} recordings)",
            manifest_path.display(),
            manifest.recordings.len()
        );
        Ok(manifest)
    }

    /// Read every recording's fixture file and attach its body.
    ///
    /// The write order guarantees fixtures exist whenever their manifest
    /// does, so a missing fixture is corruption and fails the load.
    pub async fn attach_fixtures(&self, manifest: &mut Manifest) -> Result<()> {
        for recording in &mut manifest.recordings {
            let contents = fs::read_to_string(&recording.fixture_path)
                .await
                .map_err(|_| MimeoError::MissingFixture {
                    path: recording.fixture_path.display().to_string(),
                    key: Key::for_interaction(recording, false).to_string(),
                })?;
            recording.response = Some(Body::from_fixture(&contents, &recording.content_type));
        }
        Ok(())
    }

    /// Remove a stale manifest file
    pub async fn delete(&self, manifest_path: &Path) -> Result<()> {
        fs::remove_file(manifest_path).await?;
        info!("Deleted stale manifest {}", manifest_path.display());
        Ok(())
    }
}
