//! Session persistence: JSON manifest plus per-interaction fixture files

mod manifest;
mod store;

pub use manifest::{Body, Interaction, Manifest, VersionTag};
pub use store::SessionStore;

use std::path::Path;

/// Manifest file name for a session: `.json` appended only when missing
#[must_use]
pub fn manifest_file_name(session_name: &str) -> String {
    if session_name.ends_with(".json") {
        session_name.to_string()
    } else {
        format!("{session_name}.json")
    }
}

/// Seam for path-existence checks.
///
/// The engine only ever asks "does this manifest exist?"; hosts that probe
/// through shell commands or a sandboxed filesystem supply their own
/// implementation.
pub trait PathProbe {
    /// Whether a file exists at `path`
    fn exists(&self, path: &Path) -> bool;
}

/// Default probe backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeProbe;

impl PathProbe for NativeProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
