//! Manifest and interaction record types
//!
//! The manifest is the persisted, body-stripped description of a session:
//! `{ "version": <tag>, "recordings": [...] }` in capture order. Response
//! bodies are never embedded in the manifest; each lives in its own fixture
//! file at the interaction's `fixturePath`.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied session version tag, compared for equality only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionTag {
    /// Integer tag
    Int(i64),
    /// String tag
    Text(String),
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for VersionTag {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for VersionTag {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for VersionTag {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for VersionTag {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A response body, decoded according to its content type
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// JSON-decoded body (`Content-Type` contained `application/json`)
    Json(Value),
    /// Raw text body
    Text(String),
}

impl Body {
    /// Decode a captured raw body.
    ///
    /// JSON decoding is attempted only when the content type contains
    /// `application/json`; a decode failure is swallowed and the raw text
    /// kept, so capture never fails on a malformed body.
    #[must_use]
    pub fn from_raw(raw: &str, content_type: &str) -> Self {
        if content_type.to_lowercase().contains("application/json") {
            if let Ok(value) = serde_json::from_str(raw) {
                return Self::Json(value);
            }
        }
        Self::Text(raw.to_string())
    }

    /// Decode fixture file contents back into a body
    #[must_use]
    pub fn from_fixture(contents: &str, content_type: &str) -> Self {
        Self::from_raw(contents, content_type)
    }

    /// Encode the body for its fixture file: JSON pretty-printed, text
    /// verbatim.
    #[must_use]
    pub fn to_fixture_string(&self) -> String {
        match self {
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Text(text) => text.clone(),
        }
    }
}

/// One captured or replayable network exchange
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Uppercase HTTP verb
    pub method: String,
    /// Normalized URL path, leading/trailing `/` stripped
    pub path: String,
    /// Raw query string (may be empty)
    #[serde(default)]
    pub query: String,
    /// Structurally-cloned request body
    #[serde(default)]
    pub request: Value,
    /// Response body; lives in the fixture file, never in the manifest
    #[serde(skip)]
    pub response: Option<Body>,
    /// HTTP status code
    pub status: u16,
    /// HTTP status text
    pub status_text: String,
    /// Response `Content-Type`
    pub content_type: String,
    /// 1-based sequence number within this interaction's key group,
    /// assigned at capture in call order
    pub count: u32,
    /// Storage path of the fixture file holding the response body
    pub fixture_path: PathBuf,
}

/// Persisted session state: version tag plus recordings in capture order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Caller-supplied version tag
    pub version: VersionTag,
    /// Interactions in capture order (not grouped by key)
    pub recordings: Vec<Interaction>,
}

impl Manifest {
    /// Validate the shape of a loaded manifest.
    ///
    /// serde already rejects missing fields; this catches values that parse
    /// but cannot be replayed, with a reason naming the offending record.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (index, recording) in self.recordings.iter().enumerate() {
            if recording.method.is_empty() {
                return Err(format!("recording {index} has an empty method"));
            }
            if recording.count == 0 {
                return Err(format!(
                    "recording {index} has count 0 (sequence numbers are 1-based)"
                ));
            }
            if recording.fixture_path.as_os_str().is_empty() {
                return Err(format!("recording {index} has an empty fixturePath"));
            }
        }
        Ok(())
    }
}
