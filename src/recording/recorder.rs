//! Interaction recorder
//!
//! Observes each completed live exchange during a recording session, builds
//! an [`Interaction`] record with its per-key sequence number and fixture
//! storage path, and appends it to the in-memory session log. Nothing is
//! written to storage here; persistence is deferred to session end so the
//! whole session lands atomically or not at all.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::intercept::RawExchange;
use crate::key::{normalize_path, Key};
use crate::storage::{Body, Interaction};
use crate::url;

/// Builds interaction records from completed live exchanges
#[derive(Debug)]
pub struct InteractionRecorder {
    fixture_dir: PathBuf,
    include_query: bool,
    log: Vec<Interaction>,
    /// Per-key capture sequence, drives replay matching
    sequence: HashMap<Key, u32>,
    /// Per path+method fixture-name occurrence counter. Query is excluded
    /// here by design: queries can carry volatile data like timestamps,
    /// which would scatter one endpoint's fixtures across many files.
    occurrences: HashMap<String, u32>,
}

impl InteractionRecorder {
    /// Create a recorder writing fixture paths under `fixture_dir`
    #[must_use]
    pub fn new(fixture_dir: PathBuf, include_query: bool) -> Self {
        Self {
            fixture_dir,
            include_query,
            log: Vec::new(),
            sequence: HashMap::new(),
            occurrences: HashMap::new(),
        }
    }

    /// Capture one completed live exchange into the session log.
    ///
    /// Never fails: a response body that claims JSON but does not parse is
    /// kept as raw text.
    pub fn capture(&mut self, exchange: RawExchange) -> &Interaction {
        let parsed = url::parse(&exchange.url);
        let path = normalize_path(&parsed.path);
        let query = parsed.query;

        let body = Body::from_raw(&exchange.response, &exchange.content_type);

        let key = Key::new(&exchange.method, &path, &query, self.include_query);
        let count = {
            let entry = self.sequence.entry(key.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let fixture_path = self.fixture_path(&path, &exchange.method, &exchange.content_type);

        debug!("Recorded {key} #{count} -> {}", fixture_path.display());

        self.log.push(Interaction {
            method: exchange.method,
            path,
            query,
            request: exchange.request,
            response: Some(body),
            status: exchange.status,
            status_text: exchange.status_text,
            content_type: exchange.content_type,
            count,
            fixture_path,
        });
        // just pushed, cannot be empty
        &self.log[self.log.len() - 1]
    }

    /// `<fixture_dir>/<path>.<METHOD><occurrence>[.json|.txt]`
    fn fixture_path(&mut self, path: &str, method: &str, content_type: &str) -> PathBuf {
        let stem = format!("{path}.{method}");
        let occurrence = {
            let entry = self.occurrences.entry(stem.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        let content_type = content_type.to_lowercase();
        let extension = if content_type.contains("json") {
            ".json"
        } else if content_type.contains("text") {
            ".txt"
        } else {
            ""
        };

        self.fixture_dir
            .join(format!("{stem}{occurrence}{extension}"))
    }

    /// Number of captured interactions
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether nothing has been captured yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Consume the recorder, yielding the session log in capture order
    #[must_use]
    pub fn into_log(self) -> Vec<Interaction> {
        self.log
    }
}
