//! Key→mocks lookup table and call-count state for a replay session

use std::collections::HashMap;

use tracing::debug;

use crate::intercept::LiveRequest;
use crate::key::Key;
use crate::storage::Interaction;

/// Lookup table built once at replay-session start from the manifest.
///
/// Interactions stay in manifest (capture) order; grouping by key happens
/// only here, in the derived index. The table itself is never mutated after
/// build; only the per-key call counts advance as mocks are served.
#[derive(Debug)]
pub struct MockTable {
    /// All interactions in manifest order, fixture bodies attached
    mocks: Vec<Interaction>,
    /// Key → indices into `mocks`, in manifest order
    by_key: HashMap<Key, Vec<usize>>,
    /// Key → next sequence number expected (starts at 1)
    call_counts: HashMap<Key, u32>,
    include_query: bool,
}

impl MockTable {
    /// Build the table from a manifest's recordings
    #[must_use]
    pub fn build(mocks: Vec<Interaction>, include_query: bool) -> Self {
        let mut by_key: HashMap<Key, Vec<usize>> = HashMap::new();
        for (index, mock) in mocks.iter().enumerate() {
            let key = Key::for_interaction(mock, include_query);
            by_key.entry(key).or_default().push(index);
        }

        Self {
            mocks,
            by_key,
            call_counts: HashMap::new(),
            include_query,
        }
    }

    /// Default resolution algorithm.
    ///
    /// Scans the key's mock list in manifest order and serves the first
    /// entry whose sequence number equals the key's current call count,
    /// advancing the count by one. When no entry has the exact sequence
    /// number, the *last* key-matching entry scanned is served instead:
    /// the scan remembers the most recent key match rather than resetting.
    /// This fall-through keeps over-called endpoints pinned to their final
    /// recorded response and is preserved deliberately; see the crate docs
    /// before "fixing" it.
    ///
    /// A key with no recorded mocks returns `None` and leaves the call
    /// count untouched; the caller lets the request fall through to the
    /// real network.
    pub fn resolve_default(&mut self, request: &LiveRequest) -> Option<&Interaction> {
        let key = Key::for_request(request, self.include_query);
        let count = *self.call_counts.entry(key.clone()).or_insert(1);

        let indices = self.by_key.get(&key)?;
        let mut winner = None;
        for &index in indices {
            winner = Some(index);
            if self.mocks[index].count == count {
                break;
            }
        }

        let index = winner?;
        debug!("Resolved {key} call {count} -> recording #{}", self.mocks[index].count);
        if let Some(entry) = self.call_counts.get_mut(&key) {
            *entry += 1;
        }
        Some(&self.mocks[index])
    }

    /// All mocks in manifest order (handed to resolver overrides)
    #[must_use]
    pub fn mocks(&self) -> &[Interaction] {
        &self.mocks
    }

    /// Number of loaded mocks
    #[must_use]
    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    /// Whether the table holds no mocks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }
}
