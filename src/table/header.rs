//! File-level header tag map.
//!
//! Every attribute file opens with a `BeginHeader`/`EndHeader` block of
//! `key value` lines. Semantically a string map, but insertion order is
//! preserved for display and round-trip stability.

use smallvec::SmallVec;
use std::fmt;

/// Order-preserving header tag map.
///
/// Uses SmallVec optimization for the common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct HeaderTags {
    entries: SmallVec<[(String, String); 8]>,
}

impl HeaderTags {
    /// Create an empty tag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a tag value, replacing any existing entry with the same key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a tag value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        if let Some(pos) = self.entries.iter().position(|(k, _)| k == key) {
            Some(self.entries.remove(pos).1)
        } else {
            None
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // === Reserved keys ===

    /// File comment (stored in escaped single-line form on disk).
    pub const COMMENT_KEY: &'static str = "comment";

    /// Row encoding selector (`ASCII`, `BINARY`, ...).
    pub const ENCODING_KEY: &'static str = "encoding";

    /// Surface-type provenance; drives surface-type inference on read.
    pub const CONFIGURATION_ID_KEY: &'static str = "configuration_id";

    /// Topology-type provenance; drives topology-type inference on read.
    pub const PERIMETER_ID_KEY: &'static str = "perimeter_id";

    /// File-level PubMed identifier.
    pub const PUBMED_ID_KEY: &'static str = "pubmed_id";

    /// Get the configuration id (surface type provenance).
    pub fn configuration_id(&self) -> Option<&str> {
        self.get(Self::CONFIGURATION_ID_KEY)
    }

    /// Get the perimeter id (topology type provenance).
    pub fn perimeter_id(&self) -> Option<&str> {
        self.get(Self::PERIMETER_ID_KEY)
    }

    /// Get the file-level PubMed id.
    pub fn pubmed_id(&self) -> Option<&str> {
        self.get(Self::PUBMED_ID_KEY)
    }
}

impl fmt::Debug for HeaderTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl FromIterator<(String, String)> for HeaderTags {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut tags = Self::new();
        for (k, v) in iter {
            tags.set(k, v);
        }
        tags
    }
}
