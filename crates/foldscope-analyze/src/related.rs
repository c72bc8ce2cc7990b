//! Related-file grouping by filename stem.
//!
//! A new file joins the first existing group whose representative stem
//! contains, or is contained in, the new file's stem. Matching is
//! first-come-first-served, so groupings depend on discovery order. Each file
//! is compared against every existing group, which is quadratic over a scan;
//! the file-count ceiling keeps that bounded.

use std::path::Path;

use indexmap::IndexMap;

/// Default minimum stem length (exclusive) for the shorter of two stems.
pub const DEFAULT_MIN_STEM_LEN: usize = 3;

/// Groups files whose stems overlap.
#[derive(Debug, Clone, Copy)]
pub struct RelationGrouper {
    min_stem_len: usize,
}

impl RelationGrouper {
    /// Create a grouper with the default stem threshold.
    pub fn new() -> Self {
        Self {
            min_stem_len: DEFAULT_MIN_STEM_LEN,
        }
    }

    /// Create a grouper that only relates stems longer than `min_stem_len`.
    pub fn with_min_stem_len(min_stem_len: usize) -> Self {
        Self { min_stem_len }
    }

    /// Add `path` to `groups`: append it to the first matching group, or
    /// make it the representative of a new, empty group.
    pub fn group(&self, groups: &mut IndexMap<String, Vec<String>>, path: &str) {
        let stem = stem_of(path);

        let matched = groups
            .iter_mut()
            .find(|(key, _)| self.related(stem, stem_of(key)));

        match matched {
            Some((_, related)) => related.push(path.to_string()),
            None => {
                groups.insert(path.to_string(), Vec::new());
            }
        }
    }

    /// Check if two stems belong together.
    pub fn related(&self, a: &str, b: &str) -> bool {
        let (shorter, longer) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        shorter.chars().count() > self.min_stem_len && longer.contains(shorter)
    }
}

impl Default for RelationGrouper {
    fn default() -> Self {
        Self::new()
    }
}

fn stem_of(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}
