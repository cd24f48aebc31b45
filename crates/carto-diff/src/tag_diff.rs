//! Tag-level diff: compare two tag maps.
//!
//! Detects key additions, removals, and value modifications.

use serde::{Deserialize, Serialize};

use carto_graph::Tags;

/// The result of comparing two tag maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDiff {
    /// The list of tag changes, in key order.
    pub changes: Vec<TagChange>,
}

impl TagDiff {
    /// Create an empty tag diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added keys.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TagChange::Added { .. }))
            .count()
    }

    /// Number of removed keys.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TagChange::Removed { .. }))
            .count()
    }

    /// Number of modified keys.
    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TagChange::Modified { .. }))
            .count()
    }

    /// The changed keys, in order.
    pub fn keys(&self) -> Vec<&str> {
        self.changes.iter().map(TagChange::key).collect()
    }
}

/// A single change in a tag map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagChange {
    /// A new key was added.
    Added { key: String, value: String },
    /// An existing key was removed.
    Removed { key: String, value: String },
    /// An existing key's value was modified.
    Modified {
        key: String,
        old: String,
        new: String,
    },
}

impl TagChange {
    /// The key this change applies to.
    pub fn key(&self) -> &str {
        match self {
            TagChange::Added { key, .. }
            | TagChange::Removed { key, .. }
            | TagChange::Modified { key, .. } => key,
        }
    }
}

/// Compute the diff between two tag maps.
///
/// Keys present only in `new` are `Added`, keys present only in `old` are
/// `Removed`, and keys present in both with different values are `Modified`.
/// Both maps are ordered, so the result is ordered by key.
pub fn diff_tags(old: &Tags, new: &Tags) -> TagDiff {
    let mut changes = Vec::new();

    for (key, old_val) in old {
        match new.get(key) {
            Some(new_val) if new_val != old_val => changes.push(TagChange::Modified {
                key: key.clone(),
                old: old_val.clone(),
                new: new_val.clone(),
            }),
            Some(_) => {}
            None => changes.push(TagChange::Removed {
                key: key.clone(),
                value: old_val.clone(),
            }),
        }
    }

    for (key, new_val) in new {
        if !old.contains_key(key) {
            changes.push(TagChange::Added {
                key: key.clone(),
                value: new_val.clone(),
            });
        }
    }

    changes.sort_by(|a, b| a.key().cmp(b.key()));
    TagDiff { changes }
}
