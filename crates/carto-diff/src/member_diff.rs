//! Member-list diff: ordered comparison of composite members.
//!
//! Uses the `similar` crate (Myers diff algorithm) over member slices, so a
//! member that moved or changed role shows up as a removal plus an addition.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use carto_graph::Member;

/// The result of diffing two member lists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDiff {
    /// Every member of either list, in merged order.
    pub changes: Vec<MemberChange>,
}

impl MemberDiff {
    /// Returns `true` if the two lists are identical.
    pub fn is_empty(&self) -> bool {
        self.changes
            .iter()
            .all(|c| matches!(c, MemberChange::Kept(_)))
    }

    /// Number of members only in the new list.
    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MemberChange::Added(_)))
            .count()
    }

    /// Number of members only in the old list.
    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, MemberChange::Removed(_)))
            .count()
    }
}

/// A single entry in a member-list diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberChange {
    /// Present at the same relative position in both lists.
    Kept(Member),
    /// Only in the new list.
    Added(Member),
    /// Only in the old list.
    Removed(Member),
}

/// Compute an ordered diff between two member lists.
pub fn diff_members(old: &[Member], new: &[Member]) -> MemberDiff {
    let mut changes = Vec::new();

    for op in capture_diff_slices(Algorithm::Myers, old, new) {
        match op {
            DiffOp::Equal { old_index, len, .. } => {
                for m in &old[old_index..old_index + len] {
                    changes.push(MemberChange::Kept(m.clone()));
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                for m in &old[old_index..old_index + old_len] {
                    changes.push(MemberChange::Removed(m.clone()));
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for m in &new[new_index..new_index + new_len] {
                    changes.push(MemberChange::Added(m.clone()));
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                for m in &old[old_index..old_index + old_len] {
                    changes.push(MemberChange::Removed(m.clone()));
                }
                for m in &new[new_index..new_index + new_len] {
                    changes.push(MemberChange::Added(m.clone()));
                }
            }
        }
    }

    MemberDiff { changes }
}
