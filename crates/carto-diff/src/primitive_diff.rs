//! Whole-primitive diff between two versions of the same identity.
//!
//! Used to describe conflicts: what the local version holds that the
//! incoming version does not, and vice versa.

use serde::{Deserialize, Serialize};

use carto_graph::{Primitive, PrimitiveData};
use carto_types::{Coordinate, PrimitiveId, VersionStamp};

use crate::error::{DiffError, DiffResult};
use crate::member_diff::{diff_members, MemberDiff};
use crate::tag_diff::{diff_tags, TagDiff};

/// Differences between an old and a new version of a primitive.
///
/// Each optional field is `Some((old, new))` only when that aspect differs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveDiff {
    /// Identity of the old version.
    pub id: PrimitiveId,
    /// Tag changes.
    pub tags: TagDiff,
    /// Point coordinate change.
    pub coordinate: Option<(Option<Coordinate>, Option<Coordinate>)>,
    /// Chain endpoint change.
    pub ends: Option<(Option<[PrimitiveId; 2]>, Option<[PrimitiveId; 2]>)>,
    /// Composite member changes (empty for points and chains).
    pub members: MemberDiff,
    /// Deletion state change.
    pub deleted: Option<(bool, bool)>,
    /// Version stamp change.
    pub version: Option<(Option<VersionStamp>, Option<VersionStamp>)>,
}

impl PrimitiveDiff {
    /// Returns `true` if the content (everything but the version) is equal.
    pub fn is_content_empty(&self) -> bool {
        self.tags.is_empty()
            && self.coordinate.is_none()
            && self.ends.is_none()
            && self.members.is_empty()
            && self.deleted.is_none()
    }

    /// Short human-readable description, e.g. `"c5: tags(2) members(+1/-0)"`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.coordinate.is_some() {
            parts.push("coordinate".to_string());
        }
        if self.ends.is_some() {
            parts.push("endpoints".to_string());
        }
        if !self.members.is_empty() {
            parts.push(format!(
                "members(+{}/-{})",
                self.members.additions(),
                self.members.removals()
            ));
        }
        if !self.tags.is_empty() {
            parts.push(format!("tags({})", self.tags.len()));
        }
        if let Some((_, deleted)) = self.deleted {
            parts.push(if deleted { "deleted" } else { "undeleted" }.to_string());
        }
        if parts.is_empty() {
            parts.push("no content change".to_string());
        }
        format!("{}: {}", self.id, parts.join(" "))
    }
}

fn changed<T: PartialEq + Copy>(old: T, new: T) -> Option<(T, T)> {
    (old != new).then_some((old, new))
}

/// Compute the diff between two versions of a primitive.
///
/// Fails if the two primitives are of different kinds.
pub fn diff_primitives(old: &Primitive, new: &Primitive) -> DiffResult<PrimitiveDiff> {
    if old.kind() != new.kind() {
        return Err(DiffError::KindMismatch {
            old: old.id,
            new: new.id,
        });
    }

    let mut diff = PrimitiveDiff {
        id: old.id,
        tags: diff_tags(&old.tags, &new.tags),
        coordinate: None,
        ends: None,
        members: MemberDiff::default(),
        deleted: changed(old.deleted, new.deleted),
        version: changed(old.version, new.version),
    };

    match (&old.data, &new.data) {
        (PrimitiveData::Point { coord: a }, PrimitiveData::Point { coord: b }) => {
            diff.coordinate = changed(*a, *b);
        }
        (PrimitiveData::Chain { ends: a }, PrimitiveData::Chain { ends: b }) => {
            diff.ends = changed(*a, *b);
        }
        (PrimitiveData::Composite { members: a }, PrimitiveData::Composite { members: b }) => {
            diff.members = diff_members(a, b);
        }
        _ => {
            return Err(DiffError::KindMismatch {
                old: old.id,
                new: new.id,
            })
        }
    }

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_graph::Member;

    #[test]
    fn identical_points() {
        let p = Primitive::point(1, Coordinate::from_e7(5, 5));
        let diff = diff_primitives(&p, &p).unwrap();
        assert!(diff.is_content_empty());
        assert!(diff.version.is_none());
        assert_eq!(diff.summary(), "p1: no content change");
    }

    #[test]
    fn moved_point() {
        let old = Primitive::point(1, Coordinate::from_e7(5, 5));
        let new = Primitive::point(1, Coordinate::from_e7(9, 9)).with_version(VersionStamp::new(2, 0));
        let diff = diff_primitives(&old, &new).unwrap();
        assert_eq!(
            diff.coordinate,
            Some((Some(Coordinate::from_e7(5, 5)), Some(Coordinate::from_e7(9, 9))))
        );
        assert_eq!(diff.version, Some((None, Some(VersionStamp::new(2, 0)))));
        assert!(!diff.is_content_empty());
    }

    #[test]
    fn deleted_and_retagged_chain() {
        let old = Primitive::chain(5, 1, 2).with_tag("highway", "service");
        let new = Primitive::chain(5, 1, 2).deleted();
        let diff = diff_primitives(&old, &new).unwrap();
        assert_eq!(diff.deleted, Some((false, true)));
        assert_eq!(diff.tags.removals(), 1);
        assert_eq!(diff.summary(), "c5: tags(1) deleted");
    }

    #[test]
    fn composite_members() {
        let old = Primitive::composite(7, vec![Member::new(PrimitiveId::chain(1))]);
        let new = Primitive::composite(
            7,
            vec![
                Member::new(PrimitiveId::chain(1)),
                Member::new(PrimitiveId::chain(2)),
            ],
        );
        let diff = diff_primitives(&old, &new).unwrap();
        assert_eq!(diff.members.additions(), 1);
        assert_eq!(diff.summary(), "r7: members(+1/-0)");
    }

    #[test]
    fn kind_mismatch_is_an_error() {
        let a = Primitive::incomplete(PrimitiveId::point(1));
        let b = Primitive::incomplete(PrimitiveId::chain(1));
        assert!(matches!(
            diff_primitives(&a, &b),
            Err(DiffError::KindMismatch { .. })
        ));
    }
}
