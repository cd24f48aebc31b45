//! Per-pass identity canonicalization.
//!
//! An [`IdentityMap`] lives for one merge pass. It binds every incoming
//! identity to the canonical identity that represents it in the target graph
//! and rewrites child references through those bindings. Children are always
//! bound before their parents because the driver walks in dependency order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use carto_diff::{content_equal, Equivalence};
use carto_graph::{Graph, Primitive, PrimitiveData};
use carto_types::PrimitiveId;

use crate::error::{MergeError, MergeResult};

/// How an incoming primitive maps onto the target graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The target already holds the canonical primitive.
    Existing(PrimitiveId),
    /// An unassigned primitive value-equal to one inserted earlier in this
    /// pass; the incoming primitive is discarded in its favour.
    Duplicate(PrimitiveId),
    /// Nothing matches; the incoming primitive becomes canonical.
    New,
}

/// Outcome of canonicalizing one primitive's child references.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Number of references that now point at a different identity.
    pub rewritten: usize,
    /// The primitive's `incomplete` flag was cleared because every child
    /// resolved to a complete canonical primitive.
    pub completed: bool,
}

/// Incoming → canonical identity bindings for one merge pass.
#[derive(Clone, Debug, Default)]
pub struct IdentityMap {
    bindings: BTreeMap<PrimitiveId, PrimitiveId>,
    /// Canonical identities of unassigned primitives inserted this pass, in
    /// insertion order. Only these are deduplication candidates.
    fresh: Vec<PrimitiveId>,
}

impl IdentityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The canonical identity bound to `incoming`, if any.
    pub fn canonical(&self, incoming: &PrimitiveId) -> Option<PrimitiveId> {
        self.bindings.get(incoming).copied()
    }

    /// All `(incoming, canonical)` bindings in incoming-identity order.
    pub fn bindings(&self) -> impl Iterator<Item = (PrimitiveId, PrimitiveId)> + '_ {
        self.bindings.iter().map(|(k, v)| (*k, *v))
    }

    /// Find the canonical target primitive for `incoming`.
    ///
    /// Assigned identities match by identity only. Unassigned identities
    /// never match by identity across graphs; when `deduplicate` is set they
    /// match a primitive inserted earlier in this pass that is
    /// [`structurally_equal`]. `incoming` must already have its children
    /// rewritten.
    pub fn resolve(&self, target: &Graph, incoming: &Primitive, deduplicate: bool) -> Resolution {
        if let Some(bound) = self.canonical(&incoming.id) {
            return Resolution::Existing(bound);
        }
        if !incoming.id.is_unassigned() {
            return if target.contains(&incoming.id) {
                Resolution::Existing(incoming.id)
            } else {
                Resolution::New
            };
        }
        if deduplicate {
            let duplicate = self.fresh.iter().find(|candidate| {
                target
                    .get(candidate)
                    .is_some_and(|existing| structurally_equal(existing, incoming))
            });
            if let Some(id) = duplicate {
                return Resolution::Duplicate(*id);
            }
        }
        Resolution::New
    }

    /// Bind `incoming` to `canonical`.
    ///
    /// Rebinding to the same identity is a no-op. Fails if the incoming
    /// identity is already bound elsewhere, or if an assigned identity is
    /// bound to anything but itself.
    pub fn register(&mut self, incoming: PrimitiveId, canonical: PrimitiveId) -> MergeResult<()> {
        if !incoming.is_unassigned() && incoming != canonical {
            return Err(MergeError::DuplicateIdentity {
                id: incoming,
                bound_to: canonical,
            });
        }
        match self.bindings.get(&incoming) {
            Some(bound) if *bound != canonical => Err(MergeError::DuplicateIdentity {
                id: incoming,
                bound_to: *bound,
            }),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(incoming, canonical);
                Ok(())
            }
        }
    }

    /// Bind an unassigned incoming primitive to the placeholder it was
    /// inserted under, and make it a deduplication candidate.
    pub fn register_fresh(&mut self, incoming: PrimitiveId, canonical: PrimitiveId) -> MergeResult<()> {
        self.register(incoming, canonical)?;
        self.fresh.push(canonical);
        Ok(())
    }

    /// Replace every child reference of `primitive` with its canonical
    /// identity.
    ///
    /// A child resolves through this pass's bindings, or else to the same
    /// identity if the target holds it. A child found in neither place is an
    /// [`MergeError::UnresolvedReference`]. If `primitive` is flagged
    /// incomplete but carries child references that all resolve to complete
    /// canonical primitives, the flag is cleared.
    pub fn rewrite_children(&self, target: &Graph, primitive: &mut Primitive) -> MergeResult<RewriteReport> {
        let referrer = primitive.id;
        let mut report = RewriteReport::default();

        primitive.map_children(|child| {
            let canonical = match self.canonical(&child) {
                Some(bound) => bound,
                None if target.contains(&child) => child,
                None => {
                    return Err(MergeError::UnresolvedReference {
                        referrer,
                        target: child,
                    })
                }
            };
            if canonical != child {
                report.rewritten += 1;
            }
            Ok(canonical)
        })?;

        if primitive.incomplete
            && primitive.data.has_children()
            && primitive
                .children()
                .iter()
                .all(|c| target.get(c).is_some_and(|p| !p.incomplete))
        {
            primitive.incomplete = false;
            report.completed = true;
        }

        Ok(report)
    }
}

/// Equality used to fold unassigned primitives within one pass.
///
/// Chains are equal when their canonical endpoints and deletion state match;
/// their tags are ignored. Points and composites use full content equality,
/// so composites must also agree on tags.
pub fn structurally_equal(a: &Primitive, b: &Primitive) -> bool {
    match (&a.data, &b.data) {
        (PrimitiveData::Chain { ends: x }, PrimitiveData::Chain { ends: y }) => {
            x == y && a.deleted == b.deleted
        }
        _ => content_equal(a, b, Equivalence::Full),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_graph::Member;
    use carto_types::Coordinate;

    fn pt(id: i64) -> Primitive {
        Primitive::point(id, Coordinate::from_e7(id as i32, 0))
    }

    fn target_with_points() -> Graph {
        Graph::from_primitives(vec![pt(1), pt(2), pt(3)]).unwrap()
    }

    #[test]
    fn assigned_identity_resolves_to_target() {
        let map = IdentityMap::new();
        let target = target_with_points();
        assert_eq!(
            map.resolve(&target, &pt(1), true),
            Resolution::Existing(PrimitiveId::point(1))
        );
        assert_eq!(map.resolve(&target, &pt(9), true), Resolution::New);
    }

    #[test]
    fn placeholder_never_matches_target_by_identity() {
        let mut target = target_with_points();
        target.insert(pt(-1)).unwrap();
        let map = IdentityMap::new();
        assert_eq!(map.resolve(&target, &pt(-1), true), Resolution::New);
    }

    #[test]
    fn unassigned_duplicate_of_fresh_insert() {
        let mut target = target_with_points();
        let first = Primitive::chain(-1, 1, 2);
        let stored = target.insert(Primitive::chain(-7, 1, 2)).unwrap();
        let mut map = IdentityMap::new();
        map.register_fresh(first.id, stored).unwrap();

        let second = Primitive::chain(-2, 1, 2);
        assert_eq!(
            map.resolve(&target, &second, true),
            Resolution::Duplicate(stored)
        );
        assert_eq!(map.resolve(&target, &second, false), Resolution::New);
    }

    #[test]
    fn chains_with_equal_endpoints_are_duplicates_regardless_of_tags() {
        let mut target = target_with_points();
        let stored = target
            .insert(Primitive::chain(-7, 1, 2).with_tag("highway", "residential"))
            .unwrap();
        let mut map = IdentityMap::new();
        map.register_fresh(PrimitiveId::chain(-1), stored).unwrap();

        assert_eq!(
            map.resolve(&target, &Primitive::chain(-2, 1, 2), true),
            Resolution::Duplicate(stored)
        );
        assert_eq!(
            map.resolve(&target, &Primitive::chain(-3, 1, 2).deleted(), true),
            Resolution::New
        );
    }

    #[test]
    fn composites_with_different_tags_are_not_duplicates() {
        let mut target = target_with_points();
        let members = vec![Member::new(PrimitiveId::point(1))];
        let stored = target
            .insert(Primitive::composite(-7, members.clone()).with_tag("type", "route"))
            .unwrap();
        let mut map = IdentityMap::new();
        map.register_fresh(PrimitiveId::composite(-1), stored).unwrap();

        assert_eq!(
            map.resolve(&target, &Primitive::composite(-2, members.clone()), true),
            Resolution::New
        );
        assert_eq!(
            map.resolve(
                &target,
                &Primitive::composite(-3, members).with_tag("type", "route"),
                true
            ),
            Resolution::Duplicate(stored)
        );
    }

    #[test]
    fn structurally_different_unassigned_are_not_duplicates() {
        let mut target = target_with_points();
        let stored = target.insert(Primitive::chain(-7, 1, 2)).unwrap();
        let mut map = IdentityMap::new();
        map.register_fresh(PrimitiveId::chain(-1), stored).unwrap();

        assert_eq!(
            map.resolve(&target, &Primitive::chain(-2, 1, 3), true),
            Resolution::New
        );
        assert_eq!(
            map.resolve(&target, &Primitive::chain(-3, 2, 1), true),
            Resolution::New
        );
    }

    #[test]
    fn preexisting_unassigned_target_primitives_are_not_candidates() {
        let mut target = target_with_points();
        target.insert(Primitive::chain(-7, 1, 2)).unwrap();
        let map = IdentityMap::new();
        assert_eq!(
            map.resolve(&target, &Primitive::chain(-1, 1, 2), true),
            Resolution::New
        );
    }

    #[test]
    fn register_rejects_rebinding() {
        let mut map = IdentityMap::new();
        map.register(PrimitiveId::point(-1), PrimitiveId::point(-5))
            .unwrap();
        map.register(PrimitiveId::point(-1), PrimitiveId::point(-5))
            .unwrap();
        let result = map.register(PrimitiveId::point(-1), PrimitiveId::point(-6));
        assert!(matches!(
            result,
            Err(MergeError::DuplicateIdentity { bound_to, .. }) if bound_to == PrimitiveId::point(-5)
        ));
    }

    #[test]
    fn register_rejects_assigned_identity_bound_elsewhere() {
        let mut map = IdentityMap::new();
        let result = map.register(PrimitiveId::point(4), PrimitiveId::point(5));
        assert!(matches!(result, Err(MergeError::DuplicateIdentity { .. })));
    }

    #[test]
    fn rewrite_follows_bindings_then_target() {
        let target = target_with_points();
        let mut map = IdentityMap::new();
        map.register(PrimitiveId::point(-1), PrimitiveId::point(3))
            .unwrap();

        let mut chain = Primitive::chain(-4, -1, 2);
        let report = map.rewrite_children(&target, &mut chain).unwrap();
        assert_eq!(report.rewritten, 1);
        assert_eq!(
            chain.children(),
            vec![PrimitiveId::point(3), PrimitiveId::point(2)]
        );
    }

    #[test]
    fn rewrite_unresolvable_child_fails() {
        let target = target_with_points();
        let map = IdentityMap::new();
        let mut chain = Primitive::chain(5, 1, 42);
        let result = map.rewrite_children(&target, &mut chain);
        assert!(matches!(
            result,
            Err(MergeError::UnresolvedReference { referrer, target })
                if referrer == PrimitiveId::chain(5) && target == PrimitiveId::point(42)
        ));
    }

    #[test]
    fn rewrite_clears_incomplete_when_children_complete() {
        let mut target = target_with_points();
        target.insert(Primitive::chain(3, 1, 2)).unwrap();
        let map = IdentityMap::new();

        let mut composite =
            Primitive::composite(9, vec![Member::new(PrimitiveId::chain(3))]).marked_incomplete();
        let report = map.rewrite_children(&target, &mut composite).unwrap();
        assert!(report.completed);
        assert!(!composite.incomplete);
    }

    #[test]
    fn rewrite_keeps_incomplete_when_a_child_is_incomplete() {
        let mut target = target_with_points();
        target
            .insert(Primitive::incomplete(PrimitiveId::chain(3)))
            .unwrap();
        let map = IdentityMap::new();

        let mut composite =
            Primitive::composite(9, vec![Member::new(PrimitiveId::chain(3))]).marked_incomplete();
        let report = map.rewrite_children(&target, &mut composite).unwrap();
        assert!(!report.completed);
        assert!(composite.incomplete);
    }

    #[test]
    fn rewrite_leaves_bare_placeholder_incomplete() {
        let target = target_with_points();
        let map = IdentityMap::new();
        let mut placeholder = Primitive::incomplete(PrimitiveId::composite(9));
        let report = map.rewrite_children(&target, &mut placeholder).unwrap();
        assert!(!report.completed);
        assert!(placeholder.incomplete);
    }
}
