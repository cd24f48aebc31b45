//! Conflict records and the registry that holds them between passes.
//!
//! A [`Conflict`] snapshots both sides of an irreconcilable pair. The local
//! primitive stays in the target graph untouched until the conflict is
//! settled through [`ConflictRegistry::resolve`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use carto_diff::{diff_primitives, DiffResult, PrimitiveDiff};
use carto_graph::Graph;
use carto_graph::Primitive;
use carto_types::{PrimitiveId, VersionStamp};

use crate::apply;
use crate::decision::ConflictReason;
use crate::error::{MergeError, MergeResult};

/// An unresolved disagreement between the local and incoming versions of one
/// canonical identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The canonical identity in the target graph.
    pub canonical: PrimitiveId,
    /// The local version when the conflict was raised.
    pub mine: Primitive,
    /// The incoming version, child references already canonicalized.
    pub incoming: Primitive,
    /// Which decision rule raised it.
    pub reason: ConflictReason,
}

impl Conflict {
    /// What the incoming version would change relative to the local one.
    pub fn diff(&self) -> DiffResult<PrimitiveDiff> {
        diff_primitives(&self.mine, &self.incoming)
    }

    /// One-line description for logs and reports.
    pub fn summary(&self) -> String {
        let detail = self
            .diff()
            .map(|d| d.summary())
            .unwrap_or_else(|e| e.to_string());
        format!("{:?} on {}", self.reason, detail)
    }
}

/// Conflicts in the order they were raised, at most one per canonical
/// identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRegistry {
    entries: Vec<Conflict>,
}

impl ConflictRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in raise order.
    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.entries.iter()
    }

    pub fn get(&self, canonical: &PrimitiveId) -> Option<&Conflict> {
        self.entries.iter().find(|c| c.canonical == *canonical)
    }

    pub fn contains(&self, canonical: &PrimitiveId) -> bool {
        self.get(canonical).is_some()
    }

    /// Canonical identities in raise order.
    pub fn ids(&self) -> Vec<PrimitiveId> {
        self.entries.iter().map(|c| c.canonical).collect()
    }

    /// Record a conflict. An existing entry for the same identity is removed
    /// and returned; the new entry goes to the end.
    pub fn insert(&mut self, conflict: Conflict) -> Option<Conflict> {
        let replaced = self.remove(&conflict.canonical);
        self.entries.push(conflict);
        replaced
    }

    pub fn remove(&mut self, canonical: &PrimitiveId) -> Option<Conflict> {
        let index = self.position(canonical)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries whose canonical primitive is no longer in `graph`.
    /// Returns the number dropped.
    pub fn retain_live(&mut self, graph: &Graph) -> usize {
        let before = self.entries.len();
        self.entries.retain(|c| graph.contains(&c.canonical));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(dropped, "dropped conflicts for primitives no longer held");
        }
        dropped
    }

    /// Settle the conflict on `canonical` and return it.
    ///
    /// With `keep_canonical` the local primitive wins: it stays modified and
    /// takes the incoming version stamp when that is newer, so the same
    /// incoming data does not raise the conflict again. Otherwise the
    /// incoming snapshot is written over the local primitive; every child it
    /// references must still be held by `graph`.
    ///
    /// The entry is only removed once the graph mutation succeeded.
    pub fn resolve(
        &mut self,
        graph: &mut Graph,
        canonical: &PrimitiveId,
        keep_canonical: bool,
    ) -> MergeResult<Conflict> {
        let index = self
            .position(canonical)
            .ok_or(MergeError::ConflictNotFound(*canonical))?;
        let incoming = &self.entries[index].incoming;

        if keep_canonical {
            let version = incoming.version;
            graph.modify(canonical, |mine| {
                if VersionStamp::is_newer(version.as_ref(), mine.version.as_ref()) {
                    mine.version = version;
                }
                mine.modified = true;
            })?;
        } else {
            if let Some(missing) = incoming.children().into_iter().find(|c| !graph.contains(c)) {
                return Err(MergeError::UnresolvedReference {
                    referrer: *canonical,
                    target: missing,
                });
            }
            apply::adopt(graph, canonical, incoming, false)?;
        }

        let conflict = self.entries.remove(index);
        info!(
            primitive = %canonical,
            kept = keep_canonical,
            reason = ?conflict.reason,
            "resolved conflict"
        );
        Ok(conflict)
    }

    fn position(&self, canonical: &PrimitiveId) -> Option<usize> {
        self.entries.iter().position(|c| c.canonical == *canonical)
    }
}

impl<'a> IntoIterator for &'a ConflictRegistry {
    type Item = &'a Conflict;
    type IntoIter = std::slice::Iter<'a, Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_types::Coordinate;

    fn pt(id: i64, lat: i32, version: u64) -> Primitive {
        Primitive::point(id, Coordinate::from_e7(lat, 0)).with_version(VersionStamp::new(version, 0))
    }

    fn conflict(id: i64, reason: ConflictReason) -> Conflict {
        Conflict {
            canonical: PrimitiveId::point(id),
            mine: pt(id, 1, 1).modified(),
            incoming: pt(id, 2, 2),
            reason,
        }
    }

    #[test]
    fn insert_keeps_raise_order() {
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(3, ConflictReason::ChangedRemotely));
        reg.insert(conflict(1, ConflictReason::BothModified));
        assert_eq!(reg.ids(), vec![PrimitiveId::point(3), PrimitiveId::point(1)]);
    }

    #[test]
    fn insert_replaces_and_moves_to_end() {
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::ChangedRemotely));
        reg.insert(conflict(2, ConflictReason::ChangedRemotely));
        let replaced = reg.insert(conflict(1, ConflictReason::BothModified));

        assert_eq!(replaced.map(|c| c.reason), Some(ConflictReason::ChangedRemotely));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.ids(), vec![PrimitiveId::point(2), PrimitiveId::point(1)]);
        assert_eq!(
            reg.get(&PrimitiveId::point(1)).map(|c| c.reason),
            Some(ConflictReason::BothModified)
        );
    }

    #[test]
    fn remove_and_clear() {
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::ChangedRemotely));
        reg.insert(conflict(2, ConflictReason::ChangedRemotely));
        assert!(reg.remove(&PrimitiveId::point(1)).is_some());
        assert!(reg.remove(&PrimitiveId::point(1)).is_none());
        assert!(!reg.contains(&PrimitiveId::point(1)));
        reg.clear();
        assert!(reg.is_empty());
    }

    #[test]
    fn retain_live_drops_missing() {
        let graph = Graph::from_primitives(vec![pt(1, 1, 1)]).unwrap();
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::ChangedRemotely));
        reg.insert(conflict(2, ConflictReason::ChangedRemotely));
        assert_eq!(reg.retain_live(&graph), 1);
        assert_eq!(reg.ids(), vec![PrimitiveId::point(1)]);
    }

    #[test]
    fn resolve_keep_takes_newer_version_and_stays_modified() {
        let mut graph = Graph::from_primitives(vec![pt(1, 1, 1).modified()]).unwrap();
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::ChangedRemotely));

        let settled = reg.resolve(&mut graph, &PrimitiveId::point(1), true).unwrap();
        assert_eq!(settled.reason, ConflictReason::ChangedRemotely);
        assert!(reg.is_empty());

        let p = graph.get(&PrimitiveId::point(1)).unwrap();
        assert!(p.modified);
        assert_eq!(p.coord(), Some(Coordinate::from_e7(1, 0)));
        assert_eq!(p.version, Some(VersionStamp::new(2, 0)));
    }

    #[test]
    fn resolve_keep_does_not_downgrade_version() {
        let mut graph = Graph::from_primitives(vec![pt(1, 1, 9).modified()]).unwrap();
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::BothModified));
        reg.resolve(&mut graph, &PrimitiveId::point(1), true).unwrap();
        assert_eq!(
            graph.get(&PrimitiveId::point(1)).unwrap().version,
            Some(VersionStamp::new(9, 0))
        );
    }

    #[test]
    fn resolve_take_adopts_incoming() {
        let mut graph = Graph::from_primitives(vec![pt(1, 1, 1).modified()]).unwrap();
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::ChangedRemotely));

        reg.resolve(&mut graph, &PrimitiveId::point(1), false).unwrap();
        let p = graph.get(&PrimitiveId::point(1)).unwrap();
        assert!(!p.modified);
        assert_eq!(p.coord(), Some(Coordinate::from_e7(2, 0)));
    }

    #[test]
    fn resolve_take_requires_children() {
        let mut graph = Graph::from_primitives(vec![
            pt(1, 1, 1),
            pt(2, 2, 1),
            Primitive::chain(5, 1, 2).modified(),
        ])
        .unwrap();
        let mut reg = ConflictRegistry::new();
        reg.insert(Conflict {
            canonical: PrimitiveId::chain(5),
            mine: Primitive::chain(5, 1, 2).modified(),
            incoming: Primitive::chain(5, 1, 3).with_version(VersionStamp::new(2, 0)),
            reason: ConflictReason::ChangedRemotely,
        });

        let result = reg.resolve(&mut graph, &PrimitiveId::chain(5), false);
        assert!(matches!(
            result,
            Err(MergeError::UnresolvedReference { target, .. }) if target == PrimitiveId::point(3)
        ));
        assert!(reg.contains(&PrimitiveId::chain(5)));
    }

    #[test]
    fn resolve_unknown_identity() {
        let mut graph = Graph::new();
        let mut reg = ConflictRegistry::new();
        assert!(matches!(
            reg.resolve(&mut graph, &PrimitiveId::point(4), true),
            Err(MergeError::ConflictNotFound(id)) if id == PrimitiveId::point(4)
        ));
    }

    #[test]
    fn conflict_diff_and_summary() {
        let c = conflict(1, ConflictReason::ChangedRemotely);
        let diff = c.diff().unwrap();
        assert!(diff.coordinate.is_some());
        assert_eq!(c.summary(), "ChangedRemotely on p1: coordinate");
    }

    #[test]
    fn registry_serializes() {
        let mut reg = ConflictRegistry::new();
        reg.insert(conflict(1, ConflictReason::DeletedRemotely));
        let json = serde_json::to_string(&reg).unwrap();
        let back: ConflictRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reg);
    }
}
