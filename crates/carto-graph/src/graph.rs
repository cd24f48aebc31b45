//! The identity-indexed primitive arena.
//!
//! [`Graph`] stores primitives in a [`BTreeMap`] keyed by identity and keeps
//! a reverse-edge index (`referrers`) so "who references this primitive"
//! queries do not scan the arena.
//!
//! # Invariants
//!
//! - Primitive identities are unique within the graph.
//! - Every stored primitive's data shape matches its identity's kind.
//! - The referrer index mirrors the child references of stored primitives.
//!
//! References to identities the graph does not hold are allowed (an incoming
//! graph may point at primitives only the merge target knows); see
//! [`Graph::dangling_references`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use carto_types::{PrimitiveId, PrimitiveKind};

use crate::error::{GraphError, GraphResult};
use crate::primitive::Primitive;

/// An owning container of primitives indexed by identity.
///
/// Serializes as a flat primitive list; the referrer index is rebuilt (and
/// every primitive re-validated) on deserialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "GraphRepr", try_from = "GraphRepr")]
pub struct Graph {
    /// All primitives, keyed by identity.
    primitives: BTreeMap<PrimitiveId, Primitive>,
    /// Reverse-edge index: child -> primitives referencing it.
    referrers: BTreeMap<PrimitiveId, BTreeSet<PrimitiveId>>,
    /// Next candidate for placeholder allocation (always negative).
    next_placeholder: i64,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            primitives: BTreeMap::new(),
            referrers: BTreeMap::new(),
            next_placeholder: -1,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct GraphRepr {
    primitives: Vec<Primitive>,
    next_placeholder: i64,
}

impl From<Graph> for GraphRepr {
    fn from(graph: Graph) -> Self {
        Self {
            primitives: graph.primitives.into_values().collect(),
            next_placeholder: graph.next_placeholder,
        }
    }
}

impl TryFrom<GraphRepr> for Graph {
    type Error = GraphError;

    fn try_from(repr: GraphRepr) -> Result<Self, Self::Error> {
        let mut graph = Graph::from_primitives(repr.primitives)?;
        graph.next_placeholder = graph.next_placeholder.min(repr.next_placeholder);
        Ok(graph)
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.primitives == other.primitives
    }
}

impl Eq for Graph {}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from primitives, failing on the first duplicate identity.
    pub fn from_primitives(primitives: impl IntoIterator<Item = Primitive>) -> GraphResult<Self> {
        let mut graph = Self::new();
        for primitive in primitives {
            graph.insert(primitive)?;
        }
        Ok(graph)
    }

    /// Total number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns `true` if the graph holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Returns `true` if a primitive with this identity is present.
    pub fn contains(&self, id: &PrimitiveId) -> bool {
        self.primitives.contains_key(id)
    }

    /// Retrieve a primitive by identity.
    pub fn get(&self, id: &PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    /// Iterate over all primitives in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    /// All identities in order.
    pub fn ids(&self) -> Vec<PrimitiveId> {
        self.primitives.keys().copied().collect()
    }

    /// Number of primitives of the given kind.
    pub fn count_kind(&self, kind: PrimitiveKind) -> usize {
        self.primitives.keys().filter(|id| id.kind == kind).count()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Insert a primitive and return the identity it is stored under.
    ///
    /// A zero identity is replaced by a freshly allocated placeholder.
    /// Fails if the identity is already present or the primitive is
    /// malformed (kind mismatch, invalid chain endpoints, self reference).
    pub fn insert(&mut self, mut primitive: Primitive) -> GraphResult<PrimitiveId> {
        if primitive.id.is_zero() {
            primitive.id = self.allocate_placeholder(primitive.id.kind);
        }
        if self.primitives.contains_key(&primitive.id) {
            return Err(GraphError::DuplicateIdentity(primitive.id));
        }
        primitive.validate()?;

        let id = primitive.id;
        self.index_children(&primitive);
        debug!(primitive = %id, children = primitive.children().len(), "inserted primitive");
        self.primitives.insert(id, primitive);
        Ok(id)
    }

    /// Mutate a primitive in place, keeping the referrer index consistent.
    ///
    /// The closure must not change the identity. On validation failure the
    /// primitive is restored to its previous state.
    pub fn modify<R>(
        &mut self,
        id: &PrimitiveId,
        f: impl FnOnce(&mut Primitive) -> R,
    ) -> GraphResult<R> {
        let Some(mut primitive) = self.primitives.remove(id) else {
            return Err(GraphError::NotFound(*id));
        };
        let before = primitive.clone();
        self.unindex_children(&before);

        let out = f(&mut primitive);

        let check = if primitive.id != *id {
            Err(GraphError::IdentityChanged {
                from: *id,
                to: primitive.id,
            })
        } else {
            primitive.validate()
        };
        match check {
            Ok(()) => {
                self.index_children(&primitive);
                self.primitives.insert(*id, primitive);
                Ok(out)
            }
            Err(e) => {
                self.index_children(&before);
                self.primitives.insert(*id, before);
                Err(e)
            }
        }
    }

    /// Remove a primitive that no other primitive references.
    pub fn remove(&mut self, id: &PrimitiveId) -> GraphResult<Primitive> {
        if !self.primitives.contains_key(id) {
            return Err(GraphError::NotFound(*id));
        }
        let referrers = self.referrers(id);
        if !referrers.is_empty() {
            return Err(GraphError::StillReferenced {
                id: *id,
                referrers,
            });
        }
        let primitive = self
            .primitives
            .remove(id)
            .ok_or(GraphError::NotFound(*id))?;
        self.unindex_children(&primitive);
        debug!(primitive = %id, "removed primitive");
        Ok(primitive)
    }

    /// Allocate the next unused placeholder identity of the given kind.
    pub fn allocate_placeholder(&mut self, kind: PrimitiveKind) -> PrimitiveId {
        loop {
            let candidate = PrimitiveId::new(kind, self.next_placeholder);
            self.next_placeholder -= 1;
            if !self.primitives.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn index_children(&mut self, primitive: &Primitive) {
        for child in primitive.children() {
            self.referrers.entry(child).or_default().insert(primitive.id);
        }
    }

    fn unindex_children(&mut self, primitive: &Primitive) {
        for child in primitive.children() {
            if let Some(set) = self.referrers.get_mut(&child) {
                set.remove(&primitive.id);
                if set.is_empty() {
                    self.referrers.remove(&child);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Reference queries
    // ---------------------------------------------------------------

    /// Identities of all primitives that reference `id`, in order.
    pub fn referrers(&self, id: &PrimitiveId) -> Vec<PrimitiveId> {
        self.referrers
            .get(id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All `(referrer, missing child)` pairs where the child is not held.
    pub fn dangling_references(&self) -> Vec<(PrimitiveId, PrimitiveId)> {
        let mut dangling = Vec::new();
        for (child, referrers) in &self.referrers {
            if !self.primitives.contains_key(child) {
                for referrer in referrers {
                    dangling.push((*referrer, *child));
                }
            }
        }
        dangling.sort();
        dangling
    }

    // ---------------------------------------------------------------
    // Dependency order
    // ---------------------------------------------------------------

    /// All identities ordered so that every child precedes its parents.
    ///
    /// Post-order depth-first traversal from every primitive in identity
    /// order, memoized so shared children are emitted once. Children not
    /// held by the graph are skipped. A reference cycle is an error.
    pub fn dependency_order(&self) -> GraphResult<Vec<PrimitiveId>> {
        let mut order = Vec::with_capacity(self.primitives.len());
        let mut done: HashSet<PrimitiveId> = HashSet::new();
        let mut on_stack: HashSet<PrimitiveId> = HashSet::new();

        for root in self.primitives.keys() {
            if done.contains(root) {
                continue;
            }
            // Explicit stack of (node, children expanded?) to avoid recursion
            // depth limits on deeply nested composites.
            let mut stack: Vec<(PrimitiveId, bool)> = vec![(*root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    on_stack.remove(&id);
                    if done.insert(id) {
                        order.push(id);
                    }
                    continue;
                }
                if done.contains(&id) {
                    continue;
                }
                if !on_stack.insert(id) {
                    return Err(GraphError::CycleDetected(id));
                }
                stack.push((id, true));
                if let Some(primitive) = self.primitives.get(&id) {
                    for child in primitive.children().into_iter().rev() {
                        if !self.primitives.contains_key(&child) || done.contains(&child) {
                            continue;
                        }
                        if on_stack.contains(&child) {
                            return Err(GraphError::CycleDetected(child));
                        }
                        stack.push((child, false));
                    }
                }
            }
        }

        Ok(order)
    }

    // ---------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------

    /// Validate the whole graph: every primitive is well formed, every
    /// reference resolves, and there are no cycles.
    pub fn validate(&self) -> GraphResult<()> {
        for primitive in self.primitives.values() {
            primitive.validate()?;
        }
        if let Some((_, child)) = self.dangling_references().first() {
            return Err(GraphError::NotFound(*child));
        }
        self.dependency_order().map(|_| ())
    }
}
