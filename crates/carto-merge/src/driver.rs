use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use carto_graph::{Graph, GraphError, Primitive};
use carto_types::PrimitiveId;

use crate::apply;
use crate::config::MergeConfig;
use crate::conflict::{Conflict, ConflictRegistry};
use crate::decision::{decide, Outcome};
use crate::error::{MergeError, MergeResult};
use crate::identity_map::{IdentityMap, Resolution};

// ---------------------------------------------------------------------------
// MergeReport
// ---------------------------------------------------------------------------

/// What one merge pass did, by canonical identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Primitives inserted into the target.
    pub inserted: Vec<PrimitiveId>,
    /// Local primitives overwritten with incoming content.
    pub adopted: Vec<PrimitiveId>,
    /// Incomplete local placeholders filled from incoming content.
    pub completed: Vec<PrimitiveId>,
    /// Local primitives left as they were.
    pub kept: Vec<PrimitiveId>,
    /// `(incoming, canonical)` pairs of unassigned primitives folded into an
    /// equal one inserted earlier in the pass.
    pub deduplicated: Vec<(PrimitiveId, PrimitiveId)>,
    /// Identities that raised a conflict.
    pub conflicts: Vec<PrimitiveId>,
    /// Every `(incoming, canonical)` binding made during the pass.
    pub bindings: Vec<(PrimitiveId, PrimitiveId)>,
}

impl MergeReport {
    /// The canonical identity an incoming identity was bound to.
    pub fn canonical(&self, incoming: &PrimitiveId) -> Option<PrimitiveId> {
        self.bindings
            .iter()
            .find(|(from, _)| from == incoming)
            .map(|(_, to)| *to)
    }

    /// Returns `true` if the pass raised no conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MergeDriver
// ---------------------------------------------------------------------------

/// Runs merge passes of incoming primitives into a target graph.
///
/// A pass visits incoming primitives children-first so that every child
/// reference is already canonical when its parent is decided. Conflicts are
/// recorded in the supplied registry and never abort the pass. Errors do:
/// mutations made before the error are kept, so callers that need
/// all-or-nothing behaviour merge into a clone.
#[derive(Clone, Debug, Default)]
pub struct MergeDriver {
    config: MergeConfig,
}

impl MergeDriver {
    /// Create a driver with the given configuration.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// The current configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge every primitive of `incoming` into `target`.
    pub fn merge_graph(
        &self,
        target: &mut Graph,
        conflicts: &mut ConflictRegistry,
        incoming: &Graph,
    ) -> MergeResult<MergeReport> {
        let order = incoming.dependency_order()?;
        let mut map = IdentityMap::new();
        let mut report = MergeReport::default();

        for id in &order {
            let Some(primitive) = incoming.get(id) else {
                continue;
            };
            self.merge_one(target, conflicts, &mut map, &mut report, primitive)?;
        }

        let dropped = conflicts.retain_live(target);
        report.bindings = map.bindings().collect();

        info!(
            incoming = order.len(),
            inserted = report.inserted.len(),
            adopted = report.adopted.len(),
            completed = report.completed.len(),
            kept = report.kept.len(),
            deduplicated = report.deduplicated.len(),
            conflicts = report.conflicts.len(),
            dropped_conflicts = dropped,
            "merge pass complete"
        );
        Ok(report)
    }

    /// Merge a single primitive. Its children must already be in `target`.
    pub fn merge_primitive(
        &self,
        target: &mut Graph,
        conflicts: &mut ConflictRegistry,
        primitive: Primitive,
    ) -> MergeResult<MergeReport> {
        self.merge_primitives(target, conflicts, [primitive])
    }

    /// Merge a loose collection of primitives as one pass.
    ///
    /// Two primitives claiming the same assigned identity are a
    /// [`MergeError::DuplicateIdentity`]. Zero identities are treated as
    /// distinct unassigned primitives.
    pub fn merge_primitives(
        &self,
        target: &mut Graph,
        conflicts: &mut ConflictRegistry,
        primitives: impl IntoIterator<Item = Primitive>,
    ) -> MergeResult<MergeReport> {
        let incoming = Graph::from_primitives(primitives).map_err(|e| match e {
            GraphError::DuplicateIdentity(id) => MergeError::DuplicateIdentity { id, bound_to: id },
            other => MergeError::Graph(other),
        })?;
        self.merge_graph(target, conflicts, &incoming)
    }

    fn merge_one(
        &self,
        target: &mut Graph,
        conflicts: &mut ConflictRegistry,
        map: &mut IdentityMap,
        report: &mut MergeReport,
        incoming: &Primitive,
    ) -> MergeResult<()> {
        let mut theirs = incoming.clone();
        let rewrite = map.rewrite_children(target, &mut theirs)?;
        if rewrite.completed {
            debug!(primitive = %incoming.id, "children complete; cleared incomplete flag");
        }

        let canonical = match map.resolve(target, &theirs, self.config.deduplicate_unassigned) {
            Resolution::Duplicate(canonical) => {
                map.register(incoming.id, canonical)?;
                debug!(primitive = %incoming.id, canonical = %canonical, "deduplicated unassigned primitive");
                report.deduplicated.push((incoming.id, canonical));
                return Ok(());
            }
            Resolution::Existing(canonical) => Some(canonical),
            Resolution::New => None,
        };

        let mine = canonical.and_then(|id| target.get(&id)).cloned();
        let decision = decide(mine.as_ref(), &theirs, self.config.point_equality);
        debug!(
            primitive = %incoming.id,
            rule = ?decision.rule,
            outcome = ?decision.outcome,
            "merge decision"
        );

        if decision.outcome == Outcome::InsertAsNew {
            let id = self.insert_new(target, map, theirs)?;
            report.inserted.push(id);
            return Ok(());
        }
        let (Some(canonical), Some(mine)) = (canonical, mine) else {
            return Err(GraphError::NotFound(incoming.id).into());
        };

        map.register(incoming.id, canonical)?;
        theirs.id = canonical;

        match decision.outcome {
            Outcome::InsertAsNew => {}
            Outcome::AdoptTheirs { clear_modified } => {
                apply::adopt(target, &canonical, &theirs, clear_modified)?;
                conflicts.remove(&canonical);
                report.adopted.push(canonical);
            }
            Outcome::CompleteFromTheirs => {
                apply::adopt(target, &canonical, &theirs, false)?;
                conflicts.remove(&canonical);
                report.completed.push(canonical);
            }
            Outcome::KeepMine => report.kept.push(canonical),
            Outcome::Conflict(reason) => {
                let conflict = Conflict {
                    canonical,
                    mine,
                    incoming: theirs,
                    reason,
                };
                warn!(primitive = %canonical, reason = ?reason, "{}", conflict.summary());
                conflicts.insert(conflict);
                report.conflicts.push(canonical);
            }
        }
        Ok(())
    }

    /// Insert an incoming primitive that has no local counterpart. Unassigned
    /// primitives get a placeholder local to `target`.
    fn insert_new(
        &self,
        target: &mut Graph,
        map: &mut IdentityMap,
        mut theirs: Primitive,
    ) -> MergeResult<PrimitiveId> {
        let incoming_id = theirs.id;
        if incoming_id.is_unassigned() {
            theirs.id = target.allocate_placeholder(incoming_id.kind);
            let id = target.insert(theirs)?;
            map.register_fresh(incoming_id, id)?;
            Ok(id)
        } else {
            map.register(incoming_id, incoming_id)?;
            Ok(target.insert(theirs)?)
        }
    }
}
