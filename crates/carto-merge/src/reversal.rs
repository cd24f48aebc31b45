//! Post-merge reversal of a chain or composite.
//!
//! Reversing a directed primitive flips the meaning of `forward` and
//! `backward` member roles that point at it. Only composites the caller
//! names are rewritten; nothing else in the graph is consulted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use carto_graph::{Graph, GraphError, PrimitiveData};
use carto_types::PrimitiveId;

use crate::error::{MergeError, MergeResult};

const FORWARD: &str = "forward";
const BACKWARD: &str = "backward";

/// What a reversal touched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalReport {
    pub reversed: PrimitiveId,
    /// Composites whose member roles were swapped.
    pub retagged: Vec<PrimitiveId>,
}

/// Reverse `id` and swap direction roles in `composites`.
///
/// Chains swap their endpoints and composites reverse their member order;
/// points fail with [`MergeError::NotReversible`]. Every supplied composite
/// must exist in `graph`; this is checked before anything is mutated. All
/// touched primitives are marked modified.
pub fn reverse_primitive(
    graph: &mut Graph,
    id: &PrimitiveId,
    composites: &[PrimitiveId],
) -> MergeResult<ReversalReport> {
    match graph.get(id) {
        None => return Err(GraphError::NotFound(*id).into()),
        Some(p) if matches!(p.data, PrimitiveData::Point { .. }) => {
            return Err(MergeError::NotReversible(*id))
        }
        Some(_) => {}
    }
    if let Some(missing) = composites.iter().find(|c| !graph.contains(c)) {
        return Err(GraphError::NotFound(*missing).into());
    }

    graph.modify(id, |p| {
        match &mut p.data {
            PrimitiveData::Point { .. } => {}
            PrimitiveData::Chain { ends } => {
                if let Some(ends) = ends {
                    ends.swap(0, 1);
                }
            }
            PrimitiveData::Composite { members } => members.reverse(),
        }
        p.modified = true;
    })?;

    let mut retagged = Vec::new();
    for composite in composites {
        if composite == id {
            continue;
        }
        let swapped = graph.modify(composite, |p| {
            let PrimitiveData::Composite { members } = &mut p.data else {
                return false;
            };
            let mut swapped = false;
            for member in members.iter_mut().filter(|m| m.target == *id) {
                let flipped = match member.role.as_deref() {
                    Some(FORWARD) => BACKWARD,
                    Some(BACKWARD) => FORWARD,
                    _ => continue,
                };
                member.role = Some(flipped.to_string());
                swapped = true;
            }
            if swapped {
                p.modified = true;
            }
            swapped
        })?;
        if swapped {
            retagged.push(*composite);
        }
    }

    debug!(primitive = %id, retagged = retagged.len(), "reversed primitive");
    Ok(ReversalReport {
        reversed: *id,
        retagged,
    })
}
