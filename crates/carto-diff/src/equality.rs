//! Value equality between two primitive versions.
//!
//! Two versions are content-equal when they have the same kind, the same
//! shape data (coordinate, endpoints, or ordered members with roles), the
//! same deletion state, and the same tags. Identity, version stamp and the
//! `modified`/`incomplete` flags are not content.

use serde::{Deserialize, Serialize};

use carto_graph::Primitive;
use carto_types::PrimitiveKind;

/// How strictly two versions are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equivalence {
    /// Shape data, deletion state, and tags must all match.
    #[default]
    Full,
    /// Points compare by position and deletion state only; tags are
    /// ignored. Chains and composites still compare tags.
    PositionOnly,
}

/// Returns `true` if `a` and `b` carry the same content under `equivalence`.
///
/// Child references are compared by identity, so callers comparing an
/// incoming primitive against a target primitive must canonicalize the
/// incoming children first.
pub fn content_equal(a: &Primitive, b: &Primitive, equivalence: Equivalence) -> bool {
    if a.kind() != b.kind() || a.deleted != b.deleted || a.data != b.data {
        return false;
    }
    match (equivalence, a.kind()) {
        (Equivalence::PositionOnly, PrimitiveKind::Point) => true,
        _ => a.tags == b.tags,
    }
}
