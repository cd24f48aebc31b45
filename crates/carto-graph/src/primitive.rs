//! Primitive records held by a [`Graph`](crate::Graph).
//!
//! A [`Primitive`] is one of three shapes, captured by the closed
//! [`PrimitiveData`] enum: a point with a coordinate, a chain joining exactly
//! two points, or a composite listing role-labelled members of any kind.
//! Children are referenced by [`PrimitiveId`], never by pointer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use carto_types::{Coordinate, PrimitiveId, PrimitiveKind, VersionStamp};

use crate::error::{GraphError, GraphResult};

/// Unordered key → value tag mapping. A `BTreeMap` keeps comparisons and
/// serialized output deterministic.
pub type Tags = BTreeMap<String, String>;

/// A single entry in a composite's member list.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Member {
    /// Optional role label (e.g. "outer", "forward").
    pub role: Option<String>,
    /// The referenced primitive.
    pub target: PrimitiveId,
}

impl Member {
    /// A member without a role.
    pub fn new(target: PrimitiveId) -> Self {
        Self { role: None, target }
    }

    /// A member with the given role.
    pub fn with_role(role: impl Into<String>, target: PrimitiveId) -> Self {
        Self {
            role: Some(role.into()),
            target,
        }
    }

    /// The role label, or `""` when absent.
    pub fn role_str(&self) -> &str {
        self.role.as_deref().unwrap_or("")
    }
}

/// The shape-specific substructure of a primitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveData {
    /// A leaf. `coord` is `None` while the point is incomplete.
    Point { coord: Option<Coordinate> },
    /// An edge between two points. `ends` is `None` while incomplete.
    Chain { ends: Option<[PrimitiveId; 2]> },
    /// An ordered member list.
    Composite { members: Vec<Member> },
}

impl PrimitiveData {
    /// Empty substructure for a primitive of the given kind.
    pub fn empty(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Point => PrimitiveData::Point { coord: None },
            PrimitiveKind::Chain => PrimitiveData::Chain { ends: None },
            PrimitiveKind::Composite => PrimitiveData::Composite {
                members: Vec::new(),
            },
        }
    }

    /// The kind this data shape belongs to.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveData::Point { .. } => PrimitiveKind::Point,
            PrimitiveData::Chain { .. } => PrimitiveKind::Chain,
            PrimitiveData::Composite { .. } => PrimitiveKind::Composite,
        }
    }

    /// All child references in order. Points have none.
    pub fn children(&self) -> Vec<PrimitiveId> {
        match self {
            PrimitiveData::Point { .. } => Vec::new(),
            PrimitiveData::Chain { ends } => ends.map(|e| e.to_vec()).unwrap_or_default(),
            PrimitiveData::Composite { members } => members.iter().map(|m| m.target).collect(),
        }
    }

    /// Returns `true` if the data carries at least one child reference.
    pub fn has_children(&self) -> bool {
        match self {
            PrimitiveData::Point { .. } => false,
            PrimitiveData::Chain { ends } => ends.is_some(),
            PrimitiveData::Composite { members } => !members.is_empty(),
        }
    }
}

/// A versioned, identity-bearing record in a graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    /// Identity; also the arena key.
    pub id: PrimitiveId,
    /// Version stamp from the upstream source. Absent for local-only records.
    pub version: Option<VersionStamp>,
    /// Carries an uncommitted local edit.
    pub modified: bool,
    /// Marked removed. May be set together with `modified`.
    pub deleted: bool,
    /// Only the identity is known; substructure has not been fetched.
    pub incomplete: bool,
    /// Tag mapping.
    pub tags: Tags,
    /// Shape-specific substructure.
    pub data: PrimitiveData,
}

impl Primitive {
    fn with_data(id: PrimitiveId, data: PrimitiveData) -> Self {
        Self {
            id,
            version: None,
            modified: false,
            deleted: false,
            incomplete: false,
            tags: Tags::new(),
            data,
        }
    }

    /// A complete point.
    pub fn point(id: i64, coord: Coordinate) -> Self {
        Self::with_data(
            PrimitiveId::point(id),
            PrimitiveData::Point { coord: Some(coord) },
        )
    }

    /// A complete chain between points `a` and `b`.
    pub fn chain(id: i64, a: i64, b: i64) -> Self {
        Self::with_data(
            PrimitiveId::chain(id),
            PrimitiveData::Chain {
                ends: Some([PrimitiveId::point(a), PrimitiveId::point(b)]),
            },
        )
    }

    /// A complete composite with the given members.
    pub fn composite(id: i64, members: Vec<Member>) -> Self {
        Self::with_data(
            PrimitiveId::composite(id),
            PrimitiveData::Composite { members },
        )
    }

    /// An incomplete placeholder: identity only.
    pub fn incomplete(id: PrimitiveId) -> Self {
        Self {
            incomplete: true,
            ..Self::with_data(id, PrimitiveData::empty(id.kind))
        }
    }

    /// Set the version stamp.
    pub fn with_version(mut self, version: VersionStamp) -> Self {
        self.version = Some(version);
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Mark as carrying a local edit.
    pub fn modified(mut self) -> Self {
        self.modified = true;
        self
    }

    /// Mark as deleted.
    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    /// Mark as incomplete while keeping whatever substructure is present.
    pub fn marked_incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }

    /// The kind of this primitive.
    pub fn kind(&self) -> PrimitiveKind {
        self.id.kind
    }

    /// The point coordinate, if this is a complete point.
    pub fn coord(&self) -> Option<Coordinate> {
        match self.data {
            PrimitiveData::Point { coord } => coord,
            _ => None,
        }
    }

    /// All child references in order.
    pub fn children(&self) -> Vec<PrimitiveId> {
        self.data.children()
    }

    /// Rewrite every child reference through `f`, stopping at the first error.
    pub fn map_children<E>(
        &mut self,
        mut f: impl FnMut(PrimitiveId) -> Result<PrimitiveId, E>,
    ) -> Result<(), E> {
        match &mut self.data {
            PrimitiveData::Point { .. } => {}
            PrimitiveData::Chain { ends } => {
                if let Some(ends) = ends {
                    for end in ends.iter_mut() {
                        *end = f(*end)?;
                    }
                }
            }
            PrimitiveData::Composite { members } => {
                for member in members.iter_mut() {
                    member.target = f(member.target)?;
                }
            }
        }
        Ok(())
    }

    /// Check that the data shape matches the identity and that child kinds
    /// are allowed by the shape.
    pub fn validate(&self) -> GraphResult<()> {
        if self.data.kind() != self.id.kind {
            return Err(GraphError::KindMismatch {
                id: self.id,
                expected: self.id.kind,
                actual: self.data.kind(),
            });
        }
        if let PrimitiveData::Chain { ends: Some(ends) } = &self.data {
            for end in ends {
                if end.kind != PrimitiveKind::Point {
                    return Err(GraphError::InvalidChild {
                        parent: self.id,
                        child: *end,
                        reason: "chain endpoints must be points",
                    });
                }
            }
        }
        if self.children().contains(&self.id) {
            return Err(GraphError::CycleDetected(self.id));
        }
        Ok(())
    }

    /// Returns a human-readable summary of this primitive.
    pub fn summary(&self) -> String {
        let mut flags = Vec::new();
        if self.modified {
            flags.push("modified");
        }
        if self.deleted {
            flags.push("deleted");
        }
        if self.incomplete {
            flags.push("incomplete");
        }
        let version = self
            .version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".into());
        format!(
            "{} v{} [{}] {} tag(s)",
            self.id,
            version,
            flags.join(","),
            self.tags.len()
        )
    }
}
