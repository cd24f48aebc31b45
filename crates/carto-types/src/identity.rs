use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The closed set of primitive shapes.
///
/// Ordering is the dependency order used by the merge driver for shallow
/// graphs: points before chains before composites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// A leaf carrying a coordinate.
    Point,
    /// A minimal edge between exactly two points.
    Chain,
    /// An ordered list of role-labelled references to any primitive.
    Composite,
}

impl PrimitiveKind {
    /// Single-character prefix used in the textual identity form.
    pub fn prefix(&self) -> char {
        match self {
            PrimitiveKind::Point => 'p',
            PrimitiveKind::Chain => 'c',
            PrimitiveKind::Composite => 'r',
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'p' => Some(PrimitiveKind::Point),
            'c' => Some(PrimitiveKind::Chain),
            'r' => Some(PrimitiveKind::Composite),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Point => "point",
            PrimitiveKind::Chain => "chain",
            PrimitiveKind::Composite => "composite",
        };
        f.write_str(name)
    }
}

/// Identity of a primitive: a `(kind, integer)` pair.
///
/// A positive integer is a canonical, caller-wide identity handed out by the
/// upstream source. Zero and negative integers are *unassigned*: the
/// primitive was created locally. Inside a graph arena an unassigned
/// primitive is keyed by a negative placeholder that is unique only within
/// that graph; zero never names a stored primitive.
///
/// Ordering: `kind` → `id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrimitiveId {
    /// The primitive shape this identity belongs to.
    pub kind: PrimitiveKind,
    /// The integer part. Non-positive means unassigned.
    pub id: i64,
}

impl PrimitiveId {
    /// Create an identity with explicit values.
    pub const fn new(kind: PrimitiveKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Identity of a point.
    pub const fn point(id: i64) -> Self {
        Self::new(PrimitiveKind::Point, id)
    }

    /// Identity of a chain.
    pub const fn chain(id: i64) -> Self {
        Self::new(PrimitiveKind::Chain, id)
    }

    /// Identity of a composite.
    pub const fn composite(id: i64) -> Self {
        Self::new(PrimitiveKind::Composite, id)
    }

    /// The fresh, not-yet-stored identity of the given kind.
    pub const fn unassigned(kind: PrimitiveKind) -> Self {
        Self::new(kind, 0)
    }

    /// Returns `true` if the integer is zero or a placeholder.
    pub fn is_unassigned(&self) -> bool {
        self.id <= 0
    }

    /// Returns `true` if this is a graph-local placeholder (negative integer).
    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }

    /// Returns `true` if this is the transient zero identity.
    pub fn is_zero(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Debug for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimitiveId({self})")
    }
}

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

impl FromStr for PrimitiveId {
    type Err = TypeError;

    /// Parse the textual form produced by `Display`, e.g. `p42`, `c-3`, `r7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(PrimitiveKind::from_prefix)
            .ok_or_else(|| TypeError::InvalidIdentity(s.to_string()))?;
        let id = chars
            .as_str()
            .parse::<i64>()
            .map_err(|_| TypeError::InvalidIdentity(s.to_string()))?;
        Ok(Self { kind, id })
    }
}
