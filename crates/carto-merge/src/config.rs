use serde::{Deserialize, Serialize};

use carto_diff::Equivalence;

use crate::error::{MergeError, MergeResult};

/// Configuration for a [`MergeDriver`](crate::MergeDriver).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Equality used by the decision table when comparing a local edit
    /// against incoming content. `PositionOnly` lets a point whose
    /// position matches be adopted even if its tags differ.
    pub point_equality: Equivalence,
    /// Whether unassigned incoming primitives that are value-equal to one
    /// inserted earlier in the same pass collapse into it.
    pub deduplicate_unassigned: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            point_equality: Equivalence::Full,
            deduplicate_unassigned: true,
        }
    }
}

impl MergeConfig {
    /// Points compare by position only.
    pub fn position_only() -> Self {
        Self {
            point_equality: Equivalence::PositionOnly,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> MergeResult<Self> {
        toml::from_str(s).map_err(|e| MergeError::Config(e.to_string()))
    }
}
