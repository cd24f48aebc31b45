//! Error types for the merge engine.
//!
//! Conflicts are not errors: they are recorded in the
//! [`ConflictRegistry`](crate::ConflictRegistry) and never abort a pass.
//! Everything here is a structural precondition failure that aborts the
//! current pass without rolling back mutations already applied.

use carto_graph::GraphError;
use carto_types::PrimitiveId;

/// Errors that abort a merge pass or a resolution step.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An identity was claimed by two different instances.
    #[error("identity {id} is already bound to {bound_to}")]
    DuplicateIdentity { id: PrimitiveId, bound_to: PrimitiveId },

    /// A child reference resolves neither in the incoming nor the target graph.
    #[error("{referrer} references {target}, which is in neither graph")]
    UnresolvedReference {
        referrer: PrimitiveId,
        target: PrimitiveId,
    },

    /// No conflict is registered for the identity.
    #[error("no conflict registered for {0}")]
    ConflictNotFound(PrimitiveId),

    /// The primitive has no direction to reverse.
    #[error("{0} cannot be reversed")]
    NotReversible(PrimitiveId),

    /// A graph operation failed.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration could not be parsed.
    #[error("invalid merge configuration: {0}")]
    Config(String),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
