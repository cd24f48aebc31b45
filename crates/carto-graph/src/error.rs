//! Error types for the graph arena.

use carto_types::{PrimitiveId, PrimitiveKind};

/// Errors that can occur during graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A referenced primitive was not found in the graph.
    #[error("primitive not found: {0}")]
    NotFound(PrimitiveId),

    /// Attempted to insert a primitive whose identity is already present.
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(PrimitiveId),

    /// The primitive's data shape does not match its identity's kind.
    #[error("kind mismatch for {id}: identity is a {expected}, data is a {actual}")]
    KindMismatch {
        id: PrimitiveId,
        expected: PrimitiveKind,
        actual: PrimitiveKind,
    },

    /// A child reference has a kind the parent shape does not allow.
    #[error("invalid child {child} in {parent}: {reason}")]
    InvalidChild {
        parent: PrimitiveId,
        child: PrimitiveId,
        reason: &'static str,
    },

    /// The primitive is still referenced and cannot be removed.
    #[error("{id} is still referenced by {referrers:?}")]
    StillReferenced {
        id: PrimitiveId,
        referrers: Vec<PrimitiveId>,
    },

    /// An in-place modification attempted to change the primitive's identity.
    #[error("identity changed during modification: {from} -> {to}")]
    IdentityChanged { from: PrimitiveId, to: PrimitiveId },

    /// A cycle was detected among child references.
    #[error("cycle detected involving {0}")]
    CycleDetected(PrimitiveId),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
