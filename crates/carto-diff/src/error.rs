//! Error types for the diff crate.

use carto_types::PrimitiveId;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The two primitives are of different kinds and cannot be compared.
    #[error("cannot diff {old} against {new}: kinds differ")]
    KindMismatch { old: PrimitiveId, new: PrimitiveId },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
