//! Content comparison for the Carto merge engine.
//!
//! Decides whether two primitive versions carry the same content and, when
//! they do not, describes the difference for conflict reporting.
//!
//! # Key Types
//!
//! - [`Equivalence`] / [`content_equal`] -- Value equality used by merge decisions
//! - [`TagDiff`] / [`TagChange`] -- Tag map diff (added/removed/modified keys)
//! - [`MemberDiff`] / [`MemberChange`] -- Ordered member-list diff
//! - [`PrimitiveDiff`] -- Whole-primitive diff between two versions

pub mod equality;
pub mod error;
pub mod member_diff;
pub mod primitive_diff;
pub mod tag_diff;

pub use equality::{content_equal, Equivalence};
pub use error::{DiffError, DiffResult};
pub use member_diff::{diff_members, MemberChange, MemberDiff};
pub use primitive_diff::{diff_primitives, PrimitiveDiff};
pub use tag_diff::{diff_tags, TagChange, TagDiff};
