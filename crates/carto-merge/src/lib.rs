//! Merge engine for Carto.
//!
//! Reconciles an incoming primitive graph (typically fetched from an
//! upstream source) with a locally held, possibly edited, target graph.
//!
//! A merge pass walks the incoming graph children-first. Each primitive has
//! its child references canonicalized through the [`IdentityMap`], is
//! matched to its target counterpart (by identity, or by value for
//! unassigned primitives), and is reconciled according to the
//! [`decide`] table. Irreconcilable pairs land in the [`ConflictRegistry`]
//! for an external resolution step; they never abort the pass.
//!
//! # Modules
//!
//! - [`identity_map`]: Per-pass incoming → canonical identity bindings
//! - [`decision`]: The pure three-way decision table
//! - [`driver`]: The [`MergeDriver`] that runs a pass
//! - [`conflict`]: [`Conflict`] records and the [`ConflictRegistry`]
//! - [`reversal`]: Optional post-merge reversal pass with role rewriting
//! - [`config`]: [`MergeConfig`]
//! - [`error`]: [`MergeError`]

mod apply;
pub mod config;
pub mod conflict;
pub mod decision;
pub mod driver;
pub mod error;
pub mod identity_map;
pub mod reversal;

#[cfg(test)]
mod proptests;

pub use config::MergeConfig;
pub use conflict::{Conflict, ConflictRegistry};
pub use decision::{decide, ConflictReason, Decision, Outcome, Rule};
pub use driver::{MergeDriver, MergeReport};
pub use error::{MergeError, MergeResult};
pub use identity_map::{structurally_equal, IdentityMap, Resolution, RewriteReport};
pub use reversal::{reverse_primitive, ReversalReport};
