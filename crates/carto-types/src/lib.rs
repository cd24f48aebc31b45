//! Foundation types for the Carto merge engine.
//!
//! This crate provides the identity, versioning, and coordinate types shared
//! by every other Carto crate.
//!
//! # Key Types
//!
//! - [`PrimitiveKind`]: The closed set of primitive shapes (Point, Chain, Composite)
//! - [`PrimitiveId`]: A `(kind, integer)` identity; non-positive integers are unassigned
//! - [`VersionStamp`]: Logical clock attached to primitives received from a source
//! - [`Coordinate`]: Fixed-point latitude/longitude, compared only for equality

pub mod coord;
pub mod error;
pub mod identity;
pub mod version;

pub use coord::Coordinate;
pub use error::TypeError;
pub use identity::{PrimitiveId, PrimitiveKind};
pub use version::VersionStamp;
