//! Primitive records and the graph arena for the Carto merge engine.
//!
//! A [`Graph`] owns [`Primitive`]s keyed by their [`PrimitiveId`]. Chains and
//! composites reference their children by identity rather than by pointer,
//! so canonicalizing a reference is an index lookup.
//!
//! [`PrimitiveId`]: carto_types::PrimitiveId

pub mod error;
pub mod graph;
pub mod primitive;

pub use error::{GraphError, GraphResult};
pub use graph::Graph;
pub use primitive::{Member, Primitive, PrimitiveData, Tags};
