//! # ebgraph
//!
//! ebgraph stores the per-cell topology of a structured grid cut by an
//! embedded geometric boundary, for finite-volume PDE codes. Every cell is
//! covered (outside the domain), regular (inside, one implicit sub-volume),
//! or irregular (cut into one or more sub-volumes, each with explicit
//! directional connectivity). The crate provides:
//!
//! - Value-type addresses: [`topology::vect::IntVect`] grid indices,
//!   [`topology::vof::VolIndex`] sub-volumes, [`topology::vof::FaceIndex`]
//!   faces, and [`topology::region::IndexBox`] cell ranges.
//! - [`topology::graph_node::GraphNode`], a per-cell sum type whose covered
//!   and regular states carry no allocation; irregular record lists live in
//!   a pooled [`arena::Arena`].
//! - Directional neighbor queries, AMR coarsen/refine address mapping, and
//!   deterministic connected-component extraction
//!   ([`topology::components::vof_sets`]) for building coarser levels.
//! - A little-endian `linear_size`/`linear_out`/`linear_in` wire contract
//!   for moving cell topology between processes and levels.
//!
//! ## Determinism
//!
//! Component extraction and face enumeration have fixed iteration orders
//! (ascending cell index, ascending ordinal, low side before high side), so
//! coarse sub-volume numbering is reproducible across runs with identical
//! input.
//!
//! ## What this crate is not
//!
//! Geometry classification, grid decomposition, flux solvers, time
//! integration, and file I/O all live with the callers. Nodes are plain
//! value types with deep-copy semantics; nothing here blocks, shares, or
//! reference-counts.

pub mod arena;
pub mod debug_invariants;
pub mod graph_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::arena::{Arena, node_arena};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::graph_error::GraphError;
    pub use crate::topology::components::vof_sets;
    pub use crate::topology::graph_node::GraphNode;
    pub use crate::topology::node::{ArcList, NodeRecord};
    pub use crate::topology::region::IndexBox;
    pub use crate::topology::vect::{IntVect, Side};
    pub use crate::topology::vof::{FaceIndex, VolIndex};
}
