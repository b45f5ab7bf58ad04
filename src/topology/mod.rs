//! Cut-cell topology: cell addressing, per-sub-volume records, the per-cell
//! graph node, and connected-component extraction for coarsening.

pub mod components;
pub mod graph_node;
pub mod node;
pub mod region;
pub mod vect;
pub mod vof;
