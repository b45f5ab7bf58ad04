//! Structural invariant audits for graph nodes and records.

use itertools::Itertools;

use crate::graph_error::GraphError;
use crate::topology::graph_node::GraphNode;
use crate::topology::node::NodeRecord;
use crate::topology::vect::Side;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), GraphError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

impl<const D: usize> DebugInvariants for NodeRecord<D> {
    fn debug_assert_invariants(&self) {
        debug_invariants!(self.validate_invariants(), "NodeRecord");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        for axis in 0..D {
            for side in Side::BOTH {
                if !self.arcs(axis, side).iter().all_unique() {
                    return Err(GraphError::InvalidTopology(format!(
                        "duplicate neighbor ordinal in arc list (axis {axis}, {side:?})"
                    )));
                }
            }
        }
        if !self.finer.iter().all_unique() {
            return Err(GraphError::InvalidTopology(
                "duplicate sub-volume in finer-link list".into(),
            ));
        }
        Ok(())
    }
}

impl<const D: usize> DebugInvariants for GraphNode<D> {
    fn debug_assert_invariants(&self) {
        debug_invariants!(self.validate_invariants(), "GraphNode");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        if self.has_record_list() && self.len() == 0 {
            return Err(GraphError::InvalidTopology(
                "empty record list; a cell with no sub-volumes must be covered".into(),
            ));
        }
        if self.has_record_list() {
            for ordinal in 0..self.len() {
                self.record(ordinal).validate_invariants()?;
            }
        }
        Ok(())
    }
}
