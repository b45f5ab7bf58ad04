//! `GraphError`: unified error type for ebgraph public APIs.
//!
//! Only conditions a caller can actually meet with bad *data* — malformed
//! bytes arriving from another process, or a failed invariant audit — become
//! errors. Precondition violations (an ordinal that names no sub-volume, a
//! missing coarsening link, a double free) panic instead: they indicate a
//! construction bug, and continuing would silently corrupt topology.

use thiserror::Error;

/// Unified error type for ebgraph operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A wire buffer ended before the encoded value it promised.
    #[error("wire buffer truncated: needed {needed} bytes, had {remaining}")]
    TruncatedBuffer { needed: usize, remaining: usize },
    /// The leading state tag of a serialized graph node was not recognized.
    #[error("unknown graph-node tag on the wire: {0}")]
    InvalidNodeTag(u8),
    /// The coarser-ordinal field held a negative value other than the
    /// `-1` "no link" sentinel.
    #[error("invalid coarser ordinal on the wire: {0}")]
    InvalidCoarserOrdinal(i32),
    /// An encoded element count could not possibly fit in the bytes that
    /// follow it.
    #[error("wire count {count} exceeds what {remaining} remaining bytes could hold")]
    ImplausibleCount { count: usize, remaining: usize },
    /// A structural invariant of the cell graph does not hold.
    #[error("graph topology invariant violated: {0}")]
    InvalidTopology(String),
}
