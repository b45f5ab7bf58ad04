//! `NodeRecord`: per-sub-volume connectivity and its wire encoding.
//!
//! Each sub-volume of an irregular cell carries one record: a regular flag,
//! one arc list per (axis, side) pair naming the neighbor ordinals it
//! connects to, and the links tying it to the next-coarser and next-finer
//! graph levels. An empty arc list means the face is a boundary (domain edge
//! or covered neighbor) — a valid state, never an error. Lists longer than
//! one carry multi-valued neighbors; every consumer iterates the list rather
//! than assuming a singleton.
//!
//! The wire layout is explicit and little-endian: a fixed header
//! (`is_regular`, coarser ordinal with `-1` as "none", finer count), then
//! `2·D` length-prefixed arc lists, then the finer sub-volume addresses.
//! [`NodeRecord::linear_size`] returns exactly the byte count
//! [`NodeRecord::linear_out`] writes, and [`NodeRecord::linear_in`]
//! round-trips bit-exactly. The transient `is_valid` marker is never
//! serialized and defaults to valid on decode.

use bytes::{Buf, BufMut};
use smallvec::SmallVec;

use crate::graph_error::GraphError;
use crate::topology::vect::{IntVect, Side};
use crate::topology::vof::VolIndex;

/// Neighbor ordinals across one (axis, side) face. Almost always 0 or 1
/// entries, so the single inline slot avoids allocation on the common path.
pub type ArcList = SmallVec<[u32; 1]>;

/// Connectivity record for one sub-volume of a cell.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord<const D: usize> {
    /// True if this sub-volume fills its cell (a regular cell whose coarse
    /// parent is multi-valued still gets an explicit record).
    pub is_regular: bool,
    /// Soft-delete marker used while extracting connected components during
    /// coarsening. Transient: never serialized, never observed by solvers.
    pub is_valid: bool,
    /// One arc list per (axis, side); see [`NodeRecord::arc_index`].
    arcs: Vec<ArcList>,
    /// Ordinal of the matching sub-volume one level coarser, when this graph
    /// was built by coarsening a finer one.
    pub coarser: Option<u32>,
    /// Sub-volumes one level finer that coarsen back to this one.
    pub finer: Vec<VolIndex<D>>,
}

impl<const D: usize> NodeRecord<D> {
    /// A fresh irregular record with empty (boundary) arcs everywhere.
    pub fn new() -> Self {
        NodeRecord {
            is_regular: false,
            is_valid: true,
            arcs: vec![ArcList::new(); 2 * D],
            coarser: None,
            finer: Vec::new(),
        }
    }

    /// A record for an explicitly regular sub-volume (used when a regular
    /// cell needs coarser-link bookkeeping and cannot take the fast path).
    pub fn regular() -> Self {
        NodeRecord {
            is_regular: true,
            ..Self::new()
        }
    }

    /// Index into the arc storage for `(axis, side)`: low sides first,
    /// then high sides.
    ///
    /// # Panics
    /// Panics if `axis >= D`.
    #[inline]
    pub fn arc_index(axis: usize, side: Side) -> usize {
        assert!(axis < D, "axis {axis} out of range for dimension {D}");
        axis + side.index() * D
    }

    /// Neighbor ordinals across the `(axis, side)` face. Empty means the
    /// face is a boundary.
    #[inline]
    pub fn arcs(&self, axis: usize, side: Side) -> &ArcList {
        &self.arcs[Self::arc_index(axis, side)]
    }

    /// Append one neighbor ordinal to the `(axis, side)` arc list.
    pub fn push_arc(&mut self, axis: usize, side: Side, ordinal: u32) {
        self.arcs[Self::arc_index(axis, side)].push(ordinal);
    }

    /// Replace the `(axis, side)` arc list wholesale.
    pub fn set_arcs(&mut self, axis: usize, side: Side, list: ArcList) {
        self.arcs[Self::arc_index(axis, side)] = list;
    }

    /// Exact number of bytes [`NodeRecord::linear_out`] will write.
    pub fn linear_size(&self) -> usize {
        let header = 1 + 4 + 4;
        let arcs: usize = self.arcs.iter().map(|a| 4 + 4 * a.len()).sum();
        let finer = self.finer.len() * (4 * D + 4);
        header + arcs + finer
    }

    /// Serialize into `buf`, little-endian.
    pub fn linear_out(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.is_regular as u8);
        buf.put_i32_le(match self.coarser {
            Some(c) => c as i32,
            None => -1,
        });
        buf.put_u32_le(self.finer.len() as u32);
        for list in &self.arcs {
            buf.put_u32_le(list.len() as u32);
            for &ordinal in list {
                buf.put_u32_le(ordinal);
            }
        }
        for fine in &self.finer {
            for axis in 0..D {
                buf.put_i32_le(fine.cell()[axis]);
            }
            buf.put_u32_le(fine.vof());
        }
    }

    /// Deserialize one record from `buf`, advancing it past the record.
    ///
    /// `is_valid` comes back `true`; validity is a transient in-process
    /// marker, not part of the wire contract.
    pub fn linear_in(buf: &mut impl Buf) -> Result<Self, GraphError> {
        let is_regular = take_u8(buf)? != 0;
        let coarser = match take_i32(buf)? {
            -1 => None,
            c if c < 0 => return Err(GraphError::InvalidCoarserOrdinal(c)),
            c => Some(c as u32),
        };
        let n_finer = take_count(buf, 4 * D + 4)?;

        let mut arcs = Vec::with_capacity(2 * D);
        for _ in 0..2 * D {
            let n = take_count(buf, 4)?;
            let mut list = ArcList::with_capacity(n);
            for _ in 0..n {
                list.push(take_u32(buf)?);
            }
            arcs.push(list);
        }

        let mut finer = Vec::with_capacity(n_finer);
        for _ in 0..n_finer {
            let mut cell = [0i32; D];
            for c in cell.iter_mut() {
                *c = take_i32(buf)?;
            }
            let vof = take_u32(buf)?;
            finer.push(VolIndex::new(IntVect(cell), vof));
        }

        Ok(NodeRecord {
            is_regular,
            is_valid: true,
            arcs,
            coarser,
            finer,
        })
    }
}

impl<const D: usize> Default for NodeRecord<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Value equality over everything except the transient `is_valid` marker,
/// matching the wire round-trip contract.
impl<const D: usize> PartialEq for NodeRecord<D> {
    fn eq(&self, other: &Self) -> bool {
        self.is_regular == other.is_regular
            && self.arcs == other.arcs
            && self.coarser == other.coarser
            && self.finer == other.finer
    }
}

impl<const D: usize> Eq for NodeRecord<D> {}

fn need(buf: &impl Buf, n: usize) -> Result<(), GraphError> {
    if buf.remaining() < n {
        return Err(GraphError::TruncatedBuffer {
            needed: n,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

fn take_u8(buf: &mut impl Buf) -> Result<u8, GraphError> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn take_i32(buf: &mut impl Buf) -> Result<i32, GraphError> {
    need(buf, 4)?;
    Ok(buf.get_i32_le())
}

fn take_u32(buf: &mut impl Buf) -> Result<u32, GraphError> {
    need(buf, 4)?;
    Ok(buf.get_u32_le())
}

/// Read an element count whose elements occupy at least `min_elem_bytes`
/// each, rejecting counts the remaining buffer could not possibly hold.
pub(crate) fn take_count(buf: &mut impl Buf, min_elem_bytes: usize) -> Result<usize, GraphError> {
    let n = take_u32(buf)? as usize;
    if n.saturating_mul(min_elem_bytes) > buf.remaining() {
        return Err(GraphError::ImplausibleCount {
            count: n,
            remaining: buf.remaining(),
        });
    }
    Ok(n)
}
