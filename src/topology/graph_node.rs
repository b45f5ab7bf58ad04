//! `GraphNode`: per-cell handle over the cut-cell topology.
//!
//! In a realistic embedded-boundary grid almost every cell is regular and a
//! small minority is covered; cells actually cut by the boundary are rarer
//! still. The node is therefore a three-state sum type whose two common
//! states carry no heap allocation at all:
//!
//! - [`GraphNode::Covered`] — the cell is outside the domain, no sub-volumes.
//! - [`GraphNode::Regular`] — one implicit sub-volume, connected to the
//!   matching sub-volume of every in-domain neighbor, with a single-valued
//!   coarse parent.
//! - [`GraphNode::List`] — an arena-backed list of [`NodeRecord`]s, one per
//!   sub-volume. A cell that is currently regular but whose coarse parent is
//!   multi-valued also lives here, as a singleton list whose sole record has
//!   `is_regular` set: collapsing it onto the fast path would lose the
//!   bookkeeping the level builder needs.
//!
//! Nodes have strict value semantics. `Clone` deep-copies the record list
//! into a fresh arena allocation; two nodes never alias storage, so
//! serializing distinct nodes from distinct threads is safe by construction.

use std::alloc::Layout;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use bytes::{Buf, BufMut};

use crate::arena::node_arena;
use crate::graph_error::GraphError;
use crate::topology::node::{NodeRecord, take_count};
use crate::topology::region::IndexBox;
use crate::topology::vect::{IntVect, Side};
use crate::topology::vof::{FaceIndex, VolIndex};

/// Owned, arena-backed record list of an irregular (or multi-valued-parent)
/// cell.
///
/// The list header (`Vec`) itself lives in the process-wide
/// [`node_arena`](crate::arena::node_arena); dropping the handle returns the
/// block to the arena's shelf. The handle is the sole owner of its block,
/// which is what makes the `Send`/`Sync` impls below sound.
pub struct NodeList<const D: usize> {
    ptr: NonNull<Vec<NodeRecord<D>>>,
}

impl<const D: usize> NodeList<D> {
    fn layout() -> Layout {
        Layout::new::<Vec<NodeRecord<D>>>()
    }

    /// Move `records` into a fresh arena block.
    pub fn new(records: Vec<NodeRecord<D>>) -> Self {
        let ptr = node_arena().alloc(Self::layout()).cast::<Vec<NodeRecord<D>>>();
        // The block is fresh (or recycled and already vacated), correctly
        // sized and aligned for a Vec header.
        unsafe { ptr.as_ptr().write(records) };
        NodeList { ptr }
    }
}

impl<const D: usize> Deref for NodeList<D> {
    type Target = Vec<NodeRecord<D>>;
    #[inline]
    fn deref(&self) -> &Vec<NodeRecord<D>> {
        unsafe { self.ptr.as_ref() }
    }
}

impl<const D: usize> DerefMut for NodeList<D> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Vec<NodeRecord<D>> {
        unsafe { self.ptr.as_mut() }
    }
}

impl<const D: usize> Drop for NodeList<D> {
    fn drop(&mut self) {
        unsafe {
            std::ptr::drop_in_place(self.ptr.as_ptr());
            node_arena().free(self.ptr.cast(), Self::layout());
        }
    }
}

/// Deep copy into a fresh arena block; clones never alias.
impl<const D: usize> Clone for NodeList<D> {
    fn clone(&self) -> Self {
        NodeList::new(self.deref().clone())
    }
}

impl<const D: usize> fmt::Debug for NodeList<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deref().fmt(f)
    }
}

impl<const D: usize> PartialEq for NodeList<D> {
    fn eq(&self, other: &Self) -> bool {
        self.deref() == other.deref()
    }
}

impl<const D: usize> Eq for NodeList<D> {}

// Sole ownership of the pointed-to Vec (no sharing, ever) makes moving the
// handle across threads and sharing &NodeList both sound.
unsafe impl<const D: usize> Send for NodeList<D> {}
unsafe impl<const D: usize> Sync for NodeList<D> {}

const TAG_COVERED: u8 = 0;
const TAG_REGULAR: u8 = 1;
const TAG_LIST: u8 = 2;

/// The topology of one grid cell.
///
/// Constructed defaulting to [`GraphNode::Regular`]; the geometry pass moves
/// it to its final state via [`GraphNode::define_as_covered`],
/// [`GraphNode::define_as_regular`], or repeated
/// [`GraphNode::add_irregular_node`] calls.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum GraphNode<const D: usize> {
    /// Entirely outside the domain: no sub-volumes, no degrees of freedom.
    Covered,
    /// Entirely inside, one implicit sub-volume, single-valued coarse parent.
    #[default]
    Regular,
    /// General case: one record per sub-volume.
    List(NodeList<D>),
}

impl<const D: usize> GraphNode<D> {
    /// Number of sub-volumes in this cell.
    pub fn len(&self) -> usize {
        match self {
            GraphNode::Covered => 0,
            GraphNode::Regular => 1,
            GraphNode::List(recs) => recs.len(),
        }
    }

    /// True when the cell holds no sub-volumes (covered).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_covered(&self) -> bool {
        matches!(self, GraphNode::Covered)
    }

    /// Regular with a single-valued coarse parent: the no-allocation fast
    /// path.
    #[inline]
    pub fn is_regular_with_unique_parent(&self) -> bool {
        matches!(self, GraphNode::Regular)
    }

    /// Regular, but carrying an explicit record because the coarse parent is
    /// multi-valued.
    pub fn is_regular_with_multi_valued_parent(&self) -> bool {
        match self {
            GraphNode::List(recs) => recs.len() == 1 && recs[0].is_regular,
            _ => false,
        }
    }

    #[inline]
    pub fn is_regular(&self) -> bool {
        self.is_regular_with_unique_parent() || self.is_regular_with_multi_valued_parent()
    }

    #[inline]
    pub fn is_irregular(&self) -> bool {
        !self.is_regular() && !self.is_covered()
    }

    /// True when the node holds an explicit record list.
    #[inline]
    pub fn has_record_list(&self) -> bool {
        matches!(self, GraphNode::List(_))
    }

    /// Reset to the regular fast path, releasing any held record list.
    /// Safe to call any number of times, from any state.
    pub fn define_as_regular(&mut self) {
        *self = GraphNode::Regular;
    }

    /// Reset to covered, releasing any held record list.
    pub fn define_as_covered(&mut self) {
        *self = GraphNode::Covered;
    }

    /// Install `record` as sub-volume `ordinal`, growing the list with
    /// placeholder records if needed. Starts a new list transparently when
    /// called on a covered or fast-path-regular node.
    pub fn add_irregular_node(&mut self, record: NodeRecord<D>, ordinal: usize) {
        let recs = self.ensure_list();
        if ordinal >= recs.len() {
            recs.resize_with(ordinal + 1, NodeRecord::new);
        }
        recs[ordinal] = record;
    }

    /// Append `record` as the next sub-volume.
    pub fn push_irregular_node(&mut self, record: NodeRecord<D>) {
        self.ensure_list().push(record);
    }

    fn ensure_list(&mut self) -> &mut NodeList<D> {
        if !self.has_record_list() {
            log::trace!("graph node leaves fast path for an explicit record list");
            *self = GraphNode::List(NodeList::new(Vec::new()));
        }
        match self {
            GraphNode::List(recs) => recs,
            _ => unreachable!(),
        }
    }

    /// All sub-volumes of this cell, using `cell` as the grid index:
    /// empty for covered, ordinal 0 only for fast-path regular, one entry
    /// per record otherwise.
    pub fn vofs(&self, cell: IntVect<D>) -> Vec<VolIndex<D>> {
        match self {
            GraphNode::Covered => Vec::new(),
            GraphNode::Regular => vec![VolIndex::new(cell, 0)],
            GraphNode::List(recs) => (0..recs.len() as u32)
                .map(|i| VolIndex::new(cell, i))
                .collect(),
        }
    }

    /// Faces leaving `vof` across its `(axis, side)` cell face, clipped
    /// against `domain`.
    ///
    /// An empty result is a boundary: the domain edge, a covered neighbor,
    /// or an empty arc list. One face per arc entry otherwise — a cut cell
    /// may see several neighbors through one cell face.
    ///
    /// # Panics
    /// Panics if `vof`'s ordinal names no sub-volume of this cell. That is a
    /// construction bug, not a data condition.
    pub fn faces(
        &self,
        vof: &VolIndex<D>,
        axis: usize,
        side: Side,
        domain: &IndexBox<D>,
    ) -> Vec<FaceIndex<D>> {
        assert!(axis < D, "axis {axis} out of range for dimension {D}");
        let neighbor_cell = vof.cell().shifted(axis, side);
        match self {
            GraphNode::Regular => {
                assert_eq!(
                    vof.vof(),
                    0,
                    "sub-volume {vof} not found: regular cell has only ordinal 0"
                );
                if domain.contains(neighbor_cell) {
                    let to = VolIndex::new(neighbor_cell, 0);
                    vec![FaceIndex::new(*vof, to, axis, side)]
                } else {
                    Vec::new()
                }
            }
            GraphNode::List(recs) => {
                let record = recs.get(vof.vof() as usize).unwrap_or_else(|| {
                    panic!(
                        "sub-volume {vof} not found: cell has {} record(s)",
                        recs.len()
                    )
                });
                if !domain.contains(neighbor_cell) {
                    return Vec::new();
                }
                record
                    .arcs(axis, side)
                    .iter()
                    .map(|&nbr| {
                        let to = VolIndex::new(neighbor_cell, nbr);
                        FaceIndex::new(*vof, to, axis, side)
                    })
                    .collect()
            }
            GraphNode::Covered => {
                panic!("sub-volume {vof} not found: cell is covered")
            }
        }
    }

    /// Map a sub-volume of this (fine) node to its address in the
    /// next-coarser graph (factor-of-two index transition).
    ///
    /// # Panics
    /// Panics if the ordinal names no sub-volume, or if no coarser link was
    /// recorded — i.e. the graph was not built by coarsening and the call
    /// order is wrong.
    pub fn coarsen(&self, fine_vof: &VolIndex<D>) -> VolIndex<D> {
        let coarse_cell = fine_vof.cell().coarsened(2);
        match self {
            GraphNode::Regular => {
                assert_eq!(
                    fine_vof.vof(),
                    0,
                    "sub-volume {fine_vof} not found: regular cell has only ordinal 0"
                );
                VolIndex::new(coarse_cell, 0)
            }
            GraphNode::List(_) => {
                let record = self.record(fine_vof.vof() as usize);
                let coarser = record.coarser.unwrap_or_else(|| {
                    panic!("no coarser link recorded for {fine_vof}; graph was not built by coarsening")
                });
                VolIndex::new(coarse_cell, coarser)
            }
            GraphNode::Covered => {
                panic!("sub-volume {fine_vof} not found: cell is covered")
            }
        }
    }

    /// The sub-volumes one level finer that coarsen to `coarse_vof`.
    /// Meaningful once the level builder has back-annotated finer links;
    /// for a fast-path regular node the answer is structural: every fine
    /// cell of the refined block at ordinal 0.
    pub fn refine(&self, coarse_vof: &VolIndex<D>) -> Vec<VolIndex<D>> {
        match self {
            GraphNode::Regular => {
                assert_eq!(
                    coarse_vof.vof(),
                    0,
                    "sub-volume {coarse_vof} not found: regular cell has only ordinal 0"
                );
                IndexBox::fine_block(coarse_vof.cell(), 2)
                    .cells()
                    .map(|c| VolIndex::new(c, 0))
                    .collect()
            }
            GraphNode::List(_) => self.record(coarse_vof.vof() as usize).finer.clone(),
            GraphNode::Covered => {
                panic!("sub-volume {coarse_vof} not found: cell is covered")
            }
        }
    }

    // --- builder API -------------------------------------------------------
    //
    // The level builder constructing graph level N from level N+1 writes
    // coarsen/refine links and validity marks through these accessors; they
    // require an explicit record list.

    /// The record for sub-volume `ordinal`.
    ///
    /// # Panics
    /// Panics if the node holds no record list or the ordinal is out of
    /// range.
    pub fn record(&self, ordinal: usize) -> &NodeRecord<D> {
        match self {
            GraphNode::List(recs) => recs.get(ordinal).unwrap_or_else(|| {
                panic!("sub-volume ordinal {ordinal} out of range ({} records)", recs.len())
            }),
            _ => panic!("no record list: cell is on the covered/regular fast path"),
        }
    }

    /// Mutable access to the record for sub-volume `ordinal`.
    ///
    /// # Panics
    /// Same conditions as [`GraphNode::record`].
    pub fn record_mut(&mut self, ordinal: usize) -> &mut NodeRecord<D> {
        match self {
            GraphNode::List(recs) => {
                let len = recs.len();
                recs.get_mut(ordinal).unwrap_or_else(|| {
                    panic!("sub-volume ordinal {ordinal} out of range ({len} records)")
                })
            }
            _ => panic!("no record list: cell is on the covered/regular fast path"),
        }
    }

    /// Record that sub-volume `ordinal` coarsens to ordinal `coarse` one
    /// level up.
    pub fn set_coarser(&mut self, ordinal: usize, coarse: u32) {
        self.record_mut(ordinal).coarser = Some(coarse);
    }

    /// Record a finer sub-volume that coarsens to `ordinal`.
    pub fn add_finer(&mut self, ordinal: usize, fine: VolIndex<D>) {
        self.record_mut(ordinal).finer.push(fine);
    }

    /// Soft-delete sub-volume `ordinal` for the duration of a
    /// connected-component pass.
    pub fn mark_invalid(&mut self, ordinal: usize) {
        self.record_mut(ordinal).is_valid = false;
    }

    // --- wire format -------------------------------------------------------

    /// Exact number of bytes [`GraphNode::linear_out`] will write.
    pub fn linear_size(&self) -> usize {
        match self {
            GraphNode::Covered | GraphNode::Regular => 1,
            GraphNode::List(recs) => {
                1 + 4 + recs.iter().map(NodeRecord::linear_size).sum::<usize>()
            }
        }
    }

    /// Serialize into `buf`: a state tag, then count + records for the list
    /// state.
    pub fn linear_out(&self, buf: &mut impl BufMut) {
        match self {
            GraphNode::Covered => buf.put_u8(TAG_COVERED),
            GraphNode::Regular => buf.put_u8(TAG_REGULAR),
            GraphNode::List(recs) => {
                buf.put_u8(TAG_LIST);
                buf.put_u32_le(recs.len() as u32);
                for rec in recs.iter() {
                    rec.linear_out(buf);
                }
            }
        }
    }

    /// Deserialize one node from `buf`, advancing it past the node.
    pub fn linear_in(buf: &mut impl Buf) -> Result<Self, GraphError> {
        if buf.remaining() < 1 {
            return Err(GraphError::TruncatedBuffer {
                needed: 1,
                remaining: 0,
            });
        }
        match buf.get_u8() {
            TAG_COVERED => Ok(GraphNode::Covered),
            TAG_REGULAR => Ok(GraphNode::Regular),
            TAG_LIST => {
                // Smallest possible record: header plus 2·D empty arc lists.
                let n = take_count(buf, 9 + 8 * D)?;
                let mut recs = Vec::with_capacity(n);
                for _ in 0..n {
                    recs.push(NodeRecord::linear_in(buf)?);
                }
                Ok(GraphNode::List(NodeList::new(recs)))
            }
            tag => Err(GraphError::InvalidNodeTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Node2 = GraphNode<2>;

    fn iv(c: [i32; 2]) -> IntVect<2> {
        IntVect(c)
    }

    fn domain4x4() -> IndexBox<2> {
        IndexBox::new(iv([0, 0]), iv([3, 3]))
    }

    #[test]
    fn default_is_regular_fast_path() {
        let node = Node2::default();
        assert!(node.is_regular());
        assert!(node.is_regular_with_unique_parent());
        assert!(!node.has_record_list());
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn state_classification_is_exclusive_and_exhaustive() {
        let mut node = Node2::default();
        for _ in 0..2 {
            node.define_as_covered();
            assert!(node.is_covered() && !node.is_regular() && !node.is_irregular());
            node.define_as_regular();
            assert!(!node.is_covered() && node.is_regular() && !node.is_irregular());
        }
        node.push_irregular_node(NodeRecord::new());
        assert!(!node.is_covered() && !node.is_regular() && node.is_irregular());
    }

    #[test]
    fn singleton_regular_record_is_regular_with_multi_valued_parent() {
        let mut node = Node2::default();
        node.push_irregular_node(NodeRecord::regular());
        assert!(node.is_regular());
        assert!(node.is_regular_with_multi_valued_parent());
        assert!(!node.is_regular_with_unique_parent());
        assert!(node.has_record_list());
        // A second record makes the cell irregular again.
        node.push_irregular_node(NodeRecord::new());
        assert!(node.is_irregular());
    }

    #[test]
    fn vofs_per_state() {
        let cell = iv([1, 2]);
        let mut node = Node2::default();
        assert_eq!(node.vofs(cell), vec![VolIndex::new(cell, 0)]);
        node.define_as_covered();
        assert!(node.vofs(cell).is_empty());
        node.push_irregular_node(NodeRecord::new());
        node.push_irregular_node(NodeRecord::new());
        assert_eq!(
            node.vofs(cell),
            vec![VolIndex::new(cell, 0), VolIndex::new(cell, 1)]
        );
    }

    #[test]
    fn regular_faces_clip_at_domain_edge() {
        let node = Node2::default();
        let corner = VolIndex::new(iv([0, 0]), 0);
        assert!(node.faces(&corner, 0, Side::Lo, &domain4x4()).is_empty());
        let inward = node.faces(&corner, 0, Side::Hi, &domain4x4());
        assert_eq!(inward.len(), 1);
        assert_eq!(inward[0].vof(Side::Hi), VolIndex::new(iv([1, 0]), 0));
    }

    #[test]
    fn list_faces_follow_arcs_and_boundary_is_empty() {
        let mut node = Node2::default();
        let mut rec = NodeRecord::new();
        rec.push_arc(0, Side::Hi, 1);
        rec.push_arc(0, Side::Hi, 2); // multi-valued neighbor
        node.push_irregular_node(rec);

        let vof = VolIndex::new(iv([1, 1]), 0);
        let faces = node.faces(&vof, 0, Side::Hi, &domain4x4());
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].vof(Side::Hi), VolIndex::new(iv([2, 1]), 1));
        assert_eq!(faces[1].vof(Side::Hi), VolIndex::new(iv([2, 1]), 2));
        // Empty arc list: boundary face, empty result, not an error.
        assert!(node.faces(&vof, 1, Side::Lo, &domain4x4()).is_empty());
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn unknown_ordinal_panics() {
        let mut node = Node2::default();
        node.push_irregular_node(NodeRecord::new());
        let bogus = VolIndex::new(iv([0, 0]), 7);
        let _ = node.faces(&bogus, 0, Side::Hi, &domain4x4());
    }

    #[test]
    fn coarsen_fast_path_and_linked_record() {
        let node = Node2::default();
        let fine = VolIndex::new(iv([5, -1]), 0);
        assert_eq!(node.coarsen(&fine), VolIndex::new(iv([2, -1]), 0));

        let mut cut = Node2::default();
        cut.push_irregular_node(NodeRecord::new());
        cut.set_coarser(0, 2);
        assert_eq!(
            cut.coarsen(&VolIndex::new(iv([4, 4]), 0)),
            VolIndex::new(iv([2, 2]), 2)
        );
    }

    #[test]
    #[should_panic(expected = "no coarser link")]
    fn coarsen_without_link_panics() {
        let mut node = Node2::default();
        node.push_irregular_node(NodeRecord::new());
        let _ = node.coarsen(&VolIndex::new(iv([0, 0]), 0));
    }

    #[test]
    fn refine_fast_path_yields_whole_block() {
        let node = Node2::default();
        let fine = node.refine(&VolIndex::new(iv([1, 1]), 0));
        assert_eq!(fine.len(), 4);
        assert!(fine.contains(&VolIndex::new(iv([2, 2]), 0)));
        assert!(fine.contains(&VolIndex::new(iv([3, 3]), 0)));
    }

    #[test]
    fn refine_reads_back_annotated_links() {
        let mut node = Node2::default();
        node.push_irregular_node(NodeRecord::new());
        let f0 = VolIndex::new(iv([2, 2]), 0);
        let f1 = VolIndex::new(iv([2, 3]), 1);
        node.add_finer(0, f0);
        node.add_finer(0, f1);
        assert_eq!(node.refine(&VolIndex::new(iv([1, 1]), 0)), vec![f0, f1]);
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let mut node = Node2::default();
        node.push_irregular_node(NodeRecord::new());
        let mut copy = node.clone();
        copy.record_mut(0).is_regular = true;
        copy.push_irregular_node(NodeRecord::new());
        assert_eq!(node.len(), 1);
        assert!(!node.record(0).is_regular);
        assert!(copy.record(0).is_regular);
    }

    #[test]
    fn add_irregular_node_at_ordinal_grows_list() {
        let mut node = Node2::default();
        node.add_irregular_node(NodeRecord::regular(), 2);
        assert_eq!(node.len(), 3);
        assert!(node.record(2).is_regular);
        assert!(!node.record(0).is_regular);
    }

    #[test]
    fn wire_roundtrip_all_states() {
        let covered = Node2::Covered;
        let regular = Node2::Regular;
        let mut cut = Node2::default();
        let mut rec = NodeRecord::new();
        rec.push_arc(1, Side::Lo, 0);
        rec.coarser = Some(1);
        cut.push_irregular_node(rec);
        cut.push_irregular_node(NodeRecord::regular());

        for node in [&covered, &regular, &cut] {
            let mut buf = Vec::new();
            node.linear_out(&mut buf);
            assert_eq!(buf.len(), node.linear_size());
            let back = Node2::linear_in(&mut buf.as_slice()).unwrap();
            assert_eq!(&back, node);
        }
    }

    #[test]
    fn wire_rejects_unknown_tag() {
        let buf = [9u8];
        assert_eq!(
            Node2::linear_in(&mut &buf[..]),
            Err(GraphError::InvalidNodeTag(9))
        );
    }

    #[test]
    fn define_as_regular_releases_list_repeatedly() {
        let mut node = Node2::default();
        for _ in 0..3 {
            node.push_irregular_node(NodeRecord::new());
            node.define_as_regular();
            assert!(node.is_regular_with_unique_parent());
            node.define_as_covered();
            assert!(node.is_covered());
        }
    }
}
