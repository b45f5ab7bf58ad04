//! Connected-component extraction over a block of cells.
//!
//! When graph level N is built by coarsening level N+1, each coarse cell
//! subsumes a 2^D block of fine cells. The number of coarse sub-volumes the
//! block collapses into is the number of maximal connected components of the
//! fine sub-volumes under arc connectivity *restricted to the block*: a path
//! that detours outside the block does not connect two sub-volumes here.
//!
//! The ordering contract is strict so that coarse sub-volume numbering is
//! reproducible run to run: seeds are visited in ascending cell order then
//! ascending ordinal, components are emitted in order of their first-visited
//! seed, and members appear in breadth-first visit order.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::topology::graph_node::GraphNode;
use crate::topology::region::IndexBox;
use crate::topology::vect::{IntVect, Side};
use crate::topology::vof::VolIndex;

/// True when `vof` names a live (present and not soft-deleted) sub-volume of
/// `node`.
fn is_live<const D: usize>(node: &GraphNode<D>, vof: &VolIndex<D>) -> bool {
    match node {
        GraphNode::Covered => false,
        GraphNode::Regular => vof.vof() == 0,
        GraphNode::List(recs) => recs
            .get(vof.vof() as usize)
            .is_some_and(|rec| rec.is_valid),
    }
}

/// Partition the sub-volumes of `block` into maximal connected components.
///
/// Cells absent from `nodes` are treated as covered. Records marked invalid
/// are skipped entirely — they neither seed nor join a component. The block
/// is tiny in practice (2^D cells during coarsening), so a flood fill with a
/// seen-set is all this needs.
pub fn vof_sets<const D: usize>(
    nodes: &HashMap<IntVect<D>, GraphNode<D>>,
    block: &IndexBox<D>,
) -> Vec<Vec<VolIndex<D>>> {
    let mut components = Vec::new();
    let mut seen: HashSet<VolIndex<D>> = HashSet::new();

    for cell in block.cells() {
        let Some(node) = nodes.get(&cell) else {
            continue;
        };
        for seed in node.vofs(cell) {
            if !is_live(node, &seed) || seen.contains(&seed) {
                continue;
            }
            seen.insert(seed);
            let mut queue = VecDeque::from([seed]);
            let mut component = Vec::new();
            while let Some(vof) = queue.pop_front() {
                component.push(vof);
                let here = &nodes[&vof.cell()];
                for axis in 0..D {
                    for side in Side::BOTH {
                        // Clipping against the block keeps the walk inside it.
                        for face in here.faces(&vof, axis, side, block) {
                            let nbr = face.vof(side);
                            let Some(nbr_node) = nodes.get(&nbr.cell()) else {
                                continue;
                            };
                            if is_live(nbr_node, &nbr) && seen.insert(nbr) {
                                queue.push_back(nbr);
                            }
                        }
                    }
                }
            }
            components.push(component);
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::node::NodeRecord;

    fn iv(c: [i32; 2]) -> IntVect<2> {
        IntVect(c)
    }

    fn v(c: [i32; 2], ord: u32) -> VolIndex<2> {
        VolIndex::new(iv(c), ord)
    }

    fn regular_block_2x2() -> HashMap<IntVect<2>, GraphNode<2>> {
        IndexBox::new(iv([0, 0]), iv([1, 1]))
            .cells()
            .map(|c| (c, GraphNode::Regular))
            .collect()
    }

    #[test]
    fn fully_regular_block_is_one_component() {
        let nodes = regular_block_2x2();
        let block = IndexBox::new(iv([0, 0]), iv([1, 1]));
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 4);
        // Deterministic BFS order from the lexicographically first cell.
        assert_eq!(
            sets[0],
            vec![v([0, 0], 0), v([1, 0], 0), v([0, 1], 0), v([1, 1], 0)]
        );
    }

    #[test]
    fn regular_3d_block_is_one_component() {
        let block = IndexBox::new(IntVect([0, 0, 0]), IntVect([1, 1, 1]));
        let nodes: HashMap<_, GraphNode<3>> =
            block.cells().map(|c| (c, GraphNode::Regular)).collect();
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 8);
    }

    /// Two columns, each internally connected along axis 1 but with boundary
    /// faces along axis 0: two components.
    #[test]
    fn split_block_yields_two_components() {
        let mut nodes = HashMap::new();
        for x in 0..2 {
            for (y, other_y) in [(0, 1), (1, 0)] {
                let mut rec = NodeRecord::<2>::new();
                let side = if other_y > y { Side::Hi } else { Side::Lo };
                rec.push_arc(1, side, 0);
                let mut node = GraphNode::default();
                node.push_irregular_node(rec);
                nodes.insert(iv([x, y]), node);
            }
        }
        let block = IndexBox::new(iv([0, 0]), iv([1, 1]));
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], vec![v([0, 0], 0), v([0, 1], 0)]);
        assert_eq!(sets[1], vec![v([1, 0], 0), v([1, 1], 0)]);
    }

    #[test]
    fn connectivity_outside_block_does_not_count() {
        // All four cells regular, but the block restricted to one column:
        // the other column must not appear, and paths through it don't link.
        let nodes = regular_block_2x2();
        let column = IndexBox::new(iv([0, 0]), iv([0, 1]));
        let sets = vof_sets(&nodes, &column);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0], vec![v([0, 0], 0), v([0, 1], 0)]);
    }

    #[test]
    fn invalid_records_are_skipped() {
        let mut nodes = HashMap::new();
        for (cell, other) in [(iv([0, 0]), Side::Hi), (iv([0, 1]), Side::Lo)] {
            let mut rec = NodeRecord::<2>::new();
            rec.push_arc(1, other, 0);
            let mut node = GraphNode::default();
            node.push_irregular_node(rec);
            nodes.insert(cell, node);
        }
        nodes.get_mut(&iv([0, 1])).unwrap().mark_invalid(0);
        let block = IndexBox::new(iv([0, 0]), iv([0, 1]));
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets, vec![vec![v([0, 0], 0)]]);
    }

    #[test]
    fn missing_cells_are_covered() {
        let mut nodes = HashMap::new();
        nodes.insert(iv([0, 0]), GraphNode::<2>::Regular);
        nodes.insert(iv([1, 1]), GraphNode::<2>::Covered);
        let block = IndexBox::new(iv([0, 0]), iv([1, 1]));
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets, vec![vec![v([0, 0], 0)]]);
    }

    #[test]
    fn multi_valued_cell_splits_within_one_cell() {
        // Cell (0,0) is cut into two sub-volumes; ordinal 0 links right,
        // ordinal 1 is isolated. Three cells total, two components.
        let mut nodes = HashMap::new();
        let mut cut = GraphNode::<2>::default();
        let mut r0 = NodeRecord::new();
        r0.push_arc(0, Side::Hi, 0);
        cut.push_irregular_node(r0);
        cut.push_irregular_node(NodeRecord::new());
        nodes.insert(iv([0, 0]), cut);

        let mut right = GraphNode::<2>::default();
        let mut rr = NodeRecord::new();
        rr.push_arc(0, Side::Lo, 0);
        right.push_irregular_node(rr);
        nodes.insert(iv([1, 0]), right);

        let block = IndexBox::new(iv([0, 0]), iv([1, 0]));
        let sets = vof_sets(&nodes, &block);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], vec![v([0, 0], 0), v([1, 0], 0)]);
        assert_eq!(sets[1], vec![v([0, 0], 1)]);
    }
}
