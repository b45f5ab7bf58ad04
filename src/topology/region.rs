//! `IndexBox`: a closed rectangular range of grid cells.
//!
//! The graph uses boxes in two roles: as the problem domain against which
//! directional queries are clipped, and as the 2^D fine block a single coarse
//! cell refines into during connected-component extraction.

use crate::topology::vect::IntVect;

/// A closed (inclusive on both ends) axis-aligned range of cells.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IndexBox<const D: usize> {
    lo: IntVect<D>,
    hi: IntVect<D>,
}

impl<const D: usize> IndexBox<D> {
    /// Box spanning `lo..=hi` per axis.
    ///
    /// # Panics
    /// Panics if `hi < lo` on any axis; an empty box has no meaning here.
    pub fn new(lo: IntVect<D>, hi: IntVect<D>) -> Self {
        for axis in 0..D {
            assert!(
                lo[axis] <= hi[axis],
                "degenerate box on axis {axis}: lo {lo} hi {hi}"
            );
        }
        IndexBox { lo, hi }
    }

    /// The single-cell box containing only `cell`.
    #[inline]
    pub fn single(cell: IntVect<D>) -> Self {
        IndexBox { lo: cell, hi: cell }
    }

    /// The block of fine cells that `coarse_cell` covers at the given
    /// power-of-two refinement ratio (`ratio^D` cells).
    pub fn fine_block(coarse_cell: IntVect<D>, ratio: u32) -> Self {
        let lo = coarse_cell.refined(ratio);
        IndexBox {
            lo,
            hi: lo + IntVect::uniform(ratio as i32 - 1),
        }
    }

    /// Lowest cell index (inclusive).
    #[inline]
    pub fn lo(&self) -> IntVect<D> {
        self.lo
    }

    /// Highest cell index (inclusive).
    #[inline]
    pub fn hi(&self) -> IntVect<D> {
        self.hi
    }

    /// Whether `cell` lies inside this box.
    #[inline]
    pub fn contains(&self, cell: IntVect<D>) -> bool {
        (0..D).all(|axis| self.lo[axis] <= cell[axis] && cell[axis] <= self.hi[axis])
    }

    /// The coarse image of this box at the given ratio.
    pub fn coarsened(&self, ratio: u32) -> Self {
        IndexBox {
            lo: self.lo.coarsened(ratio),
            hi: self.hi.coarsened(ratio),
        }
    }

    /// The fine image of this box at the given ratio.
    pub fn refined(&self, ratio: u32) -> Self {
        IndexBox {
            lo: self.lo.refined(ratio),
            hi: self.hi.refined(ratio) + IntVect::uniform(ratio as i32 - 1),
        }
    }

    /// Number of cells in the box.
    pub fn num_cells(&self) -> usize {
        (0..D)
            .map(|axis| (self.hi[axis] - self.lo[axis] + 1) as usize)
            .product()
    }

    /// Iterate the cells of the box in ascending `IntVect` (lexicographic)
    /// order. Component extraction relies on this order for reproducible
    /// sub-volume numbering.
    pub fn cells(&self) -> CellIter<D> {
        CellIter {
            bx: *self,
            next: Some(self.lo),
        }
    }
}

/// Lexicographic cell iterator for [`IndexBox`].
pub struct CellIter<const D: usize> {
    bx: IndexBox<D>,
    next: Option<IntVect<D>>,
}

impl<const D: usize> Iterator for CellIter<D> {
    type Item = IntVect<D>;

    fn next(&mut self) -> Option<IntVect<D>> {
        let cur = self.next?;
        // Odometer increment, last axis fastest, so output is sorted.
        let mut succ = cur;
        let mut axis = D;
        loop {
            if axis == 0 {
                self.next = None;
                break;
            }
            axis -= 1;
            if succ.0[axis] < self.bx.hi[axis] {
                succ.0[axis] += 1;
                self.next = Some(succ);
                break;
            }
            succ.0[axis] = self.bx.lo[axis];
        }
        Some(cur)
    }
}
