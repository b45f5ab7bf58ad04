//! `VolIndex` and `FaceIndex`: addresses for sub-volumes and faces.
//!
//! When the embedded boundary cuts a cell, the cell holds one or more
//! control volumes ("VoFs"). A `VolIndex` names one of them: the grid index
//! of the cell plus the position of the sub-volume in the cell's current
//! record list. The ordinal is positional, not persistent — rebuilding a
//! cell's record list renumbers its VoFs.
//!
//! A `FaceIndex` names the directed face between two VoFs that are adjacent
//! along one axis. It stores the pair as (low side, high side) so that the
//! same physical face compares equal no matter which end it was built from.

use std::fmt;

use crate::topology::vect::{IntVect, Side};

/// Address of one sub-volume: grid cell plus ordinal within the cell.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct VolIndex<const D: usize> {
    cell: IntVect<D>,
    vof: u32,
}

impl<const D: usize> VolIndex<D> {
    #[inline]
    pub const fn new(cell: IntVect<D>, vof: u32) -> Self {
        VolIndex { cell, vof }
    }

    /// Grid index of the cell holding this sub-volume.
    #[inline]
    pub const fn cell(&self) -> IntVect<D> {
        self.cell
    }

    /// Ordinal of this sub-volume within its cell's record list.
    #[inline]
    pub const fn vof(&self) -> u32 {
        self.vof
    }
}

impl<const D: usize> fmt::Display for VolIndex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.cell, self.vof)
    }
}

/// Address of a directed face between two adjacent sub-volumes.
///
/// Stored normalized: `lo` is the sub-volume on the low side of the face,
/// `hi` on the high side, along `axis`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FaceIndex<const D: usize> {
    lo: VolIndex<D>,
    hi: VolIndex<D>,
    axis: u32,
}

impl<const D: usize> FaceIndex<D> {
    /// Face leaving `from` toward `to` on `side` of `axis`.
    ///
    /// # Panics
    /// Panics if `axis >= D` or if the two cells are not adjacent along
    /// `axis` on the stated side.
    pub fn new(from: VolIndex<D>, to: VolIndex<D>, axis: usize, side: Side) -> Self {
        assert!(axis < D, "axis {axis} out of range for dimension {D}");
        assert_eq!(
            to.cell(),
            from.cell().shifted(axis, side),
            "face endpoints {from} and {to} are not adjacent on axis {axis}"
        );
        let (lo, hi) = match side {
            Side::Hi => (from, to),
            Side::Lo => (to, from),
        };
        FaceIndex {
            lo,
            hi,
            axis: axis as u32,
        }
    }

    /// The sub-volume on the given side of the face.
    #[inline]
    pub const fn vof(&self, side: Side) -> VolIndex<D> {
        match side {
            Side::Lo => self.lo,
            Side::Hi => self.hi,
        }
    }

    /// Axis normal to the face.
    #[inline]
    pub const fn axis(&self) -> usize {
        self.axis as usize
    }
}

impl<const D: usize> fmt::Display for FaceIndex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} | {} @ axis {}]", self.lo, self.hi, self.axis)
    }
}
