//! `IntVect` and `Side`: cell addressing primitives for structured grids.
//!
//! A structured embedded-boundary grid indexes cells by a D-dimensional
//! integer vector. All connectivity in this crate is expressed per
//! (axis, side) pair: axis `0..D`, side [`Side::Lo`] or [`Side::Hi`].
//!
//! This module provides:
//! - A transparent `IntVect<D>` newtype over `[i32; D]` with the arithmetic
//!   the graph needs (unit steps, power-of-two coarsening/refinement).
//! - The `Side` enum with sign/flip helpers and a both-sides iterator.
//! - Implementations of common traits (`Debug`, `Display`, ordering,
//!   hashing, serde) so addresses can be used in maps, sets, and printed.

use std::fmt;
use std::ops::{Add, Index, Sub};

/// Low or high side of a cell along one axis.
///
/// The arc storage of a node record is indexed by `(axis, side)`; see
/// [`crate::topology::node::NodeRecord::arc_index`].
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Side {
    /// Toward decreasing grid index.
    Lo,
    /// Toward increasing grid index.
    Hi,
}

impl Side {
    /// Both sides, low first. Iteration order is part of the determinism
    /// contract of the connected-component pass.
    pub const BOTH: [Side; 2] = [Side::Lo, Side::Hi];

    /// -1 for `Lo`, +1 for `Hi`.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Side::Lo => -1,
            Side::Hi => 1,
        }
    }

    /// The opposite side.
    #[inline]
    pub const fn flip(self) -> Side {
        match self {
            Side::Lo => Side::Hi,
            Side::Hi => Side::Lo,
        }
    }

    /// 0 for `Lo`, 1 for `Hi`.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Side::Lo => 0,
            Side::Hi => 1,
        }
    }
}

/// A D-dimensional integer grid index.
///
/// `IntVect` is a plain value type: `Copy`, totally ordered (lexicographic),
/// hashable, and serde-serializable. Ordering is load-bearing — the
/// connected-component extraction visits cells in `IntVect` order so that
/// coarse sub-volume numbering is reproducible across runs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVect<const D: usize>(pub [i32; D]);

// serde's built-in array impls stop at length 32 and do not cover const
// generics, so these impls spell out what `#[derive]` would emit for a
// concrete-size array: a newtype struct wrapping a D-tuple of i32.
impl<const D: usize> serde::Serialize for IntVect<D> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct ArrayRef<'a, const D: usize>(&'a [i32; D]);
        impl<const D: usize> serde::Serialize for ArrayRef<'_, D> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::SerializeTuple;
                let mut t = serializer.serialize_tuple(D)?;
                for c in self.0 {
                    t.serialize_element(c)?;
                }
                t.end()
            }
        }
        serializer.serialize_newtype_struct("IntVect", &ArrayRef(&self.0))
    }
}

impl<'de, const D: usize> serde::Deserialize<'de> for IntVect<D> {
    fn deserialize<De: serde::Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        struct ArrayVisitor<const D: usize>;
        impl<'de, const D: usize> serde::de::Visitor<'de> for ArrayVisitor<D> {
            type Value = [i32; D];
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an array of {D} integers")
            }
            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut out = [0i32; D];
                for (k, slot) in out.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(k, &self))?;
                }
                Ok(out)
            }
        }

        struct NewtypeVisitor<const D: usize>;
        impl<'de, const D: usize> serde::de::Visitor<'de> for NewtypeVisitor<D> {
            type Value = IntVect<D>;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "tuple struct IntVect")
            }
            fn visit_newtype_struct<De2: serde::Deserializer<'de>>(
                self,
                deserializer: De2,
            ) -> Result<Self::Value, De2::Error> {
                deserializer.deserialize_tuple(D, ArrayVisitor).map(IntVect)
            }
            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                seq: A,
            ) -> Result<Self::Value, A::Error> {
                ArrayVisitor.visit_seq(seq).map(IntVect)
            }
        }

        deserializer.deserialize_newtype_struct("IntVect", NewtypeVisitor)
    }
}

impl<const D: usize> IntVect<D> {
    /// The zero vector.
    #[inline]
    pub const fn zero() -> Self {
        IntVect([0; D])
    }

    /// All components equal to `v`.
    #[inline]
    pub const fn uniform(v: i32) -> Self {
        IntVect([v; D])
    }

    /// The index shifted by one cell along `axis` toward `side`.
    ///
    /// # Panics
    /// Panics if `axis >= D`.
    #[inline]
    pub fn shifted(self, axis: usize, side: Side) -> Self {
        self.offset(axis, side.sign())
    }

    /// The index shifted by `amount` cells along `axis`.
    ///
    /// # Panics
    /// Panics if `axis >= D`.
    #[inline]
    pub fn offset(mut self, axis: usize, amount: i32) -> Self {
        assert!(axis < D, "axis {axis} out of range for dimension {D}");
        self.0[axis] += amount;
        self
    }

    /// Componentwise floor division by a power-of-two refinement ratio,
    /// mapping a fine index to the coarse index space.
    ///
    /// Floor (not truncating) division keeps negative indices consistent:
    /// fine cell -1 coarsens to coarse cell -1 at ratio 2, not 0.
    ///
    /// # Panics
    /// Panics if `ratio` is not a power of two.
    #[inline]
    pub fn coarsened(self, ratio: u32) -> Self {
        assert!(ratio.is_power_of_two(), "refinement ratio {ratio} must be a power of two");
        IntVect(self.0.map(|c| c.div_euclid(ratio as i32)))
    }

    /// Componentwise multiplication by a power-of-two refinement ratio,
    /// mapping a coarse index to the lowest fine index it covers.
    ///
    /// # Panics
    /// Panics if `ratio` is not a power of two.
    #[inline]
    pub fn refined(self, ratio: u32) -> Self {
        assert!(ratio.is_power_of_two(), "refinement ratio {ratio} must be a power of two");
        IntVect(self.0.map(|c| c * ratio as i32))
    }
}

impl<const D: usize> Default for IntVect<D> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const D: usize> Index<usize> for IntVect<D> {
    type Output = i32;
    #[inline]
    fn index(&self, axis: usize) -> &i32 {
        &self.0[axis]
    }
}

impl<const D: usize> Add for IntVect<D> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o += r;
        }
        IntVect(out)
    }
}

impl<const D: usize> Sub for IntVect<D> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o -= r;
        }
        IntVect(out)
    }
}

impl<const D: usize> fmt::Debug for IntVect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntVect").field(&self.0).finish()
    }
}

/// Prints as `(i, j, ...)`.
impl<const D: usize> fmt::Display for IntVect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (k, c) in self.0.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}
