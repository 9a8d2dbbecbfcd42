//! Per-dimension element strides.

use std::fmt;
use std::ops::Index;

use crate::shape::{validate_permutation, validate_range};
use crate::{Result, Shape, ViewError, MAX_RANK};

/// Element step per dimension, used to turn a coordinate into a storage offset.
///
/// Pairs with a [`Shape`] of the same rank. The canonical stride of a shape is
/// row-major: the last index varies fastest.
#[derive(Clone, Copy)]
pub struct Stride {
    strides: [isize; MAX_RANK],
    rank: usize,
}

impl Stride {
    /// Canonical row-major strides for `shape`.
    ///
    /// An inferred dimension counts as size 1. [`Shape::update`] keeps every
    /// suffix product within `isize`.
    pub fn from_shape(shape: &Shape) -> Self {
        let rank = shape.ndim();
        let mut strides = [0isize; MAX_RANK];
        if rank > 0 {
            strides[rank - 1] = 1;
            for i in (0..rank - 1).rev() {
                strides[i] = strides[i + 1] * shape.extent_at(i + 1) as isize;
            }
        }
        Self { strides, rank }
    }

    /// Explicit strides.
    pub fn from_slice(strides: &[isize]) -> Result<Self> {
        if strides.len() > MAX_RANK {
            return Err(ViewError::RankTooLarge {
                rank: strides.len(),
                max: MAX_RANK,
            });
        }
        let mut res = Self::empty();
        res.strides[..strides.len()].copy_from_slice(strides);
        res.rank = strides.len();
        Ok(res)
    }

    /// Rank-0 stride, paired with a scalar shape.
    pub fn empty() -> Self {
        Self {
            strides: [0; MAX_RANK],
            rank: 0,
        }
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn as_slice(&self) -> &[isize] {
        &self.strides[..self.rank]
    }

    /// Stride `i`, or `None` when `i >= ndim()`.
    #[inline]
    pub fn get(&self, i: usize) -> Option<isize> {
        self.as_slice().get(i).copied()
    }

    /// Strides over the dimensions `[start, end)`.
    pub fn subshape(&self, start: usize, end: usize) -> Result<Stride> {
        validate_range(start, end, self.rank)?;
        Stride::from_slice(&self.strides[start..end])
    }

    /// Strides permuted the same way [`Shape::reorder`] permutes sizes.
    pub fn reorder(&self, perm: &[usize]) -> Result<Stride> {
        validate_permutation(perm, self.rank)?;
        let mut res = *self;
        for (i, &p) in perm.iter().enumerate() {
            res.strides[i] = self.strides[p];
        }
        Ok(res)
    }

    /// Whether these are exactly the canonical strides of `shape`.
    pub fn is_canonical_for(&self, shape: &Shape) -> bool {
        *self == Stride::from_shape(shape)
    }
}

impl Index<usize> for Stride {
    type Output = isize;

    fn index(&self, i: usize) -> &isize {
        &self.as_slice()[i]
    }
}

impl PartialEq for Stride {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Stride {}

impl fmt::Debug for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stride").field(&self.as_slice()).finish()
    }
}

impl fmt::Display for Stride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stride(")?;
        for (i, s) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{s}")?;
        }
        f.write_str(")")
    }
}

impl From<&Shape> for Stride {
    fn from(shape: &Shape) -> Self {
        Stride::from_shape(shape)
    }
}
