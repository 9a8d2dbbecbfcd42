//! Bounded-rank shapes with at most one inferred dimension.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Result, ViewError, MAX_RANK};

// ============================================================================
// Dim
// ============================================================================

/// A single dimension: either a concrete size or one solved for later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Known size.
    Fixed(usize),
    /// Solved by [`Shape::fixed`] from a target element count.
    Inferred,
}

impl Dim {
    #[inline]
    pub fn is_inferred(&self) -> bool {
        matches!(self, Dim::Inferred)
    }

    /// The concrete size, or `None` for an inferred dimension.
    #[inline]
    pub fn size(&self) -> Option<usize> {
        match *self {
            Dim::Fixed(n) => Some(n),
            Dim::Inferred => None,
        }
    }

    /// Size contributed to a product: inferred dimensions count as 1.
    #[inline]
    pub(crate) fn factor(&self) -> usize {
        self.size().unwrap_or(1)
    }
}

impl From<usize> for Dim {
    fn from(n: usize) -> Self {
        Dim::Fixed(n)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{n}"),
            Dim::Inferred => f.write_str("AUTO"),
        }
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Check that `perm` is a permutation of `0..rank`.
pub(crate) fn validate_permutation(perm: &[usize], rank: usize) -> Result<()> {
    if perm.len() != rank {
        return Err(ViewError::RankMismatch(perm.len(), rank));
    }
    let mut seen = [false; MAX_RANK];
    for &p in perm {
        if p >= rank || seen[p] {
            return Err(ViewError::InvalidAxis { axis: p, rank });
        }
        seen[p] = true;
    }
    Ok(())
}

/// Check a `[start, end)` range against a rank.
pub(crate) fn validate_range(start: usize, end: usize, rank: usize) -> Result<()> {
    if start >= end {
        return Err(ViewError::EmptyRange { start, end });
    }
    if end > rank {
        return Err(ViewError::IndexOutOfRange {
            index: end as isize,
            bound: rank,
        });
    }
    Ok(())
}

// ============================================================================
// Shape
// ============================================================================

/// Ordered per-dimension sizes of a logical array.
///
/// Holds up to [`MAX_RANK`] dimensions inline. At most one of them may be
/// [`Dim::Inferred`]; [`Shape::fixed`] solves it against a total element
/// count. A rank-0 shape describes a scalar and has size 1.
#[derive(Clone, Copy)]
pub struct Shape {
    dims: [Dim; MAX_RANK],
    rank: usize,
    size: usize,
    inferred: bool,
}

impl Shape {
    /// Create a shape from explicit dimensions.
    pub fn new(dims: &[Dim]) -> Result<Self> {
        let mut shape = Self::with_rank(dims.len())?;
        shape.dims[..dims.len()].copy_from_slice(dims);
        shape.update()?;
        Ok(shape)
    }

    /// Create a shape from concrete sizes.
    pub fn from_sizes(sizes: &[usize]) -> Result<Self> {
        let mut shape = Self::with_rank(sizes.len())?;
        for (d, &n) in shape.dims.iter_mut().zip(sizes) {
            *d = Dim::Fixed(n);
        }
        shape.update()?;
        Ok(shape)
    }

    /// Shape of the given rank with every dimension set to 1.
    pub fn with_rank(rank: usize) -> Result<Self> {
        if rank > MAX_RANK {
            return Err(ViewError::RankTooLarge {
                rank,
                max: MAX_RANK,
            });
        }
        Ok(Self {
            dims: [Dim::Fixed(1); MAX_RANK],
            rank,
            size: 1,
            inferred: false,
        })
    }

    /// Shape of the given rank with every dimension set to 0.
    ///
    /// Mostly useful as a zeroed coordinate register.
    pub fn zeros(rank: usize) -> Result<Self> {
        let mut shape = Self::with_rank(rank)?;
        for d in &mut shape.dims[..rank] {
            *d = Dim::Fixed(0);
        }
        shape.update()?;
        Ok(shape)
    }

    /// Rank-0 shape.
    pub fn scalar() -> Self {
        Self {
            dims: [Dim::Fixed(1); MAX_RANK],
            rank: 0,
            size: 1,
            inferred: false,
        }
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.rank
    }

    /// Product of all dimensions, with an inferred dimension counting as 1.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn has_inferred(&self) -> bool {
        self.inferred
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.rank == 0
    }

    #[inline]
    pub fn dims(&self) -> &[Dim] {
        &self.dims[..self.rank]
    }

    /// Direct mutable access to the dimensions.
    ///
    /// [`Shape::update`] must be called afterwards; until then `size` and the
    /// inferred flag are stale.
    #[inline]
    pub fn dims_mut(&mut self) -> &mut [Dim] {
        &mut self.dims[..self.rank]
    }

    fn check_axis(&self, i: usize) -> Result<()> {
        if i >= self.rank {
            return Err(ViewError::IndexOutOfRange {
                index: i as isize,
                bound: self.rank,
            });
        }
        Ok(())
    }

    /// Dimension `i`.
    pub fn dim(&self, i: usize) -> Result<Dim> {
        self.check_axis(i)?;
        Ok(self.dims[i])
    }

    /// Replace dimension `i`. The shape is left untouched on failure.
    pub fn set_dim(&mut self, i: usize, dim: Dim) -> Result<()> {
        self.check_axis(i)?;
        let mut next = *self;
        next.dims[i] = dim;
        next.update()?;
        *self = next;
        Ok(())
    }

    /// Concrete size of dimension `i`.
    pub fn extent(&self, i: usize) -> Result<usize> {
        self.dim(i)?
            .size()
            .ok_or(ViewError::InferredDimension { axis: i })
    }

    /// Size of dimension `i` without range checks; inferred counts as 1.
    #[inline]
    pub(crate) fn extent_at(&self, i: usize) -> usize {
        self.dims[i].factor()
    }

    /// Concrete sizes of every dimension.
    pub fn to_sizes(&self) -> Result<Vec<usize>> {
        (0..self.rank).map(|i| self.extent(i)).collect()
    }

    /// Solve the inferred dimension so the shape holds `target` elements.
    ///
    /// Returns the shape unchanged when nothing is inferred. The cached size
    /// is recomputed first, so dimensions edited through [`Shape::dims_mut`]
    /// are honoured even without a call to [`Shape::update`].
    pub fn fixed(&self, target: usize) -> Result<Shape> {
        let mut res = *self;
        res.update()?;
        let Some(axis) = res.dims().iter().position(Dim::is_inferred) else {
            return Ok(res);
        };

        let product = res.size;
        if product == 0 || target % product != 0 {
            return Err(ViewError::Unresolvable {
                shape: self.to_string(),
                target,
            });
        }
        res.dims[axis] = Dim::Fixed(target / product);
        res.update()?;
        Ok(res)
    }

    /// Shape over the dimensions `[start, end)`.
    pub fn subshape(&self, start: usize, end: usize) -> Result<Shape> {
        validate_range(start, end, self.rank)?;
        Shape::new(&self.dims[start..end])
    }

    /// Shape with its dimensions permuted: `result[i] = self[perm[i]]`.
    pub fn reorder(&self, perm: &[usize]) -> Result<Shape> {
        validate_permutation(perm, self.rank)?;
        let mut res = *self;
        for (i, &p) in perm.iter().enumerate() {
            res.dims[i] = self.dims[p];
        }
        Ok(res)
    }

    /// Recompute `size` and the inferred flag from the dimensions.
    ///
    /// Fails if more than one dimension is inferred, or if the product of the
    /// non-zero dimensions does not fit in `isize`. On failure the cached
    /// `size` and flag are not touched.
    pub fn update(&mut self) -> Result<()> {
        let count = self.dims().iter().filter(|d| d.is_inferred()).count();
        if count > 1 {
            return Err(ViewError::MultipleInferred { count });
        }
        // Zero dims are skipped so every suffix product (the row-major
        // strides) stays addressable too.
        let mut span = 1usize;
        let mut empty = false;
        for d in self.dims() {
            match d.factor() {
                0 => empty = true,
                n => {
                    span = span
                        .checked_mul(n)
                        .filter(|&p| p <= isize::MAX as usize)
                        .ok_or(ViewError::SizeOverflow)?;
                }
            }
        }
        self.size = if empty { 0 } else { span };
        self.inferred = count == 1;
        Ok(())
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.inferred == other.inferred && self.dims() == other.dims()
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dims().hash(state);
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("dims", &self.dims())
            .field("size", &self.size)
            .field("inferred", &self.inferred)
            .finish()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Shape(")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d}")?;
        }
        f.write_str(")")
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = ViewError;

    fn try_from(sizes: &[usize]) -> Result<Self> {
        Shape::from_sizes(sizes)
    }
}

impl<const N: usize> TryFrom<[usize; N]> for Shape {
    type Error = ViewError;

    fn try_from(sizes: [usize; N]) -> Result<Self> {
        Shape::from_sizes(&sizes)
    }
}

// ============================================================================
// Tests
// ============================================================================
