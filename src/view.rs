//! Non-owning strided views over an [`ArrayStorage`] owner.
//!
//! Two view types express the aliasing contract through borrows:
//!
//! - [`ArrayView`]: shared borrow; any number may coexist
//! - [`ArrayViewMut`]: exclusive borrow; the only way to write through a view
//!
//! Both carry a [`Shape`], a [`Stride`] and an element offset into the owner's
//! storage. Copying a view copies this metadata only.

use std::fmt;

use log::{debug, trace};
use num_traits::{NumCast, ToPrimitive};
use smallvec::{smallvec, SmallVec};

use crate::eval::odometer_copy;
use crate::storage::ArrayStorage;
use crate::{format, Result, Shape, Stride, ViewError};

// ============================================================================
// Layout
// ============================================================================

/// Check that every address reachable through `shape`/`stride` from `offset`
/// lies in `[0, len)`.
fn validate_bounds(len: usize, shape: &Shape, stride: &Stride, offset: usize) -> Result<()> {
    if shape.ndim() != stride.ndim() {
        return Err(ViewError::RankMismatch(shape.ndim(), stride.ndim()));
    }
    if let Some(axis) = shape.dims().iter().position(|d| d.is_inferred()) {
        return Err(ViewError::InferredDimension { axis });
    }
    // Nothing is addressed
    if shape.size() == 0 {
        return Ok(());
    }
    let mut min_offset = offset as isize;
    let mut max_offset = offset as isize;
    for (i, &s) in stride.as_slice().iter().enumerate() {
        let dim = shape.extent_at(i);
        if dim > 1 {
            let end = s
                .checked_mul(dim as isize - 1)
                .ok_or(ViewError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(ViewError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset as usize >= len {
        return Err(ViewError::OffsetOverflow);
    }
    Ok(())
}

/// Shape, stride and offset of a view, independent of the owner.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Layout {
    shape: Shape,
    stride: Stride,
    offset: usize,
}

impl Layout {
    /// The whole of an owner with the given shape.
    fn whole(shape: Shape) -> Self {
        Self {
            stride: Stride::from_shape(&shape),
            shape,
            offset: 0,
        }
    }

    fn validated(len: usize, shape: Shape, stride: Stride, offset: usize) -> Result<Self> {
        validate_bounds(len, &shape, &stride, offset)?;
        Ok(Self {
            shape,
            stride,
            offset,
        })
    }

    fn require_scalar(&self, op: &'static str) -> Result<()> {
        if self.shape.ndim() != 0 {
            return Err(ViewError::NotScalar(op, self.shape.ndim()));
        }
        Ok(())
    }

    /// Sub-view `index` along the leading dimension.
    ///
    /// The leading axis is stepped with the canonical row-major stride of the
    /// view's shape, so a narrowed view addresses the owner as if the view
    /// were densely packed. The result is checked against `len`.
    fn narrow(&self, index: isize, len: usize) -> Result<Layout> {
        let ndim = self.shape.ndim();
        let bound = if ndim == 0 { 0 } else { self.shape.extent_at(0) };
        if index < 0 || index as usize >= bound {
            return Err(ViewError::IndexOutOfRange { index, bound });
        }

        let canonical = Stride::from_shape(&self.shape);
        let (shape, stride) = if ndim == 1 {
            (Shape::scalar(), Stride::empty())
        } else {
            (
                self.shape.subshape(1, ndim)?,
                canonical.subshape(1, ndim)?,
            )
        };
        let offset = self.offset + index as usize * canonical[0] as usize;
        trace!("narrow {} at {index}: offset {} -> {offset}", self.shape, self.offset);
        Layout::validated(len, shape, stride, offset)
    }

    /// Storage position of the element at `linear`, a row-major index over
    /// this layout's own shape.
    ///
    /// Decodes the index digit by digit from the last dimension, then takes
    /// the dot product with the stride. O(rank) per call.
    fn physical(&self, linear: usize) -> Result<usize> {
        let ndim = self.shape.ndim();
        if ndim == 0 {
            return Ok(self.offset);
        }
        if linear >= self.shape.size() {
            return Err(ViewError::IndexOutOfRange {
                index: linear as isize,
                bound: self.shape.size(),
            });
        }

        let mut coord: SmallVec<[usize; 8]> = smallvec![0; ndim];
        let mut index = linear;
        coord[ndim - 1] = index % self.shape.extent_at(ndim - 1);
        for i in (0..ndim - 1).rev() {
            index /= self.shape.extent_at(i + 1);
            coord[i] = index % self.shape.extent_at(i);
        }

        let mut p = self.offset as isize;
        for (i, &c) in coord.iter().enumerate() {
            p += c as isize * self.stride[i];
        }
        Ok(p as usize)
    }
}

fn cast<T: ToPrimitive, U: NumCast>(value: T) -> Result<U> {
    <U as NumCast>::from(value).ok_or(ViewError::ScalarConversion)
}

// ============================================================================
// ArrayView
// ============================================================================

/// Shared, non-owning view into an owner's storage.
///
/// The borrow ties the view to its owner: it cannot outlive it, and the owner
/// cannot be mutated while the view exists.
pub struct ArrayView<'a, A> {
    owner: &'a A,
    layout: Layout,
}

impl<A> Clone for ArrayView<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for ArrayView<'_, A> {}

impl<A> fmt::Debug for ArrayView<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayView")
            .field("shape", &self.layout.shape.dims())
            .field("stride", &self.layout.stride.as_slice())
            .field("offset", &self.layout.offset)
            .finish()
    }
}

impl<'a, A: ArrayStorage> ArrayView<'a, A> {
    /// View over the whole owner, with its shape and canonical stride.
    pub fn new(owner: &'a A) -> Result<Self> {
        let shape = *owner.owner_shape();
        let stride = Stride::from_shape(&shape);
        let layout = Layout::validated(owner.owner_storage().len(), shape, stride, 0)?;
        Ok(Self { owner, layout })
    }

    /// View with an explicit layout, e.g. a reordered or sliced one.
    ///
    /// Fails if any element the layout addresses lies outside the owner's
    /// storage.
    pub fn from_parts(owner: &'a A, shape: Shape, stride: Stride, offset: usize) -> Result<Self> {
        let layout = Layout::validated(owner.owner_storage().len(), shape, stride, offset)?;
        trace!("view {} {} at offset {offset}", layout.shape, layout.stride);
        Ok(Self { owner, layout })
    }

    /// Owners keep their shape consistent with their storage.
    pub(crate) fn whole(owner: &'a A) -> Self {
        Self {
            layout: Layout::whole(*owner.owner_shape()),
            owner,
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.layout.shape
    }

    #[inline]
    pub fn stride(&self) -> &Stride {
        &self.layout.stride
    }

    /// Offset, in elements, from the owner's first element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.shape.ndim()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.shape.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn owner(&self) -> &'a A {
        self.owner
    }

    /// Sub-view `index` along the leading dimension.
    pub fn index(&self, index: isize) -> Result<ArrayView<'a, A>> {
        self.into_index(index)
    }

    /// Same as [`ArrayView::index`], consuming the view.
    pub fn into_index(self, index: isize) -> Result<ArrayView<'a, A>> {
        let layout = self
            .layout
            .narrow(index, self.owner.owner_storage().len())?;
        Ok(Self {
            owner: self.owner,
            layout,
        })
    }

    /// The element of a rank-0 view.
    pub fn get(&self) -> Result<A::Scalar> {
        self.layout.require_scalar("get")?;
        self.owner.owner_scalar(self.layout.offset)
    }

    /// The element of a rank-0 view, converted to `U`.
    pub fn get_as<U: NumCast>(&self) -> Result<U>
    where
        A::Scalar: ToPrimitive,
    {
        cast(self.get()?)
    }

    /// Element at a row-major linear index over this view's own shape.
    pub fn scalar(&self, linear: usize) -> Result<A::Scalar> {
        self.owner.owner_scalar(self.layout.physical(linear)?)
    }

    /// Copy the viewed elements into a new, independent owner.
    pub fn eval(&self) -> Result<A> {
        let data = odometer_copy(
            self.owner.owner_storage(),
            &self.layout.shape,
            &self.layout.stride,
            self.layout.offset,
        );
        debug!(
            "eval {} {} at offset {}: {} elements",
            self.layout.shape,
            self.layout.stride,
            self.layout.offset,
            data.len()
        );
        A::from_shape_vec(self.layout.shape, data)
    }

    /// Render with a custom element formatter.
    pub fn to_string_with(&self, f: impl FnMut(&A::Scalar) -> String) -> String {
        let data = odometer_copy(
            self.owner.owner_storage(),
            &self.layout.shape,
            &self.layout.stride,
            self.layout.offset,
        );
        format::render(&self.layout.shape, &data, f)
    }
}

impl<A: ArrayStorage> fmt::Display for ArrayView<'_, A>
where
    A::Scalar: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(|x| x.to_string()))
    }
}

// ============================================================================
// ArrayViewMut
// ============================================================================

/// Exclusive, non-owning view into an owner's storage.
///
/// Writes go straight to the owner and are visible through it once the view
/// is dropped.
pub struct ArrayViewMut<'a, A> {
    owner: &'a mut A,
    layout: Layout,
}

impl<A> fmt::Debug for ArrayViewMut<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayViewMut")
            .field("shape", &self.layout.shape.dims())
            .field("stride", &self.layout.stride.as_slice())
            .field("offset", &self.layout.offset)
            .finish()
    }
}

impl<'a, A: ArrayStorage> ArrayViewMut<'a, A> {
    /// Mutable view over the whole owner.
    pub fn new(owner: &'a mut A) -> Result<Self> {
        let shape = *owner.owner_shape();
        let stride = Stride::from_shape(&shape);
        let layout = Layout::validated(owner.owner_storage().len(), shape, stride, 0)?;
        Ok(Self { owner, layout })
    }

    /// Mutable view with an explicit layout.
    pub fn from_parts(
        owner: &'a mut A,
        shape: Shape,
        stride: Stride,
        offset: usize,
    ) -> Result<Self> {
        let layout = Layout::validated(owner.owner_storage().len(), shape, stride, offset)?;
        trace!("view_mut {} {} at offset {offset}", layout.shape, layout.stride);
        Ok(Self { owner, layout })
    }

    pub(crate) fn whole(owner: &'a mut A) -> Self {
        Self {
            layout: Layout::whole(*owner.owner_shape()),
            owner,
        }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.layout.shape
    }

    #[inline]
    pub fn stride(&self) -> &Stride {
        &self.layout.stride
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.shape.ndim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.shape.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reborrow as a shared view.
    pub fn as_view(&self) -> ArrayView<'_, A> {
        ArrayView {
            owner: &*self.owner,
            layout: self.layout,
        }
    }

    /// Reborrow as a shorter-lived mutable view.
    pub fn reborrow(&mut self) -> ArrayViewMut<'_, A> {
        ArrayViewMut {
            owner: &mut *self.owner,
            layout: self.layout,
        }
    }

    /// Mutable sub-view `index` along the leading dimension, borrowing `self`.
    pub fn index_mut(&mut self, index: isize) -> Result<ArrayViewMut<'_, A>> {
        self.reborrow().into_index(index)
    }

    /// Mutable sub-view `index` along the leading dimension, consuming `self`.
    pub fn into_index(self, index: isize) -> Result<ArrayViewMut<'a, A>> {
        let layout = self
            .layout
            .narrow(index, self.owner.owner_storage().len())?;
        Ok(Self {
            owner: self.owner,
            layout,
        })
    }

    /// Write the element of a rank-0 view.
    pub fn assign(&mut self, value: A::Scalar) -> Result<()> {
        self.layout.require_scalar("assign")?;
        self.owner.owner_storage_mut()[self.layout.offset] = value;
        Ok(())
    }

    /// Write the element at a row-major linear index over this view's shape.
    pub fn set_scalar(&mut self, linear: usize, value: A::Scalar) -> Result<()> {
        let p = self.layout.physical(linear)?;
        self.owner.owner_storage_mut()[p] = value;
        Ok(())
    }

    pub fn get(&self) -> Result<A::Scalar> {
        self.as_view().get()
    }

    pub fn get_as<U: NumCast>(&self) -> Result<U>
    where
        A::Scalar: ToPrimitive,
    {
        self.as_view().get_as()
    }

    pub fn scalar(&self, linear: usize) -> Result<A::Scalar> {
        self.as_view().scalar(linear)
    }

    pub fn eval(&self) -> Result<A> {
        self.as_view().eval()
    }

    pub fn to_string_with(&self, f: impl FnMut(&A::Scalar) -> String) -> String {
        self.as_view().to_string_with(f)
    }
}

impl<A: ArrayStorage> fmt::Display for ArrayViewMut<'_, A>
where
    A::Scalar: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_view(), f)
    }
}

// ============================================================================
// Tests
// ============================================================================
