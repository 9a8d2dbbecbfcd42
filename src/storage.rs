//! Owning arrays that views borrow from.

use std::fmt;

use log::debug;

use crate::view::{ArrayView, ArrayViewMut};
use crate::{format, Element, Result, Shape, ViewError};

// ============================================================================
// ArrayStorage
// ============================================================================

/// Contract between an owning array and the views that borrow it.
///
/// Storage is linear and addressed by absolute element position; its length
/// must equal `owner_shape().size()`, and the owner's shape must not contain
/// an inferred dimension.
pub trait ArrayStorage: Sized {
    type Scalar: Element;

    /// Current shape of the owner.
    fn owner_shape(&self) -> &Shape;

    /// All elements in storage order.
    fn owner_storage(&self) -> &[Self::Scalar];

    /// All elements in storage order, mutably.
    fn owner_storage_mut(&mut self) -> &mut [Self::Scalar];

    /// Element at an absolute storage position.
    fn owner_scalar(&self, index: usize) -> Result<Self::Scalar> {
        let storage = self.owner_storage();
        storage
            .get(index)
            .copied()
            .ok_or(ViewError::IndexOutOfRange {
                index: index as isize,
                bound: storage.len(),
            })
    }

    /// Build a new owner from a shape and densely packed row-major data.
    fn from_shape_vec(shape: Shape, data: Vec<Self::Scalar>) -> Result<Self>;
}

// ============================================================================
// DenseArray
// ============================================================================

/// Owned, densely packed, row-major array.
#[derive(Clone, PartialEq)]
pub struct DenseArray<T> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: fmt::Debug> fmt::Debug for DenseArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseArray")
            .field("shape", &self.shape.dims())
            .field("data", &self.data)
            .finish()
    }
}

/// Reject shapes that still carry an inferred dimension.
/// Copy of `shape` with a freshly computed size and no inferred dimension.
fn resolved(shape: &Shape) -> Result<Shape> {
    let mut shape = *shape;
    shape.update()?;
    match shape.dims().iter().position(|d| d.is_inferred()) {
        Some(axis) => Err(ViewError::InferredDimension { axis }),
        None => Ok(shape),
    }
}

impl<T: Element> DenseArray<T> {
    /// Array filled with `T::default()`.
    pub fn new(shape: Shape) -> Result<Self> {
        Self::filled(shape, T::default())
    }

    /// Array filled with `value`.
    pub fn filled(shape: Shape, value: T) -> Result<Self> {
        let shape = resolved(&shape)?;
        Ok(Self {
            data: vec![value; shape.size()],
            shape,
        })
    }

    /// Array over existing row-major data.
    ///
    /// An inferred dimension in `shape` is solved against `data.len()`, and
    /// the element count is recomputed from the dimensions themselves.
    pub fn from_vec(shape: Shape, data: Vec<T>) -> Result<Self> {
        let shape = shape.fixed(data.len())?;
        if shape.size() != data.len() {
            return Err(ViewError::ShapeMismatch(
                shape.to_sizes()?,
                vec![data.len()],
            ));
        }
        Ok(Self { data, shape })
    }

    /// Array with values produced by a function of the row-major coordinate.
    pub fn from_fn(shape: Shape, mut f: impl FnMut(&[usize]) -> T) -> Result<Self> {
        let shape = resolved(&shape)?;
        let dims = shape.to_sizes()?;
        let rank = dims.len();
        let total = shape.size();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < dims[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Ok(Self { data, shape })
    }

    /// Overwrite elements in storage order from `values`.
    ///
    /// Fewer values than elements leaves the tail untouched. More values than
    /// elements is an error and nothing is written.
    pub fn fill_from(&mut self, values: impl IntoIterator<Item = T>) -> Result<()> {
        let len = self.data.len();
        let values: Vec<T> = values.into_iter().take(len + 1).collect();
        if values.len() > len {
            return Err(ViewError::ShapeMismatch(vec![len], vec![values.len()]));
        }
        self.data[..values.len()].copy_from_slice(&values);
        Ok(())
    }

    /// Change the shape without moving data.
    ///
    /// An inferred dimension is solved against the current element count.
    pub fn reshape(&mut self, shape: Shape) -> Result<()> {
        let shape = shape.fixed(self.data.len())?;
        if shape.size() != self.data.len() {
            return Err(ViewError::ShapeMismatch(
                shape.to_sizes()?,
                self.shape.to_sizes()?,
            ));
        }
        debug!("reshape {} -> {}", self.shape, shape);
        self.shape = shape;
        Ok(())
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn storage(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn storage_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element at a storage position.
    pub fn scalar(&self, index: usize) -> Result<T> {
        self.owner_scalar(index)
    }

    /// Shared view over the whole array.
    pub fn view(&self) -> ArrayView<'_, Self> {
        ArrayView::whole(self)
    }

    /// Exclusive view over the whole array.
    pub fn view_mut(&mut self) -> ArrayViewMut<'_, Self> {
        ArrayViewMut::whole(self)
    }

    /// Sub-array `index` along the leading dimension.
    pub fn index(&self, index: isize) -> Result<ArrayView<'_, Self>> {
        self.view().into_index(index)
    }

    /// Mutable sub-array `index` along the leading dimension.
    pub fn index_mut(&mut self, index: isize) -> Result<ArrayViewMut<'_, Self>> {
        self.view_mut().into_index(index)
    }

    /// Render with a custom element formatter.
    pub fn to_string_with(&self, f: impl FnMut(&T) -> String) -> String {
        format::render(&self.shape, &self.data, f)
    }
}

impl<T: Element> ArrayStorage for DenseArray<T> {
    type Scalar = T;

    fn owner_shape(&self) -> &Shape {
        &self.shape
    }

    fn owner_storage(&self) -> &[T] {
        &self.data
    }

    fn owner_storage_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn from_shape_vec(shape: Shape, data: Vec<T>) -> Result<Self> {
        Self::from_vec(shape, data)
    }
}

impl<T: Element + fmt::Display> fmt::Display for DenseArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(|x| x.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
