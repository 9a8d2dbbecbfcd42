//! Strided multidimensional array views.
//!
//! This crate describes how an N-rank logical shape maps onto a flat element
//! buffer, how sub-views are carved out of an owning array without copying,
//! and how a view is materialized into a dense owned array.
//!
//! # Core Types
//!
//! - [`Shape`] / [`Dim`]: Bounded-rank extents with at most one inferred dimension
//! - [`Stride`]: Per-dimension element strides (row-major by default)
//! - [`ArrayView`] / [`ArrayViewMut`]: Zero-copy windows over an owner's storage
//! - [`ArrayStorage`]: The contract an owning array fulfils so views can borrow it
//! - [`DenseArray`]: Row-major owned array implementing [`ArrayStorage`]
//!
//! # Example
//!
//! ```rust
//! use rapid_view::{DenseArray, Shape};
//!
//! let mut a = DenseArray::from_vec(Shape::from_sizes(&[2, 3]).unwrap(), vec![1, 2, 3, 4, 5, 6])
//!     .unwrap();
//!
//! // Narrow by the leading dimension, then decode a linear index
//! assert_eq!(a.view().index(1).unwrap().scalar(2).unwrap(), 6);
//!
//! // Write through a scalar view
//! a.view_mut().into_index(0).unwrap().into_index(0).unwrap().assign(99).unwrap();
//! assert_eq!(a.storage(), &[99, 2, 3, 4, 5, 6]);
//!
//! // Materialize a row into a new, independent array
//! let row = a.view().index(1).unwrap().eval().unwrap();
//! assert_eq!(row.storage(), &[4, 5, 6]);
//! ```
//!
//! # Inferred Dimensions
//!
//! ```rust
//! use rapid_view::{Dim, Shape, AUTO};
//!
//! let s = Shape::new(&[Dim::Fixed(2), AUTO, Dim::Fixed(3)]).unwrap();
//! assert_eq!(s.fixed(24).unwrap(), Shape::from_sizes(&[2, 4, 3]).unwrap());
//! assert!(s.fixed(25).is_err());
//! ```

mod eval;
mod format;
mod scalar;
pub mod shape;
mod storage;
pub mod stride;
pub mod view;

pub use scalar::Element;
pub use shape::{Dim, Shape};
pub use storage::{ArrayStorage, DenseArray};
pub use stride::Stride;
pub use view::{ArrayView, ArrayViewMut};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of dimensions a [`Shape`] or [`Stride`] can hold.
pub const MAX_RANK: usize = 32;

/// Placeholder for a dimension whose size is solved later by [`Shape::fixed`].
pub const AUTO: Dim = Dim::Inferred;

// ============================================================================
// Error types
// ============================================================================

/// Semantic classification of a [`ViewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rank limit exceeded, more than one inferred dimension, or an empty range.
    Construction,
    /// An index, axis or address falls outside its valid range.
    OutOfRange,
    /// A scalar-only operation was attempted on a non-scalar view.
    InvalidOperation,
    /// An inferred dimension could not be solved for.
    UnresolvableShape,
    /// Two ranks or shapes that must agree do not.
    Mismatch,
}

/// Errors that can occur while building shapes or working with views.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// More dimensions than [`MAX_RANK`].
    #[error("cannot create a shape with {rank} dimensions, limit is {max}")]
    RankTooLarge { rank: usize, max: usize },

    /// More than one dimension is [`Dim::Inferred`].
    #[error("at most one inferred dimension is allowed, found {count}")]
    MultipleInferred { count: usize },

    /// The element count of a shape does not fit in `isize`.
    #[error("shape size overflows the addressable range")]
    SizeOverflow,

    /// A sub-range `[start, end)` with `start >= end`.
    #[error("cannot take a sub-range over [{start}, {end})")]
    EmptyRange { start: usize, end: usize },

    /// Index outside `[0, bound)`.
    #[error("index {index} out of range for dimension of size {bound}")]
    IndexOutOfRange { index: isize, bound: usize },

    /// Invalid or repeated axis in a permutation.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// A view would address memory outside its owner's storage.
    #[error("offset overflow while computing element address")]
    OffsetOverflow,

    /// Scalar access on a view whose rank is not zero.
    #[error("{0} requires a scalar view, found rank {1}")]
    NotScalar(&'static str, usize),

    /// Failed to convert a scalar to the requested type.
    #[error("failed to convert scalar to the requested type")]
    ScalarConversion,

    /// `fixed(target)` has no integer solution.
    #[error("could not resolve the inferred dimension of {shape} to fit {target} elements")]
    Unresolvable { shape: String, target: usize },

    /// A concrete size was requested from a dimension that is still inferred.
    #[error("dimension {axis} is inferred and has no concrete size")]
    InferredDimension { axis: usize },

    /// Ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Shapes are incompatible for the operation.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
}

impl ViewError {
    /// Semantic kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewError::RankTooLarge { .. }
            | ViewError::MultipleInferred { .. }
            | ViewError::EmptyRange { .. }
            | ViewError::SizeOverflow => ErrorKind::Construction,
            ViewError::IndexOutOfRange { .. }
            | ViewError::InvalidAxis { .. }
            | ViewError::OffsetOverflow => ErrorKind::OutOfRange,
            ViewError::NotScalar(..) | ViewError::ScalarConversion => {
                ErrorKind::InvalidOperation
            }
            ViewError::Unresolvable { .. } | ViewError::InferredDimension { .. } => {
                ErrorKind::UnresolvableShape
            }
            ViewError::RankMismatch(..) | ViewError::ShapeMismatch(..) => ErrorKind::Mismatch,
        }
    }
}

/// Result type for shape and view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
