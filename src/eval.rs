//! Odometer traversal used to materialize views.
//!
//! Every logical coordinate of a shape is visited once in row-major order
//! (last index fastest) while the physical position is updated incrementally:
//! a step on dimension `d` adds `stride[d]`, and a wrap of dimension `d` takes
//! back the `(dims[d] - 1) * stride[d]` accumulated on it. This is O(1)
//! amortized per element, unlike the mixed-radix decode behind
//! `ArrayView::scalar`, which is O(rank) per call.

use smallvec::{smallvec, SmallVec};

use crate::{Shape, Stride};

/// Coordinate registers stay inline for the common low ranks.
type Coords = SmallVec<[usize; 8]>;

/// Call `f` with the physical position of every element of the view
/// described by `shape`, `stride` and `offset`, in row-major logical order.
///
/// Shapes containing a zero-sized dimension visit nothing. A rank-0 shape
/// visits `offset` once.
pub(crate) fn walk(shape: &Shape, stride: &Stride, offset: usize, mut f: impl FnMut(usize)) {
    debug_assert_eq!(shape.ndim(), stride.ndim());
    if shape.size() == 0 {
        return;
    }
    let ndim = shape.ndim();
    let dims: Coords = (0..ndim).map(|i| shape.extent_at(i)).collect();
    let mut coord: Coords = smallvec![0; ndim];
    let mut p = offset as isize;

    loop {
        f(p as usize);

        let mut idim = 0;
        while idim < ndim {
            let adim = ndim - idim - 1;
            coord[adim] += 1;
            if coord[adim] == dims[adim] {
                coord[adim] = 0;
                p -= (dims[adim] as isize - 1) * stride[adim];
                idim += 1;
            } else {
                p += stride[adim];
                break;
            }
        }
        // Carry went past dimension 0: every coordinate has been visited.
        if idim == ndim {
            break;
        }
    }
}

/// Copy the elements addressed by a strided layout into a dense row-major buffer.
///
/// The caller guarantees every address reachable from `offset` through
/// `shape`/`stride` lies inside `storage`; views validate this when they are
/// built.
pub(crate) fn odometer_copy<T: Copy>(
    storage: &[T],
    shape: &Shape,
    stride: &Stride,
    offset: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(shape.size());
    walk(shape, stride, offset, |p| out.push(storage[p]));
    debug_assert_eq!(out.len(), shape.size());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(sizes: &[usize]) -> Shape {
        Shape::from_sizes(sizes).unwrap()
    }

    fn stride(s: &[isize]) -> Stride {
        Stride::from_slice(s).unwrap()
    }

    #[test]
    fn test_contiguous_is_identity() {
        let data: Vec<i32> = (0..24).collect();
        let s = shape(&[2, 3, 4]);
        let out = odometer_copy(&data, &s, &Stride::from_shape(&s), 0);
        assert_eq!(out, data);
    }

    #[test]
    fn test_transposed_walk() {
        // 2x3 row-major, walked as its 3x2 transpose
        let data = [1, 2, 3, 4, 5, 6];
        let out = odometer_copy(&data, &shape(&[3, 2]), &stride(&[1, 3]), 0);
        assert_eq!(out, vec![1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_offset_and_gaps() {
        // Column 1 of a 3x4 row-major matrix
        let data: Vec<i32> = (0..12).collect();
        let out = odometer_copy(&data, &shape(&[3]), &stride(&[4]), 1);
        assert_eq!(out, vec![1, 5, 9]);
    }

    #[test]
    fn test_negative_stride() {
        let data = [1, 2, 3, 4];
        let out = odometer_copy(&data, &shape(&[4]), &stride(&[-1]), 3);
        assert_eq!(out, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_rank_zero_visits_once() {
        let data = [7, 8, 9];
        let out = odometer_copy(&data, &Shape::scalar(), &Stride::empty(), 2);
        assert_eq!(out, vec![9]);
    }

    #[test]
    fn test_empty_shape_visits_nothing() {
        let data: [i32; 0] = [];
        let s = shape(&[3, 0, 2]);
        let out = odometer_copy(&data, &s, &Stride::from_shape(&s), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_walk_visits_each_position_once() {
        let s = shape(&[3, 1, 4, 2]);
        let mut seen = vec![0usize; s.size()];
        walk(&s, &Stride::from_shape(&s), 0, |p| seen[p] += 1);
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_size_one_dims_do_not_move() {
        let data = [10, 20, 30];
        // Broadcast-like zero stride on a size-1 axis
        let out = odometer_copy(&data, &shape(&[1, 3]), &stride(&[0, 1]), 0);
        assert_eq!(out, vec![10, 20, 30]);
    }
}
