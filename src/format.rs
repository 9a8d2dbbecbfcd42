//! Nested-bracket rendering of dense row-major data.
//!
//! Elements on the last axis are separated by a space and right-aligned to the
//! widest rendering in their column. Blocks at axis `k` are separated by
//! `rank - k - 1` newlines followed by `k + 1` spaces, so a `(2, 3)` array
//! renders as
//!
//! ```text
//! [[10 2 3]
//!  [ 4 5 6]]
//! ```

use crate::Shape;

/// Render `values`, laid out densely in row-major order over `shape`, using
/// `f` to turn each element into text.
///
/// A rank-0 shape renders the single value with no brackets.
pub(crate) fn render<T>(shape: &Shape, values: &[T], f: impl FnMut(&T) -> String) -> String {
    let cells: Vec<String> = values.iter().map(f).collect();
    let rank = shape.ndim();
    if rank == 0 {
        return cells.into_iter().next().unwrap_or_default();
    }
    let dims: Vec<usize> = (0..rank).map(|i| shape.extent_at(i)).collect();
    let last = dims[rank - 1];

    let mut widths = vec![0usize; last];
    for (i, cell) in cells.iter().enumerate() {
        let col = i % last;
        widths[col] = widths[col].max(cell.chars().count());
    }

    let mut out = String::new();
    render_block(&mut out, &cells, &widths, &dims, 0, 0);
    out
}

fn render_block(
    out: &mut String,
    cells: &[String],
    widths: &[usize],
    dims: &[usize],
    axis: usize,
    start: usize,
) {
    let rank = dims.len();
    let inner: usize = dims[axis + 1..].iter().product();
    out.push('[');
    for i in 0..dims[axis] {
        if i > 0 {
            if axis == rank - 1 {
                out.push(' ');
            } else {
                out.push_str(&"\n".repeat(rank - axis - 1));
                out.push_str(&" ".repeat(axis + 1));
            }
        }
        if axis == rank - 1 {
            let cell = &cells[start + i];
            out.push_str(&format!("{cell:>width$}", width = widths[i]));
        } else {
            render_block(out, cells, widths, dims, axis + 1, start + i * inner);
        }
    }
    out.push(']');
}
