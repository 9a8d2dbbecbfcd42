use approx::assert_relative_eq;
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rapid_view::{
    ArrayStorage, ArrayView, DenseArray, Dim, ErrorKind, Shape, Stride, ViewError, AUTO,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn shape(sizes: &[usize]) -> Shape {
    Shape::from_sizes(sizes).unwrap()
}

fn make_array(sizes: &[usize]) -> DenseArray<f64> {
    let cols = *sizes.last().unwrap_or(&1);
    DenseArray::from_fn(shape(sizes), |idx| match idx {
        [] => 0.0,
        [.., i, j] => (i * cols + j) as f64,
        [j] => *j as f64,
    })
    .unwrap()
}

fn random_array(rng: &mut StdRng, max_rank: usize) -> DenseArray<f64> {
    let rank = rng.gen_range(1..=max_rank);
    let sizes: Vec<usize> = (0..rank).map(|_| rng.gen_range(1..=4)).collect();
    let total: usize = sizes.iter().product();
    let data: Vec<f64> = (0..total).map(|_| rng.gen_range(-10.0..10.0)).collect();
    DenseArray::from_vec(shape(&sizes), data).unwrap()
}

// ----------------------------------------------------------------------------
// Shape
// ----------------------------------------------------------------------------

#[test]
fn test_fixed_is_identity_without_inferred() {
    for sizes in [&[2usize, 3][..], &[4][..], &[1, 1, 7][..], &[][..]] {
        let s = shape(sizes);
        assert_eq!(s.fixed(s.size()).unwrap(), s);
    }
}

#[test]
fn test_fixed_scenario() {
    let s = Shape::new(&[Dim::Fixed(2), AUTO, Dim::Fixed(3)]).unwrap();
    assert_eq!(s.fixed(24).unwrap(), shape(&[2, 4, 3]));
    assert_eq!(s.fixed(25).unwrap_err().kind(), ErrorKind::UnresolvableShape);
}

#[test]
fn test_two_inferred_dims_rejected() {
    let err = Shape::new(&[AUTO, AUTO]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Construction);
}

#[test]
fn test_subshape_scenario() {
    assert_eq!(shape(&[3, 4]).subshape(1, 2).unwrap(), shape(&[4]));
}

// ----------------------------------------------------------------------------
// View access
// ----------------------------------------------------------------------------

#[test]
fn test_scalar_matches_flat_owner_index() {
    let a = DenseArray::from_vec(shape(&[2, 3]), vec![1, 2, 3, 4, 5, 6]).unwrap();
    let v = ArrayView::new(&a).unwrap();
    assert_eq!(v.stride().as_slice(), &[3, 1]);
    for i in 0..6 {
        assert_eq!(v.scalar(i).unwrap(), a.owner_scalar(v.offset() + i).unwrap());
    }
}

#[test]
fn test_index_bounds() {
    let a = make_array(&[4, 5]);
    let v = a.view();
    for i in [-3isize, -1, 4, 100] {
        assert_eq!(v.index(i).unwrap_err().kind(), ErrorKind::OutOfRange);
    }
    for i in 0..4 {
        assert_eq!(v.index(i).unwrap().ndim(), v.ndim() - 1);
    }
}

#[test]
fn test_scenario_index_and_assign() {
    init_logger();
    let mut a = DenseArray::from_vec(shape(&[2, 3]), vec![1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(a.view().index(1).unwrap().scalar(2).unwrap(), 6);

    a.index_mut(0)
        .unwrap()
        .into_index(0)
        .unwrap()
        .assign(99)
        .unwrap();
    assert_eq!(a.storage(), &[99, 2, 3, 4, 5, 6]);
}

#[test]
fn test_assign_visible_through_get_and_owner() {
    let mut a = DenseArray::<i32>::new(shape(&[3, 3])).unwrap();
    a.fill_from(1..=9).unwrap();

    let mut v = a.view_mut();
    let err = v.assign(5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);

    let mut s = v.index_mut(1).unwrap().into_index(2).unwrap();
    let offset = s.offset();
    s.assign(123).unwrap();
    assert_eq!(s.get().unwrap(), 123);
    assert_eq!(a.storage()[offset], 123);
}

#[test]
fn test_indexing_walkthrough() {
    let mut a = DenseArray::<i64>::new(shape(&[5, 3])).unwrap();
    a.fill_from(1..=15).unwrap();

    let rows = ["[1 2 3]", "[4 5 6]", "[7 8 9]", "[10 11 12]", "[13 14 15]"];
    for (i, expected) in rows.iter().enumerate() {
        assert_eq!(a.index(i as isize).unwrap().to_string(), *expected);
    }
    assert_eq!(a.view().index(1).unwrap().index(1).unwrap().to_string(), "5");

    a.index_mut(1).unwrap().into_index(2).unwrap().assign(123).unwrap();
    assert_eq!(a.index(1).unwrap().index(2).unwrap().get().unwrap(), 123);

    a.index_mut(0).unwrap().into_index(0).unwrap().assign(123).unwrap();
    a.index_mut(1).unwrap().into_index(1).unwrap().assign(456).unwrap();
    a.index_mut(2).unwrap().into_index(2).unwrap().assign(789).unwrap();
    assert_eq!(a.storage()[0], 123);
    assert_eq!(a.storage()[4], 456);
    assert_eq!(a.storage()[8], 789);

    let b = DenseArray::from_vec(shape(&[10]), (1..=10).collect::<Vec<i64>>()).unwrap();
    assert_eq!(b.index(0).unwrap().get().unwrap(), 1);
    assert_eq!(b.index(9).unwrap().get().unwrap(), 10);
}

#[test]
fn test_fill_row_by_row() {
    // Prime-sized so rows and columns never line up by accident
    let (rows, cols) = (37usize, 41usize);
    let mut a = DenseArray::<f64>::new(shape(&[rows, cols])).unwrap();
    for i in 0..rows {
        for j in 0..cols {
            a.index_mut(i as isize)
                .unwrap()
                .into_index(j as isize)
                .unwrap()
                .assign((j + i * cols + 1) as f64)
                .unwrap();
        }
    }
    let v = a.view();
    for k in 0..rows * cols {
        assert_relative_eq!(v.scalar(k).unwrap(), (k + 1) as f64, epsilon = 1e-12);
    }
}

// ----------------------------------------------------------------------------
// Evaluation
// ----------------------------------------------------------------------------

#[test]
fn test_eval_matches_scalar() {
    init_logger();
    let a = make_array(&[3, 4]);
    let v = a.view().index(2).unwrap();
    let e = v.eval().unwrap();
    assert_eq!(e.shape(), v.shape());
    for i in 0..v.len() {
        assert_relative_eq!(e.storage()[i], v.scalar(i).unwrap(), epsilon = 1e-12);
    }
}

#[test]
fn test_eval_does_not_alias_owner() {
    let a = make_array(&[2, 3]);
    let before = a.storage().to_vec();
    let mut e = a.view().eval().unwrap();
    e.storage_mut().iter_mut().for_each(|x| *x += 1.0);
    assert_eq!(a.storage(), &before[..]);
}

#[test]
fn test_eval_transposed_view() {
    let a = make_array(&[3, 5]);
    let base = a.view();
    let t = ArrayView::from_parts(
        &a,
        base.shape().reorder(&[1, 0]).unwrap(),
        base.stride().reorder(&[1, 0]).unwrap(),
        0,
    )
    .unwrap();
    let e = t.eval().unwrap();
    assert_eq!(e.shape(), &shape(&[5, 3]));
    for i in 0..5 {
        for j in 0..3 {
            assert_relative_eq!(
                e.storage()[i * 3 + j],
                a.storage()[j * 5 + i],
                epsilon = 1e-12
            );
        }
    }
}

#[test]
fn test_eval_strided_column() {
    let a = make_array(&[4, 3]);
    // Column 2 of a 4x3 row-major matrix
    let col = ArrayView::from_parts(&a, shape(&[4]), Stride::from_slice(&[3]).unwrap(), 2).unwrap();
    let e = col.eval().unwrap();
    assert_eq!(e.storage(), &[2.0, 5.0, 8.0, 11.0]);
}

#[test]
fn test_random_eval_matches_scalar() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..50 {
        let a = random_array(&mut rng, 5);
        let v = a.view();
        let e = v.eval().unwrap();
        assert_eq!(e.storage(), a.storage());
        for i in 0..v.len() {
            assert_relative_eq!(e.storage()[i], v.scalar(i).unwrap(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_random_permuted_eval_matches_scalar() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let a = random_array(&mut rng, 5);
        let base = a.view();
        let mut perm: Vec<usize> = (0..base.ndim()).collect();
        perm.shuffle(&mut rng);

        let v = ArrayView::from_parts(
            &a,
            base.shape().reorder(&perm).unwrap(),
            base.stride().reorder(&perm).unwrap(),
            0,
        )
        .unwrap();
        let e = v.eval().unwrap();
        assert_eq!(e.len(), a.len());
        for i in 0..v.len() {
            assert_relative_eq!(e.storage()[i], v.scalar(i).unwrap(), epsilon = 1e-12);
        }
    }
}

#[test]
fn test_random_narrowing_matches_eval_rows() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..30 {
        let a = random_array(&mut rng, 4);
        let v = a.view();
        let full = v.eval().unwrap();
        let lead = v.shape().extent(0).unwrap();
        let inner = v.len() / lead;
        for i in 0..lead {
            let row = v.index(i as isize).unwrap().eval().unwrap();
            assert_eq!(row.storage(), &full.storage()[i * inner..(i + 1) * inner]);
        }
    }
}

// ----------------------------------------------------------------------------
// Formatting
// ----------------------------------------------------------------------------

#[test]
fn test_string_formatting() {
    let mut a = DenseArray::<i32>::new(shape(&[2, 3])).unwrap();
    a.fill_from([1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(a.to_string(), "[[1 2 3]\n [4 5 6]]");

    a.fill_from([10]).unwrap();
    assert_eq!(a.view().to_string(), "[[10 2 3]\n [ 4 5 6]]");

    let mut c = DenseArray::<i32>::new(shape(&[2, 2, 2])).unwrap();
    c.fill_from([100, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(
        c.to_string(),
        "[[[100 2]\n  [  3 4]]\n\n [[  5 6]\n  [  7 8]]]"
    );
}

#[test]
fn test_errors_leave_owner_untouched() {
    let mut a = DenseArray::from_vec(shape(&[2, 2]), vec![1, 2, 3, 4]).unwrap();
    assert!(matches!(
        a.index_mut(2),
        Err(ViewError::IndexOutOfRange { index: 2, bound: 2 })
    ));
    assert!(a.reshape(shape(&[3])).is_err());
    assert_eq!(a.shape(), &shape(&[2, 2]));
    assert_eq!(a.storage(), &[1, 2, 3, 4]);
}
