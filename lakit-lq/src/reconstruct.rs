use dyn_stack::{SizeOverflow, StackReq};
use lakit_core::{
    access_denied,
    householder::{apply_block_householder, apply_block_householder_req},
    is_real, AccessPolicy, ComplexField, Direction, KernelError, MatMut, MatRef, Op, Side, StoreV,
};
use reborrow::*;

/// Computes the size and alignment of the workspace required by [`apply_q`].
pub fn apply_q_req<T: 'static>(
    side: Side,
    nrows: usize,
    ncols: usize,
    blocksize: usize,
) -> Result<StackReq, SizeOverflow> {
    apply_block_householder_req::<T>(side, nrows, ncols, blocksize)
}

/// Computes the size and alignment of the workspace required by [`reconstruct_q`].
pub fn reconstruct_q_req<T: 'static>(
    n: usize,
    blocksize: usize,
) -> Result<StackReq, SizeOverflow> {
    apply_q_req::<T>(Side::Left, n, n, blocksize)
}

/// Checks the arguments of [`apply_q`], and returns the operation to apply to each block.
fn check_apply_q<T: ComplexField>(
    side: Side,
    op: Op,
    lq_factors: MatRef<'_, T>,
    tt: MatRef<'_, T>,
    blocksize: usize,
    matrix: &MatMut<'_, T>,
    work: &MatMut<'_, T>,
) -> Result<Op, KernelError> {
    let n = lq_factors.ncols();
    let size = Ord::min(lq_factors.nrows(), n);
    let max_ib = Ord::min(blocksize, size);

    // Q = H_{k-1}^H ... H_0^H is a product of adjoint blocks
    let block_op = match op {
        Op::NoTrans => Op::ConjTrans,
        Op::ConjTrans => Op::NoTrans,
        Op::Trans if is_real::<T>() => Op::NoTrans,
        Op::Trans => return Err(KernelError::InvalidArgument { arg: "op" }),
    };
    if blocksize == 0 && size > 0 {
        return Err(KernelError::InvalidArgument { arg: "blocksize" });
    }
    if tt.nrows() < size || tt.ncols() < max_ib {
        return Err(KernelError::InvalidArgument { arg: "tt" });
    }

    let (extent, other) = match side {
        Side::Left => (matrix.nrows(), matrix.ncols()),
        Side::Right => (matrix.ncols(), matrix.nrows()),
    };
    if extent != n {
        return Err(KernelError::InvalidArgument { arg: "matrix" });
    }
    if work.nrows() < other || work.ncols() < max_ib {
        return Err(KernelError::InvalidArgument { arg: "work" });
    }
    if access_denied(AccessPolicy::Dense, matrix.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "matrix" });
    }
    if access_denied(AccessPolicy::Dense, work.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "work" });
    }

    Ok(block_op)
}

/// Applies the unitary factor $Q$ of an LQ factorization computed by
/// [`lq_in_place`](crate::compute::lq_in_place), or its adjoint, to `matrix` in place:
/// `op(Q)·matrix` for [`Side::Left`] and `matrix·op(Q)` for [`Side::Right`].
///
/// `lq_factors` and `tt` are the outputs of the factorization, which must have been computed
/// with the same `blocksize`. $Q$ is `n×n`, where `n` is the number of columns of `lq_factors`.
/// `work` must have at least `blocksize` columns, and as many rows as `matrix` has columns
/// ([`Side::Left`]) or rows ([`Side::Right`]).
///
/// # Errors
///
/// - [`KernelError::InvalidArgument`] if `op` is [`Op::Trans`] and `T` is not real, if
///   `blocksize` is zero, or if a dimension does not match.
/// - [`KernelError::AccessDenied`] if `matrix` or `work` is not densely writable.
pub fn apply_q<T: ComplexField>(
    side: Side,
    op: Op,
    lq_factors: MatRef<'_, T>,
    tt: MatRef<'_, T>,
    blocksize: usize,
    mut matrix: MatMut<'_, T>,
    mut work: MatMut<'_, T>,
) -> Result<(), KernelError> {
    let block_op = check_apply_q(side, op, lq_factors, tt, blocksize, &matrix, &work)?;

    let n = lq_factors.ncols();
    let size = Ord::min(lq_factors.nrows(), n);
    if size == 0 {
        return Ok(());
    }
    let other = match side {
        Side::Left => matrix.ncols(),
        Side::Right => matrix.nrows(),
    };

    let mut apply_block = |j: usize| {
        let ib = Ord::min(blocksize, size - j);
        let target = match side {
            Side::Left => matrix.rb_mut().submatrix(j, 0, n - j, other),
            Side::Right => matrix.rb_mut().submatrix(0, j, other, n - j),
        };
        apply_block_householder(
            side,
            block_op,
            Direction::Forward,
            StoreV::Rowwise,
            lq_factors.submatrix(j, j, ib, n - j),
            tt.submatrix(j, 0, ib, ib),
            target,
            work.rb_mut(),
        )
    };

    let blocks = (0..size).step_by(blocksize);
    match (side, block_op) {
        (Side::Left, Op::ConjTrans) | (Side::Right, Op::NoTrans) => {
            for j in blocks {
                apply_block(j)?;
            }
        }
        _ => {
            for j in blocks.rev() {
                apply_block(j)?;
            }
        }
    }

    Ok(())
}

/// Computes the explicit `n×n` unitary factor $Q$ of an LQ factorization, and stores it in `q`.
///
/// See [`apply_q`] for the requirements on `lq_factors`, `tt`, `blocksize` and `work`.
pub fn reconstruct_q<T: ComplexField>(
    lq_factors: MatRef<'_, T>,
    tt: MatRef<'_, T>,
    blocksize: usize,
    mut q: MatMut<'_, T>,
    work: MatMut<'_, T>,
) -> Result<(), KernelError> {
    let n = lq_factors.ncols();
    if q.nrows() != n || q.ncols() != n {
        return Err(KernelError::InvalidArgument { arg: "q" });
    }
    check_apply_q(Side::Left, Op::NoTrans, lq_factors, tt, blocksize, &q, &work)?;

    q.rb_mut().fill(T::zero());
    q.rb_mut().diagonal().fill(T::one());
    apply_q(Side::Left, Op::NoTrans, lq_factors, tt, blocksize, q, work)
}

/// Copies the lower trapezoidal factor $L$ of an LQ factorization to `l`, which must be
/// `m×min(m, n)`. The entries above the diagonal are set to zero.
pub fn reconstruct_l<T: ComplexField>(
    lq_factors: MatRef<'_, T>,
    mut l: MatMut<'_, T>,
) -> Result<(), KernelError> {
    let m = lq_factors.nrows();
    let size = Ord::min(m, lq_factors.ncols());
    if l.nrows() != m || l.ncols() != size {
        return Err(KernelError::InvalidArgument { arg: "l" });
    }
    if access_denied(AccessPolicy::Dense, l.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "l" });
    }

    for j in 0..size {
        for i in 0..m {
            l[(i, j)] = if i >= j { lq_factors[(i, j)] } else { T::zero() };
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::lq_in_place_with_stack;
    use assert2::assert as fancy_assert;
    use dyn_stack::{DynStack, GlobalMemBuffer};
    use lakit_core::{c64, Mat};
    use rand::prelude::*;
    use std::cell::RefCell;

    thread_local! {
        static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
    }

    fn random_value() -> c64 {
        RNG.with(|rng| {
            let mut rng = rng.borrow_mut();
            let rng = &mut *rng;
            c64::new(rng.gen(), rng.gen())
        })
    }

    fn random_mat(m: usize, n: usize) -> Mat<c64> {
        Mat::with_dims(m, n, |_, _| random_value())
    }

    fn factorize(a: &Mat<c64>, blocksize: usize) -> (Mat<c64>, Mat<c64>) {
        let m = a.nrows();
        let n = a.ncols();
        let mut factors = a.clone();
        let mut tt = Mat::zeros(m, blocksize);
        let mut mem = GlobalMemBuffer::new(
            crate::compute::lq_in_place_req::<c64>(m, n, blocksize).unwrap(),
        );
        lq_in_place_with_stack(
            factors.as_mut(),
            tt.as_mut(),
            blocksize,
            DynStack::new(&mut mem),
        )
        .unwrap();
        (factors, tt)
    }

    fn apply(
        side: Side,
        op: Op,
        factors: &Mat<c64>,
        tt: &Mat<c64>,
        blocksize: usize,
        matrix: &mut Mat<c64>,
    ) {
        let other = match side {
            Side::Left => matrix.ncols(),
            Side::Right => matrix.nrows(),
        };
        let mut work = Mat::zeros(other, blocksize);
        apply_q(
            side,
            op,
            factors.as_ref(),
            tt.as_ref(),
            blocksize,
            matrix.as_mut(),
            work.as_mut(),
        )
        .unwrap();
    }

    fn assert_close(lhs: &Mat<c64>, rhs: &Mat<c64>) {
        fancy_assert!((lhs.nrows(), lhs.ncols()) == (rhs.nrows(), rhs.ncols()));
        for j in 0..lhs.ncols() {
            for i in 0..lhs.nrows() {
                fancy_assert!((lhs[(i, j)] - rhs[(i, j)]).norm() < 1e-10);
            }
        }
    }

    #[test]
    fn test_adjoint_inverts() {
        for (m, n, blocksize) in [(4, 6, 2), (7, 5, 3), (6, 6, 6), (3, 8, 1)] {
            let a = random_mat(m, n);
            let (factors, tt) = factorize(&a, blocksize);

            for side in [Side::Left, Side::Right] {
                let c = match side {
                    Side::Left => random_mat(n, 3),
                    Side::Right => random_mat(3, n),
                };
                let mut x = c.clone();
                apply(side, Op::NoTrans, &factors, &tt, blocksize, &mut x);
                apply(side, Op::ConjTrans, &factors, &tt, blocksize, &mut x);
                assert_close(&x, &c);

                let mut x = c.clone();
                apply(side, Op::ConjTrans, &factors, &tt, blocksize, &mut x);
                apply(side, Op::NoTrans, &factors, &tt, blocksize, &mut x);
                assert_close(&x, &c);
            }
        }
    }

    #[test]
    fn test_sides_agree() {
        let (m, n, blocksize) = (5, 7, 2);
        let a = random_mat(m, n);
        let (factors, tt) = factorize(&a, blocksize);

        let mut q = Mat::zeros(n, n);
        let mut work = Mat::zeros(n, blocksize);
        reconstruct_q(factors.as_ref(), tt.as_ref(), blocksize, q.as_mut(), work.as_mut())
            .unwrap();

        // I Q = Q
        let mut right = Mat::identity(n, n);
        apply(Side::Right, Op::NoTrans, &factors, &tt, blocksize, &mut right);
        assert_close(&right, &q);

        // Q^H from both sides
        let q_adjoint = Mat::with_dims(n, n, |i, j| q[(j, i)].conj());
        let mut left = Mat::identity(n, n);
        apply(Side::Left, Op::ConjTrans, &factors, &tt, blocksize, &mut left);
        assert_close(&left, &q_adjoint);
        let mut right = Mat::identity(n, n);
        apply(Side::Right, Op::ConjTrans, &factors, &tt, blocksize, &mut right);
        assert_close(&right, &q_adjoint);
    }

    #[test]
    fn test_real_transpose() {
        let a = Mat::with_dims(4, 5, |i, j| ((i * 5 + j) as f64).sin());
        let blocksize = 2;
        let mut factors = a.clone();
        let mut tt = Mat::zeros(4, blocksize);
        let mut work = vec![0.0; 4];
        crate::compute::lq_in_place(
            factors.as_mut(),
            tt.as_mut(),
            lakit_core::ColMut::from_slice(&mut work),
            blocksize,
        )
        .unwrap();

        let c = Mat::with_dims(5, 2, |i, j| (i + 2 * j) as f64);
        let mut trans = c.clone();
        let mut conj_trans = c.clone();
        let mut work = Mat::zeros(2, blocksize);
        apply_q(
            Side::Left,
            Op::Trans,
            factors.as_ref(),
            tt.as_ref(),
            blocksize,
            trans.as_mut(),
            work.as_mut(),
        )
        .unwrap();
        apply_q(
            Side::Left,
            Op::ConjTrans,
            factors.as_ref(),
            tt.as_ref(),
            blocksize,
            conj_trans.as_mut(),
            work.as_mut(),
        )
        .unwrap();
        fancy_assert!(trans.as_slice() == conj_trans.as_slice());
    }

    #[test]
    fn test_reconstruct_l() {
        let a = random_mat(5, 3);
        let (factors, _) = factorize(&a, 2);
        let mut l = Mat::zeros(5, 3);
        reconstruct_l(factors.as_ref(), l.as_mut()).unwrap();
        for i in 0..5 {
            for j in 0..3 {
                if j > i {
                    fancy_assert!(l[(i, j)] == c64::new(0.0, 0.0));
                } else {
                    fancy_assert!(l[(i, j)] == factors[(i, j)]);
                }
            }
        }

        let mut wrong = Mat::zeros(5, 5);
        fancy_assert!(
            reconstruct_l(factors.as_ref(), wrong.as_mut())
                == Err(KernelError::InvalidArgument { arg: "l" })
        );
    }

    #[test]
    fn test_errors() {
        let (m, n, blocksize) = (3, 4, 2);
        let a = random_mat(m, n);
        let (factors, tt) = factorize(&a, blocksize);

        let orig = random_mat(n, n);
        let mut q = orig.clone();
        let mut work = Mat::zeros(n, blocksize);

        fancy_assert!(
            apply_q(
                Side::Left,
                Op::Trans,
                factors.as_ref(),
                tt.as_ref(),
                blocksize,
                q.as_mut(),
                work.as_mut(),
            ) == Err(KernelError::InvalidArgument { arg: "op" })
        );
        fancy_assert!(
            apply_q(
                Side::Right,
                Op::NoTrans,
                factors.as_ref(),
                tt.as_ref(),
                blocksize,
                q.as_mut().submatrix(0, 0, n, n - 1),
                work.as_mut(),
            ) == Err(KernelError::InvalidArgument { arg: "matrix" })
        );
        fancy_assert!(
            apply_q(
                Side::Left,
                Op::NoTrans,
                factors.as_ref(),
                tt.as_ref(),
                blocksize,
                q.as_mut(),
                work.as_mut().submatrix(0, 0, n, 1),
            ) == Err(KernelError::InvalidArgument { arg: "work" })
        );
        fancy_assert!(
            apply_q(
                Side::Left,
                Op::NoTrans,
                factors.as_ref(),
                tt.as_ref(),
                0,
                q.as_mut(),
                work.as_mut(),
            ) == Err(KernelError::InvalidArgument { arg: "blocksize" })
        );
        fancy_assert!(
            reconstruct_q(
                factors.as_ref(),
                tt.as_ref().submatrix(0, 0, 1, blocksize),
                blocksize,
                q.as_mut(),
                work.as_mut(),
            ) == Err(KernelError::InvalidArgument { arg: "tt" })
        );
        fancy_assert!(
            reconstruct_q(
                factors.as_ref(),
                tt.as_ref(),
                blocksize,
                q.as_mut().with_access_policy(AccessPolicy::UpperTriangle),
                work.as_mut(),
            ) == Err(KernelError::AccessDenied { arg: "matrix" })
        );
        fancy_assert!(q.as_slice() == orig.as_slice());

        fancy_assert!(
            reconstruct_q_req::<c64>(n, blocksize).unwrap()
                == apply_q_req::<c64>(Side::Left, n, n, blocksize).unwrap()
        );
    }
}
