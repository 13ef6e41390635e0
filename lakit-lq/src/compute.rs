use dyn_stack::{DynStack, SizeOverflow, StackReq};
use lakit_core::{
    access_denied,
    householder::{
        apply_block_householder, apply_householder, conjugate_in_place,
        make_block_householder_factor, make_householder_in_place,
    },
    AccessPolicy, ColMut, ComplexField, Conj, Direction, KernelError, MatMut, Op, Side, StoreV,
};
use reborrow::*;

/// Computes the LQ factorization of `matrix` one row at a time.
///
/// For every row `r < min(m, n)`, a reflector $H_r$ is computed that annihilates
/// `matrix[r, r+1..]`, and it is applied from the right to the rows below. On exit, the lower
/// trapezoid of `matrix` holds $L$, row `r` to the right of the diagonal holds the conjugated
/// essential part of $H_r$, and `tau[r]` holds its scalar factor, such that
/// $$A = L H_{k-1}^H \dots H_0^H.$$
///
/// `work` must have at least `m` rows.
///
/// # Errors
///
/// - [`KernelError::AccessDenied`] if `matrix` is not densely writable.
/// - [`KernelError::InvalidArgument`] if `tau` has fewer than `min(m, n)` rows, or if `work` is
///   too short.
pub fn lq_in_place_unblocked<T: ComplexField>(
    mut matrix: MatMut<'_, T>,
    mut tau: ColMut<'_, T>,
    mut work: ColMut<'_, T>,
) -> Result<(), KernelError> {
    let m = matrix.nrows();
    let n = matrix.ncols();
    let size = Ord::min(m, n);

    if access_denied(AccessPolicy::Dense, matrix.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "matrix" });
    }
    if tau.nrows() < size {
        return Err(KernelError::InvalidArgument { arg: "tau" });
    }
    if work.nrows() < m {
        return Err(KernelError::InvalidArgument { arg: "work" });
    }

    for r in 0..size {
        let (top, bottom) = matrix.rb_mut().split_at_row(r + 1);
        let mut row = top.row(r).subvector(r, n - r).transpose();
        let below = bottom.submatrix(0, r, m - r - 1, n - r);

        conjugate_in_place(row.rb_mut());
        {
            let (mut head, mut essential) = row.rb_mut().split_at(1);
            let tau_r = make_householder_in_place(&mut head[0], essential.rb_mut());
            apply_householder(
                Side::Right,
                Conj::No,
                essential.rb(),
                tau_r,
                below,
                work.rb_mut(),
            )?;
            tau[r] = tau_r;
        }
        conjugate_in_place(row);
    }

    Ok(())
}

/// Computes the size and alignment of the workspace required by [`lq_in_place_with_stack`].
///
/// The workspace is a single vector of `nrows` elements, since the trailing updates borrow
/// their scratch space from the unused part of `tt`. It does not grow with `ncols` or
/// `blocksize`, which are accepted so the signature matches the other `_req` functions.
pub fn lq_in_place_req<T: 'static>(
    nrows: usize,
    _ncols: usize,
    _blocksize: usize,
) -> Result<StackReq, SizeOverflow> {
    StackReq::try_new::<T>(nrows)
}

/// Computes the blocked LQ factorization of `matrix`.
///
/// The rows are processed in panels of `blocksize` rows. Each panel is factored with
/// [`lq_in_place_unblocked`], its reflectors are compacted into an upper triangular factor,
/// and the resulting block reflector is applied to the rows below the panel.
///
/// On exit, the lower trapezoid of `matrix` holds $L$ and the rows to the right of the diagonal
/// hold the reflectors. For the panel starting at row `j`, `tt[j..j+ib, 0..ib]` holds the upper
/// triangular factor $T$ of the block, whose diagonal holds the scalar factors of its
/// reflectors. The remaining entries of `tt` are used as workspace.
///
/// `tt` must have at least `m` rows and `blocksize` columns, and `work` at least `m` rows.
///
/// # Errors
///
/// - [`KernelError::AccessDenied`] if `matrix` or `tt` is not densely writable.
/// - [`KernelError::InvalidArgument`] if `blocksize` is zero for a non-empty matrix, or if `tt`
///   or `work` is too small.
///
/// Nothing is written if an error is returned.
pub fn lq_in_place<T: ComplexField>(
    mut matrix: MatMut<'_, T>,
    mut tt: MatMut<'_, T>,
    mut work: ColMut<'_, T>,
    blocksize: usize,
) -> Result<(), KernelError> {
    let m = matrix.nrows();
    let n = matrix.ncols();
    let size = Ord::min(m, n);

    if access_denied(AccessPolicy::Dense, matrix.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "matrix" });
    }
    if access_denied(AccessPolicy::Dense, tt.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "tt" });
    }
    if blocksize == 0 && size > 0 {
        return Err(KernelError::InvalidArgument { arg: "blocksize" });
    }
    if tt.nrows() < m || tt.ncols() < blocksize {
        return Err(KernelError::InvalidArgument { arg: "tt" });
    }
    if work.nrows() < m {
        return Err(KernelError::InvalidArgument { arg: "work" });
    }

    #[cfg(feature = "perf-warn")]
    if matrix.col_stride().unsigned_abs() != 1 && lakit_core::__perf_warn!(LQ_WARN) {
        if matrix.row_stride().unsigned_abs() == 1 {
            log::warn!(target: "lakit_perf", "LQ prefers row-major matrix. Found column-major matrix.");
        } else {
            log::warn!(target: "lakit_perf", "LQ prefers row-major matrix. Found matrix with generic strides.");
        }
    }

    let mut j = 0;
    while j < size {
        let ib = Ord::min(blocksize, size - j);

        let (tt_top, tt_bot) = tt.rb_mut().split_at_row(j + ib);
        let mut factor = tt_top.submatrix(j, 0, ib, ib);
        let (top, bottom) = matrix.rb_mut().split_at_row(j + ib);
        let mut panel = top.submatrix(j, j, ib, n - j);

        lq_in_place_unblocked(panel.rb_mut(), factor.rb_mut().diagonal(), work.rb_mut())?;

        // the factor overwrites its own diagonal, so the taus are read from a copy
        let mut tau = work.rb_mut().subvector(0, ib);
        for i in 0..ib {
            tau[i] = factor[(i, i)];
        }
        make_block_householder_factor(
            Direction::Forward,
            StoreV::Rowwise,
            panel.rb(),
            tau.rb(),
            factor.rb_mut(),
        )?;

        if j + ib < m {
            apply_block_householder(
                Side::Right,
                Op::NoTrans,
                Direction::Forward,
                StoreV::Rowwise,
                panel.rb(),
                factor.rb(),
                bottom.submatrix(0, j, m - j - ib, n - j),
                tt_bot.submatrix(0, 0, m - j - ib, ib),
            )?;
        }

        j += ib;
    }

    Ok(())
}

/// Same as [`lq_in_place`], with the `m`-element work vector allocated from `stack`.
///
/// # Panics
///
/// Panics if the provided memory in `stack` is insufficient (see [`lq_in_place_req`]).
#[track_caller]
pub fn lq_in_place_with_stack<T: ComplexField>(
    matrix: MatMut<'_, T>,
    tt: MatMut<'_, T>,
    blocksize: usize,
    stack: DynStack<'_>,
) -> Result<(), KernelError> {
    let (mut work, _) = stack.make_with(matrix.nrows(), |_| T::zero());
    lq_in_place(matrix, tt, ColMut::from_slice(&mut *work), blocksize)
}

/// Recommended block size to use for an LQ factorization of a matrix with the given shape.
#[inline]
pub fn recommended_blocksize<T: ComplexField>(nrows: usize, ncols: usize) -> usize {
    let prod = nrows.saturating_mul(ncols);
    let size = nrows.min(ncols);

    (if prod > 8192 * 8192 {
        256
    } else if prod > 2048 * 2048 {
        128
    } else if prod > 1024 * 1024 {
        64
    } else if prod > 512 * 512 {
        48
    } else if prod > 128 * 128 {
        32
    } else if prod > 32 * 32 {
        16
    } else if prod > 16 * 16 {
        8
    } else {
        1
    })
    .min(size)
    .max(1)
}

/// LQ factorization tuning parameters.
#[derive(Default, Copy, Clone, Debug)]
pub struct LqParams {
    /// Number of rows per panel. `None` to use [`recommended_blocksize`].
    pub blocksize: Option<usize>,
}

impl LqParams {
    /// Block size to pass to [`lq_in_place`] for an `nrows×ncols` matrix, between one and
    /// `min(nrows, ncols)`.
    pub fn resolve_blocksize<T: ComplexField>(self, nrows: usize, ncols: usize) -> usize {
        match self.blocksize {
            Some(blocksize) => blocksize.min(nrows.min(ncols)).max(1),
            None => recommended_blocksize::<T>(nrows, ncols),
        }
    }
}
