//! Hermitian rank-2k update.
//!
//! Computes
//! $$C := \alpha A B^H + \bar\alpha B A^H + \beta C$$
//! or
//! $$C := \alpha A^H B + \bar\alpha B^H A + \beta C$$
//! where $C$ is an $n\times n$ Hermitian matrix of which only one triangle is referenced, $A$
//! and $B$ are $n\times k$ (or $k\times n$) and $\beta$ is real, so the diagonal of $C$ stays
//! real.
//!
//! Row-major calls are reduced to column-major ones: the row-major storage of $C$ is the
//! column-major storage of $C^T = \bar C$, so the update is carried out on the conjugate with
//! the triangles swapped, the transposition flipped and $\alpha$ conjugated. Both layouts go
//! through the same column-major kernel.

use crate::{
    ComplexField, KernelError, Layout, MatMut, MatRef, Op, Promote, RealType, ScalarType, Uplo,
};

/// Checks the leading dimension of an operand and, if `check_len` is set, that its slice
/// holds the whole matrix.
fn check_operand(
    arg: &'static str,
    len: usize,
    layout: Layout,
    nrows: usize,
    ncols: usize,
    leading_dim: usize,
    check_len: bool,
) -> Result<(), KernelError> {
    if leading_dim < layout.min_leading_dim(nrows, ncols) {
        return Err(KernelError::InvalidArgument { arg });
    }
    if check_len {
        match layout.required_len(nrows, ncols, leading_dim) {
            Some(required) if required <= len => {}
            _ => return Err(KernelError::InvalidArgument { arg }),
        }
    }
    Ok(())
}

/// Hermitian rank-2k update of `c`.
///
/// - [`Op::NoTrans`]: $C := \alpha A B^H + \bar\alpha B A^H + \beta C$, with $A$, $B$ of size
///   `n×k`.
/// - [`Op::ConjTrans`]: $C := \alpha A^H B + \bar\alpha B^H A + \beta C$, with $A$, $B$ of size
///   `k×n`.
///
/// [`Op::Trans`] is rejected. `uplo` selects the triangle of `c` that is read and written; the
/// other one is left untouched, except for [`Uplo::General`] where the upper triangle is
/// computed and the strictly lower one receives its conjugate mirror. The elements of `a` and
/// `b` are promoted to the element type of `c`.
///
/// If `alpha` is zero, `a` and `b` are not accessed. If `beta` is zero, `c` need not be
/// initialized: its values are never read.
///
/// # Errors
///
/// Returns [`KernelError::InvalidArgument`] if `trans` is [`Op::Trans`], if a leading dimension
/// is smaller than the minor extent of its matrix (at least one), or if a slice is too short for
/// the matrix it holds. Nothing is written in that case.
pub fn her2k<TA, TB, TC>(
    layout: Layout,
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    alpha: ScalarType<ScalarType<TA, TB>, TC>,
    a: &[TA],
    lda: usize,
    b: &[TB],
    ldb: usize,
    beta: RealType<ScalarType<TA, TB>, TC>,
    c: &mut [TC],
    ldc: usize,
) -> Result<(), KernelError>
where
    TA: Promote<TB>,
    TB: ComplexField,
    TC: ComplexField,
    ScalarType<TA, TB>: Promote<TC, Output = TC>,
{
    if trans == Op::Trans {
        return Err(KernelError::InvalidArgument { arg: "trans" });
    }

    let (ab_nrows, ab_ncols) = match trans {
        Op::NoTrans => (n, k),
        _ => (k, n),
    };
    let alpha: TC = alpha;
    let touches_ab = alpha != TC::zero();
    check_operand("lda", a.len(), layout, ab_nrows, ab_ncols, lda, touches_ab)?;
    check_operand("ldb", b.len(), layout, ab_nrows, ab_ncols, ldb, touches_ab)?;
    check_operand("ldc", c.len(), layout, n, n, ldc, true)?;

    let (uplo, trans, alpha) = match layout {
        Layout::ColumnMajor => (uplo, trans, alpha),
        Layout::RowMajor => (
            uplo.transpose(),
            match trans {
                Op::NoTrans => Op::ConjTrans,
                _ => Op::NoTrans,
            },
            alpha.conj(),
        ),
    };

    if n == 0 {
        return Ok(());
    }

    // column-major extent of A and B after normalization
    let (ab_nrows, ab_ncols) = match trans {
        Op::NoTrans => (n, k),
        _ => (k, n),
    };
    let c = MatMut::from_column_major_slice(c, n, n, ldc);

    if !touches_ab {
        scale_triangle(uplo, beta, c);
        return Ok(());
    }

    let promote_a = |x: TA| {
        <ScalarType<TA, TB> as Promote<TC>>::promote_lhs(<TA as Promote<TB>>::promote_lhs(x))
    };
    let promote_b = |x: TB| {
        <ScalarType<TA, TB> as Promote<TC>>::promote_lhs(<TA as Promote<TB>>::promote_rhs(x))
    };

    let a = MatRef::from_column_major_slice(a, ab_nrows, ab_ncols, lda);
    let b = MatRef::from_column_major_slice(b, ab_nrows, ab_ncols, ldb);
    let a = |i: usize, j: usize| promote_a(a[(i, j)]);
    let b = |i: usize, j: usize| promote_b(b[(i, j)]);

    match trans {
        Op::NoTrans => update_no_trans(uplo, n, k, alpha, a, b, beta, c),
        _ => update_conj_trans(uplo, n, k, alpha, a, b, beta, c),
    }
    Ok(())
}

/// Rows of column `j` that belong to the triangle selected by `uplo`. [`Uplo::General`] is
/// computed through its upper triangle.
#[inline]
fn triangle_rows(uplo: Uplo, j: usize, n: usize) -> core::ops::Range<usize> {
    match uplo {
        Uplo::Lower => j..n,
        Uplo::Upper | Uplo::General => 0..j + 1,
    }
}

/// `beta * x` for an off-diagonal entry, without reading `x` if `beta` is zero.
#[inline(always)]
fn scaled<T: ComplexField>(beta: T::Real, x: T) -> T {
    if beta == T::Real::zero() {
        T::zero()
    } else {
        x.scale(beta)
    }
}

/// `beta * real(x)` for a diagonal entry, without reading `x` if `beta` is zero.
#[inline(always)]
fn scaled_real<T: ComplexField>(beta: T::Real, x: T) -> T::Real {
    if beta == T::Real::zero() {
        T::Real::zero()
    } else {
        beta * x.real()
    }
}

/// Fills the strictly lower triangle with the conjugate of the strictly upper one.
fn mirror_upper<T: ComplexField>(mut c: MatMut<'_, T>) {
    let n = c.nrows();
    for j in 0..n {
        for i in j + 1..n {
            c[(i, j)] = c[(j, i)].conj();
        }
    }
}

fn scale_triangle<T: ComplexField>(uplo: Uplo, beta: T::Real, mut c: MatMut<'_, T>) {
    let n = c.nrows();
    if beta == T::Real::one() {
        for j in 0..n {
            c[(j, j)] = T::from_real(c[(j, j)].real());
        }
    } else {
        for j in 0..n {
            for i in triangle_rows(uplo, j, n) {
                c[(i, j)] = if i == j {
                    T::from_real(scaled_real(beta, c[(j, j)]))
                } else {
                    scaled(beta, c[(i, j)])
                };
            }
        }
    }
    if uplo == Uplo::General {
        mirror_upper(c);
    }
}

fn update_no_trans<T: ComplexField>(
    uplo: Uplo,
    n: usize,
    k: usize,
    alpha: T,
    a: impl Fn(usize, usize) -> T,
    b: impl Fn(usize, usize) -> T,
    beta: T::Real,
    mut c: MatMut<'_, T>,
) {
    let two = T::Real::one() + T::Real::one();
    for j in 0..n {
        let rows = triangle_rows(uplo, j, n);
        for i in rows.clone() {
            c[(i, j)] = if i == j {
                T::from_real(scaled_real(beta, c[(j, j)]))
            } else {
                scaled(beta, c[(i, j)])
            };
        }

        for l in 0..k {
            let alpha_conj_bjl = alpha * b(j, l).conj();
            let conj_alpha_ajl = (alpha * a(j, l)).conj();
            for i in rows.clone() {
                if i == j {
                    let diag = c[(j, j)].real() + two * (a(j, l) * alpha_conj_bjl).real();
                    c[(j, j)] = T::from_real(diag);
                } else {
                    c[(i, j)] = c[(i, j)] + a(i, l) * alpha_conj_bjl + b(i, l) * conj_alpha_ajl;
                }
            }
        }
    }
    if uplo == Uplo::General {
        mirror_upper(c);
    }
}

fn update_conj_trans<T: ComplexField>(
    uplo: Uplo,
    n: usize,
    k: usize,
    alpha: T,
    a: impl Fn(usize, usize) -> T,
    b: impl Fn(usize, usize) -> T,
    beta: T::Real,
    mut c: MatMut<'_, T>,
) {
    for j in 0..n {
        for i in triangle_rows(uplo, j, n) {
            let mut sum1 = T::zero();
            let mut sum2 = T::zero();
            for l in 0..k {
                sum1 = sum1 + a(l, i).conj() * b(l, j);
                sum2 = sum2 + b(l, i).conj() * a(l, j);
            }
            let update = alpha * sum1 + alpha.conj() * sum2;
            c[(i, j)] = if i == j {
                T::from_real(update.real() + scaled_real(beta, c[(j, j)]))
            } else {
                update + scaled(beta, c[(i, j)])
            };
        }
    }
    if uplo == Uplo::General {
        mirror_upper(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{c32, c64, Mat};
    use assert2::assert as fancy_assert;
    use assert_approx_eq::assert_approx_eq;
    use rand::prelude::*;
    use std::cell::RefCell;

    thread_local! {
        static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
    }

    fn random_c64() -> c64 {
        RNG.with(|rng| {
            let mut rng = rng.borrow_mut();
            c64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5)
        })
    }

    const UPLOS: [Uplo; 3] = [Uplo::Lower, Uplo::Upper, Uplo::General];
    const TRANS: [Op; 2] = [Op::NoTrans, Op::ConjTrans];
    const LAYOUTS: [Layout; 2] = [Layout::ColumnMajor, Layout::RowMajor];

    /// Element `(i, j)` of a matrix stored in `data`.
    fn at(data: &[c64], layout: Layout, ld: usize, i: usize, j: usize) -> c64 {
        match layout {
            Layout::ColumnMajor => data[i + j * ld],
            Layout::RowMajor => data[i * ld + j],
        }
    }

    fn in_triangle(uplo: Uplo, i: usize, j: usize) -> bool {
        match uplo {
            Uplo::Lower => i >= j,
            Uplo::Upper => i <= j,
            Uplo::General => true,
        }
    }

    fn random_data(len: usize) -> Vec<c64> {
        (0..len).map(|_| random_c64()).collect()
    }

    #[test]
    fn small_upper() {
        let a = [c64::new(1.0, 0.0), c64::new(0.0, 1.0)];
        let b = [c64::new(1.0, 0.0), c64::new(1.0, 0.0)];
        let sentinel = c64::new(99.0, 99.0);
        let nan = c64::new(f64::NAN, 0.0);
        let mut c = [nan, sentinel, nan, nan];

        her2k(
            Layout::ColumnMajor,
            Uplo::Upper,
            Op::NoTrans,
            2,
            1,
            c64::new(1.0, 0.0),
            &a,
            2,
            &b,
            2,
            0.0,
            &mut c,
            2,
        )
        .unwrap();

        fancy_assert!(c[0] == c64::new(2.0, 0.0));
        fancy_assert!(c[1] == sentinel);
        fancy_assert!(c[2] == c64::new(1.0, -1.0));
        fancy_assert!(c[3] == c64::new(0.0, 0.0));
    }

    #[test]
    fn zero_alpha_unit_beta_makes_diagonal_real() {
        let n = 4;
        for layout in LAYOUTS {
            for uplo in UPLOS {
                for trans in TRANS {
                    let mut c = random_data(n * n);
                    // Hermitian off-diagonal part, noisy diagonal
                    for j in 0..n {
                        for i in j + 1..n {
                            c[i + j * n] = c[j + i * n].conj();
                        }
                    }
                    let orig = c.clone();

                    her2k::<c64, c64, c64>(
                        layout,
                        uplo,
                        trans,
                        n,
                        3,
                        c64::zero(),
                        &[],
                        n,
                        &[],
                        n,
                        1.0,
                        &mut c,
                        n,
                    )
                    .unwrap();

                    for j in 0..n {
                        for i in 0..n {
                            if i == j {
                                fancy_assert!(c[i + j * n] == c64::new(orig[i + j * n].re, 0.0));
                            } else {
                                fancy_assert!(c[i + j * n] == orig[i + j * n]);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn zero_alpha_zero_beta_zeroes_triangle() {
        for n in [0, 1, 2, 5] {
            for layout in LAYOUTS {
                for uplo in UPLOS {
                    let orig = random_data(n * n);
                    let mut c = orig.clone();
                    // the requested triangle is never read
                    for j in 0..n {
                        for i in 0..n {
                            if in_triangle(uplo, i, j) {
                                match layout {
                                    Layout::ColumnMajor => c[i + j * n] = c64::new(f64::NAN, f64::NAN),
                                    Layout::RowMajor => c[i * n + j] = c64::new(f64::NAN, f64::NAN),
                                }
                            }
                        }
                    }

                    her2k::<c64, c64, c64>(
                        layout,
                        uplo,
                        Op::NoTrans,
                        n,
                        2,
                        c64::zero(),
                        &[],
                        Ord::max(n, 2),
                        &[],
                        Ord::max(n, 2),
                        0.0,
                        &mut c,
                        Ord::max(n, 1),
                    )
                    .unwrap();

                    for j in 0..n {
                        for i in 0..n {
                            let value = at(&c, layout, n, i, j);
                            if in_triangle(uplo, i, j) {
                                fancy_assert!(value == c64::zero());
                            } else {
                                fancy_assert!(value == at(&orig, layout, n, i, j));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn zero_alpha_scales_triangle() {
        let n = 3;
        let orig = random_data(n * n);
        let mut c = orig.clone();
        her2k::<c64, c64, c64>(
            Layout::ColumnMajor,
            Uplo::Lower,
            Op::ConjTrans,
            n,
            0,
            c64::zero(),
            &[],
            1,
            &[],
            1,
            2.0,
            &mut c,
            n,
        )
        .unwrap();
        for j in 0..n {
            for i in 0..n {
                let expected = if i == j {
                    c64::new(2.0 * orig[i + j * n].re, 0.0)
                } else if i > j {
                    orig[i + j * n] * 2.0
                } else {
                    orig[i + j * n]
                };
                fancy_assert!(c[i + j * n] == expected);
            }
        }
    }

    /// Dense `alpha op(A) op(B)^H + conj(alpha) op(B) op(A)^H + beta C`, column-major.
    fn reference(
        trans: Op,
        n: usize,
        k: usize,
        alpha: c64,
        a: &[c64],
        b: &[c64],
        ld_ab: usize,
        beta: f64,
        c: &[c64],
    ) -> Mat<c64> {
        let op = |data: &[c64], i: usize, l: usize| match trans {
            Op::NoTrans => data[i + l * ld_ab],
            _ => data[l + i * ld_ab].conj(),
        };
        Mat::with_dims(n, n, |i, j| {
            let mut acc = c[i + j * n] * beta;
            for l in 0..k {
                acc += alpha * op(a, i, l) * op(b, j, l).conj();
                acc += alpha.conj() * op(b, i, l) * op(a, j, l).conj();
            }
            acc
        })
    }

    #[test]
    fn matches_reference() {
        let n = 5;
        let k = 3;
        for trans in TRANS {
            for uplo in UPLOS {
                let ld_ab = match trans {
                    Op::NoTrans => n + 1,
                    _ => k + 2,
                };
                let ab_ncols = match trans {
                    Op::NoTrans => k,
                    _ => n,
                };
                let a = random_data(ld_ab * ab_ncols);
                let b = random_data(ld_ab * ab_ncols);
                let mut c = random_data(n * n);
                for j in 0..n {
                    c[j + j * n] = c64::new(c[j + j * n].re, 0.0);
                    for i in j + 1..n {
                        c[i + j * n] = c[j + i * n].conj();
                    }
                }
                let orig = c.clone();
                let alpha = random_c64();
                let beta = 0.75;

                her2k(
                    Layout::ColumnMajor,
                    uplo,
                    trans,
                    n,
                    k,
                    alpha,
                    &a,
                    ld_ab,
                    &b,
                    ld_ab,
                    beta,
                    &mut c,
                    n,
                )
                .unwrap();

                let expected = reference(trans, n, k, alpha, &a, &b, ld_ab, beta, &orig);
                for j in 0..n {
                    for i in 0..n {
                        if in_triangle(uplo, i, j) {
                            fancy_assert!((c[i + j * n] - expected[(i, j)]).norm() < 1e-12);
                        } else {
                            fancy_assert!(c[i + j * n] == orig[i + j * n]);
                        }
                    }
                    fancy_assert!(c[j + j * n].im == 0.0);
                }
            }
        }
    }

    /// Same as [`reference`], with every operand stored row-major.
    fn row_major_reference(
        trans: Op,
        n: usize,
        k: usize,
        alpha: c64,
        a: &[c64],
        b: &[c64],
        ld_ab: usize,
        beta: f64,
        c: &[c64],
    ) -> Mat<c64> {
        let op = |data: &[c64], i: usize, l: usize| match trans {
            Op::NoTrans => data[i * ld_ab + l],
            _ => data[l * ld_ab + i].conj(),
        };
        Mat::with_dims(n, n, |i, j| {
            let mut acc = c[i * n + j] * beta;
            for l in 0..k {
                acc += alpha * op(a, i, l) * op(b, j, l).conj();
                acc += alpha.conj() * op(b, i, l) * op(a, j, l).conj();
            }
            acc
        })
    }

    #[test]
    fn row_major_matches_reference() {
        let n = 5;
        let k = 3;
        for uplo in UPLOS {
            for trans in TRANS {
                // rows of A and B, and a padded leading dimension
                let (ab_nrows, ld_ab) = match trans {
                    Op::NoTrans => (n, k + 2),
                    _ => (k, n + 1),
                };
                let a = random_data(ab_nrows * ld_ab);
                let b = random_data(ab_nrows * ld_ab);
                let mut c = random_data(n * n);
                for i in 0..n {
                    c[i * n + i] = c64::new(c[i * n + i].re, 0.0);
                    for j in i + 1..n {
                        c[j * n + i] = c[i * n + j].conj();
                    }
                }
                let orig = c.clone();
                let alpha = random_c64();
                let beta = -0.5;

                her2k(
                    Layout::RowMajor,
                    uplo,
                    trans,
                    n,
                    k,
                    alpha,
                    &a,
                    ld_ab,
                    &b,
                    ld_ab,
                    beta,
                    &mut c,
                    n,
                )
                .unwrap();

                let expected = row_major_reference(trans, n, k, alpha, &a, &b, ld_ab, beta, &orig);
                for i in 0..n {
                    for j in 0..n {
                        if in_triangle(uplo, i, j) {
                            fancy_assert!((c[i * n + j] - expected[(i, j)]).norm() < 1e-12);
                        } else {
                            fancy_assert!(c[i * n + j] == orig[i * n + j]);
                        }
                    }
                    fancy_assert!(c[i * n + i].im == 0.0);
                }
            }
        }
    }

    #[test]
    fn general_is_hermitian() {
        let n = 6;
        let k = 2;
        for layout in LAYOUTS {
            for trans in TRANS {
                let (nrows, ncols) = match trans {
                    Op::NoTrans => (n, k),
                    _ => (k, n),
                };
                let ld = layout.min_leading_dim(nrows, ncols);
                let a = random_data(nrows * ncols);
                let b = random_data(nrows * ncols);
                let mut c = random_data(n * n);

                her2k(
                    layout,
                    Uplo::General,
                    trans,
                    n,
                    k,
                    random_c64(),
                    &a,
                    ld,
                    &b,
                    ld,
                    0.25,
                    &mut c,
                    n,
                )
                .unwrap();

                for j in 0..n {
                    fancy_assert!(c[j + j * n].im == 0.0);
                    for i in 0..n {
                        fancy_assert!(c[i + j * n] == c[j + i * n].conj());
                    }
                }
            }
        }
    }

    #[test]
    fn mixed_precision() {
        let n = 3;
        let k = 2;
        let a: Vec<f32> = (0..n * k).map(|x| x as f32 * 0.5).collect();
        let b: Vec<f64> = (0..n * k).map(|x| 1.0 - x as f64).collect();
        let mut c = vec![c64::zero(); n * n];

        her2k(
            Layout::ColumnMajor,
            Uplo::Upper,
            Op::NoTrans,
            n,
            k,
            c64::new(0.0, 1.0),
            &a,
            n,
            &b,
            n,
            0.0,
            &mut c,
            n,
        )
        .unwrap();

        // alpha = i and real A, B: alpha A B^T + conj(alpha) B A^T is purely imaginary and
        // skew-symmetric, so its diagonal vanishes
        for j in 0..n {
            for i in 0..=j {
                let mut expected = 0.0;
                for l in 0..k {
                    expected += a[i + l * n] as f64 * b[j + l * n] - b[i + l * n] * a[j + l * n] as f64;
                }
                assert_approx_eq!(c[i + j * n].re, 0.0);
                assert_approx_eq!(c[i + j * n].im, expected);
            }
        }

        let a32 = [c32::new(1.0, 1.0)];
        let mut c32_out = [c32::new(5.0, 5.0)];
        her2k(
            Layout::RowMajor,
            Uplo::Lower,
            Op::ConjTrans,
            1,
            1,
            c32::new(1.0, 0.0),
            &a32,
            1,
            &[1.0f32],
            1,
            1.0,
            &mut c32_out,
            1,
        )
        .unwrap();
        // 5 + 2 real((1 + i) * 1)
        fancy_assert!(c32_out[0] == c32::new(7.0, 0.0));
    }

    #[test]
    fn argument_errors() {
        let n = 3;
        let k = 2;
        let a = random_data(n * k);
        let b = random_data(n * k);
        let orig = random_data(n * n);
        let mut c = orig.clone();
        let alpha = c64::one();

        let call = |layout, trans, lda, b: &[c64], ldc, c: &mut [c64]| {
            her2k(layout, Uplo::Upper, trans, n, k, alpha, &a, lda, b, n, 1.0, c, ldc)
        };

        fancy_assert!(
            call(Layout::ColumnMajor, Op::Trans, n, &b[..], n, &mut c[..])
                == Err(KernelError::InvalidArgument { arg: "trans" })
        );
        fancy_assert!(
            call(Layout::ColumnMajor, Op::NoTrans, n - 1, &b[..], n, &mut c[..])
                == Err(KernelError::InvalidArgument { arg: "lda" })
        );
        // row-major NoTrans needs lda >= k
        fancy_assert!(
            call(Layout::RowMajor, Op::NoTrans, k - 1, &b[..], n, &mut c[..])
                == Err(KernelError::InvalidArgument { arg: "lda" })
        );
        fancy_assert!(
            call(Layout::ColumnMajor, Op::NoTrans, n, &b[..n * k - 1], n, &mut c[..])
                == Err(KernelError::InvalidArgument { arg: "ldb" })
        );
        fancy_assert!(
            call(Layout::ColumnMajor, Op::NoTrans, n, &b[..], n - 1, &mut c[..])
                == Err(KernelError::InvalidArgument { arg: "ldc" })
        );
        fancy_assert!(
            call(Layout::ColumnMajor, Op::NoTrans, n, &b[..], n, &mut c[..n * n - 1])
                == Err(KernelError::InvalidArgument { arg: "ldc" })
        );
        fancy_assert!(c == orig);
    }
}
