//! Matrix products used by the block reflector kernels.
//!
//! Rectangular products of `f32`, `f64`, `c32` and `c64` are forwarded to [`gemm`]. Every other
//! scalar type, and every structured product, goes through plain sequential loops over strided
//! views. The block reflector kernels only multiply panels of width `k` (the block size), so the
//! loops are not tiled.

use crate::{c32, c64, ComplexField, Conj, MatMut, MatRef};
use assert2::assert as fancy_assert;
use core::any::TypeId;

/// Computes the matrix product `[alpha * dst] + beta * op(lhs) * op(rhs)` and stores the result
/// in `dst`, where `op` conjugates its operand according to `conj_lhs` and `conj_rhs`.
///
/// If `alpha` is not provided, the preexisting values in `dst` are not read.
///
/// # Panics
///
/// Panics if the matrix dimensions are not compatible for matrix multiplication.
/// i.e.
///  - `dst.nrows() == lhs.nrows()`
///  - `dst.ncols() == rhs.ncols()`
///  - `lhs.ncols() == rhs.nrows()`
#[track_caller]
pub fn matmul<T: ComplexField>(
    dst: MatMut<'_, T>,
    lhs: MatRef<'_, T>,
    conj_lhs: Conj,
    rhs: MatRef<'_, T>,
    conj_rhs: Conj,
    alpha: Option<T>,
    beta: T,
) {
    use triangular::BlockStructure::Rectangular;
    fancy_assert!(dst.nrows() == lhs.nrows());
    fancy_assert!(dst.ncols() == rhs.ncols());
    fancy_assert!(lhs.ncols() == rhs.nrows());

    macro_rules! dispatch {
        ($ty: ty, $gemm_ty: ty) => {
            if TypeId::of::<T>() == TypeId::of::<$ty>() {
                let m = dst.nrows();
                let n = dst.ncols();
                let k = lhs.ncols();
                let dst_col_stride = dst.col_stride();
                let dst_row_stride = dst.row_stride();
                let read_dst = alpha.is_some();
                let alpha = alpha.unwrap_or(T::zero());
                // SAFETY:
                // * `T` is `$ty`, which has the same layout as `$gemm_ty`.
                // * matching operand/destination dimensions.
                // * strides were verified during creation of matrix views.
                unsafe {
                    gemm::gemm(
                        m,
                        n,
                        k,
                        dst.as_ptr() as *mut $gemm_ty,
                        dst_col_stride,
                        dst_row_stride,
                        read_dst,
                        lhs.as_ptr() as *const $gemm_ty,
                        lhs.col_stride(),
                        lhs.row_stride(),
                        rhs.as_ptr() as *const $gemm_ty,
                        rhs.col_stride(),
                        rhs.row_stride(),
                        *(&alpha as *const T as *const $gemm_ty),
                        *(&beta as *const T as *const $gemm_ty),
                        false,
                        conj_lhs == Conj::Yes,
                        conj_rhs == Conj::Yes,
                        gemm::Parallelism::None,
                    )
                };
                return;
            }
        };
    }
    dispatch!(f32, f32);
    dispatch!(f64, f64);
    dispatch!(c32, gemm::c32);
    dispatch!(c64, gemm::c64);

    triangular::matmul(
        dst,
        lhs,
        Rectangular,
        conj_lhs,
        rhs,
        Rectangular,
        conj_rhs,
        alpha,
        beta,
    );
}

pub mod triangular {
    use super::*;

    /// Structure of a square operand. Entries outside the structure are never read and are
    /// treated as zero. The diagonal of a unit triangular operand is never read and is treated
    /// as one.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum BlockStructure {
        Rectangular,
        TriangularLower,
        StrictTriangularLower,
        UnitTriangularLower,
        TriangularUpper,
        StrictTriangularUpper,
        UnitTriangularUpper,
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum DiagonalKind {
        Zero,
        Unit,
        Generic,
    }

    impl BlockStructure {
        #[inline]
        pub fn is_dense(self) -> bool {
            matches!(self, BlockStructure::Rectangular)
        }

        #[inline]
        pub fn is_lower(self) -> bool {
            use BlockStructure::*;
            matches!(
                self,
                TriangularLower | StrictTriangularLower | UnitTriangularLower
            )
        }

        #[inline]
        pub fn is_upper(self) -> bool {
            use BlockStructure::*;
            matches!(
                self,
                TriangularUpper | StrictTriangularUpper | UnitTriangularUpper
            )
        }

        #[inline]
        pub fn transpose(self) -> Self {
            use BlockStructure::*;
            match self {
                Rectangular => Rectangular,
                TriangularLower => TriangularUpper,
                StrictTriangularLower => StrictTriangularUpper,
                UnitTriangularLower => UnitTriangularUpper,
                TriangularUpper => TriangularLower,
                StrictTriangularUpper => StrictTriangularLower,
                UnitTriangularUpper => UnitTriangularLower,
            }
        }

        #[inline]
        pub fn diag_kind(self) -> DiagonalKind {
            use BlockStructure::*;
            match self {
                Rectangular | TriangularLower | TriangularUpper => DiagonalKind::Generic,
                StrictTriangularLower | StrictTriangularUpper => DiagonalKind::Zero,
                UnitTriangularLower | UnitTriangularUpper => DiagonalKind::Unit,
            }
        }

        /// Range of row indices of column `j` that may hold a nonzero off-diagonal entry or a
        /// generic diagonal entry, in a matrix with `nrows` rows.
        #[inline]
        fn stored_rows(self, j: usize, nrows: usize) -> core::ops::Range<usize> {
            let generic_diag = self.diag_kind() == DiagonalKind::Generic;
            let start = if self.is_lower() {
                if generic_diag {
                    j
                } else {
                    j + 1
                }
            } else {
                0
            };
            let end = if self.is_upper() {
                if generic_diag {
                    j + 1
                } else {
                    j
                }
            } else {
                nrows
            };
            Ord::min(start, nrows)..Ord::min(Ord::max(start, end), nrows)
        }
    }

    /// Computes the matrix product `[alpha * dst] + beta * op(lhs) * op(rhs)`, where `lhs` and
    /// `rhs` may be structured, and stores the result in `dst`.
    ///
    /// If `alpha` is not provided, the preexisting values in `dst` are not read.
    ///
    /// # Panics
    ///
    /// Panics if the matrix dimensions are not compatible for matrix multiplication, or if a
    /// structured operand is not square.
    #[track_caller]
    pub fn matmul<T: ComplexField>(
        mut dst: MatMut<'_, T>,
        lhs: MatRef<'_, T>,
        lhs_structure: BlockStructure,
        conj_lhs: Conj,
        rhs: MatRef<'_, T>,
        rhs_structure: BlockStructure,
        conj_rhs: Conj,
        alpha: Option<T>,
        beta: T,
    ) {
        fancy_assert!(dst.nrows() == lhs.nrows());
        fancy_assert!(dst.ncols() == rhs.ncols());
        fancy_assert!(lhs.ncols() == rhs.nrows());
        if !lhs_structure.is_dense() {
            fancy_assert!(lhs.nrows() == lhs.ncols());
        }
        if !rhs_structure.is_dense() {
            fancy_assert!(rhs.nrows() == rhs.ncols());
        }

        let m = dst.nrows();
        let n = dst.ncols();
        let k = lhs.ncols();

        for j in 0..n {
            for i in 0..m {
                let mut acc = T::zero();
                // column `j` of `rhs` restricted to its structure
                for depth in rhs_structure.stored_rows(j, k) {
                    let l = conj_lhs.apply(read(lhs, lhs_structure, i, depth));
                    acc = acc + l * conj_rhs.apply(rhs[(depth, j)]);
                }
                if rhs_structure.diag_kind() == DiagonalKind::Unit && j < k {
                    acc = acc + conj_lhs.apply(read(lhs, lhs_structure, i, j));
                }

                let acc = beta * acc;
                dst[(i, j)] = match alpha {
                    Some(alpha) => alpha * dst[(i, j)] + acc,
                    None => acc,
                };
            }
        }
    }

    /// Reads `mat[(i, j)]` as seen through `structure`.
    #[inline]
    fn read<T: ComplexField>(
        mat: MatRef<'_, T>,
        structure: BlockStructure,
        i: usize,
        j: usize,
    ) -> T {
        if structure.is_dense() {
            return mat[(i, j)];
        }
        if i == j {
            return match structure.diag_kind() {
                DiagonalKind::Zero => T::zero(),
                DiagonalKind::Unit => T::one(),
                DiagonalKind::Generic => mat[(i, j)],
            };
        }
        if (structure.is_lower() && i > j) || (structure.is_upper() && i < j) {
            mat[(i, j)]
        } else {
            T::zero()
        }
    }

    /// Computes `dst := dst * op(tri)` in place, where `tri` is a square triangular matrix with
    /// the given structure and `op` conjugates according to `conj_tri`.
    ///
    /// # Panics
    ///
    /// Panics if `tri` is not square, if its order differs from `dst.ncols()`, or if
    /// `tri_structure` is [`BlockStructure::Rectangular`].
    #[track_caller]
    pub fn mul_on_the_right_in_place<T: ComplexField>(
        mut dst: MatMut<'_, T>,
        tri: MatRef<'_, T>,
        tri_structure: BlockStructure,
        conj_tri: Conj,
    ) {
        fancy_assert!(!tri_structure.is_dense());
        fancy_assert!(tri.nrows() == tri.ncols());
        fancy_assert!(dst.ncols() == tri.nrows());

        let k = tri.nrows();
        let entry = |l: usize, j: usize| conj_tri.apply(read(tri, tri_structure, l, j));

        for r in 0..dst.nrows() {
            if tri_structure.is_upper() {
                // column `j` of the product only depends on columns `0..=j` of `dst`
                for j in (0..k).rev() {
                    let mut acc = T::zero();
                    for l in 0..=j {
                        acc = acc + dst[(r, l)] * entry(l, j);
                    }
                    dst[(r, j)] = acc;
                }
            } else {
                for j in 0..k {
                    let mut acc = T::zero();
                    for l in j..k {
                        acc = acc + dst[(r, l)] * entry(l, j);
                    }
                    dst[(r, j)] = acc;
                }
            }
        }
    }

    /// Copies `src` into `dst`, writing the implicit zeros and unit diagonal of `structure`
    /// explicitly.
    #[track_caller]
    pub fn structured_copy<T: ComplexField>(
        mut dst: MatMut<'_, T>,
        src: MatRef<'_, T>,
        structure: BlockStructure,
    ) {
        fancy_assert!(dst.nrows() == src.nrows());
        fancy_assert!(dst.ncols() == src.ncols());
        for j in 0..src.ncols() {
            for i in 0..src.nrows() {
                dst[(i, j)] = read(src, structure, i, j);
            }
        }
    }
}
