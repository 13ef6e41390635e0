//! `lakit` core module.
//!
//! This module contains:
//! - the scalar traits ([`ComplexField`], [`RealField`], [`Promote`]),
//! - strided matrix and vector views ([`MatRef`], [`MatMut`], etc.) and the owning [`Mat`],
//! - the BLAS/LAPACK style enumerations shared by every kernel,
//! - Householder reflector kernels ([`householder`]),
//! - the Hermitian rank-2k update ([`her2k`](crate::her2k::her2k)).
//!
//! Kernels never allocate: every buffer, including workspace, is provided by the caller.

#![warn(rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]
#![cfg_attr(not(feature = "std"), no_std)]

use assert2::{assert as fancy_assert, debug_assert as fancy_debug_assert};
use core::{
    any::TypeId,
    fmt::Debug,
    marker::PhantomData,
    ops::{Add, Div, Index, IndexMut, Mul, Neg, Sub},
    ptr::NonNull,
};
use num_traits::Float;
use reborrow::*;

extern crate alloc;

use alloc::vec::Vec;

pub mod her2k;
pub mod householder;
pub mod mul;

/// Complex floating point number type, where the real and imaginary parts each occupy 32 bits.
#[allow(non_camel_case_types)]
pub type c32 = num_complex::Complex<f32>;
/// Complex floating point number type, where the real and imaginary parts each occupy 64 bits.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex<f64>;

/// Indicates whether the corresponding operand should be conjugated or not.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Conj {
    /// Do not conjugate
    No,
    /// Do conjugate
    Yes,
}

impl Conj {
    /// Returns the conjugation obtained by applying `self` after `other`.
    #[inline]
    pub fn compose(self, other: Conj) -> Conj {
        if self == other {
            Conj::No
        } else {
            Conj::Yes
        }
    }

    /// Conjugates `value` if `self` is [`Conj::Yes`].
    #[inline(always)]
    pub fn apply<T: ComplexField>(self, value: T) -> T {
        match self {
            Conj::No => value,
            Conj::Yes => value.conj(),
        }
    }
}

/// Storage order of a dense matrix held in a flat slice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Element `(i, j)` is stored at `i + j * ld`.
    ColumnMajor,
    /// Element `(i, j)` is stored at `i * ld + j`.
    RowMajor,
}

impl Layout {
    /// Smallest valid leading dimension for an `nrows×ncols` matrix with this layout.
    #[inline]
    pub fn min_leading_dim(self, nrows: usize, ncols: usize) -> usize {
        let minor = match self {
            Layout::ColumnMajor => nrows,
            Layout::RowMajor => ncols,
        };
        Ord::max(1, minor)
    }

    /// Number of slice elements an `nrows×ncols` matrix with leading dimension
    /// `leading_dim` spans, or `None` on overflow.
    #[inline]
    pub fn required_len(self, nrows: usize, ncols: usize, leading_dim: usize) -> Option<usize> {
        if nrows == 0 || ncols == 0 {
            return Some(0);
        }
        let (major, minor) = match self {
            Layout::ColumnMajor => (ncols, nrows),
            Layout::RowMajor => (nrows, ncols),
        };
        (major - 1).checked_mul(leading_dim)?.checked_add(minor)
    }
}

/// Which triangle of a Hermitian matrix is referenced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Uplo {
    Lower,
    Upper,
    /// The upper triangle is computed and the lower one is filled with its conjugate mirror.
    General,
}

impl Uplo {
    /// The triangle that holds the same data once the matrix is transposed.
    #[inline]
    pub fn transpose(self) -> Uplo {
        match self {
            Uplo::Lower => Uplo::Upper,
            Uplo::Upper => Uplo::Lower,
            Uplo::General => Uplo::General,
        }
    }
}

/// Operation applied to an operand before it is used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    NoTrans,
    Trans,
    ConjTrans,
}

/// Side from which an operator is applied to a matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Order in which the reflectors of a block are multiplied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `H = H(0) H(1) ... H(k-1)`
    Forward,
    /// `H = H(k-1) ... H(1) H(0)`
    Backward,
}

/// Whether the reflectors of a block are stored as columns or rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StoreV {
    Columnwise,
    /// Each reflector is stored conjugated in a row, so the column form is the adjoint.
    Rowwise,
}

/// Region of a [`MatMut`] that a kernel is allowed to write.
///
/// A view created from a slice is [`AccessPolicy::Dense`]. Sub-views inherit the policy of the
/// view they were taken from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccessPolicy {
    Dense,
    /// `i <= j + 1`
    UpperHessenberg,
    /// `j <= i + 1`
    LowerHessenberg,
    /// `i <= j`
    UpperTriangle,
    /// `i >= j`
    LowerTriangle,
    /// `i < j`
    StrictUpper,
    /// `i > j`
    StrictLower,
}

impl AccessPolicy {
    /// Returns `true` if every entry covered by `required` is covered by `self`.
    pub fn grants(self, required: AccessPolicy) -> bool {
        use AccessPolicy::*;
        match self {
            Dense => true,
            UpperHessenberg => matches!(required, UpperHessenberg | UpperTriangle | StrictUpper),
            LowerHessenberg => matches!(required, LowerHessenberg | LowerTriangle | StrictLower),
            UpperTriangle => matches!(required, UpperTriangle | StrictUpper),
            LowerTriangle => matches!(required, LowerTriangle | StrictLower),
            StrictUpper => required == StrictUpper,
            StrictLower => required == StrictLower,
        }
    }

    /// Returns `true` if the entry `(i, j)` belongs to the region.
    pub fn contains(self, i: usize, j: usize) -> bool {
        use AccessPolicy::*;
        match self {
            Dense => true,
            UpperHessenberg => i <= j + 1,
            LowerHessenberg => j <= i + 1,
            UpperTriangle => i <= j,
            LowerTriangle => i >= j,
            StrictUpper => i < j,
            StrictLower => i > j,
        }
    }
}

/// Returns `true` if a kernel that needs `required` may not write through a view granting
/// `granted`.
#[inline]
pub fn access_denied(required: AccessPolicy, granted: AccessPolicy) -> bool {
    !granted.grants(required)
}

/// Errors reported by the kernels. Every check happens before the first write, so an error
/// leaves all inputs untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// A dimension, leading dimension, workspace size or enumeration value is not acceptable.
    InvalidArgument { arg: &'static str },
    /// The access policy of an output view does not cover the region the kernel writes.
    AccessDenied { arg: &'static str },
}

impl core::fmt::Display for KernelError {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KernelError {}

/// Trait that describes a complex number field.
///
/// Real numbers can also be seen as complex numbers, where the imaginary part is always zero.
/// The kernels of this crate are written once against this trait, so a user-provided scalar
/// type (e.g. an extended precision float) only needs to implement it.
pub trait ComplexField:
    Copy
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + Debug
    + 'static
{
    type Real: RealField;

    /// Returns a complex number whose real part is equal to `real`, and a zero imaginary part.
    fn from_real(real: Self::Real) -> Self;
    /// Returns the real and imaginary part.
    fn into_real_imag(self) -> (Self::Real, Self::Real);
    /// Returns the real part.
    #[inline(always)]
    fn real(self) -> Self::Real {
        self.into_real_imag().0
    }
    /// Returns the imaginary part.
    #[inline(always)]
    fn imag(self) -> Self::Real {
        self.into_real_imag().1
    }

    /// Returns the value representing `0.0`.
    fn zero() -> Self;
    /// Returns the value representing `1.0`.
    fn one() -> Self;

    /// Returns the inverse of the number.
    fn inv(self) -> Self;
    /// Returns the conjugate of the number.
    fn conj(self) -> Self;
    /// Returns the square root of the number.
    fn sqrt(self) -> Self;
    /// Returns the input, scaled by `factor`.
    #[inline(always)]
    fn scale(self, factor: Self::Real) -> Self {
        self * Self::from_real(factor)
    }
    /// Returns the squared modulus.
    #[inline(always)]
    fn abs2(self) -> Self::Real {
        let (re, im) = self.into_real_imag();
        re * re + im * im
    }
    /// Returns the modulus.
    #[inline(always)]
    fn abs(self) -> Self::Real {
        self.abs2().sqrt()
    }
}

/// Trait that describes a real number field.
pub trait RealField: ComplexField<Real = Self> + PartialOrd {}

/// Returns `true` if `T` has no imaginary part.
#[inline(always)]
pub fn is_real<T: ComplexField>() -> bool {
    TypeId::of::<T>() == TypeId::of::<T::Real>()
}

macro_rules! impl_real_field {
    ($($ty: ty),*) => {$(
        impl RealField for $ty {}
        impl ComplexField for $ty {
            type Real = $ty;

            #[inline(always)]
            fn from_real(real: Self::Real) -> Self {
                real
            }
            #[inline(always)]
            fn into_real_imag(self) -> (Self::Real, Self::Real) {
                (self, 0.0)
            }
            #[inline(always)]
            fn zero() -> Self {
                0.0
            }
            #[inline(always)]
            fn one() -> Self {
                1.0
            }
            #[inline(always)]
            fn inv(self) -> Self {
                1.0 / self
            }
            #[inline(always)]
            fn conj(self) -> Self {
                self
            }
            #[inline(always)]
            fn sqrt(self) -> Self {
                Float::sqrt(self)
            }
            #[inline(always)]
            fn abs2(self) -> Self::Real {
                self * self
            }
            #[inline(always)]
            fn abs(self) -> Self::Real {
                Float::abs(self)
            }
        }
    )*};
}

macro_rules! impl_complex_field {
    ($($ty: ty => $real: ty),*) => {$(
        impl ComplexField for $ty {
            type Real = $real;

            #[inline(always)]
            fn from_real(real: Self::Real) -> Self {
                <$ty>::new(real, 0.0)
            }
            #[inline(always)]
            fn into_real_imag(self) -> (Self::Real, Self::Real) {
                (self.re, self.im)
            }
            #[inline(always)]
            fn zero() -> Self {
                <$ty>::new(0.0, 0.0)
            }
            #[inline(always)]
            fn one() -> Self {
                <$ty>::new(1.0, 0.0)
            }
            #[inline(always)]
            fn inv(self) -> Self {
                num_complex::Complex::inv(&self)
            }
            #[inline(always)]
            fn conj(self) -> Self {
                <$ty>::new(self.re, -self.im)
            }
            #[inline(always)]
            fn sqrt(self) -> Self {
                num_complex::Complex::sqrt(self)
            }
            #[inline(always)]
            fn scale(self, factor: Self::Real) -> Self {
                <$ty>::new(self.re * factor, self.im * factor)
            }
            #[inline(always)]
            fn abs(self) -> Self::Real {
                self.norm()
            }
        }
    )*};
}

impl_real_field!(f32, f64);
impl_complex_field!(c32 => f32, c64 => f64);

/// Common scalar type of two element types, used to run mixed-type kernels.
///
/// Same-type promotion is provided for every [`ComplexField`], so a user scalar type takes part
/// in generic kernels without further work. The built-in types promote real to complex and
/// `f32` to `f64`.
pub trait Promote<Rhs: ComplexField>: ComplexField {
    type Output: ComplexField;

    fn promote_lhs(lhs: Self) -> <Self as Promote<Rhs>>::Output;
    fn promote_rhs(rhs: Rhs) -> <Self as Promote<Rhs>>::Output;
}

/// Promoted scalar type of `A` and `B`.
pub type ScalarType<A, B> = <A as Promote<B>>::Output;
/// Real part type of [`ScalarType<A, B>`].
pub type RealType<A, B> = <ScalarType<A, B> as ComplexField>::Real;

impl<T: ComplexField> Promote<T> for T {
    type Output = T;

    #[inline(always)]
    fn promote_lhs(lhs: Self) -> T {
        lhs
    }
    #[inline(always)]
    fn promote_rhs(rhs: T) -> T {
        rhs
    }
}

macro_rules! impl_promote {
    ($($lhs: ty, $rhs: ty => $out: ty, |$l: ident| $lconv: expr, |$r: ident| $rconv: expr;)*) => {$(
        impl Promote<$rhs> for $lhs {
            type Output = $out;

            #[inline(always)]
            fn promote_lhs($l: Self) -> $out {
                $lconv
            }
            #[inline(always)]
            fn promote_rhs($r: $rhs) -> $out {
                $rconv
            }
        }
    )*};
}

impl_promote! {
    f32, f64 => f64, |l| l as f64, |r| r;
    f64, f32 => f64, |l| l, |r| r as f64;
    f32, c32 => c32, |l| c32::new(l, 0.0), |r| r;
    c32, f32 => c32, |l| l, |r| c32::new(r, 0.0);
    f32, c64 => c64, |l| c64::new(l as f64, 0.0), |r| r;
    c64, f32 => c64, |l| l, |r| c64::new(r as f64, 0.0);
    f64, c32 => c64, |l| c64::new(l, 0.0), |r| c64::new(r.re as f64, r.im as f64);
    c32, f64 => c64, |l| c64::new(l.re as f64, l.im as f64), |r| c64::new(r, 0.0);
    f64, c64 => c64, |l| c64::new(l, 0.0), |r| r;
    c64, f64 => c64, |l| l, |r| c64::new(r, 0.0);
    c32, c64 => c64, |l| c64::new(l.re as f64, l.im as f64), |r| r;
    c64, c32 => c64, |l| l, |r| c64::new(r.re as f64, r.im as f64);
}

struct MatrixSliceBase<T> {
    ptr: NonNull<T>,
    nrows: usize,
    ncols: usize,
    row_stride: isize,
    col_stride: isize,
}
struct VecSliceBase<T> {
    ptr: NonNull<T>,
    len: usize,
    stride: isize,
}

impl<T> Copy for MatrixSliceBase<T> {}
impl<T> Clone for MatrixSliceBase<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for VecSliceBase<T> {}
impl<T> Clone for VecSliceBase<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

/// Matrix view with general row and column strides.
pub struct MatRef<'a, T> {
    base: MatrixSliceBase<T>,
    _marker: PhantomData<&'a T>,
}

/// Mutable matrix view with general row and column strides, restricted to the region
/// described by its [`AccessPolicy`].
pub struct MatMut<'a, T> {
    base: MatrixSliceBase<T>,
    policy: AccessPolicy,
    _marker: PhantomData<&'a mut T>,
}

/// Column vector view with general stride.
pub struct ColRef<'a, T> {
    base: VecSliceBase<T>,
    _marker: PhantomData<&'a T>,
}

/// Mutable column vector view with general stride.
pub struct ColMut<'a, T> {
    base: VecSliceBase<T>,
    _marker: PhantomData<&'a mut T>,
}

/// Row vector view with general stride.
pub struct RowRef<'a, T> {
    base: VecSliceBase<T>,
    _marker: PhantomData<&'a T>,
}

/// Mutable row vector view with general stride.
pub struct RowMut<'a, T> {
    base: VecSliceBase<T>,
    _marker: PhantomData<&'a mut T>,
}

// SAFETY: the views behave like `&T` and `&mut T`.
unsafe impl<'a, T: Sync> Send for MatRef<'a, T> {}
unsafe impl<'a, T: Sync> Sync for MatRef<'a, T> {}
unsafe impl<'a, T: Send> Send for MatMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for MatMut<'a, T> {}
unsafe impl<'a, T: Sync> Send for ColRef<'a, T> {}
unsafe impl<'a, T: Sync> Sync for ColRef<'a, T> {}
unsafe impl<'a, T: Send> Send for ColMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for ColMut<'a, T> {}
unsafe impl<'a, T: Sync> Send for RowRef<'a, T> {}
unsafe impl<'a, T: Sync> Sync for RowRef<'a, T> {}
unsafe impl<'a, T: Send> Send for RowMut<'a, T> {}
unsafe impl<'a, T: Sync> Sync for RowMut<'a, T> {}

impl<'a, T> Copy for MatRef<'a, T> {}
impl<'a, T> Clone for MatRef<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T> Copy for ColRef<'a, T> {}
impl<'a, T> Clone for ColRef<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, T> Copy for RowRef<'a, T> {}
impl<'a, T> Clone for RowRef<'a, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

macro_rules! impl_reborrow {
    ($($ref: ident, $mut: ident, { $($policy: tt)* };)*) => {$(
        impl<'b, 'a, T> Reborrow<'b> for $ref<'a, T> {
            type Target = $ref<'b, T>;
            #[inline]
            fn rb(&'b self) -> Self::Target {
                *self
            }
        }
        impl<'b, 'a, T> ReborrowMut<'b> for $ref<'a, T> {
            type Target = $ref<'b, T>;
            #[inline]
            fn rb_mut(&'b mut self) -> Self::Target {
                *self
            }
        }
        impl<'b, 'a, T> Reborrow<'b> for $mut<'a, T> {
            type Target = $ref<'b, T>;
            #[inline]
            fn rb(&'b self) -> Self::Target {
                $ref {
                    base: self.base,
                    _marker: PhantomData,
                }
            }
        }
        impl<'b, 'a, T> ReborrowMut<'b> for $mut<'a, T> {
            type Target = $mut<'b, T>;
            #[inline]
            fn rb_mut(&'b mut self) -> Self::Target {
                $mut {
                    base: self.base,
                    $($policy: self.$policy,)*
                    _marker: PhantomData,
                }
            }
        }
        impl<'a, T> IntoConst for $mut<'a, T> {
            type Target = $ref<'a, T>;
            #[inline]
            fn into_const(self) -> Self::Target {
                $ref {
                    base: self.base,
                    _marker: PhantomData,
                }
            }
        }
    )*};
}

impl_reborrow! {
    MatRef, MatMut, { policy };
    ColRef, ColMut, {};
    RowRef, RowMut, {};
}

impl<'a, T> MatRef<'a, T> {
    /// Returns a matrix view from the given arguments.
    ///
    /// # Safety
    ///
    /// For every `i < nrows` and `j < ncols`, `ptr.offset(i * row_stride + j * col_stride)` must
    /// point to a valid `T` that is not mutated for the lifetime `'a`.
    #[inline]
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            base: MatrixSliceBase {
                ptr: NonNull::new_unchecked(ptr as *mut T),
                nrows,
                ncols,
                row_stride,
                col_stride,
            },
            _marker: PhantomData,
        }
    }

    /// Returns a view over an `nrows×ncols` matrix stored in `slice` with the given layout.
    ///
    /// # Panics
    ///
    /// Panics if `leading_dim` is smaller than [`Layout::min_leading_dim`], or if the slice is
    /// too short.
    #[track_caller]
    pub fn from_slice_with_layout(
        slice: &'a [T],
        nrows: usize,
        ncols: usize,
        layout: Layout,
        leading_dim: usize,
    ) -> Self {
        let (row_stride, col_stride) = check_slice(slice.len(), nrows, ncols, layout, leading_dim);
        // SAFETY: every element lies inside `slice`, which was checked above.
        unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, row_stride, col_stride) }
    }

    /// Column-major view, element `(i, j)` at `slice[i + j * col_stride]`.
    #[track_caller]
    #[inline]
    pub fn from_column_major_slice(
        slice: &'a [T],
        nrows: usize,
        ncols: usize,
        col_stride: usize,
    ) -> Self {
        Self::from_slice_with_layout(slice, nrows, ncols, Layout::ColumnMajor, col_stride)
    }

    /// Row-major view, element `(i, j)` at `slice[i * row_stride + j]`.
    #[track_caller]
    #[inline]
    pub fn from_row_major_slice(
        slice: &'a [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        Self::from_slice_with_layout(slice, nrows, ncols, Layout::RowMajor, row_stride)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.base.nrows
    }
    #[inline]
    pub fn ncols(&self) -> usize {
        self.base.ncols
    }
    #[inline]
    pub fn row_stride(&self) -> isize {
        self.base.row_stride
    }
    #[inline]
    pub fn col_stride(&self) -> isize {
        self.base.col_stride
    }

    /// Returns the layout matching the strides of the view, if any.
    #[inline]
    pub fn layout(&self) -> Option<Layout> {
        if self.row_stride() == 1 {
            Some(Layout::ColumnMajor)
        } else if self.col_stride() == 1 {
            Some(Layout::RowMajor)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_ptr(self) -> *const T {
        self.base.ptr.as_ptr()
    }

    /// Returns a pointer to the element at the given position, without bound checks.
    #[inline]
    pub fn ptr_at(self, i: usize, j: usize) -> *const T {
        self.base
            .ptr
            .as_ptr()
            .wrapping_offset(i as isize * self.row_stride())
            .wrapping_offset(j as isize * self.col_stride())
    }

    /// Splits the view at the given position into four quadrants: top left, top right, bottom
    /// left, bottom right.
    #[track_caller]
    #[inline]
    pub fn split_at(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
        fancy_assert!(i <= self.nrows());
        fancy_assert!(j <= self.ncols());
        let (m, n) = (self.nrows(), self.ncols());
        let (rs, cs) = (self.row_stride(), self.col_stride());
        // SAFETY: the quadrants are within the bounds of `self`.
        unsafe {
            (
                Self::from_raw_parts(self.ptr_at(0, 0), i, j, rs, cs),
                Self::from_raw_parts(self.ptr_at(0, j), i, n - j, rs, cs),
                Self::from_raw_parts(self.ptr_at(i, 0), m - i, j, rs, cs),
                Self::from_raw_parts(self.ptr_at(i, j), m - i, n - j, rs, cs),
            )
        }
    }

    /// Splits the view horizontally at row `i`.
    #[track_caller]
    #[inline]
    pub fn split_at_row(self, i: usize) -> (Self, Self) {
        let (top, _, bot, _) = self.split_at(i, 0);
        let ncols = self.ncols();
        (top.with_ncols(ncols), bot.with_ncols(ncols))
    }

    /// Splits the view vertically at column `j`.
    #[track_caller]
    #[inline]
    pub fn split_at_col(self, j: usize) -> (Self, Self) {
        let (left, right, _, _) = self.split_at(0, j);
        let nrows = self.nrows();
        (left.with_nrows(nrows), right.with_nrows(nrows))
    }

    #[inline]
    fn with_nrows(mut self, nrows: usize) -> Self {
        self.base.nrows = nrows;
        self
    }
    #[inline]
    fn with_ncols(mut self, ncols: usize) -> Self {
        self.base.ncols = ncols;
        self
    }

    /// Returns the `nrows×ncols` block starting at `(i, j)`.
    #[track_caller]
    #[inline]
    pub fn submatrix(self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        fancy_assert!(i <= self.nrows());
        fancy_assert!(j <= self.ncols());
        fancy_assert!(nrows <= self.nrows() - i);
        fancy_assert!(ncols <= self.ncols() - j);
        // SAFETY: the block is within the bounds of `self`.
        unsafe {
            Self::from_raw_parts(
                self.ptr_at(i, j),
                nrows,
                ncols,
                self.row_stride(),
                self.col_stride(),
            )
        }
    }

    #[track_caller]
    #[inline]
    pub fn row(self, i: usize) -> RowRef<'a, T> {
        fancy_assert!(i < self.nrows());
        // SAFETY: row `i` is within the bounds of `self`.
        unsafe { RowRef::from_raw_parts(self.ptr_at(i, 0), self.ncols(), self.col_stride()) }
    }

    #[track_caller]
    #[inline]
    pub fn col(self, j: usize) -> ColRef<'a, T> {
        fancy_assert!(j < self.ncols());
        // SAFETY: column `j` is within the bounds of `self`.
        unsafe { ColRef::from_raw_parts(self.ptr_at(0, j), self.nrows(), self.row_stride()) }
    }

    /// Returns the main diagonal as a column vector.
    #[inline]
    pub fn diagonal(self) -> ColRef<'a, T> {
        let len = Ord::min(self.nrows(), self.ncols());
        // SAFETY: the diagonal entries are within the bounds of `self`.
        unsafe {
            ColRef::from_raw_parts(
                self.as_ptr(),
                len,
                self.row_stride() + self.col_stride(),
            )
        }
    }

    #[inline]
    pub fn transpose(self) -> Self {
        // SAFETY: same elements, swapped strides.
        unsafe {
            Self::from_raw_parts(
                self.as_ptr(),
                self.ncols(),
                self.nrows(),
                self.col_stride(),
                self.row_stride(),
            )
        }
    }

    #[track_caller]
    #[inline]
    pub fn get(self, i: usize, j: usize) -> &'a T {
        fancy_assert!(i < self.nrows());
        fancy_assert!(j < self.ncols());
        // SAFETY: bounds checked above.
        unsafe { &*self.ptr_at(i, j) }
    }

    /// Reads the element at `(i, j)` without bound checks.
    ///
    /// # Safety
    ///
    /// `i < nrows` and `j < ncols` must hold.
    #[track_caller]
    #[inline(always)]
    pub unsafe fn read_unchecked(self, i: usize, j: usize) -> T
    where
        T: Copy,
    {
        fancy_debug_assert!(i < self.nrows());
        fancy_debug_assert!(j < self.ncols());
        *self.ptr_at(i, j)
    }
}

impl<'a, T> MatMut<'a, T> {
    /// Returns a mutable matrix view from the given arguments, with a [`AccessPolicy::Dense`]
    /// policy.
    ///
    /// # Safety
    ///
    /// For every `i < nrows` and `j < ncols`, `ptr.offset(i * row_stride + j * col_stride)` must
    /// point to a valid `T` that is not accessed through any other pointer for the lifetime
    /// `'a`, and distinct `(i, j)` must map to distinct elements.
    #[inline]
    pub unsafe fn from_raw_parts(
        ptr: *mut T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            base: MatrixSliceBase {
                ptr: NonNull::new_unchecked(ptr),
                nrows,
                ncols,
                row_stride,
                col_stride,
            },
            policy: AccessPolicy::Dense,
            _marker: PhantomData,
        }
    }

    /// Returns a mutable view over an `nrows×ncols` matrix stored in `slice` with the given
    /// layout.
    ///
    /// # Panics
    ///
    /// Panics if `leading_dim` is smaller than [`Layout::min_leading_dim`], or if the slice is
    /// too short.
    #[track_caller]
    pub fn from_slice_with_layout(
        slice: &'a mut [T],
        nrows: usize,
        ncols: usize,
        layout: Layout,
        leading_dim: usize,
    ) -> Self {
        let (row_stride, col_stride) = check_slice(slice.len(), nrows, ncols, layout, leading_dim);
        // SAFETY: every element lies inside `slice`, and the leading dimension is at least the
        // minor extent, so no two positions alias.
        unsafe { Self::from_raw_parts(slice.as_mut_ptr(), nrows, ncols, row_stride, col_stride) }
    }

    #[track_caller]
    #[inline]
    pub fn from_column_major_slice(
        slice: &'a mut [T],
        nrows: usize,
        ncols: usize,
        col_stride: usize,
    ) -> Self {
        Self::from_slice_with_layout(slice, nrows, ncols, Layout::ColumnMajor, col_stride)
    }

    #[track_caller]
    #[inline]
    pub fn from_row_major_slice(
        slice: &'a mut [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        Self::from_slice_with_layout(slice, nrows, ncols, Layout::RowMajor, row_stride)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.base.nrows
    }
    #[inline]
    pub fn ncols(&self) -> usize {
        self.base.ncols
    }
    #[inline]
    pub fn row_stride(&self) -> isize {
        self.base.row_stride
    }
    #[inline]
    pub fn col_stride(&self) -> isize {
        self.base.col_stride
    }
    #[inline]
    pub fn layout(&self) -> Option<Layout> {
        self.rb().layout()
    }

    /// Region of the view that kernels may write.
    #[inline]
    pub fn access_policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Restricts the writable region of the view.
    #[inline]
    pub fn with_access_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn as_ptr(self) -> *mut T {
        self.base.ptr.as_ptr()
    }

    #[inline]
    pub fn ptr_at(self, i: usize, j: usize) -> *mut T {
        self.into_const().ptr_at(i, j) as *mut T
    }

    #[inline]
    unsafe fn from_const(src: MatRef<'a, T>, policy: AccessPolicy) -> Self {
        let mut dst = Self::from_raw_parts(
            src.as_ptr() as *mut T,
            src.nrows(),
            src.ncols(),
            src.row_stride(),
            src.col_stride(),
        );
        dst.policy = policy;
        dst
    }

    #[track_caller]
    #[inline]
    pub fn split_at(self, i: usize, j: usize) -> (Self, Self, Self, Self) {
        let policy = self.policy;
        let (top_left, top_right, bot_left, bot_right) = self.into_const().split_at(i, j);
        // SAFETY: the quadrants are disjoint.
        unsafe {
            (
                Self::from_const(top_left, policy),
                Self::from_const(top_right, policy),
                Self::from_const(bot_left, policy),
                Self::from_const(bot_right, policy),
            )
        }
    }

    #[track_caller]
    #[inline]
    pub fn split_at_row(self, i: usize) -> (Self, Self) {
        let policy = self.policy;
        let (top, bot) = self.into_const().split_at_row(i);
        // SAFETY: the halves are disjoint.
        unsafe { (Self::from_const(top, policy), Self::from_const(bot, policy)) }
    }

    #[track_caller]
    #[inline]
    pub fn split_at_col(self, j: usize) -> (Self, Self) {
        let policy = self.policy;
        let (left, right) = self.into_const().split_at_col(j);
        // SAFETY: the halves are disjoint.
        unsafe { (Self::from_const(left, policy), Self::from_const(right, policy)) }
    }

    #[track_caller]
    #[inline]
    pub fn submatrix(self, i: usize, j: usize, nrows: usize, ncols: usize) -> Self {
        let policy = self.policy;
        // SAFETY: exclusive access to `self` is transferred to the block.
        unsafe { Self::from_const(self.into_const().submatrix(i, j, nrows, ncols), policy) }
    }

    /// Returns row `i` as a vector view.
    ///
    /// Vector views carry no access policy, so the whole row must be writable under the policy
    /// of `self`.
    #[track_caller]
    #[inline]
    pub fn row(self, i: usize) -> RowMut<'a, T> {
        let policy = self.policy;
        fancy_assert!((0..self.ncols()).all(|j| policy.contains(i, j)));
        let row = self.into_const().row(i);
        // SAFETY: exclusive access to `self` is transferred to the row.
        unsafe { RowMut::from_raw_parts(row.as_ptr() as *mut T, row.ncols(), row.stride()) }
    }

    /// Returns column `j` as a vector view. The whole column must be writable under the policy
    /// of `self`.
    #[track_caller]
    #[inline]
    pub fn col(self, j: usize) -> ColMut<'a, T> {
        let policy = self.policy;
        fancy_assert!((0..self.nrows()).all(|i| policy.contains(i, j)));
        let col = self.into_const().col(j);
        // SAFETY: exclusive access to `self` is transferred to the column.
        unsafe { ColMut::from_raw_parts(col.as_ptr() as *mut T, col.nrows(), col.stride()) }
    }

    /// Returns the diagonal as a vector view. Fails for the strict triangular policies unless
    /// the diagonal is empty.
    #[track_caller]
    #[inline]
    pub fn diagonal(self) -> ColMut<'a, T> {
        let policy = self.policy;
        let size = Ord::min(self.nrows(), self.ncols());
        fancy_assert!((0..size).all(|k| policy.contains(k, k)));
        let diag = self.into_const().diagonal();
        // SAFETY: exclusive access to `self` is transferred to the diagonal.
        unsafe { ColMut::from_raw_parts(diag.as_ptr() as *mut T, diag.nrows(), diag.stride()) }
    }

    /// Transposes the view. The access policy is transposed along with it.
    #[inline]
    pub fn transpose(self) -> Self {
        use AccessPolicy::*;
        let policy = match self.policy {
            Dense => Dense,
            UpperHessenberg => LowerHessenberg,
            LowerHessenberg => UpperHessenberg,
            UpperTriangle => LowerTriangle,
            LowerTriangle => UpperTriangle,
            StrictUpper => StrictLower,
            StrictLower => StrictUpper,
        };
        // SAFETY: same elements, swapped strides.
        unsafe { Self::from_const(self.into_const().transpose(), policy) }
    }

    #[track_caller]
    #[inline]
    pub fn get(self, i: usize, j: usize) -> &'a mut T {
        fancy_assert!(i < self.nrows());
        fancy_assert!(j < self.ncols());
        // SAFETY: bounds checked above, and `self` is an exclusive view.
        unsafe { &mut *self.ptr_at(i, j) }
    }

    /// Writes `value` to every element of the view.
    #[inline]
    pub fn fill(mut self, value: T)
    where
        T: Copy,
    {
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                self[(i, j)] = value;
            }
        }
    }

    /// Copies `src` into `self`.
    #[track_caller]
    pub fn clone_from(mut self, src: MatRef<'_, T>)
    where
        T: Copy,
    {
        fancy_assert!(src.nrows() == self.nrows());
        fancy_assert!(src.ncols() == self.ncols());
        for j in 0..self.ncols() {
            for i in 0..self.nrows() {
                self[(i, j)] = src[(i, j)];
            }
        }
    }
}

#[track_caller]
fn check_slice(
    len: usize,
    nrows: usize,
    ncols: usize,
    layout: Layout,
    leading_dim: usize,
) -> (isize, isize) {
    fancy_assert!(leading_dim >= layout.min_leading_dim(nrows, ncols));
    let required = layout.required_len(nrows, ncols, leading_dim);
    fancy_assert!(required.is_some());
    fancy_assert!(required.unwrap_or(usize::MAX) <= len);
    match layout {
        Layout::ColumnMajor => (1, leading_dim as isize),
        Layout::RowMajor => (leading_dim as isize, 1),
    }
}

macro_rules! impl_vec_views {
    ($($ref: ident, $mut: ident, $len: ident, $other: ident, $mut_other: ident;)*) => {$(
        impl<'a, T> $ref<'a, T> {
            /// # Safety
            ///
            /// For every `i < len`, `ptr.offset(i * stride)` must point to a valid `T` that is
            /// not mutated for the lifetime `'a`.
            #[inline]
            pub unsafe fn from_raw_parts(ptr: *const T, len: usize, stride: isize) -> Self {
                Self {
                    base: VecSliceBase {
                        ptr: NonNull::new_unchecked(ptr as *mut T),
                        len,
                        stride,
                    },
                    _marker: PhantomData,
                }
            }

            /// View over a contiguous slice.
            #[inline]
            pub fn from_slice(slice: &'a [T]) -> Self {
                // SAFETY: the elements are those of `slice`.
                unsafe { Self::from_raw_parts(slice.as_ptr(), slice.len(), 1) }
            }

            #[inline]
            pub fn $len(&self) -> usize {
                self.base.len
            }
            #[inline]
            pub fn stride(&self) -> isize {
                self.base.stride
            }
            #[inline]
            pub fn as_ptr(self) -> *const T {
                self.base.ptr.as_ptr()
            }
            #[inline]
            pub fn ptr_at(self, i: usize) -> *const T {
                self.base
                    .ptr
                    .as_ptr()
                    .wrapping_offset(i as isize * self.stride())
            }

            /// Splits the vector at index `i`.
            #[track_caller]
            #[inline]
            pub fn split_at(self, i: usize) -> (Self, Self) {
                fancy_assert!(i <= self.$len());
                let stride = self.stride();
                // SAFETY: the halves are within the bounds of `self`.
                unsafe {
                    (
                        Self::from_raw_parts(self.as_ptr(), i, stride),
                        Self::from_raw_parts(self.ptr_at(i), self.$len() - i, stride),
                    )
                }
            }

            /// Returns the `len` elements starting at `start`.
            #[track_caller]
            #[inline]
            pub fn subvector(self, start: usize, len: usize) -> Self {
                fancy_assert!(start <= self.$len());
                fancy_assert!(len <= self.$len() - start);
                // SAFETY: bounds checked above.
                unsafe { Self::from_raw_parts(self.ptr_at(start), len, self.stride()) }
            }

            #[inline]
            pub fn transpose(self) -> $other<'a, T> {
                // SAFETY: same elements.
                unsafe { $other::from_raw_parts(self.as_ptr(), self.$len(), self.stride()) }
            }

            #[track_caller]
            #[inline]
            pub fn get(self, i: usize) -> &'a T {
                fancy_assert!(i < self.$len());
                // SAFETY: bounds checked above.
                unsafe { &*self.ptr_at(i) }
            }
        }

        impl<'a, T> $mut<'a, T> {
            /// # Safety
            ///
            /// For every `i < len`, `ptr.offset(i * stride)` must point to a distinct valid `T`
            /// that is not accessed through any other pointer for the lifetime `'a`.
            #[inline]
            pub unsafe fn from_raw_parts(ptr: *mut T, len: usize, stride: isize) -> Self {
                Self {
                    base: VecSliceBase {
                        ptr: NonNull::new_unchecked(ptr),
                        len,
                        stride,
                    },
                    _marker: PhantomData,
                }
            }

            /// Mutable view over a contiguous slice.
            #[inline]
            pub fn from_slice(slice: &'a mut [T]) -> Self {
                // SAFETY: the elements are those of `slice`.
                unsafe { Self::from_raw_parts(slice.as_mut_ptr(), slice.len(), 1) }
            }

            #[inline]
            pub fn $len(&self) -> usize {
                self.base.len
            }
            #[inline]
            pub fn stride(&self) -> isize {
                self.base.stride
            }
            #[inline]
            pub fn as_ptr(self) -> *mut T {
                self.base.ptr.as_ptr()
            }
            #[inline]
            pub fn ptr_at(self, i: usize) -> *mut T {
                self.into_const().ptr_at(i) as *mut T
            }

            #[track_caller]
            #[inline]
            pub fn split_at(self, i: usize) -> (Self, Self) {
                let (head, tail) = self.into_const().split_at(i);
                // SAFETY: the halves are disjoint.
                unsafe {
                    (
                        Self::from_raw_parts(head.as_ptr() as *mut T, head.$len(), head.stride()),
                        Self::from_raw_parts(tail.as_ptr() as *mut T, tail.$len(), tail.stride()),
                    )
                }
            }

            #[track_caller]
            #[inline]
            pub fn subvector(self, start: usize, len: usize) -> Self {
                let sub = self.into_const().subvector(start, len);
                // SAFETY: exclusive access to `self` is transferred to the subvector.
                unsafe { Self::from_raw_parts(sub.as_ptr() as *mut T, len, sub.stride()) }
            }

            #[inline]
            pub fn transpose(self) -> $mut_other<'a, T> {
                // SAFETY: same elements.
                let (len, stride) = (self.$len(), self.stride());
                unsafe { $mut_other::from_raw_parts(self.as_ptr(), len, stride) }
            }

            #[track_caller]
            #[inline]
            pub fn get(self, i: usize) -> &'a mut T {
                fancy_assert!(i < self.$len());
                // SAFETY: bounds checked above, and `self` is an exclusive view.
                unsafe { &mut *self.ptr_at(i) }
            }

            #[inline]
            pub fn fill(mut self, value: T)
            where
                T: Copy,
            {
                for i in 0..self.$len() {
                    self[i] = value;
                }
            }
        }

        impl<'a, T> Index<usize> for $ref<'a, T> {
            type Output = T;
            #[track_caller]
            #[inline]
            fn index(&self, i: usize) -> &T {
                (*self).get(i)
            }
        }
        impl<'a, T> Index<usize> for $mut<'a, T> {
            type Output = T;
            #[track_caller]
            #[inline]
            fn index(&self, i: usize) -> &T {
                self.rb().get(i)
            }
        }
        impl<'a, T> IndexMut<usize> for $mut<'a, T> {
            #[track_caller]
            #[inline]
            fn index_mut(&mut self, i: usize) -> &mut T {
                self.rb_mut().get(i)
            }
        }
    )*};
}

impl_vec_views! {
    ColRef, ColMut, nrows, RowRef, RowMut;
    RowRef, RowMut, ncols, ColRef, ColMut;
}

impl<'a, T> ColRef<'a, T> {
    /// Views the column as an `nrows×1` matrix.
    #[inline]
    pub fn as_2d(self) -> MatRef<'a, T> {
        // SAFETY: same elements.
        unsafe { MatRef::from_raw_parts(self.as_ptr(), self.nrows(), 1, self.stride(), 0) }
    }
}
impl<'a, T> RowRef<'a, T> {
    /// Views the row as a `1×ncols` matrix.
    #[inline]
    pub fn as_2d(self) -> MatRef<'a, T> {
        // SAFETY: same elements.
        unsafe { MatRef::from_raw_parts(self.as_ptr(), 1, self.ncols(), 0, self.stride()) }
    }
}
impl<'a, T> ColMut<'a, T> {
    #[inline]
    pub fn as_2d(self) -> MatMut<'a, T> {
        // SAFETY: same elements.
        let (nrows, stride) = (self.nrows(), self.stride());
        unsafe { MatMut::from_raw_parts(self.as_ptr(), nrows, 1, stride, 0) }
    }
}
impl<'a, T> RowMut<'a, T> {
    #[inline]
    pub fn as_2d(self) -> MatMut<'a, T> {
        // SAFETY: same elements.
        let (ncols, stride) = (self.ncols(), self.stride());
        unsafe { MatMut::from_raw_parts(self.as_ptr(), 1, ncols, 0, stride) }
    }
}

impl<'a, T> Index<(usize, usize)> for MatRef<'a, T> {
    type Output = T;
    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        (*self).get(i, j)
    }
}
impl<'a, T> Index<(usize, usize)> for MatMut<'a, T> {
    type Output = T;
    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        self.rb().get(i, j)
    }
}
impl<'a, T> IndexMut<(usize, usize)> for MatMut<'a, T> {
    #[track_caller]
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        self.rb_mut().get(i, j)
    }
}

impl<'a, T: Debug> Debug for MatRef<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct DebugRow<'a, T>(RowRef<'a, T>);

        impl<'a, T: Debug> Debug for DebugRow<'a, T> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut list = f.debug_list();
                for j in 0..self.0.ncols() {
                    list.entry(&self.0[j]);
                }
                list.finish()
            }
        }

        f.write_str("[\n")?;
        for i in 0..self.nrows() {
            DebugRow((*self).row(i)).fmt(f)?;
            f.write_str(",\n")?;
        }
        f.write_str("]")
    }
}
impl<'a, T: Debug> Debug for MatMut<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.rb().fmt(f)
    }
}
impl<'a, T: Debug> Debug for ColRef<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_2d().fmt(f)
    }
}
impl<'a, T: Debug> Debug for RowRef<'a, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_2d().fmt(f)
    }
}

/// Owning column-major matrix.
///
/// Kernels never use it internally; it is a convenience for callers, tests and benchmarks.
#[derive(Clone)]
pub struct Mat<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T> Mat<T> {
    /// Returns an `nrows×ncols` matrix whose element `(i, j)` is `f(i, j)`.
    pub fn with_dims(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn as_ref(&self) -> MatRef<'_, T> {
        MatRef::from_column_major_slice(&self.data, self.nrows, self.ncols, Ord::max(1, self.nrows))
    }

    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_, T> {
        let ld = Ord::max(1, self.nrows);
        MatMut::from_column_major_slice(&mut self.data, self.nrows, self.ncols, ld)
    }

    /// Column-major storage of the matrix, with leading dimension `max(1, nrows)`.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: ComplexField> Mat<T> {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::with_dims(nrows, ncols, |_, _| T::zero())
    }

    pub fn identity(nrows: usize, ncols: usize) -> Self {
        Self::with_dims(nrows, ncols, |i, j| if i == j { T::one() } else { T::zero() })
    }
}

impl<T> Index<(usize, usize)> for Mat<T> {
    type Output = T;
    #[track_caller]
    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        fancy_assert!(i < self.nrows);
        fancy_assert!(j < self.ncols);
        &self.data[i + j * self.nrows]
    }
}
impl<T> IndexMut<(usize, usize)> for Mat<T> {
    #[track_caller]
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        fancy_assert!(i < self.nrows);
        fancy_assert!(j < self.ncols);
        &mut self.data[i + j * self.nrows]
    }
}

impl<T: Debug> Debug for Mat<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.as_ref().fmt(f)
    }
}

/// Returns a [`Mat`] containing the arguments, given row by row.
///
/// # Example
///
/// ```
/// use lakit_core::mat;
///
/// let m = mat![
///     [0.0, 3.0, 6.0],
///     [1.0, 4.0, 7.0],
/// ];
///
/// assert_eq!(m.nrows(), 2);
/// assert_eq!(m.ncols(), 3);
/// assert_eq!(m[(1, 0)], 1.0);
/// assert_eq!(m[(0, 2)], 6.0);
/// ```
#[macro_export]
macro_rules! mat {
    () => {
        {
            compile_error!("number of columns in the matrix is ambiguous");
        }
    };

    ($([$($v:expr),* $(,)?] ),+ $(,)?) => {
        {
            let rows = [$([$($v),*]),+];
            let nrows = rows.len();
            let ncols = rows[0].len();
            $crate::Mat::with_dims(nrows, ncols, |i, j| rows[i][j])
        }
    };
}

#[cfg(feature = "perf-warn")]
#[macro_export]
#[doc(hidden)]
macro_rules! __perf_warn {
    ($name: ident) => {{
        static $name: ::core::sync::atomic::AtomicBool =
            ::core::sync::atomic::AtomicBool::new(false);
        $name
            .compare_exchange(
                false,
                true,
                ::core::sync::atomic::Ordering::Relaxed,
                ::core::sync::atomic::Ordering::Relaxed,
            )
            .is_ok()
    }};
}
