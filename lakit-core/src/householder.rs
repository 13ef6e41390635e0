//! The Householder reflection is a linear transformation that describes a reflection about a
//! hyperplane that crosses the origin of the space.
//!
//! Let $v$ be a unit vector that is orthogonal to the hyperplane. Then the corresponding
//! Householder transformation in matrix form is $I - 2vv^H$, where $I$ is the identity matrix.
//!
//! In practice, a non unit vector $v$ is used, so the transformation is written as
//! $$H = I - \tau v v^H$$
//! where the leading entry of $v$ is one and only the remaining entries, the essential part, are
//! stored. This is the convention used by LAPACK, and $H$ is unitary iff
//! $\tau$ satisfies $|1 - \tau \|v\|^2| = 1$, which the generator below guarantees.
//!
//! A block of $k$ reflectors $H_0 \dots H_{k-1}$ can be represented compactly as
//! $$H = I - V T V^H$$
//! where the columns of $V$ are the reflector vectors and $T$ is a $k\times k$ triangular
//! matrix. Applying the block this way turns $k$ rank-one updates into three matrix products.

use crate::{
    access_denied, is_real,
    mul::{
        matmul,
        triangular::{self, BlockStructure},
    },
    AccessPolicy, ColMut, ColRef, ComplexField, Conj, Direction, KernelError, MatMut, MatRef, Op,
    Side, StoreV,
};
use dyn_stack::{SizeOverflow, StackReq};
use reborrow::*;

/// Conjugates the entries of `vector` in place.
pub fn conjugate_in_place<T: ComplexField>(mut vector: ColMut<'_, T>) {
    if is_real::<T>() {
        return;
    }
    for i in 0..vector.nrows() {
        vector[i] = vector[i].conj();
    }
}

#[inline(always)]
fn max_component_of<T: ComplexField>(value: T) -> T::Real {
    let (re, im) = value.into_real_imag();
    let (re, im) = (re.abs(), im.abs());
    if im > re {
        im
    } else {
        re
    }
}

fn max_component<T: ComplexField>(vector: ColRef<'_, T>) -> T::Real {
    let mut max = T::Real::zero();
    for i in 0..vector.nrows() {
        let value = max_component_of(vector[i]);
        if value > max {
            max = value;
        }
    }
    max
}

/// $|x / s|^2$, computed without squaring `x` itself.
#[inline(always)]
fn scaled_abs2<T: ComplexField>(value: T, scale: T::Real) -> T::Real {
    let (re, im) = value.into_real_imag();
    let (re, im) = (re / scale, im / scale);
    re * re + im * im
}

/// Computes the Householder reflector that maps the vector `(head, essential)` to a multiple of
/// the first unit vector.
///
/// On exit, `head` holds $\beta$, which is real with
/// $\beta = -\operatorname{sign}(\operatorname{Re}\ \text{head}) \cdot \|x\|$, `essential`
/// holds the essential part of the reflector vector, and the returned value is $\tau$, with
/// $H^H x = \beta e_0$.
///
/// If `essential` is zero and `head` is real, the reflector is the identity: $\tau = 0$ is
/// returned and both inputs are left untouched.
pub fn make_householder_in_place<T: ComplexField>(
    head: &mut T,
    mut essential: ColMut<'_, T>,
) -> T {
    let zero = T::Real::zero();

    let alpha = *head;
    let (alpha_re, alpha_im) = alpha.into_real_imag();

    let tail_max = max_component(essential.rb());
    if tail_max == zero && alpha_im == zero {
        return T::zero();
    }

    let scale = {
        let head_max = max_component_of(alpha);
        if head_max > tail_max {
            head_max
        } else {
            tail_max
        }
    };

    let mut scaled_squared_norm = scaled_abs2(alpha, scale);
    for i in 0..essential.nrows() {
        scaled_squared_norm = scaled_squared_norm + scaled_abs2(essential[i], scale);
    }
    let norm = scale * scaled_squared_norm.sqrt();

    let beta = if alpha_re >= zero { -norm } else { norm };
    let beta_t = T::from_real(beta);

    let tau = (beta_t - alpha).scale(beta.inv());

    // 1 / d = conj(d) / |d|^2, with |d| formed from scaled components
    let denom = alpha - beta_t;
    let denom_abs = scale * scaled_abs2(denom, scale).sqrt();
    let denom_abs_inv = denom_abs.inv();
    let inv = denom.conj().scale(denom_abs_inv).scale(denom_abs_inv);
    for i in 0..essential.nrows() {
        essential[i] = essential[i] * inv;
    }

    *head = beta_t;
    tau
}

/// Workspace required by [`apply_householder`].
pub fn apply_householder_req<T: 'static>(
    side: Side,
    nrows: usize,
    ncols: usize,
) -> Result<StackReq, SizeOverflow> {
    StackReq::try_new::<T>(match side {
        Side::Left => ncols,
        Side::Right => nrows,
    })
}

/// Applies the reflector $H = I - \tau v v^H$ (or $H^H$ if `conj_householder` is
/// [`Conj::Yes`]) to `matrix` from the given side, in place.
///
/// `essential` holds $v$ without its leading one, so its length must be one less than the
/// number of rows (`Side::Left`) or columns (`Side::Right`) of `matrix`. `work` must hold at
/// least `matrix.ncols()` (`Side::Left`) or `matrix.nrows()` (`Side::Right`) elements.
pub fn apply_householder<T: ComplexField>(
    side: Side,
    conj_householder: Conj,
    essential: ColRef<'_, T>,
    tau: T,
    mut matrix: MatMut<'_, T>,
    mut work: ColMut<'_, T>,
) -> Result<(), KernelError> {
    let (extent, other) = match side {
        Side::Left => (matrix.nrows(), matrix.ncols()),
        Side::Right => (matrix.ncols(), matrix.nrows()),
    };
    if extent != essential.nrows() + 1 {
        return Err(KernelError::InvalidArgument { arg: "essential" });
    }
    if work.nrows() < other {
        return Err(KernelError::InvalidArgument { arg: "work" });
    }
    if access_denied(AccessPolicy::Dense, matrix.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "matrix" });
    }

    let tau = conj_householder.apply(tau);
    if tau == T::zero() {
        return Ok(());
    }

    let p = essential.nrows();
    match side {
        Side::Left => {
            // work := (v^H C)^T
            for j in 0..other {
                let mut acc = matrix[(0, j)];
                for i in 0..p {
                    acc = acc + essential[i].conj() * matrix[(i + 1, j)];
                }
                work[j] = acc;
            }
            for j in 0..other {
                let k = tau * work[j];
                matrix[(0, j)] = matrix[(0, j)] - k;
                for i in 0..p {
                    matrix[(i + 1, j)] = matrix[(i + 1, j)] - essential[i] * k;
                }
            }
        }
        Side::Right => {
            // work := C v
            for r in 0..other {
                let mut acc = matrix[(r, 0)];
                for i in 0..p {
                    acc = acc + matrix[(r, i + 1)] * essential[i];
                }
                work[r] = acc;
            }
            for r in 0..other {
                let k = tau * work[r];
                matrix[(r, 0)] = matrix[(r, 0)] - k;
                for i in 0..p {
                    matrix[(r, i + 1)] = matrix[(r, i + 1)] - k * essential[i].conj();
                }
            }
        }
    }
    Ok(())
}

/// Returns the reflectors of `basis` as columns, along with the conjugation to apply to them.
#[inline]
fn column_form<T>(basis: MatRef<'_, T>, storev: StoreV) -> (MatRef<'_, T>, Conj) {
    match storev {
        StoreV::Columnwise => (basis, Conj::No),
        StoreV::Rowwise => (basis.transpose(), Conj::Yes),
    }
}

/// Computes the triangular factor $T$ of a block of $k$ reflectors, such that
/// $H = I - V T V^H$, with $H = H_0 \dots H_{k-1}$ ([`Direction::Forward`], $T$ upper
/// triangular) or $H = H_{k-1} \dots H_0$ ([`Direction::Backward`], $T$ lower triangular).
///
/// `basis` is `n×k` ([`StoreV::Columnwise`]) or `k×n` ([`StoreV::Rowwise`], where reflector `i`
/// is stored conjugated in row `i`). Reflector `i` has an implicit unit at position `i` with
/// zeros before it (forward), or at position `n - k + i` with zeros after it (backward); those
/// entries of `basis` are never read. Only the triangle of `factor` selected by the direction is
/// written.
pub fn make_block_householder_factor<T: ComplexField>(
    direction: Direction,
    storev: StoreV,
    basis: MatRef<'_, T>,
    tau: ColRef<'_, T>,
    mut factor: MatMut<'_, T>,
) -> Result<(), KernelError> {
    let (v, conj_v) = column_form(basis, storev);
    let k = factor.nrows();
    let n = v.nrows();

    if factor.ncols() != k {
        return Err(KernelError::InvalidArgument { arg: "factor" });
    }
    if tau.nrows() < k {
        return Err(KernelError::InvalidArgument { arg: "tau" });
    }
    if v.ncols() != k || k > n {
        return Err(KernelError::InvalidArgument { arg: "basis" });
    }
    let required = match direction {
        Direction::Forward => AccessPolicy::UpperTriangle,
        Direction::Backward => AccessPolicy::LowerTriangle,
    };
    if access_denied(required, factor.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "factor" });
    }

    // entry `c` of reflector `i`, in column form
    let entry = |c: usize, i: usize| conj_v.apply(v[(c, i)]);

    match direction {
        Direction::Forward => {
            for i in 0..k {
                let tau_i = tau[i];
                if tau_i == T::zero() {
                    for j in 0..=i {
                        factor[(j, i)] = T::zero();
                    }
                    continue;
                }

                // T[0..i, i] := -tau_i V[i.., 0..i]^H v_i
                for j in 0..i {
                    let mut acc = entry(i, j).conj();
                    for c in i + 1..n {
                        acc = acc + entry(c, j).conj() * entry(c, i);
                    }
                    factor[(j, i)] = -tau_i * acc;
                }

                // T[0..i, i] := T[0..i, 0..i] T[0..i, i]
                for j in 0..i {
                    let mut acc = T::zero();
                    for l in j..i {
                        acc = acc + factor[(j, l)] * factor[(l, i)];
                    }
                    factor[(j, i)] = acc;
                }
                factor[(i, i)] = tau_i;
            }
        }
        Direction::Backward => {
            for i in (0..k).rev() {
                let tau_i = tau[i];
                if tau_i == T::zero() {
                    for j in i..k {
                        factor[(j, i)] = T::zero();
                    }
                    continue;
                }

                let pivot = n - k + i;
                // T[i+1..k, i] := -tau_i V[..=pivot, i+1..k]^H v_i
                for j in i + 1..k {
                    let mut acc = entry(pivot, j).conj();
                    for c in 0..pivot {
                        acc = acc + entry(c, j).conj() * entry(c, i);
                    }
                    factor[(j, i)] = -tau_i * acc;
                }

                // T[i+1..k, i] := T[i+1..k, i+1..k] T[i+1..k, i]
                for j in (i + 1..k).rev() {
                    let mut acc = T::zero();
                    for l in i + 1..=j {
                        acc = acc + factor[(j, l)] * factor[(l, i)];
                    }
                    factor[(j, i)] = acc;
                }
                factor[(i, i)] = tau_i;
            }
        }
    }
    Ok(())
}

/// Workspace required by [`apply_block_householder`], for a block of `blocksize` reflectors
/// applied to an `nrows×ncols` matrix.
pub fn apply_block_householder_req<T: 'static>(
    side: Side,
    nrows: usize,
    ncols: usize,
    blocksize: usize,
) -> Result<StackReq, SizeOverflow> {
    let other = match side {
        Side::Left => ncols,
        Side::Right => nrows,
    };
    StackReq::try_new::<T>(other.checked_mul(blocksize).ok_or(SizeOverflow)?)
}

/// Applies the block reflector $H = I - V T V^H$ described by `basis` and `factor` (see
/// [`make_block_householder_factor`]) to `matrix`, computing $op(H) C$ ([`Side::Left`]) or
/// $C op(H)$ ([`Side::Right`]) in place.
///
/// [`Op::Trans`] is only accepted for real scalars, where it is the same as [`Op::ConjTrans`].
///
/// `work` must be at least `matrix.ncols()×k` ([`Side::Left`]) or `matrix.nrows()×k`
/// ([`Side::Right`]).
pub fn apply_block_householder<T: ComplexField>(
    side: Side,
    op: Op,
    direction: Direction,
    storev: StoreV,
    basis: MatRef<'_, T>,
    factor: MatRef<'_, T>,
    matrix: MatMut<'_, T>,
    work: MatMut<'_, T>,
) -> Result<(), KernelError> {
    let conj_householder = match op {
        Op::NoTrans => Conj::No,
        Op::ConjTrans => Conj::Yes,
        Op::Trans if is_real::<T>() => Conj::Yes,
        Op::Trans => return Err(KernelError::InvalidArgument { arg: "op" }),
    };

    let (v, conj_v) = column_form(basis, storev);
    let k = factor.nrows();
    let n = v.nrows();
    if factor.ncols() != k {
        return Err(KernelError::InvalidArgument { arg: "factor" });
    }
    if v.ncols() != k || k > n {
        return Err(KernelError::InvalidArgument { arg: "basis" });
    }
    let (extent, other) = match side {
        Side::Left => (matrix.nrows(), matrix.ncols()),
        Side::Right => (matrix.ncols(), matrix.nrows()),
    };
    if extent != n {
        return Err(KernelError::InvalidArgument { arg: "matrix" });
    }
    if work.nrows() < other || work.ncols() < k {
        return Err(KernelError::InvalidArgument { arg: "work" });
    }
    if access_denied(AccessPolicy::Dense, matrix.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "matrix" });
    }
    if access_denied(AccessPolicy::Dense, work.access_policy()) {
        return Err(KernelError::AccessDenied { arg: "work" });
    }

    if k == 0 || other == 0 {
        return Ok(());
    }

    use BlockStructure::*;

    let mut work = work.submatrix(0, 0, other, k);
    let (v_tri, v_rect, tri_structure, t_structure, split) = match direction {
        Direction::Forward => (
            v.submatrix(0, 0, k, k),
            v.submatrix(k, 0, n - k, k),
            UnitTriangularLower,
            TriangularUpper,
            k,
        ),
        Direction::Backward => (
            v.submatrix(n - k, 0, k, k),
            v.submatrix(0, 0, n - k, k),
            UnitTriangularUpper,
            TriangularLower,
            n - k,
        ),
    };

    // op(T)^H on the left, op(T) on the right
    let adjoint_t = match side {
        Side::Left => conj_householder == Conj::No,
        Side::Right => conj_householder == Conj::Yes,
    };
    let (t, t_structure, conj_t) = if adjoint_t {
        (factor.transpose(), t_structure.transpose(), Conj::Yes)
    } else {
        (factor, t_structure, Conj::No)
    };

    match side {
        Side::Left => {
            let (first, second) = matrix.split_at_row(split);
            let (mut c_tri, mut c_rect) = match direction {
                Direction::Forward => (first, second),
                Direction::Backward => (second, first),
            };

            // W := C^H V
            triangular::matmul(
                work.rb_mut(),
                c_tri.rb().transpose(),
                Rectangular,
                Conj::Yes,
                v_tri,
                tri_structure,
                conj_v,
                None,
                T::one(),
            );
            matmul(
                work.rb_mut(),
                c_rect.rb().transpose(),
                Conj::Yes,
                v_rect,
                conj_v,
                Some(T::one()),
                T::one(),
            );

            triangular::mul_on_the_right_in_place(work.rb_mut(), t, t_structure, conj_t);

            // C := C - V W^H
            triangular::matmul(
                c_tri.rb_mut(),
                v_tri,
                tri_structure,
                conj_v,
                work.rb().transpose(),
                Rectangular,
                Conj::Yes,
                Some(T::one()),
                -T::one(),
            );
            matmul(
                c_rect.rb_mut(),
                v_rect,
                conj_v,
                work.rb().transpose(),
                Conj::Yes,
                Some(T::one()),
                -T::one(),
            );
        }
        Side::Right => {
            let (first, second) = matrix.split_at_col(split);
            let (mut c_tri, mut c_rect) = match direction {
                Direction::Forward => (first, second),
                Direction::Backward => (second, first),
            };

            // W := C V
            triangular::matmul(
                work.rb_mut(),
                c_tri.rb(),
                Rectangular,
                Conj::No,
                v_tri,
                tri_structure,
                conj_v,
                None,
                T::one(),
            );
            matmul(
                work.rb_mut(),
                c_rect.rb(),
                Conj::No,
                v_rect,
                conj_v,
                Some(T::one()),
                T::one(),
            );

            triangular::mul_on_the_right_in_place(work.rb_mut(), t, t_structure, conj_t);

            // C := C - W V^H
            triangular::matmul(
                c_tri.rb_mut(),
                work.rb(),
                Rectangular,
                Conj::No,
                v_tri.transpose(),
                tri_structure.transpose(),
                conj_v.compose(Conj::Yes),
                Some(T::one()),
                -T::one(),
            );
            matmul(
                c_rect.rb_mut(),
                work.rb(),
                Conj::No,
                v_rect.transpose(),
                conj_v.compose(Conj::Yes),
                Some(T::one()),
                -T::one(),
            );
        }
    }
    Ok(())
}
