//! This crate computes the LQ factorization of a dense matrix, and applies or reconstructs its
//! factors. The LQ factorization decomposes an `m×n` matrix $A$ into the product
//! $$A = LQ,$$
//! where $L$ is an `m×min(m, n)` lower trapezoidal matrix and $Q$ is unitary, represented as a
//! sequence of block Householder reflectors stored in place of $A$ together with their
//! triangular factors.
//!
//! # Example
//!
//! ```
//! use assert_approx_eq::assert_approx_eq;
//! use dyn_stack::{DynStack, GlobalMemBuffer};
//! use lakit_core::{mat, mul::matmul, Conj, Mat};
//! use lakit_lq::{compute, reconstruct};
//!
//! let a = mat![
//!     [4.0, 3.0, 1.0],
//!     [6.0, 3.0, -2.0_f64],
//! ];
//! let (m, n) = (a.nrows(), a.ncols());
//! let size = m.min(n);
//! let blocksize = compute::recommended_blocksize::<f64>(m, n);
//!
//! // factorize in place, with the work vector taken from a stack buffer
//! let mut factors = a.clone();
//! let mut tt = Mat::zeros(m, blocksize);
//! let mut mem = GlobalMemBuffer::new(compute::lq_in_place_req::<f64>(m, n, blocksize).unwrap());
//! compute::lq_in_place_with_stack(
//!     factors.as_mut(),
//!     tt.as_mut(),
//!     blocksize,
//!     DynStack::new(&mut mem),
//! )
//! .unwrap();
//!
//! // extract L and Q
//! let mut l = Mat::zeros(m, size);
//! reconstruct::reconstruct_l(factors.as_ref(), l.as_mut()).unwrap();
//! let mut q = Mat::zeros(n, n);
//! let mut work = Mat::zeros(n, blocksize);
//! reconstruct::reconstruct_q(factors.as_ref(), tt.as_ref(), blocksize, q.as_mut(), work.as_mut())
//!     .unwrap();
//!
//! // A = L Q[..size, ..]
//! let mut product = Mat::zeros(m, n);
//! matmul(
//!     product.as_mut(),
//!     l.as_ref(),
//!     Conj::No,
//!     q.as_ref().submatrix(0, 0, size, n),
//!     Conj::No,
//!     None,
//!     1.0,
//! );
//! for i in 0..m {
//!     for j in 0..n {
//!         assert_approx_eq!(product[(i, j)], a[(i, j)]);
//!     }
//! }
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod compute;
pub mod reconstruct;
