#![forbid(unsafe_code)]
#![cfg_attr(not(debug_assertions), deny(warnings))] // Forbid warnings in release builds
#![warn(clippy::all, rust_2018_idioms)]

//! Dense real matrices with arithmetic, statistics and eigen-decomposition.
//!
//! [`Matrix`] is a row-major `f64` matrix. Shape errors are reported through [`MatrixError`]
//! rather than panics, except for direct `m[(row, col)]` indexing.
//!
//! [`Matrix::eigen`] picks the Jacobi method for symmetric input and the Hessenberg QR algorithm
//! for everything else. Results come back sorted by ascending real part.

mod determinant;
mod eigen;
mod error;
mod interop;
mod matrix;
mod ops;
mod stats;

pub use eigen::{eigen, eigen_with, EigenDecomposition, EigenOptions, Eigenvalues};
pub use error::{MatrixError, Result};
pub use matrix::{Axis, Matrix};
pub use num_complex::Complex64;
