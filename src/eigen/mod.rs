//! Eigenvalues and eigenvectors of real square matrices.
//!
//! Symmetric input is diagonalized with the cyclic Jacobi method, which yields real eigenvalues
//! and an orthonormal set of eigenvectors. Any other input is balanced, reduced to Hessenberg form
//! and solved with the double-shift QR algorithm, which may produce complex conjugate pairs.
//!
//! ```
//! # use dense_eigen::Matrix;
//! let m = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]])?;
//! let decomposition = m.eigen()?;
//! let values = decomposition.real_parts();
//! assert!((values[0] - 1.0).abs() < 1e-12);
//! assert!((values[1] - 3.0).abs() < 1e-12);
//! # Ok::<(), dense_eigen::MatrixError>(())
//! ```

mod balance;
mod hessenberg;
mod jacobi;
mod schur;

use std::cmp::Ordering;

use num_complex::Complex64;

use crate::{
    error::{MatrixError, Result},
    matrix::Matrix,
};

/// Tuning knobs for [`Matrix::eigen_with`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EigenOptions {
    /// Rotation cap for the symmetric path. Reaching it is not an error.
    pub jacobi_max_iterations: usize,
    /// The symmetric path stops once every off-diagonal entry is below this magnitude.
    pub jacobi_tolerance: f64,
    /// QR iterations allowed per deflation on the general path before giving up with
    /// [`MatrixError::NonConvergence`].
    pub qr_max_iterations: usize,
    /// Scale general-path eigenvectors to unit length.
    pub normalize: bool,
    /// Order eigenpairs by ascending real part.
    pub sort: bool,
}

impl Default for EigenOptions {
    fn default() -> Self {
        Self {
            jacobi_max_iterations: 1000,
            jacobi_tolerance: 2.0 * f64::EPSILON,
            qr_max_iterations: 30,
            normalize: true,
            sort: true,
        }
    }
}

impl EigenOptions {
    pub fn with_jacobi_max_iterations(mut self, iterations: usize) -> Self {
        self.jacobi_max_iterations = iterations;
        self
    }

    pub fn with_jacobi_tolerance(mut self, tolerance: f64) -> Self {
        self.jacobi_tolerance = tolerance;
        self
    }

    pub fn with_qr_max_iterations(mut self, iterations: usize) -> Self {
        self.qr_max_iterations = iterations;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Eigenvalues {
    /// `1 x n` row vector from the symmetric solver.
    Real(Matrix),
    /// From the general solver. A conjugate pair is adjacent, positive imaginary part first.
    Complex(Vec<Complex64>),
}

/// Eigenvalues and matching eigenvector columns.
///
/// For a real eigenvalue at `k`, column `k` of `eigenvectors` is its eigenvector. For a conjugate
/// pair at `(k, k + 1)`, columns `k` and `k + 1` are the real and imaginary parts of the
/// eigenvector of eigenvalue `k`; the eigenvector of `k + 1` is its conjugate. With this layout
/// `A·V = V·D` holds for `D = eigenvalue_matrix()`.
#[derive(Clone, Debug, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: Eigenvalues,
    pub eigenvectors: Matrix,
}

impl EigenDecomposition {
    fn empty() -> Self {
        Self {
            eigenvalues: Eigenvalues::Real(Matrix::empty()),
            eigenvectors: Matrix::empty(),
        }
    }

    pub fn len(&self) -> usize {
        match &self.eigenvalues {
            Eigenvalues::Real(values) => values.as_slice().len(),
            Eigenvalues::Complex(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when no eigenvalue has a non-zero imaginary part.
    pub fn is_real(&self) -> bool {
        match &self.eigenvalues {
            Eigenvalues::Real(_) => true,
            Eigenvalues::Complex(values) => values.iter().all(|value| value.im == 0.0),
        }
    }

    pub fn real_parts(&self) -> Vec<f64> {
        match &self.eigenvalues {
            Eigenvalues::Real(values) => values.as_slice().to_vec(),
            Eigenvalues::Complex(values) => values.iter().map(|value| value.re).collect(),
        }
    }

    pub fn imaginary_parts(&self) -> Vec<f64> {
        match &self.eigenvalues {
            Eigenvalues::Real(values) => vec![0.0; values.as_slice().len()],
            Eigenvalues::Complex(values) => values.iter().map(|value| value.im).collect(),
        }
    }

    pub fn eigenvalue(&self, index: usize) -> Result<Complex64> {
        let value = match &self.eigenvalues {
            Eigenvalues::Real(values) => values
                .as_slice()
                .get(index)
                .map(|&re| Complex64::new(re, 0.0)),
            Eigenvalues::Complex(values) => values.get(index).copied(),
        };
        value.ok_or(MatrixError::IndexOutOfRange {
            row: 0,
            col: index,
            rows: 1,
            cols: self.len(),
        })
    }

    /// Eigenvector of eigenvalue `index` as complex components, for either member of a pair.
    pub fn eigenvector(&self, index: usize) -> Result<Vec<Complex64>> {
        let value = self.eigenvalue(index)?;
        let v = &self.eigenvectors;
        let column = |re: usize, im: Option<(usize, f64)>| -> Vec<Complex64> {
            (0..v.rows())
                .map(|i| match im {
                    Some((j, sign)) => Complex64::new(v[(i, re)], sign * v[(i, j)]),
                    None => Complex64::new(v[(i, re)], 0.0),
                })
                .collect()
        };
        Ok(match value.im.partial_cmp(&0.0) {
            Some(Ordering::Greater) => column(index, Some((index + 1, 1.0))),
            Some(Ordering::Less) => column(index - 1, Some((index, -1.0))),
            _ => column(index, None),
        })
    }

    /// Block-diagonal `D` with `[λ, μ; -μ, λ]` blocks for conjugate pairs.
    pub fn eigenvalue_matrix(&self) -> Matrix {
        let n = self.len();
        let re = self.real_parts();
        let im = self.imaginary_parts();
        let mut d = Matrix::zeros(n, n);
        for k in 0..n {
            d[(k, k)] = re[k];
            if im[k] > 0.0 {
                d[(k, k + 1)] = im[k];
            } else if im[k] < 0.0 {
                d[(k, k - 1)] = im[k];
            }
        }
        d
    }

    /// Scale each real eigenvector, and each conjugate pair jointly, to unit Euclidean norm.
    fn normalize(&mut self) {
        let im = self.imaginary_parts();
        let v = &mut self.eigenvectors;
        let mut k = 0;
        while k < im.len() {
            let width = if im[k] > 0.0 && k + 1 < im.len() { 2 } else { 1 };
            let norm = (0..v.rows())
                .flat_map(|i| (k..k + width).map(move |j| (i, j)))
                .map(|(i, j)| v[(i, j)] * v[(i, j)])
                .sum::<f64>()
                .sqrt();
            if norm > 0.0 {
                for i in 0..v.rows() {
                    for j in k..k + width {
                        v[(i, j)] /= norm;
                    }
                }
            }
            k += width;
        }
    }

    /// Stable reorder by ascending real part. Eigenvector columns move with their eigenvalues.
    /// `-0.0` and `0.0` tie.
    fn sort_ascending(&mut self) {
        let keys = self.real_parts();
        let mut order: Vec<usize> = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let position = order.partition_point(|&j| keys[j] <= *key);
            order.insert(position, i);
        }

        self.eigenvalues = match &self.eigenvalues {
            Eigenvalues::Real(_) => {
                Eigenvalues::Real(Matrix::row_vector(order.iter().map(|&j| keys[j]).collect()))
            }
            Eigenvalues::Complex(values) => {
                Eigenvalues::Complex(order.iter().map(|&j| values[j]).collect())
            }
        };

        let v = &self.eigenvectors;
        let mut sorted = Matrix::zeros(v.rows(), v.cols());
        for (target, &source) in order.iter().enumerate() {
            for i in 0..v.rows() {
                sorted[(i, target)] = v[(i, source)];
            }
        }
        self.eigenvectors = sorted;
    }
}

impl Matrix {
    /// Eigen-decomposition with [`EigenOptions::default`].
    pub fn eigen(&self) -> Result<EigenDecomposition> {
        self.eigen_with(&EigenOptions::default())
    }

    pub fn eigen_with(&self, options: &EigenOptions) -> Result<EigenDecomposition> {
        puffin::profile_function!();
        if !self.is_square() {
            return Err(MatrixError::non_square("eigen-decomposition", self.shape()));
        }
        if self.rows() == 0 {
            return Ok(EigenDecomposition::empty());
        }

        let mut decomposition = if self.is_symmetric() {
            symmetric(self, options)
        } else {
            general(self, options)?
        };
        if options.sort {
            puffin::profile_scope!("sort");
            decomposition.sort_ascending();
        }
        Ok(decomposition)
    }
}

/// Free-function form of [`Matrix::eigen`].
pub fn eigen(matrix: &Matrix) -> Result<EigenDecomposition> {
    matrix.eigen()
}

/// Free-function form of [`Matrix::eigen_with`].
pub fn eigen_with(matrix: &Matrix, options: &EigenOptions) -> Result<EigenDecomposition> {
    matrix.eigen_with(options)
}

fn symmetric(matrix: &Matrix, options: &EigenOptions) -> EigenDecomposition {
    log::debug!(
        "eigen: {}x{} symmetric input, using Jacobi rotations",
        matrix.rows(),
        matrix.cols()
    );
    let solution = jacobi::diagonalize(
        matrix,
        options.jacobi_max_iterations,
        options.jacobi_tolerance,
    );
    if solution.converged {
        log::debug!("eigen: converged after {} rotations", solution.iterations);
    } else {
        log::warn!(
            "eigen: Jacobi stopped at the cap of {} rotations with off-diagonal entries above {:e}",
            solution.iterations,
            options.jacobi_tolerance
        );
    }
    EigenDecomposition {
        eigenvalues: Eigenvalues::Real(Matrix::row_vector(solution.eigenvalues)),
        eigenvectors: solution.eigenvectors,
    }
}

fn general(matrix: &Matrix, options: &EigenOptions) -> Result<EigenDecomposition> {
    log::debug!(
        "eigen: {}x{} general input, using Hessenberg QR",
        matrix.rows(),
        matrix.cols()
    );
    let balanced = balance::balance(matrix);
    let reduced = hessenberg::reduce(&balanced.matrix);
    log::trace!("eigen: Hessenberg pivot rows {:?}", reduced.permutation);
    let schur::SchurSolution {
        eigenvalues,
        mut eigenvectors,
    } = schur::solve(reduced, options.qr_max_iterations)?;
    balance::unbalance(&mut eigenvectors, &balanced.scale);

    let mut decomposition = EigenDecomposition {
        eigenvalues: Eigenvalues::Complex(eigenvalues),
        eigenvectors,
    };
    if options.normalize {
        decomposition.normalize();
    }
    Ok(decomposition)
}
