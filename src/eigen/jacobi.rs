//! Cyclic Jacobi eigenvalue algorithm for symmetric matrices.
//!
//! Every step finds the off-diagonal entry with the largest magnitude and annihilates it with a
//! plane rotation `A ← Uᵗ·A·U`, accumulating `V ← V·U`. The off-diagonal norm shrinks
//! monotonically, so `diag(A)` converges to the eigenvalues and the columns of `V` to an
//! orthonormal set of eigenvectors.

use crate::matrix::Matrix;

pub struct JacobiSolution {
    /// Diagonal of the rotated matrix, in the original index order.
    pub eigenvalues: Vec<f64>,
    /// Accumulated rotations. Column `k` belongs to `eigenvalues[k]`.
    pub eigenvectors: Matrix,
    pub iterations: usize,
    /// `false` when the iteration cap was reached before the tolerance.
    pub converged: bool,
}

/// Diagonalize a symmetric matrix.
///
/// The input is not checked for symmetry. A non-symmetric input still terminates (at the latest
/// after `max_iterations` rotations), but the result is meaningless.
pub fn diagonalize(matrix: &Matrix, max_iterations: usize, tolerance: f64) -> JacobiSolution {
    puffin::profile_function!();
    let n = matrix.rows();
    let mut a = matrix.clone();
    let mut v = Matrix::identity(n);

    let mut iterations = 0;
    let converged = loop {
        let (p, q, largest) = largest_off_diagonal(&a);
        if largest < tolerance {
            break true;
        }
        if iterations >= max_iterations {
            break false;
        }
        iterations += 1;
        rotate(&mut a, &mut v, p, q);
    };

    JacobiSolution {
        eigenvalues: (0..n).map(|i| a[(i, i)]).collect(),
        eigenvectors: v,
        iterations,
        converged,
    }
}

/// Position and magnitude of the largest off-diagonal entry (first one in row-major order).
fn largest_off_diagonal(a: &Matrix) -> (usize, usize, f64) {
    let mut best = (0, 0, 0.0);
    for i in 0..a.rows() {
        for j in (0..a.cols()).filter(|&j| j != i) {
            let magnitude = a[(i, j)].abs();
            if magnitude > best.2 {
                best = (i, j, magnitude);
            }
        }
    }
    best
}

/// Apply the rotation that zeroes `a[(p, q)]`.
///
/// `U` is the identity except `U(p,p) = U(q,q) = cos`, `U(p,q) = sin` and `U(q,p) = -sin`, so only
/// columns and rows `p` and `q` change.
fn rotate(a: &mut Matrix, v: &mut Matrix, p: usize, q: usize) {
    let n = a.rows();
    let phi = (a[(q, q)] - a[(p, p)]) / (2.0 * a[(p, q)]);
    // Smaller root of t² + 2φt - 1 = 0, written to avoid cancellation.
    let t = if phi == 0.0 {
        1.0
    } else {
        phi.signum() / (phi.abs() + (phi * phi + 1.0).sqrt())
    };
    let cos = 1.0 / (1.0 + t * t).sqrt();
    let sin = t * cos;

    // A·U
    for k in 0..n {
        let (akp, akq) = (a[(k, p)], a[(k, q)]);
        a[(k, p)] = cos * akp - sin * akq;
        a[(k, q)] = sin * akp + cos * akq;
    }
    // Uᵗ·(A·U)
    for k in 0..n {
        let (apk, aqk) = (a[(p, k)], a[(q, k)]);
        a[(p, k)] = cos * apk - sin * aqk;
        a[(q, k)] = sin * apk + cos * aqk;
    }
    a[(p, q)] = 0.0;
    a[(q, p)] = 0.0;

    // V·U
    for k in 0..n {
        let (vkp, vkq) = (v[(k, p)], v[(k, q)]);
        v[(k, p)] = cos * vkp - sin * vkq;
        v[(k, q)] = sin * vkp + cos * vkq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOLERANCE: f64 = 2.0 * f64::EPSILON;

    #[test]
    fn diagonal_matrix_needs_no_rotation() {
        let m = Matrix::row_vector(vec![3.0, -1.0, 2.0]).as_diagonal().unwrap();
        let solution = diagonalize(&m, 1000, TOLERANCE);
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.eigenvalues, vec![3.0, -1.0, 2.0]);
        assert_eq!(solution.eigenvectors, Matrix::identity(3));
    }

    #[test]
    fn two_by_two_takes_one_rotation() {
        let m = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let solution = diagonalize(&m, 1000, TOLERANCE);
        assert!(solution.converged);
        assert_eq!(solution.iterations, 1);
        let mut values = solution.eigenvalues.clone();
        values.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(values.as_slice(), &[1.0, 3.0][..], epsilon = 1e-14);
    }

    #[test]
    fn rotations_reconstruct_the_matrix() {
        let m = Matrix::from_rows(&[
            vec![4.0, 2.0, 0.0],
            vec![2.0, 5.0, 3.0],
            vec![0.0, 3.0, 6.0],
        ])
        .unwrap();
        let solution = diagonalize(&m, 1000, TOLERANCE);
        assert!(solution.converged);

        let v = &solution.eigenvectors;
        let d = Matrix::row_vector(solution.eigenvalues.clone())
            .as_diagonal()
            .unwrap();
        let reconstructed = (&(v * &d).unwrap() * &v.transpose()).unwrap();
        assert_abs_diff_eq!(reconstructed.as_slice(), m.as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let m = Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 5.0],
            vec![3.0, 5.0, 6.0],
        ])
        .unwrap();
        let solution = diagonalize(&m, 2, TOLERANCE);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn largest_entry_is_the_first_maximum() {
        let m = Matrix::from_rows(&[
            vec![9.0, -4.0, 1.0],
            vec![4.0, 9.0, 0.0],
            vec![1.0, 0.0, 9.0],
        ])
        .unwrap();
        assert_eq!(largest_off_diagonal(&m), (0, 1, 4.0));
    }
}
