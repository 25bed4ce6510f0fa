//! Diagonal similarity scaling by powers of the floating-point radix.
//!
//! Balancing makes row and column norms comparable before the QR iteration. Scaling by powers of
//! two is exact, so the eigenvalues are unchanged and the eigenvectors are recovered with
//! [`unbalance`].

use crate::matrix::Matrix;

const RADIX: f64 = 2.0;

/// A sweep only rescales a row/column pair when it shrinks their combined norm below this fraction.
const IMPROVEMENT: f64 = 0.95;

pub struct Balanced {
    pub matrix: Matrix,
    /// `D` in `D⁻¹·A·D`, one power of two per row.
    pub scale: Vec<f64>,
}

pub fn balance(matrix: &Matrix) -> Balanced {
    puffin::profile_function!();
    let n = matrix.rows();
    let mut a = matrix.clone();
    let mut scale = vec![1.0; n];
    let radix_sq = RADIX * RADIX;

    let mut sweeps = 0;
    let mut done = false;
    while !done {
        done = true;
        sweeps += 1;
        for i in 0..n {
            let mut c = 0.0;
            let mut r = 0.0;
            for j in (0..n).filter(|&j| j != i) {
                c += a[(j, i)].abs();
                r += a[(i, j)].abs();
            }
            // Scaling by the radix can never bring an infinite or NaN norm into range.
            if c == 0.0 || r == 0.0 || !c.is_finite() || !r.is_finite() {
                continue;
            }

            let s = c + r;
            let mut f = 1.0;
            let mut g = r / RADIX;
            while c < g {
                f *= RADIX;
                c *= radix_sq;
            }
            g = r * RADIX;
            while c > g {
                f /= RADIX;
                c /= radix_sq;
            }

            if (c + r) / f < IMPROVEMENT * s {
                done = false;
                scale[i] *= f;
                for j in 0..n {
                    a[(i, j)] /= f;
                }
                for j in 0..n {
                    a[(j, i)] *= f;
                }
            }
        }
    }
    log::trace!("balance: {n}x{n} matrix settled after {sweeps} sweeps");

    Balanced { matrix: a, scale }
}

/// Map eigenvectors of the balanced matrix back to the original one: row `i` is multiplied by
/// `scale[i]`.
pub fn unbalance(vectors: &mut Matrix, scale: &[f64]) {
    for (i, &factor) in scale.iter().enumerate() {
        for j in 0..vectors.cols() {
            vectors[(i, j)] *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_factors_are_powers_of_two() {
        let m = Matrix::from_rows(&[
            vec![1.0, 100.0, 0.0],
            vec![0.01, 2.0, 300.0],
            vec![0.0, 0.001, 3.0],
        ])
        .unwrap();
        let balanced = balance(&m);
        assert!(balanced
            .scale
            .iter()
            .all(|s| *s > 0.0 && s.log2().fract() == 0.0));
        assert_ne!(balanced.scale, vec![1.0; 3]);
    }

    #[test]
    fn balancing_is_a_similarity_transform() {
        let m = Matrix::from_rows(&[
            vec![1.0, 1000.0, 2.0],
            vec![0.001, 2.0, 50.0],
            vec![4.0, 0.02, 3.0],
        ])
        .unwrap();
        let balanced = balance(&m);
        // D⁻¹·A·D element by element. Powers of two make this exact.
        for i in 0..3 {
            for j in 0..3 {
                let expected = m[(i, j)] * balanced.scale[j] / balanced.scale[i];
                assert_eq!(balanced.matrix[(i, j)], expected);
            }
        }
        // Diagonal is untouched.
        assert_eq!(balanced.matrix.diagonal_vector(), m.diagonal_vector());
    }

    #[test]
    fn already_balanced_matrix_is_unchanged() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let balanced = balance(&m);
        assert_eq!(balanced.matrix, m);
        assert_eq!(balanced.scale, vec![1.0, 1.0]);
    }

    #[test]
    fn zero_rows_are_skipped() {
        let m = Matrix::from_rows(&[vec![0.0, 0.0], vec![5.0, 1.0]]).unwrap();
        let balanced = balance(&m);
        assert_eq!(balanced.scale, vec![1.0, 1.0]);
    }

    #[test]
    fn non_finite_norms_are_skipped() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![f64::INFINITY, 1.0]]).unwrap();
        let balanced = balance(&m);
        assert_eq!(balanced.scale, vec![1.0, 1.0]);
        assert_eq!(balanced.matrix, m);

        let m = Matrix::from_rows(&[vec![1.0, f64::NAN], vec![1e-6, 1.0]]).unwrap();
        assert_eq!(balance(&m).scale, vec![1.0, 1.0]);
    }

    #[test]
    fn unbalance_scales_rows() {
        let mut v = Matrix::ones(2, 2);
        unbalance(&mut v, &[2.0, 0.5]);
        assert_eq!(v.as_slice(), &[2.0, 2.0, 0.5, 0.5]);
    }
}
