//! Reduction to upper Hessenberg form by stabilized elementary similarity transforms.

use crate::matrix::Matrix;

pub struct Hessenberg {
    /// Upper Hessenberg: every entry below the first sub-diagonal is exactly zero.
    pub matrix: Matrix,
    /// Accumulated transforms `Z`, with `A·Z = Z·H`.
    pub transform: Matrix,
    /// Pivot row chosen when eliminating column `k`, for `k` in `0..n-2`.
    pub permutation: Vec<usize>,
}

/// Gaussian elimination with partial pivoting, applied as a similarity transform.
pub fn reduce(matrix: &Matrix) -> Hessenberg {
    puffin::profile_function!();
    let mut a = matrix.clone();
    let permutation = eliminate(&mut a);
    let transform = accumulate(&a, &permutation);

    let n = a.rows();
    for i in 2..n {
        for j in 0..i - 1 {
            a[(i, j)] = 0.0;
        }
    }

    Hessenberg {
        matrix: a,
        transform,
        permutation,
    }
}

/// Eliminate below the sub-diagonal in place, leaving the multipliers where the zeros would be.
fn eliminate(a: &mut Matrix) -> Vec<usize> {
    let n = a.rows();
    let mut permutation = vec![0; n.saturating_sub(2)];

    for m in 1..n.saturating_sub(1) {
        let mut pivot = 0.0_f64;
        let mut pivot_row = m;
        for j in m..n {
            if a[(j, m - 1)].abs() > pivot.abs() {
                pivot = a[(j, m - 1)];
                pivot_row = j;
            }
        }
        permutation[m - 1] = pivot_row;

        if pivot_row != m {
            a.swap_rows_from(pivot_row, m, m - 1);
            a.swap_columns(pivot_row, m);
        }

        if pivot == 0.0 {
            continue;
        }
        for i in m + 1..n {
            let y = a[(i, m - 1)];
            if y == 0.0 {
                continue;
            }
            let y = y / pivot;
            a[(i, m - 1)] = y;
            for j in m..n {
                a[(i, j)] -= y * a[(m, j)];
            }
            for j in 0..n {
                a[(j, m)] += y * a[(j, i)];
            }
        }
    }
    permutation
}

/// Build `Z` from the stored multipliers and the interchange record.
fn accumulate(a: &Matrix, permutation: &[usize]) -> Matrix {
    let n = a.rows();
    let mut z = Matrix::identity(n);
    for mp in (1..n.saturating_sub(1)).rev() {
        for k in mp + 1..n {
            z[(k, mp)] = a[(k, mp - 1)];
        }
        let i = permutation[mp - 1];
        if i != mp {
            for j in mp..n {
                z[(mp, j)] = z[(i, j)];
                z[(i, j)] = 0.0;
            }
            z[(i, mp)] = 1.0;
        }
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![-2.0, 0.5, 7.0, 1.0],
            vec![8.0, 1.0, -3.0, 2.0],
            vec![0.5, 6.0, 2.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn output_is_upper_hessenberg() {
        let h = reduce(&sample()).matrix;
        for i in 2..4 {
            for j in 0..i - 1 {
                assert_eq!(h[(i, j)], 0.0, "entry ({i}, {j})");
            }
        }
    }

    #[test]
    fn transform_relates_input_and_output() {
        let a = sample();
        let Hessenberg {
            matrix: h,
            transform: z,
            ..
        } = reduce(&a);
        let az = (&a * &z).unwrap();
        let zh = (&z * &h).unwrap();
        assert_abs_diff_eq!(az.as_slice(), zh.as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn pivot_rows_are_recorded() {
        let hessenberg = reduce(&sample());
        assert_eq!(hessenberg.permutation.len(), 2);
        // Largest entry of the first column below the diagonal is 8.0 in row 2.
        assert_eq!(hessenberg.permutation[0], 2);
    }

    #[test]
    fn zero_column_is_left_alone() {
        // Block upper triangular: column 0 is already zero below the diagonal.
        let a = Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.0, 5.0, 6.0, 7.0],
            vec![0.0, 8.0, 9.0, 1.0],
            vec![0.0, 2.0, 3.0, 4.0],
        ])
        .unwrap();
        let hessenberg = reduce(&a);
        assert_eq!(hessenberg.permutation, vec![1, 2]);
        assert_eq!(
            hessenberg.matrix.column(0).unwrap().as_slice(),
            &[1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(hessenberg.matrix[(3, 1)], 0.0);

        let az = (&a * &hessenberg.transform).unwrap();
        let zh = (&hessenberg.transform * &hessenberg.matrix).unwrap();
        assert_abs_diff_eq!(az.as_slice(), zh.as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn small_matrices_pass_through() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let hessenberg = reduce(&m);
        assert_eq!(hessenberg.matrix, m);
        assert_eq!(hessenberg.transform, Matrix::identity(2));
        assert!(hessenberg.permutation.is_empty());

        let hessenberg = reduce(&Matrix::empty());
        assert!(hessenberg.matrix.is_empty());
        assert!(hessenberg.permutation.is_empty());
    }
}
