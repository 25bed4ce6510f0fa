//! Conversions to and from [`nalgebra`] matrices.

use nalgebra::DMatrix;

use crate::matrix::Matrix;

impl From<&DMatrix<f64>> for Matrix {
    fn from(m: &DMatrix<f64>) -> Self {
        let mut result = Self::zeros(m.nrows(), m.ncols());
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                result[(i, j)] = m[(i, j)];
            }
        }
        result
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(m: DMatrix<f64>) -> Self {
        Self::from(&m)
    }
}

impl From<&Matrix> for DMatrix<f64> {
    fn from(m: &Matrix) -> Self {
        DMatrix::from_row_slice(m.rows(), m.cols(), m.as_slice())
    }
}

impl From<Matrix> for DMatrix<f64> {
    fn from(m: Matrix) -> Self {
        Self::from(&m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_survives_both_directions() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let d = DMatrix::from(&m);
        assert_eq!(d.shape(), (2, 3));
        assert_eq!(d[(0, 2)], 3.0);
        assert_eq!(d[(1, 0)], 4.0);
        assert_eq!(Matrix::from(d), m);
    }

    #[test]
    fn products_agree() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![1.0, 0.0, -1.0], vec![2.0, 1.0, 0.5]]).unwrap();
        let ours = (&a * &b).unwrap();
        let theirs = DMatrix::from(&a) * DMatrix::from(&b);
        assert_eq!(ours, Matrix::from(&theirs));
    }

    #[test]
    fn empty_matrix() {
        let d = DMatrix::<f64>::zeros(0, 0);
        assert!(Matrix::from(&d).is_empty());
        assert_eq!(DMatrix::from(&Matrix::empty()).shape(), (0, 0));
    }
}
