//! Arithmetic on [`Matrix`].
//!
//! Scalar operators are infallible and come in both operand orders. Matrix-matrix operators work
//! on references and return a [`Result`], since the shapes are only known at runtime:
//!
//! ```
//! # use dense_eigen::Matrix;
//! let a = Matrix::identity(2);
//! let b = (&a * &(&a * 3.0))?;
//! assert_eq!(b, Matrix::diagonal(2, 3.0));
//! # Ok::<(), dense_eigen::MatrixError>(())
//! ```

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use rayon::prelude::*;

use crate::{
    error::{MatrixError, Result},
    matrix::Matrix,
};

impl Matrix {
    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut result = self.clone();
        result.as_mut_slice().iter_mut().for_each(|x| *x = f(*x));
        result
    }

    fn zip_with(
        &self,
        other: &Self,
        operation: &'static str,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(MatrixError::mismatch(
                operation,
                self.shape(),
                other.shape(),
            ));
        }
        let mut result = self.clone();
        result
            .as_mut_slice()
            .iter_mut()
            .zip(other.as_slice())
            .for_each(|(a, &b)| *a = f(*a, b));
        Ok(result)
    }

    /// Matrix product. Rows of the result are computed in parallel.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        if self.cols() != rhs.rows() {
            return Err(MatrixError::mismatch("multiply", self.shape(), rhs.shape()));
        }
        let inner = self.cols();
        let width = rhs.cols();
        let mut result = Self::zeros(self.rows(), width);
        if width == 0 || inner == 0 {
            return Ok(result);
        }

        let lhs = self.as_slice();
        let rhs = rhs.as_slice();
        result
            .as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, out_row)| {
                let lhs_row = &lhs[i * inner..(i + 1) * inner];
                for (k, &a) in lhs_row.iter().enumerate() {
                    let rhs_row = &rhs[k * width..(k + 1) * width];
                    for (out, &b) in out_row.iter_mut().zip(rhs_row) {
                        *out += a * b;
                    }
                }
            });
        Ok(result)
    }

    /// Entry-wise product.
    pub fn hadamard(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "hadamard-multiply", |a, b| a * b)
    }

    pub fn add_assign_matrix(&mut self, other: &Self) -> Result<()> {
        *self = self.zip_with(other, "add", |a, b| a + b)?;
        Ok(())
    }

    pub fn sub_assign_matrix(&mut self, other: &Self) -> Result<()> {
        *self = self.zip_with(other, "subtract", |a, b| a - b)?;
        Ok(())
    }

    /// In-place product, the receiver takes the shape of the result.
    pub fn mul_assign_matrix(&mut self, other: &Self) -> Result<()> {
        *self = self.matmul(other)?;
        Ok(())
    }

    /// 1 where the element equals `value`, 0 elsewhere.
    pub fn eq_scalar(&self, value: f64) -> Self {
        self.map(|x| if x == value { 1.0 } else { 0.0 })
    }

    /// 1 where the element differs from `value`, 0 elsewhere.
    pub fn ne_scalar(&self, value: f64) -> Self {
        self.map(|x| if x != value { 1.0 } else { 0.0 })
    }
}

macro_rules! scalar_op {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait<f64> for &Matrix {
            type Output = Matrix;

            fn $method(self, value: f64) -> Matrix {
                self.map(|x| x $op value)
            }
        }

        impl $trait<f64> for Matrix {
            type Output = Matrix;

            fn $method(mut self, value: f64) -> Matrix {
                self.as_mut_slice().iter_mut().for_each(|x| *x = *x $op value);
                self
            }
        }

        impl $trait<&Matrix> for f64 {
            type Output = Matrix;

            fn $method(self, m: &Matrix) -> Matrix {
                m.map(|x| self $op x)
            }
        }

        impl $trait<Matrix> for f64 {
            type Output = Matrix;

            fn $method(self, m: Matrix) -> Matrix {
                self $op &m
            }
        }

        impl $assign_trait<f64> for Matrix {
            fn $assign_method(&mut self, value: f64) {
                self.as_mut_slice().iter_mut().for_each(|x| *x = *x $op value);
            }
        }
    };
}

scalar_op!(Add, add, AddAssign, add_assign, +);
scalar_op!(Sub, sub, SubAssign, sub_assign, -);
scalar_op!(Mul, mul, MulAssign, mul_assign, *);
scalar_op!(Div, div, DivAssign, div_assign, /);

impl Neg for &Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        self.map(|x| -x)
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    fn neg(self) -> Matrix {
        -&self
    }
}

impl Add for &Matrix {
    type Output = Result<Matrix>;

    fn add(self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }
}

impl Sub for &Matrix {
    type Output = Result<Matrix>;

    fn sub(self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }
}

impl Mul for &Matrix {
    type Output = Result<Matrix>;

    fn mul(self, rhs: &Matrix) -> Result<Matrix> {
        self.matmul(rhs)
    }
}

/// Entry-wise division.
impl Div for &Matrix {
    type Output = Result<Matrix>;

    fn div(self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "divide", |a, b| a / b)
    }
}
