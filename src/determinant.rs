//! Determinant, cofactors and inverse by Laplace expansion.
//!
//! The expansion costs O(n!) and is only meant for the small matrices this crate targets.
//! Top-level terms are evaluated on the rayon pool and summed in column order, so results are
//! identical from run to run.

use rayon::prelude::*;

use crate::{
    error::{MatrixError, Result},
    matrix::Matrix,
};

impl Matrix {
    pub fn determinant(&self) -> Result<f64> {
        if !self.is_square() {
            return Err(MatrixError::non_square("determinant", self.shape()));
        }
        match self.rows() {
            0 => Ok(1.0),
            1 => Ok(self[(0, 0)]),
            2 => Ok(self.determinant_2x2()),
            n => {
                let terms = (0..n)
                    .into_par_iter()
                    .map(|c| self.expansion_term(c))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(terms.iter().sum())
            }
        }
    }

    fn determinant_2x2(&self) -> f64 {
        self[(0, 0)] * self[(1, 1)] - self[(1, 0)] * self[(0, 1)]
    }

    /// Sequential expansion used below the top level.
    fn laplace(&self) -> Result<f64> {
        match self.rows() {
            0 => Ok(1.0),
            1 => Ok(self[(0, 0)]),
            2 => Ok(self.determinant_2x2()),
            n => (0..n).map(|c| self.expansion_term(c)).sum(),
        }
    }

    fn expansion_term(&self, col: usize) -> Result<f64> {
        let element = self[(0, col)];
        if element == 0.0 {
            return Ok(0.0);
        }
        Ok(alternate(0, col) * element * self.submatrix(0, col)?.laplace()?)
    }

    /// Determinant of the submatrix without `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> Result<f64> {
        if !self.is_square() {
            return Err(MatrixError::non_square("minor", self.shape()));
        }
        self.submatrix(row, col)?.laplace()
    }

    pub fn cofactor(&self, row: usize, col: usize) -> Result<f64> {
        Ok(alternate(row, col) * self.minor(row, col)?)
    }

    pub fn cofactor_matrix(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(MatrixError::non_square("cofactor matrix", self.shape()));
        }
        let n = self.rows();
        let data = (0..n * n)
            .into_par_iter()
            .map(|index| self.cofactor(index / n, index % n))
            .collect::<Result<Vec<f64>>>()?;
        Self::new(n, n, data)
    }

    /// Transpose of the cofactor matrix.
    pub fn adjugate(&self) -> Result<Self> {
        Ok(self.cofactor_matrix()?.transpose())
    }

    /// `adjugate() / determinant()`.
    ///
    /// Only an exactly zero determinant is reported as [`MatrixError::SingularMatrix`]; nearly
    /// singular input produces large, inaccurate entries instead.
    pub fn inverse(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(MatrixError::non_square("inverse", self.shape()));
        }
        let det = self.determinant()?;
        if det == 0.0 {
            return Err(MatrixError::SingularMatrix);
        }
        Ok(self.adjugate()? / det)
    }
}

#[inline]
fn alternate(row: usize, col: usize) -> f64 {
    if (row + col) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}
