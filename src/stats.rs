//! Column statistics. Rows are observations and columns are features.

use crate::{
    error::{MatrixError, Result},
    matrix::Matrix,
};

impl Matrix {
    /// Column means as a `cols x 1` vector.
    pub fn mean(&self) -> Self {
        let mut result = Self::zeros(self.cols(), 1);
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                result[(j, 0)] += self[(i, j)];
            }
        }
        result /= self.rows() as f64;
        result
    }

    /// Column means per group, one row per distinct label in `groups` (ascending).
    pub fn grouped_mean(&self, groups: &Self) -> Result<Self> {
        let members = self.split_by_label(groups)?;
        let mut result = Self::zeros(members.len(), self.cols());
        for (g, (_, member)) in members.iter().enumerate() {
            let means = member.mean();
            for j in 0..self.cols() {
                result[(g, j)] = means[(j, 0)];
            }
        }
        Ok(result)
    }

    /// Sample variance (n - 1 denominator) of each column.
    pub fn var(&self) -> Self {
        let means = self.mean();
        let mut result = Self::zeros(self.cols(), 1);
        for j in 0..self.cols() {
            let sum_sq: f64 = (0..self.rows())
                .map(|i| (self[(i, j)] - means[(j, 0)]).powi(2))
                .sum();
            result[(j, 0)] = sum_sq / (self.rows() as f64 - 1.0);
        }
        result
    }

    pub fn stdev(&self) -> Self {
        self.var().map(f64::sqrt)
    }

    /// `Σ (row - mean)(row - mean)ᵗ` over all rows.
    pub fn scatter(&self) -> Self {
        let means = self.mean();
        let n = self.cols();
        let mut result = Self::zeros(n, n);
        let mut diff = vec![0.0; n];
        for i in 0..self.rows() {
            for (j, d) in diff.iter_mut().enumerate() {
                *d = self[(i, j)] - means[(j, 0)];
            }
            for a in 0..n {
                for b in 0..n {
                    result[(a, b)] += diff[a] * diff[b];
                }
            }
        }
        result
    }

    /// Sample covariance matrix, `scatter() / (rows - 1)`.
    pub fn cov(&self) -> Self {
        self.scatter() / (self.rows() as f64 - 1.0)
    }

    /// Copy with each column's mean subtracted.
    pub fn minus_mean(&self) -> Self {
        let means = self.mean();
        let mut result = self.clone();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                result[(i, j)] -= means[(j, 0)];
            }
        }
        result
    }

    /// Copy with zero-mean, unit-variance columns.
    pub fn standardize(&self) -> Self {
        let means = self.mean();
        let stds = self.stdev();
        let mut result = self.clone();
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                result[(i, j)] = (self[(i, j)] - means[(j, 0)]) / stds[(j, 0)];
            }
        }
        result
    }

    /// Sum of the scatter matrices of each class.
    pub fn within_class_scatter(&self, classes: &Self) -> Result<Self> {
        let mut result = Self::zeros(self.cols(), self.cols());
        for (_, member) in self.split_by_label(classes)? {
            result.add_assign_matrix(&member.scatter())?;
        }
        Ok(result)
    }

    /// `Σ n_c (μ_c - μ)(μ_c - μ)ᵗ` over the classes.
    pub fn between_class_scatter(&self, classes: &Self) -> Result<Self> {
        let overall = self.mean();
        let n = self.cols();
        let mut result = Self::zeros(n, n);
        for (_, member) in self.split_by_label(classes)? {
            let diff = (&member.mean() - &overall)?;
            let weight = member.rows() as f64;
            for a in 0..n {
                for b in 0..n {
                    result[(a, b)] += weight * (diff[(a, 0)] * diff[(b, 0)]);
                }
            }
        }
        Ok(result)
    }

    /// Rows grouped by the label in the matching row of the column vector `labels`.
    fn split_by_label(&self, labels: &Self) -> Result<Vec<(f64, Self)>> {
        if labels.cols() != 1 {
            return Err(MatrixError::invalid_shape("group labels", labels.shape()));
        }
        if labels.rows() != self.rows() {
            return Err(MatrixError::mismatch(
                "group",
                self.shape(),
                labels.shape(),
            ));
        }
        let width = self.cols();
        let distinct = labels.unique();
        distinct
            .as_slice()
            .iter()
            .map(|&label| -> Result<(f64, Self)> {
                let data: Vec<f64> = (0..self.rows())
                    .filter(|&i| labels[(i, 0)] == label)
                    .flat_map(|i| self.as_slice()[i * width..(i + 1) * width].iter().copied())
                    .collect();
                let rows = data.len() / width.max(1);
                Ok((label, Self::new(rows, width, data)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn data() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 2.0],
            vec![3.0, 6.0],
            vec![5.0, 7.0],
            vec![7.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn column_mean_and_variance() {
        let m = data();
        assert_eq!(m.mean().as_slice(), &[4.0, 6.0]);
        assert_abs_diff_eq!(m.var().as_slice(), &[20.0 / 3.0, 26.0 / 3.0][..], epsilon = 1e-12);
        assert_abs_diff_eq!(
            m.stdev().as_slice(),
            &[(20.0f64 / 3.0).sqrt(), (26.0f64 / 3.0).sqrt()][..],
            epsilon = 1e-12
        );
    }

    #[test]
    fn scatter_and_covariance() {
        let m = data();
        let s = m.scatter();
        assert_eq!(s.as_slice(), &[20.0, 22.0, 22.0, 26.0]);
        assert!(s.is_symmetric());
        assert_abs_diff_eq!(m.cov().as_slice(), (&s / 3.0).as_slice(), epsilon = 1e-12);
    }

    #[test]
    fn centering_and_standardizing() {
        let centered = data().minus_mean();
        assert_abs_diff_eq!(centered.mean().as_slice(), &[0.0, 0.0][..], epsilon = 1e-12);

        let standardized = data().standardize();
        assert_abs_diff_eq!(standardized.mean().as_slice(), &[0.0, 0.0][..], epsilon = 1e-12);
        assert_abs_diff_eq!(standardized.var().as_slice(), &[1.0, 1.0][..], epsilon = 1e-12);
    }

    #[test]
    fn grouped_means() {
        let groups = Matrix::column_vector(vec![1.0, 0.0, 1.0, 0.0]);
        let means = data().grouped_mean(&groups).unwrap();
        assert_eq!(means.as_slice(), &[5.0, 7.5, 3.0, 4.5]);

        let short = Matrix::column_vector(vec![1.0, 0.0]);
        assert!(matches!(
            data().grouped_mean(&short),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn class_scatter_splits_total_scatter() {
        let classes = Matrix::column_vector(vec![0.0, 0.0, 1.0, 1.0]);
        let within = data().within_class_scatter(&classes).unwrap();
        let between = data().between_class_scatter(&classes).unwrap();
        let total = (&within + &between).unwrap();
        assert_abs_diff_eq!(total.as_slice(), data().scatter().as_slice(), epsilon = 1e-12);
        assert!(within.is_symmetric());
        assert!(between.is_symmetric());
    }
}
