use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::error::{MatrixError, Result};

/// Dense, row-major matrix of `f64`.
///
/// A 0x0 matrix is "empty" and is used as a placeholder for results that have not been computed.
/// Equality is exact element-wise comparison, callers that need a tolerance must round first.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawMatrix"))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unchecked wire form of [`Matrix`]. Deserialization goes through [`Matrix::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawMatrix> for Matrix {
    type Error = MatrixError;

    fn try_from(raw: RawMatrix) -> Result<Self> {
        Self::new(raw.rows, raw.cols, raw.data)
    }
}

/// Selects whether [`Matrix::filter`] keeps rows or columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Columns,
}

impl Matrix {
    /// Create a matrix from row-major `data`, which must hold exactly `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(MatrixError::mismatch(
                "initialize",
                (rows, cols),
                (data.len(), 1),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::fill(rows, cols, 0.0)
    }

    pub fn ones(rows: usize, cols: usize) -> Self {
        Self::fill(rows, cols, 1.0)
    }

    /// # Panics
    ///
    /// If `rows * cols` overflows `usize`.
    pub fn fill(rows: usize, cols: usize, value: f64) -> Self {
        let Some(len) = rows.checked_mul(cols) else {
            panic!("a {rows}x{cols} matrix does not fit in memory");
        };
        Self {
            rows,
            cols,
            data: vec![value; len],
        }
    }

    /// Square matrix with `value` on the diagonal and zeros elsewhere.
    pub fn diagonal(size: usize, value: f64) -> Self {
        let mut result = Self::zeros(size, size);
        for i in 0..size {
            result[(i, i)] = value;
        }
        result
    }

    pub fn identity(size: usize) -> Self {
        Self::diagonal(size, 1.0)
    }

    /// Build a matrix from a slice of rows. All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(MatrixError::mismatch(
                    "stack rows of",
                    (1, cols),
                    (1, row.len()),
                ));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), cols, data)
    }

    pub fn column_vector(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    pub fn row_vector(values: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Exact test of `A == Aᵗ`.
    pub fn is_symmetric(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        for i in 0..self.rows {
            for j in (i + 1)..self.cols {
                if self[(i, j)] != self[(j, i)] {
                    return false;
                }
            }
        }
        true
    }

    fn check_index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(row * self.cols + col)
    }

    /// Checked element access.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let index = self.check_index(row, col)?;
        Ok(self.data[index])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut f64> {
        let index = self.check_index(row, col)?;
        Ok(&mut self.data[index])
    }

    pub fn trace(&self) -> Result<f64> {
        if !self.is_square() {
            return Err(MatrixError::non_square("trace", self.shape()));
        }
        Ok((0..self.rows).map(|i| self[(i, i)]).sum())
    }

    /// Diagonal of a square matrix as a column vector.
    pub fn diagonal_vector(&self) -> Result<Self> {
        if !self.is_square() {
            return Err(MatrixError::non_square("diagonal", self.shape()));
        }
        Ok(Self::column_vector(
            (0..self.rows).map(|i| self[(i, i)]).collect(),
        ))
    }

    /// Square diagonal matrix built from a row or column vector.
    pub fn as_diagonal(&self) -> Result<Self> {
        if self.rows != 1 && self.cols != 1 {
            return Err(MatrixError::invalid_shape("as_diagonal", self.shape()));
        }
        let mut result = Self::zeros(self.data.len(), self.data.len());
        for (i, &value) in self.data.iter().enumerate() {
            result[(i, i)] = value;
        }
        Ok(result)
    }

    pub fn transpose(&self) -> Self {
        let mut result = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                result[(j, i)] = self[(i, j)];
            }
        }
        result
    }

    /// Copy of the matrix without `row` and `col`.
    pub fn submatrix(&self, row: usize, col: usize) -> Result<Self> {
        self.check_index(row, col)?;
        let mut data = Vec::with_capacity((self.rows - 1) * (self.cols - 1));
        for i in (0..self.rows).filter(|&i| i != row) {
            for j in (0..self.cols).filter(|&j| j != col) {
                data.push(self[(i, j)]);
            }
        }
        Self::new(self.rows - 1, self.cols - 1, data)
    }

    /// Row `index` as a column vector.
    pub fn row(&self, index: usize) -> Result<Self> {
        if index >= self.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: index,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let start = index * self.cols;
        Ok(Self::column_vector(
            self.data[start..start + self.cols].to_vec(),
        ))
    }

    /// Column `index` as a column vector.
    pub fn column(&self, index: usize) -> Result<Self> {
        if index >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row: 0,
                col: index,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(Self::column_vector(
            (0..self.rows).map(|i| self[(i, index)]).collect(),
        ))
    }

    pub(crate) fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for i in 0..self.rows {
            self.data.swap(i * self.cols + a, i * self.cols + b);
        }
    }

    /// Swap rows `a` and `b`, leaving the columns before `from` in place.
    pub(crate) fn swap_rows_from(&mut self, a: usize, b: usize, from: usize) {
        if a == b {
            return;
        }
        for j in from..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    fn check_vector(
        &self,
        values: &Self,
        expected_len: usize,
        operation: &'static str,
    ) -> Result<()> {
        if values.cols != 1 {
            return Err(MatrixError::invalid_shape(operation, values.shape()));
        }
        if !self.is_empty() && values.rows != expected_len {
            return Err(MatrixError::mismatch(
                operation,
                self.shape(),
                values.shape(),
            ));
        }
        Ok(())
    }

    /// Append a column. `values` must be a column vector with one entry per row.
    pub fn add_column(&mut self, values: &Self) -> Result<()> {
        self.insert_column(values, self.cols)
    }

    /// Insert a column before `position`, shifting the following columns right.
    pub fn insert_column(&mut self, values: &Self, position: usize) -> Result<()> {
        self.check_vector(values, self.rows, "insert a column into")?;
        if self.is_empty() {
            *self = values.clone();
            return Ok(());
        }
        if position > self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row: 0,
                col: position,
                rows: self.rows,
                cols: self.cols,
            });
        }
        // Back to front so earlier insertions don't shift the later offsets.
        for i in (0..self.rows).rev() {
            self.data.insert(i * self.cols + position, values.data[i]);
        }
        self.cols += 1;
        Ok(())
    }

    /// Append a row. `values` must be a column vector with one entry per column.
    pub fn add_row(&mut self, values: &Self) -> Result<()> {
        self.insert_row(values, self.rows)
    }

    /// Insert a row before `position`, shifting the following rows down.
    pub fn insert_row(&mut self, values: &Self, position: usize) -> Result<()> {
        self.check_vector(values, self.cols, "insert a row into")?;
        if self.is_empty() {
            *self = values.transpose();
            return Ok(());
        }
        if position > self.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: position,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let tail = self.data.split_off(position * self.cols);
        self.data.extend_from_slice(&values.data);
        self.data.extend(tail);
        self.rows += 1;
        Ok(())
    }

    pub fn remove_column(&mut self, position: usize) -> Result<()> {
        if position >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row: 0,
                col: position,
                rows: self.rows,
                cols: self.cols,
            });
        }
        for i in (0..self.rows).rev() {
            self.data.remove(i * self.cols + position);
        }
        self.cols -= 1;
        if self.cols == 0 {
            self.rows = 0;
        }
        Ok(())
    }

    pub fn remove_row(&mut self, position: usize) -> Result<()> {
        if position >= self.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: position,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let offset = position * self.cols;
        self.data.drain(offset..offset + self.cols);
        self.rows -= 1;
        if self.rows == 0 {
            self.cols = 0;
        }
        Ok(())
    }

    /// Reinterpret the buffer with a new shape holding the same number of elements.
    pub fn reshape(&mut self, rows: usize, cols: usize) -> Result<()> {
        if rows.checked_mul(cols) != Some(self.data.len()) {
            return Err(MatrixError::invalid_shape("reshape", (rows, cols)));
        }
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Sort every element of the buffer in place, keeping the shape.
    pub fn sort(&mut self) {
        self.data.sort_by(f64::total_cmp);
    }

    pub fn sorted(&self) -> Self {
        let mut result = self.clone();
        result.sort();
        result
    }

    /// Distinct values, ascending, as a column vector.
    pub fn unique(&self) -> Self {
        let mut values = self.data.clone();
        values.sort_by(f64::total_cmp);
        values.dedup();
        Self::column_vector(values)
    }

    /// Two-column table of each distinct value and how often it occurs.
    pub fn count(&self) -> Self {
        let values = self.unique();
        let mut result = Self::zeros(values.rows, 2);
        for (g, &value) in values.data.iter().enumerate() {
            result[(g, 0)] = value;
            result[(g, 1)] = self.data.iter().filter(|&&x| x == value).count() as f64;
        }
        result
    }

    pub fn contains(&self, value: f64) -> bool {
        self.data.contains(&value)
    }

    /// Keep the rows (or columns) whose entry in the 0/1 column vector `mask` is 1.
    pub fn filter(&self, mask: &Self, axis: Axis) -> Result<Self> {
        let dimension = match axis {
            Axis::Rows => self.rows,
            Axis::Columns => self.cols,
        };
        if mask.cols != 1 {
            return Err(MatrixError::InvalidFilter(
                "mask must have exactly one column".into(),
            ));
        }
        if mask.rows != dimension {
            return Err(MatrixError::InvalidFilter(format!(
                "mask has {} entries, expected {dimension}",
                mask.rows
            )));
        }
        let unique = mask.unique();
        if unique.rows != 2 || !(unique.contains(0.0) && unique.contains(1.0)) {
            return Err(MatrixError::InvalidFilter(
                "mask must be composed of both 0s and 1s".into(),
            ));
        }

        let mut result = Self::empty();
        for (i, _) in mask.data.iter().enumerate().filter(|(_, &m)| m == 1.0) {
            match axis {
                Axis::Rows => result.add_row(&self.row(i)?)?,
                Axis::Columns => result.add_column(&self.column(i)?)?,
            }
        }
        Ok(result)
    }

    pub fn rows_where(&self, mask: &Self) -> Result<Self> {
        self.filter(mask, Axis::Rows)
    }

    pub fn columns_where(&self, mask: &Self) -> Result<Self> {
        self.filter(mask, Axis::Columns)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for a {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for a {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[row * self.cols + col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const CELL_WIDTH: usize = 13;
        for i in 0..self.rows {
            for j in 0..self.cols {
                write!(f, "{:<width$}", format!("{:.6}", self[(i, j)]), width = CELL_WIDTH)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn new_rejects_wrong_length() {
        assert!(matches!(
            Matrix::new(2, 2, vec![1.0; 3]),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn overflowing_shapes_are_rejected() {
        // 2^(bits - 1) * 2 wraps to zero.
        let half = usize::MAX / 2 + 1;
        assert!(matches!(
            Matrix::new(half, 2, Vec::new()),
            Err(MatrixError::DimensionMismatch { .. })
        ));
        let mut m = Matrix::empty();
        assert_eq!(
            m.reshape(half, 2),
            Err(MatrixError::invalid_shape("reshape", (half, 2)))
        );
        assert!(m.is_empty());
    }

    #[test]
    #[should_panic(expected = "does not fit in memory")]
    fn fill_panics_on_overflowing_shape() {
        let _ = Matrix::zeros(usize::MAX, 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialization_checks_the_shape() {
        let m: Matrix = serde_json::from_str(r#"{"rows":2,"cols":2,"data":[1.0,2.0,3.0,4.0]}"#)
            .unwrap();
        assert_eq!(m.transpose().as_slice(), &[1.0, 3.0, 2.0, 4.0]);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<Matrix>(&json).unwrap(), m);

        let err = serde_json::from_str::<Matrix>(r#"{"rows":2,"cols":2,"data":[1.0]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("cannot initialize a 2x2 matrix"), "{err}");
    }

    #[test]
    fn checked_access() {
        let m = sample();
        assert_eq!(m.get(1, 2).unwrap(), 6.0);
        assert_eq!(
            m.get(2, 0),
            Err(MatrixError::IndexOutOfRange {
                row: 2,
                col: 0,
                rows: 2,
                cols: 3
            })
        );
        assert!(m.get(0, 3).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_panics_out_of_range() {
        let m = sample();
        let _ = m[(0, 3)];
    }

    #[test]
    fn transpose_swaps_shape() {
        let t = sample().transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(t.transpose(), sample());
    }

    #[test]
    fn symmetry_is_exact() {
        let mut m = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert!(m.is_symmetric());
        m[(0, 1)] += 1e-15;
        assert!(!m.is_symmetric());
        assert!(!sample().is_symmetric());
    }

    #[test]
    fn submatrix_removes_row_and_column() {
        let m = Matrix::new(3, 3, (1..=9).map(f64::from).collect()).unwrap();
        let sub = m.submatrix(1, 1).unwrap();
        assert_eq!(sub.as_slice(), &[1.0, 3.0, 7.0, 9.0]);
    }

    #[test]
    fn insert_and_remove_columns() {
        let mut m = sample();
        m.insert_column(&Matrix::column_vector(vec![9.0, 8.0]), 1)
            .unwrap();
        assert_eq!(m.as_slice(), &[1.0, 9.0, 2.0, 3.0, 4.0, 8.0, 5.0, 6.0]);
        m.remove_column(1).unwrap();
        assert_eq!(m, sample());

        let err = m.add_column(&Matrix::column_vector(vec![1.0, 2.0, 3.0]));
        assert!(matches!(err, Err(MatrixError::DimensionMismatch { .. })));
        let err = m.add_column(&Matrix::row_vector(vec![1.0, 2.0]));
        assert!(matches!(err, Err(MatrixError::InvalidShape { .. })));
    }

    #[test]
    fn insert_and_remove_rows() {
        let mut m = sample();
        m.insert_row(&Matrix::column_vector(vec![7.0, 8.0, 9.0]), 0)
            .unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.row(0).unwrap().as_slice(), &[7.0, 8.0, 9.0]);
        m.remove_row(0).unwrap();
        assert_eq!(m, sample());
    }

    #[test]
    fn empty_matrix_adopts_first_vector() {
        let mut m = Matrix::empty();
        m.add_row(&Matrix::column_vector(vec![1.0, 2.0])).unwrap();
        assert_eq!(m.shape(), (1, 2));

        let mut m = Matrix::empty();
        m.add_column(&Matrix::column_vector(vec![1.0, 2.0])).unwrap();
        assert_eq!(m.shape(), (2, 1));
    }

    #[test]
    fn unique_and_count() {
        let m = Matrix::row_vector(vec![3.0, 1.0, 3.0, 2.0, 3.0]);
        assert_eq!(m.unique().as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(m.count().as_slice(), &[1.0, 1.0, 2.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn filter_rows_and_columns() {
        let m = Matrix::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let rows = m
            .rows_where(&Matrix::column_vector(vec![1.0, 0.0, 1.0]))
            .unwrap();
        assert_eq!(rows.as_slice(), &[1.0, 2.0, 5.0, 6.0]);
        let cols = m
            .columns_where(&Matrix::column_vector(vec![0.0, 1.0]))
            .unwrap();
        assert_eq!(cols.as_slice(), &[2.0, 4.0, 6.0]);

        let err = m.rows_where(&Matrix::column_vector(vec![1.0, 2.0, 1.0]));
        assert!(matches!(err, Err(MatrixError::InvalidFilter(_))));
    }

    #[test]
    fn reshape_keeps_data() {
        let mut m = sample();
        m.reshape(3, 2).unwrap();
        assert_eq!(m.shape(), (3, 2));
        assert!(m.reshape(4, 2).is_err());
    }

    #[test]
    fn diagonal_helpers() {
        let d = Matrix::row_vector(vec![1.0, 2.0]).as_diagonal().unwrap();
        assert_eq!(d.as_slice(), &[1.0, 0.0, 0.0, 2.0]);
        assert_eq!(d.diagonal_vector().unwrap().as_slice(), &[1.0, 2.0]);
        assert_eq!(d.trace().unwrap(), 3.0);
        assert!(sample().diagonal_vector().is_err());
        assert!(sample().as_diagonal().is_err());
    }

    #[test]
    fn matrix_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Matrix>();
    }

    #[test]
    fn display_pads_cells() {
        let text = Matrix::identity(2).to_string();
        assert_eq!(
            text,
            "1.000000     0.000000     \n0.000000     1.000000     \n"
        );
    }
}
