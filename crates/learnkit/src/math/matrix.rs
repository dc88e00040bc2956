use std::ops::{Index, IndexMut, RangeBounds};

use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{LearnError, Result};
use crate::math::vector::Array1;

/// Contiguous row-major two-dimensional array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(LearnError::InvalidShape(format!(
                "({}, {}) for buffer of length {}",
                rows,
                cols,
                data.len()
            )));
        }
        Ok(Self { data, rows, cols })
    }

    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        Self::from_shape_vec((rows, cols), data)
    }

    /// Build a matrix from nested rows, rejecting empty and ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let cols = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(LearnError::EmptyInput),
        };
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(LearnError::InvalidShape(format!(
                    "row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: nrows,
            cols,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn row_slice_mut(&mut self, row: usize) -> &mut [T] {
        let start = self.offset(row, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| self.row_slice(r))
    }

    pub fn row(&self, row: usize) -> Array1<T>
    where
        T: Clone,
    {
        Array1::from_vec(self.row_slice(row).to_vec())
    }

    pub fn column(&self, col: usize) -> Array1<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        let mut values = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            values.push(self[(row, col)].clone());
        }
        Array1::from_vec(values)
    }

    pub fn select_rows(&self, indices: &[usize]) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            let slice = self.row_slice(row);
            data.extend_from_slice(slice);
        }
        Array2 {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    pub fn select_columns<R>(&self, range: R) -> Array2<T>
    where
        R: RangeBounds<usize>,
        T: Clone,
    {
        use std::ops::Bound;

        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
        };

        let end = match range.end_bound() {
            Bound::Unbounded => self.cols,
            Bound::Included(&e) => e + 1,
            Bound::Excluded(&e) => e,
        };

        assert!(
            start <= end && end <= self.cols,
            "column slice out of bounds"
        );

        let new_cols = end - start;
        let mut data = Vec::with_capacity(self.rows * new_cols);
        for row in 0..self.rows {
            let slice = &self.row_slice(row)[start..end];
            data.extend_from_slice(slice);
        }

        Array2 {
            data,
            rows: self.rows,
            cols: new_cols,
        }
    }

    pub fn mapv<U, F>(&self, mut f: F) -> Array2<U>
    where
        F: FnMut(&T) -> U,
    {
        Array2 {
            data: self.data.iter().map(|v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// The `cols x rows` matrix with `self[(j, i)]` at `(i, j)`.
    pub fn t(&self) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(self.data.len());
        for col in 0..self.cols {
            for row in 0..self.rows {
                data.push(self[(row, col)].clone());
            }
        }
        Array2 {
            data,
            rows: self.cols,
            cols: self.rows,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }

    pub fn to_rows(&self) -> Vec<Vec<T>>
    where
        T: Clone,
    {
        self.rows().map(|r| r.to_vec()).collect()
    }
}

impl<T> Array2<T>
where
    T: Clone + Zero,
{
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Array2 {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
        }
    }
}

impl<T> Array2<T>
where
    T: Clone + Zero + One,
{
    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros(n, n);
        for i in 0..n {
            out[(i, i)] = T::one();
        }
        out
    }

    /// Copy of `self` with a leading column filled with ones (bias term).
    pub fn prepend_ones(&self) -> Array2<T> {
        let cols = self.cols + 1;
        let mut data = Vec::with_capacity(self.rows * cols);
        for row in 0..self.rows {
            data.push(T::one());
            data.extend_from_slice(self.row_slice(row));
        }
        Array2 {
            data,
            rows: self.rows,
            cols,
        }
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}
