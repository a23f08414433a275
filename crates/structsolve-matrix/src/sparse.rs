//! Compressed sparse row (CSR) matrix.
//!
//! Column indices are strictly increasing within each row, so every
//! `(row, column)` key has at most one stored entry.

use crate::dense::{check_vec_len, Matrix};
use crate::error::{Result, SolveError};
use crate::scalar::Scalar;

/// Sparse matrix in CSR layout
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Create an empty matrix (no stored entries)
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_ptr: vec![0; nrows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(row, col, value)` triplets in any order.
    ///
    /// Two triplets with the same key are rejected with `DuplicateEntry`.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, T)]) -> Result<Self> {
        for &(r, c, _) in triplets {
            if r >= nrows || c >= ncols {
                return Err(SolveError::IndexOutOfBounds {
                    row: r,
                    col: c,
                    nrows,
                    ncols,
                });
            }
        }

        let mut order: Vec<usize> = (0..triplets.len()).collect();
        order.sort_unstable_by_key(|&k| (triplets[k].0, triplets[k].1));

        let mut row_ptr = vec![0; nrows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;
        for k in order {
            let (r, c, v) = triplets[k];
            if last == Some((r, c)) {
                return Err(SolveError::DuplicateEntry { row: r, col: c });
            }
            last = Some((r, c));
            row_ptr[r + 1] += 1;
            col_idx.push(c);
            values.push(v);
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Ok(Self {
            nrows,
            ncols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Keep the entries of a dense matrix with `|a_ij| > drop_tol`
    pub fn from_dense(m: &Matrix<T>, drop_tol: T) -> Self {
        let mut row_ptr = Vec::with_capacity(m.nrows() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                let v = m[[i, j]];
                if v.abs() > drop_tol {
                    col_idx.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            nrows: m.nrows(),
            ncols: m.ncols(),
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Row pointer array (`nrows + 1` entries)
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Column index of every stored entry
    pub fn col_indices(&self) -> &[usize] {
        &self.col_idx
    }

    /// Value of every stored entry
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable values; the sparsity pattern stays fixed
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Column indices and values of row `i`
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let span = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[span.clone()], &self.values[span])
    }

    /// Iterate over stored entries as `(row, col, value)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.nrows).flat_map(move |i| {
            let (cols, vals) = self.row(i);
            cols.iter().zip(vals.iter()).map(move |(&j, &v)| (i, j, v))
        })
    }

    /// Position of `(i, j)` in the value array, if stored
    pub fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.nrows {
            return None;
        }
        let start = self.row_ptr[i];
        self.col_idx[start..self.row_ptr[i + 1]]
            .binary_search(&j)
            .ok()
            .map(|k| start + k)
    }

    /// Element `(i, j)`; zero when not stored
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.check_bounds(i, j)?;
        Ok(self.position(i, j).map_or(T::zero(), |k| self.values[k]))
    }

    /// Insert or overwrite the entry at `(i, j)`
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        self.check_bounds(i, j)?;
        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];
        match self.col_idx[start..end].binary_search(&j) {
            Ok(k) => self.values[start + k] = value,
            Err(k) => {
                self.col_idx.insert(start + k, j);
                self.values.insert(start + k, value);
                for p in &mut self.row_ptr[i + 1..] {
                    *p += 1;
                }
            }
        }
        Ok(())
    }

    /// Diagonal entries (zero where not stored)
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.nrows.min(self.ncols))
            .map(|i| self.position(i, i).map_or(T::zero(), |k| self.values[k]))
            .collect()
    }

    /// Matrix-vector product written into `y`
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("SparseMatrix::matvec", self.ncols, x.len())?;
        check_vec_len("SparseMatrix::matvec", self.nrows, y.len())?;
        for (i, yi) in y.iter_mut().enumerate() {
            let (cols, vals) = self.row(i);
            *yi = cols
                .iter()
                .zip(vals.iter())
                .fold(T::zero(), |acc, (&j, &v)| acc + v * x[j]);
        }
        Ok(())
    }

    /// Transposed matrix-vector product written into `y`
    pub fn matvec_transpose_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("SparseMatrix::matvec_transpose", self.nrows, x.len())?;
        check_vec_len("SparseMatrix::matvec_transpose", self.ncols, y.len())?;
        y.fill(T::zero());
        for (i, &xi) in x.iter().enumerate() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals.iter()) {
                y[j] += v * xi;
            }
        }
        Ok(())
    }

    /// Matrix-vector product
    pub fn matvec(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.nrows];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// `Aᵗ x`
    pub fn matvec_transpose(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.ncols];
        self.matvec_transpose_into(x, &mut y)?;
        Ok(y)
    }

    /// Transpose (CSR of the transpose)
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0; self.ncols + 1];
        for &j in &self.col_idx {
            row_ptr[j + 1] += 1;
        }
        for j in 0..self.ncols {
            row_ptr[j + 1] += row_ptr[j];
        }
        let mut next = row_ptr.clone();
        let mut col_idx = vec![0; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        for (i, j, v) in self.iter() {
            let k = next[j];
            col_idx[k] = i;
            values[k] = v;
            next[j] += 1;
        }
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Expand to a dense matrix
    pub fn to_dense(&self) -> Matrix<T> {
        log::debug!(
            "densifying {}x{} sparse matrix with {} stored entries",
            self.nrows,
            self.ncols,
            self.nnz()
        );
        let mut m = Matrix::zeros(self.nrows, self.ncols);
        for (i, j, v) in self.iter() {
            m[[i, j]] = v;
        }
        m
    }

    /// Maximum absolute column sum
    pub fn norm_one(&self) -> T {
        let mut sums = vec![T::zero(); self.ncols];
        for (&j, &v) in self.col_idx.iter().zip(self.values.iter()) {
            sums[j] += v.abs();
        }
        sums.into_iter().fold(T::zero(), T::max)
    }

    /// Whether the matrix is square and `|a_ij - a_ji| <= tol` for every stored entry
    pub fn is_symmetric(&self, tol: T) -> bool {
        self.nrows == self.ncols
            && self.iter().all(|(i, j, v)| {
                let mirror = self.position(j, i).map_or(T::zero(), |k| self.values[k]);
                (v - mirror).abs() <= tol
            })
    }

    fn check_bounds(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.nrows || j >= self.ncols {
            return Err(SolveError::IndexOutOfBounds {
                row: i,
                col: j,
                nrows: self.nrows,
                ncols: self.ncols,
            });
        }
        Ok(())
    }
}
