//! Dense row-major matrix and the vector helpers built on it

use std::ops::{Index, IndexMut};

use crate::error::{Result, SolveError};
use crate::scalar::Scalar;
use crate::view::{VecMut, VecRef};

/// Element order of a flat array handed to or taken from a [`Matrix`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Consecutive elements walk along a row
    #[default]
    RowMajor,
    /// Consecutive elements walk down a column
    ColMajor,
}

/// General dense matrix, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Clone> Matrix<T> {
    /// Create a new matrix from dimensions and initial value
    pub fn from_elem(nrows: usize, ncols: usize, elem: T) -> Self {
        Self {
            data: vec![elem; nrows * ncols],
            nrows,
            ncols,
        }
    }
}

impl<T> Matrix<T> {
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

    /// Whether the matrix has as many rows as columns
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Row-major element storage
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable row-major element storage
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the matrix, returning its row-major storage
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Bounds-checked element access
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i < self.nrows && j < self.ncols {
            self.data.get(i * self.ncols + j)
        } else {
            None
        }
    }

    /// Borrow row `i` as a view sharing this matrix's storage
    pub fn row(&self, i: usize) -> VecRef<'_, T> {
        assert!(i < self.nrows, "row {i} out of bounds for {} rows", self.nrows);
        VecRef::new(&self.data, i * self.ncols, 1, self.ncols)
    }

    /// Borrow column `j` as a strided view sharing this matrix's storage
    pub fn col(&self, j: usize) -> VecRef<'_, T> {
        assert!(j < self.ncols, "column {j} out of bounds for {} columns", self.ncols);
        VecRef::new(&self.data, j, self.ncols, self.nrows)
    }

    /// Mutably borrow row `i`; writes are visible in this matrix
    pub fn row_mut(&mut self, i: usize) -> VecMut<'_, T> {
        assert!(i < self.nrows, "row {i} out of bounds for {} rows", self.nrows);
        let ncols = self.ncols;
        VecMut::new(&mut self.data, i * ncols, 1, ncols)
    }

    /// Mutably borrow column `j`; writes are visible in this matrix
    pub fn col_mut(&mut self, j: usize) -> VecMut<'_, T> {
        assert!(j < self.ncols, "column {j} out of bounds for {} columns", self.ncols);
        let (nrows, ncols) = (self.nrows, self.ncols);
        VecMut::new(&mut self.data, j, ncols, nrows)
    }

    /// Swap two rows in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let n = self.ncols;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * n);
        head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
    }
}

impl<T: Scalar> Matrix<T> {
    /// Create a zeros matrix
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_elem(nrows, ncols, T::zero())
    }

    /// Create an `n x n` identity matrix
    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[[i, i]] = T::one();
        }
        m
    }

    /// Create a matrix whose `(i, j)` element is `f(i, j)`
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Take ownership of row-major storage
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(SolveError::ShapeMismatch {
                operation: "Matrix::from_vec",
                expected: (nrows, ncols),
                actual: (data.len(), 1),
            });
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Copy a flat array laid out in the given element order
    pub fn from_slice(nrows: usize, ncols: usize, data: &[T], order: Order) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(SolveError::ShapeMismatch {
                operation: "Matrix::from_slice",
                expected: (nrows, ncols),
                actual: (data.len(), 1),
            });
        }
        match order {
            Order::RowMajor => Ok(Self {
                data: data.to_vec(),
                nrows,
                ncols,
            }),
            Order::ColMajor => Ok(Self::from_fn(nrows, ncols, |i, j| data[j * nrows + i])),
        }
    }

    /// Create a matrix from a vector of rows
    pub fn from_vec2d(rows: Vec<Vec<T>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(SolveError::ShapeMismatch {
                    operation: "Matrix::from_vec2d",
                    expected: (1, ncols),
                    actual: (1, row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Flatten into a vector in the requested element order
    pub fn to_vec(&self, order: Order) -> Vec<T> {
        match order {
            Order::RowMajor => self.data.clone(),
            Order::ColMajor => (0..self.ncols)
                .flat_map(|j| (0..self.nrows).map(move |i| (i, j)))
                .map(|(i, j)| self[[i, j]])
                .collect(),
        }
    }

    /// Overwrite column `j` with `values`
    pub fn set_col(&mut self, j: usize, values: &[T]) -> Result<()> {
        if values.len() != self.nrows {
            return Err(SolveError::ShapeMismatch {
                operation: "Matrix::set_col",
                expected: (self.nrows, 1),
                actual: (values.len(), 1),
            });
        }
        self.col_mut(j).copy_from_slice(values);
        Ok(())
    }

    /// Transpose the matrix
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.ncols, self.nrows, |i, j| self[[j, i]])
    }

    /// Matrix multiplication: `self * other`
    pub fn matmul(&self, other: &Matrix<T>) -> Result<Self> {
        if self.ncols != other.nrows {
            return Err(SolveError::ShapeMismatch {
                operation: "matmul",
                expected: (self.ncols, other.ncols),
                actual: other.shape(),
            });
        }
        let mut result = Self::zeros(self.nrows, other.ncols);
        for i in 0..self.nrows {
            for l in 0..self.ncols {
                let a_il = self[[i, l]];
                if a_il == T::zero() {
                    continue;
                }
                for j in 0..other.ncols {
                    result[[i, j]] += a_il * other[[l, j]];
                }
            }
        }
        Ok(result)
    }

    /// Matrix-vector product `self * x`
    pub fn matvec(&self, x: &[T]) -> Result<Vec<T>> {
        let mut y = vec![T::zero(); self.nrows];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// Matrix-vector product written into `y`
    pub fn matvec_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("matvec", self.ncols, x.len())?;
        check_vec_len("matvec", self.nrows, y.len())?;
        for (i, yi) in y.iter_mut().enumerate() {
            *yi = dot(&self.data[i * self.ncols..(i + 1) * self.ncols], x);
        }
        Ok(())
    }

    /// Transposed matrix-vector product `self^T * x` written into `y`
    pub fn matvec_transpose_into(&self, x: &[T], y: &mut [T]) -> Result<()> {
        check_vec_len("matvec_transpose", self.nrows, x.len())?;
        check_vec_len("matvec_transpose", self.ncols, y.len())?;
        y.fill(T::zero());
        for (i, &xi) in x.iter().enumerate() {
            axpy(xi, &self.data[i * self.ncols..(i + 1) * self.ncols], y);
        }
        Ok(())
    }

    /// Maximum absolute column sum
    pub fn norm_one(&self) -> T {
        (0..self.ncols)
            .map(|j| self.col(j).iter().map(|x| x.abs()).sum::<T>())
            .fold(T::zero(), T::max)
    }

    /// Maximum absolute row sum
    pub fn norm_inf(&self) -> T {
        (0..self.nrows)
            .map(|i| self.row(i).iter().map(|x| x.abs()).sum::<T>())
            .fold(T::zero(), T::max)
    }

    /// Frobenius norm
    pub fn norm_frobenius(&self) -> T {
        nrm2(&self.data)
    }

    /// Largest absolute entry
    pub fn max_abs(&self) -> T {
        self.data.iter().map(|x| x.abs()).fold(T::zero(), T::max)
    }

    /// Copy of the lower triangle (diagonal included), zeros above
    pub fn lower_triangle(&self) -> Self {
        Self::from_fn(self.nrows, self.ncols, |i, j| {
            if j <= i {
                self[[i, j]]
            } else {
                T::zero()
            }
        })
    }

    /// Copy of the upper triangle (diagonal included), zeros below
    pub fn upper_triangle(&self) -> Self {
        Self::from_fn(self.nrows, self.ncols, |i, j| {
            if j >= i {
                self[[i, j]]
            } else {
                T::zero()
            }
        })
    }

    /// Whether the matrix is square and `|a_ij - a_ji| <= tol` everywhere
    pub fn is_symmetric(&self, tol: T) -> bool {
        self.is_square()
            && (0..self.nrows)
                .all(|i| (0..i).all(|j| (self[[i, j]] - self[[j, i]]).abs() <= tol))
    }

    /// Elementwise comparison within an absolute tolerance
    pub fn approx_eq(&self, other: &Matrix<T>, tol: T) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a - b).abs() <= tol)
    }

    /// Whether every entry is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

impl<T> Index<[usize; 2]> for Matrix<T> {
    type Output = T;

    fn index(&self, idx: [usize; 2]) -> &Self::Output {
        debug_assert!(idx[0] < self.nrows && idx[1] < self.ncols);
        &self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl<T> IndexMut<[usize; 2]> for Matrix<T> {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut Self::Output {
        debug_assert!(idx[0] < self.nrows && idx[1] < self.ncols);
        &mut self.data[idx[0] * self.ncols + idx[1]]
    }
}

/// Create a zeros matrix with given dimensions
pub fn zeros<T: Scalar>(nrows: usize, ncols: usize) -> Matrix<T> {
    Matrix::zeros(nrows, ncols)
}

/// Create an identity matrix
pub fn eye<T: Scalar>(n: usize) -> Matrix<T> {
    Matrix::eye(n)
}

/// Create a matrix from a 2D vector (row-major)
pub fn from_vec2d<T: Scalar>(data: Vec<Vec<T>>) -> Result<Matrix<T>> {
    Matrix::from_vec2d(data)
}

/// Fail with `ShapeMismatch` unless a vector has the expected length
pub fn check_vec_len(operation: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SolveError::ShapeMismatch {
            operation,
            expected: (expected, 1),
            actual: (actual, 1),
        });
    }
    Ok(())
}

/// Dot product of two vectors
pub fn dot<T: Scalar>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Euclidean norm
pub fn nrm2<T: Scalar>(x: &[T]) -> T {
    x.iter().fold(T::zero(), |acc, &v| acc + v * v).sqrt()
}

/// Sum of absolute values
pub fn asum<T: Scalar>(x: &[T]) -> T {
    x.iter().map(|v| v.abs()).sum()
}

/// `y += alpha * x`
pub fn axpy<T: Scalar>(alpha: T, x: &[T], y: &mut [T]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// Index of the element with the largest absolute value (first one on ties)
pub fn iamax<T: Scalar>(x: &[T]) -> usize {
    let mut best = 0;
    let mut best_val = T::neg_infinity();
    for (i, &v) in x.iter().enumerate() {
        if v.abs() > best_val {
            best_val = v.abs();
            best = i;
        }
    }
    best
}
