//! Strided row/column views into matrix storage.
//!
//! A view borrows the storage of the matrix it came from, so writes through a
//! [`VecMut`] land in that matrix. Call `to_vec` for an independent copy.

use std::ops::{Index, IndexMut};

use crate::scalar::Scalar;

/// Read-only strided view (a row or a column of a dense matrix).
#[derive(Debug, Clone, Copy)]
pub struct VecRef<'a, T> {
    data: &'a [T],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a, T> VecRef<'a, T> {
    /// Create a view of `len` elements starting at `offset`, `stride` apart.
    ///
    /// # Panics
    /// Panics if the last element would fall outside `data`.
    pub fn new(data: &'a [T], offset: usize, stride: usize, len: usize) -> Self {
        if len > 0 {
            assert!(
                offset + (len - 1) * stride < data.len(),
                "view out of bounds: offset {offset}, stride {stride}, len {len}, storage {}",
                data.len()
            );
        }
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    /// Number of elements in the view
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distance between consecutive elements in the underlying storage
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Iterate over the viewed elements
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let data: &'a [T] = if self.len == 0 {
            &[]
        } else {
            &self.data[self.offset..]
        };
        data.iter().step_by(self.stride.max(1)).take(self.len)
    }
}

impl<T: Scalar> VecRef<'_, T> {
    /// Copy the viewed elements into a new vector
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }

    /// Dot product with a slice of the same length
    pub fn dot(&self, other: &[T]) -> T {
        assert_eq!(self.len, other.len());
        self.iter()
            .zip(other.iter())
            .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    }

    /// Euclidean norm of the viewed elements
    pub fn norm(&self) -> T {
        self.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt()
    }
}

impl<T> Index<usize> for VecRef<'_, T> {
    type Output = T;

    fn index(&self, i: usize) -> &Self::Output {
        assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        &self.data[self.offset + i * self.stride]
    }
}

/// Mutable strided view. Writes are visible in the source matrix.
#[derive(Debug)]
pub struct VecMut<'a, T> {
    data: &'a mut [T],
    offset: usize,
    stride: usize,
    len: usize,
}

impl<'a, T> VecMut<'a, T> {
    /// Create a mutable view of `len` elements starting at `offset`, `stride` apart.
    ///
    /// # Panics
    /// Panics if the last element would fall outside `data`.
    pub fn new(data: &'a mut [T], offset: usize, stride: usize, len: usize) -> Self {
        if len > 0 {
            assert!(
                offset + (len - 1) * stride < data.len(),
                "view out of bounds: offset {offset}, stride {stride}, len {len}, storage {}",
                data.len()
            );
        }
        Self {
            data,
            offset,
            stride,
            len,
        }
    }

    /// Number of elements in the view
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view has no elements
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reborrow as a read-only view
    pub fn as_view(&self) -> VecRef<'_, T> {
        VecRef {
            data: &*self.data,
            offset: self.offset,
            stride: self.stride,
            len: self.len,
        }
    }

    /// Iterate mutably over the viewed elements
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let stride = self.stride.max(1);
        let len = self.len;
        let data: &mut [T] = if len == 0 {
            &mut []
        } else {
            &mut self.data[self.offset..]
        };
        data.iter_mut().step_by(stride).take(len)
    }
}

impl<T: Scalar> VecMut<'_, T> {
    /// Overwrite the viewed elements with `values`
    pub fn copy_from_slice(&mut self, values: &[T]) {
        assert_eq!(self.len, values.len());
        for (dst, &src) in self.iter_mut().zip(values.iter()) {
            *dst = src;
        }
    }

    /// Multiply every viewed element by `alpha`
    pub fn scale(&mut self, alpha: T) {
        for x in self.iter_mut() {
            *x *= alpha;
        }
    }

    /// Copy the viewed elements into a new vector
    pub fn to_vec(&self) -> Vec<T> {
        self.as_view().to_vec()
    }
}

impl<T> Index<usize> for VecMut<'_, T> {
    type Output = T;

    fn index(&self, i: usize) -> &Self::Output {
        assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        &self.data[self.offset + i * self.stride]
    }
}

impl<T> IndexMut<usize> for VecMut<'_, T> {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        assert!(i < self.len, "index {i} out of bounds for view of length {}", self.len);
        &mut self.data[self.offset + i * self.stride]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strided_view() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let v = VecRef::new(&data, 1, 3, 2);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0], 2.0);
        assert_eq!(v[1], 5.0);
        assert_eq!(v.to_vec(), vec![2.0, 5.0]);
        assert_eq!(v.dot(&[1.0, 1.0]), 7.0);
    }

    #[test]
    fn test_mut_view_writes_through() {
        let mut data = vec![0.0; 6];
        {
            let mut v = VecMut::new(&mut data, 2, 2, 2);
            v[0] = 1.0;
            v[1] = 2.0;
            v.scale(3.0);
        }
        assert_eq!(data, vec![0.0, 0.0, 3.0, 0.0, 6.0, 0.0]);
    }

    #[test]
    fn test_empty_view() {
        let data: Vec<f64> = Vec::new();
        let v = VecRef::new(&data, 3, 1, 0);
        assert!(v.is_empty());
        assert_eq!(v.iter().count(), 0);
    }

    #[test]
    #[should_panic]
    fn test_view_out_of_bounds() {
        let data = vec![1.0, 2.0];
        let _ = VecRef::new(&data, 1, 2, 2);
    }
}
