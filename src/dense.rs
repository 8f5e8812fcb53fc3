//! General dense operands: row-major matrices and vectors with lower bounds.

use std::ops::{Index, IndexMut};

use crate::matrix::extent;
use crate::{Element, MatrixError, Result, SymMatrix};

/// General (not necessarily symmetric) row-major matrix over
/// `[row_lwb..=row_upb] x [col_lwb..=col_upb]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T: Element> {
    nrows: usize,
    ncols: usize,
    row_lwb: isize,
    col_lwb: isize,
    data: Vec<T>,
}

impl<T: Element> DenseMatrix<T> {
    /// Zero `nrows x ncols` matrix indexed from 0.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self::alloc(nrows, ncols, 0, 0)
    }

    /// Zero matrix over the given bounds.
    pub fn with_bounds(row_lwb: isize, row_upb: isize, col_lwb: isize, col_upb: isize) -> Result<Self> {
        let nrows = extent("DenseMatrix::with_bounds", row_lwb, row_upb)?;
        let ncols = extent("DenseMatrix::with_bounds", col_lwb, col_upb)?;
        Ok(Self::alloc(nrows, ncols, row_lwb, col_lwb))
    }

    /// Matrix from row-major `data` of `nrows * ncols` elements.
    pub fn from_rows(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(MatrixError::ShapeMismatch {
                op: "DenseMatrix::from_rows",
                detail: format!("{} elements for {nrows}x{ncols}", data.len()),
            });
        }
        Ok(DenseMatrix {
            nrows,
            ncols,
            row_lwb: 0,
            col_lwb: 0,
            data,
        })
    }

    /// Identity of size `n`.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m.data[i * n + i] = T::one();
        }
        m
    }

    /// Full copy of a symmetric matrix, keeping its bounds.
    pub fn from_sym(a: &SymMatrix<'_, T>) -> Self {
        DenseMatrix {
            nrows: a.nrows(),
            ncols: a.ncols(),
            row_lwb: a.row_lwb(),
            col_lwb: a.col_lwb(),
            data: a.matrix_array().to_vec(),
        }
    }

    pub(crate) fn alloc(nrows: usize, ncols: usize, row_lwb: isize, col_lwb: isize) -> Self {
        DenseMatrix {
            nrows,
            ncols,
            row_lwb,
            col_lwb,
            data: vec![T::zero(); nrows * ncols],
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_lwb(&self) -> isize {
        self.row_lwb
    }

    pub fn row_upb(&self) -> isize {
        self.row_lwb + self.nrows as isize - 1
    }

    pub fn col_lwb(&self) -> isize {
        self.col_lwb
    }

    pub fn col_upb(&self) -> isize {
        self.col_lwb + self.ncols as isize - 1
    }

    /// Move the index bounds without touching the elements.
    pub fn shift(&mut self, row_shift: isize, col_shift: isize) {
        self.row_lwb += row_shift;
        self.col_lwb += col_shift;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn get(&self, i: isize, j: isize) -> Option<T> {
        self.checked_offset(i, j).map(|off| self.data[off])
    }

    pub fn set(&mut self, i: isize, j: isize, value: T) -> Result<()> {
        match self.checked_offset(i, j) {
            Some(off) => {
                self.data[off] = value;
                Ok(())
            }
            None => Err(MatrixError::OutOfBounds {
                op: "DenseMatrix::set",
                lwb: i.min(j),
                upb: i.max(j),
                extent_lwb: self.row_lwb.min(self.col_lwb),
                extent_upb: self.row_upb().max(self.col_upb()),
            }),
        }
    }

    fn checked_offset(&self, i: isize, j: isize) -> Option<usize> {
        let r = i - self.row_lwb;
        let c = j - self.col_lwb;
        if r < 0 || c < 0 || r as usize >= self.nrows || c as usize >= self.ncols {
            return None;
        }
        Some(r as usize * self.ncols + c as usize)
    }

    /// Transposed copy; bounds swap as well.
    pub fn transpose(&self) -> Self {
        let mut t = Self::alloc(self.ncols, self.nrows, self.col_lwb, self.row_lwb);
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                t.data[j * self.nrows + i] = self.data[i * self.ncols + j];
            }
        }
        t
    }

    /// `self · other`. Column bounds of `self` must match row bounds of
    /// `other`.
    pub fn mul(&self, other: &DenseMatrix<T>) -> Result<Self> {
        if self.ncols != other.nrows || self.col_lwb != other.row_lwb {
            return Err(MatrixError::IncompatibleOperands {
                op: "DenseMatrix::mul",
                lhs_lwb: self.col_lwb,
                lhs_n: self.ncols,
                rhs_lwb: other.row_lwb,
                rhs_n: other.nrows,
            });
        }
        let mut c = Self::alloc(self.nrows, other.ncols, self.row_lwb, other.col_lwb);
        gemm_nn(
            &self.data,
            &other.data,
            &mut c.data,
            self.nrows,
            self.ncols,
            other.ncols,
        );
        Ok(c)
    }

    /// `selfᵀ · other`. Row bounds of both operands must match.
    pub fn transpose_mul(&self, other: &DenseMatrix<T>) -> Result<Self> {
        if self.nrows != other.nrows || self.row_lwb != other.row_lwb {
            return Err(MatrixError::IncompatibleOperands {
                op: "DenseMatrix::transpose_mul",
                lhs_lwb: self.row_lwb,
                lhs_n: self.nrows,
                rhs_lwb: other.row_lwb,
                rhs_n: other.nrows,
            });
        }
        let (k, m, n) = (self.nrows, self.ncols, other.ncols);
        let mut c = Self::alloc(m, n, self.col_lwb, other.col_lwb);
        for l in 0..k {
            for i in 0..m {
                let a = self.data[l * m + i];
                if a == T::zero() {
                    continue;
                }
                for j in 0..n {
                    c.data[i * n + j] += a * other.data[l * n + j];
                }
            }
        }
        Ok(c)
    }

    /// `self · a` for a symmetric `a`.
    pub fn mul_sym(&self, a: &SymMatrix<'_, T>) -> Result<Self> {
        if !a.is_valid() {
            return Err(MatrixError::Invalid);
        }
        self.mul(&DenseMatrix::from_sym(a))
    }

    /// `selfᵀ · a` for a symmetric `a`.
    pub fn transpose_mul_sym(&self, a: &SymMatrix<'_, T>) -> Result<Self> {
        if !a.is_valid() {
            return Err(MatrixError::Invalid);
        }
        self.transpose_mul(&DenseMatrix::from_sym(a))
    }
}

/// `c = a · b` for row-major `a: m x k`, `b: k x n`.
pub(crate) fn gemm_nn<T: Element>(a: &[T], b: &[T], c: &mut [T], m: usize, k: usize, n: usize) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);
    for i in 0..m {
        let crow = &mut c[i * n..(i + 1) * n];
        crow.iter_mut().for_each(|x| *x = T::zero());
        for l in 0..k {
            let ail = a[i * k + l];
            if ail == T::zero() {
                continue;
            }
            for (cij, &blj) in crow.iter_mut().zip(&b[l * n..(l + 1) * n]) {
                *cij += ail * blj;
            }
        }
    }
}

impl<T: Element> Index<(isize, isize)> for DenseMatrix<T> {
    type Output = T;

    fn index(&self, (i, j): (isize, isize)) -> &T {
        match self.checked_offset(i, j) {
            Some(off) => &self.data[off],
            None => panic!("index ({i}, {j}) out of range"),
        }
    }
}

impl<T: Element> IndexMut<(isize, isize)> for DenseMatrix<T> {
    fn index_mut(&mut self, (i, j): (isize, isize)) -> &mut T {
        match self.checked_offset(i, j) {
            Some(off) => &mut self.data[off],
            None => panic!("index ({i}, {j}) out of range"),
        }
    }
}

/// Vector over `[lwb..=upb]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVector<T: Element> {
    lwb: isize,
    data: Vec<T>,
}

impl<T: Element> DenseVector<T> {
    /// Zero vector of `n` elements indexed from 0.
    pub fn new(n: usize) -> Self {
        DenseVector {
            lwb: 0,
            data: vec![T::zero(); n],
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        DenseVector { lwb: 0, data }
    }

    pub fn with_lwb(lwb: isize, data: Vec<T>) -> Self {
        DenseVector { lwb, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn lwb(&self) -> isize {
        self.lwb
    }

    pub fn upb(&self) -> isize {
        self.lwb + self.data.len() as isize - 1
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, i: isize) -> Option<T> {
        let k = i - self.lwb;
        if k < 0 {
            return None;
        }
        self.data.get(k as usize).copied()
    }
}

impl<T: Element> Index<isize> for DenseVector<T> {
    type Output = T;

    fn index(&self, i: isize) -> &T {
        let k = i - self.lwb;
        if k < 0 || k as usize >= self.data.len() {
            panic!("index {i} out of range");
        }
        &self.data[k as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul() {
        let a = DenseMatrix::from_rows(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = DenseMatrix::from_rows(3, 1, vec![1.0, 0.0, -1.0]).unwrap();
        let c = a.mul(&b).unwrap();
        assert_eq!(c.as_slice(), &[-2.0, -2.0]);
        assert!(b.mul(&b).is_err());
    }

    #[test]
    fn test_transpose_mul_matches_explicit() {
        let a = DenseMatrix::from_rows(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = DenseMatrix::from_rows(3, 2, vec![0.5, -1.0, 2.0, 0.0, 1.0, 1.0]).unwrap();
        let direct = a.transpose().mul(&b).unwrap();
        assert_eq!(a.transpose_mul(&b).unwrap(), direct);
    }

    #[test]
    fn test_products_with_symmetric() {
        let a = SymMatrix::<f64>::from_rows(3, &[2.0, -1.0, 0.5, -1.0, 3.0, 1.0, 0.5, 1.0, 4.0])
            .unwrap();
        let b = DenseMatrix::from_rows(2, 3, vec![1.0, 0.0, 2.0, -1.0, 3.0, 1.0]).unwrap();
        let dense = DenseMatrix::from_sym(&a);
        assert_eq!(b.mul_sym(&a).unwrap(), b.mul(&dense).unwrap());

        let c = b.transpose();
        assert_eq!(
            c.transpose_mul_sym(&a).unwrap(),
            c.transpose_mul(&dense).unwrap()
        );

        let mut bad = a.clone();
        let _ = bad.resize(3, 4);
        assert!(matches!(b.mul_sym(&bad), Err(MatrixError::Invalid)));
        assert!(b.transpose_mul_sym(&a).is_err());
    }

    #[test]
    fn test_bounds_and_index() {
        let mut m = DenseMatrix::<f64>::with_bounds(1, 2, -1, 1).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (2, 3));
        m[(2, -1)] = 4.0;
        assert_eq!(m.get(2, -1), Some(4.0));
        assert_eq!(m.get(0, 0), None);
        assert!(m.set(3, 0, 1.0).is_err());
        let t = m.transpose();
        assert_eq!(t[(-1, 2)], 4.0);
    }

    #[test]
    fn test_vector() {
        let v = DenseVector::with_lwb(2, vec![1.0_f64, 2.0]);
        assert_eq!(v.upb(), 3);
        assert_eq!(v[3], 2.0);
        assert_eq!(v.get(1), None);
    }
}
