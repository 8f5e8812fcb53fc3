//! The symmetric matrix container.

use std::ops::Index;

use crate::storage::Storage;
use crate::{Element, MatrixError, Result};

/// Validity state of a matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Valid,
    /// Invalidated by the recorded error; every further operation fails.
    Invalid(MatrixError),
}

/// Element order of a caller-supplied array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayOrder {
    #[default]
    RowMajor,
    /// Fortran order: columns are contiguous.
    ColumnMajor,
}

/// Operations applied to a prototype by [`SymMatrix::from_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorOp {
    /// Zero matrix with the prototype's shape.
    Zero,
    /// Identity with the prototype's shape.
    Unit,
    /// Transpose of the prototype (a copy).
    Transposed,
    /// Inverse of the prototype.
    Inverted,
    /// `Aᵀ·A` of the prototype.
    AtA,
}

/// Operations combining two matrices in [`SymMatrix::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Plus,
    Minus,
}

/// Dense symmetric matrix over the index range `[lwb..=upb] x [lwb..=upb]`.
///
/// Elements are stored row-major in a full `n x n` block; writes through the
/// public API keep `M[i, j] == M[j, i]`. The buffer is either owned (inline
/// up to [`INLINE_MAX`](crate::INLINE_MAX) elements, heap beyond) or borrowed
/// from the caller, in which case the matrix cannot be resized.
#[derive(Debug)]
pub struct SymMatrix<'a, T: Element> {
    nrows: usize,
    row_lwb: isize,
    tol: T,
    storage: Storage<'a, T>,
    status: Status,
}

/// True when both matrices are valid and share shape and bounds.
pub fn are_compatible<T: Element>(a: &SymMatrix<'_, T>, b: &SymMatrix<'_, T>) -> bool {
    a.is_valid() && b.is_valid() && a.nrows == b.nrows && a.row_lwb == b.row_lwb
}

/// First `(row, col)` pair, 0-based, with `data[row][col] != data[col][row]`.
pub(crate) fn find_asymmetry<T: Element>(data: &[T], n: usize) -> Option<(usize, usize)> {
    for i in 0..n {
        for j in (i + 1)..n {
            if data[i * n + j] != data[j * n + i] {
                return Some((i, j));
            }
        }
    }
    None
}

/// Number of rows of the range `[lwb, upb]`, if it is not reversed.
pub(crate) fn extent(op: &'static str, lwb: isize, upb: isize) -> Result<usize> {
    if upb.checked_add(1).map_or(false, |u| u < lwb) {
        return Err(MatrixError::ShapeMismatch {
            op,
            detail: format!("upper bound {upb} below lower bound {lwb}"),
        });
    }
    upb.checked_sub(lwb)
        .and_then(|d| usize::try_from(d).ok())
        .and_then(|d| d.checked_add(1))
        .ok_or_else(|| MatrixError::ShapeMismatch {
            op,
            detail: format!("range [{lwb}, {upb}] too large"),
        })
}

/// Check that a matrix of `n` rows starting at `lwb` has a representable
/// upper bound `lwb + n - 1`.
pub(crate) fn check_bounds(op: &'static str, lwb: isize, n: usize) -> Result<()> {
    isize::try_from(n)
        .ok()
        .and_then(|n| lwb.checked_add(n - 1))
        .map(|_| ())
        .ok_or_else(|| MatrixError::ShapeMismatch {
            op,
            detail: format!("{n} rows from lower bound {lwb} overflow the index range"),
        })
}

impl<T: Element> SymMatrix<'static, T> {
    /// Zero matrix of `n` rows indexed from 0.
    pub fn new(n: usize) -> Self {
        Self::alloc(n, 0)
    }

    /// Zero matrix over `[lwb..=upb]`; `upb == lwb - 1` gives an empty matrix.
    pub fn with_bounds(lwb: isize, upb: isize) -> Result<Self> {
        let n = extent("with_bounds", lwb, upb)?;
        Ok(Self::alloc(n, lwb))
    }

    /// Matrix of `n` rows from a row-major array, which must be symmetric.
    pub fn from_rows(n: usize, data: &[T]) -> Result<Self> {
        Self::from_array(0, n as isize - 1, data, ArrayOrder::RowMajor)
    }

    /// Matrix over `[lwb..=upb]` from an array of `n * n` elements.
    pub fn from_array(lwb: isize, upb: isize, data: &[T], order: ArrayOrder) -> Result<Self> {
        let n = extent("from_array", lwb, upb)?;
        let mut m = Self::alloc(n, lwb);
        m.set_matrix_array(data, order)?;
        Ok(m)
    }

    /// An empty matrix carrying `err`.
    pub fn invalid(op: &'static str, err: MatrixError) -> Self {
        let mut m = Self::alloc(0, 0);
        m.fail(op, err);
        m
    }

    /// Matrix built by applying `op` to `prototype`.
    ///
    /// Failures produce an invalid matrix; check [`SymMatrix::is_valid`].
    pub fn from_op(op: CreatorOp, prototype: &SymMatrix<'_, T>) -> Self {
        if !prototype.is_valid() {
            return Self::invalid("from_op", MatrixError::Invalid);
        }
        let (n, lwb) = (prototype.nrows, prototype.row_lwb);
        match op {
            CreatorOp::Zero => Self::alloc(n, lwb),
            CreatorOp::Unit => {
                let mut m = Self::alloc(n, lwb);
                m.fill_identity();
                m
            }
            CreatorOp::Transposed => {
                let mut m = Self::alloc(n, lwb);
                // Shape matches by construction.
                let _ = m.transpose(prototype);
                m
            }
            CreatorOp::Inverted => {
                let mut m = prototype.to_owned_matrix();
                // The caller cannot tune this matrix's tolerance.
                let old = m.set_tolerance(T::min_tolerance());
                let _ = m.invert();
                m.set_tolerance(old);
                m
            }
            CreatorOp::AtA => {
                let mut m = Self::alloc(n, lwb);
                let _ = m.at_mult_a_sym(prototype);
                m
            }
        }
    }

    /// `a + b` or `a - b`; incompatible operands give an invalid matrix.
    pub fn combine(a: &SymMatrix<'_, T>, op: CombineOp, b: &SymMatrix<'_, T>) -> Self {
        if !a.is_valid() || !b.is_valid() {
            return Self::invalid("combine", MatrixError::Invalid);
        }
        let mut m = a.to_owned_matrix();
        let _ = match op {
            CombineOp::Plus => m.add_assign_matrix(b),
            CombineOp::Minus => m.sub_assign_matrix(b),
        };
        m
    }

    pub(crate) fn alloc(n: usize, lwb: isize) -> Self {
        SymMatrix {
            nrows: n,
            row_lwb: lwb,
            tol: T::tolerance(),
            storage: Storage::allocate(n * n),
            status: Status::Valid,
        }
    }
}

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Non-owning matrix over `[lwb..=upb]` backed by `data`.
    ///
    /// `data` must hold at least `n * n` elements forming a symmetric
    /// matrix; only the first `n * n` are used.
    pub fn view(lwb: isize, upb: isize, data: &'a mut [T]) -> Result<Self> {
        let mut m = SymMatrix {
            nrows: 0,
            row_lwb: lwb,
            tol: T::tolerance(),
            storage: Storage::Empty,
            status: Status::Valid,
        };
        m.use_buffer(lwb, upb, data)?;
        Ok(m)
    }

    /// Re-bind this matrix as a view over `data`, releasing its own buffer.
    pub fn use_buffer(&mut self, lwb: isize, upb: isize, data: &'a mut [T]) -> Result<()> {
        if upb < lwb {
            return Err(self.fail(
                "use_buffer",
                MatrixError::ShapeMismatch {
                    op: "use_buffer",
                    detail: format!("row_upb={upb} < row_lwb={lwb}"),
                },
            ));
        }
        let n = (upb - lwb + 1) as usize;
        if data.len() < n * n {
            return Err(self.fail(
                "use_buffer",
                MatrixError::ShapeMismatch {
                    op: "use_buffer",
                    detail: format!("buffer of {} elements for {n}x{n}", data.len()),
                },
            ));
        }
        let data = &mut data[..n * n];
        if let Some((i, j)) = find_asymmetry(data, n) {
            let err = MatrixError::NotSymmetric {
                row: lwb + i as isize,
                col: lwb + j as isize,
            };
            return Err(self.fail("use_buffer", err));
        }
        self.nrows = n;
        self.row_lwb = lwb;
        self.storage = Storage::Borrowed(data);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Shape and state
    // ------------------------------------------------------------------------

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.nrows
    }

    pub fn row_lwb(&self) -> isize {
        self.row_lwb
    }

    pub fn row_upb(&self) -> isize {
        self.row_lwb + self.nrows as isize - 1
    }

    pub fn col_lwb(&self) -> isize {
        self.row_lwb
    }

    pub fn col_upb(&self) -> isize {
        self.row_upb()
    }

    /// Number of stored elements, `nrows * ncols`.
    pub fn len(&self) -> usize {
        self.nrows * self.nrows
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Whether the matrix owns its buffer (and may be resized).
    pub fn is_owner(&self) -> bool {
        self.storage.is_owner()
    }

    /// Whether the elements live in the inline buffer.
    pub fn is_inline(&self) -> bool {
        self.storage.is_inline()
    }

    /// Tolerance used by inversion and determinant.
    pub fn tolerance(&self) -> T {
        self.tol
    }

    /// Set the tolerance, returning the previous one.
    pub fn set_tolerance(&mut self, tol: T) -> T {
        std::mem::replace(&mut self.tol, tol)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status, Status::Valid)
    }

    /// Clear a recorded error. The contents are whatever the failed
    /// operation left behind.
    pub fn make_valid(&mut self) {
        self.status = Status::Valid;
    }

    /// Owned copy; a view becomes an owning matrix.
    pub fn to_owned_matrix(&self) -> SymMatrix<'static, T> {
        SymMatrix {
            nrows: self.nrows,
            row_lwb: self.row_lwb,
            tol: self.tol,
            storage: self.storage.to_owned_storage(),
            status: self.status.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------------

    /// Row-major elements.
    pub fn matrix_array(&self) -> &[T] {
        self.storage.as_slice()
    }

    /// Overwrite all elements from `data`, which must be symmetric.
    pub fn set_matrix_array(&mut self, data: &[T], order: ArrayOrder) -> Result<()> {
        self.ensure_valid()?;
        let n = self.nrows;
        if data.len() != n * n {
            return Err(self.fail(
                "set_matrix_array",
                MatrixError::ShapeMismatch {
                    op: "set_matrix_array",
                    detail: format!("{} elements for {n}x{n}", data.len()),
                },
            ));
        }
        {
            let out = self.storage.as_mut_slice();
            match order {
                ArrayOrder::RowMajor => out.copy_from_slice(data),
                ArrayOrder::ColumnMajor => {
                    for i in 0..n {
                        for j in 0..n {
                            out[i * n + j] = data[j * n + i];
                        }
                    }
                }
            }
        }
        if let Some((i, j)) = find_asymmetry(self.data(), n) {
            let err = MatrixError::NotSymmetric {
                row: self.row_lwb + i as isize,
                col: self.row_lwb + j as isize,
            };
            return Err(self.fail("set_matrix_array", err));
        }
        Ok(())
    }

    /// Element `(i, j)` in logical indices, if in range.
    pub fn get(&self, i: isize, j: isize) -> Option<T> {
        self.checked_offset(i, j).map(|off| self.data()[off])
    }

    /// Element `(i, j)`, or `OutOfBounds`.
    pub fn at(&self, i: isize, j: isize) -> Result<T> {
        self.ensure_valid()?;
        match self.checked_offset(i, j) {
            Some(off) => Ok(self.data()[off]),
            None => Err(self.out_of_bounds("at", i, j)),
        }
    }

    /// Write `value` at `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: isize, j: isize, value: T) -> Result<()> {
        self.ensure_valid()?;
        match (self.checked_offset(i, j), self.checked_offset(j, i)) {
            (Some(a), Some(b)) => {
                let data = self.data_mut();
                data[a] = value;
                data[b] = value;
                Ok(())
            }
            _ => {
                let err = self.out_of_bounds("set", i, j);
                Err(self.fail("set", err))
            }
        }
    }

    /// Exact symmetry check of the stored elements.
    pub fn is_symmetric(&self) -> bool {
        find_asymmetry(self.data(), self.nrows).is_none()
    }

    // ------------------------------------------------------------------------
    // Crate internals
    // ------------------------------------------------------------------------

    pub(crate) fn data(&self) -> &[T] {
        self.storage.as_slice()
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage<'a, T> {
        &mut self.storage
    }

    pub(crate) fn set_shape(&mut self, n: usize, lwb: isize) {
        self.nrows = n;
        self.row_lwb = lwb;
    }

    pub(crate) fn contains(&self, i: isize) -> bool {
        i >= self.row_lwb && i <= self.row_upb()
    }

    pub(crate) fn checked_offset(&self, i: isize, j: isize) -> Option<usize> {
        if self.contains(i) && self.contains(j) {
            let n = self.nrows;
            Some((i - self.row_lwb) as usize * n + (j - self.row_lwb) as usize)
        } else {
            None
        }
    }

    pub(crate) fn ensure_valid(&self) -> Result<()> {
        match self.status {
            Status::Valid => Ok(()),
            Status::Invalid(_) => Err(MatrixError::Invalid),
        }
    }

    /// Mark the matrix invalid with `err`, report it, and hand it back.
    pub(crate) fn fail(&mut self, op: &'static str, err: MatrixError) -> MatrixError {
        tracing::warn!(op, error = %err, "symmetric matrix invalidated");
        self.status = Status::Invalid(err.clone());
        err
    }

    /// Fail unless `other` is valid and has the same shape and bounds.
    pub(crate) fn check_compatible(
        &mut self,
        op: &'static str,
        other: &SymMatrix<'_, T>,
    ) -> Result<()> {
        self.ensure_valid()?;
        if !other.is_valid() {
            return Err(self.fail(op, MatrixError::Invalid));
        }
        if self.nrows != other.nrows || self.row_lwb != other.row_lwb {
            let err = MatrixError::IncompatibleOperands {
                op,
                lhs_lwb: self.row_lwb,
                lhs_n: self.nrows,
                rhs_lwb: other.row_lwb,
                rhs_n: other.nrows,
            };
            return Err(self.fail(op, err));
        }
        Ok(())
    }

    pub(crate) fn fill_identity(&mut self) {
        let n = self.nrows;
        let data = self.data_mut();
        data.iter_mut().for_each(|x| *x = T::zero());
        for i in 0..n {
            data[i * n + i] = T::one();
        }
    }

    /// Copy the upper triangle onto the lower one.
    pub(crate) fn mirror_upper(&mut self) {
        let n = self.nrows;
        let data = self.data_mut();
        for i in 1..n {
            for j in 0..i {
                data[i * n + j] = data[j * n + i];
            }
        }
    }

    fn out_of_bounds(&self, op: &'static str, i: isize, j: isize) -> MatrixError {
        MatrixError::OutOfBounds {
            op,
            lwb: i.min(j),
            upb: i.max(j),
            extent_lwb: self.row_lwb,
            extent_upb: self.row_upb(),
        }
    }
}

impl<T: Element> Clone for SymMatrix<'_, T> {
    fn clone(&self) -> Self {
        self.to_owned_matrix()
    }
}

impl<T: Element> Index<(isize, isize)> for SymMatrix<'_, T> {
    type Output = T;

    fn index(&self, (i, j): (isize, isize)) -> &T {
        match self.checked_offset(i, j) {
            Some(off) => &self.data()[off],
            None => panic!(
                "index ({i}, {j}) out of range [{}, {}]",
                self.row_lwb,
                self.row_upb()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INLINE_MAX;

    #[test]
    fn test_new_is_zero_and_valid() {
        let m = SymMatrix::<f64>::new(3);
        assert!(m.is_valid());
        assert!(m.is_owner());
        assert_eq!(m.len(), 9);
        assert!(m.matrix_array().iter().all(|&x| x == 0.0));
        assert_eq!(m.tolerance(), f64::EPSILON);
    }

    #[test]
    fn test_bounds() {
        let m = SymMatrix::<f64>::with_bounds(-2, 1).unwrap();
        assert_eq!(m.nrows(), 4);
        assert_eq!(m.row_lwb(), -2);
        assert_eq!(m.col_upb(), 1);
        assert!(SymMatrix::<f64>::with_bounds(3, 1).is_err());
        assert!(SymMatrix::<f64>::with_bounds(3, 2).unwrap().is_empty());
    }

    #[test]
    fn test_inline_threshold() {
        assert!(SymMatrix::<f64>::new(5).is_inline());
        assert!(!SymMatrix::<f64>::new(6).is_inline());
    }

    #[test]
    fn test_from_rows_rejects_asymmetric() {
        let err = SymMatrix::<f64>::from_rows(2, &[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert_eq!(err, MatrixError::NotSymmetric { row: 0, col: 1 });
    }

    #[test]
    fn test_column_major_input() {
        let data = [1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0];
        let m = SymMatrix::<f64>::from_array(1, 3, &data, ArrayOrder::ColumnMajor).unwrap();
        assert_eq!(m[(1, 3)], 3.0);
        assert_eq!(m[(3, 2)], 5.0);
    }

    #[test]
    fn test_set_mirrors() {
        let mut m = SymMatrix::<f64>::new(3);
        m.set(0, 2, 7.0).unwrap();
        assert_eq!(m.get(2, 0), Some(7.0));
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_out_of_bounds_set_invalidates() {
        let mut m = SymMatrix::<f64>::new(2);
        assert!(matches!(
            m.set(0, 2, 1.0),
            Err(MatrixError::OutOfBounds { .. })
        ));
        assert!(!m.is_valid());
        assert_eq!(m.set(0, 0, 1.0), Err(MatrixError::Invalid));
        m.make_valid();
        assert!(m.set(0, 0, 1.0).is_ok());
    }

    #[test]
    fn test_view_over_caller_storage() {
        let mut buf = [1.0_f64, 2.0, 2.0, 5.0, 99.0];
        {
            let mut v = SymMatrix::view(0, 1, &mut buf).unwrap();
            assert!(!v.is_owner());
            v.set(0, 0, 4.0).unwrap();
        }
        assert_eq!(buf[0], 4.0);
        assert_eq!(buf[4], 99.0);
    }

    #[test]
    fn test_use_buffer_rejects_reversed_bounds() {
        let mut buf = [0.0_f64; 4];
        let mut m = SymMatrix::<f64>::new(2);
        assert!(m.use_buffer(1, 0, &mut buf).is_err());
        assert!(!m.is_valid());
    }

    #[test]
    fn test_clone_of_view_owns() {
        let mut buf = [0.0_f64; INLINE_MAX + 11];
        let v = SymMatrix::view(0, 5, &mut buf).unwrap();
        let c = v.clone();
        assert!(c.is_owner());
        assert_eq!(c.nrows(), 6);
    }

    #[test]
    fn test_creators() {
        let p = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
        let z = SymMatrix::from_op(CreatorOp::Zero, &p);
        assert!(z.matrix_array().iter().all(|&x| x == 0.0));
        let u = SymMatrix::from_op(CreatorOp::Unit, &p);
        assert_eq!(u.matrix_array(), &[1.0, 0.0, 0.0, 1.0]);
        let t = SymMatrix::from_op(CreatorOp::Transposed, &p);
        assert_eq!(t, p);
        let inv = SymMatrix::from_op(CreatorOp::Inverted, &p);
        assert!(inv.is_valid());
        assert_eq!(inv.tolerance(), f64::EPSILON);
        let ata = SymMatrix::from_op(CreatorOp::AtA, &p);
        assert_eq!(ata.matrix_array(), &[5.0, 4.0, 4.0, 5.0]);
    }

    #[test]
    fn test_combine() {
        let a = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
        let b = SymMatrix::<f64>::from_rows(2, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        let s = SymMatrix::combine(&a, CombineOp::Plus, &b);
        assert_eq!(s.matrix_array(), &[3.0, 2.0, 2.0, 3.0]);
        let d = SymMatrix::combine(&a, CombineOp::Minus, &b);
        assert_eq!(d.matrix_array(), &[1.0, 0.0, 0.0, 1.0]);
        let c = SymMatrix::<f64>::new(3);
        assert!(!SymMatrix::combine(&a, CombineOp::Plus, &c).is_valid());
    }

    #[test]
    fn test_bounds_at_index_limits() {
        let m = SymMatrix::<f64>::with_bounds(isize::MIN, isize::MIN + 1).unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.row_upb(), isize::MIN + 1);
        assert!(SymMatrix::<f64>::with_bounds(isize::MIN + 2, isize::MIN).is_err());
        assert!(SymMatrix::<f64>::with_bounds(isize::MAX, isize::MAX - 5).is_err());
        assert!(extent("with_bounds", isize::MIN, isize::MAX).is_err());

        assert!(check_bounds("check", isize::MAX - 1, 2).is_ok());
        assert!(check_bounds("check", isize::MAX - 1, 3).is_err());
        assert!(check_bounds("check", isize::MIN, 0).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_panics_out_of_range() {
        let m = SymMatrix::<f64>::new(2);
        let _ = m[(2, 0)];
    }
}
