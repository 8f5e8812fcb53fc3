//! Deferred fillers: describe a symmetric matrix by its bounds and a fill
//! routine, and materialize it on construction or assignment.

use crate::matrix::{extent, find_asymmetry};
use crate::{Element, MatrixError, Result, SymMatrix};

/// A symmetric matrix over `[row_lwb..=row_upb]` that is computed on demand.
pub trait SymLazy<T: Element> {
    fn row_lwb(&self) -> isize;

    fn row_upb(&self) -> isize;

    /// Write every element into `data`, the row-major `n x n` buffer of a
    /// matrix over `[row_lwb..=row_upb]`. The result must be symmetric.
    fn fill_into(&self, data: &mut [T]);
}

/// The Hilbert matrix `H[i][j] = 1 / (i + j + 1)`, with `i` and `j` counted
/// from the lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hilbert {
    lwb: isize,
    upb: isize,
}

impl Hilbert {
    /// Hilbert matrix of `n` rows indexed from 0.
    pub fn new(n: usize) -> Self {
        Hilbert {
            lwb: 0,
            upb: n as isize - 1,
        }
    }

    pub fn with_bounds(lwb: isize, upb: isize) -> Self {
        Hilbert { lwb, upb }
    }
}

impl<T: Element> SymLazy<T> for Hilbert {
    fn row_lwb(&self) -> isize {
        self.lwb
    }

    fn row_upb(&self) -> isize {
        self.upb
    }

    fn fill_into(&self, data: &mut [T]) {
        let n = (self.upb - self.lwb + 1).max(0) as usize;
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] = T::one() / T::from_f64_lossy((i + j + 1) as f64);
            }
        }
    }
}

/// Filler computing each element from its logical `(row, col)` with a
/// closure. The closure must satisfy `f(i, j) == f(j, i)`.
///
/// ```
/// use symmat::{FnLazy, SymMatrix};
///
/// let lazy = FnLazy::new(1, 3, |i, j| (i * j) as f64);
/// let m = SymMatrix::<f64>::from_lazy(&lazy);
/// assert_eq!(m[(2, 3)], 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct FnLazy<F> {
    lwb: isize,
    upb: isize,
    f: F,
}

impl<F> FnLazy<F> {
    pub fn new(lwb: isize, upb: isize, f: F) -> Self {
        FnLazy { lwb, upb, f }
    }
}

impl<T: Element, F: Fn(isize, isize) -> T> SymLazy<T> for FnLazy<F> {
    fn row_lwb(&self) -> isize {
        self.lwb
    }

    fn row_upb(&self) -> isize {
        self.upb
    }

    fn fill_into(&self, data: &mut [T]) {
        let n = (self.upb - self.lwb + 1).max(0) as usize;
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] = (self.f)(self.lwb + i as isize, self.lwb + j as isize);
            }
        }
    }
}

impl<T: Element> SymMatrix<'static, T> {
    /// Materialize `lazy`. A reversed range or a non-symmetric fill gives an
    /// invalid matrix.
    pub fn from_lazy<L: SymLazy<T> + ?Sized>(lazy: &L) -> Self {
        let (lwb, upb) = (lazy.row_lwb(), lazy.row_upb());
        let n = match extent("from_lazy", lwb, upb) {
            Ok(n) => n,
            Err(err) => return Self::invalid("from_lazy", err),
        };
        let mut m = Self::alloc(n, lwb);
        // The error is recorded in the status.
        let _ = m.fill_checked("from_lazy", lazy);
        m
    }
}

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Overwrite with the elements of `lazy`, whose bounds must equal this
    /// matrix's.
    pub fn assign_lazy<L: SymLazy<T> + ?Sized>(&mut self, lazy: &L) -> Result<()> {
        self.ensure_valid()?;
        if lazy.row_lwb() != self.row_lwb() || lazy.row_upb() != self.row_upb() {
            let err = MatrixError::ShapeMismatch {
                op: "assign_lazy",
                detail: format!(
                    "lazy bounds [{}, {}] vs [{}, {}]",
                    lazy.row_lwb(),
                    lazy.row_upb(),
                    self.row_lwb(),
                    self.row_upb()
                ),
            };
            return Err(self.fail("assign_lazy", err));
        }
        self.fill_checked("assign_lazy", lazy)
    }

    fn fill_checked<L: SymLazy<T> + ?Sized>(&mut self, op: &'static str, lazy: &L) -> Result<()> {
        let n = self.nrows();
        lazy.fill_into(self.data_mut());
        if let Some((i, j)) = find_asymmetry(self.data(), n) {
            let lwb = self.row_lwb();
            let err = MatrixError::NotSymmetric {
                row: lwb + i as isize,
                col: lwb + j as isize,
            };
            return Err(self.fail(op, err));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hilbert() {
        let m = SymMatrix::<f64>::from_lazy(&Hilbert::with_bounds(-1, 2));
        assert!(m.is_valid());
        assert_eq!(m.row_lwb(), -1);
        assert_eq!(m.nrows(), 4);
        assert_relative_eq!(m[(-1, -1)], 1.0);
        assert_relative_eq!(m[(0, 2)], 1.0 / 5.0);
        assert_relative_eq!(m[(2, 2)], 1.0 / 7.0);
    }

    #[test]
    fn test_assign_lazy_requires_same_bounds() {
        let mut m = SymMatrix::<f64>::new(3);
        m.assign_lazy(&Hilbert::new(3)).unwrap();
        assert_relative_eq!(m[(1, 1)], 1.0 / 3.0);

        let mut other = SymMatrix::<f64>::new(3);
        assert!(matches!(
            other.assign_lazy(&Hilbert::with_bounds(1, 3)),
            Err(MatrixError::ShapeMismatch { .. })
        ));
        assert!(!other.is_valid());
    }

    #[test]
    fn test_asymmetric_filler_invalidates() {
        let m = SymMatrix::<f64>::from_lazy(&FnLazy::new(0, 2, |i, j| (i - j) as f64));
        assert!(!m.is_valid());
    }

    #[test]
    fn test_reversed_range_invalid() {
        let m = SymMatrix::<f64>::from_lazy(&Hilbert::with_bounds(3, 0));
        assert!(!m.is_valid());
        let empty = SymMatrix::<f64>::from_lazy(&Hilbert::with_bounds(3, 2));
        assert!(empty.is_valid());
        assert!(empty.is_empty());
    }
}
