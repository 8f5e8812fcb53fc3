//! Symmetric product kernels: transpose, rank-1 update, Aᵀ·A and similarity
//! transforms.
//!
//! Every kernel computes the upper triangle (diagonal included) and mirrors
//! it into the lower triangle, so results are exactly symmetric.

use crate::blas::{try_gemm, Gemm};
use crate::{DenseMatrix, DenseVector, Element, MatrixError, Result, SymMatrix};

impl<T: Element> SymMatrix<'static, T> {
    /// `Aᵀ·A` of a general matrix, over `a`'s column bounds.
    pub fn ata_of(a: &DenseMatrix<T>) -> Self {
        let mut m = Self::alloc(a.ncols(), a.col_lwb());
        // Shape matches by construction.
        let _ = m.at_mult_a(a);
        m
    }
}

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Copy `source`, whose transpose is itself. Shapes must match.
    pub fn transpose(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.ensure_valid()?;
        if !source.is_valid() {
            return Err(self.fail("transpose", MatrixError::Invalid));
        }
        if self.nrows() != source.ncols() || self.row_lwb() != source.col_lwb() {
            let err = MatrixError::ShapeMismatch {
                op: "transpose",
                detail: format!(
                    "target [{}; {}] vs source columns [{}; {}]",
                    self.row_lwb(),
                    self.nrows(),
                    source.col_lwb(),
                    source.ncols()
                ),
            };
            return Err(self.fail("transpose", err));
        }
        self.data_mut().copy_from_slice(source.data());
        Ok(())
    }

    /// `A += alpha · v·vᵀ`, using the first `nrows` elements of `v`.
    pub fn rank1_update(&mut self, v: &DenseVector<T>, alpha: T) -> Result<()> {
        self.ensure_valid()?;
        let n = self.nrows();
        if v.len() < n {
            let err = MatrixError::ShapeMismatch {
                op: "rank1_update",
                detail: format!("vector of {} elements for {n} rows", v.len()),
            };
            return Err(self.fail("rank1_update", err));
        }
        let pv = v.as_slice();
        let data = self.data_mut();
        for i in 0..n {
            let tmp = alpha * pv[i];
            for j in i..n {
                let upd = data[i * n + j] + tmp * pv[j];
                data[i * n + j] = upd;
                data[j * n + i] = upd;
            }
        }
        Ok(())
    }

    /// Replace `self` by `Aᵀ·A`, resizing to `a`'s column bounds when needed.
    #[cfg_attr(
        feature = "tracing-spans",
        tracing::instrument(skip_all, fields(rows = a.nrows(), cols = a.ncols()))
    )]
    pub fn at_mult_a(&mut self, a: &DenseMatrix<T>) -> Result<()> {
        self.ensure_valid()?;
        self.reshape_for("at_mult_a", a.col_lwb(), a.ncols())?;
        product_ata(a.as_slice(), a.nrows(), a.ncols(), self.data_mut());
        self.mirror_upper();
        Ok(())
    }

    /// Replace `self` by `A·A` (= `Aᵀ·A`) for a symmetric `a`.
    #[cfg_attr(feature = "tracing-spans", tracing::instrument(skip_all, fields(n = a.nrows())))]
    pub fn at_mult_a_sym(&mut self, a: &SymMatrix<'_, T>) -> Result<()> {
        self.ensure_valid()?;
        if !a.is_valid() {
            return Err(self.fail("at_mult_a", MatrixError::Invalid));
        }
        self.reshape_for("at_mult_a", a.col_lwb(), a.ncols())?;
        let n = a.nrows();
        product_ata(a.data(), n, n, self.data_mut());
        self.mirror_upper();
        Ok(())
    }

    /// Replace `self` (`A`) by `B·A·Bᵀ`, which has `b.nrows()` rows.
    ///
    /// The columns of `B` must match the rows of `A` in count and lower
    /// bound. The lower bound of `self` is kept.
    #[cfg_attr(
        feature = "tracing-spans",
        tracing::instrument(skip_all, fields(n = self.nrows(), rows_b = b.nrows()))
    )]
    pub fn similarity(&mut self, b: &DenseMatrix<T>) -> Result<()> {
        self.ensure_valid()?;
        if b.ncols() != self.nrows() || b.col_lwb() != self.row_lwb() {
            let err = self.incompatible("similarity", b.col_lwb(), b.ncols());
            return Err(self.fail("similarity", err));
        }
        let ba = b.mul_sym(self).map_err(|e| self.fail("similarity", e))?;
        let nb = b.nrows();
        if nb != self.nrows() {
            self.resize(nb, nb)?;
        }
        congruence_bt(ba.as_slice(), b.as_slice(), nb, b.ncols(), self.data_mut());
        self.mirror_upper();
        Ok(())
    }

    /// Replace `self` (`A`) by `B·A·Bᵀ` for a symmetric `b` compatible with
    /// `self`.
    #[cfg_attr(feature = "tracing-spans", tracing::instrument(skip_all, fields(n = self.nrows())))]
    pub fn similarity_sym(&mut self, b: &SymMatrix<'_, T>) -> Result<()> {
        self.check_compatible("similarity", b)?;
        let n = self.nrows();
        let mut ba = vec![T::zero(); n * n];
        crate::dense::gemm_nn(b.data(), self.data(), &mut ba, n, n, n);
        congruence_bt(&ba, b.data(), n, n, self.data_mut());
        self.mirror_upper();
        Ok(())
    }

    /// Replace `self` (`A`) by `Bᵀ·A·B`, which has `b.ncols()` rows.
    ///
    /// The rows of `B` must match the rows of `A` in count and lower bound.
    #[cfg_attr(
        feature = "tracing-spans",
        tracing::instrument(skip_all, fields(n = self.nrows(), cols_b = b.ncols()))
    )]
    pub fn similarity_t(&mut self, b: &DenseMatrix<T>) -> Result<()> {
        self.ensure_valid()?;
        if b.nrows() != self.nrows() || b.row_lwb() != self.row_lwb() {
            let err = self.incompatible("similarity_t", b.row_lwb(), b.nrows());
            return Err(self.fail("similarity_t", err));
        }
        let bta = b
            .transpose_mul_sym(self)
            .map_err(|e| self.fail("similarity_t", e))?;
        let (n, ncb) = (b.nrows(), b.ncols());
        if ncb != n {
            self.resize(ncb, ncb)?;
        }
        congruence_b(bta.as_slice(), b.as_slice(), ncb, n, self.data_mut());
        self.mirror_upper();
        Ok(())
    }

    /// `vᵀ·A·v`. The vector must match the columns of `A` in length and
    /// lower bound.
    pub fn similarity_vec(&mut self, v: &DenseVector<T>) -> Result<T> {
        self.ensure_valid()?;
        let n = self.nrows();
        if v.len() != n || v.lwb() != self.col_lwb() {
            let err = self.incompatible("similarity_vec", v.lwb(), v.len());
            return Err(self.fail("similarity_vec", err));
        }
        let pv = v.as_slice();
        let data = self.data();
        let mut sum1 = T::zero();
        for i in 0..n {
            let row = &data[i * n..(i + 1) * n];
            let sum2 = row.iter().zip(pv).fold(T::zero(), |acc, (&a, &x)| acc + a * x);
            sum1 += sum2 * pv[i];
        }
        Ok(sum1)
    }

    fn incompatible(&self, op: &'static str, rhs_lwb: isize, rhs_n: usize) -> MatrixError {
        MatrixError::IncompatibleOperands {
            op,
            lhs_lwb: self.row_lwb(),
            lhs_n: self.nrows(),
            rhs_lwb,
            rhs_n,
        }
    }

    /// Resize to `[lwb; n]` unless the shape already matches.
    fn reshape_for(&mut self, op: &'static str, lwb: isize, n: usize) -> Result<()> {
        if self.nrows() == n && self.row_lwb() == lwb {
            return Ok(());
        }
        let upb = lwb + n as isize - 1;
        self.resize_bounds(lwb, upb, lwb, upb).map_err(|e| {
            tracing::debug!(op, "target reshape failed");
            e
        })
    }
}

/// Upper triangle of `C = Aᵀ·A` for row-major `a: m x n`; `c` is `n x n`.
fn product_ata<T: Element>(a: &[T], m: usize, n: usize, c: &mut [T]) {
    debug_assert_eq!(a.len(), m * n);
    debug_assert_eq!(c.len(), n * n);
    let g = Gemm {
        trans_a: true,
        trans_b: false,
        m: n,
        n,
        k: m,
        a,
        lda: n,
        b: a,
        ldb: n,
    };
    if try_gemm(g, c) {
        return;
    }
    c.iter_mut().for_each(|x| *x = T::zero());
    for l in 0..m {
        let row = &a[l * n..(l + 1) * n];
        for i in 0..n {
            let ali = row[i];
            if ali == T::zero() {
                continue;
            }
            for j in i..n {
                c[i * n + j] += ali * row[j];
            }
        }
    }
}

/// Upper triangle of `C = (B·A)·Bᵀ` given `ba = B·A` (`nb x k`) and
/// `b` (`nb x k`); `c` is `nb x nb`.
fn congruence_bt<T: Element>(ba: &[T], b: &[T], nb: usize, k: usize, c: &mut [T]) {
    debug_assert_eq!(ba.len(), nb * k);
    debug_assert_eq!(b.len(), nb * k);
    debug_assert_eq!(c.len(), nb * nb);
    let g = Gemm {
        trans_a: false,
        trans_b: true,
        m: nb,
        n: nb,
        k,
        a: ba,
        lda: k,
        b,
        ldb: k,
    };
    if try_gemm(g, c) {
        return;
    }
    for i in 0..nb {
        let bar = &ba[i * k..(i + 1) * k];
        for j in i..nb {
            let br = &b[j * k..(j + 1) * k];
            c[i * nb + j] = bar.iter().zip(br).fold(T::zero(), |acc, (&x, &y)| acc + x * y);
        }
    }
}

/// Upper triangle of `C = (Bᵀ·A)·B` given `bta = Bᵀ·A` (`ncb x k`) and
/// `b` (`k x ncb`); `c` is `ncb x ncb`.
fn congruence_b<T: Element>(bta: &[T], b: &[T], ncb: usize, k: usize, c: &mut [T]) {
    debug_assert_eq!(bta.len(), ncb * k);
    debug_assert_eq!(b.len(), k * ncb);
    debug_assert_eq!(c.len(), ncb * ncb);
    let g = Gemm {
        trans_a: false,
        trans_b: false,
        m: ncb,
        n: ncb,
        k,
        a: bta,
        lda: k,
        b,
        ldb: ncb,
    };
    if try_gemm(g, c) {
        return;
    }
    for i in 0..ncb {
        let row = &bta[i * k..(i + 1) * k];
        for j in i..ncb {
            let mut cij = T::zero();
            for (l, &x) in row.iter().enumerate() {
                cij += x * b[l * ncb + j];
            }
            c[i * ncb + j] = cij;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn a() -> SymMatrix<'static, f64> {
        SymMatrix::from_rows(3, &[4.0, 1.0, 2.0, 1.0, 3.0, 0.0, 2.0, 0.0, 5.0]).unwrap()
    }

    /// Dense reference product `x · y`.
    fn reference(x: &DenseMatrix<f64>, y: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        x.mul(y).unwrap()
    }

    #[test]
    fn test_transpose_is_copy() {
        let mut t = SymMatrix::<f64>::new(3);
        t.transpose(&a()).unwrap();
        assert_eq!(t, a());
        let mut wrong = SymMatrix::<f64>::new(2);
        assert!(wrong.transpose(&a()).is_err());
        assert!(!wrong.is_valid());
    }

    #[test]
    fn test_rank1_update() {
        let mut m = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
        m.rank1_update(&DenseVector::from_vec(vec![1.0, 1.0]), 1.0).unwrap();
        assert_eq!(m.matrix_array(), &[3.0, 2.0, 2.0, 3.0]);
        assert!(m.rank1_update(&DenseVector::from_vec(vec![1.0]), 1.0).is_err());
    }

    #[test]
    fn test_at_mult_a() {
        let x = DenseMatrix::from_rows(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let c = SymMatrix::ata_of(&x);
        assert_eq!(c.matrix_array(), &[35.0, 44.0, 44.0, 56.0]);
        let mut d = SymMatrix::<f64>::new(0);
        d.at_mult_a(&x).unwrap();
        assert_eq!(d, c);
    }

    #[test]
    fn test_at_mult_a_empty() {
        let x = DenseMatrix::<f64>::new(0, 3);
        let c = SymMatrix::ata_of(&x);
        assert!(c.is_valid());
        assert_eq!(c.nrows(), 3);
        assert!(c.matrix_array().iter().all(|&v| v == 0.0));
        let c = SymMatrix::ata_of(&DenseMatrix::<f64>::new(4, 0));
        assert!(c.is_valid() && c.is_empty());
    }

    #[test]
    fn test_at_mult_a_sym() {
        let mut c = SymMatrix::<f64>::new(3);
        c.at_mult_a_sym(&a()).unwrap();
        let d = DenseMatrix::from_sym(&a());
        let r = reference(&d, &d);
        for (x, y) in c.matrix_array().iter().zip(r.as_slice()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_similarity_general() {
        let b = DenseMatrix::from_rows(2, 3, vec![1.0, 0.0, 2.0, -1.0, 1.0, 0.5]).unwrap();
        let mut m = a();
        m.similarity(&b).unwrap();
        assert_eq!(m.nrows(), 2);
        let r = reference(&reference(&b, &DenseMatrix::from_sym(&a())), &b.transpose());
        for (x, y) in m.matrix_array().iter().zip(r.as_slice()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_similarity_identity() {
        let mut m = a();
        m.similarity(&DenseMatrix::identity(3)).unwrap();
        assert_eq!(m, a());
        let mut m = a();
        m.similarity_sym(&SymMatrix::from_op(crate::CreatorOp::Unit, &a()))
            .unwrap();
        assert_eq!(m, a());
    }

    #[test]
    fn test_similarity_rejects_mismatch() {
        let mut m = a();
        let b = DenseMatrix::<f64>::new(2, 2);
        assert!(matches!(
            m.similarity(&b),
            Err(MatrixError::IncompatibleOperands { .. })
        ));
        assert!(!m.is_valid());
    }

    #[test]
    fn test_similarity_t() {
        let b = DenseMatrix::from_rows(3, 2, vec![1.0, 0.0, 2.0, 1.0, -1.0, 3.0]).unwrap();
        let mut m = a();
        m.similarity_t(&b).unwrap();
        assert_eq!(m.nrows(), 2);
        let r = reference(
            &reference(&b.transpose(), &DenseMatrix::from_sym(&a())),
            &b,
        );
        for (x, y) in m.matrix_array().iter().zip(r.as_slice()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_similarity_vec() {
        let mut m = a();
        let v = DenseVector::from_vec(vec![1.0, -1.0, 2.0]);
        // vᵀ A v = 4 + 3 + 20 - 2 + 8 + 0 = 33
        assert_relative_eq!(m.similarity_vec(&v).unwrap(), 33.0);
        let shifted = DenseVector::with_lwb(1, vec![1.0, -1.0, 2.0]);
        assert!(m.similarity_vec(&shifted).is_err());
        assert!(!m.is_valid());
    }
}
