//! Determinant, inversion and eigendecomposition.
//!
//! Determinants come from an LU factorization carried out in `f64`. General
//! inversion uses the Bunch-Kaufman factorization; [`SymMatrix::invert_fast`]
//! takes closed-form shortcuts up to 6x6.

use symmat_decomp::{BunchKaufman, Lu, SymmetricEigen};

use crate::cramer::{self, MAX_CRAMER};
use crate::{DecompError, DenseMatrix, DenseVector, Element, MatrixError, Result, SymMatrix};

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Determinant as `(d1, d2)` with `det = d1 · 2^d2`.
    ///
    /// A matrix that is singular within its tolerance has determinant
    /// `(0.0, 0.0)`. The empty matrix has determinant 1.
    pub fn determinant_parts(&self) -> Result<(f64, f64)> {
        self.ensure_valid()?;
        let n = self.nrows();
        let a: Vec<f64> = self.data().iter().map(|x| x.to_f64_lossy()).collect();
        match Lu::decompose(&a, n, self.tolerance().to_f64_lossy()) {
            Ok(lu) => Ok(lu.det_parts()),
            Err(DecompError::Singular { pivot }) => {
                tracing::debug!(n, pivot, "determinant of singular matrix");
                Ok((0.0, 0.0))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Determinant; see [`determinant_parts`](Self::determinant_parts).
    pub fn determinant(&self) -> Result<f64> {
        let (d1, d2) = self.determinant_parts()?;
        Ok(d1 * d2.exp2())
    }

    /// Invert in place with the Bunch-Kaufman factorization.
    ///
    /// A singular matrix fails with [`MatrixError::Singular`] and is
    /// invalidated.
    pub fn invert(&mut self) -> Result<()> {
        self.invert_general(false).map(|_| ())
    }

    /// Like [`invert`](Self::invert), also returning the determinant of the
    /// matrix before inversion.
    pub fn invert_with_det(&mut self) -> Result<f64> {
        self.invert_general(true).map(|det| det.unwrap_or(f64::NAN))
    }

    /// Invert in place, returning the determinant of the matrix before
    /// inversion.
    ///
    /// Sizes 1 through 6 use closed-form cofactor formulas, which are fast but
    /// less stable than the general path used for larger matrices.
    ///
    /// ```
    /// use symmat::SymMatrix;
    ///
    /// let mut m = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
    /// let det = m.invert_fast().unwrap();
    /// assert!((det - 3.0).abs() < 1e-12);
    /// assert!((m[(0, 0)] - 2.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn invert_fast(&mut self) -> Result<f64> {
        self.ensure_valid()?;
        let n = self.nrows();
        match n {
            0 => Ok(1.0),
            1 => {
                let x = self.data()[0];
                if x == T::zero() {
                    return Err(self.fail("invert_fast", MatrixError::Singular));
                }
                self.data_mut()[0] = x.recip();
                Ok(x.to_f64_lossy())
            }
            2..=MAX_CRAMER => match cramer::invert_in_place(self.data_mut(), n) {
                Some(det) => Ok(det),
                None => Err(self.fail("invert_fast", MatrixError::Singular)),
            },
            _ => self
                .invert_general(true)
                .map(|det| det.unwrap_or(f64::NAN)),
        }
    }

    #[cfg_attr(
        feature = "tracing-spans",
        tracing::instrument(skip_all, fields(n = self.nrows()))
    )]
    fn invert_general(&mut self, with_det: bool) -> Result<Option<f64>> {
        self.ensure_valid()?;
        let det = if with_det {
            Some(self.determinant()?)
        } else {
            None
        };

        let n = self.nrows();
        tracing::debug!(n, "inverting via Bunch-Kaufman");
        let bk = match BunchKaufman::decompose(self.data(), n, self.tolerance()) {
            Ok(bk) => bk,
            Err(err) => return Err(self.fail("invert", err.into())),
        };
        if let Err(err) = bk.inverse_into(self.data_mut()) {
            return Err(self.fail("invert", err.into()));
        }
        Ok(det)
    }

    /// Eigenvalues in descending order and the matching eigenvectors as the
    /// columns of a matrix over this matrix's bounds.
    #[cfg_attr(
        feature = "tracing-spans",
        tracing::instrument(skip_all, fields(n = self.nrows()))
    )]
    pub fn eigen_vectors(&self) -> Result<(DenseVector<T>, DenseMatrix<T>)> {
        self.ensure_valid()?;
        let n = self.nrows();
        let lwb = self.row_lwb();
        let eig = SymmetricEigen::decompose(self.data(), n)?;
        let (values, vectors) = eig.into_parts();
        let mut m = DenseMatrix::from_rows(n, n, vectors)?;
        m.shift(lwb, lwb);
        Ok((DenseVector::with_lwb(lwb, values), m))
    }
}

#[cfg(test)]
mod tests {
    use crate::{MatrixError, SymMatrix};
    use approx::assert_relative_eq;

    fn hilbert_like(n: usize) -> SymMatrix<'static, f64> {
        let mut m = SymMatrix::new(n);
        m.apply_pos(|i, j, _| {
            if i == j {
                n as f64 + i as f64
            } else {
                1.0 / (1.0 + (i + j) as f64)
            }
        })
        .unwrap();
        m
    }

    fn assert_inverse(a: &SymMatrix<'_, f64>, inv: &SymMatrix<'_, f64>) {
        let n = a.nrows();
        let (a, b) = (a.matrix_array(), inv.matrix_array());
        for i in 0..n {
            for j in 0..n {
                let s: f64 = (0..n).map(|k| a[i * n + k] * b[k * n + j]).sum();
                assert_relative_eq!(s, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_determinant() {
        let m = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(m.determinant().unwrap(), 3.0, epsilon = 1e-12);
        let (d1, d2) = m.determinant_parts().unwrap();
        assert_relative_eq!(d1 * d2.exp2(), 3.0, epsilon = 1e-12);
        assert_eq!(SymMatrix::<f64>::new(0).determinant().unwrap(), 1.0);
    }

    #[test]
    fn test_singular_determinant_is_zero() {
        let m = SymMatrix::<f64>::from_rows(2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(m.determinant().unwrap(), 0.0);
        assert!(m.is_valid());
    }

    #[test]
    fn test_invert_general() {
        for n in [1, 3, 7, 9] {
            let a = hilbert_like(n);
            let mut inv = a.clone();
            inv.invert().unwrap();
            assert!(inv.is_symmetric());
            assert_inverse(&a, &inv);
        }
    }

    #[test]
    fn test_invert_with_det() {
        let a = hilbert_like(8);
        let expected = a.determinant().unwrap();
        let mut inv = a.clone();
        let det = inv.invert_with_det().unwrap();
        assert_relative_eq!(det, expected, max_relative = 1e-12);
        assert_inverse(&a, &inv);
    }

    #[test]
    fn test_invert_fast_matches_invert() {
        for n in 1..=8 {
            let a = hilbert_like(n);
            let mut fast = a.clone();
            let mut slow = a.clone();
            let det = fast.invert_fast().unwrap();
            slow.invert().unwrap();
            assert_relative_eq!(det, a.determinant().unwrap(), max_relative = 1e-10);
            for (x, y) in fast.matrix_array().iter().zip(slow.matrix_array()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_indefinite_inverse() {
        let a = SymMatrix::<f64>::from_rows(3, &[0.0, 1.0, 2.0, 1.0, 0.0, 3.0, 2.0, 3.0, 0.0])
            .unwrap();
        let mut inv = a.clone();
        inv.invert().unwrap();
        assert_inverse(&a, &inv);
    }

    #[test]
    fn test_singular_invalidates() {
        let mut m = SymMatrix::<f64>::from_rows(2, &[1.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(m.invert_fast(), Err(MatrixError::Singular));
        assert!(!m.is_valid());

        let mut z = SymMatrix::<f64>::new(1);
        assert_eq!(z.invert_fast(), Err(MatrixError::Singular));

        let mut big = SymMatrix::<f64>::new(7);
        assert_eq!(big.invert(), Err(MatrixError::Singular));
        assert_eq!(big.invert(), Err(MatrixError::Invalid));
    }

    #[test]
    fn test_eigen_vectors() {
        let m = SymMatrix::<f64>::from_array(1, 2, &[2.0, 1.0, 1.0, 2.0], Default::default())
            .unwrap();
        let (values, vectors) = m.eigen_vectors().unwrap();
        assert_eq!(values.lwb(), 1);
        assert_relative_eq!(values[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(values[2], 1.0, epsilon = 1e-12);
        assert_eq!(vectors.row_lwb(), 1);
        // Leading eigenvector is (1, 1) / sqrt(2) up to sign.
        assert_relative_eq!(
            vectors[(1, 1)].abs(),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-12
        );
        assert_relative_eq!(vectors[(1, 1)], vectors[(2, 1)], epsilon = 1e-12);
    }
}
