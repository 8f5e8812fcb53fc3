//! LU decomposition with implicitly scaled partial pivoting.
//!
//! Decomposes a square matrix `A` into `PA = LU` where `L` has a unit
//! diagonal. Both factors are packed into one row-major buffer.

use smallvec::SmallVec;

use crate::{check_square, DecompError, Element, Result};

type Pivots = SmallVec<[usize; 8]>;

/// Packed LU factorization of a square matrix.
#[derive(Debug, Clone)]
pub struct Lu<T: Element> {
    /// Lower triangle (without diagonal) holds L, upper triangle holds U.
    lu: Vec<T>,
    /// `pivots[k]` is the original row that ended up in row `k`.
    pivots: Pivots,
    n: usize,
    /// Sign of the row permutation.
    sign: T,
}

impl<T: Element> Lu<T> {
    /// Factorize the `n x n` row-major matrix `a`.
    ///
    /// A pivot is rejected when its magnitude falls below `tol` times the
    /// largest magnitude of its original row.
    ///
    /// ```
    /// use symmat_decomp::Lu;
    ///
    /// let a = [2.0_f64, 1.0, 1.0, 2.0];
    /// let lu = Lu::decompose(&a, 2, f64::EPSILON).unwrap();
    /// assert!((lu.det() - 3.0).abs() < 1e-12);
    /// ```
    pub fn decompose(a: &[T], n: usize, tol: T) -> Result<Self> {
        check_square(a.len(), n)?;

        let mut lu = a.to_vec();
        let mut pivots: Pivots = (0..n).collect();
        let mut sign = T::one();

        // Implicit row scaling: largest magnitude of every original row.
        let mut scale: SmallVec<[T; 8]> = SmallVec::with_capacity(n);
        for i in 0..n {
            let row_max = lu[i * n..(i + 1) * n]
                .iter()
                .fold(T::zero(), |acc, x| acc.max(x.abs()));
            if row_max == T::zero() {
                return Err(DecompError::Singular { pivot: i });
            }
            scale.push(row_max);
        }

        for k in 0..n {
            let mut best = k;
            let mut best_val = lu[k * n + k].abs() / scale[k];
            for i in (k + 1)..n {
                let val = lu[i * n + k].abs() / scale[i];
                if val > best_val {
                    best_val = val;
                    best = i;
                }
            }

            if best != k {
                for j in 0..n {
                    lu.swap(k * n + j, best * n + j);
                }
                pivots.swap(k, best);
                scale.swap(k, best);
                sign = -sign;
            }

            let pivot = lu[k * n + k];
            if pivot.abs() <= tol * scale[k] {
                return Err(DecompError::Singular { pivot: k });
            }

            for i in (k + 1)..n {
                let factor = lu[i * n + k] / pivot;
                lu[i * n + k] = factor;
                if factor == T::zero() {
                    continue;
                }
                for j in (k + 1)..n {
                    let ukj = lu[k * n + j];
                    lu[i * n + j] -= factor * ukj;
                }
            }
        }

        Ok(Self {
            lu,
            pivots,
            n,
            sign,
        })
    }

    /// Matrix dimension.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Determinant as `(d1, d2)` with `det = d1 * 2^d2`.
    ///
    /// The mantissa is kept in `[1, 16)` in magnitude while the diagonal of
    /// `U` is accumulated, so that large or tiny determinants neither
    /// overflow nor underflow.
    pub fn det_parts(&self) -> (f64, f64) {
        let n = self.n;
        let mut d1 = 1.0_f64;
        let mut d2 = 0.0_f64;
        for i in 0..n {
            let u = self.lu[i * n + i].to_f64_lossy();
            if u == 0.0 {
                return (0.0, 0.0);
            }
            d1 *= u;
            while d1.abs() < 1.0 {
                d1 *= 16.0;
                d2 -= 4.0;
            }
            while d1.abs() >= 16.0 {
                d1 *= 0.0625;
                d2 += 4.0;
            }
        }
        (d1 * self.sign.to_f64_lossy(), d2)
    }

    /// Determinant `d1 * 2^d2`.
    pub fn det(&self) -> f64 {
        let (d1, d2) = self.det_parts();
        d1 * 2.0_f64.powf(d2)
    }

    /// Solve `A x = b` in place.
    ///
    /// # Panics
    ///
    /// Panics if `b.len() != n`.
    pub fn solve_in_place(&self, b: &mut [T]) {
        let n = self.n;
        assert_eq!(b.len(), n, "right-hand side length must equal n");

        let permuted: SmallVec<[T; 8]> = self.pivots.iter().map(|&p| b[p]).collect();
        b.copy_from_slice(&permuted);

        // Forward substitution with unit-diagonal L.
        for i in 0..n {
            let mut acc = b[i];
            for j in 0..i {
                acc -= self.lu[i * n + j] * b[j];
            }
            b[i] = acc;
        }

        // Back substitution with U.
        for i in (0..n).rev() {
            let mut acc = b[i];
            for j in (i + 1)..n {
                acc -= self.lu[i * n + j] * b[j];
            }
            b[i] = acc / self.lu[i * n + i];
        }
    }

    /// Write `A^-1` row-major into `out`.
    pub fn inverse_into(&self, out: &mut [T]) -> Result<()> {
        let n = self.n;
        check_square(out.len(), n)?;
        let mut column = vec![T::zero(); n];
        for j in 0..n {
            column.iter_mut().for_each(|x| *x = T::zero());
            column[j] = T::one();
            self.solve_in_place(&mut column);
            for i in 0..n {
                out[i * n + j] = column[i];
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_det_2x2() {
        let a = [2.0_f64, 1.0, 1.0, 2.0];
        let lu = Lu::decompose(&a, 2, f64::EPSILON).unwrap();
        assert_relative_eq!(lu.det(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_det_sign_with_pivoting() {
        // Requires a row swap: det = -2
        let a = [0.0_f64, 1.0, 2.0, 0.0];
        let lu = Lu::decompose(&a, 2, f64::EPSILON).unwrap();
        assert_relative_eq!(lu.det(), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_det_parts_large_scale() {
        // diag(1e200, 1e200): product overflows f64 but mantissa/exponent does not
        let a = [1e200_f64, 0.0, 0.0, 1e200];
        let lu = Lu::decompose(&a, 2, f64::EPSILON).unwrap();
        let (d1, d2) = lu.det_parts();
        assert!(d1.abs() >= 1.0 && d1.abs() < 16.0);
        let log2 = d1.log2() + d2;
        assert_relative_eq!(log2, 400.0 * 10f64.log2(), epsilon = 1e-9);
    }

    #[test]
    fn test_singular_rejected() {
        let a = [1.0_f64, 2.0, 2.0, 4.0];
        let err = Lu::decompose(&a, 2, f64::EPSILON).unwrap_err();
        assert!(matches!(err, DecompError::Singular { .. }));
    }

    #[test]
    fn test_zero_row_rejected() {
        let a = [0.0_f64, 0.0, 1.0, 1.0];
        assert!(Lu::decompose(&a, 2, f64::EPSILON).is_err());
    }

    #[test]
    fn test_bad_dimension() {
        let a = [1.0_f64, 2.0, 3.0];
        let err = Lu::decompose(&a, 2, f64::EPSILON).unwrap_err();
        assert_eq!(err, DecompError::BadDimension { n: 2, len: 3 });
    }

    #[test]
    fn test_inverse_3x3() {
        let a = [4.0_f64, 7.0, 2.0, 3.0, 6.0, 1.0, 2.0, 5.0, 3.0];
        let lu = Lu::decompose(&a, 3, f64::EPSILON).unwrap();
        let mut inv = [0.0; 9];
        lu.inverse_into(&mut inv).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let mut acc = 0.0;
                for k in 0..3 {
                    acc += a[i * 3 + k] * inv[k * 3 + j];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(acc, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_empty_matrix() {
        let lu = Lu::<f64>::decompose(&[], 0, f64::EPSILON).unwrap();
        assert_eq!(lu.det(), 1.0);
    }
}
