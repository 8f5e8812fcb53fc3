//! Eigendecomposition for symmetric matrices.
//!
//! Decomposes a real symmetric matrix `A` into `A = V D Vᵀ` with `V`
//! orthogonal and `D` diagonal, using the cyclic Jacobi algorithm. Each
//! sweep visits every off-diagonal pair once; sweeps stop when the
//! off-diagonal Frobenius norm drops below a relative threshold.

use crate::{check_square, DecompError, Element, Result};

/// Maximum number of Jacobi sweeps.
const MAX_SWEEPS: usize = 100;

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen<T: Element> {
    /// Eigenvalues sorted in descending order.
    eigenvalues: Vec<T>,
    /// Eigenvectors as columns, row-major `n x n`; column `i` belongs to
    /// `eigenvalues[i]`.
    eigenvectors: Vec<T>,
    n: usize,
}

impl<T: Element> SymmetricEigen<T> {
    /// Decompose the symmetric `n x n` row-major matrix `a`.
    ///
    /// ```
    /// use symmat_decomp::SymmetricEigen;
    ///
    /// let a = [2.0_f64, 1.0, 1.0, 2.0];
    /// let eig = SymmetricEigen::decompose(&a, 2).unwrap();
    /// assert!((eig.eigenvalues()[0] - 3.0).abs() < 1e-12);
    /// assert!((eig.eigenvalues()[1] - 1.0).abs() < 1e-12);
    /// ```
    pub fn decompose(a: &[T], n: usize) -> Result<Self> {
        check_square(a.len(), n)?;

        let mut s = a.to_vec();
        let mut v = vec![T::zero(); n * n];
        for i in 0..n {
            v[i * n + i] = T::one();
        }

        let frobenius = s.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt();
        let tol = T::epsilon() * frobenius.max(T::min_positive_value());

        let mut converged = n < 2;
        for _sweep in 0..MAX_SWEEPS {
            let mut off = T::zero();
            for i in 0..n {
                for j in (i + 1)..n {
                    off += s[i * n + j] * s[i * n + j];
                }
            }
            if off.sqrt() <= tol {
                converged = true;
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = s[p * n + q];
                    if apq == T::zero() {
                        continue;
                    }
                    rotate(&mut s, &mut v, n, p, q);
                }
            }
        }

        if !converged {
            return Err(DecompError::NoConvergence { sweeps: MAX_SWEEPS });
        }

        let raw: Vec<T> = (0..n).map(|i| s[i * n + i]).collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            raw[j]
                .partial_cmp(&raw[i])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let eigenvalues = order.iter().map(|&i| raw[i]).collect();
        let mut eigenvectors = vec![T::zero(); n * n];
        for (new_col, &old_col) in order.iter().enumerate() {
            for row in 0..n {
                eigenvectors[row * n + new_col] = v[row * n + old_col];
            }
        }

        Ok(Self {
            eigenvalues,
            eigenvectors,
            n,
        })
    }

    /// Eigenvalues in descending order.
    pub fn eigenvalues(&self) -> &[T] {
        &self.eigenvalues
    }

    /// Eigenvectors as columns of a row-major `n x n` buffer.
    pub fn eigenvectors(&self) -> &[T] {
        &self.eigenvectors
    }

    /// Matrix dimension.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Split into `(eigenvalues, eigenvectors)`.
    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        (self.eigenvalues, self.eigenvectors)
    }
}

/// Apply the Jacobi rotation that annihilates `s[p][q]`: `S <- Jᵀ S J`,
/// `V <- V J`.
fn rotate<T: Element>(s: &mut [T], v: &mut [T], n: usize, p: usize, q: usize) {
    let apq = s[p * n + q];
    let two = T::one() + T::one();
    let theta = (s[q * n + q] - s[p * n + p]) / (two * apq);
    let t = theta.signum() / (theta.abs() + (theta * theta + T::one()).sqrt());
    let c = T::one() / (t * t + T::one()).sqrt();
    let sn = t * c;

    for k in 0..n {
        let akp = s[k * n + p];
        let akq = s[k * n + q];
        s[k * n + p] = c * akp - sn * akq;
        s[k * n + q] = sn * akp + c * akq;
    }
    for k in 0..n {
        let apk = s[p * n + k];
        let aqk = s[q * n + k];
        s[p * n + k] = c * apk - sn * aqk;
        s[q * n + k] = sn * apk + c * aqk;
    }
    s[p * n + q] = T::zero();
    s[q * n + p] = T::zero();

    for k in 0..n {
        let vkp = v[k * n + p];
        let vkq = v[k * n + q];
        v[k * n + p] = c * vkp - sn * vkq;
        v[k * n + q] = sn * vkp + c * vkq;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_2x2_eigenvalues_descending() {
        let a = [2.0_f64, 1.0, 1.0, 2.0];
        let eig = SymmetricEigen::decompose(&a, 2).unwrap();
        assert_relative_eq!(eig.eigenvalues()[0], 3.0, epsilon = 1e-12);
        assert_relative_eq!(eig.eigenvalues()[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reconstruction() {
        let n = 4;
        let a = [
            4.0_f64, 1.0, -2.0, 2.0, //
            1.0, 2.0, 0.0, 1.0, //
            -2.0, 0.0, 3.0, -2.0, //
            2.0, 1.0, -2.0, -1.0,
        ];
        let eig = SymmetricEigen::decompose(&a, n).unwrap();
        let vals = eig.eigenvalues();
        let vecs = eig.eigenvectors();
        for w in vals.windows(2) {
            assert!(w[0] >= w[1]);
        }
        // A V = V D
        for i in 0..n {
            for col in 0..n {
                let mut av = 0.0;
                for k in 0..n {
                    av += a[i * n + k] * vecs[k * n + col];
                }
                assert_relative_eq!(av, vecs[i * n + col] * vals[col], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_diagonal_sorted() {
        let a = [1.0_f64, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 3.0];
        let eig = SymmetricEigen::decompose(&a, 3).unwrap();
        assert_eq!(eig.eigenvalues(), &[5.0, 3.0, 1.0]);
        // Column 0 is e1
        assert_eq!(eig.eigenvectors()[1 * 3], 1.0);
    }

    #[test]
    fn test_trivial_sizes() {
        let eig = SymmetricEigen::<f64>::decompose(&[], 0).unwrap();
        assert!(eig.eigenvalues().is_empty());
        let eig = SymmetricEigen::decompose(&[7.0_f64], 1).unwrap();
        assert_eq!(eig.eigenvalues(), &[7.0]);
    }
}
