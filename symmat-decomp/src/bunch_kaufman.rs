//! Bunch-Kaufman diagonal pivoting for symmetric indefinite matrices.
//!
//! Computes `P A Pᵀ = L D Lᵀ` where `L` is unit lower triangular and `D` is
//! block diagonal with 1x1 and 2x2 blocks. Only the lower triangle of the
//! input is referenced. Follows the unblocked lower variant of LAPACK
//! `?sytf2` / `?sytrs`.

use crate::{check_square, DecompError, Element, Result};

/// Pivot record of one step of the factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pivot {
    /// 1x1 block at `k`, row/column `k` was interchanged with `kp`.
    One { kp: usize },
    /// 2x2 block at `(k, k + 1)`, row/column `k + 1` was interchanged with `kp`.
    Two { kp: usize },
    /// Second row of a 2x2 block; the record lives at the preceding index.
    TwoSecond,
}

/// Bunch-Kaufman factorization of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct BunchKaufman<T: Element> {
    /// Lower triangle holds the multipliers of L and the blocks of D.
    factor: Vec<T>,
    pivots: Vec<Pivot>,
    n: usize,
}

impl<T: Element> BunchKaufman<T> {
    /// Factorize the symmetric `n x n` row-major matrix `a`.
    ///
    /// A step whose largest candidate pivot is at most `tol` times the
    /// largest element of `a` reports [`DecompError::Singular`].
    ///
    /// ```
    /// use symmat_decomp::BunchKaufman;
    ///
    /// // Indefinite: zero diagonal forces a 2x2 pivot.
    /// let a = [0.0_f64, 1.0, 1.0, 0.0];
    /// let bk = BunchKaufman::decompose(&a, 2, f64::EPSILON).unwrap();
    /// let mut inv = [0.0; 4];
    /// bk.inverse_into(&mut inv).unwrap();
    /// assert_eq!(inv, [0.0, 1.0, 1.0, 0.0]);
    /// ```
    pub fn decompose(a: &[T], n: usize, tol: T) -> Result<Self> {
        check_square(a.len(), n)?;

        let mut f = a.to_vec();
        let mut pivots = vec![Pivot::One { kp: 0 }; n];

        let anorm = f.iter().fold(T::zero(), |acc, x| acc.max(x.abs()));
        let threshold = tol * anorm;
        // (1 + sqrt(17)) / 8 bounds element growth.
        let alpha = (T::one() + T::from_f64_lossy(17.0).sqrt()) / T::from_f64_lossy(8.0);

        let mut k = 0;
        while k < n {
            let mut kstep = 1;
            let absakk = f[k * n + k].abs();

            // Largest off-diagonal magnitude in column k.
            let (imax, colmax) = if k + 1 < n {
                argmax((k + 1)..n, |i| f[i * n + k].abs())
            } else {
                (k, T::zero())
            };

            if absakk.max(colmax) <= threshold {
                return Err(DecompError::Singular { pivot: k });
            }

            let kp = if absakk >= alpha * colmax {
                k
            } else {
                // Largest off-diagonal magnitude in row/column imax.
                let (_, mut rowmax) = argmax(k..imax, |j| f[imax * n + j].abs());
                if imax + 1 < n {
                    let (_, below) = argmax((imax + 1)..n, |j| f[j * n + imax].abs());
                    rowmax = rowmax.max(below);
                }

                if absakk >= alpha * colmax * (colmax / rowmax) {
                    k
                } else if f[imax * n + imax].abs() >= alpha * rowmax {
                    imax
                } else {
                    kstep = 2;
                    imax
                }
            };

            let kk = k + kstep - 1;
            if kp != kk {
                // Interchange rows and columns kk and kp of the trailing block.
                for i in (kp + 1)..n {
                    f.swap(i * n + kk, i * n + kp);
                }
                for j in (kk + 1)..kp {
                    f.swap(j * n + kk, kp * n + j);
                }
                f.swap(kk * n + kk, kp * n + kp);
                if kstep == 2 {
                    f.swap((k + 1) * n + k, kp * n + k);
                }
            }

            if kstep == 1 {
                let d11 = T::one() / f[k * n + k];
                for j in (k + 1)..n {
                    let xj = f[j * n + k];
                    if xj == T::zero() {
                        continue;
                    }
                    for i in j..n {
                        let xi = f[i * n + k];
                        f[i * n + j] -= d11 * xi * xj;
                    }
                }
                for i in (k + 1)..n {
                    f[i * n + k] *= d11;
                }
                pivots[k] = Pivot::One { kp };
            } else {
                if k + 2 < n {
                    let d21 = f[(k + 1) * n + k];
                    let d11 = f[(k + 1) * n + k + 1] / d21;
                    let d22 = f[k * n + k] / d21;
                    let det = d11 * d22 - T::one();
                    if det == T::zero() {
                        return Err(DecompError::Singular { pivot: k });
                    }
                    let d21 = (T::one() / det) / d21;

                    for j in (k + 2)..n {
                        let wk = d21 * (d11 * f[j * n + k] - f[j * n + k + 1]);
                        let wkp1 = d21 * (d22 * f[j * n + k + 1] - f[j * n + k]);
                        for i in j..n {
                            let update = f[i * n + k] * wk + f[i * n + k + 1] * wkp1;
                            f[i * n + j] -= update;
                        }
                        f[j * n + k] = wk;
                        f[j * n + k + 1] = wkp1;
                    }
                }
                pivots[k] = Pivot::Two { kp };
                pivots[k + 1] = Pivot::TwoSecond;
            }

            k += kstep;
        }

        Ok(Self {
            factor: f,
            pivots,
            n,
        })
    }

    /// Matrix dimension.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Solve `A x = b` in place.
    ///
    /// # Panics
    ///
    /// Panics if `b.len() != n`.
    pub fn solve_in_place(&self, b: &mut [T]) {
        let n = self.n;
        let f = &self.factor;
        assert_eq!(b.len(), n, "right-hand side length must equal n");

        // Solve L D y = P b.
        let mut k = 0;
        while k < n {
            match self.pivots[k] {
                Pivot::One { kp } => {
                    b.swap(k, kp);
                    let bk = b[k];
                    for i in (k + 1)..n {
                        b[i] -= f[i * n + k] * bk;
                    }
                    b[k] = bk / f[k * n + k];
                    k += 1;
                }
                Pivot::Two { kp } => {
                    b.swap(k + 1, kp);
                    let (b0, b1) = (b[k], b[k + 1]);
                    for i in (k + 2)..n {
                        b[i] -= f[i * n + k] * b0 + f[i * n + k + 1] * b1;
                    }
                    let akm1k = f[(k + 1) * n + k];
                    let akm1 = f[k * n + k] / akm1k;
                    let ak = f[(k + 1) * n + k + 1] / akm1k;
                    let denom = akm1 * ak - T::one();
                    let bkm1 = b0 / akm1k;
                    let bk = b1 / akm1k;
                    b[k] = (ak * bkm1 - bk) / denom;
                    b[k + 1] = (akm1 * bk - bkm1) / denom;
                    k += 2;
                }
                Pivot::TwoSecond => {
                    debug_assert!(false, "2x2 block entered at its second row");
                    k += 1;
                }
            }
        }

        // Solve Lᵀ Pᵀ x = y, walking blocks from the bottom.
        let mut k = n;
        while k > 0 {
            let last = k - 1;
            match self.pivots[last] {
                Pivot::One { kp } => {
                    let mut acc = b[last];
                    for i in (last + 1)..n {
                        acc -= f[i * n + last] * b[i];
                    }
                    b[last] = acc;
                    b.swap(last, kp);
                    k -= 1;
                }
                Pivot::TwoSecond => {
                    let first = last - 1;
                    let kp = match self.pivots[first] {
                        Pivot::Two { kp } => kp,
                        _ => {
                            debug_assert!(false, "dangling second row of a 2x2 block");
                            last
                        }
                    };
                    let mut acc_last = b[last];
                    let mut acc_first = b[first];
                    for i in (last + 1)..n {
                        acc_last -= f[i * n + last] * b[i];
                        acc_first -= f[i * n + first] * b[i];
                    }
                    b[last] = acc_last;
                    b[first] = acc_first;
                    b.swap(last, kp);
                    k -= 2;
                }
                Pivot::Two { .. } => {
                    debug_assert!(false, "2x2 block entered at its first row");
                    k -= 1;
                }
            }
        }
    }

    /// Write `A^-1` row-major into `out`; the result is exactly symmetric.
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
        // Mirror the upper triangle to remove rounding asymmetry.
        for i in 0..n {
            for j in 0..i {
                out[i * n + j] = out[j * n + i];
            }
        }
        Ok(())
    }
}

fn argmax<T: Element>(range: std::ops::Range<usize>, value: impl Fn(usize) -> T) -> (usize, T) {
    let mut best = range.start;
    let mut best_val = T::zero();
    for i in range {
        let v = value(i);
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    (best, best_val)
}
