//! BLAS integration for the product kernels.
//!
//! The naive kernels in `linalg` define the results; CBLAS `?gemm` is an
//! equivalent fast path for `f32`/`f64` when the `blas` feature is enabled
//! and `SYMMAT_FORCE_NAIVE` is not set.

use crate::Element;

/// Operands of `C = op(A) · op(B)` for row-major buffers; `C` is `m x n`
/// with leading dimension `n`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Gemm<'a, T> {
    pub trans_a: bool,
    pub trans_b: bool,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub a: &'a [T],
    pub lda: usize,
    pub b: &'a [T],
    pub ldb: usize,
}

/// Compute `C = op(A) · op(B)` with CBLAS.
///
/// Returns `false` without touching `c` when the accelerated path does not
/// apply; the caller then runs its naive kernel.
#[cfg(feature = "blas")]
pub(crate) fn try_gemm<T: Element>(g: Gemm<'_, T>, c: &mut [T]) -> bool {
    if crate::force_naive() || g.m == 0 || g.n == 0 || g.k == 0 {
        return false;
    }
    if !(T::is_double() || T::is_single()) {
        return false;
    }
    debug_assert!(c.len() >= g.m * g.n);
    tracing::trace!(m = g.m, n = g.n, k = g.k, "cblas gemm");
    blas_impl::gemm(g, c);
    true
}

#[cfg(not(feature = "blas"))]
pub(crate) fn try_gemm<T: Element>(_g: Gemm<'_, T>, _c: &mut [T]) -> bool {
    false
}

#[cfg(feature = "blas")]
mod blas_impl {
    use super::Gemm;
    use crate::Element;
    use cblas::{Layout, Transpose};

    fn flag(trans: bool) -> Transpose {
        if trans {
            Transpose::Ordinary
        } else {
            Transpose::None
        }
    }

    pub fn gemm<T: Element>(g: Gemm<'_, T>, c: &mut [T]) {
        let (m, n, k) = (g.m as i32, g.n as i32, g.k as i32);
        let (ta, tb) = (flag(g.trans_a), flag(g.trans_b));
        let a_ptr = g.a.as_ptr();
        let b_ptr = g.b.as_ptr();
        let c_ptr = c.as_mut_ptr();
        let (a_len, b_len, c_len) = (g.a.len(), g.b.len(), c.len());

        // SAFETY: the precision checks below guarantee `T` is exactly the
        // slice element type passed to CBLAS.
        unsafe {
            if T::is_double() {
                cblas::dgemm(
                    Layout::RowMajor,
                    ta,
                    tb,
                    m,
                    n,
                    k,
                    1.0,
                    std::slice::from_raw_parts(a_ptr as *const f64, a_len),
                    g.lda as i32,
                    std::slice::from_raw_parts(b_ptr as *const f64, b_len),
                    g.ldb as i32,
                    0.0,
                    std::slice::from_raw_parts_mut(c_ptr as *mut f64, c_len),
                    g.n as i32,
                );
            } else if T::is_single() {
                cblas::sgemm(
                    Layout::RowMajor,
                    ta,
                    tb,
                    m,
                    n,
                    k,
                    1.0,
                    std::slice::from_raw_parts(a_ptr as *const f32, a_len),
                    g.lda as i32,
                    std::slice::from_raw_parts(b_ptr as *const f32, b_len),
                    g.ldb as i32,
                    0.0,
                    std::slice::from_raw_parts_mut(c_ptr as *mut f32, c_len),
                    g.n as i32,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_product_never_accelerated() {
        let a = [0.0_f64; 0];
        let mut c = [0.0_f64; 0];
        let g = Gemm {
            trans_a: true,
            trans_b: false,
            m: 0,
            n: 0,
            k: 3,
            a: &a,
            lda: 0,
            b: &a,
            ldb: 0,
        };
        assert!(!try_gemm(g, &mut c));
    }

    #[cfg(feature = "blas")]
    #[test]
    fn test_gemm_matches_naive() {
        use approx::assert_relative_eq;

        // A is 3x2; C = Aᵀ A is 2x2.
        let a = [1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut c = [0.0_f64; 4];
        let g = Gemm {
            trans_a: true,
            trans_b: false,
            m: 2,
            n: 2,
            k: 3,
            a: &a,
            lda: 2,
            b: &a,
            ldb: 2,
        };
        if try_gemm(g, &mut c) {
            let expected = [35.0, 44.0, 44.0, 56.0];
            for (x, y) in c.iter().zip(expected.iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-12);
            }
        }
    }
}
