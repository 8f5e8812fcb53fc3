//! Dense factorizations backing the symmetric matrix core.
//!
//! All routines work on square matrices stored row-major in a flat buffer
//! (`a[i * n + j]`), which is exactly the physical layout of a symmetric
//! matrix in `symmat`.
//!
//! - [`Lu`]: LU decomposition with implicitly scaled partial pivoting. Yields
//!   the determinant as a mantissa/exponent pair and the inverse.
//! - [`BunchKaufman`]: diagonal pivoting factorization `P A Pᵀ = L D Lᵀ` of a
//!   symmetric indefinite matrix, used for stable inversion.
//! - [`SymmetricEigen`]: cyclic Jacobi eigensolver; eigenvalues in descending
//!   order.

/// Bunch-Kaufman symmetric indefinite factorization.
pub mod bunch_kaufman;
/// Jacobi eigendecomposition of a symmetric matrix.
pub mod eigen;
/// LU factorization with partial pivoting.
pub mod lu;

pub use bunch_kaufman::BunchKaufman;
pub use eigen::SymmetricEigen;
pub use lu::Lu;

pub use symmat_traits::Element;

/// Errors reported by the factorizations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecompError {
    /// Buffer length does not describe an `n x n` matrix.
    #[error("buffer of length {len} is not a {n}x{n} matrix")]
    BadDimension { n: usize, len: usize },

    /// A pivot fell below the tolerance.
    #[error("matrix is singular (pivot {pivot} below tolerance)")]
    Singular { pivot: usize },

    /// The iterative eigensolver did not converge.
    #[error("eigensolver did not converge after {sweeps} sweeps")]
    NoConvergence { sweeps: usize },
}

/// Convenience alias for `Result<T, DecompError>`.
pub type Result<T> = std::result::Result<T, DecompError>;

pub(crate) fn check_square(len: usize, n: usize) -> Result<()> {
    if len != n * n {
        return Err(DecompError::BadDimension { n, len });
    }
    Ok(())
}
