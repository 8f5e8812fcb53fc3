//! Dense symmetric matrices with inline small-matrix storage.
//!
//! A [`SymMatrix`] stores the full `n x n` element block row-major, but every
//! write is mirrored across the diagonal so that `M[i, j] == M[j, i]` holds
//! after each operation. Index ranges carry a lower bound, so a matrix may be
//! addressed as `[lwb..=upb] x [lwb..=upb]` rather than from zero.
//!
//! # Core Types
//!
//! - [`SymMatrix`]: the symmetric container, owning its buffer or viewing a
//!   caller-supplied one
//! - [`DenseMatrix`] / [`DenseVector`]: general row-major operands of the
//!   kernels (A^T A, similarity transforms, rank-1 updates)
//! - [`SymLazy`]: deferred fillers such as [`Hilbert`]
//!
//! # Storage
//!
//! Buffers of at most [`INLINE_MAX`] elements live inline in the matrix; larger
//! ones are heap-allocated. Resizing moves data between the two forms and
//! zero-fills every element outside the preserved overlap.
//!
//! # Validity
//!
//! Errors do not panic. A failing operation returns `Err(MatrixError)` and
//! additionally marks the matrix invalid ([`Status::Invalid`]); every later
//! operation on an invalid matrix fails with [`MatrixError::Invalid`].
//! Operators that must produce a value (`+`, `-`, comparisons) return an
//! invalid matrix instead.
//!
//! # Example
//!
//! ```rust
//! use symmat::{DenseVector, SymMatrix};
//!
//! let mut a = SymMatrix::<f64>::from_rows(2, &[2.0, 1.0, 1.0, 2.0]).unwrap();
//! assert!((a.determinant().unwrap() - 3.0).abs() < 1e-12);
//!
//! let v = DenseVector::from_vec(vec![1.0, 1.0]);
//! a.rank1_update(&v, 1.0).unwrap();
//! assert_eq!(a.matrix_array(), &[3.0, 2.0, 2.0, 3.0]);
//! ```
//!
//! # Accelerated Kernels
//!
//! With the `blas` feature, A^T A and the similarity transforms call CBLAS
//! `?gemm` for `f32`/`f64`. Setting `SYMMAT_FORCE_NAIVE=1` in the environment
//! selects the naive kernels at runtime.

mod blas;
mod cramer;
mod dense;
mod invert;
mod lazy;
mod linalg;
mod map;
mod matrix;
mod ops;
mod random;
mod reduce;
mod shape;
mod storage;
pub mod stream;

pub use dense::{DenseMatrix, DenseVector};
pub use lazy::{FnLazy, Hilbert, SymLazy};
pub use matrix::{are_compatible, ArrayOrder, CombineOp, CreatorOp, Status, SymMatrix};
pub use shape::SubIndexing;
pub use stream::StreamError;

pub use symmat_decomp::DecompError;
pub use symmat_traits::{Element, Precision};

// ============================================================================
// Constants
// ============================================================================

/// Capacity, in elements, of the inline buffer.
///
/// Matrices with at most this many elements (up to 5x5) never touch the heap.
pub const INLINE_MAX: usize = 25;

// ============================================================================
// Error types
// ============================================================================

/// Errors reported by symmetric matrix operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// Non-square target shape or unequal row/column bounds.
    #[error("shape mismatch in {op}: {detail}")]
    ShapeMismatch { op: &'static str, detail: String },

    /// Binary operation on matrices with differing shape or bounds.
    #[error("incompatible operands in {op}: [{lhs_lwb}; {lhs_n}] vs [{rhs_lwb}; {rhs_n}]")]
    IncompatibleOperands {
        op: &'static str,
        lhs_lwb: isize,
        lhs_n: usize,
        rhs_lwb: isize,
        rhs_n: usize,
    },

    /// Index range outside the current extent, or `upb < lwb`.
    #[error("{op}: range [{lwb}, {upb}] outside [{extent_lwb}, {extent_upb}]")]
    OutOfBounds {
        op: &'static str,
        lwb: isize,
        upb: isize,
        extent_lwb: isize,
        extent_upb: isize,
    },

    /// Input data is not symmetric.
    #[error("not symmetric at ({row}, {col})")]
    NotSymmetric { row: isize, col: isize },

    /// Resize or re-binding attempted on a view over foreign storage.
    #[error("{op} on a matrix that does not own its storage")]
    NotOwner { op: &'static str },

    /// Zero pivot or determinant during inversion.
    #[error("matrix is singular")]
    Singular,

    /// Elementwise division by a zero element.
    #[error("division by zero at ({row}, {col})")]
    DivisionByZero { row: isize, col: isize },

    /// Operation on a matrix already invalidated by an earlier error.
    #[error("operation on an invalid matrix")]
    Invalid,

    /// Factorization failure other than singularity.
    #[error("decomposition failed: {0}")]
    Decomposition(#[source] DecompError),
}

impl From<DecompError> for MatrixError {
    fn from(err: DecompError) -> Self {
        match err {
            DecompError::Singular { .. } => MatrixError::Singular,
            other => MatrixError::Decomposition(other),
        }
    }
}

/// Result type for symmetric matrix operations.
pub type Result<T> = std::result::Result<T, MatrixError>;

/// Whether the accelerated kernels are disabled at runtime.
#[inline]
pub(crate) fn force_naive() -> bool {
    matches!(std::env::var("SYMMAT_FORCE_NAIVE"), Ok(ref v) if v == "1")
}
