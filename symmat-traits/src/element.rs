//! Element type bounds for symmetric matrices and their factorizations.

use num_traits::{Float, FromPrimitive, NumAssign};

/// Floating point precision of an element type.
///
/// Used to pick the single or double precision routine of an accelerated
/// backend (CBLAS `s*` vs `d*`), and to tag persisted buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// 32-bit IEEE 754.
    Single,
    /// 64-bit IEEE 754.
    Double,
}

/// Shared trait bounds for all element types usable in a symmetric matrix.
///
/// Beyond ordinary floating point arithmetic, an element knows
/// - its default numerical tolerance (machine epsilon),
/// - its precision, so kernels can dispatch to BLAS,
/// - a fixed-width little-endian encoding for persistence.
pub trait Element:
    Float + FromPrimitive + NumAssign + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Precision of the type.
    const PRECISION: Precision;

    /// Width in bytes of one persisted element.
    const WIDTH: usize;

    /// Default tolerance of a freshly allocated matrix.
    fn tolerance() -> Self {
        Self::epsilon()
    }

    /// Smallest usable tolerance, for matrices whose tolerance the caller
    /// cannot tune (e.g. a matrix created already inverted).
    fn min_tolerance() -> Self {
        Self::min_positive_value()
    }

    fn is_single() -> bool {
        Self::PRECISION == Precision::Single
    }

    fn is_double() -> bool {
        Self::PRECISION == Precision::Double
    }

    /// Lossy conversion from `f64`; NaN if the value is not representable.
    fn from_f64_lossy(value: f64) -> Self {
        <Self as FromPrimitive>::from_f64(value).unwrap_or_else(Self::nan)
    }

    /// Lossy conversion to `f64`.
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode one element from the first [`Self::WIDTH`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`Self::WIDTH`].
    fn read_le(bytes: &[u8]) -> Self;
}

impl Element for f32 {
    const PRECISION: Precision = Precision::Single;
    const WIDTH: usize = 4;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&bytes[..4]);
        f32::from_le_bytes(buf)
    }
}

impl Element for f64 {
    const PRECISION: Precision = Precision::Double;
    const WIDTH: usize = 8;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&bytes[..8]);
        f64::from_le_bytes(buf)
    }
}
