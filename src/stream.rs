//! Persisted form of a symmetric matrix.
//!
//! Only the upper triangle is stored. The byte layout is
//!
//! | field      | encoding                                   |
//! |------------|--------------------------------------------|
//! | magic      | `b"SYMM"`                                  |
//! | version    | `u8`, currently 1                          |
//! | width      | `u8`, bytes per element (4 or 8)           |
//! | nrows      | `u64` little-endian                        |
//! | row_lwb    | `i64` little-endian                        |
//! | tolerance  | one element                                |
//! | elements   | `nrows` runs of `nrows - i` elements each  |
//!
//! where run `i` holds row `i` from the diagonal rightwards. Elements are
//! little-endian IEEE 754. Reading mirrors the runs into the lower triangle.
//!
//! With the `serde` feature, [`SymMatrix`] also implements `Serialize` and
//! `Deserialize` using the same upper-triangle content.

use std::io::{Read, Write};

use crate::matrix::check_bounds;
use crate::{Element, MatrixError, SymMatrix};

const MAGIC: &[u8; 4] = b"SYMM";
const VERSION: u8 = 1;

/// Errors from reading or writing the persisted form.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a symmetric matrix stream")]
    BadMagic,

    #[error("unsupported stream version {0}")]
    UnsupportedVersion(u8),

    #[error("element width {found} does not match expected {expected}")]
    ElementWidth { expected: usize, found: usize },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Number of stored elements for `n` rows.
fn upper_len(n: usize) -> Option<usize> {
    n.checked_add(1)?.checked_mul(n).map(|x| x / 2)
}

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Write the persisted form to `w`. Invalid matrices are refused.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), StreamError> {
        self.ensure_valid()?;
        let n = self.nrows();

        let mut buf = Vec::with_capacity(22 + T::WIDTH * (1 + n * (n + 1) / 2));
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.push(T::WIDTH as u8);
        buf.extend_from_slice(&(n as u64).to_le_bytes());
        buf.extend_from_slice(&(self.row_lwb() as i64).to_le_bytes());
        self.tolerance().write_le(&mut buf);

        let data = self.data();
        for i in 0..n {
            for &x in &data[i * n + i..(i + 1) * n] {
                x.write_le(&mut buf);
            }
        }
        w.write_all(&buf)?;
        Ok(())
    }
}

impl<T: Element> SymMatrix<'static, T> {
    /// Read a matrix written by [`write_to`](SymMatrix::write_to).
    ///
    /// ```
    /// use symmat::SymMatrix;
    ///
    /// let m = SymMatrix::<f64>::from_rows(2, &[1.0, 2.0, 2.0, 3.0]).unwrap();
    /// let mut bytes = Vec::new();
    /// m.write_to(&mut bytes).unwrap();
    /// let back = SymMatrix::<f64>::read_from(&mut bytes.as_slice()).unwrap();
    /// assert_eq!(back, m);
    /// ```
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, StreamError> {
        let mut head = [0u8; 22];
        r.read_exact(&mut head)?;
        if &head[..4] != MAGIC {
            return Err(StreamError::BadMagic);
        }
        if head[4] != VERSION {
            return Err(StreamError::UnsupportedVersion(head[4]));
        }
        let width = head[5] as usize;
        if width != T::WIDTH {
            return Err(StreamError::ElementWidth {
                expected: T::WIDTH,
                found: width,
            });
        }

        let mut word = [0u8; 8];
        word.copy_from_slice(&head[6..14]);
        let nrows = u64::from_le_bytes(word);
        word.copy_from_slice(&head[14..22]);
        let lwb = i64::from_le_bytes(word);

        let too_large = || MatrixError::ShapeMismatch {
            op: "read_from",
            detail: format!("{nrows} rows"),
        };
        let n = usize::try_from(nrows).map_err(|_| too_large())?;
        n.checked_mul(n).ok_or_else(too_large)?;
        let row_lwb = isize::try_from(lwb).map_err(|_| MatrixError::ShapeMismatch {
            op: "read_from",
            detail: format!("lower bound {lwb} out of range"),
        })?;
        check_bounds("read_from", row_lwb, n)?;
        let count = upper_len(n).ok_or_else(too_large)?;
        let bytes = count.checked_mul(T::WIDTH).ok_or_else(too_large)?;

        let mut tol = vec![0u8; T::WIDTH];
        r.read_exact(&mut tol)?;

        // Read through `take` so a corrupt row count cannot force a huge
        // allocation before the data runs out.
        let mut upper = Vec::new();
        r.by_ref().take(bytes as u64).read_to_end(&mut upper)?;
        if upper.len() != bytes {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }

        let mut m = Self::alloc(n, row_lwb);
        m.set_tolerance(T::read_le(&tol));
        let data = m.data_mut();
        let mut chunks = upper.chunks_exact(T::WIDTH);
        for i in 0..n {
            for j in i..n {
                if let Some(c) = chunks.next() {
                    data[i * n + j] = T::read_le(c);
                }
            }
        }
        m.mirror_upper();
        tracing::debug!(n, row_lwb, inline = m.is_inline(), "read symmetric matrix");
        Ok(m)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::upper_len;
    use crate::matrix::check_bounds;
    use crate::{Element, SymMatrix};

    #[derive(Serialize, Deserialize)]
    struct Repr<T> {
        nrows: usize,
        row_lwb: isize,
        tol: T,
        upper: Vec<T>,
    }

    impl<T: Element + Serialize> Serialize for SymMatrix<'_, T> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if !self.is_valid() {
                return Err(S::Error::custom("cannot serialize an invalid matrix"));
            }
            let n = self.nrows();
            let data = self.matrix_array();
            let upper = (0..n)
                .flat_map(|i| data[i * n + i..(i + 1) * n].iter().copied())
                .collect();
            Repr {
                nrows: n,
                row_lwb: self.row_lwb(),
                tol: self.tolerance(),
                upper,
            }
            .serialize(serializer)
        }
    }

    impl<'de, T: Element + Deserialize<'de>> Deserialize<'de> for SymMatrix<'static, T> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = Repr::<T>::deserialize(deserializer)?;
            let n = repr.nrows;
            if n.checked_mul(n).is_none() || upper_len(n) != Some(repr.upper.len()) {
                return Err(D::Error::custom(format!(
                    "{} upper elements for {n} rows",
                    repr.upper.len()
                )));
            }
            check_bounds("deserialize", repr.row_lwb, n).map_err(D::Error::custom)?;
            let mut m = SymMatrix::alloc(n, repr.row_lwb);
            m.set_tolerance(repr.tol);
            let data = m.data_mut();
            let mut it = repr.upper.into_iter();
            for i in 0..n {
                for j in i..n {
                    if let Some(x) = it.next() {
                        data[i * n + j] = x;
                    }
                }
            }
            m.mirror_upper();
            Ok(m)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SymMatrix<'static, f64> {
        let mut m = SymMatrix::with_bounds(-2, 1).unwrap();
        m.apply_pos(|i, j, _| (i * 10 + j) as f64).unwrap();
        m.set_tolerance(1e-9);
        m
    }

    #[test]
    fn test_round_trip() {
        let m = sample();
        let mut bytes = Vec::new();
        m.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 22 + 8 * (1 + 10));

        let back = SymMatrix::<f64>::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.row_lwb(), -2);
        assert_eq!(back.tolerance(), 1e-9);
        assert!(back.is_inline());
    }

    #[test]
    fn test_large_round_trip_on_heap() {
        let mut m = SymMatrix::<f32>::new(7);
        m.apply_pos(|i, j, _| (i + j) as f32 * 0.5).unwrap();
        let mut bytes = Vec::new();
        m.write_to(&mut bytes).unwrap();
        let back = SymMatrix::<f32>::read_from(&mut bytes.as_slice()).unwrap();
        assert!(!back.is_inline());
        assert_eq!(back.matrix_array(), m.matrix_array());
    }

    #[test]
    fn test_header_errors() {
        let mut bytes = Vec::new();
        sample().write_to(&mut bytes).unwrap();

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(matches!(
            SymMatrix::<f64>::read_from(&mut bad.as_slice()),
            Err(StreamError::BadMagic)
        ));

        let mut bad = bytes.clone();
        bad[4] = 9;
        assert!(matches!(
            SymMatrix::<f64>::read_from(&mut bad.as_slice()),
            Err(StreamError::UnsupportedVersion(9))
        ));

        assert!(matches!(
            SymMatrix::<f32>::read_from(&mut bytes.as_slice()),
            Err(StreamError::ElementWidth {
                expected: 4,
                found: 8
            })
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let mut bytes = Vec::new();
        sample().write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            SymMatrix::<f64>::read_from(&mut bytes.as_slice()),
            Err(StreamError::Io(_))
        ));
    }

    #[test]
    fn test_overflowing_lower_bound_rejected() {
        let mut bytes = Vec::new();
        SymMatrix::<f64>::new(2).write_to(&mut bytes).unwrap();
        bytes[14..22].copy_from_slice(&i64::MAX.to_le_bytes());
        assert!(matches!(
            SymMatrix::<f64>::read_from(&mut bytes.as_slice()),
            Err(StreamError::Matrix(MatrixError::ShapeMismatch { .. }))
        ));

        // An empty matrix needs room for `lwb - 1`.
        let mut bytes = Vec::new();
        SymMatrix::<f64>::new(0).write_to(&mut bytes).unwrap();
        bytes[14..22].copy_from_slice(&i64::MIN.to_le_bytes());
        assert!(SymMatrix::<f64>::read_from(&mut bytes.as_slice()).is_err());

        let mut bytes = Vec::new();
        SymMatrix::<f64>::with_bounds(isize::MAX - 1, isize::MAX)
            .unwrap()
            .write_to(&mut bytes)
            .unwrap();
        let back = SymMatrix::<f64>::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back.row_upb(), isize::MAX);
    }

    #[test]
    fn test_invalid_matrix_not_written() {
        let mut m = SymMatrix::<f64>::new(2);
        let _ = m.resize(2, 3);
        let mut bytes = Vec::new();
        assert!(matches!(
            m.write_to(&mut bytes),
            Err(StreamError::Matrix(MatrixError::Invalid))
        ));
        assert!(bytes.is_empty());
    }
}
