//! Resizing, sub-matrix extraction and insertion, index shifting.

use crate::matrix::{check_bounds, extent, find_asymmetry};
use crate::storage::{Run, Runs};
use crate::{DenseMatrix, Element, MatrixError, Result, SymMatrix};

/// Index range of an extracted sub-matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubIndexing {
    /// Re-indexed to start at 0.
    #[default]
    Shifted,
    /// Keeps the bounds it had in the source.
    Preserve,
}

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Resize to `nrows x ncols`, keeping the lower bound.
    ///
    /// Elements in the overlap of the old and new index ranges are kept,
    /// all others are zero. Fails on a view or when `nrows != ncols`.
    pub fn resize(&mut self, nrows: usize, ncols: usize) -> Result<()> {
        self.ensure_valid()?;
        if nrows != ncols {
            let err = MatrixError::ShapeMismatch {
                op: "resize",
                detail: format!("{nrows}x{ncols} is not square"),
            };
            return Err(self.fail("resize", err));
        }
        self.relayout_to("resize", self.row_lwb(), nrows)
    }

    /// Resize to `[row_lwb..=row_upb] x [col_lwb..=col_upb]`; row and column
    /// bounds must coincide.
    pub fn resize_bounds(
        &mut self,
        row_lwb: isize,
        row_upb: isize,
        col_lwb: isize,
        col_upb: isize,
    ) -> Result<()> {
        self.ensure_valid()?;
        if row_lwb != col_lwb || row_upb != col_upb {
            let err = MatrixError::ShapeMismatch {
                op: "resize_bounds",
                detail: format!("rows [{row_lwb}, {row_upb}] vs cols [{col_lwb}, {col_upb}]"),
            };
            return Err(self.fail("resize_bounds", err));
        }
        let n = match extent("resize_bounds", row_lwb, row_upb) {
            Ok(n) => n,
            Err(err) => return Err(self.fail("resize_bounds", err)),
        };
        self.relayout_to("resize_bounds", row_lwb, n)
    }

    /// Resize to the shape and bounds of `other`.
    pub fn resize_like(&mut self, other: &SymMatrix<'_, T>) -> Result<()> {
        self.ensure_valid()?;
        if !other.is_valid() {
            return Err(self.fail("resize_like", MatrixError::Invalid));
        }
        let (lwb, upb) = (other.row_lwb(), other.row_upb());
        self.resize_bounds(lwb, upb, lwb, upb)
    }

    fn relayout_to(&mut self, op: &'static str, lwb: isize, n: usize) -> Result<()> {
        if !self.is_owner() {
            return Err(self.fail(op, MatrixError::NotOwner { op }));
        }
        let (old_n, old_lwb) = (self.nrows(), self.row_lwb());
        if n == old_n && lwb == old_lwb {
            return Ok(());
        }

        let lo = old_lwb.max(lwb);
        let hi = self.row_upb().min(lwb + n as isize - 1);
        let mut runs = Runs::new();
        if lo <= hi {
            let width = (hi - lo + 1) as usize;
            for r in lo..=hi {
                runs.push(Run {
                    src: (r - old_lwb) as usize * old_n + (lo - old_lwb) as usize,
                    dst: (r - lwb) as usize * n + (lo - lwb) as usize,
                    len: width,
                });
            }
        }
        self.storage_mut().relayout(n * n, &runs);
        self.set_shape(n, lwb);
        Ok(())
    }

    /// Move the index bounds; both shifts must be equal.
    pub fn shift(&mut self, row_shift: isize, col_shift: isize) -> Result<()> {
        self.ensure_valid()?;
        if row_shift != col_shift {
            let err = MatrixError::ShapeMismatch {
                op: "shift",
                detail: format!("row shift {row_shift} != column shift {col_shift}"),
            };
            return Err(self.fail("shift", err));
        }
        let n = self.nrows();
        let lwb = match self.row_lwb().checked_add(row_shift) {
            Some(lwb) => lwb,
            None => {
                let err = MatrixError::ShapeMismatch {
                    op: "shift",
                    detail: format!("lower bound {} + {row_shift} overflows", self.row_lwb()),
                };
                return Err(self.fail("shift", err));
            }
        };
        if let Err(err) = check_bounds("shift", lwb, n) {
            return Err(self.fail("shift", err));
        }
        self.set_shape(n, lwb);
        Ok(())
    }

    fn check_range(&self, op: &'static str, lwb: isize, upb: isize) -> Result<()> {
        if !self.contains(lwb) || !self.contains(upb) || upb < lwb {
            return Err(MatrixError::OutOfBounds {
                op,
                lwb,
                upb,
                extent_lwb: self.row_lwb(),
                extent_upb: self.row_upb(),
            });
        }
        Ok(())
    }

    /// Copy the diagonal block `[lwb..=upb]` into `target`, resizing it when
    /// its shape differs. Errors invalidate `target`, never `self`.
    pub fn get_sub_into(
        &self,
        lwb: isize,
        upb: isize,
        target: &mut SymMatrix<'_, T>,
        indexing: SubIndexing,
    ) -> Result<()> {
        target.ensure_valid()?;
        if !self.is_valid() {
            return Err(target.fail("get_sub", MatrixError::Invalid));
        }
        if let Err(err) = self.check_range("get_sub", lwb, upb) {
            return Err(target.fail("get_sub", err));
        }

        let n = (upb - lwb + 1) as usize;
        let sub_lwb = match indexing {
            SubIndexing::Shifted => 0,
            SubIndexing::Preserve => lwb,
        };
        if target.nrows() != n || target.row_lwb() != sub_lwb {
            let sub_upb = sub_lwb + n as isize - 1;
            target.resize_bounds(sub_lwb, sub_upb, sub_lwb, sub_upb)?;
        }

        let src_n = self.nrows();
        let off = (lwb - self.row_lwb()) as usize;
        let src = self.data();
        let dst = target.data_mut();
        for i in 0..n {
            let s = (off + i) * src_n + off;
            dst[i * n..(i + 1) * n].copy_from_slice(&src[s..s + n]);
        }
        Ok(())
    }

    /// The diagonal block `[lwb..=upb]` as a new matrix.
    pub fn get_sub(
        &self,
        lwb: isize,
        upb: isize,
        indexing: SubIndexing,
    ) -> Result<SymMatrix<'static, T>> {
        let mut target = SymMatrix::new(0);
        self.get_sub_into(lwb, upb, &mut target, indexing)?;
        Ok(target)
    }

    /// The rectangular block `[row_lwb..=row_upb] x [col_lwb..=col_upb]` as a
    /// general matrix.
    pub fn get_sub_rect(
        &self,
        row_lwb: isize,
        row_upb: isize,
        col_lwb: isize,
        col_upb: isize,
        indexing: SubIndexing,
    ) -> Result<DenseMatrix<T>> {
        self.ensure_valid()?;
        self.check_range("get_sub_rect", row_lwb, row_upb)?;
        self.check_range("get_sub_rect", col_lwb, col_upb)?;

        let nr = (row_upb - row_lwb + 1) as usize;
        let nc = (col_upb - col_lwb + 1) as usize;
        let mut out = match indexing {
            SubIndexing::Shifted => DenseMatrix::alloc(nr, nc, 0, 0),
            SubIndexing::Preserve => DenseMatrix::alloc(nr, nc, row_lwb, col_lwb),
        };
        let n = self.nrows();
        let r0 = (row_lwb - self.row_lwb()) as usize;
        let c0 = (col_lwb - self.row_lwb()) as usize;
        let src = self.data();
        let dst = out.as_mut_slice();
        for i in 0..nr {
            let s = (r0 + i) * n + c0;
            dst[i * nc..(i + 1) * nc].copy_from_slice(&src[s..s + nc]);
        }
        Ok(out)
    }

    /// Overwrite the diagonal block starting at `(lwb, lwb)` with `source`.
    pub fn set_sub(&mut self, lwb: isize, source: &SymMatrix<'_, T>) -> Result<()> {
        self.ensure_valid()?;
        if !source.is_valid() {
            return Err(self.fail("set_sub", MatrixError::Invalid));
        }
        self.write_diag_block(lwb, source.nrows(), source.data())
    }

    /// Overwrite the diagonal block starting at `(lwb, lwb)` with a general
    /// matrix, which must be square and symmetric.
    pub fn set_sub_dense(&mut self, lwb: isize, source: &DenseMatrix<T>) -> Result<()> {
        self.ensure_valid()?;
        if source.nrows() != source.ncols() {
            let err = MatrixError::ShapeMismatch {
                op: "set_sub",
                detail: format!("source is {}x{}", source.nrows(), source.ncols()),
            };
            return Err(self.fail("set_sub", err));
        }
        if let Some((i, j)) = find_asymmetry(source.as_slice(), source.nrows()) {
            let err = MatrixError::NotSymmetric {
                row: source.row_lwb() + i as isize,
                col: source.col_lwb() + j as isize,
            };
            return Err(self.fail("set_sub", err));
        }
        self.write_diag_block(lwb, source.nrows(), source.as_slice())
    }

    fn write_diag_block(&mut self, lwb: isize, ns: usize, src: &[T]) -> Result<()> {
        if ns > 0 {
            let upb = lwb + ns as isize - 1;
            if let Err(err) = self.check_range("set_sub", lwb, upb) {
                return Err(self.fail("set_sub", err));
            }
        } else if !self.contains(lwb) {
            let err = MatrixError::OutOfBounds {
                op: "set_sub",
                lwb,
                upb: lwb,
                extent_lwb: self.row_lwb(),
                extent_upb: self.row_upb(),
            };
            return Err(self.fail("set_sub", err));
        }

        let n = self.nrows();
        let off = (lwb - self.row_lwb()) as usize;
        let dst = self.data_mut();
        for i in 0..ns {
            let d = (off + i) * n + off;
            dst[d..d + ns].copy_from_slice(&src[i * ns..(i + 1) * ns]);
        }
        Ok(())
    }

    /// Insert `source` with its top-left corner at `(row_lwb, col_lwb)`,
    /// keeping the matrix symmetric.
    ///
    /// Block cells on the anchor's side of the diagonal are authoritative:
    /// with `row_lwb >= col_lwb` the cells on or below the diagonal are
    /// written and mirrored above it; with `row_lwb < col_lwb` the cells on
    /// or above the diagonal are written and mirrored below it.
    pub fn set_sub_block(
        &mut self,
        row_lwb: isize,
        col_lwb: isize,
        source: &DenseMatrix<T>,
    ) -> Result<()> {
        self.ensure_valid()?;
        let (nr, nc) = (source.nrows() as isize, source.ncols() as isize);
        for (lwb, len) in [(row_lwb, nr), (col_lwb, nc)] {
            if !self.contains(lwb) || (len > 0 && !self.contains(lwb + len - 1)) {
                let err = MatrixError::OutOfBounds {
                    op: "set_sub_block",
                    lwb,
                    upb: lwb + len - 1,
                    extent_lwb: self.row_lwb(),
                    extent_upb: self.row_upb(),
                };
                return Err(self.fail("set_sub_block", err));
            }
        }

        let lower_anchor = row_lwb >= col_lwb;
        let n = self.nrows();
        let base = self.row_lwb();
        let src = source.as_slice();
        let dst = self.data_mut();
        for ir in 0..nr {
            let r = row_lwb + ir;
            for ic in 0..nc {
                let c = col_lwb + ic;
                if (lower_anchor && r < c) || (!lower_anchor && r > c) {
                    continue;
                }
                let v = src[(ir * nc + ic) as usize];
                let (ri, ci) = ((r - base) as usize, (c - base) as usize);
                dst[ri * n + ci] = v;
                dst[ci * n + ri] = v;
            }
        }
        Ok(())
    }
}
