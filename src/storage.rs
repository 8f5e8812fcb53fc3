//! Element buffers: inline for small matrices, heap otherwise.

use smallvec::SmallVec;

use crate::{Element, INLINE_MAX};

/// One contiguous copy from the old layout into the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub src: usize,
    pub dst: usize,
    pub len: usize,
}

pub(crate) type Runs = SmallVec<[Run; 8]>;

/// Backing buffer of a matrix.
///
/// `Inline` and `Heap` are owned; `Borrowed` views caller storage and is
/// never resized.
#[derive(Debug)]
pub(crate) enum Storage<'a, T> {
    Empty,
    Inline { data: [T; INLINE_MAX], len: usize },
    Heap(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<T: Element> Storage<'static, T> {
    /// Zero-filled buffer of `len` elements.
    pub fn allocate(len: usize) -> Self {
        if len == 0 {
            Storage::Empty
        } else if len <= INLINE_MAX {
            Storage::Inline {
                data: [T::zero(); INLINE_MAX],
                len,
            }
        } else {
            Storage::Heap(vec![T::zero(); len])
        }
    }

    /// Owned buffer holding a copy of `src`.
    pub fn from_slice(src: &[T]) -> Self {
        let mut storage = Self::allocate(src.len());
        storage.as_mut_slice().copy_from_slice(src);
        storage
    }
}

impl<'a, T: Element> Storage<'a, T> {
    pub fn len(&self) -> usize {
        match self {
            Storage::Empty => 0,
            Storage::Inline { len, .. } => *len,
            Storage::Heap(v) => v.len(),
            Storage::Borrowed(s) => s.len(),
        }
    }

    pub fn is_owner(&self) -> bool {
        !matches!(self, Storage::Borrowed(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Storage::Inline { .. })
    }

    pub fn as_slice(&self) -> &[T] {
        match self {
            Storage::Empty => &[],
            Storage::Inline { data, len } => &data[..*len],
            Storage::Heap(v) => v,
            Storage::Borrowed(s) => s,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Storage::Empty => &mut [],
            Storage::Inline { data, len } => &mut data[..*len],
            Storage::Heap(v) => v,
            Storage::Borrowed(s) => s,
        }
    }

    /// Owned copy of the current contents.
    pub fn to_owned_storage(&self) -> Storage<'static, T> {
        Storage::from_slice(self.as_slice())
    }

    /// Re-lay the buffer out to `new_len` elements.
    ///
    /// Every run is copied from the old layout to the new one; all other
    /// elements of the new layout are zero. When both the old and the new
    /// buffer are inline, the same array is reused and the runs are moved in
    /// place: runs moving towards the front are copied in ascending order
    /// first, then runs moving towards the back in descending order, so no
    /// run overwrites a source that is still to be read.
    pub fn relayout(&mut self, new_len: usize, runs: &[Run]) {
        debug_assert!(self.is_owner());
        debug_assert!(runs
            .iter()
            .all(|r| r.src + r.len <= self.len() && r.dst + r.len <= new_len));

        if let Storage::Inline { data, len } = self {
            if new_len > 0 && new_len <= INLINE_MAX {
                for r in runs.iter().filter(|r| r.dst <= r.src) {
                    copy_run(data, *r);
                }
                for r in runs.iter().rev().filter(|r| r.dst > r.src) {
                    copy_run(data, *r);
                }
                let mut kept = [false; INLINE_MAX];
                for r in runs {
                    kept[r.dst..r.dst + r.len].iter_mut().for_each(|k| *k = true);
                }
                for (x, keep) in data.iter_mut().zip(kept.iter()) {
                    if !keep {
                        *x = T::zero();
                    }
                }
                *len = new_len;
                return;
            }
        }

        let mut fresh = Storage::allocate(new_len);
        {
            let src = self.as_slice();
            let dst = fresh.as_mut_slice();
            for r in runs {
                dst[r.dst..r.dst + r.len].copy_from_slice(&src[r.src..r.src + r.len]);
            }
        }
        *self = fresh;
    }
}

/// Move one run inside a single buffer; overlapping ranges are handled like
/// `memmove`.
fn copy_run<T: Copy>(buf: &mut [T], run: Run) {
    if run.len == 0 || run.src == run.dst {
        return;
    }
    buf.copy_within(run.src..run.src + run.len, run.dst);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize) -> Storage<'static, f64> {
        let src: Vec<f64> = (1..=len).map(|x| x as f64).collect();
        Storage::from_slice(&src)
    }

    #[test]
    fn test_allocate_picks_variant() {
        assert!(matches!(Storage::<f64>::allocate(0), Storage::Empty));
        assert!(Storage::<f64>::allocate(1).is_inline());
        assert!(Storage::<f64>::allocate(INLINE_MAX).is_inline());
        assert!(matches!(
            Storage::<f64>::allocate(INLINE_MAX + 1),
            Storage::Heap(_)
        ));
        assert!(Storage::<f64>::allocate(7).as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_borrowed_is_not_owner() {
        let mut buf = [1.0_f64; 4];
        let s = Storage::Borrowed(&mut buf[..]);
        assert!(!s.is_owner());
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_inline_grow_in_place() {
        // 2x2 -> 3x3 keeping the top-left block
        let mut s = filled(4);
        let runs = [
            Run { src: 0, dst: 0, len: 2 },
            Run { src: 2, dst: 3, len: 2 },
        ];
        s.relayout(9, &runs);
        assert!(s.is_inline());
        assert_eq!(
            s.as_slice(),
            &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_inline_shrink_in_place() {
        // 3x3 -> 2x2 keeping the bottom-right block
        let mut s = filled(9);
        let runs = [
            Run { src: 4, dst: 0, len: 2 },
            Run { src: 7, dst: 2, len: 2 },
        ];
        s.relayout(4, &runs);
        assert_eq!(s.as_slice(), &[5.0, 6.0, 8.0, 9.0]);
    }

    #[test]
    fn test_inline_mixed_directions() {
        // 4x4 -> 5x5 with the block shifted: row offsets move both ways
        let mut s = filled(16);
        let runs = [
            Run { src: 1, dst: 0, len: 3 },
            Run { src: 5, dst: 5, len: 3 },
            Run { src: 9, dst: 10, len: 3 },
            Run { src: 13, dst: 15, len: 3 },
        ];
        s.relayout(25, &runs);
        let out = s.as_slice();
        assert_eq!(&out[0..3], &[2.0, 3.0, 4.0]);
        assert_eq!(&out[5..8], &[6.0, 7.0, 8.0]);
        assert_eq!(&out[10..13], &[10.0, 11.0, 12.0]);
        assert_eq!(&out[15..18], &[14.0, 15.0, 16.0]);
        assert_eq!(out[3], 0.0);
        assert_eq!(out[24], 0.0);
    }

    #[test]
    fn test_cross_inline_boundary() {
        let mut s = filled(INLINE_MAX);
        let runs = [Run { src: 0, dst: 0, len: 5 }];
        s.relayout(36, &runs);
        assert!(matches!(s, Storage::Heap(_)));
        assert_eq!(&s.as_slice()[..5], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(s.as_slice()[5..].iter().all(|&x| x == 0.0));

        s.relayout(4, &[Run { src: 0, dst: 0, len: 2 }]);
        assert!(s.is_inline());
        assert_eq!(s.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_relayout_to_empty() {
        let mut s = filled(4);
        s.relayout(0, &[]);
        assert!(matches!(s, Storage::Empty));
        assert_eq!(s.len(), 0);
    }
}
