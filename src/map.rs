//! Symmetry-preserving elementwise transforms.

use crate::{Element, Result, SymMatrix};

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Replace every element `x` of the upper triangle (diagonal included)
    /// by `f(x)` and mirror the result into the lower triangle.
    ///
    /// `f` is called exactly once per unique element, row by row.
    ///
    /// ```
    /// use symmat::SymMatrix;
    ///
    /// let mut m = SymMatrix::<f64>::from_rows(2, &[1.0, -2.0, -2.0, 3.0]).unwrap();
    /// m.apply(|x| x * x).unwrap();
    /// assert_eq!(m.matrix_array(), &[1.0, 4.0, 4.0, 9.0]);
    /// ```
    pub fn apply(&mut self, mut f: impl FnMut(T) -> T) -> Result<()> {
        self.apply_pos(|_, _, x| f(x))
    }

    /// Like [`apply`](Self::apply), passing each element's logical
    /// `(row, col)` with `row <= col`.
    pub fn apply_pos(&mut self, mut f: impl FnMut(isize, isize, T) -> T) -> Result<()> {
        self.ensure_valid()?;
        let n = self.nrows();
        let lwb = self.row_lwb();
        let data = self.data_mut();
        for i in 0..n {
            for j in i..n {
                let v = f(lwb + i as isize, lwb + j as isize, data[i * n + j]);
                data[i * n + j] = v;
                data[j * n + i] = v;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::SymMatrix;

    #[test]
    fn test_apply_visits_upper_once() {
        let mut m = SymMatrix::<f64>::new(3);
        let mut calls = 0;
        m.apply(|x| {
            calls += 1;
            x + 1.0
        })
        .unwrap();
        assert_eq!(calls, 6);
        assert!(m.matrix_array().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_apply_pos_coordinates() {
        let mut m = SymMatrix::<f64>::with_bounds(1, 3).unwrap();
        m.apply_pos(|i, j, _| (10 * i + j) as f64).unwrap();
        assert_eq!(m[(1, 3)], 13.0);
        assert_eq!(m[(3, 1)], 13.0);
        assert_eq!(m[(2, 2)], 22.0);
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_apply_on_invalid_fails() {
        let mut m = SymMatrix::<f64>::new(2);
        let _ = m.resize(2, 3);
        assert!(m.apply(|x| x).is_err());
    }
}
