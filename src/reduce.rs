//! Reductions, norms, and whole-matrix elementwise helpers.

use crate::{Element, Result, SymMatrix};

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Sum of all elements.
    pub fn sum(&self) -> Result<T> {
        self.ensure_valid()?;
        Ok(self.data().iter().fold(T::zero(), |acc, &x| acc + x))
    }

    /// Largest element; `None` for an empty matrix.
    pub fn max(&self) -> Result<Option<T>> {
        self.ensure_valid()?;
        Ok(self.data().iter().copied().reduce(T::max))
    }

    /// Smallest element; `None` for an empty matrix.
    pub fn min(&self) -> Result<Option<T>> {
        self.ensure_valid()?;
        Ok(self.data().iter().copied().reduce(T::min))
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> Result<T> {
        self.ensure_valid()?;
        let n = self.nrows();
        let data = self.data();
        Ok((0..n).fold(T::zero(), |acc, i| acc + data[i * n + i]))
    }

    /// Infinity norm: largest absolute row sum.
    pub fn row_norm(&self) -> Result<T> {
        self.ensure_valid()?;
        let n = self.nrows();
        Ok(self
            .data()
            .chunks(n.max(1))
            .map(|row| row.iter().fold(T::zero(), |acc, x| acc + x.abs()))
            .fold(T::zero(), T::max))
    }

    /// One norm: largest absolute column sum. Equals [`row_norm`](Self::row_norm)
    /// for a symmetric matrix.
    pub fn col_norm(&self) -> Result<T> {
        self.ensure_valid()?;
        let n = self.nrows();
        let data = self.data();
        let mut best = T::zero();
        for j in 0..n {
            let s = (0..n).fold(T::zero(), |acc, i| acc + data[i * n + j].abs());
            best = best.max(s);
        }
        Ok(best)
    }

    /// Frobenius norm.
    pub fn e_norm(&self) -> Result<T> {
        self.ensure_valid()?;
        Ok(self.data().iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt())
    }

    /// Set to the identity.
    pub fn unit_matrix(&mut self) -> Result<()> {
        self.ensure_valid()?;
        self.fill_identity();
        Ok(())
    }

    /// Set every element to zero.
    pub fn zero(&mut self) -> Result<()> {
        self.fill(T::zero())
    }

    pub fn abs(&mut self) -> Result<()> {
        self.apply(T::abs)
    }

    pub fn sqr(&mut self) -> Result<()> {
        self.apply(|x| x * x)
    }

    /// Elementwise square root; negative elements become NaN.
    pub fn sqrt(&mut self) -> Result<()> {
        self.apply(T::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use crate::SymMatrix;
    use approx::assert_relative_eq;

    fn m() -> SymMatrix<'static, f64> {
        SymMatrix::from_rows(3, &[1.0, -2.0, 0.5, -2.0, 4.0, 3.0, 0.5, 3.0, -6.0]).unwrap()
    }

    #[test]
    fn test_reductions() {
        let m = m();
        assert_relative_eq!(m.sum().unwrap(), 2.0);
        assert_eq!(m.max().unwrap(), Some(4.0));
        assert_eq!(m.min().unwrap(), Some(-6.0));
        assert_relative_eq!(m.trace().unwrap(), -1.0);
        assert!(SymMatrix::<f64>::new(0).max().unwrap().is_none());
    }

    #[test]
    fn test_norms() {
        let m = m();
        assert_relative_eq!(m.row_norm().unwrap(), 9.5);
        assert_relative_eq!(m.col_norm().unwrap(), 9.5);
        let e2: f64 = m.matrix_array().iter().map(|x| x * x).sum();
        assert_relative_eq!(m.e_norm().unwrap(), e2.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_elementwise_helpers() {
        let mut a = m();
        a.abs().unwrap();
        assert!(a.matrix_array().iter().all(|&x| x >= 0.0));
        a.sqr().unwrap();
        assert_eq!(a[(2, 2)], 36.0);
        a.sqrt().unwrap();
        assert_eq!(a[(2, 2)], 6.0);
        a.unit_matrix().unwrap();
        assert_eq!(a.trace().unwrap(), 3.0);
        a.zero().unwrap();
        assert_eq!(a.sum().unwrap(), 0.0);
    }
}
