//! Random symmetric fills.

use rand::Rng;

use crate::{Element, Result, SymMatrix};

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Fill with values uniform in `[alpha, beta)`, keeping the matrix
    /// symmetric.
    ///
    /// Draws one value per lower-triangle element, row by row, so a seeded
    /// generator reproduces the same matrix.
    pub fn randomize<R: Rng + ?Sized>(&mut self, alpha: T, beta: T, rng: &mut R) -> Result<()> {
        self.ensure_valid()?;
        self.fill_lower_uniform(alpha, beta, rng);
        let n = self.nrows();
        let data = self.data_mut();
        for i in 0..n {
            for j in 0..i {
                data[j * n + i] = data[i * n + j];
            }
        }
        Ok(())
    }

    /// Fill with a random symmetric positive semi-definite matrix `L·Lᵀ`,
    /// where `L` is lower triangular with elements uniform in
    /// `[alpha, beta)`. The result is positive definite unless a diagonal
    /// element of `L` is zero.
    ///
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use symmat::SymMatrix;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let mut m = SymMatrix::<f64>::new(4);
    /// m.randomize_pd(0.5, 1.5, &mut rng).unwrap();
    /// assert!(m.is_symmetric());
    /// assert!(m.determinant().unwrap() > 0.0);
    /// ```
    pub fn randomize_pd<R: Rng + ?Sized>(
        &mut self,
        alpha: T,
        beta: T,
        rng: &mut R,
    ) -> Result<()> {
        self.ensure_valid()?;
        self.fill_lower_uniform(alpha, beta, rng);

        // Overwrite the lower triangle with L·Lᵀ from the bottom-right corner
        // up, so every L element read is still unmodified.
        let n = self.nrows();
        let data = self.data_mut();
        for i in (0..n).rev() {
            let r1 = i * n;
            for j in (0..=i).rev() {
                let r2 = j * n;
                let mut acc = data[r1 + j] * data[r2 + j];
                for k in (0..j).rev() {
                    acc += data[r1 + k] * data[r2 + k];
                }
                data[r1 + j] = acc;
                if i != j {
                    data[r2 + i] = acc;
                }
            }
        }
        Ok(())
    }

    fn fill_lower_uniform<R: Rng + ?Sized>(&mut self, alpha: T, beta: T, rng: &mut R) {
        let n = self.nrows();
        let scale = beta - alpha;
        let data = self.data_mut();
        let open = alpha < beta;
        for i in 0..n {
            for j in 0..=i {
                // Narrowing to `T` or the affine map can round up to `beta`;
                // redraw so the range stays half-open.
                data[i * n + j] = loop {
                    let u = T::from_f64_lossy(rng.gen::<f64>());
                    let x = alpha + scale * u;
                    if !open || x < beta {
                        break x;
                    }
                };
            }
        }
    }
}
