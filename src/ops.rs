//! Scalar and elementwise algebra, comparisons, and operator overloads.
//!
//! Scalar operations touch every stored element; since both triangles are
//! stored, the result stays symmetric. Binary matrix operations require
//! compatible operands (see [`are_compatible`](crate::are_compatible)).

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::{are_compatible, Element, MatrixError, Result, SymMatrix};

impl<'a, T: Element> SymMatrix<'a, T> {
    /// Set every element to `value`.
    pub fn fill(&mut self, value: T) -> Result<()> {
        self.ensure_valid()?;
        self.data_mut().iter_mut().for_each(|x| *x = value);
        Ok(())
    }

    pub fn add_scalar(&mut self, value: T) -> Result<()> {
        self.ensure_valid()?;
        self.data_mut().iter_mut().for_each(|x| *x += value);
        Ok(())
    }

    pub fn sub_scalar(&mut self, value: T) -> Result<()> {
        self.ensure_valid()?;
        self.data_mut().iter_mut().for_each(|x| *x -= value);
        Ok(())
    }

    pub fn scale(&mut self, value: T) -> Result<()> {
        self.ensure_valid()?;
        self.data_mut().iter_mut().for_each(|x| *x *= value);
        Ok(())
    }

    /// `self += source`.
    pub fn add_assign_matrix(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.zip_with("add_assign", source, |a, b| a + b)
    }

    /// `self -= source`.
    pub fn sub_assign_matrix(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.zip_with("sub_assign", source, |a, b| a - b)
    }

    /// `self += scalar * source`.
    pub fn add_scaled(&mut self, scalar: T, source: &SymMatrix<'_, T>) -> Result<()> {
        if scalar == T::zero() {
            return self.check_compatible("add_scaled", source);
        }
        self.zip_with("add_scaled", source, |a, b| a + scalar * b)
    }

    /// Elementwise product.
    pub fn element_mult(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.zip_with("element_mult", source, |a, b| a * b)
    }

    /// Elementwise quotient. A zero divisor invalidates `self` and leaves
    /// its elements untouched.
    pub fn element_div(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.check_compatible("element_div", source)?;
        let n = source.nrows();
        if let Some(k) = source.data().iter().position(|&b| b == T::zero()) {
            let lwb = source.row_lwb();
            let err = MatrixError::DivisionByZero {
                row: lwb + (k / n) as isize,
                col: lwb + (k % n) as isize,
            };
            return Err(self.fail("element_div", err));
        }
        self.zip_with("element_div", source, |a, b| a / b)
    }

    fn zip_with(
        &mut self,
        op: &'static str,
        source: &SymMatrix<'_, T>,
        f: impl Fn(T, T) -> T,
    ) -> Result<()> {
        self.check_compatible(op, source)?;
        for (a, &b) in self.data_mut().iter_mut().zip(source.data()) {
            *a = f(*a, b);
        }
        Ok(())
    }

    /// Copy the elements of a compatible matrix.
    pub fn assign(&mut self, source: &SymMatrix<'_, T>) -> Result<()> {
        self.check_compatible("assign", source)?;
        self.data_mut().copy_from_slice(source.data());
        Ok(())
    }

    /// Elementwise `self > other` as a 0/1 matrix.
    pub fn gt(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("gt", other, |a, b| a > b)
    }

    pub fn ge(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("ge", other, |a, b| a >= b)
    }

    pub fn lt(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("lt", other, |a, b| a < b)
    }

    pub fn le(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("le", other, |a, b| a <= b)
    }

    /// 1 where both elements are nonzero.
    pub fn and(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("and", other, |a, b| a != T::zero() && b != T::zero())
    }

    /// 1 where either element is nonzero.
    pub fn or(&self, other: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.compare("or", other, |a, b| a != T::zero() || b != T::zero())
    }

    fn compare(
        &self,
        op: &'static str,
        other: &SymMatrix<'_, T>,
        pred: impl Fn(T, T) -> bool,
    ) -> SymMatrix<'static, T> {
        self.binary(op, other, |a, b| if pred(a, b) { T::one() } else { T::zero() })
    }

    /// Fresh matrix `f(self, other)` elementwise, or an invalid matrix.
    fn binary(
        &self,
        op: &'static str,
        other: &SymMatrix<'_, T>,
        f: impl Fn(T, T) -> T,
    ) -> SymMatrix<'static, T> {
        if !self.is_valid() || !other.is_valid() {
            return SymMatrix::invalid(op, MatrixError::Invalid);
        }
        if !are_compatible(self, other) {
            let err = MatrixError::IncompatibleOperands {
                op,
                lhs_lwb: self.row_lwb(),
                lhs_n: self.nrows(),
                rhs_lwb: other.row_lwb(),
                rhs_n: other.nrows(),
            };
            return SymMatrix::invalid(op, err);
        }
        let mut out = SymMatrix::alloc(self.nrows(), self.row_lwb());
        for ((c, &a), &b) in out.data_mut().iter_mut().zip(self.data()).zip(other.data()) {
            *c = f(a, b);
        }
        out
    }

    fn unary(&self, op: &'static str, f: impl Fn(T) -> T) -> SymMatrix<'static, T> {
        if !self.is_valid() {
            return SymMatrix::invalid(op, MatrixError::Invalid);
        }
        let mut out = self.to_owned_matrix();
        out.data_mut().iter_mut().for_each(|x| *x = f(*x));
        out
    }
}

/// Equal when compatible and elementwise equal; invalid matrices are never
/// equal.
impl<T: Element> PartialEq<SymMatrix<'_, T>> for SymMatrix<'_, T> {
    fn eq(&self, other: &SymMatrix<'_, T>) -> bool {
        are_compatible(self, other) && self.data() == other.data()
    }
}

// ============================================================================
// Operator overloads
// ============================================================================

impl<T: Element> Add<&SymMatrix<'_, T>> for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn add(self, rhs: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.binary("add", rhs, |a, b| a + b)
    }
}

impl<T: Element> Sub<&SymMatrix<'_, T>> for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn sub(self, rhs: &SymMatrix<'_, T>) -> SymMatrix<'static, T> {
        self.binary("sub", rhs, |a, b| a - b)
    }
}

impl<T: Element> Add<T> for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn add(self, rhs: T) -> SymMatrix<'static, T> {
        self.unary("add", |a| a + rhs)
    }
}

impl<T: Element> Sub<T> for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn sub(self, rhs: T) -> SymMatrix<'static, T> {
        self.unary("sub", |a| a - rhs)
    }
}

impl<T: Element> Mul<T> for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn mul(self, rhs: T) -> SymMatrix<'static, T> {
        self.unary("mul", |a| a * rhs)
    }
}

impl<T: Element> Neg for &SymMatrix<'_, T> {
    type Output = SymMatrix<'static, T>;

    fn neg(self) -> SymMatrix<'static, T> {
        self.unary("neg", |a| -a)
    }
}

macro_rules! impl_scalar_lhs {
    ($($t:ty),*) => {$(
        impl Add<&SymMatrix<'_, $t>> for $t {
            type Output = SymMatrix<'static, $t>;

            fn add(self, rhs: &SymMatrix<'_, $t>) -> SymMatrix<'static, $t> {
                rhs + self
            }
        }

        impl Sub<&SymMatrix<'_, $t>> for $t {
            type Output = SymMatrix<'static, $t>;

            fn sub(self, rhs: &SymMatrix<'_, $t>) -> SymMatrix<'static, $t> {
                rhs.unary("sub", |a| self - a)
            }
        }

        impl Mul<&SymMatrix<'_, $t>> for $t {
            type Output = SymMatrix<'static, $t>;

            fn mul(self, rhs: &SymMatrix<'_, $t>) -> SymMatrix<'static, $t> {
                rhs * self
            }
        }
    )*};
}

impl_scalar_lhs!(f32, f64);

// Compound assignment records failures in the matrix status.

impl<T: Element> AddAssign<T> for SymMatrix<'_, T> {
    fn add_assign(&mut self, rhs: T) {
        let _ = self.add_scalar(rhs);
    }
}

impl<T: Element> SubAssign<T> for SymMatrix<'_, T> {
    fn sub_assign(&mut self, rhs: T) {
        let _ = self.sub_scalar(rhs);
    }
}

impl<T: Element> MulAssign<T> for SymMatrix<'_, T> {
    fn mul_assign(&mut self, rhs: T) {
        let _ = self.scale(rhs);
    }
}

impl<T: Element> AddAssign<&SymMatrix<'_, T>> for SymMatrix<'_, T> {
    fn add_assign(&mut self, rhs: &SymMatrix<'_, T>) {
        let _ = self.add_assign_matrix(rhs);
    }
}

impl<T: Element> SubAssign<&SymMatrix<'_, T>> for SymMatrix<'_, T> {
    fn sub_assign(&mut self, rhs: &SymMatrix<'_, T>) {
        let _ = self.sub_assign_matrix(rhs);
    }
}
