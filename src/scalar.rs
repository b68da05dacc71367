//! Real and complex scalar abstractions
//!
//! The kernels in this crate are generic over a real-scalar trait ([`Real`])
//! and a real-or-complex element trait ([`Scalar`]). `f64` is the workhorse;
//! [`TwoFloatReal`] is a double-double extended-precision variant wrapped in
//! a newtype so the foreign `twofloat::TwoFloat` can carry the crate traits.

use num_complex::Complex;
use num_traits::{Num, NumAssign};
use std::fmt::{Debug, Display};
use std::ops::Neg;

/// Real scalar used by the numerical kernels.
///
/// Deliberately does not require `num_traits::Float`: every complex helper in
/// the crate is written in terms of these real primitives, so an extended
/// precision type only has to supply `sqrt`/`abs`/`hypot` and the constants.
///
/// A real scalar is also its own [`Scalar`], so real-arithmetic code can call
/// the element-generic kernels directly.
pub trait Real: Scalar<Real = Self> + Display + PartialOrd {
    fn from_f64(x: f64) -> Self;
    fn to_f64(self) -> f64;

    /// Machine epsilon (unit roundoff times two) for this type.
    fn epsilon() -> Self;
    /// Smallest positive normalized value.
    fn safe_min() -> Self;

    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    /// `sqrt(self^2 + other^2)` without undue overflow.
    fn hypot(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
    fn min(self, other: Self) -> Self;
    fn is_finite(self) -> bool;

    /// Fortran-style transfer of sign: `|self| * sign(other)`, where the
    /// sign of zero counts as positive.
    fn copysign_of(self, other: Self) -> Self {
        if other >= Self::zero() {
            self.abs()
        } else {
            -self.abs()
        }
    }
}

impl Real for f64 {
    #[inline]
    fn from_f64(x: f64) -> Self {
        x
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn epsilon() -> Self {
        f64::EPSILON
    }
    #[inline]
    fn safe_min() -> Self {
        f64::MIN_POSITIVE
    }
    #[inline]
    fn sqrt(self) -> Self {
        self.sqrt()
    }
    #[inline]
    fn abs(self) -> Self {
        self.abs()
    }
    #[inline]
    fn hypot(self, other: Self) -> Self {
        self.hypot(other)
    }
    #[inline]
    fn max(self, other: Self) -> Self {
        self.max(other)
    }
    #[inline]
    fn min(self, other: Self) -> Self {
        self.min(other)
    }
    #[inline]
    fn is_finite(self) -> bool {
        self.is_finite()
    }
}

/// Real or complex matrix element.
pub trait Scalar: Copy + Debug + Num + NumAssign + Neg<Output = Self> + 'static {
    type Real: Real;

    fn conj(self) -> Self;
    fn from_real(re: Self::Real) -> Self;
    fn real_part(self) -> Self::Real;
    fn imag_part(self) -> Self::Real;
    /// The one-norm of the entry, `|re| + |im|`. Cheaper than [`Scalar::mag`]
    /// and the magnitude measure the QR heuristics are phrased in.
    fn abs1(self) -> Self::Real;
    /// Squared magnitude.
    fn abs_sq(self) -> Self::Real;
    /// Magnitude, overflow-safe for complex entries. Named apart from
    /// [`Real::abs`] so real types can carry both traits.
    fn mag(self) -> Self::Real;
    fn is_complex_kind() -> bool {
        false
    }
}

impl Scalar for f64 {
    type Real = f64;

    #[inline]
    fn conj(self) -> Self {
        self
    }
    #[inline]
    fn from_real(re: f64) -> Self {
        re
    }
    #[inline]
    fn real_part(self) -> f64 {
        self
    }
    #[inline]
    fn imag_part(self) -> f64 {
        0.0
    }
    #[inline]
    fn abs1(self) -> f64 {
        self.abs()
    }
    #[inline]
    fn abs_sq(self) -> f64 {
        self * self
    }
    #[inline]
    fn mag(self) -> f64 {
        f64::abs(self)
    }
}

impl<R: Real> Scalar for Complex<R> {
    type Real = R;

    #[inline]
    fn conj(self) -> Self {
        Complex::new(self.re, -self.im)
    }
    #[inline]
    fn from_real(re: R) -> Self {
        Complex::new(re, R::zero())
    }
    #[inline]
    fn real_part(self) -> R {
        self.re
    }
    #[inline]
    fn imag_part(self) -> R {
        self.im
    }
    #[inline]
    fn abs1(self) -> R {
        self.re.abs() + self.im.abs()
    }
    #[inline]
    fn abs_sq(self) -> R {
        self.re * self.re + self.im * self.im
    }
    #[inline]
    fn mag(self) -> R {
        self.re.hypot(self.im)
    }
    #[inline]
    fn is_complex_kind() -> bool {
        true
    }
}

/// Double-double real scalar backed by `twofloat::TwoFloat`.
///
/// The newtype exists for the orphan rule: `TwoFloat` is foreign, so the
/// `num_traits` plumbing and [`Real`] have to live on a local wrapper.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TwoFloatReal(pub twofloat::TwoFloat);

impl TwoFloatReal {
    pub fn new(x: f64) -> Self {
        Self(twofloat::TwoFloat::from(x))
    }
}

impl Display for TwoFloatReal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", f64::from(self.0))
    }
}

impl From<f64> for TwoFloatReal {
    fn from(x: f64) -> Self {
        Self::new(x)
    }
}

macro_rules! twofloat_binop {
    ($trait:ident, $fn:ident, $op:tt) => {
        impl std::ops::$trait for TwoFloatReal {
            type Output = Self;
            fn $fn(self, other: Self) -> Self {
                Self(self.0 $op other.0)
            }
        }
    };
}
macro_rules! twofloat_assign {
    ($trait:ident, $fn:ident, $op:tt) => {
        impl std::ops::$trait for TwoFloatReal {
            fn $fn(&mut self, other: Self) {
                self.0 $op other.0;
            }
        }
    };
}

twofloat_binop!(Add, add, +);
twofloat_binop!(Sub, sub, -);
twofloat_binop!(Mul, mul, *);
twofloat_binop!(Div, div, /);
twofloat_binop!(Rem, rem, %);
twofloat_assign!(AddAssign, add_assign, +=);
twofloat_assign!(SubAssign, sub_assign, -=);
twofloat_assign!(MulAssign, mul_assign, *=);
twofloat_assign!(DivAssign, div_assign, /=);
twofloat_assign!(RemAssign, rem_assign, %=);

impl Neg for TwoFloatReal {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl num_traits::Zero for TwoFloatReal {
    fn zero() -> Self {
        Self::new(0.0)
    }
    fn is_zero(&self) -> bool {
        self.0 == twofloat::TwoFloat::from(0.0)
    }
}

impl num_traits::One for TwoFloatReal {
    fn one() -> Self {
        Self::new(1.0)
    }
}

impl Num for TwoFloatReal {
    type FromStrRadixErr = num_traits::ParseFloatError;

    fn from_str_radix(str: &str, radix: u32) -> std::result::Result<Self, Self::FromStrRadixErr> {
        f64::from_str_radix(str, radix).map(Self::new)
    }
}

impl Real for TwoFloatReal {
    fn from_f64(x: f64) -> Self {
        Self::new(x)
    }
    fn to_f64(self) -> f64 {
        f64::from(self.0)
    }
    fn epsilon() -> Self {
        // eps^2 for the double-double representation
        Self::new(f64::EPSILON * f64::EPSILON)
    }
    fn safe_min() -> Self {
        Self::new(f64::MIN_POSITIVE)
    }
    fn sqrt(self) -> Self {
        Self(self.0.sqrt())
    }
    fn abs(self) -> Self {
        Self(self.0.abs())
    }
    fn hypot(self, other: Self) -> Self {
        (self * self + other * other).sqrt()
    }
    fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }
    fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }
    fn is_finite(self) -> bool {
        self.0.is_valid()
    }
}

impl Scalar for TwoFloatReal {
    type Real = TwoFloatReal;

    #[inline]
    fn conj(self) -> Self {
        self
    }
    #[inline]
    fn from_real(re: Self) -> Self {
        re
    }
    #[inline]
    fn real_part(self) -> Self {
        self
    }
    #[inline]
    fn imag_part(self) -> Self {
        Self::new(0.0)
    }
    #[inline]
    fn abs1(self) -> Self {
        Real::abs(self)
    }
    #[inline]
    fn abs_sq(self) -> Self {
        self * self
    }
    #[inline]
    fn mag(self) -> Self {
        Real::abs(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copysign_of() {
        assert_eq!(2.0_f64.copysign_of(-1.0), -2.0);
        assert_eq!((-2.0_f64).copysign_of(3.0), 2.0);
        assert_eq!(2.0_f64.copysign_of(0.0), 2.0);
    }

    #[test]
    fn test_complex_abs1() {
        let z = Complex::new(3.0_f64, -4.0);
        assert_eq!(z.abs1(), 7.0);
        assert_eq!(z.mag(), 5.0);
        assert_eq!(z.abs_sq(), 25.0);
        assert_eq!(Scalar::conj(z), Complex::new(3.0, 4.0));
    }

    #[test]
    fn test_twofloat_real() {
        let a = TwoFloatReal::new(2.0);
        let b = TwoFloatReal::new(8.0);
        assert_eq!((a * b).sqrt().to_f64(), 4.0);
        assert_eq!(Real::abs(-a).to_f64(), 2.0);
        assert!(TwoFloatReal::epsilon() < TwoFloatReal::new(f64::EPSILON));
    }
}
