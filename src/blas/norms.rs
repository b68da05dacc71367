//! Matrix and vector norms.

use ndarray::{ArrayView1, ArrayView2};
use num_traits::{One, Zero};

use crate::scalar::{Real, Scalar};

/// Frobenius norm, accumulated as a scaled sum of squares so that entries far
/// from unit magnitude neither overflow nor vanish.
pub fn frobenius_norm<T: Scalar>(a: &ArrayView2<'_, T>) -> T::Real {
    let mut scale = T::Real::zero();
    let mut ssq = T::Real::one();
    for x in a.iter() {
        for part in [x.real_part(), x.imag_part()] {
            let ax = part.abs();
            if ax > T::Real::zero() {
                if scale < ax {
                    let r = scale / ax;
                    ssq = T::Real::one() + ssq * r * r;
                    scale = ax;
                } else {
                    let r = ax / scale;
                    ssq += r * r;
                }
            }
        }
    }
    scale * ssq.sqrt()
}

/// Euclidean norm of a vector.
pub fn norm2<T: Scalar>(x: &ArrayView1<'_, T>) -> T::Real {
    let mut acc = T::Real::zero();
    for v in x.iter() {
        acc += v.abs_sq();
    }
    acc.sqrt()
}

/// Largest entrywise magnitude.
pub fn max_norm<T: Scalar>(a: &ArrayView2<'_, T>) -> T::Real {
    let mut best = T::Real::zero();
    for x in a.iter() {
        best = best.max(x.mag());
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use num_complex::Complex;

    #[test]
    fn test_frobenius_norm() {
        let a = array![[3.0, 0.0], [0.0, 4.0]];
        assert_abs_diff_eq!(frobenius_norm(&a.view()), 5.0, epsilon = 1e-14);
    }

    #[test]
    fn test_frobenius_norm_extreme_scales() {
        let big = 1e200;
        let a = array![[big, big], [big, big]];
        assert_abs_diff_eq!(
            frobenius_norm(&a.view()) / (2.0 * big),
            1.0,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_complex_norms() {
        let a = array![[Complex::new(3.0, 4.0)]];
        assert_abs_diff_eq!(frobenius_norm(&a.view()), 5.0, epsilon = 1e-14);
        assert_abs_diff_eq!(max_norm(&a.view()), 5.0, epsilon = 1e-14);
        let x = array![Complex::new(0.0, 2.0), Complex::new(1.0, 0.0)];
        assert_abs_diff_eq!(norm2(&x.view()), 5.0_f64.sqrt(), epsilon = 1e-14);
    }
}
