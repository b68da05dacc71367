//! Shared numerical helpers for the QR iterations.

use ndarray::Array2;
use num_complex::Complex;
use num_traits::{One, Zero};

use crate::scalar::{Real, Scalar};

/// Build an elementary reflector `Q = I - tau v v^H` with `Q^H x = [beta, 0..]`.
///
/// On entry `x` holds the column to annihilate; on exit `x[0]` is `beta` and
/// `x[1..]` the reflector tail (the leading entry of `v` is an implicit one).
/// Returns `tau`, which is zero exactly when the column needs no reflection.
pub(crate) fn reflector<T: Scalar>(x: &mut [T]) -> T {
    let alpha = x[0];
    let mut tail_sq = T::Real::zero();
    for v in &x[1..] {
        tail_sq += v.abs_sq();
    }
    if tail_sq == T::Real::zero() && alpha.imag_part() == T::Real::zero() {
        return T::zero();
    }
    let norm = (tail_sq + alpha.abs_sq()).sqrt();
    let beta = -norm.copysign_of(alpha.real_part());
    let tau = (T::from_real(beta) - alpha) / T::from_real(beta);
    let scale = T::one() / (alpha - T::from_real(beta));
    for v in &mut x[1..] {
        *v = *v * scale;
    }
    x[0] = T::from_real(beta);
    tau
}

/// Apply `Q^H` from the left to `a[row.., cols]`, where `Q = I - tau v v^H`
/// and `v[0] == 1`.
pub(crate) fn apply_left_reflector<T: Scalar>(
    tau: T,
    v: &[T],
    a: &mut Array2<T>,
    row: usize,
    cols: std::ops::Range<usize>,
) {
    if tau == T::zero() {
        return;
    }
    let ct = tau.conj();
    for j in cols {
        let mut s = T::zero();
        for (i, vi) in v.iter().enumerate() {
            s += vi.conj() * a[(row + i, j)];
        }
        s = ct * s;
        for (i, vi) in v.iter().enumerate() {
            a[(row + i, j)] = a[(row + i, j)] - s * *vi;
        }
    }
}

/// Apply `Q` from the right to `a[rows, col..]`.
pub(crate) fn apply_right_reflector<T: Scalar>(
    tau: T,
    v: &[T],
    a: &mut Array2<T>,
    rows: std::ops::Range<usize>,
    col: usize,
) {
    if tau == T::zero() {
        return;
    }
    for i in rows {
        let mut s = T::zero();
        for (j, vj) in v.iter().enumerate() {
            s += a[(i, col + j)] * *vj;
        }
        s = tau * s;
        for (j, vj) in v.iter().enumerate() {
            a[(i, col + j)] = a[(i, col + j)] - s * vj.conj();
        }
    }
}

/// Principal square root of a complex number, from real primitives.
pub(crate) fn complex_sqrt<R: Real>(z: Complex<R>) -> Complex<R> {
    let half = R::from_f64(0.5);
    let mag = z.re.hypot(z.im);
    if mag == R::zero() {
        return Complex::new(R::zero(), R::zero());
    }
    let t = ((mag + z.re.abs()) * half).sqrt();
    if z.re >= R::zero() {
        Complex::new(t, z.im / (t + t))
    } else {
        Complex::new(z.im.abs() / (t + t), t.copysign_of(z.im))
    }
}

/// Standardize a real 2x2 block into Schur form.
///
/// Overwrites `[[a, b], [c, d]]` with the rotated block, which is either upper
/// triangular (two real eigenvalues) or has `a == d` and `b*c < 0` (a complex
/// conjugate pair). Returns the rotation `(cs, sn)` and both eigenvalues.
pub(crate) fn two_by_two_schur<R: Real>(
    a: &mut R,
    b: &mut R,
    c: &mut R,
    d: &mut R,
) -> ((R, R), (Complex<R>, Complex<R>)) {
    let zero = R::zero();
    let one = R::one();
    let half = R::from_f64(0.5);
    let eps = R::epsilon();
    let four = R::from_f64(4.0);
    // Thresholds for the rescaling loop on nearly equal diagonals.
    let safmn2 = (R::safe_min() / eps).sqrt();
    let safmx2 = one / safmn2;

    let (mut cs, mut sn);
    if *c == zero {
        cs = one;
        sn = zero;
    } else if *b == zero {
        // Swap rows and columns.
        cs = zero;
        sn = one;
        let temp = *d;
        *d = *a;
        *a = temp;
        *b = -*c;
        *c = zero;
    } else if (*a - *d) == zero && one.copysign_of(*b) != one.copysign_of(*c) {
        // Signs of b and c differ with equal diagonal: already standardized.
        cs = one;
        sn = zero;
    } else {
        let mut temp = *a - *d;
        let p = half * temp;
        let bcmax = b.abs().max(c.abs());
        let bcmis = b.abs().min(c.abs()) * one.copysign_of(*b) * one.copysign_of(*c);
        let scale = p.abs().max(bcmax);
        let mut z = (p / scale) * p + (bcmax / scale) * bcmis;
        if z >= four * eps {
            // Real eigenvalues: compute a (i.e. dd) and d (i.e. aa).
            z = p + (scale.sqrt() * z.sqrt()).copysign_of(p);
            *a = *d + z;
            *d = *d - (bcmax / z) * bcmis;
            let tau = c.hypot(z);
            cs = z / tau;
            sn = *c / tau;
            *b = *b - *c;
            *c = zero;
        } else {
            // Complex or nearly equal real eigenvalues: make the diagonal
            // entries equal first.
            let mut sigma = *b + *c;
            let mut count = 0;
            loop {
                count += 1;
                let scale = temp.abs().max(sigma.abs());
                if scale >= safmx2 {
                    sigma = sigma * safmn2;
                    temp = temp * safmn2;
                    if count <= 20 {
                        continue;
                    }
                }
                if scale <= safmn2 {
                    sigma = sigma * safmx2;
                    temp = temp * safmx2;
                    if count <= 20 {
                        continue;
                    }
                }
                break;
            }
            let p = half * temp;
            let tau = sigma.hypot(temp);
            cs = (half * (one + sigma.abs() / tau)).sqrt();
            sn = -(p / (tau * cs)) * one.copysign_of(sigma);
            // [aa bb; cc dd] = [a b; c d] [cs -sn; sn cs]
            let aa = *a * cs + *b * sn;
            let bb = -*a * sn + *b * cs;
            let cc = *c * cs + *d * sn;
            let dd = -*c * sn + *d * cs;
            // [a b; c d] = [cs sn; -sn cs] [aa bb; cc dd]
            *a = aa * cs + cc * sn;
            *b = bb * cs + dd * sn;
            *c = -aa * sn + cc * cs;
            *d = -bb * sn + dd * cs;
            temp = half * (*a + *d);
            *a = temp;
            *d = temp;
            if *c != zero {
                if *b != zero {
                    if one.copysign_of(*b) == one.copysign_of(*c) {
                        // Real eigenvalues after all: reduce to triangular.
                        let sab = b.abs().sqrt();
                        let sac = c.abs().sqrt();
                        let p = (sab * sac).copysign_of(*c);
                        let tau = one / (*b + *c).abs().sqrt();
                        *a = temp + p;
                        *d = temp - p;
                        *b = *b - *c;
                        *c = zero;
                        let cs1 = sab * tau;
                        let sn1 = sac * tau;
                        let old_cs = cs;
                        cs = old_cs * cs1 - sn * sn1;
                        sn = old_cs * sn1 + sn * cs1;
                    }
                } else {
                    *b = -*c;
                    *c = zero;
                    let old_cs = cs;
                    cs = -sn;
                    sn = old_cs;
                }
            }
        }
    }

    let (w1, w2) = if *c == zero {
        (Complex::new(*a, zero), Complex::new(*d, zero))
    } else {
        let im = b.abs().sqrt() * c.abs().sqrt();
        (Complex::new(*a, im), Complex::new(*d, -im))
    };
    ((cs, sn), (w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use num_complex::ComplexFloat;

    #[test]
    fn test_reflector_annihilates_tail() {
        let mut x = vec![3.0_f64, 4.0];
        let tau = reflector(&mut x);
        // beta = -sign(3) * 5
        assert_abs_diff_eq!(x[0], -5.0, epsilon = 1e-14);
        // Apply Q to the original column and check it maps to [beta, 0].
        let v = [1.0, x[1]];
        let mut a = array![[3.0], [4.0]];
        apply_left_reflector(tau, &v, &mut a, 0, 0..1);
        assert_abs_diff_eq!(a[(0, 0)], -5.0, epsilon = 1e-14);
        assert_abs_diff_eq!(a[(1, 0)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_reflector_zero_tail_is_identity() {
        let mut x = vec![2.0_f64, 0.0, 0.0];
        let tau = reflector(&mut x);
        assert_eq!(tau, 0.0);
        assert_eq!(x[0], 2.0);
    }

    #[test]
    fn test_reflector_complex_realifies_leading_entry() {
        let mut x = vec![Complex::new(1.0, 2.0), Complex::new(0.5, -0.5)];
        let tau = reflector(&mut x);
        let beta = x[0];
        assert_abs_diff_eq!(beta.im, 0.0, epsilon = 1e-14);
        let v = [Complex::new(1.0, 0.0), x[1]];
        let mut a = array![[Complex::new(1.0, 2.0)], [Complex::new(0.5, -0.5)]];
        apply_left_reflector(tau, &v, &mut a, 0, 0..1);
        assert_abs_diff_eq!(a[(0, 0)].re, beta.re, epsilon = 1e-14);
        assert_abs_diff_eq!(a[(0, 0)].im, 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(a[(1, 0)].abs(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_complex_sqrt_branches() {
        for z in [
            Complex::new(4.0, 0.0),
            Complex::new(-4.0, 0.0),
            Complex::new(3.0, -4.0),
            Complex::new(-3.0, 4.0),
            Complex::new(0.0, 0.0),
        ] {
            let s = complex_sqrt(z);
            let back = s * s;
            assert_abs_diff_eq!(back.re, z.re, epsilon = 1e-12);
            assert_abs_diff_eq!(back.im, z.im, epsilon = 1e-12);
            assert!(s.re >= 0.0);
        }
    }

    #[test]
    fn test_two_by_two_schur_complex_pair() {
        let (mut a, mut b, mut c, mut d) = (1.0_f64, 2.0, -2.0, 1.0);
        let ((cs, sn), (w1, w2)) = two_by_two_schur(&mut a, &mut b, &mut c, &mut d);
        assert_abs_diff_eq!(cs * cs + sn * sn, 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(a, d, epsilon = 1e-14);
        assert!(b * c < 0.0);
        assert_abs_diff_eq!(w1.re, 1.0, epsilon = 1e-14);
        assert_abs_diff_eq!(w1.im, 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(w2.im, -2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_two_by_two_schur_real_eigenvalues() {
        let (mut a, mut b, mut c, mut d) = (3.0_f64, 1.0, 1.0, 1.0);
        let ((cs, sn), (w1, w2)) = two_by_two_schur(&mut a, &mut b, &mut c, &mut d);
        assert_abs_diff_eq!(cs * cs + sn * sn, 1.0, epsilon = 1e-14);
        assert_eq!(c, 0.0);
        assert_eq!(w1.im, 0.0);
        assert_eq!(w2.im, 0.0);
        // Eigenvalues of [[3,1],[1,1]] are 2 +/- sqrt(2).
        let r = 2.0_f64.sqrt();
        assert_abs_diff_eq!(w1.re.max(w2.re), 2.0 + r, epsilon = 1e-12);
        assert_abs_diff_eq!(w1.re.min(w2.re), 2.0 - r, epsilon = 1e-12);
    }
}
