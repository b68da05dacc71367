//! Hermitian rank-k and rank-2k updates.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{shape_mismatch, Orientation, UpperOrLower};
use crate::error::Result;
use crate::scalar::Scalar;

fn in_triangle(uplo: UpperOrLower, i: usize, j: usize) -> bool {
    match uplo {
        UpperOrLower::Upper => j >= i,
        UpperOrLower::Lower => j <= i,
    }
}

/// `C := alpha * A * A^H + beta * C` (`Normal`) or
/// `C := alpha * A^H * A + beta * C` (`Adjoint`), touching only the stored
/// triangle of `C`. Real `alpha`/`beta` keep the result Hermitian.
pub fn herk<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T::Real,
    a: &ArrayView2<'_, T>,
    beta: T::Real,
    c: &mut ArrayViewMut2<'_, T>,
) -> Result<()> {
    if orient == Orientation::Transpose {
        return Err(shape_mismatch(
            "herk",
            "orientation must be Normal or Adjoint".to_string(),
        ));
    }
    let (n, k) = orient.dims(a.dim());
    if c.dim() != (n, n) {
        return Err(shape_mismatch(
            "herk",
            format!("op(A) is {}x{}, C is {}x{}", n, k, c.nrows(), c.ncols()),
        ));
    }
    let alpha = T::from_real(alpha);
    let beta = T::from_real(beta);
    for i in 0..n {
        for j in 0..n {
            if !in_triangle(uplo, i, j) {
                continue;
            }
            let mut acc = T::zero();
            for l in 0..k {
                acc += orient.entry(a, i, l) * orient.entry(a, j, l).conj();
            }
            c[(i, j)] = alpha * acc + beta * c[(i, j)];
        }
    }
    Ok(())
}

/// `C := alpha * A * B^H + conj(alpha) * B * A^H + beta * C` (`Normal`) or
/// the `A^H * B` form (`Adjoint`), touching only the stored triangle of `C`.
pub fn her2k<T: Scalar>(
    uplo: UpperOrLower,
    orient: Orientation,
    alpha: T,
    a: &ArrayView2<'_, T>,
    b: &ArrayView2<'_, T>,
    beta: T::Real,
    c: &mut ArrayViewMut2<'_, T>,
) -> Result<()> {
    if orient == Orientation::Transpose {
        return Err(shape_mismatch(
            "her2k",
            "orientation must be Normal or Adjoint".to_string(),
        ));
    }
    let (n, k) = orient.dims(a.dim());
    if orient.dims(b.dim()) != (n, k) || c.dim() != (n, n) {
        return Err(shape_mismatch(
            "her2k",
            format!(
                "op(A) is {}x{}, op(B) is {}x{}, C is {}x{}",
                n,
                k,
                orient.dims(b.dim()).0,
                orient.dims(b.dim()).1,
                c.nrows(),
                c.ncols()
            ),
        ));
    }
    let beta = T::from_real(beta);
    for i in 0..n {
        for j in 0..n {
            if !in_triangle(uplo, i, j) {
                continue;
            }
            let mut ab = T::zero();
            let mut ba = T::zero();
            for l in 0..k {
                ab += orient.entry(a, i, l) * orient.entry(b, j, l).conj();
                ba += orient.entry(b, i, l) * orient.entry(a, j, l).conj();
            }
            c[(i, j)] = alpha * ab + alpha.conj() * ba + beta * c[(i, j)];
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use num_complex::Complex;

    #[test]
    fn test_herk_lower_only_touches_triangle() {
        let a = array![[1.0, 2.0], [0.0, 1.0]];
        let mut c = array![[0.0, 99.0], [0.0, 0.0]];
        herk(
            UpperOrLower::Lower,
            Orientation::Normal,
            1.0,
            &a.view(),
            0.0,
            &mut c.view_mut(),
        )
        .unwrap();
        // A A^T = [[5, 2], [2, 1]]
        assert_abs_diff_eq!(c[(0, 0)], 5.0);
        assert_abs_diff_eq!(c[(1, 0)], 2.0);
        assert_abs_diff_eq!(c[(1, 1)], 1.0);
        assert_abs_diff_eq!(c[(0, 1)], 99.0);
    }

    #[test]
    fn test_herk_adjoint_complex_real_diagonal() {
        let a = array![[Complex::new(1.0, 2.0)], [Complex::new(0.0, -1.0)]];
        let mut c = array![[Complex::new(0.0, 0.0)]];
        herk(
            UpperOrLower::Upper,
            Orientation::Adjoint,
            1.0,
            &a.view(),
            0.0,
            &mut c.view_mut(),
        )
        .unwrap();
        // |1+2i|^2 + |-i|^2 = 6
        assert_abs_diff_eq!(c[(0, 0)].re, 6.0);
        assert_abs_diff_eq!(c[(0, 0)].im, 0.0);
    }

    #[test]
    fn test_her2k_symmetric_result() {
        let a = array![[1.0, 0.0], [2.0, 1.0]];
        let b = array![[0.5, 1.0], [1.0, 0.0]];
        let mut lower = ndarray::Array2::<f64>::zeros((2, 2));
        let mut upper = ndarray::Array2::<f64>::zeros((2, 2));
        her2k(
            UpperOrLower::Lower,
            Orientation::Normal,
            1.0,
            &a.view(),
            &b.view(),
            0.0,
            &mut lower.view_mut(),
        )
        .unwrap();
        her2k(
            UpperOrLower::Upper,
            Orientation::Normal,
            1.0,
            &a.view(),
            &b.view(),
            0.0,
            &mut upper.view_mut(),
        )
        .unwrap();
        assert_abs_diff_eq!(lower[(1, 0)], upper[(0, 1)]);
        assert_abs_diff_eq!(lower[(0, 0)], upper[(0, 0)]);
        assert_abs_diff_eq!(lower[(1, 1)], upper[(1, 1)]);
    }
}
