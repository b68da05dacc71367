//! General matrix-vector product.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1};

use super::{shape_mismatch, Orientation};
use crate::error::Result;
use crate::scalar::Scalar;

/// `y := alpha * op(A) * x + beta * y`.
pub fn gemv<T: Scalar>(
    orient: Orientation,
    alpha: T,
    a: &ArrayView2<'_, T>,
    x: &ArrayView1<'_, T>,
    beta: T,
    y: &mut ArrayViewMut1<'_, T>,
) -> Result<()> {
    let (m, n) = orient.dims(a.dim());
    if x.len() != n || y.len() != m {
        return Err(shape_mismatch(
            "gemv",
            format!(
                "op(A) is {}x{}, x has length {}, y has length {}",
                m,
                n,
                x.len(),
                y.len()
            ),
        ));
    }
    for i in 0..m {
        let mut acc = T::zero();
        for j in 0..n {
            acc += orient.entry(a, i, j) * x[j];
        }
        y[i] = alpha * acc + beta * y[i];
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_gemv_normal_and_transpose() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let x = array![1.0, -1.0];
        let mut y = array![10.0, 10.0, 10.0];
        gemv(
            Orientation::Normal,
            1.0,
            &a.view(),
            &x.view(),
            0.5,
            &mut y.view_mut(),
        )
        .unwrap();
        assert_abs_diff_eq!(y[0], -1.0 + 5.0);
        assert_abs_diff_eq!(y[2], -1.0 + 5.0);

        let xt = array![1.0, 0.0, -1.0];
        let mut yt = array![0.0, 0.0];
        gemv(
            Orientation::Transpose,
            1.0,
            &a.view(),
            &xt.view(),
            0.0,
            &mut yt.view_mut(),
        )
        .unwrap();
        assert_abs_diff_eq!(yt[0], 1.0 - 5.0);
        assert_abs_diff_eq!(yt[1], 2.0 - 6.0);
    }

    #[test]
    fn test_gemv_shape_mismatch() {
        let a = ndarray::Array2::<f64>::zeros((3, 2));
        let x = ndarray::Array1::<f64>::zeros(3);
        let mut y = ndarray::Array1::<f64>::zeros(3);
        assert!(gemv(
            Orientation::Normal,
            1.0,
            &a.view(),
            &x.view(),
            0.0,
            &mut y.view_mut(),
        )
        .is_err());
    }
}
