//! General matrix-matrix product.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{shape_mismatch, Orientation};
use crate::error::Result;
use crate::scalar::Scalar;

/// `C := alpha * op(A) * op(B) + beta * C`.
pub fn gemm<T: Scalar>(
    orient_a: Orientation,
    orient_b: Orientation,
    alpha: T,
    a: &ArrayView2<'_, T>,
    b: &ArrayView2<'_, T>,
    beta: T,
    c: &mut ArrayViewMut2<'_, T>,
) -> Result<()> {
    let (m, ka) = orient_a.dims(a.dim());
    let (kb, n) = orient_b.dims(b.dim());
    if ka != kb || c.dim() != (m, n) {
        return Err(shape_mismatch(
            "gemm",
            format!(
                "op(A) is {}x{}, op(B) is {}x{}, C is {}x{}",
                m,
                ka,
                kb,
                n,
                c.nrows(),
                c.ncols()
            ),
        ));
    }
    for i in 0..m {
        for j in 0..n {
            let mut acc = T::zero();
            for k in 0..ka {
                acc += orient_a.entry(a, i, k) * orient_b.entry(b, k, j);
            }
            c[(i, j)] = alpha * acc + beta * c[(i, j)];
        }
    }
    Ok(())
}
