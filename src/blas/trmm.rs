//! Triangular matrix product.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{shape_mismatch, LeftOrRight, Orientation, UnitOrNonUnit, UpperOrLower};
use crate::error::Result;
use crate::scalar::Scalar;

/// `B := alpha * op(A) * B` (left) or `B := alpha * B * op(A)` (right), with
/// `A` triangular. Done in place; the update order ensures entries are read
/// before they are overwritten.
pub fn trmm<T: Scalar>(
    side: LeftOrRight,
    uplo: UpperOrLower,
    orient: Orientation,
    diag: UnitOrNonUnit,
    alpha: T,
    a: &ArrayView2<'_, T>,
    b: &mut ArrayViewMut2<'_, T>,
) -> Result<()> {
    let (m, n) = b.dim();
    let k = match side {
        LeftOrRight::Left => m,
        LeftOrRight::Right => n,
    };
    if a.dim() != (k, k) {
        return Err(shape_mismatch(
            "trmm",
            format!("A is {}x{}, needs {}x{} for this side", a.nrows(), a.ncols(), k, k),
        ));
    }
    let eff = match orient {
        Orientation::Normal => uplo,
        _ => uplo.flipped(),
    };
    let diag_entry = |i: usize| match diag {
        UnitOrNonUnit::Unit => T::one(),
        UnitOrNonUnit::NonUnit => orient.entry(a, i, i),
    };

    match (side, eff) {
        (LeftOrRight::Left, UpperOrLower::Lower) => {
            // Row i of the product reads rows <= i of B, so sweep bottom-up.
            for j in 0..n {
                for i in (0..m).rev() {
                    let mut acc = diag_entry(i) * b[(i, j)];
                    for l in 0..i {
                        acc += orient.entry(a, i, l) * b[(l, j)];
                    }
                    b[(i, j)] = alpha * acc;
                }
            }
        }
        (LeftOrRight::Left, UpperOrLower::Upper) => {
            for j in 0..n {
                for i in 0..m {
                    let mut acc = diag_entry(i) * b[(i, j)];
                    for l in i + 1..m {
                        acc += orient.entry(a, i, l) * b[(l, j)];
                    }
                    b[(i, j)] = alpha * acc;
                }
            }
        }
        (LeftOrRight::Right, UpperOrLower::Upper) => {
            // Column j of the product reads columns <= j of B, right to left.
            for i in 0..m {
                for j in (0..n).rev() {
                    let mut acc = b[(i, j)] * diag_entry(j);
                    for l in 0..j {
                        acc += b[(i, l)] * orient.entry(a, l, j);
                    }
                    b[(i, j)] = alpha * acc;
                }
            }
        }
        (LeftOrRight::Right, UpperOrLower::Lower) => {
            for i in 0..m {
                for j in 0..n {
                    let mut acc = b[(i, j)] * diag_entry(j);
                    for l in j + 1..n {
                        acc += b[(i, l)] * orient.entry(a, l, j);
                    }
                    b[(i, j)] = alpha * acc;
                }
            }
        }
    }
    Ok(())
}
