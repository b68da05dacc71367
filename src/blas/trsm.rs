//! Triangular solve with multiple right-hand sides.

use ndarray::{ArrayView2, ArrayViewMut2};

use super::{shape_mismatch, LeftOrRight, Orientation, UnitOrNonUnit, UpperOrLower};
use crate::error::Result;
use crate::scalar::Scalar;

/// Solve `op(A) * X = alpha * B` (left) or `X * op(A) = alpha * B` (right)
/// in place, overwriting `B` with `X`. `A` is triangular with the given fill;
/// only that triangle (and, for non-unit, the diagonal) is referenced. The
/// diagonal is not tested for singularity.
pub fn trsm<T: Scalar>(
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
            "trsm",
            format!("A is {}x{}, needs {}x{} for this side", a.nrows(), a.ncols(), k, k),
        ));
    }
    // Transposition flips which triangle op(A) occupies.
    let eff = match orient {
        Orientation::Normal => uplo,
        _ => uplo.flipped(),
    };
    b.mapv_inplace(|x| alpha * x);

    match (side, eff) {
        (LeftOrRight::Left, UpperOrLower::Lower) => {
            for j in 0..n {
                for i in 0..m {
                    let mut acc = b[(i, j)];
                    for l in 0..i {
                        acc -= orient.entry(a, i, l) * b[(l, j)];
                    }
                    if let UnitOrNonUnit::NonUnit = diag {
                        acc = acc / orient.entry(a, i, i);
                    }
                    b[(i, j)] = acc;
                }
            }
        }
        (LeftOrRight::Left, UpperOrLower::Upper) => {
            for j in 0..n {
                for i in (0..m).rev() {
                    let mut acc = b[(i, j)];
                    for l in i + 1..m {
                        acc -= orient.entry(a, i, l) * b[(l, j)];
                    }
                    if let UnitOrNonUnit::NonUnit = diag {
                        acc = acc / orient.entry(a, i, i);
                    }
                    b[(i, j)] = acc;
                }
            }
        }
        (LeftOrRight::Right, UpperOrLower::Upper) => {
            // X op(A) = B column by column: column j of X depends on earlier
            // columns of X through rows l < j of op(A).
            for j in 0..n {
                for i in 0..m {
                    let mut acc = b[(i, j)];
                    for l in 0..j {
                        acc -= b[(i, l)] * orient.entry(a, l, j);
                    }
                    if let UnitOrNonUnit::NonUnit = diag {
                        acc = acc / orient.entry(a, j, j);
                    }
                    b[(i, j)] = acc;
                }
            }
        }
        (LeftOrRight::Right, UpperOrLower::Lower) => {
            for j in (0..n).rev() {
                for i in 0..m {
                    let mut acc = b[(i, j)];
                    for l in j + 1..n {
                        acc -= b[(i, l)] * orient.entry(a, l, j);
                    }
                    if let UnitOrNonUnit::NonUnit = diag {
                        acc = acc / orient.entry(a, j, j);
                    }
                    b[(i, j)] = acc;
                }
            }
        }
    }
    Ok(())
}
