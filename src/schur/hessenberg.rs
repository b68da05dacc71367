//! Reduction to upper-Hessenberg form by Householder similarity transforms.

use ndarray::Array2;

use super::util::{apply_left_reflector, apply_right_reflector, reflector};
use crate::error::Result;
use crate::scalar::Scalar;

/// Reduce `a` to upper-Hessenberg form, optionally accumulating the
/// orthogonal/unitary factor into `q` (right-multiplied, so a `q` primed with
/// the identity ends up holding the factor itself).
pub fn reduce<T: Scalar>(a: &mut Array2<T>, q: Option<&mut Array2<T>>) -> Result<()> {
    let n = super::check_square(a)?;
    super::check_z(n, &q)?;
    reduce_window(a, 0, n, q);
    Ok(())
}

/// Reduce rows and columns `[beg, end)` of `a` to upper-Hessenberg form.
///
/// Rows below `end` must be zero in columns `beg..end` (the matrix is assumed
/// already reduced outside the window), mirroring the usual `ilo`/`ihi`
/// contract.
pub(crate) fn reduce_window<T: Scalar>(
    a: &mut Array2<T>,
    beg: usize,
    end: usize,
    q: Option<&mut Array2<T>>,
) {
    let ncols = a.ncols();
    let mut q = q;
    if end < beg + 3 {
        return;
    }
    for j in beg..end - 2 {
        let mut v: Vec<T> = (j + 1..end).map(|i| a[(i, j)]).collect();
        let tau = reflector(&mut v);
        let beta = v[0];
        v[0] = T::one();
        a[(j + 1, j)] = beta;
        for i in j + 2..end {
            a[(i, j)] = T::zero();
        }
        apply_left_reflector(tau, &v, a, j + 1, j + 1..ncols);
        apply_right_reflector(tau, &v, a, 0..end, j + 1);
        if let Some(q) = q.as_mut() {
            let rows = q.nrows();
            apply_right_reflector(tau, &v, q, 0..rows, j + 1);
        }
    }
}
