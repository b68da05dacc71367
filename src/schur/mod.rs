//! Schur decomposition of Hessenberg matrices
//!
//! The public entry points take an upper-Hessenberg matrix `h`, overwrite it
//! with its (quasi-)triangular Schur factor, collect the eigenvalues into
//! `w`, and optionally accumulate the similarity transformation into `z`.
//! Large windows go through aggressive early deflation; below
//! [`aed::MIN_AED_SIZE`] the classic double-shift (real) or single-shift
//! (complex) iteration runs directly.

pub(crate) mod aed;
pub(crate) mod double_shift;
pub mod hessenberg;
pub(crate) mod nibble;
pub(crate) mod single_shift;
pub(crate) mod sweep;
pub(crate) mod util;

use ndarray::{Array1, Array2};
use num_complex::Complex;

use crate::error::{Error, Result};
use crate::indexing::Int;
use crate::scalar::Real;

/// Knobs for the Hessenberg QR iteration.
#[derive(Debug, Clone, Copy)]
pub struct HessQrCtrl {
    /// First row/column of the window to reduce.
    pub win_beg: Int,
    /// One past the last row/column; `None` means the full matrix.
    pub win_end: Option<Int>,
    /// Update entries outside the window so the full Schur factor (not just
    /// the window's eigenvalues) comes out consistent.
    pub full_triangle: bool,
    /// Fail with [`Error::DidNotConverge`] when the iteration budget runs out
    /// instead of returning the partial result.
    pub demand_converged: bool,
    /// Emit `log` diagnostics while iterating.
    pub progress: bool,
    /// Iteration budget override; `None` uses `max(30, 2 * stale cadence)
    /// * max(10, window size)`.
    pub max_iter: Option<usize>,
}

impl Default for HessQrCtrl {
    fn default() -> Self {
        Self {
            win_beg: 0,
            win_end: None,
            full_triangle: true,
            demand_converged: true,
            progress: false,
            max_iter: None,
        }
    }
}

impl HessQrCtrl {
    pub(crate) fn window(&self, n: usize) -> Result<(usize, usize)> {
        let end = self.win_end.unwrap_or(n as Int);
        if self.win_beg < 0 || end < self.win_beg || end > n as Int {
            return Err(Error::InvalidArgument(format!(
                "window [{}, {}) out of bounds for size {}",
                self.win_beg, end, n
            )));
        }
        Ok((self.win_beg as usize, end as usize))
    }
}

/// What a QR iteration did.
#[derive(Debug, Clone, Copy, Default)]
pub struct HessQrInfo {
    pub num_iterations: usize,
    /// Size of the leading portion of the window still unreduced when the
    /// budget ran out; zero on convergence.
    pub num_unconverged: usize,
}

fn check_square<T>(h: &Array2<T>) -> Result<usize> {
    let (m, n) = h.dim();
    if m != n {
        return Err(Error::InvalidArgument(format!(
            "matrix must be square, got {m}x{n}"
        )));
    }
    Ok(n)
}

fn check_z<T>(n: usize, z: &Option<&mut Array2<T>>) -> Result<()> {
    if let Some(z) = z {
        if z.dim() != (n, n) {
            return Err(Error::InvalidArgument(format!(
                "accumulator must be {n}x{n}, got {}x{}",
                z.nrows(),
                z.ncols()
            )));
        }
    }
    Ok(())
}

fn prepare_w<R: Real>(n: usize, w: &mut Array1<Complex<R>>) {
    if w.len() != n {
        *w = Array1::from_elem(n, Complex::new(R::zero(), R::zero()));
    }
}

fn finish(info: HessQrInfo, ctrl: &HessQrCtrl) -> Result<HessQrInfo> {
    if ctrl.demand_converged && info.num_unconverged > 0 {
        Err(Error::DidNotConverge {
            num_unconverged: info.num_unconverged,
        })
    } else {
        Ok(info)
    }
}

/// Schur decomposition of a real upper-Hessenberg matrix.
///
/// On success `h` is quasi-upper-triangular (1x1 and standardized 2x2
/// diagonal blocks), `w` holds the eigenvalues with conjugate pairs adjacent,
/// and `z`, if given, has been multiplied on the right by the accumulated
/// orthogonal factor.
pub fn hessenberg_schur<R: Real>(
    h: &mut Array2<R>,
    w: &mut Array1<Complex<R>>,
    z: Option<&mut Array2<R>>,
    ctrl: &HessQrCtrl,
) -> Result<HessQrInfo> {
    let n = check_square(h)?;
    check_z(n, &z)?;
    ctrl.window(n)?;
    prepare_w(n, w);
    let info = aed::qr_real(h, w.as_slice_mut().ok_or_else(non_contiguous)?, z, ctrl)?;
    finish(info, ctrl)
}

/// Schur decomposition of a complex upper-Hessenberg matrix.
pub fn hessenberg_schur_complex<R: Real>(
    h: &mut Array2<Complex<R>>,
    w: &mut Array1<Complex<R>>,
    z: Option<&mut Array2<Complex<R>>>,
    ctrl: &HessQrCtrl,
) -> Result<HessQrInfo> {
    let n = check_square(h)?;
    check_z(n, &z)?;
    ctrl.window(n)?;
    prepare_w(n, w);
    let info = aed::qr_complex(h, w.as_slice_mut().ok_or_else(non_contiguous)?, z, ctrl)?;
    finish(info, ctrl)
}

fn non_contiguous() -> Error {
    Error::InvalidArgument("eigenvalue buffer must be contiguous".to_string())
}
