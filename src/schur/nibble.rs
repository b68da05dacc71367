//! Aggressive-early-deflation pass over a trailing window.
//!
//! Takes the Schur decomposition of the trailing `deflation_size` window,
//! checks the deflation spike against each trailing eigenvalue block, and
//! deflates the maximal run of spike-converged blocks off the bottom. The
//! surviving window eigenvalues are reported back as shift candidates. When
//! nothing deflates the window copy is discarded and `H` is left untouched;
//! the candidates are still usable as shifts.

use ndarray::{s, Array2};
use num_complex::Complex;

use super::hessenberg::reduce_window;
use super::util::{apply_left_reflector, apply_right_reflector, reflector};
use super::{HessQrCtrl, HessQrInfo};
use crate::blas::{gemm, Orientation};
use crate::error::Result;
use crate::scalar::{Real, Scalar};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NibbleReport {
    pub num_deflated: usize,
    pub num_shift_candidates: usize,
}

fn sub_ctrl(jw: usize) -> HessQrCtrl {
    HessQrCtrl {
        win_beg: 0,
        win_end: Some(jw as crate::indexing::Int),
        full_triangle: true,
        demand_converged: false,
        progress: false,
        max_iter: None,
    }
}

pub(crate) fn nibble_real<R: Real>(
    h: &mut Array2<R>,
    deflation_size: usize,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<R>>,
    ctrl: &HessQrCtrl,
) -> Result<NibbleReport> {
    let n = h.nrows();
    let (win_beg, win_end) = ctrl.window(n)?;
    let zero = R::zero();
    let one = R::one();
    let ulp = R::epsilon();
    let smlnum = R::safe_min() * (R::from_f64(n as f64) / ulp);

    let jw = deflation_size.min(win_end - win_beg);
    let kwtop = win_end - jw;
    let spike = if kwtop == win_beg {
        zero
    } else {
        h[(kwtop, kwtop - 1)]
    };

    if jw == 1 {
        w[kwtop] = Complex::new(h[(kwtop, kwtop)], zero);
        if spike.abs() <= smlnum.max(ulp * h[(kwtop, kwtop)].abs()) {
            if kwtop > win_beg {
                h[(kwtop, kwtop - 1)] = zero;
            }
            return Ok(NibbleReport {
                num_deflated: 1,
                num_shift_candidates: 0,
            });
        }
        return Ok(NibbleReport {
            num_deflated: 0,
            num_shift_candidates: 1,
        });
    }

    // Schur-decompose a copy of the window.
    let mut t = h.slice(s![kwtop..win_end, kwtop..win_end]).to_owned();
    let mut v = Array2::<R>::eye(jw);
    let mut w_win = vec![Complex::new(zero, zero); jw];
    let sub_info: HessQrInfo = super::aed::qr_real(&mut t, &mut w_win, Some(&mut v), &sub_ctrl(jw))?;
    let infqr = sub_info.num_unconverged;

    // Deflate the trailing run of blocks whose spike contribution is
    // negligible against the block's dominant eigenvalue.
    let mut ns = jw;
    while ns > infqr {
        if ns >= 2 && t[(ns - 1, ns - 2)] != zero {
            let mut foo = t[(ns - 1, ns - 1)].abs()
                + t[(ns - 1, ns - 2)].abs().sqrt() * t[(ns - 2, ns - 1)].abs().sqrt();
            if foo == zero {
                foo = spike.abs();
            }
            let contribution =
                (spike * v[(0, ns - 1)]).abs().max((spike * v[(0, ns - 2)]).abs());
            if contribution <= smlnum.max(ulp * foo) {
                ns -= 2;
            } else {
                break;
            }
        } else {
            let mut foo = t[(ns - 1, ns - 1)].abs();
            if foo == zero {
                foo = spike.abs();
            }
            if (spike * v[(0, ns - 1)]).abs() <= smlnum.max(ulp * foo) {
                ns -= 1;
            } else {
                break;
            }
        }
    }
    let num_deflated = jw - ns;
    let report = NibbleReport {
        num_deflated,
        num_shift_candidates: ns - infqr,
    };
    for (k, &val) in w_win.iter().enumerate() {
        w[kwtop + k] = val;
    }
    if num_deflated == 0 {
        return Ok(report);
    }
    if ctrl.progress {
        log::info!(
            "deflated {} of {} window eigenvalues ({} shift candidates)",
            num_deflated,
            jw,
            report.num_shift_candidates
        );
    }

    // Collapse the spike onto the first column and restore Hessenberg form
    // over the surviving part of the window.
    if ns > 1 && spike != zero {
        let mut u: Vec<R> = (0..ns).map(|j| v[(0, j)]).collect();
        let tau = reflector(&mut u);
        u[0] = one;
        apply_left_reflector(tau, &u, &mut t, 0, 0..jw);
        apply_right_reflector(tau, &u, &mut t, 0..ns, 0);
        apply_right_reflector(tau, &u, &mut v, 0..jw, 0);
        reduce_window(&mut t, 0, ns, Some(&mut v));
    }

    h.slice_mut(s![kwtop..win_end, kwtop..win_end]).assign(&t);
    if kwtop > win_beg {
        h[(kwtop, kwtop - 1)] = if ns == 0 { zero } else { spike * v[(0, 0)] };
    }

    // Propagate the window transformation to the rest of the matrix.
    let i1 = if ctrl.full_triangle { 0 } else { win_beg };
    if kwtop > i1 {
        let block = h.slice(s![i1..kwtop, kwtop..win_end]).to_owned();
        let mut updated = Array2::<R>::zeros((kwtop - i1, jw));
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            one,
            &block.view(),
            &v.view(),
            zero,
            &mut updated.view_mut(),
        )?;
        h.slice_mut(s![i1..kwtop, kwtop..win_end]).assign(&updated);
    }
    if ctrl.full_triangle && win_end < n {
        let block = h.slice(s![kwtop..win_end, win_end..n]).to_owned();
        let mut updated = Array2::<R>::zeros((jw, n - win_end));
        gemm(
            Orientation::Transpose,
            Orientation::Normal,
            one,
            &v.view(),
            &block.view(),
            zero,
            &mut updated.view_mut(),
        )?;
        h.slice_mut(s![kwtop..win_end, win_end..n]).assign(&updated);
    }
    if let Some(z) = z.as_mut() {
        let rows = z.nrows();
        let block = z.slice(s![0..rows, kwtop..win_end]).to_owned();
        let mut updated = Array2::<R>::zeros((rows, jw));
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            one,
            &block.view(),
            &v.view(),
            zero,
            &mut updated.view_mut(),
        )?;
        z.slice_mut(s![0..rows, kwtop..win_end]).assign(&updated);
    }

    Ok(report)
}

pub(crate) fn nibble_complex<R: Real>(
    h: &mut Array2<Complex<R>>,
    deflation_size: usize,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<Complex<R>>>,
    ctrl: &HessQrCtrl,
) -> Result<NibbleReport> {
    let n = h.nrows();
    let (win_beg, win_end) = ctrl.window(n)?;
    let zero = R::zero();
    let one = R::one();
    let czero = Complex::new(zero, zero);
    let cone = Complex::new(one, zero);
    let ulp = R::epsilon();
    let smlnum = R::safe_min() * (R::from_f64(n as f64) / ulp);

    let jw = deflation_size.min(win_end - win_beg);
    let kwtop = win_end - jw;
    let spike = if kwtop == win_beg {
        czero
    } else {
        h[(kwtop, kwtop - 1)]
    };

    if jw == 1 {
        w[kwtop] = h[(kwtop, kwtop)];
        if spike.abs1() <= smlnum.max(ulp * h[(kwtop, kwtop)].abs1()) {
            if kwtop > win_beg {
                h[(kwtop, kwtop - 1)] = czero;
            }
            return Ok(NibbleReport {
                num_deflated: 1,
                num_shift_candidates: 0,
            });
        }
        return Ok(NibbleReport {
            num_deflated: 0,
            num_shift_candidates: 1,
        });
    }

    let mut t = h.slice(s![kwtop..win_end, kwtop..win_end]).to_owned();
    let mut v = Array2::<Complex<R>>::eye(jw);
    let mut w_win = vec![czero; jw];
    let sub_info: HessQrInfo =
        super::aed::qr_complex(&mut t, &mut w_win, Some(&mut v), &sub_ctrl(jw))?;
    let infqr = sub_info.num_unconverged;

    // Complex Schur form is triangular, so blocks are all 1x1 here.
    let mut ns = jw;
    while ns > infqr {
        let mut foo = t[(ns - 1, ns - 1)].abs1();
        if foo == zero {
            foo = spike.abs1();
        }
        if (spike * v[(0, ns - 1)]).abs1() <= smlnum.max(ulp * foo) {
            ns -= 1;
        } else {
            break;
        }
    }
    let num_deflated = jw - ns;
    let report = NibbleReport {
        num_deflated,
        num_shift_candidates: ns - infqr,
    };
    for (k, &val) in w_win.iter().enumerate() {
        w[kwtop + k] = val;
    }
    if num_deflated == 0 {
        return Ok(report);
    }
    if ctrl.progress {
        log::info!(
            "deflated {} of {} window eigenvalues ({} shift candidates)",
            num_deflated,
            jw,
            report.num_shift_candidates
        );
    }

    if ns > 1 && spike != czero {
        let mut u: Vec<Complex<R>> = (0..ns).map(|j| v[(0, j)].conj()).collect();
        let tau = reflector(&mut u);
        u[0] = cone;
        apply_left_reflector(tau, &u, &mut t, 0, 0..jw);
        apply_right_reflector(tau, &u, &mut t, 0..ns, 0);
        apply_right_reflector(tau, &u, &mut v, 0..jw, 0);
        reduce_window(&mut t, 0, ns, Some(&mut v));
    }

    h.slice_mut(s![kwtop..win_end, kwtop..win_end]).assign(&t);
    if kwtop > win_beg {
        h[(kwtop, kwtop - 1)] = if ns == 0 {
            czero
        } else {
            spike * v[(0, 0)].conj()
        };
    }

    let i1 = if ctrl.full_triangle { 0 } else { win_beg };
    if kwtop > i1 {
        let block = h.slice(s![i1..kwtop, kwtop..win_end]).to_owned();
        let mut updated = Array2::<Complex<R>>::zeros((kwtop - i1, jw));
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            cone,
            &block.view(),
            &v.view(),
            czero,
            &mut updated.view_mut(),
        )?;
        h.slice_mut(s![i1..kwtop, kwtop..win_end]).assign(&updated);
    }
    if ctrl.full_triangle && win_end < n {
        let block = h.slice(s![kwtop..win_end, win_end..n]).to_owned();
        let mut updated = Array2::<Complex<R>>::zeros((jw, n - win_end));
        gemm(
            Orientation::Adjoint,
            Orientation::Normal,
            cone,
            &v.view(),
            &block.view(),
            czero,
            &mut updated.view_mut(),
        )?;
        h.slice_mut(s![kwtop..win_end, win_end..n]).assign(&updated);
    }
    if let Some(z) = z.as_mut() {
        let rows = z.nrows();
        let block = z.slice(s![0..rows, kwtop..win_end]).to_owned();
        let mut updated = Array2::<Complex<R>>::zeros((rows, jw));
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            cone,
            &block.view(),
            &v.view(),
            czero,
            &mut updated.view_mut(),
        )?;
        z.slice_mut(s![0..rows, kwtop..win_end]).assign(&updated);
    }

    Ok(report)
}
