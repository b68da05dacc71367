//! Multishift QR driver with aggressive early deflation.
//!
//! Top-level iteration for large windows: pick a trailing deflation window,
//! try to deflate converged eigenvalues out of it, and spend the surviving
//! window eigenvalues as shifts for a small-bulge sweep. Matrices below
//! [`MIN_AED_SIZE`] are handed to the classic double-shift (real) or
//! single-shift (complex) iteration instead.
//!
//! The deflation strategy follows Braman, Byers, and Mathias, "The multishift
//! QR algorithm. Part II: Aggressive Early Deflation", SIAM J. Matrix Anal.
//! Appl. 23(4), with the more conservative nearby-diagonal deflation test
//! used in practice.

use ndarray::{s, Array2};
use num_complex::Complex;

use super::util::two_by_two_schur;
use super::{double_shift, nibble, single_shift, sweep, HessQrCtrl, HessQrInfo};
use crate::error::Result;
use crate::indexing::Int;
use crate::scalar::{Real, Scalar};

/// Smallest matrix the deflation machinery pays off for.
pub(crate) const MIN_AED_SIZE: usize = 75;

const NUM_STALE_ITER_BEFORE_EXCEPTIONAL: usize = 5;

/// Shift counts staged by window size, following LAPACK's IPARMQ except that
/// windows of at least 6000 keep growing instead of pinning to 256.
fn recommended_shifts(n: usize, win_size: usize) -> usize {
    let log2 = (win_size.max(2) as f64).log2();
    let mut num = if win_size < 30 {
        2
    } else if win_size < 60 {
        4
    } else if win_size < 150 {
        10
    } else if win_size < 590 {
        10usize.max(win_size / log2 as usize)
    } else if win_size < 3000 {
        64
    } else if win_size < 6000 {
        128
    } else {
        256usize.max(win_size / (2.0 * log2) as usize)
    };
    num = num.min(win_size).min((n + 6) / 9);
    2usize.max(num - num % 2)
}

fn recommended_deflation(n: usize, win_size: usize, num_shifts: usize) -> usize {
    let mut size = if win_size <= 500 {
        num_shifts
    } else {
        (3 * num_shifts) / 2
    };
    size = size.min(win_size).min((n - 1) / 3);
    2usize.max(size - size % 2)
}

/// Skip the sweep when at least 14% of the window deflated.
fn sufficient_deflation(deflation_size: usize) -> usize {
    (14 * deflation_size) / 100
}

/// Reorder shifts so that each consecutive pair is either a complex-conjugate
/// pair or two real shifts. Conjugate partners arrive adjacent from the Schur
/// factorization; stray real shifts are paired up in encounter order.
fn pair_shifts<R: Real>(w: &mut [Complex<R>]) {
    let n = w.len();
    let zero = R::zero();
    let mut i = 0;
    while i + 1 < n {
        if w[i].im == zero && w[i + 1].im != zero {
            let mut j = i + 2;
            while j < n && w[j].im != zero {
                j += 1;
            }
            if j == n {
                break;
            }
            w.swap(i + 1, j);
        }
        i += 2;
    }
}

/// When only two candidates remain and the trailing one is real, use a single
/// shift twice: whichever candidate's real part lies closer to the
/// bottom-right window entry.
fn collapse_shift_pair<R: Real>(pair: &mut [Complex<R>], corner: Complex<R>) {
    let zero = R::zero();
    if (Complex::new(pair[1].re, zero) - corner).mag()
        < (Complex::new(pair[0].re, zero) - corner).mag()
    {
        pair[0] = pair[1];
    } else {
        pair[1] = pair[0];
    }
}

fn sub_window(ctrl: &HessQrCtrl, win_beg: usize, win_end: usize) -> HessQrCtrl {
    HessQrCtrl {
        win_beg: win_beg as Int,
        win_end: Some(win_end as Int),
        ..*ctrl
    }
}

fn harvest_ctrl(num_shifts: usize) -> HessQrCtrl {
    HessQrCtrl {
        win_beg: 0,
        win_end: Some(num_shifts as Int),
        full_triangle: false,
        demand_converged: false,
        progress: false,
        max_iter: None,
    }
}

pub(crate) fn qr_real<R: Real>(
    h: &mut Array2<R>,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<R>>,
    ctrl: &HessQrCtrl,
) -> Result<HessQrInfo> {
    let n = h.nrows();
    if n < MIN_AED_SIZE {
        return double_shift::qr_real(h, w, z, ctrl);
    }
    let (win_beg, mut win_end) = ctrl.window(n)?;
    let win_size = win_end - win_beg;
    let zero = R::zero();
    let except_shift0 = R::from_f64(4.0 / 3.0);
    let except_shift1 = R::from_f64(-7.0 / 16.0);
    let mut info = HessQrInfo::default();

    let num_shifts_rec = recommended_shifts(n, win_size);
    let deflation_rec = recommended_deflation(n, win_size, num_shifts_rec);
    if ctrl.progress {
        log::info!(
            "recommending {} shifts and a deflation window of size {}",
            num_shifts_rec,
            deflation_rec
        );
    }
    let mut deflation_size = deflation_rec;

    let stale = NUM_STALE_ITER_BEFORE_EXCEPTIONAL;
    let max_iter = ctrl
        .max_iter
        .unwrap_or(30usize.max(2 * stale) * 10usize.max(win_size));
    let mut num_iter_since_deflation = 0usize;
    let mut decrease_level: i64 = -1;

    while win_beg < win_end {
        if info.num_iterations >= max_iter {
            break;
        }

        // Trim the active window down to its irreducible trailing block.
        let mut iter_beg = win_end - 1;
        while iter_beg > win_beg && h[(iter_beg, iter_beg - 1)] != zero {
            iter_beg -= 1;
        }
        if ctrl.progress {
            log::debug!(
                "iteration {}: active window [{}, {})",
                info.num_iterations,
                iter_beg,
                win_end
            );
        }

        // Choose the deflation window size; doubled when the iteration has
        // gone stale, then walked back level by level if the full window
        // keeps failing to deflate.
        let iter_win_size = win_end - iter_beg;
        if num_iter_since_deflation < stale {
            deflation_size = iter_win_size.min(deflation_rec);
        } else {
            deflation_size = iter_win_size.min(2 * deflation_size);
        }
        if deflation_size >= iter_win_size - 1 {
            deflation_size = iter_win_size;
        } else {
            let d_beg = win_end - deflation_size;
            if h[(d_beg, d_beg - 1)].abs() > h[(d_beg - 1, d_beg - 2)].abs() {
                deflation_size += 1;
            }
        }
        if num_iter_since_deflation < stale {
            decrease_level = -1;
        } else if decrease_level >= 0 || deflation_size == iter_win_size {
            decrease_level += 1;
            if (deflation_size as i64) - decrease_level < 2 {
                decrease_level = 0;
            }
            deflation_size = ((deflation_size as i64) - decrease_level) as usize;
        }

        let ctrl_sub = sub_window(ctrl, iter_beg, win_end);
        let report = nibble::nibble_real(
            h,
            deflation_size,
            w,
            z.as_mut().map(|zz| &mut **zz),
            &ctrl_sub,
        )?;
        let num_deflated = report.num_deflated;
        win_end -= num_deflated;
        let mut shift_beg = win_end - report.num_shift_candidates;

        let new_iter_win_size = win_end - iter_beg;
        if num_deflated == 0
            || (num_deflated <= sufficient_deflation(deflation_size)
                && new_iter_win_size >= MIN_AED_SIZE)
        {
            let mut num_shifts = num_shifts_rec.min(2.max(new_iter_win_size.saturating_sub(1)));
            num_shifts -= num_shifts % 2;

            if num_iter_since_deflation > 0 && num_iter_since_deflation % stale == 0 {
                // Exceptional shifts from perturbed trailing 2x2 blocks.
                shift_beg = win_end - num_shifts;
                let stop = (shift_beg + 1).max(win_beg + 2);
                let mut i = win_end - 1;
                while i >= stop {
                    let scale = h[(i, i - 1)].abs() + h[(i - 1, i - 2)].abs();
                    let mut eta00 = except_shift0 * scale + h[(i, i)];
                    let mut eta01 = scale;
                    let mut eta10 = except_shift1 * scale;
                    let mut eta11 = eta00;
                    let (_, (w1, w2)) =
                        two_by_two_schur(&mut eta00, &mut eta01, &mut eta10, &mut eta11);
                    w[i - 1] = w1;
                    w[i] = w2;
                    if i < stop + 2 {
                        break;
                    }
                    i -= 2;
                }
                if shift_beg == win_beg {
                    let val = Complex::new(h[(shift_beg + 1, shift_beg + 1)], zero);
                    w[shift_beg] = val;
                    w[shift_beg + 1] = val;
                }
            } else {
                if win_end - shift_beg <= num_shifts / 2 {
                    // Too few candidates survived; harvest shifts from the
                    // Schur factorization of a trailing principal submatrix.
                    shift_beg = win_end - num_shifts;
                    let mut h_shifts = h
                        .slice(s![
                            shift_beg..shift_beg + num_shifts,
                            shift_beg..shift_beg + num_shifts
                        ])
                        .to_owned();
                    let info_shifts = qr_real(
                        &mut h_shifts,
                        &mut w[shift_beg..shift_beg + num_shifts],
                        None,
                        &harvest_ctrl(num_shifts),
                    )?;
                    shift_beg += info_shifts.num_unconverged;
                    if shift_beg >= win_end - 1 {
                        // Very rare; fall back to the trailing 2x2.
                        let mut eta00 = h[(win_end - 2, win_end - 2)];
                        let mut eta01 = h[(win_end - 2, win_end - 1)];
                        let mut eta10 = h[(win_end - 1, win_end - 2)];
                        let mut eta11 = h[(win_end - 1, win_end - 1)];
                        let (_, (w1, w2)) =
                            two_by_two_schur(&mut eta00, &mut eta01, &mut eta10, &mut eta11);
                        w[win_end - 2] = w1;
                        w[win_end - 1] = w2;
                        shift_beg = win_end - 2;
                    }
                }
                if win_end - shift_beg > num_shifts {
                    // Keep the smallest-magnitude shifts at the tail.
                    let mut sorted = false;
                    let mut k = win_end - 1;
                    while k > shift_beg && !sorted {
                        sorted = true;
                        for i in shift_beg..k {
                            if w[i].abs1() < w[i + 1].abs1() {
                                sorted = false;
                                w.swap(i, i + 1);
                            }
                        }
                        k -= 1;
                    }
                }
                pair_shifts(&mut w[shift_beg..win_end]);
            }

            if (win_beg as i64) - (shift_beg as i64) == 2 && w[win_end - 1].im == zero {
                // Use a single real shift twice; the one closest to the
                // bottom-right entry is the better guess.
                let corner = h[(win_end - 1, win_end - 1)];
                if (w[win_end - 1].re - corner).abs() < (w[win_end - 2].re - corner).abs() {
                    w[win_end - 2] = w[win_end - 1];
                } else {
                    w[win_end - 1] = w[win_end - 2];
                }
            }

            num_shifts = num_shifts.min(win_end - shift_beg);
            num_shifts -= num_shifts % 2;
            shift_beg = win_end - num_shifts;

            let shifts: Vec<Complex<R>> = w[shift_beg..win_end].to_vec();
            sweep::sweep_real(
                h,
                iter_beg,
                win_end,
                &shifts,
                z.as_mut().map(|zz| &mut **zz),
                ctrl.full_triangle,
            )?;
        } else if ctrl.progress {
            log::debug!("skipping QR sweep");
        }

        info.num_iterations += 1;
        if num_deflated > 0 {
            num_iter_since_deflation = 0;
        } else {
            num_iter_since_deflation += 1;
        }
    }
    info.num_unconverged = win_end - win_beg;
    Ok(info)
}

pub(crate) fn qr_complex<R: Real>(
    h: &mut Array2<Complex<R>>,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<Complex<R>>>,
    ctrl: &HessQrCtrl,
) -> Result<HessQrInfo> {
    let n = h.nrows();
    if n < MIN_AED_SIZE {
        return single_shift::qr_complex(h, w, z, ctrl);
    }
    let (win_beg, mut win_end) = ctrl.window(n)?;
    let win_size = win_end - win_beg;
    let zero = R::zero();
    let half = R::from_f64(0.5);
    // Only a single exceptional shift is used in the complex case.
    let except_shift0 = R::from_f64(4.0 / 3.0);
    let mut info = HessQrInfo::default();

    let num_shifts_rec = recommended_shifts(n, win_size);
    let deflation_rec = recommended_deflation(n, win_size, num_shifts_rec);
    if ctrl.progress {
        log::info!(
            "recommending {} shifts and a deflation window of size {}",
            num_shifts_rec,
            deflation_rec
        );
    }
    let mut deflation_size = deflation_rec;

    let stale = NUM_STALE_ITER_BEFORE_EXCEPTIONAL;
    let max_iter = ctrl
        .max_iter
        .unwrap_or(30usize.max(2 * stale) * 10usize.max(win_size));
    let mut num_iter_since_deflation = 0usize;
    let mut decrease_level: i64 = -1;

    while win_beg < win_end {
        if info.num_iterations >= max_iter {
            break;
        }

        let mut iter_beg = win_end - 1;
        while iter_beg > win_beg && h[(iter_beg, iter_beg - 1)] != Complex::new(zero, zero) {
            iter_beg -= 1;
        }
        if ctrl.progress {
            log::debug!(
                "iteration {}: active window [{}, {})",
                info.num_iterations,
                iter_beg,
                win_end
            );
        }

        let iter_win_size = win_end - iter_beg;
        if num_iter_since_deflation < stale {
            deflation_size = iter_win_size.min(deflation_rec);
        } else {
            deflation_size = iter_win_size.min(2 * deflation_size);
        }
        if deflation_size >= iter_win_size - 1 {
            deflation_size = iter_win_size;
        } else {
            let d_beg = win_end - deflation_size;
            if h[(d_beg, d_beg - 1)].abs1() > h[(d_beg - 1, d_beg - 2)].abs1() {
                deflation_size += 1;
            }
        }
        if num_iter_since_deflation < stale {
            decrease_level = -1;
        } else if decrease_level >= 0 || deflation_size == iter_win_size {
            decrease_level += 1;
            if (deflation_size as i64) - decrease_level < 2 {
                decrease_level = 0;
            }
            deflation_size = ((deflation_size as i64) - decrease_level) as usize;
        }

        let ctrl_sub = sub_window(ctrl, iter_beg, win_end);
        let report = nibble::nibble_complex(
            h,
            deflation_size,
            w,
            z.as_mut().map(|zz| &mut **zz),
            &ctrl_sub,
        )?;
        let num_deflated = report.num_deflated;
        win_end -= num_deflated;
        let mut shift_beg = win_end - report.num_shift_candidates;

        let new_iter_win_size = win_end - iter_beg;
        if num_deflated == 0
            || (num_deflated <= sufficient_deflation(deflation_size)
                && new_iter_win_size >= MIN_AED_SIZE)
        {
            let mut num_shifts = num_shifts_rec.min(2.max(new_iter_win_size.saturating_sub(1)));
            num_shifts -= num_shifts % 2;

            if num_iter_since_deflation > 0 && num_iter_since_deflation % stale == 0 {
                shift_beg = win_end - num_shifts;
                let stop = shift_beg + 1;
                let mut i = win_end - 1;
                while i >= stop {
                    let val = h[(i, i)]
                        + Complex::new(except_shift0 * h[(i, i - 1)].abs1(), zero);
                    w[i - 1] = val;
                    w[i] = val;
                    if i < stop + 2 {
                        break;
                    }
                    i -= 2;
                }
            } else {
                if win_end - shift_beg <= num_shifts / 2 {
                    shift_beg = win_end - num_shifts;
                    let mut h_shifts = h
                        .slice(s![
                            shift_beg..shift_beg + num_shifts,
                            shift_beg..shift_beg + num_shifts
                        ])
                        .to_owned();
                    let info_shifts = qr_complex(
                        &mut h_shifts,
                        &mut w[shift_beg..shift_beg + num_shifts],
                        None,
                        &harvest_ctrl(num_shifts),
                    )?;
                    shift_beg += info_shifts.num_unconverged;
                    if shift_beg >= win_end - 1 {
                        // Very rare; use the eigenvalues of the trailing 2x2.
                        let mut eta00 = h[(win_end - 2, win_end - 2)];
                        let mut eta01 = h[(win_end - 2, win_end - 1)];
                        let mut eta10 = h[(win_end - 1, win_end - 2)];
                        let mut eta11 = h[(win_end - 1, win_end - 1)];
                        let scale = eta00.abs1() + eta01.abs1() + eta10.abs1() + eta11.abs1();
                        eta00 = eta00 / scale;
                        eta01 = eta01 / scale;
                        eta10 = eta10 / scale;
                        eta11 = eta11 / scale;
                        let half_trace = (eta00 + eta11) * half;
                        let det = (eta00 - half_trace) * (eta11 - half_trace) - eta01 * eta10;
                        let discrim = super::util::complex_sqrt(-det);
                        w[win_end - 2] = (half_trace + discrim) * scale;
                        w[win_end - 1] = (half_trace - discrim) * scale;
                        shift_beg = win_end - 2;
                    }
                }
                if win_end - shift_beg > num_shifts {
                    let mut sorted = false;
                    let mut k = win_end - 1;
                    while k > shift_beg && !sorted {
                        sorted = true;
                        for i in shift_beg..k {
                            if w[i].abs1() < w[i + 1].abs1() {
                                sorted = false;
                                w.swap(i, i + 1);
                            }
                        }
                        k -= 1;
                    }
                }
            }

            if (win_beg as i64) - (shift_beg as i64) == 2 && w[win_end - 1].im == zero {
                let corner = h[(win_end - 1, win_end - 1)];
                collapse_shift_pair(&mut w[win_end - 2..win_end], corner);
            }

            num_shifts = num_shifts.min(win_end - shift_beg);
            num_shifts -= num_shifts % 2;
            shift_beg = win_end - num_shifts;

            let shifts: Vec<Complex<R>> = w[shift_beg..win_end].to_vec();
            sweep::sweep_complex(
                h,
                iter_beg,
                win_end,
                &shifts,
                z.as_mut().map(|zz| &mut **zz),
                ctrl.full_triangle,
            )?;
        } else if ctrl.progress {
            log::debug!("skipping QR sweep");
        }

        info.num_iterations += 1;
        if num_deflated > 0 {
            num_iter_since_deflation = 0;
        } else {
            num_iter_since_deflation += 1;
        }
    }
    info.num_unconverged = win_end - win_beg;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommended_shifts_staging() {
        assert_eq!(recommended_shifts(1000, 20), 2);
        assert_eq!(recommended_shifts(1000, 100), 10);
        assert_eq!(recommended_shifts(10000, 1000), 64);
        // Never more than (n + 6) / 9, and always even.
        let s = recommended_shifts(80, 80);
        assert_eq!(s % 2, 0);
        assert!(s <= (80 + 6) / 9);
    }

    #[test]
    fn test_recommended_deflation_bounds() {
        let shifts = recommended_shifts(200, 200);
        let d = recommended_deflation(200, 200, shifts);
        assert_eq!(d % 2, 0);
        assert!(d >= 2);
        assert!(d <= 200 / 3);
    }

    #[test]
    fn test_sufficient_deflation_fraction() {
        assert_eq!(sufficient_deflation(100), 14);
        assert_eq!(sufficient_deflation(7), 0);
    }

    #[test]
    fn test_pair_shifts_groups_reals() {
        let mut w = vec![
            Complex::new(5.0, 0.0),
            Complex::new(3.0, 1.0),
            Complex::new(3.0, -1.0),
            Complex::new(2.0, 0.0),
        ];
        pair_shifts(&mut w);
        assert_eq!(w[0], Complex::new(5.0, 0.0));
        assert_eq!(w[1], Complex::new(2.0, 0.0));
        // The conjugate pair stays intact, whichever order it lands in.
        assert_eq!(w[2].re, 3.0);
        assert_eq!(w[3].re, 3.0);
        assert_eq!(w[2].im, -w[3].im);
        assert!(w[2].im != 0.0);
    }

    #[test]
    fn test_collapse_shift_pair_compares_real_parts() {
        // The candidate's imaginary part plays no role in the distance.
        let mut pair = [Complex::new(1.0, 10.0), Complex::new(2.0, 0.0)];
        collapse_shift_pair(&mut pair, Complex::new(0.0, 0.0));
        assert_eq!(pair[0], Complex::new(1.0, 10.0));
        assert_eq!(pair[1], Complex::new(1.0, 10.0));

        let mut pair = [Complex::new(5.0, 0.0), Complex::new(1.0, 0.0)];
        collapse_shift_pair(&mut pair, Complex::new(0.9, 0.4));
        assert_eq!(pair[0], Complex::new(1.0, 0.0));
        assert_eq!(pair[1], Complex::new(1.0, 0.0));
    }
}
