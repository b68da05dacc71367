//! Complex single-shift QR iteration on an upper-Hessenberg matrix.
//!
//! The complex analogue of the double-shift routine: one Wilkinson shift per
//! iteration, a 2x1 bulge, and eigenvalues deflating one at a time off the
//! bottom of the active block.

use ndarray::Array2;
use num_complex::Complex;

use super::util::{apply_left_reflector, apply_right_reflector, complex_sqrt, reflector};
use super::{HessQrCtrl, HessQrInfo};
use crate::error::Result;
use crate::scalar::{Real, Scalar};

pub(crate) fn qr_complex<R: Real>(
    h: &mut Array2<Complex<R>>,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<Complex<R>>>,
    ctrl: &HessQrCtrl,
) -> Result<HessQrInfo> {
    let n = h.nrows();
    let (win_beg, win_end) = ctrl.window(n)?;
    let mut info = HessQrInfo::default();
    if win_beg == win_end {
        return Ok(info);
    }
    let nh = win_end - win_beg;

    let zero = R::zero();
    let half = R::from_f64(0.5);
    let czero = Complex::new(zero, zero);
    let ulp = R::epsilon();
    let smlnum = R::safe_min() * (R::from_f64(nh as f64) / ulp);
    let itmax = ctrl.max_iter.unwrap_or(30 * nh.max(10));

    let mut ihi = win_end;
    while ihi > win_beg {
        let mut its = 0usize;
        loop {
            let mut l = win_beg;
            for k in (win_beg + 1..ihi).rev() {
                let sub = h[(k, k - 1)].abs1();
                if sub <= smlnum {
                    l = k;
                    break;
                }
                let mut tst = h[(k - 1, k - 1)].abs1() + h[(k, k)].abs1();
                if tst == zero {
                    if k >= win_beg + 2 {
                        tst += h[(k - 1, k - 2)].abs1();
                    }
                    if k + 1 < win_end {
                        tst += h[(k + 1, k)].abs1();
                    }
                }
                if sub <= ulp * tst {
                    let sup = h[(k - 1, k)].abs1();
                    let ab = sub.max(sup);
                    let ba = sub.min(sup);
                    let diag_gap = (h[(k - 1, k - 1)] - h[(k, k)]).abs1();
                    let aa = h[(k, k)].abs1().max(diag_gap);
                    let bb = h[(k, k)].abs1().min(diag_gap);
                    let s = aa + ab;
                    if ba * (ab / s) <= smlnum.max(ulp * (bb * (aa / s))) {
                        l = k;
                        break;
                    }
                }
            }
            if l > win_beg {
                h[(l, l - 1)] = czero;
            }

            if l + 1 >= ihi {
                w[l] = h[(l, l)];
                if ctrl.progress {
                    log::info!("single-shift deflated eigenvalue at {} after {} iterations", l, its);
                }
                ihi = l;
                break;
            }

            if info.num_iterations >= itmax {
                info.num_unconverged = ihi - win_beg;
                return Ok(info);
            }
            its += 1;
            info.num_iterations += 1;

            let i = ihi - 1;
            let mut t = h[(i, i)];
            if its % 10 == 0 {
                t = h[(i, i)]
                    + Complex::new(R::from_f64(0.75) * h[(i, i - 1)].real_part().abs(), zero);
            } else {
                // Wilkinson's shift: the eigenvalue of the trailing 2x2
                // closer to the corner entry.
                let u = complex_sqrt(h[(i - 1, i)]) * complex_sqrt(h[(i, i - 1)]);
                let s = u.abs1();
                if s != zero {
                    let x = (h[(i - 1, i - 1)] - t) * Complex::new(half, zero);
                    let sx = x.abs1();
                    let s = s.max(sx);
                    let sc = Complex::new(s, zero);
                    let mut y = sc * complex_sqrt((x / sc) * (x / sc) + (u / sc) * (u / sc));
                    if sx > zero {
                        let xs = x / Complex::new(sx, zero);
                        if xs.re * y.re + xs.im * y.im < zero {
                            y = -y;
                        }
                    }
                    t = t - u * (u / (x + y));
                }
            }

            // Single-shift chase from the top of the block.
            let (i1, i2) = if ctrl.full_triangle { (0, n) } else { (l, ihi) };
            let m = l;
            for k in m..ihi - 1 {
                let mut vv = if k > m {
                    [h[(k, k - 1)], h[(k + 1, k - 1)]]
                } else {
                    let h11s = h[(k, k)] - t;
                    let h21 = h[(k + 1, k)];
                    let sc = h11s.abs1() + h21.abs1();
                    let scc = Complex::new(sc, zero);
                    [h11s / scc, h21 / scc]
                };
                let tau = reflector(&mut vv);
                let beta = vv[0];
                vv[0] = Complex::new(R::one(), zero);
                if k > m {
                    h[(k, k - 1)] = beta;
                    h[(k + 1, k - 1)] = czero;
                }
                apply_left_reflector(tau, &vv, h, k, k..i2);
                apply_right_reflector(tau, &vv, h, i1..ihi.min(k + 3), k);
                if let Some(z) = z.as_mut() {
                    let rows = z.nrows();
                    apply_right_reflector(tau, &vv, z, 0..rows, k);
                }
            }
        }
    }
    Ok(info)
}
