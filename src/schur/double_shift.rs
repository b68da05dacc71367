//! Real double-shift QR iteration on an upper-Hessenberg matrix.
//!
//! Classic small-matrix algorithm: scan for a negligible subdiagonal entry,
//! pick a Francis shift pair from the trailing 2x2 (or an exceptional pair on
//! a fixed cadence), and chase a 3x1 bulge down the active block. Deflated
//! trailing 2x2 blocks are standardized so the output is quasi-triangular.

use ndarray::Array2;
use num_complex::Complex;

use super::util::{apply_left_reflector, apply_right_reflector, reflector, two_by_two_schur};
use super::{HessQrCtrl, HessQrInfo};
use crate::error::Result;
use crate::scalar::Real;

pub(crate) fn qr_real<R: Real>(
    h: &mut Array2<R>,
    w: &mut [Complex<R>],
    mut z: Option<&mut Array2<R>>,
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
    let one = R::one();
    let ulp = R::epsilon();
    let smlnum = R::safe_min() * (R::from_f64(nh as f64) / ulp);
    let itmax = ctrl.max_iter.unwrap_or(30 * nh.max(10));

    let mut ihi = win_end;
    while ihi > win_beg {
        let mut its = 0usize;
        loop {
            // Find the smallest l with a negligible subdiagonal below it.
            let mut l = win_beg;
            for k in (win_beg + 1..ihi).rev() {
                let sub = h[(k, k - 1)].abs();
                if sub <= smlnum {
                    l = k;
                    break;
                }
                let mut tst = h[(k - 1, k - 1)].abs() + h[(k, k)].abs();
                if tst == zero {
                    if k >= win_beg + 2 {
                        tst += h[(k - 1, k - 2)].abs();
                    }
                    if k + 1 < win_end {
                        tst += h[(k + 1, k)].abs();
                    }
                }
                if sub <= ulp * tst {
                    // Ahues and Tisseur's convergence criterion.
                    let sup = h[(k - 1, k)].abs();
                    let ab = sub.max(sup);
                    let ba = sub.min(sup);
                    let diag_gap = (h[(k - 1, k - 1)] - h[(k, k)]).abs();
                    let aa = h[(k, k)].abs().max(diag_gap);
                    let bb = h[(k, k)].abs().min(diag_gap);
                    let s = aa + ab;
                    if ba * (ab / s) <= smlnum.max(ulp * (bb * (aa / s))) {
                        l = k;
                        break;
                    }
                }
            }
            if l > win_beg {
                h[(l, l - 1)] = zero;
            }

            if l + 2 >= ihi {
                // A 1x1 or 2x2 block has converged at the bottom.
                if l + 1 == ihi {
                    w[l] = Complex::new(h[(l, l)], zero);
                } else {
                    let (mut a, mut b) = (h[(l, l)], h[(l, l + 1)]);
                    let (mut c, mut d) = (h[(l + 1, l)], h[(l + 1, l + 1)]);
                    let ((cs, sn), (w1, w2)) = two_by_two_schur(&mut a, &mut b, &mut c, &mut d);
                    h[(l, l)] = a;
                    h[(l, l + 1)] = b;
                    h[(l + 1, l)] = c;
                    h[(l + 1, l + 1)] = d;
                    w[l] = w1;
                    w[l + 1] = w2;
                    if ctrl.full_triangle {
                        for j in ihi..n {
                            let x = h[(l, j)];
                            let y = h[(l + 1, j)];
                            h[(l, j)] = cs * x + sn * y;
                            h[(l + 1, j)] = cs * y - sn * x;
                        }
                        for r in 0..l {
                            let x = h[(r, l)];
                            let y = h[(r, l + 1)];
                            h[(r, l)] = cs * x + sn * y;
                            h[(r, l + 1)] = cs * y - sn * x;
                        }
                    }
                    if let Some(z) = z.as_mut() {
                        for r in 0..z.nrows() {
                            let x = z[(r, l)];
                            let y = z[(r, l + 1)];
                            z[(r, l)] = cs * x + sn * y;
                            z[(r, l + 1)] = cs * y - sn * x;
                        }
                    }
                }
                if ctrl.progress {
                    log::info!(
                        "double-shift deflated {}x{} block at {} after {} iterations",
                        ihi - l,
                        ihi - l,
                        l,
                        its
                    );
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

            // Shift pair from the trailing 2x2, or an exceptional pair.
            let (h11, h12, h21, h22);
            if its % 10 == 0 {
                let s = h[(ihi - 1, ihi - 2)].abs() + h[(ihi - 2, ihi - 3)].abs();
                h11 = R::from_f64(0.75) * s + h[(ihi - 1, ihi - 1)];
                h12 = R::from_f64(-0.4375) * s;
                h21 = s;
                h22 = h11;
            } else {
                h11 = h[(ihi - 2, ihi - 2)];
                h12 = h[(ihi - 2, ihi - 1)];
                h21 = h[(ihi - 1, ihi - 2)];
                h22 = h[(ihi - 1, ihi - 1)];
            }
            let s = h11.abs() + h12.abs() + h21.abs() + h22.abs();
            let (rt1r, rt1i, rt2r, rt2i);
            if s == zero {
                rt1r = zero;
                rt1i = zero;
                rt2r = zero;
                rt2i = zero;
            } else {
                let h11 = h11 / s;
                let h12 = h12 / s;
                let h21 = h21 / s;
                let h22 = h22 / s;
                let tr = (h11 + h22) * R::from_f64(0.5);
                let det = (h11 - tr) * (h22 - tr) - h12 * h21;
                if det >= zero {
                    // Complex conjugate shifts.
                    rt1r = tr * s;
                    rt2r = rt1r;
                    rt1i = det.sqrt() * s;
                    rt2i = -rt1i;
                } else {
                    // Two real roots; keep only the one closer to h22.
                    let rtdisc = (-det).sqrt();
                    let r1 = tr + rtdisc;
                    let r2 = tr - rtdisc;
                    let pick = if (r1 - h22).abs() <= (r2 - h22).abs() {
                        r1
                    } else {
                        r2
                    };
                    rt1r = pick * s;
                    rt2r = rt1r;
                    rt1i = zero;
                    rt2i = zero;
                }
            }

            // Look for two consecutive small subdiagonals to start from.
            let mut m = l;
            let mut v = [zero; 3];
            for mm in (l..=ihi - 3).rev() {
                let sc = (h[(mm, mm)] - rt2r).abs() + rt2i.abs() + h[(mm + 1, mm)].abs();
                let h21s = h[(mm + 1, mm)] / sc;
                v[0] = h21s * h[(mm, mm + 1)]
                    + (h[(mm, mm)] - rt1r) * ((h[(mm, mm)] - rt2r) / sc)
                    - rt1i * (rt2i / sc);
                v[1] = h21s * (h[(mm, mm)] + h[(mm + 1, mm + 1)] - rt1r - rt2r);
                v[2] = h21s * h[(mm + 2, mm + 1)];
                let vs = v[0].abs() + v[1].abs() + v[2].abs();
                v[0] = v[0] / vs;
                v[1] = v[1] / vs;
                v[2] = v[2] / vs;
                m = mm;
                if mm == l {
                    break;
                }
                let lhs = h[(mm, mm - 1)].abs() * (v[1].abs() + v[2].abs());
                let rhs = ulp
                    * v[0].abs()
                    * (h[(mm - 1, mm - 1)].abs() + h[(mm, mm)].abs() + h[(mm + 1, mm + 1)].abs());
                if lhs <= rhs {
                    break;
                }
            }

            // Bulge chase.
            let (i1, i2) = if ctrl.full_triangle { (0, n) } else { (l, ihi) };
            for k in m..ihi - 1 {
                let nr = 3.min(ihi - k);
                let mut vv = [zero; 3];
                if k > m {
                    for (t, slot) in vv.iter_mut().take(nr).enumerate() {
                        *slot = h[(k + t, k - 1)];
                    }
                } else {
                    vv[..nr].copy_from_slice(&v[..nr]);
                }
                let tau = reflector(&mut vv[..nr]);
                let beta = vv[0];
                vv[0] = one;
                if k > m {
                    h[(k, k - 1)] = beta;
                    h[(k + 1, k - 1)] = zero;
                    if nr == 3 {
                        h[(k + 2, k - 1)] = zero;
                    }
                } else if m > l {
                    // Written this way instead of negating to survive
                    // underflow in the reflector tail.
                    h[(k, k - 1)] = h[(k, k - 1)] * (one - tau);
                }
                apply_left_reflector(tau, &vv[..nr], h, k, k..i2);
                apply_right_reflector(tau, &vv[..nr], h, i1..ihi.min(k + nr + 1), k);
                if let Some(z) = z.as_mut() {
                    let rows = z.nrows();
                    apply_right_reflector(tau, &vv[..nr], z, 0..rows, k);
                }
            }
        }
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blas::{gemm, norms, Orientation};
    use ndarray::{array, Array1, Array2};

    fn schur_residual(orig: &Array2<f64>, t: &Array2<f64>, z: &Array2<f64>) -> f64 {
        let n = orig.nrows();
        let mut az = Array2::<f64>::zeros((n, n));
        let mut zt = Array2::<f64>::zeros((n, n));
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &orig.view(),
            &z.view(),
            0.0,
            &mut az.view_mut(),
        )
        .unwrap();
        gemm(
            Orientation::Normal,
            Orientation::Normal,
            1.0,
            &z.view(),
            &t.view(),
            0.0,
            &mut zt.view_mut(),
        )
        .unwrap();
        let diff = &az - &zt;
        norms::frobenius_norm(&diff.view()) / norms::frobenius_norm(&orig.view())
    }

    #[test]
    fn test_small_real_spectrum() {
        // Companion-style matrix with eigenvalues 1, 2, 3.
        let orig = array![[6.0, -11.0, 6.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let ctrl = HessQrCtrl::default();
        let mut w = Array1::from_elem(3, Complex::new(0.0, 0.0));
        let mut h = orig.clone();
        let mut z = Array2::<f64>::eye(3);
        let info = qr_real(&mut h, w.as_slice_mut().unwrap(), Some(&mut z), &ctrl).unwrap();
        assert_eq!(info.num_unconverged, 0);
        let mut re: Vec<f64> = w.iter().map(|c| c.re).collect();
        re.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((re[0] - 1.0).abs() < 1e-10);
        assert!((re[1] - 2.0).abs() < 1e-10);
        assert!((re[2] - 3.0).abs() < 1e-10);
        assert!(schur_residual(&orig, &h, &z) < 1e-13);
    }

    #[test]
    fn test_rotation_block_gives_conjugate_pair() {
        let orig = array![[0.0, -1.0], [1.0, 0.0]];
        let mut h = orig.clone();
        let mut w = Array1::from_elem(2, Complex::new(0.0, 0.0));
        let ctrl = HessQrCtrl::default();
        qr_real(&mut h, w.as_slice_mut().unwrap(), None, &ctrl).unwrap();
        assert!((w[0].im - 1.0).abs() < 1e-14);
        assert!((w[1].im + 1.0).abs() < 1e-14);
        assert!((h[(0, 0)] - h[(1, 1)]).abs() < 1e-14);
    }
}
