use gridqr::blas::{gemm, norms, Orientation};
use gridqr::{hessenberg_reduce, hessenberg_schur, hessenberg_schur_complex, Error, HessQrCtrl};
use ndarray::{Array1, Array2};
use num_complex::Complex;
use rand::{Rng, SeedableRng};

fn random_hessenberg(seed: u64, n: usize) -> Array2<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i > j + 1 {
            0.0
        } else {
            rng.gen_range(-1.0..1.0)
        }
    })
}

fn random_hessenberg_complex(seed: u64, n: usize) -> Array2<Complex<f64>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i > j + 1 {
            Complex::new(0.0, 0.0)
        } else {
            Complex::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
        }
    })
}

/// ||H Z - Z T||_F / ||H||_F for the real decomposition H = Z T Z^T.
fn real_residual(h0: &Array2<f64>, t: &Array2<f64>, z: &Array2<f64>) -> f64 {
    let n = h0.nrows();
    let mut hz = Array2::<f64>::zeros((n, n));
    gemm(
        Orientation::Normal,
        Orientation::Normal,
        1.0,
        &h0.view(),
        &z.view(),
        0.0,
        &mut hz.view_mut(),
    )
    .unwrap();
    gemm(
        Orientation::Normal,
        Orientation::Normal,
        -1.0,
        &z.view(),
        &t.view(),
        1.0,
        &mut hz.view_mut(),
    )
    .unwrap();
    norms::frobenius_norm(&hz.view()) / norms::frobenius_norm(&h0.view())
}

fn complex_residual(
    h0: &Array2<Complex<f64>>,
    t: &Array2<Complex<f64>>,
    z: &Array2<Complex<f64>>,
) -> f64 {
    let n = h0.nrows();
    let zero = Complex::new(0.0, 0.0);
    let one = Complex::new(1.0, 0.0);
    let mut hz = Array2::from_elem((n, n), zero);
    gemm(
        Orientation::Normal,
        Orientation::Normal,
        one,
        &h0.view(),
        &z.view(),
        zero,
        &mut hz.view_mut(),
    )
    .unwrap();
    gemm(
        Orientation::Normal,
        Orientation::Normal,
        -one,
        &z.view(),
        &t.view(),
        one,
        &mut hz.view_mut(),
    )
    .unwrap();
    norms::frobenius_norm(&hz.view()) / norms::frobenius_norm(&h0.view())
}

fn assert_quasi_triangular(t: &Array2<f64>) {
    let n = t.nrows();
    let mut i = 1;
    while i < n {
        if t[(i, i - 1)] != 0.0 {
            // A 2x2 block: its neighbours on the subdiagonal must be zero.
            if i + 1 < n {
                assert_eq!(t[(i + 1, i)], 0.0, "overlapping blocks at {i}");
            }
            i += 2;
        } else {
            i += 1;
        }
    }
}

#[test]
fn test_small_real_known_spectrum() {
    // Tridiagonal discrete Laplacian: eigenvalues 2 - 2 cos(k pi / (n+1)).
    let n = 10;
    let mut h = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        h[(i, i)] = 2.0;
        if i + 1 < n {
            h[(i, i + 1)] = -1.0;
            h[(i + 1, i)] = -1.0;
        }
    }
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    hessenberg_schur(&mut h, &mut w, None, &HessQrCtrl::default()).unwrap();

    let mut got: Vec<f64> = w.iter().map(|c| c.re).collect();
    got.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for (k, &lambda) in got.iter().enumerate() {
        let exact = 2.0 - 2.0 * ((k + 1) as f64 * std::f64::consts::PI / (n as f64 + 1.0)).cos();
        assert!((lambda - exact).abs() < 1e-12, "lambda {k}: {lambda} vs {exact}");
    }
    for c in w.iter() {
        assert_eq!(c.im, 0.0);
    }
}

#[test]
fn test_small_real_deterministic() {
    let run = || {
        let mut h = random_hessenberg(42, 10);
        let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
        let mut z = Array2::<f64>::eye(10);
        hessenberg_schur(&mut h, &mut w, Some(&mut z), &HessQrCtrl::default()).unwrap();
        (h, w, z)
    };
    let (h1, w1, z1) = run();
    let (h2, w2, z2) = run();
    // Bit-for-bit reproducible.
    assert_eq!(h1, h2);
    assert_eq!(w1, w2);
    assert_eq!(z1, z2);
}

#[test]
fn test_real_residual_large() {
    let n = 200;
    let h0 = random_hessenberg(1, n);
    let mut t = h0.clone();
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    let mut z = Array2::<f64>::eye(n);
    let info = hessenberg_schur(&mut t, &mut w, Some(&mut z), &HessQrCtrl::default()).unwrap();
    assert_eq!(info.num_unconverged, 0);
    assert_quasi_triangular(&t);
    assert!(real_residual(&h0, &t, &z) <= 1e-10);

    // Eigenvalues are a similarity invariant: the trace must survive.
    let trace: f64 = (0..n).map(|i| h0[(i, i)]).sum();
    let wsum: Complex<f64> = w.iter().sum();
    assert!((wsum.re - trace).abs() < 1e-8);
    assert!(wsum.im.abs() < 1e-8);
}

#[test]
fn test_complex_residual_large() {
    let n = 120;
    let h0 = random_hessenberg_complex(2, n);
    let mut t = h0.clone();
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    let mut z = Array2::from_shape_fn((n, n), |(i, j)| {
        Complex::new(if i == j { 1.0 } else { 0.0 }, 0.0)
    });
    let info =
        hessenberg_schur_complex(&mut t, &mut w, Some(&mut z), &HessQrCtrl::default()).unwrap();
    assert_eq!(info.num_unconverged, 0);
    // Triangular Schur factor
    for i in 1..n {
        assert_eq!(t[(i, i - 1)], Complex::new(0.0, 0.0));
    }
    assert!(complex_residual(&h0, &t, &z) <= 1e-10);
    for i in 0..n {
        assert_eq!(w[i], t[(i, i)]);
    }
}

#[test]
fn test_full_pipeline_from_dense() {
    let n = 90;
    let mut rng = rand::rngs::StdRng::seed_from_u64(3);
    let a0 = Array2::from_shape_fn((n, n), |_| rng.gen_range(-1.0..1.0));
    let mut a = a0.clone();
    let mut q = Array2::<f64>::eye(n);
    hessenberg_reduce(&mut a, Some(&mut q)).unwrap();
    for i in 0..n {
        for j in 0..n {
            if i > j + 1 {
                assert_eq!(a[(i, j)], 0.0);
            }
        }
    }
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    hessenberg_schur(&mut a, &mut w, Some(&mut q), &HessQrCtrl::default()).unwrap();
    // Q now carries the whole reduction: A0 = Q T Q^T.
    assert!(real_residual(&a0, &a, &q) <= 1e-10);
}

#[test]
fn test_budget_exhaustion_soft_and_hard() {
    let n = 200;
    let ctrl_soft = HessQrCtrl {
        demand_converged: false,
        max_iter: Some(1),
        ..HessQrCtrl::default()
    };
    let mut t = random_hessenberg(4, n);
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    let info = hessenberg_schur(&mut t, &mut w, None, &ctrl_soft).unwrap();
    assert!(info.num_unconverged > 0);

    let ctrl_hard = HessQrCtrl {
        max_iter: Some(1),
        ..HessQrCtrl::default()
    };
    let mut t = random_hessenberg(4, n);
    let err = hessenberg_schur(&mut t, &mut w, None, &ctrl_hard).unwrap_err();
    assert!(matches!(err, Error::DidNotConverge { .. }));
}

#[test]
fn test_window_restricts_activity() {
    // Decoupled matrix: reduce only the trailing window and leave the rest.
    let n = 12;
    let mut h = random_hessenberg(5, n);
    h[(6, 5)] = 0.0;
    let before = h.clone();
    let ctrl = HessQrCtrl {
        win_beg: 6,
        win_end: Some(n as i64),
        full_triangle: false,
        ..HessQrCtrl::default()
    };
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    hessenberg_schur(&mut h, &mut w, None, &ctrl).unwrap();
    for i in 0..6 {
        for j in 0..6 {
            assert_eq!(h[(i, j)], before[(i, j)]);
        }
    }
    assert_quasi_triangular(&h.slice(ndarray::s![6.., 6..]).to_owned());
}

#[test]
fn test_rejects_bad_window_and_shape() {
    let mut h = random_hessenberg(6, 5);
    let mut w = Array1::from_elem(0, Complex::new(0.0, 0.0));
    let ctrl = HessQrCtrl {
        win_end: Some(9),
        ..HessQrCtrl::default()
    };
    assert!(hessenberg_schur(&mut h, &mut w, None, &ctrl).is_err());

    let mut rect = Array2::<f64>::zeros((3, 4));
    assert!(hessenberg_schur(&mut rect, &mut w, None, &HessQrCtrl::default()).is_err());

    let mut z = Array2::<f64>::eye(4);
    let mut h = random_hessenberg(7, 5);
    assert!(hessenberg_schur(&mut h, &mut w, Some(&mut z), &HessQrCtrl::default()).is_err());
}
