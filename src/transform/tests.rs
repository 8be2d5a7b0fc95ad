// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use num_complex::Complex64;

use super::{gauss_legendre::gauss_legendre_nodes, *};
use crate::{constants::ARCMIN_TO_RAD, tests::random_alm, ErrorClass};

#[test]
fn gauss_legendre_weights_integrate_polynomials() {
    let (x, w) = gauss_legendre_nodes(8);
    assert_abs_diff_eq!(w.iter().sum::<f64>(), 2.0, epsilon = 1e-14);
    // ∫ x² dx over [-1, 1] = 2/3; ∫ x^14 = 2/15.
    let x2: f64 = x.iter().zip(&w).map(|(x, w)| w * x * x).sum();
    assert_abs_diff_eq!(x2, 2.0 / 3.0, epsilon = 1e-14);
    let x14: f64 = x.iter().zip(&w).map(|(x, w)| w * x.powi(14)).sum();
    assert_abs_diff_eq!(x14, 2.0 / 15.0, epsilon = 1e-14);
    // Nodes are ordered from the north pole.
    assert!(x.windows(2).all(|p| p[0] > p[1]));
}

#[test]
fn round_trip_is_exact_for_band_limited_alm() {
    let lmax = 32;
    let grid = GaussLegendreGrid::with_lmax(lmax);
    let alm = random_alm(lmax, 1.0, 1);
    let map = grid.alm2map(&alm).unwrap();
    assert_eq!(map.len(), grid.num_pixels());
    let alm2 = grid.map2alm(map.view()).unwrap();
    for (a, b) in alm.coeffs().iter().zip(alm2.coeffs().iter()) {
        assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
        assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
    }
}

#[test]
fn round_trip_on_a_larger_grid() {
    let lmax = 16;
    let grid = GaussLegendreGrid::new(lmax, 24, 40).unwrap();
    let alm = random_alm(lmax, 1.0, 2);
    let map = grid.alm2map(&alm).unwrap();
    let alm2 = grid.map2alm(map.view()).unwrap();
    let diff: f64 = alm
        .coeffs()
        .iter()
        .zip(alm2.coeffs().iter())
        .map(|(a, b)| (a - b).norm())
        .fold(0.0, f64::max);
    assert!(diff < 1e-10, "{diff}");
}

#[test]
fn monopole_map_is_constant() {
    let grid = GaussLegendreGrid::with_lmax(8);
    let mut alm = Alm::zeros(8);
    alm.set(0, 0, Complex64::new((4.0 * PI).sqrt() * 3.0, 0.0));
    let map = grid.alm2map(&alm).unwrap();
    for &v in map.iter() {
        assert_abs_diff_eq!(v, 3.0, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(map_mean(&grid, map.view()).unwrap(), 3.0, epsilon = 1e-12);
}

#[test]
fn y10_follows_cos_theta() {
    let grid = GaussLegendreGrid::with_lmax(4);
    let mut alm = Alm::zeros(4);
    alm.set(1, 0, Complex64::new(1.0, 0.0));
    let map = grid.alm2map(&alm).unwrap();
    let norm = (3.0 / (4.0 * PI)).sqrt();
    for (pixel, &v) in map.iter().enumerate() {
        let (theta, _) = grid.pixel_position(pixel);
        assert_abs_diff_eq!(v, norm * theta.cos(), epsilon = 1e-12);
    }
}

#[test]
fn smoothing_matches_gaussian_transfer() {
    let lmax = 40;
    let grid = GaussLegendreGrid::with_lmax(lmax);
    let alm = random_alm(lmax, 1.0, 3);
    let map = grid.alm2map(&alm).unwrap();
    let fwhm = 200.0 * ARCMIN_TO_RAD;
    let smoothed = smoothing(&grid, map.view(), fwhm).unwrap();
    let smoothed_alm = grid.map2alm(smoothed.view()).unwrap();
    let beam = gauss_beam(fwhm, lmax);
    for l in 0..=lmax {
        for m in 0..=l {
            let expected = alm.get(l, m) * beam[l];
            let got = smoothed_alm.get(l, m);
            assert_abs_diff_eq!(got.re, expected.re, epsilon = 1e-10);
            assert_abs_diff_eq!(got.im, expected.im, epsilon = 1e-10);
        }
    }
}

#[test]
fn cross_cl_of_single_mode() {
    let mut a = Alm::zeros(3);
    a.set(2, 1, Complex64::new(1.0, 1.0));
    let cl = a.cross_cl(&a).unwrap();
    // m = ±1 each contribute |a|² = 2, over 2ℓ+1 = 5 modes.
    assert_abs_diff_eq!(cl[2], 4.0 / 5.0);
    assert_abs_diff_eq!(cl[1], 0.0);
    assert_abs_diff_eq!(a.cross_mode_sum(&a, 0..=3).unwrap(), 4.0);
    assert_abs_diff_eq!(num_modes(2..=3), 12.0);
}

#[test]
fn ranged_accumulation_matches_masking() {
    let lmax = 20;
    let a = random_alm(lmax, 1.0, 2);
    for (lo, hi) in [(0, 7), (8, 15), (16, 20), (5, 5), (18, 40)] {
        let mut ranged = Alm::zeros(lmax);
        ranged.scaled_add_ells(0.7, &a, lo..=hi).unwrap();

        let window = Array1::from_shape_fn(lmax + 1, |l| if l >= lo && l <= hi { 1.0 } else { 0.0 });
        let mut masked = a.clone();
        masked.almxfl(window.view()).unwrap();
        let mut expected = Alm::zeros(lmax);
        expected.scaled_add(0.7, &masked).unwrap();

        assert_eq!(ranged, expected, "ℓ range {lo}..={hi}");
    }

    let mut wrong = Alm::zeros(lmax + 1);
    assert!(wrong.scaled_add_ells(1.0, &a, 0..=3).is_err());
}

#[test]
fn wrong_sizes_are_errors() {
    let grid = GaussLegendreGrid::with_lmax(4);
    let map = Array1::zeros(grid.num_pixels() + 1);
    let err = grid.map2alm(map.view()).unwrap_err();
    assert!(matches!(err, TransformError::MapSize { .. }));
    assert_eq!(err.class(), ErrorClass::Config);

    let err = grid.alm2map(&Alm::zeros(5)).unwrap_err();
    assert!(matches!(err, TransformError::AlmLmax { expected: 4, got: 5 }));

    let err = Alm::from_coeffs(4, Array1::zeros(3)).unwrap_err();
    assert!(matches!(err, TransformError::AlmSize { expected: 15, .. }));

    assert!(matches!(
        GaussLegendreGrid::new(10, 10, 30),
        Err(TransformError::GridTooSmall { min_nlat: 11, .. })
    ));
    assert!(matches!(
        GaussLegendreGrid::new(10, 11, 20),
        Err(TransformError::GridTooSmall { min_nlon: 21, .. })
    ));
}
