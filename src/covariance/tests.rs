// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{
    constants::ARCMIN_TO_RAD,
    tests::{random_alm, random_map},
    transform::GaussLegendreGrid,
    ErrorClass,
};

#[test]
fn cross_splits_that_are_identical_match_standard_harmonic() {
    let alms = vec![random_alm(32, 1.0, 1), random_alm(32, 2.0, 2)];
    let standard = harmonic_covariance(CovarianceInput::Standard(&alms), 2..=20).unwrap();
    let cross = harmonic_covariance(
        CovarianceInput::CrossSplits {
            split1: &alms,
            split2: &alms,
        },
        2..=20,
    )
    .unwrap();
    assert_eq!(standard, cross);
    assert_abs_diff_eq!(standard[(0, 1)], standard[(1, 0)]);
}

#[test]
fn harmonic_covariance_is_mode_weighted_power() {
    let alm = random_alm(16, 1.0, 3);
    let cov = harmonic_covariance(CovarianceInput::Standard(&[alm.clone()]), 4..=8).unwrap();
    let cl = alm.cross_cl(&alm).unwrap();
    let expected: f64 = (4..=8).map(|l| (2 * l + 1) as f64 * cl[l]).sum::<f64>() / num_modes(4..=8);
    assert_abs_diff_eq!(cov[(0, 0)], expected, epsilon = 1e-12);
}

#[test]
fn cross_ilc_removes_noise_bias() {
    // Two channels see the same signal plus independent noise in each split.
    let lmax = 32;
    let signal = random_alm(lmax, 1.0, 10);
    let make = |noise_seed: u64| {
        let mut a = signal.clone();
        a.scaled_add(1.0, &random_alm(lmax, 1.0, noise_seed)).unwrap();
        a
    };
    let split1 = vec![make(20), make(21)];
    let split2 = vec![make(30), make(31)];
    let combined: Vec<Alm> = split1
        .iter()
        .zip(split2.iter())
        .map(|(s1, s2)| {
            let mut c = Alm::zeros(lmax);
            c.scaled_add(0.5, s1).unwrap();
            c.scaled_add(0.5, s2).unwrap();
            c
        })
        .collect();

    let standard = harmonic_covariance(CovarianceInput::Standard(&combined), 2..=32).unwrap();
    let cross = harmonic_covariance(
        CovarianceInput::CrossSplits {
            split1: &split1,
            split2: &split2,
        },
        2..=32,
    )
    .unwrap();
    assert!(cross[(0, 0)] < standard[(0, 0)]);
    assert!(cross[(1, 1)] < standard[(1, 1)]);
}

#[test]
fn needlet_covariance_identical_splits_match_standard() {
    let grid = GaussLegendreGrid::with_lmax(16);
    let maps = vec![random_map(&grid, 1.0, 1), random_map(&grid, 1.0, 2)];
    let fwhm = 1200.0 * ARCMIN_TO_RAD;
    let standard = needlet_covariance(&grid, CovarianceInput::Standard(&maps), fwhm).unwrap();
    let cross = needlet_covariance(
        &grid,
        CovarianceInput::CrossSplits {
            split1: &maps,
            split2: &maps,
        },
        fwhm,
    )
    .unwrap();
    assert_eq!(standard.dim(), (grid.num_pixels(), 2, 2));
    assert_eq!(standard, cross);
}

#[test]
fn needlet_covariance_is_bilinear() {
    let grid = GaussLegendreGrid::with_lmax(16);
    let a = random_map(&grid, 1.0, 5);
    let maps = vec![a.clone(), &a * 2.0];
    let cov = needlet_covariance(
        &grid,
        CovarianceInput::Standard(&maps),
        1200.0 * ARCMIN_TO_RAD,
    )
    .unwrap();
    for c in cov.outer_iter() {
        assert_abs_diff_eq!(c[(0, 1)], 2.0 * c[(0, 0)], epsilon = 1e-10);
        assert_abs_diff_eq!(c[(1, 0)], c[(0, 1)]);
        assert_abs_diff_eq!(c[(1, 1)], 4.0 * c[(0, 0)], epsilon = 1e-10);
    }
}

#[test]
fn mismatched_splits() {
    let maps = vec![Array1::zeros(4)];
    let grid = GaussLegendreGrid::with_lmax(1);
    let result = needlet_covariance(
        &grid,
        CovarianceInput::CrossSplits {
            split1: &maps,
            split2: &[],
        },
        0.1,
    );
    assert!(matches!(
        result,
        Err(CovarianceError::SplitCount { split1: 1, split2: 0 })
    ));
}

#[test]
fn singular_covariance_is_loaded() {
    let mut c = array![[1.0, 1.0], [1.0, 1.0]];
    let loading = regularise(c.view_mut()).unwrap().unwrap();
    assert_abs_diff_eq!(loading, 2e-8, epsilon = 1e-15);
    assert_abs_diff_eq!(c[(0, 0)], 1.0 + loading);
    assert_abs_diff_eq!(c[(0, 1)], 1.0);
}

#[test]
fn well_conditioned_covariance_is_untouched() {
    let mut c = array![[2.0, 0.5], [0.5, 1.0]];
    let before = c.clone();
    assert!(regularise(c.view_mut()).unwrap().is_none());
    assert_eq!(c, before);
}

#[test]
fn zero_covariance_becomes_identity() {
    let mut c = Array2::<f64>::zeros((3, 3));
    assert!(regularise(c.view_mut()).unwrap().is_some());
    assert_eq!(c, Array2::<f64>::eye(3));
}

#[test]
fn non_finite_covariance_is_an_estimation_error() {
    let mut arena = Array3::ones((3, 2, 2));
    arena[(1, 0, 1)] = f64::NAN;
    let err = regularise_arena(&mut arena, 0).unwrap_err();
    assert!(matches!(err, CovarianceError::NonFiniteAt { unit: 1 }));
    assert_eq!(err.class(), ErrorClass::Estimation);
}

#[test]
fn arena_counts_regularised_units() {
    let mut arena = Array3::zeros((4, 2, 2));
    arena.slice_mut(s![..2, .., ..]).assign(&array![[2.0, 0.0], [0.0, 1.0]]);
    assert_eq!(regularise_arena(&mut arena, 3).unwrap(), 2);
}
