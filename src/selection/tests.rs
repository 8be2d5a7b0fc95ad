// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::*;
use crate::{beam::gauss_beam, constants::ARCMIN_TO_RAD, ErrorClass};

fn beams(ellmax: usize, fwhms_arcmin: &[f64]) -> Vec<Array1<f64>> {
    fwhms_arcmin
        .iter()
        .map(|f| gauss_beam(f * ARCMIN_TO_RAD, ellmax))
        .collect()
}

#[test]
fn coarse_channels_drop_out_at_fine_scales() {
    let bank = FilterBank::gaussian_needlets(4000, 4, &[120.0, 30.0, 10.0]).unwrap();
    let beams = beams(4000, &[60.0, 20.0, 5.0]);
    let selection =
        select_frequencies(&bank, &beams, &SelectionPolicy::BeamCriterion(1e-3)).unwrap();
    assert_eq!(selection.num_scales(), 4);
    assert_eq!(selection.num_active(0), 3);
    // Every selection is a suffix, and finer scales never use more channels.
    for j in 0..4 {
        let active = selection.active_channels(j);
        assert_eq!(active.end, 3);
        if j > 0 {
            assert!(selection.num_active(j) <= selection.num_active(j - 1));
        }
    }
    assert_eq!(selection.num_active(3), 1);
    assert!(selection.is_active(3, 2));
    assert!(!selection.is_active(3, 1));
}

#[test]
fn selection_is_a_contiguous_suffix() {
    // Channel 1 can't resolve the last bin, but channel 0 can; channel 0 must
    // not be used.
    let bank = FilterBank::harmonic_bins(100, 50).unwrap();
    let mut beams = vec![Array1::ones(101); 3];
    beams[1][100] = 1e-6;
    let selection =
        select_frequencies(&bank, &beams, &SelectionPolicy::BeamCriterion(1e-3)).unwrap();
    assert_eq!(selection.active_channels(0), 0..3);
    assert_eq!(selection.active_channels(2), 2..3);
}

#[test]
fn unresolvable_scale_is_a_config_error() {
    let bank = FilterBank::harmonic_bins(100, 50).unwrap();
    let mut beams = vec![Array1::ones(101); 2];
    beams[1][100] = 0.0;
    let err = select_frequencies(&bank, &beams, &SelectionPolicy::BeamCriterion(1e-3))
        .unwrap_err();
    assert!(matches!(err, SelectionError::NoneResolve { scale: 2, ell: 100 }));
    assert_eq!(err.class(), ErrorClass::Config);
}

#[test]
fn override_uses_the_highest_resolution_channels() {
    let bank = FilterBank::gaussian_needlets(100, 3, &[60.0, 30.0]).unwrap();
    let beams = beams(100, &[10.0, 5.0, 1.0, 0.5]);
    let selection =
        select_frequencies(&bank, &beams, &SelectionPolicy::Override(vec![4, 3, 1])).unwrap();
    assert_eq!(selection.active_channels(0), 0..4);
    assert_eq!(selection.active_channels(1), 1..4);
    assert_eq!(selection.active_channels(2), 3..4);
}

#[test]
fn bad_overrides() {
    let bank = FilterBank::gaussian_needlets(100, 3, &[60.0, 30.0]).unwrap();
    let beams = beams(100, &[10.0, 5.0]);
    assert!(matches!(
        select_frequencies(&bank, &beams, &SelectionPolicy::Override(vec![2, 2])),
        Err(SelectionError::OverrideLength { num_scales: 3, got: 2 })
    ));
    assert!(matches!(
        select_frequencies(&bank, &beams, &SelectionPolicy::Override(vec![2, 3, 1])),
        Err(SelectionError::OverrideCount { scale: 1, count: 3, .. })
    ));
    assert!(matches!(
        select_frequencies(&bank, &beams, &SelectionPolicy::Override(vec![2, 0, 1])),
        Err(SelectionError::OverrideCount { scale: 1, count: 0, .. })
    ));
}

#[test]
fn bad_criterion() {
    let bank = FilterBank::harmonic_bins(100, 50).unwrap();
    let beams = vec![Array1::ones(101)];
    for c in [0.0, 1.0, -0.5, f64::NAN] {
        assert!(matches!(
            select_frequencies(&bank, &beams, &SelectionPolicy::BeamCriterion(c)),
            Err(SelectionError::BadCriterion(_))
        ));
    }
}
