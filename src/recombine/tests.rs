// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;
use crate::{
    tests::random_map,
    transform::GaussLegendreGrid,
    weights::WeightError,
    ErrorClass,
};

fn uniform_scale(first_channel: usize, num_units: usize, num_active: usize) -> ScaleWeights {
    ScaleWeights {
        first_channel,
        weights: Array2::from_elem((num_units, num_active), 1.0 / num_active as f64),
    }
}

#[test]
fn combine_scale_weights_every_pixel() {
    let filtered = vec![array![1.0, 2.0, 3.0], array![10.0, 20.0, 30.0]];
    let weights = array![[1.0, 0.0], [0.5, 0.5], [-1.0, 2.0]];
    let y = combine_scale(&filtered, weights.view()).unwrap();
    assert_abs_diff_eq!(y, array![1.0, 11.0, 57.0]);

    let err = combine_scale(&filtered[..1], weights.view()).unwrap_err();
    assert!(matches!(err, RecombineError::MapCount { expected: 2, got: 1 }));

    let short = vec![array![1.0, 2.0, 3.0], array![10.0, 20.0]];
    let err = combine_scale(&short, weights.view()).unwrap_err();
    assert!(matches!(err, RecombineError::MapLength { expected: 3, got: 2 }));
    assert_eq!(err.class(), ErrorClass::Consistency);
}

#[test]
fn needlet_synthesis_recovers_the_map() {
    let lmax = 24;
    let grid = GaussLegendreGrid::with_lmax(lmax);
    let bank = FilterBank::gaussian_needlets(lmax, 3, &[300.0, 120.0]).unwrap();
    let map = random_map(&grid, 1.0, 5);

    let alm = grid.map2alm(map.view()).unwrap();
    let scale_maps: Vec<Array1<f64>> = (0..3)
        .map(|j| {
            let mut a = alm.clone();
            a.almxfl(bank.window(j)).unwrap();
            grid.alm2map(&a).unwrap()
        })
        .collect();
    let out = synthesize_needlets(&grid, &bank, &scale_maps).unwrap();
    for (a, b) in out.iter().zip(map.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-10);
    }

    let err = synthesize_needlets(&grid, &bank, &scale_maps[..2]).unwrap_err();
    assert!(matches!(err, RecombineError::ScaleCount { expected: 3, got: 2 }));
}

#[test]
fn harmonic_recombination_picks_channels_per_bin() {
    let lmax = 16;
    let grid = GaussLegendreGrid::with_lmax(lmax);
    let bank = FilterBank::harmonic_bins(lmax, 8).unwrap();
    let maps = [random_map(&grid, 1.0, 1), random_map(&grid, 1.0, 2)];
    let alms: Vec<_> = maps.iter().map(|m| grid.map2alm(m.view()).unwrap()).collect();

    // Channel 0 below ℓ = 8, channel 1 above; the last bin only uses
    // channel 1.
    let weights = WeightSet {
        kind: WaveletType::HarmonicBins,
        num_channels: 2,
        scales: vec![
            ScaleWeights {
                first_channel: 0,
                weights: array![[1.0, 0.0]],
            },
            ScaleWeights {
                first_channel: 0,
                weights: array![[0.0, 1.0]],
            },
            ScaleWeights {
                first_channel: 1,
                weights: array![[1.0]],
            },
        ],
    };
    let out = recombine_harmonic(&grid, &bank, &weights, &alms).unwrap();
    let out_alm = grid.map2alm(out.view()).unwrap();
    for l in 0..=lmax {
        let expected = if l < 8 { &alms[0] } else { &alms[1] };
        for m in 0..=l {
            let (a, b) = (out_alm.get(l, m), expected.get(l, m));
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
        }
    }
}

#[test]
fn weight_sets_are_checked() {
    let bank = FilterBank::gaussian_needlets(16, 2, &[300.0]).unwrap();
    let npix = 10;
    let good = WeightSet {
        kind: WaveletType::GaussianNeedlets,
        num_channels: 3,
        scales: vec![uniform_scale(0, npix, 3), uniform_scale(1, npix, 2)],
    };
    assert!(check_weight_set(&good, &bank, 3, npix).is_ok());

    let mut bad = good.clone();
    bad.kind = WaveletType::HarmonicBins;
    assert!(matches!(
        check_weight_set(&bad, &bank, 3, npix),
        Err(RecombineError::KindMismatch { .. })
    ));

    let mut bad = good.clone();
    bad.scales.pop();
    assert!(matches!(
        check_weight_set(&bad, &bank, 3, npix),
        Err(RecombineError::ScaleCount { expected: 2, got: 1 })
    ));

    assert!(matches!(
        check_weight_set(&good, &bank, 4, npix),
        Err(RecombineError::ChannelCount { expected: 4, got: 3 })
    ));

    assert!(matches!(
        check_weight_set(&good, &bank, 3, npix + 1),
        Err(RecombineError::UnitCount { scale: 0, .. })
    ));

    let mut bad = good;
    bad.scales[1] = uniform_scale(0, npix, 2);
    assert!(matches!(
        check_weight_set(&bad, &bank, 3, npix),
        Err(RecombineError::ActiveCount {
            scale: 1,
            expected: 3,
            got: 2
        })
    ));
}

#[test]
fn any_failed_scale_means_no_weights() {
    let ok = collect_scale_results(
        WaveletType::HarmonicBins,
        2,
        vec![Ok(uniform_scale(0, 1, 2)), Ok(uniform_scale(1, 1, 1))],
    )
    .unwrap();
    assert_eq!(ok.num_scales(), 2);
    assert_eq!(ok.num_channels, 2);

    let err = collect_scale_results(
        WaveletType::HarmonicBins,
        2,
        vec![
            Ok(uniform_scale(0, 1, 2)),
            Err(ScaleError::Weight(WeightError::NotPositiveDefinite)),
            Err(ScaleError::Weight(WeightError::DependentResponses { condition: 0.0 })),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, RecombineError::ScaleFailed { scale: 1, .. }));
    assert_eq!(err.class(), ErrorClass::Estimation);
}
