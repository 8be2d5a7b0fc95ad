// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against command-line interfaces that aren't big enough to go in their
//! own modules.

use super::*;
use crate::HarmonicTransform;

#[test]
fn filter_bank_defaults_to_gaussian_needlets() {
    let (ellmax, filters) = FilterBankArgs {
        ellmax: Some(128),
        ..Default::default()
    }
    .parse()
    .unwrap();
    assert_eq!(ellmax, 128);
    assert_eq!(
        filters,
        FilterConfig::GaussianNeedlets {
            num_scales: DEFAULT_GN_FWHM_ARCMIN.len() + 1,
            fwhm_arcmin: DEFAULT_GN_FWHM_ARCMIN.to_vec(),
        }
    );

    // Asking for fewer scales uses the largest default FWHMs.
    let (_, filters) = FilterBankArgs {
        ellmax: Some(128),
        num_scales: Some(3),
        ..Default::default()
    }
    .parse()
    .unwrap();
    assert_eq!(
        filters,
        FilterConfig::GaussianNeedlets {
            num_scales: 3,
            fwhm_arcmin: vec![600.0, 300.0],
        }
    );

    // Given FWHMs set the number of scales.
    let (_, filters) = FilterBankArgs {
        ellmax: Some(128),
        gn_fwhm_arcmin: Some(vec![100.0, 50.0, 20.0]),
        ..Default::default()
    }
    .parse()
    .unwrap();
    assert_eq!(filters.wavelet_type(), WaveletType::GaussianNeedlets);
    assert!(matches!(
        filters,
        FilterConfig::GaussianNeedlets { num_scales: 4, .. }
    ));
}

#[test]
fn harmonic_bins_need_a_bin_size() {
    let args = FilterBankArgs {
        ellmax: Some(100),
        wavelet_type: Some("HarmonicBins".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        args.clone().parse(),
        Err(CommonArgsError::NoBinSize)
    ));

    let (_, filters) = FilterBankArgs {
        bin_size: Some(20),
        ..args
    }
    .parse()
    .unwrap();
    assert_eq!(filters, FilterConfig::HarmonicBins { bin_size: 20 });
}

#[test]
fn bad_filter_bank_args_are_rejected() {
    assert!(matches!(
        FilterBankArgs::default().parse(),
        Err(CommonArgsError::NoEllmax)
    ));

    let result = FilterBankArgs {
        ellmax: Some(100),
        wavelet_type: Some("mexican_hat".to_string()),
        ..Default::default()
    }
    .parse();
    match result {
        Err(CommonArgsError::BadWaveletType { got, valid }) => {
            assert_eq!(got, "mexican_hat");
            assert!(valid.contains("GaussianNeedlets"));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(matches!(
        FilterBankArgs {
            ellmax: Some(100),
            num_scales: Some(20),
            ..Default::default()
        }
        .parse(),
        Err(CommonArgsError::TooManyDefaultScales { num_scales: 20, max: 10 })
    ));
}

#[test]
fn cli_filter_args_take_precedence() {
    let cli = FilterBankArgs {
        ellmax: Some(64),
        ..Default::default()
    };
    let file = FilterBankArgs {
        ellmax: Some(32),
        bin_size: Some(8),
        ..Default::default()
    };
    let merged = cli.merge(file);
    assert_eq!(merged.ellmax, Some(64));
    assert_eq!(merged.bin_size, Some(8));
    assert!(merged.wavelet_type.is_none());
}

#[test]
fn grid_defaults_to_the_smallest_exact_grid() {
    let grid = GridArgs::default().parse(16).unwrap();
    assert_eq!(grid.nlat(), 17);
    assert_eq!(grid.nlon(), 34);
    assert_eq!(grid.num_pixels(), 17 * 34);

    let grid = GridArgs {
        nlat: Some(20),
        nlon: None,
    }
    .parse(16)
    .unwrap();
    assert_eq!(grid.nlat(), 20);
    assert_eq!(grid.nlon(), 34);

    // Too few rings can't be exact.
    assert!(GridArgs {
        nlat: Some(8),
        nlon: None,
    }
    .parse(16)
    .is_err());
}
