// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Harmonic-space filter banks.
//!
//! A filter bank splits harmonic space into "scales". For Gaussian needlets,
//! each scale has a smooth window h_j(ℓ) and Σ_j h_j(ℓ)² = 1, so filtering a
//! map with h_j and then again with h_j before summing over scales gives back
//! the original map. For harmonic bins, each window is the indicator of a
//! contiguous range of multipoles.

mod error;

pub use error::FilterBankError;

use std::ops::RangeInclusive;

use log::{debug, trace};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    beam::gauss_beam,
    constants::{ARCMIN_TO_RAD, SIGMA_TO_FWHM, PARTITION_OF_UNITY_TOL, PI, TAPER_STEEPNESS},
};

/// The kinds of filter bank that can be used.
#[derive(
    Debug, Display, EnumIter, EnumString, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum WaveletType {
    /// Needlet-space ILC; weights vary over the sky.
    GaussianNeedlets,

    /// Harmonic ILC; one set of weights per multipole bin.
    HarmonicBins,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterKind {
    GaussianNeedlets { fwhm_arcmin: Vec<f64> },
    HarmonicBins { ranges: Vec<RangeInclusive<usize>> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    ellmax: usize,
    kind: FilterKind,

    /// The harmonic windows. The first dimension is scale, the second is ℓ
    /// (0..=ellmax).
    windows: Array2<f64>,
}

impl FilterBank {
    /// Build Gaussian needlets from the differences of Gaussian beams with
    /// the given FWHMs \[arcmin\]. There must be `num_scales - 1` FWHMs, in
    /// strictly decreasing order.
    pub fn gaussian_needlets(
        ellmax: usize,
        num_scales: usize,
        fwhm_arcmin: &[f64],
    ) -> Result<FilterBank, FilterBankError> {
        if ellmax == 0 {
            return Err(FilterBankError::ZeroEllmax);
        }
        if num_scales == 0 {
            return Err(FilterBankError::NoScales);
        }
        if fwhm_arcmin.len() != num_scales - 1 {
            return Err(FilterBankError::FwhmCount {
                num_scales,
                got: fwhm_arcmin.len(),
            });
        }
        if let Some(&bad) = fwhm_arcmin.iter().find(|f| !f.is_finite() || **f <= 0.0) {
            return Err(FilterBankError::BadFwhm(bad));
        }
        if fwhm_arcmin.windows(2).any(|w| w[1] >= w[0]) {
            return Err(FilterBankError::FwhmNotDecreasing(fwhm_arcmin.to_vec()));
        }

        let gaussians: Vec<Array1<f64>> = fwhm_arcmin
            .iter()
            .map(|f| gauss_beam(f * ARCMIN_TO_RAD, ellmax))
            .collect();
        let mut windows = Array2::ones((num_scales, ellmax + 1));
        if let (Some(first), Some(last)) = (gaussians.first(), gaussians.last()) {
            windows.row_mut(0).assign(first);
            for (i, pair) in gaussians.windows(2).enumerate() {
                windows
                    .row_mut(i + 1)
                    .iter_mut()
                    .zip(pair[0].iter().zip(pair[1].iter()))
                    .for_each(|(h, (&g_prev, &g))| *h = (g * g - g_prev * g_prev).max(0.0).sqrt());
            }
            windows
                .row_mut(num_scales - 1)
                .iter_mut()
                .zip(last.iter())
                .for_each(|(h, &g)| *h = (1.0 - g * g).max(0.0).sqrt());
        }

        let bank = FilterBank {
            ellmax,
            kind: FilterKind::GaussianNeedlets {
                fwhm_arcmin: fwhm_arcmin.to_vec(),
            },
            windows,
        };
        bank.check_partition_of_unity()?;
        debug!("Built {num_scales} Gaussian needlet scales up to ℓ = {ellmax}");
        Ok(bank)
    }

    /// Split 0..=`ellmax` into consecutive bins of width `bin_size`; the last
    /// bin may be narrower.
    pub fn harmonic_bins(ellmax: usize, bin_size: usize) -> Result<FilterBank, FilterBankError> {
        if bin_size == 0 || ellmax < bin_size {
            return Err(FilterBankError::BadBinSize { ellmax, bin_size });
        }
        let ranges: Vec<RangeInclusive<usize>> = (0..=ellmax)
            .step_by(bin_size)
            .map(|lo| lo..=(lo + bin_size - 1).min(ellmax))
            .collect();
        let mut windows = Array2::zeros((ranges.len(), ellmax + 1));
        for (mut row, range) in windows.outer_iter_mut().zip(ranges.iter()) {
            row.slice_mut(s![range.clone()]).fill(1.0);
        }
        debug!(
            "Built {} harmonic bins of width {bin_size} up to ℓ = {ellmax}",
            ranges.len()
        );
        Ok(FilterBank {
            ellmax,
            kind: FilterKind::HarmonicBins { ranges },
            windows,
        })
    }

    pub fn ellmax(&self) -> usize {
        self.ellmax
    }

    pub fn num_scales(&self) -> usize {
        self.windows.len_of(Axis(0))
    }

    pub fn wavelet_type(&self) -> WaveletType {
        match self.kind {
            FilterKind::GaussianNeedlets { .. } => WaveletType::GaussianNeedlets,
            FilterKind::HarmonicBins { .. } => WaveletType::HarmonicBins,
        }
    }

    /// The FWHMs the needlets were built from, if this is a needlet bank.
    pub fn needlet_fwhm_arcmin(&self) -> Option<&[f64]> {
        match &self.kind {
            FilterKind::GaussianNeedlets { fwhm_arcmin } => Some(fwhm_arcmin),
            FilterKind::HarmonicBins { .. } => None,
        }
    }

    pub fn window(&self, scale: usize) -> ArrayView1<f64> {
        self.windows.row(scale)
    }

    pub fn windows(&self) -> ArrayView2<f64> {
        self.windows.view()
    }

    /// The multipoles in a harmonic bin, if this is a bin bank.
    pub fn bin_range(&self, scale: usize) -> Option<RangeInclusive<usize>> {
        match &self.kind {
            FilterKind::GaussianNeedlets { .. } => None,
            FilterKind::HarmonicBins { ranges } => ranges.get(scale).cloned(),
        }
    }

    /// The scale that each multipole belongs to. Only meaningful for
    /// harmonic bins; every needlet scale covers every multipole.
    pub fn bin_of_ell(&self, l: usize) -> Option<usize> {
        match &self.kind {
            FilterKind::GaussianNeedlets { .. } => None,
            FilterKind::HarmonicBins { ranges } => ranges.iter().position(|r| r.contains(&l)),
        }
    }

    /// Check that the squared windows sum to one at every multipole. Harmonic
    /// bins trivially satisfy this too.
    pub fn check_partition_of_unity(&self) -> Result<(), FilterBankError> {
        for (l, column) in self.windows.axis_iter(Axis(1)).enumerate() {
            let sum: f64 = column.iter().map(|h| h * h).sum();
            let deviation = (sum - 1.0).abs();
            if !(deviation < PARTITION_OF_UNITY_TOL) {
                return Err(FilterBankError::PartitionOfUnity { l, sum });
            }
        }
        Ok(())
    }

    /// The multipole that characterises each scale's smallest angular scale.
    /// A channel whose beam has fallen below `criterion` here can't
    /// contribute to this scale.
    pub fn characteristic_ells(&self, criterion: f64) -> Vec<usize> {
        let num_scales = self.num_scales();
        match &self.kind {
            FilterKind::HarmonicBins { ranges } => ranges.iter().map(|r| *r.end()).collect(),

            FilterKind::GaussianNeedlets { .. } if num_scales == 1 => vec![self.ellmax],

            FilterKind::GaussianNeedlets { .. } => {
                let mut ells = Vec::with_capacity(num_scales);
                for window in self.windows.outer_iter().take(num_scales - 1) {
                    let peak = window
                        .iter()
                        .enumerate()
                        .fold((0, f64::NEG_INFINITY), |acc, (l, &h)| {
                            if h > acc.1 {
                                (l, h)
                            } else {
                                acc
                            }
                        })
                        .0;
                    let ell = window
                        .iter()
                        .enumerate()
                        .skip(peak)
                        .find(|&(_, &h)| h <= criterion)
                        .map(|(l, _)| l)
                        .unwrap_or(self.ellmax);
                    ells.push(ell);
                }
                // The high-pass scale never falls off; use the previous one.
                let last = ells[num_scales - 2];
                ells.push(last);
                trace!("Characteristic multipoles: {ells:?}");
                ells
            }
        }
    }

    /// The effective number of harmonic modes in a scale, Σ_ℓ (2ℓ+1) h(ℓ)².
    pub fn effective_modes(&self, scale: usize) -> f64 {
        self.windows
            .row(scale)
            .iter()
            .enumerate()
            .map(|(l, h)| (2 * l + 1) as f64 * h * h)
            .sum()
    }

    /// The FWHM \[radians\] of the real-space Gaussian over which covariances
    /// are estimated for a needlet scale.
    ///
    /// The ILC bias of a covariance estimated from N_eff modes is roughly
    /// |N_deproj + 1 − N_active| / N_eff, and a Gaussian of width σ contains
    /// N_eff = N_modes σ²/2 of the scale's modes (flat-sky). Requiring this
    /// to be at most `bias_tol` sets σ.
    pub fn localisation_fwhm(
        &self,
        scale: usize,
        num_active: usize,
        num_deproj: usize,
        bias_tol: f64,
    ) -> Result<f64, FilterBankError> {
        let num_modes = self.effective_modes(scale);
        let mut dof = (num_deproj as f64 + 1.0 - num_active as f64).abs();
        // A fully-constrained problem has no bias; fall back to one degree of
        // freedom.
        if dof == 0.0 {
            dof = 1.0;
        }
        let sigma = (2.0 * dof / (num_modes * bias_tol)).sqrt();
        if !(sigma < PI) {
            return Err(FilterBankError::TooFewModes {
                scale,
                num_modes,
                bias_tol,
            });
        }
        Ok(SIGMA_TO_FWHM * sigma)
    }
}

/// A smooth taper that rolls off from 1 to 0 around ℓ = `ellmax` −
/// `taper_width`, suppressing aliasing from the sharp truncation at
/// `ellmax`.
pub fn taper(ellmax: usize, taper_width: usize) -> Result<Array1<f64>, FilterBankError> {
    if taper_width + 10 >= ellmax {
        return Err(FilterBankError::TaperTooWide {
            ellmax,
            taper_width,
        });
    }
    let centre = (ellmax - taper_width) as f64;
    Ok(Array1::from_shape_fn(ellmax + 1, |l| {
        1.0 - 0.5 * ((TAPER_STEEPNESS * (l as f64 - centre)).tanh() + 1.0)
    }))
}
