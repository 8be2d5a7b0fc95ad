// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Applying ILC weights and summing scales into the final map.

mod error;
#[cfg(test)]
mod tests;

pub use error::RecombineError;

use log::debug;
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    filters::{FilterBank, WaveletType},
    params::ScaleError,
    transform::{Alm, HarmonicTransform},
    weights::{ScaleWeights, WeightSet},
};

/// Gather the per-scale results of a solve into a [`WeightSet`]. If any scale
/// failed, no weights are returned and the error names the first failed
/// scale.
pub fn collect_scale_results(
    kind: WaveletType,
    num_channels: usize,
    results: Vec<Result<ScaleWeights, ScaleError>>,
) -> Result<WeightSet, RecombineError> {
    let mut scales = Vec::with_capacity(results.len());
    for (scale, result) in results.into_iter().enumerate() {
        match result {
            Ok(w) => scales.push(w),
            Err(source) => return Err(RecombineError::ScaleFailed { scale, source }),
        }
    }
    Ok(WeightSet {
        kind,
        num_channels,
        scales,
    })
}

/// Check that a weight set can be applied with this filter bank to maps
/// with this many channels and pixels.
pub fn check_weight_set(
    weights: &WeightSet,
    bank: &FilterBank,
    num_channels: usize,
    num_pixels: usize,
) -> Result<(), RecombineError> {
    if weights.kind != bank.wavelet_type() {
        return Err(RecombineError::KindMismatch {
            weights: weights.kind,
            bank: bank.wavelet_type(),
        });
    }
    if weights.num_scales() != bank.num_scales() {
        return Err(RecombineError::ScaleCount {
            expected: bank.num_scales(),
            got: weights.num_scales(),
        });
    }
    if weights.num_channels != num_channels {
        return Err(RecombineError::ChannelCount {
            expected: num_channels,
            got: weights.num_channels,
        });
    }
    let num_units = match bank.wavelet_type() {
        WaveletType::GaussianNeedlets => num_pixels,
        WaveletType::HarmonicBins => 1,
    };
    for (scale, sw) in weights.scales.iter().enumerate() {
        if sw.num_units() != num_units {
            return Err(RecombineError::UnitCount {
                scale,
                expected: num_units,
                got: sw.num_units(),
            });
        }
        if sw.first_channel + sw.num_active() != num_channels {
            return Err(RecombineError::ActiveCount {
                scale,
                expected: num_channels.saturating_sub(sw.first_channel),
                got: sw.num_active(),
            });
        }
    }
    Ok(())
}

/// y(p) = Σ_c w_c(p) F_c(p), for the needlet-filtered maps F of a scale's
/// active channels and their per-pixel weights (pixel, channel).
pub fn combine_scale(
    filtered: &[Array1<f64>],
    weights: ArrayView2<f64>,
) -> Result<Array1<f64>, RecombineError> {
    let (npix, n) = weights.dim();
    if filtered.len() != n {
        return Err(RecombineError::MapCount {
            expected: n,
            got: filtered.len(),
        });
    }
    if let Some(bad) = filtered.iter().find(|m| m.len() != npix) {
        return Err(RecombineError::MapLength {
            expected: npix,
            got: bad.len(),
        });
    }

    let mut out = Array1::zeros(npix);
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(weights.outer_iter())
        .enumerate()
        .for_each(|(p, (mut y, w))| {
            let sum: f64 = w.iter().zip(filtered).map(|(w, f)| w * f[p]).sum();
            y.fill(sum);
        });
    Ok(out)
}

/// Σ_j T⁻¹[h_j · T y_j]; re-filtering every scale's ILC map with its window
/// and summing gives the full-resolution map, because the squared windows
/// sum to one.
pub fn synthesize_needlets<T: HarmonicTransform + ?Sized>(
    transform: &T,
    bank: &FilterBank,
    scale_maps: &[Array1<f64>],
) -> Result<Array1<f64>, RecombineError> {
    if scale_maps.len() != bank.num_scales() {
        return Err(RecombineError::ScaleCount {
            expected: bank.num_scales(),
            got: scale_maps.len(),
        });
    }
    let mut total = Alm::zeros(transform.lmax());
    for (j, y) in scale_maps.iter().enumerate() {
        let mut alm = transform.map2alm(y.view())?;
        alm.almxfl(bank.window(j))?;
        total.scaled_add(1.0, &alm)?;
    }
    debug!("Synthesised {} needlet scales", scale_maps.len());
    Ok(transform.alm2map(&total)?)
}

/// a_out(ℓm) = Σ_c w_{b(ℓ)c} a_c(ℓm), where b(ℓ) is the bin containing ℓ,
/// followed by a single inverse transform. `alms` holds every channel's
/// (beam-corrected) harmonic coefficients.
pub fn recombine_harmonic<T: HarmonicTransform + ?Sized>(
    transform: &T,
    bank: &FilterBank,
    weights: &WeightSet,
    alms: &[Alm],
) -> Result<Array1<f64>, RecombineError> {
    check_weight_set(weights, bank, alms.len(), transform.num_pixels())?;
    let lmax = transform.lmax();
    let mut out = Alm::zeros(lmax);
    for (scale, sw) in weights.scales.iter().enumerate() {
        let range = bank
            .bin_range(scale)
            .ok_or(RecombineError::KindMismatch {
                weights: weights.kind,
                bank: bank.wavelet_type(),
            })?;
        for (w, alm) in sw
            .weights
            .row(0)
            .iter()
            .zip(alms.iter().skip(sw.first_channel))
        {
            out.scaled_add_ells(*w, alm, range.clone())?;
        }
    }
    Ok(transform.alm2map(&out)?)
}
