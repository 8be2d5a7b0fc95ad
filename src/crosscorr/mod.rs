// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cross power spectra of output maps against auxiliary maps.

mod error;

pub use error::CrossCorrError;

use log::debug;
use ndarray::prelude::*;

use crate::transform::{map_mean, HarmonicTransform};

/// The cross power spectrum C_ℓ^{XY} of two maps for ℓ = 0..=ℓmax.
///
/// With a mask, both maps are multiplied by it and the pseudo-spectrum is
/// divided by f_sky = ⟨mask²⟩, the sky average of the squared mask.
pub fn cross_spectrum<T: HarmonicTransform + ?Sized>(
    transform: &T,
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    mask: Option<ArrayView1<f64>>,
) -> Result<Array1<f64>, CrossCorrError> {
    match mask {
        None => {
            let x_alm = transform.map2alm(x)?;
            let y_alm = transform.map2alm(y)?;
            Ok(x_alm.cross_cl(&y_alm)?)
        }

        Some(mask) => {
            if mask.len() != x.len() || mask.len() != y.len() {
                return Err(CrossCorrError::MaskLength {
                    mask: mask.len(),
                    map: x.len().max(y.len()),
                });
            }
            let mask_sq = &mask * &mask;
            let f_sky = map_mean(transform, mask_sq.view())?;
            if !(f_sky > 0.0) {
                return Err(CrossCorrError::EmptyMask(f_sky));
            }
            debug!("Mask sky fraction: {f_sky:.4}");
            let x_alm = transform.map2alm((&x * &mask).view())?;
            let y_alm = transform.map2alm((&y * &mask).view())?;
            Ok(x_alm.cross_cl(&y_alm)? / f_sky)
        }
    }
}

/// A power spectrum averaged in linear multipole bins.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedSpectrum {
    /// The mean multipole of each bin.
    pub centres: Vec<f64>,

    /// The mean of C_ℓ over each bin.
    pub values: Vec<f64>,
}

/// Average a spectrum in bins of `bin_width` multipoles, starting at ℓ = 0.
/// The last bin may be narrower.
pub fn bin_spectrum(
    cl: ArrayView1<f64>,
    bin_width: usize,
) -> Result<BinnedSpectrum, CrossCorrError> {
    if bin_width == 0 {
        return Err(CrossCorrError::ZeroBinWidth);
    }
    let (centres, values) = cl
        .axis_chunks_iter(Axis(0), bin_width)
        .enumerate()
        .map(|(i, chunk)| {
            let lo = i * bin_width;
            let centre = lo as f64 + (chunk.len() - 1) as f64 / 2.0;
            (centre, chunk.mean().unwrap_or(0.0))
        })
        .unzip();
    Ok(BinnedSpectrum { centres, values })
}
