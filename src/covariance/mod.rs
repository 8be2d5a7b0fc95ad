// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Estimating channel-channel covariance matrices.
//!
//! For needlets, the covariance is local: at every pixel it is the
//! Gaussian-weighted average of the products of (locally mean-subtracted)
//! filtered maps. For harmonic bins, it is the average of the cross power
//! spectra over the bin.
//!
//! With cross-ILC, two noise-independent splits of each channel are used and
//! only cross-split products enter the covariance, so the noise auto-power
//! doesn't bias the weights.

mod error;
#[cfg(test)]
mod tests;

pub use error::CovarianceError;

use std::ops::RangeInclusive;

use itertools::Itertools;
use log::{trace, warn};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{
    constants::COVARIANCE_REGULARISATION_EPS,
    transform::{num_modes, smoothing, Alm, HarmonicTransform},
};

/// The data that a covariance is estimated from; one entry per active
/// channel. `T` is a map (needlets) or harmonic coefficients (harmonic bins).
#[derive(Debug)]
pub enum CovarianceInput<'a, T> {
    Standard(&'a [T]),

    /// Two noise-independent splits of each channel.
    CrossSplits { split1: &'a [T], split2: &'a [T] },
}

impl<T> Clone for CovarianceInput<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CovarianceInput<'_, T> {}

impl<T> CovarianceInput<'_, T> {
    pub fn num_channels(&self) -> usize {
        match self {
            CovarianceInput::Standard(d) => d.len(),
            CovarianceInput::CrossSplits { split1, .. } => split1.len(),
        }
    }

    fn check(&self) -> Result<usize, CovarianceError> {
        if let CovarianceInput::CrossSplits { split1, split2 } = self {
            if split1.len() != split2.len() {
                return Err(CovarianceError::SplitCount {
                    split1: split1.len(),
                    split2: split2.len(),
                });
            }
        }
        match self.num_channels() {
            0 => Err(CovarianceError::NoChannels),
            n => Ok(n),
        }
    }
}

/// All (a, b) with a ≤ b.
fn channel_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).tuple_combinations().chain((0..n).map(|a| (a, a))).collect()
}

/// Per-pixel covariance matrices of needlet-filtered maps. `fwhm` is the
/// FWHM \[radians\] of the Gaussian localisation kernel. The result has
/// dimensions (pixel, channel, channel).
pub fn needlet_covariance<T: HarmonicTransform + ?Sized>(
    transform: &T,
    input: CovarianceInput<Array1<f64>>,
    fwhm: f64,
) -> Result<Array3<f64>, CovarianceError> {
    let n = input.check()?;
    let npix = transform.num_pixels();

    // Subtract the local mean of every map.
    let residuals = |maps: &[Array1<f64>]| -> Result<Vec<Array1<f64>>, CovarianceError> {
        maps.par_iter()
            .map(|map| {
                let mean = smoothing(transform, map.view(), fwhm)?;
                Ok(map - &mean)
            })
            .collect()
    };
    let (r1, r2) = match input {
        CovarianceInput::Standard(maps) => (residuals(maps)?, None),
        CovarianceInput::CrossSplits { split1, split2 } => {
            (residuals(split1)?, Some(residuals(split2)?))
        }
    };

    let pairs = channel_pairs(n);
    let smoothed: Vec<Array1<f64>> = pairs
        .par_iter()
        .map(|&(a, b)| {
            let product = match &r2 {
                None => &r1[a] * &r1[b],
                Some(r2) => (&r1[a] * &r2[b] + &r1[b] * &r2[a]) * 0.5,
            };
            Ok(smoothing(transform, product.view(), fwhm)?)
        })
        .collect::<Result<_, CovarianceError>>()?;

    let mut arena = Array3::zeros((npix, n, n));
    for (&(a, b), field) in pairs.iter().zip(smoothed.iter()) {
        arena.slice_mut(s![.., a, b]).assign(field);
        if a != b {
            arena.slice_mut(s![.., b, a]).assign(field);
        }
    }
    trace!("Estimated {npix} local {n}x{n} covariances");
    Ok(arena)
}

/// The covariance of harmonic coefficients over a multipole bin,
/// C_ab = Σ_ℓ (2ℓ+1) C_ℓ^{ab} / Σ_ℓ (2ℓ+1).
pub fn harmonic_covariance(
    input: CovarianceInput<Alm>,
    range: RangeInclusive<usize>,
) -> Result<Array2<f64>, CovarianceError> {
    let n = input.check()?;
    let modes = num_modes(range.clone());
    let mut cov = Array2::zeros((n, n));
    for (a, b) in channel_pairs(n) {
        let c = match input {
            CovarianceInput::Standard(alms) => alms[a].cross_mode_sum(&alms[b], range.clone())?,
            CovarianceInput::CrossSplits { split1, split2 } => {
                0.5 * (split1[a].cross_mode_sum(&split2[b], range.clone())?
                    + split1[b].cross_mode_sum(&split2[a], range.clone())?)
            }
        } / modes;
        cov[(a, b)] = c;
        cov[(b, a)] = c;
    }
    Ok(cov)
}

/// Make a covariance matrix safely invertible.
///
/// If its smallest eigenvalue is below ε λ_max, the diagonal is loaded by
/// ε λ_max − λ_min, and the loading is returned. A matrix with no positive
/// eigenvalue (e.g. all zeros) is replaced by the identity.
pub fn regularise(mut cov: ArrayViewMut2<f64>) -> Result<Option<f64>, CovarianceError> {
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(CovarianceError::NonFinite);
    }
    let n = cov.nrows();
    let m = DMatrix::from_fn(n, n, |i, j| cov[(i, j)]);
    let eigenvalues = SymmetricEigen::new(m).eigenvalues;
    let max = eigenvalues.max();
    let min = eigenvalues.min();
    if !(max > 0.0) {
        cov.fill(0.0);
        cov.diag_mut().fill(1.0);
        return Ok(Some(1.0));
    }
    let floor = COVARIANCE_REGULARISATION_EPS * max;
    if min < floor {
        let loading = floor - min;
        cov.diag_mut().iter_mut().for_each(|d| *d += loading);
        Ok(Some(loading))
    } else {
        Ok(None)
    }
}

/// Regularise every unit (pixel or bin) of a covariance arena, returning how
/// many were loaded. Shapes are (unit, channel, channel).
pub fn regularise_arena(arena: &mut Array3<f64>, scale: usize) -> Result<usize, CovarianceError> {
    let loaded: Vec<bool> = arena
        .outer_iter_mut()
        .into_par_iter()
        .enumerate()
        .map(|(unit, cov)| match regularise(cov) {
            Ok(l) => Ok(l.is_some()),
            Err(CovarianceError::NonFinite) => Err(CovarianceError::NonFiniteAt { unit }),
            Err(e) => Err(e),
        })
        .collect::<Result<_, _>>()?;
    let count = loaded.into_iter().filter(|&l| l).count();
    if count > 0 {
        warn!(
            "Scale {scale}: {count} of {} covariance matrices were ill-conditioned and regularised",
            arena.len_of(Axis(0))
        );
    }
    Ok(count)
}
