// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Instrumental beams in harmonic space.
//!
//! Every frequency channel has been observed through a beam b_ℓ. Before maps
//! can be combined they are brought to a common resolution by multiplying
//! their harmonic coefficients by b_ℓ^common / b_ℓ^channel.

mod error;

pub use error::BeamError;

use ndarray::prelude::*;

use crate::constants::{ARCMIN_TO_RAD, SIGMA_TO_FWHM, MIN_DECONVOLVABLE_BEAM};

/// The beam of a frequency channel.
#[derive(Debug, Clone, PartialEq)]
pub enum BeamProfile {
    /// A circular Gaussian beam.
    Gaussian { fwhm_arcmin: f64 },

    /// A tabulated harmonic transfer function, starting at ℓ = 0.
    Profile(Vec<f64>),
}

impl BeamProfile {
    /// The beam transfer function b_ℓ for ℓ = 0..=`lmax`.
    pub fn transfer(&self, lmax: usize) -> Result<Array1<f64>, BeamError> {
        match self {
            BeamProfile::Gaussian { fwhm_arcmin } => {
                if !fwhm_arcmin.is_finite() || *fwhm_arcmin <= 0.0 {
                    return Err(BeamError::BadFwhm(*fwhm_arcmin));
                }
                Ok(gauss_beam(fwhm_arcmin * ARCMIN_TO_RAD, lmax))
            }

            BeamProfile::Profile(b) => {
                if b.len() < lmax + 1 {
                    return Err(BeamError::ProfileTooShort {
                        need: lmax + 1,
                        got: b.len(),
                    });
                }
                if let Some(l) = b[..=lmax].iter().position(|v| !v.is_finite()) {
                    return Err(BeamError::NonFiniteProfile(l));
                }
                Ok(Array1::from(b[..=lmax].to_vec()))
            }
        }
    }

    /// The FWHM of this beam if it is Gaussian \[arcminutes\].
    pub fn fwhm_arcmin(&self) -> Option<f64> {
        match self {
            BeamProfile::Gaussian { fwhm_arcmin } => Some(*fwhm_arcmin),
            BeamProfile::Profile(_) => None,
        }
    }
}

impl std::fmt::Display for BeamProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeamProfile::Gaussian { fwhm_arcmin } => write!(f, "Gaussian, FWHM {fwhm_arcmin}'"),
            BeamProfile::Profile(b) => write!(f, "tabulated ({} multipoles)", b.len()),
        }
    }
}

/// exp(−ℓ(ℓ+1)σ²/2) for ℓ = 0..=`lmax`, where σ = FWHM / √(8 ln 2) and the
/// FWHM is in radians.
pub fn gauss_beam(fwhm: f64, lmax: usize) -> Array1<f64> {
    let sigma = fwhm / SIGMA_TO_FWHM;
    let half_var = 0.5 * sigma * sigma;
    Array1::from_shape_fn(lmax + 1, |l| {
        let l = l as f64;
        (-l * (l + 1.0) * half_var).exp()
    })
}

/// The transfer function taking maps observed with `input` to the `target`
/// resolution. Multipoles where the input beam is too small to deconvolve are
/// set to zero rather than amplified.
pub fn rebeam_transfer(target: ArrayView1<f64>, input: ArrayView1<f64>) -> Array1<f64> {
    let mut out = Array1::zeros(target.len().min(input.len()));
    out.iter_mut()
        .zip(target.iter().zip(input.iter()))
        .for_each(|(o, (&t, &b))| {
            if b.abs() >= MIN_DECONVOLVABLE_BEAM {
                *o = t / b;
            }
        });
    out
}
