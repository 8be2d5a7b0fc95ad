// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from building filter banks.

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum FilterBankError {
    #[error("ELLMAX must be positive")]
    ZeroEllmax,

    #[error("At least one filter scale is required")]
    NoScales,

    #[error("{num_scales} needlet scales need {} Gaussian FWHMs, but {got} were given", .num_scales - 1)]
    FwhmCount { num_scales: usize, got: usize },

    #[error("Needlet FWHMs must be positive and finite; got {0} arcmin")]
    BadFwhm(f64),

    #[error("Needlet FWHMs must be strictly decreasing; got {0:?}")]
    FwhmNotDecreasing(Vec<f64>),

    #[error("Cannot make harmonic bins of width {bin_size} up to ELLMAX {ellmax}; the width must be at least 1 and at most ELLMAX")]
    BadBinSize { ellmax: usize, bin_size: usize },

    #[error("The squared filter windows sum to {sum} at ℓ = {l} rather than 1")]
    PartitionOfUnity { l: usize, sum: f64 },

    #[error("Scale {scale} only has {num_modes:.1} effective modes; the covariance localisation for ILC bias tolerance {bias_tol} would cover the whole sky")]
    TooFewModes {
        scale: usize,
        num_modes: f64,
        bias_tol: f64,
    },

    #[error("A taper width of {taper_width} is too broad for ELLMAX {ellmax}; ELLMAX - taper_width must exceed 10")]
    TaperTooWide { ellmax: usize, taper_width: usize },
}

impl FilterBankError {
    pub fn class(&self) -> ErrorClass {
        match self {
            FilterBankError::PartitionOfUnity { .. } => ErrorClass::Consistency,
            _ => ErrorClass::Config,
        }
    }
}
