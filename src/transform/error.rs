// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from harmonic transforms.

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("A map has {got} pixels, but the harmonic transform expects {expected}")]
    MapSize { expected: usize, got: usize },

    #[error("Harmonic coefficients have ℓmax {got}, but {expected} was expected")]
    AlmLmax { expected: usize, got: usize },

    #[error("Expected {expected} harmonic coefficients for ℓmax {lmax}, but got {got}")]
    AlmSize {
        lmax: usize,
        expected: usize,
        got: usize,
    },

    #[error("A transfer function has {got} entries, but at least {need} (ℓmax+1) are needed")]
    TransferLength { need: usize, got: usize },

    #[error("A Gauss-Legendre grid for ℓmax {lmax} needs at least {min_nlat} rings and {min_nlon} pixels per ring; got {nlat} rings of {nlon} pixels")]
    GridTooSmall {
        lmax: usize,
        nlat: usize,
        nlon: usize,
        min_nlat: usize,
        min_nlon: usize,
    },
}

impl TransformError {
    pub fn class(&self) -> ErrorClass {
        match self {
            TransformError::MapSize { .. } | TransformError::GridTooSmall { .. } => {
                ErrorClass::Config
            }
            TransformError::AlmLmax { .. }
            | TransformError::AlmSize { .. }
            | TransformError::TransferLength { .. } => ErrorClass::Consistency,
        }
    }
}
