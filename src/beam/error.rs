// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with beams.

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum BeamError {
    #[error("A Gaussian beam FWHM must be positive and finite; got {0} arcmin")]
    BadFwhm(f64),

    #[error("A beam profile has {got} multipoles, but at least {need} (ℓmax+1) are needed")]
    ProfileTooShort { need: usize, got: usize },

    #[error("A beam profile has a non-finite value at ℓ = {0}")]
    NonFiniteProfile(usize),
}

impl BeamError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Config
    }
}
