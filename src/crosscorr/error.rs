// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from cross-correlating maps.

use thiserror::Error;

use crate::{transform::TransformError, ErrorClass};

#[derive(Error, Debug)]
pub enum CrossCorrError {
    #[error("The mask has {mask} pixels but the maps have {map}")]
    MaskLength { mask: usize, map: usize },

    #[error("The mask covers no sky (f_sky = {0})")]
    EmptyMask(f64),

    #[error("The spectrum bin width must be positive")]
    ZeroBinWidth,

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl CrossCorrError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CrossCorrError::Transform(e) => e.class(),
            _ => ErrorClass::Config,
        }
    }
}
