// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from covariance estimation.

use thiserror::Error;

use crate::{transform::TransformError, ErrorClass};

#[derive(Error, Debug)]
pub enum CovarianceError {
    #[error("No channels were given to estimate a covariance from")]
    NoChannels,

    #[error("Split 1 has {split1} channels but split 2 has {split2}")]
    SplitCount { split1: usize, split2: usize },

    #[error("A covariance matrix has non-finite entries")]
    NonFinite,

    #[error("The covariance matrix of unit {unit} has non-finite entries")]
    NonFiniteAt { unit: usize },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl CovarianceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CovarianceError::NoChannels | CovarianceError::SplitCount { .. } => {
                ErrorClass::Consistency
            }
            CovarianceError::NonFinite | CovarianceError::NonFiniteAt { .. } => {
                ErrorClass::Estimation
            }
            CovarianceError::Transform(e) => e.class(),
        }
    }
}
