// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from solving for or persisting ILC weights.

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum WeightError {
    #[error("{num_constraints} constraints (1 preserved + {} deprojected) can't be satisfied with only {num_channels} channels", .num_constraints - 1)]
    TooManyConstraints {
        num_constraints: usize,
        num_channels: usize,
    },

    #[error("The component responses are linearly dependent over the active channels (condition {condition:e})")]
    DependentResponses { condition: f64 },

    #[error("Response {constraint} has {got} entries, but there are {expected} active channels")]
    ResponseLength {
        constraint: usize,
        expected: usize,
        got: usize,
    },

    #[error("Expected a {expected}x{expected} covariance matrix, got {got:?}")]
    CovarianceShape {
        expected: usize,
        got: (usize, usize),
    },

    #[error("A covariance matrix is not positive definite")]
    NotPositiveDefinite,

    #[error("The weights' response to constraint {constraint} is {achieved}, not {target} (tolerance {resp_tol})")]
    ResponseCheck {
        constraint: usize,
        achieved: f64,
        target: f64,
        resp_tol: f64,
    },

    #[error("Unit {unit}: {source}")]
    AtUnit {
        unit: usize,
        source: Box<WeightError>,
    },
}

impl WeightError {
    pub fn class(&self) -> ErrorClass {
        match self {
            WeightError::TooManyConstraints { .. } | WeightError::DependentResponses { .. } => {
                ErrorClass::Constraint
            }
            WeightError::ResponseLength { .. } => ErrorClass::Config,
            WeightError::NotPositiveDefinite => ErrorClass::Estimation,
            WeightError::CovarianceShape { .. } | WeightError::ResponseCheck { .. } => {
                ErrorClass::Consistency
            }
            WeightError::AtUnit { source, .. } => source.class(),
        }
    }
}

#[derive(Error, Debug)]
pub enum WeightFileError {
    #[error("When reading {file}, expected HYPILCW as the first 7 characters, got '{got}' instead!")]
    BadMagic { file: String, got: String },

    #[error("{file} has format version {got}, but only version {expected} is supported")]
    BadVersion { file: String, expected: u8, got: u8 },

    #[error("{file} has an unknown filter kind {got}")]
    BadKind { file: String, got: u8 },

    #[error("{file}: scale {scale} claims its first channel is {first_channel} and it has {num_active} active channels, but there are only {num_channels} channels")]
    BadScale {
        file: String,
        scale: usize,
        first_channel: usize,
        num_active: usize,
        num_channels: usize,
    },

    #[error("{file} is truncated or corrupt: its header describes {needed} more bytes, but only {available} remain")]
    Truncated {
        file: String,
        needed: u64,
        available: u64,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl WeightFileError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Io
    }
}
