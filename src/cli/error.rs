// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all hyperilc-related errors. This should be the *only*
//! error enum that is publicly visible from the binary's point of view.

use thiserror::Error;

use super::{
    common::CommonArgsError, cross_correlate::CrossCorrelateArgsError, ilc::IlcArgsError,
};
use crate::{
    crosscorr::CrossCorrError,
    filters::FilterBankError,
    io::IoError,
    params::{IlcConfigError, IlcError},
    transform::TransformError,
    weights::WeightFileError,
    ErrorClass,
};

/// The *only* publicly visible error from hyperilc. Each error message carries
/// a hint, unless it's "generic".
#[derive(Error, Debug)]
pub enum HyperilcError {
    /// The configuration doesn't make sense. Nothing was computed.
    #[error("{0}\n\nNothing was computed. Check the ILC arguments (see `hyperilc ilc --help`).")]
    Config(String),

    /// A covariance couldn't be estimated.
    #[error("{0}\n\nThe input maps may contain NaNs or infinities.")]
    Estimation(String),

    /// Weights couldn't be solved for.
    #[error("{0}\n\nTry deprojecting fewer components, or check that the component responses are distinct over the channels used at each scale.")]
    Constraint(String),

    /// An internal consistency check failed.
    #[error("{0}\n\nThis is probably a bug in hyperilc; please report it.")]
    Consistency(String),

    /// An error related to map, beam, weight or spectrum files.
    #[error("{0}")]
    Io(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json with the same keys as the long command-line arguments.")]
    ArgFile(String),

    /// A generic error that can't be clarified further.
    #[error("{0}")]
    Generic(String),
}

impl HyperilcError {
    fn from_class(class: ErrorClass, message: String) -> Self {
        match class {
            ErrorClass::Config => Self::Config(message),
            ErrorClass::Estimation => Self::Estimation(message),
            ErrorClass::Constraint => Self::Constraint(message),
            ErrorClass::Consistency => Self::Consistency(message),
            ErrorClass::Io => Self::Io(message),
        }
    }
}

// Library errors know their own class.

impl From<IlcConfigError> for HyperilcError {
    fn from(e: IlcConfigError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<IlcError> for HyperilcError {
    fn from(e: IlcError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<FilterBankError> for HyperilcError {
    fn from(e: FilterBankError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<TransformError> for HyperilcError {
    fn from(e: TransformError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<CrossCorrError> for HyperilcError {
    fn from(e: CrossCorrError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<IoError> for HyperilcError {
    fn from(e: IoError) -> Self {
        Self::from_class(e.class(), e.to_string())
    }
}

impl From<WeightFileError> for HyperilcError {
    fn from(e: WeightFileError) -> Self {
        Self::Io(e.to_string())
    }
}

// Binary sub-command errors.

impl From<CommonArgsError> for HyperilcError {
    fn from(e: CommonArgsError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<IlcArgsError> for HyperilcError {
    fn from(e: IlcArgsError) -> Self {
        match e {
            IlcArgsError::Io(e) => e.into(),
            _ => Self::Config(e.to_string()),
        }
    }
}

impl From<CrossCorrelateArgsError> for HyperilcError {
    fn from(e: CrossCorrelateArgsError) -> Self {
        Self::Config(e.to_string())
    }
}

// Generic errors.

impl From<std::io::Error> for HyperilcError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<toml::ser::Error> for HyperilcError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}

impl From<log::SetLoggerError> for HyperilcError {
    fn from(e: log::SetLoggerError) -> Self {
        Self::Generic(format!("Failed to initialise logging: {e}"))
    }
}
