// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from setting up and running an ILC.

use thiserror::Error;

use crate::{
    beam::BeamError, covariance::CovarianceError, filters::FilterBankError,
    recombine::RecombineError, selection::SelectionError, transform::TransformError,
    weights::WeightError, ErrorClass,
};

/// Problems with an [`crate::IlcConfig`]. These are always fatal, and are
/// found before any maps are touched.
#[derive(Error, Debug)]
pub enum IlcConfigError {
    #[error("No frequency channels were specified")]
    NoChannels,

    #[error("ELLMAX must be positive")]
    ZeroEllmax,

    #[error("Channel '{channel}': {source}")]
    ChannelBeam { channel: String, source: BeamError },

    #[error("Component '{component}' has {got} responses, but there are {expected} channels")]
    ResponseLength {
        component: String,
        expected: usize,
        got: usize,
    },

    #[error("Component '{0}' has a non-finite response")]
    NonFiniteResponse(String),

    #[error("Component '{0}' is specified more than once (or is both preserved and deprojected)")]
    DuplicateComponent(String),

    #[error("{got} deprojection counts were given, but there are {num_scales} scales")]
    DeprojCountLength { num_scales: usize, got: usize },

    #[error("Asked to deproject {requested} components, but only {available} deprojected components were given")]
    TooFewDeprojected { requested: usize, available: usize },

    #[error("{name} must be positive and finite; got {value}")]
    BadTolerance { name: &'static str, value: f64 },

    #[error(transparent)]
    FilterBank(#[from] FilterBankError),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl IlcConfigError {
    pub fn class(&self) -> ErrorClass {
        match self {
            IlcConfigError::FilterBank(e) => e.class(),
            _ => ErrorClass::Config,
        }
    }
}

/// Why a single scale's weights couldn't be found. Other scales are
/// unaffected.
#[derive(Error, Debug)]
pub enum ScaleError {
    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    #[error(transparent)]
    Weight(#[from] WeightError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ScaleError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ScaleError::Covariance(e) => e.class(),
            ScaleError::Weight(e) => e.class(),
            ScaleError::Transform(e) => e.class(),
        }
    }
}

#[derive(Error, Debug)]
pub enum IlcError {
    #[error("The harmonic transform has ℓmax {got}, but the ILC is set up for ELLMAX {expected}")]
    TransformLmax { expected: usize, got: usize },

    #[error("Expected {expected} {what}, one per channel, but got {got}")]
    MapCount {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Cross-ILC was requested, but no split maps were given")]
    MissingSplits,

    #[error(transparent)]
    Recombine(#[from] RecombineError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl IlcError {
    pub fn class(&self) -> ErrorClass {
        match self {
            IlcError::TransformLmax { .. } | IlcError::MapCount { .. } | IlcError::MissingSplits => {
                ErrorClass::Config
            }
            IlcError::Recombine(e) => e.class(),
            IlcError::Transform(e) => e.class(),
        }
    }
}
