// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from recombining weighted maps.

use thiserror::Error;

use crate::{
    filters::WaveletType, params::ScaleError, transform::TransformError, ErrorClass,
};

#[derive(Error, Debug)]
pub enum RecombineError {
    #[error("Scale {scale} failed, so no output map can be made: {source}")]
    ScaleFailed { scale: usize, source: ScaleError },

    #[error("The weights are for {weights} but the filter bank is {bank}")]
    KindMismatch {
        weights: WaveletType,
        bank: WaveletType,
    },

    #[error("Expected {expected} scales, got {got}")]
    ScaleCount { expected: usize, got: usize },

    #[error("The weights are for {got} channels, but there are {expected}")]
    ChannelCount { expected: usize, got: usize },

    #[error("Scale {scale} has weights for {got} units, but {expected} are needed")]
    UnitCount {
        scale: usize,
        expected: usize,
        got: usize,
    },

    #[error("Scale {scale} has weights for {got} channels, but {expected} are active")]
    ActiveCount {
        scale: usize,
        expected: usize,
        got: usize,
    },

    #[error("Expected {expected} filtered maps, got {got}")]
    MapCount { expected: usize, got: usize },

    #[error("A filtered map has {got} pixels, but the weights have {expected}")]
    MapLength { expected: usize, got: usize },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl RecombineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RecombineError::ScaleFailed { source, .. } => source.class(),
            RecombineError::Transform(e) => e.class(),
            _ => ErrorClass::Consistency,
        }
    }
}
