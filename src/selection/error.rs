// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from selecting frequency channels.

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("No frequency channels were supplied")]
    NoChannels,

    #[error("The wavelet beam criterion must be between 0 and 1 (exclusive); got {0}")]
    BadCriterion(f64),

    #[error("Channel {channel}'s beam has {got} multipoles, but {need} are needed")]
    BeamTooShort {
        channel: usize,
        need: usize,
        got: usize,
    },

    #[error("No channel's beam resolves scale {scale} (ℓ = {ell}); the highest-resolution channel is too coarse")]
    NoneResolve { scale: usize, ell: usize },

    #[error("{got} channel counts were given to override frequency selection, but there are {num_scales} scales")]
    OverrideLength { num_scales: usize, got: usize },

    #[error("Scale {scale} was told to use {count} channels, but only 1 to {num_channels} are possible")]
    OverrideCount {
        scale: usize,
        count: usize,
        num_channels: usize,
    },
}

impl SelectionError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Config
    }
}
