// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Choosing which frequency channels take part at each filter scale.
//!
//! Channels are always ordered from the lowest to the highest angular
//! resolution. A low-resolution channel carries no information at scales
//! finer than its beam, so each scale only uses the highest-resolution
//! channels; i.e. the selection for a scale is always a suffix of the channel
//! list.

mod error;
#[cfg(test)]
mod tests;

pub use error::SelectionError;

use std::ops::Range;

use log::{debug, warn};
use ndarray::prelude::*;

use crate::filters::FilterBank;

/// How to decide which channels are used at each scale.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPolicy {
    /// Keep a channel at a scale if its beam at the scale's characteristic
    /// multipole is at least this value. Must be in (0, 1).
    BeamCriterion(f64),

    /// Use exactly this many of the highest-resolution channels at each
    /// scale.
    Override(Vec<usize>),
}

/// The channels used at each scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencySelection {
    num_channels: usize,

    /// The index of the lowest-resolution channel used at each scale. All
    /// channels from this one up are used.
    first_channels: Vec<usize>,
}

impl FrequencySelection {
    /// Use every channel at every scale.
    pub fn all(num_channels: usize, num_scales: usize) -> FrequencySelection {
        FrequencySelection {
            num_channels,
            first_channels: vec![0; num_scales],
        }
    }

    pub fn num_scales(&self) -> usize {
        self.first_channels.len()
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn first_channel(&self, scale: usize) -> usize {
        self.first_channels[scale]
    }

    pub fn num_active(&self, scale: usize) -> usize {
        self.num_channels - self.first_channels[scale]
    }

    pub fn active_channels(&self, scale: usize) -> Range<usize> {
        self.first_channels[scale]..self.num_channels
    }

    pub fn is_active(&self, scale: usize, channel: usize) -> bool {
        channel >= self.first_channels[scale] && channel < self.num_channels
    }
}

/// Select the channels used at every scale of `bank`. `beams` are the beam
/// transfer functions of each channel, ordered from lowest to highest
/// resolution.
pub fn select_frequencies(
    bank: &FilterBank,
    beams: &[Array1<f64>],
    policy: &SelectionPolicy,
) -> Result<FrequencySelection, SelectionError> {
    let num_channels = beams.len();
    let num_scales = bank.num_scales();
    if num_channels == 0 {
        return Err(SelectionError::NoChannels);
    }

    let first_channels = match policy {
        SelectionPolicy::Override(counts) => {
            if counts.len() != num_scales {
                return Err(SelectionError::OverrideLength {
                    num_scales,
                    got: counts.len(),
                });
            }
            counts
                .iter()
                .enumerate()
                .map(|(scale, &count)| {
                    if count == 0 || count > num_channels {
                        Err(SelectionError::OverrideCount {
                            scale,
                            count,
                            num_channels,
                        })
                    } else {
                        Ok(num_channels - count)
                    }
                })
                .collect::<Result<Vec<_>, _>>()?
        }

        SelectionPolicy::BeamCriterion(criterion) => {
            let criterion = *criterion;
            if !(criterion > 0.0 && criterion < 1.0) {
                return Err(SelectionError::BadCriterion(criterion));
            }
            for (channel, beam) in beams.iter().enumerate() {
                if beam.len() < bank.ellmax() + 1 {
                    return Err(SelectionError::BeamTooShort {
                        channel,
                        need: bank.ellmax() + 1,
                        got: beam.len(),
                    });
                }
            }

            let ells = bank.characteristic_ells(criterion);
            let mut first_channels = Vec::with_capacity(num_scales);
            for (scale, &l) in ells.iter().enumerate() {
                let passes = |c: usize| beams[c][l] >= criterion;
                // Walk down from the highest-resolution channel, stopping at
                // the first that fails.
                let first = (0..num_channels)
                    .rev()
                    .take_while(|&c| passes(c))
                    .last()
                    .ok_or(SelectionError::NoneResolve { scale, ell: l })?;
                let dropped: Vec<usize> = (0..first).filter(|&c| passes(c)).collect();
                if !dropped.is_empty() {
                    warn!("Scale {scale}: channels {dropped:?} resolve ℓ = {l} but a higher-resolution channel doesn't; they won't be used");
                }
                first_channels.push(first);
            }
            first_channels
        }
    };

    for (scale, &first) in first_channels.iter().enumerate() {
        debug!(
            "Scale {scale}: using {} of {num_channels} channels",
            num_channels - first
        );
    }
    Ok(FrequencySelection {
        num_channels,
        first_channels,
    })
}
