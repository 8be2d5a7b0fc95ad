// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Validated ILC parameters, and the code that runs an ILC with them.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly. An [`IlcConfig`] is the
//! library-facing unparsed form; [`IlcConfig::validate`] turns it into
//! [`IlcParams`].

mod config;
mod error;

pub use config::{ChannelConfig, ComponentResponse, DeprojCount, FilterConfig, IlcConfig};
pub use error::{IlcConfigError, IlcError, ScaleError};

use std::ops::RangeInclusive;

use log::{debug, info, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use vec1::Vec1;

use crate::{
    covariance::{
        harmonic_covariance, needlet_covariance, regularise_arena, CovarianceInput,
    },
    filters::{FilterBank, WaveletType},
    recombine::{
        check_weight_set, collect_scale_results, combine_scale, recombine_harmonic,
        synthesize_needlets,
    },
    selection::FrequencySelection,
    transform::{Alm, HarmonicTransform, TransformError},
    weights::{
        make_weights_progress_bar, solve_arena_weights, ConstraintSet, ScaleWeights, WeightError,
        WeightSet,
    },
};

/// Parameters needed to perform an ILC.
#[derive(Debug)]
pub struct IlcParams {
    pub(crate) filter_bank: FilterBank,

    /// The channels, from the lowest to the highest angular resolution.
    pub(crate) channels: Vec1<ChannelConfig>,

    /// Each channel's beam transfer function up to ELLMAX.
    pub(crate) beams: Vec<Array1<f64>>,

    /// The beam every channel is brought to.
    pub(crate) target_beam: Array1<f64>,

    /// Per channel, target beam / channel beam, with undeconvolvable
    /// multipoles zeroed.
    pub(crate) rebeam: Vec<Array1<f64>>,

    pub(crate) taper: Option<Array1<f64>>,

    pub(crate) preserved: ComponentResponse,

    pub(crate) deprojected: Vec<ComponentResponse>,

    /// The number of deprojected components at each scale.
    pub(crate) num_deproj: Vec<usize>,

    pub(crate) resp_tol: f64,

    pub(crate) ilc_bias_tol: f64,

    pub(crate) selection: FrequencySelection,

    pub(crate) cross_ilc: bool,

    /// The FWHM \[radians\] of each needlet scale's covariance localisation
    /// kernel. Empty for harmonic bins.
    pub(crate) localisation_fwhm: Vec<f64>,
}

/// The maps an ILC runs on. Every slice has one map per channel, in channel
/// order.
#[derive(Debug, Clone, Copy)]
pub struct IlcInputs<'a> {
    /// The maps that weights are derived from.
    pub maps: &'a [Array1<f64>],

    /// Two noise-independent splits of every channel; only used with
    /// cross-ILC.
    pub splits: Option<(&'a [Array1<f64>], &'a [Array1<f64>])>,

    /// If given, the weights are applied to these maps instead of `maps`.
    pub apply_maps: Option<&'a [Array1<f64>]>,

    /// Previously-derived weights. If given, no weights are derived.
    pub weights: Option<&'a WeightSet>,
}

impl<'a> IlcInputs<'a> {
    pub fn new(maps: &'a [Array1<f64>]) -> IlcInputs<'a> {
        IlcInputs {
            maps,
            splits: None,
            apply_maps: None,
            weights: None,
        }
    }
}

#[derive(Debug)]
pub struct IlcOutput {
    /// The ILC map of the preserved component.
    pub map: Array1<f64>,

    /// The weights used to make the map.
    pub weights: WeightSet,
}

impl IlcParams {
    pub fn filter_bank(&self) -> &FilterBank {
        &self.filter_bank
    }

    pub fn selection(&self) -> &FrequencySelection {
        &self.selection
    }

    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_deproj(&self) -> &[usize] {
        &self.num_deproj
    }

    pub fn localisation_fwhm(&self) -> &[f64] {
        &self.localisation_fwhm
    }

    pub fn preserved(&self) -> &ComponentResponse {
        &self.preserved
    }

    pub fn deprojected(&self) -> &[ComponentResponse] {
        &self.deprojected
    }

    /// A channel's beam transfer function up to ELLMAX.
    pub fn beam(&self, channel: usize) -> ArrayView1<f64> {
        self.beams[channel].view()
    }

    pub fn target_beam(&self) -> ArrayView1<f64> {
        self.target_beam.view()
    }

    pub fn ilc_bias_tol(&self) -> f64 {
        self.ilc_bias_tol
    }

    pub fn cross_ilc(&self) -> bool {
        self.cross_ilc
    }

    /// Derive weights (unless they were given), then apply them.
    pub fn run<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        inputs: &IlcInputs,
    ) -> Result<IlcOutput, IlcError> {
        let weights = match inputs.weights {
            Some(w) => {
                info!("Using previously-derived weights");
                w.clone()
            }
            None => {
                let results = self.derive_weights(transform, inputs.maps, inputs.splits)?;
                collect_scale_results(
                    self.filter_bank.wavelet_type(),
                    self.num_channels(),
                    results,
                )?
            }
        };
        let target_maps = match inputs.apply_maps {
            Some(maps) => {
                info!("Applying weights to alternative maps");
                maps
            }
            None => inputs.maps,
        };
        let map = self.apply_weights(transform, &weights, target_maps)?;
        Ok(IlcOutput { map, weights })
    }

    /// Derive the weights of every scale. The outer result fails only if the
    /// inputs are unusable; each scale then succeeds or fails on its own.
    pub fn derive_weights<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        maps: &[Array1<f64>],
        splits: Option<(&[Array1<f64>], &[Array1<f64>])>,
    ) -> Result<Vec<Result<ScaleWeights, ScaleError>>, IlcError> {
        self.check_transform(transform)?;
        self.check_maps("maps", maps)?;
        let split_alms = if self.cross_ilc {
            let (split1, split2) = splits.ok_or(IlcError::MissingSplits)?;
            self.check_maps("split 1 maps", split1)?;
            self.check_maps("split 2 maps", split2)?;
            Some((
                self.prepare_alms(transform, split1)?,
                self.prepare_alms(transform, split2)?,
            ))
        } else {
            if splits.is_some() {
                warn!("Split maps were given, but cross-ILC isn't enabled; ignoring them");
            }
            None
        };
        let alms = match split_alms {
            Some(_) => vec![],
            None => self.prepare_alms(transform, maps)?,
        };

        let num_scales = self.filter_bank.num_scales();
        let mut results = Vec::with_capacity(num_scales);
        for scale in 0..num_scales {
            let result = match self.constraints(scale) {
                Err(e) => Err(ScaleError::from(e)),
                // Only harmonic bins have a multipole range.
                Ok(constraints) => match self.filter_bank.bin_range(scale) {
                    None => self.solve_needlet_scale(
                        transform,
                        scale,
                        &constraints,
                        &alms,
                        split_alms.as_ref(),
                    ),
                    Some(range) => self.solve_harmonic_scale(
                        scale,
                        range,
                        &constraints,
                        &alms,
                        split_alms.as_ref(),
                    ),
                },
            };
            match &result {
                Ok(w) => info!(
                    "Scale {}/{num_scales}: solved weights for {} channel(s) over {} unit(s)",
                    scale + 1,
                    w.num_active(),
                    w.num_units()
                ),
                Err(e) => warn!(
                    "Scale {}/{num_scales} failed ({}): {e}",
                    scale + 1,
                    e.class()
                ),
            }
            results.push(result);
        }
        Ok(results)
    }

    /// Apply weights to maps, producing the ILC map.
    pub fn apply_weights<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        weights: &WeightSet,
        maps: &[Array1<f64>],
    ) -> Result<Array1<f64>, IlcError> {
        self.check_transform(transform)?;
        self.check_maps("maps", maps)?;
        check_weight_set(
            weights,
            &self.filter_bank,
            self.num_channels(),
            transform.num_pixels(),
        )?;
        let alms = self.prepare_alms(transform, maps)?;

        let map = match self.filter_bank.wavelet_type() {
            WaveletType::GaussianNeedlets => {
                let scale_maps = weights
                    .scales
                    .iter()
                    .enumerate()
                    .map(|(scale, sw)| {
                        let filtered = self.needlet_maps(
                            transform,
                            &alms[sw.first_channel..],
                            scale,
                        )?;
                        Ok(combine_scale(&filtered, sw.weights.view())?)
                    })
                    .collect::<Result<Vec<_>, IlcError>>()?;
                synthesize_needlets(transform, &self.filter_bank, &scale_maps)?
            }

            WaveletType::HarmonicBins => {
                recombine_harmonic(transform, &self.filter_bank, weights, &alms)?
            }
        };
        debug!("Recombined {} scales", weights.num_scales());
        Ok(map)
    }

    fn check_transform<T: HarmonicTransform + ?Sized>(&self, transform: &T) -> Result<(), IlcError> {
        if transform.lmax() != self.filter_bank.ellmax() {
            return Err(IlcError::TransformLmax {
                expected: self.filter_bank.ellmax(),
                got: transform.lmax(),
            });
        }
        Ok(())
    }

    fn check_maps(&self, what: &'static str, maps: &[Array1<f64>]) -> Result<(), IlcError> {
        if maps.len() != self.num_channels() {
            return Err(IlcError::MapCount {
                what,
                expected: self.num_channels(),
                got: maps.len(),
            });
        }
        Ok(())
    }

    /// Every channel's harmonic coefficients, brought to the common beam and
    /// tapered.
    fn prepare_alms<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        maps: &[Array1<f64>],
    ) -> Result<Vec<Alm>, TransformError> {
        maps.par_iter()
            .zip(self.rebeam.par_iter())
            .map(|(map, rebeam)| {
                let mut alm = transform.map2alm(map.view())?;
                match &self.taper {
                    Some(taper) => alm.almxfl((rebeam * taper).view())?,
                    None => alm.almxfl(rebeam.view())?,
                }
                Ok(alm)
            })
            .collect()
    }

    /// The needlet coefficient maps of a scale, for the given channels'
    /// harmonic coefficients.
    fn needlet_maps<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        alms: &[Alm],
        scale: usize,
    ) -> Result<Vec<Array1<f64>>, TransformError> {
        let window = self.filter_bank.window(scale);
        alms.par_iter()
            .map(|alm| {
                let mut alm = alm.clone();
                alm.almxfl(window)?;
                transform.alm2map(&alm)
            })
            .collect()
    }

    /// The responses of a scale's active channels.
    fn constraints(&self, scale: usize) -> Result<ConstraintSet, WeightError> {
        let first = self.selection.first_channel(scale);
        let preserved = ArrayView1::from(&self.preserved.response[first..]);
        let deprojected: Vec<ArrayView1<f64>> = self.deprojected[..self.num_deproj[scale]]
            .iter()
            .map(|c| ArrayView1::from(&c.response[first..]))
            .collect();
        ConstraintSet::new(preserved, &deprojected)
    }

    fn solve_needlet_scale<T: HarmonicTransform + ?Sized>(
        &self,
        transform: &T,
        scale: usize,
        constraints: &ConstraintSet,
        alms: &[Alm],
        split_alms: Option<&(Vec<Alm>, Vec<Alm>)>,
    ) -> Result<ScaleWeights, ScaleError> {
        let first_channel = self.selection.first_channel(scale);
        let fwhm = self.localisation_fwhm[scale];
        let mut cov = match split_alms {
            None => {
                let maps = self.needlet_maps(transform, &alms[first_channel..], scale)?;
                needlet_covariance(transform, CovarianceInput::Standard(&maps), fwhm)?
            }
            Some((split1, split2)) => {
                let maps1 = self.needlet_maps(transform, &split1[first_channel..], scale)?;
                let maps2 = self.needlet_maps(transform, &split2[first_channel..], scale)?;
                needlet_covariance(
                    transform,
                    CovarianceInput::CrossSplits {
                        split1: &maps1,
                        split2: &maps2,
                    },
                    fwhm,
                )?
            }
        };
        regularise_arena(&mut cov, scale)?;

        let pb = make_weights_progress_bar(
            cov.len_of(Axis(0)),
            format!(
                "Solving scale {}/{}",
                scale + 1,
                self.filter_bank.num_scales()
            ),
        );
        let weights = solve_arena_weights(cov.view(), constraints, self.resp_tol, &pb)?;
        Ok(ScaleWeights {
            first_channel,
            weights,
        })
    }

    fn solve_harmonic_scale(
        &self,
        scale: usize,
        range: RangeInclusive<usize>,
        constraints: &ConstraintSet,
        alms: &[Alm],
        split_alms: Option<&(Vec<Alm>, Vec<Alm>)>,
    ) -> Result<ScaleWeights, ScaleError> {
        let first_channel = self.selection.first_channel(scale);
        let input = match split_alms {
            None => CovarianceInput::Standard(&alms[first_channel..]),
            Some((split1, split2)) => CovarianceInput::CrossSplits {
                split1: &split1[first_channel..],
                split2: &split2[first_channel..],
            },
        };
        // A bin is a single unit.
        let mut arena = harmonic_covariance(input, range)?.insert_axis(Axis(0));
        regularise_arena(&mut arena, scale)?;

        let pb = make_weights_progress_bar(
            1,
            format!(
                "Solving bin {}/{}",
                scale + 1,
                self.filter_bank.num_scales()
            ),
        );
        let weights = solve_arena_weights(arena.view(), constraints, self.resp_tol, &pb)?;
        Ok(ScaleWeights {
            first_channel,
            weights,
        })
    }
}
