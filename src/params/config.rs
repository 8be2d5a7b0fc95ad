// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Unvalidated ILC configuration, and its validation into [`IlcParams`].

use std::{collections::HashSet, str::FromStr};

use log::{debug, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use vec1::Vec1;

use super::{error::IlcConfigError, IlcParams};
use crate::{
    beam::{rebeam_transfer, BeamProfile},
    constants::{
        DEFAULT_ILC_BIAS_TOL, DEFAULT_RESP_TOL, DEFAULT_WAVELET_BEAM_CRITERION,
        MIN_DECONVOLVABLE_BEAM,
    },
    filters::{taper, FilterBank, WaveletType},
    selection::{select_frequencies, SelectionPolicy},
};

/// How the filter bank is built.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterConfig {
    GaussianNeedlets {
        num_scales: usize,

        /// `num_scales - 1` FWHMs \[arcmin\], strictly decreasing.
        fwhm_arcmin: Vec<f64>,
    },

    HarmonicBins {
        bin_size: usize,
    },
}

impl FilterConfig {
    pub fn wavelet_type(&self) -> WaveletType {
        match self {
            FilterConfig::GaussianNeedlets { .. } => WaveletType::GaussianNeedlets,
            FilterConfig::HarmonicBins { .. } => WaveletType::HarmonicBins,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub name: String,

    /// The central frequency \[GHz\]. Only used for reporting.
    pub freq_ghz: Option<f64>,

    pub beam: BeamProfile,
}

/// A sky component's response in every channel, in channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResponse {
    pub name: String,
    pub response: Vec<f64>,
}

/// The number of components to deproject, either at every scale or per
/// scale. Scale j deprojects the first N_j deprojected components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeprojCount {
    Uniform(usize),
    PerScale(Vec<usize>),
}

impl Default for DeprojCount {
    fn default() -> Self {
        DeprojCount::Uniform(0)
    }
}

impl FromStr for DeprojCount {
    type Err = std::num::ParseIntError;

    /// Either a single count ("2") or a comma-separated list ("0,1,1").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(',') {
            s.split(',')
                .map(|n| n.trim().parse())
                .collect::<Result<Vec<_>, _>>()
                .map(DeprojCount::PerScale)
        } else {
            s.trim().parse().map(DeprojCount::Uniform)
        }
    }
}

/// Everything needed to set up an ILC, before validation. Use
/// [`IlcConfig::validate`] to turn this into [`IlcParams`].
#[derive(Debug, Clone, PartialEq)]
pub struct IlcConfig {
    /// The maximum multipole of the analysis.
    pub ellmax: usize,

    pub filters: FilterConfig,

    /// The channels, ordered from the lowest to the highest angular
    /// resolution.
    pub channels: Vec<ChannelConfig>,

    /// The beam all channels are brought to before combination. If not
    /// given, the beam of the highest-resolution (last) channel.
    pub common_beam: Option<BeamProfile>,

    /// The component whose response is preserved.
    pub preserved: ComponentResponse,

    /// Components that may be deprojected, in priority order.
    pub deprojected: Vec<ComponentResponse>,

    pub num_deproj: DeprojCount,

    /// The tolerated fractional ILC bias; sets the size of the needlet
    /// covariance localisation kernels.
    pub ilc_bias_tol: f64,

    /// The tolerance on the solved weights' responses.
    pub resp_tol: f64,

    pub selection: SelectionPolicy,

    /// Estimate covariances only from cross products of noise-independent
    /// splits.
    pub cross_ilc: bool,

    /// Taper the input maps' harmonic coefficients over this many multipoles
    /// below ELLMAX.
    pub taper_width: Option<usize>,
}

impl IlcConfig {
    /// A configuration with default tolerances, the default frequency
    /// selection and no deprojection.
    pub fn new(
        ellmax: usize,
        filters: FilterConfig,
        channels: Vec<ChannelConfig>,
        preserved: ComponentResponse,
    ) -> IlcConfig {
        IlcConfig {
            ellmax,
            filters,
            channels,
            common_beam: None,
            preserved,
            deprojected: vec![],
            num_deproj: DeprojCount::default(),
            ilc_bias_tol: DEFAULT_ILC_BIAS_TOL,
            resp_tol: DEFAULT_RESP_TOL,
            selection: SelectionPolicy::BeamCriterion(DEFAULT_WAVELET_BEAM_CRITERION),
            cross_ilc: false,
            taper_width: None,
        }
    }

    /// Check everything and resolve every default. Nothing is computed on
    /// maps here, so this is cheap; any configuration problem is reported
    /// before the expensive work starts.
    pub fn validate(&self) -> Result<IlcParams, IlcConfigError> {
        let channels =
            Vec1::try_from_vec(self.channels.clone()).map_err(|_| IlcConfigError::NoChannels)?;
        let num_channels = channels.len();
        if self.ellmax == 0 {
            return Err(IlcConfigError::ZeroEllmax);
        }

        let filter_bank = match &self.filters {
            FilterConfig::GaussianNeedlets {
                num_scales,
                fwhm_arcmin,
            } => FilterBank::gaussian_needlets(self.ellmax, *num_scales, fwhm_arcmin)?,
            FilterConfig::HarmonicBins { bin_size } => {
                FilterBank::harmonic_bins(self.ellmax, *bin_size)?
            }
        };
        let num_scales = filter_bank.num_scales();

        // Beams.
        let beams = channels
            .iter()
            .map(|c| {
                c.beam
                    .transfer(self.ellmax)
                    .map_err(|source| IlcConfigError::ChannelBeam {
                        channel: c.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let target_beam = match &self.common_beam {
            Some(b) => b
                .transfer(self.ellmax)
                .map_err(|source| IlcConfigError::ChannelBeam {
                    channel: "common".to_string(),
                    source,
                })?,
            None => beams.last().cloned().ok_or(IlcConfigError::NoChannels)?,
        };
        let rebeam: Vec<Array1<f64>> = beams
            .iter()
            .zip(channels.iter())
            .map(|(b, c)| {
                if b.iter().any(|v| v.abs() < MIN_DECONVOLVABLE_BEAM) {
                    warn!("Channel '{}': its beam is too small to deconvolve at some multipoles; they are dropped", c.name);
                }
                rebeam_transfer(target_beam.view(), b.view())
            })
            .collect();
        let taper = match self.taper_width {
            None | Some(0) => None,
            Some(w) => Some(taper(self.ellmax, w)?),
        };

        // Responses.
        let mut names = HashSet::new();
        for component in std::iter::once(&self.preserved).chain(self.deprojected.iter()) {
            if component.response.len() != num_channels {
                return Err(IlcConfigError::ResponseLength {
                    component: component.name.clone(),
                    expected: num_channels,
                    got: component.response.len(),
                });
            }
            if component.response.iter().any(|r| !r.is_finite()) {
                return Err(IlcConfigError::NonFiniteResponse(component.name.clone()));
            }
            if !names.insert(component.name.as_str()) {
                return Err(IlcConfigError::DuplicateComponent(component.name.clone()));
            }
        }

        let num_deproj = match &self.num_deproj {
            DeprojCount::Uniform(n) => vec![*n; num_scales],
            DeprojCount::PerScale(v) => {
                if v.len() != num_scales {
                    return Err(IlcConfigError::DeprojCountLength {
                        num_scales,
                        got: v.len(),
                    });
                }
                v.clone()
            }
        };
        if let Some(&n) = num_deproj.iter().find(|&&n| n > self.deprojected.len()) {
            return Err(IlcConfigError::TooFewDeprojected {
                requested: n,
                available: self.deprojected.len(),
            });
        }

        for (name, tol) in [
            ("ilc_bias_tol", self.ilc_bias_tol),
            ("resp_tol", self.resp_tol),
        ] {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(IlcConfigError::BadTolerance { name, value: tol });
            }
        }

        let selection = select_frequencies(&filter_bank, &beams, &self.selection)?;

        // Only needlets need a covariance localisation scale.
        let localisation_fwhm = match filter_bank.wavelet_type() {
            WaveletType::GaussianNeedlets => (0..num_scales)
                .map(|j| {
                    filter_bank.localisation_fwhm(
                        j,
                        selection.num_active(j),
                        num_deproj[j],
                        self.ilc_bias_tol,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?,
            WaveletType::HarmonicBins => vec![],
        };
        for (j, fwhm) in localisation_fwhm.iter().enumerate() {
            debug!(
                "Scale {j}: covariance localisation FWHM {:.3} deg",
                fwhm.to_degrees()
            );
        }

        Ok(IlcParams {
            filter_bank,
            channels,
            beams,
            target_beam,
            rebeam,
            taper,
            preserved: self.preserved.clone(),
            deprojected: self.deprojected.clone(),
            num_deproj,
            resp_tol: self.resp_tol,
            ilc_bias_tol: self.ilc_bias_tol,
            selection,
            cross_ilc: self.cross_ilc,
            localisation_fwhm,
        })
    }
}
