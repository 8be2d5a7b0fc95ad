// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. `hyperilc` should do as many
calculations as possible in double precision.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Convert arcminutes to radians.
pub const ARCMIN_TO_RAD: f64 = PI / (180.0 * 60.0);

/// sqrt(8 ln 2); the ratio of a Gaussian's FWHM to its standard deviation.
pub const SIGMA_TO_FWHM: f64 = 2.354_820_045_030_949_3;

/// The default FWHMs \[arcmin\] of the Gaussians used to build Gaussian
/// needlets. These are the Planck 2015 NILC y-map values, giving 10 scales.
pub const DEFAULT_GN_FWHM_ARCMIN: [f64; 9] = [600.0, 300.0, 120.0, 60.0, 30.0, 15.0, 10.0, 7.5, 5.0];

/// The largest allowed deviation of Σ_j h_j(ℓ)² from unity for a needlet
/// filter bank.
pub const PARTITION_OF_UNITY_TOL: f64 = 1e-6;

/// The default tolerance on the weights' response to each component.
pub const DEFAULT_RESP_TOL: f64 = 1e-3;

/// The default threshold at which a channel's beam is deemed to have
/// suppressed the signal at a filter scale.
pub const DEFAULT_WAVELET_BEAM_CRITERION: f64 = 1e-3;

/// The default fractional ILC bias tolerated when sizing the real-space
/// covariance localisation kernels.
pub const DEFAULT_ILC_BIAS_TOL: f64 = 0.01;

/// Covariance matrices whose smallest eigenvalue is below this fraction of
/// their largest eigenvalue get diagonal loading.
pub const COVARIANCE_REGULARISATION_EPS: f64 = 1e-8;

/// The constraint matrix AᵗC⁻¹A is considered singular when the ratio of its
/// smallest to largest eigenvalue is below this.
pub const CONSTRAINT_SINGULARITY_EPS: f64 = 1e-12;

/// Beam transfer values smaller than this can't be deconvolved; those modes
/// are dropped rather than amplified.
pub const MIN_DECONVOLVABLE_BEAM: f64 = 1e-30;

/// The steepness of the tanh taper applied near ELLMAX.
pub const TAPER_STEEPNESS: f64 = 0.025;
