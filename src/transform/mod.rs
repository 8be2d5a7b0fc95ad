// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Spherical-harmonic transforms.
//!
//! The ILC machinery never depends on a particular pixelisation; it only needs
//! to move maps into and out of harmonic space. Anything that can do that
//! implements [`HarmonicTransform`], and all of the filtering helpers here are
//! built on top of those two operations.

mod alm;
mod error;
mod gauss_legendre;
#[cfg(test)]
mod tests;

pub use alm::{num_modes, Alm};
pub use error::TransformError;
pub use gauss_legendre::GaussLegendreGrid;

use ndarray::prelude::*;

use crate::{beam::gauss_beam, constants::PI};

/// Forward and inverse spherical-harmonic transforms of real maps, band
/// limited at [`HarmonicTransform::lmax`].
pub trait HarmonicTransform: Sync + Send {
    fn lmax(&self) -> usize;

    fn num_pixels(&self) -> usize;

    /// Analyse a map into its harmonic coefficients.
    fn map2alm(&self, map: ArrayView1<f64>) -> Result<Alm, TransformError>;

    /// Synthesise a map from harmonic coefficients.
    fn alm2map(&self, alm: &Alm) -> Result<Array1<f64>, TransformError>;
}

/// Multiply a map by a per-ℓ transfer function in harmonic space.
pub fn filter_map<T: HarmonicTransform + ?Sized>(
    transform: &T,
    map: ArrayView1<f64>,
    transfer: ArrayView1<f64>,
) -> Result<Array1<f64>, TransformError> {
    let mut alm = transform.map2alm(map)?;
    alm.almxfl(transfer)?;
    transform.alm2map(&alm)
}

/// Smooth a map with a circularly-symmetric Gaussian of the given FWHM
/// \[radians\].
pub fn smoothing<T: HarmonicTransform + ?Sized>(
    transform: &T,
    map: ArrayView1<f64>,
    fwhm: f64,
) -> Result<Array1<f64>, TransformError> {
    let beam = gauss_beam(fwhm, transform.lmax());
    filter_map(transform, map, beam.view())
}

/// The sky-average of a map, i.e. a_00 / √(4π).
pub fn map_mean<T: HarmonicTransform + ?Sized>(
    transform: &T,
    map: ArrayView1<f64>,
) -> Result<f64, TransformError> {
    let alm = transform.map2alm(map)?;
    Ok(alm.get(0, 0).re / (4.0 * PI).sqrt())
}
