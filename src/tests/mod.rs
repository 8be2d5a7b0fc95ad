// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpful functions for tests.

use ndarray::prelude::*;
use num_complex::Complex64;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{
    beam::gauss_beam,
    constants::ARCMIN_TO_RAD,
    transform::{Alm, HarmonicTransform},
};

/// Gaussian random harmonic coefficients with C_ℓ = `amplitude` / (ℓ+1)² (and
/// a zero monopole), reproducible from `seed`.
pub(crate) fn random_alm(lmax: usize, amplitude: f64, seed: u64) -> Alm {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut alm = Alm::zeros(lmax);
    for l in 1..=lmax {
        let sd = (amplitude / ((l + 1) * (l + 1)) as f64).sqrt();
        alm.set(l, 0, Complex64::new(sd * normal.sample(&mut rng), 0.0));
        for m in 1..=l {
            let re = normal.sample(&mut rng);
            let im = normal.sample(&mut rng);
            alm.set(l, m, Complex64::new(re, im) * sd * std::f64::consts::FRAC_1_SQRT_2);
        }
    }
    alm
}

/// A random band-limited map.
pub(crate) fn random_map<T: HarmonicTransform>(
    transform: &T,
    amplitude: f64,
    seed: u64,
) -> Array1<f64> {
    transform
        .alm2map(&random_alm(transform.lmax(), amplitude, seed))
        .unwrap()
}

/// A random band-limited map, observed with a Gaussian beam.
pub(crate) fn random_beamed_map<T: HarmonicTransform>(
    transform: &T,
    amplitude: f64,
    fwhm_arcmin: f64,
    seed: u64,
) -> Array1<f64> {
    let mut alm = random_alm(transform.lmax(), amplitude, seed);
    alm.almxfl(gauss_beam(fwhm_arcmin * ARCMIN_TO_RAD, transform.lmax()).view())
        .unwrap();
    transform.alm2map(&alm).unwrap()
}
