// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An exact spherical-harmonic transform on a Gauss-Legendre grid.
//!
//! Pixels are laid out ring by ring, starting at the ring closest to the north
//! pole; within a ring, pixel k is at longitude 2πk/nlon. With at least ℓmax+1
//! rings and 2ℓmax+1 pixels per ring, analysis of a band-limited map is exact
//! (to floating-point precision), because Gauss-Legendre quadrature integrates
//! the products of associated Legendre functions exactly.

use std::sync::Arc;

use log::debug;
use ndarray::prelude::*;
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use super::{
    alm::{alm_index, alm_size},
    Alm, HarmonicTransform, TransformError,
};
use crate::constants::{PI, TAU};

/// 1/√(4π); the value of Y_00.
const FRAC_1_SQRT_4PI: f64 = 0.282_094_791_773_878_14;

pub struct GaussLegendreGrid {
    lmax: usize,
    nlon: usize,

    /// cos(θ) of each ring, where θ is the colatitude.
    cos_theta: Vec<f64>,

    /// sin(θ) of each ring.
    sin_theta: Vec<f64>,

    /// The Gauss-Legendre quadrature weight of each ring.
    weights: Vec<f64>,

    /// √((2m+1)/(2m)) for m ≥ 1; used to step λ_mm up in m.
    mm_coeffs: Vec<f64>,

    /// The three-term recurrence coefficients, stored with the same indexing
    /// as [`Alm`]. Only meaningful for ℓ ≥ m+2.
    rec_a: Vec<f64>,
    rec_b: Vec<f64>,

    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
}

impl GaussLegendreGrid {
    /// The smallest exact grid for this ℓmax: ℓmax+1 rings of 2ℓmax+2 pixels.
    pub fn with_lmax(lmax: usize) -> GaussLegendreGrid {
        Self::build(lmax, lmax + 1, 2 * lmax + 2)
    }

    pub fn new(lmax: usize, nlat: usize, nlon: usize) -> Result<GaussLegendreGrid, TransformError> {
        if nlat < lmax + 1 || nlon < 2 * lmax + 1 {
            return Err(TransformError::GridTooSmall {
                lmax,
                nlat,
                nlon,
                min_nlat: lmax + 1,
                min_nlon: 2 * lmax + 1,
            });
        }
        Ok(Self::build(lmax, nlat, nlon))
    }

    fn build(lmax: usize, nlat: usize, nlon: usize) -> GaussLegendreGrid {
        debug!("Setting up a Gauss-Legendre grid with ℓmax {lmax}, {nlat} rings, {nlon} pixels per ring");

        let (cos_theta, weights) = gauss_legendre_nodes(nlat);
        let sin_theta = cos_theta
            .iter()
            .map(|&x| (1.0 - x * x).max(0.0).sqrt())
            .collect();

        let mm_coeffs = (0..=lmax)
            .map(|m| {
                if m == 0 {
                    1.0
                } else {
                    ((2 * m + 1) as f64 / (2 * m) as f64).sqrt()
                }
            })
            .collect();

        let mut rec_a = vec![0.0; alm_size(lmax)];
        let mut rec_b = vec![0.0; alm_size(lmax)];
        for m in 0..=lmax {
            for l in m + 2..=lmax {
                let i = alm_index(lmax, l, m);
                let (lf, mf) = (l as f64, m as f64);
                rec_a[i] = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
                let lm1 = lf - 1.0;
                rec_b[i] = ((lm1 * lm1 - mf * mf) / (4.0 * lm1 * lm1 - 1.0)).sqrt();
            }
        }

        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(nlon);
        let fft_inverse = planner.plan_fft_inverse(nlon);

        GaussLegendreGrid {
            lmax,
            nlon,
            cos_theta,
            sin_theta,
            weights,
            mm_coeffs,
            rec_a,
            rec_b,
            fft_forward,
            fft_inverse,
        }
    }

    pub fn nlat(&self) -> usize {
        self.cos_theta.len()
    }

    pub fn nlon(&self) -> usize {
        self.nlon
    }

    /// The colatitude of each ring \[radians\].
    pub fn colatitudes(&self) -> Vec<f64> {
        self.cos_theta.iter().map(|x| x.acos()).collect()
    }

    /// The (colatitude, longitude) of a pixel \[radians\].
    pub fn pixel_position(&self, pixel: usize) -> (f64, f64) {
        let (ring, k) = (pixel / self.nlon, pixel % self.nlon);
        (
            self.cos_theta[ring].acos(),
            TAU * k as f64 / self.nlon as f64,
        )
    }

    /// Fill `out` with the orthonormalised associated Legendre functions
    /// λ_ℓm(cos θ) of a ring for ℓ = m..=ℓmax.
    fn legendre_column(&self, m: usize, ring: usize, out: &mut [f64]) {
        let x = self.cos_theta[ring];
        let s = self.sin_theta[ring];
        let mut pmm = FRAC_1_SQRT_4PI;
        for &c in &self.mm_coeffs[1..=m] {
            pmm *= -c * s;
        }
        out[0] = pmm;
        if m < self.lmax {
            out[1] = ((2 * m + 3) as f64).sqrt() * x * pmm;
        }
        for l in m + 2..=self.lmax {
            let i = alm_index(self.lmax, l, m);
            out[l - m] = self.rec_a[i] * (x * out[l - m - 1] - self.rec_b[i] * out[l - m - 2]);
        }
    }
}

impl HarmonicTransform for GaussLegendreGrid {
    fn lmax(&self) -> usize {
        self.lmax
    }

    fn num_pixels(&self) -> usize {
        self.nlat() * self.nlon
    }

    fn map2alm(&self, map: ArrayView1<f64>) -> Result<Alm, TransformError> {
        if map.len() != self.num_pixels() {
            return Err(TransformError::MapSize {
                expected: self.num_pixels(),
                got: map.len(),
            });
        }
        let (nlat, nlon, lmax) = (self.nlat(), self.nlon, self.lmax);

        // Fourier-analyse every ring, including the quadrature weights.
        let ring_norm = TAU / nlon as f64;
        let mut ring_coeffs = Array2::<Complex64>::zeros((nlat, lmax + 1));
        ring_coeffs
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(ring, mut coeffs)| {
                let mut buffer: Vec<Complex64> = map
                    .slice(s![ring * nlon..(ring + 1) * nlon])
                    .iter()
                    .map(|&v| Complex64::new(v, 0.0))
                    .collect();
                self.fft_forward.process(&mut buffer);
                let w = self.weights[ring] * ring_norm;
                coeffs
                    .iter_mut()
                    .zip(buffer.iter())
                    .for_each(|(c, b)| *c = *b * w);
            });

        // Then do the Legendre sums. Every m is independent, and summing over
        // rings in a fixed order keeps the result deterministic.
        let columns: Vec<Vec<Complex64>> = (0..=lmax)
            .into_par_iter()
            .map(|m| {
                let mut column = vec![Complex64::default(); lmax + 1 - m];
                let mut lambda = vec![0.0; lmax + 1 - m];
                for ring in 0..nlat {
                    self.legendre_column(m, ring, &mut lambda);
                    let f = ring_coeffs[(ring, m)];
                    column
                        .iter_mut()
                        .zip(lambda.iter())
                        .for_each(|(c, &l)| *c += f * l);
                }
                column
            })
            .collect();

        let mut alm = Alm::zeros(lmax);
        for (m, column) in columns.into_iter().enumerate() {
            for (l, value) in (m..=lmax).zip(column) {
                alm.set(l, m, value);
            }
        }
        // a_ℓ0 of a real field is real.
        for l in 0..=lmax {
            let v = alm.get(l, 0);
            alm.set(l, 0, Complex64::new(v.re, 0.0));
        }
        Ok(alm)
    }

    fn alm2map(&self, alm: &Alm) -> Result<Array1<f64>, TransformError> {
        if alm.lmax() != self.lmax {
            return Err(TransformError::AlmLmax {
                expected: self.lmax,
                got: alm.lmax(),
            });
        }
        let (nlat, nlon, lmax) = (self.nlat(), self.nlon, self.lmax);

        // G_m(θ) = Σ_ℓ a_ℓm λ_ℓm(cos θ), one row per m.
        let mut ring_coeffs = Array2::<Complex64>::zeros((lmax + 1, nlat));
        ring_coeffs
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(m, mut per_ring)| {
                let column = alm.m_column(m);
                let mut lambda = vec![0.0; lmax + 1 - m];
                for (ring, g) in per_ring.iter_mut().enumerate() {
                    self.legendre_column(m, ring, &mut lambda);
                    *g = column
                        .iter()
                        .zip(lambda.iter())
                        .map(|(a, &l)| *a * l)
                        .sum();
                }
            });

        // Fourier-synthesise every ring.
        let mut map = Array1::zeros(nlat * nlon);
        map.axis_chunks_iter_mut(Axis(0), nlon)
            .into_par_iter()
            .enumerate()
            .for_each(|(ring, mut pixels)| {
                let mut buffer = vec![Complex64::default(); nlon];
                buffer[0] = Complex64::new(ring_coeffs[(0, ring)].re, 0.0);
                for m in 1..=lmax {
                    let g = ring_coeffs[(m, ring)];
                    buffer[m] = g;
                    buffer[nlon - m] = g.conj();
                }
                self.fft_inverse.process(&mut buffer);
                pixels
                    .iter_mut()
                    .zip(buffer.iter())
                    .for_each(|(p, b)| *p = b.re);
            });
        Ok(map)
    }
}

/// The nodes (cos θ, descending) and weights of n-point Gauss-Legendre
/// quadrature on [−1, 1].
pub(crate) fn gauss_legendre_nodes(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    for i in 0..(n + 1) / 2 {
        let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 1.0;
        for _ in 0..100 {
            // Evaluate P_n(z) and P_{n-1}(z) by upward recurrence.
            let mut p1 = 1.0;
            let mut p2 = 0.0;
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                p1 = ((2 * j + 1) as f64 * z * p2 - j as f64 * p3) / (j + 1) as f64;
            }
            dp = n as f64 * (z * p1 - p2) / (z * z - 1.0);
            let z_old = z;
            z = z_old - p1 / dp;
            if (z - z_old).abs() < 1e-15 {
                break;
            }
        }
        nodes[i] = z;
        nodes[n - 1 - i] = -z;
        weights[i] = 2.0 / ((1.0 - z * z) * dp * dp);
        weights[n - 1 - i] = weights[i];
    }
    (nodes, weights)
}
