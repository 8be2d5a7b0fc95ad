// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Spherical-harmonic coefficients of real fields.

use std::ops::RangeInclusive;

use ndarray::{prelude::*, Zip};
use num_complex::Complex64;

use super::TransformError;

/// The spherical-harmonic coefficients a_ℓm of a real field on the sphere.
///
/// Because the field is real, a_ℓ,−m = (−1)^m a*_ℓm, so only m ≥ 0 is stored.
/// The ordering is the same as healpy's: all ℓ for m = 0, then all ℓ ≥ 1 for
/// m = 1, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct Alm {
    lmax: usize,
    coeffs: Array1<Complex64>,
}

/// The number of stored coefficients for a given ℓmax.
#[inline]
pub(crate) fn alm_size(lmax: usize) -> usize {
    (lmax + 1) * (lmax + 2) / 2
}

/// The storage index of (ℓ, m).
#[inline]
pub(crate) fn alm_index(lmax: usize, l: usize, m: usize) -> usize {
    debug_assert!(m <= l && l <= lmax);
    m * (2 * lmax + 1 - m) / 2 + l
}

impl Alm {
    pub fn zeros(lmax: usize) -> Alm {
        Alm {
            lmax,
            coeffs: Array1::zeros(alm_size(lmax)),
        }
    }

    pub fn from_coeffs(lmax: usize, coeffs: Array1<Complex64>) -> Result<Alm, TransformError> {
        let expected = alm_size(lmax);
        if coeffs.len() != expected {
            return Err(TransformError::AlmSize {
                lmax,
                expected,
                got: coeffs.len(),
            });
        }
        Ok(Alm { lmax, coeffs })
    }

    pub fn lmax(&self) -> usize {
        self.lmax
    }

    #[inline]
    pub fn index(&self, l: usize, m: usize) -> usize {
        alm_index(self.lmax, l, m)
    }

    #[inline]
    pub fn get(&self, l: usize, m: usize) -> Complex64 {
        self.coeffs[self.index(l, m)]
    }

    #[inline]
    pub fn set(&mut self, l: usize, m: usize, value: Complex64) {
        let i = self.index(l, m);
        self.coeffs[i] = value;
    }

    pub fn coeffs(&self) -> ArrayView1<Complex64> {
        self.coeffs.view()
    }

    pub fn coeffs_mut(&mut self) -> ArrayViewMut1<Complex64> {
        self.coeffs.view_mut()
    }

    /// The coefficients with this m, ordered by ℓ from m to ℓmax.
    pub(crate) fn m_column(&self, m: usize) -> ArrayView1<Complex64> {
        let start = self.index(m, m);
        self.coeffs.slice(s![start..start + self.lmax + 1 - m])
    }

    /// Multiply every a_ℓm by f_ℓ. `transfer` must have at least ℓmax+1
    /// entries; any beyond ℓmax are ignored.
    pub fn almxfl(&mut self, transfer: ArrayView1<f64>) -> Result<(), TransformError> {
        if transfer.len() < self.lmax + 1 {
            return Err(TransformError::TransferLength {
                need: self.lmax + 1,
                got: transfer.len(),
            });
        }
        for m in 0..=self.lmax {
            let start = self.index(m, m);
            self.coeffs
                .slice_mut(s![start..start + self.lmax + 1 - m])
                .iter_mut()
                .zip(transfer.slice(s![m..=self.lmax]))
                .for_each(|(a, &f)| *a *= f);
        }
        Ok(())
    }

    /// self += weight * other.
    pub fn scaled_add(&mut self, weight: f64, other: &Alm) -> Result<(), TransformError> {
        self.check_lmax(other)?;
        Zip::from(&mut self.coeffs)
            .and(&other.coeffs)
            .for_each(|a, &b| *a += b * weight);
        Ok(())
    }

    /// self += weight * other, but only for ℓ in `ells`.
    pub fn scaled_add_ells(
        &mut self,
        weight: f64,
        other: &Alm,
        ells: RangeInclusive<usize>,
    ) -> Result<(), TransformError> {
        self.check_lmax(other)?;
        let hi = (*ells.end()).min(self.lmax);
        for m in 0..=hi {
            let lo = (*ells.start()).max(m);
            if lo > hi {
                continue;
            }
            let (i, j) = (self.index(lo, m), self.index(hi, m));
            Zip::from(self.coeffs.slice_mut(s![i..=j]))
                .and(other.coeffs.slice(s![i..=j]))
                .for_each(|a, &b| *a += b * weight);
        }
        Ok(())
    }

    /// Σ_{m=−ℓ}^{ℓ} a_ℓm b*_ℓm for a single ℓ, i.e. (2ℓ+1) C_ℓ^{ab}.
    #[inline]
    fn mode_sum(&self, other: &Alm, l: usize) -> f64 {
        let mut sum = (self.get(l, 0) * other.get(l, 0).conj()).re;
        for m in 1..=l {
            sum += 2.0 * (self.get(l, m) * other.get(l, m).conj()).re;
        }
        sum
    }

    /// The cross power spectrum C_ℓ^{ab} for ℓ = 0..=ℓmax.
    pub fn cross_cl(&self, other: &Alm) -> Result<Array1<f64>, TransformError> {
        self.check_lmax(other)?;
        Ok((0..=self.lmax)
            .map(|l| self.mode_sum(other, l) / (2 * l + 1) as f64)
            .collect())
    }

    /// Σ_{ℓ ∈ range} (2ℓ+1) C_ℓ^{ab}; the cross power pooled over every mode
    /// in the range, without normalisation.
    pub fn cross_mode_sum(
        &self,
        other: &Alm,
        range: RangeInclusive<usize>,
    ) -> Result<f64, TransformError> {
        self.check_lmax(other)?;
        if *range.end() > self.lmax {
            return Err(TransformError::AlmLmax {
                expected: *range.end(),
                got: self.lmax,
            });
        }
        Ok(range.map(|l| self.mode_sum(other, l)).sum())
    }

    fn check_lmax(&self, other: &Alm) -> Result<(), TransformError> {
        if self.lmax != other.lmax {
            return Err(TransformError::AlmLmax {
                expected: self.lmax,
                got: other.lmax,
            });
        }
        Ok(())
    }
}

/// The number of modes (Σ 2ℓ+1) in an inclusive multipole range.
pub fn num_modes(range: RangeInclusive<usize>) -> f64 {
    range.map(|l| (2 * l + 1) as f64).sum()
}
