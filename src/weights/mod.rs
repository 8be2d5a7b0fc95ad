// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Constrained ILC weights.
//!
//! The weights w minimise the variance wᵗCw of the combined map subject to
//! wᵗa = 1 for the preserved component's response a, and wᵗb_k = 0 for each
//! deprojected component's response b_k. With A = [a, b_1, ..., b_K], the
//! solution is
//!
//! w = C⁻¹A (AᵗC⁻¹A)⁻¹ e₀
//!
//! where e₀ = (1, 0, ..., 0).

mod error;
mod io;

pub use error::{WeightError, WeightFileError};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::trace;
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::prelude::*;
use rayon::prelude::*;

use crate::{constants::CONSTRAINT_SINGULARITY_EPS, filters::WaveletType, PROGRESS_BARS};

/// The responses that the weights at one scale must satisfy, restricted to
/// the scale's active channels. The first column is the preserved component;
/// the rest are deprojected.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    /// (channel, constraint)
    matrix: Array2<f64>,
}

impl ConstraintSet {
    /// Deprojected responses are rescaled to have a maximum magnitude of 1;
    /// a null constraint doesn't care about its normalisation.
    pub fn new(
        preserved: ArrayView1<f64>,
        deprojected: &[ArrayView1<f64>],
    ) -> Result<ConstraintSet, WeightError> {
        let num_channels = preserved.len();
        let num_constraints = deprojected.len() + 1;
        if num_constraints > num_channels {
            return Err(WeightError::TooManyConstraints {
                num_constraints,
                num_channels,
            });
        }

        let mut matrix = Array2::zeros((num_channels, num_constraints));
        matrix.column_mut(0).assign(&preserved);
        for (k, b) in deprojected.iter().enumerate() {
            if b.len() != num_channels {
                return Err(WeightError::ResponseLength {
                    constraint: k + 1,
                    expected: num_channels,
                    got: b.len(),
                });
            }
            let max = b.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
            let mut column = matrix.column_mut(k + 1);
            column.assign(b);
            if max > 0.0 {
                column /= max;
            }
        }
        Ok(ConstraintSet { matrix })
    }

    pub fn num_channels(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_constraints(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> ArrayView2<f64> {
        self.matrix.view()
    }
}

/// Solve for the weights of a single covariance matrix, then check that the
/// weights really do satisfy the constraints to within `resp_tol`.
pub fn solve_weights(
    cov: ArrayView2<f64>,
    constraints: &ConstraintSet,
    resp_tol: f64,
) -> Result<Array1<f64>, WeightError> {
    let n = constraints.num_channels();
    let k = constraints.num_constraints();
    if cov.dim() != (n, n) {
        return Err(WeightError::CovarianceShape {
            expected: n,
            got: cov.dim(),
        });
    }

    let c = DMatrix::from_fn(n, n, |i, j| cov[(i, j)]);
    let a = DMatrix::from_fn(n, k, |i, j| constraints.matrix[(i, j)]);
    let chol = c.cholesky().ok_or(WeightError::NotPositiveDefinite)?;
    let c_inv_a = chol.solve(&a);
    let q = a.transpose() * &c_inv_a;
    let q = (&q + q.transpose()) * 0.5;

    // Conditioning is judged on the unit-diagonal form of Q, so the units
    // of the responses don't matter.
    let d = DVector::from_fn(k, |i, _| q[(i, i)]);
    if d.iter().any(|v| !(*v > 0.0)) {
        return Err(WeightError::DependentResponses { condition: 0.0 });
    }
    let d_inv_sqrt = d.map(|v| 1.0 / v.sqrt());
    let q_scaled = DMatrix::from_fn(k, k, |i, j| q[(i, j)] * d_inv_sqrt[i] * d_inv_sqrt[j]);

    let eigenvalues = SymmetricEigen::new(q_scaled.clone()).eigenvalues;
    let (min, max) = (eigenvalues.min(), eigenvalues.max());
    if !(max > 0.0) || min < CONSTRAINT_SINGULARITY_EPS * max {
        return Err(WeightError::DependentResponses {
            condition: if max > 0.0 { min / max } else { 0.0 },
        });
    }
    // Q x = e₀ with x = D^-½ y and (D^-½ Q D^-½) y = D^-½ e₀.
    let mut rhs = DVector::zeros(k);
    rhs[0] = d_inv_sqrt[0];
    let y = q_scaled
        .cholesky()
        .ok_or(WeightError::DependentResponses { condition: min / max })?
        .solve(&rhs);
    let x = y.component_mul(&d_inv_sqrt);
    let w = c_inv_a * x;
    let w = Array1::from_iter(w.iter().copied());

    for (i, column) in constraints.matrix.axis_iter(Axis(1)).enumerate() {
        let target = if i == 0 { 1.0 } else { 0.0 };
        let achieved = w.dot(&column);
        if !((achieved - target).abs() < resp_tol) {
            return Err(WeightError::ResponseCheck {
                constraint: i,
                achieved,
                target,
                resp_tol,
            });
        }
    }
    Ok(w)
}

/// Solve for the weights of every unit (pixel or bin) in a covariance arena
/// with dimensions (unit, channel, channel). The returned weights have
/// dimensions (unit, channel). If any unit fails, the error of the
/// lowest-indexed failure is returned.
pub fn solve_arena_weights(
    cov_arena: ArrayView3<f64>,
    constraints: &ConstraintSet,
    resp_tol: f64,
    progress_bar: &ProgressBar,
) -> Result<Array2<f64>, WeightError> {
    let (num_units, n, _) = cov_arena.dim();
    if n != constraints.num_channels() {
        return Err(WeightError::CovarianceShape {
            expected: constraints.num_channels(),
            got: (n, cov_arena.dim().2),
        });
    }

    let mut weights = Array2::zeros((num_units, n));
    let failures: Vec<(usize, WeightError)> = weights
        .outer_iter_mut()
        .into_par_iter()
        .zip(cov_arena.outer_iter())
        .enumerate()
        .filter_map(|(unit, (mut w, cov))| {
            let result = solve_weights(cov, constraints, resp_tol);
            progress_bar.inc(1);
            match result {
                Ok(solved) => {
                    w.assign(&solved);
                    None
                }
                Err(e) => Some((unit, e)),
            }
        })
        .collect();
    progress_bar.finish();

    if let Some((unit, e)) = failures.into_iter().next() {
        return Err(WeightError::AtUnit {
            unit,
            source: Box::new(e),
        });
    }
    trace!("Solved weights for {num_units} units");
    Ok(weights)
}

/// Convenience function to make a progress bar while solving for weights.
pub(crate) fn make_weights_progress_bar(num_units: usize, message: String) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(num_units as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg}: [{wide_bar:.blue}] {pos:3}/{len:3} ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(message)
}

/// The weights of one scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleWeights {
    /// The lowest-resolution channel used at this scale. The weights apply
    /// to this channel and all higher-resolution ones.
    pub first_channel: usize,

    /// (unit, active channel). For needlets there is one unit per pixel; for
    /// harmonic bins, a single unit.
    pub weights: Array2<f64>,
}

impl ScaleWeights {
    pub fn num_active(&self) -> usize {
        self.weights.ncols()
    }

    pub fn num_units(&self) -> usize {
        self.weights.nrows()
    }
}

/// Every scale's weights; enough to apply an ILC to new maps without
/// re-estimating anything.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    pub kind: WaveletType,
    pub num_channels: usize,
    pub scales: Vec<ScaleWeights>,
}

impl WeightSet {
    pub fn num_scales(&self) -> usize {
        self.scales.len()
    }
}
