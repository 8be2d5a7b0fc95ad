// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Needlet and harmonic Internal Linear Combination (ILC) component separation
for multi-frequency sky maps.
 */

pub mod beam;
mod cli;
pub mod constants;
pub mod covariance;
pub mod crosscorr;
pub mod error;
pub mod filters;
pub mod io;
pub mod params;
pub mod recombine;
pub mod selection;
pub mod transform;
pub mod weights;

#[cfg(test)]
mod tests;

// Re-exports.
pub use cli::{Hyperilc, HyperilcError};
pub use error::ErrorClass;
pub use params::{IlcConfig, IlcInputs, IlcOutput, IlcParams};
pub use transform::{Alm, GaussLegendreGrid, HarmonicTransform};
pub use weights::WeightSet;

use crossbeam_utils::atomic::AtomicCell;

/// Are progress bars being drawn? This should only ever be enabled by CLI
/// code.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
