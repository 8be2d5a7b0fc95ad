// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The classes that every ILC-related error belongs to.
//!
//! Each module keeps its own error enum, but all of them can report which of
//! these classes they fall into. This determines how an error propagates:
//! config errors stop everything before any computation starts, constraint
//! errors only invalidate the affected filter scale, and consistency errors
//! indicate a bug in hyperilc itself.

use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or inconsistent configuration. Always fatal, and reported
    /// before any computation starts.
    #[strum(serialize = "CONFIG")]
    Config,

    /// Numerical trouble estimating a covariance matrix. Usually recoverable
    /// with regularisation; only fatal if the matrix has non-finite entries.
    #[strum(serialize = "ESTIMATION")]
    Estimation,

    /// A singular or over-constrained weight system. Fatal for the affected
    /// scale, but other scales are unaffected.
    #[strum(serialize = "CONSTRAINT")]
    Constraint,

    /// A post-construction check failed (e.g. partition of unity, response
    /// verification). Always fatal.
    #[strum(serialize = "CONSISTENCY")]
    Consistency,

    /// Reading or writing files, or talking to the harmonic transform.
    #[strum(serialize = "IO")]
    Io,
}
