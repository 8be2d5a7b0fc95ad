// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading and writing files.

use std::path::Path;

use thiserror::Error;

use crate::ErrorClass;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Couldn't open {file}: {source}")]
    Open {
        file: String,
        source: std::io::Error,
    },

    #[error("Couldn't create {file}: {source}")]
    Create {
        file: String,
        source: std::io::Error,
    },

    #[error("When reading {file}, expected HYPILCM as the first 7 characters, got '{got}' instead!")]
    MapMagic { file: String, got: String },

    #[error("{file} is truncated or corrupt: its header claims {claimed} pixels, but only {available} bytes of pixel data remain")]
    MapTruncated {
        file: String,
        claimed: u64,
        available: u64,
    },

    #[error("{file} line {line}: expected two numbers (ℓ and b_ℓ)")]
    BeamLine { file: String, line: usize },

    #[error("{file} line {line}: expected ℓ = {expected}, got {got}; beam profiles must start at ℓ = 0 with no gaps")]
    BeamMultipole {
        file: String,
        line: usize,
        expected: usize,
        got: f64,
    },

    #[error("Beam file {0} has no values")]
    EmptyBeam(String),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn open(file: &Path, source: std::io::Error) -> IoError {
        IoError::Open {
            file: file.display().to_string(),
            source,
        }
    }

    pub(crate) fn create(file: &Path, source: std::io::Error) -> IoError {
        IoError::Create {
            file: file.display().to_string(),
            source,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            IoError::BeamLine { .. } | IoError::BeamMultipole { .. } | IoError::EmptyBeam(_) => {
                ErrorClass::Config
            }
            _ => ErrorClass::Io,
        }
    }
}
