// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (input/output, reading/writing), for maps, beams and spectra.
//!
//! Maps are stored in a small binary format, little endian throughout: the
//! 7 ASCII bytes "HYPILCM", a u64 pixel count, then that many f64 values in
//! the pixel order of the harmonic transform in use.

mod error;

pub use error::IoError;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::trace;
use ndarray::prelude::*;

use crate::crosscorr::BinnedSpectrum;

const MAP_MAGIC: &[u8; 7] = b"HYPILCM";

pub fn read_map(file: &Path) -> Result<Array1<f64>, IoError> {
    let handle = File::open(file).map_err(|e| IoError::open(file, e))?;
    let file_len = handle.metadata()?.len();
    let mut bin_file = BufReader::new(handle);
    let mut magic = [0; 7];
    bin_file.read_exact(&mut magic)?;
    if &magic != MAP_MAGIC {
        return Err(IoError::MapMagic {
            file: file.display().to_string(),
            got: String::from_utf8_lossy(&magic).to_string(),
        });
    }
    let claimed = bin_file.read_u64::<LittleEndian>()?;
    // Magic plus the pixel count.
    let available = file_len.saturating_sub(7 + 8);
    match claimed.checked_mul(8) {
        Some(needed) if needed <= available => (),
        _ => {
            return Err(IoError::MapTruncated {
                file: file.display().to_string(),
                claimed,
                available,
            })
        }
    }
    let len = claimed as usize;
    let mut map = Array1::zeros(len);
    // `Array1::zeros` is always contiguous.
    if let Some(slice) = map.as_slice_mut() {
        bin_file.read_f64_into::<LittleEndian>(slice)?;
    }
    trace!("Read {len} pixels from {}", file.display());
    Ok(map)
}

pub fn write_map(map: ArrayView1<f64>, file: &Path) -> Result<(), IoError> {
    let mut bin_file = BufWriter::new(File::create(file).map_err(|e| IoError::create(file, e))?);
    bin_file.write_all(MAP_MAGIC)?;
    bin_file.write_u64::<LittleEndian>(map.len() as u64)?;
    for &v in map.iter() {
        bin_file.write_f64::<LittleEndian>(v)?;
    }
    bin_file.flush()?;
    Ok(())
}

/// Read a beam transfer function from a text file with two columns, ℓ and
/// b_ℓ. Multipoles must start at 0 and be consecutive. Blank lines and lines
/// starting with '#' are ignored.
pub fn read_beam_profile(file: &Path) -> Result<Vec<f64>, IoError> {
    let file_str = file.display().to_string();
    let reader = BufReader::new(File::open(file).map_err(|e| IoError::open(file, e))?);
    let mut profile = vec![];
    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut columns = line.split_whitespace();
        let parse = |s: Option<&str>| s.and_then(|s| s.parse::<f64>().ok());
        match (parse(columns.next()), parse(columns.next())) {
            (Some(l), Some(b)) if l == profile.len() as f64 => profile.push(b),
            (Some(l), Some(_)) => {
                return Err(IoError::BeamMultipole {
                    file: file_str,
                    line: i_line + 1,
                    expected: profile.len(),
                    got: l,
                })
            }
            _ => {
                return Err(IoError::BeamLine {
                    file: file_str,
                    line: i_line + 1,
                })
            }
        }
    }
    if profile.is_empty() {
        return Err(IoError::EmptyBeam(file_str));
    }
    Ok(profile)
}

/// Write a power spectrum as two whitespace-separated columns, ℓ and C_ℓ.
pub fn write_spectrum(cl: ArrayView1<f64>, file: &Path) -> Result<(), IoError> {
    let mut f = BufWriter::new(File::create(file).map_err(|e| IoError::create(file, e))?);
    writeln!(f, "# ell C_ell")?;
    for (l, c) in cl.iter().enumerate() {
        writeln!(f, "{l} {c:.12e}")?;
    }
    f.flush()?;
    Ok(())
}

/// Write a binned power spectrum as two whitespace-separated columns, the
/// bin centre and the mean C_ℓ.
pub fn write_binned_spectrum(spectrum: &BinnedSpectrum, file: &Path) -> Result<(), IoError> {
    let mut f = BufWriter::new(File::create(file).map_err(|e| IoError::create(file, e))?);
    writeln!(f, "# ell_centre C_ell")?;
    for (l, c) in spectrum.centres.iter().zip(spectrum.values.iter()) {
        writeln!(f, "{l} {c:.12e}")?;
    }
    f.flush()?;
    Ok(())
}

/// Write columns of numbers with a header line; used for filter windows.
pub fn write_columns(
    header: &str,
    columns: ArrayView2<f64>,
    file: &Path,
) -> Result<(), IoError> {
    let mut f = BufWriter::new(File::create(file).map_err(|e| IoError::create(file, e))?);
    writeln!(f, "# {header}")?;
    for row in columns.outer_iter() {
        let line = row
            .iter()
            .map(|v| format!("{v:.12e}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "{line}")?;
    }
    f.flush()?;
    Ok(())
}
