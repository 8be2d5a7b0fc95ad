// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing weight sets.
//!
//! The format is little endian throughout:
//!
//! - 7 bytes: ASCII "HYPILCW"
//! - u8: format version (1)
//! - u8: filter kind (0 = Gaussian needlets, 1 = harmonic bins)
//! - u32: number of channels
//! - u32: number of scales
//! - per scale: u32 first channel, u64 number of units, u32 number of active
//!   channels, then (units × active channels) f64 weights, unit-major.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use ndarray::prelude::*;

use super::{error::WeightFileError, ScaleWeights, WeightSet};
use crate::filters::WaveletType;

const MAGIC: &[u8; 7] = b"HYPILCW";
const VERSION: u8 = 1;
/// Magic, version, kind, channel count and scale count.
const HEADER_BYTES: u64 = 7 + 1 + 1 + 4 + 4;
/// First channel, unit count and active channel count.
const SCALE_HEADER_BYTES: u64 = 4 + 8 + 4;

impl WeightSet {
    pub fn read(file: &Path) -> Result<WeightSet, WeightFileError> {
        let file_str = file.display().to_string();
        let handle = File::open(file)?;
        let file_len = handle.metadata()?.len();
        let mut bin_file = BufReader::new(handle);
        let mut magic = [0; 7];
        bin_file.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(WeightFileError::BadMagic {
                file: file_str,
                got: String::from_utf8_lossy(&magic).to_string(),
            });
        }
        match bin_file.read_u8()? {
            VERSION => (),
            v => {
                return Err(WeightFileError::BadVersion {
                    file: file_str,
                    expected: VERSION,
                    got: v,
                })
            }
        }
        let kind = match bin_file.read_u8()? {
            0 => WaveletType::GaussianNeedlets,
            1 => WaveletType::HarmonicBins,
            v => {
                return Err(WeightFileError::BadKind {
                    file: file_str,
                    got: v,
                })
            }
        };
        let num_channels = bin_file.read_u32::<LittleEndian>()? as usize;
        let num_scales = bin_file.read_u32::<LittleEndian>()? as usize;

        // Every count in the header is checked against what's left of the
        // file before anything is allocated.
        let mut remaining = file_len.saturating_sub(HEADER_BYTES);
        let scale_headers = num_scales as u64 * SCALE_HEADER_BYTES;
        if scale_headers > remaining {
            return Err(WeightFileError::Truncated {
                file: file_str,
                needed: scale_headers,
                available: remaining,
            });
        }

        let mut scales = Vec::with_capacity(num_scales);
        for scale in 0..num_scales {
            take_bytes(&mut remaining, Some(SCALE_HEADER_BYTES), &file_str)?;
            let first_channel = bin_file.read_u32::<LittleEndian>()? as usize;
            let num_units = bin_file.read_u64::<LittleEndian>()?;
            let num_active = bin_file.read_u32::<LittleEndian>()? as usize;
            if num_active == 0 || first_channel + num_active != num_channels {
                return Err(WeightFileError::BadScale {
                    file: file_str,
                    scale,
                    first_channel,
                    num_active,
                    num_channels,
                });
            }
            take_bytes(
                &mut remaining,
                num_units
                    .checked_mul(num_active as u64)
                    .and_then(|n| n.checked_mul(8)),
                &file_str,
            )?;
            let num_units = num_units as usize;
            let mut flat = vec![0.0; num_units * num_active];
            bin_file.read_f64_into::<LittleEndian>(&mut flat)?;
            let weights = Array2::from_shape_vec((num_units, num_active), flat)
                .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidData))?;
            scales.push(ScaleWeights {
                first_channel,
                weights,
            });
        }
        debug!("Read {num_scales} scales of weights from {file_str}");

        Ok(WeightSet {
            kind,
            num_channels,
            scales,
        })
    }

    pub fn write(&self, file: &Path) -> Result<(), WeightFileError> {
        let mut bin_file = BufWriter::new(File::create(file)?);
        bin_file.write_all(MAGIC)?;
        bin_file.write_u8(VERSION)?;
        bin_file.write_u8(match self.kind {
            WaveletType::GaussianNeedlets => 0,
            WaveletType::HarmonicBins => 1,
        })?;
        bin_file.write_u32::<LittleEndian>(self.num_channels as _)?;
        bin_file.write_u32::<LittleEndian>(self.scales.len() as _)?;
        for scale in &self.scales {
            bin_file.write_u32::<LittleEndian>(scale.first_channel as _)?;
            bin_file.write_u64::<LittleEndian>(scale.num_units() as _)?;
            bin_file.write_u32::<LittleEndian>(scale.num_active() as _)?;
            for &w in scale.weights.iter() {
                bin_file.write_f64::<LittleEndian>(w)?;
            }
        }
        bin_file.flush()?;
        debug!("Wrote {} scales of weights to {}", self.scales.len(), file.display());
        Ok(())
    }
}

/// Consume `needed` bytes of the `remaining` budget, failing if the file is
/// too short (or the count overflowed).
fn take_bytes(remaining: &mut u64, needed: Option<u64>, file: &str) -> Result<(), WeightFileError> {
    match needed {
        Some(needed) if needed <= *remaining => {
            *remaining -= needed;
            Ok(())
        }
        _ => Err(WeightFileError::Truncated {
            file: file.to_string(),
            needed: needed.unwrap_or(u64::MAX),
            available: *remaining,
        }),
    }
}
