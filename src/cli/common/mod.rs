// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Here, we abstract many aspects
//! of `hyperilc`, e.g. the `ilc` and `filters` subcommands both build a filter
//! bank, and the `ilc` and `cross-correlate` subcommands both need a harmonic
//! transform, so those arguments are shared between them.

mod printers;
#[cfg(test)]
mod tests;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::str::FromStr;

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    constants::DEFAULT_GN_FWHM_ARCMIN,
    filters::WaveletType,
    params::FilterConfig,
    transform::{GaussLegendreGrid, TransformError},
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref WAVELET_TYPES_COMMA_SEPARATED: String = WaveletType::iter().join(", ");

    static ref WAVELET_TYPE_HELP: String =
        format!("The kind of filter bank to use. Supported types: {}. Default: {}", *WAVELET_TYPES_COMMA_SEPARATED, WaveletType::GaussianNeedlets);

    static ref GN_FWHM_HELP: String =
        format!("The FWHMs of the Gaussians that define the needlet windows [arcmin], strictly decreasing; one fewer than the number of scales. Default: the first (num_scales - 1) of {DEFAULT_GN_FWHM_ARCMIN:?}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(HyperilcError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(HyperilcError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(HyperilcError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct FilterBankArgs {
    /// The maximum multipole of the analysis. Maps are analysed, and the
    /// output is synthesised, up to this multipole.
    #[clap(short, long, help_heading = "FILTERS")]
    pub(super) ellmax: Option<usize>,

    #[clap(long, help = WAVELET_TYPE_HELP.as_str(), help_heading = "FILTERS")]
    pub(super) wavelet_type: Option<String>,

    /// The number of needlet scales. Default: one more than the number of
    /// needlet FWHMs.
    #[clap(long, help_heading = "FILTERS")]
    pub(super) num_scales: Option<usize>,

    #[clap(long, multiple_values(true), help = GN_FWHM_HELP.as_str(), help_heading = "FILTERS")]
    pub(super) gn_fwhm_arcmin: Option<Vec<f64>>,

    /// The width of each harmonic bin. Required for harmonic ILC.
    #[clap(long, help_heading = "FILTERS")]
    pub(super) bin_size: Option<usize>,
}

impl FilterBankArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            ellmax: self.ellmax.or(other.ellmax),
            wavelet_type: self.wavelet_type.or(other.wavelet_type),
            num_scales: self.num_scales.or(other.num_scales),
            gn_fwhm_arcmin: self.gn_fwhm_arcmin.or(other.gn_fwhm_arcmin),
            bin_size: self.bin_size.or(other.bin_size),
        }
    }

    /// Get ELLMAX and the filter bank configuration. Nothing is checked
    /// beyond what's needed to fill in defaults; [`crate::IlcConfig`] and
    /// [`crate::filters::FilterBank`] do the rest.
    pub(super) fn parse(self) -> Result<(usize, FilterConfig), CommonArgsError> {
        let FilterBankArgs {
            ellmax,
            wavelet_type,
            num_scales,
            gn_fwhm_arcmin,
            bin_size,
        } = self;

        let ellmax = ellmax.ok_or(CommonArgsError::NoEllmax)?;
        let wavelet_type = match wavelet_type {
            None => WaveletType::GaussianNeedlets,
            Some(s) => WaveletType::from_str(&s).map_err(|_| CommonArgsError::BadWaveletType {
                got: s,
                valid: WAVELET_TYPES_COMMA_SEPARATED.as_str(),
            })?,
        };
        debug!("Using filter bank type {wavelet_type}");

        let filters = match wavelet_type {
            WaveletType::GaussianNeedlets => {
                let fwhm_arcmin = match (num_scales, gn_fwhm_arcmin) {
                    (_, Some(f)) => f,
                    (Some(n), None) => {
                        let max = DEFAULT_GN_FWHM_ARCMIN.len() + 1;
                        if n > max {
                            return Err(CommonArgsError::TooManyDefaultScales { num_scales: n, max });
                        }
                        DEFAULT_GN_FWHM_ARCMIN[..n.saturating_sub(1)].to_vec()
                    }
                    (None, None) => DEFAULT_GN_FWHM_ARCMIN.to_vec(),
                };
                FilterConfig::GaussianNeedlets {
                    num_scales: num_scales.unwrap_or(fwhm_arcmin.len() + 1),
                    fwhm_arcmin,
                }
            }

            WaveletType::HarmonicBins => FilterConfig::HarmonicBins {
                bin_size: bin_size.ok_or(CommonArgsError::NoBinSize)?,
            },
        };
        Ok((ellmax, filters))
    }
}

/// The pixelisation of maps. Maps are on a Gauss-Legendre grid; by default, the
/// smallest one that is exact for ELLMAX.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct GridArgs {
    /// The number of iso-latitude rings of the map grid. Default: ELLMAX + 1.
    #[clap(long, help_heading = "MAP GRID")]
    pub(super) nlat: Option<usize>,

    /// The number of pixels per ring of the map grid. Default: 2 ELLMAX + 2.
    #[clap(long, help_heading = "MAP GRID")]
    pub(super) nlon: Option<usize>,
}

impl GridArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            nlat: self.nlat.or(other.nlat),
            nlon: self.nlon.or(other.nlon),
        }
    }

    pub(super) fn parse(self, lmax: usize) -> Result<GaussLegendreGrid, TransformError> {
        let grid = match (self.nlat, self.nlon) {
            (None, None) => GaussLegendreGrid::with_lmax(lmax),
            (nlat, nlon) => GaussLegendreGrid::new(
                lmax,
                nlat.unwrap_or(lmax + 1),
                nlon.unwrap_or(2 * lmax + 2),
            )?,
        };

        let mut printer = InfoPrinter::new("Map grid".into());
        printer.push_line(
            format!(
                "Gauss-Legendre, {} rings x {} pixels ({} pixels)",
                grid.nlat(),
                grid.nlon(),
                grid.nlat() * grid.nlon()
            )
            .into(),
        );
        printer.push_line(format!("ℓmax: {lmax}").into());
        printer.display();
        Ok(grid)
    }
}

#[derive(Error, Debug)]
pub(super) enum CommonArgsError {
    #[error("No ELLMAX was supplied")]
    NoEllmax,

    #[error("Unrecognised wavelet type '{got}'; valid types are: {valid}")]
    BadWaveletType { got: String, valid: &'static str },

    #[error("Harmonic ILC needs a bin size")]
    NoBinSize,

    #[error("{num_scales} needlet scales were requested, but there are only enough default FWHMs for {max}; specify the FWHMs")]
    TooManyDefaultScales { num_scales: usize, max: usize },
}
