// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Measure the (cross) power spectrum of maps, e.g. an ILC map against a
//! tracer of a contaminant.


use std::path::PathBuf;

use clap::Parser;
use log::info;
use thiserror::Error;

use super::common::{GridArgs, InfoPrinter};
use crate::{
    crosscorr::{bin_spectrum, cross_spectrum},
    io::{read_map, write_binned_spectrum, write_spectrum},
    HarmonicTransform, HyperilcError,
};

#[derive(Parser, Debug)]
pub(super) struct CrossCorrelateArgs {
    /// The first map.
    #[clap(name = "MAP1", parse(from_os_str))]
    map1: PathBuf,

    /// The second map. If not given, the auto spectrum of the first map is
    /// measured.
    #[clap(name = "MAP2", parse(from_os_str))]
    map2: Option<PathBuf>,

    /// A mask (a map of pixel weights) applied to both maps. The spectrum is
    /// corrected for the masked sky fraction.
    #[clap(short, long, parse(from_os_str))]
    mask: Option<PathBuf>,

    /// The maximum multipole of the spectrum.
    #[clap(short, long)]
    ellmax: usize,

    #[clap(flatten)]
    grid_args: GridArgs,

    /// Average the spectrum in bins of this many multipoles.
    #[clap(short, long)]
    bin_width: Option<usize>,

    /// The file to write the spectrum to.
    #[clap(short, long, default_value = "hyperilc_cl.txt", parse(from_os_str))]
    output: PathBuf,
}

impl CrossCorrelateArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), HyperilcError> {
        let CrossCorrelateArgs {
            map1,
            map2,
            mask,
            ellmax,
            grid_args,
            bin_width,
            output,
        } = self;

        if ellmax == 0 {
            return Err(CrossCorrelateArgsError::ZeroEllmax.into());
        }
        let grid = grid_args.parse(ellmax)?;

        let mut printer = InfoPrinter::new("Spectrum".into());
        match &map2 {
            Some(map2) => printer.push_line(
                format!("Cross spectrum of {} and {}", map1.display(), map2.display()).into(),
            ),
            None => printer.push_line(format!("Auto spectrum of {}", map1.display()).into()),
        }
        if let Some(mask) = &mask {
            printer.push_line(format!("Mask: {}", mask.display()).into());
        }
        if let Some(w) = bin_width {
            printer.push_line(format!("Bin width: {w}").into());
        }
        printer.push_line(format!("Output: {}", output.display()).into());
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let x = read_map(&map1)?;
        let y = match &map2 {
            Some(f) => read_map(f)?,
            None => x.clone(),
        };
        let mask = mask.as_deref().map(read_map).transpose()?;
        for (file, map) in [(Some(&map1), &x), (map2.as_ref(), &y)] {
            if map.len() != grid.num_pixels() {
                return Err(CrossCorrelateArgsError::MapSize {
                    file: file.unwrap_or(&map1).display().to_string(),
                    got: map.len(),
                    expected: grid.num_pixels(),
                }
                .into());
            }
        }

        let cl = cross_spectrum(&grid, x.view(), y.view(), mask.as_ref().map(|m| m.view()))?;
        match bin_width {
            Some(w) => write_binned_spectrum(&bin_spectrum(cl.view(), w)?, &output)?,
            None => write_spectrum(cl.view(), &output)?,
        }
        info!("Wrote spectrum to {}", output.display());
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum CrossCorrelateArgsError {
    #[error("ELLMAX must be positive")]
    ZeroEllmax,

    #[error("{file} has {got} pixels, but the map grid has {expected}")]
    MapSize {
        file: String,
        got: usize,
        expected: usize,
    },
}
