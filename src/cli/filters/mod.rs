// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Inspect a filter bank without running an ILC.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use ndarray::prelude::*;

use super::common::{FilterBankArgs, InfoPrinter};
use crate::{
    constants::DEFAULT_WAVELET_BEAM_CRITERION,
    filters::FilterBank,
    io::write_columns,
    params::FilterConfig,
    HyperilcError,
};

#[derive(Parser, Debug)]
pub(super) struct FiltersArgs {
    #[clap(flatten)]
    filter_args: FilterBankArgs,

    /// The beam value used to find each scale's characteristic multipole.
    #[clap(long, default_value_t = DEFAULT_WAVELET_BEAM_CRITERION)]
    wavelet_beam_criterion: f64,

    /// Write the windows to this file. Each line holds ℓ followed by the
    /// window of every scale at ℓ.
    #[clap(short, long)]
    output: Option<PathBuf>,
}

impl FiltersArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), HyperilcError> {
        let (ellmax, filters) = self.filter_args.parse()?;
        let bank = match &filters {
            FilterConfig::GaussianNeedlets {
                num_scales,
                fwhm_arcmin,
            } => FilterBank::gaussian_needlets(ellmax, *num_scales, fwhm_arcmin)?,
            FilterConfig::HarmonicBins { bin_size } => FilterBank::harmonic_bins(ellmax, *bin_size)?,
        };

        let mut printer = InfoPrinter::new(
            format!("{} with {} scales", bank.wavelet_type(), bank.num_scales()).into(),
        );
        printer.push_line(format!("ELLMAX: {ellmax}").into());
        let ells = bank.characteristic_ells(self.wavelet_beam_criterion);
        for (j, l) in ells.iter().enumerate() {
            let mut block = vec![format!("Scale {j}").into()];
            if let Some(range) = bank.bin_range(j) {
                block.push(format!("ℓ: {}..={}", range.start(), range.end()).into());
            } else if let Some(fwhm) = bank.needlet_fwhm_arcmin() {
                if let Some(f) = fwhm.get(j) {
                    block.push(format!("Gaussian FWHM: {f} arcmin").into());
                }
            }
            block.push(format!("Characteristic ℓ: {l}").into());
            block.push(format!("Effective modes: {:.1}", bank.effective_modes(j)).into());
            printer.push_block(block);
        }
        printer.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        if let Some(output) = self.output {
            let mut columns = Array2::zeros((ellmax + 1, bank.num_scales() + 1));
            columns
                .column_mut(0)
                .assign(&Array1::from_shape_fn(ellmax + 1, |l| l as f64));
            columns.slice_mut(s![.., 1..]).assign(&bank.windows().t());
            write_columns("ell window_0 ... window_N", columns.view(), &output)?;
            info!("Wrote filter windows to {}", output.display());
        }
        Ok(())
    }
}
