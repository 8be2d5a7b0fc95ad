// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse ILC arguments into parameters, then run the ILC.


use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, FilterBankArgs, GridArgs, InfoPrinter, Warn, ARG_FILE_HELP,
};
use crate::{
    beam::BeamProfile,
    constants::{DEFAULT_ILC_BIAS_TOL, DEFAULT_RESP_TOL, DEFAULT_WAVELET_BEAM_CRITERION},
    crosscorr::{bin_spectrum, cross_spectrum},
    io::{read_beam_profile, read_map, write_binned_spectrum, write_map, write_spectrum, IoError},
    params::{ChannelConfig, ComponentResponse, DeprojCount, IlcConfig},
    selection::SelectionPolicy,
    GaussLegendreGrid, HyperilcError, IlcInputs, IlcParams, WeightSet,
};

const DEFAULT_OUTPUT_MAP_FILENAME: &str = "hyperilc_ilc.map";

/// The preserved component if none is specified. If no response is given for
/// it, it is assumed to respond equally in every channel (i.e. maps are in
/// thermodynamic units).
const DEFAULT_PRESERVED_COMPONENT: &str = "cmb";

lazy_static::lazy_static! {
    static ref PRESERVED_HELP: String =
        format!("The name of the component to preserve. Default: {DEFAULT_PRESERVED_COMPONENT}");

    static ref ILC_BIAS_TOL_HELP: String =
        format!("The tolerated fractional ILC bias. Smaller values mean larger covariance localisation kernels. Default: {DEFAULT_ILC_BIAS_TOL}");

    static ref RESP_TOL_HELP: String =
        format!("The tolerance on the responses of the solved weights. Default: {DEFAULT_RESP_TOL:e}");

    static ref WAVELET_BEAM_CRITERION_HELP: String =
        format!("A channel is used at a scale only if its beam at the scale's characteristic multipole is at least this. Default: {DEFAULT_WAVELET_BEAM_CRITERION:e}");

    static ref OUTPUT_MAP_HELP: String =
        format!("The path to the output ILC map. Default: {DEFAULT_OUTPUT_MAP_FILENAME}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
struct ChannelArgs {
    /// The map of each channel. Channels must be ordered from the lowest to
    /// the highest angular resolution.
    #[clap(short, long, multiple_values(true), help_heading = "CHANNELS")]
    maps: Option<Vec<PathBuf>>,

    /// The name of each channel. Default: the map file names.
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    names: Option<Vec<String>>,

    /// The central frequency of each channel [GHz]. Only used for reporting.
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    freqs_ghz: Option<Vec<f64>>,

    /// The FWHM of each channel's Gaussian beam [arcmin].
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    beam_fwhm_arcmin: Option<Vec<f64>>,

    /// A beam transfer function file for each channel (columns ℓ and b_ℓ).
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    beam_files: Option<Vec<PathBuf>>,

    /// The first of two noise-independent splits of each channel. Needed for
    /// cross-ILC.
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    split1_maps: Option<Vec<PathBuf>>,

    /// The second of two noise-independent splits of each channel.
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    split2_maps: Option<Vec<PathBuf>>,

    /// Apply the derived weights to these maps instead of the input maps,
    /// e.g. to propagate noise simulations.
    #[clap(long, multiple_values(true), help_heading = "CHANNELS")]
    apply_maps: Option<Vec<PathBuf>>,
}

impl ChannelArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            maps: self.maps.or(other.maps),
            names: self.names.or(other.names),
            freqs_ghz: self.freqs_ghz.or(other.freqs_ghz),
            beam_fwhm_arcmin: self.beam_fwhm_arcmin.or(other.beam_fwhm_arcmin),
            beam_files: self.beam_files.or(other.beam_files),
            split1_maps: self.split1_maps.or(other.split1_maps),
            split2_maps: self.split2_maps.or(other.split2_maps),
            apply_maps: self.apply_maps.or(other.apply_maps),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
struct IlcCliArgs {
    /// The response of a sky component in every channel, as NAME=r1,r2,...
    /// (one response per channel, in channel order).
    #[clap(long, multiple_values(true), help_heading = "COMPONENTS")]
    components: Option<Vec<String>>,

    #[clap(long, help = PRESERVED_HELP.as_str(), help_heading = "COMPONENTS")]
    preserved_component: Option<String>,

    /// The names of components that may be deprojected, in priority order.
    #[clap(long, multiple_values(true), help_heading = "COMPONENTS")]
    deprojected_components: Option<Vec<String>>,

    /// How many of the deprojected components to deproject; either one
    /// number for every scale, or a comma-separated number per scale. Default:
    /// 0.
    #[clap(long, help_heading = "COMPONENTS")]
    num_deproj: Option<DeprojCount>,

    #[clap(long, help = ILC_BIAS_TOL_HELP.as_str(), help_heading = "ILC")]
    ilc_bias_tol: Option<f64>,

    #[clap(long, help = RESP_TOL_HELP.as_str(), help_heading = "ILC")]
    resp_tol: Option<f64>,

    #[clap(long, help = WAVELET_BEAM_CRITERION_HELP.as_str(), help_heading = "ILC")]
    wavelet_beam_criterion: Option<f64>,

    /// Use exactly this many of the highest-resolution channels at each scale,
    /// rather than selecting channels by their beams.
    #[clap(long, multiple_values(true), help_heading = "ILC")]
    override_n_freqs_to_use: Option<Vec<usize>>,

    /// Estimate covariances only from cross products of the channel splits.
    #[clap(long, help_heading = "ILC")]
    #[serde(default)]
    cross_ilc: bool,

    /// Taper the input maps' harmonic coefficients to zero over this many
    /// multipoles below ELLMAX.
    #[clap(long, help_heading = "ILC")]
    taper_width: Option<usize>,

    /// The FWHM of the Gaussian beam of the output map [arcmin]. Default: the
    /// beam of the highest-resolution channel.
    #[clap(long, help_heading = "ILC")]
    common_beam_fwhm_arcmin: Option<f64>,

    /// A beam transfer function file for the output map.
    #[clap(long, help_heading = "ILC")]
    common_beam_file: Option<PathBuf>,

    /// Don't derive weights; use the weights in this file.
    #[clap(long, help_heading = "ILC")]
    input_weights: Option<PathBuf>,

    #[clap(short, long, help = OUTPUT_MAP_HELP.as_str(), help_heading = "OUTPUT FILES")]
    output_map: Option<PathBuf>,

    /// Write the ILC weights to this file.
    #[clap(long, help_heading = "OUTPUT FILES")]
    output_weights: Option<PathBuf>,

    /// Cross-correlate the ILC map with each of these maps. Each spectrum is
    /// written next to the output map, named <map>_x_<other>.txt.
    #[clap(long, multiple_values(true), help_heading = "OUTPUT FILES")]
    xcorr_maps: Option<Vec<PathBuf>>,

    /// A mask applied when cross-correlating.
    #[clap(long, help_heading = "OUTPUT FILES")]
    xcorr_mask: Option<PathBuf>,

    /// Average cross spectra in bins of this many multipoles.
    #[clap(long, help_heading = "OUTPUT FILES")]
    xcorr_bin_width: Option<usize>,
}

impl IlcCliArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            components: self.components.or(other.components),
            preserved_component: self.preserved_component.or(other.preserved_component),
            deprojected_components: self.deprojected_components.or(other.deprojected_components),
            num_deproj: self.num_deproj.or(other.num_deproj),
            ilc_bias_tol: self.ilc_bias_tol.or(other.ilc_bias_tol),
            resp_tol: self.resp_tol.or(other.resp_tol),
            wavelet_beam_criterion: self.wavelet_beam_criterion.or(other.wavelet_beam_criterion),
            override_n_freqs_to_use: self.override_n_freqs_to_use.or(other.override_n_freqs_to_use),
            cross_ilc: self.cross_ilc || other.cross_ilc,
            taper_width: self.taper_width.or(other.taper_width),
            common_beam_fwhm_arcmin: self.common_beam_fwhm_arcmin.or(other.common_beam_fwhm_arcmin),
            common_beam_file: self.common_beam_file.or(other.common_beam_file),
            input_weights: self.input_weights.or(other.input_weights),
            output_map: self.output_map.or(other.output_map),
            output_weights: self.output_weights.or(other.output_weights),
            xcorr_maps: self.xcorr_maps.or(other.xcorr_maps),
            xcorr_mask: self.xcorr_mask.or(other.xcorr_mask),
            xcorr_bin_width: self.xcorr_bin_width.or(other.xcorr_bin_width),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct IlcArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "filters")]
    #[serde(default)]
    filter_args: FilterBankArgs,

    #[clap(flatten)]
    #[serde(rename = "grid")]
    #[serde(default)]
    grid_args: GridArgs,

    #[clap(flatten)]
    #[serde(rename = "channels")]
    #[serde(default)]
    channel_args: ChannelArgs,

    #[clap(flatten)]
    #[serde(rename = "ilc")]
    #[serde(default)]
    ilc_args: IlcCliArgs,
}

/// Everything needed to run an ILC from files.
struct IlcJob {
    params: IlcParams,
    grid: GaussLegendreGrid,
    maps: Vec<PathBuf>,
    splits: Option<(Vec<PathBuf>, Vec<PathBuf>)>,
    apply_maps: Option<Vec<PathBuf>>,
    input_weights: Option<PathBuf>,
    output_map: PathBuf,
    output_weights: Option<PathBuf>,
    xcorr: Option<XcorrJob>,
}

struct XcorrJob {
    maps: Vec<PathBuf>,
    mask: Option<PathBuf>,
    bin_width: Option<usize>,
}

impl IlcArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<IlcArgs, HyperilcError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let IlcArgs {
                args_file: _,
                filter_args,
                grid_args,
                channel_args,
                ilc_args,
            } = unpack_arg_file!(arg_file);

            Ok(IlcArgs {
                args_file: None,
                filter_args: cli_args.filter_args.merge(filter_args),
                grid_args: cli_args.grid_args.merge(grid_args),
                channel_args: cli_args.channel_args.merge(channel_args),
                ilc_args: cli_args.ilc_args.merge(ilc_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Parse the arguments into an ILC job. No maps are read, but beam files
    /// are.
    fn parse(self) -> Result<IlcJob, HyperilcError> {
        debug!("{:#?}", self);

        let IlcArgs {
            args_file: _,
            filter_args,
            grid_args,
            channel_args,
            ilc_args,
        } = self;

        let (ellmax, filters) = filter_args.parse()?;
        let (channels, maps, splits, apply_maps) = parse_channels(channel_args)?;
        let num_channels = channels.len();

        let IlcCliArgs {
            components,
            preserved_component,
            deprojected_components,
            num_deproj,
            ilc_bias_tol,
            resp_tol,
            wavelet_beam_criterion,
            override_n_freqs_to_use,
            cross_ilc,
            taper_width,
            common_beam_fwhm_arcmin,
            common_beam_file,
            input_weights,
            output_map,
            output_weights,
            xcorr_maps,
            xcorr_mask,
            xcorr_bin_width,
        } = ilc_args;

        let components = components
            .unwrap_or_default()
            .iter()
            .map(|s| parse_component(s))
            .collect::<Result<Vec<_>, _>>()?;
        let find_component = |name: &str| {
            components
                .iter()
                .find(|c| c.name == name)
                .cloned()
                .ok_or_else(|| IlcArgsError::UnknownComponent(name.to_string()))
        };
        let preserved_name =
            preserved_component.unwrap_or_else(|| DEFAULT_PRESERVED_COMPONENT.to_string());
        let preserved = match find_component(&preserved_name) {
            Ok(c) => c,
            Err(_) if preserved_name.eq_ignore_ascii_case(DEFAULT_PRESERVED_COMPONENT) => {
                debug!("No response given for '{preserved_name}'; using a unit response");
                ComponentResponse {
                    name: preserved_name,
                    response: vec![1.0; num_channels],
                }
            }
            Err(e) => return Err(e.into()),
        };
        let deprojected = deprojected_components
            .unwrap_or_default()
            .iter()
            .map(|name| find_component(name))
            .collect::<Result<Vec<_>, _>>()?;

        if cross_ilc && splits.is_none() && input_weights.is_none() {
            return Err(IlcArgsError::CrossIlcWithoutSplits.into());
        }
        if input_weights.is_some() && cross_ilc {
            "Weights are read from a file, so cross-ILC has no effect".warn();
        }

        let common_beam = match (common_beam_fwhm_arcmin, common_beam_file) {
            (Some(_), Some(_)) => {
                return Err(IlcArgsError::TwoBeams {
                    channel: "common".to_string(),
                }
                .into())
            }
            (Some(fwhm_arcmin), None) => Some(BeamProfile::Gaussian { fwhm_arcmin }),
            (None, Some(file)) => Some(BeamProfile::Profile(read_beam_profile(&file)?)),
            (None, None) => None,
        };

        let selection = match override_n_freqs_to_use {
            Some(counts) => SelectionPolicy::Override(counts),
            None => SelectionPolicy::BeamCriterion(
                wavelet_beam_criterion.unwrap_or(DEFAULT_WAVELET_BEAM_CRITERION),
            ),
        };

        let config = IlcConfig {
            ellmax,
            filters,
            channels,
            common_beam,
            preserved,
            deprojected,
            num_deproj: num_deproj.unwrap_or_default(),
            ilc_bias_tol: ilc_bias_tol.unwrap_or(DEFAULT_ILC_BIAS_TOL),
            resp_tol: resp_tol.unwrap_or(DEFAULT_RESP_TOL),
            selection,
            cross_ilc,
            taper_width,
        };
        let params = config.validate()?;
        let grid = grid_args.parse(ellmax)?;

        print_channels(&params, &maps);
        print_scales(&params);

        let output_map = output_map.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_MAP_FILENAME));
        let mut printer = InfoPrinter::new("Outputs".into());
        if let Some(f) = &input_weights {
            printer.push_line(format!("Using weights from {}", f.display()).into());
        }
        printer.push_line(format!("ILC map: {}", output_map.display()).into());
        if let Some(f) = &output_weights {
            printer.push_line(format!("Weights: {}", f.display()).into());
        }
        let xcorr = match xcorr_maps {
            Some(xcorr_maps) if !xcorr_maps.is_empty() => {
                let mut block = vec!["Cross spectra:".into()];
                for m in &xcorr_maps {
                    block.push(xcorr_output_path(&output_map, m).display().to_string().into());
                }
                printer.push_block(block);
                Some(XcorrJob {
                    maps: xcorr_maps,
                    mask: xcorr_mask,
                    bin_width: xcorr_bin_width,
                })
            }
            _ => None,
        };
        printer.display();
        display_warnings();

        Ok(IlcJob {
            params,
            grid,
            maps,
            splits,
            apply_maps,
            input_weights,
            output_map,
            output_weights,
            xcorr,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), HyperilcError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let job = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        job.run()
    }
}

impl IlcJob {
    fn run(self) -> Result<(), HyperilcError> {
        let IlcJob {
            params,
            grid,
            maps,
            splits,
            apply_maps,
            input_weights,
            output_map,
            output_weights,
            xcorr,
        } = self;

        info!("Reading {} maps", maps.len());
        let maps = read_maps(&maps)?;
        let splits = match splits {
            Some((s1, s2)) => Some((read_maps(&s1)?, read_maps(&s2)?)),
            None => None,
        };
        let apply_maps = apply_maps.as_deref().map(read_maps).transpose()?;
        let weights = input_weights.as_deref().map(WeightSet::read).transpose()?;

        let inputs = IlcInputs {
            maps: &maps,
            splits: splits.as_ref().map(|(a, b)| (a.as_slice(), b.as_slice())),
            apply_maps: apply_maps.as_deref(),
            weights: weights.as_ref(),
        };
        let output = params.run(&grid, &inputs)?;

        write_map(output.map.view(), &output_map)?;
        info!("Wrote the ILC map to {}", output_map.display());
        if let Some(f) = output_weights {
            output.weights.write(&f)?;
            info!("Wrote the ILC weights to {}", f.display());
        }

        if let Some(XcorrJob {
            maps,
            mask,
            bin_width,
        }) = xcorr
        {
            let mask = mask.as_deref().map(read_map).transpose()?;
            for aux_file in maps {
                let aux = read_map(&aux_file)?;
                let cl = cross_spectrum(
                    &grid,
                    output.map.view(),
                    aux.view(),
                    mask.as_ref().map(|m| m.view()),
                )?;
                let file = xcorr_output_path(&output_map, &aux_file);
                match bin_width {
                    Some(w) => write_binned_spectrum(&bin_spectrum(cl.view(), w)?, &file)?,
                    None => write_spectrum(cl.view(), &file)?,
                }
                info!("Wrote the cross spectrum with {} to {}", aux_file.display(), file.display());
            }
        }

        Ok(())
    }
}

type ParsedChannels = (
    Vec<ChannelConfig>,
    Vec<PathBuf>,
    Option<(Vec<PathBuf>, Vec<PathBuf>)>,
    Option<Vec<PathBuf>>,
);

fn parse_channels(args: ChannelArgs) -> Result<ParsedChannels, HyperilcError> {
    let ChannelArgs {
        maps,
        names,
        freqs_ghz,
        beam_fwhm_arcmin,
        beam_files,
        split1_maps,
        split2_maps,
        apply_maps,
    } = args;

    let maps = match maps {
        Some(m) if !m.is_empty() => m,
        _ => return Err(IlcArgsError::NoMaps.into()),
    };
    let num_channels = maps.len();
    let check_len = |what: &'static str, got: usize| {
        if got == num_channels {
            Ok(())
        } else {
            Err(IlcArgsError::ChannelArgLength {
                what,
                expected: num_channels,
                got,
            })
        }
    };

    let names = match names {
        Some(n) => {
            check_len("names", n.len())?;
            n
        }
        None => maps
            .iter()
            .enumerate()
            .map(|(i, m)| {
                m.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| format!("channel {i}"))
            })
            .collect(),
    };
    if let Some(f) = &freqs_ghz {
        check_len("freqs_ghz", f.len())?;
    }

    let beams: Vec<BeamProfile> = match (beam_fwhm_arcmin, beam_files) {
        (Some(_), Some(_)) => {
            return Err(IlcArgsError::TwoBeams {
                channel: "every".to_string(),
            }
            .into())
        }
        (None, None) => return Err(IlcArgsError::NoBeams.into()),
        (Some(fwhms), None) => {
            check_len("beam_fwhm_arcmin", fwhms.len())?;
            fwhms
                .into_iter()
                .map(|fwhm_arcmin| BeamProfile::Gaussian { fwhm_arcmin })
                .collect()
        }
        (None, Some(files)) => {
            check_len("beam_files", files.len())?;
            files
                .iter()
                .map(|f| read_beam_profile(f).map(BeamProfile::Profile))
                .collect::<Result<_, IoError>>()?
        }
    };

    let splits = match (split1_maps, split2_maps) {
        (Some(s1), Some(s2)) => {
            check_len("split1_maps", s1.len())?;
            check_len("split2_maps", s2.len())?;
            Some((s1, s2))
        }
        (None, None) => None,
        _ => return Err(IlcArgsError::OneSplit.into()),
    };
    if let Some(a) = &apply_maps {
        check_len("apply_maps", a.len())?;
    }

    let channels = names
        .into_iter()
        .zip(beams)
        .enumerate()
        .map(|(i, (name, beam))| ChannelConfig {
            name,
            freq_ghz: freqs_ghz.as_ref().map(|f| f[i]),
            beam,
        })
        .collect();
    Ok((channels, maps, splits, apply_maps))
}

/// Parse "NAME=r1,r2,...".
fn parse_component(s: &str) -> Result<ComponentResponse, IlcArgsError> {
    let bad = || IlcArgsError::BadComponent(s.to_string());
    let (name, responses) = s.split_once('=').ok_or_else(bad)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(bad());
    }
    let response = responses
        .split(',')
        .map(|r| r.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| bad())?;
    Ok(ComponentResponse {
        name: name.to_string(),
        response,
    })
}

fn read_maps(files: &[PathBuf]) -> Result<Vec<Array1<f64>>, IoError> {
    files.par_iter().map(|f| read_map(f)).collect()
}

/// Cross spectra go next to the ILC map: <map stem>_x_<aux stem>.txt.
fn xcorr_output_path(output_map: &Path, aux_map: &Path) -> PathBuf {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    };
    output_map.with_file_name(format!("{}_x_{}.txt", stem(output_map), stem(aux_map)))
}

fn print_channels(params: &IlcParams, maps: &[PathBuf]) {
    let mut printer = InfoPrinter::new(
        format!(
            "{} channels (lowest to highest resolution)",
            params.num_channels()
        )
        .into(),
    );
    for (i, (c, m)) in params.channels().iter().zip(maps).enumerate() {
        let mut block = vec![match c.freq_ghz {
            Some(f) => format!("{i}: {} ({f} GHz)", c.name).into(),
            None => format!("{i}: {}", c.name).into(),
        }];
        block.push(format!("map: {}", m.display()).into());
        block.push(format!("beam: {}", c.beam).into());
        printer.push_block(block);
    }
    printer.display();

    let mut printer = InfoPrinter::new("Components".into());
    printer.push_line(format!("Preserving '{}'", params.preserved().name).into());
    if !params.deprojected().is_empty() {
        printer.push_line(
            format!(
                "May deproject: {}",
                params
                    .deprojected()
                    .iter()
                    .map(|c| format!("'{}'", c.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
            .into(),
        );
    }
    if params.cross_ilc() {
        printer.push_line("Covariances from split cross products (cross-ILC)".into());
    }
    printer.display();
}

fn print_scales(params: &IlcParams) {
    let bank = params.filter_bank();
    let selection = params.selection();
    let mut printer = InfoPrinter::new(
        format!(
            "{} with {} scales, ELLMAX {}",
            bank.wavelet_type(),
            bank.num_scales(),
            bank.ellmax()
        )
        .into(),
    );
    if !params.localisation_fwhm().is_empty() {
        printer.push_line(format!("ILC bias tolerance: {}", params.ilc_bias_tol()).into());
    }
    for j in 0..bank.num_scales() {
        let active = selection.active_channels(j);
        let mut block = vec![format!(
            "Scale {j}: channels {}..={} ({} used)",
            active.start,
            active.end.saturating_sub(1),
            selection.num_active(j)
        )
        .into()];
        if let Some(range) = bank.bin_range(j) {
            block.push(format!("ℓ: {}..={}", range.start(), range.end()).into());
        }
        if params.num_deproj()[j] > 0 {
            block.push(format!("Deprojecting {} components", params.num_deproj()[j]).into());
        }
        if let Some(fwhm) = params.localisation_fwhm().get(j) {
            block.push(format!("Covariance localisation FWHM: {:.2}°", fwhm.to_degrees()).into());
        }
        printer.push_block(block);
    }
    printer.display();
}

#[derive(Error, Debug)]
pub(super) enum IlcArgsError {
    #[error("No input maps were given")]
    NoMaps,

    #[error("No beams were given; give either a FWHM or a beam file for every channel")]
    NoBeams,

    #[error("Both a Gaussian FWHM and a beam file were given for the {channel} beam; give only one")]
    TwoBeams { channel: String },

    #[error("Only one set of split maps was given; cross-ILC needs two")]
    OneSplit,

    #[error("There are {expected} channels, but {got} {what} were given")]
    ChannelArgLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Couldn't parse component '{0}'; expected NAME=r1,r2,...")]
    BadComponent(String),

    #[error("No response was given for the component '{0}'")]
    UnknownComponent(String),

    #[error("Cross-ILC was requested, but no split maps were given")]
    CrossIlcWithoutSplits,

    #[error(transparent)]
    Io(#[from] IoError),
}
