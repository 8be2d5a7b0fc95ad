// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

use std::fs::{read_to_string, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::str::from_utf8;

use assert_cmd::{output::OutputError, Command};
use ndarray::prelude::*;
use num_complex::Complex64;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tempfile::TempDir;

use hyperilc::{
    beam::gauss_beam, constants::ARCMIN_TO_RAD, io::write_map, Alm, GaussLegendreGrid,
    HarmonicTransform, WeightSet,
};

const ELLMAX: usize = 64;
const BEAMS_ARCMIN: [f64; 3] = [30.0, 20.0, 10.0];

fn hyperilc() -> Command {
    Command::cargo_bin("hyperilc").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// White-noise harmonic coefficients, band limited at ELLMAX.
fn random_alm(amplitude: f64, seed: u64) -> Alm {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, amplitude).unwrap();
    let mut alm = Alm::zeros(ELLMAX);
    for l in 1..=ELLMAX {
        alm.set(l, 0, Complex64::new(normal.sample(&mut rng), 0.0));
        for m in 1..=l {
            alm.set(
                l,
                m,
                Complex64::new(normal.sample(&mut rng), normal.sample(&mut rng)),
            );
        }
    }
    alm
}

/// `alm` observed with a Gaussian beam.
fn beamed_sky(grid: &GaussLegendreGrid, alm: &Alm, fwhm_arcmin: f64) -> Array1<f64> {
    let mut alm = alm.clone();
    alm.almxfl(gauss_beam(fwhm_arcmin * ARCMIN_TO_RAD, ELLMAX).view())
        .unwrap();
    grid.alm2map(&alm).unwrap()
}

fn random_sky(grid: &GaussLegendreGrid, amplitude: f64, seed: u64) -> Array1<f64> {
    grid.alm2map(&random_alm(amplitude, seed)).unwrap()
}

/// Write three channels of CMB plus dust plus noise into `dir`, and an
/// arguments file that deprojects the dust. The returned CMB is at the
/// resolution of the sharpest channel.
fn write_inputs(dir: &Path) -> (PathBuf, Array1<f64>) {
    let grid = GaussLegendreGrid::with_lmax(ELLMAX);
    let cmb = random_alm(1.0, 1);
    let dust = random_alm(3.0, 2);
    let dust_response = [0.5, 1.0, 2.0];
    let mut maps = vec![];
    for (i, (r, fwhm)) in dust_response.iter().zip(BEAMS_ARCMIN).enumerate() {
        let noise = random_sky(&grid, 0.05, 10 + i as u64);
        let map = beamed_sky(&grid, &cmb, fwhm) + &(beamed_sky(&grid, &dust, fwhm) * *r) + &noise;
        let file = dir.join(format!("chan{i}.map"));
        write_map(map.view(), &file).unwrap();
        maps.push(format!("{:?}", file));
    }

    let args_file = dir.join("ilc.toml");
    let mut f = File::create(&args_file).unwrap();
    write!(
        f,
        r#"[filters]
ellmax = {ELLMAX}
gn_fwhm_arcmin = [300.0, 120.0]

[channels]
maps = [{}]
beam_fwhm_arcmin = [30.0, 20.0, 10.0]

[ilc]
components = ["dust=0.5,1,2"]
deprojected_components = ["dust"]
num_deproj = 1
"#,
        maps.join(", ")
    )
    .unwrap();
    (args_file, beamed_sky(&grid, &cmb, BEAMS_ARCMIN[2]))
}

#[test]
fn help_is_available() {
    let (stdout, _) = get_cmd_output(hyperilc().arg("--help").ok());
    assert!(stdout.contains("ilc"));
    assert!(stdout.contains("cross-correlate"));

    let (stdout, _) = get_cmd_output(hyperilc().args(["ilc", "--help"]).ok());
    assert!(stdout.contains("ARGUMENTS_FILE"));
    assert!(stdout.contains("--deprojected-components"));
}

#[test]
fn ilc_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (args_file, _) = write_inputs(dir.path());
    let output = dir.path().join("ilc.map");

    let cmd = hyperilc()
        .arg("ilc")
        .arg(&args_file)
        .arg("-o")
        .arg(&output)
        .arg("--dry-run")
        .ok();
    assert!(cmd.is_ok(), "ilc --dry-run failed: {:?}", get_cmd_output(cmd));
    assert!(!output.exists());
}

#[test]
fn ilc_deprojects_dust() {
    let dir = TempDir::new().unwrap();
    let (args_file, cmb) = write_inputs(dir.path());
    let output = dir.path().join("ilc.map");
    let weights = dir.path().join("ilc.weights");

    let cmd = hyperilc()
        .arg("ilc")
        .arg(&args_file)
        .arg("-o")
        .arg(&output)
        .arg("--output-weights")
        .arg(&weights)
        .arg("--no-progress-bars")
        .ok();
    assert!(cmd.is_ok(), "ilc failed: {:?}", get_cmd_output(cmd));

    let map = hyperilc::io::read_map(&output).unwrap();
    assert_eq!(map.len(), cmb.len());
    // With the dust deprojected, only (reduced) noise remains on top of the
    // CMB.
    let residual = &map - &cmb;
    let residual_rms = (residual.mapv(|v| v * v).mean().unwrap()).sqrt();
    let cmb_rms = (cmb.mapv(|v| v * v).mean().unwrap()).sqrt();
    assert!(
        residual_rms < 0.2 * cmb_rms,
        "residual rms {residual_rms} vs CMB rms {cmb_rms}"
    );

    let weight_set = WeightSet::read(&weights).unwrap();
    assert_eq!(weight_set.num_scales(), 3);
    assert_eq!(weight_set.num_channels, 3);

    // Re-using the weights gives the same map.
    let reused = dir.path().join("reused.map");
    let cmd = hyperilc()
        .arg("ilc")
        .arg(&args_file)
        .arg("-o")
        .arg(&reused)
        .arg("--input-weights")
        .arg(&weights)
        .ok();
    assert!(cmd.is_ok(), "ilc with weights failed: {:?}", get_cmd_output(cmd));
    let reused = hyperilc::io::read_map(&reused).unwrap();
    for (a, b) in reused.iter().zip(map.iter()) {
        assert!((a - b).abs() < 1e-9 * (1.0 + b.abs()));
    }
}

#[test]
fn config_errors_are_reported() {
    let dir = TempDir::new().unwrap();
    let (args_file, _) = write_inputs(dir.path());

    // Only one deprojected component is available.
    let cmd = hyperilc()
        .arg("ilc")
        .arg(&args_file)
        .args(["--num-deproj", "2"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Error"), "{stderr}");
    assert!(stderr.contains("Nothing was computed"), "{stderr}");
}

#[test]
fn filter_windows_are_written() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("windows.txt");
    let cmd = hyperilc()
        .args(["filters", "-e", "64", "--gn-fwhm-arcmin", "300", "120", "-o"])
        .arg(&output)
        .ok();
    assert!(cmd.is_ok(), "filters failed: {:?}", get_cmd_output(cmd));

    let contents = read_to_string(&output).unwrap();
    let rows: Vec<Vec<f64>> = contents
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split_whitespace().map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 65);
    for row in rows {
        assert_eq!(row.len(), 4);
        // The squared windows sum to one at every ℓ.
        let sum: f64 = row[1..].iter().map(|h| h * h).sum();
        assert!((sum - 1.0).abs() < 1e-6, "{sum}");
    }
}

#[test]
fn maps_cross_correlate() {
    let dir = TempDir::new().unwrap();
    let grid = GaussLegendreGrid::with_lmax(ELLMAX);
    let map = dir.path().join("sky.map");
    write_map(random_sky(&grid, 1.0, 7).view(), &map).unwrap();
    let output = dir.path().join("cl.txt");

    let cmd = hyperilc()
        .arg("xcorr")
        .arg(&map)
        .args(["-e", &ELLMAX.to_string(), "-b", "4", "-o"])
        .arg(&output)
        .ok();
    assert!(cmd.is_ok(), "cross-correlate failed: {:?}", get_cmd_output(cmd));
    let contents = read_to_string(&output).unwrap();
    // ℓ 0..=64 in bins of 4.
    assert_eq!(contents.lines().filter(|l| !l.starts_with('#')).count(), 17);
}
