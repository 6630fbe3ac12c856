//! Locating and reading per-region input files.

use clap::Args;
use log::info;
use std::path::{Path, PathBuf};
use svm_core::error::VolumeError;
use svm_core::reach_length::ReachLengths;
use svm_core::reference::ReferenceCube;
use svm_core::scenario::ScenarioSet;
use svm_data::aggregate::ReferenceSet;
use svm_data::normalize::RegionIndex;
use svm_data::translation::{TranslationConfig, LENGTH_SCALE};
use svm_utils::pfaf::{names_region, pfaf_code, PFAF_MARKER, SWORD_MARKER};

/// Inputs of every stage that translates SWORD reaches onto MeanDRS.
#[derive(Args, Debug, Clone)]
pub struct TranslationInputs {
    /// SWORD to MERIT-Basins translation table of the region (CSV)
    pub translation_csv: PathBuf,

    /// Directory of MERIT-Basins reach length tables (`*_pfaf_NN*.csv`)
    pub mb_dir: PathBuf,

    /// Directory of MeanDRS volume cubes (`*_pfaf_NN*{low,nrm,hig}.csv`)
    pub cube_dir: PathBuf,

    /// Directory of SWORD reach length tables (`*hbNN*.csv`)
    pub sword_dir: PathBuf,

    /// Sinuosity correction applied to SWORD overlap lengths
    #[arg(long, default_value_t = LENGTH_SCALE)]
    pub length_scale: f64,
}

impl TranslationInputs {
    pub fn validate(&self) -> Result<(), VolumeError> {
        crate::validate::require_all(
            &[&self.translation_csv],
            &[&self.mb_dir, &self.cube_dir, &self.sword_dir],
        )
    }

    pub fn config(&self) -> TranslationConfig {
        TranslationConfig {
            length_scale: self.length_scale,
        }
    }
}

/// CSV files of a directory, sorted by name.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, VolumeError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Pfaf code of a region file, e.g. `"74"`.
pub fn pfaf_of(path: &Path) -> Option<String> {
    pfaf_code(file_name(path))
}

/// The first file (by name) of `dir` tagged with `region` and ending in
/// `suffix` before the extension.
pub fn region_file(dir: &Path, marker: &str, region: i64, suffix: &str, kind: &str) -> Result<PathBuf, VolumeError> {
    csv_files(dir)?
        .into_iter()
        .find(|p| {
            let name = file_name(p);
            names_region(name, marker, region) && name.trim_end_matches(".csv").ends_with(suffix)
        })
        .ok_or_else(|| VolumeError::MissingRegionFile {
            kind: kind.to_string(),
            region,
            dir: dir.to_path_buf(),
        })
}

/// Numeric region of a pfaf code.
pub fn region_of(pfaf: &str) -> Result<i64, VolumeError> {
    pfaf.parse::<i64>().map_err(|_| VolumeError::MalformedValue {
        column: "pfaf".to_string(),
        value: pfaf.to_string(),
    })
}

/// Pfaf-tagged CSV files of a directory with their codes, sorted by name.
pub fn pfaf_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, VolumeError> {
    Ok(csv_files(dir)?
        .into_iter()
        .filter_map(|p| pfaf_of(&p).map(|code| (code, p)))
        .collect())
}

pub fn load_mb_lengths(dir: &Path, index: &RegionIndex) -> Result<ReachLengths, VolumeError> {
    let mut lengths = ReachLengths::default();
    for region in index.regions() {
        let path = region_file(dir, PFAF_MARKER, *region, "", "MERIT-Basins length")?;
        lengths.extend(ReachLengths::mb_from_path(path)?);
    }
    Ok(lengths)
}

pub fn load_sword_lengths(dir: &Path, index: &RegionIndex) -> Result<ReachLengths, VolumeError> {
    let mut lengths = ReachLengths::default();
    for region in index.regions() {
        let path = region_file(dir, SWORD_MARKER, *region, "", "SWORD length")?;
        lengths.extend(ReachLengths::sword_from_path(path)?);
    }
    Ok(lengths)
}

pub fn load_reference(dir: &Path, index: &RegionIndex) -> Result<ReferenceSet, VolumeError> {
    let mut cubes = Vec::with_capacity(index.len());
    for region in index.regions() {
        let set = ScenarioSet::try_from_fn(|scenario| {
            let path = region_file(dir, PFAF_MARKER, *region, scenario.as_str(), "MeanDRS volume")?;
            ReferenceCube::from_path(path)
        })?;
        cubes.push(set);
    }
    ReferenceSet::new(index.clone(), cubes)
}

/// Lengths and reference volumes of every region a translation touches.
pub struct RegionData {
    pub mb_lengths: ReachLengths,
    pub sword_lengths: ReachLengths,
    pub reference: ReferenceSet,
}

pub fn load_region_data(inputs: &TranslationInputs, index: &RegionIndex) -> Result<RegionData, VolumeError> {
    info!("Loading regions {:?}", index.regions());
    Ok(RegionData {
        mb_lengths: load_mb_lengths(&inputs.mb_dir, index)?,
        sword_lengths: load_sword_lengths(&inputs.sword_dir, index)?,
        reference: load_reference(&inputs.cube_dir, index)?,
    })
}
