//! Agreement of SWOT and MeanDRS seasonal variability per region.

use crate::load::pfaf_files;
use crate::validate::require_dir;
use log::{info, warn};
use std::path::Path;
use svm_core::tables::{read_rows_from_path, write_rows_to_path, ComparisonRow, CorrelationRow, MagnitudeRatioRow};
use svm_data::agreement::{correlation_row, magnitude_row};

/// Write the magnitude ratio and lagged correlation tables of every
/// regional comparison file.
pub fn run_agreement(comp_dir: &Path, mag_out: &Path, corr_out: &Path) -> anyhow::Result<()> {
    require_dir(comp_dir)?;

    info!("Reading files");
    let mut magnitudes: Vec<MagnitudeRatioRow> = Vec::new();
    let mut correlations: Vec<CorrelationRow> = Vec::new();
    for (pfaf, path) in pfaf_files(comp_dir)? {
        let rows: Vec<ComparisonRow> = read_rows_from_path(&path).unwrap_or_else(|e| {
            warn!("Skipping region {pfaf}: {e}");
            Vec::new()
        });
        magnitudes.push(magnitude_row(&pfaf, &rows));
        correlations.push(correlation_row(&pfaf, &rows));
    }

    info!("Writing files");
    write_rows_to_path(mag_out, &magnitudes)?;
    write_rows_to_path(corr_out, &correlations)?;
    Ok(())
}
