//! Yearly slices of the MeanDRS record over the SWOT reaches.

use crate::comp::load_observed_region;
use crate::load::{csv_files, TranslationInputs};
use crate::validate::{require_dir, require_file};
use anyhow::Context;
use log::{info, warn};
use std::path::Path;
use svm_core::tables::ColumnTable;
use svm_data::slice::{global_slice, slice_record, slice_table, slice_windows, SWOT_COLUMN};
use svm_data::swot::regional_swot_series;

/// Write the regional slice table: SWOT sums beside the MeanDRS anomaly of
/// the same reaches in every year-long window of the record.
pub fn run_slice(anomaly_csv: &Path, inputs: &TranslationInputs, slice_out: &Path) -> anyhow::Result<()> {
    require_file(anomaly_csv)?;
    inputs.validate()?;

    info!("Reading files");
    let Some(region) = load_observed_region(anomaly_csv, inputs)
        .with_context(|| format!("loading inputs of {}", anomaly_csv.display()))?
    else {
        warn!("No translatable SWOT reaches in {}", anomaly_csv.display());
        let mut empty = ColumnTable::default();
        empty.push_column(SWOT_COLUMN, Vec::new());
        empty.to_path(slice_out)?;
        return Ok(());
    };

    info!("Calculating MeanDRS volume anomaly slices");
    let swot_months = &region.anomaly.dates;
    let windows = slice_windows(region.reference.dates(), swot_months);
    let record = slice_record(&region.reference, &windows, swot_months, &region.translations)?;

    let swot = regional_swot_series(&region.anomaly, &region.dropped);
    let table = slice_table(swot_months, &swot.values, &windows, &record);

    info!("Writing files");
    table.to_path(slice_out)?;
    Ok(())
}

/// Sum every regional slice table of `slice_dir` into a global one.
pub fn run_slice_summary(slice_dir: &Path, global_out: &Path) -> anyhow::Result<()> {
    require_dir(slice_dir)?;

    info!("Reading files");
    let tables: Vec<ColumnTable> = csv_files(slice_dir)?
        .iter()
        .map(|path| {
            ColumnTable::from_path(path).unwrap_or_else(|e| {
                warn!("Skipping region file {}: {e}", path.display());
                ColumnTable::default()
            })
        })
        .collect();

    info!("Aggregating volume anomaly slices globally");
    let global = global_slice(&tables);
    global.to_path(global_out)?;
    Ok(())
}
