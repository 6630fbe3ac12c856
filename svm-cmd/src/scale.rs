//! Scaling SWOT sums up to every MeanDRS reach a region's SWORD rivers cover.

use crate::comp::RegionalInputs;
use crate::load::{load_region_data, region_file, region_of, TranslationInputs};
use crate::validate::{require_all, require_dir};
use log::{info, warn};
use std::path::Path;
use svm_core::error::VolumeError;
use svm_core::reach::is_river_reach;
use svm_core::tables::{read_rows_from_path, write_rows_to_path, FullCoverageRow, ScaleRow};
use svm_core::translation::TranslationTable;
use svm_data::aggregate::full_coverage_record;
use svm_data::normalize::{normalize, RegionIndex};
use svm_data::scale::{global_scale, regional_scale};
use svm_data::translation::build_full_translation;
use svm_utils::pfaf::PFAF_MARKER;

/// Write the MeanDRS anomaly of all translated SWORD river reaches of a
/// region at every reference step.
pub fn run_scale(inputs: &TranslationInputs, full_out: &Path) -> anyhow::Result<()> {
    inputs.validate()?;

    info!("Reading files");
    let table = TranslationTable::from_path(&inputs.translation_csv)?;
    let rivers = TranslationTable::from_rows(
        table
            .rows()
            .filter(|row| is_river_reach(row.sword_reach_id))
            .cloned(),
    );
    let index = RegionIndex::from_regions(rivers.regions());
    if index.is_empty() {
        warn!("No translatable SWORD reaches in {}", inputs.translation_csv.display());
        write_rows_to_path::<FullCoverageRow, _>(full_out, &[])?;
        return Ok(());
    }
    let data = load_region_data(inputs, &index)?;

    info!("Translating SWORD reaches to MeanDRS reaches");
    let map = build_full_translation(&rivers, &data.mb_lengths, &data.sword_lengths, &inputs.config())?;
    let translation = normalize(&map, &index)?;

    info!("Calculating MeanDRS volume anomalies");
    let record = full_coverage_record(&data.reference.anomalies(), &translation)?;

    info!("Writing files");
    write_rows_to_path(full_out, &record.to_full_coverage_rows())?;
    Ok(())
}

/// File name of a region's scale table.
pub fn scale_file_name(pfaf: &str) -> String {
    format!("V_MeanDRS_scale_means_pfaf_{pfaf}.csv")
}

fn read_full_coverage(full_dir: &Path, pfaf: &str) -> Result<Vec<FullCoverageRow>, VolumeError> {
    let path = region_file(full_dir, PFAF_MARKER, region_of(pfaf)?, "", "full-coverage anomaly")?;
    read_rows_from_path(path)
}

/// Write a scale table per region and the column sums for the globe.
/// Regions without SWOT data get header-only tables and no global share.
pub fn run_scale_summary(
    swot_dir: &Path,
    reference_dir: &Path,
    full_dir: &Path,
    regional_out: &Path,
    global_out: &Path,
) -> anyhow::Result<()> {
    require_all(&[], &[swot_dir, reference_dir, full_dir])?;
    std::fs::create_dir_all(regional_out)?;
    require_dir(regional_out)?;

    info!("Reading files");
    let inputs = RegionalInputs::read(swot_dir, reference_dir)?;
    let dates = inputs.dates();

    info!("Scaling SWOT volume using MeanDRS volume subsets");
    let mut scaled = Vec::new();
    for ((pfaf, swot), record) in inputs.pfaf.iter().zip(&inputs.swot).zip(&inputs.records) {
        let path = regional_out.join(scale_file_name(pfaf));
        let full = if swot.is_empty() {
            Vec::new()
        } else {
            read_full_coverage(full_dir, pfaf).unwrap_or_else(|e| {
                warn!("Skipping region {pfaf}: {e}");
                Vec::new()
            })
        };
        if full.is_empty() {
            write_rows_to_path::<ScaleRow, _>(&path, &[])?;
            continue;
        }
        let rows = regional_scale(swot, record, &full);
        write_rows_to_path(&path, &rows)?;
        scaled.push(rows);
    }

    info!("Scaling SWOT volume globally");
    write_rows_to_path(global_out, &global_scale(&dates, &scaled))?;
    Ok(())
}
