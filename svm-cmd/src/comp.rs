//! Comparison of SWOT and MeanDRS volume anomalies over the SWOT reaches.

use crate::load::{load_region_data, pfaf_files, region_file, region_of, TranslationInputs};
use crate::validate::{require_all, require_dir, require_file};
use anyhow::Context;
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use svm_core::error::VolumeError;
use svm_core::reach::SwordReachId;
use svm_core::reach_series::ReachSeriesTable;
use svm_core::tables::{read_rows_from_path, write_rows_to_path, ComparisonRow, ReferenceRecordRow, SwotSeriesRow};
use svm_core::translation::TranslationTable;
use svm_data::aggregate::{month_aligned_record, ReferenceSet};
use svm_data::normalize::{normalize_monthly, NormalizedTranslation, RegionIndex};
use svm_data::summary::{comparison_rows, global_comparison, placeholder_rows};
use svm_data::swot::regional_swot_series;
use svm_data::translation::{build_monthly_translations, dropped_reaches};
use svm_utils::pfaf::PFAF_MARKER;

/// A region's SWOT anomaly with the translation of each of its months.
pub(crate) struct ObservedRegion {
    pub anomaly: ReachSeriesTable,
    pub translations: Vec<Option<NormalizedTranslation>>,
    pub dropped: BTreeSet<SwordReachId>,
    /// Raw reference volumes of every region the translations touch.
    pub reference: ReferenceSet,
}

/// Load a region's SWOT anomaly and translate each month onto MeanDRS.
/// `None` when the region has no observed reach with a translation.
pub(crate) fn load_observed_region(
    anomaly_csv: &Path,
    inputs: &TranslationInputs,
) -> Result<Option<ObservedRegion>, VolumeError> {
    let anomaly = ReachSeriesTable::from_path(anomaly_csv)?;
    let observed: HashSet<SwordReachId> = anomaly.reach_ids().iter().copied().collect();
    let table = TranslationTable::from_path(&inputs.translation_csv)?.restrict_to(&observed);
    let index = RegionIndex::from_regions(table.regions());
    if anomaly.is_empty() || index.is_empty() {
        return Ok(None);
    }
    let data = load_region_data(inputs, &index)?;

    info!("Translating SWOT reaches to MeanDRS reaches");
    let months = build_monthly_translations(
        &anomaly,
        &table,
        &data.mb_lengths,
        &data.sword_lengths,
        &inputs.config(),
    )?;
    let translations = normalize_monthly(&months, &index)?;
    Ok(Some(ObservedRegion {
        dropped: dropped_reaches(&months),
        anomaly,
        translations,
        reference: data.reference,
    }))
}

/// Write the regional SWOT series and the month-aligned MeanDRS anomaly
/// record. A region without translatable reaches gets header-only files.
pub fn run_comp(
    anomaly_csv: &Path,
    inputs: &TranslationInputs,
    swot_out: &Path,
    reference_out: &Path,
) -> anyhow::Result<()> {
    require_file(anomaly_csv)?;
    inputs.validate()?;

    info!("Reading files");
    let Some(region) = load_observed_region(anomaly_csv, inputs)
        .with_context(|| format!("loading inputs of {}", anomaly_csv.display()))?
    else {
        warn!("No translatable SWOT reaches in {}", anomaly_csv.display());
        write_rows_to_path::<SwotSeriesRow, _>(swot_out, &[])?;
        write_rows_to_path::<ReferenceRecordRow, _>(reference_out, &[])?;
        return Ok(());
    };

    info!("Calculating MeanDRS volume anomalies");
    let anomalies = region.reference.anomalies();
    let record = month_aligned_record(&anomalies, &region.anomaly.dates, &region.translations)?;

    info!("Calculating SWOT volume anomalies");
    info!("Dropping {} reaches without translation", region.dropped.len());
    let swot = regional_swot_series(&region.anomaly, &region.dropped);

    info!("Writing files");
    write_rows_to_path(swot_out, &swot.to_rows())?;
    write_rows_to_path(reference_out, &record.to_record_rows())?;
    Ok(())
}

/// File name of a region's comparison table.
pub fn comparison_file_name(pfaf: &str) -> String {
    format!("V_MeanDRS_comp_means_pfaf_{pfaf}.csv")
}

/// Read the reference record paired with a SWOT series file.
pub(crate) fn read_reference_record(reference_dir: &Path, pfaf: &str) -> Result<Vec<ReferenceRecordRow>, VolumeError> {
    let path = region_file(reference_dir, PFAF_MARKER, region_of(pfaf)?, "", "MeanDRS anomaly")?;
    read_rows_from_path(path)
}

/// SWOT series and reference records of every region of `swot_dir`,
/// paired by pfaf code.
pub(crate) struct RegionalInputs {
    pub pfaf: Vec<String>,
    pub swot: Vec<Vec<SwotSeriesRow>>,
    pub records: Vec<Vec<ReferenceRecordRow>>,
}

impl RegionalInputs {
    /// A region whose files cannot be read counts as empty.
    pub fn read(swot_dir: &Path, reference_dir: &Path) -> Result<Self, VolumeError> {
        let mut inputs = RegionalInputs {
            pfaf: Vec::new(),
            swot: Vec::new(),
            records: Vec::new(),
        };
        for (pfaf, path) in pfaf_files(swot_dir)? {
            let rows = read_rows_from_path::<SwotSeriesRow, _>(&path).and_then(|swot| {
                if swot.is_empty() {
                    Ok((swot, Vec::new()))
                } else {
                    read_reference_record(reference_dir, &pfaf).map(|record| (swot, record))
                }
            });
            let (swot, record) = rows.unwrap_or_else(|e| {
                warn!("Skipping region {pfaf}: {e}");
                (Vec::new(), Vec::new())
            });
            inputs.pfaf.push(pfaf);
            inputs.swot.push(swot);
            inputs.records.push(record);
        }
        Ok(inputs)
    }

    /// Months of the first region with SWOT data.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.swot
            .iter()
            .find(|rows| !rows.is_empty())
            .map(|rows| rows.iter().map(|r| r.dates).collect())
            .unwrap_or_default()
    }
}

/// Write a comparison table per region and one for the globe.
pub fn run_comp_summary(
    swot_dir: &Path,
    reference_dir: &Path,
    regional_out: &Path,
    global_out: &Path,
) -> anyhow::Result<()> {
    require_all(&[], &[swot_dir, reference_dir])?;
    std::fs::create_dir_all(regional_out)?;
    require_dir(regional_out)?;

    info!("Reading files");
    let inputs = RegionalInputs::read(swot_dir, reference_dir)?;
    let dates = inputs.dates();

    info!("Aggregating volume anomalies regionally");
    for ((pfaf, swot), record) in inputs.pfaf.iter().zip(&inputs.swot).zip(&inputs.records) {
        let rows: Vec<ComparisonRow> = if swot.is_empty() {
            placeholder_rows(&dates)
        } else {
            comparison_rows(swot, record)
        };
        let path: PathBuf = regional_out.join(comparison_file_name(pfaf));
        write_rows_to_path(&path, &rows)?;
    }

    info!("Aggregating volume anomalies globally");
    let global = global_comparison(&dates, &inputs.swot, &inputs.records);
    write_rows_to_path(global_out, &global)?;
    Ok(())
}
