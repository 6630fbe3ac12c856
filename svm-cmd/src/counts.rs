//! Reach counts per region: SWORD, observed and translated.

use crate::load::{pfaf_files, region_file, region_of};
use crate::validate::require_all;
use log::{info, warn};
use std::path::Path;
use svm_core::error::VolumeError;
use svm_core::reach::SwordReachId;
use svm_core::reach_length::ReachLengths;
use svm_core::reach_series::ReachSeriesTable;
use svm_core::tables::{write_rows_to_path, ObservationCountRow};
use svm_core::translation::TranslationTable;
use svm_data::counts::{empty_counts, observation_counts, sort_counts};
use svm_utils::pfaf::{PFAF_MARKER, SWORD_MARKER};

fn region_counts(
    pfaf: &str,
    anomaly_csv: &Path,
    translation_dir: &Path,
    sword_dir: &Path,
) -> Result<ObservationCountRow, VolumeError> {
    let region = region_of(pfaf)?;
    let sword_file = match region_file(sword_dir, SWORD_MARKER, region, "", "SWORD reach") {
        Ok(path) => path,
        Err(VolumeError::MissingRegionFile { .. }) => {
            info!("No SWORD reaches for region {pfaf}");
            return Ok(empty_counts(pfaf));
        }
        Err(e) => return Err(e),
    };
    let mut sword: Vec<SwordReachId> = ReachLengths::sword_from_path(sword_file)?.reach_ids().copied().collect();
    sword.sort_unstable();
    let anomaly = ReachSeriesTable::from_path(anomaly_csv)?;
    let translation_file = region_file(translation_dir, PFAF_MARKER, region, "", "translation")?;
    let translation = TranslationTable::from_path(translation_file)?;
    Ok(observation_counts(pfaf, &sword, &anomaly, &translation))
}

/// Write reach counts of every region with an anomaly table, fewest SWORD
/// reaches first.
pub fn run_num_obs(
    anomaly_dir: &Path,
    translation_dir: &Path,
    sword_dir: &Path,
    counts_out: &Path,
) -> anyhow::Result<()> {
    require_all(&[], &[anomaly_dir, translation_dir, sword_dir])?;

    info!("Retrieving valid observations");
    let mut rows = Vec::new();
    for (pfaf, path) in pfaf_files(anomaly_dir)? {
        let row = region_counts(&pfaf, &path, translation_dir, sword_dir).unwrap_or_else(|e| {
            warn!("Skipping region {pfaf}: {e}");
            empty_counts(&pfaf)
        });
        rows.push(row);
    }
    sort_counts(&mut rows);

    info!("Writing files");
    write_rows_to_path(counts_out, &rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{region_74, ANOMALY_CSV};
    use svm_core::tables::read_rows_from_path;

    #[test]
    fn test_run_num_obs() {
        let fixture = region_74();
        let anomaly_dir = fixture.path("anomaly");
        let translation_dir = fixture.path("translation");
        std::fs::create_dir_all(&anomaly_dir).unwrap();
        std::fs::create_dir_all(&translation_dir).unwrap();
        std::fs::write(anomaly_dir.join("V_anom_pfaf_74.csv"), ANOMALY_CSV).unwrap();
        std::fs::write(anomaly_dir.join("V_anom_pfaf_35.csv"), "reach_id,2023-10\n").unwrap();
        std::fs::copy(&fixture.inputs.translation_csv, translation_dir.join("ms_pfaf_74_translate.csv")).unwrap();

        let counts_out = fixture.path("num_obs.csv");
        run_num_obs(&anomaly_dir, &translation_dir, &fixture.inputs.sword_dir, &counts_out).unwrap();

        let rows: Vec<ObservationCountRow> = read_rows_from_path(&counts_out).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], empty_counts("35"));
        let row = &rows[1];
        assert_eq!(row.pfaf, "74");
        // the ghost reach 74230000016 is not counted
        assert_eq!(row.sword, 3);
        assert_eq!(row.sw_type1, 3);
        assert_eq!(row.v_anom, 3);
        assert_eq!(row.v_anom_ms, 2);
    }
}
