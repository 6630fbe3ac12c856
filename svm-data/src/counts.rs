use svm_core::reach::{is_river_reach, ReachType, SwordReachId};
use svm_core::reach_series::ReachSeriesTable;
use svm_core::tables::ObservationCountRow;
use svm_core::translation::TranslationTable;

/// Reach counts of one region, from its SWORD reaches, its anomaly table and
/// its translation table.
pub fn observation_counts(
    pfaf: &str,
    sword_reaches: &[SwordReachId],
    anomaly: &ReachSeriesTable,
    translation: &TranslationTable,
) -> ObservationCountRow {
    let sword = sword_reaches
        .iter()
        .filter(|id| ReachType::from_reach_id(**id) != ReachType::Ghost)
        .count();
    let sw_type1 = sword_reaches.iter().filter(|id| is_river_reach(**id)).count();
    let v_anom_ms = anomaly
        .reach_ids()
        .iter()
        .filter(|id| translation.get(**id).is_some_and(|row| row.has_translation()))
        .count();
    ObservationCountRow {
        pfaf: pfaf.to_string(),
        sword,
        sw_type1,
        v_anom: anomaly.len(),
        v_anom_ms,
    }
}

/// Row for a region without SWORD reaches.
pub fn empty_counts(pfaf: &str) -> ObservationCountRow {
    ObservationCountRow {
        pfaf: pfaf.to_string(),
        sword: 0,
        sw_type1: 0,
        v_anom: 0,
        v_anom_ms: 0,
    }
}

/// Order rows by SWORD reach count, keeping file order among equals.
pub fn sort_counts(rows: &mut [ObservationCountRow]) {
    rows.sort_by_key(|r| r.sword);
}
