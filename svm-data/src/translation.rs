use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use svm_core::error::VolumeError;
use svm_core::reach::{is_river_reach, MbReachId, SwordReachId};
use svm_core::reach_length::ReachLengths;
use svm_core::reach_series::ReachSeriesTable;
use svm_core::translation::{TranslationRow, TranslationTable};

/// Ratio of total MERIT-Basins to total SWORD river length. MB reaches are
/// digitized with more sinuosity, so SWORD overlaps are stretched by this.
pub const LENGTH_SCALE: f64 = 2448197.8 / 2172425.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationConfig {
    pub length_scale: f64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            length_scale: LENGTH_SCALE,
        }
    }
}

/// Accumulated overlap weight per MERIT-Basins reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationMap {
    weights: BTreeMap<MbReachId, f64>,
}

impl TranslationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to the reach's running total, inserting it if absent.
    pub fn add(&mut self, mb_reach_id: MbReachId, weight: f64) {
        *self.weights.entry(mb_reach_id).or_insert(0.0) += weight;
    }

    pub fn get(&self, mb_reach_id: MbReachId) -> Option<f64> {
        self.weights.get(&mb_reach_id).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// (MB reach, weight) pairs in ascending reach order.
    pub fn iter(&self) -> impl Iterator<Item = (MbReachId, f64)> + '_ {
        self.weights.iter().map(|(id, w)| (*id, *w))
    }
}

/// What happened to one SWORD reach when it was translated.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ReachOutcome {
    /// Weights were added to the map.
    Translated,
    /// No translation: absent from the table or first slot is the sentinel.
    Dropped,
    /// Zero-length SWORD reach, contributes nothing but is not dropped.
    Skipped,
}

/// Add the weights of one SWORD reach to `map`.
///
/// `row` is `None` when the reach is missing from the translation table.
pub fn accumulate_reach(
    map: &mut TranslationMap,
    sword_reach_id: SwordReachId,
    row: Option<&TranslationRow>,
    mb_lengths: &ReachLengths,
    sword_lengths: &ReachLengths,
    config: &TranslationConfig,
) -> Result<ReachOutcome, VolumeError> {
    let row = match row {
        Some(row) if row.has_translation() => row,
        _ => return Ok(ReachOutcome::Dropped),
    };
    let sword_len = sword_lengths
        .get(sword_reach_id)
        .ok_or(VolumeError::MissingSwordLength(sword_reach_id))?;
    if sword_len == 0.0 {
        return Ok(ReachOutcome::Skipped);
    }
    for slot in row.valid_slots() {
        let mb_len = mb_lengths
            .get(slot.mb_reach_id)
            .ok_or(VolumeError::MissingMbLength(slot.mb_reach_id))?;
        map.add(
            slot.mb_reach_id,
            config.length_scale * slot.overlap_length_m / mb_len,
        );
    }
    Ok(ReachOutcome::Translated)
}

/// Translation of the SWOT reaches observed in one month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyTranslation {
    pub map: TranslationMap,
    /// Observed reaches without a translation.
    pub dropped: Vec<SwordReachId>,
    /// Number of reaches observed this month, dropped ones included.
    pub observed: usize,
}

impl MonthlyTranslation {
    /// True when no reach was observed at all this month.
    pub fn is_unobserved(&self) -> bool {
        self.observed == 0
    }
}

/// Build one translation map per column of the SWOT anomaly table from the
/// reaches observed in that column.
pub fn build_monthly_translations(
    anomaly: &ReachSeriesTable,
    table: &TranslationTable,
    mb_lengths: &ReachLengths,
    sword_lengths: &ReachLengths,
    config: &TranslationConfig,
) -> Result<Vec<MonthlyTranslation>, VolumeError> {
    let mut months = Vec::with_capacity(anomaly.dates.len());
    for (column, date) in anomaly.dates.iter().enumerate() {
        let mut month = MonthlyTranslation::default();
        for reach_id in anomaly.observed_reaches(column) {
            month.observed += 1;
            let outcome = accumulate_reach(
                &mut month.map,
                reach_id,
                table.get(reach_id),
                mb_lengths,
                sword_lengths,
                config,
            )?;
            if outcome == ReachOutcome::Dropped {
                month.dropped.push(reach_id);
            }
        }
        debug!(
            "{date}: {} observed reaches, {} dropped, {} MeanDRS reaches",
            month.observed,
            month.dropped.len(),
            month.map.len()
        );
        months.push(month);
    }
    Ok(months)
}

/// Reaches dropped in any month.
pub fn dropped_reaches(months: &[MonthlyTranslation]) -> BTreeSet<SwordReachId> {
    months
        .iter()
        .flat_map(|m| m.dropped.iter().copied())
        .collect()
}

/// Translation of every type 1/5 SWORD reach with a translation, used to
/// estimate what full MERIT-Basins coverage would see.
pub fn build_full_translation(
    table: &TranslationTable,
    mb_lengths: &ReachLengths,
    sword_lengths: &ReachLengths,
    config: &TranslationConfig,
) -> Result<TranslationMap, VolumeError> {
    let mut map = TranslationMap::new();
    let mut translated = 0;
    for row in table.rows().filter(|r| is_river_reach(r.sword_reach_id)) {
        let outcome = accumulate_reach(
            &mut map,
            row.sword_reach_id,
            Some(row),
            mb_lengths,
            sword_lengths,
            config,
        )?;
        if outcome == ReachOutcome::Translated {
            translated += 1;
        }
    }
    info!(
        "Translated {translated} SWORD reaches onto {} MeanDRS reaches",
        map.len()
    );
    Ok(map)
}
