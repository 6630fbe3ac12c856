//! Weighted sums of MeanDRS reference volume anomalies.

use crate::normalize::{NormalizedTranslation, RegionIndex};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use svm_core::error::VolumeError;
use svm_core::month_range::indices_of_month;
use svm_core::reference::ReferenceCube;
use svm_core::scenario::{Scenario, ScenarioSet};
use svm_core::tables::{FullCoverageRow, ReferenceRecordRow};
use svm_utils::stats::recenter;

/// Reference cubes of every region in a [`RegionIndex`], one per scenario,
/// sharing a single monthly time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    index: RegionIndex,
    cubes: Vec<ScenarioSet<ReferenceCube>>,
    dates: Vec<NaiveDate>,
}

impl ReferenceSet {
    /// `cubes` must be ordered like `index`.
    pub fn new(index: RegionIndex, cubes: Vec<ScenarioSet<ReferenceCube>>) -> Result<Self, VolumeError> {
        if cubes.len() != index.len() {
            return Err(VolumeError::TimeAxis(format!(
                "{} regions but {} reference cube sets",
                index.len(),
                cubes.len()
            )));
        }
        let dates = cubes
            .first()
            .map(|set| set.low.dates.clone())
            .unwrap_or_default();
        for (region, set) in index.regions().iter().zip(&cubes) {
            for scenario in Scenario::ALL {
                let cube = set.get(scenario);
                if cube.time_len() != dates.len() {
                    return Err(VolumeError::TimeAxis(format!(
                        "region {region} {scenario} has {} steps, expected {}",
                        cube.time_len(),
                        dates.len()
                    )));
                }
            }
        }
        Ok(ReferenceSet { index, cubes, dates })
    }

    pub fn index(&self) -> &RegionIndex {
        &self.index
    }

    /// First-of-month date of each step of the reference record.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn time_len(&self) -> usize {
        self.dates.len()
    }

    pub fn cube(&self, position: usize, scenario: Scenario) -> Option<&ReferenceCube> {
        self.cubes.get(position).map(|set| set.get(scenario))
    }

    /// Every cube converted to km3 anomalies about each reach's own mean.
    pub fn anomalies(&self) -> ReferenceSet {
        ReferenceSet {
            index: self.index.clone(),
            cubes: self.cubes.iter().map(|set| set.map(|c| c.anomaly_km3())).collect(),
            dates: self.dates.clone(),
        }
    }

    /// Steps `start..end` of every cube.
    pub fn window(&self, start: usize, end: usize) -> Option<ReferenceSet> {
        let cubes = self
            .cubes
            .iter()
            .map(|set| {
                Some(ScenarioSet {
                    low: set.low.window(start, end)?,
                    nrm: set.nrm.window(start, end)?,
                    hig: set.hig.window(start, end)?,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(ReferenceSet {
            index: self.index.clone(),
            cubes,
            dates: self.dates.get(start..end)?.to_vec(),
        })
    }
}

/// Sum of `anomaly * weight` over every translated reach at one time step.
pub fn weighted_sum(
    anomalies: &ReferenceSet,
    scenario: Scenario,
    translation: &NormalizedTranslation,
    step: usize,
) -> Result<f64, VolumeError> {
    let mut total = 0.0;
    for bin in &translation.bins {
        let cube = anomalies
            .cube(bin.position, scenario)
            .ok_or(VolumeError::UnknownRegion(bin.region))?;
        for (reach_id, weight) in bin.reach_ids.iter().zip(&bin.weights) {
            let value = cube
                .series(*reach_id)
                .and_then(|s| s.get(step))
                .ok_or(VolumeError::MissingReferenceReach {
                    region: bin.region,
                    reach: *reach_id,
                })?;
            total += value * weight;
        }
    }
    Ok(total)
}

/// Weighted anomaly sums for each scenario over the reference record.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub dates: Vec<NaiveDate>,
    pub values: ScenarioSet<Vec<Option<f64>>>,
}

impl ReferenceRecord {
    pub fn to_record_rows(&self) -> Vec<ReferenceRecordRow> {
        self.dates
            .iter()
            .enumerate()
            .map(|(i, date)| ReferenceRecordRow {
                dates: *date,
                hig: self.values.hig[i],
                nrm: self.values.nrm[i],
                low: self.values.low[i],
            })
            .collect()
    }

    pub fn to_full_coverage_rows(&self) -> Vec<FullCoverageRow> {
        self.dates
            .iter()
            .enumerate()
            .map(|(i, date)| FullCoverageRow {
                dates: *date,
                low: self.values.low[i],
                nrm: self.values.nrm[i],
                hig: self.values.hig[i],
            })
            .collect()
    }
}

/// Reference anomaly of the reaches SWOT saw, laid onto the reference record
/// by calendar month.
///
/// Every record step whose calendar month matches SWOT month `i` receives the
/// weighted sum of `translations[i]` at that step. A `None` translation marks
/// a month without any observed reach; its steps, like those of calendar
/// months SWOT never saw, stay absent. Each scenario is then re-centred on
/// its own mean.
pub fn month_aligned_record(
    anomalies: &ReferenceSet,
    swot_months: &[NaiveDate],
    translations: &[Option<NormalizedTranslation>],
) -> Result<ReferenceRecord, VolumeError> {
    let len = anomalies.time_len();
    let mut values: ScenarioSet<Vec<Option<f64>>> = ScenarioSet::from_fn(|_| vec![None; len]);
    let mut filled_by: Vec<Option<NaiveDate>> = vec![None; len];
    for (month, translation) in swot_months.iter().zip(translations) {
        let Some(translation) = translation else {
            continue;
        };
        if translation.clamped > 0 {
            info!("{month}: clamped {} weights to 1", translation.clamped);
        }
        let steps = indices_of_month(anomalies.dates(), month.month());
        if let Some(previous) = steps.first().and_then(|s| filled_by[*s]) {
            warn!("{month} and {previous} share a calendar month, keeping {month}");
        }
        for step in steps {
            filled_by[step] = Some(*month);
            for scenario in Scenario::ALL {
                values.get_mut(scenario)[step] = Some(weighted_sum(anomalies, scenario, translation, step)?);
            }
        }
    }
    for scenario in Scenario::ALL {
        recenter(values.get_mut(scenario));
    }
    Ok(ReferenceRecord {
        dates: anomalies.dates().to_vec(),
        values,
    })
}

/// Reference anomaly of a fixed set of reaches at every record step.
pub fn full_coverage_record(
    anomalies: &ReferenceSet,
    translation: &NormalizedTranslation,
) -> Result<ReferenceRecord, VolumeError> {
    if translation.clamped > 0 {
        info!("Clamped {} weights to 1", translation.clamped);
    }
    let values = ScenarioSet::try_from_fn(|scenario| {
        (0..anomalies.time_len())
            .map(|step| weighted_sum(anomalies, scenario, translation, step).map(Some))
            .collect::<Result<Vec<_>, VolumeError>>()
    })?;
    Ok(ReferenceRecord {
        dates: anomalies.dates().to_vec(),
        values,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::translation::TranslationMap;
    use svm_core::month_range::monthly_axis;

    /// Two-year record for regions 11 and 74. Reach volumes in m3 are
    /// `base + 1e9 * step` for low, doubled for nrm, tripled for hig.
    pub(crate) fn reference_set() -> ReferenceSet {
        let dates = monthly_axis(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 24);
        let make = |ids: &[i64], factor: f64| {
            let rows = ids
                .iter()
                .map(|id| (*id, (0..24).map(|t| factor * (5e9 + 1e9 * t as f64)).collect()))
                .collect();
            ReferenceCube::from_rows(dates.clone(), rows)
        };
        let cubes = vec![
            ScenarioSet {
                low: make(&[11000001], 1.0),
                nrm: make(&[11000001], 2.0),
                hig: make(&[11000001], 3.0),
            },
            ScenarioSet {
                low: make(&[74000001, 74000002], 1.0),
                nrm: make(&[74000001, 74000002], 2.0),
                hig: make(&[74000001, 74000002], 3.0),
            },
        ];
        ReferenceSet::new(RegionIndex::from_regions([11, 74]), cubes).unwrap()
    }

    fn translation(pairs: &[(i64, f64)], index: &RegionIndex) -> NormalizedTranslation {
        let mut map = TranslationMap::new();
        for (id, w) in pairs {
            map.add(*id, *w);
        }
        normalize(&map, index).unwrap()
    }

    #[test]
    fn test_single_slot_contribution() {
        let set = reference_set();
        let anomalies = set.anomalies();
        let t = translation(&[(74000001, 0.4)], set.index());
        // anomaly at step 0 is (0 - 11.5) km3
        let v = weighted_sum(&anomalies, Scenario::Low, &t, 0).unwrap();
        assert!((v - (-11.5 * 0.4)).abs() < 1e-9);
        let v = weighted_sum(&anomalies, Scenario::Hig, &t, 23).unwrap();
        assert!((v - 3.0 * 11.5 * 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_weight_matches_unit_weight() {
        let set = reference_set();
        let anomalies = set.anomalies();
        let over = translation(&[(74000001, 1.7)], set.index());
        let unit = translation(&[(74000001, 1.0)], set.index());
        for step in [0, 5, 23] {
            let a = weighted_sum(&anomalies, Scenario::Nrm, &over, step).unwrap();
            let b = weighted_sum(&anomalies, Scenario::Nrm, &unit, step).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_missing_reference_reach() {
        let set = reference_set();
        let t = translation(&[(11000009, 0.5)], set.index());
        let err = weighted_sum(&set.anomalies(), Scenario::Low, &t, 0).unwrap_err();
        assert!(matches!(err, VolumeError::MissingReferenceReach { region: 11, reach: 11000009 }));
    }

    #[test]
    fn test_month_aligned_record() {
        let set = reference_set();
        let anomalies = set.anomalies();
        let swot_months = vec![
            NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
        ];
        let translations = vec![
            Some(translation(&[(11000001, 1.0)], set.index())),
            Some(translation(&[(74000001, 0.5), (74000002, 0.5)], set.index())),
        ];
        let record = month_aligned_record(&anomalies, &swot_months, &translations).unwrap();
        assert_eq!(record.dates.len(), 24);
        // only Octobers (steps 9, 21) and Novembers (10, 22) are filled
        let filled: Vec<usize> = (0..24).filter(|i| record.values.low[*i].is_some()).collect();
        assert_eq!(filled, vec![9, 10, 21, 22]);
        let present: Vec<f64> = filled.iter().map(|i| record.values.low[*i].unwrap()).collect();
        assert!(present.iter().sum::<f64>().abs() < 1e-9);
        // before centring: -2.5, -1.5, 9.5, 10.5
        assert!((present[0] - (-2.5 - 4.0)).abs() < 1e-9);
        assert!((present[3] - (10.5 - 4.0)).abs() < 1e-9);
        let rows = record.to_record_rows();
        assert_eq!(rows[9].dates, NaiveDate::from_ymd_opt(2000, 10, 1).unwrap());
        assert_eq!(rows[0].low, None);
    }

    #[test]
    fn test_recentring_ignores_months_swot_never_saw() {
        let set = reference_set();
        let swot_months = vec![NaiveDate::from_ymd_opt(2023, 10, 1).unwrap()];
        let translations = vec![Some(translation(&[(11000001, 1.0)], set.index()))];
        let record = month_aligned_record(&set.anomalies(), &swot_months, &translations).unwrap();
        // Octobers read -2.5 and 9.5; the mean is 3.5 over those two steps
        // alone, not 7/24 over a zero-filled record
        assert_eq!(record.values.low.iter().filter(|v| v.is_none()).count(), 22);
        assert!((record.values.low[9].unwrap() + 6.0).abs() < 1e-9);
        assert!((record.values.low[21].unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_unobserved_month_stays_absent() {
        let set = reference_set();
        let swot_months = vec![
            NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
        ];
        // October observed but fully dropped, November not observed at all
        let translations = vec![Some(NormalizedTranslation::default()), None];
        let record = month_aligned_record(&set.anomalies(), &swot_months, &translations).unwrap();
        assert_eq!(record.values.nrm[9], Some(0.0));
        assert_eq!(record.values.nrm[10], None);
    }

    #[test]
    fn test_full_coverage_record() {
        let set = reference_set();
        let t = translation(&[(11000001, 1.0), (74000002, 0.5)], set.index());
        let record = full_coverage_record(&set.anomalies(), &t).unwrap();
        let rows = record.to_full_coverage_rows();
        assert_eq!(rows.len(), 24);
        assert!((rows[0].low.unwrap() - (-11.5 * 1.5)).abs() < 1e-9);
        assert!((rows[0].nrm.unwrap() - (-23.0 * 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_reference_set_rejects_mismatched_axis() {
        let dates = monthly_axis(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), 3);
        let short = ReferenceCube::from_rows(dates[..2].to_vec(), vec![(11000001, vec![1.0, 2.0])]);
        let full = ReferenceCube::from_rows(dates, vec![(11000001, vec![1.0, 2.0, 3.0])]);
        let cubes = vec![ScenarioSet {
            low: full.clone(),
            nrm: short,
            hig: full,
        }];
        let err = ReferenceSet::new(RegionIndex::from_regions([11]), cubes).unwrap_err();
        assert!(matches!(err, VolumeError::TimeAxis(_)));
    }
}
