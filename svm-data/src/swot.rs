use chrono::NaiveDate;
use std::collections::BTreeSet;
use svm_core::reach::SwordReachId;
use svm_core::reach_series::ReachSeriesTable;
use svm_core::tables::SwotSeriesRow;
use svm_utils::stats::{recenter, sum_present};

/// Summed SWOT volume anomaly of one region, per month.
#[derive(Debug, Clone, PartialEq)]
pub struct SwotSeries {
    pub dates: Vec<NaiveDate>,
    /// `None` when no reach contributed that month.
    pub values: Vec<Option<f64>>,
    pub counts: Vec<usize>,
}

impl SwotSeries {
    pub fn to_rows(&self) -> Vec<SwotSeriesRow> {
        self.dates
            .iter()
            .zip(&self.values)
            .zip(&self.counts)
            .map(|((date, value), count)| SwotSeriesRow {
                dates: *date,
                v_swot: *value,
                n_reach: *count,
            })
            .collect()
    }
}

/// Sum each month's observed anomalies over the reaches that were not dropped.
pub fn regional_swot_series(anomaly: &ReachSeriesTable, dropped: &BTreeSet<SwordReachId>) -> SwotSeries {
    let kept: Vec<SwordReachId> = anomaly
        .reach_ids()
        .iter()
        .copied()
        .filter(|id| !dropped.contains(id))
        .collect();
    let mut values = Vec::with_capacity(anomaly.dates.len());
    let mut counts = Vec::with_capacity(anomaly.dates.len());
    for column in 0..anomaly.dates.len() {
        let observed: Vec<Option<f64>> = kept.iter().map(|id| anomaly.value(*id, column)).collect();
        counts.push(observed.iter().flatten().count());
        values.push(sum_present(observed));
    }
    SwotSeries {
        dates: anomaly.dates.clone(),
        values,
        counts,
    }
}

/// Sum series position by position, skipping missing entries. A position
/// where every series is missing stays missing.
pub fn sum_series(series: &[Vec<Option<f64>>], len: usize) -> Vec<Option<f64>> {
    (0..len)
        .map(|i| sum_present(series.iter().map(|s| s.get(i).copied().flatten())))
        .collect()
}

/// Sum regional series, then subtract the mean of the sum.
///
/// Regional series are summed as they are: re-centring each region first
/// would subtract every region's own mean a second time.
pub fn global_series(regional: &[Vec<Option<f64>>], len: usize) -> Vec<Option<f64>> {
    let mut total = sum_series(regional, len);
    recenter(&mut total);
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANOMALY_CSV: &str = "\
reach_id,2023-10,2023-11,2023-12
74230000011,1.0,2.0,
74230000021,0.5,,
74230000031,4.0,4.0,
";

    #[test]
    fn test_dropped_reach_is_excluded() {
        let table = ReachSeriesTable::parse_reach_series_csv(ANOMALY_CSV).unwrap();
        let dropped = BTreeSet::from([74230000031]);
        let series = regional_swot_series(&table, &dropped);
        assert_eq!(series.values, vec![Some(1.5), Some(2.0), None]);
        assert_eq!(series.counts, vec![2, 1, 0]);
        let rows = series.to_rows();
        assert_eq!(rows[2].n_reach, 0);
        assert_eq!(rows[2].v_swot, None);
    }

    #[test]
    fn test_global_series_is_zero_mean() {
        let regional = vec![
            vec![Some(1.0), Some(3.0), None],
            vec![Some(2.0), None, Some(5.0)],
            vec![],
        ];
        let summed = sum_series(&regional, 3);
        assert_eq!(summed, vec![Some(3.0), Some(3.0), Some(5.0)]);
        let global = global_series(&regional, 3);
        let total: f64 = global.iter().flatten().sum();
        assert!(total.abs() < 1e-9);
        assert!((global[2].unwrap() - (5.0 - 11.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_global_series_all_missing() {
        let global = global_series(&[vec![None, None]], 2);
        assert_eq!(global, vec![None, None]);
    }
}
