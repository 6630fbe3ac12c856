//! Scaling the SWOT anomaly up to full MERIT-Basins coverage.

use crate::summary::monthly_stats;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use svm_core::tables::{FullCoverageRow, ReferenceRecordRow, ScaleRow, SwotSeriesRow};
use svm_utils::stats::{recenter, sum_present};

/// Least-squares factor `a` minimising `|y - a x|`, one when `x` is all zero.
pub fn ls_scale(x: &[f64], y: &[f64]) -> f64 {
    let sxx: f64 = x.iter().map(|v| v * v).sum();
    if sxx == 0.0 {
        return 1.0;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    sxy / sxx
}

fn monthly_means(dates: &[NaiveDate], values: &[Option<f64>]) -> BTreeMap<u32, Option<f64>> {
    monthly_stats(dates, values)
        .into_iter()
        .map(|(month, stats)| (month, stats.mean))
        .collect()
}

/// Scale a region's SWOT anomaly by how much the observed subset of MeanDRS
/// reaches under- or over-states the full set.
///
/// The observed subset (`record`) and the full set (`full`) are reduced to
/// calendar-month means of the low scenario and laid onto the SWOT months.
/// Each column is re-centred, then the SWOT anomaly is multiplied by the
/// least-squares factor from subset to full set. The fit uses only months
/// where both the subset and the full set are present, so a subset month
/// without a full-set value adds nothing to `sum(x^2)` either.
pub fn regional_scale(
    swot: &[SwotSeriesRow],
    record: &[ReferenceRecordRow],
    full: &[FullCoverageRow],
) -> Vec<ScaleRow> {
    let record_dates: Vec<NaiveDate> = record.iter().map(|r| r.dates).collect();
    let record_low: Vec<Option<f64>> = record.iter().map(|r| r.low).collect();
    let subset_means = monthly_means(&record_dates, &record_low);
    let full_dates: Vec<NaiveDate> = full.iter().map(|r| r.dates).collect();
    let full_low: Vec<Option<f64>> = full.iter().map(|r| r.low).collect();
    let full_means = monthly_means(&full_dates, &full_low);

    let month_mean =
        |means: &BTreeMap<u32, Option<f64>>, d: &NaiveDate| means.get(&d.month()).copied().flatten();
    let mut v_swot: Vec<Option<f64>> = swot.iter().map(|r| r.v_swot).collect();
    let mut low_swot: Vec<Option<f64>> = swot.iter().map(|r| month_mean(&subset_means, &r.dates)).collect();
    let mut low_ms: Vec<Option<f64>> = swot.iter().map(|r| month_mean(&full_means, &r.dates)).collect();
    recenter(&mut v_swot);
    recenter(&mut low_swot);
    recenter(&mut low_ms);

    let (x, y): (Vec<f64>, Vec<f64>) = low_swot
        .iter()
        .zip(&low_ms)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .unzip();
    let alpha = ls_scale(&x, &y);

    swot.iter()
        .enumerate()
        .map(|(i, row)| ScaleRow {
            dates: row.dates,
            v_swot: v_swot[i],
            low_swot: low_swot[i],
            low_ms: low_ms[i],
            v_swot_ms: v_swot[i].map(|v| v * alpha),
        })
        .collect()
}

/// Column-wise sum of the regional scale tables over `dates`, skipping
/// missing values.
pub fn global_scale(dates: &[NaiveDate], regional: &[Vec<ScaleRow>]) -> Vec<ScaleRow> {
    let lookups: Vec<BTreeMap<NaiveDate, &ScaleRow>> = regional
        .iter()
        .map(|rows| rows.iter().map(|r| (r.dates, r)).collect())
        .collect();
    dates
        .iter()
        .map(|date| {
            let rows: Vec<&ScaleRow> = lookups.iter().filter_map(|l| l.get(date).copied()).collect();
            ScaleRow {
                dates: *date,
                v_swot: sum_present(rows.iter().map(|r| r.v_swot)),
                low_swot: sum_present(rows.iter().map(|r| r.low_swot)),
                low_ms: sum_present(rows.iter().map(|r| r.low_ms)),
                v_swot_ms: sum_present(rows.iter().map(|r| r.v_swot_ms)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn test_ls_scale() {
        assert!((ls_scale(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 2.0).abs() < 1e-12);
        assert_eq!(ls_scale(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(ls_scale(&[], &[]), 1.0);
    }

    #[test]
    fn test_regional_scale() {
        let swot = vec![
            SwotSeriesRow { dates: d(2023, 10), v_swot: Some(1.0), n_reach: 3 },
            SwotSeriesRow { dates: d(2023, 11), v_swot: Some(3.0), n_reach: 3 },
        ];
        let record = vec![
            ReferenceRecordRow { dates: d(2000, 10), hig: None, nrm: None, low: Some(-1.0) },
            ReferenceRecordRow { dates: d(2000, 11), hig: None, nrm: None, low: Some(1.0) },
        ];
        let full = vec![
            FullCoverageRow { dates: d(2000, 10), low: Some(-3.0), nrm: None, hig: None },
            FullCoverageRow { dates: d(2000, 11), low: Some(3.0), nrm: None, hig: None },
        ];
        let rows = regional_scale(&swot, &record, &full);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].v_swot, Some(-1.0));
        assert_eq!(rows[0].low_swot, Some(-1.0));
        assert_eq!(rows[0].low_ms, Some(-3.0));
        // full coverage is three times the observed subset
        assert!((rows[1].v_swot_ms.unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_regional_scale_fits_paired_months_only() {
        let swot = vec![
            SwotSeriesRow { dates: d(2023, 10), v_swot: Some(1.0), n_reach: 2 },
            SwotSeriesRow { dates: d(2023, 11), v_swot: Some(2.0), n_reach: 2 },
            SwotSeriesRow { dates: d(2023, 12), v_swot: Some(3.0), n_reach: 2 },
        ];
        let record = vec![
            ReferenceRecordRow { dates: d(2000, 10), hig: None, nrm: None, low: Some(-1.0) },
            ReferenceRecordRow { dates: d(2000, 11), hig: None, nrm: None, low: Some(1.0) },
            ReferenceRecordRow { dates: d(2000, 12), hig: None, nrm: None, low: Some(3.0) },
        ];
        let full = vec![
            FullCoverageRow { dates: d(2000, 10), low: Some(-2.0), nrm: None, hig: None },
            FullCoverageRow { dates: d(2000, 11), low: Some(2.0), nrm: None, hig: None },
        ];
        let rows = regional_scale(&swot, &record, &full);
        assert_eq!(rows[2].low_swot, Some(2.0));
        assert_eq!(rows[2].low_ms, None);
        // x = (-2, 0) against y = (-2, 2) gives 1; December's x = 2 is left out
        assert!((rows[2].v_swot_ms.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_regional_scale_without_variance_keeps_swot() {
        let swot = vec![
            SwotSeriesRow { dates: d(2023, 10), v_swot: Some(2.0), n_reach: 1 },
            SwotSeriesRow { dates: d(2023, 11), v_swot: Some(4.0), n_reach: 1 },
        ];
        let record = vec![ReferenceRecordRow { dates: d(2000, 10), hig: None, nrm: None, low: Some(0.0) }];
        let rows = regional_scale(&swot, &record, &[]);
        assert_eq!(rows[1].low_ms, None);
        assert_eq!(rows[1].v_swot_ms, Some(1.0));
    }

    #[test]
    fn test_global_scale_skips_missing() {
        let dates = vec![d(2023, 10)];
        let a = vec![ScaleRow { dates: d(2023, 10), v_swot: Some(1.0), low_swot: None, low_ms: Some(2.0), v_swot_ms: Some(2.0) }];
        let b = vec![ScaleRow { dates: d(2023, 10), v_swot: Some(0.5), low_swot: None, low_ms: None, v_swot_ms: Some(1.0) }];
        let global = global_scale(&dates, &[a, b, vec![]]);
        assert_eq!(global[0].v_swot, Some(1.5));
        assert_eq!(global[0].low_swot, None);
        assert_eq!(global[0].low_ms, Some(2.0));
        assert_eq!(global[0].v_swot_ms, Some(3.0));
    }
}
