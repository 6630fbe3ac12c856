//! Per-month comparison of SWOT and MeanDRS anomalies, by region and globally.

use crate::swot::{global_series, sum_series};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use svm_core::scenario::{Scenario, ScenarioSet};
use svm_core::tables::{ComparisonRow, ReferenceRecordRow, SwotSeriesRow};
use svm_utils::stats::{mean, present, sample_std};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyStats {
    pub mean: Option<f64>,
    /// Sample standard deviation, `None` below two values.
    pub std: Option<f64>,
}

/// Mean and standard deviation of the present values of each calendar month.
pub fn monthly_stats(dates: &[NaiveDate], values: &[Option<f64>]) -> BTreeMap<u32, MonthlyStats> {
    let mut groups: BTreeMap<u32, Vec<Option<f64>>> = BTreeMap::new();
    for (date, value) in dates.iter().zip(values) {
        groups.entry(date.month()).or_default().push(*value);
    }
    groups
        .into_iter()
        .map(|(month, values)| {
            let p = present(&values);
            (
                month,
                MonthlyStats {
                    mean: mean(&p),
                    std: sample_std(&p),
                },
            )
        })
        .collect()
}

/// Calendar-month statistics of each scenario of a reference record.
pub fn record_stats(record: &[ReferenceRecordRow]) -> ScenarioSet<BTreeMap<u32, MonthlyStats>> {
    let dates: Vec<NaiveDate> = record.iter().map(|r| r.dates).collect();
    ScenarioSet::from_fn(|scenario| {
        let values: Vec<Option<f64>> = record
            .iter()
            .map(|r| match scenario {
                Scenario::Low => r.low,
                Scenario::Nrm => r.nrm,
                Scenario::Hig => r.hig,
            })
            .collect();
        monthly_stats(&dates, &values)
    })
}

fn comparison_row(
    date: NaiveDate,
    v_swot: Option<f64>,
    stats: &ScenarioSet<BTreeMap<u32, MonthlyStats>>,
) -> ComparisonRow {
    let month = date.month();
    let get = |s: Scenario| stats.get(s).get(&month).copied().unwrap_or_default();
    let (low, nrm, hig) = (get(Scenario::Low), get(Scenario::Nrm), get(Scenario::Hig));
    ComparisonRow {
        dates: date,
        mon: month,
        v_swot,
        low_mean: low.mean,
        low_std: low.std,
        nrm_mean: nrm.mean,
        nrm_std: nrm.std,
        hig_mean: hig.mean,
        hig_std: hig.std,
    }
}

/// One comparison row per SWOT month: the region's SWOT sum beside the
/// reference statistics of the same calendar month.
pub fn comparison_rows(swot: &[SwotSeriesRow], record: &[ReferenceRecordRow]) -> Vec<ComparisonRow> {
    let stats = record_stats(record);
    swot.iter()
        .map(|row| comparison_row(row.dates, row.v_swot, &stats))
        .collect()
}

/// Rows for a region without data: months filled, every value missing.
pub fn placeholder_rows(dates: &[NaiveDate]) -> Vec<ComparisonRow> {
    let empty = ScenarioSet::default();
    dates.iter().map(|d| comparison_row(*d, None, &empty)).collect()
}

/// Comparison of the globe: SWOT and reference anomalies are summed over the
/// regions that have data and re-centred before the statistics are taken.
pub fn global_comparison(
    dates: &[NaiveDate],
    swot: &[Vec<SwotSeriesRow>],
    records: &[Vec<ReferenceRecordRow>],
) -> Vec<ComparisonRow> {
    let regional_swot: Vec<Vec<Option<f64>>> = swot
        .iter()
        .filter(|rows| !rows.is_empty())
        .map(|rows| {
            let by_date: HashMap<NaiveDate, Option<f64>> = rows.iter().map(|r| (r.dates, r.v_swot)).collect();
            dates.iter().map(|d| by_date.get(d).copied().flatten()).collect()
        })
        .collect();
    let v_swot = global_series(&regional_swot, dates.len());

    let record_dates: Vec<NaiveDate> = records
        .iter()
        .flat_map(|rows| rows.iter().map(|r| r.dates))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let summed = ScenarioSet::from_fn(|scenario| {
        let regional: Vec<Vec<Option<f64>>> = records
            .iter()
            .filter(|rows| !rows.is_empty())
            .map(|rows| {
                let by_date: HashMap<NaiveDate, Option<f64>> = rows
                    .iter()
                    .map(|r| {
                        let v = match scenario {
                            Scenario::Low => r.low,
                            Scenario::Nrm => r.nrm,
                            Scenario::Hig => r.hig,
                        };
                        (r.dates, v)
                    })
                    .collect();
                record_dates.iter().map(|d| by_date.get(d).copied().flatten()).collect()
            })
            .collect();
        sum_series(&regional, record_dates.len())
    });
    let global_record: Vec<ReferenceRecordRow> = record_dates
        .iter()
        .enumerate()
        .map(|(i, d)| ReferenceRecordRow {
            dates: *d,
            hig: summed.hig[i],
            nrm: summed.nrm[i],
            low: summed.low[i],
        })
        .collect();
    let stats = record_stats(&global_record);
    dates
        .iter()
        .zip(v_swot)
        .map(|(d, v)| comparison_row(*d, v, &stats))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use svm_core::tables::{read_rows, write_rows};
    use svm_utils::stats::recenter;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn record(values: &[(i32, u32, f64)]) -> Vec<ReferenceRecordRow> {
        values
            .iter()
            .map(|(y, m, v)| ReferenceRecordRow {
                dates: d(*y, *m),
                hig: Some(3.0 * v),
                nrm: Some(2.0 * v),
                low: Some(*v),
            })
            .collect()
    }

    fn swot(values: &[(i32, u32, Option<f64>)]) -> Vec<SwotSeriesRow> {
        values
            .iter()
            .map(|(y, m, v)| SwotSeriesRow {
                dates: d(*y, *m),
                v_swot: *v,
                n_reach: usize::from(v.is_some()),
            })
            .collect()
    }

    #[test]
    fn test_monthly_stats() {
        let dates = vec![d(2000, 1), d(2000, 2), d(2001, 1), d(2001, 2), d(2002, 1)];
        let values = vec![Some(1.0), Some(5.0), Some(3.0), None, None];
        let stats = monthly_stats(&dates, &values);
        assert_eq!(stats[&1].mean, Some(2.0));
        assert!((stats[&1].std.unwrap() - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats[&2].mean, Some(5.0));
        assert_eq!(stats[&2].std, None);
    }

    #[test]
    fn test_comparison_rows() {
        let rec = record(&[(2000, 10, 1.0), (2000, 11, -1.0), (2001, 10, 3.0), (2001, 11, -3.0)]);
        let sw = swot(&[(2023, 10, Some(0.5)), (2023, 11, None), (2023, 12, Some(1.0))]);
        let rows = comparison_rows(&sw, &rec);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].mon, 10);
        assert_eq!(rows[0].v_swot, Some(0.5));
        assert_eq!(rows[0].low_mean, Some(2.0));
        assert_eq!(rows[0].hig_mean, Some(6.0));
        assert_eq!(rows[1].nrm_mean, Some(-4.0));
        // December is absent from the record
        assert_eq!(rows[2].low_mean, None);
        assert_eq!(rows[2].v_swot, Some(1.0));
    }

    #[test]
    fn test_placeholder_rows() {
        let rows = placeholder_rows(&[d(2023, 10), d(2023, 11)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].mon, 11);
        assert!(rows.iter().all(|r| r.v_swot.is_none() && r.low_mean.is_none() && r.hig_std.is_none()));
    }

    #[test]
    fn test_global_comparison_matches_regional_round_trip() {
        let dates = vec![d(2023, 10), d(2023, 11), d(2023, 12)];
        let swot_regions = vec![
            swot(&[(2023, 10, Some(1.0)), (2023, 11, Some(2.0)), (2023, 12, None)]),
            vec![],
            swot(&[(2023, 10, Some(-0.5)), (2023, 11, Some(0.0)), (2023, 12, Some(4.0))]),
        ];
        let records = vec![
            record(&[(2000, 10, 1.0), (2000, 11, 2.0), (2000, 12, -3.0)]),
            vec![],
            record(&[(2000, 10, 0.5), (2000, 11, 0.5), (2000, 12, -1.0)]),
        ];
        let global = global_comparison(&dates, &swot_regions, &records);
        let mean: f64 = global.iter().filter_map(|r| r.v_swot).sum::<f64>() / 3.0;
        assert!(mean.abs() < 1e-9);
        assert_eq!(global[0].low_mean, Some(1.5));
        assert_eq!(global[2].nrm_mean, Some(-8.0));

        // write each region, read it back and re-sum
        let mut regional_v: Vec<Vec<Option<f64>>> = Vec::new();
        for (sw, rec) in swot_regions.iter().zip(&records) {
            if sw.is_empty() {
                continue;
            }
            let mut buffer = Vec::new();
            write_rows(&mut buffer, &comparison_rows(sw, rec)).unwrap();
            let reread: Vec<ComparisonRow> = read_rows(buffer.as_slice()).unwrap();
            regional_v.push(reread.iter().map(|r| r.v_swot).collect());
        }
        let mut resummed = sum_series(&regional_v, 3);
        recenter(&mut resummed);
        for (a, b) in resummed.iter().zip(&global) {
            assert!((a.unwrap() - b.v_swot.unwrap()).abs() < 1e-9);
        }
    }
}
