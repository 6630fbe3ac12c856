//! Magnitude and timing agreement between SWOT and MeanDRS per region.

use svm_core::scenario::{Scenario, ScenarioSet};
use svm_core::tables::{ComparisonRow, CorrelationRow, MagnitudeRatioRow};
use svm_utils::stats::{pearson, range_present};

/// Lags in the order they are evaluated; ties go to the earliest.
pub const LAGS: [i32; 12] = [0, 1, 2, 3, 4, 5, 6, -5, -4, -3, -2, -1];

/// True when the region has nothing to compare: its SWOT sums or its low
/// scenario means are all zero or missing.
pub fn is_degenerate(rows: &[ComparisonRow]) -> bool {
    let blank = |v: Option<f64>| v.map_or(true, |x| x == 0.0);
    rows.iter().all(|r| blank(r.v_swot)) || rows.iter().all(|r| blank(r.low_mean))
}

/// Range of the SWOT sums over the range of each scenario's monthly means.
/// Non-finite ratios are reported as missing.
pub fn magnitude_ratios(rows: &[ComparisonRow]) -> ScenarioSet<Option<f64>> {
    if is_degenerate(rows) {
        return ScenarioSet::default();
    }
    let v_swot: Vec<Option<f64>> = rows.iter().map(|r| r.v_swot).collect();
    let swot_range = range_present(&v_swot);
    ScenarioSet::from_fn(|scenario| {
        let means: Vec<Option<f64>> = rows.iter().map(|r| r.mean(scenario)).collect();
        let ratio = swot_range? / range_present(&means)?;
        ratio.is_finite().then_some(ratio)
    })
}

/// Scenario whose ratio is closest to one, first in low, nrm, hig order on ties.
pub fn best_scenario(ratios: &ScenarioSet<Option<f64>>) -> Option<Scenario> {
    let mut best: Option<(Scenario, f64)> = None;
    for scenario in Scenario::ALL {
        if let Some(ratio) = ratios.get(scenario) {
            let distance = (ratio - 1.0).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((scenario, distance));
            }
        }
    }
    best.map(|(s, _)| s)
}

/// Pearson correlation with circular shifting, in [`LAGS`] order.
///
/// At lag `k`, `x[t]` is paired with `y[(t + k) mod n]`: a `y` running two
/// steps behind `x` peaks at lag 2.
pub fn lag_correlations(x: &[f64], y: &[f64]) -> Vec<(i32, Option<f64>)> {
    let n = x.len();
    LAGS.iter()
        .map(|&lag| {
            if n == 0 || y.len() != n {
                return (lag, None);
            }
            let shift = lag.rem_euclid(n as i32) as usize;
            let shifted: Vec<f64> = (0..n).map(|t| y[(t + shift) % n]).collect();
            (lag, pearson(x, &shifted))
        })
        .collect()
}

/// Lag of the highest correlation, first in [`LAGS`] order on ties.
pub fn best_lag(correlations: &[(i32, Option<f64>)]) -> Option<i32> {
    let mut best: Option<(i32, f64)> = None;
    for (lag, corr) in correlations {
        if let Some(c) = corr {
            if best.map_or(true, |(_, b)| *c > b) {
                best = Some((*lag, *c));
            }
        }
    }
    best.map(|(lag, _)| lag)
}

pub fn magnitude_row(pfaf: &str, rows: &[ComparisonRow]) -> MagnitudeRatioRow {
    let ratios = magnitude_ratios(rows);
    MagnitudeRatioRow {
        pfaf: pfaf.to_string(),
        mag_rat_low: ratios.low,
        mag_rat_nrm: ratios.nrm,
        mag_rat_hig: ratios.hig,
        best_scen: best_scenario(&ratios),
    }
}

/// Correlations of the SWOT sums against the low scenario means. All
/// correlations are missing for a degenerate region or one with gaps.
pub fn correlation_row(pfaf: &str, rows: &[ComparisonRow]) -> CorrelationRow {
    let mut by_lag = [None; 12];
    let mut best = None;
    let series: Option<(Vec<f64>, Vec<f64>)> = if is_degenerate(rows) {
        None
    } else {
        rows.iter().map(|r| Some((r.v_swot?, r.low_mean?))).collect()
    };
    if let Some((x, y)) = series {
        let correlations = lag_correlations(&x, &y);
        best = best_lag(&correlations);
        for (lag, corr) in correlations {
            // columns run from lag -5 to lag +6
            by_lag[(lag + 5) as usize] = corr;
        }
    }
    CorrelationRow::from_lags(pfaf.to_string(), by_lag, best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::f64::consts::PI;

    fn rows(v_swot: &[f64], low: &[f64], nrm: &[f64], hig: &[f64]) -> Vec<ComparisonRow> {
        (0..v_swot.len())
            .map(|i| ComparisonRow {
                dates: NaiveDate::from_ymd_opt(2024, (i % 12) as u32 + 1, 1).unwrap(),
                mon: (i % 12) as u32 + 1,
                v_swot: Some(v_swot[i]),
                low_mean: Some(low[i]),
                low_std: None,
                nrm_mean: Some(nrm[i]),
                nrm_std: None,
                hig_mean: Some(hig[i]),
                hig_std: None,
            })
            .collect()
    }

    #[test]
    fn test_best_scenario_closest_to_one() {
        let ratios = ScenarioSet {
            low: Some(1.4),
            nrm: Some(0.9),
            hig: Some(3.0),
        };
        assert_eq!(best_scenario(&ratios), Some(Scenario::Nrm));
        let tied = ScenarioSet {
            low: Some(1.5),
            nrm: Some(0.5),
            hig: None,
        };
        assert_eq!(best_scenario(&tied), Some(Scenario::Low));
        assert_eq!(best_scenario(&ScenarioSet::default()), None);
    }

    #[test]
    fn test_magnitude_ratios() {
        let r = rows(&[0.0, 2.0], &[0.0, 1.4], &[0.0, 2.2], &[0.0, 0.0]);
        let ratios = magnitude_ratios(&r);
        assert!((ratios.low.unwrap() - 2.0 / 1.4).abs() < 1e-12);
        assert!((ratios.nrm.unwrap() - 2.0 / 2.2).abs() < 1e-12);
        // zero reference range
        assert_eq!(ratios.hig, None);
        let row = magnitude_row("74", &r);
        assert_eq!(row.best_scen, Some(Scenario::Nrm));
    }

    #[test]
    fn test_all_zero_swot_is_missing() {
        let r = rows(&[0.0, 0.0], &[1.0, 2.0], &[1.0, 2.0], &[1.0, 2.0]);
        let row = magnitude_row("11", &r);
        assert_eq!(row.mag_rat_low, None);
        assert_eq!(row.best_scen, None);
        let corr = correlation_row("11", &r);
        assert_eq!(corr.corr_0, None);
        assert_eq!(corr.best_lag, None);
    }

    #[test]
    fn test_sine_delay_resolves_to_lag_two() {
        let x: Vec<f64> = (0..12).map(|t| (2.0 * PI * t as f64 / 12.0).sin()).collect();
        let y: Vec<f64> = (0..12).map(|t| (2.0 * PI * (t as f64 - 2.0) / 12.0).sin()).collect();
        let correlations = lag_correlations(&x, &y);
        assert_eq!(best_lag(&correlations), Some(2));
        let at_two = correlations.iter().find(|(l, _)| *l == 2).unwrap().1.unwrap();
        assert!((at_two - 1.0).abs() < 1e-9);

        let r = rows(&x, &y, &y, &y);
        let row = correlation_row("74", &r);
        assert_eq!(row.best_lag, Some(2));
        assert!((row.corr_pos2.unwrap() - 1.0).abs() < 1e-9);
        assert!((row.corr_neg4.unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_best_lag_ties_go_to_first_listed() {
        let correlations = vec![(0, Some(0.5)), (1, Some(0.9)), (-1, Some(0.9)), (2, None)];
        assert_eq!(best_lag(&correlations), Some(1));
        assert_eq!(best_lag(&[(0, None)]), None);
    }
}
