//! Monthly SWOT volume anomaly of each reach, from the per-date volumes of
//! the area fit and the raw reach observations.

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use svm_core::month_range::MonthRange;
use svm_core::observation::SwotObservation;
use svm_core::reach::{is_river_reach, SwordReachId};
use svm_core::reach_series::ReachSeriesTable;
use svm_utils::dates::first_of_month;

pub const MAX_REACH_QUALITY: f64 = 3.0;
pub const MAX_CROSSOVER_QUALITY: f64 = 1.0;
pub const MAX_DARK_FRACTION: f64 = 0.3;
pub const MIN_OBSERVED_FRACTION: f64 = 0.5;
/// Usable swath, meters from nadir on either side.
pub const MIN_CROSS_TRACK_M: f64 = 10_000.0;
pub const MAX_CROSS_TRACK_M: f64 = 60_000.0;
/// Fill values of the product sit far below this.
pub const MIN_VALID_MEASUREMENT: f64 = -1e5;

/// Which observations and reaches the anomaly is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationFilter {
    /// Later observation times are moved back to this instant.
    pub end_time: NaiveDateTime,
    /// Minimum number of quality observations per reach.
    pub min_observations: usize,
    /// Maximum spread of quality WSE values per reach, meters.
    pub max_wse_range: f64,
}

impl Default for ObservationFilter {
    fn default() -> Self {
        ObservationFilter {
            end_time: NaiveDate::from_ymd_opt(2024, 9, 30)
                .and_then(|d| d.and_hms_opt(23, 59, 59))
                .unwrap_or(NaiveDateTime::MAX),
            min_observations: 5,
            max_wse_range: 20.0,
        }
    }
}

impl ObservationFilter {
    /// Quality flags, geometry and reach type checks of one observation.
    /// A missing field fails its check.
    pub fn passes_quality(&self, obs: &SwotObservation) -> bool {
        let below = |v: Option<f64>, max: f64| v.is_some_and(|x| x < max);
        let cross_track = obs
            .xtrk_dist
            .map(f64::abs)
            .is_some_and(|x| (MIN_CROSS_TRACK_M..=MAX_CROSS_TRACK_M).contains(&x));
        below(obs.reach_q, MAX_REACH_QUALITY)
            && below(obs.xovr_cal_q, MAX_CROSSOVER_QUALITY)
            && below(obs.dark_frac, MAX_DARK_FRACTION)
            && obs.ice_clim_f == Some(0.0)
            && obs.obs_frac_n.is_some_and(|x| x > MIN_OBSERVED_FRACTION)
            && cross_track
            && obs.wse.is_some_and(|x| x >= MIN_VALID_MEASUREMENT)
            && obs.width.is_some_and(|x| x >= MIN_VALID_MEASUREMENT)
            && is_river_reach(obs.reach_id)
    }

    /// Calendar date of an observation after clamping to the end time.
    pub fn observation_date(&self, obs: &SwotObservation) -> Option<NaiveDate> {
        obs.observed_at().map(|t| t.min(self.end_time).date())
    }
}

/// A single data point for interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sort points by date and average those sharing a date.
pub fn merge_same_day(points: &[DataPoint]) -> Vec<DataPoint> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for p in points {
        let entry = by_date.entry(p.date).or_insert((0.0, 0));
        entry.0 += p.value;
        entry.1 += 1;
    }
    by_date
        .into_iter()
        .map(|(date, (sum, n))| DataPoint {
            date,
            value: sum / n as f64,
        })
        .collect()
}

/// Value at `date`, linear in time between the surrounding points.
///
/// `points` must be sorted by date. Dates before the first or after the last
/// point take that point's value.
pub fn interpolate_at(points: &[DataPoint], date: NaiveDate) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    if date <= first.date {
        return Some(first.value);
    }
    if date >= last.date {
        return Some(last.value);
    }
    let i = points.partition_point(|p| p.date < date);
    let end = &points[i];
    if end.date == date {
        return Some(end.value);
    }
    let start = &points[i - 1];
    let days = (end.date - start.date).num_days() as f64;
    let slope = (end.value - start.value) / days;
    Some(start.value + slope * (date - start.date).num_days() as f64)
}

/// Anomaly of one reach on every date it has a volume or an observation.
///
/// Volumes are interpolated onto the union of both date sets and the mean
/// over that union is subtracted.
pub fn reach_anomaly(volumes: &[DataPoint], observed: &BTreeSet<NaiveDate>) -> Vec<DataPoint> {
    let volumes = merge_same_day(volumes);
    if volumes.is_empty() {
        return Vec::new();
    }
    let dates: BTreeSet<NaiveDate> = volumes.iter().map(|p| p.date).chain(observed.iter().copied()).collect();
    let values: Vec<DataPoint> = dates
        .into_iter()
        .filter_map(|date| interpolate_at(&volumes, date).map(|value| DataPoint { date, value }))
        .collect();
    let mean = values.iter().map(|p| p.value).sum::<f64>() / values.len() as f64;
    values
        .into_iter()
        .map(|p| DataPoint {
            date: p.date,
            value: p.value - mean,
        })
        .collect()
}

/// Average of the points falling in each month, keyed by first of month.
pub fn monthly_means(points: &[DataPoint]) -> BTreeMap<NaiveDate, f64> {
    let monthly: Vec<DataPoint> = points
        .iter()
        .map(|p| DataPoint {
            date: first_of_month(&p.date),
            value: p.value,
        })
        .collect();
    merge_same_day(&monthly)
        .into_iter()
        .map(|p| (p.date, p.value))
        .collect()
}

/// Reaches with enough quality observations and a plausible WSE spread.
pub fn select_reaches(observations: &[SwotObservation], filter: &ObservationFilter) -> BTreeSet<SwordReachId> {
    let mut wse: BTreeMap<SwordReachId, Vec<f64>> = BTreeMap::new();
    for obs in observations.iter().filter(|o| filter.passes_quality(o)) {
        if let Some(w) = obs.wse {
            wse.entry(obs.reach_id).or_default().push(w);
        }
    }
    wse.into_iter()
        .filter(|(_, values)| values.len() >= filter.min_observations)
        .filter(|(_, values)| {
            let max = values.iter().cloned().fold(f64::MIN, f64::max);
            let min = values.iter().cloned().fold(f64::MAX, f64::min);
            max - min <= filter.max_wse_range
        })
        .map(|(id, _)| id)
        .collect()
}

/// Monthly volume anomaly of every selected reach.
///
/// Columns run from the month of the earliest to the month of the latest
/// observation of any reach. Selected reaches without volumes are left out.
pub fn volume_anomaly_table(
    volumes: &ReachSeriesTable,
    observations: &[SwotObservation],
    filter: &ObservationFilter,
) -> ReachSeriesTable {
    let mut observed: BTreeMap<SwordReachId, BTreeSet<NaiveDate>> = BTreeMap::new();
    for obs in observations {
        if let Some(date) = filter.observation_date(obs) {
            observed.entry(obs.reach_id).or_default().insert(date);
        }
    }
    let all_dates: BTreeSet<NaiveDate> = observed.values().flatten().copied().collect();
    let months: Vec<NaiveDate> = match (all_dates.first(), all_dates.last()) {
        (Some(first), Some(last)) => MonthRange::new(*first, *last).collect(),
        _ => Vec::new(),
    };
    let column_of: BTreeMap<NaiveDate, usize> = months.iter().enumerate().map(|(i, m)| (*m, i)).collect();

    let selected = select_reaches(observations, filter);
    info!("{} of {} observed reaches pass the filters", selected.len(), observed.len());
    let mut table = ReachSeriesTable::new(months.clone());
    let empty = BTreeSet::new();
    for reach_id in selected {
        let Some(row) = volumes.row(reach_id) else {
            debug!("No volumes for reach {reach_id}");
            continue;
        };
        let points: Vec<DataPoint> = volumes
            .dates
            .iter()
            .zip(row)
            .filter_map(|(date, v)| v.map(|value| DataPoint { date: *date, value }))
            .collect();
        let anomaly = reach_anomaly(&points, observed.get(&reach_id).unwrap_or(&empty));
        if anomaly.is_empty() {
            debug!("No valid volumes for reach {reach_id}");
            continue;
        }
        let mut values = vec![None; months.len()];
        for (month, value) in monthly_means(&anomaly) {
            if let Some(&i) = column_of.get(&month) {
                values[i] = Some(value);
            }
        }
        table.push_row(reach_id, values);
    }
    table
}
