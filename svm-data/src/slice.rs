//! Reference anomalies recomputed over every year-long window of the record.

use crate::aggregate::{weighted_sum, ReferenceSet};
use crate::normalize::NormalizedTranslation;
use crate::swot::sum_series;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use std::collections::HashMap;
use svm_core::error::VolumeError;
use svm_core::scenario::{Scenario, ScenarioSet};
use svm_core::tables::ColumnTable;
use svm_utils::dates::months_between;
use svm_utils::stats::recenter;

/// Name of the SWOT column of a slice table.
pub const SWOT_COLUMN: &str = "V_SWOT";

/// Window starts advance by a full year.
const WINDOW_STEP: usize = 12;

/// A window `start..end` of the reference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceWindow {
    pub start: usize,
    pub end: usize,
    /// Year of the first step, used in column names.
    pub year: i32,
}

/// Windows covering the span of the SWOT months, starting at each record
/// step whose calendar month matches the first SWOT month.
pub fn slice_windows(record_dates: &[NaiveDate], swot_months: &[NaiveDate]) -> Vec<SliceWindow> {
    let (Some(first), Some(last)) = (swot_months.first(), swot_months.last()) else {
        return Vec::new();
    };
    let span = months_between(first, last);
    if span < 0 {
        return Vec::new();
    }
    let len = span as usize + 1;
    let Some(mut start) = record_dates.iter().position(|d| d.month() == first.month()) else {
        return Vec::new();
    };
    let mut windows = Vec::new();
    while start + len <= record_dates.len() {
        windows.push(SliceWindow {
            start,
            end: start + len,
            year: record_dates[start].year(),
        });
        start += WINDOW_STEP;
    }
    windows
}

/// Per-window sums for one scenario, one entry per SWOT month.
pub type WindowSeries = Vec<Option<f64>>;

/// Weighted reference anomaly of the SWOT reaches for each window.
///
/// Anomalies are taken about each reach's mean over the window. SWOT month
/// `i` reads the window step as many months after the window start as it
/// lies after the first SWOT month. Translations are shared by all windows.
pub fn slice_record(
    reference: &ReferenceSet,
    windows: &[SliceWindow],
    swot_months: &[NaiveDate],
    translations: &[Option<NormalizedTranslation>],
) -> Result<Vec<ScenarioSet<WindowSeries>>, VolumeError> {
    let offsets = month_offsets(swot_months)?;
    let mut out = Vec::with_capacity(windows.len());
    for window in windows {
        let anomalies = reference
            .window(window.start, window.end)
            .ok_or_else(|| VolumeError::TimeAxis(format!("window {}..{} past record", window.start, window.end)))?
            .anomalies();
        let mut series: ScenarioSet<WindowSeries> = ScenarioSet::from_fn(|_| vec![None; swot_months.len()]);
        for (i, (&offset, translation)) in offsets.iter().zip(translations).enumerate() {
            let Some(translation) = translation else {
                continue;
            };
            if offset >= window.end - window.start {
                return Err(VolumeError::TimeAxis(format!(
                    "SWOT month {} lies past the {} window",
                    swot_months[i], window.year
                )));
            }
            for scenario in Scenario::ALL {
                series.get_mut(scenario)[i] = Some(weighted_sum(&anomalies, scenario, translation, offset)?);
            }
        }
        debug!("Window {} {}..{}", window.year, window.start, window.end);
        out.push(series);
    }
    info!("Computed {} yearly slices", out.len());
    Ok(out)
}

/// Offset in months of each SWOT month from the first. No month may come
/// before the first one.
fn month_offsets(swot_months: &[NaiveDate]) -> Result<Vec<usize>, VolumeError> {
    let Some(first) = swot_months.first() else {
        return Ok(Vec::new());
    };
    swot_months
        .iter()
        .map(|month| {
            usize::try_from(months_between(first, month)).map_err(|_| {
                VolumeError::TimeAxis(format!("SWOT month {month} precedes the first SWOT month {first}"))
            })
        })
        .collect()
}

/// Column name of one scenario and window, e.g. `mV_hig_1990`.
pub fn slice_column(scenario: Scenario, year: i32) -> String {
    format!("mV_{scenario}_{year}")
}

/// Assemble the slice table: SWOT sums, then every hig window, every nrm
/// window and every low window.
pub fn slice_table(
    swot_months: &[NaiveDate],
    v_swot: &[Option<f64>],
    windows: &[SliceWindow],
    record: &[ScenarioSet<WindowSeries>],
) -> ColumnTable {
    let mut table = ColumnTable::new(swot_months.to_vec());
    table.push_column(SWOT_COLUMN, v_swot.to_vec());
    for scenario in [Scenario::Hig, Scenario::Nrm, Scenario::Low] {
        for (window, series) in windows.iter().zip(record) {
            table.push_column(slice_column(scenario, window.year), series.get(scenario).clone());
        }
    }
    table
}

/// Sum non-empty slice tables column by column, then re-centre every column.
/// Columns are those of the first non-empty table.
pub fn global_slice(tables: &[ColumnTable]) -> ColumnTable {
    let tables: Vec<&ColumnTable> = tables.iter().filter(|t| !t.is_empty()).collect();
    let Some(first) = tables.first() else {
        return ColumnTable::default();
    };
    let len = first.dates.len();
    let mut global = ColumnTable::new(first.dates.clone());
    let lookups: Vec<HashMap<&str, &[Option<f64>]>> = tables
        .iter()
        .map(|t| t.columns.iter().map(|(n, v)| (n.as_str(), v.as_slice())).collect())
        .collect();
    for name in first.column_names() {
        let regional: Vec<Vec<Option<f64>>> = lookups
            .iter()
            .filter_map(|l| l.get(name).map(|v| v.to_vec()))
            .collect();
        let mut total = sum_series(&regional, len);
        recenter(&mut total);
        global.push_column(name, total);
    }
    global
}
