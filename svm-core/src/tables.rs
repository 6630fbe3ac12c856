//! Fixed-schema tables exchanged between pipeline stages.
//!
//! Missing values are written as empty fields. On read, empty fields and
//! `NaN` tokens both come back as `None`.

use crate::error::{open_input, VolumeError};
use crate::scenario::Scenario;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use svm_utils::dates::{format_date, parse_header_date};

/// Reads an optional float, mapping NaN to `None`.
pub(crate) fn missing<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<f64>::deserialize(d)?;
    Ok(v.filter(|x| !x.is_nan()))
}

/// A row type with a fixed CSV header.
pub trait TableRow: Serialize + DeserializeOwned {
    const HEADER: &'static [&'static str];
}

/// Regional SWOT volume anomaly sum for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwotSeriesRow {
    pub dates: NaiveDate,
    #[serde(rename = "V_SWOT", deserialize_with = "missing", default)]
    pub v_swot: Option<f64>,
    /// Number of reaches contributing to the sum.
    pub n_reach: usize,
}

impl TableRow for SwotSeriesRow {
    const HEADER: &'static [&'static str] = &["dates", "V_SWOT", "n_reach"];
}

/// Weighted MeanDRS anomaly of the SWOT-observed reaches for one record step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecordRow {
    pub dates: NaiveDate,
    #[serde(rename = "mV_hig_anom", deserialize_with = "missing", default)]
    pub hig: Option<f64>,
    #[serde(rename = "mV_nrm_anom", deserialize_with = "missing", default)]
    pub nrm: Option<f64>,
    #[serde(rename = "mV_low_anom", deserialize_with = "missing", default)]
    pub low: Option<f64>,
}

impl TableRow for ReferenceRecordRow {
    const HEADER: &'static [&'static str] = &["dates", "mV_hig_anom", "mV_nrm_anom", "mV_low_anom"];
}

/// Weighted MeanDRS anomaly of every translated type 1/5 reach for one record step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullCoverageRow {
    pub dates: NaiveDate,
    #[serde(rename = "mV_low_anom_ms", deserialize_with = "missing", default)]
    pub low: Option<f64>,
    #[serde(rename = "mV_nrm_anom_ms", deserialize_with = "missing", default)]
    pub nrm: Option<f64>,
    #[serde(rename = "mV_hig_anom_ms", deserialize_with = "missing", default)]
    pub hig: Option<f64>,
}

impl TableRow for FullCoverageRow {
    const HEADER: &'static [&'static str] = &["dates", "mV_low_anom_ms", "mV_nrm_anom_ms", "mV_hig_anom_ms"];
}

/// Regional or global SWOT / MeanDRS comparison for one SWOT month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub dates: NaiveDate,
    pub mon: u32,
    #[serde(rename = "V_SWOT", deserialize_with = "missing", default)]
    pub v_swot: Option<f64>,
    #[serde(rename = "mV_low_anom_mean", deserialize_with = "missing", default)]
    pub low_mean: Option<f64>,
    #[serde(rename = "mV_low_anom_std", deserialize_with = "missing", default)]
    pub low_std: Option<f64>,
    #[serde(rename = "mV_nrm_anom_mean", deserialize_with = "missing", default)]
    pub nrm_mean: Option<f64>,
    #[serde(rename = "mV_nrm_anom_std", deserialize_with = "missing", default)]
    pub nrm_std: Option<f64>,
    #[serde(rename = "mV_hig_anom_mean", deserialize_with = "missing", default)]
    pub hig_mean: Option<f64>,
    #[serde(rename = "mV_hig_anom_std", deserialize_with = "missing", default)]
    pub hig_std: Option<f64>,
}

impl ComparisonRow {
    pub fn mean(&self, scenario: Scenario) -> Option<f64> {
        match scenario {
            Scenario::Low => self.low_mean,
            Scenario::Nrm => self.nrm_mean,
            Scenario::Hig => self.hig_mean,
        }
    }
}

impl TableRow for ComparisonRow {
    const HEADER: &'static [&'static str] = &[
        "dates",
        "mon",
        "V_SWOT",
        "mV_low_anom_mean",
        "mV_low_anom_std",
        "mV_nrm_anom_mean",
        "mV_nrm_anom_std",
        "mV_hig_anom_mean",
        "mV_hig_anom_std",
    ];
}

/// SWOT anomaly scaled to full MERIT-Basins coverage for one SWOT month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleRow {
    pub dates: NaiveDate,
    #[serde(rename = "V_SWOT", deserialize_with = "missing", default)]
    pub v_swot: Option<f64>,
    #[serde(rename = "mV_low_anom_swot", deserialize_with = "missing", default)]
    pub low_swot: Option<f64>,
    #[serde(rename = "mV_low_anom_ms", deserialize_with = "missing", default)]
    pub low_ms: Option<f64>,
    #[serde(rename = "V_SWOT_ms", deserialize_with = "missing", default)]
    pub v_swot_ms: Option<f64>,
}

impl TableRow for ScaleRow {
    const HEADER: &'static [&'static str] = &["dates", "V_SWOT", "mV_low_anom_swot", "mV_low_anom_ms", "V_SWOT_ms"];
}

/// Ratio of SWOT to MeanDRS annual volume range for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeRatioRow {
    pub pfaf: String,
    #[serde(deserialize_with = "missing", default)]
    pub mag_rat_low: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub mag_rat_nrm: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub mag_rat_hig: Option<f64>,
    pub best_scen: Option<Scenario>,
}

impl TableRow for MagnitudeRatioRow {
    const HEADER: &'static [&'static str] = &["pfaf", "mag_rat_low", "mag_rat_nrm", "mag_rat_hig", "best_scen"];
}

/// Circular lag correlations between SWOT and MeanDRS for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRow {
    pub pfaf: String,
    #[serde(deserialize_with = "missing", default)]
    pub corr_neg5: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_neg4: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_neg3: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_neg2: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_neg1: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_0: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos1: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos2: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos3: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos4: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos5: Option<f64>,
    #[serde(deserialize_with = "missing", default)]
    pub corr_pos6: Option<f64>,
    pub best_lag: Option<i32>,
}

impl CorrelationRow {
    /// Build a row from correlations ordered by lag, -5 through +6.
    pub fn from_lags(pfaf: String, corr: [Option<f64>; 12], best_lag: Option<i32>) -> Self {
        let [corr_neg5, corr_neg4, corr_neg3, corr_neg2, corr_neg1, corr_0, corr_pos1, corr_pos2, corr_pos3, corr_pos4, corr_pos5, corr_pos6] =
            corr;
        CorrelationRow {
            pfaf,
            corr_neg5,
            corr_neg4,
            corr_neg3,
            corr_neg2,
            corr_neg1,
            corr_0,
            corr_pos1,
            corr_pos2,
            corr_pos3,
            corr_pos4,
            corr_pos5,
            corr_pos6,
            best_lag,
        }
    }
}

impl TableRow for CorrelationRow {
    const HEADER: &'static [&'static str] = &[
        "pfaf", "corr_neg5", "corr_neg4", "corr_neg3", "corr_neg2", "corr_neg1", "corr_0", "corr_pos1",
        "corr_pos2", "corr_pos3", "corr_pos4", "corr_pos5", "corr_pos6", "best_lag",
    ];
}

/// Reach counts for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationCountRow {
    pub pfaf: String,
    /// SWORD reaches other than ghost reaches.
    pub sword: usize,
    /// SWORD type 1/5 reaches.
    pub sw_type1: usize,
    /// Reaches with a SWOT volume anomaly.
    #[serde(rename = "V_anom")]
    pub v_anom: usize,
    /// Reaches with a SWOT volume anomaly and a MERIT-Basins translation.
    #[serde(rename = "V_anom_ms")]
    pub v_anom_ms: usize,
}

impl TableRow for ObservationCountRow {
    const HEADER: &'static [&'static str] = &["pfaf", "sword", "sw_type1", "V_anom", "V_anom_ms"];
}

/// Write rows under the row type's header. An empty slice still writes the header.
pub fn write_rows<T: TableRow, W: Write>(writer: W, rows: &[T]) -> Result<(), VolumeError> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(T::HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_rows_to_path<T: TableRow, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<(), VolumeError> {
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)
}

pub fn read_rows<T: TableRow, R: Read>(reader: R) -> Result<Vec<T>, VolumeError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_rows_from_path<T: TableRow, P: AsRef<Path>>(path: P) -> Result<Vec<T>, VolumeError> {
    let file = open_input(path.as_ref())?;
    read_rows(file)
}

/// A date-indexed table with an arbitrary set of named value columns,
/// e.g. the per-window slice table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Vec<Option<f64>>)>,
}

impl ColumnTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        ColumnTable {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn push_column(&mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) {
        values.resize(self.dates.len(), None);
        self.columns.push((name.into(), values));
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn parse_column_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, VolumeError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.get(0).map(str::trim) != Some("dates") {
            return Err(VolumeError::MissingColumn("dates".to_string()));
        }
        let names: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
        let mut dates = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
        for row in rdr.records() {
            let record = row?;
            let d = record.get(0).unwrap_or("").trim();
            dates.push(parse_header_date(d).map_err(|_| VolumeError::malformed("dates", d))?);
            for (i, name) in names.iter().enumerate() {
                let cell = record.get(i + 1).unwrap_or("").trim();
                let v = if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                    None
                } else {
                    Some(cell.parse::<f64>().map_err(|_| VolumeError::malformed(name, cell))?)
                };
                values[i].push(v);
            }
        }
        Ok(ColumnTable {
            dates,
            columns: names.into_iter().zip(values).collect(),
        })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), VolumeError> {
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
        let mut header = vec!["dates".to_string()];
        header.extend(self.columns.iter().map(|(n, _)| n.clone()));
        wtr.write_record(&header)?;
        for (i, date) in self.dates.iter().enumerate() {
            let mut record = vec![format_date(date)];
            record.extend(
                self.columns
                    .iter()
                    .map(|(_, v)| v[i].map(|x| x.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), VolumeError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}
