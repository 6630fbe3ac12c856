use crate::error::{open_input, VolumeError};
use crate::reach::MbReachId;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use log::debug;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use svm_utils::dates::{first_of_month, parse_header_date};

/// Cubic meters to cubic kilometers.
pub const M3_TO_KM3: f64 = 1e-9;

/// Column holding the MERIT-Basins reach id in reference volume tables.
pub const RIVID_COLUMN: &str = "rivid";

/// Simulated river volume for one region and one scenario: a 2-D array
/// indexed by (MERIT-Basins reach, monthly time step).
///
/// Expected CSV layout: `rivid,<date_1>,...,<date_T>`, volumes in m3.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCube {
    /// First-of-month date of each time step.
    pub dates: Vec<NaiveDate>,
    reach_ids: Vec<MbReachId>,
    index: HashMap<MbReachId, usize>,
    values: Vec<Vec<f64>>,
}

impl ReferenceCube {
    pub fn parse_reference_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, VolumeError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.get(0).map(str::trim) != Some(RIVID_COLUMN) {
            return Err(VolumeError::MissingColumn(RIVID_COLUMN.to_string()));
        }
        let dates = headers
            .iter()
            .skip(1)
            .map(|h| {
                parse_header_date(h)
                    .map(|d| first_of_month(&d))
                    .map_err(|_| VolumeError::malformed("header", h))
            })
            .collect::<Result<Vec<NaiveDate>, VolumeError>>()?;

        let mut rows = Vec::new();
        for row in rdr.records() {
            let record = row?;
            let id_str = record.get(0).unwrap_or("").trim();
            let reach_id = id_str
                .parse::<i64>()
                .or_else(|_| id_str.parse::<f64>().map(|f| f as i64))
                .map_err(|_| VolumeError::malformed(RIVID_COLUMN, id_str))?;
            let values = record
                .iter()
                .skip(1)
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|_| VolumeError::malformed(&reach_id.to_string(), v))
                })
                .collect::<Result<Vec<f64>, VolumeError>>()?;
            rows.push((reach_id, values));
        }
        debug!("Read {} reaches over {} steps", rows.len(), dates.len());
        Ok(Self::from_rows(dates, rows))
    }

    pub fn from_rows(dates: Vec<NaiveDate>, rows: Vec<(MbReachId, Vec<f64>)>) -> Self {
        let mut cube = ReferenceCube {
            dates,
            ..Default::default()
        };
        for (reach_id, values) in rows {
            match cube.index.get(&reach_id) {
                Some(&i) => cube.values[i] = values,
                None => {
                    cube.index.insert(reach_id, cube.reach_ids.len());
                    cube.reach_ids.push(reach_id);
                    cube.values.push(values);
                }
            }
        }
        cube
    }

    /// Number of time steps.
    pub fn time_len(&self) -> usize {
        self.dates.len()
    }

    pub fn reach_ids(&self) -> &[MbReachId] {
        &self.reach_ids
    }

    pub fn series(&self, reach_id: MbReachId) -> Option<&[f64]> {
        self.index.get(&reach_id).map(|&i| self.values[i].as_slice())
    }

    /// Each reach's series minus its own mean over the full record, in km3.
    pub fn anomaly_km3(&self) -> ReferenceCube {
        ReferenceCube {
            dates: self.dates.clone(),
            reach_ids: self.reach_ids.clone(),
            index: self.index.clone(),
            values: self.values.iter().map(|s| anomaly_of(s)).collect(),
        }
    }

    /// Steps `start..end` of every reach, `None` when the window runs past
    /// the record.
    pub fn window(&self, start: usize, end: usize) -> Option<ReferenceCube> {
        if start > end || end > self.time_len() {
            return None;
        }
        Some(ReferenceCube {
            dates: self.dates[start..end].to_vec(),
            reach_ids: self.reach_ids.clone(),
            index: self.index.clone(),
            values: self
                .values
                .iter()
                .map(|s| s.get(start..end).map(<[f64]>::to_vec).unwrap_or_default())
                .collect(),
        })
    }
}

fn anomaly_of(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }
    let mean = series.iter().sum::<f64>() / series.len() as f64;
    series.iter().map(|v| M3_TO_KM3 * (v - mean)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE_CSV: &str = "\
rivid,2000-01-01,2000-02-01,2000-03-01,2000-04-01
74000001,1e9,2e9,3e9,6e9
74000002,5e9,5e9,5e9,5e9
";

    #[test]
    fn test_parse_reference_csv() {
        let cube = ReferenceCube::parse_reference_csv(CUBE_CSV).unwrap();
        assert_eq!(cube.time_len(), 4);
        assert_eq!(cube.reach_ids(), &[74000001, 74000002]);
        assert_eq!(cube.series(74000001).unwrap()[3], 6e9);
        assert!(cube.series(1).is_none());
    }

    #[test]
    fn test_anomaly_is_zero_mean_km3() {
        let cube = ReferenceCube::parse_reference_csv(CUBE_CSV).unwrap();
        let anomaly = cube.anomaly_km3();
        let a = anomaly.series(74000001).unwrap();
        assert!((a[0] + 2.0).abs() < 1e-12);
        assert!((a[3] - 3.0).abs() < 1e-12);
        assert!(a.iter().sum::<f64>().abs() < 1e-12);
        assert!(anomaly.series(74000002).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_window_anomaly() {
        let cube = ReferenceCube::parse_reference_csv(CUBE_CSV).unwrap();
        let window = cube.window(1, 3).unwrap();
        assert_eq!(window.time_len(), 2);
        assert_eq!(window.dates[0], NaiveDate::from_ymd_opt(2000, 2, 1).unwrap());
        let w = window.anomaly_km3();
        let a = w.series(74000001).unwrap();
        assert!((a[0] + 0.5).abs() < 1e-12);
        assert!((a[1] - 0.5).abs() < 1e-12);
        assert!(cube.window(2, 9).is_none());
    }

    #[test]
    fn test_rejects_missing_rivid() {
        let err = ReferenceCube::parse_reference_csv("COMID,2000-01-01\n1,2\n").unwrap_err();
        assert!(matches!(err, VolumeError::MissingColumn(_)));
    }
}
