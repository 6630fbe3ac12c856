use crate::error::{open_input, VolumeError};
use crate::reach::SwordReachId;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use svm_utils::dates::{format_date, format_month, parse_header_date};

/// Column holding the SWORD reach id.
pub const REACH_ID_COLUMN: &str = "reach_id";

/// How date headers are written.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HeaderStyle {
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
}

/// A wide table of per-reach time series: one row per SWORD reach, one
/// column per date, each cell a value or missing.
///
/// Used for SWOT monthly volume anomalies (km3) and for the per-date reach
/// volumes produced by the area-fit stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReachSeriesTable {
    pub dates: Vec<NaiveDate>,
    reach_ids: Vec<SwordReachId>,
    index: HashMap<SwordReachId, usize>,
    values: Vec<Vec<Option<f64>>>,
}

fn parse_cell(column: &str, value: &str) -> Result<Option<f64>, VolumeError> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    v.parse::<f64>()
        .map(|f| if f.is_nan() { None } else { Some(f) })
        .map_err(|_| VolumeError::malformed(column, v))
}

impl ReachSeriesTable {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        ReachSeriesTable {
            dates,
            ..Default::default()
        }
    }

    /// Parse a wide reach table from a CSV string.
    ///
    /// Expected header: `reach_id,<date>,<date>,...` with dates as `YYYY-MM`,
    /// `YYYY-MM-DD`, or full timestamps.
    pub fn parse_reach_series_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, VolumeError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.get(0).map(str::trim) != Some(REACH_ID_COLUMN) {
            return Err(VolumeError::MissingColumn(REACH_ID_COLUMN.to_string()));
        }
        let columns: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();
        let dates = columns
            .iter()
            .map(|h| parse_header_date(h).map_err(|_| VolumeError::malformed("header", h)))
            .collect::<Result<Vec<NaiveDate>, VolumeError>>()?;

        let mut table = ReachSeriesTable::new(dates);
        for row in rdr.records() {
            let record = row?;
            let id_str = record.get(0).unwrap_or("").trim();
            let reach_id = id_str
                .parse::<i64>()
                .or_else(|_| id_str.parse::<f64>().map(|f| f as i64))
                .map_err(|_| VolumeError::malformed(REACH_ID_COLUMN, id_str))?;
            let values = columns
                .iter()
                .enumerate()
                .map(|(i, name)| parse_cell(name, record.get(i + 1).unwrap_or("")))
                .collect::<Result<Vec<_>, VolumeError>>()?;
            table.push_row(reach_id, values);
        }
        Ok(table)
    }

    /// Add a reach row, replacing any existing row for the same reach.
    /// The row is padded or truncated to the number of dates.
    pub fn push_row(&mut self, reach_id: SwordReachId, mut values: Vec<Option<f64>>) {
        values.resize(self.dates.len(), None);
        match self.index.get(&reach_id) {
            Some(&i) => self.values[i] = values,
            None => {
                self.index.insert(reach_id, self.reach_ids.len());
                self.reach_ids.push(reach_id);
                self.values.push(values);
            }
        }
    }

    pub fn reach_ids(&self) -> &[SwordReachId] {
        &self.reach_ids
    }

    pub fn contains(&self, reach_id: SwordReachId) -> bool {
        self.index.contains_key(&reach_id)
    }

    pub fn row(&self, reach_id: SwordReachId) -> Option<&[Option<f64>]> {
        self.index.get(&reach_id).map(|&i| self.values[i].as_slice())
    }

    pub fn value(&self, reach_id: SwordReachId, column: usize) -> Option<f64> {
        self.row(reach_id).and_then(|r| r.get(column).copied().flatten())
    }

    /// Reaches with a value in the given column, in table order.
    pub fn observed_reaches(&self, column: usize) -> Vec<SwordReachId> {
        self.reach_ids
            .iter()
            .zip(&self.values)
            .filter(|(_, row)| row.get(column).copied().flatten().is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reach_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reach_ids.is_empty()
    }

    /// Write the table as CSV; missing values are written as empty fields.
    pub fn write_csv<W: Write>(&self, writer: W, style: HeaderStyle) -> Result<(), VolumeError> {
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
        let mut header = vec![REACH_ID_COLUMN.to_string()];
        header.extend(self.dates.iter().map(|d| match style {
            HeaderStyle::Month => format_month(d),
            HeaderStyle::Day => format_date(d),
        }));
        wtr.write_record(&header)?;
        for (id, row) in self.reach_ids.iter().zip(&self.values) {
            let mut record = vec![id.to_string()];
            record.extend(row.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_path<P: AsRef<Path>>(&self, path: P, style: HeaderStyle) -> Result<(), VolumeError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file, style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANOMALY_CSV: &str = "\
reach_id,2023-10,2023-11,2023-12
74230000011,0.5,,-0.25
74230000021,NaN,1.0,
";

    #[test]
    fn test_parse_reach_series_csv() {
        let table = ReachSeriesTable::parse_reach_series_csv(ANOMALY_CSV).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.dates[0], NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
        assert_eq!(table.value(74230000011, 0), Some(0.5));
        assert_eq!(table.value(74230000011, 1), None);
        assert_eq!(table.value(74230000021, 0), None);
        assert_eq!(table.observed_reaches(1), vec![74230000021]);
        assert_eq!(table.observed_reaches(2), vec![74230000011]);
    }

    #[test]
    fn test_write_then_read() {
        let table = ReachSeriesTable::parse_reach_series_csv(ANOMALY_CSV).unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer, HeaderStyle::Month).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("reach_id,2023-10,2023-11,2023-12\n"));
        let reread = ReachSeriesTable::parse_reach_series_csv(&text).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn test_malformed_cell() {
        let err = ReachSeriesTable::parse_reach_series_csv("reach_id,2023-10\n1,abc\n").unwrap_err();
        assert!(matches!(err, VolumeError::MalformedValue { .. }));
    }

    #[test]
    fn test_push_row_pads() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        ];
        let mut table = ReachSeriesTable::new(dates);
        table.push_row(5, vec![Some(1.0)]);
        assert_eq!(table.row(5).unwrap(), &[Some(1.0), None]);
        table.push_row(5, vec![None, Some(2.0)]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(5, 1), Some(2.0));
    }
}
