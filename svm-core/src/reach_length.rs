use crate::error::{open_input, VolumeError};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// MERIT-Basins reach id column.
pub const MB_ID_COLUMN: &str = "COMID";
/// MERIT-Basins reach length column, in kilometers.
pub const MB_LENGTH_COLUMN: &str = "lengthkm";
/// SWORD reach id column.
pub const SWORD_ID_COLUMN: &str = "reach_id";
/// SWORD reach length column, in meters.
pub const SWORD_LENGTH_COLUMN: &str = "reach_len";

/// Reach id to reach length (meters) lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReachLengths {
    lengths: HashMap<i64, f64>,
}

impl ReachLengths {
    /// Parse a MERIT-Basins reach table (`COMID,lengthkm`), converting to meters.
    pub fn parse_mb_length_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes(), MB_ID_COLUMN, MB_LENGTH_COLUMN, 1000.0)
    }

    /// Parse a SWORD reach table (`reach_id,reach_len`), already in meters.
    pub fn parse_sword_length_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes(), SWORD_ID_COLUMN, SWORD_LENGTH_COLUMN, 1.0)
    }

    pub fn mb_from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file, MB_ID_COLUMN, MB_LENGTH_COLUMN, 1000.0)
    }

    pub fn sword_from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file, SWORD_ID_COLUMN, SWORD_LENGTH_COLUMN, 1.0)
    }

    fn from_reader<R: Read>(
        reader: R,
        id_column: &str,
        length_column: &str,
        to_meters: f64,
    ) -> Result<Self, VolumeError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let id_index = headers
            .iter()
            .position(|h| h.trim() == id_column)
            .ok_or_else(|| VolumeError::MissingColumn(id_column.to_string()))?;
        let length_index = headers
            .iter()
            .position(|h| h.trim() == length_column)
            .ok_or_else(|| VolumeError::MissingColumn(length_column.to_string()))?;

        let mut lengths = HashMap::new();
        for row in rdr.records() {
            let record = row?;
            let id_str = record.get(id_index).unwrap_or("").trim();
            let length_str = record.get(length_index).unwrap_or("").trim();
            let id = id_str
                .parse::<i64>()
                .or_else(|_| id_str.parse::<f64>().map(|f| f as i64))
                .map_err(|_| VolumeError::malformed(id_column, id_str))?;
            let length = length_str
                .parse::<f64>()
                .map_err(|_| VolumeError::malformed(length_column, length_str))?;
            lengths.insert(id, length * to_meters);
        }
        Ok(ReachLengths { lengths })
    }

    pub fn get(&self, reach_id: i64) -> Option<f64> {
        self.lengths.get(&reach_id).copied()
    }

    pub fn insert(&mut self, reach_id: i64, length_m: f64) {
        self.lengths.insert(reach_id, length_m);
    }

    /// Merge another region's lengths into this lookup.
    pub fn extend(&mut self, other: ReachLengths) {
        self.lengths.extend(other.lengths);
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn reach_ids(&self) -> impl Iterator<Item = &i64> {
        self.lengths.keys()
    }
}

impl FromIterator<(i64, f64)> for ReachLengths {
    fn from_iter<T: IntoIterator<Item = (i64, f64)>>(iter: T) -> Self {
        ReachLengths {
            lengths: iter.into_iter().collect(),
        }
    }
}
