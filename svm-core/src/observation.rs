use crate::error::{open_input, VolumeError};
use crate::reach::SwordReachId;
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use svm_utils::dates::parse_datetime;

/// A single SWOT reach-level observation with the quality fields the
/// anomaly filter looks at. Other columns of the download are ignored.
///
/// Unparseable numeric cells are read as missing, and missing values fail
/// every quality test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwotObservation {
    pub reach_id: SwordReachId,
    /// Observation timestamp as downloaded (ISO 8601).
    pub time: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub reach_q: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub xovr_cal_q: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub dark_frac: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ice_clim_f: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub obs_frac_n: Option<f64>,
    /// Cross-track distance from nadir, meters.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub xtrk_dist: Option<f64>,
    /// Water surface elevation, meters.
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub wse: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub width: Option<f64>,
}

impl SwotObservation {
    /// Observation time in UTC, `None` when the timestamp does not parse.
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        parse_datetime(&self.time).ok()
    }

    pub fn parse_observations_csv(csv_object: &str) -> Result<Vec<SwotObservation>, VolumeError> {
        Self::from_reader(csv_object.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SwotObservation>, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Vec<SwotObservation>, VolumeError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut observations = Vec::new();
        for row in rdr.deserialize() {
            let observation: SwotObservation = row?;
            observations.push(observation);
        }
        Ok(observations)
    }
}
