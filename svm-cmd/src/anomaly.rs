//! Reach-level SWOT volume anomalies from area-fit volumes.

use crate::validate::require_all;
use anyhow::Context;
use log::info;
use std::path::Path;
use svm_core::observation::SwotObservation;
use svm_core::reach_series::{HeaderStyle, ReachSeriesTable};
use svm_data::anomaly::{volume_anomaly_table, ObservationFilter};
use svm_utils::dates::parse_datetime;

/// Last instant of the first SWOT science year.
pub const DEFAULT_END_TIME: &str = "2024-09-30T23:59:59Z";

pub fn run_anomaly(
    volumes_csv: &Path,
    observations_csv: &Path,
    anomaly_out: &Path,
    end_time: &str,
    min_observations: usize,
    max_wse_range: f64,
) -> anyhow::Result<()> {
    require_all(&[volumes_csv, observations_csv], &[])?;
    let filter = ObservationFilter {
        end_time: parse_datetime(end_time).with_context(|| format!("parsing end time {end_time}"))?,
        min_observations,
        max_wse_range,
    };

    info!("Reading files");
    let volumes = ReachSeriesTable::from_path(volumes_csv)?;
    let observations = SwotObservation::from_path(observations_csv)?;
    info!(
        "{} reaches with volumes, {} SWOT observations",
        volumes.len(),
        observations.len()
    );

    info!("Calculating SWOT volume anomalies");
    let table = volume_anomaly_table(&volumes, &observations, &filter);

    info!("Writing files");
    table.to_path(anomaly_out, HeaderStyle::Month)?;
    Ok(())
}
