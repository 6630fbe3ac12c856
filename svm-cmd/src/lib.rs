//! Command implementations for the SVM CLI.
//!
//! One subcommand per pipeline stage. Every stage checks all of its input
//! paths before reading anything, then loads its tables, runs the
//! `svm-data` computations and writes CSV files.

use clap::Subcommand;
use std::path::PathBuf;
use svm_core::error::VolumeError;

pub mod agreement;
pub mod anomaly;
pub mod comp;
pub mod counts;
pub mod load;
pub mod scale;
pub mod slice;
pub mod validate;

#[cfg(test)]
pub(crate) mod fixtures;

use load::TranslationInputs;

/// Exit status for missing or unreadable input paths.
pub const INPUT_PATH_EXIT: u8 = 22;

#[derive(Subcommand)]
pub enum Command {
    /// Monthly SWOT volume anomaly of each reach from EIV volumes
    Anomaly {
        /// Reach volumes from the area fit (`reach_id,<date>...`)
        volumes_csv: PathBuf,

        /// SWOT reach observations with quality fields
        observations_csv: PathBuf,

        /// Output path for the reach anomaly table
        anomaly_out: PathBuf,

        /// Observation times after this instant are moved back to it
        #[arg(long, default_value = anomaly::DEFAULT_END_TIME)]
        end_time: String,

        /// Minimum number of quality observations per reach
        #[arg(long, default_value_t = 5)]
        min_observations: usize,

        /// Maximum spread of quality WSE values per reach, meters
        #[arg(long, default_value_t = 20.0)]
        max_wse_range: f64,
    },

    /// Regional SWOT sums and the MeanDRS anomaly of the reaches SWOT saw
    Comp {
        /// SWOT reach anomaly table of the region
        anomaly_csv: PathBuf,

        #[command(flatten)]
        inputs: TranslationInputs,

        /// Output path for the regional SWOT series
        swot_out: PathBuf,

        /// Output path for the regional MeanDRS anomaly record
        reference_out: PathBuf,
    },

    /// Per-region and global monthly comparison of `comp` outputs
    CompSummary {
        /// Directory of regional SWOT series
        swot_dir: PathBuf,

        /// Directory of regional MeanDRS anomaly records
        reference_dir: PathBuf,

        /// Directory receiving one comparison file per region
        regional_out: PathBuf,

        /// Output path for the global comparison
        global_out: PathBuf,
    },

    /// MeanDRS anomaly of every translated SWORD river reach of a region
    Scale {
        #[command(flatten)]
        inputs: TranslationInputs,

        /// Output path for the full-coverage anomaly record
        full_out: PathBuf,
    },

    /// Scale SWOT sums for reaches SWOT did not see, by region and globally
    ScaleSummary {
        /// Directory of regional SWOT series
        swot_dir: PathBuf,

        /// Directory of regional MeanDRS anomaly records
        reference_dir: PathBuf,

        /// Directory of regional full-coverage anomaly records
        full_dir: PathBuf,

        /// Directory receiving one scale file per region
        regional_out: PathBuf,

        /// Output path for the global scale table
        global_out: PathBuf,
    },

    /// MeanDRS anomalies of the SWOT reaches over every year-long window
    Slice {
        /// SWOT reach anomaly table of the region
        anomaly_csv: PathBuf,

        #[command(flatten)]
        inputs: TranslationInputs,

        /// Output path for the regional slice table
        slice_out: PathBuf,
    },

    /// Sum regional slice tables into a global one
    SliceSummary {
        /// Directory of regional slice tables
        slice_dir: PathBuf,

        /// Output path for the global slice table
        global_out: PathBuf,
    },

    /// Magnitude ratios and lagged correlations of regional comparisons
    Agreement {
        /// Directory of regional comparison files
        comp_dir: PathBuf,

        /// Output path for the magnitude ratio table
        mag_out: PathBuf,

        /// Output path for the correlation table
        corr_out: PathBuf,
    },

    /// Count SWORD, observed and translated reaches of each region
    NumObs {
        /// Directory of regional reach anomaly tables
        anomaly_dir: PathBuf,

        /// Directory of regional translation tables
        translation_dir: PathBuf,

        /// Directory of SWORD reach tables
        sword_dir: PathBuf,

        /// Output path for the count table
        counts_out: PathBuf,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Anomaly {
            volumes_csv,
            observations_csv,
            anomaly_out,
            end_time,
            min_observations,
            max_wse_range,
        } => anomaly::run_anomaly(
            &volumes_csv,
            &observations_csv,
            &anomaly_out,
            &end_time,
            min_observations,
            max_wse_range,
        ),
        Command::Comp {
            anomaly_csv,
            inputs,
            swot_out,
            reference_out,
        } => comp::run_comp(&anomaly_csv, &inputs, &swot_out, &reference_out),
        Command::CompSummary {
            swot_dir,
            reference_dir,
            regional_out,
            global_out,
        } => comp::run_comp_summary(&swot_dir, &reference_dir, &regional_out, &global_out),
        Command::Scale { inputs, full_out } => scale::run_scale(&inputs, &full_out),
        Command::ScaleSummary {
            swot_dir,
            reference_dir,
            full_dir,
            regional_out,
            global_out,
        } => scale::run_scale_summary(&swot_dir, &reference_dir, &full_dir, &regional_out, &global_out),
        Command::Slice {
            anomaly_csv,
            inputs,
            slice_out,
        } => slice::run_slice(&anomaly_csv, &inputs, &slice_out),
        Command::SliceSummary {
            slice_dir,
            global_out,
        } => slice::run_slice_summary(&slice_dir, &global_out),
        Command::Agreement {
            comp_dir,
            mag_out,
            corr_out,
        } => agreement::run_agreement(&comp_dir, &mag_out, &corr_out),
        Command::NumObs {
            anomaly_dir,
            translation_dir,
            sword_dir,
            counts_out,
        } => counts::run_num_obs(&anomaly_dir, &translation_dir, &sword_dir, &counts_out),
    }
}

/// Process exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let input_path = err
        .chain()
        .any(|e| e.downcast_ref::<VolumeError>().is_some_and(VolumeError::is_input_path));
    if input_path {
        INPUT_PATH_EXIT
    } else {
        1
    }
}
