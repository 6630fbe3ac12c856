//! SVM CLI - compares SWOT river volume anomalies against MeanDRS.

use clap::Parser;
use log::error;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "svm-cli",
    version,
    about = "SWOT and MeanDRS river volume anomaly toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: svm_cmd::Command,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match svm_cmd::run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("ERROR - {e}");
            ExitCode::from(svm_cmd::exit_code(&e))
        }
    }
}
