use std::process::ExitCode;

use tracing::error;

use resticprofile_metrics::config::{load_config, print_schema};
use resticprofile_metrics::startup::{read_report, run};
use resticprofile_metrics::utils::logger::init_logging;

const USAGE: &str = "usage: resticprofile-metrics <report.json | -> | --schema";

#[tokio::main]
async fn main() -> ExitCode {
    let report_path = match std::env::args().nth(1) {
        Some(arg) if arg == "--schema" => {
            return match print_schema() {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error printing schema: {}", e);
                    ExitCode::FAILURE
                }
            };
        }
        Some(path) => path,
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    let config = load_config();
    init_logging(
        &config.logging,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );

    let results = match read_report(&report_path) {
        Ok(results) => results,
        Err(e) => {
            error!(path = report_path.as_str(), error = %e, "cannot load run report");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, &results).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(profile = config.profile.as_str(), error = %e, "metrics export failed");
            ExitCode::FAILURE
        }
    }
}
