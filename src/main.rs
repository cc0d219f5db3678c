use std::process::ExitCode;

use wq_plots::config::{AnalysisConfig, DEFAULT_CONFIG_PATH};
use wq_plots::logging::{self, Stage, init_logger};
use wq_plots::report::{print_summary, run};

fn main() -> ExitCode {
    let config = match AnalysisConfig::load_or_default(DEFAULT_CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", DEFAULT_CONFIG_PATH, e);
            return ExitCode::FAILURE;
        }
    };

    // Level was validated when the config was parsed.
    let level = config.level().unwrap_or(logging::LogLevel::Info);
    init_logger(level, config.log_file.as_deref(), config.console_timestamps);

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        logging::error(Stage::System, None, &format!("Cannot create {}: {}", config.output_dir.display(), e));
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(report) => {
            print_summary(&report);
            if report.summary.plots_failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            logging::error(Stage::System, None, &format!("Run aborted: {}", e));
            ExitCode::FAILURE
        }
    }
}
