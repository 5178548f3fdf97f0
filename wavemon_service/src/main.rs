//! One-shot entry point for scheduled runs.
//!
//! Always exits with status 0: degraded runs are reported through the
//! `status` / `data_quality` fields of the published JSON, never through
//! the process exit code.

use wavemon_service::config::ScrapeConfig;
use wavemon_service::logging::{self, Stage};
use wavemon_service::pipeline;

fn main() {
    let (config, config_error) = ScrapeConfig::load();

    logging::init_logger(config.min_log_level(), config.log_file.as_deref(), true);

    if let Some(e) = config_error {
        logging::warn(Stage::System, &format!("{}; using defaults", e));
    }

    if let Err(e) = pipeline::run_once(&config) {
        logging::error(
            Stage::Store,
            &format!(
                "Could not write artifacts to {}: {}",
                config.output_dir.display(),
                e
            ),
        );
    }
}
