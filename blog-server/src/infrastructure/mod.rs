use std::path::Path;

pub mod config;
pub mod logging;
pub mod security;

use config::AppConfig;

/// Loads `.env` (or `env_file` when given), installs the subscriber and then
/// reads the configuration, so `RUST_LOG` from the file applies and config
/// warnings are logged.
pub fn bootstrap(env_file: Option<&Path>) -> anyhow::Result<AppConfig> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    logging::init_logging();
    AppConfig::from_env()
}
