use std::time::Duration;

use clip_trim_core::config::ServerConfig;
use clip_trim_core::ffmpeg::cleanup_old_temp_files;
use clip_trim_core::{logging, server};

const STARTUP_CLEANUP_MAX_AGE_HOURS: u64 = 24;

#[tokio::main]
async fn main() -> Result<(), clip_trim_core::error::AppError> {
    logging::init();

    let config = ServerConfig::from_env()?;
    log::debug!(target: "clip_trim::server", "Config: {:?}", config);

    let max_age = Duration::from_secs(STARTUP_CLEANUP_MAX_AGE_HOURS * 3600);
    if let Err(e) = cleanup_old_temp_files(&config.temp_dir, max_age) {
        log::warn!(
            target: "clip_trim::server",
            "Startup cleanup of {} failed: {}",
            config.temp_dir.display(),
            e
        );
    }

    server::run(config).await
}
