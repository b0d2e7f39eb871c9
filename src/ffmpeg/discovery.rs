use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use crate::error::AppError;

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/opt/homebrew/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/opt/local/bin/ffmpeg",
];
#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    "C:\\ffmpeg\\bin\\ffmpeg.exe",
    "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
];
#[cfg(all(unix, not(target_os = "macos")))]
const INSTALL_LOCATIONS: &[&str] = &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"];
#[cfg(not(any(unix, target_os = "windows")))]
const INSTALL_LOCATIONS: &[&str] = &[];

static DISCOVERED_FFMPEG: OnceLock<PathBuf> = OnceLock::new();

/// Ask the platform's `which`/`where` for the first `ffmpeg` on `PATH`.
fn lookup_on_path() -> Option<PathBuf> {
    let tool = if cfg!(target_os = "windows") { "where" } else { "which" };
    let output = Command::new(tool).arg("ffmpeg").output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())?
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

fn discover_ffmpeg() -> Result<PathBuf, AppError> {
    let installed = INSTALL_LOCATIONS.iter().map(PathBuf::from).find(|p| p.exists());
    let (path, origin) = match installed {
        Some(path) => (path, "install location"),
        None => match lookup_on_path().filter(|p| p.exists()) {
            Some(path) => (path, "PATH"),
            None => {
                log::error!(
                    target: "clip_trim::ffmpeg::discovery",
                    "no ffmpeg binary on PATH or in {} install locations",
                    INSTALL_LOCATIONS.len()
                );
                return Err(AppError::FfmpegNotFound(
                    "FFMPEG_PATH not defined and FFmpeg was not found on this system".to_string(),
                ));
            }
        },
    };
    log::debug!(
        target: "clip_trim::ffmpeg::discovery",
        "using ffmpeg from {}: {}",
        origin,
        path.display()
    );
    Ok(path)
}

/// Binary to run for a trim job.
///
/// A configured path must exist; it is never silently replaced by a
/// discovered one. Without one, common install locations and then `PATH`
/// are searched, and the hit is cached for the process lifetime.
pub fn resolve_ffmpeg_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(path) = configured {
        if path.is_file() {
            log::trace!(
                target: "clip_trim::ffmpeg::discovery",
                "ffmpeg path from config: {}",
                path.display()
            );
            return Ok(path.to_path_buf());
        }
        return Err(AppError::MissingConfig(format!(
            "FFMPEG_PATH does not point to a file: {}",
            path.display()
        )));
    }

    if let Some(path) = DISCOVERED_FFMPEG.get() {
        return Ok(path.clone());
    }
    let path = discover_ffmpeg()?;
    Ok(DISCOVERED_FFMPEG.get_or_init(|| path).clone())
}
