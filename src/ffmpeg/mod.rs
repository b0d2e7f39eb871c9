mod builder;
pub mod discovery;
mod error;
mod progress;
mod runner;
mod temp;

pub use builder::{build_trim_command, even_crop, format_args_for_display_multiline};
pub use error::{FfmpegErrorPayload, parse_ffmpeg_error};
pub use progress::{parse_out_time, progress_fraction};
pub use runner::run_ffmpeg_blocking;
pub use temp::{TEMP_PREFIX, TempArtifacts, cleanup_old_temp_files};

use std::path::PathBuf;

use crate::editor::crop::CropPixels;

/// One trim/crop re-encode: `duration_secs` of `input` starting at
/// `start_secs`, optionally cropped, written to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub crop: Option<CropPixels>,
}

/// Path to string for FFmpeg args or logging.
pub fn path_to_string(path: &(impl AsRef<std::path::Path> + ?Sized)) -> String {
    path.as_ref().to_string_lossy().to_string()
}
