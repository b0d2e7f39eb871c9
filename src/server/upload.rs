use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::io::AsyncWriteExt;

use super::AppState;
use crate::editor::crop::CropPixels;
use crate::error::AppError;
use crate::export::{DEFAULT_DOWNLOAD_NAME, DEFAULT_DOWNLOAD_TYPE};
use crate::ffmpeg::{
    TempArtifacts, TrimJob, build_trim_command, discovery::resolve_ffmpeg_path,
    format_args_for_display_multiline, run_ffmpeg_blocking,
};

const CROP_FIELDS: [&str; 4] = ["cropX", "cropY", "cropWidth", "cropHeight"];

/// Validated text fields of an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub start_secs: f64,
    pub end_secs: f64,
    pub crop: Option<CropPixels>,
}

impl TrimRequest {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let start_secs = parse_seconds(fields, "startTime")?;
        let end_secs = parse_seconds(fields, "endTime")?;
        if start_secs < 0.0 {
            return Err(AppError::invalid_upload("startTime must not be negative"));
        }
        if end_secs <= start_secs {
            return Err(AppError::invalid_upload(
                "endTime must be greater than startTime",
            ));
        }

        let present = CROP_FIELDS.iter().filter(|k| fields.contains_key(**k)).count();
        let crop = match present {
            0 => None,
            4 => {
                let [x, y, width, height] = CROP_FIELDS.map(|key| parse_pixels(fields, key));
                let crop = CropPixels {
                    x: x?,
                    y: y?,
                    width: width?,
                    height: height?,
                };
                if crop.width == 0 || crop.height == 0 {
                    return Err(AppError::invalid_upload("Crop width and height must be positive"));
                }
                Some(crop)
            }
            _ => {
                return Err(AppError::invalid_upload(
                    "Crop needs cropX, cropY, cropWidth and cropHeight together",
                ));
            }
        };

        Ok(Self {
            start_secs,
            end_secs,
            crop,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

fn parse_seconds(fields: &HashMap<String, String>, key: &str) -> Result<f64, AppError> {
    let raw = fields
        .get(key)
        .ok_or_else(|| AppError::invalid_upload(format!("Missing {key}")))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::invalid_upload(format!("Invalid {key}: {raw:?}")))
}

fn parse_pixels(fields: &HashMap<String, String>, key: &str) -> Result<u32, AppError> {
    let raw = fields.get(key).map(|v| v.trim()).unwrap_or_default();
    raw.parse::<u32>()
        .map_err(|_| AppError::invalid_upload(format!("Invalid {key}: {raw:?}")))
}

async fn save_field(mut field: Field<'_>, path: &Path) -> Result<u64, AppError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Stream the form: the `video` part goes straight to `input`, text parts
/// are collected. Exactly one video part is accepted.
async fn read_upload(
    multipart: &mut Multipart,
    input: &Path,
) -> Result<HashMap<String, String>, AppError> {
    let mut fields = HashMap::new();
    let mut video_parts = 0;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "video" {
            video_parts += 1;
            if video_parts > 1 {
                return Err(AppError::invalid_upload("Exactly one video file is expected"));
            }
            let file_name = field.file_name().unwrap_or("<unnamed>").to_string();
            let bytes = save_field(field, input).await?;
            log::debug!(
                target: "clip_trim::server::upload",
                "Received video {:?} ({} bytes)",
                file_name,
                bytes
            );
        } else {
            fields.insert(name, field.text().await?);
        }
    }

    if video_parts == 0 {
        return Err(AppError::invalid_upload("No file uploaded"));
    }
    Ok(fields)
}

/// `POST /api/upload`: trim (and optionally crop) the uploaded clip and
/// return it as an MP4 attachment. Temp files are removed on every path.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let ffmpeg = resolve_ffmpeg_path(state.config.ffmpeg_path.as_deref())?;

    let mut artifacts = TempArtifacts::new(&state.config.temp_dir);
    let input = artifacts.path("input");
    let output = artifacts.path("output.mp4");

    let fields = read_upload(&mut multipart, &input).await?;
    let request = TrimRequest::from_fields(&fields)?;
    log::info!(
        target: "clip_trim::server::upload",
        "Trim request: start={}s end={}s crop={:?}",
        request.start_secs,
        request.end_secs,
        request.crop
    );

    let _permit = state
        .jobs
        .acquire()
        .await
        .map_err(|e| AppError::from(format!("Job queue closed: {e}")))?;

    let job = TrimJob {
        input,
        output: output.clone(),
        start_secs: request.start_secs,
        duration_secs: request.duration_secs(),
        crop: request.crop,
    };
    run_trim_job(ffmpeg, job).await?;

    let bytes = tokio::fs::read(&output).await?;
    log::info!(
        target: "clip_trim::server::upload",
        "Trim finished: {} bytes",
        bytes.len()
    );
    drop(artifacts);

    Ok((
        [
            (header::CONTENT_TYPE, DEFAULT_DOWNLOAD_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DEFAULT_DOWNLOAD_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn run_trim_job(ffmpeg: PathBuf, job: TrimJob) -> Result<(), AppError> {
    let args = build_trim_command(&job);
    log::debug!(
        target: "clip_trim::server::upload",
        "FFmpeg args:\n{}",
        format_args_for_display_multiline(&args)
    );
    let clip_duration = job.duration_secs;
    tokio::task::spawn_blocking(move || run_ffmpeg_blocking(&ffmpeg, &args, Some(clip_duration)))
        .await
        .map_err(|e| AppError::from(format!("FFmpeg task failed: {e}")))?
}
