//! App error type for the upload endpoint. Implements Display and Serialize
//! for the browser client, and maps onto HTTP responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::ffmpeg::parse_ffmpeg_error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    MissingConfig(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    FfmpegNotFound(String),

    #[error("FFmpeg failed (code {code}): {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Malformed upload: {0}")]
    Multipart(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
}

impl AppError {
    pub fn ffmpeg_failed(code: i32, stderr: impl Into<String>) -> Self {
        Self::FfmpegFailed {
            code,
            stderr: stderr.into(),
        }
    }

    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload(message.into())
    }

    /// Short message shown to the user. FFmpeg stderr stays in the logs.
    pub fn summary(&self) -> String {
        match self {
            AppError::FfmpegFailed { code, stderr } => {
                parse_ffmpeg_error(stderr, Some(*code)).summary
            }
            AppError::Io(_) => "Failed to trim video".to_string(),
            _ => self.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUpload(_) | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.summary())
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::FfmpegFailed {
            code: -1,
            stderr: s,
        }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        s.to_string().into()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Multipart(e.body_text())
        }
    }
}

/// JSON body of every failed response.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!(target: "clip_trim::server", "Trimming error: {}", self);
        } else {
            log::warn!(target: "clip_trim::server", "Rejected upload: {}", self);
        }
        let body = ErrorBody {
            error: self.summary(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_is_spawn_failure() {
        let e = AppError::from("Failed to spawn FFmpeg: No such file");
        match &e {
            AppError::FfmpegFailed { code, stderr } => {
                assert_eq!(*code, -1);
                assert_eq!(stderr, "Failed to spawn FFmpeg: No such file");
            }
            _ => panic!("expected FfmpegFailed"),
        }
    }

    #[test]
    fn upload_errors_are_client_errors() {
        assert_eq!(
            AppError::invalid_upload("No file uploaded").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MissingConfig("FFMPEG_PATH not defined".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ffmpeg_failure_summary_hides_stderr() {
        let e = AppError::ffmpeg_failed(1, "[mp4 @ 0x1] moov atom not found");
        assert_eq!(e.summary(), "Failed to trim video.");
        assert!(e.to_string().contains("moov atom"));
    }

    #[test]
    fn serializes_as_summary_string() {
        let e = AppError::invalid_upload("endTime must be greater than startTime");
        let json = serde_json::to_string(&e).expect("serialize");
        assert_eq!(json, "\"endTime must be greater than startTime\"");
    }
}
