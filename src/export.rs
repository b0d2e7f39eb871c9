//! Client side of the export round-trip: the multipart form sent to
//! `/api/upload` and handling of the endpoint's reply.

use std::sync::LazyLock;

use regex::Regex;

use crate::editor::crop::CropPixels;
use crate::editor::media::LocalFile;
use crate::editor::trim::TrimRange;
use crate::error::ErrorBody;

pub const UPLOAD_PATH: &str = "/api/upload";
pub const DEFAULT_DOWNLOAD_NAME: &str = "trimmed.mp4";
pub const DEFAULT_DOWNLOAD_TYPE: &str = "video/mp4";

static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"filename\s*=\s*(?:"([^"]*)"|([^;\s]+))"#).expect("valid filename regex")
});

/// Form submitted to the transcoding endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportForm {
    pub video: LocalFile,
    pub start_time: f64,
    pub end_time: f64,
    pub crop: Option<CropPixels>,
}

impl ExportForm {
    /// Untrimmed sessions export the whole clip.
    pub fn new(video: LocalFile, range: Option<TrimRange>, duration: f64, crop: Option<CropPixels>) -> Self {
        let (start_time, end_time) = match range {
            Some(range) => (range.start, range.stop),
            None => (0.0, duration),
        };
        Self {
            video,
            start_time,
            end_time,
            crop,
        }
    }

    /// Text fields in submission order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("startTime", format_seconds(self.start_time)),
            ("endTime", format_seconds(self.end_time)),
        ];
        if let Some(crop) = self.crop {
            fields.extend([
                ("cropX", crop.x.to_string()),
                ("cropY", crop.y.to_string()),
                ("cropWidth", crop.width.to_string()),
                ("cropHeight", crop.height.to_string()),
            ]);
        }
        fields
    }

    /// `multipart/form-data` body with the video read from disk.
    pub fn to_multipart_body(&self, boundary: &str) -> std::io::Result<Vec<u8>> {
        let video = std::fs::read(&self.video.path)?;
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.video.name.replace('"', "'"),
            self.video.mime_type
        )
        .into_bytes();
        body.extend_from_slice(&video);
        body.extend_from_slice(b"\r\n");
        for (name, value) in self.fields() {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        Ok(body)
    }
}

pub fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// Decimal seconds the way a browser stringifies numbers: `1`, `1.5`.
pub fn format_seconds(seconds: f64) -> String {
    seconds.to_string()
}

/// Raw reply from the endpoint.
#[derive(Debug, Clone)]
pub struct ExportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Download {
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
    Failed {
        message: String,
    },
}

impl ExportResponse {
    pub fn into_outcome(self) -> ExportOutcome {
        if (200..300).contains(&self.status) {
            ExportOutcome::Download {
                filename: self
                    .content_disposition
                    .as_deref()
                    .and_then(filename_from_disposition)
                    .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string()),
                content_type: self
                    .content_type
                    .unwrap_or_else(|| DEFAULT_DOWNLOAD_TYPE.to_string()),
                bytes: self.body,
            }
        } else {
            let message = serde_json::from_slice::<ErrorBody>(&self.body)
                .map(|body| body.error)
                .unwrap_or_else(|_| format!("Export failed (HTTP {})", self.status));
            ExportOutcome::Failed { message }
        }
    }
}

pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = DISPOSITION_FILENAME.captures(header)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty())
}

/// Browser download plumbing: blob URL, synthetic anchor click, revoke.
pub trait DownloadSink {
    fn create_object_url(&mut self, bytes: &[u8], content_type: &str) -> String;
    fn click_download(&mut self, url: &str, filename: &str);
    fn revoke_object_url(&mut self, url: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    InFlight,
    Failed {
        message: String,
    },
    Completed {
        filename: String,
    },
}

/// Loading state of the export control. One submission at a time; a failed
/// export is retried by submitting again.
#[derive(Debug, Default)]
pub struct ExportTracker {
    state: ExportState,
}

impl ExportTracker {
    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == ExportState::InFlight
    }

    pub fn begin(&mut self) -> bool {
        if self.is_in_flight() {
            return false;
        }
        self.state = ExportState::InFlight;
        true
    }

    pub fn finish(&mut self, response: ExportResponse, sink: &mut impl DownloadSink) -> &ExportState {
        self.state = match response.into_outcome() {
            ExportOutcome::Download {
                filename,
                content_type,
                bytes,
            } => {
                let url = sink.create_object_url(&bytes, &content_type);
                sink.click_download(&url, &filename);
                sink.revoke_object_url(&url);
                log::info!(
                    target: "clip_trim::export",
                    "Export downloaded: {} ({} bytes)",
                    filename,
                    bytes.len()
                );
                ExportState::Completed { filename }
            }
            ExportOutcome::Failed { message } => {
                log::warn!(target: "clip_trim::export", "Export failed: {}", message);
                ExportState::Failed { message }
            }
        };
        &self.state
    }

    /// Transport-level failure (request never produced a response).
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ExportState::Failed {
            message: message.into(),
        };
    }
}
