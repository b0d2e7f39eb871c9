#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::LazyLock;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use clip_trim_core::config::ServerConfig;
use clip_trim_core::export::{ExportForm, ExportResponse, UPLOAD_PATH, multipart_content_type};
use regex::Regex;
use tower::ServiceExt;

pub const BOUNDARY: &str = "clip-trim-test-boundary";

/// Scratch directory holding the server's temp dir and any fake binaries.
pub struct ServerEnv {
    dir: tempfile::TempDir,
}

impl ServerEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("work")).expect("create work dir");
        Self { dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Where the server puts its per-request files.
    pub fn work_dir(&self) -> PathBuf {
        self.path("work")
    }

    pub fn work_dir_entries(&self) -> Vec<PathBuf> {
        fs::read_dir(self.work_dir())
            .expect("read work dir")
            .map(|e| e.expect("dir entry").path())
            .collect()
    }

    pub fn config(&self, ffmpeg: Option<PathBuf>) -> ServerConfig {
        ServerConfig {
            ffmpeg_path: ffmpeg,
            temp_dir: self.work_dir(),
            ..ServerConfig::default()
        }
    }

    pub fn write_video(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, bytes).expect("write video");
        path
    }

    /// Shell script standing in for FFmpeg. Tests that execute one must be
    /// `#[serial]` so no other test forks while the script is being written.
    #[cfg(unix)]
    pub fn fake_ffmpeg(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path("fake-ffmpeg");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake ffmpeg");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake ffmpeg");
        path
    }

    /// Fake FFmpeg that writes `fakevideo` to its last argument (the output).
    #[cfg(unix)]
    pub fn succeeding_ffmpeg(&self) -> PathBuf {
        self.fake_ffmpeg("for last; do :; done\nprintf 'fakevideo' > \"$last\"")
    }

    #[cfg(unix)]
    pub fn failing_ffmpeg(&self) -> PathBuf {
        self.fake_ffmpeg("echo 'Invalid data found when processing input' >&2\nexit 1")
    }
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(UPLOAD_PATH)
        .header(header::CONTENT_TYPE, multipart_content_type(BOUNDARY))
        .body(Body::from(body))
        .expect("build request")
}

pub fn form_request(form: &ExportForm) -> Request<Body> {
    upload_request(form.to_multipart_body(BOUNDARY).expect("multipart body"))
}

/// Multipart body from text fields only, optionally with video parts.
pub fn raw_multipart(fields: &[(&str, &str)], videos: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    for bytes in videos {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"video\"; filename=\"clip.mp4\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn error_message(&self) -> String {
        let value: serde_json::Value = serde_json::from_slice(&self.body).expect("json error body");
        value["error"].as_str().expect("error string").to_string()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// The reply as the browser client sees it.
    pub fn into_export_response(self) -> ExportResponse {
        ExportResponse {
            status: self.status.as_u16(),
            content_type: self.header(header::CONTENT_TYPE),
            content_disposition: self.header(header::CONTENT_DISPOSITION),
            body: self.body,
        }
    }
}

pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn create_test_video(
    ffmpeg: &Path,
    output_path: &Path,
    duration_secs: f32,
) -> std::io::Result<ExitStatus> {
    Command::new(ffmpeg)
        .args([
            "-loglevel",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=30", duration_secs),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", duration_secs),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
            output_path.to_string_lossy().as_ref(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d+):([\d.]+)").expect("invalid duration regex"));
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Video: .*?, (\d{2,5})x(\d{2,5})").expect("invalid size regex"));

/// Container duration and frame size read from `ffmpeg -i` output.
pub fn probe_video(ffmpeg: &Path, path: &Path) -> (f64, (u32, u32)) {
    let output = Command::new(ffmpeg)
        .args(["-hide_banner", "-i"])
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .expect("run ffmpeg -i");
    let stderr = String::from_utf8_lossy(&output.stderr);
    let caps = DURATION_RE
        .captures(&stderr)
        .unwrap_or_else(|| panic!("no duration in:\n{stderr}"));
    let duration = caps[1].parse::<f64>().expect("hours") * 3600.0
        + caps[2].parse::<f64>().expect("minutes") * 60.0
        + caps[3].parse::<f64>().expect("seconds");
    let size = SIZE_RE
        .captures(&stderr)
        .unwrap_or_else(|| panic!("no frame size in:\n{stderr}"));
    (
        duration,
        (
            size[1].parse().expect("width"),
            size[2].parse().expect("height"),
        ),
    )
}
