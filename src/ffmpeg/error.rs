//! Short, user-facing messages for failed trim jobs.
//!
//! Codes come from ffmpeg's own exit paths: 1 for a generic failure, 69 when
//! the encode rate limit trips, 123 or 255 when the process was stopped.
//! The runner reports -1 when the binary could not be started at all.
//! Full stderr stays in `detail` and only reaches the server log.

use serde::Serialize;

const MAX_HEADLINE_BYTES: usize = 120;
const GENERIC_FAILURE: &str = "Failed to trim video.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FfmpegErrorPayload {
    pub summary: String,
    pub detail: String,
}

pub fn parse_ffmpeg_error(stderr: &str, exit_code: Option<i32>) -> FfmpegErrorPayload {
    let summary = exit_code
        .map(exit_code_message)
        .unwrap_or_else(|| headline(stderr));
    FfmpegErrorPayload {
        summary,
        detail: stderr.trim().to_string(),
    }
}

fn exit_code_message(code: i32) -> String {
    let known = match code {
        -1 => "FFmpeg not found or failed to start.",
        1 => GENERIC_FAILURE,
        69 => "Encoding rate limit exceeded.",
        123 | 255 => "Encoding was stopped.",
        other => return format!("Failed to trim video (FFmpeg exit code {other})."),
    };
    known.to_string()
}

/// First non-blank stderr line, shortened on a char boundary.
fn headline(stderr: &str) -> String {
    let Some(line) = stderr.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return GENERIC_FAILURE.to_string();
    };
    if line.len() <= MAX_HEADLINE_BYTES {
        return line.to_string();
    }
    let mut end = MAX_HEADLINE_BYTES - '…'.len_utf8();
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}
