use regex::Regex;
use std::sync::LazyLock;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^out_time_ms=(\d+)").expect("invalid time regex"));

/// Encoded position in seconds from a `-progress` line. FFmpeg reports
/// `out_time_ms` in microseconds.
pub fn parse_out_time(line: &str) -> Option<f64> {
    let caps = TIME_RE.captures(line.trim())?;
    let micros: u64 = caps[1].parse().ok()?;
    Some(micros as f64 / 1_000_000.0)
}

/// Fraction of the clip encoded so far, in [0, 1].
pub fn progress_fraction(out_time: f64, clip_duration: f64) -> Option<f64> {
    (clip_duration > 0.0).then(|| (out_time / clip_duration).clamp(0.0, 1.0))
}
