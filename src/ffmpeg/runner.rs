//! Child-process side of a trim job.
//!
//! stdout carries `-progress pipe:1` records and stderr the diagnostics.
//! Both are read on scoped threads while this thread waits for the exit
//! status, so neither pipe can fill up and stall the encoder. Async callers
//! wrap this in `spawn_blocking`.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

use parking_lot::Mutex;

use super::progress::{parse_out_time, progress_fraction};
use crate::error::AppError;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;
const PROGRESS_LOG_EVERY: Duration = Duration::from_secs(1);
const STDERR_TAIL_BYTES: usize = 64 * 1024;

/// Most recent stderr output, older bytes dropped past the cap.
#[derive(Default)]
struct StderrTail(Mutex<Vec<u8>>);

impl StderrTail {
    fn push_line(&self, line: &str) {
        let mut buf = self.0.lock();
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        let overflow = buf.len().saturating_sub(STDERR_TAIL_BYTES);
        if overflow > 0 {
            buf.drain(..overflow);
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.0.into_inner()).into_owned()
    }
}

fn read_lines(reader: impl Read, mut on_line: impl FnMut(&str)) {
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::with_capacity(256);
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) | Err(_) => break,
            Ok(_) => on_line(String::from_utf8_lossy(&raw).trim_end()),
        }
    }
}

fn log_progress(reader: impl Read, clip_duration: Option<f64>) {
    let Some(duration) = clip_duration.filter(|d| *d > 0.0) else {
        read_lines(reader, |_| {});
        return;
    };
    let mut logged_at: Option<Instant> = None;
    read_lines(reader, |line| {
        let Some(fraction) = parse_out_time(line).and_then(|t| progress_fraction(t, duration))
        else {
            return;
        };
        let due = logged_at.is_none_or(|at| at.elapsed() >= PROGRESS_LOG_EVERY);
        if due || fraction >= 1.0 {
            logged_at = Some(Instant::now());
            log::debug!(
                target: "clip_trim::ffmpeg::runner",
                "trim {:.0}% done",
                fraction * 100.0
            );
        }
    });
}

/// Run `ffmpeg` with `args` and block until it exits.
///
/// `clip_duration` is the expected output length, used to turn
/// `out_time_ms` into a progress fraction for the log.
pub fn run_ffmpeg_blocking(
    ffmpeg: &Path,
    args: &[String],
    clip_duration: Option<f64>,
) -> Result<(), AppError> {
    log::debug!(
        target: "clip_trim::ffmpeg::runner",
        "starting {} with {} args, writing {:?}",
        ffmpeg.display(),
        args.len(),
        args.last()
    );

    let mut command = Command::new(ffmpeg);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    command.creation_flags(CREATE_NO_WINDOW);
    let mut child = command
        .spawn()
        .map_err(|e| AppError::from(format!("could not start ffmpeg: {e}")))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(AppError::from("ffmpeg pipes were not captured"));
    };

    let tail = StderrTail::default();
    thread::scope(|scope| {
        scope.spawn(|| log_progress(stdout, clip_duration));
        scope.spawn(|| read_lines(stderr, |line| tail.push_line(line)));
    });
    let status = child.wait()?;
    let stderr = tail.into_string();

    if status.success() {
        log::info!(target: "clip_trim::ffmpeg::runner", "trim finished");
        return Ok(());
    }

    let code = status.code().unwrap_or(-1);
    let last_lines: Vec<&str> = stderr.lines().rev().take(3).collect();
    log::error!(
        target: "clip_trim::ffmpeg::runner",
        "ffmpeg exited with {}: {}",
        code,
        last_lines.join(" | ")
    );
    Err(AppError::ffmpeg_failed(code, stderr))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[test]
    #[serial]
    fn nonzero_exit_carries_code_and_stderr() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let bin = script(dir.path(), "echo 'moov atom not found' >&2\nexit 1");
        let err = run_ffmpeg_blocking(&bin, &[], Some(1.0)).unwrap_err();
        match err {
            AppError::FfmpegFailed { code, stderr } => {
                assert_eq!(code, 1);
                assert!(stderr.contains("moov atom not found"));
            }
            other => panic!("expected FfmpegFailed, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn success_with_progress_output() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let bin = script(
            dir.path(),
            "echo out_time_ms=500000\necho out_time_ms=1000000\necho progress=end",
        );
        run_ffmpeg_blocking(&bin, &["-y".to_string()], Some(1.0)).expect("runs");
    }

    #[test]
    #[serial]
    fn spawn_failure_is_code_minus_one() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let err = run_ffmpeg_blocking(&dir.path().join("missing"), &[], None).unwrap_err();
        assert!(matches!(err, AppError::FfmpegFailed { code: -1, .. }));
    }

    #[test]
    #[serial]
    fn stderr_tail_is_bounded() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let bin = script(
            dir.path(),
            "i=0; while [ $i -lt 3000 ]; do echo 'xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx' >&2; i=$((i+1)); done\nexit 3",
        );
        match run_ffmpeg_blocking(&bin, &[], None).unwrap_err() {
            AppError::FfmpegFailed { stderr, .. } => assert!(stderr.len() <= STDERR_TAIL_BYTES),
            other => panic!("expected FfmpegFailed, got {other:?}"),
        }
    }
}
