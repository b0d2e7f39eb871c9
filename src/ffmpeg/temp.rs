use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const TEMP_PREFIX: &str = "clip-trim-";

const TAG_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TAG_LEN: usize = 9;

/// Per-request tag so concurrent uploads in the same millisecond never
/// share a filename. Not meant to be unpredictable.
fn request_tag() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| u64::from(d.subsec_nanos()));
    let mut state = ((COUNTER.fetch_add(1, Ordering::Relaxed) << 32)
        ^ u64::from(std::process::id())
        ^ nanos.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        | 1;
    let mut tag = String::with_capacity(TAG_LEN);
    for _ in 0..TAG_LEN {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        tag.push(char::from(TAG_ALPHABET[(state % 36) as usize]));
    }
    tag
}

/// Files created for one request. Everything handed out is removed when the
/// guard drops, whichever way the request ends.
#[derive(Debug)]
pub struct TempArtifacts {
    dir: PathBuf,
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: Vec::new(),
        }
    }

    /// Reserve a fresh path ending in `suffix` (e.g. `input.mp4`).
    pub fn path(&mut self, suffix: &str) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let name = format!("{TEMP_PREFIX}{millis}-{}-{suffix}", request_tag());
        let path = self.dir.join(name);
        self.paths.push(path.clone());
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!(
                    target: "clip_trim::ffmpeg::temp",
                    "Failed to remove temp file {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
}

/// Delete leftovers from earlier runs in `dir` older than `max_age`.
/// Returns how many files were removed.
pub fn cleanup_old_temp_files(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(TEMP_PREFIX) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age >= max_age && fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }
    if removed > 0 {
        log::info!(
            target: "clip_trim::ffmpeg::temp",
            "Removed {} stale temp file(s) from {}",
            removed,
            dir.display()
        );
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_unique_and_prefixed() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let mut artifacts = TempArtifacts::new(dir.path());
        let a = artifacts.path("input.mp4");
        let b = artifacts.path("input.mp4");
        assert_ne!(a, b);
        let name = a.file_name().expect("name").to_string_lossy().to_string();
        assert!(name.starts_with(TEMP_PREFIX));
        assert!(name.ends_with("-input.mp4"));
    }

    #[test]
    fn drop_removes_created_files() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let (written, never_written) = {
            let mut artifacts = TempArtifacts::new(dir.path());
            let written = artifacts.path("output.mp4");
            fs::write(&written, b"data").expect("write");
            (written, artifacts.path("never.mp4"))
        };
        assert!(!written.exists());
        assert!(!never_written.exists());
    }

    #[test]
    fn cleanup_only_touches_own_files() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let ours = dir.path().join(format!("{TEMP_PREFIX}1-abc-input.mp4"));
        let theirs = dir.path().join("notes.txt");
        fs::write(&ours, b"x").expect("write");
        fs::write(&theirs, b"x").expect("write");

        assert_eq!(cleanup_old_temp_files(dir.path(), Duration::ZERO).expect("cleanup"), 1);
        assert!(!ours.exists());
        assert!(theirs.exists());
    }

    #[test]
    fn fresh_files_survive_cleanup() {
        let dir = tempfile::tempdir().expect("scratch dir");
        let ours = dir.path().join(format!("{TEMP_PREFIX}1-abc-output.mp4"));
        fs::write(&ours, b"x").expect("write");
        let removed = cleanup_old_temp_files(dir.path(), Duration::from_secs(24 * 60 * 60))
            .expect("cleanup");
        assert_eq!(removed, 0);
        assert!(ours.exists());
    }
}
