//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;
pub const DEFAULT_MAX_JOBS: usize = 2;

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Explicit FFmpeg binary. When unset the binary is discovered.
    pub ffmpeg_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Concurrent FFmpeg processes.
    pub max_jobs: usize,
    pub temp_dir: PathBuf,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND.to_string(),
            ffmpeg_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            max_jobs: DEFAULT_MAX_JOBS,
            temp_dir: std::env::temp_dir(),
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    /// `CLIP_TRIM_BIND`, `FFMPEG_PATH`, `CLIP_TRIM_MAX_UPLOAD_MB`,
    /// `CLIP_TRIM_MAX_JOBS`, `CLIP_TRIM_TEMP_DIR`, `CLIP_TRIM_CORS`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(bind) = get("CLIP_TRIM_BIND") {
            config.bind_address = bind;
        }
        config.ffmpeg_path = get("FFMPEG_PATH").map(PathBuf::from);
        if let Some(mb) = get("CLIP_TRIM_MAX_UPLOAD_MB") {
            config.max_upload_bytes = parse_positive::<usize>("CLIP_TRIM_MAX_UPLOAD_MB", &mb)? * 1024 * 1024;
        }
        if let Some(jobs) = get("CLIP_TRIM_MAX_JOBS") {
            config.max_jobs = parse_positive("CLIP_TRIM_MAX_JOBS", &jobs)?;
        }
        if let Some(dir) = get("CLIP_TRIM_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(cors) = get("CLIP_TRIM_CORS") {
            config.enable_cors = parse_bool("CLIP_TRIM_CORS", &cors)?;
        }
        Ok(config)
    }
}

fn parse_positive<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr + PartialOrd + Default,
{
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(AppError::InvalidConfig(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::InvalidConfig(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = ServerConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_jobs, 2);
        assert_eq!(config.ffmpeg_path, None);
        assert!(!config.enable_cors);
    }

    #[test]
    fn env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CLIP_TRIM_BIND", "0.0.0.0:8080"),
            ("FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
            ("CLIP_TRIM_MAX_UPLOAD_MB", "200"),
            ("CLIP_TRIM_MAX_JOBS", "4"),
            ("CLIP_TRIM_TEMP_DIR", "/var/tmp/clips"),
            ("CLIP_TRIM_CORS", "true"),
        ]))
        .expect("config");
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
        assert_eq!(config.max_jobs, 4);
        assert_eq!(config.temp_dir, PathBuf::from("/var/tmp/clips"));
        assert!(config.enable_cors);
    }

    #[test]
    fn blank_ffmpeg_path_counts_as_unset() {
        let config = ServerConfig::from_lookup(lookup(&[("FFMPEG_PATH", "  ")])).expect("config");
        assert_eq!(config.ffmpeg_path, None);
    }

    #[test]
    fn invalid_numbers_rejected() {
        for bad in ["0", "-1", "many"] {
            let err = ServerConfig::from_lookup(lookup(&[("CLIP_TRIM_MAX_JOBS", bad)])).unwrap_err();
            assert!(matches!(err, AppError::InvalidConfig(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"maxJobs":1,"enableCors":true}"#).expect("parse");
        assert_eq!(config.max_jobs, 1);
        assert!(config.enable_cors);
        assert_eq!(config.bind_address, DEFAULT_BIND);
    }
}
