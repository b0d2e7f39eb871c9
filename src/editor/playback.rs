//! Playback synchronizer: mirrors the media element's clock and play state.

use super::geometry::{duration_known, seconds_to_percent};

pub const DEFAULT_VOLUME: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_time: f64,
    pub is_playing: bool,
    pub is_muted: bool,
    pub volume: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            is_playing: false,
            is_muted: true,
            volume: DEFAULT_VOLUME,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackSync {
    state: PlaybackState,
    progress_percent: f64,
    ticks: Vec<f64>,
}

impl PlaybackSync {
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    pub fn on_loaded_metadata(&mut self, duration: f64, divisions: usize) {
        self.ticks = tick_marks(duration, divisions);
    }

    pub fn on_play(&mut self) {
        self.state.is_playing = true;
    }

    pub fn on_pause(&mut self) {
        self.state.is_playing = false;
    }

    pub fn on_time_update(&mut self, current_time: f64, duration: f64) {
        self.state.current_time = current_time;
        self.progress_percent = seconds_to_percent(current_time, duration);
    }

    /// Progress set directly by a scrub drag, clamped to the track.
    pub fn set_scrub_progress(&mut self, percent: f64) {
        self.progress_percent = percent.clamp(0.0, 100.0);
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.state.is_muted = !self.state.is_muted;
        self.state.is_muted
    }

    /// Store a new volume, clamped to `[0, 1]`. Returns the muted flag after
    /// the change.
    pub fn set_volume(&mut self, volume: f64, unmute: bool) -> bool {
        self.state.volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.state.volume
        };
        if unmute {
            self.state.is_muted = false;
        }
        self.state.is_muted
    }
}

/// Evenly spaced ruler labels from 0 to `duration` inclusive.
pub fn tick_marks(duration: f64, divisions: usize) -> Vec<f64> {
    if !duration_known(duration) || divisions == 0 {
        return Vec::new();
    }
    let step = duration / divisions as f64;
    (0..=divisions).map(|i| step * i as f64).collect()
}

/// `m:ss`, or `h:mm:ss` from one hour, of the floored seconds.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
