//! Headless doubles for the host seams, shared by unit tests and the
//! integration test targets.

use crate::editor::media::{DocumentHost, LocalFile, MediaElement, ObjectUrls};
use crate::export::DownloadSink;

/// Media element that records what the session asked of it. Nothing fires
/// native events on its own; tests feed them to the session explicitly.
#[derive(Debug, Clone)]
pub struct HeadlessMedia {
    pub duration: f64,
    pub current_time: f64,
    pub playing: bool,
    pub muted: bool,
    pub volume: f64,
    pub size: (u32, u32),
    pub seeks: Vec<f64>,
    pub play_calls: usize,
    pub pause_calls: usize,
}

impl Default for HeadlessMedia {
    fn default() -> Self {
        Self {
            duration: f64::NAN,
            current_time: 0.0,
            playing: false,
            muted: false,
            volume: 1.0,
            size: (0, 0),
            seeks: Vec::new(),
            play_calls: 0,
            pause_calls: 0,
        }
    }
}

impl HeadlessMedia {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

impl MediaElement for HeadlessMedia {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn seek(&mut self, seconds: f64) {
        self.current_time = seconds;
        self.seeks.push(seconds);
    }

    fn play(&mut self) {
        self.playing = true;
        self.play_calls += 1;
    }

    fn pause(&mut self) {
        self.playing = false;
        self.pause_calls += 1;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn video_size(&self) -> (u32, u32) {
        self.size
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    pub viewport_width: f64,
    pub scroll: f64,
    pub pinned_at: Option<f64>,
    pub listeners_attached: usize,
    pub attach_calls: usize,
    pub detach_calls: usize,
    pub scroll_restores: usize,
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            scroll: 0.0,
            pinned_at: None,
            listeners_attached: 0,
            attach_calls: 0,
            detach_calls: 0,
            scroll_restores: 0,
        }
    }
}

impl DocumentHost for HeadlessDocument {
    fn attach_pointer_listeners(&mut self) {
        self.attach_calls += 1;
        self.listeners_attached += 1;
    }

    fn detach_pointer_listeners(&mut self) {
        self.detach_calls += 1;
        self.listeners_attached = self.listeners_attached.saturating_sub(1);
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll
    }

    fn pin_scroll(&mut self, offset: f64) {
        self.pinned_at = Some(offset);
    }

    fn unpin_scroll(&mut self) {
        self.pinned_at = None;
    }

    fn scroll_to(&mut self, offset: f64) {
        self.scroll = offset;
        self.scroll_restores += 1;
    }
}

/// Hands out `blob:file-N` URIs and records revocations.
#[derive(Debug, Default)]
pub struct RecordingUrls {
    pub created: Vec<String>,
    pub revoked: Vec<String>,
}

impl ObjectUrls for RecordingUrls {
    fn create_object_url(&mut self, file: &LocalFile) -> String {
        let url = format!("blob:file-{}-{}", self.created.len() + 1, file.name);
        self.created.push(url.clone());
        url
    }

    fn revoke_object_url(&mut self, url: &str) {
        self.revoked.push(url.to_string());
    }
}

/// Download sink that keeps every payload in memory.
#[derive(Debug, Default)]
pub struct RecordingDownloads {
    pub payloads: Vec<(String, Vec<u8>)>,
    pub clicked: Vec<(String, String)>,
    pub revoked: Vec<String>,
}

impl DownloadSink for RecordingDownloads {
    fn create_object_url(&mut self, bytes: &[u8], _content_type: &str) -> String {
        let url = format!("blob:{}", self.payloads.len() + 1);
        self.payloads.push((url.clone(), bytes.to_vec()));
        url
    }

    fn click_download(&mut self, url: &str, filename: &str) {
        self.clicked.push((url.to_string(), filename.to_string()));
    }

    fn revoke_object_url(&mut self, url: &str) {
        self.revoked.push(url.to_string());
    }
}
