//! Host seams: the media element, the document, and locally selected files.

use std::collections::HashSet;
use std::path::PathBuf;

/// The playable element a session drives. Implemented by the host UI layer.
pub trait MediaElement {
    /// Duration in seconds; NaN until metadata has loaded.
    fn duration(&self) -> f64;
    fn current_time(&self) -> f64;
    fn seek(&mut self, seconds: f64);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    /// Native frame size in pixels; `(0, 0)` until metadata has loaded.
    fn video_size(&self) -> (u32, u32);
}

/// Native media element events the playback synchronizer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate,
    LoadedMetadata,
}

/// Document-level services: global pointer listeners and scroll pinning.
pub trait DocumentHost {
    /// Register document-level move/up listeners (mouse and touch).
    fn attach_pointer_listeners(&mut self);
    fn detach_pointer_listeners(&mut self);
    fn viewport_width(&self) -> f64;
    fn scroll_offset(&self) -> f64;
    /// Fix the body at `offset` so the page cannot scroll.
    fn pin_scroll(&mut self, offset: f64);
    fn unpin_scroll(&mut self);
    fn scroll_to(&mut self, offset: f64);
}

impl<T: MediaElement + ?Sized> MediaElement for &mut T {
    fn duration(&self) -> f64 {
        (**self).duration()
    }
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }
    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds)
    }
    fn play(&mut self) {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn set_volume(&mut self, volume: f64) {
        (**self).set_volume(volume)
    }
    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted)
    }
    fn video_size(&self) -> (u32, u32) {
        (**self).video_size()
    }
}

impl<T: DocumentHost + ?Sized> DocumentHost for &mut T {
    fn attach_pointer_listeners(&mut self) {
        (**self).attach_pointer_listeners()
    }
    fn detach_pointer_listeners(&mut self) {
        (**self).detach_pointer_listeners()
    }
    fn viewport_width(&self) -> f64 {
        (**self).viewport_width()
    }
    fn scroll_offset(&self) -> f64 {
        (**self).scroll_offset()
    }
    fn pin_scroll(&mut self, offset: f64) {
        (**self).pin_scroll(offset)
    }
    fn unpin_scroll(&mut self) {
        (**self).unpin_scroll()
    }
    fn scroll_to(&mut self, offset: f64) {
        (**self).scroll_to(offset)
    }
}

/// A file picked through the browser file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub path: PathBuf,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            path,
        }
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Name truncated for the editor header.
    pub fn display_name(&self, max_chars: usize) -> String {
        self.name.chars().take(max_chars).collect()
    }
}

/// Creates and revokes object URLs for local files.
pub trait ObjectUrls {
    fn create_object_url(&mut self, file: &LocalFile) -> String;
    fn revoke_object_url(&mut self, url: &str);
}

/// A selected video and the URI the media element plays it from.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaSource {
    file: LocalFile,
    uri: String,
}

impl MediaSource {
    pub fn file(&self) -> &LocalFile {
        &self.file
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Tracks live object URLs so every source handed out is revoked exactly once.
pub struct SourceRegistry<U: ObjectUrls> {
    urls: U,
    live: HashSet<String>,
}

impl<U: ObjectUrls> SourceRegistry<U> {
    pub fn new(urls: U) -> Self {
        Self {
            urls,
            live: HashSet::new(),
        }
    }

    /// Queue every video in a file list. Non-video entries are dropped silently.
    pub fn open(&mut self, files: impl IntoIterator<Item = LocalFile>) -> Vec<MediaSource> {
        files
            .into_iter()
            .filter(|file| {
                let keep = file.is_video();
                if !keep {
                    log::debug!(
                        target: "clip_trim::editor::media",
                        "Ignoring non-video selection: {} ({})",
                        file.name,
                        file.mime_type
                    );
                }
                keep
            })
            .map(|file| {
                let uri = self.urls.create_object_url(&file);
                self.live.insert(uri.clone());
                MediaSource { file, uri }
            })
            .collect()
    }

    /// Swap a source for a newly picked file. The old URI is revoked only when
    /// the new file is accepted.
    pub fn replace(&mut self, old: MediaSource, file: LocalFile) -> Result<MediaSource, MediaSource> {
        match self.open([file]).pop() {
            Some(source) => {
                self.release(old);
                Ok(source)
            }
            None => Err(old),
        }
    }

    pub fn release(&mut self, source: MediaSource) {
        if self.live.remove(&source.uri) {
            self.urls.revoke_object_url(&source.uri);
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn urls(&self) -> &U {
        &self.urls
    }
}

impl<U: ObjectUrls> Drop for SourceRegistry<U> {
    fn drop(&mut self) {
        for uri in self.live.drain() {
            self.urls.revoke_object_url(&uri);
        }
    }
}
