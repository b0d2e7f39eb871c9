//! Headless video editor controller.
//!
//! An [`EditorSession`] owns one media element and drives it from pointer
//! gestures on the timeline and crop overlay. The host UI forwards raw input
//! (`press_*`, [`EditorSession::pointer_move`], [`EditorSession::release`]) and
//! native media events, and renders [`TimelineView`] snapshots.

pub mod crop;
pub mod drag;
pub mod geometry;
pub mod media;
pub mod playback;
pub mod trim;

use std::time::{Duration, Instant};

use self::crop::{CropController, CropCorners, CropPixels, CropRegion, Corner};
use self::drag::{DragMachine, DragState};
use self::geometry::{Point, Rect, duration_known, percent_in_bounds, percent_to_seconds, point_to_percent, position_to_percent};
use self::media::{DocumentHost, MediaElement, MediaEvent, MediaSource};
use self::playback::{DEFAULT_VOLUME, PlaybackState, PlaybackSync, format_time};
use self::trim::{BoundaryAction, TrimController, TrimRange, TrimReleaseBehavior};
use crate::export::{DownloadSink, ExportForm, ExportResponse, ExportState, ExportTracker};

const TITLE_MAX_CHARS: usize = 40;

/// Result of feeding one pointer event to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    /// Out of bounds or would break the handle gap; state unchanged.
    Rejected,
    /// Nothing to route the event to.
    Ignored,
}

/// Pointer coordinates from a mouse or touch event, in client pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse(Point),
    Touch(Vec<Point>),
}

impl PointerInput {
    /// The mouse position, or the first touch point.
    pub fn primary(&self) -> Option<Point> {
        match self {
            PointerInput::Mouse(point) => Some(*point),
            PointerInput::Touch(touches) => touches.first().copied(),
        }
    }
}

/// Feature switches distinguishing the full editor from the plain player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub with_cropping: bool,
    pub with_volume_control: bool,
    /// Loop back past the in-point by `loop_offset_secs` instead of
    /// landing exactly on it. Playback resumes either way.
    pub with_audio_loop: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            with_cropping: true,
            with_volume_control: true,
            with_audio_loop: true,
        }
    }
}

impl Capabilities {
    pub fn player() -> Self {
        Self {
            with_cropping: false,
            with_volume_control: false,
            with_audio_loop: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub capabilities: Capabilities,
    /// Minimum distance between the trim handles, in percent of the track.
    pub min_handle_gap: f64,
    /// Forward offset applied when looping back to the in-point.
    pub loop_offset_secs: f64,
    pub crop_commit_delay_ms: u64,
    pub tick_divisions: usize,
    /// Viewports narrower than this pin the page scroll during crop drags.
    pub large_screen_min_width: f64,
    pub trim_release: TrimReleaseBehavior,
    pub unmute_on_volume_change: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            min_handle_gap: 5.0,
            loop_offset_secs: 0.5,
            crop_commit_delay_ms: 100,
            tick_divisions: 6,
            large_screen_min_width: 1096.0,
            trim_release: TrimReleaseBehavior::Stay,
            unmute_on_volume_change: true,
        }
    }
}

impl EditorConfig {
    pub fn player() -> Self {
        Self {
            capabilities: Capabilities::player(),
            ..Self::default()
        }
    }
}

/// Everything the host needs to render the editor for one frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    /// Source file name, shortened for the header.
    pub title: String,
    pub progress_percent: f64,
    pub left_handle_percent: f64,
    pub right_handle_percent: f64,
    pub trim_range: Option<TrimRange>,
    pub show_scrub_handle: bool,
    pub show_playback_controls: bool,
    pub show_volume_bar: bool,
    pub tick_labels: Vec<String>,
    pub playback: PlaybackState,
    pub crop_corners: Option<CropCorners>,
    pub is_cropping: bool,
    pub export_enabled: bool,
    pub export_loading: bool,
}

pub struct EditorSession<M: MediaElement, D: DocumentHost> {
    config: EditorConfig,
    source: Option<MediaSource>,
    media: M,
    document: D,
    track: Rect,
    overlay: Rect,
    drag: DragMachine,
    trim: TrimController,
    crop: Option<CropController>,
    playback: PlaybackSync,
    show_volume_bar: bool,
    export: ExportTracker,
}

impl<M: MediaElement, D: DocumentHost> EditorSession<M, D> {
    /// Mount a session on `media`. Playback starts muted at the default
    /// volume.
    pub fn new(config: EditorConfig, source: MediaSource, mut media: M, document: D) -> Self {
        media.set_muted(true);
        media.set_volume(DEFAULT_VOLUME);
        media.play();
        log::info!(
            target: "clip_trim::editor",
            "Editor session opened: {} ({:?})",
            source.file().display_name(TITLE_MAX_CHARS),
            config.capabilities
        );
        let crop = config
            .capabilities
            .with_cropping
            .then(|| CropController::new(Duration::from_millis(config.crop_commit_delay_ms)));
        Self {
            trim: TrimController::new(config.min_handle_gap),
            crop,
            config,
            source: Some(source),
            media,
            document,
            track: Rect::default(),
            overlay: Rect::default(),
            drag: DragMachine::default(),
            playback: PlaybackSync::default(),
            show_volume_bar: false,
            export: ExportTracker::default(),
        }
    }

    pub fn set_track_rect(&mut self, rect: Rect) {
        self.track = rect;
    }

    pub fn set_overlay_rect(&mut self, rect: Rect) {
        self.overlay = rect;
    }

    pub fn press_trim_left(&mut self) -> bool {
        self.drag.begin(DragState::TrimLeft, &mut self.document, false)
    }

    pub fn press_trim_right(&mut self) -> bool {
        self.drag.begin(DragState::TrimRight, &mut self.document, false)
    }

    pub fn press_scrub(&mut self) -> bool {
        self.drag.begin(DragState::Scrub, &mut self.document, false)
    }

    pub fn press_crop_corner(&mut self, corner: Corner) -> bool {
        let Some(crop) = self.crop.as_mut() else {
            return false;
        };
        let small_screen = self.document.viewport_width() < self.config.large_screen_min_width;
        if !self
            .drag
            .begin(DragState::CropCorner(corner), &mut self.document, small_screen)
        {
            return false;
        }
        crop.begin();
        true
    }

    /// Click on the bare track: seek there, or to the in-point when the
    /// target lies outside the selection. Only while no gesture is live.
    pub fn press_track(&mut self, input: &PointerInput) -> MoveOutcome {
        if self.drag.state().is_active() {
            return MoveOutcome::Ignored;
        }
        let duration = self.media.duration();
        let Some(point) = input.primary().filter(|_| duration_known(duration)) else {
            return MoveOutcome::Ignored;
        };
        let percent = position_to_percent(point.x, &self.track);
        if !percent_in_bounds(percent) {
            return MoveOutcome::Rejected;
        }
        let target = self
            .trim
            .track_press_target(percent_to_seconds(percent, duration));
        self.media.seek(target);
        MoveOutcome::Applied
    }

    /// Route a document-level move to whichever handle is being dragged.
    pub fn pointer_move(&mut self, input: &PointerInput) -> MoveOutcome {
        let state = self.drag.state();
        let Some(point) = input.primary().filter(|_| state.is_active()) else {
            return MoveOutcome::Ignored;
        };
        let duration = self.media.duration();

        match state {
            DragState::Idle => MoveOutcome::Ignored,
            DragState::CropCorner(corner) => match self.crop.as_mut() {
                Some(crop) => crop.drag(corner, point_to_percent(point, &self.overlay)),
                None => MoveOutcome::Ignored,
            },
            _ if !duration_known(duration) => MoveOutcome::Ignored,
            DragState::TrimLeft => {
                let percent = position_to_percent(point.x, &self.track);
                let (outcome, seek) = self.trim.drag_left(percent, duration);
                if let Some(seconds) = seek {
                    self.media.seek(seconds);
                }
                outcome
            }
            DragState::TrimRight => {
                let percent = position_to_percent(point.x, &self.track);
                self.trim.drag_right(percent, duration)
            }
            DragState::Scrub => {
                let percent = position_to_percent(point.x, &self.track);
                if percent.is_nan() {
                    return MoveOutcome::Rejected;
                }
                let clamped = percent.clamp(0.0, 100.0);
                self.media.seek(percent_to_seconds(clamped, duration));
                self.playback.set_scrub_progress(clamped);
                MoveOutcome::Applied
            }
        }
    }

    /// Pointer-up / touch-end anywhere in the document.
    pub fn release(&mut self, now: Instant) -> MoveOutcome {
        let Some(ended) = self.drag.end(&mut self.document) else {
            return MoveOutcome::Ignored;
        };
        match ended {
            DragState::TrimLeft | DragState::TrimRight => {
                let left = ended == DragState::TrimLeft;
                if let Some(seconds) = self.trim.release_target(left, self.config.trim_release) {
                    self.media.seek(seconds);
                }
            }
            DragState::CropCorner(_) => {
                if let Some(crop) = self.crop.as_mut() {
                    crop.release(now);
                }
            }
            DragState::Scrub | DragState::Idle => {}
        }
        MoveOutcome::Applied
    }

    /// Publish a pending crop region once its commit delay has passed. Call
    /// from the host's timer.
    pub fn poll(&mut self, now: Instant) -> Option<CropRegion> {
        self.crop.as_mut()?.poll(now)
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Play => self.playback.on_play(),
            MediaEvent::Pause => self.playback.on_pause(),
            MediaEvent::LoadedMetadata => {
                let duration = self.media.duration();
                log::debug!(
                    target: "clip_trim::editor",
                    "Metadata loaded: duration={:.3}s size={:?}",
                    duration,
                    self.media.video_size()
                );
                self.playback
                    .on_loaded_metadata(duration, self.config.tick_divisions);
            }
            MediaEvent::TimeUpdate => self.on_time_update(),
        }
    }

    fn on_time_update(&mut self) {
        let current_time = self.media.current_time();
        let duration = self.media.duration();
        self.playback.on_time_update(current_time, duration);

        let loop_offset = if self.config.capabilities.with_audio_loop {
            self.config.loop_offset_secs
        } else {
            0.0
        };
        let action = self.trim.check_boundaries(
            current_time,
            duration,
            self.drag.state().is_active(),
            loop_offset,
        );
        match action {
            Some(BoundaryAction::LoopToStart { seek_to }) => {
                self.media.seek(seek_to);
                self.media.play();
            }
            Some(BoundaryAction::ClampToStart { seek_to }) => self.media.seek(seek_to),
            None => {}
        }
    }

    pub fn toggle_play(&mut self) {
        if self.playback.state().is_playing {
            self.media.pause();
        } else {
            self.media.play();
        }
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.playback.toggle_mute();
        self.media.set_muted(muted);
    }

    /// Returns false when the session has no volume control.
    pub fn set_volume(&mut self, volume: f64) -> bool {
        if !self.config.capabilities.with_volume_control {
            return false;
        }
        let muted = self
            .playback
            .set_volume(volume, self.config.unmute_on_volume_change);
        self.media.set_volume(self.playback.state().volume);
        self.media.set_muted(muted);
        true
    }

    pub fn hover_volume(&mut self, hovered: bool) {
        self.show_volume_bar = hovered && self.config.capabilities.with_volume_control;
    }

    fn is_cropping(&self) -> bool {
        self.crop.as_ref().is_some_and(CropController::is_cropping)
    }

    pub fn can_export(&self) -> bool {
        if self.export.is_in_flight() {
            return false;
        }
        match &self.crop {
            Some(crop) => self.trim.range().is_some() || !crop.region().is_full_frame(),
            None => true,
        }
    }

    fn crop_pixels(&self) -> Option<CropPixels> {
        let crop = self.crop.as_ref()?;
        let (width, height) = self.media.video_size();
        (width > 0 && height > 0).then(|| crop.region().to_pixels(width, height))
    }

    /// Build the upload form and mark the export in flight. `None` while a
    /// submission is pending, when there is nothing to export, or before the
    /// duration is known for an untrimmed clip.
    pub fn begin_export(&mut self) -> Option<ExportForm> {
        if !self.can_export() {
            return None;
        }
        let video = self.source.as_ref()?.file().clone();
        let range = self.trim.range();
        let duration = self.media.duration();
        if range.is_none() && !duration_known(duration) {
            return None;
        }
        let form = ExportForm::new(video, range, duration, self.crop_pixels());
        if !self.export.begin() {
            return None;
        }
        log::info!(
            target: "clip_trim::editor",
            "Submitting export: {} [{}s, {}s] crop={:?}",
            form.video.name,
            form.start_time,
            form.end_time,
            form.crop
        );
        Some(form)
    }

    pub fn finish_export(&mut self, response: ExportResponse, sink: &mut impl DownloadSink) -> &ExportState {
        self.export.finish(response, sink)
    }

    /// The request failed before the endpoint answered.
    pub fn fail_export(&mut self, message: impl Into<String>) {
        self.export.fail(message);
    }

    pub fn export_state(&self) -> &ExportState {
        self.export.state()
    }

    pub fn view(&self) -> TimelineView {
        let is_cropping = self.is_cropping();
        TimelineView {
            title: self
                .source
                .as_ref()
                .map(|source| source.file().display_name(TITLE_MAX_CHARS))
                .unwrap_or_default(),
            progress_percent: self.playback.progress_percent(),
            left_handle_percent: self.trim.left_percent(),
            right_handle_percent: self.trim.right_percent(),
            trim_range: self.trim.range(),
            show_scrub_handle: self.drag.state() != DragState::TrimLeft,
            show_playback_controls: !is_cropping,
            show_volume_bar: self.show_volume_bar,
            tick_labels: self.playback.ticks().iter().map(|&t| format_time(t)).collect(),
            playback: self.playback.state(),
            crop_corners: self.crop.as_ref().map(|crop| *crop.corners()),
            is_cropping,
            export_enabled: self.can_export(),
            export_loading: self.export.is_in_flight(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn trim(&self) -> &TrimController {
        &self.trim
    }

    pub fn crop(&self) -> Option<&CropController> {
        self.crop.as_ref()
    }

    pub fn playback(&self) -> &PlaybackSync {
        &self.playback
    }

    /// Unmount: release any live gesture and hand the source back so its URI
    /// can be revoked.
    pub fn teardown(mut self) -> Option<MediaSource> {
        self.drag.abandon(&mut self.document);
        self.source.take()
    }
}

impl<M: MediaElement, D: DocumentHost> Drop for EditorSession<M, D> {
    fn drop(&mut self) {
        self.drag.abandon(&mut self.document);
    }
}
