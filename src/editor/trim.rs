//! Trim-range controller: in/out handle positions and the playback clamp window.

use super::MoveOutcome;
use super::geometry::{percent_in_bounds, percent_to_seconds, seconds_to_percent};

/// Selected in/out window in seconds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct TrimRange {
    pub start: f64,
    pub stop: f64,
}

impl TrimRange {
    pub fn duration_secs(&self) -> f64 {
        self.stop - self.start
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds <= self.stop
    }
}

/// What playback should do after a trim handle is let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrimReleaseBehavior {
    /// Leave the playhead wherever the drag left it.
    #[default]
    Stay,
    /// Move the playhead to the bound belonging to the released handle.
    SnapToBound,
}

/// Corrective seek requested by the boundary check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryAction {
    /// Playback reached the out-point: jump back and keep playing.
    LoopToStart { seek_to: f64 },
    /// Playhead is before the in-point: move to it, play state untouched.
    ClampToStart { seek_to: f64 },
}

#[derive(Debug, Clone)]
pub struct TrimController {
    left_percent: f64,
    right_percent: f64,
    range: Option<TrimRange>,
    min_gap: f64,
}

impl TrimController {
    pub fn new(min_gap: f64) -> Self {
        Self {
            left_percent: 0.0,
            right_percent: 100.0,
            range: None,
            min_gap,
        }
    }

    pub fn left_percent(&self) -> f64 {
        self.left_percent
    }

    pub fn right_percent(&self) -> f64 {
        self.right_percent
    }

    pub fn range(&self) -> Option<TrimRange> {
        self.range
    }

    /// Move the in-point. On success returns the second the playhead should
    /// seek to.
    pub fn drag_left(&mut self, percent: f64, duration: f64) -> (MoveOutcome, Option<f64>) {
        if !percent_in_bounds(percent) || percent >= self.right_percent - self.min_gap {
            return (MoveOutcome::Rejected, None);
        }
        let seconds = percent_to_seconds(percent, duration);
        self.left_percent = percent;
        self.range = Some(match self.range {
            Some(range) => TrimRange {
                start: seconds,
                stop: range.stop,
            },
            None => TrimRange {
                start: seconds,
                stop: duration,
            },
        });
        (MoveOutcome::Applied, Some(seconds))
    }

    /// Move the out-point. Never seeks: the right handle previews the out-point
    /// without disturbing playback.
    pub fn drag_right(&mut self, percent: f64, duration: f64) -> MoveOutcome {
        if !percent_in_bounds(percent) || percent <= self.left_percent + self.min_gap {
            return MoveOutcome::Rejected;
        }
        let seconds = percent_to_seconds(percent, duration);
        self.right_percent = percent;
        self.range = Some(match self.range {
            Some(range) => TrimRange {
                start: range.start,
                stop: seconds,
            },
            None => TrimRange {
                start: 0.0,
                stop: seconds,
            },
        });
        MoveOutcome::Applied
    }

    /// Seek target after releasing `left` (true) or right handle, if any.
    pub fn release_target(&self, left: bool, behavior: TrimReleaseBehavior) -> Option<f64> {
        match (behavior, self.range) {
            (TrimReleaseBehavior::SnapToBound, Some(range)) => {
                Some(if left { range.start } else { range.stop })
            }
            _ => None,
        }
    }

    /// Where a press on the bare track should seek: the pressed time, unless
    /// it falls outside the selection, in which case the in-point.
    pub fn track_press_target(&self, seconds: f64) -> f64 {
        match self.range {
            Some(range) if !range.contains(seconds) => range.start,
            _ => seconds,
        }
    }

    /// Keep playback inside the selection. Skipped while any handle is dragged
    /// so a drag seek and a corrective seek never land in the same tick.
    pub fn check_boundaries(
        &self,
        current_time: f64,
        duration: f64,
        dragging: bool,
        loop_offset: f64,
    ) -> Option<BoundaryAction> {
        let range = self.range?;
        if dragging {
            return None;
        }
        let progress = seconds_to_percent(current_time, duration);
        if progress >= self.right_percent {
            let offset_start = range.start + loop_offset;
            let seek_to = if offset_start < range.stop {
                offset_start
            } else {
                range.start
            };
            return Some(BoundaryAction::LoopToStart { seek_to });
        }
        if progress < self.left_percent {
            return Some(BoundaryAction::ClampToStart {
                seek_to: range.start,
            });
        }
        None
    }
}
