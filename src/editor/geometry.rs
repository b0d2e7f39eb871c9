//! Pointer-to-timeline coordinate math.
//!
//! Everything here is pure: callers pass in the current track geometry and
//! media duration on every call, nothing is cached between events.

/// A point in client (viewport) pixels, or in percent space once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding client rect of a track or overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Horizontal pointer position as a percentage of the track width.
///
/// Not clamped: positions left of the track go negative, right of it exceed
/// 100. A track with no width yields NaN, which [`percent_in_bounds`] rejects.
pub fn position_to_percent(pointer_x: f64, track: &Rect) -> f64 {
    if track.width <= 0.0 {
        return f64::NAN;
    }
    (pointer_x - track.left) / track.width * 100.0
}

/// Pointer position as `{x, y}` percent of the overlay box.
pub fn point_to_percent(pointer: Point, overlay: &Rect) -> Point {
    let y = if overlay.height <= 0.0 {
        f64::NAN
    } else {
        (pointer.y - overlay.top) / overlay.height * 100.0
    };
    Point::new(position_to_percent(pointer.x, overlay), y)
}

pub fn percent_in_bounds(percent: f64) -> bool {
    percent.is_finite() && (0.0..=100.0).contains(&percent)
}

pub fn percent_to_seconds(percent: f64, duration: f64) -> f64 {
    duration * percent / 100.0
}

/// Inverse of [`percent_to_seconds`]. Unknown or zero durations map to 0.
pub fn seconds_to_percent(seconds: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    seconds / duration * 100.0
}

/// True once the media element reports a usable duration.
pub fn duration_known(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}
