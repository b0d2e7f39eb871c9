//! Crop-region controller: four corner handles editing one axis-aligned
//! rectangle, published as a normalized box shortly after release.

use std::time::{Duration, Instant};

use super::MoveOutcome;
use super::geometry::{Point, percent_in_bounds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// The corner sharing this corner's x coordinate.
    pub fn vertical_neighbour(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopLeft,
            Corner::TopRight => Corner::BottomRight,
            Corner::BottomRight => Corner::TopRight,
        }
    }

    /// The corner sharing this corner's y coordinate.
    pub fn horizontal_neighbour(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::TopRight,
            Corner::TopRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::BottomRight,
            Corner::BottomRight => Corner::BottomLeft,
        }
    }
}

/// Corner handle positions in overlay percent space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropCorners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl Default for CropCorners {
    fn default() -> Self {
        Self {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(100.0, 0.0),
            bottom_left: Point::new(0.0, 100.0),
            bottom_right: Point::new(100.0, 100.0),
        }
    }
}

impl CropCorners {
    pub fn get(&self, corner: Corner) -> Point {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }

    fn get_mut(&mut self, corner: Corner) -> &mut Point {
        match corner {
            Corner::TopLeft => &mut self.top_left,
            Corner::TopRight => &mut self.top_right,
            Corner::BottomLeft => &mut self.bottom_left,
            Corner::BottomRight => &mut self.bottom_right,
        }
    }

    /// Place `corner` at `point`, dragging its neighbours' shared axes along.
    pub fn move_corner(&mut self, corner: Corner, point: Point) {
        *self.get_mut(corner) = point;
        self.get_mut(corner.vertical_neighbour()).x = point.x;
        self.get_mut(corner.horizontal_neighbour()).y = point.y;
    }

    pub fn is_rectangle(&self) -> bool {
        self.top_left.x == self.bottom_left.x
            && self.top_right.x == self.bottom_right.x
            && self.top_left.y == self.top_right.y
            && self.bottom_left.y == self.bottom_right.y
    }

    /// Normalized box. Handles dragged past each other still produce a
    /// positive-size box anchored at the smaller coordinate, so each axis
    /// takes its min against the opposite corner rather than the one it
    /// shares a coordinate with.
    pub fn region(&self) -> CropRegion {
        CropRegion {
            x_percent: self.top_left.x.min(self.top_right.x),
            y_percent: self.top_left.y.min(self.bottom_left.y),
            width_percent: (self.top_right.x - self.top_left.x).abs(),
            height_percent: (self.bottom_left.y - self.top_left.y).abs(),
        }
    }
}

/// Crop rectangle as percentages of the frame.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRegion {
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self {
            x_percent: 0.0,
            y_percent: 0.0,
            width_percent: 100.0,
            height_percent: 100.0,
        }
    }
}

impl CropRegion {
    pub fn is_full_frame(&self) -> bool {
        *self == CropRegion::default()
    }

    /// Pixel rectangle in a `width`×`height` source frame.
    pub fn to_pixels(&self, width: u32, height: u32) -> CropPixels {
        let scale = |percent: f64, dimension: u32| (percent / 100.0 * dimension as f64).round() as u32;
        CropPixels {
            x: scale(self.x_percent, width),
            y: scale(self.y_percent, height),
            width: scale(self.width_percent, width),
            height: scale(self.height_percent, height),
        }
    }
}

/// Crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPixels {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct CropController {
    corners: CropCorners,
    committed: CropRegion,
    commit_due: Option<Instant>,
    commit_delay: Duration,
    cropping: bool,
}

impl CropController {
    pub fn new(commit_delay: Duration) -> Self {
        Self {
            corners: CropCorners::default(),
            committed: CropRegion::default(),
            commit_due: None,
            commit_delay,
            cropping: false,
        }
    }

    pub fn corners(&self) -> &CropCorners {
        &self.corners
    }

    /// Last published region. Unchanged while a drag is in progress.
    pub fn region(&self) -> CropRegion {
        self.committed
    }

    pub fn is_cropping(&self) -> bool {
        self.cropping
    }

    /// Returns true when this flips `is_cropping` on. A commit still pending
    /// from the previous release is dropped; the next release reschedules it.
    pub fn begin(&mut self) -> bool {
        let changed = !self.cropping;
        self.cropping = true;
        self.commit_due = None;
        changed
    }

    pub fn drag(&mut self, corner: Corner, point: Point) -> MoveOutcome {
        if !percent_in_bounds(point.x) || !percent_in_bounds(point.y) {
            return MoveOutcome::Rejected;
        }
        self.cropping = true;
        self.corners.move_corner(corner, point);
        MoveOutcome::Applied
    }

    /// End the gesture and schedule the region to be published after the
    /// commit delay. Returns true when this flips `is_cropping` off.
    pub fn release(&mut self, now: Instant) -> bool {
        let changed = self.cropping;
        self.cropping = false;
        self.commit_due = Some(now + self.commit_delay);
        changed
    }

    /// Publish the pending region once its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<CropRegion> {
        let due = self.commit_due?;
        if self.cropping || now < due {
            return None;
        }
        self.commit_due = None;
        self.committed = self.corners.region();
        log::debug!(
            target: "clip_trim::editor::crop",
            "Crop committed: x={:.2}% y={:.2}% w={:.2}% h={:.2}%",
            self.committed.x_percent,
            self.committed.y_percent,
            self.committed.width_percent,
            self.committed.height_percent
        );
        Some(self.committed)
    }

    pub fn has_pending_commit(&self) -> bool {
        self.commit_due.is_some()
    }
}
