//! Drag-state machine and the per-gesture listener scope.

use super::crop::Corner;
use super::media::DocumentHost;

/// Which handle the current gesture manipulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    TrimLeft,
    TrimRight,
    Scrub,
    CropCorner(Corner),
}

impl DragState {
    pub fn is_active(self) -> bool {
        self != DragState::Idle
    }

    pub fn is_trim(self) -> bool {
        matches!(self, DragState::TrimLeft | DragState::TrimRight)
    }

    pub fn is_crop(self) -> bool {
        matches!(self, DragState::CropCorner(_))
    }
}

/// Resources held for the lifetime of one gesture: the document-level
/// pointer listeners and, for overlay drags on small screens, a pinned scroll
/// position. Acquisition is idempotent and release restores everything.
#[derive(Debug, Default)]
pub struct GestureScope {
    listening: bool,
    pinned_scroll: Option<f64>,
}

impl GestureScope {
    pub fn acquire_listeners(&mut self, host: &mut impl DocumentHost) {
        if !self.listening {
            host.attach_pointer_listeners();
            self.listening = true;
        }
    }

    pub fn pin_scroll(&mut self, host: &mut impl DocumentHost) {
        if self.pinned_scroll.is_none() {
            let offset = host.scroll_offset();
            host.pin_scroll(offset);
            self.pinned_scroll = Some(offset);
        }
    }

    pub fn release(&mut self, host: &mut impl DocumentHost) {
        if let Some(offset) = self.pinned_scroll.take() {
            host.unpin_scroll();
            host.scroll_to(offset);
        }
        if self.listening {
            host.detach_pointer_listeners();
            self.listening = false;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_scroll_pinned(&self) -> bool {
        self.pinned_scroll.is_some()
    }
}

#[derive(Debug, Default)]
pub struct DragMachine {
    state: DragState,
    scope: GestureScope,
}

impl DragMachine {
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Start a gesture. Presses while another gesture is live are ignored.
    pub fn begin(
        &mut self,
        target: DragState,
        host: &mut impl DocumentHost,
        suspend_scroll: bool,
    ) -> bool {
        if self.state.is_active() || !target.is_active() {
            return false;
        }
        self.state = target;
        self.scope.acquire_listeners(host);
        if suspend_scroll {
            self.scope.pin_scroll(host);
        }
        log::trace!(target: "clip_trim::editor::drag", "Gesture started: {:?}", target);
        true
    }

    /// End the gesture, returning the state that was active. Idle releases
    /// return `None` and touch nothing.
    pub fn end(&mut self, host: &mut impl DocumentHost) -> Option<DragState> {
        if !self.state.is_active() {
            return None;
        }
        let ended = std::mem::take(&mut self.state);
        self.scope.release(host);
        log::trace!(target: "clip_trim::editor::drag", "Gesture ended: {:?}", ended);
        Some(ended)
    }

    /// Drop any live gesture without reporting it, e.g. on session teardown.
    pub fn abandon(&mut self, host: &mut impl DocumentHost) {
        self.state = DragState::Idle;
        self.scope.release(host);
    }

    pub fn scope(&self) -> &GestureScope {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HeadlessDocument;

    #[test]
    fn begin_attaches_listeners_once() {
        let mut doc = HeadlessDocument::default();
        let mut drag = DragMachine::default();
        assert!(drag.begin(DragState::TrimLeft, &mut doc, false));
        assert!(!drag.begin(DragState::TrimRight, &mut doc, false));
        assert_eq!(drag.state(), DragState::TrimLeft);
        assert_eq!(doc.attach_calls, 1);
        assert_eq!(doc.listeners_attached, 1);
    }

    #[test]
    fn end_detaches_and_returns_to_idle() {
        let mut doc = HeadlessDocument::default();
        let mut drag = DragMachine::default();
        drag.begin(DragState::Scrub, &mut doc, false);
        assert_eq!(drag.end(&mut doc), Some(DragState::Scrub));
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(doc.listeners_attached, 0);
        assert!(!drag.scope().is_listening());
    }

    #[test]
    fn idle_release_is_a_no_op() {
        let mut doc = HeadlessDocument::default();
        let mut drag = DragMachine::default();
        assert_eq!(drag.end(&mut doc), None);
        assert_eq!(doc.detach_calls, 0);
        assert_eq!(doc.scroll_restores, 0);
    }

    #[test]
    fn pinned_scroll_is_restored_to_original_offset() {
        let mut doc = HeadlessDocument {
            scroll: 640.0,
            ..HeadlessDocument::default()
        };
        let mut drag = DragMachine::default();
        drag.begin(DragState::CropCorner(Corner::TopLeft), &mut doc, true);
        assert_eq!(doc.pinned_at, Some(640.0));

        doc.scroll = 0.0;
        drag.end(&mut doc);
        assert_eq!(doc.pinned_at, None);
        assert_eq!(doc.scroll, 640.0);
        assert_eq!(doc.scroll_restores, 1);
    }

    #[test]
    fn beginning_idle_is_rejected() {
        let mut doc = HeadlessDocument::default();
        let mut drag = DragMachine::default();
        assert!(!drag.begin(DragState::Idle, &mut doc, false));
        assert_eq!(doc.attach_calls, 0);
    }
}
