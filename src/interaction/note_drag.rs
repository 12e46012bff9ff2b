//! Drag and resize sessions for a single note.
//!
//! While a session runs, the note's pixel rect is moved directly by the
//! pointer delta; nothing is normalized until release, which keeps rounding
//! from feeding back into the gesture.

use crate::constants::{MIN_RESIZE_HEIGHT_PX, MIN_RESIZE_WIDTH_PX};
use crate::geometry::Rect;
use crate::interaction::pointer::{PointerEvent, PointerId};
use crate::model::NoteId;

/// What the pointer is doing to the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteGestureKind {
    /// Move the whole note (header in edit mode, body in view mode).
    Drag,
    /// Grow or shrink from the corner handle.
    Resize,
}

/// Final geometry of a finished session, in stored-frame pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRelease {
    pub note_id: NoteId,
    pub kind: NoteGestureKind,
    pub rect: Rect,
}

/// Drag/resize state machine: `Idle → Active → Idle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NoteDragState {
    #[default]
    Idle,
    Active {
        pointer: PointerId,
        note_id: NoteId,
        kind: NoteGestureKind,
        /// Pointer position at press.
        origin: (f64, f64),
        /// Displayed rect at press.
        start: Rect,
        /// Displayed rect now.
        current: Rect,
        /// How far the displayed rect is shifted from the stored one
        /// (the hidden header height in view mode, zero otherwise).
        header_offset: f64,
    },
}

impl NoteDragState {
    /// Start a session from the note's displayed rect.
    pub fn begin(
        pointer: PointerId,
        note_id: NoteId,
        kind: NoteGestureKind,
        origin: (f64, f64),
        displayed: Rect,
        header_offset: f64,
    ) -> Self {
        log::debug!("Note {:?} started on {} by pointer {}", kind, note_id, pointer);
        NoteDragState::Active {
            pointer,
            note_id,
            kind,
            origin,
            start: displayed,
            current: displayed,
            header_offset,
        }
    }

    /// Whether a drag or resize is running.
    pub fn is_active(&self) -> bool {
        matches!(self, NoteDragState::Active { .. })
    }

    /// Pointer driving the gesture.
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            NoteDragState::Active { pointer, .. } => Some(*pointer),
            NoteDragState::Idle => None,
        }
    }

    /// Note being moved or resized.
    pub fn note_id(&self) -> Option<&str> {
        match self {
            NoteDragState::Active { note_id, .. } => Some(note_id),
            NoteDragState::Idle => None,
        }
    }

    /// Displayed rect while the session runs.
    pub fn current_rect(&self) -> Option<Rect> {
        match self {
            NoteDragState::Active { current, .. } => Some(*current),
            NoteDragState::Idle => None,
        }
    }

    /// Apply a move. Events from other pointers are ignored.
    pub fn update(&mut self, event: &PointerEvent) -> Option<Rect> {
        let NoteDragState::Active {
            pointer,
            kind,
            origin,
            start,
            current,
            ..
        } = self
        else {
            return None;
        };
        if event.pointer != *pointer {
            return None;
        }

        let dx = event.x - origin.0;
        let dy = event.y - origin.1;
        *current = match kind {
            NoteGestureKind::Drag => start.offset(dx, dy),
            NoteGestureKind::Resize => Rect::new(
                start.x,
                start.y,
                (start.w + dx).max(MIN_RESIZE_WIDTH_PX),
                (start.h + dy).max(MIN_RESIZE_HEIGHT_PX),
            ),
        };
        Some(*current)
    }

    /// Finish the session on release or cancel and return to `Idle`.
    ///
    /// The release position is applied as a last move first. Returns `None`
    /// (and stays put) for events from other pointers.
    pub fn finish(&mut self, event: &PointerEvent) -> Option<NoteRelease> {
        if self.pointer() != Some(event.pointer) {
            return None;
        }
        self.update(event);
        self.terminate()
    }

    /// End the session at its current rect without a pointer event.
    pub fn terminate(&mut self) -> Option<NoteRelease> {
        match std::mem::take(self) {
            NoteDragState::Active {
                note_id,
                kind,
                current,
                header_offset,
                ..
            } => Some(NoteRelease {
                note_id,
                kind,
                // Undo the display shift: the stored note starts above the
                // visible body and includes the hidden header.
                rect: Rect::new(
                    current.x,
                    current.y - header_offset,
                    current.w,
                    current.h + header_offset,
                ),
            }),
            NoteDragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(kind: NoteGestureKind, header: f64) -> NoteDragState {
        NoteDragState::begin(
            7,
            "n".into(),
            kind,
            (100.0, 100.0),
            Rect::new(80.0, 60.0, 240.0, 120.0),
            header,
        )
    }

    #[test]
    fn test_drag_follows_pointer_delta() {
        let mut s = start(NoteGestureKind::Drag, 0.0);
        let r = s.update(&PointerEvent::new(7, 150.0, 80.0)).unwrap();
        assert_eq!(r, Rect::new(130.0, 40.0, 240.0, 120.0));
    }

    #[test]
    fn test_foreign_pointer_ignored() {
        let mut s = start(NoteGestureKind::Drag, 0.0);
        assert!(s.update(&PointerEvent::new(8, 500.0, 500.0)).is_none());
        assert!(s.finish(&PointerEvent::new(8, 500.0, 500.0)).is_none());
        assert!(s.is_active());
        assert_eq!(s.current_rect(), Some(Rect::new(80.0, 60.0, 240.0, 120.0)));
    }

    #[test]
    fn test_resize_floors_at_minimum() {
        let mut s = start(NoteGestureKind::Resize, 0.0);
        let r = s.update(&PointerEvent::new(7, -400.0, -400.0)).unwrap();
        assert_eq!(r, Rect::new(80.0, 60.0, MIN_RESIZE_WIDTH_PX, MIN_RESIZE_HEIGHT_PX));
        let r = s.update(&PointerEvent::new(7, 130.0, 110.0)).unwrap();
        assert_eq!(r, Rect::new(80.0, 60.0, 270.0, 130.0));
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut s = start(NoteGestureKind::Drag, 0.0);
        let release = s.finish(&PointerEvent::new(7, 150.0, 80.0)).unwrap();
        assert_eq!(release.rect, Rect::new(130.0, 40.0, 240.0, 120.0));
        assert_eq!(s, NoteDragState::Idle);
        assert!(s.terminate().is_none());
    }

    #[test]
    fn test_view_mode_release_restores_header() {
        let mut s = start(NoteGestureKind::Drag, 36.0);
        let release = s.finish(&PointerEvent::new(7, 110.0, 100.0)).unwrap();
        assert_eq!(release.rect, Rect::new(90.0, 24.0, 240.0, 156.0));
    }
}
