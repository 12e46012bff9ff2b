//! Routes pointer events to the gesture session each pointer owns.

use std::collections::HashMap;

use crate::geometry::Rect;
use crate::interaction::note_drag::{NoteDragState, NoteGestureKind, NoteRelease};
use crate::interaction::pointer::{PointerEvent, PointerId, PointerPhase};
use crate::interaction::reorder::{ReorderOutcome, ReorderState, ThumbLayout};
use crate::model::{NoteId, PageId};

/// A live session bound to one pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureSession {
    Note(NoteDragState),
    Reorder(ReorderState),
}

/// What a routed event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutput {
    /// A note's displayed rect changed mid-gesture.
    NoteMoved { note_id: NoteId, rect: Rect },
    /// A note session ended; the rect is ready to normalize.
    NoteReleased(NoteRelease),
    /// A reorder session ended.
    Reorder(ReorderOutcome),
}

/// Owns all concurrent gesture sessions.
///
/// A pointer drives at most one session, and a note is driven by at most
/// one pointer. Events from pointers without a session are ignored.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    sessions: HashMap<PointerId, GestureSession>,
}

impl GestureTracker {
    /// Tracker with no gestures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no gesture is running.
    pub fn is_idle(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of running note gestures.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether `pointer` already drives a gesture.
    pub fn is_pointer_busy(&self, pointer: PointerId) -> bool {
        self.sessions.contains_key(&pointer)
    }

    fn is_note_busy(&self, note_id: &str) -> bool {
        self.sessions.values().any(|s| match s {
            GestureSession::Note(n) => n.note_id() == Some(note_id),
            GestureSession::Reorder(_) => false,
        })
    }

    fn is_reordering(&self) -> bool {
        self.sessions
            .values()
            .any(|s| matches!(s, GestureSession::Reorder(_)))
    }

    /// Start a drag or resize. Returns false if the pointer or note is busy.
    pub fn begin_note(
        &mut self,
        event: &PointerEvent,
        note_id: &str,
        kind: NoteGestureKind,
        displayed: Rect,
        header_offset: f64,
    ) -> bool {
        if self.is_pointer_busy(event.pointer) || self.is_note_busy(note_id) {
            log::trace!("Ignoring press on busy note {} by pointer {}", note_id, event.pointer);
            return false;
        }
        let state = NoteDragState::begin(
            event.pointer,
            note_id.to_string(),
            kind,
            event.pos(),
            displayed,
            header_offset,
        );
        self.sessions.insert(event.pointer, GestureSession::Note(state));
        true
    }

    /// Arm a thumbnail reorder. Only one reorder may run at a time.
    pub fn begin_reorder(
        &mut self,
        event: &PointerEvent,
        page_id: &str,
        layout: ThumbLayout,
        threshold: f64,
    ) -> bool {
        if self.is_pointer_busy(event.pointer) || self.is_reordering() {
            return false;
        }
        let state = ReorderState::arm_with_threshold(
            event.pointer,
            page_id.to_string(),
            event.pos(),
            layout,
            threshold,
        );
        if state.is_idle() {
            return false;
        }
        self.sessions.insert(event.pointer, GestureSession::Reorder(state));
        true
    }

    /// Route a move/up/cancel event. Down events are handled by `begin_*`.
    pub fn handle(&mut self, phase: PointerPhase, event: &PointerEvent) -> Option<GestureOutput> {
        if phase == PointerPhase::Down {
            return None;
        }
        let session = self.sessions.get_mut(&event.pointer)?;

        if !phase.is_terminal() {
            return match session {
                GestureSession::Note(state) => {
                    let rect = state.update(event)?;
                    let note_id = state.note_id()?.to_string();
                    Some(GestureOutput::NoteMoved { note_id, rect })
                }
                GestureSession::Reorder(state) => {
                    state.update(event);
                    None
                }
            };
        }

        let output = match session {
            GestureSession::Note(state) => state.finish(event).map(GestureOutput::NoteReleased),
            GestureSession::Reorder(state) => state.finish(event).map(GestureOutput::Reorder),
        };
        self.sessions.remove(&event.pointer);
        output
    }

    /// Forcibly end every session (window blur, page hidden).
    ///
    /// Note sessions commit where they currently are; reorders are dropped.
    pub fn cancel_all(&mut self) -> Vec<GestureOutput> {
        let mut out = Vec::new();
        for (pointer, session) in self.sessions.drain() {
            log::debug!("Force-ending gesture for pointer {}", pointer);
            match session {
                GestureSession::Note(mut state) => {
                    if let Some(release) = state.terminate() {
                        out.push(GestureOutput::NoteReleased(release));
                    }
                }
                GestureSession::Reorder(mut state) => {
                    if let Some(outcome) = state.cancel() {
                        out.push(GestureOutput::Reorder(outcome));
                    }
                }
            }
        }
        out
    }

    /// Displayed rects of notes currently under a gesture.
    pub fn live_rects(&self) -> HashMap<NoteId, Rect> {
        self.sessions
            .values()
            .filter_map(|s| match s {
                GestureSession::Note(n) => Some((n.note_id()?.to_string(), n.current_rect()?)),
                GestureSession::Reorder(_) => None,
            })
            .collect()
    }

    /// The running reorder session, if any.
    pub fn reorder_state(&self) -> Option<&ReorderState> {
        self.sessions.values().find_map(|s| match s {
            GestureSession::Reorder(r) => Some(r),
            GestureSession::Note(_) => None,
        })
    }

    /// Pages referenced by a running reorder.
    pub fn reordering_page(&self) -> Option<PageId> {
        match self.reorder_state()? {
            ReorderState::Armed { page_id, .. } | ReorderState::Dragging { page_id, .. } => {
                Some(page_id.clone())
            }
            ReorderState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect::new(80.0, 60.0, 240.0, 120.0)
    }

    #[test]
    fn test_two_pointers_two_notes_independent() {
        let mut t = GestureTracker::new();
        assert!(t.begin_note(&PointerEvent::new(1, 0.0, 0.0), "a", NoteGestureKind::Drag, rect(), 0.0));
        assert!(t.begin_note(&PointerEvent::new(2, 0.0, 0.0), "b", NoteGestureKind::Resize, rect(), 0.0));

        t.handle(PointerPhase::Move, &PointerEvent::new(1, 10.0, 10.0));
        t.handle(PointerPhase::Move, &PointerEvent::new(2, 50.0, 50.0));
        let live = t.live_rects();
        assert_eq!(live["a"], Rect::new(90.0, 70.0, 240.0, 120.0));
        assert_eq!(live["b"], Rect::new(80.0, 60.0, 290.0, 170.0));

        let out = t.handle(PointerPhase::Up, &PointerEvent::new(1, 10.0, 10.0));
        assert!(matches!(out, Some(GestureOutput::NoteReleased(ref r)) if r.note_id == "a"));
        assert_eq!(t.session_count(), 1);
    }

    #[test]
    fn test_pointer_drives_one_session() {
        let mut t = GestureTracker::new();
        let ev = PointerEvent::new(1, 0.0, 0.0);
        assert!(t.begin_note(&ev, "a", NoteGestureKind::Drag, rect(), 0.0));
        assert!(!t.begin_note(&ev, "b", NoteGestureKind::Drag, rect(), 0.0));
        assert!(!t.begin_note(&PointerEvent::new(2, 0.0, 0.0), "a", NoteGestureKind::Drag, rect(), 0.0));
    }

    #[test]
    fn test_unbound_pointer_ignored() {
        let mut t = GestureTracker::new();
        assert!(t.handle(PointerPhase::Up, &PointerEvent::new(9, 0.0, 0.0)).is_none());
        assert!(t.is_idle());
    }

    #[test]
    fn test_cancel_phase_terminates() {
        let mut t = GestureTracker::new();
        t.begin_note(&PointerEvent::new(1, 0.0, 0.0), "a", NoteGestureKind::Drag, rect(), 0.0);
        let out = t.handle(PointerPhase::Cancel, &PointerEvent::new(1, 5.0, 0.0));
        assert!(matches!(out, Some(GestureOutput::NoteReleased(_))));
        assert!(t.is_idle());
    }

    #[test]
    fn test_cancel_all() {
        let mut t = GestureTracker::new();
        t.begin_note(&PointerEvent::new(1, 0.0, 0.0), "a", NoteGestureKind::Drag, rect(), 0.0);
        let layout = ThumbLayout::uniform(0.0, 0.0, 40.0, ["p".to_string(), "q".to_string()]);
        assert!(t.begin_reorder(&PointerEvent::new(2, 0.0, 10.0), "p", layout, 6.0));
        let out = t.cancel_all();
        assert_eq!(out.len(), 2);
        assert!(out.contains(&GestureOutput::Reorder(ReorderOutcome::Cancelled)));
        assert!(t.is_idle());
    }
}
