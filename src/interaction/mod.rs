//! Pointer-driven gesture state machines.
//!
//! - [`NoteDragState`]: drag/resize of a single note (`Idle → Active → Idle`)
//! - [`ReorderState`]: thumbnail list reordering (`Idle → Armed → Dragging → Idle`)
//! - [`GestureTracker`]: binds sessions to pointer ids for multi-touch

mod note_drag;
mod pointer;
mod reorder;
mod tracker;

pub use note_drag::{NoteDragState, NoteGestureKind, NoteRelease};
pub use pointer::{PointerEvent, PointerId, PointerPhase};
pub use reorder::{ReorderOutcome, ReorderState, ThumbEntry, ThumbLayout, ThumbSlot};
pub use tracker::{GestureOutput, GestureSession, GestureTracker};
