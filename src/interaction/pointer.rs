//! Pointer input as seen by the gesture state machines.

/// Identifier the platform assigns to one finger, pen, or mouse.
pub type PointerId = u32;

/// Lifecycle phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform took the pointer away (capture lost, gesture stolen).
    Cancel,
}

impl PointerPhase {
    /// Up and Cancel both end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PointerPhase::Up | PointerPhase::Cancel)
    }
}

/// A pointer position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    /// Event for `pointer` at page coordinates.
    pub fn new(pointer: PointerId, x: f64, y: f64) -> Self {
        Self { pointer, x, y }
    }

    /// Position as a tuple.
    pub fn pos(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}
