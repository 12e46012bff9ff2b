//! Thumbnail list reordering.
//!
//! A press only *arms* the gesture. Once the pointer has travelled past the
//! threshold, the pressed item is lifted out of the list, an equal-height
//! placeholder takes its slot, and a floating proxy follows the pointer. The
//! placeholder settles before the first remaining item whose vertical
//! midpoint lies below the pointer.

use crate::constants::{DEFAULT_REORDER_THRESHOLD_PX, REORDER_MOVE_EPSILON_PX};
use crate::geometry::Rect;
use crate::interaction::pointer::{PointerEvent, PointerId};
use crate::model::PageId;

/// One thumbnail entry as laid out by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbSlot {
    pub page_id: PageId,
    pub height: f64,
}

/// Vertical layout of the thumbnail list at press time.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbLayout {
    /// Viewport y of the first item.
    pub top: f64,
    /// Space between consecutive items.
    pub gap: f64,
    pub slots: Vec<ThumbSlot>,
}

impl ThumbLayout {
    /// Layout of the thumbnail strip.
    pub fn new(top: f64, gap: f64, slots: Vec<ThumbSlot>) -> Self {
        Self { top, gap, slots }
    }

    /// Uniform-height layout for the given pages.
    pub fn uniform(top: f64, gap: f64, height: f64, pages: impl IntoIterator<Item = PageId>) -> Self {
        let slots = pages
            .into_iter()
            .map(|page_id| ThumbSlot { page_id, height })
            .collect();
        Self::new(top, gap, slots)
    }

    /// Vertical extents (y, height) of each slot, with an optional extra slot
    /// of `gap_height` inserted before index `gap_at`.
    fn extents(&self, gap_at: Option<usize>, gap_height: f64) -> Vec<(f64, f64)> {
        let mut y = self.top;
        let mut out = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            if gap_at == Some(i) {
                y += gap_height + self.gap;
            }
            out.push((y, slot.height));
            y += slot.height + self.gap;
        }
        out
    }
}

/// Result of a finished reorder gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderOutcome {
    /// Released without reordering; treat as a tap on this page.
    Select(PageId),
    /// New page order, by id.
    Reorder(Vec<PageId>),
    /// Forcibly terminated; the list is left as it was.
    Cancelled,
}

/// One entry of the list as it should be displayed mid-gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbEntry {
    Page(PageId),
    Placeholder { height: f64 },
}

/// Reorder state machine: `Idle → Armed → Dragging → Idle`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReorderState {
    #[default]
    Idle,
    Armed {
        pointer: PointerId,
        page_id: PageId,
        origin: (f64, f64),
        layout: ThumbLayout,
        threshold: f64,
    },
    Dragging {
        pointer: PointerId,
        page_id: PageId,
        origin: (f64, f64),
        /// The list with the dragged item removed.
        siblings: ThumbLayout,
        dragged_height: f64,
        /// Sibling index the placeholder sits before.
        placeholder: usize,
        /// Proxy top at lift-off.
        proxy_start_top: f64,
        proxy_top: f64,
        moved: bool,
    },
}

impl ReorderState {
    /// Arm on press. Returns `Idle` if the page is not in the layout.
    pub fn arm(pointer: PointerId, page_id: PageId, origin: (f64, f64), layout: ThumbLayout) -> Self {
        Self::arm_with_threshold(pointer, page_id, origin, layout, DEFAULT_REORDER_THRESHOLD_PX)
    }

    /// Arm a press on a thumbnail with an explicit travel threshold.
    pub fn arm_with_threshold(
        pointer: PointerId,
        page_id: PageId,
        origin: (f64, f64),
        layout: ThumbLayout,
        threshold: f64,
    ) -> Self {
        if !layout.slots.iter().any(|s| s.page_id == page_id) {
            return ReorderState::Idle;
        }
        ReorderState::Armed {
            pointer,
            page_id,
            origin,
            layout,
            threshold,
        }
    }

    /// Whether no press is tracked.
    pub fn is_idle(&self) -> bool {
        matches!(self, ReorderState::Idle)
    }

    /// Whether the thumbnail is being dragged.
    pub fn is_dragging(&self) -> bool {
        matches!(self, ReorderState::Dragging { .. })
    }

    /// Pointer holding the thumbnail.
    pub fn pointer(&self) -> Option<PointerId> {
        match self {
            ReorderState::Armed { pointer, .. } | ReorderState::Dragging { pointer, .. } => {
                Some(*pointer)
            }
            ReorderState::Idle => None,
        }
    }

    /// Floating proxy rect while dragging.
    pub fn proxy_rect(&self, x: f64, width: f64) -> Option<Rect> {
        match self {
            ReorderState::Dragging {
                proxy_top,
                dragged_height,
                ..
            } => Some(Rect::new(x, *proxy_top, width, *dragged_height)),
            _ => None,
        }
    }

    /// The list as it should render right now.
    pub fn entries(&self) -> Vec<ThumbEntry> {
        match self {
            ReorderState::Idle => Vec::new(),
            ReorderState::Armed { layout, .. } => layout
                .slots
                .iter()
                .map(|s| ThumbEntry::Page(s.page_id.clone()))
                .collect(),
            ReorderState::Dragging {
                siblings,
                dragged_height,
                placeholder,
                ..
            } => {
                let mut out: Vec<ThumbEntry> = siblings
                    .slots
                    .iter()
                    .map(|s| ThumbEntry::Page(s.page_id.clone()))
                    .collect();
                out.insert(
                    (*placeholder).min(out.len()),
                    ThumbEntry::Placeholder {
                        height: *dragged_height,
                    },
                );
                out
            }
        }
    }

    /// Apply a move. Events from other pointers are ignored.
    pub fn update(&mut self, event: &PointerEvent) {
        if self.pointer() != Some(event.pointer) {
            return;
        }

        if let ReorderState::Armed {
            origin, threshold, ..
        } = self
        {
            let dist = (event.x - origin.0).hypot(event.y - origin.1);
            if dist < *threshold {
                return;
            }
            self.lift();
        }

        if let ReorderState::Dragging {
            origin,
            siblings,
            dragged_height,
            placeholder,
            proxy_start_top,
            proxy_top,
            moved,
            ..
        } = self
        {
            let dy = event.y - origin.1;
            if dy.abs() > REORDER_MOVE_EPSILON_PX {
                *moved = true;
            }
            *proxy_top = *proxy_start_top + dy;

            let extents = siblings.extents(Some(*placeholder), *dragged_height);
            *placeholder = extents
                .iter()
                .position(|(y, h)| event.y < y + h / 2.0)
                .unwrap_or(extents.len());
        }
    }

    /// Armed → Dragging: detach the item and leave a placeholder in its slot.
    fn lift(&mut self) {
        let ReorderState::Armed {
            pointer,
            page_id,
            origin,
            layout,
            ..
        } = std::mem::take(self)
        else {
            return;
        };
        let Some(idx) = layout.slots.iter().position(|s| s.page_id == page_id) else {
            return;
        };
        let proxy_start_top = layout.extents(None, 0.0)[idx].0;
        let mut siblings = layout;
        let dragged = siblings.slots.remove(idx);
        log::debug!("Thumbnail reorder started for page {}", page_id);
        *self = ReorderState::Dragging {
            pointer,
            page_id,
            origin,
            siblings,
            dragged_height: dragged.height,
            placeholder: idx,
            proxy_start_top,
            proxy_top: proxy_start_top,
            moved: false,
        };
    }

    /// Finish on release or cancel and return to `Idle`.
    ///
    /// Returns `None` (and stays put) for events from other pointers.
    pub fn finish(&mut self, event: &PointerEvent) -> Option<ReorderOutcome> {
        if self.pointer() != Some(event.pointer) {
            return None;
        }
        self.update(event);
        match std::mem::take(self) {
            ReorderState::Idle => None,
            ReorderState::Armed { page_id, .. } => Some(ReorderOutcome::Select(page_id)),
            ReorderState::Dragging {
                page_id,
                moved: false,
                ..
            } => Some(ReorderOutcome::Select(page_id)),
            ReorderState::Dragging {
                page_id,
                siblings,
                placeholder,
                ..
            } => {
                let mut order: Vec<PageId> =
                    siblings.slots.into_iter().map(|s| s.page_id).collect();
                order.insert(placeholder.min(order.len()), page_id);
                Some(ReorderOutcome::Reorder(order))
            }
        }
    }

    /// Forced termination: drop the gesture without committing anything.
    pub fn cancel(&mut self) -> Option<ReorderOutcome> {
        match std::mem::take(self) {
            ReorderState::Idle => None,
            _ => Some(ReorderOutcome::Cancelled),
        }
    }
}
