//! On-screen projection of a page's notes.

use std::collections::HashMap;

use serde::Serialize;

use crate::constants::{DEFAULT_NOTE_HEADER_PX, MIN_VIEW_BODY_HEIGHT_PX};
use crate::geometry::{Rect, to_pixels};
use crate::model::{Document, Mode, NoteId, Page};

/// Presentation flags that shape the projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub mode: Mode,
    /// View-mode "notes movable" toggle.
    pub view_move: bool,
    /// Height of the note header strip.
    pub header_px: f64,
    pub active: Option<NoteId>,
}

impl Presentation {
    /// Take the document's mode flags.
    pub fn from_document(doc: &Document, header_px: f64) -> Self {
        Self {
            mode: doc.mode(),
            view_move: doc.view_move_enabled(),
            header_px,
            active: doc.active_note_id().map(str::to_string),
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            mode: Mode::Edit,
            view_move: false,
            header_px: DEFAULT_NOTE_HEADER_PX,
            active: None,
        }
    }
}

/// One note as it should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    /// Displayed rect in viewport pixels.
    pub rect: Rect,
    pub stack_order: i64,
    /// CSS background with fill opacity applied.
    pub background: String,
    pub foreground: String,
    pub font_size_px: u32,
    pub bold: bool,
    pub header_visible: bool,
    /// Markup may be edited.
    pub editable: bool,
    pub resizable: bool,
    pub header_draggable: bool,
    pub body_draggable: bool,
    pub active: bool,
    pub markup: String,
}

/// Project a page's notes against `image_box`, back to front.
///
/// In view mode the header is hidden and the body moved down by its height,
/// so text stays where it was in edit mode. `overrides` holds displayed rects
/// of notes under a live gesture; those are used verbatim.
pub fn project_screen(
    page: &Page,
    image_box: &Rect,
    presentation: &Presentation,
    overrides: &HashMap<NoteId, Rect>,
) -> Vec<NoteView> {
    let view = presentation.mode == Mode::View;
    let header = presentation.header_px.max(0.0);

    page.notes_by_stack_order()
        .into_iter()
        .map(|note| {
            let rect = match overrides.get(&note.id) {
                Some(live) => *live,
                None => {
                    let r = to_pixels(&note.geometry(), image_box);
                    if view {
                        Rect::new(r.x, r.y + header, r.w, (r.h - header).max(MIN_VIEW_BODY_HEIGHT_PX))
                    } else {
                        r
                    }
                }
            };
            NoteView {
                id: note.id.clone(),
                rect,
                stack_order: note.stack_order,
                background: note.style.background_css(),
                foreground: note.style.foreground.clone(),
                font_size_px: note.style.font_size_px(),
                bold: note.style.bold,
                header_visible: !view,
                editable: !view,
                resizable: !view,
                header_draggable: !view,
                body_draggable: view && presentation.view_move,
                active: presentation.active.as_deref() == Some(note.id.as_str()),
                markup: note.markup.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NormRect;

    fn page_with_note() -> (Page, NoteId) {
        let mut page = Page::blank();
        let id = page.add_note();
        page.note_mut(&id)
            .unwrap()
            .set_geometry(NormRect::new(0.1, 0.1, 0.3, 0.2));
        (page, id)
    }

    fn image_box() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_edit_projection() {
        let (page, id) = page_with_note();
        let pres = Presentation {
            active: Some(id.clone()),
            ..Presentation::default()
        };
        let views = project_screen(&page, &image_box(), &pres, &HashMap::new());
        assert_eq!(views.len(), 1);
        let v = &views[0];
        assert_eq!(v.rect, Rect::new(80.0, 60.0, 240.0, 120.0));
        assert!(v.header_visible && v.editable && v.resizable && v.header_draggable);
        assert!(!v.body_draggable);
        assert!(v.active);
        assert_eq!(v.background, "rgba(255,255,255,0.85)");
    }

    #[test]
    fn test_view_projection_shifts_body() {
        let (page, _) = page_with_note();
        let pres = Presentation {
            mode: Mode::View,
            view_move: true,
            ..Presentation::default()
        };
        let v = &project_screen(&page, &image_box(), &pres, &HashMap::new())[0];
        assert_eq!(v.rect, Rect::new(80.0, 96.0, 240.0, 84.0));
        assert!(!v.header_visible && !v.editable && !v.resizable && !v.header_draggable);
        assert!(v.body_draggable);
    }

    #[test]
    fn test_view_body_height_floor() {
        let mut page = Page::blank();
        let id = page.add_note();
        page.note_mut(&id)
            .unwrap()
            .set_geometry(NormRect::new(0.0, 0.0, 0.1, 0.05));
        let pres = Presentation {
            mode: Mode::View,
            ..Presentation::default()
        };
        let v = &project_screen(&page, &image_box(), &pres, &HashMap::new())[0];
        assert_eq!(v.rect.h, MIN_VIEW_BODY_HEIGHT_PX);
        assert!(!v.body_draggable);
    }

    #[test]
    fn test_live_override_wins() {
        let (page, id) = page_with_note();
        let live = Rect::new(130.0, 40.0, 240.0, 120.0);
        let overrides = HashMap::from([(id, live)]);
        let v = &project_screen(&page, &image_box(), &Presentation::default(), &overrides)[0];
        assert_eq!(v.rect, live);
    }

    #[test]
    fn test_back_to_front_order() {
        let mut page = Page::blank();
        let a = page.add_note();
        let b = page.add_note();
        page.bring_to_front(&a);
        let views = project_screen(&page, &image_box(), &Presentation::default(), &HashMap::new());
        let ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec![b.as_str(), a.as_str()]);
    }
}
