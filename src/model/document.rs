//! Document model: ordered pages, cursor, mode, and the active selection.

use serde::{Deserialize, Serialize};

use crate::model::note::{Note, NoteId};
use crate::model::page::{Page, PageId};

/// Global presentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full manipulation: header drag, resize, markup editing.
    #[default]
    Edit,
    /// Read-only presentation; notes may optionally be moved by their body.
    View,
}

impl Mode {
    /// Name used in stored records.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Edit => "edit",
            Mode::View => "view",
        }
    }

    /// Parse a stored mode string; anything unrecognised means edit.
    pub fn from_name(name: &str) -> Self {
        match name {
            "view" => Mode::View,
            _ => Mode::Edit,
        }
    }

    /// The other mode.
    pub fn toggled(&self) -> Self {
        match self {
            Mode::Edit => Mode::View,
            Mode::View => Mode::Edit,
        }
    }
}

/// A single edit coming from the style side panel.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleEdit {
    Background(String),
    Foreground(String),
    Opacity(f64),
    FontSize(i64),
    ToggleBold,
}

/// The full persisted unit: ordered pages plus session cursor and mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pages: Vec<Page>,
    index: usize,
    mode: Mode,
    /// Active note for the style panel; not persisted.
    active_note: Option<NoteId>,
    /// View-mode "notes movable" toggle; not persisted.
    view_move_enabled: bool,
}

impl Document {
    /// Empty document in edit mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from restored parts, clamping the cursor.
    pub fn from_parts(pages: Vec<Page>, index: usize, mode: Mode) -> Self {
        let mut doc = Self {
            pages,
            index: 0,
            mode,
            active_note: None,
            view_move_enabled: false,
        };
        doc.index = doc.clamp_index(index);
        doc
    }

    fn clamp_index(&self, index: usize) -> usize {
        index.min(self.pages.len().saturating_sub(1))
    }

    /// Pages in display order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Page by id.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Mutable page by id.
    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// Position of a page.
    pub fn page_index(&self, id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Index of the current page.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The page being shown.
    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.index)
    }

    /// Mutable page being shown.
    pub fn current_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.get_mut(self.index)
    }

    /// Move the cursor, clamped into range.
    pub fn show_page(&mut self, index: usize) {
        self.index = self.clamp_index(index);
    }

    /// Advance the cursor, wrapping past the last page.
    pub fn next_page(&mut self) {
        if !self.pages.is_empty() {
            self.index = (self.index + 1) % self.pages.len();
        }
    }

    /// Step the cursor back, wrapping before the first page.
    pub fn prev_page(&mut self) {
        if !self.pages.is_empty() {
            let len = self.pages.len();
            self.index = (self.index + len - 1) % len;
        }
    }

    /// Append a page without changing the cursor.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Remove a page and its notes.
    ///
    /// If it was current, the cursor stays at the same position (clamped);
    /// otherwise the cursor index is kept, clamped.
    pub fn remove_page(&mut self, id: &str) -> Option<Page> {
        let idx = self.page_index(id)?;
        let page = self.pages.remove(idx);
        let was_current = idx == self.index;
        self.index = self.clamp_index(if was_current { idx } else { self.index });
        if self
            .active_note
            .as_deref()
            .is_some_and(|active| page.note(active).is_some())
        {
            self.active_note = None;
        }
        Some(page)
    }

    /// Drop every page.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.index = 0;
        self.active_note = None;
    }

    /// Commit a new page order, keeping the current page by identity.
    ///
    /// Unknown ids are ignored; pages missing from `order` keep their
    /// relative order after the listed ones.
    pub fn reorder_pages(&mut self, order: &[PageId]) {
        let current_id = self.current_page().map(|p| p.id.clone());
        let mut remaining = std::mem::take(&mut self.pages);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|p| &p.id == id) {
                reordered.push(remaining.remove(pos));
            }
        }
        reordered.append(&mut remaining);
        self.pages = reordered;

        let found = current_id.and_then(|id| self.page_index(&id));
        self.index = match found {
            Some(i) => i,
            None => self.clamp_index(self.index),
        };
        log::debug!("Reordered {} pages, current index {}", self.pages.len(), self.index);
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch mode. Clears the selection; entering view resets "notes movable".
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.active_note = None;
        if mode == Mode::View {
            self.view_move_enabled = false;
        }
        log::debug!("Mode set to {}", mode.name());
    }

    /// Whether the document is in view mode.
    pub fn is_view(&self) -> bool {
        self.mode == Mode::View
    }

    /// Whether notes can be dragged in view mode.
    pub fn view_move_enabled(&self) -> bool {
        self.view_move_enabled
    }

    /// Flip the view-mode move toggle. Has no effect in edit mode.
    pub fn toggle_view_move(&mut self) -> bool {
        if self.is_view() {
            self.view_move_enabled = !self.view_move_enabled;
        }
        self.view_move_enabled
    }

    /// Id of the selected note.
    pub fn active_note_id(&self) -> Option<&str> {
        self.active_note.as_deref()
    }

    /// Select a note on the current page, or clear the selection with `None`.
    pub fn select_note(&mut self, id: Option<&str>) {
        self.active_note = id
            .filter(|id| self.current_page().is_some_and(|p| p.note(id).is_some()))
            .map(str::to_string);
    }

    /// The selected note on the current page.
    pub fn active_note(&self) -> Option<&Note> {
        let id = self.active_note.as_deref()?;
        self.current_page()?.note(id)
    }

    fn active_note_mut(&mut self) -> Option<&mut Note> {
        let id = self.active_note.clone()?;
        self.current_page_mut()?.note_mut(&id)
    }

    /// Add a default note to the current page, creating a blank page first
    /// if the document is empty. The new note becomes active.
    pub fn add_note(&mut self) -> Option<NoteId> {
        if self.is_view() {
            return None;
        }
        if self.pages.is_empty() {
            self.pages.push(Page::blank());
            self.index = 0;
        }
        let id = self.current_page_mut()?.add_note();
        self.active_note = Some(id.clone());
        Some(id)
    }

    /// Delete a note from the current page.
    pub fn delete_note(&mut self, id: &str) -> Option<Note> {
        let removed = self.current_page_mut()?.remove_note(id)?;
        if self.active_note.as_deref() == Some(id) {
            self.active_note = None;
        }
        Some(removed)
    }

    /// Delete the selected note.
    pub fn delete_active_note(&mut self) -> Option<Note> {
        let id = self.active_note.clone()?;
        self.delete_note(&id)
    }

    /// Write a style-panel edit through to the active note.
    ///
    /// Returns whether anything changed. Ignored in view mode.
    pub fn apply_style(&mut self, edit: StyleEdit) -> bool {
        if self.is_view() {
            return false;
        }
        let Some(note) = self.active_note_mut() else {
            return false;
        };
        let style = &mut note.style;
        match edit {
            StyleEdit::Background(c) => style.background = c,
            StyleEdit::Foreground(c) => style.foreground = c,
            StyleEdit::Opacity(a) => style.set_opacity(a),
            StyleEdit::FontSize(px) => style.set_font_size_px(px),
            StyleEdit::ToggleBold => style.bold = !style.bold,
        }
        true
    }

    /// Replace a note's markup. Only allowed in edit mode.
    pub fn set_note_markup(&mut self, id: &str, markup: impl Into<String>) -> bool {
        if self.is_view() {
            return false;
        }
        match self.current_page_mut().and_then(|p| p.note_mut(id)) {
            Some(note) => {
                note.markup = markup.into();
                true
            }
            None => false,
        }
    }

    /// Replace the current page's memo.
    pub fn set_memo(&mut self, memo: impl Into<String>) -> bool {
        match self.current_page_mut() {
            Some(page) => {
                page.memo = memo.into();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_pages(n: usize) -> Document {
        let pages = (0..n)
            .map(|i| Page::new(format!("p{}", i), "image/png", None))
            .collect();
        Document::from_parts(pages, 0, Mode::Edit)
    }

    fn ids(doc: &Document) -> Vec<String> {
        doc.pages().iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_from_parts_clamps_index() {
        let doc = Document::from_parts(vec![Page::blank()], 9, Mode::View);
        assert_eq!(doc.index(), 0);
        assert_eq!(doc.mode(), Mode::View);
        assert_eq!(Document::from_parts(Vec::new(), 3, Mode::Edit).index(), 0);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut doc = doc_with_pages(3);
        doc.prev_page();
        assert_eq!(doc.index(), 2);
        doc.next_page();
        assert_eq!(doc.index(), 0);
        doc.show_page(10);
        assert_eq!(doc.index(), 2);
    }

    #[test]
    fn test_reorder_preserves_current_by_id() {
        let mut doc = doc_with_pages(4);
        doc.show_page(1);
        let current = doc.current_page().unwrap().id.clone();
        let mut order = ids(&doc);
        order.reverse();
        doc.reorder_pages(&order);
        assert_eq!(ids(&doc), order);
        assert_eq!(doc.current_page().unwrap().id, current);
        assert_eq!(doc.index(), 2);
    }

    #[test]
    fn test_reorder_keeps_unlisted_pages() {
        let mut doc = doc_with_pages(3);
        let original = ids(&doc);
        doc.reorder_pages(&[original[2].clone(), "bogus".to_string()]);
        assert_eq!(ids(&doc), vec![original[2].clone(), original[0].clone(), original[1].clone()]);
    }

    #[test]
    fn test_remove_current_page_keeps_position() {
        let mut doc = doc_with_pages(3);
        let original = ids(&doc);
        doc.show_page(2);
        doc.remove_page(&original[2]);
        assert_eq!(doc.index(), 1);
        doc.show_page(0);
        doc.remove_page(&original[1]);
        assert_eq!(doc.index(), 0);
        assert_eq!(doc.current_page().unwrap().id, original[0]);
    }

    #[test]
    fn test_add_note_to_empty_document_creates_blank_page() {
        let mut doc = Document::new();
        let id = doc.add_note().unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.active_note_id(), Some(id.as_str()));
    }

    #[test]
    fn test_add_note_refused_in_view_mode() {
        let mut doc = doc_with_pages(1);
        doc.set_mode(Mode::View);
        assert!(doc.add_note().is_none());
    }

    #[test]
    fn test_mode_switch_clears_selection_and_view_move() {
        let mut doc = doc_with_pages(1);
        doc.add_note();
        doc.set_mode(Mode::View);
        assert!(doc.active_note_id().is_none());
        assert!(doc.toggle_view_move());
        doc.set_mode(Mode::Edit);
        assert!(!doc.toggle_view_move());
        doc.set_mode(Mode::View);
        assert!(!doc.view_move_enabled());
    }

    #[test]
    fn test_single_selection() {
        let mut doc = doc_with_pages(1);
        let a = doc.add_note().unwrap();
        let b = doc.add_note().unwrap();
        doc.select_note(Some(&a));
        assert_eq!(doc.active_note_id(), Some(a.as_str()));
        doc.select_note(Some(&b));
        assert_eq!(doc.active_note_id(), Some(b.as_str()));
        doc.select_note(Some("missing"));
        assert!(doc.active_note_id().is_none());
    }

    #[test]
    fn test_apply_style_clamps_and_writes_through() {
        let mut doc = doc_with_pages(1);
        doc.add_note();
        assert!(doc.apply_style(StyleEdit::Opacity(0.01)));
        assert!(doc.apply_style(StyleEdit::FontSize(99)));
        assert!(doc.apply_style(StyleEdit::ToggleBold));
        assert!(doc.apply_style(StyleEdit::Background("#123456".into())));
        let style = &doc.active_note().unwrap().style;
        assert_eq!(style.opacity(), 0.2);
        assert_eq!(style.font_size_px(), 48);
        assert!(style.bold);
        assert_eq!(style.background, "#123456");
    }

    #[test]
    fn test_apply_style_without_selection() {
        let mut doc = doc_with_pages(1);
        assert!(!doc.apply_style(StyleEdit::ToggleBold));
    }

    #[test]
    fn test_delete_active_note() {
        let mut doc = doc_with_pages(1);
        doc.add_note();
        assert!(doc.delete_active_note().is_some());
        assert!(doc.active_note_id().is_none());
        assert!(doc.current_page().unwrap().notes.is_empty());
    }

    #[test]
    fn test_markup_edit_refused_in_view_mode() {
        let mut doc = doc_with_pages(1);
        let id = doc.add_note().unwrap();
        assert!(doc.set_note_markup(&id, "<b>hi</b>"));
        doc.set_mode(Mode::View);
        assert!(!doc.set_note_markup(&id, "nope"));
        assert_eq!(doc.current_page().unwrap().note(&id).unwrap().markup, "<b>hi</b>");
    }
}
