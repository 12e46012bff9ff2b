//! Page data model: one image plus its ordered notes.

use std::io::Cursor;

use crate::constants::{BASE_STACK_ORDER, BLANK_PAGE_NAME};
use crate::model::note::{Note, NoteId, new_id};

/// Unique identifier for a page.
pub type PageId = String;

/// Read the intrinsic pixel size of an encoded image without decoding pixels.
///
/// Returns `None` for unknown or corrupt payloads.
pub fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("Could not read image dimensions: {}", e);
            None
        }
    }
}

/// One page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub mime: String,
    /// Free-text memo markup attached to the whole page.
    pub memo: String,
    image: Option<Vec<u8>>,
    /// Intrinsic image size, derived from `image`; never persisted.
    dimensions: Option<(u32, u32)>,
    pub notes: Vec<Note>,
    /// Highest stack order ever handed out on this page.
    stack_high_water: i64,
}

impl Page {
    /// Create a page for an image payload.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, image: Option<Vec<u8>>) -> Self {
        Self::with_id(new_id(), name, mime, image)
    }

    /// Create a page with a known id (used when restoring).
    pub fn with_id(
        id: PageId,
        name: impl Into<String>,
        mime: impl Into<String>,
        image: Option<Vec<u8>>,
    ) -> Self {
        let mut page = Self {
            id,
            name: name.into(),
            mime: mime.into(),
            memo: String::new(),
            image: None,
            dimensions: None,
            notes: Vec::new(),
            stack_high_water: BASE_STACK_ORDER,
        };
        page.set_image(image);
        page
    }

    /// A page with no image, used when notes are added to an empty document.
    pub fn blank() -> Self {
        Self::new(BLANK_PAGE_NAME, "", None)
    }

    /// Raw encoded image bytes, if the page has any.
    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    /// Replace the image payload and re-derive its intrinsic size.
    pub fn set_image(&mut self, image: Option<Vec<u8>>) {
        self.dimensions = image.as_deref().and_then(probe_dimensions);
        self.image = image;
    }

    /// Pixel dimensions, once known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Override the intrinsic size, e.g. once the host has decoded the image.
    pub fn set_dimensions(&mut self, dimensions: Option<(u32, u32)>) {
        self.dimensions = dimensions;
    }

    /// Replace the notes wholesale and resync the stack-order high-water mark.
    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.stack_high_water = self.max_stack_order().max(self.stack_high_water);
    }

    /// Note by id.
    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Mutable note by id.
    pub fn note_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Append a new default note and return its id.
    pub fn add_note(&mut self) -> NoteId {
        let note = Note::new();
        let id = note.id.clone();
        self.stack_high_water = self.stack_high_water.max(note.stack_order);
        self.notes.push(note);
        id
    }

    /// Remove a note, returning it.
    pub fn remove_note(&mut self, id: &str) -> Option<Note> {
        let idx = self.notes.iter().position(|n| n.id == id)?;
        Some(self.notes.remove(idx))
    }

    fn max_stack_order(&self) -> i64 {
        self.notes
            .iter()
            .map(|n| n.stack_order)
            .fold(BASE_STACK_ORDER, i64::max)
    }

    /// Raise a note above every other note on the page.
    ///
    /// Returns the new stack order. Values strictly increase for the lifetime
    /// of the page, even when the top-most note has since been deleted.
    pub fn bring_to_front(&mut self, id: &str) -> Option<i64> {
        let next = self.max_stack_order().max(self.stack_high_water) + 1;
        let note = self.note_mut(id)?;
        note.stack_order = next;
        self.stack_high_water = next;
        Some(next)
    }

    /// Notes sorted back-to-front.
    pub fn notes_by_stack_order(&self) -> Vec<&Note> {
        let mut sorted: Vec<&Note> = self.notes.iter().collect();
        sorted.sort_by_key(|n| n.stack_order);
        sorted
    }
}
