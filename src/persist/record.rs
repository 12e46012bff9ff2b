//! Serialized document records.
//!
//! These mirror the on-disk JSON exactly (short field names included) and
//! are shared by the local `meta` record and the portable export. Missing
//! style fields fall back to the historical defaults so documents written by
//! older builds load cleanly.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{BASE_STACK_ORDER, note_defaults};
use crate::geometry::NormRect;
use crate::model::migration::LEGACY_SCHEMA_VERSION;
use crate::model::{Document, Mode, Note, NoteStyle, Page, plain_text_to_markup};

fn default_schema_version() -> u32 {
    LEGACY_SCHEMA_VERSION
}

fn default_nx() -> f64 {
    0.0
}

fn default_legacy_size() -> f64 {
    0.3
}

fn default_background() -> String {
    note_defaults::BACKGROUND.to_string()
}

fn default_foreground() -> String {
    note_defaults::FOREGROUND.to_string()
}

fn default_alpha() -> f64 {
    note_defaults::OPACITY
}

fn default_font_size() -> i64 {
    i64::from(note_defaults::FONT_SIZE_PX)
}

fn default_stack_order() -> i64 {
    BASE_STACK_ORDER
}

fn default_mode() -> String {
    Mode::Edit.name().to_string()
}

fn default_index() -> i64 {
    0
}

/// Generate a field deserializer that maps `null` or a value of the wrong
/// type (a float where an integer belongs, for instance) to `$fallback`
/// instead of rejecting the whole record. Older writers emitted `null` for
/// NaN and relied on readers to substitute the default.
macro_rules! lenient {
    ($name:ident, $ty:ty, $fallback:expr) => {
        fn $name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<$ty, D::Error> {
            let value = Value::deserialize(deserializer)?;
            Ok(serde_json::from_value::<$ty>(value).unwrap_or_else(|_| $fallback()))
        }
    };
}

lenient!(lenient_schema_version, u32, default_schema_version);
lenient!(lenient_position, f64, default_nx);
lenient!(lenient_size, f64, default_legacy_size);
lenient!(lenient_string, String, String::new);
lenient!(lenient_background, String, default_background);
lenient!(lenient_foreground, String, default_foreground);
lenient!(lenient_alpha, f64, default_alpha);
lenient!(lenient_font_size, i64, default_font_size);
lenient!(lenient_bool, bool, bool::default);
lenient!(lenient_stack_order, i64, default_stack_order);
lenient!(lenient_index, i64, default_index);
lenient!(lenient_mode, String, default_mode);

/// A note as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    /// Schema version; absent in the oldest documents.
    #[serde(default = "default_schema_version", deserialize_with = "lenient_schema_version")]
    pub v: u32,
    #[serde(default = "default_nx", deserialize_with = "lenient_position")]
    pub nx: f64,
    #[serde(default = "default_nx", deserialize_with = "lenient_position")]
    pub ny: f64,
    #[serde(default = "default_legacy_size", deserialize_with = "lenient_size")]
    pub nw: f64,
    #[serde(default = "default_legacy_size", deserialize_with = "lenient_size")]
    pub nh: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub html: String,
    /// Plain-text body written by builds that predate rich text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default = "default_background", deserialize_with = "lenient_background")]
    pub bg: String,
    #[serde(default = "default_foreground", deserialize_with = "lenient_foreground")]
    pub fg: String,
    #[serde(default = "default_alpha", deserialize_with = "lenient_alpha")]
    pub alpha: f64,
    #[serde(default = "default_font_size", deserialize_with = "lenient_font_size")]
    pub fs: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub bold: bool,
    #[serde(default = "default_stack_order", deserialize_with = "lenient_stack_order")]
    pub z: i64,
}

impl NoteRecord {
    /// Record for a note.
    pub fn from_note(note: &Note) -> Self {
        let g = note.geometry();
        Self {
            id: note.id.clone(),
            v: note.schema_version,
            nx: g.nx,
            ny: g.ny,
            nw: g.nw,
            nh: g.nh,
            html: note.markup.clone(),
            text: None,
            bg: note.style.background.clone(),
            fg: note.style.foreground.clone(),
            alpha: note.style.opacity(),
            fs: i64::from(note.style.font_size_px()),
            bold: note.style.bold,
            z: note.stack_order,
        }
    }

    /// Rebuild the note. A legacy plain `text` body becomes markup.
    pub fn to_note(&self) -> Note {
        let markup = match &self.text {
            Some(text) if self.html.trim().is_empty() && !text.is_empty() => {
                plain_text_to_markup(text)
            }
            _ => self.html.clone(),
        };
        Note::from_parts(
            self.id.clone(),
            self.v,
            NormRect::new(self.nx, self.ny, self.nw, self.nh),
            markup,
            NoteStyle::new(self.bg.clone(), self.fg.clone(), self.alpha, self.fs, self.bold),
            self.z,
        )
    }
}

/// A page as stored, without its image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mime: String,
    #[serde(rename = "memoHtml", default, deserialize_with = "lenient_string")]
    pub memo_html: String,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
}

impl PageRecord {
    /// Record for a page, without its payload.
    pub fn from_page(page: &Page) -> Self {
        Self {
            id: page.id.clone(),
            name: page.name.clone(),
            mime: page.mime.clone(),
            memo_html: page.memo.clone(),
            notes: page.notes.iter().map(NoteRecord::from_note).collect(),
        }
    }

    /// Rebuild the page, attaching an image payload if one was found.
    pub fn to_page(&self, image: Option<Vec<u8>>) -> Page {
        let mut page = Page::with_id(self.id.clone(), self.name.clone(), self.mime.clone(), image);
        page.memo = self.memo_html.clone();
        page.set_notes(self.notes.iter().map(NoteRecord::to_note).collect());
        page
    }
}

/// Structured document metadata: the `meta` record and the export `pack`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRecord {
    /// Cursor; out-of-range values are clamped when the document is built.
    #[serde(default = "default_index", deserialize_with = "lenient_index")]
    pub index: i64,
    #[serde(default = "default_mode", deserialize_with = "lenient_mode")]
    pub mode: String,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
}

impl PackRecord {
    /// Record for the whole document.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            index: i64::try_from(doc.index()).unwrap_or(i64::MAX),
            mode: doc.mode().name().to_string(),
            pages: doc.pages().iter().map(PageRecord::from_page).collect(),
        }
    }

    /// Stored mode; anything unknown is edit.
    pub fn mode(&self) -> Mode {
        Mode::from_name(&self.mode)
    }

    /// Rebuild a document, looking up each page's payload with `image_for`.
    pub fn to_document(&self, mut image_for: impl FnMut(&str) -> Option<Vec<u8>>) -> Document {
        let pages = self
            .pages
            .iter()
            .map(|p| p.to_page(image_for(&p.id)))
            .collect();
        let index = usize::try_from(self.index.max(0)).unwrap_or(usize::MAX);
        Document::from_parts(pages, index, self.mode())
    }
}

/// An embedded image in the portable export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mime: String,
    /// Standard-alphabet base64 of the raw payload.
    pub data: String,
}

/// The portable single-file document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: u32,
    pub pack: PackRecord,
    pub images: Vec<ImageRecord>,
}

impl ExportDocument {
    /// Current version of the export format.
    pub const CURRENT_VERSION: u32 = 1;
}
