//! Note data model.

use crate::color_utils::hex_to_rgba;
use crate::constants::{
    MAX_FONT_SIZE_PX, MAX_OPACITY, MIN_FONT_SIZE_PX, MIN_OPACITY, NOTE_SCHEMA_VERSION,
    note_defaults,
};
use crate::geometry::{NormRect, clamp};

/// Unique identifier for a note.
pub type NoteId = String;

/// Generate a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Visual style of a note. Setters clamp silently.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteStyle {
    /// Background color, hex or `rgb()/rgba()`.
    pub background: String,
    /// Text color, hex.
    pub foreground: String,
    opacity: f64,
    font_size_px: u32,
    /// Whether the whole note defaults to bold text.
    pub bold: bool,
}

impl NoteStyle {
    /// Style with opacity and font size clamped to their ranges.
    pub fn new(
        background: impl Into<String>,
        foreground: impl Into<String>,
        opacity: f64,
        font_size_px: i64,
        bold: bool,
    ) -> Self {
        let mut style = Self {
            background: background.into(),
            foreground: foreground.into(),
            opacity: note_defaults::OPACITY,
            font_size_px: note_defaults::FONT_SIZE_PX,
            bold,
        };
        style.set_opacity(opacity);
        style.set_font_size_px(font_size_px);
        style
    }

    /// Fill opacity in `[0.2, 1.0]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Font size in pixels.
    pub fn font_size_px(&self) -> u32 {
        self.font_size_px
    }

    /// Set the fill opacity, clamped to its range.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = clamp(opacity, MIN_OPACITY, MAX_OPACITY);
    }

    /// Set the font size, clamped to its range.
    pub fn set_font_size_px(&mut self, px: i64) {
        let clamped = px.clamp(i64::from(MIN_FONT_SIZE_PX), i64::from(MAX_FONT_SIZE_PX));
        // In range by construction.
        self.font_size_px = u32::try_from(clamped).unwrap_or(note_defaults::FONT_SIZE_PX);
    }

    /// CSS background with the fill opacity folded in.
    pub fn background_css(&self) -> String {
        hex_to_rgba(&self.background, self.opacity)
    }
}

impl Default for NoteStyle {
    fn default() -> Self {
        Self {
            background: note_defaults::BACKGROUND.to_string(),
            foreground: note_defaults::FOREGROUND.to_string(),
            opacity: note_defaults::OPACITY,
            font_size_px: note_defaults::FONT_SIZE_PX,
            bold: false,
        }
    }
}

/// A positioned, styled rich-text annotation box attached to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    /// Geometry scheme tag; see [`crate::model::migration`].
    pub schema_version: u32,
    geometry: NormRect,
    /// Opaque rich-text payload owned by the external editor widget.
    pub markup: String,
    pub style: NoteStyle,
    pub stack_order: i64,
}

impl Note {
    /// Create a note with default geometry and style at the current schema.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            schema_version: NOTE_SCHEMA_VERSION,
            geometry: NormRect::new(
                note_defaults::NX,
                note_defaults::NY,
                note_defaults::NW,
                note_defaults::NH,
            ),
            markup: String::new(),
            style: NoteStyle::default(),
            stack_order: note_defaults::STACK_ORDER,
        }
    }

    /// Rebuild a note from stored parts.
    ///
    /// Geometry of notes at the current schema is clamped; geometry of
    /// legacy notes is kept as-is until migration re-projects it.
    pub fn from_parts(
        id: NoteId,
        schema_version: u32,
        geometry: NormRect,
        markup: String,
        style: NoteStyle,
        stack_order: i64,
    ) -> Self {
        let geometry = if schema_version >= NOTE_SCHEMA_VERSION {
            geometry.clamped()
        } else {
            geometry
        };
        Self {
            id,
            schema_version,
            geometry,
            markup,
            style,
            stack_order,
        }
    }

    /// Stored normalized geometry.
    pub fn geometry(&self) -> NormRect {
        self.geometry
    }

    /// Write new geometry, clamped into legal ranges.
    pub fn set_geometry(&mut self, geometry: NormRect) {
        self.geometry = geometry.clamped();
    }

    /// Whether this note still uses a geometry scheme older than current.
    pub fn needs_migration(&self) -> bool {
        self.schema_version < NOTE_SCHEMA_VERSION
    }
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a legacy plain-text body into markup.
pub fn plain_text_to_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_note_defaults() {
        let n = Note::new();
        assert_eq!(n.schema_version, NOTE_SCHEMA_VERSION);
        assert_eq!(n.geometry(), NormRect::new(0.08, 0.10, 0.38, 0.28));
        assert_eq!(n.style.opacity(), 0.85);
        assert_eq!(n.style.font_size_px(), 16);
        assert_eq!(n.stack_order, 20);
        assert!(!n.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Note::new().id, Note::new().id);
    }

    #[test]
    fn test_style_clamps() {
        let mut s = NoteStyle::default();
        s.set_opacity(0.0);
        assert_eq!(s.opacity(), MIN_OPACITY);
        s.set_opacity(7.0);
        assert_eq!(s.opacity(), MAX_OPACITY);
        s.set_font_size_px(2);
        assert_eq!(s.font_size_px(), MIN_FONT_SIZE_PX);
        s.set_font_size_px(400);
        assert_eq!(s.font_size_px(), MAX_FONT_SIZE_PX);
    }

    #[test]
    fn test_set_geometry_clamps() {
        let mut n = Note::new();
        n.set_geometry(NormRect::new(1.5, -0.2, 0.0, 3.0));
        assert_eq!(n.geometry(), NormRect::new(1.0, 0.0, 0.05, 1.0));
    }

    #[test]
    fn test_legacy_geometry_not_clamped_on_load() {
        let n = Note::from_parts(
            "a".into(),
            1,
            NormRect::new(0.2, 0.25, 0.01, 0.3),
            String::new(),
            NoteStyle::default(),
            10,
        );
        assert_eq!(n.geometry().nw, 0.01);
        assert!(n.needs_migration());
    }

    #[test]
    fn test_plain_text_to_markup() {
        assert_eq!(plain_text_to_markup("a<b>\nc & 'd'"), "a&lt;b&gt;<br>c &amp; &#39;d&#39;");
    }
}
