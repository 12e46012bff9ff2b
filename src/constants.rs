//! Global constants for memomo.

/// Schema version written on every note created or migrated by this build.
pub const NOTE_SCHEMA_VERSION: u32 = 2;

/// Minimum normalized note width/height.
pub const MIN_NORM_SIZE: f64 = 0.05;

/// Note fill opacity range.
pub const MIN_OPACITY: f64 = 0.2;
pub const MAX_OPACITY: f64 = 1.0;

/// Note font size range in pixels.
pub const MIN_FONT_SIZE_PX: u32 = 10;
pub const MAX_FONT_SIZE_PX: u32 = 48;

/// Smallest pixel size a note can be resized to during a gesture.
pub const MIN_RESIZE_WIDTH_PX: f64 = 120.0;
pub const MIN_RESIZE_HEIGHT_PX: f64 = 80.0;

/// Smallest body height shown in view mode once the header is hidden.
pub const MIN_VIEW_BODY_HEIGHT_PX: f64 = 24.0;

/// Height of the note header strip.
pub const DEFAULT_NOTE_HEADER_PX: f64 = 36.0;

/// Floor for stack order comparisons; stored notes without an order use it.
pub const BASE_STACK_ORDER: i64 = 10;

/// Distance a thumbnail press must travel before a reorder starts.
pub const DEFAULT_REORDER_THRESHOLD_PX: f64 = 6.0;

/// Vertical travel after which a started reorder counts as a move.
pub const REORDER_MOVE_EPSILON_PX: f64 = 2.0;

/// Name given to pages created without an image.
pub const BLANK_PAGE_NAME: &str = "(blank)";

/// Defaults for freshly created notes.
pub mod note_defaults {
    pub const NX: f64 = 0.08;
    pub const NY: f64 = 0.10;
    pub const NW: f64 = 0.38;
    pub const NH: f64 = 0.28;
    pub const BACKGROUND: &str = "#ffffff";
    pub const FOREGROUND: &str = "#000000";
    pub const OPACITY: f64 = 0.85;
    pub const FONT_SIZE_PX: u32 = 16;
    pub const STACK_ORDER: i64 = 20;
}

/// Debounce delays for saves and viewport re-renders, in milliseconds.
pub mod debounce {
    pub const META_MS: u64 = 200;
    pub const NOTES_MS: u64 = 150;
    pub const RESIZE_MS: u64 = 60;
}

/// Printable area of an A4 portrait sheet with 10 mm margins, in CSS pixels.
pub mod print {
    const PX_PER_MM: f64 = 96.0 / 25.4;
    pub const SHEET_WIDTH_PX: f64 = (210.0 - 20.0) * PX_PER_MM;
    pub const SHEET_HEIGHT_PX: f64 = (297.0 - 20.0) * PX_PER_MM;
}
