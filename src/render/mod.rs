//! Render projection.
//!
//! Pure functions from the document model (plus image box and presentation
//! flags) to flat, positioned view descriptions. Nothing here keeps state
//! between calls; hosts re-project on any mutation or viewport change.

mod print;
mod screen;

pub use print::{PrintNote, PrintSheet, project_print};
pub use screen::{NoteView, Presentation, project_screen};
