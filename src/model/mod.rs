//! Document model: pages, notes, and note schema migration.

mod document;
pub mod migration;
mod note;
mod page;

pub use document::{Document, Mode, StyleEdit};
pub use migration::{MigrationContext, migrate_notes};
pub use note::{Note, NoteId, NoteStyle, new_id, plain_text_to_markup};
pub use page::{Page, PageId, probe_dimensions};
