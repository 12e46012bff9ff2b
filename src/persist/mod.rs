//! Persistence: the incremental local store and the portable export.
//!
//! ## Layout
//!
//! - [`store`]: the async key/value capability and its in-memory and
//!   directory-backed implementations
//! - [`record`]: serde records shared by `meta` and the export `pack`
//! - `local`: save/restore against a [`BlobStore`]
//! - `export`: single-file JSON export with base64 image payloads
//! - `auto_save`: per-channel debounce timers

mod auto_save;
mod error;
mod export;
mod local;
pub mod record;
pub mod store;

#[cfg(test)]
pub(crate) mod tests;

pub use auto_save::{AutoSaveManager, Debouncer, SaveChannel};
pub use error::{PersistError, StoreError};
pub use export::{
    DecodedImage, ImportedDocument, export_document, export_to_bytes, parse_import, read_import,
    replace_store, write_export,
};
pub use local::{
    clear, delete_image, load, load_meta, put_image, save_meta, sweep_orphan_images,
};
pub use record::{ExportDocument, ImageRecord, NoteRecord, PackRecord, PageRecord};
pub use store::{BlobStore, FileStore, IMAGE_KEY_PREFIX, META_KEY, MemoryStore, image_key};
