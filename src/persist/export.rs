//! Portable single-file export and import.
//!
//! The export is self-contained JSON: the same `pack` structure as the local
//! `meta` record plus every image payload as standard-alphabet base64.
//! Import is validated and decoded completely before anything is mutated.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::model::{Document, PageId};
use crate::persist::error::PersistError;
use crate::persist::local::save_meta;
use crate::persist::record::{ExportDocument, ImageRecord, PackRecord};
use crate::persist::store::{BlobStore, image_key};

/// Mime type assumed for embedded images that do not declare one.
const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Build the export document.
///
/// Image bytes come from the page if resident, otherwise from the store.
/// Pages with no payload anywhere contribute no image record.
pub async fn export_document<S: BlobStore>(
    doc: &Document,
    store: &S,
) -> Result<ExportDocument, PersistError> {
    let pack = PackRecord::from_document(doc);
    let mut images = Vec::with_capacity(doc.len());
    for page in doc.pages() {
        let bytes = match page.image() {
            Some(bytes) => Some(bytes.to_vec()),
            None => store.get(&image_key(&page.id)).await?,
        };
        let Some(bytes) = bytes else {
            log::debug!("Page {} has no image payload, skipping", page.id);
            continue;
        };
        images.push(ImageRecord {
            id: page.id.clone(),
            name: page.name.clone(),
            mime: page.mime.clone(),
            data: STANDARD.encode(&bytes),
        });
    }
    log::info!(
        "Exported {} pages with {} images",
        pack.pages.len(),
        images.len()
    );
    Ok(ExportDocument {
        version: ExportDocument::CURRENT_VERSION,
        pack,
        images,
    })
}

/// Serialize an export as pretty JSON.
pub fn export_to_bytes(export: &ExportDocument) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec(export)?)
}

/// Write an export to `path`.
pub fn write_export(path: &Path, export: &ExportDocument) -> Result<(), PersistError> {
    std::fs::write(path, export_to_bytes(export)?)?;
    log::info!("Wrote export to {:?}", path);
    Ok(())
}

/// An image payload decoded from an export.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub id: PageId,
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// A fully validated import, ready to replace the current document.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDocument {
    pub version: u32,
    pub pack: PackRecord,
    pub images: Vec<DecodedImage>,
}

impl ImportedDocument {
    /// Build the replacement document. Pages pick up the payload whose id
    /// matches theirs.
    pub fn to_document(&self) -> Document {
        self.pack.to_document(|id| {
            self.images
                .iter()
                .rev()
                .find(|img| img.id == id)
                .map(|img| img.bytes.clone())
        })
    }
}

fn check_shape(root: &Value) -> Result<(), PersistError> {
    let Some(obj) = root.as_object() else {
        return Err(PersistError::invalid_document("top level is not an object"));
    };
    match obj.get("pack") {
        Some(Value::Object(pack)) => {
            if pack.get("pages").is_some_and(|pages| !pages.is_array()) {
                return Err(PersistError::invalid_document("pack.pages is not an array"));
            }
        }
        Some(_) => return Err(PersistError::invalid_document("pack is not an object")),
        None => return Err(PersistError::invalid_document("pack is missing")),
    }
    match obj.get("images") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(PersistError::invalid_document("images is not an array")),
        None => Err(PersistError::invalid_document("images is missing")),
    }
}

/// Parse and validate an export, decoding every payload.
///
/// Any failure rejects the whole document; nothing is returned partially.
pub fn parse_import(bytes: &[u8]) -> Result<ImportedDocument, PersistError> {
    let root: Value = serde_json::from_slice(bytes)?;
    check_shape(&root)?;

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .map_or(ExportDocument::CURRENT_VERSION, |v| {
            u32::try_from(v).unwrap_or(u32::MAX)
        });
    if version > ExportDocument::CURRENT_VERSION {
        log::warn!(
            "Export version {} is newer than supported version {}, importing anyway",
            version,
            ExportDocument::CURRENT_VERSION
        );
    }

    let pack: PackRecord = serde_json::from_value(root["pack"].clone())?;
    let records: Vec<ImageRecord> = serde_json::from_value(root["images"].clone())?;

    let images = records
        .into_iter()
        .map(|rec| {
            let bytes = STANDARD
                .decode(rec.data.as_bytes())
                .map_err(|source| PersistError::Base64 {
                    id: rec.id.clone(),
                    source,
                })?;
            let mime = if rec.mime.is_empty() {
                FALLBACK_IMAGE_MIME.to_string()
            } else {
                rec.mime
            };
            Ok(DecodedImage {
                id: rec.id,
                name: rec.name,
                mime,
                bytes,
            })
        })
        .collect::<Result<Vec<_>, PersistError>>()?;

    Ok(ImportedDocument {
        version,
        pack,
        images,
    })
}

/// Read and validate an export file.
pub fn read_import(path: &Path) -> Result<ImportedDocument, PersistError> {
    let bytes = std::fs::read(path)?;
    parse_import(&bytes)
}

/// Replace the store's contents with an imported document: clear, write
/// every payload, then the metadata that references them.
pub async fn replace_store<S: BlobStore>(
    store: &S,
    imported: &ImportedDocument,
    doc: &Document,
) -> Result<(), PersistError> {
    store.clear_all().await?;
    for image in &imported.images {
        store.set(&image_key(&image.id), image.bytes.clone()).await?;
    }
    save_meta(store, doc).await?;
    log::info!(
        "Imported {} pages with {} images",
        doc.len(),
        imported.images.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_object() {
        let err = parse_import(b"[1,2]").unwrap_err();
        assert!(matches!(err, PersistError::InvalidDocument { .. }));
    }

    #[test]
    fn test_rejects_images_not_array() {
        let err = parse_import(br#"{"version":1,"pack":{"pages":[]},"images":{}}"#).unwrap_err();
        assert!(matches!(err, PersistError::InvalidDocument { .. }));
    }

    #[test]
    fn test_rejects_pages_not_array() {
        let err = parse_import(br#"{"pack":{"pages":3},"images":[]}"#).unwrap_err();
        assert!(matches!(err, PersistError::InvalidDocument { .. }));
    }

    #[test]
    fn test_rejects_bad_base64() {
        let err = parse_import(
            br#"{"version":1,"pack":{"pages":[]},"images":[{"id":"p","name":"","mime":"image/png","data":"@@@"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PersistError::Base64 { ref id, .. } if id == "p"));
    }

    #[test]
    fn test_newer_version_still_parses() {
        let imported = parse_import(br#"{"version":9,"pack":{},"images":[]}"#).unwrap();
        assert_eq!(imported.version, 9);
        assert!(imported.pack.pages.is_empty());
    }

    #[test]
    fn test_missing_image_mime_defaults() {
        let imported =
            parse_import(br#"{"pack":{"pages":[]},"images":[{"id":"p","data":"AQID"}]}"#).unwrap();
        assert_eq!(imported.version, ExportDocument::CURRENT_VERSION);
        assert_eq!(imported.images[0].mime, "image/png");
        assert_eq!(imported.images[0].bytes, vec![1, 2, 3]);
    }
}
