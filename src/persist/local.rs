//! Incremental local store.
//!
//! Structured metadata lives in a single `meta` record; image payloads live
//! under `img:<page id>` and are written once on ingest, so metadata edits
//! never rewrite binaries.

use crate::model::{Document, Page};
use crate::persist::error::PersistError;
use crate::persist::record::PackRecord;
use crate::persist::store::{BlobStore, IMAGE_KEY_PREFIX, META_KEY, image_key};

/// Serialize the document's metadata (pages without payloads, notes, cursor,
/// mode) into the `meta` record.
pub async fn save_meta<S: BlobStore>(store: &S, doc: &Document) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec(&PackRecord::from_document(doc))?;
    store.set(META_KEY, bytes).await?;
    log::trace!("Saved meta ({} pages)", doc.len());
    Ok(())
}

/// Read and parse the `meta` record.
///
/// Returns `Ok(None)` when the record is absent or unreadable as a document;
/// only store failures are errors.
pub async fn load_meta<S: BlobStore>(store: &S) -> Result<Option<PackRecord>, PersistError> {
    let Some(bytes) = store.get(META_KEY).await? else {
        return Ok(None);
    };
    match serde_json::from_slice::<PackRecord>(&bytes) {
        Ok(pack) => Ok(Some(pack)),
        Err(e) => {
            log::warn!("Ignoring unreadable meta record: {}", e);
            Ok(None)
        }
    }
}

/// Rebuild the document from the store.
///
/// No meta (or a malformed one) yields an empty document in edit mode. Each
/// page's payload is looked up under its image key; a payload that cannot be
/// read leaves the page without an image rather than failing the restore.
pub async fn load<S: BlobStore>(store: &S) -> Result<Document, PersistError> {
    let Some(pack) = load_meta(store).await? else {
        log::info!("No stored document, starting empty");
        return Ok(Document::new());
    };

    let mut images = Vec::with_capacity(pack.pages.len());
    for page in &pack.pages {
        let payload = match store.get(&image_key(&page.id)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not read image for page {}: {}", page.id, e);
                None
            }
        };
        images.push((page.id.clone(), payload));
    }

    let doc = pack.to_document(|id| {
        images
            .iter_mut()
            .find(|(pid, _)| pid == id)
            .and_then(|(_, bytes)| bytes.take())
    });
    log::info!(
        "Restored {} pages (current {}, mode {})",
        doc.len(),
        doc.index(),
        doc.mode().name()
    );
    Ok(doc)
}

/// Write a page's image payload. Pages without a payload are skipped.
pub async fn put_image<S: BlobStore>(store: &S, page: &Page) -> Result<(), PersistError> {
    if let Some(bytes) = page.image() {
        store.set(&image_key(&page.id), bytes.to_vec()).await?;
    }
    Ok(())
}

/// Remove a page's stored payload.
pub async fn delete_image<S: BlobStore>(store: &S, page_id: &str) -> Result<(), PersistError> {
    store.delete(&image_key(page_id)).await?;
    Ok(())
}

/// Delete image payloads whose page is not in `doc`.
///
/// Payloads can outlive their page when a delete or an import only partly
/// reached the store. Returns how many were removed.
pub async fn sweep_orphan_images<S: BlobStore>(
    store: &S,
    doc: &Document,
) -> Result<usize, PersistError> {
    let mut removed = 0;
    for key in store.list_keys().await? {
        let Some(id) = key.strip_prefix(IMAGE_KEY_PREFIX) else {
            continue;
        };
        if doc.page(id).is_none() {
            store.delete(&key).await?;
            removed += 1;
        }
    }
    if removed > 0 {
        log::info!("Removed {} orphaned image payload(s)", removed);
    }
    Ok(removed)
}

/// Remove every record.
pub async fn clear<S: BlobStore>(store: &S) -> Result<(), PersistError> {
    store.clear_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use crate::persist::store::MemoryStore;
    use pollster::block_on;

    #[test]
    fn test_load_without_meta_is_empty_edit() {
        let store = MemoryStore::new();
        let doc = block_on(load(&store)).unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.mode(), Mode::Edit);
    }

    #[test]
    fn test_load_with_garbage_meta_is_empty() {
        let store = MemoryStore::new();
        block_on(store.set(META_KEY, b"not json".to_vec())).unwrap();
        let doc = block_on(load(&store)).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let mut doc = Document::new();
        let page = Page::new("a.png", "image/png", Some(vec![1, 2, 3]));
        let page_id = page.id.clone();
        block_on(put_image(&store, &page)).unwrap();
        doc.add_page(page);
        doc.add_page(Page::new("b.png", "image/png", None));
        doc.add_note();
        doc.set_mode(Mode::View);
        block_on(save_meta(&store, &doc)).unwrap();

        let loaded = block_on(load(&store)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.mode(), Mode::View);
        assert_eq!(loaded.pages()[0].id, page_id);
        assert_eq!(loaded.pages()[0].image(), Some(&[1u8, 2, 3][..]));
        assert!(loaded.pages()[1].image().is_none());
        assert_eq!(loaded.pages()[0].notes.len(), doc.pages()[0].notes.len());
    }

    #[test]
    fn test_cursor_clamped_on_load() {
        let store = MemoryStore::new();
        let meta = br#"{"index":7,"mode":"edit","pages":[{"id":"p1","name":"x","mime":"image/png","notes":[]}]}"#;
        block_on(store.set(META_KEY, meta.to_vec())).unwrap();
        let doc = block_on(load(&store)).unwrap();
        assert_eq!(doc.index(), 0);
    }

    #[test]
    fn test_delete_image_and_clear() {
        let store = MemoryStore::new();
        let page = Page::new("a.png", "image/png", Some(vec![5]));
        block_on(put_image(&store, &page)).unwrap();
        assert!(store.contains(&image_key(&page.id)));
        block_on(delete_image(&store, &page.id)).unwrap();
        assert!(!store.contains(&image_key(&page.id)));

        block_on(put_image(&store, &page)).unwrap();
        block_on(clear(&store)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_keeps_live_pages_and_meta() {
        let store = MemoryStore::new();
        let mut doc = Document::new();
        let live = Page::new("a.png", "image/png", Some(vec![1]));
        let imageless = Page::new("b.png", "image/png", None);
        block_on(put_image(&store, &live)).unwrap();
        block_on(store.set(&image_key(&imageless.id), vec![2])).unwrap();
        block_on(store.set(&image_key("gone"), vec![3])).unwrap();
        let (live_id, imageless_id) = (live.id.clone(), imageless.id.clone());
        doc.add_page(live);
        doc.add_page(imageless);
        block_on(save_meta(&store, &doc)).unwrap();

        assert_eq!(block_on(sweep_orphan_images(&store, &doc)).unwrap(), 1);
        let mut expected = vec![
            META_KEY.to_string(),
            image_key(&live_id),
            image_key(&imageless_id),
        ];
        expected.sort();
        assert_eq!(store.keys(), expected);
        assert_eq!(block_on(sweep_orphan_images(&store, &doc)).unwrap(), 0);
    }
}
