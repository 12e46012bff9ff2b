//! Export → import round-trip tests.
//!
//! A re-imported document must keep page order, every note field (geometry
//! within 1e-6) and byte-identical image payloads.

use std::io::Cursor;

use pollster::block_on;

use crate::geometry::NormRect;
use crate::model::{Document, Mode, Note, NoteStyle, Page};
use crate::persist::export::{
    export_document, export_to_bytes, parse_import, read_import, replace_store, write_export,
};
use crate::persist::local::{load, put_image};
use crate::persist::store::{BlobStore, FileStore, MemoryStore, image_key};

const TOLERANCE: f64 = 1e-6;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([200, 30, 30]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn styled_note(id: &str, g: NormRect, z: i64) -> Note {
    Note::from_parts(
        id.to_string(),
        crate::constants::NOTE_SCHEMA_VERSION,
        g,
        format!("<b>{}</b> body", id),
        NoteStyle::new("rgba(10, 20, 30, 0.5)", "#336699", 0.6, 22, true),
        z,
    )
}

/// Three pages: two with images, one blank; notes with varied geometry.
fn create_document() -> Document {
    let mut a = Page::new("first.png", "image/png", Some(png_bytes(8, 6)));
    a.memo = "memo <i>one</i>".to_string();
    a.set_notes(vec![
        styled_note("n1", NormRect::new(0.1, 0.1, 0.3, 0.2), 11),
        styled_note("n2", NormRect::new(1.0 / 3.0, 2.0 / 7.0, 0.123456789, 0.987654321), 14),
    ]);

    let b = Page::new("second.png", "image/png", Some(png_bytes(3, 9)));

    let mut c = Page::blank();
    c.set_notes(vec![styled_note("n3", NormRect::new(0.0, 0.95, 0.05, 0.05), 20)]);

    Document::from_parts(vec![a, b, c], 1, Mode::View)
}

fn assert_documents_match(original: &Document, restored: &Document) {
    assert_eq!(original.len(), restored.len());
    assert_eq!(original.index(), restored.index());
    assert_eq!(original.mode(), restored.mode());

    for (p, q) in original.pages().iter().zip(restored.pages()) {
        assert_eq!(p.id, q.id);
        assert_eq!(p.name, q.name);
        assert_eq!(p.mime, q.mime);
        assert_eq!(p.memo, q.memo);
        assert_eq!(p.image(), q.image(), "payload of page {}", p.id);
        assert_eq!(p.notes.len(), q.notes.len());

        for (n, m) in p.notes.iter().zip(&q.notes) {
            assert_eq!(n.id, m.id);
            assert_eq!(n.schema_version, m.schema_version);
            assert_eq!(n.markup, m.markup);
            assert_eq!(n.style, m.style);
            assert_eq!(n.stack_order, m.stack_order);
            let (g, h) = (n.geometry(), m.geometry());
            assert!((g.nx - h.nx).abs() < TOLERANCE);
            assert!((g.ny - h.ny).abs() < TOLERANCE);
            assert!((g.nw - h.nw).abs() < TOLERANCE);
            assert!((g.nh - h.nh).abs() < TOLERANCE);
        }
    }
}

#[test]
fn test_export_import_roundtrip() {
    let doc = create_document();
    let store = MemoryStore::new();

    let export = block_on(export_document(&doc, &store)).unwrap();
    // The blank page has no payload and contributes no image record.
    assert_eq!(export.images.len(), 2);

    let bytes = export_to_bytes(&export).unwrap();
    let imported = parse_import(&bytes).unwrap();
    let restored = imported.to_document();

    assert_documents_match(&doc, &restored);
    assert_eq!(restored.pages()[0].dimensions(), Some((8, 6)));
    assert_eq!(restored.pages()[1].dimensions(), Some((3, 9)));
}

#[test]
fn test_export_reads_payload_from_store_when_not_resident() {
    let store = MemoryStore::new();
    let page = Page::new("x.png", "image/png", Some(vec![7, 7, 7]));
    block_on(put_image(&store, &page)).unwrap();

    let mut bare = page.clone();
    bare.set_image(None);
    let doc = Document::from_parts(vec![bare], 0, Mode::Edit);

    let export = block_on(export_document(&doc, &store)).unwrap();
    assert_eq!(export.images.len(), 1);
    assert_eq!(export.images[0].data, "BwcH");
}

#[test]
fn test_import_into_store_then_restore() {
    let doc = create_document();
    let export = block_on(export_document(&doc, &MemoryStore::new())).unwrap();
    let imported = parse_import(&export_to_bytes(&export).unwrap()).unwrap();

    let store = MemoryStore::new();
    block_on(store.set(&image_key("stale"), vec![0])).unwrap();
    let replacement = imported.to_document();
    block_on(replace_store(&store, &imported, &replacement)).unwrap();

    assert!(!store.contains(&image_key("stale")));
    let restored = block_on(load(&store)).unwrap();
    assert_documents_match(&doc, &restored);
}

#[test]
fn test_file_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memomo_document.json");
    let doc = create_document();

    let export = block_on(export_document(&doc, &MemoryStore::new())).unwrap();
    write_export(&path, &export).unwrap();
    let imported = read_import(&path).unwrap();

    let store = FileStore::new(dir.path().join("store"));
    let replacement = imported.to_document();
    block_on(replace_store(&store, &imported, &replacement)).unwrap();
    let restored = block_on(load(&store)).unwrap();
    assert_documents_match(&doc, &restored);
}

#[test]
fn test_cursor_clamped_on_import() {
    let json = br#"{"version":1,"pack":{"index":12,"mode":"edit","pages":[
        {"id":"a","name":"a","mime":"image/png","memoHtml":"","notes":[]},
        {"id":"b","name":"b","mime":"image/png","memoHtml":"","notes":[]}
    ]},"images":[]}"#;
    let doc = parse_import(json).unwrap().to_document();
    assert_eq!(doc.index(), 1);

    let json = br#"{"version":1,"pack":{"index":-3,"pages":[
        {"id":"a","name":"a","mime":"image/png","notes":[]}
    ]},"images":[]}"#;
    let doc = parse_import(json).unwrap().to_document();
    assert_eq!(doc.index(), 0);
}
