//! Import validation: malformed documents are rejected before any mutation.

use pollster::block_on;

use crate::model::migration::LEGACY_SCHEMA_VERSION;
use crate::persist::error::PersistError;
use crate::persist::export::parse_import;
use crate::persist::store::{BlobStore, META_KEY, MemoryStore};

#[test]
fn test_images_without_pack_rejected() {
    let json = br#"{"version":1,"images":[{"id":"a","name":"a","mime":"image/png","data":"AA=="}]}"#;
    let err = parse_import(json).unwrap_err();
    assert!(matches!(err, PersistError::InvalidDocument { .. }));
}

#[test]
fn test_pack_without_images_rejected() {
    let err = parse_import(br#"{"version":1,"pack":{"pages":[]}}"#).unwrap_err();
    assert!(matches!(err, PersistError::InvalidDocument { .. }));
}

#[test]
fn test_not_json_rejected() {
    let err = parse_import(b"\x89PNG").unwrap_err();
    assert!(matches!(err, PersistError::Json(_)));
}

#[test]
fn test_one_bad_payload_rejects_everything() {
    let json = br#"{"version":1,"pack":{"pages":[]},"images":[
        {"id":"ok","name":"","mime":"image/png","data":"AQID"},
        {"id":"bad","name":"","mime":"image/png","data":"not base64!"}
    ]}"#;
    let err = parse_import(json).unwrap_err();
    assert!(matches!(err, PersistError::Base64 { ref id, .. } if id == "bad"));
}

#[test]
fn test_rejected_import_leaves_store_untouched() {
    let store = MemoryStore::new();
    block_on(store.set(META_KEY, b"{\"pages\":[]}".to_vec())).unwrap();
    block_on(store.set("img:keep", vec![1])).unwrap();

    assert!(parse_import(br#"{"images":[]}"#).is_err());
    assert_eq!(store.keys(), vec!["img:keep".to_string(), "meta".to_string()]);
}

#[test]
fn test_legacy_notes_survive_import_unmigrated() {
    let json = br#"{"version":1,"pack":{"index":0,"mode":"edit","pages":[
        {"id":"p","name":"p.png","mime":"image/png",
         "notes":[{"id":"n","nx":0.2,"ny":0.25,"nw":0.3,"nh":0.3,"text":"hi"}]}
    ]},"images":[]}"#;
    let doc = parse_import(json).unwrap().to_document();
    let note = &doc.pages()[0].notes[0];
    assert_eq!(note.schema_version, LEGACY_SCHEMA_VERSION);
    assert!(note.needs_migration());
    assert_eq!(note.markup, "hi");
    assert_eq!(note.geometry().nx, 0.2);
}

#[test]
fn test_missing_page_payload_is_not_an_error() {
    let json = br#"{"version":1,"pack":{"pages":[
        {"id":"p","name":"p.png","mime":"image/png","notes":[]}
    ]},"images":[]}"#;
    let doc = parse_import(json).unwrap().to_document();
    assert!(doc.pages()[0].image().is_none());
}
