//! Cross-cutting persistence tests: export/import round trips, import
//! rejection, and store failure handling.

mod import_tests;
mod roundtrip_tests;
