//! memomo - sticky-note annotation over a deck of images
//!
//! Notes are stored in coordinates normalized to the displayed image, so they
//! stay pinned to the same image content at any viewport size. The crate
//! holds the document model, the pointer gesture state machines, local and
//! portable persistence, and the projection of notes onto screen and paper.
//! Drawing and text editing are left to the host.

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod interaction;
pub mod model;
pub mod persist;
pub mod render;
pub mod session;

pub use config::{MemomoConfig, Preferences};
pub use session::{IncomingImage, Session};
