//! In-memory document model
//!
//! A rendered page is held as an arena of nodes addressed by [`NodeId`].
//! The materializer only needs a handful of operations on it: walk the
//! tree in document order, look up ancestors, read text, and swap one node
//! for another without disturbing its siblings.

mod document;
pub mod html;

pub use document::*;
