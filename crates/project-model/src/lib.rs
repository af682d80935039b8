//! cutdraft Project Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Request:** The asset manifest and project configuration sent by the UI
//! - **Assets:** Resolved, metadata-enriched references to input media
//! - **Timeline:** Tracks, segments, and effect descriptors in microseconds
//! - **Document:** The editor-facing draft schema written to disk
//!
//! Timeline values are integer microseconds; segments reference assets by
//! id, never by pointer.

pub mod asset;
pub mod document;
pub mod request;
pub mod timeline;

pub use asset::*;
pub use document::*;
pub use request::*;
pub use timeline::*;
