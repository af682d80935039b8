//! cutdraft Draft Engine
//!
//! Final stages of draft generation and the pipeline that drives them.
//!
//! # Pipeline
//!
//! ```text
//! DraftRequest ──► Asset Resolver ──► Layout Planner ──► Effect Resolver
//!                                                              │
//!                                                              ▼
//!                   project.veproj ◄── Project Writer ◄── Draft Serializer
//! ```
//!
//! Every stage either returns its output or a typed error; nothing is
//! written unless all earlier stages succeed.

pub mod pipeline;
pub mod serializer;
pub mod writer;

pub use pipeline::{respond, DraftEngine, GenerationOutcome};
pub use serializer::{serialize, DraftMeta, IdAllocator};
pub use writer::{write_draft, WriteReport};
