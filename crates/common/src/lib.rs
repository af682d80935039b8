//! cutdraft Common Utilities
//!
//! Shared infrastructure for all cutdraft crates:
//! - Error taxonomy (asset, layout, effect, write) and result aliases
//! - Microsecond timebase and frame-snapping helpers
//! - Cancellation flag checked at pipeline stage boundaries
//! - Tracing/logging initialization
//! - Engine configuration loading

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod timebase;

pub use cancel::*;
pub use config::*;
pub use error::*;
pub use timebase::*;
