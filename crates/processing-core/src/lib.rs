//! cutdraft Processing Core
//!
//! Turns resolved assets into an edited timeline:
//! - **Layout:** Place videos, images, background music, and subtitle cues
//! - **Effects:** Transitions at video boundaries, filters, subtitle styling
//!
//! Pure computation: no I/O and no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod effects;
pub mod planner;

pub use effects::{EffectResolver, EffectSettings, TRANSITION_CATALOG};
pub use planner::{LayoutPlanner, LayoutSettings};
