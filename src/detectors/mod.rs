//! Head-and-shoulders shape detectors
//!
//! Both shapes are read off six consecutive pivots `P0..P5`:
//!
//! - **SHS**: `P1` and `P5` are shoulders, `P3` the head, `P2`/`P4` the neckline troughs.
//! - **iSHS**: the mirror image, with troughs for shoulders and head.
//!
//! The neckline is the straight line through `P2` and `P4`.

pub mod neckline;
pub mod window;

pub mod ishs;
pub mod shs;

// Re-export all detectors for convenience
pub use ishs::*;
pub use neckline::*;
pub use shs::*;
pub use window::*;
