//! Orangeface Compositor
//!
//! Renders one output frame from a source video frame and the current
//! detection. Layers are drawn in a fixed order:
//!
//! ```text
//! source frame ──┬── base layer (blank, or passthrough in debug mode)
//!                │         │
//! detection ─────┼── bounding box outline (debug)
//!                │         │
//! overlay ───────┼── overlay square centered on the face box
//!                │         │
//! landmarks ─────┼── markers (debug)
//!                │         │
//! contours ──────┴── eye/mouth regions: source video clipped to each path
//!                          │
//!                          ▼
//!                  debug info panel (debug)
//! ```

pub mod compositor;
pub mod overlay;
pub mod raster;
pub mod text;

pub use compositor::*;
pub use overlay::{overlay_channel, OverlayLoader, OverlaySlot, OverlayStatus};
pub use raster::VideoFrame;
pub use text::DebugFont;
