//! Orangeface Face Model
//!
//! Defines the data contracts shared by every stage of the per-frame
//! pipeline:
//! - **Geometry:** Frame-space points, point sets, and bounding boxes
//! - **Detections:** Detector output (box, score, grouped landmarks)
//! - **Detector:** The two detector variants and their parameters
//! - **Status:** The closed set of events reported to a status sink
//!
//! All coordinates are in source-frame pixels with a top-left origin and
//! y growing downward.

pub mod detection;
pub mod detector;
pub mod geometry;
pub mod status;

pub use detection::*;
pub use detector::*;
pub use geometry::*;
pub use status::*;
