//! Orangeface Contour Geometry
//!
//! Turns raw landmark point sets into closed clip paths:
//! - **Geometry:** centroid, radial expansion, extremum reordering, path building
//! - **Contours:** the eye and mouth recipes built from those primitives
//!
//! This crate is pure computation: no I/O, no rendering backend.
//! Paths are returned as backend-neutral [`PathSpec`] command lists.

pub mod contour;
pub mod geometry;

pub use contour::{
    build_eye_contour, build_mouth_contour, ContourBuilder, ContourError, Region, RegionContour,
    DEFAULT_EYE_PADDING, MIN_CONTOUR_POINTS,
};
pub use geometry::{PathCommand, PathSpec};
