//! Eye and mouth clip contours.
//!
//! Eyes and mouth are shaped differently on purpose. Eye contours are
//! started at their lowest point, padded about the centroid, and traced
//! with cubic segments. The mouth contour is rotated to its structural
//! midpoint index and traced with straight edges, unpadded.

use std::fmt;

use orangeface_face_model::{FaceLandmarks, Point2D};
use serde::Serialize;

use crate::geometry::{
    expand_about_centroid, polygon_closed_path, reorder_from_extremum, rotate_to_start,
    smooth_closed_path, PathSpec,
};

/// Padding applied to eye contours unless configured otherwise.
pub const DEFAULT_EYE_PADDING: f64 = 1.8;

/// Fewest points that still describe a polygon.
pub const MIN_CONTOUR_POINTS: usize = 3;

/// A landmark region that gets its own clip contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    LeftEye,
    RightEye,
    Mouth,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::LeftEye, Region::RightEye, Region::Mouth];

    pub fn points(self, landmarks: &FaceLandmarks) -> &[Point2D] {
        match self {
            Region::LeftEye => &landmarks.left_eye,
            Region::RightEye => &landmarks.right_eye,
            Region::Mouth => &landmarks.mouth,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::LeftEye => write!(f, "left eye"),
            Region::RightEye => write!(f, "right eye"),
            Region::Mouth => write!(f, "mouth"),
        }
    }
}

/// A landmark set that cannot form a clip region.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContourError {
    #[error("contour needs at least {} points, got {found}", MIN_CONTOUR_POINTS)]
    TooFewPoints { found: usize },

    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

fn check_points(points: &[Point2D]) -> Result<(), ContourError> {
    if points.len() < MIN_CONTOUR_POINTS {
        return Err(ContourError::TooFewPoints {
            found: points.len(),
        });
    }
    if let Some(index) = points.iter().position(|p| !p.is_finite()) {
        return Err(ContourError::NonFinite { index });
    }
    Ok(())
}

/// Padded, smoothed eye clip path.
///
/// The contour starts at its maximum-y point so the path is stable while
/// the detector's point order jitters between frames.
pub fn build_eye_contour(raw: &[Point2D], padding: f64) -> Result<PathSpec, ContourError> {
    check_points(raw)?;
    let reordered = reorder_from_extremum(raw, |p| p.y);
    let padded = expand_about_centroid(&reordered, padding);
    Ok(smooth_closed_path(&padded))
}

/// Straight-edged mouth clip path starting at index `n / 2`.
pub fn build_mouth_contour(raw: &[Point2D]) -> Result<PathSpec, ContourError> {
    check_points(raw)?;
    let rotated = rotate_to_start(raw, raw.len() / 2);
    Ok(polygon_closed_path(&rotated))
}

/// The contour built for one region of a face.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionContour {
    pub region: Region,
    pub path: Result<PathSpec, ContourError>,
}

/// Builds clip contours for every region of a landmark set.
#[derive(Debug, Clone, Copy)]
pub struct ContourBuilder {
    eye_padding: f64,
}

impl ContourBuilder {
    pub fn new(eye_padding: f64) -> Self {
        Self { eye_padding }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EYE_PADDING)
    }

    pub fn eye_padding(&self) -> f64 {
        self.eye_padding
    }

    /// Build the contour for a single region.
    pub fn build(&self, region: Region, landmarks: &FaceLandmarks) -> Result<PathSpec, ContourError> {
        let points = region.points(landmarks);
        match region {
            Region::LeftEye | Region::RightEye => build_eye_contour(points, self.eye_padding),
            Region::Mouth => build_mouth_contour(points),
        }
    }

    /// Build left eye, right eye, and mouth contours in that order.
    ///
    /// A degenerate region yields an error entry; the others are unaffected.
    pub fn build_all(&self, landmarks: &FaceLandmarks) -> Vec<RegionContour> {
        Region::ALL
            .iter()
            .map(|&region| {
                let path = self.build(region, landmarks);
                if let Err(ref err) = path {
                    tracing::debug!(%region, error = %err, "Skipping degenerate contour");
                }
                RegionContour { region, path }
            })
            .collect()
    }
}

impl Default for ContourBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}
