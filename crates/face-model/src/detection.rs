//! Detector output types.
//!
//! A [`Detection`] is produced fresh for every frame and never carries
//! identity across frames. Recorded detections are stored as JSONL, one
//! [`RecordedFrame`] per line, so they can be replayed offline.

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Point2D, PointSet};

/// Number of points in the iBUG 68-point landmark layout.
pub const LANDMARK_68_COUNT: usize = 68;

const LEFT_EYE_RANGE: std::ops::Range<usize> = 36..42;
const RIGHT_EYE_RANGE: std::ops::Range<usize> = 42..48;
const MOUTH_RANGE: std::ops::Range<usize> = 48..68;

/// Landmark subsets used for compositing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: PointSet,
    pub right_eye: PointSet,
    /// Outer lip contour followed by the inner lip contour.
    pub mouth: PointSet,
}

impl FaceLandmarks {
    /// Slice a full 68-point landmark set into eye and mouth groups.
    ///
    /// Returns `None` unless exactly 68 points are given.
    pub fn from_68_points(points: &[Point2D]) -> Option<Self> {
        if points.len() != LANDMARK_68_COUNT {
            return None;
        }
        Some(Self {
            left_eye: points[LEFT_EYE_RANGE].to_vec(),
            right_eye: points[RIGHT_EYE_RANGE].to_vec(),
            mouth: points[MOUTH_RANGE].to_vec(),
        })
    }

    /// All eye points, left then right.
    pub fn eye_points(&self) -> impl Iterator<Item = &Point2D> {
        self.left_eye.iter().chain(self.right_eye.iter())
    }
}

/// One face found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,

    /// Confidence in `[0.0, 1.0]`.
    pub score: f64,

    /// Absent when landmark extraction failed for this face.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<FaceLandmarks>,
}

impl Detection {
    pub fn new(bbox: BoundingBox, score: f64) -> Self {
        Self {
            bbox,
            score,
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: FaceLandmarks) -> Self {
        self.landmarks = Some(landmarks);
        self
    }
}

/// Pick the detection the compositor should use.
///
/// Only the first (highest-ranked) detection is considered; it is dropped
/// when it scores below `threshold`.
pub fn primary_detection(detections: &[Detection], threshold: f64) -> Option<&Detection> {
    detections.first().filter(|d| d.score >= threshold)
}

/// Landmarks as stored on disk: grouped, or a flat 68-point list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedLandmarks {
    Grouped(FaceLandmarks),
    Points68(Vec<Point2D>),
}

impl RecordedLandmarks {
    pub fn into_landmarks(self) -> Option<FaceLandmarks> {
        match self {
            RecordedLandmarks::Grouped(landmarks) => Some(landmarks),
            RecordedLandmarks::Points68(points) => FaceLandmarks::from_68_points(&points),
        }
    }
}

/// A recorded detection as it appears in a JSONL log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<RecordedLandmarks>,
}

impl From<RecordedDetection> for Detection {
    fn from(recorded: RecordedDetection) -> Self {
        Detection {
            bbox: recorded.bbox,
            score: recorded.score,
            landmarks: recorded.landmarks.and_then(RecordedLandmarks::into_landmarks),
        }
    }
}

impl From<&Detection> for RecordedDetection {
    fn from(detection: &Detection) -> Self {
        RecordedDetection {
            bbox: detection.bbox,
            score: detection.score,
            landmarks: detection.landmarks.clone().map(RecordedLandmarks::Grouped),
        }
    }
}

/// All detections for one frame index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub frame: u64,
    #[serde(default)]
    pub detections: Vec<RecordedDetection>,
}

/// Parse a JSONL detection log, skipping blank lines and `#` comments.
pub fn parse_detections(jsonl: &str) -> Result<Vec<RecordedFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize recorded frames to JSONL format.
pub fn serialize_detections(frames: &[RecordedFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
