//! Face detector seam.

use std::collections::HashMap;
use std::path::Path;

use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_face_model::{parse_detections, Detection, DetectorConfig, RecordedFrame};

use crate::source::SourceFrame;

/// Abstract interface for a face and landmark detector.
///
/// The loop owns its detector exclusively and never issues a second call
/// before the previous one has resolved.
#[async_trait::async_trait]
pub trait FaceDetector: Send {
    /// Detect faces in `frame`, best first.
    async fn detect_all(
        &mut self,
        frame: &SourceFrame,
        config: &DetectorConfig,
    ) -> OrangefaceResult<Vec<Detection>>;
}

/// Replays detections recorded in a JSONL log.
///
/// Calls are matched to recorded frames by the source frame index, so a
/// frame the source failed to decode never shifts later detections.
/// Frames missing from the log yield no detections. The variant's threshold and result cap
/// are applied as a live detector would.
#[derive(Debug, Default)]
pub struct ReplayDetector {
    frames: HashMap<u64, Vec<Detection>>,
    calls: u64,
}

impl ReplayDetector {
    pub fn from_frames(frames: Vec<RecordedFrame>) -> Self {
        let frames = frames
            .into_iter()
            .map(|f| (f.frame, f.detections.into_iter().map(Detection::from).collect()))
            .collect();
        Self { frames, calls: 0 }
    }

    pub fn from_jsonl(jsonl: &str) -> OrangefaceResult<Self> {
        Ok(Self::from_frames(parse_detections(jsonl)?))
    }

    pub fn open(path: &Path) -> OrangefaceResult<Self> {
        if !path.exists() {
            return Err(OrangefaceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let detector = Self::from_jsonl(&text)?;
        tracing::info!(
            path = %path.display(),
            frames = detector.frames.len(),
            "Loaded recorded detections"
        );
        Ok(detector)
    }

    /// Detections recorded for `frame`, unfiltered.
    pub fn recorded(&self, frame: u64) -> &[Detection] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

#[async_trait::async_trait]
impl FaceDetector for ReplayDetector {
    async fn detect_all(
        &mut self,
        frame: &SourceFrame,
        config: &DetectorConfig,
    ) -> OrangefaceResult<Vec<Detection>> {
        let index = frame.index;
        self.calls += 1;

        let threshold = config.score_threshold();
        let mut found: Vec<Detection> = self
            .recorded(index)
            .iter()
            .filter(|d| d.score >= threshold)
            .cloned()
            .collect();
        if let Some(cap) = config.max_results() {
            found.truncate(cap);
        }
        tracing::trace!(frame = index, found = found.len(), "Replayed detections");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orangeface_compositor::VideoFrame;
    use orangeface_face_model::{AccurateParams, FastParams};

    const LOG: &str = r#"
# two faces on frame 0, nothing on frame 1
{"frame":0,"detections":[{"box":{"x":1,"y":2,"width":30,"height":30},"score":0.9},{"box":{"x":50,"y":2,"width":30,"height":30},"score":0.15}]}
{"frame":2,"detections":[{"box":{"x":5,"y":5,"width":20,"height":20},"score":0.05}]}
"#;

    fn frame(index: u64) -> SourceFrame {
        SourceFrame::new(index, VideoFrame::solid(2, 2, [0, 0, 0, 255]).unwrap())
    }

    #[tokio::test]
    async fn test_replay_follows_frame_index() {
        let mut detector = ReplayDetector::from_jsonl(LOG).unwrap();
        let config = DetectorConfig::Fast(FastParams::default());

        assert_eq!(detector.detect_all(&frame(0), &config).await.unwrap().len(), 1);
        assert!(detector.detect_all(&frame(1), &config).await.unwrap().is_empty());
        // below the fast threshold of 0.2
        assert!(detector.detect_all(&frame(2), &config).await.unwrap().is_empty());
        assert_eq!(detector.calls(), 3);
    }

    #[tokio::test]
    async fn test_skipped_frame_does_not_shift_detections() {
        let log = r#"
{"frame":0,"detections":[{"box":{"x":0,"y":0,"width":10,"height":10},"score":0.90}]}
{"frame":1,"detections":[{"box":{"x":0,"y":0,"width":10,"height":10},"score":0.51}]}
{"frame":2,"detections":[{"box":{"x":0,"y":0,"width":10,"height":10},"score":0.72}]}
"#;
        let mut detector = ReplayDetector::from_jsonl(log).unwrap();
        let config = DetectorConfig::Accurate(AccurateParams::default());

        let first = detector.detect_all(&frame(0), &config).await.unwrap();
        // frame 1 failed to decode and never reached the detector
        let third = detector.detect_all(&frame(2), &config).await.unwrap();
        assert!((first[0].score - 0.90).abs() < 1e-9);
        assert!((third[0].score - 0.72).abs() < 1e-9);
        assert_eq!(detector.calls(), 2);
    }

    #[tokio::test]
    async fn test_accurate_variant_caps_results() {
        let mut detector = ReplayDetector::from_jsonl(LOG).unwrap();
        let config = DetectorConfig::Accurate(AccurateParams::default());
        let found = detector.detect_all(&frame(0), &config).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!((found[0].score - 0.9).abs() < 1e-9);
        assert_eq!(detector.recorded(0).len(), 2);
    }

    #[test]
    fn test_missing_log_file() {
        let err = ReplayDetector::open(Path::new("/nonexistent/detections.jsonl")).unwrap_err();
        assert!(matches!(err, OrangefaceError::FileNotFound { .. }));
    }
}
