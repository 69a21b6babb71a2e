//! Video source seam.

use std::path::{Path, PathBuf};

use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_compositor::VideoFrame;
use serde::Serialize;

/// Readiness levels, following the media element convention.
pub mod ready_state {
    /// Nothing decoded yet.
    pub const HAVE_NOTHING: u8 = 0;
    /// Metadata known, no frame data.
    pub const HAVE_METADATA: u8 = 1;
    /// At least the current frame is decoded.
    pub const HAVE_CURRENT_DATA: u8 = 2;
    pub const HAVE_ENOUGH_DATA: u8 = 4;
}

/// Static description of a video source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<u32>,
}

/// A decoded frame and its position in the stream.
#[derive(Debug)]
pub struct SourceFrame {
    /// Zero-based position; positions whose decode failed are not reused.
    pub index: u64,
    pub frame: VideoFrame,
}

impl SourceFrame {
    pub fn new(index: u64, frame: VideoFrame) -> Self {
        Self { index, frame }
    }
}

/// Provider of decoded video frames.
///
/// Acquisition and permissions are the implementation's business; the
/// loop only asks for the latest frame.
#[async_trait::async_trait]
pub trait VideoSource: Send {
    /// The latest decoded frame, or `Ok(None)` if the source is not ready.
    ///
    /// An error means the frame at the current position could not be
    /// decoded. That position is consumed either way.
    async fn current_frame(&mut self) -> OrangefaceResult<Option<SourceFrame>>;

    /// Current readiness level (see [`ready_state`]).
    fn ready_state(&self) -> u8;

    fn info(&self) -> SourceInfo;
}

/// Image files in a directory, played back in file-name order.
///
/// Each call to `current_frame` advances to the next file, decoding it on
/// the blocking pool. A file that fails to decode is reported as an error
/// for its own index. Once every file has been served the source reports
/// `HAVE_NOTHING`.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    frame_rate: Option<u32>,
    dimensions: (u32, u32),
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

impl DirectorySource {
    pub fn open(dir: &Path) -> OrangefaceResult<Self> {
        if !dir.is_dir() {
            return Err(OrangefaceError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        let dimensions = match files.first() {
            Some(first) => image::image_dimensions(first).map_err(|e| {
                OrangefaceError::source(format!("cannot read {}: {e}", first.display()))
            })?,
            None => {
                return Err(OrangefaceError::source(format!(
                    "no image files in {}",
                    dir.display()
                )))
            }
        };

        tracing::info!(
            dir = %dir.display(),
            frames = files.len(),
            width = dimensions.0,
            height = dimensions.1,
            "Opened frame directory"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            next: 0,
            frame_rate: None,
            dimensions,
        })
    }

    /// Nominal frame rate reported by [`VideoSource::info`].
    pub fn with_frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.files.len().saturating_sub(self.next)
    }
}

#[async_trait::async_trait]
impl VideoSource for DirectorySource {
    async fn current_frame(&mut self) -> OrangefaceResult<Option<SourceFrame>> {
        let Some(path) = self.files.get(self.next).cloned() else {
            return Ok(None);
        };
        let index = self.next as u64;
        self.next += 1;

        let decoded = tokio::task::spawn_blocking({
            let path = path.clone();
            move || VideoFrame::open(&path)
        })
        .await
        .map_err(|e| OrangefaceError::source(format!("decode task failed: {e}")))?;

        match decoded {
            Ok(frame) => Ok(Some(SourceFrame::new(index, frame))),
            Err(e) => Err(OrangefaceError::source(format!(
                "frame {index} ({}): {e}",
                path.display()
            ))),
        }
    }

    fn ready_state(&self) -> u8 {
        if self.remaining() > 0 {
            ready_state::HAVE_ENOUGH_DATA
        } else {
            ready_state::HAVE_NOTHING
        }
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            label: self.dir.display().to_string(),
            width: self.dimensions.0,
            height: self.dimensions.1,
            frame_rate: self.frame_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orangeface-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_frame(dir: &Path, name: &str, shade: u8) {
        image::RgbaImage::from_pixel(4, 3, image::Rgba([shade, 0, 0, 255]))
            .save(dir.join(name))
            .unwrap();
    }

    #[tokio::test]
    async fn test_directory_plays_in_name_order() {
        let dir = temp_dir("source-order");
        for (name, shade) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            write_frame(&dir, name, shade);
        }
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut source = DirectorySource::open(&dir).unwrap().with_frame_rate(12);
        assert_eq!(source.len(), 3);
        assert_eq!(source.info().width, 4);
        assert_eq!(source.info().frame_rate, Some(12));

        let mut served = Vec::new();
        while let Some(frame) = source.current_frame().await.unwrap() {
            served.push((frame.index, frame.frame.to_rgba().get_pixel(0, 0).0[0]));
        }
        assert_eq!(served, vec![(0, 10), (1, 20), (2, 30)]);
        assert_eq!(source.ready_state(), ready_state::HAVE_NOTHING);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_corrupt_file_keeps_later_indices() {
        let dir = temp_dir("source-corrupt");
        write_frame(&dir, "f0.png", 10);
        std::fs::write(dir.join("f1.png"), b"not a png").unwrap();
        write_frame(&dir, "f2.png", 30);

        let mut source = DirectorySource::open(&dir).unwrap();
        let first = source.current_frame().await.unwrap().unwrap();
        assert_eq!(first.index, 0);

        let err = source.current_frame().await.unwrap_err();
        assert!(matches!(err, OrangefaceError::Source { .. }));
        assert!(err.to_string().contains("frame 1"));

        let third = source.current_frame().await.unwrap().unwrap();
        assert_eq!(third.index, 2);
        assert_eq!(third.frame.to_rgba().get_pixel(0, 0).0[0], 30);
        assert!(source.current_frame().await.unwrap().is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_directory_is_rejected() {
        let dir = temp_dir("source-empty");
        assert!(DirectorySource::open(&dir).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
