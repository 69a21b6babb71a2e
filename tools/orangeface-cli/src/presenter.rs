//! Writes rendered frames as PNG files.

use std::path::PathBuf;

use orangeface_common::error::OrangefaceResult;
use orangeface_compositor::raster::save_png;
use orangeface_compositor::RenderSummary;
use orangeface_runtime::FramePresenter;
use tiny_skia::Pixmap;

/// File name used when only the last frame is kept.
pub const SNAPSHOT_NAME: &str = "orange-face.png";

pub struct PngPresenter {
    dir: PathBuf,
    last_only: bool,
    last: Option<Pixmap>,
    written: usize,
}

impl PngPresenter {
    pub fn new(dir: PathBuf, last_only: bool) -> Self {
        Self {
            dir,
            last_only,
            last: None,
            written: 0,
        }
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{index:05}.png"))
    }
}

impl FramePresenter for PngPresenter {
    fn present(
        &mut self,
        frame: &Pixmap,
        index: u64,
        summary: &RenderSummary,
    ) -> OrangefaceResult<()> {
        tracing::trace!(index, masked = summary.masked.len(), "Presenting frame");
        if self.last_only {
            self.last = Some(frame.clone());
            return Ok(());
        }
        save_png(frame, &self.frame_path(index))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OrangefaceResult<()> {
        if let Some(last) = self.last.take() {
            save_png(&last, &self.dir.join(SNAPSHOT_NAME))?;
            self.written += 1;
        }
        tracing::info!(dir = %self.dir.display(), written = self.written, "Frames written");
        Ok(())
    }
}
