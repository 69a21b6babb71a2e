//! Output seam for rendered frames.

use orangeface_common::error::OrangefaceResult;
use orangeface_compositor::RenderSummary;
use tiny_skia::Pixmap;

/// Receives every frame the loop renders.
pub trait FramePresenter: Send {
    /// `index` counts rendered frames from zero for this loop run.
    fn present(
        &mut self,
        frame: &Pixmap,
        index: u64,
        summary: &RenderSummary,
    ) -> OrangefaceResult<()>;

    /// Called once when the loop exits.
    fn finish(&mut self) -> OrangefaceResult<()> {
        Ok(())
    }
}

/// Discards frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn present(&mut self, _: &Pixmap, _: u64, _: &RenderSummary) -> OrangefaceResult<()> {
        Ok(())
    }
}
