//! Default status sink.

use orangeface_face_model::{CameraState, ModelState, StatusEvent, StatusSink};

/// Logs every status event through `tracing`.
///
/// Per-frame detection outcomes go to `debug`, failures to `warn`, and
/// lifecycle changes to `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn on_status(&self, event: &StatusEvent) {
        match event {
            StatusEvent::Error { .. }
            | StatusEvent::ModelState {
                state: ModelState::Failed(_),
            } => tracing::warn!(target: "orangeface::status", "{event}"),
            StatusEvent::DetectionOutcome { .. }
            | StatusEvent::CameraState {
                state: CameraState::NotReady { .. },
            } => tracing::debug!(target: "orangeface::status", "{event}"),
            _ => tracing::info!(target: "orangeface::status", "{event}"),
        }
    }
}
