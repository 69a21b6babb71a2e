//! Overlay image asset.
//!
//! The overlay is decoded once, off the frame loop, and published through a
//! watch channel. The compositor only ever reads the latest published state,
//! so frames rendered before the load finishes simply skip the overlay.

use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_face_model::{ErrorKind, OverlayState, StatusEvent, StatusSink};
use tiny_skia::Pixmap;
use tokio::sync::watch;

use crate::raster::rgba_to_pixmap;

/// Current state of the overlay asset.
#[derive(Clone)]
pub enum OverlayStatus {
    /// Load not started or still in progress.
    Pending,
    Ready(Arc<Pixmap>),
    /// Load failed; the overlay is skipped until a reload succeeds.
    Unavailable(String),
}

impl std::fmt::Debug for OverlayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayStatus::Pending => write!(f, "Pending"),
            OverlayStatus::Ready(p) => write!(f, "Ready({}x{})", p.width(), p.height()),
            OverlayStatus::Unavailable(reason) => write!(f, "Unavailable({reason})"),
        }
    }
}

/// Producer side: decodes and publishes the overlay.
#[derive(Debug)]
pub struct OverlayLoader {
    tx: watch::Sender<OverlayStatus>,
}

/// Consumer side: read by the compositor every frame.
#[derive(Debug, Clone)]
pub struct OverlaySlot {
    rx: watch::Receiver<OverlayStatus>,
}

/// Create a connected loader/slot pair starting in `Pending`.
pub fn overlay_channel() -> (OverlayLoader, OverlaySlot) {
    let (tx, rx) = watch::channel(OverlayStatus::Pending);
    (OverlayLoader { tx }, OverlaySlot { rx })
}

impl OverlayLoader {
    /// Decode the image at `path` on a blocking thread and publish it.
    ///
    /// Failure is reported to `sink` and published as `Unavailable`; the
    /// error is also returned so callers can log it with context.
    pub async fn load(&self, path: &Path, sink: &dyn StatusSink) -> OrangefaceResult<()> {
        let owned = path.to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || decode_overlay(&owned))
            .await
            .map_err(|e| OrangefaceError::asset_load(format!("overlay decode task failed: {e}")))
            .and_then(|result| result);

        match decoded {
            Ok(pixmap) => {
                self.publish(pixmap, sink);
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string(), sink);
                Err(err)
            }
        }
    }

    /// Publish an already-decoded image.
    pub fn set_image(&self, image: &RgbaImage, sink: &dyn StatusSink) -> OrangefaceResult<()> {
        match rgba_to_pixmap(image) {
            Ok(pixmap) => {
                self.publish(pixmap, sink);
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string(), sink);
                Err(err)
            }
        }
    }

    /// Publish a failure without attempting a load.
    pub fn fail(&self, reason: impl Into<String>, sink: &dyn StatusSink) {
        let reason = reason.into();
        tracing::warn!(%reason, "Overlay image unavailable");
        sink.on_status(&StatusEvent::error(ErrorKind::AssetLoad, reason.clone()));
        sink.on_status(&StatusEvent::Overlay {
            state: OverlayState::Unavailable {
                reason: reason.clone(),
            },
        });
        self.tx.send_replace(OverlayStatus::Unavailable(reason));
    }

    pub fn slot(&self) -> OverlaySlot {
        OverlaySlot {
            rx: self.tx.subscribe(),
        }
    }

    fn publish(&self, pixmap: Pixmap, sink: &dyn StatusSink) {
        let (width, height) = (pixmap.width(), pixmap.height());
        tracing::info!(width, height, "Overlay image loaded");
        sink.on_status(&StatusEvent::Overlay {
            state: OverlayState::Loaded { width, height },
        });
        self.tx.send_replace(OverlayStatus::Ready(Arc::new(pixmap)));
    }
}

impl OverlaySlot {
    /// The overlay raster, if it has finished loading.
    pub fn current(&self) -> Option<Arc<Pixmap>> {
        match &*self.rx.borrow() {
            OverlayStatus::Ready(pixmap) => Some(Arc::clone(pixmap)),
            _ => None,
        }
    }

    pub fn status(&self) -> OverlayStatus {
        self.rx.borrow().clone()
    }

    /// Slot that never receives an overlay.
    pub fn empty() -> Self {
        let (_, slot) = overlay_channel();
        slot
    }
}

fn decode_overlay(path: &Path) -> OrangefaceResult<Pixmap> {
    if !path.exists() {
        return Err(OrangefaceError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let image = image::open(path)
        .map_err(|e| OrangefaceError::asset_load(format!("{}: {e}", path.display())))?;
    rgba_to_pixmap(&image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orangeface_face_model::StatusLog;

    #[test]
    fn test_slot_starts_pending() {
        let (_loader, slot) = overlay_channel();
        assert!(slot.current().is_none());
        assert!(matches!(slot.status(), OverlayStatus::Pending));
    }

    #[test]
    fn test_set_image_publishes() {
        let (loader, slot) = overlay_channel();
        let log = StatusLog::new();
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([255, 128, 0, 255]));
        loader.set_image(&image, &log).unwrap();
        let pixmap = slot.current().unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (4, 4));
        assert!(log.contains(|e| matches!(
            e,
            StatusEvent::Overlay {
                state: OverlayState::Loaded { width: 4, height: 4 }
            }
        )));
    }

    #[tokio::test]
    async fn test_missing_file_marks_unavailable() {
        let (loader, slot) = overlay_channel();
        let log = StatusLog::new();
        let result = loader
            .load(Path::new("/nonexistent/orange.jpg"), &log)
            .await;
        assert!(result.is_err());
        assert!(matches!(slot.status(), OverlayStatus::Unavailable(_)));
        assert!(log.contains(|e| matches!(
            e,
            StatusEvent::Error {
                kind: ErrorKind::AssetLoad,
                ..
            }
        )));
    }

    #[test]
    fn test_empty_slot_survives_dropped_loader() {
        let slot = OverlaySlot::empty();
        assert!(slot.current().is_none());
    }
}
