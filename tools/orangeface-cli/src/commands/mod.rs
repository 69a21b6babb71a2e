pub mod config;
pub mod render;
pub mod replay;

use std::path::{Path, PathBuf};

use orangeface_compositor::{
    overlay_channel, CompositorOptions, DebugFont, FrameCompositor, OverlayLoader,
};
use orangeface_face_model::StatusSink;
use orangeface_runtime::AppConfig;

/// Build a compositor with the overlay and an optional custom font loaded.
///
/// A missing overlay or font degrades the output but never fails the
/// command.
pub async fn build_compositor(
    config: &AppConfig,
    overlay: Option<PathBuf>,
    font: Option<PathBuf>,
    sink: &dyn StatusSink,
) -> (FrameCompositor, OverlayLoader) {
    let (loader, slot) = overlay_channel();
    let overlay_path = overlay.unwrap_or_else(|| config.compositor.overlay_path.clone());
    if let Err(e) = loader.load(&overlay_path, sink).await {
        println!("  Overlay unavailable ({e}); rendering without it");
    }

    let mut compositor = FrameCompositor::new(CompositorOptions::from_settings(&config.compositor, &config.contour), slot);
    if let Some(font) = font.or_else(|| config.compositor.font_path.clone()) {
        match load_font(&font) {
            Some(font) => compositor = compositor.with_font(font),
            None => println!("  Font unavailable; using the bundled font"),
        }
    }
    (compositor, loader)
}

fn load_font(path: &Path) -> Option<DebugFont> {
    match DebugFont::load(path) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load font");
            None
        }
    }
}
