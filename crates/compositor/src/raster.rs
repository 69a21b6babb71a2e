//! Raster types and conversions between `image` buffers and tiny-skia.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_contour::{PathCommand, PathSpec};
use tiny_skia::{IntSize, Pixmap, PixmapRef};

/// One decoded video frame, stored premultiplied for compositing.
#[derive(Clone)]
pub struct VideoFrame {
    pixmap: Pixmap,
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl VideoFrame {
    /// Wrap an RGBA image. Fails only for zero-sized images.
    pub fn from_rgba(image: &RgbaImage) -> OrangefaceResult<Self> {
        let pixmap = rgba_to_pixmap(image)?;
        Ok(Self { pixmap })
    }

    pub fn from_dynamic(image: &DynamicImage) -> OrangefaceResult<Self> {
        Self::from_rgba(&image.to_rgba8())
    }

    /// Decode an image file from disk.
    pub fn open(path: &Path) -> OrangefaceResult<Self> {
        if !path.exists() {
            return Err(OrangefaceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path).map_err(|e| {
            OrangefaceError::source(format!("failed to decode {}: {e}", path.display()))
        })?;
        Self::from_dynamic(&image)
    }

    /// Solid-color frame, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> OrangefaceResult<Self> {
        Self::from_rgba(&RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn as_pixmap(&self) -> PixmapRef<'_> {
        self.pixmap.as_ref()
    }

    pub fn to_rgba(&self) -> RgbaImage {
        pixmap_to_rgba(&self.pixmap)
    }
}

/// Convert straight-alpha RGBA into a premultiplied pixmap.
pub fn rgba_to_pixmap(image: &RgbaImage) -> OrangefaceResult<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or_else(|| {
        OrangefaceError::render(format!("cannot build a {width}x{height} raster"))
    })?;

    let mut data = image.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let alpha = px[3] as u16;
        if alpha < 255 {
            for channel in &mut px[..3] {
                *channel = ((*channel as u16 * alpha + 127) / 255) as u8;
            }
        }
    }

    Pixmap::from_vec(data, size)
        .ok_or_else(|| OrangefaceError::render("raster buffer size mismatch"))
}

/// Convert a premultiplied pixmap back to straight-alpha RGBA.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = image::Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    out
}

/// Write a rendered frame as PNG.
pub fn save_png(pixmap: &Pixmap, path: &Path) -> OrangefaceResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    pixmap_to_rgba(pixmap)
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| OrangefaceError::render(format!("failed to write {}: {e}", path.display())))
}

/// Translate a backend-neutral path into a tiny-skia path.
///
/// Returns `None` for paths that enclose nothing drawable.
pub fn to_skia_path(outline: &PathSpec) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();
    for command in outline.commands() {
        match *command {
            PathCommand::MoveTo { to } => builder.move_to(to.x as f32, to.y as f32),
            PathCommand::LineTo { to } => builder.line_to(to.x as f32, to.y as f32),
            PathCommand::CubicTo { ctrl1, ctrl2, to } => builder.cubic_to(
                ctrl1.x as f32,
                ctrl1.y as f32,
                ctrl2.x as f32,
                ctrl2.y as f32,
                to.x as f32,
                to.y as f32,
            ),
            PathCommand::Close => builder.close(),
        }
    }
    builder.finish()
}
