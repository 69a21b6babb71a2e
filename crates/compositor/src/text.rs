//! Debug text rendering with TrueType fonts.
//!
//! DejaVu Sans Mono is bundled so debug text renders without configuration.

use std::path::Path;

use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use rusttype::{point, Font, Scale};
use tiny_skia::Pixmap;

const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// A loaded font for debug overlays.
pub struct DebugFont {
    font: Font<'static>,
}

impl std::fmt::Debug for DebugFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugFont")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl DebugFont {
    /// The font shipped with the crate.
    pub fn bundled() -> OrangefaceResult<Self> {
        let font = Font::try_from_bytes(BUNDLED_FONT)
            .ok_or_else(|| OrangefaceError::asset_load("bundled font is corrupt"))?;
        Ok(Self { font })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> OrangefaceResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| OrangefaceError::asset_load("not a valid TrueType font"))?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> OrangefaceResult<Self> {
        if !path.exists() {
            return Err(OrangefaceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Draw `text` with its baseline at `(x, baseline)`.
    ///
    /// Glyph coverage is blended over the existing premultiplied pixels.
    /// Glyphs falling outside the pixmap are clipped.
    pub fn draw(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        x: f32,
        baseline: f32,
        size_px: f32,
        rgb: [u8; 3],
    ) {
        let width = pixmap.width() as i32;
        let height = pixmap.height() as i32;
        let data = pixmap.data_mut();

        for glyph in self
            .font
            .layout(text, Scale::uniform(size_px), point(x, baseline))
        {
            let Some(bounds) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = bounds.min.x + gx as i32;
                let py = bounds.min.y + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height {
                    return;
                }
                let idx = ((py * width + px) * 4) as usize;
                blend_coverage(&mut data[idx..idx + 4], rgb, coverage);
            });
        }
    }
}

/// Source-over blend of an opaque color with partial coverage.
fn blend_coverage(dst: &mut [u8], rgb: [u8; 3], coverage: f32) {
    let cov = coverage.clamp(0.0, 1.0);
    let inv = 1.0 - cov;
    for (channel, &src) in dst[..3].iter_mut().zip(rgb.iter()) {
        *channel = (src as f32 * cov + *channel as f32 * inv).round() as u8;
    }
    dst[3] = (255.0 * cov + dst[3] as f32 * inv).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_full_and_zero_coverage() {
        let mut px = [10, 20, 30, 255];
        blend_coverage(&mut px, [255, 255, 255], 0.0);
        assert_eq!(px, [10, 20, 30, 255]);
        blend_coverage(&mut px, [255, 255, 255], 1.0);
        assert_eq!(px, [255, 255, 255, 255]);
    }

    #[test]
    fn test_blend_half_coverage_over_transparent() {
        let mut px = [0, 0, 0, 0];
        blend_coverage(&mut px, [200, 100, 0], 0.5);
        assert_eq!(px, [100, 50, 0, 128]);
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(DebugFont::from_bytes(vec![0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_bundled_font_draws_coverage() {
        let font = DebugFont::bundled().unwrap();
        let mut pixmap = Pixmap::new(80, 24).unwrap();
        font.draw(&mut pixmap, "Face", 2.0, 18.0, 16.0, [255, 255, 255]);
        let lit = pixmap.data().chunks(4).filter(|px| px[3] > 0).count();
        assert!(lit > 20, "lit = {lit}");
    }
}
