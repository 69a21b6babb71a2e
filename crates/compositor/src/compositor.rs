//! The per-frame compositor.

use orangeface_common::config::{CompositorSettings, ContourSettings};
use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_contour::{ContourBuilder, Region, DEFAULT_EYE_PADDING};
use orangeface_face_model::{
    BoundingBox, Detection, DetectionOutcome, DetectorVariant, ErrorKind, FaceLandmarks,
    StatusEvent, StatusSink,
};
use tiny_skia::{
    Color, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::overlay::OverlaySlot;
use crate::raster::{pixmap_to_rgba, to_skia_path, VideoFrame};
use crate::text::DebugFont;

const BBOX_RGBA: [u8; 4] = [0, 255, 0, 255];
const BBOX_STROKE_WIDTH: f32 = 2.0;
const EYE_MARKER_RGBA: [u8; 4] = [255, 255, 0, 255];
const MOUTH_MARKER_RGBA: [u8; 4] = [0, 255, 255, 255];
const MARKER_RADIUS: f32 = 2.0;
const PANEL_RGBA: [u8; 4] = [0, 0, 0, 128];
const TEXT_RGB: [u8; 3] = [255, 255, 255];

/// Tunables for a [`FrameCompositor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorOptions {
    /// Overlay side as a multiple of the face box width.
    pub overlay_scale: f64,
    pub eye_padding: f64,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            overlay_scale: 1.5,
            eye_padding: DEFAULT_EYE_PADDING,
        }
    }
}

impl CompositorOptions {
    pub fn from_settings(compositor: &CompositorSettings, contour: &ContourSettings) -> Self {
        Self {
            overlay_scale: compositor.overlay_scale,
            eye_padding: contour.eye_padding,
        }
    }
}

/// Inputs for rendering one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    pub source: &'a VideoFrame,
    /// First-ranked detection for this frame, if any.
    pub detection: Option<&'a Detection>,
    /// Number of faces the detector returned.
    pub face_count: usize,
    /// Detections scoring below this are rendered as "no face".
    pub score_threshold: f64,
    pub debug: bool,
    pub variant: DetectorVariant,
}

impl<'a> FrameRequest<'a> {
    pub fn new(source: &'a VideoFrame) -> Self {
        Self {
            source,
            detection: None,
            face_count: 0,
            score_threshold: 0.0,
            debug: false,
            variant: DetectorVariant::default(),
        }
    }

    pub fn with_detection(mut self, detection: &'a Detection, face_count: usize) -> Self {
        self.detection = Some(detection);
        self.face_count = face_count.max(1);
        self
    }

    pub fn with_threshold(mut self, score_threshold: f64) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_variant(mut self, variant: DetectorVariant) -> Self {
        self.variant = variant;
        self
    }
}

/// What a call to [`FrameCompositor::compose`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    /// The target raster was (re)allocated for this frame.
    pub resized: bool,
    pub outcome: DetectionOutcome,
    /// Where the overlay was drawn; `None` if no face or no overlay loaded.
    pub overlay: Option<BoundingBox>,
    /// Regions whose live video was composited through a contour clip.
    pub masked: Vec<Region>,
    /// Regions skipped because their landmarks could not form a contour.
    pub skipped: Vec<Region>,
}

/// Renders output frames from a source frame and the current detection.
///
/// The only state kept between frames is the target raster, reused while
/// the source resolution is unchanged.
pub struct FrameCompositor {
    target: Option<Pixmap>,
    contours: ContourBuilder,
    overlay: OverlaySlot,
    font: Option<DebugFont>,
    overlay_scale: f64,
}

impl FrameCompositor {
    /// Debug text uses the bundled font until [`FrameCompositor::with_font`]
    /// replaces it.
    pub fn new(options: CompositorOptions, overlay: OverlaySlot) -> Self {
        let font = match DebugFont::bundled() {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(error = %e, "Debug text disabled");
                None
            }
        };
        Self {
            target: None,
            contours: ContourBuilder::new(options.eye_padding),
            overlay,
            font,
            overlay_scale: options.overlay_scale,
        }
    }

    /// Use `font` for debug text instead of the bundled one.
    pub fn with_font(mut self, font: DebugFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn contours(&self) -> &ContourBuilder {
        &self.contours
    }

    /// The most recently rendered frame.
    pub fn target(&self) -> Option<&Pixmap> {
        self.target.as_ref()
    }

    /// Straight-alpha copy of the most recently rendered frame.
    pub fn snapshot(&self) -> Option<image::RgbaImage> {
        self.target.as_ref().map(pixmap_to_rgba)
    }

    /// Render one frame into the target raster.
    pub fn compose(
        &mut self,
        request: &FrameRequest<'_>,
        sink: &dyn StatusSink,
    ) -> OrangefaceResult<RenderSummary> {
        let source = request.source;
        let (width, height) = source.dimensions();
        let resized = self.ensure_target(width, height, sink)?;
        let target = self
            .target
            .as_mut()
            .ok_or_else(|| OrangefaceError::render("target raster missing after resize"))?;

        draw_base_layer(target, source, request.debug);

        let detection = request
            .detection
            .filter(|d| d.score >= request.score_threshold);

        let Some(detection) = detection else {
            if request.debug {
                draw_no_face_banner(target, self.font.as_ref());
            }
            sink.on_status(&StatusEvent::outcome(DetectionOutcome::NoFace));
            return Ok(RenderSummary {
                resized,
                outcome: DetectionOutcome::NoFace,
                overlay: None,
                masked: Vec::new(),
                skipped: Vec::new(),
            });
        };

        let detected = DetectionOutcome::FaceDetected {
            count: request.face_count.max(1),
            score: detection.score,
        };
        sink.on_status(&StatusEvent::outcome(detected.clone()));

        if request.debug {
            stroke_box(target, &detection.bbox);
        }

        let square = detection.bbox.centered_square(self.overlay_scale);
        let overlay = match self.overlay.current() {
            Some(image) => {
                draw_overlay(target, &image, &square);
                Some(square)
            }
            None => {
                tracing::trace!("Overlay not loaded, skipping placement");
                None
            }
        };

        let mut masked = Vec::new();
        let mut skipped = Vec::new();
        let outcome = match &detection.landmarks {
            Some(landmarks) => {
                for contour in self.contours.build_all(landmarks) {
                    let clip = contour.path.map_err(|e| e.to_string()).and_then(|outline| {
                        to_skia_path(&outline).ok_or_else(|| "contour encloses no area".to_string())
                    });
                    match clip {
                        Ok(path) => {
                            if composite_through_clip(target, source, &path) {
                                masked.push(contour.region);
                            } else {
                                skipped.push(contour.region);
                            }
                        }
                        Err(reason) => {
                            sink.on_status(&StatusEvent::error(
                                ErrorKind::Precondition,
                                format!("{}: {reason}", contour.region),
                            ));
                            skipped.push(contour.region);
                        }
                    }
                }
                // after the live regions, so eye markers stay visible
                if request.debug {
                    draw_markers(target, landmarks);
                }
                detected
            }
            None => {
                sink.on_status(&StatusEvent::outcome(DetectionOutcome::LandmarksMissing));
                DetectionOutcome::LandmarksMissing
            }
        };

        if request.debug {
            draw_info_panel(
                target,
                self.font.as_ref(),
                request.variant,
                detection.score,
                (width, height),
            );
        }

        Ok(RenderSummary {
            resized,
            outcome,
            overlay,
            masked,
            skipped,
        })
    }

    fn ensure_target(
        &mut self,
        width: u32,
        height: u32,
        sink: &dyn StatusSink,
    ) -> OrangefaceResult<bool> {
        let unchanged = self
            .target
            .as_ref()
            .is_some_and(|t| t.width() == width && t.height() == height);
        if unchanged {
            return Ok(false);
        }
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            OrangefaceError::render(format!("cannot allocate a {width}x{height} target"))
        })?;
        tracing::debug!(width, height, "Resized render target");
        sink.on_status(&StatusEvent::FrameResized { width, height });
        self.target = Some(pixmap);
        Ok(true)
    }
}

fn paint(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    paint
}

fn draw_base_layer(target: &mut Pixmap, source: &VideoFrame, debug: bool) {
    if debug {
        target.fill(Color::TRANSPARENT);
        target.draw_pixmap(
            0,
            0,
            source.as_pixmap(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    } else {
        target.fill(Color::BLACK);
    }
}

fn fill_rect(target: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, rgba: [u8; 4]) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        target.fill_rect(rect, &paint(rgba), Transform::identity(), None);
    }
}

fn draw_no_face_banner(target: &mut Pixmap, font: Option<&DebugFont>) {
    fill_rect(target, 10.0, 10.0, 280.0, 30.0, PANEL_RGBA);
    if let Some(font) = font {
        font.draw(target, "No face detected", 20.0, 30.0, 16.0, TEXT_RGB);
    }
}

fn draw_info_panel(
    target: &mut Pixmap,
    font: Option<&DebugFont>,
    variant: DetectorVariant,
    score: f64,
    (width, height): (u32, u32),
) {
    fill_rect(target, 0.0, 0.0, 300.0, 80.0, PANEL_RGBA);
    let Some(font) = font else {
        return;
    };
    let lines = [
        format!("Detector: {}", variant.label()),
        format!("Confidence: {score:.2}"),
        format!("Resolution: {width}x{height}"),
    ];
    for (i, line) in lines.iter().enumerate() {
        font.draw(target, line, 10.0, 20.0 * (i as f32 + 1.0), 12.0, TEXT_RGB);
    }
}

fn stroke_box(target: &mut Pixmap, bbox: &BoundingBox) {
    let Some(rect) = Rect::from_xywh(
        bbox.x as f32,
        bbox.y as f32,
        bbox.width as f32,
        bbox.height as f32,
    ) else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let stroke = Stroke {
        width: BBOX_STROKE_WIDTH,
        ..Stroke::default()
    };
    target.stroke_path(
        &path,
        &paint(BBOX_RGBA),
        &stroke,
        Transform::identity(),
        None,
    );
}

/// Scale the overlay into `square`.
fn draw_overlay(target: &mut Pixmap, overlay: &Pixmap, square: &BoundingBox) {
    if overlay.width() == 0 || overlay.height() == 0 || square.width <= 0.0 {
        return;
    }
    let sx = (square.width / overlay.width() as f64) as f32;
    let sy = (square.height / overlay.height() as f64) as f32;
    let transform = Transform::from_row(sx, 0.0, 0.0, sy, square.x as f32, square.y as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, overlay.as_ref(), &paint, transform, None);
}

fn draw_markers(target: &mut Pixmap, landmarks: &FaceLandmarks) {
    let groups = [
        (landmarks.eye_points().collect::<Vec<_>>(), EYE_MARKER_RGBA),
        (landmarks.mouth.iter().collect::<Vec<_>>(), MOUTH_MARKER_RGBA),
    ];
    for (points, rgba) in groups {
        let paint = paint(rgba);
        for point in points {
            if let Some(dot) = PathBuilder::from_circle(point.x as f32, point.y as f32, MARKER_RADIUS)
            {
                target.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    }
}

/// Draw `source` into `target` through a mask of `path`.
///
/// The mask lives for this one draw call only. Returns false if no mask
/// could be allocated.
fn composite_through_clip(target: &mut Pixmap, source: &VideoFrame, path: &tiny_skia::Path) -> bool {
    let Some(mut mask) = Mask::new(target.width(), target.height()) else {
        return false;
    };
    mask.fill_path(path, FillRule::Winding, true, Transform::identity());
    target.draw_pixmap(
        0,
        0,
        source.as_pixmap(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&mask),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use orangeface_face_model::{Point2D, StatusLog};

    fn pixel(compositor: &FrameCompositor, x: u32, y: u32) -> [u8; 4] {
        compositor.snapshot().unwrap().get_pixel(x, y).0
    }

    fn square_eye(cx: f64, cy: f64, r: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(cx - r, cy),
            Point2D::new(cx, cy - r),
            Point2D::new(cx + r, cy),
            Point2D::new(cx, cy + r),
        ]
    }

    fn landmarks() -> FaceLandmarks {
        FaceLandmarks {
            left_eye: square_eye(40.0, 40.0, 5.0),
            right_eye: square_eye(80.0, 40.0, 5.0),
            mouth: vec![
                Point2D::new(45.0, 80.0),
                Point2D::new(75.0, 80.0),
                Point2D::new(75.0, 90.0),
                Point2D::new(45.0, 90.0),
            ],
        }
    }

    #[test]
    fn test_blank_base_layer_hides_video() {
        let source = VideoFrame::solid(16, 8, [200, 10, 10, 255]).unwrap();
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let log = StatusLog::new();

        let summary = compositor.compose(&FrameRequest::new(&source), &log).unwrap();

        assert!(summary.resized);
        assert_eq!(summary.outcome, DetectionOutcome::NoFace);
        assert_eq!(pixel(&compositor, 8, 4), [0, 0, 0, 255]);
        assert!(log.contains(|e| matches!(e, StatusEvent::FrameResized { width: 16, height: 8 })));
    }

    #[test]
    fn test_resize_reported_only_on_change() {
        let small = VideoFrame::solid(4, 4, [0, 0, 0, 255]).unwrap();
        let large = VideoFrame::solid(8, 6, [0, 0, 0, 255]).unwrap();
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let log = StatusLog::new();

        assert!(compositor.compose(&FrameRequest::new(&small), &log).unwrap().resized);
        assert!(!compositor.compose(&FrameRequest::new(&small), &log).unwrap().resized);
        assert!(compositor.compose(&FrameRequest::new(&large), &log).unwrap().resized);
        let resizes = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, StatusEvent::FrameResized { .. }))
            .count();
        assert_eq!(resizes, 2);
        assert_eq!(compositor.target().unwrap().width(), 8);
    }

    #[test]
    fn test_low_score_is_no_face() {
        let source = VideoFrame::solid(32, 32, [9, 9, 9, 255]).unwrap();
        let detection = Detection::new(BoundingBox::new(4.0, 4.0, 10.0, 10.0), 0.05);
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let request = FrameRequest::new(&source)
            .with_detection(&detection, 1)
            .with_threshold(0.1);

        let summary = compositor.compose(&request, &StatusLog::new()).unwrap();
        assert_eq!(summary.outcome, DetectionOutcome::NoFace);
    }

    #[test]
    fn test_eye_and_mouth_regions_show_live_video() {
        let source = VideoFrame::solid(120, 120, [30, 200, 60, 255]).unwrap();
        let detection = Detection::new(BoundingBox::new(20.0, 20.0, 80.0, 80.0), 0.9)
            .with_landmarks(landmarks());
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let log = StatusLog::new();
        let request = FrameRequest::new(&source).with_detection(&detection, 1);

        let summary = compositor.compose(&request, &log).unwrap();

        assert_eq!(summary.masked, Region::ALL.to_vec());
        assert!(summary.skipped.is_empty());
        assert_eq!(pixel(&compositor, 40, 40), [30, 200, 60, 255]);
        assert_eq!(pixel(&compositor, 60, 85), [30, 200, 60, 255]);
        assert_eq!(pixel(&compositor, 60, 60), [0, 0, 0, 255]);
    }

    #[test]
    fn test_degenerate_region_is_skipped_and_reported() {
        let source = VideoFrame::solid(120, 120, [30, 200, 60, 255]).unwrap();
        let mut marks = landmarks();
        marks.mouth.truncate(2);
        let detection =
            Detection::new(BoundingBox::new(20.0, 20.0, 80.0, 80.0), 0.9).with_landmarks(marks);
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let log = StatusLog::new();

        let summary = compositor
            .compose(&FrameRequest::new(&source).with_detection(&detection, 1), &log)
            .unwrap();

        assert_eq!(summary.masked, vec![Region::LeftEye, Region::RightEye]);
        assert_eq!(summary.skipped, vec![Region::Mouth]);
        assert!(log.contains(|e| matches!(
            e,
            StatusEvent::Error {
                kind: ErrorKind::Precondition,
                ..
            }
        )));
        assert_eq!(pixel(&compositor, 60, 85), [0, 0, 0, 255]);
    }

    #[test]
    fn test_missing_landmarks_reported() {
        let source = VideoFrame::solid(64, 64, [1, 2, 3, 255]).unwrap();
        let detection = Detection::new(BoundingBox::new(8.0, 8.0, 32.0, 32.0), 0.7);
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let log = StatusLog::new();

        let summary = compositor
            .compose(&FrameRequest::new(&source).with_detection(&detection, 1), &log)
            .unwrap();

        assert_eq!(summary.outcome, DetectionOutcome::LandmarksMissing);
        assert!(summary.masked.is_empty());
        assert!(log.contains(|e| matches!(
            e,
            StatusEvent::DetectionOutcome {
                outcome: DetectionOutcome::LandmarksMissing
            }
        )));
    }

    #[test]
    fn test_debug_draws_box_and_panel() {
        let source = VideoFrame::solid(320, 240, [100, 100, 100, 255]).unwrap();
        let detection = Detection::new(BoundingBox::new(150.0, 120.0, 60.0, 60.0), 0.8);
        let mut compositor = FrameCompositor::new(CompositorOptions::default(), OverlaySlot::empty());
        let request = FrameRequest::new(&source)
            .with_detection(&detection, 1)
            .with_debug(true);

        compositor.compose(&request, &StatusLog::new()).unwrap();

        // passthrough outside the panel and box
        assert_eq!(pixel(&compositor, 310, 230), [100, 100, 100, 255]);
        // lime box edge
        let edge = pixel(&compositor, 180, 120);
        assert!(edge[1] > 200 && edge[0] < 60 && edge[2] < 60);
        // darkened under the info panel
        let panel = pixel(&compositor, 290, 70);
        assert!(panel[0] < 60 && panel[3] == 255);
    }
}
