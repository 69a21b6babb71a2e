//! Compose a single frame.

use std::path::PathBuf;

use orangeface_compositor::raster::save_png;
use orangeface_compositor::{FrameRequest, VideoFrame};
use orangeface_face_model::{parse_detections, primary_detection, Detection, DetectorVariant};
use orangeface_runtime::{AppConfig, TracingSink};

pub struct RenderArgs {
    pub image: PathBuf,
    pub detections: PathBuf,
    pub frame: u64,
    pub output: PathBuf,
    pub debug: bool,
    pub detector: Option<DetectorVariant>,
    pub overlay: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

pub async fn run(args: RenderArgs, config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    println!("Rendering: {}", args.image.display());

    let source = VideoFrame::open(&args.image)?;
    let text = std::fs::read_to_string(&args.detections)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", args.detections.display()))?;
    let detections: Vec<Detection> = parse_detections(&text)?
        .into_iter()
        .find(|f| f.frame == args.frame)
        .map(|f| f.detections.into_iter().map(Detection::from).collect())
        .unwrap_or_default();

    let sink = TracingSink;
    let (mut compositor, _loader) =
        super::build_compositor(&config, args.overlay, args.font, &sink).await;

    let variant = args.detector.unwrap_or(config.detector.default_variant);
    let threshold = config.detector.config_for(variant).score_threshold();
    let mut request = FrameRequest::new(&source)
        .with_threshold(threshold)
        .with_debug(args.debug || config.compositor.debug)
        .with_variant(variant);
    if let Some(primary) = primary_detection(&detections, threshold) {
        request = request.with_detection(primary, detections.len());
    }

    let summary = compositor.compose(&request, &sink)?;
    let target = compositor
        .target()
        .ok_or_else(|| anyhow::anyhow!("Nothing was rendered"))?;
    save_png(target, &args.output)?;

    println!("  Faces: {}", detections.len());
    println!("  Masked regions: {}", summary.masked.len());
    println!("Saved: {}", args.output.display());
    Ok(())
}
