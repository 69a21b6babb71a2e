//! Run the detection loop over a directory of frames.

use std::path::PathBuf;
use std::sync::Arc;

use orangeface_face_model::{DetectorVariant, StatusSink};
use orangeface_runtime::{
    AppConfig, DetectionLoop, DirectorySource, IntervalScheduler, LoopParts, LoopSettings, ModelRegistry,
    PreloadedModels, ReplayDetector, TracingSink,
};

use crate::presenter::PngPresenter;

pub struct ReplayArgs {
    pub frames: PathBuf,
    pub detections: PathBuf,
    pub output: PathBuf,
    pub debug: bool,
    pub detector: Option<DetectorVariant>,
    pub overlay: Option<PathBuf>,
    pub font: Option<PathBuf>,
    pub last_only: bool,
}

pub async fn run(args: ReplayArgs, config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;
    println!("Replaying frames from: {}", args.frames.display());

    let sink: Arc<dyn StatusSink> = Arc::new(TracingSink);
    let registry = ModelRegistry::new();
    registry.initialize(&PreloadedModels, sink.as_ref()).await?;

    let source = DirectorySource::open(&args.frames)?.with_frame_rate(config.pacing.target_fps);
    let frame_count = source.len();
    let detector = ReplayDetector::open(&args.detections)?;
    let (compositor, _loader) =
        super::build_compositor(&config, args.overlay, args.font, sink.as_ref()).await;

    let settings = Arc::new(LoopSettings::from_config(&config));
    if args.debug {
        settings.set_debug(true);
    }
    if let Some(variant) = args.detector {
        settings.set_variant(variant);
    }

    println!("  Frames: {frame_count}");
    println!("  Detector: {}", settings.variant().label());
    println!("  Output: {}", args.output.display());

    let parts = LoopParts {
        source: Box::new(source),
        detector: Box::new(detector),
        compositor,
        presenter: Box::new(PngPresenter::new(args.output.clone(), args.last_only)),
        scheduler: Box::new(
            IntervalScheduler::new(config.pacing.target_fps).with_limit(frame_count as u64),
        ),
        detectors: config.detector.clone(),
    };
    let mut detection_loop =
        DetectionLoop::new(parts, registry.status(), sink).with_settings(settings);
    detection_loop.start()?;

    let finished = tokio::select! {
        stats = detection_loop.wait() => Some(stats?),
        _ = tokio::signal::ctrl_c() => None,
    };
    let stats = match finished {
        Some(stats) => stats,
        None => {
            println!("\nInterrupted, stopping");
            detection_loop.stop().await?
        }
    };

    println!("Replay complete:");
    println!("  Rendered: {}/{} frames", stats.rendered, frame_count);
    println!("  With face: {}", stats.faces);
    if stats.source_errors + stats.detector_errors + stats.render_errors > 0 {
        println!(
            "  Errors: {} unreadable, {} detector, {} render",
            stats.source_errors, stats.detector_errors, stats.render_errors
        );
    }
    println!("  Throughput: {:.1} fps", stats.fps);
    Ok(())
}
