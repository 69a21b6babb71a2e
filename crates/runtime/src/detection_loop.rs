//! The per-frame detection loop.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use orangeface_common::clock::FpsMeter;
use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_compositor::{FrameCompositor, FrameRequest};
use orangeface_face_model::{
    primary_detection, CameraState, Detection, DetectorSettings, DetectorVariant, ErrorKind,
    StatusEvent, StatusSink,
};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::detector::FaceDetector;
use crate::models::ModelStatus;
use crate::presenter::FramePresenter;
use crate::scheduler::TickScheduler;
use crate::source::VideoSource;

/// Flags read by the loop at the start of every cycle.
///
/// Writes are last-write-wins and take effect on the next cycle.
#[derive(Debug)]
pub struct LoopSettings {
    debug: AtomicBool,
    variant: AtomicU8,
}

impl LoopSettings {
    pub fn new(variant: DetectorVariant, debug: bool) -> Self {
        Self {
            debug: AtomicBool::new(debug),
            variant: AtomicU8::new(variant.as_u8()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.detector.default_variant, config.compositor.debug)
    }

    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Flip debug mode and return the new value.
    pub fn toggle_debug(&self) -> bool {
        !self.debug.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn variant(&self) -> DetectorVariant {
        DetectorVariant::from_u8(self.variant.load(Ordering::Relaxed))
    }

    pub fn set_variant(&self, variant: DetectorVariant) {
        self.variant.store(variant.as_u8(), Ordering::Relaxed);
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::new(DetectorVariant::default(), false)
    }
}

/// Lifecycle of a [`DetectionLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Counters for one run of the loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopStats {
    /// Ticks handled, including skipped cycles.
    pub cycles: u64,
    pub rendered: u64,
    /// Rendered frames with a face above threshold.
    pub faces: u64,
    /// Cycles skipped because the source had no frame.
    pub not_ready: u64,
    /// Cycles whose frame could not be decoded.
    pub source_errors: u64,
    /// Failed detector calls. Those frames are still rendered, without a face.
    pub detector_errors: u64,
    pub render_errors: u64,
    /// Rendered frames per second over the last two seconds of the run.
    pub fps: f64,
}

/// Everything the loop owns while running.
///
/// Handed back to the [`DetectionLoop`] when a run ends so the loop can be
/// restarted.
pub struct LoopParts {
    pub source: Box<dyn VideoSource>,
    pub detector: Box<dyn FaceDetector>,
    pub compositor: FrameCompositor,
    pub presenter: Box<dyn FramePresenter>,
    pub scheduler: Box<dyn TickScheduler>,
    pub detectors: DetectorSettings,
}

/// Drives detection and compositing, one cycle per scheduler tick.
///
/// All cycles run on a single spawned task, so a cycle always finishes
/// (or is cancelled) before the next tick is awaited. Dropping the loop
/// aborts the task.
pub struct DetectionLoop {
    state: LoopState,
    parts: Option<LoopParts>,
    settings: Arc<LoopSettings>,
    models: ModelStatus,
    sink: Arc<dyn StatusSink>,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<(LoopParts, LoopStats)>>,
}

impl DetectionLoop {
    pub fn new(parts: LoopParts, models: ModelStatus, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            state: LoopState::Idle,
            parts: Some(parts),
            settings: Arc::new(LoopSettings::default()),
            models,
            sink,
            stop_tx: None,
            task: None,
        }
    }

    pub fn with_settings(mut self, settings: Arc<LoopSettings>) -> Self {
        self.settings = settings;
        self
    }

    /// Shared handle for switching variant or debug mode while running.
    pub fn settings(&self) -> Arc<LoopSettings> {
        Arc::clone(&self.settings)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Start cycling. Must be called inside a tokio runtime.
    ///
    /// Refuses to start while the models are not ready.
    pub fn start(&mut self) -> OrangefaceResult<()> {
        if self.state == LoopState::Running {
            return Err(OrangefaceError::invalid_state("Detection loop already running"));
        }
        if !self.models.is_ready() {
            let state = self.models.state();
            self.sink.on_status(&StatusEvent::ModelState {
                state: state.clone(),
            });
            return Err(OrangefaceError::invalid_state(format!(
                "Models not ready: {state:?}"
            )));
        }
        let parts = self.parts.take().ok_or_else(|| {
            OrangefaceError::invalid_state("Loop components were lost by a failed run")
        })?;

        let info = parts.source.info();
        tracing::info!(
            source = %info.label,
            width = info.width,
            height = info.height,
            variant = %self.settings.variant(),
            "Starting detection loop"
        );
        self.sink.on_status(&StatusEvent::CameraState {
            state: CameraState::Started {
                label: info.label,
                width: info.width,
                height: info.height,
                frame_rate: info.frame_rate,
            },
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let runner = Runner {
            parts,
            settings: Arc::clone(&self.settings),
            sink: Arc::clone(&self.sink),
            stop: stop_rx,
            stats: LoopStats::default(),
            fps: FpsMeter::default(),
        };
        self.task = Some(tokio::spawn(runner.run()));
        self.stop_tx = Some(stop_tx);
        self.state = LoopState::Running;
        Ok(())
    }

    /// Cancel the current or next cycle and return to `Idle`.
    ///
    /// An in-flight detector call is dropped; its result is never used.
    pub async fn stop(&mut self) -> OrangefaceResult<LoopStats> {
        if self.state != LoopState::Running {
            return Err(OrangefaceError::invalid_state("Detection loop not running"));
        }
        tracing::info!("Stopping detection loop");
        if let Some(tx) = &self.stop_tx {
            tx.send_replace(true);
        }
        self.join().await
    }

    /// Wait for the loop to end on its own, when its scheduler runs out of
    /// ticks.
    pub async fn wait(&mut self) -> OrangefaceResult<LoopStats> {
        if self.state != LoopState::Running {
            return Err(OrangefaceError::invalid_state("Detection loop not running"));
        }
        self.join().await
    }

    /// Cancel-safe: if this future is dropped, the loop stays `Running`
    /// and can still be stopped.
    async fn join(&mut self) -> OrangefaceResult<LoopStats> {
        let outcome = match self.task.as_mut() {
            Some(task) => task.await,
            None => return Err(OrangefaceError::invalid_state("Detection loop task missing")),
        };
        self.task = None;
        self.state = LoopState::Idle;
        self.stop_tx = None;
        self.sink.on_status(&StatusEvent::CameraState {
            state: CameraState::Stopped,
        });

        match outcome {
            Ok((parts, stats)) => {
                self.parts = Some(parts);
                tracing::info!(
                    cycles = stats.cycles,
                    rendered = stats.rendered,
                    fps = stats.fps,
                    "Detection loop stopped"
                );
                Ok(stats)
            }
            Err(e) => Err(OrangefaceError::invalid_state(format!(
                "Detection loop task failed: {e}"
            ))),
        }
    }
}

impl Drop for DetectionLoop {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            tx.send_replace(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// State owned by the loop task.
struct Runner {
    parts: LoopParts,
    settings: Arc<LoopSettings>,
    sink: Arc<dyn StatusSink>,
    stop: watch::Receiver<bool>,
    stats: LoopStats,
    fps: FpsMeter,
}

impl Runner {
    fn active(&self) -> bool {
        !*self.stop.borrow()
    }

    async fn run(mut self) -> (LoopParts, LoopStats) {
        tracing::debug!("Detection loop task started");
        loop {
            let ticked = tokio::select! {
                biased;
                _ = self.stop.changed() => false,
                ticked = self.parts.scheduler.next_tick() => ticked,
            };
            if !ticked || !self.active() {
                break;
            }
            if !self.cycle().await {
                break;
            }
        }

        if let Err(e) = self.parts.presenter.finish() {
            tracing::warn!(error = %e, "Presenter failed to finish");
        }
        self.stats.fps = self.fps.fps();
        (self.parts, self.stats)
    }

    /// Run one cycle. Returns `false` if a stop arrived mid-cycle.
    async fn cycle(&mut self) -> bool {
        self.stats.cycles += 1;

        let read = tokio::select! {
            biased;
            _ = self.stop.changed() => return false,
            read = self.parts.source.current_frame() => read,
        };
        let frame = match read {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.stats.not_ready += 1;
                let ready_state = self.parts.source.ready_state();
                self.sink.on_status(&StatusEvent::CameraState {
                    state: CameraState::NotReady { ready_state },
                });
                return true;
            }
            Err(e) => {
                self.stats.source_errors += 1;
                report_failure(self.sink.as_ref(), ErrorKind::Source, &e);
                return true;
            }
        };

        let variant = self.settings.variant();
        let debug = self.settings.debug();
        let config = self.parts.detectors.config_for(variant);

        let detected = tokio::select! {
            biased;
            _ = self.stop.changed() => return false,
            result = self.parts.detector.detect_all(&frame, &config) => result,
        };
        if !self.active() {
            return false;
        }

        // A failed call renders as "no face" so stale masks never linger.
        let detections: Vec<Detection> = match detected {
            Ok(detections) => {
                tracing::debug!(
                    found = detections.len(),
                    %variant,
                    frame = frame.index,
                    "Detection finished"
                );
                detections
            }
            Err(e) => {
                self.stats.detector_errors += 1;
                report_failure(self.sink.as_ref(), ErrorKind::Detector, &e);
                Vec::new()
            }
        };

        let threshold = config.score_threshold();
        let mut request = FrameRequest::new(&frame.frame)
            .with_threshold(threshold)
            .with_debug(debug)
            .with_variant(variant);
        let primary = primary_detection(&detections, threshold);
        if let Some(primary) = primary {
            request = request.with_detection(primary, detections.len());
        }

        let summary = match self.parts.compositor.compose(&request, self.sink.as_ref()) {
            Ok(summary) => summary,
            Err(e) => {
                self.stats.render_errors += 1;
                report_failure(self.sink.as_ref(), ErrorKind::Render, &e);
                return true;
            }
        };
        if primary.is_some() {
            self.stats.faces += 1;
        }

        if let Some(target) = self.parts.compositor.target() {
            if let Err(e) = self
                .parts
                .presenter
                .present(target, self.stats.rendered, &summary)
            {
                tracing::warn!(error = %e, "Presenter rejected frame");
            }
        }
        self.stats.rendered += 1;
        self.fps.record(tokio::time::Instant::now().into_std());
        true
    }
}

/// Log a non-fatal cycle failure and forward it to the status sink.
fn report_failure(sink: &dyn StatusSink, kind: ErrorKind, error: &OrangefaceError) {
    tracing::warn!(?kind, error = %error, "Cycle step failed");
    sink.on_status(&StatusEvent::error(kind, error.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use orangeface_face_model::StatusLog;

    #[test]
    fn test_failures_reach_the_sink() {
        let log = StatusLog::new();
        report_failure(
            &log,
            ErrorKind::Render,
            &OrangefaceError::render("target raster missing after resize"),
        );
        report_failure(&log, ErrorKind::Source, &OrangefaceError::source("frame 3"));

        let events = log.events();
        assert_eq!(
            events[0],
            StatusEvent::error(
                ErrorKind::Render,
                "Render error: target raster missing after resize"
            )
        );
        assert!(matches!(
            &events[1],
            StatusEvent::Error { kind: ErrorKind::Source, message } if message.contains("frame 3")
        ));
    }

    #[test]
    fn test_settings_last_write_wins() {
        let settings = LoopSettings::default();
        assert_eq!(settings.variant(), DetectorVariant::Accurate);
        assert!(!settings.debug());

        settings.set_variant(DetectorVariant::Fast);
        settings.set_variant(DetectorVariant::Accurate);
        settings.set_variant(DetectorVariant::Fast);
        assert_eq!(settings.variant(), DetectorVariant::Fast);

        assert!(settings.toggle_debug());
        assert!(!settings.toggle_debug());
        settings.set_debug(true);
        assert!(settings.debug());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = AppConfig::default();
        config.detector.default_variant = DetectorVariant::Fast;
        config.compositor.debug = true;
        let settings = LoopSettings::from_config(&config);
        assert_eq!(settings.variant(), DetectorVariant::Fast);
        assert!(settings.debug());
    }
}
