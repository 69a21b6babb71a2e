//! Orangeface Runtime
//!
//! Drives the per-frame pipeline. A [`DetectionLoop`] pulls the latest
//! frame from a [`VideoSource`], runs a [`FaceDetector`], composites the
//! result, and hands the rendered frame to a [`FramePresenter`]. Cycles
//! are paced by an injected [`TickScheduler`]:
//!
//! - **Interval:** fixed-rate ticks; ticks missed during a slow detector
//!   call are dropped, not queued
//! - **Manual:** ticks injected by the caller, for deterministic tests
//!
//! Detector and landmark models are tracked by a [`ModelRegistry`]; the
//! loop refuses to start until it reports ready.

pub mod config;
pub mod detection_loop;
pub mod detector;
pub mod models;
pub mod presenter;
pub mod scheduler;
pub mod sink;
pub mod source;

pub use config::AppConfig;
pub use detection_loop::{DetectionLoop, LoopParts, LoopSettings, LoopState, LoopStats};
pub use detector::{FaceDetector, ReplayDetector};
pub use models::{ModelKind, ModelLoader, ModelRegistry, ModelStatus, PreloadedModels};
pub use presenter::{FramePresenter, NullPresenter};
pub use scheduler::{manual_scheduler, IntervalScheduler, ManualScheduler, ManualTicker, TickScheduler};
pub use sink::TracingSink;
pub use source::{DirectorySource, SourceFrame, SourceInfo, VideoSource};
