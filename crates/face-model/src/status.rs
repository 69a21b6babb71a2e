//! Status events reported to observers.
//!
//! Status events are purely observational: nothing in the pipeline reads
//! them back to make decisions.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Lifecycle of the detector and landmark models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum ModelState {
    Unloaded,
    /// Loading; carries the name of the model currently being fetched.
    Loading(String),
    Ready,
    Failed(String),
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready)
    }
}

/// Lifecycle and readiness of the video source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CameraState {
    Started {
        label: String,
        width: u32,
        height: u32,
        frame_rate: Option<u32>,
    },
    /// No decoded frame available yet.
    NotReady { ready_state: u8 },
    Stopped,
}

/// Outcome of one detection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectionOutcome {
    NoFace,
    FaceDetected { count: usize, score: f64 },
    LandmarksMissing,
}

/// Overlay asset lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OverlayState {
    Loaded { width: u32, height: u32 },
    Unavailable { reason: String },
}

/// Category of a reported, non-fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Detector,
    AssetLoad,
    Precondition,
    /// A frame could not be read from the video source.
    Source,
    /// Composition of a frame failed.
    Render,
}

/// Everything the pipeline reports to a status sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    ModelState { state: ModelState },
    CameraState { state: CameraState },
    FrameResized { width: u32, height: u32 },
    DetectionOutcome { outcome: DetectionOutcome },
    Overlay { state: OverlayState },
    Error { kind: ErrorKind, message: String },
}

impl StatusEvent {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        StatusEvent::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn outcome(outcome: DetectionOutcome) -> Self {
        StatusEvent::DetectionOutcome { outcome }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusEvent::Error { .. })
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::ModelState { state } => match state {
                ModelState::Unloaded => write!(f, "models not loaded"),
                ModelState::Loading(name) => write!(f, "loading model {name}..."),
                ModelState::Ready => write!(f, "models loaded"),
                ModelState::Failed(reason) => write!(f, "model load failed: {reason}"),
            },
            StatusEvent::CameraState { state } => match state {
                CameraState::Started {
                    label,
                    width,
                    height,
                    frame_rate,
                } => match frame_rate {
                    Some(fps) => write!(f, "camera {label} started at {width}x{height} {fps}fps"),
                    None => write!(f, "camera {label} started at {width}x{height}"),
                },
                CameraState::NotReady { ready_state } => {
                    write!(f, "video not ready (state {ready_state})")
                }
                CameraState::Stopped => write!(f, "camera stopped"),
            },
            StatusEvent::FrameResized { width, height } => {
                write!(f, "canvas resized to {width}x{height}")
            }
            StatusEvent::DetectionOutcome { outcome } => match outcome {
                DetectionOutcome::NoFace => write!(f, "no face detected"),
                DetectionOutcome::FaceDetected { count, score } => {
                    write!(f, "face detected: {count} (confidence {score:.2})")
                }
                DetectionOutcome::LandmarksMissing => write!(f, "landmark detection failed"),
            },
            StatusEvent::Overlay { state } => match state {
                OverlayState::Loaded { width, height } => {
                    write!(f, "overlay image loaded ({width}x{height})")
                }
                OverlayState::Unavailable { reason } => {
                    write!(f, "overlay image unavailable: {reason}")
                }
            },
            StatusEvent::Error { kind, message } => write!(f, "{kind:?} error: {message}"),
        }
    }
}

/// Receiver for status events.
///
/// Implementations must not block: sinks are called from the frame loop.
pub trait StatusSink: Send + Sync {
    fn on_status(&self, event: &StatusEvent);
}

impl<F> StatusSink for F
where
    F: Fn(&StatusEvent) + Send + Sync,
{
    fn on_status(&self, event: &StatusEvent) {
        self(event)
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn on_status(&self, _event: &StatusEvent) {}
}

/// Sink that keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct StatusLog {
    events: Mutex<Vec<StatusEvent>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events received so far.
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Remove and return all events received so far.
    pub fn drain(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }

    pub fn contains(&self, predicate: impl Fn(&StatusEvent) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl StatusSink for StatusLog {
    fn on_status(&self, event: &StatusEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
