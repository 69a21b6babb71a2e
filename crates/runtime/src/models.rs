//! Detector and landmark model lifecycle.

use std::fmt;

use orangeface_common::error::{OrangefaceError, OrangefaceResult};
use orangeface_face_model::{ModelState, StatusEvent, StatusSink};
use tokio::sync::watch;

/// The models a detection loop needs, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    FastDetector,
    AccurateDetector,
    Landmarks68,
}

impl ModelKind {
    pub const LOAD_ORDER: [ModelKind; 3] = [
        ModelKind::FastDetector,
        ModelKind::AccurateDetector,
        ModelKind::Landmarks68,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::FastDetector => "tiny_face_detector",
            ModelKind::AccurateDetector => "ssd_mobilenet_v1",
            ModelKind::Landmarks68 => "face_landmark_68",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fetches and prepares model weights.
#[async_trait::async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model: ModelKind) -> OrangefaceResult<()>;
}

/// Loader for detectors that carry no weights, such as replayed logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreloadedModels;

#[async_trait::async_trait]
impl ModelLoader for PreloadedModels {
    async fn load(&self, model: ModelKind) -> OrangefaceResult<()> {
        tracing::debug!(%model, "Model preloaded");
        Ok(())
    }
}

/// Owns the model state and publishes every transition.
#[derive(Debug)]
pub struct ModelRegistry {
    tx: watch::Sender<ModelState>,
}

/// Read-only view of a [`ModelRegistry`], handed to consumers.
#[derive(Debug, Clone)]
pub struct ModelStatus {
    rx: watch::Receiver<ModelState>,
}

impl ModelStatus {
    pub fn state(&self) -> ModelState {
        self.rx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().is_ready()
    }

    /// Wait until the state changes.
    pub async fn changed(&mut self) -> OrangefaceResult<ModelState> {
        self.rx
            .changed()
            .await
            .map_err(|_| OrangefaceError::model("model registry dropped"))?;
        Ok(self.state())
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ModelState::Unloaded);
        Self { tx }
    }

    pub fn state(&self) -> ModelState {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            rx: self.tx.subscribe(),
        }
    }

    /// Load every model in [`ModelKind::LOAD_ORDER`].
    ///
    /// Stops at the first failure and leaves the registry in `Failed`; a
    /// later call retries from the start. Calling again once ready is a
    /// no-op.
    pub async fn initialize(
        &self,
        loader: &dyn ModelLoader,
        sink: &dyn StatusSink,
    ) -> OrangefaceResult<()> {
        match self.state() {
            ModelState::Ready => return Ok(()),
            ModelState::Loading(model) => {
                return Err(OrangefaceError::invalid_state(format!(
                    "model {model} is already loading"
                )))
            }
            ModelState::Unloaded | ModelState::Failed(_) => {}
        }

        tracing::info!("Loading models");
        for model in ModelKind::LOAD_ORDER {
            self.transition(ModelState::Loading(model.name().to_string()), sink);
            if let Err(e) = loader.load(model).await {
                let reason = format!("{model}: {e}");
                tracing::warn!(%reason, "Model load failed");
                self.transition(ModelState::Failed(reason.clone()), sink);
                return Err(OrangefaceError::model(reason));
            }
        }
        self.transition(ModelState::Ready, sink);
        tracing::info!("Models ready");
        Ok(())
    }

    fn transition(&self, state: ModelState, sink: &dyn StatusSink) {
        sink.on_status(&StatusEvent::ModelState {
            state: state.clone(),
        });
        self.tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orangeface_face_model::StatusLog;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLoader {
        loaded: Mutex<Vec<ModelKind>>,
        fail_on: Option<ModelKind>,
    }

    #[async_trait::async_trait]
    impl ModelLoader for RecordingLoader {
        async fn load(&self, model: ModelKind) -> OrangefaceResult<()> {
            if self.fail_on == Some(model) {
                return Err(OrangefaceError::model("weights missing"));
            }
            self.loaded.lock().unwrap().push(model);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_loads_in_order_and_reports() {
        let registry = ModelRegistry::new();
        let status = registry.status();
        let loader = RecordingLoader::default();
        let log = StatusLog::new();

        assert!(!status.is_ready());
        registry.initialize(&loader, &log).await.unwrap();

        assert!(status.is_ready());
        assert_eq!(*loader.loaded.lock().unwrap(), ModelKind::LOAD_ORDER.to_vec());
        let states: Vec<ModelState> = log
            .events()
            .into_iter()
            .filter_map(|e| match e {
                StatusEvent::ModelState { state } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                ModelState::Loading("tiny_face_detector".into()),
                ModelState::Loading("ssd_mobilenet_v1".into()),
                ModelState::Loading("face_landmark_68".into()),
                ModelState::Ready,
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_leaves_registry_failed() {
        let registry = ModelRegistry::new();
        let loader = RecordingLoader {
            fail_on: Some(ModelKind::AccurateDetector),
            ..Default::default()
        };

        let err = registry.initialize(&loader, &StatusLog::new()).await;
        assert!(err.is_err());
        assert!(matches!(registry.state(), ModelState::Failed(_)));
        assert_eq!(*loader.loaded.lock().unwrap(), vec![ModelKind::FastDetector]);

        registry
            .initialize(&PreloadedModels, &StatusLog::new())
            .await
            .unwrap();
        assert!(registry.state().is_ready());
    }
}
