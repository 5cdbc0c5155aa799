pub mod demo;
pub mod onnx;
pub mod preprocess;

use crate::config::{DetectorConfig, Mode};
use crate::error::{DetectError, Result};
use preprocess::PreprocessedTensor;
use std::sync::Arc;

/// Binary real/fake image model, treated as an opaque oracle.
pub trait FrameClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// P(fake) for one preprocessed image.
    fn predict(&self, tensor: &PreprocessedTensor) -> Result<f32>;
}

/// Build the classifier selected by `config.mode`.
pub fn load_classifier(config: &DetectorConfig) -> Result<Arc<dyn FrameClassifier>> {
    match config.mode {
        Mode::Demo => {
            tracing::warn!("Demo mode: predictions are random and carry no meaning");
            Ok(Arc::new(demo::DemoClassifier::new()))
        }
        Mode::Production => {
            let path = config.model_path.as_deref().ok_or_else(|| {
                DetectError::ModelUnavailable("no model path configured".to_string())
            })?;
            let classifier = onnx::OnnxClassifier::new(path, config.layout, config.intra_threads)?;
            Ok(Arc::new(classifier))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns the queued probabilities in order, then fails.
    pub(crate) struct ScriptedClassifier {
        queue: Mutex<VecDeque<f32>>,
    }

    impl ScriptedClassifier {
        pub(crate) fn new(probabilities: &[f32]) -> Self {
            Self {
                queue: Mutex::new(probabilities.iter().copied().collect()),
            }
        }
    }

    impl FrameClassifier for ScriptedClassifier {
        fn name(&self) -> &str {
            "scripted"
        }

        fn predict(&self, _tensor: &PreprocessedTensor) -> Result<f32> {
            self.queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| DetectError::Inference("script exhausted".to_string()))
        }
    }
}
