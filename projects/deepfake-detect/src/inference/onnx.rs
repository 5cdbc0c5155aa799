use super::preprocess::PreprocessedTensor;
use super::FrameClassifier;
use crate::config::TensorLayout;
use crate::error::{DetectError, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// A wrapper around an ONNX Runtime session for a single-output binary
/// classifier exported from the training notebook.
///
/// The session needs exclusive access per run, so it lives behind a mutex;
/// the wrapper itself is built once at startup and shared.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    layout: TensorLayout,
    name: String,
}

impl OnnxClassifier {
    /// Load the model at `model_path`.
    pub fn new(
        model_path: &Path,
        layout: TensorLayout,
        intra_threads: Option<usize>,
    ) -> Result<Self> {
        if !model_path.exists() {
            return Err(DetectError::ModelUnavailable(format!(
                "model not found at {}",
                model_path.display()
            )));
        }

        let mut builder = Session::builder()
            .map_err(|e| unavailable(model_path, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| unavailable(model_path, e))?;
        if let Some(threads) = intra_threads {
            builder = builder
                .with_intra_threads(threads)
                .map_err(|e| unavailable(model_path, e))?;
        }
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| unavailable(model_path, e))?;

        tracing::info!(
            "Loaded ONNX classifier from {} (layout {:?})",
            model_path.display(),
            layout
        );

        let name = model_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("onnx")
            .to_string();

        Ok(Self {
            session: Mutex::new(session),
            layout,
            name,
        })
    }
}

impl FrameClassifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, tensor: &PreprocessedTensor) -> Result<f32> {
        let input = tensor.to_layout(self.layout);

        let mut session = self
            .session
            .lock()
            .map_err(|_| DetectError::Inference("session mutex poisoned".to_string()))?;

        let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_shape, data) = outputs[0].try_extract_tensor::<f32>()?;

        output_probability(data)
    }
}

fn unavailable(model_path: &Path, err: impl std::fmt::Display) -> DetectError {
    DetectError::ModelUnavailable(format!("{}: {}", model_path.display(), err))
}

/// A sigmoid head yields `[p]`; a two-way softmax yields `[p_real, p_fake]`.
fn output_probability(data: &[f32]) -> Result<f32> {
    match data {
        [p] => Ok(*p),
        [_, p_fake] => Ok(*p_fake),
        _ => Err(DetectError::Inference(format!(
            "expected 1 or 2 output values, got {}",
            data.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_probability_shapes() {
        assert_eq!(output_probability(&[0.8]).unwrap(), 0.8);
        assert_eq!(output_probability(&[0.3, 0.7]).unwrap(), 0.7);
        assert!(output_probability(&[]).is_err());
        assert!(output_probability(&[0.1, 0.2, 0.7]).is_err());
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let result = OnnxClassifier::new(
            Path::new("/nonexistent/cnn_model.onnx"),
            TensorLayout::Nhwc,
            None,
        );
        assert!(matches!(result, Err(DetectError::ModelUnavailable(_))));
    }
}
