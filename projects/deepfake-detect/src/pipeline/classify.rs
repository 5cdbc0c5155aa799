use crate::error::{DetectError, Result};
use crate::inference::preprocess::PreprocessedTensor;
use crate::inference::FrameClassifier;
use crate::pipeline::types::{Label, PredictionResult};

/// Turn P(fake) into a label and the confidence behind that label.
///
/// `probability > threshold` is fake with `probability * 100`, anything else
/// is real with `(1 - probability) * 100`.
pub fn decide(probability: f64, threshold: f64) -> PredictionResult {
    if probability > threshold {
        PredictionResult {
            label: Label::Fake,
            confidence: probability * 100.0,
            probability,
        }
    } else {
        PredictionResult {
            label: Label::Real,
            confidence: (1.0 - probability) * 100.0,
            probability,
        }
    }
}

/// Run the model on one tensor and apply the decision rule.
pub fn classify(
    model: &dyn FrameClassifier,
    tensor: &PreprocessedTensor,
    threshold: f64,
) -> Result<PredictionResult> {
    let probability = model.predict(tensor)? as f64;
    if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
        return Err(DetectError::Inference(format!(
            "{} returned {}, expected a probability in [0, 1]",
            model.name(),
            probability
        )));
    }
    Ok(decide(probability, threshold))
}
