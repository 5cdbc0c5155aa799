use super::preprocess::PreprocessedTensor;
use super::FrameClassifier;
use crate::error::{DetectError, Result};
use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Ignores its input and returns a coin-flip label with 70-95% confidence.
pub struct DemoClassifier {
    rng: Mutex<StdRng>,
}

impl DemoClassifier {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for DemoClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClassifier for DemoClassifier {
    fn name(&self) -> &str {
        "demo"
    }

    fn predict(&self, _tensor: &PreprocessedTensor) -> Result<f32> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| DetectError::Inference("demo rng mutex poisoned".to_string()))?;

        let confidence_dist =
            Uniform::new(0.70f32, 0.95f32).map_err(|e| DetectError::Inference(e.to_string()))?;
        let confidence = confidence_dist.sample(&mut *rng);

        if rng.random_bool(0.5) {
            Ok(confidence)
        } else {
            Ok(1.0 - confidence)
        }
    }
}
