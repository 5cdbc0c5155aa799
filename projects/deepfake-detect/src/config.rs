use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::DetectorArgs;

/// How the detector obtains its per-frame probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the ONNX model at `model_path`. A missing model is an error.
    Production,
    /// Random plausible probabilities, for UI work without a trained model.
    Demo,
}

/// Memory layout the model expects for its image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// batch, height, width, channels (Keras exports)
    Nhwc,
    /// batch, channels, height, width (PyTorch exports)
    Nchw,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub mode: Mode,
    pub model_path: Option<PathBuf>,
    pub threshold: f64,
    pub num_frames: usize,
    /// Upper bound on frames sampled from one video, per request or default
    pub max_frames: usize,
    /// (width, height)
    pub target_size: (u32, u32),
    pub layout: TensorLayout,
    pub intra_threads: Option<usize>,
    pub video_budget: Duration,
    pub max_media_bytes: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Production,
            model_path: None,
            threshold: 0.5,
            num_frames: 10,
            max_frames: 300,
            target_size: (224, 224),
            layout: TensorLayout::Nhwc,
            intra_threads: None,
            video_budget: Duration::from_secs(120),
            max_media_bytes: 100 * 1024 * 1024,
        }
    }
}

impl DetectorConfig {
    pub fn from_args(args: &DetectorArgs) -> Result<Self> {
        let config = Self {
            mode: args.mode,
            model_path: args.model_path.clone(),
            threshold: args.threshold,
            num_frames: args.frames,
            max_frames: args.max_frames,
            target_size: (args.input_size, args.input_size),
            layout: args.layout,
            intra_threads: args.intra_threads,
            video_budget: Duration::from_secs(args.video_budget_secs),
            max_media_bytes: args.max_media_mb * 1024 * 1024,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!("threshold must lie in [0, 1], got {}", self.threshold);
        }
        if self.num_frames == 0 {
            bail!("frame count must be at least 1");
        }
        if self.num_frames > self.max_frames {
            bail!(
                "frame count {} exceeds the limit of {}",
                self.num_frames,
                self.max_frames
            );
        }
        if self.target_size.0 == 0 || self.target_size.1 == 0 {
            bail!("input size must be non-zero");
        }
        if self.mode == Mode::Production && self.model_path.is_none() {
            tracing::warn!("production mode without --model-path: detections will report errors");
        }
        Ok(())
    }
}
