use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::inference::preprocess::preprocess;
use crate::inference::{load_classifier, FrameClassifier};
use crate::media::{self, MediaKind};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::classify::classify;
use crate::pipeline::types::{AggregateResult, Frame, PredictionResult, Verdict};
use crate::video::opencv_reader::OpencvReader;
use crate::video::{sampler, VideoReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Owns the classifier for the lifetime of the process and turns media paths
/// into verdicts. Shared read-only between requests.
pub struct Detector {
    config: DetectorConfig,
    classifier: Option<Arc<dyn FrameClassifier>>,
    unavailable_reason: Option<String>,
}

impl Detector {
    /// Load the classifier named by `config`. A failed load is logged and
    /// leaves the detector without a model; detections then report errors.
    pub fn new(config: DetectorConfig) -> Self {
        match load_classifier(&config) {
            Ok(classifier) => Self::with_classifier(config, classifier),
            Err(e) => {
                tracing::warn!("Classifier not loaded: {}", e);
                Self {
                    config,
                    classifier: None,
                    unavailable_reason: Some(e.to_string()),
                }
            }
        }
    }

    pub fn with_classifier(config: DetectorConfig, classifier: Arc<dyn FrameClassifier>) -> Self {
        tracing::info!(
            "Detector ready: classifier={}, mode={:?}, threshold={}, frames={}",
            classifier.name(),
            config.mode,
            config.threshold,
            config.num_frames
        );
        Self {
            config,
            classifier: Some(classifier),
            unavailable_reason: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_available(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier_name(&self) -> Option<&str> {
        self.classifier.as_ref().map(|c| c.name())
    }

    fn classifier(&self) -> Result<&dyn FrameClassifier> {
        self.classifier.as_deref().ok_or_else(|| {
            DetectError::ModelUnavailable(
                self.unavailable_reason
                    .clone()
                    .unwrap_or_else(|| "no classifier loaded".to_string()),
            )
        })
    }

    /// Classify a still image.
    pub fn try_detect_image(&self, path: &Path) -> Result<PredictionResult> {
        let classifier = self.classifier()?;
        media::check_media_file(path, self.config.max_media_bytes)?;

        let frame = Frame {
            index: 0,
            mat: media::load_image(path)?,
        };
        let tensor = preprocess(&frame, self.config.target_size)?;
        classify(classifier, &tensor, self.config.threshold)
    }

    /// Sample `num_frames` frames from a video file and vote.
    pub fn try_detect_video(&self, path: &Path, num_frames: usize) -> Result<AggregateResult> {
        self.classifier()?;
        media::check_media_file(path, self.config.max_media_bytes)?;

        let mut reader = OpencvReader::new(path)?;
        self.try_classify_video(&mut reader, num_frames)
    }

    /// Sampling, per-frame inference and aggregation over any reader.
    /// Both stages share one wall-clock budget.
    pub fn try_classify_video(
        &self,
        reader: &mut dyn VideoReader,
        num_frames: usize,
    ) -> Result<AggregateResult> {
        let classifier = self.classifier()?;
        let deadline = Instant::now() + self.config.video_budget;

        // every sampled frame is held decoded until inference starts
        let num_frames = if num_frames > self.config.max_frames {
            tracing::warn!(
                "Requested {} frames, limiting to {}",
                num_frames,
                self.config.max_frames
            );
            self.config.max_frames
        } else {
            num_frames
        };

        let frames = sampler::sample(reader, num_frames, Some(deadline))?;

        let mut predictions = Vec::with_capacity(frames.len());
        for frame in &frames {
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Video budget exhausted after classifying {} of {} frames",
                    predictions.len(),
                    frames.len()
                );
                break;
            }
            let tensor = preprocess(frame, self.config.target_size)?;
            let prediction = classify(classifier, &tensor, self.config.threshold)?;
            tracing::debug!(
                "frame {}: {:?} ({:.2}%)",
                frame.index,
                prediction.label,
                prediction.confidence
            );
            predictions.push(prediction);
        }

        if predictions.is_empty() {
            return Err(DetectError::DegenerateAggregate);
        }

        Ok(aggregate(&predictions))
    }

    /// Boundary for still images: never fails, errors become sentinel verdicts.
    pub fn detect_image(&self, path: &Path) -> Verdict {
        let start = Instant::now();
        let verdict = match self.try_detect_image(path) {
            Ok(prediction) => Verdict::from_prediction(self.config.mode, &prediction),
            Err(e) => self.failure_verdict(MediaKind::Image, path, e),
        };
        verdict.with_processing_time(start.elapsed())
    }

    /// Boundary for videos: never fails, errors become sentinel verdicts.
    pub fn detect_video(&self, path: &Path, num_frames: usize) -> Verdict {
        let start = Instant::now();
        let verdict = match self.try_detect_video(path, num_frames) {
            Ok(result) => Verdict::from_aggregate(self.config.mode, &result),
            Err(e) => self.failure_verdict(MediaKind::Video, path, e),
        };
        verdict.with_processing_time(start.elapsed())
    }

    /// Dispatch on the file extension, using the configured frame count for videos.
    pub fn detect(&self, path: &Path) -> Verdict {
        match MediaKind::from_path(path) {
            Some(MediaKind::Image) => self.detect_image(path),
            Some(MediaKind::Video) => self.detect_video(path, self.config.num_frames),
            None => {
                tracing::warn!("Unsupported media type: {}", path.display());
                Verdict::unsupported(
                    self.config.mode,
                    format!("unsupported media type: {}", path.display()),
                )
            }
        }
    }

    fn failure_verdict(&self, media: MediaKind, path: &Path, err: DetectError) -> Verdict {
        match err {
            DetectError::DegenerateAggregate => {
                tracing::warn!("{}: no frames analyzed", path.display());
                Verdict::indeterminate(media, self.config.mode, err.to_string())
            }
            _ => {
                tracing::warn!("{} detection failed for {}: {}", media, path.display(), err);
                Verdict::error(media, self.config.mode, err.to_string())
            }
        }
    }
}
