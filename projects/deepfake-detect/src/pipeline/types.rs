use chrono::{DateTime, Utc};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};

use crate::config::Mode;
use crate::media::MediaKind;

/// A decoded BGR frame and its position in the source video.
pub struct Frame {
    pub index: usize,
    pub mat: Mat,
}

/// Per-frame decision of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Real,
    Fake,
}

/// Label of a final verdict. `Indeterminate`, `Error` and `Unknown` are
/// sentinels and never come out of a single-frame classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictLabel {
    Real,
    Fake,
    /// Nothing usable was analyzed (e.g. every sampled frame failed to decode).
    Indeterminate,
    /// Media unreadable, model unavailable or inference failed.
    Error,
    /// Substituted by callers that found no model loaded before asking.
    Unknown,
}

impl From<Label> for VerdictLabel {
    fn from(label: Label) -> Self {
        match label {
            Label::Real => VerdictLabel::Real,
            Label::Fake => VerdictLabel::Fake,
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VerdictLabel::Real => "real",
            VerdictLabel::Fake => "fake",
            VerdictLabel::Indeterminate => "indeterminate",
            VerdictLabel::Error => "error",
            VerdictLabel::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Label,
    /// Probability mass behind `label`, in percent.
    pub confidence: f64,
    /// Raw model output, P(fake).
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateResult {
    pub label: VerdictLabel,
    pub confidence: f64,
    pub frames_analyzed: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
}

/// What `detect_image` / `detect_video` hand back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    /// `None` when the file extension matched no supported kind.
    pub media: Option<MediaKind>,
    pub label: VerdictLabel,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    pub frames_analyzed: usize,
    pub fake_frames: usize,
    pub real_frames: usize,
    pub mode: Mode,
    pub processing_ms: u64,
    pub analyzed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    fn base(media: MediaKind, mode: Mode, label: VerdictLabel) -> Self {
        Self {
            media: Some(media),
            label,
            confidence: 0.0,
            probability: None,
            frames_analyzed: 0,
            fake_frames: 0,
            real_frames: 0,
            mode,
            processing_ms: 0,
            analyzed_at: Utc::now(),
            error: None,
        }
    }

    pub fn from_prediction(mode: Mode, prediction: &PredictionResult) -> Self {
        let (fake_frames, real_frames) = match prediction.label {
            Label::Fake => (1, 0),
            Label::Real => (0, 1),
        };
        Self {
            confidence: prediction.confidence,
            probability: Some(prediction.probability),
            frames_analyzed: 1,
            fake_frames,
            real_frames,
            ..Self::base(MediaKind::Image, mode, prediction.label.into())
        }
    }

    pub fn from_aggregate(mode: Mode, aggregate: &AggregateResult) -> Self {
        Self {
            confidence: aggregate.confidence,
            frames_analyzed: aggregate.frames_analyzed,
            fake_frames: aggregate.fake_frames,
            real_frames: aggregate.real_frames,
            ..Self::base(MediaKind::Video, mode, aggregate.label)
        }
    }

    pub fn error(media: MediaKind, mode: Mode, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::base(media, mode, VerdictLabel::Error)
        }
    }

    pub fn indeterminate(media: MediaKind, mode: Mode, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::base(media, mode, VerdictLabel::Indeterminate)
        }
    }

    pub fn unsupported(mode: Mode, message: impl Into<String>) -> Self {
        Self {
            media: None,
            ..Self::error(MediaKind::Image, mode, message)
        }
    }

    pub fn unknown(media: MediaKind, mode: Mode) -> Self {
        Self {
            error: Some("no classifier loaded".to_string()),
            ..Self::base(media, mode, VerdictLabel::Unknown)
        }
    }

    pub fn with_processing_time(mut self, elapsed: std::time::Duration) -> Self {
        self.processing_ms = elapsed.as_millis() as u64;
        self
    }
}
