use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectError>;

/// Failure conditions of the detection core.
///
/// None of these are fatal to the host process: `Detector::detect_image` and
/// `Detector::detect_video` turn every variant into a sentinel verdict.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("media unreadable: {0}")]
    MediaUnreadable(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("frame {index} could not be decoded")]
    DecodeSkipped { index: usize },

    #[error("no frames could be analyzed")]
    DegenerateAggregate,

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DetectError {
    pub fn unreadable(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::MediaUnreadable(format!("{}: {}", context, err))
    }
}

impl From<opencv::Error> for DetectError {
    fn from(err: opencv::Error) -> Self {
        Self::MediaUnreadable(err.to_string())
    }
}

impl From<ort::Error> for DetectError {
    fn from(err: ort::Error) -> Self {
        Self::Inference(err.to_string())
    }
}
