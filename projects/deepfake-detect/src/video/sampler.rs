use super::VideoReader;
use crate::error::{DetectError, Result};
use crate::pipeline::types::Frame;
use std::time::Instant;

/// Frame indices to sample from a video of `total_frames` frames.
///
/// Short videos yield every index. Otherwise indices are spread linearly over
/// `[0, total_frames - 1]` with half-up rounding, so the first and last frames
/// are always included.
pub fn sample_indices(total_frames: usize, frame_count: usize) -> Vec<usize> {
    if frame_count == 0 || total_frames == 0 {
        return Vec::new();
    }
    if total_frames < frame_count {
        return (0..total_frames).collect();
    }
    if frame_count == 1 {
        return vec![0];
    }

    // u128 so a bogus container frame count cannot overflow
    let span = (total_frames - 1) as u128;
    let steps = (frame_count - 1) as u128;
    // round(i * span / steps) == floor((2 * i * span + steps) / (2 * steps))
    (0..frame_count)
        .map(|i| ((2 * i as u128 * span + steps) / (2 * steps)) as usize)
        .collect()
}

/// Decode `frame_count` evenly spaced frames.
///
/// Frames that fail to decode are dropped, so the result may be shorter than
/// requested. Decoding stops early once `deadline` has passed.
pub fn sample(
    reader: &mut dyn VideoReader,
    frame_count: usize,
    deadline: Option<Instant>,
) -> Result<Vec<Frame>> {
    if frame_count == 0 {
        return Err(DetectError::InvalidArgument(
            "frame count must be at least 1".to_string(),
        ));
    }

    let total_frames = reader.frame_count()?;
    if total_frames == 0 {
        return Err(DetectError::MediaUnreadable(
            "video reports zero frames".to_string(),
        ));
    }

    let indices = sample_indices(total_frames, frame_count);
    let mut frames = Vec::with_capacity(indices.len());

    for index in indices {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!(
                "Sampling budget exhausted after {} of {} frames",
                frames.len(),
                frame_count.min(total_frames)
            );
            break;
        }

        match read_at(reader, index) {
            Ok(mat) => frames.push(Frame { index, mat }),
            Err(e @ DetectError::DecodeSkipped { .. }) => {
                tracing::debug!("Skipping frame: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    tracing::debug!(
        "Sampled {} frames (requested {}, total {})",
        frames.len(),
        frame_count,
        total_frames
    );

    Ok(frames)
}

fn read_at(reader: &mut dyn VideoReader, index: usize) -> Result<opencv::core::Mat> {
    reader
        .seek_to_frame(index)
        .map_err(|_| DetectError::DecodeSkipped { index })?;
    reader
        .read_frame()
        .map_err(|_| DetectError::DecodeSkipped { index })
}
