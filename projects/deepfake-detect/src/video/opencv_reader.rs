use super::VideoReader;
use crate::error::{DetectError, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH, CAP_PROP_POS_FRAMES,
    },
};
use std::path::Path;

pub struct OpencvReader {
    capture: VideoCapture,
    source_fps: f64,
    total_frames: usize,
    width: u32,
    height: u32,
    /// Index of the frame the next `read_frame` will return.
    position: usize,
}

impl OpencvReader {
    pub fn new(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| DetectError::MediaUnreadable(format!("non UTF-8 path: {:?}", path)))?;

        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| DetectError::unreadable(path.display(), e))?;
        if !capture.is_opened()? {
            return Err(DetectError::MediaUnreadable(format!(
                "failed to open video file: {}",
                path.display()
            )));
        }

        let mut fps = capture.get(CAP_PROP_FPS)?;
        if fps <= 0.0 || !fps.is_finite() {
            tracing::warn!("OpencvReader: Failed to get FPS from metadata, falling back to 30.0");
            fps = 30.0;
        }
        let raw_count = capture.get(CAP_PROP_FRAME_COUNT)?;
        let total_frames = if raw_count.is_finite() && raw_count > 0.0 {
            raw_count as usize
        } else {
            0
        };
        let width = capture.get(CAP_PROP_FRAME_WIDTH)?.max(0.0) as u32;
        let height = capture.get(CAP_PROP_FRAME_HEIGHT)?.max(0.0) as u32;

        tracing::info!(
            "OpencvReader: opened {}, duration={:.2}s, fps={:.2}, stream_frames={}, size={}x{}",
            path.display(),
            total_frames as f64 / fps,
            fps,
            total_frames,
            width,
            height
        );

        Ok(Self {
            capture,
            source_fps: fps,
            total_frames,
            width,
            height,
            position: 0,
        })
    }
}

impl VideoReader for OpencvReader {
    fn frame_count(&self) -> Result<usize> {
        Ok(self.total_frames)
    }

    fn source_fps(&self) -> Result<f64> {
        Ok(self.source_fps)
    }

    fn frame_size(&self) -> Result<(u32, u32)> {
        Ok((self.width, self.height))
    }

    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()> {
        if frame_num == self.position {
            return Ok(());
        }
        if !self.capture.set(CAP_PROP_POS_FRAMES, frame_num as f64)? {
            return Err(DetectError::DecodeSkipped { index: frame_num });
        }
        self.position = frame_num;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Mat> {
        let index = self.position;
        let mut frame = Mat::default();
        let success = self
            .capture
            .read(&mut frame)
            .map_err(|_| DetectError::DecodeSkipped { index })?;
        self.position += 1;
        if !success || frame.empty() {
            return Err(DetectError::DecodeSkipped { index });
        }

        Ok(frame)
    }
}

/// Writes an MJPG AVI whose frame `i` is filled with gray level `i * 10`.
#[cfg(test)]
pub(crate) fn write_synthetic_video(path: &Path, frames: usize, width: i32, height: i32) {
    use opencv::core::{Scalar, Size, CV_8UC3};
    use opencv::videoio::VideoWriter;

    let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G').unwrap();
    let mut writer = VideoWriter::new(
        path.to_str().unwrap(),
        fourcc,
        25.0,
        Size::new(width, height),
        true,
    )
    .unwrap();
    assert!(writer.is_opened().unwrap());

    for i in 0..frames {
        let level = ((i * 10) % 256) as f64;
        let mat =
            Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(level)).unwrap();
        writer.write(&mat).unwrap();
    }
    writer.release().unwrap();
}
