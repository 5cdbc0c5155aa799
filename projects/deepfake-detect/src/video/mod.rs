pub mod extract;
pub mod opencv_reader;
pub mod sampler;

use crate::error::Result;
use opencv::core::Mat;
use serde::Serialize;

/// Random-access source of decoded BGR frames.
pub trait VideoReader: Send {
    fn frame_count(&self) -> Result<usize>;
    fn source_fps(&self) -> Result<f64>;
    fn frame_size(&self) -> Result<(u32, u32)>;
    fn seek_to_frame(&mut self, frame_num: usize) -> Result<()>;
    fn read_frame(&mut self) -> Result<Mat>;
}

/// Container-level facts about a video, as reported by the decoder.
#[derive(Debug, Clone, Serialize)]
pub struct VideoInfo {
    pub total_frames: usize,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

pub fn probe(reader: &dyn VideoReader) -> Result<VideoInfo> {
    let total_frames = reader.frame_count()?;
    let fps = reader.source_fps()?;
    let (width, height) = reader.frame_size()?;
    let duration_secs = if fps > 0.0 {
        total_frames as f64 / fps
    } else {
        0.0
    };

    Ok(VideoInfo {
        total_frames,
        fps,
        width,
        height,
        duration_secs,
    })
}
