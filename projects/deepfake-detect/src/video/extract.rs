use super::{opencv_reader::OpencvReader, sampler};
use crate::error::{DetectError, Result};
use opencv::imgcodecs;
use std::path::{Path, PathBuf};

/// Save the frames the sampler would pick as `frame_<index>.jpg` in `output_dir`.
pub fn extract_frames(
    video_path: &Path,
    frame_count: usize,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| DetectError::InvalidArgument(format!("{}: {}", output_dir.display(), e)))?;

    let mut reader = OpencvReader::new(video_path)?;
    let frames = sampler::sample(&mut reader, frame_count, None)?;

    let params = opencv::core::Vector::<i32>::new();
    let mut frame_paths = Vec::with_capacity(frames.len());

    for frame in frames {
        let output_path = output_dir.join(format!("frame_{}.jpg", frame.index));
        let path_str = output_path.to_str().ok_or_else(|| {
            DetectError::InvalidArgument(format!("non UTF-8 path: {:?}", output_path))
        })?;

        if imgcodecs::imwrite(path_str, &frame.mat, &params)? {
            frame_paths.push(output_path);
        } else {
            tracing::warn!("Failed to write frame {} to {}", frame.index, path_str);
        }
    }

    Ok(frame_paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::opencv_reader::write_synthetic_video;

    #[test]
    fn test_extract_writes_sampled_frames() {
        let base = std::env::temp_dir().join(format!("deepfake_extract_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&base);
        std::fs::create_dir_all(&base).unwrap();
        let video = base.join("clip.avi");
        write_synthetic_video(&video, 20, 32, 24);

        let out = base.join("frames");
        let paths = extract_frames(&video, 5, &out).unwrap();

        assert_eq!(paths.len(), 5);
        assert!(paths[0].ends_with("frame_0.jpg"));
        assert!(paths[4].ends_with("frame_19.jpg"));
        assert!(paths.iter().all(|p| p.exists()));

        let _ = std::fs::remove_dir_all(&base);
    }
}
