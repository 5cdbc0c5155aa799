use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::imgcodecs;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{DetectError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies a path by its extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Rejects paths that are missing, not regular files, or larger than `max_bytes`.
pub fn check_media_file(path: &Path, max_bytes: u64) -> Result<()> {
    let meta = std::fs::metadata(path).map_err(|e| DetectError::unreadable(path.display(), e))?;
    if !meta.is_file() {
        return Err(DetectError::MediaUnreadable(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    if meta.len() > max_bytes {
        return Err(DetectError::MediaUnreadable(format!(
            "{} is {} bytes, limit is {}",
            path.display(),
            meta.len(),
            max_bytes
        )));
    }
    Ok(())
}

/// Decode a still image into a BGR `Mat`.
///
/// OpenCV handles the common formats; anything it returns empty for (GIF,
/// some WebP builds) goes through the `image` crate instead.
pub fn load_image(path: &Path) -> Result<Mat> {
    let path_str = path
        .to_str()
        .ok_or_else(|| DetectError::MediaUnreadable(format!("non UTF-8 path: {:?}", path)))?;

    let mat = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)?;
    if !mat.empty() {
        return Ok(mat);
    }

    tracing::debug!("OpenCV could not decode {}, trying image crate", path.display());
    let decoded = image::open(path).map_err(|e| DetectError::unreadable(path.display(), e))?;
    rgb_image_to_mat(&decoded.to_rgb8())
}

/// Convert an RGB image buffer into a BGR `Mat` owning its data.
pub fn rgb_image_to_mat(rgb: &image::RgbImage) -> Result<Mat> {
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(DetectError::MediaUnreadable("image has no pixels".to_string()));
    }

    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, CV_8UC3, Scalar::all(0.0))?;
    let dst = mat.data_bytes_mut()?;
    for (dst_px, src_px) in dst.chunks_exact_mut(3).zip(rgb.pixels()) {
        dst_px[0] = src_px[2];
        dst_px[1] = src_px[1];
        dst_px[2] = src_px[0];
    }
    Ok(mat)
}

/// All supported media files below `root`, sorted for stable listings.
pub fn list_media(root: &Path) -> Vec<(PathBuf, MediaKind)> {
    let mut found: Vec<(PathBuf, MediaKind)> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| MediaKind::from_path(e.path()).map(|kind| (e.path().to_path_buf(), kind)))
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deepfake_media_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(MediaKind::from_path(Path::new("a/b.JPG")), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_path(Path::new("clip.mp4")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("clip.Mkv")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_check_media_file_limits() {
        let dir = scratch_dir("check");
        let file = dir.join("small.png");
        std::fs::write(&file, [0u8; 64]).unwrap();

        assert!(check_media_file(&file, 1024).is_ok());
        assert!(matches!(
            check_media_file(&file, 10),
            Err(DetectError::MediaUnreadable(_))
        ));
        assert!(matches!(
            check_media_file(&dir.join("missing.png"), 1024),
            Err(DetectError::MediaUnreadable(_))
        ));
        assert!(check_media_file(&dir, 1024).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rgb_image_to_mat_swaps_channels() {
        let rgb = image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]));
        let mat = rgb_image_to_mat(&rgb).unwrap();

        let size = mat.size().unwrap();
        assert_eq!((size.width, size.height), (4, 2));
        assert_eq!(mat.typ(), CV_8UC3);
        let bytes = mat.data_bytes().unwrap();
        assert_eq!(&bytes[0..3], &[30, 20, 10]);
    }

    #[test]
    fn test_load_image_falls_back_for_gif() {
        let dir = scratch_dir("gif");
        let path = dir.join("still.gif");
        let rgb = image::RgbImage::from_pixel(8, 6, image::Rgb([255, 0, 0]));
        image::DynamicImage::ImageRgb8(rgb).save(&path).unwrap();

        let mat = load_image(&path).unwrap();
        let size = mat.size().unwrap();
        assert_eq!((size.width, size.height), (8, 6));
        assert_eq!(mat.typ(), CV_8UC3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_image_rejects_garbage() {
        let dir = scratch_dir("garbage");
        let path = dir.join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(matches!(load_image(&path), Err(DetectError::MediaUnreadable(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_list_media_walks_subdirectories() {
        let dir = scratch_dir("list");
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("a.mp4"), b"").unwrap();
        std::fs::write(dir.join("nested/b.png"), b"").unwrap();
        std::fs::write(dir.join("nested/c.txt"), b"").unwrap();

        let found = list_media(&dir);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1, MediaKind::Video);
        assert_eq!(found[1].1, MediaKind::Image);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
