use crate::config::Mode;
use crate::media::{list_media, MediaKind};
use crate::pipeline::detector::Detector;
use crate::pipeline::types::{Verdict, VerdictLabel};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    pub detector: Arc<Detector>,
    pub media_root: PathBuf,
    pub request_timeout: Duration,
}

#[derive(Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub model_loaded: bool,
    pub classifier: Option<String>,
    pub mode: Mode,
    pub threshold: f64,
    pub num_frames: usize,
}

#[derive(Serialize)]
pub struct MediaInfo {
    pub name: String,
    pub path: String,
    pub kind: MediaKind,
}

#[derive(Deserialize)]
pub struct ImageDetectionRequest {
    pub path: String,
}

#[derive(Deserialize)]
pub struct VideoDetectionRequest {
    pub path: String,
    pub num_frames: Option<usize>,
}

pub type DetectionResponse = (StatusCode, Json<Verdict>);

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthInfo> {
    let config = state.detector.config();
    Json(HealthInfo {
        status: "ok",
        model_loaded: state.detector.is_available(),
        classifier: state.detector.classifier_name().map(str::to_string),
        mode: config.mode,
        threshold: config.threshold,
        num_frames: config.num_frames,
    })
}

pub async fn get_media(State(state): State<Arc<AppState>>) -> Json<Vec<MediaInfo>> {
    let root = state.media_root.as_path();

    let info_list = list_media(root)
        .into_iter()
        .map(|(path, kind)| {
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string();
            let relative = path.strip_prefix(root).unwrap_or(&path);
            MediaInfo {
                name,
                path: relative.to_string_lossy().to_string(),
                kind,
            }
        })
        .collect();

    Json(info_list)
}

pub async fn detect_image_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ImageDetectionRequest>,
) -> DetectionResponse {
    run_detection(state, MediaKind::Image, &payload.path, None).await
}

pub async fn detect_video_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VideoDetectionRequest>,
) -> DetectionResponse {
    let config = state.detector.config();
    if let Some(n) = payload.num_frames {
        if n == 0 || n > config.max_frames {
            return (
                StatusCode::BAD_REQUEST,
                Json(Verdict::error(
                    MediaKind::Video,
                    config.mode,
                    format!("num_frames must lie in [1, {}], got {}", config.max_frames, n),
                )),
            );
        }
    }
    run_detection(state, MediaKind::Video, &payload.path, payload.num_frames).await
}

async fn run_detection(
    state: Arc<AppState>,
    media: MediaKind,
    requested: &str,
    num_frames: Option<usize>,
) -> DetectionResponse {
    let mode = state.detector.config().mode;

    if !state.detector.is_available() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Verdict::unknown(media, mode)),
        );
    }

    let path = match resolve_media_path(&state.media_root, requested) {
        Ok(path) => path,
        Err(msg) => {
            tracing::warn!("Rejected detection request for {}: {}", requested, msg);
            return (StatusCode::BAD_REQUEST, Json(Verdict::error(media, mode, msg)));
        }
    };

    let detector = state.detector.clone();
    let frames = num_frames.unwrap_or(detector.config().num_frames);
    let task = tokio::task::spawn_blocking(move || match media {
        MediaKind::Image => detector.detect_image(&path),
        MediaKind::Video => detector.detect_video(&path, frames),
    });

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(verdict)) => (status_for(&verdict), Json(verdict)),
        Ok(Err(e)) => {
            tracing::error!("Detection task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Verdict::error(media, mode, "detection task failed")),
            )
        }
        Err(_) => {
            tracing::warn!(
                "Detection of {} exceeded {:?}",
                requested,
                state.request_timeout
            );
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(Verdict::error(media, mode, "detection timed out")),
            )
        }
    }
}

fn status_for(verdict: &Verdict) -> StatusCode {
    match verdict.label {
        VerdictLabel::Real | VerdictLabel::Fake | VerdictLabel::Indeterminate => StatusCode::OK,
        VerdictLabel::Error => StatusCode::UNPROCESSABLE_ENTITY,
        VerdictLabel::Unknown => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Resolve a client-supplied path against `root`, refusing anything that
/// lands outside it once symlinks and `..` are resolved.
fn resolve_media_path(root: &Path, requested: &str) -> Result<PathBuf, String> {
    let requested = Path::new(requested);
    if requested.is_absolute() {
        return Err("path must be relative to the media root".to_string());
    }

    let root = root
        .canonicalize()
        .map_err(|e| format!("media root unavailable: {}", e))?;
    let path = root
        .join(requested)
        .canonicalize()
        .map_err(|_| format!("{} not found", requested.display()))?;

    if !path.starts_with(&root) {
        return Err(format!("{} is outside the media root", requested.display()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::inference::testing::ScriptedClassifier;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("deepfake_api_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn state(root: &Path, detector: Detector) -> Arc<AppState> {
        Arc::new(AppState {
            detector: Arc::new(detector),
            media_root: root.to_path_buf(),
            request_timeout: Duration::from_secs(30),
        })
    }

    fn scripted(probabilities: &[f32]) -> Detector {
        Detector::with_classifier(
            DetectorConfig {
                target_size: (16, 16),
                ..DetectorConfig::default()
            },
            Arc::new(ScriptedClassifier::new(probabilities)),
        )
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let root = scratch_dir("escape");
        std::fs::create_dir_all(root.join("inner")).unwrap();
        std::fs::write(root.join("inner/a.png"), b"x").unwrap();

        assert!(resolve_media_path(&root.join("inner"), "a.png").is_ok());
        assert!(resolve_media_path(&root.join("inner"), "../inner/a.png").is_ok());
        assert!(resolve_media_path(&root.join("inner"), "../../etc/passwd").is_err());
        assert!(resolve_media_path(&root.join("inner"), "/etc/passwd").is_err());
        assert!(resolve_media_path(&root.join("inner"), "missing.png").is_err());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_status_mapping() {
        let verdict = Verdict::error(MediaKind::Image, Mode::Production, "boom");
        assert_eq!(status_for(&verdict), StatusCode::UNPROCESSABLE_ENTITY);

        let verdict = Verdict::unknown(MediaKind::Video, Mode::Production);
        assert_eq!(status_for(&verdict), StatusCode::SERVICE_UNAVAILABLE);

        let verdict = Verdict::indeterminate(MediaKind::Video, Mode::Production, "empty");
        assert_eq!(status_for(&verdict), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_model_answers_unknown() {
        let root = scratch_dir("nomodel");
        let state = state(&root, Detector::new(DetectorConfig::default()));

        let (status, Json(verdict)) = detect_image_handler(
            State(state),
            Json(ImageDetectionRequest {
                path: "face.png".to_string(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(verdict.label, VerdictLabel::Unknown);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_detect_image_endpoint() {
        let root = scratch_dir("image");
        image::RgbImage::from_pixel(20, 20, image::Rgb([10, 20, 30]))
            .save(root.join("face.png"))
            .unwrap();
        let state = state(&root, scripted(&[0.9]));

        let (status, Json(verdict)) = detect_image_handler(
            State(state.clone()),
            Json(ImageDetectionRequest {
                path: "face.png".to_string(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(verdict.label, VerdictLabel::Fake);
        assert!((verdict.confidence - 90.0).abs() < 1e-3);

        let (status, Json(verdict)) = detect_image_handler(
            State(state),
            Json(ImageDetectionRequest {
                path: "../outside.png".to_string(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(verdict.label, VerdictLabel::Error);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_video_endpoint_rejects_zero_frames() {
        let root = scratch_dir("zeroframes");
        let state = state(&root, scripted(&[]));

        let (status, _) = detect_video_handler(
            State(state),
            Json(VideoDetectionRequest {
                path: "clip.mp4".to_string(),
                num_frames: Some(0),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_video_endpoint_rejects_oversized_frame_count() {
        let root = scratch_dir("bigframes");
        let state = state(&root, scripted(&[]));

        let (status, Json(verdict)) = detect_video_handler(
            State(state),
            Json(VideoDetectionRequest {
                path: "clip.mp4".to_string(),
                num_frames: Some(20_000),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(verdict.label, VerdictLabel::Error);
        assert!(verdict.error.unwrap().contains("[1, 300]"));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_media_listing_is_relative() {
        let root = scratch_dir("listing");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("sub/clip.mp4"), b"x").unwrap();
        std::fs::write(root.join("notes.txt"), b"x").unwrap();
        let state = state(&root, scripted(&[]));

        let Json(media) = get_media(State(state)).await;
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].name, "clip.mp4");
        assert_eq!(Path::new(&media[0].path), Path::new("sub/clip.mp4"));
        assert_eq!(media[0].kind, MediaKind::Video);

        let _ = std::fs::remove_dir_all(&root);
    }
}
