use crate::pipeline::detector::Detector;
use crate::web::api::{
    detect_image_handler, detect_video_handler, get_health, get_media, AppState,
};
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(get_health))
        .route("/api/media", get(get_media))
        .route("/api/detection/image", post(detect_image_handler))
        .route("/api/detection/video", post(detect_video_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(
    host: IpAddr,
    port: u16,
    detector: Arc<Detector>,
    media_root: PathBuf,
    request_timeout: Duration,
) -> Result<()> {
    if !media_root.is_dir() {
        anyhow::bail!("media root {} is not a directory", media_root.display());
    }

    let mut current_port = port;
    let listener = loop {
        let addr = SocketAddr::new(host, current_port);
        match TcpListener::bind(addr) {
            Ok(listener) => {
                // tokio requires a non-blocking socket
                listener.set_nonblocking(true)?;
                info!("Successfully bound to {}", addr);
                break listener;
            }
            Err(e) => {
                warn!("Failed to bind to {}: {}. Trying next port...", addr, e);
                current_port = current_port
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("No available ports found"))?;
            }
        }
    };

    if !detector.is_available() {
        warn!("No classifier loaded; detection endpoints will answer 503");
    }

    let state = Arc::new(AppState {
        detector,
        media_root,
        request_timeout,
    });
    let app = router(state);

    let tokio_listener = tokio::net::TcpListener::from_std(listener)?;
    info!(
        "Deepfake detection server started on http://{:?}",
        tokio_listener.local_addr()?
    );

    axum::serve(tokio_listener, app).await?;

    Ok(())
}
