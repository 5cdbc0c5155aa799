mod cli;
mod config;
mod error;
mod inference;
mod media;
mod pipeline;
mod report;
mod video;
mod web;

use anyhow::{Context, Result};
use cli::{Args, Command};
use config::DetectorConfig;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::detector::Detector;
use pipeline::types::Verdict;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use video::opencv_reader::OpencvReader;
use web::server::run_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let config = DetectorConfig::from_args(&args.detector)?;

    match args.command {
        Command::Serve {
            host,
            port,
            media_root,
            request_timeout_secs,
        } => {
            let detector = Arc::new(Detector::new(config));
            run_server(
                host,
                port,
                detector,
                media_root,
                Duration::from_secs(request_timeout_secs),
            )
            .await?;
        }
        Command::Detect { paths, csv } => {
            let detector = Detector::new(config);
            let results = detect_all(&detector, &paths)?;
            for (path, verdict) in &results {
                println!(
                    "{}",
                    serde_json::json!({ "path": path, "verdict": verdict })
                );
            }
            if let Some(csv_path) = csv {
                report::write_report_file(&csv_path, &results)?;
            }
        }
        Command::Probe { path } => {
            let reader = OpencvReader::new(&path)?;
            let info = video::probe(&reader)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Extract { path, output_dir } => {
            let written = video::extract::extract_frames(&path, config.num_frames, &output_dir)?;
            tracing::info!(
                "Extracted {} frames from {} into {}",
                written.len(),
                path.display(),
                output_dir.display()
            );
        }
    }

    Ok(())
}

/// Expand directories into the media files under them, then detect each.
fn detect_all(detector: &Detector, paths: &[PathBuf]) -> Result<Vec<(PathBuf, Verdict)>> {
    let mut targets = Vec::new();
    for path in paths {
        if path.is_dir() {
            targets.extend(media::list_media(path).into_iter().map(|(p, _)| p));
        } else {
            targets.push(path.clone());
        }
    }
    if targets.is_empty() {
        anyhow::bail!("No media files found");
    }

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut results = Vec::with_capacity(targets.len());
    for path in targets {
        pb.set_message(
            path.file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        let verdict = detector.detect(&path);
        results.push((path, verdict));
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(results)
}
