use crate::config::Mode;
use crate::media::MediaKind;
use crate::pipeline::types::{Verdict, VerdictLabel};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ReportRow<'a> {
    path: String,
    media: Option<MediaKind>,
    label: VerdictLabel,
    confidence: String,
    probability: String,
    frames_analyzed: usize,
    fake_frames: usize,
    real_frames: usize,
    mode: Mode,
    processing_ms: u64,
    analyzed_at: String,
    error: &'a str,
}

impl<'a> ReportRow<'a> {
    fn new(path: &Path, verdict: &'a Verdict) -> Self {
        Self {
            path: path.display().to_string(),
            media: verdict.media,
            label: verdict.label,
            confidence: format!("{:.2}", verdict.confidence),
            probability: verdict
                .probability
                .map(|p| format!("{:.4}", p))
                .unwrap_or_default(),
            frames_analyzed: verdict.frames_analyzed,
            fake_frames: verdict.fake_frames,
            real_frames: verdict.real_frames,
            mode: verdict.mode,
            processing_ms: verdict.processing_ms,
            analyzed_at: verdict.analyzed_at.to_rfc3339(),
            error: verdict.error.as_deref().unwrap_or(""),
        }
    }
}

/// One row per verdict, header first.
pub fn write_report<W: Write>(writer: W, results: &[(PathBuf, Verdict)]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for (path, verdict) in results {
        csv.serialize(ReportRow::new(path, verdict))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_report_file(path: &Path, results: &[(PathBuf, Verdict)]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report {}", path.display()))?;
    write_report(file, results)?;
    tracing::info!("Wrote {} rows to {}", results.len(), path.display());
    Ok(())
}
