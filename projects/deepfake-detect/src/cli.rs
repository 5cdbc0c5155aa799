use clap::{Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::{Mode, TensorLayout};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct DetectorArgs {
    /// Path to the ONNX classifier (outputs P(fake))
    #[arg(long, global = true, env = "DEEPFAKE_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Production runs the model; demo returns random predictions
    #[arg(long, global = true, value_enum, default_value = "production", env = "DEEPFAKE_MODE")]
    pub mode: Mode,

    /// Probability above which a frame is labelled fake
    #[arg(long, global = true, default_value_t = 0.5)]
    pub threshold: f64,

    /// Frames sampled per video
    #[arg(long, global = true, default_value_t = 10)]
    pub frames: usize,

    /// Most frames a single video may be sampled at, including API requests
    #[arg(long, global = true, default_value_t = 300)]
    pub max_frames: usize,

    /// Square model input resolution
    #[arg(long, global = true, default_value_t = 224)]
    pub input_size: u32,

    /// Input tensor layout expected by the model
    #[arg(long, global = true, value_enum, default_value = "nhwc")]
    pub layout: TensorLayout,

    /// ONNX Runtime intra-op threads
    #[arg(long, global = true)]
    pub intra_threads: Option<usize>,

    /// Wall-clock budget for sampling and classifying one video
    #[arg(long, global = true, default_value_t = 120)]
    pub video_budget_secs: u64,

    /// Largest accepted media file
    #[arg(long, global = true, default_value_t = 100)]
    pub max_media_mb: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the detection API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Port to bind to
        #[arg(long, default_value_t = 5000)]
        port: u16,

        /// Root directory for media files the API may read
        #[arg(long, env = "DEEPFAKE_MEDIA_ROOT")]
        media_root: PathBuf,

        /// Upper bound on a single detection request
        #[arg(long, default_value_t = 300)]
        request_timeout_secs: u64,
    },

    /// Classify media files (directories are searched recursively)
    Detect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Also write a CSV report
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Print frame count, fps and dimensions of a video
    Probe { path: PathBuf },

    /// Save the sampled frames of a video as JPEG files
    Extract {
        path: PathBuf,

        #[arg(long)]
        output_dir: PathBuf,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
