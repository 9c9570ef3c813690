use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use sharpest_frames::{
    config::Config,
    extraction::{JobScheduler, JobSettings, OutputLayout, RunSummary},
    sharpness::LaplacianVariance,
    video::{FfmpegOpener, ImageFormat},
};

#[derive(Parser)]
#[command(
    name = "sharpest-frames",
    version,
    about = "Extract sharpest frames from videos at specified intervals",
    long_about = "For every fixed-length interval of each video, picks the frame with the highest focus score (variance of the Laplacian) and saves it as an image. Videos are processed concurrently."
)]
struct Cli {
    /// Path(s) to video file(s)
    #[arg(required = true, num_args = 1..)]
    videos: Vec<PathBuf>,

    /// Interval in seconds between sharp-frame selections (default: 1)
    #[arg(long, allow_negative_numbers = true)]
    interval: Option<f64>,

    /// Base output directory (default: sharpest_frames)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Image format to save
    #[arg(long, value_enum)]
    format: Option<ImageFormat>,

    /// Do not create per-video subdirectories; save all frames directly into the output directory
    #[arg(long)]
    no_subdir: bool,

    /// Number of videos processed at the same time (default: CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command line flags win over the configuration file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(interval) = self.interval {
            config.extraction.interval = interval;
        }
        if let Some(output) = &self.output {
            config.extraction.output_dir = output.clone();
        }
        if let Some(format) = self.format {
            config.extraction.format = format;
        }
        if self.no_subdir {
            config.extraction.per_video_subdir = false;
        }
        if let Some(workers) = self.workers {
            config.scheduler.workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting sharpest-frames v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate().map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!("Interval: {}s", config.extraction.interval);
    info!("Output: {:?} ({})", config.extraction.output_dir, config.extraction.format);

    let opener = FfmpegOpener::new(&config.decoder);
    if !opener.check_available() {
        warn!(
            "{} could not be executed, every video will fail to open",
            config.decoder.ffmpeg.display()
        );
    }

    let settings = JobSettings {
        interval: config.extraction.interval,
        layout: OutputLayout::new(
            config.extraction.output_dir.clone(),
            config.extraction.per_video_subdir,
            config.extraction.format,
        ),
    };
    let scheduler = JobScheduler::new(
        settings,
        config.scheduler.workers,
        Arc::new(opener),
        Arc::new(LaplacianVariance),
    );

    let results = scheduler.run_all(cli.videos).await;
    let summary = RunSummary::from_results(&results);

    for result in results.iter().filter(|r| !r.is_success()) {
        if let Some(e) = result.error() {
            warn!("{}: {}", result.video.display(), e.user_message());
        }
    }
    info!(
        "Done: {} video(s) processed, {} failed, {} frame(s) written",
        summary.succeeded, summary.failed, summary.frames_written
    );

    // Per-video failures are warnings, not a failed run
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_keep_config() {
        let cli = Cli::try_parse_from(["sharpest-frames", "a.mp4"]).unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(cli.videos, vec![PathBuf::from("a.mp4")]);
        assert_eq!(config.extraction.interval, 1.0);
        assert_eq!(config.extraction.output_dir, PathBuf::from("sharpest_frames"));
        assert_eq!(config.extraction.format, ImageFormat::Jpg);
        assert!(config.extraction.per_video_subdir);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "sharpest-frames",
            "a.mp4",
            "b.mp4",
            "--interval",
            "2.5",
            "--output",
            "frames",
            "--format",
            "png",
            "--no-subdir",
            "--workers",
            "3",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(cli.videos.len(), 2);
        assert_eq!(config.extraction.interval, 2.5);
        assert_eq!(config.extraction.output_dir, PathBuf::from("frames"));
        assert_eq!(config.extraction.format, ImageFormat::Png);
        assert!(!config.extraction.per_video_subdir);
        assert_eq!(config.scheduler.workers, 3);
    }

    #[test]
    fn test_cli_requires_a_video() {
        assert!(Cli::try_parse_from(["sharpest-frames"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["sharpest-frames", "a.mp4", "--format", "gif"]).is_err());
    }

    #[test]
    fn test_non_positive_interval_fails_validation() {
        for interval in ["0", "-1.5"] {
            let cli = Cli::try_parse_from(["sharpest-frames", "a.mp4", "--interval", interval]).unwrap();
            let mut config = Config::default();
            cli.apply_overrides(&mut config);
            assert!(config.validate().is_err());
        }
    }
}
