//! # Sharpest-Frames
//!
//! Pick the least blurry frame of every fixed-length interval of a video
//! and write it to disk, processing many videos side by side.
//!
//! Each video is decoded in a single forward pass. Frames are scored with a
//! focus measure (variance of the Laplacian by default) and bucketed by
//! `floor(elapsed / interval)`; only the best frame of the open bucket is
//! kept in memory and it is written out the moment the bucket closes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use sharpest_frames::{
//!     config::Config,
//!     extraction::{JobScheduler, JobSettings, OutputLayout, RunSummary},
//!     sharpness::LaplacianVariance,
//!     video::FfmpegOpener,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! config.validate()?;
//!
//! let settings = JobSettings {
//!     interval: config.extraction.interval,
//!     layout: OutputLayout::new(
//!         &config.extraction.output_dir,
//!         config.extraction.per_video_subdir,
//!         config.extraction.format,
//!     ),
//! };
//! let scheduler = JobScheduler::new(
//!     settings,
//!     config.scheduler.workers,
//!     Arc::new(FfmpegOpener::new(&config.decoder)),
//!     Arc::new(LaplacianVariance),
//! );
//!
//! let results = scheduler.run_all(vec![PathBuf::from("talk.mp4")]).await;
//! println!("{:?}", RunSummary::from_results(&results));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`sharpness`] - Focus measures and the streaming interval selector
//! - [`video`] - Frames, stream properties and the decoder seam
//! - [`extraction`] - Per-video jobs, output layout and the worker pool
//! - [`config`] - Configuration management

pub mod config;
pub mod error;
pub mod extraction;
pub mod sharpness;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{ExtractorError, Result},
    extraction::{JobScheduler, RunSummary, VideoJob, VideoJobResult},
    sharpness::{FocusMeasure, IntervalSelector, LaplacianVariance},
};
