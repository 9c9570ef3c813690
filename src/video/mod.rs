//! # Video Module
//!
//! Frame and stream types plus the decoding seam: a [`VideoOpener`] hands
//! out one [`VideoSource`] per video, and the ffmpeg-backed implementation
//! pipes raw frames out of an external decoder process.

pub mod source;
pub mod types;

pub use source::{FfmpegOpener, FfmpegSource, VideoOpener, VideoSource};
pub use types::{Frame, ImageFormat, VideoProperties};
