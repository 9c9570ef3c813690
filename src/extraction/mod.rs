//! # Extraction Module
//!
//! Per-video jobs and the worker pool that runs them.
//!
//! A [`VideoJob`] opens one video, derives each frame's timestamp from its
//! index and the stream's frame rate, feeds the frames through an
//! [`IntervalSelector`](crate::sharpness::IntervalSelector) and writes every
//! interval winner as soon as its interval closes. The [`JobScheduler`] fans
//! jobs out over a fixed number of blocking workers.

pub mod job;
pub mod layout;
pub mod scheduler;

pub use job::{frame_timestamp, JobSettings, VideoJob, VideoJobResult};
pub use layout::OutputLayout;
pub use scheduler::{JobScheduler, RunSummary};
