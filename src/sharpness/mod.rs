//! # Sharpness Module
//!
//! Focus scoring and the per-interval selection built on top of it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sharpest_frames::sharpness::{IntervalSelector, LaplacianVariance};
//! use sharpest_frames::video::Frame;
//!
//! # fn main() -> sharpest_frames::Result<()> {
//! let mut selector = IntervalSelector::new(1.0, LaplacianVariance)?;
//! let frames: Vec<Frame> = Vec::new();
//!
//! for (index, frame) in frames.into_iter().enumerate() {
//!     if let Some(best) = selector.push(frame, index as f64 / 30.0) {
//!         println!("interval {} -> frame {}", best.bucket, best.position);
//!     }
//! }
//! if let Some(best) = selector.finish() {
//!     println!("interval {} -> frame {}", best.bucket, best.position);
//! }
//! # Ok(())
//! # }
//! ```

pub mod focus;
pub mod selector;

pub use focus::{FocusMeasure, LaplacianVariance};
pub use selector::{BestFrames, IntervalSelector, SelectedFrame};
