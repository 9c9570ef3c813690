use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ExtractorError, OutputError, Result};
use crate::extraction::layout::{video_base_name, OutputLayout};
use crate::sharpness::{FocusMeasure, IntervalSelector, SelectedFrame};
use crate::video::VideoOpener;

/// Settings shared (read-only) by every job of a run
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Window width in seconds
    pub interval: f64,
    pub layout: OutputLayout,
}

/// Outcome of one video
#[derive(Debug)]
pub struct VideoJobResult {
    pub video: PathBuf,

    /// Number of frames written, or why the video was abandoned
    pub outcome: Result<usize>,
}

impl VideoJobResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn frames_written(&self) -> usize {
        self.outcome.as_ref().copied().unwrap_or(0)
    }

    pub fn error(&self) -> Option<&ExtractorError> {
        self.outcome.as_ref().err()
    }
}

/// Elapsed seconds of the `index`-th frame, zero when the rate is unusable
pub fn frame_timestamp(index: u64, frame_rate: f64) -> f64 {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        index as f64 / frame_rate
    } else {
        0.0
    }
}

/// Extracts the sharpest frame of every interval of a single video
pub struct VideoJob {
    video: PathBuf,
    settings: Arc<JobSettings>,
    opener: Arc<dyn VideoOpener>,
    measure: Arc<dyn FocusMeasure>,
}

impl VideoJob {
    pub fn new(
        video: PathBuf,
        settings: Arc<JobSettings>,
        opener: Arc<dyn VideoOpener>,
        measure: Arc<dyn FocusMeasure>,
    ) -> Self {
        Self {
            video,
            settings,
            opener,
            measure,
        }
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    /// Run to completion on the calling thread
    ///
    /// Failures are logged here and carried in the result; they never
    /// escape as a panic or affect other jobs.
    pub fn run(self) -> VideoJobResult {
        let outcome = self.extract();
        match &outcome {
            Ok(written) => {
                info!("Finished processing {} ({} frames written)", self.video.display(), written);
            }
            Err(e) => {
                warn!("Skipping {}: {}", self.video.display(), e);
            }
        }
        VideoJobResult {
            video: self.video,
            outcome,
        }
    }

    fn extract(&self) -> Result<usize> {
        let layout = &self.settings.layout;
        ensure_directory(&layout.base_dir)?;

        // Dropping `source` closes the decoder on every return path below
        let mut source = self.opener.open(&self.video)?;
        let properties = source.properties();

        let base_name = video_base_name(&self.video);
        info!(
            "Processing {}: FPS={:.2}, Frames={}, Duration={:.2}s",
            self.video.display(),
            properties.frame_rate,
            properties.frame_count,
            properties.duration()
        );
        if !properties.has_frame_rate() {
            warn!(
                "{} reports no usable frame rate, every frame falls into interval 0",
                self.video.display()
            );
        }

        ensure_directory(&layout.directory_for(&base_name))?;

        let mut selector = IntervalSelector::new(self.settings.interval, self.measure.clone())?;
        let mut written = 0;
        let mut index = 0u64;

        while let Some(frame) = source.read_next()? {
            let elapsed = frame_timestamp(index, properties.frame_rate);
            index += 1;
            if let Some(selected) = selector.push(frame, elapsed) {
                self.write(&base_name, &selected)?;
                written += 1;
            }
        }

        if let Some(selected) = selector.finish() {
            self.write(&base_name, &selected)?;
            written += 1;
        }

        debug!("{}: decoded {} frames", self.video.display(), index);
        Ok(written)
    }

    fn write(&self, base_name: &str, selected: &SelectedFrame) -> Result<()> {
        let layout = &self.settings.layout;
        let path = layout.frame_path(base_name, selected.bucket);

        debug!(
            "Interval {} -> frame {} (score {:.2}) -> {}",
            selected.bucket,
            selected.position,
            selected.score,
            path.display()
        );

        selected.frame.save_as(&path, layout.format).map_err(|e| OutputError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Create `path` and its parents if missing
pub fn ensure_directory(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        OutputError::DirectoryFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory video sources for job and scheduler tests

    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use crate::error::{Result, VideoError};
    use crate::video::{Frame, VideoOpener, VideoProperties, VideoSource};

    /// Frames are 4x4 and uniform; their shade doubles as the expected score
    /// under [`ShadeScore`].
    #[derive(Clone)]
    pub struct SyntheticVideo {
        pub frame_rate: f64,
        pub shades: Vec<u8>,
    }

    impl SyntheticVideo {
        pub fn new(frame_rate: f64, shades: Vec<u8>) -> Self {
            Self { frame_rate, shades }
        }
    }

    #[derive(Default)]
    pub struct SyntheticOpener {
        videos: HashMap<PathBuf, SyntheticVideo>,
    }

    impl SyntheticOpener {
        pub fn with_video<P: Into<PathBuf>>(mut self, path: P, video: SyntheticVideo) -> Self {
            self.videos.insert(path.into(), video);
            self
        }
    }

    impl VideoOpener for SyntheticOpener {
        fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
            let video = self.videos.get(path).cloned().ok_or_else(|| VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            })?;
            Ok(Box::new(SyntheticSource { video, next: 0 }))
        }
    }

    struct SyntheticSource {
        video: SyntheticVideo,
        next: usize,
    }

    impl VideoSource for SyntheticSource {
        fn properties(&self) -> VideoProperties {
            VideoProperties {
                frame_rate: self.video.frame_rate,
                frame_count: self.video.shades.len() as u64,
                width: 4,
                height: 4,
            }
        }

        fn read_next(&mut self) -> Result<Option<Frame>> {
            let frame = self.video.shades.get(self.next).map(|&shade| Frame::new_filled(4, 4, [shade; 3]));
            self.next += 1;
            Ok(frame)
        }
    }

    /// Scores a frame by its top-left shade
    pub struct ShadeScore;

    impl crate::sharpness::FocusMeasure for ShadeScore {
        fn name(&self) -> &str {
            "shade"
        }

        fn measure(&self, frame: &image::GrayImage) -> f64 {
            frame.get_pixel(0, 0)[0] as f64
        }
    }
}
