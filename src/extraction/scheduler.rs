use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::ExtractorError;
use crate::extraction::job::{JobSettings, VideoJob, VideoJobResult};
use crate::sharpness::FocusMeasure;
use crate::video::VideoOpener;

/// Runs one [`VideoJob`] per input video on a bounded pool of blocking workers
///
/// At most `workers` videos are decoded at once; the rest wait for a permit.
/// Jobs share nothing mutable, so a failure (or panic) in one of them never
/// reaches the others.
pub struct JobScheduler {
    settings: Arc<JobSettings>,
    workers: usize,
    opener: Arc<dyn VideoOpener>,
    measure: Arc<dyn FocusMeasure>,
}

impl JobScheduler {
    pub fn new(
        settings: JobSettings,
        workers: usize,
        opener: Arc<dyn VideoOpener>,
        measure: Arc<dyn FocusMeasure>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            workers: workers.max(1),
            opener,
            measure,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every video and return one result per video, in completion order
    pub async fn run_all(&self, videos: Vec<PathBuf>) -> Vec<VideoJobResult> {
        info!(
            "Scheduling {} video(s) on {} worker(s) using {}",
            videos.len(),
            self.workers,
            self.measure.name()
        );

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for video in videos {
            let permits = permits.clone();
            let job = VideoJob::new(
                video,
                self.settings.clone(),
                self.opener.clone(),
                self.measure.clone(),
            );

            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = permits.acquire_owned().await.ok();
                let video = job.video().to_path_buf();
                debug!("Worker picked up {}", video.display());

                match tokio::task::spawn_blocking(move || run_guarded(job)).await {
                    Ok(result) => result,
                    Err(e) => VideoJobResult {
                        video,
                        outcome: Err(ExtractorError::generic(format!("worker failed: {}", e))),
                    },
                }
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!("Job task ended abnormally: {}", e),
            }
        }
        results
    }
}

/// Run a job, turning a panic into a failed result for that video
fn run_guarded(job: VideoJob) -> VideoJobResult {
    let video = job.video().to_path_buf();
    panic::catch_unwind(AssertUnwindSafe(|| job.run())).unwrap_or_else(|_| {
        error!("Processing {} panicked", video.display());
        VideoJobResult {
            video,
            outcome: Err(ExtractorError::generic("job panicked")),
        }
    })
}

/// Totals across a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub frames_written: usize,
}

impl RunSummary {
    pub fn from_results(results: &[VideoJobResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            if result.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.frames_written += result.frames_written();
            summary
        })
    }
}
