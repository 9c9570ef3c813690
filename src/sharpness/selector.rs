use tracing::debug;

use crate::config::validate_interval;
use crate::error::Result;
use crate::sharpness::focus::FocusMeasure;
use crate::video::Frame;

/// The winning frame of one closed interval
#[derive(Debug, Clone)]
pub struct SelectedFrame {
    /// `floor(elapsed / interval)` of every frame that competed for this slot
    pub bucket: u64,

    /// Zero-based arrival order of the frame within the stream
    pub position: u64,

    pub score: f64,
    pub frame: Frame,
}

struct Candidate {
    position: u64,
    score: f64,
    frame: Frame,
}

/// Streaming per-interval argmax over sharpness
///
/// Frames are pushed in presentation order together with their elapsed
/// time. The selector keeps exactly one candidate frame for the open
/// interval and hands it back as soon as a frame from a later interval
/// arrives, or when [`finish`](Self::finish) is called at end of stream.
///
/// Elapsed times must be non-decreasing. A frame that maps to an earlier
/// interval than the open one is counted towards the open interval, so the
/// emitted bucket indices are always strictly increasing.
pub struct IntervalSelector<M> {
    interval: f64,
    measure: M,
    current_bucket: Option<u64>,
    best: Option<Candidate>,
    seen: u64,
}

impl<M: FocusMeasure> IntervalSelector<M> {
    /// Create a selector for windows of `interval` seconds
    pub fn new(interval: f64, measure: M) -> Result<Self> {
        validate_interval(interval)?;
        Ok(Self {
            interval,
            measure,
            current_bucket: None,
            best: None,
            seen: 0,
        })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Index of the interval currently accumulating frames
    pub fn current_bucket(&self) -> Option<u64> {
        self.current_bucket
    }

    /// Number of frames pushed so far
    pub fn frames_seen(&self) -> u64 {
        self.seen
    }

    /// Interval index for an elapsed time
    pub fn bucket_for(&self, elapsed_seconds: f64) -> u64 {
        let bucket = (elapsed_seconds / self.interval).floor();
        if bucket.is_finite() && bucket > 0.0 {
            bucket as u64
        } else {
            0
        }
    }

    /// Feed the next frame; returns the previous interval's winner if this
    /// frame closed it.
    pub fn push(&mut self, frame: Frame, elapsed_seconds: f64) -> Option<SelectedFrame> {
        let position = self.seen;
        self.seen += 1;

        let bucket = self.bucket_for(elapsed_seconds);
        let score = self.measure.measure(&frame.to_grayscale());
        let candidate = Candidate { position, score, frame };

        match self.current_bucket {
            Some(current) if bucket > current => {
                let closed = self.take_best(current);
                self.current_bucket = Some(bucket);
                self.best = Some(candidate);
                closed
            }
            Some(current) => {
                if bucket < current {
                    debug!(
                        "Frame {} maps to interval {} after interval {} opened, keeping it in {}",
                        position, bucket, current, current
                    );
                }
                // Strictly greater: the earlier frame wins ties
                let replace = self.best.as_ref().map_or(true, |best| score > best.score);
                if replace {
                    self.best = Some(candidate);
                }
                None
            }
            None => {
                self.current_bucket = Some(bucket);
                self.best = Some(candidate);
                None
            }
        }
    }

    /// Close the stream and return the last open interval's winner, if any
    pub fn finish(mut self) -> Option<SelectedFrame> {
        let current = self.current_bucket.take()?;
        self.take_best(current)
    }

    fn take_best(&mut self, bucket: u64) -> Option<SelectedFrame> {
        self.best.take().map(|best| SelectedFrame {
            bucket,
            position: best.position,
            score: best.score,
            frame: best.frame,
        })
    }
}

/// Lazy iterator of interval winners over a fallible `(frame, elapsed)` stream
///
/// Stops after yielding the first upstream error.
pub struct BestFrames<I, M> {
    frames: I,
    selector: Option<IntervalSelector<M>>,
}

impl<I, M> BestFrames<I, M>
where
    I: Iterator<Item = Result<(Frame, f64)>>,
    M: FocusMeasure,
{
    pub fn new(frames: I, selector: IntervalSelector<M>) -> Self {
        Self {
            frames,
            selector: Some(selector),
        }
    }
}

impl<I, M> Iterator for BestFrames<I, M>
where
    I: Iterator<Item = Result<(Frame, f64)>>,
    M: FocusMeasure,
{
    type Item = Result<SelectedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let selector = self.selector.as_mut()?;
            match self.frames.next() {
                Some(Ok((frame, elapsed))) => {
                    if let Some(selected) = selector.push(frame, elapsed) {
                        return Some(Ok(selected));
                    }
                }
                Some(Err(e)) => {
                    self.selector = None;
                    return Some(Err(e));
                }
                None => {
                    return self.selector.take().and_then(IntervalSelector::finish).map(Ok);
                }
            }
        }
    }
}
