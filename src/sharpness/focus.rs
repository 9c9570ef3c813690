use std::sync::Arc;

use image::GrayImage;
use rayon::prelude::*;

/// Scalar sharpness score of a grayscale frame
///
/// Scores only need to order frames within a single run: higher means
/// sharper. Implementations must be pure and must return a finite,
/// non-negative value for every frame, including uniform ones.
pub trait FocusMeasure: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    fn measure(&self, frame: &GrayImage) -> f64;
}

impl<M: FocusMeasure + ?Sized> FocusMeasure for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn measure(&self, frame: &GrayImage) -> f64 {
        (**self).measure(frame)
    }
}

impl<M: FocusMeasure + ?Sized> FocusMeasure for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn measure(&self, frame: &GrayImage) -> f64 {
        (**self).measure(frame)
    }
}

/// Variance of the Laplacian
///
/// Convolves the frame with the 4-neighbour kernel
///
/// ```text
///  0  1  0
///  1 -4  1
///  0  1  0
/// ```
///
/// using reflect-101 borders (`gfedcb|abcdefgh|gfedcba`) and returns the
/// population variance of the response. Blurry frames have weak edges and
/// therefore a small spread of Laplacian values.
///
/// Sums are kept in integers, so the result does not depend on how rayon
/// splits the rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaplacianVariance;

impl LaplacianVariance {
    pub fn new() -> Self {
        Self
    }
}

impl FocusMeasure for LaplacianVariance {
    fn name(&self) -> &str {
        "laplacian_variance"
    }

    fn measure(&self, frame: &GrayImage) -> f64 {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return 0.0;
        }

        let w = width as usize;
        let h = height as usize;
        let pixels = frame.as_raw();
        let at = |x: usize, y: usize| pixels[y * w + x] as i64;

        let (sum, sum_sq) = (0..h)
            .into_par_iter()
            .map(|y| {
                let up = reflect_101(y as isize - 1, h);
                let down = reflect_101(y as isize + 1, h);
                let mut sum = 0i64;
                let mut sum_sq = 0i64;
                for x in 0..w {
                    let left = reflect_101(x as isize - 1, w);
                    let right = reflect_101(x as isize + 1, w);
                    let response = at(left, y) + at(right, y) + at(x, up) + at(x, down) - 4 * at(x, y);
                    sum += response;
                    sum_sq += response * response;
                }
                (sum as i128, sum_sq as i128)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        let n = (w * h) as i128;
        // n * sum_sq >= sum^2 always holds for integers, so this never goes negative
        let numerator = n * sum_sq - sum * sum;
        numerator as f64 / (n * n) as f64
    }
}

/// Mirror an out-of-range index without repeating the edge sample
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mirrored = if index < 0 {
        -index
    } else if index > last {
        2 * last - index
    } else {
        index
    };
    mirrored.clamp(0, last) as usize
}
