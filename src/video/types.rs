use std::fmt;
use std::path::Path;

use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// A single decoded video frame
///
/// Thin wrapper around an RGB image buffer. Frames are moved, never
/// cloned, on the selection path so at most one candidate per open
/// interval is alive at a time.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    /// Create a frame from raw packed RGB24 bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Luma conversion used for scoring
    pub fn to_grayscale(&self) -> GrayImage {
        image::imageops::grayscale(&self.buffer)
    }

    /// Encode the frame to `path` using the given format
    pub fn save_as<P: AsRef<Path>>(&self, path: P, format: ImageFormat) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, format.to_image_format())
    }
}

/// Stream properties reported by a video source when it is opened
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    /// Frames per second; zero when the container does not report one
    pub frame_rate: f64,

    /// Total frame count as reported (or estimated) by the container
    pub frame_count: u64,

    pub width: u32,
    pub height: u32,
}

impl VideoProperties {
    /// Duration derived from frame count and rate, zero when the rate is unknown
    pub fn duration(&self) -> f64 {
        if self.has_frame_rate() {
            self.frame_count as f64 / self.frame_rate
        } else {
            0.0
        }
    }

    pub fn has_frame_rate(&self) -> bool {
        self.frame_rate.is_finite() && self.frame_rate > 0.0
    }
}

/// Output image encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpg,
    Png,
}

impl ImageFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_with_and_without_rate() {
        let props = VideoProperties { frame_rate: 30.0, frame_count: 93, width: 4, height: 4 };
        assert!((props.duration() - 3.1).abs() < 1e-9);

        let unknown = VideoProperties { frame_rate: 0.0, ..props };
        assert_eq!(unknown.duration(), 0.0);
        assert!(!unknown.has_frame_rate());

        let nan = VideoProperties { frame_rate: f64::NAN, ..props };
        assert_eq!(nan.duration(), 0.0);
    }

    #[test]
    fn test_from_rgb_bytes_checks_length() {
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_grayscale_of_gray_pixel_is_identity() {
        let frame = Frame::new_filled(3, 3, [77, 77, 77]);
        let gray = frame.to_grayscale();
        assert_eq!(gray.get_pixel(1, 1)[0], 77);
    }

    #[test]
    fn test_save_as_writes_requested_format() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new_filled(8, 8, [10, 200, 30]);

        let png = dir.path().join("frame.png");
        frame.save_as(&png, ImageFormat::Png).unwrap();
        assert_eq!(image::open(&png).unwrap().to_rgb8().get_pixel(0, 0).0, [10, 200, 30]);

        let jpg = dir.path().join("frame.jpg");
        frame.save_as(&jpg, ImageFormat::Jpg).unwrap();
        assert!(jpg.exists());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ImageFormat::default().extension(), "jpg");
        assert_eq!(ImageFormat::Png.to_string(), "png");
    }
}
