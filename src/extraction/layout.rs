use std::path::{Path, PathBuf};

use crate::video::ImageFormat;

/// Where selected frames are written
///
/// Files are named `<video base name>_<bucket:04>.<ext>` and placed either
/// in `<base_dir>/<video base name>/` or directly in `<base_dir>/`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub base_dir: PathBuf,
    pub per_video_subdir: bool,
    pub format: ImageFormat,
}

impl OutputLayout {
    pub fn new<P: Into<PathBuf>>(base_dir: P, per_video_subdir: bool, format: ImageFormat) -> Self {
        Self {
            base_dir: base_dir.into(),
            per_video_subdir,
            format,
        }
    }

    /// Directory receiving the frames of the video called `base_name`
    pub fn directory_for(&self, base_name: &str) -> PathBuf {
        if self.per_video_subdir {
            self.base_dir.join(base_name)
        } else {
            self.base_dir.clone()
        }
    }

    /// Full path of the frame selected for `bucket`
    pub fn frame_path(&self, base_name: &str, bucket: u64) -> PathBuf {
        self.directory_for(base_name).join(frame_file_name(base_name, bucket, self.format))
    }
}

/// `clip_0007.jpg`; indices past 9999 simply grow wider
pub fn frame_file_name(base_name: &str, bucket: u64, format: ImageFormat) -> String {
    format!("{}_{:04}.{}", base_name, bucket, format.extension())
}

/// File name without directory or extension, `video` if there is none
pub fn video_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "video".to_string())
}
