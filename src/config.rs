use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    video::ImageFormat,
};

/// Main configuration for sharpest-frames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interval selection and output settings
    pub extraction: ExtractionConfig,

    /// External decoder settings
    pub decoder: DecoderConfig,

    /// Worker pool settings
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }
}

/// Interval selection and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Width of each selection window in seconds
    pub interval: f64,

    /// Base output directory, created if absent
    pub output_dir: PathBuf,

    /// Encoding for written frames
    pub format: ImageFormat,

    /// Write each video's frames into `<output_dir>/<video name>/`
    pub per_video_subdir: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            interval: 1.0,
            output_dir: PathBuf::from("sharpest_frames"),
            format: ImageFormat::Jpg,
            per_video_subdir: true,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        validate_interval(self.interval)
    }
}

/// Interval widths must be finite and strictly positive
pub fn validate_interval(interval: f64) -> Result<()> {
    if !interval.is_finite() || interval <= 0.0 {
        return Err(ConfigError::InvalidValue {
            key: "extraction.interval".to_string(),
            value: interval.to_string()
        }.into());
    }
    Ok(())
}

/// External decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// ffmpeg executable used to decode frames
    pub ffmpeg: PathBuf,

    /// ffprobe executable used to read stream properties
    pub ffprobe: PathBuf,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of videos processed at the same time
    pub workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
        }
    }
}

impl SchedulerConfig {
    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.workers".to_string(),
                value: self.workers.to_string()
            }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.interval, 1.0);
        assert_eq!(config.extraction.output_dir, PathBuf::from("sharpest_frames"));
        assert_eq!(config.extraction.format, ImageFormat::Jpg);
        assert!(config.extraction.per_video_subdir);
        assert!(config.scheduler.workers >= 1);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.extraction.interval = 2.5;
        original_config.extraction.format = ImageFormat::Png;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded_config.extraction.interval, 2.5);
        assert_eq!(loaded_config.extraction.format, ImageFormat::Png);
        assert_eq!(original_config.scheduler.workers, loaded_config.scheduler.workers);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[extraction]\nformat = \"png\"\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.extraction.format, ImageFormat::Png);
        assert_eq!(config.extraction.interval, 1.0);
        assert_eq!(config.decoder.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_invalid_interval() {
        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = Config::default();
            config.extraction.interval = interval;
            assert!(config.validate().is_err(), "interval {} accepted", interval);
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.scheduler.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("no/such/config.toml").is_err());
    }
}
