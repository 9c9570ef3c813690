use thiserror::Error;

/// Main error type for the sharpest-frames library
#[derive(Error, Debug)]
pub enum ExtractorError {
    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while opening or decoding a video
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Cannot open video file: {path} ({reason})")]
    OpenFailed { path: String, reason: String },

    #[error("Failed to probe video stream of {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },
}

/// Errors raised while persisting selected frames
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Cannot create output directory {path}: {reason}")]
    DirectoryFailed { path: String, reason: String },

    #[error("Failed to write frame to {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ExtractorError
pub type Result<T> = std::result::Result<T, ExtractorError>;

impl ExtractorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error only affects the video being processed.
    ///
    /// Job-scoped errors are reported and the run carries on with the
    /// remaining videos; everything else should stop the process before
    /// any job starts.
    pub fn is_job_scoped(&self) -> bool {
        match self {
            Self::Video(_) | Self::Output(_) | Self::Io(_) => true,
            Self::Config(_) => false,
            Self::Generic(_) => true,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::OpenFailed { path, .. }) => {
                format!("Could not open video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Config(ConfigError::InvalidValue { key, value }) if key == "extraction.interval" => {
                format!("Interval must be a positive number of seconds (got {}).", value)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_scoped_classification() {
        let open: ExtractorError = VideoError::OpenFailed {
            path: "missing.mp4".to_string(),
            reason: "file not found".to_string(),
        }
        .into();
        assert!(open.is_job_scoped());

        let write: ExtractorError = OutputError::WriteFailed {
            path: "out/a_0000.jpg".to_string(),
            reason: "disk full".to_string(),
        }
        .into();
        assert!(write.is_job_scoped());

        let config: ExtractorError = ConfigError::InvalidValue {
            key: "extraction.interval".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert!(!config.is_job_scoped());
    }

    #[test]
    fn test_user_message_mentions_path() {
        let err: ExtractorError = VideoError::OpenFailed {
            path: "holiday.mp4".to_string(),
            reason: "moov atom not found".to_string(),
        }
        .into();
        assert!(err.user_message().contains("holiday.mp4"));
    }
}
