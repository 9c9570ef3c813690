use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::error::{Result, VideoError};
use crate::video::types::{Frame, VideoProperties};

/// A sequential, forward-only stream of decoded frames
///
/// Implementations release their underlying decoder when dropped, so a
/// source going out of scope on any path (success, error or early return)
/// closes it.
pub trait VideoSource: Send {
    /// Stream properties captured when the source was opened
    fn properties(&self) -> VideoProperties;

    /// Decode the next frame, `Ok(None)` at end of stream
    fn read_next(&mut self) -> Result<Option<Frame>>;
}

/// Factory for video sources
///
/// Every job opens its own source through this, sources are never shared
/// between jobs.
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>>;
}

/// Opens videos by probing them with ffprobe and piping raw RGB24 frames
/// out of an ffmpeg child process.
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegOpener {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg.clone(),
            ffprobe: config.ffprobe.clone(),
        }
    }

    /// Whether the configured ffmpeg binary can be executed
    pub fn check_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn probe(&self, path: &Path) -> Result<VideoProperties> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v", "error",
                "-print_format", "json",
                "-show_streams",
                "-select_streams", "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|e| VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: format!("failed to run {}: {}", self.ffprobe.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: stderr.trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&stdout).map_err(|reason| {
            VideoError::ProbeFailed {
                path: path.display().to_string(),
                reason,
            }
            .into()
        })
    }
}

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>> {
        if !path.is_file() {
            return Err(VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            }
            .into());
        }

        let properties = self.probe(path)?;

        let mut child = Command::new(&self.ffmpeg)
            .args(decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VideoError::OpenFailed {
                path: path.display().to_string(),
                reason: format!("failed to run {}: {}", self.ffmpeg.display(), e),
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(VideoError::OpenFailed {
                    path: path.display().to_string(),
                    reason: "decoder produced no output pipe".to_string(),
                }
                .into());
            }
        };

        debug!(
            "Spawned decoder for {} ({}x{})",
            path.display(),
            properties.width,
            properties.height
        );

        Ok(Box::new(FfmpegSource {
            child,
            stdout,
            properties,
            frame_len: properties.width as usize * properties.height as usize * 3,
            finished: false,
        }))
    }
}

/// ffmpeg arguments that stream every decoded frame of the first video
/// stream exactly once as packed RGB24 on stdout
///
/// Without `-fps_mode passthrough` the rawvideo muxer resamples to a constant
/// rate, duplicating or dropping frames of variable-rate input.
fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-noautorotate", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        [
            "-map", "0:v:0",
            "-fps_mode", "passthrough",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "pipe:1",
        ]
        .iter()
        .map(OsString::from),
    );
    args
}

/// Raw-video pipe from an ffmpeg child process
pub struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    properties: VideoProperties,
    frame_len: usize,
    finished: bool,
}

impl FfmpegSource {
    /// Fill `buf` completely; returns the number of bytes read before EOF.
    fn fill(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl VideoSource for FfmpegSource {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        if self.finished || self.frame_len == 0 {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_len];
        let filled = self.fill(&mut buf).map_err(|e| VideoError::DecodingFailed {
            reason: e.to_string(),
        })?;

        if filled < self.frame_len {
            self.finished = true;
            if filled > 0 {
                warn!(
                    "Decoder stopped mid-frame ({} of {} bytes), treating as end of stream",
                    filled, self.frame_len
                );
            }
            return Ok(None);
        }

        let frame = Frame::from_rgb_bytes(self.properties.width, self.properties.height, buf)
            .ok_or_else(|| VideoError::DecodingFailed {
                reason: "frame buffer does not match stream dimensions".to_string(),
            })?;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) if !status.success() => {
                debug!("Decoder exited with {}", status);
            }
            Ok(Some(_)) => {}
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    streams: Option<Vec<ProbeStream>>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Turn ffprobe's JSON into stream properties
fn parse_probe_output(json: &str) -> std::result::Result<VideoProperties, String> {
    let probe: ProbeOutput =
        serde_json::from_str(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let stream = probe
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .ok_or_else(|| "no video stream".to_string())?;

    let width = stream.width.filter(|w| *w > 0).ok_or("missing frame width")?;
    let height = stream.height.filter(|h| *h > 0).ok_or("missing frame height")?;

    let frame_rate = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .filter(|fps| *fps > 0.0)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .or_else(|| {
            let duration = stream.duration.as_deref()?.parse::<f64>().ok()?;
            (duration.is_finite() && duration > 0.0).then(|| (duration * frame_rate).round() as u64)
        })
        .unwrap_or(0);

    Ok(VideoProperties {
        frame_rate,
        frame_count,
        width,
        height,
    })
}

/// Parse a frame rate such as "30/1", "30000/1001" or "29.97"
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num, den)) = rate.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        return (den > 0.0).then(|| num / den);
    }
    rate.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 1e-9);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("25").unwrap() - 25.0).abs() < 1e-9);
        assert!(parse_frame_rate("0/0").is_none());
        assert!(parse_frame_rate("abc").is_none());
    }

    #[test]
    fn test_parse_probe_output_full() {
        let json = r#"{"streams":[{"codec_type":"video","width":1280,"height":720,
            "avg_frame_rate":"30/1","r_frame_rate":"30/1","nb_frames":"93","duration":"3.1"}]}"#;
        let props = parse_probe_output(json).unwrap();
        assert_eq!(props.width, 1280);
        assert_eq!(props.height, 720);
        assert_eq!(props.frame_count, 93);
        assert!((props.frame_rate - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_output_estimates_frame_count() {
        let json = r#"{"streams":[{"codec_type":"video","width":64,"height":48,
            "avg_frame_rate":"0/0","r_frame_rate":"25/1","duration":"2.0"}]}"#;
        let props = parse_probe_output(json).unwrap();
        assert!((props.frame_rate - 25.0).abs() < 1e-9);
        assert_eq!(props.frame_count, 50);
    }

    #[test]
    fn test_parse_probe_output_unknown_rate() {
        let json = r#"{"streams":[{"codec_type":"video","width":64,"height":48,
            "avg_frame_rate":"0/0","r_frame_rate":"0/0"}]}"#;
        let props = parse_probe_output(json).unwrap();
        assert_eq!(props.frame_rate, 0.0);
        assert_eq!(props.frame_count, 0);
    }

    #[test]
    fn test_parse_probe_output_rejects_missing_stream() {
        assert!(parse_probe_output(r#"{"streams":[]}"#).is_err());
        assert!(parse_probe_output(r#"{}"#).is_err());
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn test_decode_args_pass_every_frame_through() {
        let args = decode_args(Path::new("clips/walk.mp4"));
        let position = |flag: &str| args.iter().position(|a| a == flag);

        let fps_mode = position("-fps_mode").expect("fps_mode flag");
        assert_eq!(args[fps_mode + 1], "passthrough");

        // Output options sit between the input and the output target
        let input = position("clips/walk.mp4").unwrap();
        let output = position("pipe:1").unwrap();
        assert!(input < fps_mode && fps_mode < output);
        assert_eq!(output, args.len() - 1);

        let format = position("-f").unwrap();
        assert_eq!(args[format + 1], "rawvideo");
        let pix_fmt = position("-pix_fmt").unwrap();
        assert_eq!(args[pix_fmt + 1], "rgb24");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let opener = FfmpegOpener::new(&DecoderConfig::default());
        let result = opener.open(Path::new("definitely/not/here.mp4"));
        assert!(matches!(
            result,
            Err(crate::error::ExtractorError::Video(VideoError::OpenFailed { .. }))
        ));
    }
}
