//! FFmpeg Runner Module
//!
//! Executes FFprobe/FFmpeg for the render pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};
use crate::core::process::run_to_completion;
use crate::core::render::{EngineCommand, MediaEngine, MediaProbe};
use crate::core::{CoreResult, VideoInfo};

/// FFmpeg Runner for probing inputs and executing render commands
#[derive(Clone)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
    timeout: Option<Duration>,
}

impl FFmpegRunner {
    /// Create a new FFmpegRunner from detected FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
            timeout: None,
        }
    }

    /// Kill the engine if a render runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe the first video stream for width, height and duration
    pub async fn probe_video(&self, input: &Path) -> FFmpegResult<VideoInfo> {
        if !input.exists() {
            return Err(FFmpegError::ProbeError(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let mut cmd = tokio::process::Command::new(&self.info.ffprobe_path);
        cmd.args(["-v", "error", "-select_streams", "v:0", "-show_entries"])
            .arg("stream=width,height,duration")
            .args(["-of", "json"])
            .arg(input);

        let output = run_to_completion(cmd, self.timeout).await?;
        if !output.status.success() {
            return Err(FFmpegError::ProbeError(format!(
                "FFprobe failed: {}",
                output.stderr
            )));
        }

        parse_probe_output(&output.stdout)
    }

    /// Run FFmpeg with `args` and wait for it to exit.
    ///
    /// A non-zero exit returns `ExecutionFailed` carrying stderr verbatim.
    pub async fn run_args(&self, args: &[String]) -> FFmpegResult<()> {
        let mut cmd = tokio::process::Command::new(&self.info.ffmpeg_path);
        cmd.args(args);

        let output = run_to_completion(cmd, self.timeout).await?;
        if !output.status.success() {
            tracing::error!(status = %output.status, "FFmpeg Error: {}", output.stderr);
            return Err(FFmpegError::ExecutionFailed(output.stderr));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaProbe for FFmpegRunner {
    async fn probe(&self, input: &Path) -> CoreResult<VideoInfo> {
        Ok(self.probe_video(input).await?)
    }
}

#[async_trait]
impl MediaEngine for FFmpegRunner {
    async fn execute(&self, command: &EngineCommand) -> CoreResult<()> {
        tracing::info!("Running FFmpeg: {}", command);
        Ok(self.run_args(command.args()).await?)
    }
}

/// Parse FFprobe JSON output (`-show_entries stream=width,height,duration`)
pub fn parse_probe_output(json_str: &str) -> FFmpegResult<VideoInfo> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse FFprobe output: {}", e)))?;

    let stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| streams.first())
        .ok_or_else(|| FFmpegError::ParseError("No video stream found".to_string()))?;

    let dimension = |key: &str| -> FFmpegResult<u32> {
        stream
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| FFmpegError::ParseError(format!("Missing stream {key}")))
    };

    // ffprobe prints duration as a string; some containers omit it
    let duration = stream
        .get("duration")
        .and_then(|d| match d {
            serde_json::Value::String(s) => s.parse::<f64>().ok(),
            other => other.as_f64(),
        })
        .unwrap_or(0.0);

    Ok(VideoInfo::new(dimension("width")?, dimension("height")?, duration))
}
