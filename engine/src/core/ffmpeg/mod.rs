//! FFmpeg Integration Module
//!
//! Provides the external media engine behind the render pipeline:
//! - Binary discovery (configured paths, then `PATH` and common install dirs)
//! - Video probing via FFprobe
//! - Blocking execution of a compiled render command
//!
//! The engine itself is assumed correct; this module only invokes it and
//! interprets its exit status.

mod detection;
mod runner;

pub use detection::*;
pub use runner::{parse_probe_output, FFmpegRunner};

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Please install FFmpeg or set REELCAP_FFMPEG.")]
    NotFound,

    /// Non-zero exit; holds the engine's stderr verbatim
    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout: operation took longer than {0}s")]
    Timeout(u64),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

impl From<crate::core::process::ProcessError> for FFmpegError {
    fn from(err: crate::core::process::ProcessError) -> Self {
        use crate::core::process::ProcessError;
        match err {
            ProcessError::Spawn(e) => Self::ProcessError(e),
            ProcessError::TimedOut(limit) => Self::Timeout(limit.as_secs()),
        }
    }
}
