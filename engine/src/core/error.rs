//! Reelcap Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::ffmpeg::FFmpegError;

/// Core engine error types
///
/// Only `ClientInput` and `EngineExecutionFailed` abort a render in normal
/// operation; probe, overlay and auto-save failures are degraded in place.
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid request: {0}")]
    ClientInput(String),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    #[error("FFmpeg not found. Please install FFmpeg or set REELCAP_FFMPEG.")]
    EngineNotFound,

    #[error("FFmpeg failed: {0}")]
    EngineExecutionFailed(String),

    #[error("FFprobe error: {0}")]
    ProbeFailed(String),

    #[error("Overlay fetch failed: {0}")]
    OverlayFetchFailed(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// True when the caller sent something unusable (maps to HTTP 400).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ClientInput(_))
    }
}

impl From<FFmpegError> for CoreError {
    fn from(err: FFmpegError) -> Self {
        match err {
            FFmpegError::NotFound => Self::EngineNotFound,
            FFmpegError::ExecutionFailed(stderr) => Self::EngineExecutionFailed(stderr),
            FFmpegError::ProbeError(msg) | FFmpegError::ParseError(msg) => Self::ProbeFailed(msg),
            FFmpegError::ProcessError(e) => Self::IoError(e),
            FFmpegError::Timeout(secs) => {
                Self::Timeout(format!("FFmpeg did not finish within {secs}s"))
            }
        }
    }
}
