//! Render Pipeline Module
//!
//! Turns a render request into a finished video.
//!
//! # Modules
//!
//! - `filter_graph`: Overlay/subtitle filter graph IR and compiler
//! - `command`: FFmpeg argument list for one render
//! - `workspace`: Per-request temp directory
//! - `overlays`: Overlay model and HTTP image fetcher
//! - `persist`: Best-effort auto-save
//! - `pipeline`: The orchestrator driving all of the above
//!
//! # Collaborators
//!
//! The orchestrator reaches the outside world only through the traits
//! below. Production handles ([`crate::core::ffmpeg::FFmpegRunner`],
//! [`HttpImageFetcher`]) are constructed once at startup and shared.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::core::captions::{CaptionBlock, StyleAttributes};
use crate::core::{BlockKey, CoreResult, Offset, VideoInfo};

mod command;
mod filter_graph;
mod overlays;
mod persist;
mod pipeline;
mod workspace;

pub use command::{build_render_command, EncodingSettings, EngineCommand};
pub use filter_graph::{
    compile_filter_graph, escape_filter_path, FilterGraph, FilterOp, PlacedOverlay, StreamLabel,
    OUTPUT_LABEL,
};
pub use overlays::{FetchError, HttpImageFetcher, Overlay, DEFAULT_OVERLAY_WIDTH};
pub use persist::{default_save_dirs, export_file_name, persist_output};
pub use pipeline::CaptionRenderer;
pub use workspace::RenderWorkspace;

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Reads geometry and duration of a video file
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, input: &Path) -> CoreResult<VideoInfo>;
}

/// Runs a compiled render command to completion
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Non-zero exit must surface as `CoreError::EngineExecutionFailed`
    /// carrying the engine's diagnostic text.
    async fn execute(&self, command: &EngineCommand) -> CoreResult<()>;
}

/// Fetches raw image bytes for a URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// =============================================================================
// Request / Response
// =============================================================================

/// Decoded render request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderRequest {
    pub captions: Vec<CaptionBlock>,
    /// Global default style
    pub style: StyleAttributes,
    pub offsets: HashMap<BlockKey, Offset>,
    pub overrides: HashMap<BlockKey, StyleAttributes>,
    pub overlays: Vec<Overlay>,
    /// Output frame rate (None = configured default)
    pub fps: Option<f64>,
}

/// Source video of a render
#[derive(Clone, Debug)]
pub enum RenderInput {
    /// Uploaded bytes, written into the request workspace
    Bytes(Vec<u8>),
    /// Existing file, read in place
    Path(PathBuf),
}

/// Degraded steps of one render
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub probe_degraded: bool,
    /// Indices (into the request's overlay list) that were dropped
    pub dropped_overlays: Vec<usize>,
    pub persist_error: Option<String>,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        !self.probe_degraded && self.dropped_overlays.is_empty() && self.persist_error.is_none()
    }
}

/// Result of a successful render
#[derive(Clone, Debug)]
pub struct RenderOutcome {
    /// Rendered MP4
    pub bytes: Vec<u8>,
    /// Where auto-save copied the video, if it did
    pub saved_path: Option<PathBuf>,
    pub report: RenderReport,
}
