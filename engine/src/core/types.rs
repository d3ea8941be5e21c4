//! Reelcap Core Type Definitions
//!
//! Defines fundamental types shared by the caption compiler and the render
//! pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// String key of a caption block in the offset/override maps (`"0"`, `"1"`, ...)
pub type BlockKey = String;

// =============================================================================
// Spatial Types
// =============================================================================

/// Width of the layout overlays are authored in (the editor's phone preview).
pub const REFERENCE_FRAME_WIDTH: f64 = 280.0;

/// Source video geometry and duration as reported by the probe
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Duration in seconds (0 when unknown)
    pub duration: TimeSec,
}

impl VideoInfo {
    pub fn new(width: u32, height: u32, duration: TimeSec) -> Self {
        Self {
            width,
            height,
            duration,
        }
    }

    /// Geometry assumed when the probe fails: a vertical 1080x1920 frame.
    pub fn fallback() -> Self {
        Self::new(1080, 1920, 0.0)
    }
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Per-block pixel translation applied to the caption anchor
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Offset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Absolute position on the output frame, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64 Display drops the fraction for whole numbers ("540", not "540.0").
        write!(f, "{},{}", self.x, self.y)
    }
}

// =============================================================================
// Degradable Results
// =============================================================================

/// Outcome of a pipeline step that is allowed to fail without failing the
/// request.
///
/// A failed step carries the substituted value together with the reason, so
/// the orchestrator can keep going and still report what was degraded.
#[derive(Clone, Debug, PartialEq)]
pub enum Degraded<T> {
    /// The step succeeded
    Ok(T),
    /// The step failed and `value` was substituted
    Fallback { value: T, reason: String },
}

impl<T> Degraded<T> {
    /// Keeps the success value, or substitutes `fallback()` on error.
    pub fn from_result<E: fmt::Display>(
        result: Result<T, E>,
        fallback: impl FnOnce() -> T,
    ) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Fallback {
                value: fallback(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Reason of the failure, if the step degraded
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Ok(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Ok(value) | Self::Fallback { value, .. } => value,
        }
    }
}
