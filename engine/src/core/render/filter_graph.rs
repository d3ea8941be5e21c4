//! Filter Graph Compiler
//!
//! Builds the FFmpeg filter graph that composites overlay images onto the
//! source video and burns in the subtitle document.
//!
//! The graph is an ordered list of [`FilterOp`]s with named input and output
//! streams. Text is produced only by the `Display` impls below, which is
//! also where path escaping happens.
//!
//! ```text
//! [1:v]scale=385:-1[img0];[0:v][img0]overlay=38:77[v1];
//! [2:v]scale=192:-1[img1];[v1][img1]overlay=0:0[v2];
//! [v2]subtitles='/tmp/x/captions.ass:fontsdir=/srv/fonts'[outv]
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use super::overlays::Overlay;
use crate::core::resolve::{resolve_overlay_geometry, OverlayGeometry};

/// Label of the final video stream in a complex graph
pub const OUTPUT_LABEL: &str = "outv";

/// Escapes a filesystem path for use inside a quoted filter option.
///
/// Backslashes become forward slashes; `:` is escaped for the option parser.
/// A `'` closes the quote, is emitted escaped, and reopens it.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', r"\:")
        .replace('\'', r"'\\\''")
}

// =============================================================================
// Graph IR
// =============================================================================

/// A stream reference inside the graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamLabel {
    /// Video stream of engine input `n` (`[n:v]`)
    InputVideo(usize),
    /// Intermediate or output stream (`[name]`)
    Named(String),
}

impl StreamLabel {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputVideo(index) => write!(f, "[{}:v]", index),
            Self::Named(name) => write!(f, "[{}]", name),
        }
    }
}

/// One filter with its stream wiring
#[derive(Clone, Debug, PartialEq)]
pub enum FilterOp {
    /// Scale to `width`, height follows the aspect ratio
    Scale {
        input: StreamLabel,
        width: i64,
        output: StreamLabel,
    },
    /// Composite `top` over `base` at (x, y)
    Overlay {
        base: StreamLabel,
        top: StreamLabel,
        x: i64,
        y: i64,
        output: StreamLabel,
    },
    /// Burn in a subtitle document; unlabeled in a simple (`-vf`) chain
    Subtitles {
        input: Option<StreamLabel>,
        document: PathBuf,
        fonts_dir: PathBuf,
        output: Option<StreamLabel>,
    },
}

impl FilterOp {
    /// Stream this operation produces, if labeled
    pub fn output(&self) -> Option<&StreamLabel> {
        match self {
            Self::Scale { output, .. } | Self::Overlay { output, .. } => Some(output),
            Self::Subtitles { output, .. } => output.as_ref(),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scale {
                input,
                width,
                output,
            } => write!(f, "{}scale={}:-1{}", input, width, output),
            Self::Overlay {
                base,
                top,
                x,
                y,
                output,
            } => write!(f, "{}{}overlay={}:{}{}", base, top, x, y, output),
            Self::Subtitles {
                input,
                document,
                fonts_dir,
                output,
            } => {
                if let Some(input) = input {
                    write!(f, "{}", input)?;
                }
                write!(
                    f,
                    "subtitles='{}:fontsdir={}'",
                    escape_filter_path(document),
                    escape_filter_path(fonts_dir)
                )?;
                if let Some(output) = output {
                    write!(f, "{}", output)?;
                }
                Ok(())
            }
        }
    }
}

/// An overlay whose image was fetched, ready to be placed
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedOverlay {
    /// Local image file fed to the engine as an extra input
    pub image: PathBuf,
    pub overlay: Overlay,
}

/// Compiled filter graph
#[derive(Clone, Debug, PartialEq)]
pub struct FilterGraph {
    ops: Vec<FilterOp>,
    /// Overlay images in engine input order (input `k + 1`)
    inputs: Vec<PathBuf>,
}

impl FilterGraph {
    pub fn ops(&self) -> &[FilterOp] {
        &self.ops
    }

    /// Overlay image inputs, in the order they must be passed to the engine
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// True for the single-operation subtitles-only chain (`-vf`)
    pub fn is_simple(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Final labeled video stream, if the graph is complex
    pub fn output(&self) -> Option<&StreamLabel> {
        self.ops.last().and_then(|op| op.output())
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", op)?;
        }
        Ok(())
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Folds overlays into a filter graph ending in the subtitle burn-in.
///
/// Overlay `k` (0-based, in order) reads engine input `k + 1`, is scaled to
/// `[img{k}]` and composited onto the running stream, producing `[v{k+1}]`.
/// With no overlays the result is a single unlabeled subtitles filter.
pub fn compile_filter_graph(
    overlays: &[PlacedOverlay],
    frame_w: u32,
    document: &Path,
    fonts_dir: &Path,
) -> FilterGraph {
    if overlays.is_empty() {
        return FilterGraph {
            ops: vec![FilterOp::Subtitles {
                input: None,
                document: document.to_path_buf(),
                fonts_dir: fonts_dir.to_path_buf(),
                output: None,
            }],
            inputs: Vec::new(),
        };
    }

    let mut ops = Vec::with_capacity(overlays.len() * 2 + 1);
    let mut current = StreamLabel::InputVideo(0);

    for (k, placed) in overlays.iter().enumerate() {
        let OverlayGeometry { x, y, width } = resolve_overlay_geometry(&placed.overlay, frame_w);
        let scaled = StreamLabel::named(format!("img{}", k));
        let composited = StreamLabel::named(format!("v{}", k + 1));

        ops.push(FilterOp::Scale {
            input: StreamLabel::InputVideo(k + 1),
            width,
            output: scaled.clone(),
        });
        ops.push(FilterOp::Overlay {
            base: current,
            top: scaled,
            x,
            y,
            output: composited.clone(),
        });

        current = composited;
    }

    ops.push(FilterOp::Subtitles {
        input: Some(current),
        document: document.to_path_buf(),
        fonts_dir: fonts_dir.to_path_buf(),
        output: Some(StreamLabel::named(OUTPUT_LABEL)),
    });

    FilterGraph {
        ops,
        inputs: overlays.iter().map(|p| p.image.clone()).collect(),
    }
}
