//! Engine Command Builder
//!
//! Turns a compiled filter graph into the single FFmpeg invocation of a
//! render: inputs, graph, stream mapping, encoding parameters, output.

use std::fmt;
use std::path::{Path, PathBuf};

use super::filter_graph::{FilterGraph, OUTPUT_LABEL};
use crate::core::settings::RenderConfig;

/// Fixed encoding parameters of a render
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingSettings {
    /// Output frame rate
    pub fps: f64,
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            fps: 30.0,
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
        }
    }
}

impl EncodingSettings {
    /// Encoding constants from the config at the requested frame rate.
    pub fn from_config(config: &RenderConfig, fps: f64) -> Self {
        Self {
            fps,
            video_codec: config.video_codec.clone(),
            preset: config.preset.clone(),
            crf: config.crf,
        }
    }
}

/// One engine invocation (arguments exclude the binary itself)
#[derive(Clone, Debug, PartialEq)]
pub struct EngineCommand {
    args: Vec<String>,
    output: PathBuf,
}

impl EngineCommand {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// File the engine writes
    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ffmpeg {}", self.args.join(" "))
    }
}

/// Builds the render command.
///
/// A simple graph is passed with `-vf`; a complex one with `-filter_complex`
/// plus explicit mapping of `[outv]` and the source audio (optional, so
/// silent inputs still render).
pub fn build_render_command(
    input: &Path,
    graph: &FilterGraph,
    encoding: &EncodingSettings,
    output: &Path,
) -> EngineCommand {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ];

    for image in graph.inputs() {
        args.push("-i".to_string());
        args.push(image.to_string_lossy().to_string());
    }

    if graph.is_simple() {
        args.push("-vf".to_string());
        args.push(graph.to_string());
    } else {
        args.push("-filter_complex".to_string());
        args.push(graph.to_string());
        args.push("-map".to_string());
        args.push(format!("[{}]", OUTPUT_LABEL));
        args.push("-map".to_string());
        args.push("0:a?".to_string());
    }

    args.extend([
        "-r".to_string(),
        encoding.fps.to_string(),
        "-c:v".to_string(),
        encoding.video_codec.clone(),
        "-preset".to_string(),
        encoding.preset.clone(),
        "-crf".to_string(),
        encoding.crf.to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]);

    EngineCommand {
        args,
        output: output.to_path_buf(),
    }
}
