//! FFmpeg Detection Module
//!
//! Locates the FFmpeg/FFprobe binaries once at startup. Explicitly configured
//! paths win; otherwise `PATH` is searched, then the usual install
//! directories for the platform.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{FFmpegError, FFmpegResult};

/// Information about the detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary
    pub ffprobe_path: PathBuf,
    /// FFmpeg version string
    pub version: String,
}

impl FFmpegInfo {
    /// Builds an info record without running the binaries.
    ///
    /// Used where the paths are known up front (tests, pre-validated config).
    pub fn from_paths(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            version: "unknown".to_string(),
        }
    }
}

/// Detect FFmpeg, preferring explicitly configured binaries.
pub fn detect_ffmpeg(
    ffmpeg_override: Option<&Path>,
    ffprobe_override: Option<&Path>,
) -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = locate_binary("ffmpeg", ffmpeg_override)?;
    let ffprobe_path = locate_binary("ffprobe", ffprobe_override)?;
    let version = get_ffmpeg_version(&ffmpeg_path)?;

    tracing::info!(
        ffmpeg = %ffmpeg_path.display(),
        ffprobe = %ffprobe_path.display(),
        %version,
        "Detected FFmpeg"
    );

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

/// Resolves one binary: configured path, then `PATH`, then common locations.
fn locate_binary(name: &str, configured: Option<&Path>) -> FFmpegResult<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            "Configured {} path {} does not exist, searching PATH",
            name,
            path.display()
        );
    }

    if let Ok(path) = which::which(name) {
        return Ok(path);
    }

    let binary_name = binary_file_name(name);
    get_common_ffmpeg_paths()
        .into_iter()
        .map(|dir| dir.join(&binary_name))
        .find(|candidate| candidate.is_file())
        .ok_or(FFmpegError::NotFound)
}

fn binary_file_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        // Scoop installation
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        // Homebrew paths
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

/// Get FFmpeg version string
fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    parse_version_line(&String::from_utf8_lossy(&output.stdout))
}

/// Parses "ffmpeg version X.Y.Z ..." from the first line of `-version` output.
fn parse_version_line(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}
