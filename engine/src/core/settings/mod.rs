//! Render Configuration
//!
//! Provides the process-wide render configuration with:
//! - Serde defaults for every field (partial files are fine)
//! - Tolerant loading (a missing or corrupt file falls back to defaults)
//! - Environment overrides for deployment
//! - Normalization of out-of-range values
//!
//! Layering: defaults → JSON file (`--config` or `REELCAP_CONFIG`) → env.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Env var naming the config file
pub const CONFIG_ENV: &str = "REELCAP_CONFIG";
pub const FFMPEG_ENV: &str = "REELCAP_FFMPEG";
pub const FFPROBE_ENV: &str = "REELCAP_FFPROBE";
pub const FONTS_DIR_ENV: &str = "REELCAP_FONTS_DIR";
pub const AUTO_SAVE_ENV: &str = "REELCAP_AUTO_SAVE";

/// x264 presets accepted by `preset`
const X264_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Render configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// FFmpeg binary (None = discover on PATH)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// FFprobe binary (None = discover on PATH)
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    /// Directory the subtitles filter loads fonts from
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,

    /// Parent of per-request workspaces (None = system temp dir)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Frame rate used when a request does not name one
    #[serde(default = "default_fps")]
    pub default_fps: f64,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Copy each finished render to the first existing save directory
    #[serde(default = "default_true")]
    pub auto_save: bool,

    /// Save directories, tried in order (empty = Desktop locations)
    #[serde(default)]
    pub auto_save_dirs: Vec<PathBuf>,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Kill the engine after this many seconds (None = no limit)
    #[serde(default)]
    pub engine_timeout_secs: Option<u64>,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_fonts_dir() -> PathBuf {
    PathBuf::from("./fonts")
}

fn default_fps() -> f64 {
    30.0
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".logs")
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            fonts_dir: default_fonts_dir(),
            temp_dir: None,
            default_fps: default_fps(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            auto_save: true,
            auto_save_dirs: Vec::new(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            engine_timeout_secs: None,
            log_dir: default_log_dir(),
        }
    }
}

impl RenderConfig {
    /// Loads the layered configuration.
    ///
    /// `path` wins over `REELCAP_CONFIG`. Never fails: unreadable files are
    /// logged and replaced by defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.or(env_path.as_deref()) {
            Some(path) => Self::load_file(path),
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.normalize();
        config
    }

    /// Reads one JSON file; any failure yields defaults.
    pub fn load_file(path: &Path) -> Self {
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))
            .and_then(|content| {
                serde_json::from_str::<RenderConfig>(&content)
                    .map_err(|e| format!("Failed to parse config file: {}", e))
            });

        match parsed {
            Ok(mut config) => {
                config.normalize();
                config
            }
            Err(e) => {
                warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Applies `REELCAP_*` overrides read through `lookup`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(FFMPEG_ENV) {
            self.ffmpeg_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty(FFPROBE_ENV) {
            self.ffprobe_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = non_empty(FONTS_DIR_ENV) {
            self.fonts_dir = PathBuf::from(dir);
        }
        if let Some(value) = non_empty(AUTO_SAVE_ENV) {
            match parse_bool(&value) {
                Some(enabled) => self.auto_save = enabled,
                None => warn!("Ignoring {}={:?}: not a boolean", AUTO_SAVE_ENV, value),
            }
        }
    }

    /// Corrects invalid values instead of failing.
    pub fn normalize(&mut self) {
        self.crf = self.crf.min(51);

        if !X264_PRESETS.iter().any(|p| p.eq_ignore_ascii_case(&self.preset)) {
            self.preset = default_preset();
        } else {
            self.preset = self.preset.to_ascii_lowercase();
        }

        if !self.default_fps.is_finite() || self.default_fps <= 0.0 {
            self.default_fps = default_fps();
        }

        if self.video_codec.trim().is_empty() {
            self.video_codec = default_video_codec();
        }

        self.fetch_timeout_secs = self.fetch_timeout_secs.clamp(1, 600);
        if self.engine_timeout_secs == Some(0) {
            self.engine_timeout_secs = None;
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_secs.map(Duration::from_secs)
    }

    /// Fonts directory as an absolute path
    pub fn resolved_fonts_dir(&self) -> PathBuf {
        if self.fonts_dir.is_absolute() {
            return self.fonts_dir.clone();
        }
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(&self.fonts_dir),
            Err(_) => self.fonts_dir.clone(),
        }
    }

    /// Save directories to try, in order
    pub fn save_dirs(&self) -> Vec<PathBuf> {
        if self.auto_save_dirs.is_empty() {
            crate::core::render::default_save_dirs()
        } else {
            self.auto_save_dirs.clone()
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
