//! Reelcap Core Library
//!
//! Render backend for short-form video captioning. Compiles per-word styled
//! captions into an ASS subtitle document, compiles image overlays into an
//! FFmpeg filter graph, and drives FFmpeg to burn both into the video.
//!
//! ## Layout
//!
//! - [`core`]: caption models, subtitle/filter-graph compilers, the render
//!   orchestrator and its FFmpeg collaborators
//! - [`api`]: form decoding and response shaping for the render endpoint

pub mod api;
pub mod core;

use std::path::Path;
use std::sync::OnceLock;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// Logs go to stderr and, when `log_dir` is given, to a daily rolling
/// `reelcap.log` in that directory. `RUST_LOG` refines the filter; the
/// floor is `default_level`. Calling this twice is harmless.
pub fn init_logging(log_dir: Option<&Path>, default_level: tracing::Level) {
    use tracing_subscriber::prelude::*;

    let env_filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    // Best effort: a log dir we cannot create just means no file layer.
    let file_layer = log_dir
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .map(|dir| {
            let file_appender = tracing_appender::rolling::daily(dir, "reelcap.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);

            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
        });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, repeated CLI setup).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
