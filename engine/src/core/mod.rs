//! Reelcap Core Engine
//!
//! Caption models, the subtitle and filter-graph compilers, and the render
//! orchestrator with its FFmpeg collaborators.

pub mod captions;
pub mod ffmpeg;
pub mod process;
pub mod render;
pub mod resolve;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_destructive;
