//! Caption System Module
//!
//! Everything between a word-level transcript and a finished `.ass` file:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Blocks, word spans, sparse style attributes    │
//! │  grouping.rs   - Transcript words → caption blocks              │
//! │  codec.rs      - ASS timestamps and color tokens                │
//! │  ass.rs        - Subtitle document IR, compiler and serializer  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::captions::{compile_subtitle_document, group_words, GroupingOptions};
//!
//! let blocks = group_words(&transcript, &GroupingOptions::default());
//! let doc = compile_subtitle_document(&blocks, &style, &offsets, &overrides, &video);
//! std::fs::write("captions.ass", doc.to_string())?;
//! ```

mod ass;
mod codec;
mod grouping;
mod models;

pub use ass::{
    compile_subtitle_document, DialogueEvent, ScriptInfo, StyleDefinition, SubtitleDocument,
    TextRun,
};
pub use codec::{
    parse_subtitle_time, seconds_to_subtitle_time, web_color_to_subtitle_color, AssColor,
};
pub use grouping::{
    group_with_highlights, group_words, important_words, is_natural_pause, GroupedCaption,
    GroupingOptions,
};
pub use models::{
    normalize_captions, CaptionBlock, CaptionPayload, FontSize, FontStyle, FontWeight,
    SizeDirective, StyleAttributes, TranscriptWord, WordSpan,
};
