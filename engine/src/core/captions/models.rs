//! Caption Data Models
//!
//! Defines the request-side caption structures: blocks, word spans and the
//! sparse style attributes the editor attaches to them.
//!
//! # Overview
//!
//! - Every style field is optional; an unset field inherits.
//! - Merging is field-wise: a set field on the winning side replaces only
//!   that field.
//! - Blocks are addressed by their ordinal as a string key (`"0"`, `"1"`, ...)
//!   in the offset and override maps.

use serde::{Deserialize, Serialize};

use crate::core::{BlockKey, TimeSec};

// =============================================================================
// Style Attributes
// =============================================================================

/// Font size as sent by the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSize {
    /// Absolute size (`48`)
    Points(f64),
    /// Textual size: `"1.5em"` (relative) or `"48"` (absolute)
    Text(String),
}

/// How a resolved font size is expressed in the subtitle document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeDirective {
    /// `\fsN`
    Absolute(i64),
    /// `\fscxN\fscyN`, N in percent
    ScalePercent(i64),
}

impl FontSize {
    /// Interprets the size; unparsable text yields `None`.
    pub fn directive(&self) -> Option<SizeDirective> {
        match self {
            Self::Points(points) if points.is_finite() => {
                Some(SizeDirective::Absolute(*points as i64))
            }
            Self::Points(_) => None,
            Self::Text(text) => {
                let text = text.trim();
                if text.contains("em") {
                    let factor: f64 = text.replace("em", "").trim().parse().ok()?;
                    Some(SizeDirective::ScalePercent((factor * 100.0) as i64))
                } else if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                    text.parse().ok().map(SizeDirective::Absolute)
                } else {
                    None
                }
            }
        }
    }
}

/// Font weight; CSS sends numbers, hand-written payloads sometimes strings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(f64),
    Text(String),
}

impl FontWeight {
    /// Numeric weight if one can be read (`700`, `"700"`); `"bold"` is not.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(weight) => Some(*weight),
            Self::Text(text) => {
                let text = text.trim();
                if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                    text.parse().ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Font style
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Normal,
    Italic,
    /// Anything else the editor sends ("oblique", ...); rendered upright
    #[serde(other)]
    Other,
}

/// Sparse style attributes; `None` means inherit
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAttributes {
    /// Web color, `#RRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// CSS font-family list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
}

/// Field-wise combinator: the top value wins when set.
fn override_field<T: Clone>(base: &Option<T>, top: &Option<T>) -> Option<T> {
    top.as_ref().or(base.as_ref()).cloned()
}

impl StyleAttributes {
    /// Returns `self` with every field that `overrides` sets replaced.
    ///
    /// Fields `overrides` leaves unset keep their value from `self`.
    pub fn merged_with(&self, overrides: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            color: override_field(&self.color, &overrides.color),
            font_family: override_field(&self.font_family, &overrides.font_family),
            font_size: override_field(&self.font_size, &overrides.font_size),
            font_weight: override_field(&self.font_weight, &overrides.font_weight),
            font_style: override_field(&self.font_style, &overrides.font_style),
        }
    }
}

// =============================================================================
// Words and Blocks
// =============================================================================

/// A single word with its own timing and optional style
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSpan {
    #[serde(rename = "word", alias = "text")]
    pub text: String,
    pub start: TimeSec,
    pub end: TimeSec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_style: Option<StyleAttributes>,
}

impl WordSpan {
    pub fn new(text: impl Into<String>, start: TimeSec, end: TimeSec) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            confidence: None,
            smart_style: None,
        }
    }

    pub fn with_style(mut self, style: StyleAttributes) -> Self {
        self.smart_style = Some(style);
        self
    }
}

/// One caption block as it arrives on the wire.
///
/// Older clients send a single `text` per block and no `words`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionPayload {
    #[serde(default)]
    pub text: Option<String>,
    pub start: TimeSec,
    pub end: TimeSec,
    #[serde(default)]
    pub words: Vec<WordSpan>,
}

/// One visual caption unit covering one time interval
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionBlock {
    /// Ordinal; its string form keys the offset/override maps
    pub index: usize,
    pub start: TimeSec,
    pub end: TimeSec,
    /// Left-to-right render order
    pub words: Vec<WordSpan>,
}

impl CaptionBlock {
    pub fn new(index: usize, start: TimeSec, end: TimeSec, words: Vec<WordSpan>) -> Self {
        Self {
            index,
            start,
            end,
            words,
        }
    }

    /// Builds a block from its wire form; a legacy text-only block becomes
    /// one word spanning the whole block.
    pub fn from_payload(index: usize, payload: CaptionPayload) -> Self {
        let CaptionPayload {
            text,
            start,
            end,
            words,
        } = payload;

        let words = match (words.is_empty(), text) {
            (true, Some(text)) => vec![WordSpan::new(text, start, end)],
            (_, _) => words,
        };

        Self::new(index, start, end, words)
    }

    /// Key into the offset/override maps
    pub fn key(&self) -> BlockKey {
        self.index.to_string()
    }

    /// Plain text of the block, words joined by single spaces
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Normalizes the wire list into indexed blocks, preserving order.
pub fn normalize_captions(payloads: Vec<CaptionPayload>) -> Vec<CaptionBlock> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(index, payload)| CaptionBlock::from_payload(index, payload))
        .collect()
}

/// A word as produced by the transcription collaborator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptWord {
    #[serde(alias = "text")]
    pub word: String,
    pub start: TimeSec,
    pub end: TimeSec,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}
