//! ASS Subtitle Document Compiler
//!
//! Compiles caption blocks into an Advanced SubStation Alpha document.
//!
//! The document is built as a typed IR first ([`SubtitleDocument`]) and
//! turned into text only by its `Display` impl, so tag syntax and escaping
//! live in one place.
//!
//! # Layout
//!
//! ```text
//! [Script Info]          PlayResX/PlayResY = source video size
//! [v4+ Styles]           one `Default` style
//! [Events]               one Dialogue line per caption block, in order
//! ```

use std::collections::HashMap;
use std::fmt;

use super::codec::{seconds_to_subtitle_time, AssColor};
use super::models::{CaptionBlock, SizeDirective, StyleAttributes};
use crate::core::resolve::{
    engine_font_name, resolve_position, resolve_word_style, ResolvedStyle, DEFAULT_FONT,
};
use crate::core::{BlockKey, Offset, PixelPoint, TimeSec, VideoInfo};

/// Font size of the default style
const DEFAULT_FONT_SIZE: u32 = 80;

/// Number of dialogue lines echoed to the debug log
const PREVIEW_LINES: usize = 5;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

// =============================================================================
// Document IR
// =============================================================================

/// `[Script Info]` section
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptInfo {
    pub play_res_x: u32,
    pub play_res_y: u32,
}

/// One line of the `[v4+ Styles]` section
#[derive(Clone, Debug, PartialEq)]
pub struct StyleDefinition {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    pub primary: AssColor,
    pub secondary: AssColor,
    pub outline: AssColor,
    pub back: AssColor,
    pub bold: bool,
    pub italic: bool,
    pub border_style: u8,
    pub outline_width: u32,
    pub shadow: u32,
    /// Numpad alignment; 2 = bottom center
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl StyleDefinition {
    /// White bold text with a black outline over a half-transparent box.
    pub fn default_style(font_name: impl Into<String>) -> Self {
        Self {
            name: "Default".to_string(),
            font_name: font_name.into(),
            font_size: DEFAULT_FONT_SIZE,
            primary: AssColor::WHITE,
            secondary: AssColor::RED,
            outline: AssColor::BLACK,
            back: AssColor::SHADOW,
            bold: true,
            italic: false,
            border_style: 1,
            outline_width: 3,
            shadow: 0,
            alignment: 2,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
        }
    }
}

/// A word and the formatting it is wrapped in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub style: ResolvedStyle,
}

/// One `Dialogue:` line
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueEvent {
    pub layer: u32,
    pub start: TimeSec,
    pub end: TimeSec,
    pub style: String,
    pub position: PixelPoint,
    pub runs: Vec<TextRun>,
}

/// A complete ASS document
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleDocument {
    pub info: ScriptInfo,
    pub style: StyleDefinition,
    pub events: Vec<DialogueEvent>,
}

impl SubtitleDocument {
    /// Header sections up to and including the `[Events]` format line
    pub fn header(&self) -> String {
        format!(
            "{}\n{}\n[Events]\n{}\n",
            self.info, self.style, EVENT_FORMAT
        )
    }
}

// =============================================================================
// Serializer
// =============================================================================

fn flag(value: bool) -> i8 {
    if value {
        -1
    } else {
        0
    }
}

/// Neutralizes characters that would open override blocks or form escape
/// sequences (`\n`, `\h`) inside word text.
fn escape_text(text: &str) -> String {
    text.replace('\\', "\u{FF3C}")
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}

impl fmt::Display for ScriptInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Script Info]")?;
        writeln!(f, "ScriptType: v4.00+")?;
        writeln!(f, "PlayResX: {}", self.play_res_x)?;
        writeln!(f, "PlayResY: {}", self.play_res_y)
    }
}

impl fmt::Display for StyleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[v4+ Styles]")?;
        writeln!(f, "{}", STYLE_FORMAT)?;
        writeln!(
            f,
            "Style: {},{},{},{},{},{},{},{},{},0,0,100,100,0,0,{},{},{},{},{},{},{},1",
            self.name,
            self.font_name,
            self.font_size,
            self.primary,
            self.secondary,
            self.outline,
            self.back,
            flag(self.bold),
            flag(self.italic),
            self.border_style,
            self.outline_width,
            self.shadow,
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
        )
    }
}

impl fmt::Display for TextRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = escape_text(&self.text);
        if self.style.is_plain() {
            return f.write_str(&text);
        }

        f.write_str("{")?;
        if let Some(color) = &self.style.color {
            write!(f, "\\c{}", color)?;
        }
        if self.style.bold {
            f.write_str("\\b1")?;
        }
        if self.style.italic {
            f.write_str("\\i1")?;
        }
        if let Some(font) = &self.style.font {
            write!(f, "\\fn{}", font)?;
        }
        match self.style.size {
            Some(SizeDirective::Absolute(size)) => write!(f, "\\fs{}", size)?,
            Some(SizeDirective::ScalePercent(pct)) => write!(f, "\\fscx{pct}\\fscy{pct}")?,
            None => {}
        }
        write!(f, "}}{}{{\\r}}", text)
    }
}

impl fmt::Display for DialogueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dialogue: {},{},{},{},,0,0,0,,{{\\pos({})}}",
            self.layer,
            seconds_to_subtitle_time(self.start),
            seconds_to_subtitle_time(self.end),
            self.style,
            self.position,
        )?;

        // Empty runs at either end leave no padding.
        let text = self
            .runs
            .iter()
            .map(|run| run.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(text.trim())
    }
}

impl fmt::Display for SubtitleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())?;
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        Ok(())
    }
}

// =============================================================================
// Compiler
// =============================================================================

/// Compiles caption blocks into a subtitle document for a `video`-sized frame.
///
/// Emits exactly one dialogue event per block, in block order. Each word is
/// styled with its own `smartStyle` merged under the block's override.
pub fn compile_subtitle_document(
    captions: &[CaptionBlock],
    global_style: &StyleAttributes,
    offsets: &HashMap<BlockKey, Offset>,
    overrides: &HashMap<BlockKey, StyleAttributes>,
    video: &VideoInfo,
) -> SubtitleDocument {
    let font_name = global_style
        .font_family
        .as_deref()
        .map(engine_font_name)
        .unwrap_or_else(|| DEFAULT_FONT.to_string());

    let events = captions
        .iter()
        .map(|block| {
            let key = block.key();
            let offset = offsets.get(&key).copied().unwrap_or_default();
            let block_override = overrides.get(&key);

            let runs = block
                .words
                .iter()
                .map(|word| TextRun {
                    text: word.text.trim().to_string(),
                    style: resolve_word_style(word.smart_style.as_ref(), block_override),
                })
                .collect();

            DialogueEvent {
                layer: 0,
                start: block.start,
                end: block.end,
                style: "Default".to_string(),
                position: resolve_position(offset, video.width, video.height),
                runs,
            }
        })
        .collect();

    let document = SubtitleDocument {
        info: ScriptInfo {
            play_res_x: video.width,
            play_res_y: video.height,
        },
        style: StyleDefinition::default_style(font_name),
        events,
    };

    tracing::debug!("ASS header generated:\n{}", document.header());
    let preview: Vec<String> = document
        .events
        .iter()
        .take(PREVIEW_LINES)
        .map(|e| e.to_string())
        .collect();
    tracing::debug!("First ASS lines:\n{}", preview.join("\n"));

    document
}
