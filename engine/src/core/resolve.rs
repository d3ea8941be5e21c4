//! Coordinate & Style Resolver
//!
//! Pure mappings from editor-space inputs (sparse styles, block offsets,
//! overlay geometry in the 280-unit reference frame) to absolute pixel
//! values and concrete formatting on the output frame.

use crate::core::captions::{FontStyle, SizeDirective, StyleAttributes};
use crate::core::render::Overlay;
use crate::core::{Offset, PixelPoint, REFERENCE_FRAME_WIDTH};

/// Font used when no known family can be resolved
pub const DEFAULT_FONT: &str = "Arial";

/// Weights above this render bold
const BOLD_WEIGHT_THRESHOLD: f64 = 600.0;

/// Vertical anchor of the caption line, as a fraction of frame height
const CAPTION_ANCHOR_Y: f64 = 0.75;

/// Known CSS family fragments and the face name the engine loads.
///
/// Matched case-insensitively as substrings, first hit wins, so longer
/// fragments come before their prefixes.
const FONT_ALIASES: &[(&str, &str)] = &[
    ("caveat", "Caveat"),
    ("playfair", "Playfair Display"),
    ("montserrat", "Montserrat"),
    ("arial black", "Arial Black"),
    ("arial", "Arial"),
    ("helvetica", "Arial"),
    ("impact", "Impact"),
    ("georgia", "Georgia"),
    ("verdana", "Verdana"),
    ("times new roman", "Times New Roman"),
];

// =============================================================================
// Geometry
// =============================================================================

/// Caption anchor for a block: horizontally centered, three quarters down,
/// shifted by the block's offset.
pub fn resolve_position(offset: Offset, frame_w: u32, frame_h: u32) -> PixelPoint {
    let anchor_x = (frame_w / 2) as f64;
    let anchor_y = (frame_h as f64 * CAPTION_ANCHOR_Y).trunc();

    PixelPoint::new(anchor_x + offset.x, anchor_y + offset.y)
}

/// Overlay placement on the output frame, in whole pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayGeometry {
    pub x: i64,
    pub y: i64,
    /// Target width; height follows from the image aspect ratio
    pub width: i64,
}

/// Rescales an overlay from the reference frame to `frame_w`.
pub fn resolve_overlay_geometry(overlay: &Overlay, frame_w: u32) -> OverlayGeometry {
    let scale = frame_w as f64 / REFERENCE_FRAME_WIDTH;

    OverlayGeometry {
        x: (overlay.x * scale) as i64,
        y: (overlay.y * scale) as i64,
        width: (overlay.width * scale) as i64,
    }
}

// =============================================================================
// Style
// =============================================================================

/// Concrete formatting of one word
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedStyle {
    /// ASS color token
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// Engine-visible font face
    pub font: Option<String>,
    pub size: Option<SizeDirective>,
}

impl ResolvedStyle {
    /// True when the word renders as plain text with no tags
    pub fn is_plain(&self) -> bool {
        *self == ResolvedStyle::default()
    }
}

/// Merges a word's style with its block override and derives formatting.
///
/// The override wins field by field; fields it leaves unset keep the word's
/// own value.
pub fn resolve_word_style(
    smart_style: Option<&StyleAttributes>,
    block_override: Option<&StyleAttributes>,
) -> ResolvedStyle {
    let base = smart_style.cloned().unwrap_or_default();
    let merged = match block_override {
        Some(overrides) => base.merged_with(overrides),
        None => base,
    };

    ResolvedStyle {
        color: merged
            .color
            .as_deref()
            .and_then(crate::core::captions::web_color_to_subtitle_color),
        bold: merged
            .font_weight
            .as_ref()
            .and_then(|w| w.numeric())
            .is_some_and(|w| w > BOLD_WEIGHT_THRESHOLD),
        italic: merged.font_style == Some(FontStyle::Italic),
        font: merged.font_family.as_deref().map(engine_font_name),
        size: merged.font_size.as_ref().and_then(|s| s.directive()),
    }
}

/// Maps a CSS font-family list to a face the engine can load.
///
/// Families are tried in order with quotes stripped; unknown or empty lists
/// fall back to [`DEFAULT_FONT`].
pub fn engine_font_name(family: &str) -> String {
    family
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        .filter(|f| !f.is_empty())
        .find_map(|f| {
            FONT_ALIASES
                .iter()
                .find(|(fragment, _)| f.contains(fragment))
                .map(|(_, face)| (*face).to_string())
        })
        .unwrap_or_else(|| DEFAULT_FONT.to_string())
}
