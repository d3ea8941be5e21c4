//! Color and Time Codec
//!
//! Pure conversions into the units ASS understands: `H:MM:SS.CC`
//! timestamps and `&HAABBGGRR&` color tokens.

use std::fmt;

use crate::core::TimeSec;

// =============================================================================
// Time
// =============================================================================

/// Formats seconds as an ASS timestamp (`H:MM:SS.CC`).
///
/// Works on whole centiseconds (rounded), so the result is monotone in `t`
/// and never prints `60.00` seconds. Negative input is a caller error; it is
/// clamped to zero.
pub fn seconds_to_subtitle_time(t: TimeSec) -> String {
    let total_cs = (t.max(0.0) * 100.0).round() as u64;

    let hours = total_cs / 360_000;
    let minutes = (total_cs / 6_000) % 60;
    let seconds = (total_cs / 100) % 60;
    let centis = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}

/// Parses an ASS timestamp back into seconds.
pub fn parse_subtitle_time(s: &str) -> Option<TimeSec> {
    let mut parts = s.trim().splitn(3, ':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;

    if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

// =============================================================================
// Color
// =============================================================================

/// Color in ASS channel order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssColor {
    /// Alpha, 0 = opaque
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AssColor {
    pub const WHITE: AssColor = AssColor::opaque(0xFF, 0xFF, 0xFF);
    pub const BLACK: AssColor = AssColor::opaque(0, 0, 0);
    /// Secondary (karaoke) color of the default style
    pub const RED: AssColor = AssColor::opaque(0xFF, 0, 0);
    /// Half-transparent black used behind the text
    pub const SHADOW: AssColor = AssColor {
        a: 0x80,
        r: 0,
        g: 0,
        b: 0,
    };

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { a: 0, r, g, b }
    }

    /// Parses `#RRGGBB` (the `#` is optional). Anything else yields `None`.
    pub fn from_web_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::opaque(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for AssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "&H{:02X}{:02X}{:02X}{:02X}&",
            self.a, self.b, self.g, self.r
        )
    }
}

/// Converts a web hex color into an ASS color token.
///
/// Malformed input returns `None`; the caller emits no color tag.
pub fn web_color_to_subtitle_color(hex: &str) -> Option<String> {
    AssColor::from_web_hex(hex).map(|c| c.to_string())
}
