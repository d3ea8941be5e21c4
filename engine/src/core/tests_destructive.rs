//! Destructive and Edge Case Tests for Core Models
//!
//! These tests verify the robustness of the compilers against hostile or
//! malformed editor payloads: bad colors, override-block injection through
//! word text, quoting tricks in paths, and nonsense sizes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::captions::{
    compile_subtitle_document, seconds_to_subtitle_time, web_color_to_subtitle_color,
    CaptionBlock, FontSize, StyleAttributes, WordSpan,
};
use crate::core::render::{compile_filter_graph, escape_filter_path, Overlay, PlacedOverlay};
use crate::core::resolve::{resolve_overlay_geometry, resolve_position, resolve_word_style};
use crate::core::{Offset, VideoInfo};

fn styled(color: &str) -> StyleAttributes {
    StyleAttributes {
        color: Some(color.to_string()),
        ..Default::default()
    }
}

#[test]
fn test_destructive_color_parsing() {
    assert_eq!(web_color_to_subtitle_color("invalid"), None);
    assert_eq!(web_color_to_subtitle_color("#12345"), None);
    assert_eq!(web_color_to_subtitle_color(""), None);
    assert_eq!(web_color_to_subtitle_color("#GGGGGG"), None);
    assert_eq!(web_color_to_subtitle_color("#ＦＦ0000"), None);

    // Malformed colors drop the tag instead of emitting garbage.
    let style = resolve_word_style(Some(&styled("rgb(1,2,3)")), None);
    assert_eq!(style.color, None);
    assert!(style.is_plain());
}

#[test]
fn test_destructive_override_injection_in_word_text() {
    let block = CaptionBlock::new(
        0,
        0.0,
        1.0,
        vec![WordSpan::new(r"{\pos(0,0)\c&H0000FF&}pwned", 0.0, 1.0)],
    );
    let doc = compile_subtitle_document(
        &[block],
        &StyleAttributes::default(),
        &HashMap::new(),
        &HashMap::new(),
        &VideoInfo::fallback(),
    );

    let line = doc.to_string();
    let dialogue = line
        .lines()
        .find(|l| l.starts_with("Dialogue:"))
        .unwrap();
    // Only the compiler's own positioning block may open an override.
    assert_eq!(dialogue.matches('{').count(), 1);
    assert!(dialogue.contains("pwned"));
}

#[test]
fn test_destructive_newlines_do_not_break_event_lines() {
    let block = CaptionBlock::new(0, 0.0, 1.0, vec![WordSpan::new("two\nlines", 0.0, 1.0)]);
    let doc = compile_subtitle_document(
        &[block],
        &StyleAttributes::default(),
        &HashMap::new(),
        &HashMap::new(),
        &VideoInfo::fallback(),
    );

    let text = doc.to_string();
    assert_eq!(text.lines().filter(|l| l.starts_with("Dialogue:")).count(), 1);
    assert!(text.contains(r"two\Nlines"));
}

#[test]
fn test_destructive_negative_offsets() {
    let point = resolve_position(Offset::new(-5000.0, -5000.0), 1080, 1920);
    assert_eq!(point.x, 540.0 - 5000.0);
    assert_eq!(point.y, 1440.0 - 5000.0);

    // Off-frame is allowed; the engine clips.
    let overlay = Overlay {
        src: Some("https://cdn/x.png".into()),
        x: -100.0,
        y: -100.0,
        width: 0.0,
    };
    let geometry = resolve_overlay_geometry(&overlay, 1080);
    assert!(geometry.x < 0);
    assert_eq!(geometry.width, 0);
}

#[test]
fn test_destructive_empty_captions() {
    let doc = compile_subtitle_document(
        &[],
        &StyleAttributes::default(),
        &HashMap::new(),
        &HashMap::new(),
        &VideoInfo::new(720, 1280, 0.0),
    );
    assert!(doc.events.is_empty());
    assert!(doc.to_string().contains("PlayResX: 720"));

    let empty_block = CaptionBlock::new(0, 0.0, 1.0, Vec::new());
    let doc = compile_subtitle_document(
        &[empty_block],
        &StyleAttributes::default(),
        &HashMap::new(),
        &HashMap::new(),
        &VideoInfo::fallback(),
    );
    assert_eq!(doc.events.len(), 1);
}

#[test]
fn test_destructive_hostile_timestamps() {
    assert_eq!(seconds_to_subtitle_time(-3.0), "0:00:00.00");
    assert_eq!(seconds_to_subtitle_time(f64::NAN), "0:00:00.00");
    assert_eq!(seconds_to_subtitle_time(59.999), "0:01:00.00");
}

#[test]
fn test_destructive_quote_and_colon_in_paths() {
    let escaped = escape_filter_path(Path::new("/tmp/it's:here/captions.ass"));
    assert_eq!(escaped, r"/tmp/it'\\\''s\:here/captions.ass");

    let graph = compile_filter_graph(
        &[],
        1080,
        Path::new("C:\\work\\captions.ass"),
        Path::new("/srv/o'fonts"),
    );
    assert_eq!(
        graph.to_string(),
        r"subtitles='C\:/work/captions.ass:fontsdir=/srv/o'\\\''fonts'"
    );
}

#[test]
fn test_destructive_overlay_path_with_brackets() {
    let placed = PlacedOverlay {
        image: PathBuf::from("/tmp/[v9]/overlay_0.png"),
        overlay: Overlay {
            src: Some("https://cdn/x.png".into()),
            x: 0.0,
            y: 0.0,
            width: 300.0,
        },
    };
    let graph = compile_filter_graph(&[placed], 1080, Path::new("/tmp/a.ass"), Path::new("/f"));

    // Images are engine inputs, never spliced into the graph text.
    assert!(!graph.to_string().contains("[v9]"));
    assert_eq!(graph.inputs().len(), 1);
}

#[test]
fn test_destructive_garbage_font_sizes() {
    assert_eq!(FontSize::Points(f64::NAN).directive(), None);
    assert_eq!(FontSize::Points(f64::INFINITY).directive(), None);
    assert_eq!(FontSize::Text("huge".into()).directive(), None);
    assert_eq!(FontSize::Text("em".into()).directive(), None);
    assert_eq!(FontSize::Text("-12".into()).directive(), None);
    assert_eq!(FontSize::Text(String::new()).directive(), None);

    let style = StyleAttributes {
        font_size: Some(FontSize::Text("12px".into())),
        ..Default::default()
    };
    assert_eq!(resolve_word_style(Some(&style), None).size, None);
}

#[test]
fn test_destructive_backslash_sequences_in_word_text() {
    let block = CaptionBlock::new(
        0,
        0.0,
        1.0,
        vec![
            WordSpan::new(r"AC\DC", 0.0, 0.5),
            WordSpan::new(r"50\n50\h", 0.5, 1.0),
        ],
    );
    let doc = compile_subtitle_document(
        &[block],
        &StyleAttributes::default(),
        &HashMap::new(),
        &HashMap::new(),
        &VideoInfo::fallback(),
    );

    let text = doc.to_string();
    let dialogue = text
        .lines()
        .find(|l| l.starts_with("Dialogue:"))
        .unwrap();
    // The only backslash left is the compiler's own `\pos`.
    assert_eq!(dialogue.matches('\\').count(), 1);
    assert!(dialogue.ends_with("AC\u{FF3C}DC 50\u{FF3C}n50\u{FF3C}h"));
}
