//! Transcript Grouping
//!
//! Turns a flat word-level transcript into caption blocks: a few words per
//! block, split at natural pauses, each block kept on screen long enough to
//! read without running into the next one.

use serde::{Deserialize, Serialize};

use super::models::{CaptionBlock, TranscriptWord, WordSpan};
use crate::core::TimeSec;

/// Gap kept between a stretched block and the next spoken word
const NEXT_WORD_GAP: TimeSec = 0.05;

/// Words that carry emphasis in short-form speech
const IMPORTANT_PATTERNS: &[&str] = &[
    "success", "moment", "realize", "consistency", "never", "always", "important", "key",
    "secret", "truth", "power", "change", "life", "money", "time", "love", "hate", "fear",
    "dream", "goal", "win", "lose", "best", "worst", "first", "last", "only", "everything",
    "nothing", "believe", "think", "know", "feel", "want", "need",
];

/// Words longer than this count as important regardless of pattern
const LONG_WORD_CHARS: usize = 7;

/// Grouping parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupingOptions {
    pub max_words_per_caption: usize,
    pub min_words_per_caption: usize,
    /// Silence (seconds) that counts as a natural pause
    pub pause_threshold: TimeSec,
    /// Minimum time (seconds) a block stays on screen
    pub min_display_duration: TimeSec,
    /// Highlight candidates reported per block
    pub max_highlights: usize,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            max_words_per_caption: 5,
            min_words_per_caption: 3,
            pause_threshold: 0.3,
            min_display_duration: 1.5,
            max_highlights: 2,
        }
    }
}

/// A grouped block plus the editor-facing annotations
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedCaption {
    pub text: String,
    #[serde(flatten)]
    pub block: CaptionBlock,
    pub highlight_words: Vec<String>,
    /// Mean word confidence
    pub confidence: f64,
}

/// True if the gap after `current` exceeds `threshold`, or there is no next word.
pub fn is_natural_pause(
    current: &TranscriptWord,
    next: Option<&TranscriptWord>,
    threshold: TimeSec,
) -> bool {
    match next {
        Some(next) => next.start - current.end > threshold,
        None => true,
    }
}

/// Groups transcript words into indexed caption blocks.
pub fn group_words(words: &[TranscriptWord], options: &GroupingOptions) -> Vec<CaptionBlock> {
    let mut blocks = Vec::new();
    let mut current: Vec<&TranscriptWord> = Vec::new();

    for (i, word) in words.iter().enumerate() {
        current.push(word);

        let next = words.get(i + 1);
        let pause = is_natural_pause(word, next, options.pause_threshold);
        let full = current.len() >= options.max_words_per_caption;
        let meets_minimum = current.len() >= options.min_words_per_caption;

        if !((pause && meets_minimum) || full || next.is_none()) {
            continue;
        }

        let start = current[0].start;
        let natural_end = word.end;
        let mut end = natural_end.max(start + options.min_display_duration);

        if let Some(next) = next {
            if end > next.start {
                end = natural_end.max(next.start - NEXT_WORD_GAP);
            }
        }

        let spans = current
            .drain(..)
            .map(|w| {
                let mut span = WordSpan::new(w.word.trim(), w.start, w.end);
                span.confidence = Some(w.confidence);
                span
            })
            .collect();

        blocks.push(CaptionBlock::new(blocks.len(), start, end, spans));
    }

    blocks
}

/// Groups words and annotates each block with highlight candidates.
pub fn group_with_highlights(
    words: &[TranscriptWord],
    options: &GroupingOptions,
) -> Vec<GroupedCaption> {
    group_words(words, options)
        .into_iter()
        .map(|block| {
            let confidence = if block.words.is_empty() {
                1.0
            } else {
                block
                    .words
                    .iter()
                    .map(|w| w.confidence.unwrap_or(1.0))
                    .sum::<f64>()
                    / block.words.len() as f64
            };

            GroupedCaption {
                text: block.text(),
                highlight_words: important_words(&block.words, options.max_highlights),
                confidence,
                block,
            }
        })
        .collect()
}

/// Picks up to `max` words worth emphasizing, in spoken order.
pub fn important_words(words: &[WordSpan], max: usize) -> Vec<String> {
    words
        .iter()
        .filter(|w| {
            let lower = w.text.to_lowercase();
            IMPORTANT_PATTERNS.iter().any(|p| lower.contains(p))
                || w.text.chars().count() > LONG_WORD_CHARS
        })
        .take(max)
        .map(|w| w.text.clone())
        .collect()
}
