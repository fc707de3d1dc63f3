//! Text preparation: punctuation-based chunking and the stabilization prefix.

use crate::batch::OneOrMany;

/// Texts longer than this many characters are split before synthesis.
pub const AUTO_SPLIT_THRESHOLD: usize = 200;

/// Warm-up prefix (ellipsis + ideographic comma) prepended to every chunk
/// when stabilization is enabled. The audio it produces is trimmed afterwards.
pub const STABILIZE_PREFIX: &str = "\u{2026}\u{3001}";

fn is_sentence_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '!' | '?')
}

/// Split text at the position right after each sentence terminator.
///
/// Blank segments never stand alone: a whitespace-only tail is glued onto the
/// previous segment so that the concatenation of the result is always `text`.
fn sentence_segments(text: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    let mut start = 0;

    for piece in text.split_inclusive(is_sentence_end) {
        let end = start + piece.len();
        if piece.trim().is_empty() {
            match segments.last_mut() {
                Some(last) => {
                    let last_start = end - piece.len() - last.len();
                    *last = &text[last_start..end];
                }
                // leading blank piece: it can only be the whole remainder
                None => segments.push(&text[start..end]),
            }
        } else {
            segments.push(piece);
        }
        start = end;
    }

    segments
}

/// Split `text` into chunks of at most `max_chars` characters along sentence
/// boundaries (`。！？!?`).
///
/// Text that already fits, or that has fewer than two non-blank sentences, is
/// returned unchanged as a single chunk. A single sentence longer than
/// `max_chars` is kept whole; there is no character-level fallback.
pub fn split_long_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let segments = sentence_segments(text);
    let non_blank = segments.iter().filter(|s| !s.trim().is_empty()).count();
    if non_blank <= 1 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for seg in segments {
        let seg_len = seg.chars().count();
        if !current.is_empty() && current_len + seg_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(seg);
        current_len += seg_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Prepend [`STABILIZE_PREFIX`] to a single text or to every text of a batch.
pub fn add_stabilize_prefix(text: OneOrMany<String>) -> OneOrMany<String> {
    text.map(|t| format!("{STABILIZE_PREFIX}{t}"))
}

/// The model has no "Auto" language; it is served as Japanese.
pub fn resolve_language(language: &str) -> &str {
    if language == "Auto" {
        "Japanese"
    } else {
        language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_returned_unchanged() {
        assert_eq!(
            split_long_text("これは短い文です。", 200),
            vec!["これは短い文です。".to_string()]
        );
    }

    #[test]
    fn text_at_threshold_is_single_chunk() {
        let text = "あ".repeat(200);
        assert_eq!(split_long_text(&text, 200), vec![text]);
    }

    #[test]
    fn repeated_sentences_are_packed_under_threshold() {
        let text = "A。".repeat(150);
        let chunks = split_long_text(&text, 200);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 200);
        assert_eq!(chunks[1].chars().count(), 100);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn long_text_without_terminators_is_not_split() {
        let text = "a".repeat(500);
        assert_eq!(split_long_text(&text, 200), vec![text]);
    }

    #[test]
    fn oversized_sentence_stays_whole() {
        let long = format!("{}。", "長".repeat(250));
        let text = format!("短い。{long}終わり。");
        let chunks = split_long_text(&text, 200);

        assert_eq!(chunks, vec!["短い。".to_string(), long, "終わり。".to_string()]);
    }

    #[test]
    fn trailing_whitespace_is_preserved() {
        let text = format!("{}\n  ", "文です！".repeat(60));
        let chunks = split_long_text(&text, 200);

        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    }

    #[test]
    fn mixed_terminators_round_trip() {
        let text = "Hello! How are you? 元気です。本当に！そうですか？".repeat(20);
        for max in [1, 10, 50, 200, 1000] {
            let chunks = split_long_text(&text, max);
            assert_eq!(chunks.concat(), text, "max_chars = {max}");
        }
    }

    #[test]
    fn chunks_respect_limit_when_sentences_fit() {
        let text = "これはテスト文です。".repeat(50);
        let chunks = split_long_text(&text, 200);
        assert!(chunks.iter().all(|c| c.chars().count() <= 200));
    }

    #[test]
    fn stabilize_prefix_on_single_text() {
        let out = add_stabilize_prefix(OneOrMany::Single("こんにちは".to_string()));
        assert_eq!(out, OneOrMany::Single("…、こんにちは".to_string()));
    }

    #[test]
    fn stabilize_prefix_on_batch_keeps_order() {
        let out = add_stabilize_prefix(OneOrMany::Batch(vec!["一。".into(), "二。".into()]));
        assert_eq!(
            out,
            OneOrMany::Batch(vec!["…、一。".to_string(), "…、二。".to_string()])
        );
    }

    #[test]
    fn auto_language_maps_to_japanese() {
        assert_eq!(resolve_language("Auto"), "Japanese");
        assert_eq!(resolve_language("English"), "English");
    }
}
