//! Splits a track body into fragments small enough for the synthesis adapter.
//!
//! Lengths are counted in Unicode scalar values (`char`s). Within the limit a cut
//! lands after sentence punctuation when possible, otherwise after whitespace,
//! otherwise at the last grapheme-cluster boundary that still fits. Concatenating
//! the fragments in order always reproduces the input exactly.

use unicode_segmentation::UnicodeSegmentation;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '…', ';', ':', '。', '！', '？'];

/// Split `text` into ordered fragments of at most `max_len` characters.
///
/// An empty `text` yields a single empty fragment so that an empty track still
/// occupies one playback slot. A `max_len` of zero is treated as one.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if text.is_empty() {
        return vec![String::new()];
    }
    if text.chars().count() <= max_len {
        return vec![text.to_owned()];
    }

    let mut fragments = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let cut = cut_point(rest, max_len);
        let (head, tail) = rest.split_at(cut);
        fragments.push(head.to_owned());
        rest = tail;
    }
    fragments
}

/// A candidate cut: byte offset and the number of chars before it.
#[derive(Clone, Copy)]
struct Boundary {
    byte: usize,
    chars: usize,
}

fn cut_point(text: &str, max_len: usize) -> usize {
    let mut consumed = 0;
    let mut limit: Option<Boundary> = None;
    let mut sentence: Option<Boundary> = None;
    let mut space: Option<Boundary> = None;
    let mut after_terminator = false;

    for (start, slice) in text.grapheme_indices(true) {
        let width = slice.chars().count();
        if consumed + width > max_len {
            break;
        }
        consumed += width;
        let here = Boundary {
            byte: start + slice.len(),
            chars: consumed,
        };
        limit = Some(here);

        let first = slice.chars().next().unwrap_or_default();
        if first.is_whitespace() {
            if after_terminator || first == '\n' || slice == "\r\n" {
                sentence = Some(here);
            }
            space = Some(here);
        } else if matches!(first, '。' | '！' | '？') {
            sentence = Some(here);
        }
        after_terminator = SENTENCE_TERMINATORS.contains(&first);
    }

    let Some(limit) = limit else {
        // A single grapheme is wider than the limit; fall back to char boundaries.
        return text
            .char_indices()
            .nth(max_len)
            .map_or(text.len(), |(idx, _)| idx);
    };
    if limit.byte == text.len() {
        return limit.byte;
    }

    // Tiny fragments cost an extra round-trip through the adapter each.
    let worthwhile = |boundary: &Boundary| boundary.chars * 4 >= max_len;
    sentence
        .filter(worthwhile)
        .or_else(|| space.filter(worthwhile))
        .unwrap_or(limit)
        .byte
}
