//! Word- and sentence-granularity tokenization for inline diffing.
//!
//! Unlike a full lexer, this has no notion of defined terms, numbers, or
//! punctuation classes — the hierarchical diff engine only ever needs to
//! split text into comparable spans at one of two granularities.

/// Requested splitting granularity for an inline diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Word,
    Sentence,
}

/// Split `text` into tokens at the requested granularity.
///
/// `Word` splits on whitespace. `Sentence` splits on sentence-terminating
/// punctuation (`.`, `!`, `?`) followed by whitespace or end-of-input,
/// keeping the terminator attached to the sentence that precedes it.
pub fn tokenize(text: &str, granularity: Granularity) -> Vec<String> {
    match granularity {
        Granularity::Word => tokenize_words(text),
        Granularity::Sentence => tokenize_sentences(text),
    }
}

fn tokenize_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn tokenize_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let next_is_boundary = chars.get(i + 1).map(|n| n.is_whitespace()).unwrap_or(true);
            if next_is_boundary {
                let trimmed = current.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
                current.clear();
            }
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    out
}
