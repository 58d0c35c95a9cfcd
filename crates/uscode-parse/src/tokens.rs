//! Leading-numbering tokenizer for the Format-B reconstructor's Pass 1.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([a-zA-Z0-9]+)\)[\s,]*").expect("valid regex"));

/// Result of stripping the leading numbering off a block's stripped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingTokens {
    /// Raw tokens in the order they appeared, e.g. `["p", "1"]` for
    /// `(p)(1) ...`.
    pub tokens: Vec<String>,
    /// Whatever text followed the last recognized token.
    pub remaining_text: String,
    /// True if the text opened with `[`, marking a repealed sequence.
    pub is_repealed: bool,
}

/// Parse zero or more leading `(token)` groups off the start of `text`,
/// honoring a leading `[` repealed-sequence opener.
pub fn parse_leading_tokens(text: &str) -> LeadingTokens {
    let mut cursor = text.trim_start();
    let mut is_repealed = false;
    if let Some(rest) = cursor.strip_prefix('[') {
        is_repealed = true;
        cursor = rest.trim_start();
    }

    let mut tokens = Vec::new();
    loop {
        match LEADING_TOKEN.captures(cursor) {
            Some(caps) => {
                let whole = caps.get(0).unwrap();
                tokens.push(caps[1].to_string());
                cursor = &cursor[whole.end()..];
            }
            None => break,
        }
    }

    LeadingTokens {
        tokens,
        remaining_text: cursor.trim().to_string(),
        is_repealed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token_is_parsed() {
        let out = parse_leading_tokens("(a) whoever knowingly");
        assert_eq!(out.tokens, vec!["a"]);
        assert_eq!(out.remaining_text, "whoever knowingly");
        assert!(!out.is_repealed);
    }

    #[test]
    fn combined_tokens_are_parsed_in_order() {
        let out = parse_leading_tokens("(p)(1) It shall be unlawful");
        assert_eq!(out.tokens, vec!["p", "1"]);
        assert_eq!(out.remaining_text, "It shall be unlawful");
    }

    #[test]
    fn deep_combined_tokens() {
        let out = parse_leading_tokens("(z)(3)(C)(i) text here");
        assert_eq!(out.tokens, vec!["z", "3", "C", "i"]);
        assert_eq!(out.remaining_text, "text here");
    }

    #[test]
    fn repealed_bracket_is_flagged_and_stripped() {
        let out = parse_leading_tokens("[(v), (w) Repealed. Pub. L.");
        assert!(out.is_repealed);
        assert_eq!(out.tokens, vec!["v", "w"]);
        assert_eq!(out.remaining_text, "Repealed. Pub. L.");
    }

    #[test]
    fn no_leading_token_yields_empty_token_list() {
        let out = parse_leading_tokens("continuing prose with no marker");
        assert!(out.tokens.is_empty());
        assert_eq!(out.remaining_text, "continuing prose with no marker");
    }

    #[test]
    fn comma_separated_tokens_are_split() {
        let out = parse_leading_tokens("(v), (w) Repealed");
        assert_eq!(out.tokens, vec!["v", "w"]);
    }
}
