//! Chord sheet markup: `[...]` spans are annotations, a literal `--` marks a
//! transition. Everything else is plain chord text.

use std::sync::LazyLock;

use regex::Regex;

/// Glyph drawn at the start of every line and in place of `--`.
pub const ARROW: &str = "➔";

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]+\]|--").expect("token pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordToken {
    Text(String),
    /// Bracketed annotation, brackets included.
    Annotation(String),
    Transition,
}

/// Split a chord sheet into tokens, preserving the text between them.
pub fn tokenize(chords: &str) -> Vec<ChordToken> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for found in TOKEN_PATTERN.find_iter(chords) {
        if found.start() > last {
            tokens.push(ChordToken::Text(chords[last..found.start()].to_string()));
        }
        if found.as_str() == "--" {
            tokens.push(ChordToken::Transition);
        } else {
            tokens.push(ChordToken::Annotation(found.as_str().to_string()));
        }
        last = found.end();
    }

    if last < chords.len() {
        tokens.push(ChordToken::Text(chords[last..].to_string()));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_annotations_and_transitions() {
        let tokens = tokenize("Am7 D7 [2x] -- G7M");
        assert_eq!(
            tokens,
            [
                ChordToken::Text("Am7 D7 ".to_string()),
                ChordToken::Annotation("[2x]".to_string()),
                ChordToken::Text(" ".to_string()),
                ChordToken::Transition,
                ChordToken::Text(" G7M".to_string()),
            ]
        );
    }

    #[test]
    fn empty_brackets_are_plain_text() {
        assert_eq!(tokenize("C [] G"), [ChordToken::Text("C [] G".to_string())]);
    }

    #[test]
    fn plain_text_is_a_single_token() {
        assert_eq!(tokenize("C G Am F"), [ChordToken::Text("C G Am F".to_string())]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn adjacent_tokens_have_no_filler() {
        assert_eq!(
            tokenize("[intro]--"),
            [
                ChordToken::Annotation("[intro]".to_string()),
                ChordToken::Transition
            ]
        );
    }
}
