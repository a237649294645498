//! Query lexer.
//!
//! Splits a raw query string into phrase and word tokens. The lexer never
//! fails: an unclosed quote simply stops being a phrase and is read as part
//! of an ordinary word, so malformed input degrades to literal text.

/// A raw token in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    /// A quoted phrase (quotes stripped, inner content preserved).
    Phrase(String),
    /// A bare word, including any prefix syntax (`#tag`, `-word`,
    /// `key:value`, `heading:(a b)`).
    Word(String),
}

/// Splits the input into raw tokens.
pub fn tokenize(input: &str) -> Vec<RawToken> {
    Lexer {
        chars: input.chars().collect(),
        pos: 0,
    }
    .run()
}

/// Index-based scanner over the input characters.
///
/// Indexing (rather than a consuming iterator) lets the lexer look ahead
/// for closing delimiters and fall back to word reading when they are
/// missing.
struct Lexer {
    /// The input as characters.
    chars: Vec<char>,
    /// Current position.
    pos: usize,
}

impl Lexer {
    /// Tokenizes the entire input.
    fn run(mut self) -> Vec<RawToken> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(&ch) = self.chars.get(self.pos) else {
                break;
            };

            if ch == '"' {
                if let Some(content) = self.try_read_phrase() {
                    tokens.push(RawToken::Phrase(content));
                    continue;
                }
            }

            tokens.push(RawToken::Word(self.read_word()));
        }

        tokens
    }

    /// Skips over whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Attempts to read a quoted phrase starting at the current `"`.
    ///
    /// Returns `None` without consuming anything when there is no closing
    /// quote; the caller then reads the `"` as part of a word.
    fn try_read_phrase(&mut self) -> Option<String> {
        let close = self.find_from(self.pos + 1, '"')?;
        let content: String = self.chars[self.pos + 1..close].iter().collect();
        self.pos = close + 1;
        Some(content)
    }

    /// Reads a word up to the next whitespace or quote.
    ///
    /// A quote at the start of the word (an unclosed phrase the caller fell
    /// back from) is consumed as literal text so the lexer always makes
    /// progress. When a `(` immediately follows a `:` (as in
    /// `heading:(term term)`) and a closing `)` exists, the group is
    /// captured into the word, whitespace included.
    fn read_word(&mut self) -> String {
        let mut word = String::new();

        while let Some(&ch) = self.chars.get(self.pos) {
            if ch.is_whitespace() || (ch == '"' && !word.is_empty()) {
                break;
            }

            word.push(ch);
            self.pos += 1;

            if ch == '(' && word.len() >= 2 && word.chars().rev().nth(1) == Some(':') {
                if let Some(close) = self.find_from(self.pos, ')') {
                    let group: String = self.chars[self.pos..=close].iter().collect();
                    word.push_str(&group);
                    self.pos = close + 1;
                }
            }
        }

        word
    }

    /// Finds the next occurrence of `needle` at or after `start`.
    fn find_from(&self, start: usize, needle: char) -> Option<usize> {
        self.chars[start.min(self.chars.len())..]
            .iter()
            .position(|&c| c == needle)
            .map(|offset| start + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> RawToken {
        RawToken::Word(s.into())
    }

    fn phrase(s: &str) -> RawToken {
        RawToken::Phrase(s.into())
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }

    #[test]
    fn bare_words() {
        assert_eq!(
            tokenize("quarterly planning"),
            vec![word("quarterly"), word("planning")]
        );
    }

    #[test]
    fn quoted_phrase() {
        assert_eq!(
            tokenize("\"error handling\" rust"),
            vec![phrase("error handling"), word("rust")]
        );
    }

    #[test]
    fn unclosed_quote_degrades_to_word() {
        assert_eq!(tokenize("\"unclosed rest"), vec![word("\"unclosed"), word("rest")]);
    }

    #[test]
    fn empty_phrase() {
        assert_eq!(tokenize("\"\""), vec![phrase("")]);
    }

    #[test]
    fn prefix_tokens_stay_whole() {
        assert_eq!(
            tokenize("path:work/projects created:>2024-01-01 -#old"),
            vec![
                word("path:work/projects"),
                word("created:>2024-01-01"),
                word("-#old")
            ]
        );
    }

    #[test]
    fn grouped_filter_captures_whitespace() {
        assert_eq!(
            tokenize("heading:(setup guide) rust"),
            vec![word("heading:(setup guide)"), word("rust")]
        );
    }

    #[test]
    fn unclosed_group_reads_as_plain_word() {
        assert_eq!(
            tokenize("heading:(setup guide"),
            vec![word("heading:(setup"), word("guide")]
        );
    }

    #[test]
    fn quote_starts_new_token_inside_word() {
        assert_eq!(
            tokenize("tag:\"quoted\""),
            vec![word("tag:"), phrase("quoted")]
        );
    }
}
