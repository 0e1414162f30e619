// src/clipboard.rs

//! Text form of a token sequence, used for cut/copy/paste.
//!
//! The format is a whitespace-separated list of canonical tokens:
//!
//! ```text
//! d df 1+2 [ heat ] next "wall splat" ~ 3
//! ```
//!
//! Line breaks are written as literal newlines. Free text is double quoted
//! with `\"` and `\\` escapes. Parsing is lenient: unrecognized bare words
//! are dropped one by one, and an unterminated quote runs to the end of the
//! input.

use crate::notation::{Mark, Token};
use log::trace;

/// Converts token slices to and from clipboard text.
pub trait ClipboardCodec {
    fn serialize(&self, tokens: &[Token]) -> String;
    fn parse(&self, text: &str) -> Vec<Token>;
}

/// The default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl ClipboardCodec for TextCodec {
    fn serialize(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            match token {
                Token::Notation(Mark::LineBreak) => {
                    // Newline is its own separator.
                    if out.ends_with(' ') {
                        out.pop();
                    }
                    out.push('\n');
                    continue;
                }
                Token::Text(text) => quote_into(&mut out, text),
                other => out.push_str(&other.to_string()),
            }
            out.push(' ');
        }
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }

    fn parse(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut chars = text.chars().peekable();
        let mut word = String::new();

        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    flush_word(&mut word, &mut tokens);
                    let mut quoted = String::new();
                    while let Some(q) = chars.next() {
                        match q {
                            '\\' => {
                                if let Some(escaped) = chars.next() {
                                    quoted.push(escaped);
                                }
                            }
                            '"' => break,
                            other => quoted.push(other),
                        }
                    }
                    tokens.push(Token::Text(quoted));
                }
                '\n' => {
                    flush_word(&mut word, &mut tokens);
                    tokens.push(Token::Notation(Mark::LineBreak));
                }
                '\r' if chars.peek() == Some(&'\n') => {}
                c if c.is_whitespace() => flush_word(&mut word, &mut tokens),
                c => word.push(c),
            }
        }
        flush_word(&mut word, &mut tokens);
        tokens
    }
}

fn quote_into(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    match Token::parse_bare(word) {
        Some(token) => tokens.push(token),
        None => trace!("Dropping unrecognized clipboard token {:?}", word),
    }
    word.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::{Dir, Special};

    fn mixed() -> Vec<Token> {
        vec![
            Token::tap(Dir::D),
            Token::hold(Dir::DF),
            Token::buttons(&[1, 2]).unwrap(),
            Token::Notation(Mark::BracketOpen),
            Token::Special(Special::Heat),
            Token::Notation(Mark::BracketClose),
            Token::Notation(Mark::Next),
            Token::Text(r#"say "hi" \o/"#.to_string()),
            Token::Notation(Mark::LineBreak),
            Token::Special(Special::HeatSmash),
            Token::Notation(Mark::ParenOpen),
            Token::Notation(Mark::Tilde),
            Token::Notation(Mark::ParenClose),
            Token::tap(Dir::N),
            Token::Special(Special::Rage),
        ]
    }

    #[test]
    fn test_serialize_format() {
        let tokens = vec![
            Token::tap(Dir::F),
            Token::buttons(&[2, 1]).unwrap(),
            Token::Text("a \"b\"".into()),
            Token::Notation(Mark::LineBreak),
            Token::Notation(Mark::Next),
        ];
        assert_eq!(TextCodec.serialize(&tokens), "f 1+2 \"a \\\"b\\\"\"\nnext");
    }

    #[test]
    fn test_round_trip() {
        let tokens = mixed();
        let text = TextCodec.serialize(&tokens);
        assert_eq!(TextCodec.parse(&text), tokens);
    }

    #[test]
    fn test_unknown_words_are_dropped() {
        let parsed = TextCodec.parse("f   wavedash 1+2 5 heat");
        assert_eq!(
            parsed,
            vec![
                Token::tap(Dir::F),
                Token::buttons(&[1, 2]).unwrap(),
                Token::Special(Special::Heat)
            ]
        );
    }

    #[test]
    fn test_quoted_span_is_verbatim() {
        let parsed = TextCodec.parse("d\"two  spaces\"f");
        assert_eq!(
            parsed,
            vec![
                Token::tap(Dir::D),
                Token::Text("two  spaces".into()),
                Token::tap(Dir::F)
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let parsed = TextCodec.parse("b \"open ended");
        assert_eq!(parsed, vec![Token::tap(Dir::B), Token::Text("open ended".into())]);
    }

    #[test]
    fn test_crlf_is_one_line_break() {
        let parsed = TextCodec.parse("f\r\nb");
        assert_eq!(
            parsed,
            vec![
                Token::tap(Dir::F),
                Token::Notation(Mark::LineBreak),
                Token::tap(Dir::B)
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(TextCodec.parse("   \t ").is_empty());
        assert_eq!(TextCodec.serialize(&[]), "");
    }
}
