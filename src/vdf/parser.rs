//! Recursive-descent parser for VDF documents.

use std::iter::Peekable;
use std::str::Chars;

use super::{Map, Value};
use crate::core::SyncError;

/// Parse one complete VDF document into an ordered [`Map`].
///
/// The document is a sequence of `"key"` tokens each followed by either a
/// quoted scalar or a `{}`-delimited nested block. `//` comments run to end
/// of line; `\"`, `\\`, `\n` and `\t` escapes are honored inside quotes.
/// Duplicate keys keep the last occurrence.
///
/// # Errors
///
/// Returns [`SyncError::VdfParseError`] with a 1-based line number for
/// unterminated strings, keys without values, unmatched braces, and stray
/// characters.
pub fn parse(input: &str) -> Result<Map, SyncError> {
    let mut lexer = Lexer::new(input);
    lexer.parse_entries(false)
}

#[derive(Debug)]
enum Token {
    Str(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SyncError {
        SyncError::VdfParseError {
            line: self.line,
            reason: reason.into(),
        }
    }

    /// Advance past whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some('\n') => {
                    self.line += 1;
                    self.chars.next();
                }
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'/') {
                        while let Some(&c) = self.chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.chars.next();
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, SyncError> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };

        match c {
            '{' => {
                self.chars.next();
                Ok(Some(Token::Open))
            }
            '}' => {
                self.chars.next();
                Ok(Some(Token::Close))
            }
            '"' => {
                self.chars.next();
                self.read_string().map(|s| Some(Token::Str(s)))
            }
            other => Err(self.error(format!("unexpected character '{other}'"))),
        }
    }

    /// Read a quoted string; the opening quote is already consumed.
    fn read_string(&mut self) -> Result<String, SyncError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\n') => {
                    // Quoted tokens never span lines in tool output
                    return Err(self.error("unterminated string"));
                }
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Parse key/value pairs until end of input (top level) or a closing
    /// brace (nested).
    fn parse_entries(&mut self, nested: bool) -> Result<Map, SyncError> {
        let mut map = Map::new();
        loop {
            let key = match self.next_token()? {
                None if nested => return Err(self.error("unexpected end of input inside block")),
                None => return Ok(map),
                Some(Token::Close) if nested => return Ok(map),
                Some(Token::Close) => return Err(self.error("unmatched closing brace")),
                Some(Token::Open) => return Err(self.error("expected key, found '{'")),
                Some(Token::Str(key)) => key,
            };

            match self.next_token()? {
                Some(Token::Str(value)) => {
                    map.insert(key, Value::Str(value));
                }
                Some(Token::Open) => {
                    let nested_map = self.parse_entries(true)?;
                    map.insert(key, Value::Map(nested_map));
                }
                Some(Token::Close) | None => {
                    return Err(self.error(format!("key \"{key}\" has no value")));
                }
            }
        }
    }
}
