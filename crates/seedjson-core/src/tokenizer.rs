//! Tokenizer: turns a character stream into a lazy, finite sequence of tokens.
//!
//! Whitespace between tokens is skipped. String literals are unescaped
//! (including `\uXXXX` surrogate pairs), numeric literals are validated against
//! the JSON number grammar and decoded as `f64`, and `true`/`false`/`null` are
//! recognized as literals. The final token is always [`Token::EndOfInput`];
//! after it, or after the first error, the iterator yields `None`.

use std::iter::Peekable;

use crate::error::{Result, SeedError};
use crate::token::{Scalar, Spanned, Token};

/// Pull-based lexer over any character iterator.
pub struct Tokenizer<I: Iterator<Item = char>> {
    chars: Peekable<I>,
    line: usize,
    column: usize,
    finished: bool,
}

impl<I: Iterator<Item = char>> Tokenizer<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.peekable(),
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Position of the next unread character.
    pub fn location(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Read the next token. Once the input is exhausted this keeps returning
    /// `EndOfInput`.
    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace();
        let (line, column) = self.location();
        let token = match self.chars.peek().copied() {
            None => Token::EndOfInput,
            Some(c) => match c {
                '{' => self.punctuation(Token::BeginObject),
                '}' => self.punctuation(Token::EndObject),
                '[' => self.punctuation(Token::BeginArray),
                ']' => self.punctuation(Token::EndArray),
                ',' => self.punctuation(Token::Comma),
                ':' => self.punctuation(Token::Colon),
                '"' => Token::Scalar(Scalar::String(self.lex_string()?)),
                '-' | '0'..='9' => Token::Scalar(Scalar::Number(self.lex_number()?)),
                't' => self.lex_literal("true", Scalar::Bool(true))?,
                'f' => self.lex_literal("false", Scalar::Bool(false))?,
                'n' => self.lex_literal("null", Scalar::Null)?,
                other => {
                    return Err(SeedError::malformed(
                        line,
                        column,
                        format!("unexpected character {other:?}"),
                    ))
                }
            },
        };
        Ok(Spanned {
            token,
            line,
            column,
        })
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SeedError {
        SeedError::malformed(self.line, self.column, message)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\n' | '\r') = self.chars.peek() {
            self.bump();
        }
    }

    fn punctuation(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn lex_literal(&mut self, expected: &'static str, value: Scalar) -> Result<Token> {
        for want in expected.chars() {
            match self.bump() {
                Some(c) if c == want => {}
                _ => return Err(self.error(format!("invalid literal, expected `{expected}`"))),
            }
        }
        Ok(Token::Scalar(value))
    }

    fn lex_string(&mut self) -> Result<String> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error("unterminated string"))?;
            match c {
                '"' => return Ok(out),
                '\\' => {
                    let escaped = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated string"))?;
                    match escaped {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000C}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => out.push(self.lex_unicode_escape()?),
                        other => {
                            return Err(self.error(format!("invalid escape sequence `\\{other}`")))
                        }
                    }
                }
                '\u{0000}'..='\u{001F}' => {
                    return Err(self.error("unescaped control character in string"))
                }
                other => out.push(other),
            }
        }
    }

    /// Decode the `XXXX` of a `\uXXXX` escape, joining surrogate pairs.
    fn lex_unicode_escape(&mut self) -> Result<char> {
        let first = self.hex4()?;
        let code = match first {
            0xD800..=0xDBFF => {
                if self.bump() != Some('\\') || self.bump() != Some('u') {
                    return Err(self.error("unpaired surrogate in unicode escape"));
                }
                let second = self.hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.error("invalid low surrogate in unicode escape"));
                }
                0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
            }
            0xDC00..=0xDFFF => return Err(self.error("unpaired surrogate in unicode escape")),
            code => code,
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn hex4(&mut self) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn lex_number(&mut self) -> Result<f64> {
        let (line, column) = self.location();
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if !matches!(c, '0'..='9' | '-' | '+' | '.' | 'e' | 'E') {
                break;
            }
            text.push(c);
            self.bump();
        }
        // Grammar-valid literals beyond the f64 range decode to an infinity.
        match text.parse::<f64>() {
            Ok(n) if is_json_number(&text) => Ok(n),
            _ => Err(SeedError::malformed(
                line,
                column,
                format!("malformed number `{text}`"),
            )),
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Tokenizer<I> {
    type Item = Result<Spanned>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let next = self.next_token();
        if matches!(
            next,
            Err(_)
                | Ok(Spanned {
                    token: Token::EndOfInput,
                    ..
                })
        ) {
            self.finished = true;
        }
        Some(next)
    }
}

/// `-? (0 | [1-9][0-9]*) (\.[0-9]+)? ([eE][+-]?[0-9]+)?`
fn is_json_number(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i - start
    };

    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    match bytes.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            digits(&mut i);
        }
        _ => return false,
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        if digits(&mut i) == 0 {
            return false;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        if digits(&mut i) == 0 {
            return false;
        }
    }
    i == bytes.len()
}
