//! Recursive-descent JSON parser that reports structure through [`ParseCallback`].
//!
//! Grammar:
//!
//! ```text
//! document  = value
//! value     = object | array | string | number | bool | null
//! object    = '{' ( member (',' member)* )? '}'
//! member    = string ':' value
//! array     = '[' ( value (',' value)* )? ']'
//! ```
//!
//! Tokens are pulled one at a time and every transition is forwarded to the
//! callback before the next token is read. Trailing commas, missing commas and
//! content after the root value are all `MalformedInput`. Duplicate member
//! names are not a syntax error; both are reported.

use crate::callback::ParseCallback;
use crate::error::{Result, SeedError};
use crate::options::Options;
use crate::token::{Scalar, Spanned, Token};
use crate::tokenizer::Tokenizer;

/// Where a value sits, which decides how it is named in callbacks.
#[derive(Clone, Copy)]
enum Slot<'a> {
    Root,
    Member(&'a str),
    Element,
}

impl<'a> Slot<'a> {
    fn name(self) -> Option<&'a str> {
        match self {
            Slot::Member(name) => Some(name),
            Slot::Root | Slot::Element => None,
        }
    }
}

/// Recursive-descent parser that reports one document to a [`ParseCallback`].
pub struct Parser<I: Iterator<Item = char>> {
    tokens: Tokenizer<I>,
    max_depth: usize,
    depth: usize,
}

impl<I: Iterator<Item = char>> Parser<I> {
    pub fn new(chars: I, options: &Options) -> Self {
        Self {
            tokens: Tokenizer::new(chars),
            max_depth: options.max_depth,
            depth: 0,
        }
    }

    /// Parse one complete document, forwarding every event to `callback`.
    pub fn parse<C: ParseCallback>(mut self, callback: &mut C) -> Result<()> {
        let first = self.tokens.next_token()?;
        self.value(first, Slot::Root, callback)?;
        let rest = self.tokens.next_token()?;
        match rest.token {
            Token::EndOfInput => Ok(()),
            ref other => Err(unexpected(&rest, other, "end of input after the root value")),
        }
    }

    fn value<C: ParseCallback>(
        &mut self,
        spanned: Spanned,
        slot: Slot<'_>,
        callback: &mut C,
    ) -> Result<()> {
        match spanned.token {
            Token::BeginObject => {
                self.descend(&spanned)?;
                callback.enter_object(slot.name())?;
                self.object_body(callback)?;
                callback.leave_object()?;
                self.depth -= 1;
                Ok(())
            }
            Token::BeginArray => {
                self.descend(&spanned)?;
                callback.enter_array(slot.name())?;
                self.array_body(callback)?;
                callback.leave_array()?;
                self.depth -= 1;
                Ok(())
            }
            Token::Scalar(scalar) => match slot {
                Slot::Member(name) => callback.visit_property(name, scalar),
                Slot::Root | Slot::Element => callback.visit_array_element(scalar),
            },
            ref other => Err(unexpected(&spanned, other, "a value")),
        }
    }

    fn descend(&mut self, at: &Spanned) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(SeedError::DepthLimitExceeded {
                limit: self.max_depth,
                line: at.line,
                column: at.column,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn object_body<C: ParseCallback>(&mut self, callback: &mut C) -> Result<()> {
        let mut next = self.tokens.next_token()?;
        if next.token == Token::EndObject {
            return Ok(());
        }
        loop {
            let name = match next.token {
                Token::Scalar(Scalar::String(name)) => name,
                ref other => return Err(unexpected(&next, other, "a member name")),
            };
            let colon = self.tokens.next_token()?;
            if colon.token != Token::Colon {
                return Err(unexpected(&colon, &colon.token, "`:` after member name"));
            }
            let value = self.tokens.next_token()?;
            self.value(value, Slot::Member(&name), callback)?;

            let separator = self.tokens.next_token()?;
            match separator.token {
                Token::EndObject => return Ok(()),
                Token::Comma => {
                    next = self.tokens.next_token()?;
                    if next.token == Token::EndObject {
                        return Err(SeedError::malformed(
                            next.line,
                            next.column,
                            "trailing comma in object",
                        ));
                    }
                }
                ref other => return Err(unexpected(&separator, other, "`,` or `}`")),
            }
        }
    }

    fn array_body<C: ParseCallback>(&mut self, callback: &mut C) -> Result<()> {
        let mut next = self.tokens.next_token()?;
        if next.token == Token::EndArray {
            return Ok(());
        }
        loop {
            self.value(next, Slot::Element, callback)?;

            let separator = self.tokens.next_token()?;
            match separator.token {
                Token::EndArray => return Ok(()),
                Token::Comma => {
                    next = self.tokens.next_token()?;
                    if next.token == Token::EndArray {
                        return Err(SeedError::malformed(
                            next.line,
                            next.column,
                            "trailing comma in array",
                        ));
                    }
                }
                ref other => return Err(unexpected(&separator, other, "`,` or `]`")),
            }
        }
    }
}

fn unexpected(at: &Spanned, found: &Token, expected: &str) -> SeedError {
    SeedError::malformed(
        at.line,
        at.column,
        format!("expected {expected}, found {}", found.describe()),
    )
}

/// Parse `input` with default options, forwarding events to `callback`.
pub fn parse<C: ParseCallback>(input: &str, callback: &mut C) -> Result<()> {
    Parser::new(input.chars(), &Options::default()).parse(callback)
}
